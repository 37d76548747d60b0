use serde::Deserialize;

use crate::pagination::PageRequest;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const ALUMNI_DEFAULT_LIMIT: u64 = 9;

/// Filters accepted on inbound list requests. Values stay as raw strings so that
/// an empty or whitespace-only parameter can be told apart from a real one.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    #[serde(alias = "perPage", alias = "per_page")]
    pub limit: Option<String>,
    pub search: Option<String>,
    pub authored: Option<String>,
    #[serde(rename = "batchId", alias = "batch_id")]
    pub batch_id: Option<String>,
    #[serde(rename = "academicYearId", alias = "academic_year_id")]
    pub academic_year_id: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn positive(value: Option<&String>) -> Option<u64> {
    non_empty(value)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        positive(self.page.as_ref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self, default_limit: u64) -> u64 {
        positive(self.limit.as_ref()).unwrap_or(default_limit)
    }

    pub fn page_request(&self, default_limit: u64) -> PageRequest {
        PageRequest::new(self.page(), self.limit(default_limit))
    }

    /// Upstream parameters in a fixed order. `page` and `limit` are always
    /// present; other filters only when they carry a non-blank value.
    pub fn translate(&self, default_limit: u64) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page().to_string()),
            ("limit", self.limit(default_limit).to_string()),
        ];

        let filters = [
            ("search", &self.search),
            ("authored", &self.authored),
            ("batch_id", &self.batch_id),
            ("academic_year_id", &self.academic_year_id),
        ];
        for (name, value) in filters {
            if let Some(value) = non_empty(value.as_ref()) {
                pairs.push((name, value.to_string()));
            }
        }

        pairs
    }

    pub fn to_upstream_query(&self, default_limit: u64) -> String {
        to_query_string(&self.translate(default_limit))
    }
}

pub fn to_query_string(pairs: &[(&str, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

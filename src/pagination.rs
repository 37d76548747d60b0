use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub first_page: u64,
    pub first_page_url: String,
    pub last_page_url: String,
    pub next_page_url: Option<String>,
    pub previous_page_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub meta: PageMeta,
    pub data: Vec<T>,
}

/// Shape of a collection reply from the upstream, resolved once per response.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamCollection {
    /// `{ meta: {...}, data: [...] }`, already paginated upstream.
    Paginated(Value),
    /// Bare array or `{ data: [...] }` without usable pagination metadata.
    Bare(Vec<Value>),
    /// Anything else. Treated as an empty collection by callers.
    Malformed,
}

impl UpstreamCollection {
    pub fn classify(payload: Value) -> Self {
        match payload {
            Value::Array(items) => Self::Bare(items),
            Value::Object(mut map) => {
                let has_meta = map.get("meta").is_some_and(Value::is_object);
                match map.remove("data") {
                    Some(Value::Array(items)) if has_meta => {
                        map.insert("data".to_string(), Value::Array(items));
                        Self::Paginated(Value::Object(map))
                    }
                    Some(Value::Array(items)) => Self::Bare(items),
                    _ => Self::Malformed,
                }
            }
            _ => Self::Malformed,
        }
    }

    /// Items regardless of whether the upstream paginated them.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Paginated(mut value) => match value.get_mut("data").map(Value::take) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            Self::Bare(items) => items,
            Self::Malformed => Vec::new(),
        }
    }
}

fn page_url(page: u64) -> String {
    format!("/?page={page}")
}

impl PageMeta {
    pub fn compute(total: u64, request: PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let current_page = request.page.clamp(1, last_page);

        Self {
            total,
            per_page,
            current_page,
            last_page,
            first_page: 1,
            first_page_url: page_url(1),
            last_page_url: page_url(last_page),
            next_page_url: (current_page < last_page).then(|| page_url(current_page + 1)),
            previous_page_url: (current_page > 1).then(|| page_url(current_page - 1)),
        }
    }
}

/// Local pagination over the full set the upstream returned. Requests past the
/// last page are clamped to it instead of yielding an empty page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Paginated<T> {
    let meta = PageMeta::compute(items.len() as u64, request);
    let start = ((meta.current_page - 1) * meta.per_page) as usize;
    let data = items
        .into_iter()
        .skip(start)
        .take(meta.per_page as usize)
        .collect();
    Paginated { meta, data }
}

/// Pass an already-paginated payload through, otherwise paginate locally.
pub fn normalize_collection(payload: Value, request: PageRequest) -> Value {
    match UpstreamCollection::classify(payload) {
        UpstreamCollection::Paginated(value) => value,
        UpstreamCollection::Bare(items) => to_value(paginate(items, request)),
        UpstreamCollection::Malformed => {
            tracing::warn!("upstream collection was malformed; returning an empty page");
            to_value(paginate(Vec::new(), request))
        }
    }
}

fn to_value(page: Paginated<Value>) -> Value {
    serde_json::json!({ "meta": page.meta, "data": page.data })
}

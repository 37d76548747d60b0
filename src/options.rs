use serde::Serialize;
use serde_json::Value;

use crate::pagination::UpstreamCollection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupOption {
    pub id: Value,
    pub name: String,
}

/// How a lookup list turns upstream records into `{ id, name }` pairs.
#[derive(Debug, Clone, Copy)]
pub struct LookupSpec {
    pub upstream_resource: &'static str,
    pub candidates: &'static [&'static str],
    pub synthesize: fn(&Value, &str) -> String,
}

pub const BATCHES: LookupSpec = LookupSpec {
    upstream_resource: "batches",
    candidates: &["name", "title"],
    synthesize: synthesize_batch,
};

pub const ACADEMIC_YEARS: LookupSpec = LookupSpec {
    upstream_resource: "academic-years",
    candidates: &["name", "title", "label"],
    synthesize: synthesize_academic_year,
};

pub const MAJORS: LookupSpec = LookupSpec {
    upstream_resource: "majors",
    candidates: &["name", "title"],
    synthesize: synthesize_major,
};

/// Text form of a scalar field, or `None` when absent, null, blank, or structured.
pub fn text_field(item: &Value, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty candidate field wins; `synthesize` runs only when none match.
pub fn resolve_label<F>(item: &Value, candidates: &[&str], synthesize: F) -> String
where
    F: FnOnce(&Value) -> String,
{
    candidates
        .iter()
        .find_map(|field| text_field(item, field))
        .unwrap_or_else(|| synthesize(item))
}

fn stable_id(item: &Value) -> Option<Value> {
    match item.get("id")? {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) if !s.trim().is_empty() => Some(Value::String(s.trim().to_string())),
        _ => None,
    }
}

fn synthesize_batch(item: &Value, id: &str) -> String {
    match text_field(item, "number") {
        Some(number) => format!("Batch {number}"),
        None => format!("Batch {id}"),
    }
}

fn synthesize_academic_year(item: &Value, id: &str) -> String {
    let start = text_field(item, "startYear").or_else(|| text_field(item, "start_year"));
    let end = text_field(item, "endYear").or_else(|| text_field(item, "end_year"));
    match (start, end) {
        (Some(start), Some(end)) => format!("{start}/{end}"),
        _ => format!("Academic Year {id}"),
    }
}

fn synthesize_major(item: &Value, id: &str) -> String {
    text_field(item, "code").unwrap_or_else(|| format!("Major {id}"))
}

/// Maps every upstream record with a usable id to a lookup option. Records
/// without an id are dropped.
pub fn to_options(payload: Value, spec: &LookupSpec) -> Vec<LookupOption> {
    UpstreamCollection::classify(payload)
        .into_items()
        .iter()
        .filter_map(|item| {
            let id = stable_id(item)?;
            let id_text = match &id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let name = resolve_label(item, spec.candidates, |item| {
                (spec.synthesize)(item, &id_text)
            });
            Some(LookupOption { id, name })
        })
        .collect()
}

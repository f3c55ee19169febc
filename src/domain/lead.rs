//! Lead records as returned by the portal and as forwarded downstream

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untrusted lead object from one page of the search endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawLeadRecord(Map<String, Value>);

impl RawLeadRecord {
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Map<String, Value>> for RawLeadRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// One page of search results, already validated at the boundary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadPage {
    pub records: Vec<RawLeadRecord>,
    pub next_page_url: Option<String>,
}

impl LeadPage {
    /// An absent or empty `next_page_url` ends pagination
    pub fn has_next_page(&self) -> bool {
        self.next_page_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// Canonical record forwarded to the webhook; every field is always a string
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub recent_site_visit_date: String,
    pub name: String,
    pub contact: String,
    pub lead_source: String,
    pub lead_sub_source: String,
    pub lead_stage: String,
    pub lead_number: String,
    pub created_at: String,
    pub updated_at: String,
}

impl NormalizedRecord {
    /// Total over every input: absent or non-scalar fields become empty strings
    pub fn from_raw(raw: &RawLeadRecord) -> Self {
        let text = |key: &str| normalize_value(raw.field(key));
        Self {
            recent_site_visit_date: text("recent_date"),
            name: text("first_name"),
            contact: text("contact"),
            lead_source: text("lead_source"),
            lead_sub_source: text("lead_sub_source"),
            lead_stage: text("lead_stage"),
            lead_number: text("lead_number"),
            created_at: text("created_at"),
            updated_at: text("updated_at"),
        }
    }
}

/// Coerce one portal value into a trimmed string
pub fn normalize_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null | Value::Object(_) | Value::Array(_)) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
    }
}

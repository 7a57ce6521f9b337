//! Catalog interaction types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, serde_as};
pub use unisearch_core::profile::ExamScore as ValidatedExam;

/// One university as returned by the catalog.
///
/// The catalog doesn't guarantee a shape,
/// every nested field is looked up by path and may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRecord(Value);

impl CatalogRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Follow `path` through nested objects.
    ///
    /// `null` is treated like a missing field.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.0, |current, key| current.as_object()?.get(*key))
            .filter(|value| !value.is_null())
    }

    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path)?.as_str()
    }

    /// A number, also accepting numeric strings.
    pub fn f64_at(&self, path: &[&str]) -> Option<f64> {
        match self.lookup(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            _ => None,
        }
    }

    /// The string elements of an array, skipping anything else.
    pub fn strings_at(&self, path: &[&str]) -> Vec<&str> {
        self.lookup(path)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// A scalar rendered as text, e.g. for fields that may be numbers or strings.
    pub fn text_at(&self, path: &[&str]) -> Option<String> {
        match self.lookup(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<String> {
        self.text_at(&["id"])
    }

    pub fn name(&self) -> Option<&str> {
        self.str_at(&["name"])
    }
}

/// A page of universities.
///
/// Parsing is lenient, a missing or malformed `items` is an empty page
/// and a missing or malformed `total` means pagination is unavailable.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub items: Vec<CatalogRecord>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Number of items on this page as reported by older catalog versions.
    ///
    /// Only meant for display, it is not a total.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl ListResponse {
    /// The best available number of matches for display.
    pub fn total_label(&self) -> u64 {
        self.total
            .or(self.count)
            .unwrap_or(self.items.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamValidationRequest<'a> {
    pub exam: &'a str,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn record() -> CatalogRecord {
        CatalogRecord::new(json!({
            "id": 17,
            "name": "Tech Institute",
            "location": {"country": "USA", "city": null},
            "academics": {"majors": ["CS", 3, "Math"], "acceptance_rate_percent": "4.5"},
            "finance": {"tuition_year_usd": 57000},
        }))
    }

    #[test]
    fn lookup_follows_paths_and_treats_null_as_missing() {
        let record = record();
        assert_eq!(record.str_at(&["location", "country"]), Some("USA"));
        assert_eq!(record.lookup(&["location", "city"]), None);
        assert_eq!(record.lookup(&["location", "country", "code"]), None);
        assert_eq!(record.lookup(&["student_life", "size"]), None);
    }

    #[test]
    fn typed_accessors() {
        let record = record();
        assert_eq!(record.id(), Some("17".to_string()));
        assert_eq!(record.name(), Some("Tech Institute"));
        assert_eq!(record.f64_at(&["finance", "tuition_year_usd"]), Some(57000.0));
        assert_eq!(record.f64_at(&["academics", "acceptance_rate_percent"]), Some(4.5));
        assert_eq!(record.strings_at(&["academics", "majors"]), vec!["CS", "Math"]);
        assert!(record.strings_at(&["academics", "formats"]).is_empty());
    }

    #[test]
    fn list_response_is_lenient() {
        let response: ListResponse =
            serde_json::from_value(json!({"items": "nope", "total": "many"})).unwrap();
        assert_eq!(response, ListResponse::default());

        let response: ListResponse =
            serde_json::from_value(json!({"items": [{"id": 1}], "count": 1})).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.total, None);
        assert_eq!(response.total_label(), 1);

        let response: ListResponse =
            serde_json::from_value(json!({"items": [], "total": 37})).unwrap();
        assert_eq!(response.total, Some(37));
    }
}

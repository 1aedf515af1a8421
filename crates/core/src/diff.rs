//! Field-level diff between two submission payloads.
//!
//! Payloads are flat JSON objects (field name -> value). Two values are equal
//! when their canonical serializations are byte-identical; `serde_json`
//! objects are key-sorted, so nested objects compare independently of the
//! key order the client sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a single field differs between the old and new payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Present only in the new payload.
    Added,
    /// Present only in the old payload.
    Removed,
    /// Present in both with different values.
    Changed,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed field.
///
/// `None` on either side is the missing-key sentinel: the key did not exist
/// in that payload. A key present with a JSON `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffItem {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

impl DiffItem {
    pub fn status(&self) -> DiffStatus {
        match (&self.old, &self.new) {
            (None, _) => DiffStatus::Added,
            (_, None) => DiffStatus::Removed,
            _ => DiffStatus::Changed,
        }
    }
}

/// Canonical serialization used for equality checks.
pub fn canonical_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail: every map key is already a string.
    serde_json::to_string(value).unwrap_or_default()
}

/// Compare two payloads field by field.
///
/// Returns one item per key in the union of both key sets whose values are
/// not byte-identical, sorted lexicographically by field name.
pub fn compute_diff(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<DiffItem> {
    let mut fields: Vec<&String> = old.keys().chain(new.keys()).collect();
    fields.sort();
    fields.dedup();

    fields
        .into_iter()
        .filter_map(|field| {
            let before = old.get(field);
            let after = new.get(field);
            let unchanged = match (before, after) {
                (Some(a), Some(b)) => canonical_json(a) == canonical_json(b),
                _ => false,
            };
            if unchanged {
                return None;
            }
            Some(DiffItem {
                field: field.clone(),
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn identical_payloads_have_no_diff() {
        let a = obj(json!({"image": "a.png", "sort": 3, "meta": {"x": 1, "y": [1, 2]}}));
        assert!(compute_diff(&a, &a).is_empty());
    }

    #[test]
    fn changed_value_is_reported_with_both_sides() {
        let a = obj(json!({"image": "a.png"}));
        let b = obj(json!({"image": "b.png"}));
        let diff = compute_diff(&a, &b);
        assert_eq!(
            diff,
            vec![DiffItem {
                field: "image".into(),
                old: Some(json!("a.png")),
                new: Some(json!("b.png")),
            }]
        );
        assert_eq!(diff[0].status(), DiffStatus::Changed);
    }

    #[test]
    fn fields_are_sorted_lexicographically() {
        let a = obj(json!({"zeta": 1, "alpha": 1, "Mid": 1}));
        let b = obj(json!({"zeta": 2, "alpha": 2, "Mid": 2}));
        let fields: Vec<_> = compute_diff(&a, &b).into_iter().map(|d| d.field).collect();
        assert_eq!(fields, vec!["Mid", "alpha", "zeta"]);
    }

    #[test]
    fn one_sided_keys_use_the_missing_sentinel() {
        let a = obj(json!({"title": "old"}));
        let b = obj(json!({"image": "new.png"}));
        let diff = compute_diff(&a, &b);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].field, "image");
        assert_eq!(diff[0].old, None);
        assert_eq!(diff[0].status(), DiffStatus::Added);
        assert_eq!(diff[1].field, "title");
        assert_eq!(diff[1].new, None);
        assert_eq!(diff[1].status(), DiffStatus::Removed);
    }

    #[test]
    fn explicit_null_differs_from_missing() {
        let a = obj(json!({"music": null}));
        let b = obj(json!({}));
        let diff = compute_diff(&a, &b);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].old, Some(Value::Null));
        assert_eq!(diff[0].new, None);
    }

    #[test]
    fn type_changes_are_reported() {
        let a = obj(json!({"sort": 1}));
        let b = obj(json!({"sort": "1"}));
        assert_eq!(compute_diff(&a, &b).len(), 1);
    }

    #[test]
    fn nested_key_order_does_not_matter() {
        let a: Map<String, Value> =
            serde_json::from_str(r#"{"style": {"b": 2, "a": 1}}"#).unwrap();
        let b: Map<String, Value> =
            serde_json::from_str(r#"{"style": {"a": 1, "b": 2}}"#).unwrap();
        assert!(compute_diff(&a, &b).is_empty());
    }

    #[test]
    fn missing_side_is_omitted_when_serialized() {
        let item = DiffItem {
            field: "image".into(),
            old: None,
            new: Some(json!("b.png")),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, json!({"field": "image", "new": "b.png"}));
    }
}

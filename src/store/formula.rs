//! Typed filters for record store queries.
//!
//! A [`Filter`] renders to an Airtable formula for the HTTP store and is
//! evaluated directly against record fields by the in-memory store, so both
//! backends agree on which records a query selects.

use super::Fields;
use serde_json::Value;

/// Escape a string literal for use inside a single-quoted formula string
pub fn escape_formula(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(['\n', '\r'], " ")
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every record
    #[default]
    All,
    /// Field equals a literal value
    Equals { field: String, value: Value },
    /// Comma-joined id list (or linked-record array) contains an id
    ListContains { field: String, needle: String },
    And(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn list_contains(field: &str, needle: &str) -> Self {
        Filter::ListContains {
            field: field.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Render as an Airtable `filterByFormula` expression
    pub fn to_formula(&self) -> String {
        match self {
            Filter::All => "TRUE()".to_string(),
            Filter::Equals { field, value } => match value {
                Value::String(s) => format!("{{{}}} = '{}'", field, escape_formula(s)),
                Value::Number(n) => format!("{{{}}} = {}", field, n),
                Value::Bool(true) => format!("{{{}}}", field),
                Value::Bool(false) => format!("NOT({{{}}})", field),
                Value::Null => format!("{{{}}} = BLANK()", field),
                other => format!("{{{}}} = '{}'", field, escape_formula(&other.to_string())),
            },
            Filter::ListContains { field, needle } => format!(
                "FIND(',{}', ',' & SUBSTITUTE({{{}}} & '', ' ', '') & ',') > 0",
                escape_formula(&format!("{},", needle)),
                field
            ),
            Filter::And(parts) if parts.is_empty() => "TRUE()".to_string(),
            Filter::And(parts) => format!("AND({})", join_formulas(parts)),
            Filter::Not(inner) => format!("NOT({})", inner.to_formula()),
        }
    }

    /// Evaluate against a record's fields
    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::All => true,
            Filter::Equals { field, value } => value_equals(fields.get(field), value),
            Filter::ListContains { field, needle } => match fields.get(field) {
                Some(Value::String(list)) => list.split(',').any(|id| id.trim() == needle),
                Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(needle)),
                _ => false,
            },
            Filter::And(parts) => parts.iter().all(|p| p.matches(fields)),
            Filter::Not(inner) => !inner.matches(fields),
        }
    }
}

fn join_formulas(parts: &[Filter]) -> String {
    parts
        .iter()
        .map(Filter::to_formula)
        .collect::<Vec<_>>()
        .join(", ")
}

// Airtable omits empty cells and unchecked checkboxes entirely.
fn value_equals(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None | Some(Value::Null), Value::Null) => true,
        (None, Value::Bool(false)) => true,
        (None, Value::String(s)) => s.is_empty(),
        (None, _) => false,
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(a), b) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_escape_formula() {
        assert_eq!(escape_formula("o'brien"), "o\\'brien");
        assert_eq!(escape_formula("a\\b"), "a\\\\b");
        assert_eq!(escape_formula("x') OR TRUE() OR ('"), "x\\') OR TRUE() OR (\\'");
    }

    #[test]
    fn test_render_equals() {
        assert_eq!(Filter::eq("username", "ada").to_formula(), "{username} = 'ada'");
        assert_eq!(Filter::eq("coins", 5).to_formula(), "{coins} = 5");
        assert_eq!(Filter::eq("awaitingReview", true).to_formula(), "{awaitingReview}");
        assert_eq!(Filter::eq("awaitingReview", false).to_formula(), "NOT({awaitingReview})");
    }

    #[test]
    fn test_render_compound() {
        let filter = Filter::eq("status", "submitted").and(Filter::eq("awaitingReview", true));
        assert_eq!(
            filter.to_formula(),
            "AND({status} = 'submitted', {awaitingReview})"
        );
        assert_eq!(
            Filter::eq("ownerId", "recA").negate().to_formula(),
            "NOT({ownerId} = 'recA')"
        );
        assert_eq!(Filter::All.and(Filter::eq("a", 1)), Filter::eq("a", 1));
    }

    #[test]
    fn test_render_list_contains() {
        assert_eq!(
            Filter::list_contains("projectIds", "rec1").to_formula(),
            "FIND(',rec1,', ',' & SUBSTITUTE({projectIds} & '', ' ', '') & ',') > 0"
        );
    }

    #[test]
    fn test_matches_missing_fields_like_airtable() {
        let record = fields(json!({ "username": "ada" }));
        assert!(Filter::eq("awaitingReview", false).matches(&record));
        assert!(!Filter::eq("awaitingReview", true).matches(&record));
        assert!(Filter::eq("secondReviewer", Value::Null).matches(&record));
    }

    #[test]
    fn test_matches_numbers_by_value() {
        let record = fields(json!({ "coins": 5.0 }));
        assert!(Filter::eq("coins", 5).matches(&record));
    }

    #[test]
    fn test_list_contains_is_exact() {
        let record = fields(json!({ "projectIds": "rec10, rec2" }));
        assert!(Filter::list_contains("projectIds", "rec2").matches(&record));
        assert!(!Filter::list_contains("projectIds", "rec1").matches(&record));

        let linked = fields(json!({ "projectIds": ["rec1"] }));
        assert!(Filter::list_contains("projectIds", "rec1").matches(&linked));
    }
}

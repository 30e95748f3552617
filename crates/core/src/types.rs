//! Experiment data model: optimizations, their variants, and the targeting
//! conditionals attached to variants.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{OptimizeError, OptimizeResult};

/// Weight used when a variant's target percentage is missing or not numeric.
pub const DEFAULT_WEIGHT: u32 = 50;

/// Upper bound of a variant weight.
pub const MAX_WEIGHT: u32 = 100;

/// Storage key the authoring UI proposes for storage-backed conditionals.
pub const DEFAULT_NAME_IN_STORAGE: &str = "gp_optimize_data";

/// One A/B(/n) experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub id: String,
    pub name: Option<String>,
    /// Inert when false: no selection, no event.
    pub status: bool,
    pub variants: Vec<Variant>,
}

impl Optimization {
    /// Creates an enabled optimization with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: Some(name.into()),
            status: true,
            variants: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Human readable name, falling back to the id when unset or blank.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub fn contains_variant(&self, variant_id: &str) -> bool {
        self.variant(variant_id).is_some()
    }
}

/// One content branch of an optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub name: Option<String>,
    /// Relative weight in `[0, 100]`; siblings need not sum to 100.
    pub target_percentage: u32,
    #[serde(default)]
    pub conditionals: Vec<Conditional>,
}

impl Variant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            target_percentage: DEFAULT_WEIGHT,
            conditionals: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.target_percentage = weight.min(MAX_WEIGHT);
        self
    }

    pub fn with_conditional(mut self, conditional: Conditional) -> Self {
        self.conditionals.push(conditional);
        self
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }
}

/// Parses a raw target percentage the way markup attributes are read: the
/// leading integer wins (`"30%"` is 30), anything non-numeric falls back to
/// `default`, and the result is clamped to `[0, 100]`.
pub fn parse_weight(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return default;
    }
    if negative {
        return 0;
    }
    digits[..end]
        .parse::<u64>()
        .map(|w| w.min(MAX_WEIGHT as u64) as u32)
        .unwrap_or(MAX_WEIGHT)
}

/// Names are restricted to letters, digits, spaces and dashes.
pub fn is_valid_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

// ─── Conditionals ───────────────────────────────────────────────────────────

/// Data source a conditional reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalType {
    #[default]
    UrlParameter,
    LocalStorage,
    SessionStorage,
}

/// How a stored value is interpreted before comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    String,
    CommaSeparated,
    Object,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    Exists,
    DoesNotExist,
}

/// A single targeting rule. When it holds, its variant is forced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    #[serde(rename = "type", default)]
    pub kind: ConditionalType,
    #[serde(default)]
    pub conditional_key: String,
    #[serde(default = "default_name_in_storage")]
    pub name_in_storage: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
}

fn default_name_in_storage() -> String {
    DEFAULT_NAME_IN_STORAGE.to_string()
}

impl Conditional {
    pub fn url_parameter(
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind: ConditionalType::UrlParameter,
            conditional_key: key.into(),
            name_in_storage: default_name_in_storage(),
            data_type: DataType::String,
            operator,
            value: value.into(),
        }
    }

    pub fn storage(
        kind: ConditionalType,
        name_in_storage: impl Into<String>,
        data_type: DataType,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            conditional_key: String::new(),
            name_in_storage: name_in_storage.into(),
            data_type,
            operator,
            value: value.into(),
        }
    }

    /// Sets the field extracted from `object` storage values.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.conditional_key = key.into();
        self
    }

    /// Parses a JSON-encoded conditional array.
    ///
    /// The payload itself must be a JSON array; individual entries that do not
    /// match the conditional shape are dropped so the remaining rules still apply.
    pub fn parse_list(raw: &str) -> OptimizeResult<Vec<Conditional>> {
        let parsed: serde_json::Value = serde_json::from_str(raw)?;
        let entries = match parsed {
            serde_json::Value::Array(entries) => entries,
            serde_json::Value::Null => return Ok(Vec::new()),
            other => {
                return Err(OptimizeError::MalformedPayload(format!(
                    "conditionals must be an array, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut conditionals = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Conditional>(entry) {
                Ok(conditional) => conditionals.push(conditional),
                Err(e) => warn!(index, error = %e, "dropping malformed conditional"),
            }
        }
        Ok(conditionals)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight(Some("30"), DEFAULT_WEIGHT), 30);
        assert_eq!(parse_weight(Some(" 70 "), DEFAULT_WEIGHT), 70);
        assert_eq!(parse_weight(Some("25%"), DEFAULT_WEIGHT), 25);
        assert_eq!(parse_weight(Some("0"), DEFAULT_WEIGHT), 0);
        assert_eq!(parse_weight(Some("abc"), DEFAULT_WEIGHT), 50);
        assert_eq!(parse_weight(Some(""), DEFAULT_WEIGHT), 50);
        assert_eq!(parse_weight(None, DEFAULT_WEIGHT), 50);
        assert_eq!(parse_weight(Some("250"), DEFAULT_WEIGHT), 100);
        assert_eq!(parse_weight(Some("-5"), DEFAULT_WEIGHT), 0);
    }

    #[test]
    fn test_display_name_fallback() {
        let opt = Optimization::new("").with_id("opt-1");
        assert_eq!(opt.display_name(), "opt-1");

        let opt = Optimization::new("Header test").with_id("opt-1");
        assert_eq!(opt.display_name(), "Header test");

        let variant = Variant::new("v-1");
        assert_eq!(variant.display_name(), "v-1");
        assert_eq!(variant.with_name("Blue").display_name(), "Blue");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Optimization::new("a");
        let b = Optimization::new("b");
        assert_ne!(a.id, b.id);
        assert!(a.status);
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("Donate Button - Q3"));
        assert!(is_valid_name(""));
        assert!(!is_valid_name("bad_name"));
        assert!(!is_valid_name("émoji"));
    }

    #[test]
    fn test_conditional_defaults() {
        let list = Conditional::parse_list(r#"[{}]"#).unwrap();
        assert_eq!(list.len(), 1);
        let c = &list[0];
        assert_eq!(c.kind, ConditionalType::UrlParameter);
        assert_eq!(c.name_in_storage, "gp_optimize_data");
        assert_eq!(c.data_type, DataType::String);
        assert_eq!(c.operator, Operator::Is);
        assert!(c.value.is_empty());
    }

    #[test]
    fn test_conditional_editor_payload() {
        let raw = r#"[{"index":0,"type":"local_storage","typeSelection":"local_storage",
            "nameInStorage":"tags","dataType":"comma_separated","conditionalKey":"",
            "operator":"contains","value":"vip","showDetails":false}]"#;
        let list = Conditional::parse_list(raw).unwrap();
        assert_eq!(
            list[0],
            Conditional::storage(
                ConditionalType::LocalStorage,
                "tags",
                DataType::CommaSeparated,
                Operator::Contains,
                "vip"
            )
        );
    }

    #[test]
    fn test_malformed_entries_are_dropped() {
        let raw = r#"[{"type":"cookie"},{"type":"url_parameter","conditionalKey":"src","value":"ads"}]"#;
        let list = Conditional::parse_list(raw).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].conditional_key, "src");
    }

    #[test]
    fn test_non_array_payload_is_rejected() {
        assert!(Conditional::parse_list(r#"{"type":"url_parameter"}"#).is_err());
        assert!(Conditional::parse_list("not json").is_err());
        assert!(Conditional::parse_list("null").unwrap().is_empty());
    }
}

//! Remote object member descriptions.

use serde::{Deserialize, Serialize};

/// One member of a remote object, as returned by `__DESCRIBE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProperty {
    /// Member name.
    pub name: String,
    /// Type reported by the engine (`function`, `string`, ...).
    #[serde(rename = "type", default)]
    pub declared_type: String,
}

impl ObjectProperty {
    /// Create a property description.
    #[must_use]
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// Parse a `__DESCRIBE` response body into an ordered property list.
///
/// # Errors
/// Returns the JSON error if the body is not an array of `{name, type}`.
pub fn parse_describe(body: &str) -> Result<Vec<ObjectProperty>, serde_json::Error> {
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_engine_order() {
        let body = r#"[{"name":"getName","type":"function"},{"name":"id","type":"string"}]"#;
        let props = parse_describe(body).unwrap();
        assert_eq!(
            props,
            vec![
                ObjectProperty::new("getName", "function"),
                ObjectProperty::new("id", "string"),
            ]
        );
    }

    #[test]
    fn test_parse_missing_type() {
        let props = parse_describe(r#"[{"name":"length"}]"#).unwrap();
        assert_eq!(props[0].declared_type, "");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_describe("ReferenceError: foo is not defined").is_err());
        assert!(parse_describe(r#"{"name":"x"}"#).is_err());
    }
}

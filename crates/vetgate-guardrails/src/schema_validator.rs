//! Embedded structured data validation guardrail

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    guardrail::{CheckContext, Guardrail},
    GuardrailError, GuardrailResult, Result, Severity,
};

/// Expected type of a field inside an embedded JSON fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Null => value.is_null(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Null => "null",
        };
        write!(f, "{}", s)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Schema validator guardrail
///
/// Extracts balanced `{...}` spans from free text and parses each as JSON. A
/// balanced span that fails to parse is a violation; parsed fragments are
/// checked for required fields, declared field types, and nesting depth.
/// Content without any braced span passes, and nothing is ever repaired.
///
/// Unbalanced braces are not extracted: an unclosed `{` leaves no complete
/// span to validate.
pub struct SchemaValidator {
    /// Fields every fragment must contain
    required_fields: Vec<String>,
    /// Declared types, checked when the field is present, sorted by name
    field_types: Vec<(String, FieldType)>,
    /// Maximum container nesting depth (a flat object has depth 1)
    max_nesting_depth: usize,
    /// Severity reported on failure
    severity: Severity,
}

impl SchemaValidator {
    /// Create a new schema validator; `max_nesting_depth` must be positive
    pub fn new(
        required_fields: Vec<String>,
        field_types: HashMap<String, FieldType>,
        max_nesting_depth: usize,
    ) -> Result<Self> {
        if max_nesting_depth == 0 {
            return Err(GuardrailError::invalid_config(
                "max_nesting_depth must be positive",
            ));
        }
        let mut field_types: Vec<(String, FieldType)> = field_types.into_iter().collect();
        field_types.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self {
            required_fields,
            field_types,
            max_nesting_depth,
            severity: Severity::Error,
        })
    }

    /// Override the severity reported on failure
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn check_fragment(&self, index: usize, fragment: &str, issues: &mut Vec<String>) {
        let value: Value = match serde_json::from_str(fragment) {
            Ok(value) => value,
            Err(e) => {
                issues.push(format!(
                    "fragment {}: malformed structured data ({})",
                    index + 1,
                    e
                ));
                return;
            }
        };

        if let Some(object) = value.as_object() {
            for field in &self.required_fields {
                if !object.contains_key(field) {
                    issues.push(format!(
                        "fragment {}: missing required field '{}'",
                        index + 1,
                        field
                    ));
                }
            }
            for (field, expected) in &self.field_types {
                if let Some(actual) = object.get(field) {
                    if !expected.matches(actual) {
                        issues.push(format!(
                            "fragment {}: field '{}' expected {} but found {}",
                            index + 1,
                            field,
                            expected,
                            value_type_name(actual)
                        ));
                    }
                }
            }
        }

        let depth = value_depth(&value);
        if depth > self.max_nesting_depth {
            issues.push(format!(
                "fragment {}: nesting depth {} exceeds limit {}",
                index + 1,
                depth,
                self.max_nesting_depth
            ));
        }
    }
}

/// Balanced top-level `{...}` spans, skipping braces inside JSON strings
fn extract_fragments(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        fragments.push(&content[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    fragments
}

/// Container nesting depth: scalars are 0, each object/array level adds 1
fn value_depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(value_depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(value_depth).max().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl Guardrail for SchemaValidator {
    fn name(&self) -> &str {
        "schema_validator"
    }

    async fn check(&self, content: &str, _context: &CheckContext) -> Result<GuardrailResult> {
        let fragments = extract_fragments(content);
        if fragments.is_empty() {
            return Ok(GuardrailResult::pass(self.name()));
        }

        let mut issues = Vec::new();
        for (index, fragment) in fragments.iter().enumerate() {
            self.check_fragment(index, fragment, &mut issues);
        }

        if issues.is_empty() {
            return Ok(GuardrailResult::pass(self.name()));
        }

        Ok(GuardrailResult::fail(
            self.name(),
            self.severity,
            format!("Structured data violations: {}", issues.join("; ")),
        )
        .with_metadata(json!({
            "fragments": fragments.len(),
            "issues": issues,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SchemaValidator {
        SchemaValidator::new(
            vec!["name".to_string()],
            HashMap::from([
                ("name".to_string(), FieldType::String),
                ("age".to_string(), FieldType::Number),
            ]),
            3,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_no_fragments_passes() {
        let result = validator()
            .check("plain prose without structure", &CheckContext::default())
            .await
            .unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_valid_fragment_passes() {
        let result = validator()
            .check(
                r#"Here is the record: {"name": "alice", "age": 30} as requested"#,
                &CheckContext::default(),
            )
            .await
            .unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_missing_required_field_fails() {
        let result = validator()
            .check(r#"{"age": 30}"#, &CheckContext::default())
            .await
            .unwrap();
        assert!(!result.passed);
        assert!(result.is_blocking());
        assert!(result.message.contains("missing required field 'name'"));
    }

    #[tokio::test]
    async fn test_type_mismatch_fails() {
        let result = validator()
            .check(r#"{"name": "bob", "age": "thirty"}"#, &CheckContext::default())
            .await
            .unwrap();
        assert!(!result.passed);
        assert!(result
            .message
            .contains("field 'age' expected number but found string"));
    }

    #[tokio::test]
    async fn test_malformed_fragment_fails() {
        let result = validator()
            .check("data: {not valid json}", &CheckContext::default())
            .await
            .unwrap();
        assert!(!result.passed);
        assert!(result.message.contains("malformed structured data"));
    }

    #[tokio::test]
    async fn test_nesting_depth_enforced() {
        let shallow = SchemaValidator::new(vec![], HashMap::new(), 2).unwrap();

        let result = shallow
            .check(r#"{"a": {"b": {"c": 1}}}"#, &CheckContext::default())
            .await
            .unwrap();
        assert!(!result.passed);
        assert!(result.message.contains("nesting depth 3 exceeds limit 2"));
    }

    #[tokio::test]
    async fn test_braces_inside_strings_ignored() {
        let result = validator()
            .check(
                r#"{"name": "curly {braces} inside"}"#,
                &CheckContext::default(),
            )
            .await
            .unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_multiple_fragments_each_checked() {
        let result = validator()
            .check(
                r#"first {"name": "ok"} then {"age": 1}"#,
                &CheckContext::default(),
            )
            .await
            .unwrap();
        assert!(!result.passed);
        assert!(result.message.contains("fragment 2"));
    }

    #[tokio::test]
    async fn test_never_modifies_content() {
        let result = validator()
            .check(r#"{"age": 30}"#, &CheckContext::default())
            .await
            .unwrap();
        assert!(result.modified_content.is_none());
    }

    #[tokio::test]
    async fn test_unclosed_brace_not_extracted() {
        let result = validator()
            .check("opening { never closes", &CheckContext::default())
            .await
            .unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_zero_depth_rejected() {
        assert!(SchemaValidator::new(vec![], HashMap::new(), 0).is_err());
    }
}

//! Loosely-typed architecture metadata.
//!
//! The model's answer has no enforced schema, so documents stay as JSON
//! objects. Only the top-level keys below are interpreted (by the merger);
//! everything else passes through untouched.

use serde_json::{Map, Value};

/// A metadata document (one project, or the merged aggregate).
pub type Metadata = Map<String, Value>;

pub const KEY_SERVICES: &str = "services";
pub const KEY_INFRASTRUCTURE: &str = "infrastructure";
pub const KEY_DEPLOYMENT: &str = "deployment";
pub const KEY_FINDINGS: &str = "findings";
pub const KEY_PROJECTS: &str = "projects";
pub const KEY_PROJECT_NAME: &str = "projectName";
pub const KEY_PROJECT_ROOT: &str = "projectRoot";

/// Record which project a document came from.
pub fn annotate(doc: &mut Metadata, project_name: &str, project_root: &str) {
    doc.insert(KEY_PROJECT_NAME.to_string(), Value::from(project_name));
    doc.insert(KEY_PROJECT_ROOT.to_string(), Value::from(project_root));
}

/// Python-style truthiness: null, false, zero, and empty strings,
/// arrays and objects are "empty".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!("t3.micro")));
        assert!(is_truthy(&json!({"engine": "postgres"})));
    }

    #[test]
    fn annotate_sets_origin_keys() {
        let mut doc = Metadata::new();
        annotate(&mut doc, "api", "services/api");
        assert_eq!(doc[KEY_PROJECT_NAME], "api");
        assert_eq!(doc[KEY_PROJECT_ROOT], "services/api");
    }
}

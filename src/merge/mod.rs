//! Metadata merging across analysed projects.
//!
//! A lone document passes through untouched. Several documents are folded
//! into one with project-qualified service names and origin-tagged
//! findings; see [`merge`] for the aggregation rules.

use serde_json::{json, Map, Value};

use crate::models::metadata::{
    is_truthy, KEY_DEPLOYMENT, KEY_FINDINGS, KEY_INFRASTRUCTURE, KEY_PROJECTS, KEY_PROJECT_NAME,
    KEY_PROJECT_ROOT, KEY_SERVICES,
};
use crate::models::Metadata;

const KEY_AWS: &str = "aws";
const KEY_EXTERNAL: &str = "external";
const KEY_TERRAFORM_HINTS: &str = "terraformHints";
const KEY_PROJECT: &str = "project";

/// Result of merging the successful per-project documents of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// No project produced usable metadata.
    NoResults,
    /// Exactly one project; its document is returned as is.
    Single(Metadata),
    /// Several projects folded into one document.
    Merged(Metadata),
}

impl MergeOutcome {
    /// The document to persist, if any.
    pub fn document(&self) -> Option<&Metadata> {
        match self {
            MergeOutcome::NoResults => None,
            MergeOutcome::Single(doc) | MergeOutcome::Merged(doc) => Some(doc),
        }
    }

    pub fn into_document(self) -> Option<Metadata> {
        match self {
            MergeOutcome::NoResults => None,
            MergeOutcome::Single(doc) | MergeOutcome::Merged(doc) => Some(doc),
        }
    }
}

/// Merge per-project documents, in analysis order.
///
/// With two or more documents the result holds:
/// - `projects`: `{name, root, serviceCount}` per document
/// - `services`: every service, named `<project>/<name>`, with a `project` field
/// - `infrastructure.aws`: first non-empty value per key; objects merge deeply
/// - `infrastructure.external`: concatenation of every list
/// - `deployment`: first non-empty deployment, plus `terraformHints` from a
///   later project when the first has none
/// - `findings`: every finding with a `project` field
pub fn merge(docs: Vec<Metadata>) -> MergeOutcome {
    if docs.len() < 2 {
        return docs
            .into_iter()
            .next()
            .map_or(MergeOutcome::NoResults, MergeOutcome::Single);
    }

    let mut projects = Vec::with_capacity(docs.len());
    let mut services = Vec::new();
    let mut aws = Map::new();
    let mut external = Vec::new();
    let mut deployment = Map::new();
    let mut findings = Vec::new();

    for (idx, doc) in docs.iter().enumerate() {
        let name = doc
            .get(KEY_PROJECT_NAME)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("project-{}", idx + 1));
        let root = doc
            .get(KEY_PROJECT_ROOT)
            .and_then(Value::as_str)
            .unwrap_or(".");

        let doc_services = list(doc, KEY_SERVICES);
        projects.push(json!({
            "name": name,
            "root": root,
            "serviceCount": doc_services.len(),
        }));

        for service in doc_services {
            services.push(qualify_service(service, &name));
        }

        if let Some(infra) = doc.get(KEY_INFRASTRUCTURE).and_then(Value::as_object) {
            if let Some(doc_aws) = infra.get(KEY_AWS).and_then(Value::as_object) {
                merge_aws(&mut aws, doc_aws);
            }
            if let Some(ext) = infra.get(KEY_EXTERNAL).and_then(Value::as_array) {
                external.extend(ext.iter().cloned());
            }
        }

        if let Some(deploy) = doc.get(KEY_DEPLOYMENT).and_then(Value::as_object) {
            if deployment.is_empty() {
                deployment = deploy.clone();
            } else if !deployment.contains_key(KEY_TERRAFORM_HINTS) {
                if let Some(hints) = deploy.get(KEY_TERRAFORM_HINTS) {
                    deployment.insert(KEY_TERRAFORM_HINTS.to_string(), hints.clone());
                }
            }
        }

        for finding in list(doc, KEY_FINDINGS) {
            let mut finding = match finding {
                Value::Object(map) => map.clone(),
                other => {
                    let mut map = Map::new();
                    map.insert("message".to_string(), other.clone());
                    map
                }
            };
            finding.insert(KEY_PROJECT.to_string(), Value::from(name.as_str()));
            findings.push(Value::Object(finding));
        }
    }

    let mut merged = Metadata::new();
    merged.insert(KEY_SERVICES.to_string(), Value::Array(services));
    merged.insert(
        KEY_INFRASTRUCTURE.to_string(),
        json!({ KEY_AWS: aws, KEY_EXTERNAL: external }),
    );
    merged.insert(KEY_DEPLOYMENT.to_string(), Value::Object(deployment));
    merged.insert(KEY_FINDINGS.to_string(), Value::Array(findings));
    merged.insert(KEY_PROJECTS.to_string(), Value::Array(projects));
    MergeOutcome::Merged(merged)
}

fn list<'a>(doc: &'a Metadata, key: &str) -> &'a [Value] {
    doc.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn qualify_service(service: &Value, project: &str) -> Value {
    let mut map = match service {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("name".to_string(), other.clone());
            map
        }
    };
    if let Some(name) = map.get("name") {
        let bare = match name {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        map.insert("name".to_string(), Value::from(format!("{project}/{bare}")));
    }
    map.insert(KEY_PROJECT.to_string(), Value::from(project));
    Value::Object(map)
}

/// First truthy value per key wins; object values merge into an existing
/// object recursively, later leaves overriding earlier ones.
fn merge_aws(target: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        if !is_truthy(value) {
            continue;
        }
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), value.clone());
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(incoming) = value {
                    deep_merge(existing, incoming);
                }
            }
            Some(_) => {}
        }
    }
}

fn deep_merge(target: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn empty_input_has_no_results() {
        assert_eq!(merge(Vec::new()), MergeOutcome::NoResults);
        assert!(merge(Vec::new()).document().is_none());
    }

    #[test]
    fn single_document_passes_through() {
        let only = doc(json!({
            "services": [{"name": "api"}],
            "projectName": "api",
            "projectRoot": "svc/api",
            "custom": {"kept": true}
        }));
        assert_eq!(merge(vec![only.clone()]), MergeOutcome::Single(only));
    }

    #[test]
    fn merges_two_projects() {
        let web = doc(json!({
            "projectName": "web",
            "projectRoot": "web",
            "services": [{"name": "frontend", "language": "typescript"}],
            "infrastructure": {
                "aws": {"s3": true, "rds": {}, "vpc": {"cidr": "10.0.0.0/16"}},
                "external": ["stripe"]
            },
            "deployment": {"ci": "github-actions"},
            "findings": [{"type": "warning", "message": "no healthcheck"}]
        }));
        let api = doc(json!({
            "projectName": "api",
            "projectRoot": "services/api",
            "services": [{"name": "backend"}, {"name": "worker"}],
            "infrastructure": {
                "aws": {"s3": false, "rds": {"engine": "postgres"}, "vpc": {"subnets": 2}},
                "external": ["stripe", "sendgrid"]
            },
            "deployment": {"ci": "jenkins", "terraformHints": {"variables": {"region": "us-east-1"}}},
            "findings": []
        }));

        let merged = match merge(vec![web, api]) {
            MergeOutcome::Merged(m) => Value::Object(m),
            other => panic!("expected merged outcome, got {other:?}"),
        };

        assert_eq!(
            merged,
            json!({
                "services": [
                    {"name": "web/frontend", "language": "typescript", "project": "web"},
                    {"name": "api/backend", "project": "api"},
                    {"name": "api/worker", "project": "api"}
                ],
                "infrastructure": {
                    "aws": {
                        "s3": true,
                        "vpc": {"cidr": "10.0.0.0/16", "subnets": 2},
                        "rds": {"engine": "postgres"}
                    },
                    "external": ["stripe", "stripe", "sendgrid"]
                },
                "deployment": {
                    "ci": "github-actions",
                    "terraformHints": {"variables": {"region": "us-east-1"}}
                },
                "findings": [
                    {"type": "warning", "message": "no healthcheck", "project": "web"}
                ],
                "projects": [
                    {"name": "web", "root": "web", "serviceCount": 1},
                    {"name": "api", "root": "services/api", "serviceCount": 2}
                ]
            })
        );
    }

    #[test]
    fn nested_aws_objects_merge_recursively() {
        let a = doc(json!({"infrastructure": {"aws": {"ec2": {"type": "t3.micro", "tags": {"a": 1}}}}}));
        let b = doc(json!({"infrastructure": {"aws": {"ec2": {"type": "t3.large", "tags": {"b": 2}}}}}));
        let merged = merge(vec![a, b]).into_document().unwrap();
        assert_eq!(
            merged["infrastructure"]["aws"]["ec2"],
            json!({"type": "t3.large", "tags": {"a": 1, "b": 2}})
        );
    }

    #[test]
    fn scalar_aws_values_keep_first() {
        let a = doc(json!({"infrastructure": {"aws": {"lambda": "python3.12"}}}));
        let b = doc(json!({"infrastructure": {"aws": {"lambda": {"runtime": "node20"}}}}));
        let merged = merge(vec![a, b]).into_document().unwrap();
        assert_eq!(merged["infrastructure"]["aws"]["lambda"], "python3.12");
    }

    #[test]
    fn missing_names_and_roots_get_defaults() {
        let a = doc(json!({"services": [{"name": "x"}]}));
        let b = doc(json!({"services": ["y"]}));
        let merged = merge(vec![a, b]).into_document().unwrap();
        assert_eq!(
            merged["projects"],
            json!([
                {"name": "project-1", "root": ".", "serviceCount": 1},
                {"name": "project-2", "root": ".", "serviceCount": 1}
            ])
        );
        assert_eq!(merged["services"][1], json!({"name": "project-2/y", "project": "project-2"}));
    }

    #[test]
    fn first_empty_deployment_is_skipped() {
        let a = doc(json!({"deployment": {}}));
        let b = doc(json!({"deployment": {"buildTool": "maven"}}));
        let merged = merge(vec![a, b]).into_document().unwrap();
        assert_eq!(merged["deployment"], json!({"buildTool": "maven"}));
    }

    #[test]
    fn project_count_and_prefixes_hold_for_many_documents() {
        let docs: Vec<Metadata> = (0..5)
            .map(|i| {
                doc(json!({
                    "projectName": format!("p{i}"),
                    "services": (0..i).map(|s| json!({"name": format!("s{s}")})).collect::<Vec<_>>()
                }))
            })
            .collect();
        let merged = merge(docs).into_document().unwrap();
        assert_eq!(merged["projects"].as_array().unwrap().len(), 5);
        for service in merged["services"].as_array().unwrap() {
            let project = service["project"].as_str().unwrap();
            let name = service["name"].as_str().unwrap();
            assert!(name.starts_with(&format!("{project}/")), "{name}");
        }
    }
}

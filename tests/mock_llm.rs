//! Integration tests using a mock inference provider.
//!
//! Drives every entry point through `dispatch` against an in-memory blob
//! store, without making real API calls.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use iacforge::config::Config;
use iacforge::handlers::{dispatch, Endpoint, HandlerContext};
use iacforge::prompt::InferenceParams;
use iacforge::providers::{InferenceProvider, ProviderError};
use iacforge::storage::{BlobStore, MemoryBlobStore};

/// Answers each prompt kind with canned text and records every prompt.
#[derive(Default)]
struct MockProvider {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl InferenceProvider for MockProvider {
    async fn infer(&self, prompt: &str, _params: &InferenceParams) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let answer = if prompt.starts_with("Analyze project 'api'") {
            r#"```json
{"services":[{"name":"api","language":"node"}],
 "infrastructure":{"aws":{"ecr":true},"external":["stripe"]},
 "deployment":{"ci":"github"}}
```"#
        } else if prompt.starts_with("Analyze project 'infra'") {
            r#"{"services":["vpc"],"infrastructure":{"aws":{"vpc":true}},"findings":[{"type":"note","message":"no state backend"}]}"#
        } else if prompt.starts_with("Analyze") {
            "I could not tell."
        } else if prompt.contains("senior DevOps engineer") {
            "```hcl\nterraform {}\n```"
        } else if prompt.contains("financial analyst") {
            "42.50"
        } else if prompt.contains("GitHub Actions") {
            "```yaml\nname: deploy\n```"
        } else {
            "#!/bin/sh\necho deploy"
        };
        Ok(answer.to_string())
    }
}

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    buf.into_inner()
}

fn setup() -> (Arc<MemoryBlobStore>, Arc<MockProvider>, HandlerContext) {
    let store = Arc::new(MemoryBlobStore::new("test-bucket"));
    let provider = Arc::new(MockProvider::default());
    let ctx = HandlerContext::new(store.clone(), Some(provider.clone()), Config::default());
    (store, provider, ctx)
}

async fn call(ctx: &HandlerContext, endpoint: Endpoint, body: Value) -> (u16, Value) {
    let response = dispatch(ctx, endpoint, &json!({ "body": body.to_string() })).await;
    (response.status_code, response.body_json())
}

fn sample_archive() -> Vec<u8> {
    zip_bytes(&[
        ("api/package.json", r#"{"name":"api","scripts":{"start":"node index.js"}}"#),
        ("api/index.js", "console.log('hi')"),
        ("api/application.yml", "db_password: hunter2\nport: 3000"),
        ("api/node_modules/x/package.json", "{}"),
        ("infra/main.tf", "resource \"aws_vpc\" \"main\" {}"),
        ("infra/variables.tf", "variable \"region\" {}"),
    ])
}

#[tokio::test]
async fn upload_then_analyze_writes_merged_metadata() {
    let (store, provider, ctx) = setup();

    let (status, body) = call(&ctx, Endpoint::StartUpload, json!({})).await;
    assert_eq!(status, 200);
    let request_id = body["request_id"].as_str().unwrap().to_string();
    assert!(body["upload_url"].as_str().unwrap().contains("uploads/"));

    store.insert(
        format!("uploads/{request_id}/source.zip"),
        sample_archive(),
        "application/zip",
    );

    let (status, body) = call(
        &ctx,
        Endpoint::Analyze,
        json!({"request_id": request_id, "file_name": "source.zip"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "analysis complete");
    assert_eq!(body["projectsAnalyzed"], 2);
    assert_eq!(body["filesCollected"], 4);

    let raw = store
        .get(&format!("results/{request_id}/metadata.json"))
        .await
        .unwrap();
    let meta: Value = serde_json::from_slice(&raw).unwrap();
    let names: Vec<&str> = meta["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["api/api", "infra/vpc"]);
    assert_eq!(meta["infrastructure"]["aws"], json!({"ecr": true, "vpc": true}));
    assert_eq!(meta["projects"].as_array().unwrap().len(), 2);
    assert_eq!(meta["findings"][0]["project"], "infra");

    let prompts = provider.prompts.lock().unwrap();
    let api_prompt = prompts.iter().find(|p| p.contains("project 'api'")).unwrap();
    assert!(api_prompt.contains("db_password: ***REDACTED***"));
    assert!(!api_prompt.contains("hunter2"));
    assert!(!api_prompt.contains("node_modules"));
}

#[tokio::test]
async fn analyze_with_no_usable_project_still_succeeds() {
    let (store, _, ctx) = setup();
    store.insert(
        "uploads/r9/source.zip",
        zip_bytes(&[("README.md", "# docs only")]),
        "application/zip",
    );

    let (status, body) =
        call(&ctx, Endpoint::Analyze, json!({"request_id": "r9", "file_name": "source.zip"})).await;

    assert_eq!(status, 200);
    assert_eq!(body["projectsAnalyzed"], 0);
    assert_eq!(body["filesCollected"], 1);
    assert!(!store.head_exists("results/r9/metadata.json").await.unwrap());
}

#[tokio::test]
async fn survey_then_deliver() {
    let (store, _, ctx) = setup();
    store.insert("results/r1/metadata.json", r#"{"services":[]}"#, "application/json");

    let (status, body) = call(
        &ctx,
        Endpoint::Survey,
        json!({"request_id": "r1", "survey": {"users": 1000}}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["costs"], json!({"aws": "42.50", "gcp": "42.50", "azure": "42.50"}));
    for cloud in ["aws", "gcp", "azure"] {
        assert!(body["terraform_urls"][cloud].is_string(), "{cloud}");
    }

    let (status, body) =
        call(&ctx, Endpoint::Deliver, json!({"request_id": "r1", "cloud": "gcp"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["cloud"], "gcp");
    assert!(body["actions"].as_str().unwrap().contains("github-actions-gcp.yml"));
    assert!(body["cli"].as_str().unwrap().contains("cli-gcp.txt"));

    let (status, body) =
        call(&ctx, Endpoint::ActionsUrl, json!({"request_id": "r1", "cloud": "gcp"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["request_id"], "r1");
    assert!(body["presigned_url"].is_string());

    let workflow = store.get("results/r1/github-actions-gcp.yml").await.unwrap();
    assert_eq!(String::from_utf8(workflow).unwrap(), "name: deploy\n");
}

#[tokio::test]
async fn single_step_generation() {
    let (store, _, ctx) = setup();
    store.insert("results/r2/metadata.json", "{}", "application/json");

    let (status, body) = call(
        &ctx,
        Endpoint::Terraform,
        json!({"request_id": "r2", "cloud": "AWS", "survey": {"tier": "small"}}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "request_id": "r2",
            "provider": "aws",
            "terraform_key": "results/r2/terraform-aws.tf",
            "status": "success",
        })
    );

    let (status, body) = call(
        &ctx,
        Endpoint::Cost,
        json!({"request_id": "r2", "cloud": "aws", "terraform_key": "results/r2/terraform-aws.tf"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["cost"], "42.50");

    let (status, body) =
        call(&ctx, Endpoint::CliScript, json!({"request_id": "r2", "cloud": "aws"})).await;
    assert_eq!(status, 200);
    assert!(body["presigned_url"].as_str().unwrap().contains("cli-aws.txt"));
    assert_eq!(store.content_type("results/r2/cli-aws.txt").as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn client_errors() {
    let (_, provider, ctx) = setup();

    let (status, body) = call(&ctx, Endpoint::Actions, json!({"request_id": "r1"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "missing required field: cloud");
    assert_eq!(body["request_id"], "r1");

    let (status, body) =
        call(&ctx, Endpoint::Actions, json!({"request_id": "r1", "cloud": "oracle"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid cloud: must be one of: aws, azure, gcp");

    let (status, _) =
        call(&ctx, Endpoint::Analyze, json!({"request_id": "../etc", "file_name": "a.zip"})).await;
    assert_eq!(status, 400);

    let (status, _) =
        call(&ctx, Endpoint::ActionsUrl, json!({"request_id": "r1", "cloud": "aws"})).await;
    assert_eq!(status, 404);

    assert!(provider.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_archive_is_rejected() {
    let (store, _, ctx) = setup();
    store.insert("uploads/r3/source.zip", "not a zip", "application/zip");

    let (status, body) =
        call(&ctx, Endpoint::Analyze, json!({"request_id": "r3", "file_name": "source.zip"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["request_id"], "r3");
}

#[tokio::test]
async fn oversized_prompt_is_refused_before_the_call() {
    let store = Arc::new(MemoryBlobStore::new("b"));
    let provider = Arc::new(MockProvider::default());
    let mut config = Config::default();
    config.limits.payload_ceiling_bytes = 64;
    let ctx = HandlerContext::new(store.clone(), Some(provider.clone()), config);
    store.insert("results/r4/metadata.json", "{}", "application/json");

    let (status, _) = call(
        &ctx,
        Endpoint::Terraform,
        json!({"request_id": "r4", "cloud": "azure", "survey": {"a": 1}}),
    )
    .await;

    assert_eq!(status, 413);
    assert!(provider.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_provider_is_a_server_error() {
    let store = Arc::new(MemoryBlobStore::new("b"));
    let ctx = HandlerContext::new(store, None, Config::default());

    let (status, body) =
        call(&ctx, Endpoint::CliScript, json!({"request_id": "r5", "cloud": "aws"})).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "model request failed");
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn debug_query_adds_detail() {
    let store = Arc::new(MemoryBlobStore::new("b"));
    let ctx = HandlerContext::new(store, None, Config::default());
    let event = json!({
        "body": {"request_id": "r5", "cloud": "aws"},
        "queryStringParameters": {"debug": "yes"},
    });

    let response = dispatch(&ctx, Endpoint::CliScript, &event).await;
    let body = response.body_json();

    assert_eq!(response.status_code, 500);
    assert_eq!(body["detail"]["type"], "ProviderError");
    assert!(body["detail"]["message"].as_str().unwrap().contains("no inference provider"));
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
}

//! Clap argument types and the mapping from subcommands to handler events.

use clap::Parser;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use iacforge::constants::{DEFAULT_UPLOAD_NAME, ENV_BUCKET, ENV_STORAGE_DIR};
use iacforge::handlers::Endpoint;

/// Infrastructure-as-code generation from source archives.
#[derive(Parser, Debug)]
#[command(
    name = "iacforge",
    version = iacforge::constants::VERSION,
    about = super::ABOUT,
)]
pub struct Cli {
    /// Include error type and message in failure responses.
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Bucket name used for keys and URLs.
    #[arg(long, global = true, env = ENV_BUCKET)]
    pub bucket: Option<String>,

    /// Directory backing the blob store.
    #[arg(long, global = true, env = ENV_STORAGE_DIR)]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Issue a request id and an upload URL for its archive.
    UploadUrl,

    /// Analyse an uploaded archive and store its metadata.
    Analyze(AnalyzeArgs),

    /// Generate Terraform for one cloud.
    Terraform(TerraformArgs),

    /// Estimate the monthly cost of generated Terraform.
    Cost(CostArgs),

    /// Generate a GitHub Actions workflow.
    Actions(TargetArgs),

    /// Generate a CLI deployment script.
    CliScript(TargetArgs),

    /// Fetch the URL of a previously generated workflow.
    ActionsUrl(TargetArgs),

    /// Generate Terraform and cost estimates for every cloud.
    Survey(SurveyArgs),

    /// Produce the download set for one cloud.
    Deliver(TargetArgs),

    /// Dry run: show detected projects and the files that would be sent.
    Inspect(InspectArgs),

    /// Print version and build information.
    Version,
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub request_id: String,

    /// Object name of the archive under the request's upload prefix.
    #[arg(long, default_value = DEFAULT_UPLOAD_NAME)]
    pub file_name: String,

    /// Local archive to place in the store before analysing.
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

/// A request id and a cloud.
#[derive(Parser, Debug)]
pub struct TargetArgs {
    #[arg(long)]
    pub request_id: String,

    /// One of aws, azure, gcp.
    #[arg(long)]
    pub cloud: String,
}

/// Arguments for the `terraform` subcommand.
#[derive(Parser, Debug)]
pub struct TerraformArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Survey answers as JSON, or `@path` to a JSON file.
    #[arg(long, value_parser = parse_survey)]
    pub survey: Value,
}

/// Arguments for the `cost` subcommand.
#[derive(Parser, Debug)]
pub struct CostArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Terraform object to price (defaults to the cloud's generated file).
    #[arg(long)]
    pub terraform_key: Option<String>,
}

/// Arguments for the `survey` subcommand.
#[derive(Parser, Debug)]
pub struct SurveyArgs {
    #[arg(long)]
    pub request_id: String,

    /// Survey answers as JSON, or `@path` to a JSON file.
    #[arg(long, value_parser = parse_survey)]
    pub survey: Value,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// ZIP archive to inspect.
    pub archive: PathBuf,
}

/// Parse `--survey` from inline JSON or `@file`.
fn parse_survey(raw: &str) -> Result<Value, String> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {path}: {e}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid survey JSON: {e}"))
}

impl TargetArgs {
    fn fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("request_id".into(), json!(self.request_id));
        map.insert("cloud".into(), json!(self.cloud));
        map
    }
}

impl Command {
    /// The handler this command runs and the event it sends, or `None` for
    /// commands that run locally.
    pub fn event(&self) -> Option<(Endpoint, Value)> {
        let (endpoint, body) = match self {
            Command::UploadUrl => (Endpoint::StartUpload, Map::new()),
            Command::Analyze(args) => {
                let mut map = Map::new();
                map.insert("request_id".into(), json!(args.request_id));
                map.insert("file_name".into(), json!(args.file_name));
                (Endpoint::Analyze, map)
            }
            Command::Terraform(args) => {
                let mut map = args.target.fields();
                map.insert("survey".into(), args.survey.clone());
                (Endpoint::Terraform, map)
            }
            Command::Cost(args) => {
                let mut map = args.target.fields();
                if let Some(key) = &args.terraform_key {
                    map.insert("terraform_key".into(), json!(key));
                }
                (Endpoint::Cost, map)
            }
            Command::Actions(args) => (Endpoint::Actions, args.fields()),
            Command::CliScript(args) => (Endpoint::CliScript, args.fields()),
            Command::ActionsUrl(args) => (Endpoint::ActionsUrl, args.fields()),
            Command::Survey(args) => {
                let mut map = Map::new();
                map.insert("request_id".into(), json!(args.request_id));
                map.insert("survey".into(), args.survey.clone());
                (Endpoint::Survey, map)
            }
            Command::Deliver(args) => (Endpoint::Deliver, args.fields()),
            Command::Inspect(_) | Command::Version => return None,
        };
        Some((endpoint, json!({ "body": Value::Object(body) })))
    }
}

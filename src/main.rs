//! iacforge: infrastructure-as-code generation from source archives.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use iacforge::analysis;
use iacforge::archive::SourceArchive;
use iacforge::config::Config;
use iacforge::constants;
use iacforge::env::Env;
use iacforge::handlers::{self, HandlerContext};
use iacforge::providers::rig::RigProvider;
use iacforge::providers::InferenceProvider;
use iacforge::storage::{self, BlobStore, FsBlobStore};

use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::args::{AnalyzeArgs, Cli, Command, InspectArgs};

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(constants::ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Version => return run_version(),
        Command::Inspect(args) => return run_inspect(args, &cli).await,
        _ => {}
    }

    let config = load_config(&cli)?;
    let store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::from_config(&config.storage));

    if let Command::Analyze(args) = &cli.command {
        stage_archive(store.as_ref(), args).await?;
    }

    let provider: Option<Arc<dyn InferenceProvider>> =
        match RigProvider::new(config.provider.clone()) {
            Ok(p) => Some(Arc::new(p)),
            Err(e) => {
                warn!("{e}");
                None
            }
        };

    let Some((endpoint, event)) = cli.command.event() else {
        return Ok(());
    };
    let ctx = HandlerContext::new(store, provider, config);
    let response = handlers::dispatch(&ctx, endpoint, &event).await;

    let rendered =
        serde_json::to_string_pretty(&response).context("failed to encode response")?;
    println!("{rendered}");

    if response.status_code >= 400 {
        bail!("{endpoint} failed with status {}", response.status_code);
    }
    Ok(())
}

/// Layered config plus command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let mut config =
        Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")?;

    if let Some(bucket) = &cli.bucket {
        config.storage.bucket = bucket.clone();
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage.root = Some(dir.clone());
    }
    if cli.debug {
        config.debug = true;
    }
    Ok(config)
}

/// Copy a local archive into the request's upload slot.
async fn stage_archive(store: &dyn BlobStore, args: &AnalyzeArgs) -> Result<()> {
    let Some(path) = &args.archive else {
        return Ok(());
    };
    let bytes = read_archive(path).await?;
    let key = storage::upload_key(&args.request_id, &args.file_name)?;
    store
        .put(&key, bytes, "application/zip")
        .await
        .with_context(|| format!("failed to store archive at {key}"))?;
    Ok(())
}

/// Print version and build information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Detect projects and allocate the budget for a local archive, no model
/// call.
async fn run_inspect(args: &InspectArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let bytes = read_archive(&args.archive).await?;
    let mut archive = SourceArchive::from_bytes(bytes)
        .with_context(|| format!("failed to open {}", args.archive.display()))?;

    let names = archive.file_names().to_vec();
    let selections = analysis::select(&names, &mut archive, &config.limits);

    let stdout = std::io::stdout();
    cli::write_inspection(&mut stdout.lock(), names.len(), &selections)
        .context("failed to write output")?;
    Ok(())
}

async fn read_archive(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

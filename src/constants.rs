//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! storage key prefixes and default limits so a rename only requires
//! changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "iacforge";

/// Crate version, baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple (set by `build.rs`).
pub const TARGET: &str = env!("TARGET");

/// Local config filename (e.g. `.iacforge.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".iacforge.toml";

/// Directory name under `~/.config/` for global config and local storage.
pub const CONFIG_DIR: &str = "iacforge";

/// Default bucket name used by the blob store.
pub const DEFAULT_BUCKET: &str = "deployment-tr-bucket";

// ── Storage key layout ──────────────────────────────────────────────

pub const UPLOADS_PREFIX: &str = "uploads";
pub const RESULTS_PREFIX: &str = "results";

/// File name the upload handler reserves for the source archive.
pub const DEFAULT_UPLOAD_NAME: &str = "source.zip";

/// Presigned PUT URL lifetime for archive uploads.
pub const UPLOAD_URL_EXPIRY_SECS: u64 = 300;

/// Presigned GET URL lifetime for generated artifacts.
pub const ARTIFACT_URL_EXPIRY_SECS: u64 = 3600;

// ── Analysis limits ─────────────────────────────────────────────────

pub const MAX_FILES_PER_PROJECT: usize = 50;
pub const MAX_TOTAL_FILES: usize = 120;
/// Per-file ceiling on sanitized (minified) text.
pub const MAX_BYTES_PER_FILE: usize = 16_000;
/// Ceiling on sanitized text summed over every project.
pub const MAX_TOTAL_BYTES: usize = 350_000;
pub const MAX_LINE_CHARS: usize = 200;
/// Serialized inference request ceiling, checked before any call.
pub const PAYLOAD_CEILING_BYTES: usize = 1_200_000;

/// Characters of an error message kept in debug response bodies.
pub const SAFE_ERROR_SLICE: usize = 500;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "IACFORGE_PROVIDER";
pub const ENV_MODEL: &str = "IACFORGE_MODEL";
pub const ENV_API_KEY: &str = "IACFORGE_API_KEY";
pub const ENV_BASE_URL: &str = "IACFORGE_BASE_URL";
pub const ENV_BUCKET: &str = "IACFORGE_BUCKET";
pub const ENV_STORAGE_DIR: &str = "IACFORGE_STORAGE_DIR";
pub const ENV_SIGNING_KEY: &str = "IACFORGE_SIGNING_KEY";
pub const ENV_LOG: &str = "IACFORGE_LOG";
pub const ENV_DEBUG: &str = "DEBUG";

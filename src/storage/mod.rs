//! Blob storage for uploaded archives and generated artifacts.
//!
//! Handlers only see the [`BlobStore`] trait. Keys follow a fixed layout:
//! uploads at `uploads/{request_id}/{file}`, artifacts at
//! `results/{request_id}/{artifact}`.

pub mod fs;
pub mod memory;

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::constants::{RESULTS_PREFIX, UPLOADS_PREFIX};
use crate::models::CloudProvider;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Errors from a blob store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("invalid object key component: {0:?}")]
    InvalidKey(String),

    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("invalid presigned URL: {0}")]
    InvalidUrl(String),

    #[error("presigned URL expired")]
    Expired,

    #[error("unusable URL signing key")]
    SigningKey,
}

type HmacSha256 = Hmac<Sha256>;

/// Operation a presigned URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum UrlMethod {
    Get,
    Put,
}

pub const METADATA_FILE: &str = "metadata.json";

/// Generated artifacts stored under `results/{request_id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Metadata,
    Terraform,
    Actions,
    CliScript,
}

impl ArtifactKind {
    /// Object name for this artifact. `Metadata` ignores the cloud.
    pub fn file_name(self, cloud: CloudProvider) -> String {
        match self {
            ArtifactKind::Metadata => METADATA_FILE.to_string(),
            ArtifactKind::Terraform => format!("terraform-{cloud}.tf"),
            ArtifactKind::Actions => format!("github-actions-{cloud}.yml"),
            ArtifactKind::CliScript => format!("cli-{cloud}.txt"),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Metadata => "application/json",
            ArtifactKind::Terraform | ArtifactKind::CliScript => "text/plain",
            ArtifactKind::Actions => "text/yaml",
        }
    }
}

/// A single bucket of blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Bucket this store is scoped to.
    fn bucket(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `bytes` under `key`. The content type is kept with the object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    async fn head_exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Time-limited URL granting `method` on `key`.
    async fn presigned_url(
        &self,
        key: &str,
        method: UrlMethod,
        expiry_secs: u64,
    ) -> Result<String, StorageError>;
}

/// Reject identifiers that could escape their key prefix.
pub fn validate_component(component: &str) -> Result<&str, StorageError> {
    let invalid = component.is_empty()
        || component.contains('/')
        || component.contains('\\')
        || component.contains("..");
    if invalid {
        return Err(StorageError::InvalidKey(component.to_string()));
    }
    Ok(component)
}

/// `uploads/{request_id}/{file_name}`
pub fn upload_key(request_id: &str, file_name: &str) -> Result<String, StorageError> {
    Ok(format!(
        "{UPLOADS_PREFIX}/{}/{}",
        validate_component(request_id)?,
        validate_component(file_name)?
    ))
}

/// `results/{request_id}/{artifact}`
pub fn result_key(request_id: &str, artifact: &str) -> Result<String, StorageError> {
    Ok(format!(
        "{RESULTS_PREFIX}/{}/{}",
        validate_component(request_id)?,
        validate_component(artifact)?
    ))
}

/// `results/{request_id}/metadata.json`
pub fn metadata_key(request_id: &str) -> Result<String, StorageError> {
    result_key(request_id, METADATA_FILE)
}

/// Key of a generated artifact for one cloud.
pub fn artifact_key(
    request_id: &str,
    kind: ArtifactKind,
    cloud: CloudProvider,
) -> Result<String, StorageError> {
    result_key(request_id, &kind.file_name(cloud))
}

/// HMAC-SHA256 over the canonical `method\nbucket\nkey\nexpires` string.
fn url_mac(
    secret: &str,
    method: UrlMethod,
    bucket: &str,
    key: &str,
    expires: u64,
) -> Result<HmacSha256, StorageError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| StorageError::SigningKey)?;
    mac.update(format!("{method}\n{bucket}\n{key}\n{expires}").as_bytes());
    Ok(mac)
}

/// Hex signature binding a URL to its method, object and expiry.
pub fn sign(
    secret: &str,
    method: UrlMethod,
    bucket: &str,
    key: &str,
    expires: u64,
) -> Result<String, StorageError> {
    let mac = url_mac(secret, method, bucket, key, expires)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature produced by [`sign`] in constant time.
pub fn verify_signature(
    secret: &str,
    method: UrlMethod,
    bucket: &str,
    key: &str,
    expires: u64,
    signature: &str,
) -> Result<(), StorageError> {
    let expected = hex::decode(signature)
        .map_err(|_| StorageError::InvalidUrl("malformed signature".to_string()))?;
    url_mac(secret, method, bucket, key, expires)?
        .verify_slice(&expected)
        .map_err(|_| StorageError::InvalidUrl("signature mismatch".to_string()))
}

/// Seconds since the Unix epoch.
pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

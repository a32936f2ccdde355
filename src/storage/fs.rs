//! Filesystem-backed blob store.
//!
//! Objects live at `<root>/<bucket>/<key>`, their content types at
//! `<root>/.content-types/<bucket>/<key>`. Presigned URLs are `file://`
//! URLs carrying the granted method, an expiry and a signature, so a
//! local uploader can be checked with [`FsBlobStore::verify_presigned`].

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::config::StorageConfig;

use super::{now_unix, sign, verify_signature, BlobStore, StorageError, UrlMethod};

const CONTENT_TYPES_DIR: &str = ".content-types";

pub struct FsBlobStore {
    root: PathBuf,
    bucket: String,
    signing_key: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. Without a signing key an ephemeral
    /// one is generated, so URLs only verify within this process.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, signing_key: Option<String>) -> Self {
        let signing_key = signing_key.unwrap_or_else(|| {
            warn!("no signing key configured; presigned URLs will not survive a restart");
            uuid::Uuid::new_v4().to_string()
        });
        let root = root.into();
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
            bucket: bucket.into(),
            signing_key,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.resolved_root(),
            config.bucket.clone(),
            config.signing_key.clone(),
        )
    }

    /// Directory holding this store's bucket.
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::key_path(self.bucket_dir(), key)
    }

    fn content_type_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::key_path(self.root.join(CONTENT_TYPES_DIR).join(&self.bucket), key)
    }

    fn key_path(mut path: PathBuf, key: &str) -> Result<PathBuf, StorageError> {
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Content type recorded by the last `put` of `key`, if any.
    pub async fn content_type(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.content_type_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content_type) => Ok(Some(content_type)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn signed_url(&self, key: &str, method: UrlMethod, expires: u64) -> Result<String, StorageError> {
        let path = self.object_path(key)?;
        let signature = sign(&self.signing_key, method, &self.bucket, key, expires)?;
        let mut url = Url::from_file_path(&path).map_err(|_| {
            StorageError::InvalidUrl(format!("not an absolute path: {}", path.display()))
        })?;
        url.query_pairs_mut()
            .append_pair("method", &method.to_string())
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        Ok(url.to_string())
    }

    fn not_found(&self, key: &str) -> StorageError {
        StorageError::NotFound {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        }
    }

    /// Check a URL issued by this store for `method`; returns the object key.
    pub fn verify_presigned(&self, url: &str, method: UrlMethod) -> Result<String, StorageError> {
        let url = Url::parse(url).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        if url.scheme() != "file" {
            return Err(StorageError::InvalidUrl("not a file:// URL".to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|_| StorageError::InvalidUrl("not a local path".to_string()))?;

        let mut granted = None;
        let mut expires = None;
        let mut signature = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "method" => granted = value.parse::<UrlMethod>().ok(),
                "expires" => expires = value.parse::<u64>().ok(),
                "signature" => signature = Some(value.into_owned()),
                _ => {}
            }
        }
        let (granted, expires, signature) = match (granted, expires, signature) {
            (Some(m), Some(e), Some(s)) => (m, e, s),
            _ => return Err(StorageError::InvalidUrl("incomplete query".to_string())),
        };
        if granted != method {
            return Err(StorageError::InvalidUrl(format!(
                "URL grants {granted}, not {method}"
            )));
        }

        let bucket_dir = self.bucket_dir();
        let key = path
            .strip_prefix(&bucket_dir)
            .map_err(|_| StorageError::InvalidUrl("path outside bucket".to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        self.object_path(&key)?;

        verify_signature(&self.signing_key, granted, &self.bucket, &key, expires, &signature)?;
        if now_unix() > expires {
            return Err(StorageError::Expired);
        }
        Ok(key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(self.not_found(key)),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        let type_path = self.content_type_path(key)?;
        for dir in [path.parent(), type_path.parent()].into_iter().flatten() {
            tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        }
        debug!(key, content_type, bytes = bytes.len(), "writing object");
        tokio::fs::write(&path, bytes).await.map_err(io_err)?;
        tokio::fs::write(&type_path, content_type).await.map_err(io_err)
    }

    async fn head_exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })
    }

    async fn presigned_url(
        &self,
        key: &str,
        method: UrlMethod,
        expiry_secs: u64,
    ) -> Result<String, StorageError> {
        self.signed_url(key, method, now_unix() + expiry_secs)
    }
}

//! In-process blob store for tests and dry runs.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use url::Url;

use super::{now_unix, BlobStore, StorageError, UrlMethod};

#[derive(Debug, Clone)]
struct Object {
    bytes: Vec<u8>,
    content_type: String,
}

/// Map-backed [`BlobStore`]. URLs use a `memory://` scheme and are not
/// signed.
#[derive(Debug)]
pub struct MemoryBlobStore {
    bucket: String,
    objects: Mutex<IndexMap<String, Object>>,
}

impl MemoryBlobStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(IndexMap::new()),
        }
    }

    fn objects(&self) -> MutexGuard<'_, IndexMap<String, Object>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stored keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects().get(key).map(|o| o.content_type.clone())
    }

    /// Insert without going through the async trait.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>, content_type: &str) {
        self.objects().insert(
            key.into(),
            Object {
                bytes: bytes.into(),
                content_type: content_type.to_string(),
            },
        );
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects()
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            })
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.insert(key, bytes, content_type);
        Ok(())
    }

    async fn head_exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects().contains_key(key))
    }

    async fn presigned_url(
        &self,
        key: &str,
        method: UrlMethod,
        expiry_secs: u64,
    ) -> Result<String, StorageError> {
        let expires = now_unix() + expiry_secs;
        let mut url = Url::parse(&format!("memory://{}", self.bucket))
            .map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(format!("bucket {:?}", self.bucket)))?
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("method", &method.to_string())
            .append_pair("expires", &expires.to_string());
        Ok(url.to_string())
    }
}

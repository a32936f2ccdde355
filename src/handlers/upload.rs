//! Upload slot issuance.

use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::constants::DEFAULT_UPLOAD_NAME;
use crate::storage::{self, UrlMethod};

use super::{HandlerContext, HandlerError, Request};

/// Mint a request id and a short-lived PUT URL for its source archive.
pub async fn start_upload(ctx: &HandlerContext, _req: &Request) -> Result<Value, HandlerError> {
    let request_id = Uuid::new_v4().to_string();
    let key = storage::upload_key(&request_id, DEFAULT_UPLOAD_NAME)?;
    let upload_url = ctx
        .store
        .presigned_url(&key, UrlMethod::Put, ctx.config.storage.upload_url_expiry_secs)
        .await?;
    info!(request_id = %request_id, key = %key, "issued upload URL");

    Ok(json!({
        "upload_url": upload_url,
        "request_id": request_id,
    }))
}

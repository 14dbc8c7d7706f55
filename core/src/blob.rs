//! Blob transfers over signed URLs.
//!
//! The store behind the URLs is opaque: GET returns full content, PUT
//! accepts full content. No retries; a single failed transfer is fatal
//! for the whole task.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::error::WorkerError;

/// Bound on any single GET or PUT.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BlobClient {
    http: reqwest::Client,
}

impl BlobClient {
    pub fn new() -> Result<Self, WorkerError> {
        let http = reqwest::Client::builder()
            .timeout(TRANSFER_TIMEOUT)
            .build()
            .map_err(WorkerError::Client)?;
        Ok(Self { http })
    }

    /// GET the full content behind `url`. `what` names the blob in the
    /// empty-reference error ("code", "requirements", ...).
    pub async fn fetch(&self, url: &str, what: &'static str) -> Result<Bytes, WorkerError> {
        if url.is_empty() {
            return Err(WorkerError::InvalidReference { what });
        }
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport("get", url, e))?;
        resp.bytes().await.map_err(|e| transport("get", url, e))
    }

    /// PUT `body` to `url` with an explicit length and octet-stream
    /// content type.
    pub async fn push(&self, url: &str, body: &[u8]) -> Result<(), WorkerError> {
        if url.is_empty() {
            return Err(WorkerError::InvalidReference {
                what: "output upload",
            });
        }
        self.http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, body.len())
            .body(body.to_vec())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport("put", url, e))?;
        Ok(())
    }
}

fn transport(op: &'static str, url: &str, source: reqwest::Error) -> WorkerError {
    WorkerError::Transport {
        op,
        url: url.to_string(),
        source,
    }
}

//! Range-aware HTTP(S) source (spec section 4.1, "Range-aware URL
//! source"; section 6, "Network transport").

use super::{resolve_range, AsyncSource};
use crate::error::{ParquetError, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Fetches byte ranges over HTTP(S) using `Range` requests. Falls back to
/// a `GET` with `Range: bytes=0-0` when a `HEAD` is refused or omits
/// `Content-Length`; falls back to fetching and memoising the whole body
/// locally when the server ignores `Range` and returns `200 OK` instead
/// of `206 Partial Content`.
pub struct UrlSource {
    client: reqwest::Client,
    url: String,
    len: tokio::sync::OnceCell<u64>,
    whole_body: tokio::sync::OnceCell<Bytes>,
}

impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        UrlSource {
            client: reqwest::Client::new(),
            url: url.into(),
            len: tokio::sync::OnceCell::new(),
            whole_body: tokio::sync::OnceCell::new(),
        }
    }

    async fn discover_length(&self) -> Result<u64> {
        let head = self
            .client
            .head(&self.url)
            .send()
            .await
            .map_err(|e| ParquetError::SourceError(e.to_string()))?;
        if head.status().is_success() {
            if let Some(len) = content_length(head.headers()) {
                return Ok(len);
            }
        }

        // HEAD was refused, or lacked Content-Length: probe with a 0-0
        // ranged GET instead (spec section 4.1).
        let probe = self
            .client
            .get(&self.url)
            .header(reqwest::header::RANGE, "bytes=0-0")
            .send()
            .await
            .map_err(|e| ParquetError::SourceError(e.to_string()))?;
        if let Some(total) = content_range_total(probe.headers()) {
            return Ok(total);
        }
        if let Some(len) = content_length(probe.headers()) {
            return Ok(len);
        }
        Err(ParquetError::SourceError(format!(
            "could not determine the length of {}: server returned neither Content-Length \
             nor Content-Range on HEAD or a 0-0 ranged GET",
            self.url
        )))
    }

    async fn fetch_range(&self, abs_start: u64, abs_end: u64) -> Result<Bytes> {
        let response = self
            .client
            .get(&self.url)
            .header(
                reqwest::header::RANGE,
                format!("bytes={}-{}", abs_start, abs_end.saturating_sub(1)),
            )
            .send()
            .await
            .map_err(|e| ParquetError::SourceError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::PARTIAL_CONTENT {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ParquetError::SourceError(e.to_string()))?;
            return Ok(bytes);
        }

        if response.status().is_success() {
            // Server ignored Range and is returning the whole object:
            // drop this response (cancelling its body stream) and fall
            // back to memoising the full body once (spec section 5,
            // "Cancellation").
            drop(response);
            let whole = self.fetch_whole_body_once().await?;
            let abs_start = abs_start as usize;
            let abs_end = (abs_end as usize).min(whole.len());
            return Ok(whole.slice(abs_start..abs_end));
        }

        Err(ParquetError::SourceError(format!(
            "range request to {} failed with status {}",
            self.url,
            response.status()
        )))
    }

    async fn fetch_whole_body_once(&self) -> Result<Bytes> {
        if let Some(body) = self.whole_body.get() {
            return Ok(body.clone());
        }
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ParquetError::SourceError(e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ParquetError::SourceError(e.to_string()))?;
        let _ = self.whole_body.set(body.clone());
        Ok(body)
    }
}

fn content_length(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Parses the `size` out of a `Content-Range: bytes 0-0/size` header.
fn content_range_total(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let value = headers.get(reqwest::header::CONTENT_RANGE)?.to_str().ok()?;
    let total = value.rsplit('/').next()?;
    total.parse().ok()
}

#[async_trait]
impl AsyncSource for UrlSource {
    async fn byte_length(&self) -> Result<u64> {
        if let Some(len) = self.len.get() {
            return Ok(*len);
        }
        let len = self.discover_length().await?;
        let _ = self.len.set(len);
        Ok(len)
    }

    async fn slice(&self, start: i64, end: Option<i64>) -> Result<Bytes> {
        let len = self.byte_length().await?;
        let (abs_start, abs_end) = resolve_range(start, end, len)?;
        self.fetch_range(abs_start, abs_end).await
    }
}

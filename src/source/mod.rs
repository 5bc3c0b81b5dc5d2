//! `AsyncSource` (spec section 4.1): the single I/O seam the rest of this
//! crate suspends on. Everything above this module -- metadata, planning,
//! page decoding, assembly -- is synchronous over in-memory byte slices;
//! only [`AsyncSource::slice`] may await.

#[cfg(feature = "url")]
mod url_source;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

#[cfg(feature = "url")]
pub use url_source::UrlSource;

/// Supplies byte ranges of a Parquet file on demand. Implementations must
/// be re-entrant: the planner issues concurrent `slice` calls and awaits
/// them as they complete (spec section 5).
#[async_trait]
pub trait AsyncSource: Send + Sync {
    /// The total size of the underlying object, known up front.
    async fn byte_length(&self) -> Result<u64>;

    /// Fetches `[start, end)`. `end = None` means "to EOF". A negative
    /// `start` means "the last `-start` bytes of the object" (a suffix
    /// range); it is an error to combine a negative `start` with a
    /// non-`None` `end`.
    async fn slice(&self, start: i64, end: Option<i64>) -> Result<Bytes>;
}

/// A local file, read by absolute byte offset (spec section 6, "File
/// format" transport).
pub struct FileSource {
    path: std::path::PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

#[async_trait]
impl AsyncSource for FileSource {
    async fn byte_length(&self) -> Result<u64> {
        let meta = std::fs::metadata(&self.path)
            .map_err(|e| crate::error::ParquetError::SourceError(e.to_string()))?;
        Ok(meta.len())
    }

    async fn slice(&self, start: i64, end: Option<i64>) -> Result<Bytes> {
        use std::io::{Read, Seek, SeekFrom};
        let len = self.byte_length().await?;
        let (abs_start, abs_end) = resolve_range(start, end, len)?;
        let mut file = std::fs::File::open(&self.path)
            .map_err(|e| crate::error::ParquetError::SourceError(e.to_string()))?;
        file.seek(SeekFrom::Start(abs_start))
            .map_err(|e| crate::error::ParquetError::SourceError(e.to_string()))?;
        let mut buf = vec![0u8; (abs_end - abs_start) as usize];
        file.read_exact(&mut buf)
            .map_err(|e| crate::error::ParquetError::SourceError(e.to_string()))?;
        Ok(Bytes::from(buf))
    }
}

/// An in-memory byte buffer, mainly for tests.
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        MemorySource { data: data.into() }
    }
}

#[async_trait]
impl AsyncSource for MemorySource {
    async fn byte_length(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn slice(&self, start: i64, end: Option<i64>) -> Result<Bytes> {
        let (abs_start, abs_end) = resolve_range(start, end, self.data.len() as u64)?;
        Ok(self.data.slice(abs_start as usize..abs_end as usize))
    }
}

/// Resolves `(start, end)` against a known `len`, handling suffix ranges
/// and the "to EOF" `None` end (spec section 4.1).
pub(crate) fn resolve_range(start: i64, end: Option<i64>, len: u64) -> Result<(u64, u64)> {
    if start < 0 {
        if end.is_some() {
            return Err(crate::error::ParquetError::ArgumentError(
                "a suffix range (negative start) cannot also specify an end".to_owned(),
            ));
        }
        let suffix = (-start) as u64;
        let abs_start = len.saturating_sub(suffix);
        return Ok((abs_start, len));
    }
    let abs_start = start as u64;
    let abs_end = match end {
        Some(e) if e < 0 => {
            return Err(crate::error::ParquetError::ArgumentError(
                "end must not be negative when start is non-negative".to_owned(),
            ))
        }
        Some(e) => e as u64,
        None => len,
    };
    if abs_start > abs_end {
        return Err(crate::error::ParquetError::ArgumentError(format!(
            "slice start {} is after end {}",
            abs_start, abs_end
        )));
    }
    Ok((abs_start, abs_end.min(len)))
}

/// Canonicalises a `(start, end)` pair to a cache key, rewriting suffix
/// ranges to their positive form once `len` is known so that `[-n]` and
/// `[len-n, len]` collide (spec section 4.1, "Cache").
fn cache_key(start: i64, end: Option<i64>, len: u64) -> Result<String> {
    let (abs_start, abs_end) = resolve_range(start, end, len)?;
    Ok(format!("{}-{}", abs_start, abs_end))
}

/// Wraps any [`AsyncSource`] with a byte-range cache: concurrent requests
/// for the same canonical range share one pending fetch, and the length is
/// memoised after the first call (spec section 4.1, "Cache").
pub struct CacheSource<S> {
    inner: S,
    len: tokio::sync::OnceCell<u64>,
    pending: tokio::sync::Mutex<std::collections::HashMap<String, std::sync::Arc<tokio::sync::Mutex<Option<Bytes>>>>>,
}

impl<S: AsyncSource> CacheSource<S> {
    pub fn new(inner: S) -> Self {
        CacheSource {
            inner,
            len: tokio::sync::OnceCell::new(),
            pending: tokio::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[async_trait]
impl<S: AsyncSource> AsyncSource for CacheSource<S> {
    async fn byte_length(&self) -> Result<u64> {
        if let Some(len) = self.len.get() {
            return Ok(*len);
        }
        let len = self.inner.byte_length().await?;
        let _ = self.len.set(len);
        Ok(len)
    }

    async fn slice(&self, start: i64, end: Option<i64>) -> Result<Bytes> {
        let len = self.byte_length().await?;
        let key = cache_key(start, end, len)?;

        let slot = {
            let mut pending = self.pending.lock().await;
            pending
                .entry(key)
                .or_insert_with(|| std::sync::Arc::new(tokio::sync::Mutex::new(None)))
                .clone()
        };

        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let fetched = self.inner.slice(start, end).await?;
        *guard = Some(fetched.clone());
        Ok(fetched)
    }
}

/// Wraps `source` in a [`CacheSource`] (spec section 6, `cachedSource`).
pub fn cached_source<S: AsyncSource>(source: S) -> CacheSource<S> {
    CacheSource::new(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_suffix_ranges() {
        let (start, end) = resolve_range(-10, None, 100).unwrap();
        assert_eq!((start, end), (90, 100));
    }

    #[test]
    fn rejects_suffix_combined_with_end() {
        assert!(resolve_range(-10, Some(50), 100).is_err());
    }

    #[test]
    fn collides_suffix_and_equivalent_absolute_range() {
        let a = cache_key(-10, None, 100).unwrap();
        let b = cache_key(90, Some(100), 100).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn memory_source_slices_forward_range() {
        let src = MemorySource::new(Bytes::from_static(b"hello world"));
        let slice = src.slice(0, Some(5)).await.unwrap();
        assert_eq!(&slice[..], b"hello");
    }

    #[tokio::test]
    async fn memory_source_slices_suffix_range() {
        let src = MemorySource::new(Bytes::from_static(b"hello world"));
        let slice = src.slice(-5, None).await.unwrap();
        assert_eq!(&slice[..], b"world");
    }

    #[tokio::test]
    async fn cache_source_memoises_equivalent_ranges() {
        let src = CacheSource::new(MemorySource::new(Bytes::from_static(b"hello world")));
        let a = src.slice(-5, None).await.unwrap();
        let b = src.slice(6, Some(11)).await.unwrap();
        assert_eq!(a, b);
    }
}

//! Error types returned by this crate.

/// The closed set of error kinds this crate can return.
///
/// The variants are stable across the language targets this decoder has been
/// ported from: each one names a single failure class from the format
/// specification rather than wrapping an underlying library error directly.
#[derive(Debug)]
pub enum ParquetError {
    /// Missing/mispositioned magic, or a metadata length that does not fit
    /// the file.
    InvalidFile(String),
    /// The decoder ran past the end of a page, chunk, or stream.
    TruncatedInput(String),
    /// An encoding is recognized but not implemented by this build.
    UnsupportedEncoding(String),
    /// A compression codec is recognized but not available (feature not
    /// enabled, or not a codec this crate ships at all).
    UnsupportedCodec(String),
    /// A logical type is recognized but has no conversion rule.
    UnsupportedLogicalType(String),
    /// A page type other than `DATA_PAGE`/`DATA_PAGE_V2`/`DICTIONARY_PAGE`
    /// was asked to be decoded (`INDEX_PAGE` is skipped, not an error).
    UnsupportedPageType(String),
    /// A codec returned the wrong number of bytes, or signalled an error.
    DecompressionFailure(String),
    /// A referenced schema element was not found, or a group does not meet
    /// the structural requirements of a list/map.
    SchemaError(String),
    /// A structural invariant of the Dremel assembler was violated.
    AssemblyError(String),
    /// A transport-level failure: HTTP status, network, local I/O.
    SourceError(String),
    /// A caller-supplied argument was invalid (negative `rowStart`,
    /// malformed filter, ...).
    ArgumentError(String),
    /// General catch-all, kept for parity with the teacher crate's
    /// `General`/`OutOfSpec` split; prefer a specific variant above.
    General(String),
    /// The file is well-formed Thrift/Parquet but violates a documented
    /// invariant of the format (e.g. a `num_children` that overruns the
    /// flattened schema array).
    OutOfSpec(String),
}

impl std::error::Error for ParquetError {}

impl std::fmt::Display for ParquetError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ParquetError::*;
        match self {
            InvalidFile(m) => write!(fmt, "invalid parquet file: {}", m),
            TruncatedInput(m) => write!(fmt, "truncated input: {}", m),
            UnsupportedEncoding(m) => write!(fmt, "unsupported encoding: {}", m),
            UnsupportedCodec(m) => write!(fmt, "unsupported codec: {}", m),
            UnsupportedLogicalType(m) => write!(fmt, "unsupported logical type: {}", m),
            UnsupportedPageType(m) => write!(fmt, "unsupported page type: {}", m),
            DecompressionFailure(m) => write!(fmt, "decompression failure: {}", m),
            SchemaError(m) => write!(fmt, "schema error: {}", m),
            AssemblyError(m) => write!(fmt, "assembly error: {}", m),
            SourceError(m) => write!(fmt, "source error: {}", m),
            ArgumentError(m) => write!(fmt, "argument error: {}", m),
            General(m) => write!(fmt, "{}", m),
            OutOfSpec(m) => write!(fmt, "out of spec: {}", m),
        }
    }
}

impl From<std::io::Error> for ParquetError {
    fn from(e: std::io::Error) -> ParquetError {
        ParquetError::SourceError(format!("underlying IO error: {}", e))
    }
}

impl From<std::str::Utf8Error> for ParquetError {
    fn from(e: std::str::Utf8Error) -> ParquetError {
        ParquetError::OutOfSpec(format!("invalid UTF-8: {}", e))
    }
}

impl From<std::string::FromUtf8Error> for ParquetError {
    fn from(e: std::string::FromUtf8Error) -> ParquetError {
        ParquetError::OutOfSpec(format!("invalid UTF-8: {}", e))
    }
}

impl From<serde_json::Error> for ParquetError {
    fn from(e: serde_json::Error) -> ParquetError {
        ParquetError::UnsupportedLogicalType(format!("invalid JSON payload: {}", e))
    }
}

/// A specialized `Result` for Parquet errors.
pub type Result<T> = std::result::Result<T, ParquetError>;

macro_rules! general_err {
    ($fmt:expr) => ($crate::error::ParquetError::General($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::error::ParquetError::General(format!($fmt, $($args),*)));
}

macro_rules! out_of_spec_err {
    ($fmt:expr) => ($crate::error::ParquetError::OutOfSpec($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::error::ParquetError::OutOfSpec(format!($fmt, $($args),*)));
}

macro_rules! truncated_err {
    ($fmt:expr) => ($crate::error::ParquetError::TruncatedInput($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => ($crate::error::ParquetError::TruncatedInput(format!($fmt, $($args),*)));
}

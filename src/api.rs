//! Public, language-neutral surface (spec section 6): `read_metadata`,
//! `read_rows`, `read_objects`, `schema_tree`, `cached_source`. Everything
//! under this module composes `source`, `metadata`, `read` (the planner),
//! `row`, and `filter` into the handful of entry points an embedder needs.

use crate::assemble::{self, Assembled};
use crate::error::{ParquetError, Result};
use crate::filter::Filter;
use crate::metadata::{self, FileMetaData};
use crate::read::{self, DecodeOptions};
use crate::row::{self, Row, RowFormat};
use crate::schema::SchemaTree;
use crate::source::AsyncSource;
use crate::{DEFAULT_FOOTER_READ_SIZE, FOOTER_SIZE};

pub use crate::compression::CodecRegistry;
pub use crate::logical::ParserOverrides;
pub use crate::source::cached_source;

/// Reads and parses a file's `FileMetaData` footer (spec section 4.3):
/// prefetches the last [`DEFAULT_FOOTER_READ_SIZE`](crate::DEFAULT_FOOTER_READ_SIZE)
/// bytes speculatively, and only issues a second fetch when the metadata
/// turns out to be larger than that.
pub async fn read_metadata(source: &dyn AsyncSource) -> Result<FileMetaData> {
    let file_length = source.byte_length().await?;
    let prefetch = DEFAULT_FOOTER_READ_SIZE.min(file_length);
    let suffix = source.slice(-(prefetch as i64), None).await?;
    let metadata_length = metadata::read_metadata_length(&suffix, file_length)? as u64;

    if metadata_length + FOOTER_SIZE <= suffix.len() as u64 {
        let start = suffix.len() as u64 - FOOTER_SIZE - metadata_length;
        let end = suffix.len() as u64 - FOOTER_SIZE;
        metadata::parse_file_metadata(&suffix[start as usize..end as usize])
    } else {
        let footer_start = file_length - FOOTER_SIZE - metadata_length;
        let bytes = source
            .slice(footer_start as i64, Some((footer_start + metadata_length) as i64))
            .await?;
        metadata::parse_file_metadata(&bytes)
    }
}

/// Returns the file's schema tree, for UIs or introspection (spec section
/// 6, `schemaTree(metadata)`).
pub fn schema_tree(metadata: &FileMetaData) -> SchemaTree {
    metadata.schema_descr().root().clone()
}

/// One assembled chunk, reported to [`Sink::on_chunk`] as soon as a column
/// finishes assembling for a row group (spec section 6, `onChunk`).
pub struct ChunkEvent {
    pub column_name: String,
    pub column_data: Vec<Assembled>,
    pub row_start: u64,
    pub row_end: u64,
}

/// One page decoded while reading a chunk (spec section 6, `onPage`).
pub struct PageEvent {
    pub column_name: String,
    pub row_group_index: usize,
    pub num_values: usize,
}

/// Observation hooks a caller can plug into a read (spec section 6,
/// "onChunk, onComplete, onPage"). Default methods are no-ops, so callers
/// only implement what they need.
pub trait Sink: Send {
    fn on_chunk(&mut self, _event: ChunkEvent) {}
    fn on_page(&mut self, _event: PageEvent) {}
    fn on_complete(&mut self, _rows: &[Row]) {}
}

/// The closed configuration set for `read_rows`/`read_objects` (spec
/// section 6, "Configuration options").
pub struct ReadOptions {
    /// Subset of top-level leaf names to read; `None` reads every column.
    pub columns: Option<Vec<String>>,
    pub row_start: u64,
    /// `None` means "to the end of the file".
    pub row_end: Option<u64>,
    pub row_format: RowFormat,
    /// When `false`, BYTE_ARRAY columns without the UTF-8 converted type
    /// stay as raw bytes instead of being parsed as UTF-8 strings.
    pub utf8: bool,
    pub codecs: CodecRegistry,
    pub parsers: ParserOverrides,
    /// Row-group pruning filter (spec section 4.11); never changes the
    /// result set, only which row groups are fetched at all.
    pub filter: Option<Filter>,
    pub sink: Option<Box<dyn Sink>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            columns: None,
            row_start: 0,
            row_end: None,
            row_format: RowFormat::Array,
            utf8: true,
            codecs: CodecRegistry::default(),
            parsers: ParserOverrides::default(),
            filter: None,
            sink: None,
        }
    }
}

impl ReadOptions {
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_row_range(mut self, row_start: u64, row_end: u64) -> Self {
        self.row_start = row_start;
        self.row_end = Some(row_end);
        self
    }

    pub fn with_row_format(mut self, row_format: RowFormat) -> Self {
        self.row_format = row_format;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

/// Reads rows and reports them entirely through `options.sink`'s callbacks
/// (spec section 6, `readRows`). `metadata`, when given, skips the footer
/// fetch `read_rows` would otherwise perform itself.
pub async fn read_rows(
    source: &dyn AsyncSource,
    metadata: Option<&FileMetaData>,
    options: ReadOptions,
) -> Result<()> {
    materialize(source, metadata, options).await?;
    Ok(())
}

/// Convenience wrapper (spec section 6, `readObjects`): forces
/// `row_format = Object` and returns the materialised rows directly
/// instead of requiring a [`Sink`].
pub async fn read_objects(
    source: &dyn AsyncSource,
    metadata: Option<&FileMetaData>,
    mut options: ReadOptions,
) -> Result<Vec<Row>> {
    options.row_format = RowFormat::Object;
    materialize(source, metadata, options).await
}

async fn materialize(
    source: &dyn AsyncSource,
    metadata: Option<&FileMetaData>,
    mut options: ReadOptions,
) -> Result<Vec<Row>> {
    if options.row_start as i64 > options.row_end.map(|e| e as i64).unwrap_or(i64::MAX) {
        return Err(ParquetError::ArgumentError(format!(
            "row_start ({}) is after row_end ({:?})",
            options.row_start, options.row_end
        )));
    }

    let owned_metadata;
    let metadata = match metadata {
        Some(m) => m,
        None => {
            owned_metadata = read_metadata(source).await?;
            &owned_metadata
        }
    };

    let row_end = options.row_end.unwrap_or(metadata.num_rows() as u64);
    let schema = metadata.schema_descr();
    let query_plan = read::plan(
        metadata,
        options.row_start as i64,
        row_end as i64,
        options.columns.as_deref(),
    );

    let pruned = read::QueryPlan {
        groups: query_plan
            .groups
            .into_iter()
            .filter(|group| match &options.filter {
                Some(filter) => {
                    let rg = &metadata.row_groups()[group.group_index];
                    !crate::filter::can_skip_row_group(filter, rg, schema)
                }
                None => true,
            })
            .collect(),
    };

    let decode_options = DecodeOptions {
        codecs: &options.codecs,
        parsers: &options.parsers,
    };
    let executed = read::execute(source, metadata, &pruned, decode_options).await?;

    let mut all_rows = Vec::new();
    for (group, results) in executed {
        let row_count = (group.select_end - group.select_start) as usize;
        let leaf_rows = results
            .into_iter()
            .map(|chunk| (chunk.column_index, chunk.rows))
            .collect::<std::collections::HashMap<usize, Vec<Assembled>>>();

        // Assemble groups (structs, lists, maps) bottom-up by name, per the
        // schema tree, instead of passing leaf chunks straight through keyed
        // by their own (innermost) name.
        let assembled = assemble::assemble_top_level(schema, leaf_rows, row_count);

        if let Some(sink) = options.sink.as_mut() {
            for (name, data) in &assembled {
                sink.on_chunk(ChunkEvent {
                    column_name: name.clone(),
                    column_data: data.clone(),
                    row_start: (group.row_group_start + group.select_start) as u64,
                    row_end: (group.row_group_start + group.select_end) as u64,
                });
            }
        }

        let columns = select_columns(assembled, options.columns.as_deref(), row_count);
        let rows = row::transpose(columns, row_count, options.row_format);
        all_rows.extend(rows);
    }

    if let Some(sink) = options.sink.as_mut() {
        sink.on_complete(&all_rows);
    }
    Ok(all_rows)
}

/// Builds the final column list directly from `wanted`, in the order
/// given -- including duplicate names and an all-null column for any name
/// absent from the schema (spec section 8, column-order stability: "output
/// array/object fields appear in the exact order specified, including
/// duplicates and missing names"). `None` keeps the assembled schema order.
fn select_columns(
    assembled: Vec<(String, Vec<Assembled>)>,
    wanted: Option<&[String]>,
    row_count: usize,
) -> Vec<(String, Vec<Assembled>)> {
    let Some(wanted) = wanted else {
        return assembled;
    };
    wanted
        .iter()
        .map(|name| match assembled.iter().find(|(n, _)| n == name) {
            Some((n, data)) => (n.clone(), data.clone()),
            None => (name.clone(), vec![Assembled::Null; row_count]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_options_defaults_match_spec() {
        let options = ReadOptions::default();
        assert_eq!(options.row_start, 0);
        assert_eq!(options.row_end, None);
        assert_eq!(options.row_format, RowFormat::Array);
        assert!(options.utf8);
    }

    #[test]
    fn builder_methods_chain() {
        let options = ReadOptions::default()
            .with_columns(vec!["a".to_owned()])
            .with_row_range(2, 4)
            .with_row_format(RowFormat::Object);
        assert_eq!(options.columns, Some(vec!["a".to_owned()]));
        assert_eq!(options.row_start, 2);
        assert_eq!(options.row_end, Some(4));
        assert_eq!(options.row_format, RowFormat::Object);
    }
}

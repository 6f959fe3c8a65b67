//! gridxl turns in-memory tabular datasets, flat, grouped, pivoted or
//! hierarchical, into valid OOXML (.xlsx) archives.
//!
//! Records flow strictly downward: raw [`ExportRecord`]s are normalized
//! into a [`WorksheetData`] model, the archive node tree renders it into
//! the nested part map of the package, and an [`Archiver`] packs the map
//! into one byte buffer. Repeated strings, styles and column widths are
//! deduplicated through a per-export [`WorksheetDictionary`], and the
//! worksheet part streams row by row so a large export never holds its
//! whole XML in memory as a document tree.
//!
//! ```no_run
//! use gridxl::{CellValue, ExportOptions, Exporter, ExportRecord, OwnerMap, RecordData};
//!
//! async fn export_names() -> Result<(), gridxl::ExportError> {
//!     let records = vec![
//!         ExportRecord::new(RecordData::Fields(vec![
//!             ("Name".to_string(), CellValue::from("Ann")),
//!         ])),
//!         ExportRecord::new(RecordData::Fields(vec![
//!             ("Name".to_string(), CellValue::from("Bob")),
//!         ])),
//!     ];
//!     let exporter = Exporter::new();
//!     let outcome = exporter
//!         .export_data(records, OwnerMap::default(), ExportOptions::default())
//!         .await?;
//!     std::fs::write(&outcome.file_name, &outcome.bytes)?;
//!     Ok(())
//! }
//! ```

mod dictionary;
mod styles;
mod tree;
mod types;
mod validation;
mod worksheet;
mod writer;
mod xml;

pub use dictionary::WorksheetDictionary;
pub use styles::CellStyle;
pub use tree::{populate_folder, ArchiveDirectory, ArchiveEntry, FileKind, FolderKind};
pub use types::{
    CellValue, ColumnDescriptor, ColumnOwner, ExportError, ExportOptions, ExportRecord,
    HeaderKind, OwnerKey, OwnerMap, RecordData, RecordKind, SortSpec,
};
pub use validation::{
    extract_column_keys, is_special_value, validate_worksheet_name, MAX_COLS,
    MAX_OUTLINE_LEVEL, MAX_ROWS,
};
pub use worksheet::WorksheetData;
pub use writer::{
    Archiver, ExportEnded, ExportOutcome, Exporter, FileSaveSink, SaveSink, ZipArchiver,
};
pub use xml::sanitize_value;

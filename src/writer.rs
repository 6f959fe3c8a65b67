//! Export orchestration: validation, tree walk, archiving, saving.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use mtzip::{level::CompressionLevel, ZipArchive};

use crate::tree::{populate_folder, ArchiveDirectory, FolderKind};
use crate::types::{ColumnOwner, ExportError, ExportOptions, ExportRecord, OwnerMap};
use crate::validation::{
    check_column_limit, check_outline_depth, check_row_limit, extract_column_keys,
    resolve_column_count, validate_worksheet_name,
};
use crate::worksheet::WorksheetData;

/// Compresses the nested path -> content structure into one byte buffer.
/// The engine itself never touches compression.
pub trait Archiver: Send + Sync {
    fn archive(&self, root: &ArchiveDirectory) -> Result<Vec<u8>, ExportError>;
}

/// mtzip-backed archiver.
#[derive(Debug, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, root: &ArchiveDirectory) -> Result<Vec<u8>, ExportError> {
        let mut zipper = ZipArchive::new();
        for (path, bytes) in root.flatten() {
            zipper
                .add_file_from_memory(bytes.to_vec(), path)
                .compression_level(CompressionLevel::fast())
                .done();
        }
        let mut cursor = Cursor::new(Vec::new());
        zipper
            .write(&mut cursor)
            .map_err(|e| ExportError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Receives the finished archive bytes.
pub trait SaveSink: Send + Sync {
    fn save(&self, bytes: &[u8], file_name: &str) -> std::io::Result<()>;
}

/// Writes the archive into a directory under the requested file name.
#[derive(Debug)]
pub struct FileSaveSink {
    directory: PathBuf,
}

impl FileSaveSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl SaveSink for FileSaveSink {
    fn save(&self, bytes: &[u8], file_name: &str) -> std::io::Result<()> {
        let mut file = File::create(self.directory.join(file_name))?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

/// Completion notification, carrying the raw part map so tests can inspect
/// the package without unzipping it.
pub struct ExportEnded<'a> {
    pub file_name: &'a str,
    pub directory: &'a ArchiveDirectory,
}

/// Result of one export call.
#[derive(Debug)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub directory: ArchiveDirectory,
    pub file_name: String,
}

type EndedListener = Box<dyn Fn(&ExportEnded<'_>) + Send + Sync>;

/// Turns record sequences into xlsx archives.
///
/// Every call owns its own dictionary, data model and part tree, so
/// independent exports can run concurrently without sharing state.
pub struct Exporter {
    archiver: Box<dyn Archiver>,
    sink: Option<Box<dyn SaveSink>>,
    ended_listeners: Vec<EndedListener>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self {
            archiver: Box::new(ZipArchiver),
            sink: None,
            ended_listeners: Vec::new(),
        }
    }

    pub fn with_archiver(mut self, archiver: impl Archiver + 'static) -> Self {
        self.archiver = Box::new(archiver);
        self
    }

    pub fn with_save_sink(mut self, sink: impl SaveSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Register a listener fired once per export, after the archive bytes
    /// exist.
    pub fn on_export_ended(
        &mut self,
        listener: impl Fn(&ExportEnded<'_>) + Send + Sync + 'static,
    ) {
        self.ended_listeners.push(Box::new(listener));
    }

    /// Export `records` described by `owners` into an xlsx archive.
    ///
    /// Fails before producing any output when the dataset breaks a hard
    /// limit; archiver and sink failures propagate unchanged.
    pub async fn export_data(
        &self,
        records: Vec<ExportRecord>,
        mut owners: OwnerMap,
        options: ExportOptions,
    ) -> Result<ExportOutcome, ExportError> {
        validate_worksheet_name(&options.worksheet_name)?;
        check_row_limit(&records)?;

        // datasets without column metadata get their columns probed from
        // the records themselves
        let root_keys = extract_column_keys(&records);
        if owners.default_owner().columns.is_empty() && !root_keys.is_empty() {
            *owners.default_owner_mut() = ColumnOwner::from_fields(root_keys.clone());
        }

        let column_count = resolve_column_count(&records, &owners);
        check_column_limit(column_count)?;
        check_outline_depth(&records)?;

        log::debug!(
            "exporting {} records into {} ({} columns)",
            records.len(),
            options.file_name,
            column_count
        );

        let file_name = options.file_name.clone();
        let mut data = WorksheetData::new(records, options, owners, column_count, root_keys);
        let mut directory = ArchiveDirectory::new();
        populate_folder(FolderKind::Root, &mut data, &mut directory).await?;

        let bytes = self.archiver.archive(&directory)?;
        log::debug!("archived {} ({} bytes)", file_name, bytes.len());

        if let Some(sink) = &self.sink {
            sink.save(&bytes, &file_name)?;
        }

        let ended = ExportEnded {
            file_name: &file_name,
            directory: &directory,
        };
        for listener in &self.ended_listeners {
            listener(&ended);
        }

        Ok(ExportOutcome {
            bytes,
            directory,
            file_name,
        })
    }
}

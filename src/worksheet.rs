//! Normalized view of one export: records, derived facts and the dictionary.

use crate::dictionary::WorksheetDictionary;
use crate::types::{ExportOptions, ExportRecord, HeaderKind, OwnerMap, RecordKind};
use crate::validation::is_special_record;

/// Owns the record sequence plus everything derived from it. All structural
/// flags are computed once here and read-only afterwards; the archive tree
/// only consumes them.
#[derive(Debug)]
pub struct WorksheetData {
    pub(crate) records: Vec<ExportRecord>,
    pub(crate) options: ExportOptions,
    pub(crate) owners: OwnerMap,
    pub(crate) dictionary: WorksheetDictionary,
    pub(crate) column_count: usize,
    pub(crate) row_count: usize,
    pub(crate) root_keys: Vec<String>,
    is_special_data: bool,
    has_multi_column_header: bool,
    has_multi_row_header: bool,
    has_summaries: bool,
    is_hierarchical: bool,
    is_tree_grid: bool,
    is_pivot_grid: bool,
    is_grouped_grid: bool,
    max_outline_level: u32,
}

impl WorksheetData {
    pub fn new(
        records: Vec<ExportRecord>,
        mut options: ExportOptions,
        owners: OwnerMap,
        column_count: usize,
        root_keys: Vec<String>,
    ) -> Self {
        let has_multi_column_header = owners.all_owners().any(|o| {
            o.columns
                .iter()
                .any(|c| !c.skip && c.header_kind == HeaderKind::MultiColumn)
        });
        let has_multi_row_header = owners.all_owners().any(|o| {
            o.columns
                .iter()
                .any(|c| !c.skip && c.header_kind == HeaderKind::MultiRow)
        });

        let first_kind = records.first().map(|r| r.kind);
        let is_hierarchical =
            first_kind == Some(RecordKind::HierarchicalChild) || owners.has_row_keys();
        let has_summaries = records.iter().any(|r| r.kind == RecordKind::Summary);
        let is_tree_grid = records.iter().any(|r| r.kind == RecordKind::Tree);
        let is_pivot_grid = first_kind == Some(RecordKind::Pivot);
        let is_grouped_grid = first_kind == Some(RecordKind::Grouped);

        // A native table cannot hold spanning header cells or nested rows,
        // so those shapes always export as a plain sheet range.
        let effective_multi_column_header =
            has_multi_column_header && !options.ignore_multi_column_headers;
        if is_hierarchical || effective_multi_column_header || is_pivot_grid {
            options.export_as_table = false;
        }

        let max_outline_level = records.iter().map(|r| r.level).max().unwrap_or(0);

        if records.is_empty() {
            // header-only sheet; nested exports have no meaningful header row
            let row_count = if is_hierarchical {
                0
            } else {
                owners.default_owner().max_level as usize + 1
            };
            return Self {
                records,
                options,
                owners,
                dictionary: WorksheetDictionary::new(),
                column_count,
                row_count,
                root_keys,
                is_special_data: false,
                has_multi_column_header,
                has_multi_row_header,
                has_summaries,
                is_hierarchical,
                is_tree_grid,
                is_pivot_grid,
                is_grouped_grid,
                max_outline_level,
            };
        }

        let is_special_data = is_special_record(&records[0].data);
        let multi_column_header_rows: usize = if options.ignore_multi_column_headers {
            0
        } else {
            owners.all_owners().map(|o| o.max_level as usize).sum()
        };
        let row_count = records.len() + multi_column_header_rows + 1;

        Self {
            records,
            options,
            owners,
            dictionary: WorksheetDictionary::new(),
            column_count,
            row_count,
            root_keys,
            is_special_data,
            has_multi_column_header,
            has_multi_row_header,
            has_summaries,
            is_hierarchical,
            is_tree_grid,
            is_pivot_grid,
            is_grouped_grid,
            max_outline_level,
        }
    }

    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    /// Disjoint borrows for the worksheet stream, which reads records while
    /// interning into the dictionary.
    pub(crate) fn split_for_write(
        &mut self,
    ) -> (&[ExportRecord], &OwnerMap, &mut WorksheetDictionary) {
        (&self.records, &self.owners, &mut self.dictionary)
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn owners(&self) -> &OwnerMap {
        &self.owners
    }

    pub fn dictionary(&self) -> &WorksheetDictionary {
        &self.dictionary
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn root_keys(&self) -> &[String] {
        &self.root_keys
    }

    pub fn is_special_data(&self) -> bool {
        self.is_special_data
    }

    pub fn has_multi_column_header(&self) -> bool {
        self.has_multi_column_header
    }

    pub fn has_multi_row_header(&self) -> bool {
        self.has_multi_row_header
    }

    pub fn has_summaries(&self) -> bool {
        self.has_summaries
    }

    pub fn is_hierarchical(&self) -> bool {
        self.is_hierarchical
    }

    pub fn is_tree_grid(&self) -> bool {
        self.is_tree_grid
    }

    pub fn is_pivot_grid(&self) -> bool {
        self.is_pivot_grid
    }

    pub fn is_grouped_grid(&self) -> bool {
        self.is_grouped_grid
    }

    pub fn max_outline_level(&self) -> u32 {
        self.max_outline_level
    }

    /// Header rows at the top of the sheet.
    pub fn header_row_count(&self) -> usize {
        if self.options.ignore_multi_column_headers {
            1
        } else {
            self.owners.default_owner().max_level as usize + 1
        }
    }

    /// Native-table mode after the shape override.
    pub fn uses_table(&self) -> bool {
        self.options.export_as_table && !self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
            || self.row_count == self.owners.default_owner().max_level as usize + 1
            || self.column_count == 0
            || self.owners.default_owner().all_columns_skipped()
    }
}

use chrono::NaiveDateTime;
use thiserror::Error;

/// A single cell value as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Payload of one export record. Field order is preserved because column
/// keys are sampled from it when no column metadata is available.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    /// A primitive dataset entry (string/number/date array export).
    Scalar(CellValue),
    /// A structured row keyed by field name.
    Fields(Vec<(String, CellValue)>),
}

impl RecordData {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        match self {
            RecordData::Scalar(_) => None,
            RecordData::Fields(fields) => {
                fields.iter().find(|(name, _)| name == field).map(|(_, v)| v)
            }
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        let fields: &[(String, CellValue)] = match self {
            RecordData::Scalar(_) => &[],
            RecordData::Fields(fields) => fields.as_slice(),
        };
        fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, RecordData::Scalar(_))
    }
}

/// Structural role of a record within the exported dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Plain,
    Grouped,
    Summary,
    HierarchicalChild,
    Pivot,
    Tree,
    /// Header row of a nested grid inside a hierarchical export.
    Header,
}

/// One logical row to export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub data: RecordData,
    /// Outline nesting depth, 0 for top-level rows.
    pub level: u32,
    pub kind: RecordKind,
    pub owner: OwnerKey,
}

impl ExportRecord {
    pub fn new(data: RecordData) -> Self {
        Self {
            data,
            level: 0,
            kind: RecordKind::Plain,
            owner: OwnerKey::Default,
        }
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_owner(mut self, owner: OwnerKey) -> Self {
        self.owner = owner;
        self
    }
}

/// Identifies which column owner a record belongs to. `Row` keys reference
/// individual parent rows, which only happens for nested per-row grids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    Default,
    Name(String),
    Row(u64),
}

impl OwnerKey {
    pub fn is_row_reference(&self) -> bool {
        matches!(self, OwnerKey::Row(_))
    }
}

/// How a column participates in the header region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Plain,
    /// A group header spanning several columns.
    MultiColumn,
    /// A leaf header spanning several header rows.
    MultiRow,
}

/// Metadata for one column of an owner grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub field: String,
    pub header: String,
    pub width: Option<f64>,
    pub skip: bool,
    pub header_kind: HeaderKind,
    /// Header row this descriptor starts on (0-based).
    pub level: u32,
    pub column_span: u32,
    pub row_span: u32,
    /// Column offset within the owner grid.
    pub start_index: usize,
}

impl ColumnDescriptor {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            header: field.clone(),
            field,
            width: None,
            skip: false,
            header_kind: HeaderKind::Plain,
            level: 0,
            column_span: 1,
            row_span: 1,
            start_index: 0,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Leaf descriptors map to data columns; `MultiColumn` group headers
    /// have no cells of their own.
    pub fn is_leaf(&self) -> bool {
        self.header_kind != HeaderKind::MultiColumn
    }
}

/// Column metadata for one logical grid level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOwner {
    pub columns: Vec<ColumnDescriptor>,
    /// Header nesting depth: 0 means a single header row.
    pub max_level: u32,
    pub index_of_last_pinned_column: Option<usize>,
    pub column_widths: Vec<f64>,
    /// Filter fields contributed by a pivot dataset.
    pub pivot_filter_field_count: usize,
}

impl ColumnOwner {
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = fields
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                let mut col = ColumnDescriptor::new(f);
                col.start_index = i;
                col
            })
            .collect();
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn leaf_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.skip && c.is_leaf())
    }

    pub fn leaf_column_count(&self) -> usize {
        self.leaf_columns().count()
    }

    pub fn plain_header_column_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| !c.skip && c.header_kind == HeaderKind::Plain)
            .count()
    }

    pub fn all_columns_skipped(&self) -> bool {
        self.columns.iter().all(|c| c.skip)
    }
}

/// The set of column owners participating in one export. Lookups fall back
/// to the default owner.
#[derive(Debug, Clone, Default)]
pub struct OwnerMap {
    default: ColumnOwner,
    extra: Vec<(OwnerKey, ColumnOwner)>,
}

impl OwnerMap {
    pub fn new(default: ColumnOwner) -> Self {
        Self {
            default,
            extra: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: OwnerKey, owner: ColumnOwner) {
        self.extra.push((key, owner));
    }

    pub fn with_owner(mut self, key: OwnerKey, owner: ColumnOwner) -> Self {
        self.insert(key, owner);
        self
    }

    pub fn default_owner(&self) -> &ColumnOwner {
        &self.default
    }

    pub fn default_owner_mut(&mut self) -> &mut ColumnOwner {
        &mut self.default
    }

    pub fn get(&self, key: &OwnerKey) -> &ColumnOwner {
        if matches!(key, OwnerKey::Default) {
            return &self.default;
        }
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, o)| o)
            .unwrap_or(&self.default)
    }

    /// Default owner first, then the extras in insertion order.
    pub fn all_owners(&self) -> impl Iterator<Item = &ColumnOwner> {
        std::iter::once(&self.default).chain(self.extra.iter().map(|(_, o)| o))
    }

    pub fn has_row_keys(&self) -> bool {
        self.extra.iter().any(|(k, _)| k.is_row_reference())
    }
}

/// Sorted-column marker used for the native table's sort state.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

/// Caller-facing export configuration.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub file_name: String,
    pub worksheet_name: String,
    pub default_column_width: f64,
    pub ignore_multi_column_headers: bool,
    /// May be forced off when the data shape cannot be represented by a
    /// native table element.
    pub export_as_table: bool,
    pub sort: Option<SortSpec>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: "ExportedData.xlsx".to_string(),
            worksheet_name: "Sheet1".to_string(),
            default_column_width: 8.43,
            ignore_multi_column_headers: false,
            export_as_table: false,
            sort: None,
        }
    }
}

impl ExportOptions {
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn as_table(mut self) -> Self {
        self.export_as_table = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("row count {0} exceeds the xlsx limit of 1048576 rows")]
    RowLimitExceeded(usize),
    #[error("column count {0} exceeds the xlsx limit of 16384 columns")]
    ColumnLimitExceeded(usize),
    #[error("outline level {0} exceeds the maximum of eight levels")]
    OutlineDepthExceeded(u32),
    #[error("invalid worksheet name: {0}")]
    InvalidWorksheetName(String),
    #[error("archiver failed: {0}")]
    Archive(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

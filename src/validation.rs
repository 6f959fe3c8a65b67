//! Pre-export validation and input shape probing.

use crate::types::{
    CellValue, ColumnOwner, ExportError, ExportRecord, OwnerMap, RecordKind,
};

// Excel hard limits
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLS: usize = 16_384;
pub const MAX_OUTLINE_LEVEL: u32 = 7;
const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: &str = "[]:*?/\\";

/// Synthetic column key used when the dataset holds primitives.
pub const SCALAR_COLUMN_KEY: &str = "Column 1";

/// Validate a worksheet name meets Excel requirements.
pub fn validate_worksheet_name(name: &str) -> Result<(), ExportError> {
    if name.is_empty() {
        return Err(ExportError::InvalidWorksheetName(
            "worksheet name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_SHEET_NAME_LEN {
        return Err(ExportError::InvalidWorksheetName(format!(
            "'{}' exceeds {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }

    for c in INVALID_SHEET_CHARS.chars() {
        if name.contains(c) {
            return Err(ExportError::InvalidWorksheetName(format!(
                "'{}' contains invalid character '{}'",
                name, c
            )));
        }
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ExportError::InvalidWorksheetName(format!(
            "'{}' contains control characters",
            name
        )));
    }

    Ok(())
}

pub fn check_row_limit(records: &[ExportRecord]) -> Result<(), ExportError> {
    if records.len() > MAX_ROWS {
        return Err(ExportError::RowLimitExceeded(records.len()));
    }
    Ok(())
}

pub fn check_column_limit(column_count: usize) -> Result<(), ExportError> {
    if column_count > MAX_COLS {
        return Err(ExportError::ColumnLimitExceeded(column_count));
    }
    Ok(())
}

pub fn check_outline_depth(records: &[ExportRecord]) -> Result<(), ExportError> {
    if let Some(level) = records.iter().map(|r| r.level).max() {
        if level > MAX_OUTLINE_LEVEL {
            return Err(ExportError::OutlineDepthExceeded(level));
        }
    }
    Ok(())
}

/// Nested grids widen the sheet: every record occupies its owner's columns
/// shifted right by its nesting level.
pub fn hierarchical_column_count(records: &[ExportRecord], owners: &OwnerMap) -> usize {
    records
        .iter()
        .map(|r| owners.get(&r.owner).leaf_column_count() + r.level as usize)
        .max()
        .unwrap_or_else(|| owners.default_owner().leaf_column_count())
}

/// Pivot datasets append their filter fields after the plain value columns.
pub fn pivot_column_count(owner: &ColumnOwner) -> usize {
    owner.plain_header_column_count() + owner.pivot_filter_field_count
}

pub fn flat_column_count(owner: &ColumnOwner) -> usize {
    owner.leaf_column_count()
}

/// Pick the column-count strategy matching the dataset shape.
pub fn resolve_column_count(records: &[ExportRecord], owners: &OwnerMap) -> usize {
    if records.is_empty() {
        return owners.default_owner().leaf_column_count();
    }
    let first_kind = records[0].kind;
    if first_kind == RecordKind::HierarchicalChild || owners.has_row_keys() {
        hierarchical_column_count(records, owners)
    } else if first_kind == RecordKind::Pivot {
        pivot_column_count(owners.default_owner())
    } else {
        flat_column_count(owners.default_owner())
    }
}

/// True for values a worksheet can hold directly without field structure.
pub fn is_special_value(value: &CellValue) -> bool {
    matches!(
        value,
        CellValue::Text(_) | CellValue::Number(_) | CellValue::Date(_)
    )
}

pub fn is_special_record(data: &crate::types::RecordData) -> bool {
    match data {
        crate::types::RecordData::Scalar(v) => is_special_value(v),
        crate::types::RecordData::Fields(_) => false,
    }
}

/// Sample the first, middle and last record and return the ordered union of
/// their field names. Scanning every record would be too slow for large
/// datasets; three probes tolerate moderately ragged field sets.
pub fn extract_column_keys(records: &[ExportRecord]) -> Vec<String> {
    if records.is_empty() {
        return Vec::new();
    }

    let first = &records[0];
    if first.data.is_scalar() {
        return vec![SCALAR_COLUMN_KEY.to_string()];
    }

    let samples = [0, records.len() / 2, records.len() - 1];
    let mut keys: Vec<String> = Vec::new();
    for idx in samples {
        for name in records[idx].data.field_names() {
            if !keys.iter().any(|k| k == name) {
                keys.push(name.to_string());
            }
        }
    }
    keys
}

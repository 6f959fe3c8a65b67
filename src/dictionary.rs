//! Per-export interning of shared strings, cell styles and column widths.

use std::collections::HashMap;

use crate::styles::CellStyle;
use crate::types::CellValue;
use crate::xml::sanitize_value;

/// Deduplicates repeated worksheet content into stable integer ids.
///
/// One dictionary lives exactly as long as one export call. Ids are dense,
/// assigned in first-seen order, and never reassigned, so cells written
/// earlier keep referencing the same entries as the dictionary grows.
#[derive(Debug, Default)]
pub struct WorksheetDictionary {
    strings: Vec<String>,
    string_index: HashMap<String, usize>,
    string_saves: usize,
    styles: Vec<CellStyle>,
    widths: Vec<f64>,
    width_index: HashMap<u64, usize>,
}

impl WorksheetDictionary {
    pub fn new() -> Self {
        let mut dict = Self::default();
        // cellXf 0 is the workbook default and must exist even for empty sheets
        dict.styles.push(CellStyle::DEFAULT);
        dict
    }

    /// Sanitize a value once and intern the result as a shared string.
    pub fn save_value(&mut self, value: &CellValue) -> usize {
        let sanitized = sanitize_value(value);
        self.intern_string(sanitized)
    }

    pub fn intern_string(&mut self, content: String) -> usize {
        self.string_saves += 1;
        if let Some(&id) = self.string_index.get(&content) {
            return id;
        }
        let id = self.strings.len();
        self.string_index.insert(content.clone(), id);
        self.strings.push(content);
        id
    }

    pub fn intern_style(&mut self, style: &CellStyle) -> usize {
        if let Some(id) = self.styles.iter().position(|s| s == style) {
            return id;
        }
        self.styles.push(style.clone());
        self.styles.len() - 1
    }

    pub fn intern_column_width(&mut self, width: f64) -> usize {
        if let Some(&id) = self.width_index.get(&width.to_bits()) {
            return id;
        }
        let id = self.widths.len();
        self.width_index.insert(width.to_bits(), id);
        self.widths.push(width);
        id
    }

    /// Interned strings in id order, already sanitized.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn has_strings(&self) -> bool {
        !self.strings.is_empty()
    }

    /// Total number of string saves, counting duplicates.
    pub fn string_save_count(&self) -> usize {
        self.string_saves
    }

    pub fn unique_string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn styles(&self) -> &[CellStyle] {
        &self.styles
    }

    /// Distinct column widths in id order.
    pub fn column_widths(&self) -> &[f64] {
        &self.widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_yields_equal_ids() {
        let mut dict = WorksheetDictionary::new();
        let a = dict.save_value(&CellValue::from("foo"));
        let b = dict.save_value(&CellValue::from("foo"));
        let c = dict.save_value(&CellValue::from("bar"));
        assert_eq!(a, b);
        assert!(c > a);
        assert_eq!(dict.unique_string_count(), 2);
        assert_eq!(dict.string_save_count(), 3);
    }

    #[test]
    fn ids_start_at_zero_and_grow_densely() {
        let mut dict = WorksheetDictionary::new();
        assert_eq!(dict.save_value(&CellValue::from("a")), 0);
        assert_eq!(dict.save_value(&CellValue::from("b")), 1);
        assert_eq!(dict.save_value(&CellValue::from("c")), 2);
    }

    #[test]
    fn values_are_sanitized_before_interning() {
        let mut dict = WorksheetDictionary::new();
        dict.save_value(&CellValue::from("a & b"));
        assert_eq!(dict.strings()[0], "a &amp; b");
        // the raw and sanitized spellings collapse into one entry
        dict.save_value(&CellValue::from("a & b"));
        assert_eq!(dict.unique_string_count(), 1);
    }

    #[test]
    fn style_space_is_seeded_with_the_default() {
        let mut dict = WorksheetDictionary::new();
        assert_eq!(dict.intern_style(&CellStyle::DEFAULT), 0);
        assert_eq!(dict.intern_style(&CellStyle::NUMBER), 1);
        assert_eq!(dict.intern_style(&CellStyle::DATE), 2);
        assert_eq!(dict.intern_style(&CellStyle::NUMBER), 1);
    }

    #[test]
    fn id_spaces_are_independent() {
        let mut dict = WorksheetDictionary::new();
        let s = dict.save_value(&CellValue::from("x"));
        let w = dict.intern_column_width(12.5);
        let w2 = dict.intern_column_width(12.5);
        let w3 = dict.intern_column_width(9.0);
        assert_eq!(s, 0);
        assert_eq!(w, 0);
        assert_eq!(w2, 0);
        assert_eq!(w3, 1);
    }
}

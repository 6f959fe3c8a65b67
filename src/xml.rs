//! OOXML part assembly.
//!
//! Every part is built as a plain string buffer. Numbers go through
//! `itoa`/`ryu`, cell text is escaped exactly once on its way into the
//! shared-string dictionary. The worksheet part is the only one whose size
//! scales with the dataset, so it is emitted row by row with cooperative
//! yield points instead of being assembled from a nested document tree.

use chrono::Timelike;

use crate::dictionary::WorksheetDictionary;
use crate::styles::CellStyle;
use crate::types::{CellValue, ColumnDescriptor, ExportRecord, RecordKind};
use crate::worksheet::WorksheetData;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n";

/// Rows emitted between two suspension points of the worksheet stream.
const ROW_YIELD_INTERVAL: usize = 1024;

/// Excel column letters for a 0-based index (27 -> "AB").
pub fn column_ref(mut index: usize) -> String {
    let mut letters = [0u8; 8];
    let mut n = 0;
    loop {
        letters[n] = b'A' + (index % 26) as u8;
        n += 1;
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters[..n].reverse();
    String::from_utf8_lossy(&letters[..n]).into_owned()
}

/// "A1"-style reference for a 0-based column and 1-based row.
pub fn cell_ref(col: usize, row: usize) -> String {
    let mut out = column_ref(col);
    out.push_str(itoa::Buffer::new().format(row));
    out
}

/// Append `input` with the five XML metacharacters escaped and NUL bytes
/// dropped. Single pass, so already-written entities are never revisited.
pub fn append_escaped(out: &mut String, input: &str) {
    let bytes = input.as_bytes();
    let needs_escape = memchr::memchr3(b'&', b'<', b'>', bytes).is_some()
        || memchr::memchr3(b'"', b'\'', b'\0', bytes).is_some();
    if !needs_escape {
        out.push_str(input);
        return;
    }

    let mut last = 0;
    for (pos, &byte) in bytes.iter().enumerate() {
        let replacement = match byte {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&apos;",
            b'\0' => "",
            _ => continue,
        };
        // escape bytes are ASCII, so these splits stay on char boundaries
        out.push_str(&input[last..pos]);
        out.push_str(replacement);
        last = pos + 1;
    }
    out.push_str(&input[last..]);
}

fn escaped(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    append_escaped(&mut out, input);
    out
}

/// Convert any cell value to its OOXML-safe text form.
pub fn sanitize_value(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => escaped(s),
        CellValue::Number(n) => number_to_string(*n),
        CellValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        CellValue::Date(dt) => number_to_string(datetime_to_excel_serial(dt)),
    }
}

fn number_to_string(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        itoa::Buffer::new().format(n as i64).to_string()
    } else {
        ryu::Buffer::new().format(n).to_string()
    }
}

fn append_number(out: &mut String, n: f64) {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        out.push_str(itoa::Buffer::new().format(n as i64));
    } else {
        out.push_str(ryu::Buffer::new().format(n));
    }
}

fn append_usize(out: &mut String, n: usize) {
    out.push_str(itoa::Buffer::new().format(n));
}

/// Serial day number with the 1899-12-30 epoch Excel uses.
pub fn datetime_to_excel_serial(dt: &chrono::NaiveDateTime) -> f64 {
    let excel_epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or(chrono::NaiveDate::MIN);
    let days = (dt.date() - excel_epoch).num_days() as f64;
    let time_fraction =
        (dt.hour() * 3600 + dt.minute() * 60 + dt.second()) as f64 / 86400.0;
    days + time_fraction
}

// ---------------------------------------------------------------------------
// Package-level parts
// ---------------------------------------------------------------------------

pub fn generate_root_rels() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    );
    xml
}

pub fn generate_app_xml(worksheet_name: &str) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>Microsoft Excel</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop><HeadingPairs><vt:vector size="2" baseType="variant"><vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>1</vt:i4></vt:variant></vt:vector></HeadingPairs><TitlesOfParts><vt:vector size="1" baseType="lpstr"><vt:lpstr>"#,
    );
    append_escaped(&mut xml, worksheet_name);
    xml.push_str(
        r#"</vt:lpstr></vt:vector></TitlesOfParts><Company></Company><LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged><AppVersion>16.0300</AppVersion></Properties>"#,
    );
    xml
}

pub fn generate_core_xml() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:creator></dc:creator><cp:lastModifiedBy></cp:lastModifiedBy><dcterms:created xsi:type="dcterms:W3CDTF">2015-06-05T18:17:20Z</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">2015-06-05T18:17:26Z</dcterms:modified></cp:coreProperties>"#,
    );
    xml
}

pub fn generate_workbook(worksheet_name: &str) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="x15" xmlns:x15="http://schemas.microsoft.com/office/spreadsheetml/2010/11/main"><fileVersion appName="xl" lastEdited="6" lowestEdited="6" rupBuild="14420"/><workbookPr filterPrivacy="1" defaultThemeVersion="164011"/><bookViews><workbookView xWindow="0" yWindow="0" windowWidth="22260" windowHeight="12645"/></bookViews><sheets><sheet name=""#,
    );
    append_escaped(&mut xml, worksheet_name);
    xml.push_str(
        r#"" sheetId="1" r:id="rId1"/></sheets><calcPr calcId="162913"/><extLst><ext uri="{140A7094-0E35-4892-8432-C4D2E57EDEB5}" xmlns:x15="http://schemas.microsoft.com/office/spreadsheetml/2010/11/main"><x15:workbookPr chartTrackingRefBase="1"/></ext></extLst></workbook>"#,
    );
    xml
}

pub fn generate_workbook_rels(has_shared_strings: bool) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    );
    if has_shared_strings {
        xml.push_str(
            r#"<Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        );
    }
    xml.push_str("</Relationships>");
    xml
}

/// Relationships of the worksheet part itself; only present when a native
/// table part is referenced.
pub fn generate_worksheet_rels() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/table" Target="../tables/table1.xml"/></Relationships>"#,
    );
    xml
}

pub fn generate_content_types(has_shared_strings: bool, has_table: bool) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
    );
    if has_shared_strings {
        xml.push_str(
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
    }
    if has_table {
        xml.push_str(
            r#"<Override PartName="/xl/tables/table1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#,
        );
    }
    xml.push_str("</Types>");
    xml
}

/// Shared-string table. Entries are stored pre-sanitized by the dictionary.
pub fn generate_shared_strings(dictionary: &WorksheetDictionary) -> String {
    let strings = dictionary.strings();
    let body_len: usize = strings.iter().map(|s| s.len() + 16).sum();
    let mut xml = String::with_capacity(128 + body_len);
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count=""#,
    );
    append_usize(&mut xml, dictionary.string_save_count());
    xml.push_str("\" uniqueCount=\"");
    append_usize(&mut xml, dictionary.unique_string_count());
    xml.push_str("\">");
    for s in strings {
        xml.push_str("<si><t>");
        xml.push_str(s);
        xml.push_str("</t></si>");
    }
    xml.push_str("</sst>");
    xml
}

pub fn generate_table_xml(data: &WorksheetData) -> String {
    let owner = data.owners().default_owner();
    let leaf_columns: Vec<&ColumnDescriptor> = owner.leaf_columns().collect();
    let dimension = format!(
        "A1:{}",
        cell_ref(data.column_count().saturating_sub(1), data.row_count())
    );

    let mut sort_state = String::new();
    if let Some(sort) = &data.options().sort {
        if let Some(idx) = leaf_columns.iter().position(|c| c.field == sort.field) {
            let letter = column_ref(idx);
            let last = cell_ref(data.column_count().saturating_sub(1), data.row_count());
            sort_state.push_str(&format!(
                "<sortState ref=\"A2:{}\"><sortCondition{} ref=\"{}2:{}{}\"/></sortState>",
                last,
                if sort.descending { " descending=\"1\"" } else { "" },
                letter,
                letter,
                data.row_count()
            ));
        }
    }

    let mut table_columns = String::new();
    table_columns.push_str(&format!("<tableColumns count=\"{}\">", leaf_columns.len()));
    for (i, col) in leaf_columns.iter().enumerate() {
        table_columns.push_str("<tableColumn id=\"");
        append_usize(&mut table_columns, i + 1);
        table_columns.push_str("\" name=\"");
        append_escaped(&mut table_columns, &col.header);
        table_columns.push_str("\"/>");
    }
    table_columns.push_str("</tableColumns>");

    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(
        r#"<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="1" name="Table1" displayName="Table1" ref="{dim}" totalsRowShown="0"><autoFilter ref="{dim}"/>{sort}{cols}<tableStyleInfo name="TableStyleMedium2" showFirstColumn="0" showLastColumn="0" showRowStripes="1" showColumnStripes="0"/></table>"#,
        dim = dimension,
        sort = sort_state,
        cols = table_columns,
    ));
    xml
}

// ---------------------------------------------------------------------------
// Worksheet streaming
// ---------------------------------------------------------------------------

/// Emit `xl/worksheets/sheet1.xml` row by row.
///
/// Values and styles are interned into the dictionary in emission order, so
/// shared-string ids are deterministic for a given input. The loop yields to
/// the executor every [`ROW_YIELD_INTERVAL`] rows, which is also the natural
/// cancellation checkpoint for callers that drop the future.
pub(crate) async fn write_worksheet_xml(data: &mut WorksheetData) -> String {
    let header_rows = data.header_row_count();
    let is_hierarchical = data.is_hierarchical();
    let is_special = data.is_special_data();
    let uses_table = data.uses_table();
    let ignore_group_headers = data.options().ignore_multi_column_headers;
    let column_count = data.column_count();
    let row_count = data.row_count();
    let max_outline = data.max_outline_level();
    let default_width = data.options().default_column_width;

    let (records, owners, dictionary) = data.split_for_write();

    let mut xml = String::with_capacity(1024 + records.len() * 32 + column_count * 48);
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="x14ac" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac">"#,
    );

    if max_outline > 0 {
        xml.push_str("<sheetPr><outlinePr summaryBelow=\"0\"/></sheetPr>");
    }

    xml.push_str("<dimension ref=\"");
    if row_count > 0 && column_count > 0 {
        xml.push_str("A1:");
        xml.push_str(&cell_ref(column_count - 1, row_count));
    } else {
        xml.push_str("A1");
    }
    xml.push_str("\"/>");

    xml.push_str("<sheetViews><sheetView tabSelected=\"1\" workbookViewId=\"0\">");
    if let Some(pinned) = owners.default_owner().index_of_last_pinned_column {
        let split = pinned + 1;
        xml.push_str("<pane xSplit=\"");
        append_usize(&mut xml, split);
        xml.push_str("\" topLeftCell=\"");
        xml.push_str(&cell_ref(split, 1));
        xml.push_str("\" activePane=\"topRight\" state=\"frozen\"/>");
    }
    xml.push_str("</sheetView></sheetViews>");

    xml.push_str("<sheetFormatPr defaultRowHeight=\"15\"");
    if max_outline > 0 {
        xml.push_str(" outlineLevelRow=\"");
        xml.push_str(itoa::Buffer::new().format(max_outline));
        xml.push_str("\"");
    }
    xml.push_str(" x14ac:dyDescent=\"0.25\"/>");

    if column_count > 0 {
        write_column_widths(&mut xml, owners.default_owner(), column_count, default_width, dictionary);
    }

    if column_count == 0 {
        xml.push_str("<sheetData/>");
    } else {
        xml.push_str("<sheetData>");

        let mut merges: Vec<String> = Vec::new();
        let header_style = if is_hierarchical {
            Some(dictionary.intern_style(&CellStyle::NESTED_HEADER))
        } else {
            None
        };

        let owner = owners.default_owner();
        for level in 0..header_rows {
            xml.push_str("<row r=\"");
            append_usize(&mut xml, level + 1);
            xml.push_str("\">");
            if ignore_group_headers {
                for (i, col) in owner.leaf_columns().enumerate() {
                    write_header_cell(&mut xml, i, level + 1, &col.header, header_style, dictionary);
                }
            } else {
                for col in owner.columns.iter().filter(|c| !c.skip) {
                    if col.level as usize != level {
                        continue;
                    }
                    write_header_cell(
                        &mut xml,
                        col.start_index,
                        level + 1,
                        &col.header,
                        header_style,
                        dictionary,
                    );
                    if col.column_span > 1 || col.row_span > 1 {
                        merges.push(format!(
                            "{}:{}",
                            cell_ref(col.start_index, level + 1),
                            cell_ref(
                                col.start_index + col.column_span as usize - 1,
                                level + col.row_span as usize,
                            )
                        ));
                    }
                }
            }
            xml.push_str("</row>");
        }

        for (i, record) in records.iter().enumerate() {
            if i > 0 && i % ROW_YIELD_INTERVAL == 0 {
                tokio::task::yield_now().await;
            }

            let row_num = header_rows + i + 1;
            let owner = owners.get(&record.owner);
            let shift = if is_hierarchical { record.level as usize } else { 0 };

            xml.push_str("<row r=\"");
            append_usize(&mut xml, row_num);
            if record.level > 0 {
                xml.push_str("\" outlineLevel=\"");
                xml.push_str(itoa::Buffer::new().format(record.level));
            }
            xml.push_str("\">");

            if record.kind == RecordKind::Header {
                for (j, col) in owner.leaf_columns().enumerate() {
                    write_header_cell(&mut xml, shift + j, row_num, &col.header, header_style, dictionary);
                }
            } else if is_special && record.data.is_scalar() {
                let value = scalar_value(record);
                write_cell(&mut xml, shift, row_num, value, dictionary);
            } else {
                for (j, col) in owner.leaf_columns().enumerate() {
                    let value = record.data.get(&col.field).unwrap_or(&CellValue::Empty);
                    write_cell(&mut xml, shift + j, row_num, value, dictionary);
                }
            }

            xml.push_str("</row>");
        }

        xml.push_str("</sheetData>");

        if !merges.is_empty() {
            xml.push_str("<mergeCells count=\"");
            append_usize(&mut xml, merges.len());
            xml.push_str("\">");
            for range in &merges {
                xml.push_str("<mergeCell ref=\"");
                xml.push_str(range);
                xml.push_str("\"/>");
            }
            xml.push_str("</mergeCells>");
        }
    }

    xml.push_str(
        "<pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>",
    );
    if uses_table {
        xml.push_str("<tableParts count=\"1\"><tablePart r:id=\"rId1\"/></tableParts>");
    }
    xml.push_str("</worksheet>");
    xml
}

fn scalar_value(record: &ExportRecord) -> &CellValue {
    match &record.data {
        crate::types::RecordData::Scalar(v) => v,
        crate::types::RecordData::Fields(_) => &CellValue::Empty,
    }
}

/// Collapse runs of equal column widths into single `<col>` ranges.
fn write_column_widths(
    xml: &mut String,
    owner: &crate::types::ColumnOwner,
    column_count: usize,
    default_width: f64,
    dictionary: &mut WorksheetDictionary,
) {
    let leaf_widths: Vec<Option<f64>> = owner.leaf_columns().map(|c| c.width).collect();
    let width_of = |i: usize| -> f64 {
        owner
            .column_widths
            .get(i)
            .copied()
            .or_else(|| leaf_widths.get(i).copied().flatten())
            .unwrap_or(default_width)
    };

    xml.push_str("<cols>");
    let mut run_start = 0;
    let mut run_width = width_of(0);
    let mut run_id = dictionary.intern_column_width(run_width);
    for i in 1..=column_count {
        let (width, id) = if i < column_count {
            let w = width_of(i);
            (w, dictionary.intern_column_width(w))
        } else {
            (0.0, usize::MAX)
        };
        if id != run_id {
            xml.push_str("<col min=\"");
            append_usize(xml, run_start + 1);
            xml.push_str("\" max=\"");
            append_usize(xml, i);
            xml.push_str("\" width=\"");
            xml.push_str(ryu::Buffer::new().format(run_width));
            xml.push_str("\" customWidth=\"1\"/>");
            run_start = i;
            run_width = width;
            run_id = id;
        }
    }
    xml.push_str("</cols>");
}

fn write_header_cell(
    xml: &mut String,
    col: usize,
    row: usize,
    header: &str,
    style: Option<usize>,
    dictionary: &mut WorksheetDictionary,
) {
    let id = dictionary.intern_string(escaped(header));
    xml.push_str("<c r=\"");
    xml.push_str(&cell_ref(col, row));
    if let Some(style_id) = style {
        if style_id > 0 {
            xml.push_str("\" s=\"");
            append_usize(xml, style_id);
        }
    }
    xml.push_str("\" t=\"s\"><v>");
    append_usize(xml, id);
    xml.push_str("</v></c>");
}

fn write_cell(
    xml: &mut String,
    col: usize,
    row: usize,
    value: &CellValue,
    dictionary: &mut WorksheetDictionary,
) {
    match value {
        CellValue::Empty => {
            xml.push_str("<c r=\"");
            xml.push_str(&cell_ref(col, row));
            xml.push_str("\"/>");
        }
        CellValue::Text(_) => {
            let id = dictionary.save_value(value);
            xml.push_str("<c r=\"");
            xml.push_str(&cell_ref(col, row));
            xml.push_str("\" t=\"s\"><v>");
            append_usize(xml, id);
            xml.push_str("</v></c>");
        }
        CellValue::Number(n) => {
            let style = dictionary.intern_style(&CellStyle::NUMBER);
            xml.push_str("<c r=\"");
            xml.push_str(&cell_ref(col, row));
            xml.push_str("\" s=\"");
            append_usize(xml, style);
            xml.push_str("\"><v>");
            append_number(xml, *n);
            xml.push_str("</v></c>");
        }
        CellValue::Bool(b) => {
            xml.push_str("<c r=\"");
            xml.push_str(&cell_ref(col, row));
            xml.push_str("\" t=\"b\"><v>");
            xml.push_str(if *b { "1" } else { "0" });
            xml.push_str("</v></c>");
        }
        CellValue::Date(dt) => {
            let style = dictionary.intern_style(&CellStyle::DATE);
            xml.push_str("<c r=\"");
            xml.push_str(&cell_ref(col, row));
            xml.push_str("\" s=\"");
            append_usize(xml, style);
            xml.push_str("\"><v>");
            append_number(xml, datetime_to_excel_serial(dt));
            xml.push_str("</v></c>");
        }
    }
}

pub fn generate_theme_xml() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="5B9BD5"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="4472C4"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light" panose="020F0302020204030204"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri" panose="020F0502020204030204"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:lumMod val="110000"/><a:satMod val="105000"/><a:tint val="67000"/></a:schemeClr></a:gs><a:gs pos="50000"><a:schemeClr val="phClr"><a:lumMod val="105000"/><a:satMod val="103000"/><a:tint val="73000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:lumMod val="105000"/><a:satMod val="109000"/><a:tint val="81000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:satMod val="103000"/><a:lumMod val="102000"/><a:tint val="94000"/></a:schemeClr></a:gs><a:gs pos="50000"><a:schemeClr val="phClr"><a:satMod val="110000"/><a:lumMod val="100000"/><a:shade val="100000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:lumMod val="99000"/><a:satMod val="120000"/><a:shade val="78000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln><a:ln w="12700" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln><a:ln w="19050" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst><a:outerShdw blurRad="57150" dist="19050" dir="5400000" algn="ctr" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="63000"/></a:srgbClr></a:outerShdw></a:effectLst></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/><a:satMod val="170000"/></a:schemeClr></a:solidFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="93000"/><a:satMod val="150000"/><a:shade val="98000"/><a:lumMod val="102000"/></a:schemeClr></a:gs><a:gs pos="50000"><a:schemeClr val="phClr"><a:tint val="98000"/><a:satMod val="130000"/><a:shade val="90000"/><a:lumMod val="103000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="63000"/><a:satMod val="120000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#,
    );
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn column_letters() {
        assert_eq!(column_ref(0), "A");
        assert_eq!(column_ref(25), "Z");
        assert_eq!(column_ref(26), "AA");
        assert_eq!(column_ref(27), "AB");
        assert_eq!(column_ref(701), "ZZ");
        assert_eq!(column_ref(702), "AAA");
        assert_eq!(cell_ref(1, 3), "B3");
    }

    #[test]
    fn escaping_matches_the_entity_table() {
        assert_eq!(
            sanitize_value(&CellValue::from("a & b < c")),
            "a &amp; b &lt; c"
        );
        assert_eq!(sanitize_value(&CellValue::from("\"q\" 'a' >")), "&quot;q&quot; &apos;a&apos; &gt;");
        assert_eq!(sanitize_value(&CellValue::from("nul\0here")), "nulhere");
        assert_eq!(sanitize_value(&CellValue::Empty), "");
        assert_eq!(sanitize_value(&CellValue::from("plain")), "plain");
    }

    #[test]
    fn escaping_handles_multibyte_text() {
        assert_eq!(sanitize_value(&CellValue::from("héllo & wörld")), "héllo &amp; wörld");
    }

    #[test]
    fn numbers_take_the_integer_short_path() {
        assert_eq!(sanitize_value(&CellValue::from(42i64)), "42");
        assert_eq!(sanitize_value(&CellValue::Number(-17.0)), "-17");
        assert_eq!(sanitize_value(&CellValue::Number(1.5)), "1.5");
        assert_eq!(sanitize_value(&CellValue::Bool(true)), "true");
    }

    #[test]
    fn excel_serial_dates() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(datetime_to_excel_serial(&dt), 43831.0);

        let noon = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(datetime_to_excel_serial(&noon), 43831.5);
    }

    #[test]
    fn content_types_overrides_are_conditional() {
        let xml = generate_content_types(false, false);
        assert!(!xml.contains("sharedStrings.xml"));
        assert!(!xml.contains("table1.xml"));

        let xml = generate_content_types(true, true);
        assert!(xml.contains("/xl/sharedStrings.xml"));
        assert!(xml.contains("/xl/tables/table1.xml"));
    }

    #[test]
    fn workbook_rels_reference_shared_strings_only_when_present() {
        assert!(!generate_workbook_rels(false).contains("sharedStrings.xml"));
        assert!(generate_workbook_rels(true).contains("rId4"));
    }

    #[test]
    fn shared_strings_counts() {
        let mut dict = WorksheetDictionary::new();
        dict.save_value(&CellValue::from("a"));
        dict.save_value(&CellValue::from("a"));
        dict.save_value(&CellValue::from("b"));
        let xml = generate_shared_strings(&dict);
        assert!(xml.contains("count=\"3\" uniqueCount=\"2\""));
        assert!(xml.contains("<si><t>a</t></si><si><t>b</t></si>"));
    }

    #[test]
    fn workbook_escapes_the_sheet_name() {
        let xml = generate_workbook("P&L");
        assert!(xml.contains("<sheet name=\"P&amp;L\" sheetId=\"1\""));
    }
}

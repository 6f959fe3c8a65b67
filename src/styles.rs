//! Cell style descriptors and the `xl/styles.xml` part.

use crate::dictionary::WorksheetDictionary;

/// One `cellXfs` entry. The font/fill ids index the fixed tables emitted by
/// [`generate_styles_xml`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStyle {
    pub num_fmt_id: u16,
    pub font_id: u16,
    pub fill_id: u16,
    pub apply_number_format: bool,
}

impl CellStyle {
    /// The workbook default, always present at style id 0.
    pub const DEFAULT: CellStyle = CellStyle {
        num_fmt_id: 0,
        font_id: 0,
        fill_id: 0,
        apply_number_format: false,
    };

    pub const NUMBER: CellStyle = CellStyle {
        num_fmt_id: 0,
        font_id: 0,
        fill_id: 0,
        apply_number_format: true,
    };

    /// Built-in short date format.
    pub const DATE: CellStyle = CellStyle {
        num_fmt_id: 14,
        font_id: 0,
        fill_id: 0,
        apply_number_format: true,
    };

    /// Dimmed header used for nested grid header rows.
    pub const NESTED_HEADER: CellStyle = CellStyle {
        num_fmt_id: 0,
        font_id: 1,
        fill_id: 2,
        apply_number_format: false,
    };
}

const BASE_FONT: &str = "<font><sz val=\"11\"/><color theme=\"1\"/><name val=\"Calibri\"/><family val=\"2\"/><scheme val=\"minor\"/></font>";
const NESTED_HEADER_FONT: &str = "<font><sz val=\"11\"/><color rgb=\"FFB7B7B7\"/><name val=\"Calibri\"/><family val=\"2\"/><scheme val=\"minor\"/></font>";
const NESTED_HEADER_FILL: &str = "<fill><patternFill patternType=\"solid\"><fgColor rgb=\"FF0D1822\"/><bgColor indexed=\"64\"/></patternFill></fill>";

/// Assemble the stylesheet from the dictionary's style space. Nested-grid
/// exports carry one extra font and fill for their header rows.
pub fn generate_styles_xml(dictionary: &WorksheetDictionary, hierarchical: bool) -> String {
    let fonts_count = if hierarchical { 2 } else { 1 };
    let fills_count = if hierarchical { 3 } else { 2 };

    let mut xml = String::with_capacity(2048 + dictionary.styles().len() * 96);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n");
    xml.push_str(
        "<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:mc=\"http://schemas.openxmlformats.org/markup-compatibility/2006\" mc:Ignorable=\"x14ac x16r2\" \
xmlns:x14ac=\"http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac\" \
xmlns:x16r2=\"http://schemas.microsoft.com/office/spreadsheetml/2015/02/main\">",
    );

    xml.push_str(&format!(
        "<fonts count=\"{}\" x14ac:knownFonts=\"1\">{}{}</fonts>",
        fonts_count,
        BASE_FONT,
        if hierarchical { NESTED_HEADER_FONT } else { "" }
    ));

    xml.push_str(&format!(
        "<fills count=\"{}\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill>{}</fills>",
        fills_count,
        if hierarchical { NESTED_HEADER_FILL } else { "" }
    ));

    xml.push_str("<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>");
    xml.push_str("<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>");

    let styles = dictionary.styles();
    xml.push_str(&format!("<cellXfs count=\"{}\">", styles.len()));
    for style in styles {
        xml.push_str(&format!(
            "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"0\" xfId=\"0\"",
            style.num_fmt_id, style.font_id, style.fill_id
        ));
        if style.apply_number_format {
            xml.push_str(" applyNumberFormat=\"1\"");
        }
        xml.push_str("/>");
    }
    xml.push_str("</cellXfs>");

    xml.push_str("<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>");
    xml.push_str("<dxfs count=\"0\"/>");
    xml.push_str("<tableStyles count=\"0\" defaultTableStyle=\"TableStyleMedium2\" defaultPivotStyle=\"PivotStyleLight16\"/>");
    xml.push_str(
        "<extLst><ext uri=\"{EB79DEF2-80B8-43e5-95BD-54CBDDF9020C}\" \
xmlns:x14=\"http://schemas.microsoft.com/office/spreadsheetml/2009/9/main\">\
<x14:slicerStyles defaultSlicerStyle=\"SlicerStyleLight1\"/></ext>\
<ext uri=\"{9260A510-F301-46a8-8635-F512D64BE5F5}\" \
xmlns:x15=\"http://schemas.microsoft.com/office/spreadsheetml/2010/11/main\">\
<x15:timelineStyles defaultTimelineStyle=\"TimeSlicerStyleLight1\"/></ext></extLst>",
    );
    xml.push_str("</styleSheet>");
    xml
}

use std::io::{Cursor, Read};

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use gridxl::{
    CellValue, ColumnDescriptor, ColumnOwner, ExportOptions, ExportRecord, Exporter,
    FileSaveSink, HeaderKind, OwnerKey, OwnerMap, RecordData, RecordKind, SortSpec,
};

fn record(pairs: Vec<(&str, CellValue)>) -> ExportRecord {
    ExportRecord::new(RecordData::Fields(
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    ))
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid archive");
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing part {}", name))
        .read_to_string(&mut content)
        .expect("readable part");
    content
}

fn part_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid archive");
    archive.file_names().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn exported_archive_opens_with_a_standard_zip_reader() {
    let records = vec![
        record(vec![("Name", CellValue::from("A"))]),
        record(vec![("Name", CellValue::from("B"))]),
    ];
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name"]));
    let outcome = Exporter::new()
        .export_data(records, owners, ExportOptions::default())
        .await
        .unwrap();

    let names = part_names(&outcome.bytes);
    for expected in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/app.xml",
        "docProps/core.xml",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/sharedStrings.xml",
        "xl/theme/theme1.xml",
        "xl/worksheets/sheet1.xml",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert_eq!(sheet.matches("<row ").count(), 3);

    let shared = read_part(&outcome.bytes, "xl/sharedStrings.xml");
    assert!(shared.contains("uniqueCount=\"3\""));
    assert!(shared.contains("<si><t>Name</t></si>"));
    assert!(shared.contains("<si><t>A</t></si>"));
    assert!(shared.contains("<si><t>B</t></si>"));
}

#[tokio::test]
async fn cell_types_map_to_their_xlsx_forms() {
    let when = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let records = vec![record(vec![
        ("Name", CellValue::from("Widget & Co")),
        ("Qty", CellValue::from(5i64)),
        ("Active", CellValue::Bool(true)),
        ("When", CellValue::Date(when)),
    ])];
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name", "Qty", "Active", "When"]));
    let outcome = Exporter::new()
        .export_data(records, owners, ExportOptions::default())
        .await
        .unwrap();

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<c r=\"A2\" t=\"s\"><v>4</v></c>"));
    assert!(sheet.contains("<c r=\"B2\" s=\"1\"><v>5</v></c>"));
    assert!(sheet.contains("<c r=\"C2\" t=\"b\"><v>1</v></c>"));
    assert!(sheet.contains("<c r=\"D2\" s=\"2\"><v>43831</v></c>"));

    // the ampersand is escaped exactly once on its way into the dictionary
    let shared = read_part(&outcome.bytes, "xl/sharedStrings.xml");
    assert!(shared.contains("<si><t>Widget &amp; Co</t></si>"));
    assert!(!shared.contains("&amp;amp;"));

    let styles = read_part(&outcome.bytes, "xl/styles.xml");
    assert!(styles.contains("<cellXfs count=\"3\">"));
    assert!(styles.contains("<xf numFmtId=\"14\""));
}

#[tokio::test]
async fn native_table_mode_adds_the_table_parts() {
    let records = vec![
        record(vec![("Name", CellValue::from("A"))]),
        record(vec![("Name", CellValue::from("B"))]),
    ];
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name"]));
    let mut options = ExportOptions::default().as_table();
    options.sort = Some(SortSpec {
        field: "Name".to_string(),
        descending: true,
    });
    let outcome = Exporter::new()
        .export_data(records, owners, options)
        .await
        .unwrap();

    let names = part_names(&outcome.bytes);
    assert!(names.iter().any(|n| n == "xl/tables/table1.xml"));
    assert!(names.iter().any(|n| n == "xl/worksheets/_rels/sheet1.xml.rels"));

    let table = read_part(&outcome.bytes, "xl/tables/table1.xml");
    assert!(table.contains("ref=\"A1:A3\""));
    assert!(table.contains("<tableColumn id=\"1\" name=\"Name\"/>"));
    assert!(table.contains("<sortCondition descending=\"1\" ref=\"A2:A3\"/>"));

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<tableParts count=\"1\"><tablePart r:id=\"rId1\"/></tableParts>"));

    let types = read_part(&outcome.bytes, "[Content_Types].xml");
    assert!(types.contains("/xl/tables/table1.xml"));
}

#[tokio::test]
async fn hierarchical_exports_shift_nested_grids_and_drop_table_mode() {
    let child_owner = ColumnOwner::from_fields(["City", "Zip"]);
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name"]))
        .with_owner(OwnerKey::Row(1), child_owner);
    let records = vec![
        record(vec![("Name", CellValue::from("Ann"))]),
        ExportRecord::new(RecordData::Fields(Vec::new()))
            .with_kind(RecordKind::Header)
            .with_owner(OwnerKey::Row(1))
            .with_level(1),
        record(vec![
            ("City", CellValue::from("Sofia")),
            ("Zip", CellValue::from("1000")),
        ])
        .with_kind(RecordKind::HierarchicalChild)
        .with_owner(OwnerKey::Row(1))
        .with_level(1),
    ];

    // table mode is requested but unrepresentable for nested grids
    let outcome = Exporter::new()
        .export_data(records, owners, ExportOptions::default().as_table())
        .await
        .unwrap();

    let names = part_names(&outcome.bytes);
    assert!(!names.iter().any(|n| n == "xl/tables/table1.xml"));

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    // nested grid starts one column to the right and carries its outline level
    assert!(sheet.contains("<row r=\"3\" outlineLevel=\"1\">"));
    assert!(sheet.contains("<c r=\"B3\" s=\"1\" t=\"s\">"));
    assert!(sheet.contains("<c r=\"B4\" t=\"s\">"));
    assert!(sheet.contains("<c r=\"C4\" t=\"s\">"));

    let styles = read_part(&outcome.bytes, "xl/styles.xml");
    assert!(styles.contains("FFB7B7B7"));
    assert!(styles.contains("FF0D1822"));
}

#[tokio::test]
async fn tree_exports_carry_outline_levels() {
    let records = vec![
        record(vec![("Name", CellValue::from("root"))]).with_kind(RecordKind::Tree),
        record(vec![("Name", CellValue::from("child"))])
            .with_kind(RecordKind::Tree)
            .with_level(1),
        record(vec![("Name", CellValue::from("grandchild"))])
            .with_kind(RecordKind::Tree)
            .with_level(2),
    ];
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name"]));
    let outcome = Exporter::new()
        .export_data(records, owners, ExportOptions::default())
        .await
        .unwrap();

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<sheetPr><outlinePr summaryBelow=\"0\"/></sheetPr>"));
    assert!(sheet.contains("outlineLevelRow=\"2\""));
    assert!(sheet.contains("<row r=\"3\" outlineLevel=\"1\">"));
    assert!(sheet.contains("<row r=\"4\" outlineLevel=\"2\">"));
}

#[tokio::test]
async fn multi_column_headers_merge_and_disable_table_mode() {
    let mut owner = ColumnOwner::default();
    owner.max_level = 1;
    owner.columns = vec![
        {
            let mut c = ColumnDescriptor::new("group").with_header("Address");
            c.header_kind = HeaderKind::MultiColumn;
            c.level = 0;
            c.column_span = 2;
            c.start_index = 0;
            c
        },
        {
            let mut c = ColumnDescriptor::new("City");
            c.level = 1;
            c.start_index = 0;
            c
        },
        {
            let mut c = ColumnDescriptor::new("Zip");
            c.level = 1;
            c.start_index = 1;
            c
        },
    ];
    let records = vec![record(vec![
        ("City", CellValue::from("Sofia")),
        ("Zip", CellValue::from("1000")),
    ])];
    let outcome = Exporter::new()
        .export_data(records, OwnerMap::new(owner), ExportOptions::default().as_table())
        .await
        .unwrap();

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<mergeCells count=\"1\"><mergeCell ref=\"A1:B1\"/></mergeCells>"));
    // group header row, leaf header row, one data row
    assert_eq!(sheet.matches("<row ").count(), 3);
    assert!(!sheet.contains("tableParts"));

    let names = part_names(&outcome.bytes);
    assert!(!names.iter().any(|n| n == "xl/tables/table1.xml"));
}

#[tokio::test]
async fn scalar_datasets_export_as_a_single_column() {
    let records: Vec<ExportRecord> = ["x", "y"]
        .iter()
        .map(|s| ExportRecord::new(RecordData::Scalar(CellValue::from(*s))))
        .collect();
    let outcome = Exporter::new()
        .export_data(records, OwnerMap::default(), ExportOptions::default())
        .await
        .unwrap();

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<dimension ref=\"A1:A3\"/>"));
    let shared = read_part(&outcome.bytes, "xl/sharedStrings.xml");
    assert!(shared.contains("<si><t>Column 1</t></si>"));
    assert!(shared.contains("<si><t>x</t></si>"));
    assert!(shared.contains("<si><t>y</t></si>"));
}

#[tokio::test]
async fn empty_datasets_export_a_header_only_sheet() {
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name", "Age"]));
    let outcome = Exporter::new()
        .export_data(Vec::new(), owners, ExportOptions::default())
        .await
        .unwrap();

    assert!(!outcome.bytes.is_empty());
    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<dimension ref=\"A1:B1\"/>"));
    assert_eq!(sheet.matches("<row ").count(), 1);
    let shared = read_part(&outcome.bytes, "xl/sharedStrings.xml");
    assert!(shared.contains("<si><t>Name</t></si>"));
    assert!(shared.contains("<si><t>Age</t></si>"));
}

#[tokio::test]
async fn pinned_columns_freeze_the_pane() {
    let mut owner = ColumnOwner::from_fields(["Id", "Name"]);
    owner.index_of_last_pinned_column = Some(0);
    let records = vec![record(vec![
        ("Id", CellValue::from(1i64)),
        ("Name", CellValue::from("A")),
    ])];
    let outcome = Exporter::new()
        .export_data(records, OwnerMap::new(owner), ExportOptions::default())
        .await
        .unwrap();

    let sheet = read_part(&outcome.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(
        "<pane xSplit=\"1\" topLeftCell=\"B1\" activePane=\"topRight\" state=\"frozen\"/>"
    ));
}

#[tokio::test]
async fn save_sink_receives_the_archive() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![record(vec![("Name", CellValue::from("A"))])];
    let owners = OwnerMap::new(ColumnOwner::from_fields(["Name"]));
    let options = ExportOptions::default().with_file_name("people.xlsx");

    let exporter = Exporter::new().with_save_sink(FileSaveSink::new(dir.path()));
    let outcome = exporter.export_data(records, owners, options).await.unwrap();

    let saved = std::fs::read(dir.path().join("people.xlsx")).unwrap();
    assert_eq!(saved, outcome.bytes);
}

#[tokio::test]
async fn concurrent_exports_do_not_interfere() {
    let exporter = Exporter::new();
    let a = exporter.export_data(
        vec![record(vec![("Name", CellValue::from("left"))])],
        OwnerMap::new(ColumnOwner::from_fields(["Name"])),
        ExportOptions::default(),
    );
    let b = exporter.export_data(
        vec![record(vec![("Name", CellValue::from("right"))])],
        OwnerMap::new(ColumnOwner::from_fields(["Name"])),
        ExportOptions::default(),
    );
    let (a, b) = tokio::join!(a, b);
    let shared_a = read_part(&a.unwrap().bytes, "xl/sharedStrings.xml");
    let shared_b = read_part(&b.unwrap().bytes, "xl/sharedStrings.xml");
    assert!(shared_a.contains("left") && !shared_a.contains("right"));
    assert!(shared_b.contains("right") && !shared_b.contains("left"));
}

mod sanitize_properties {
    use gridxl::{sanitize_value, CellValue};
    use proptest::prelude::*;

    fn unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    proptest! {
        #[test]
        fn output_is_free_of_raw_metacharacters(input in ".*") {
            let out = sanitize_value(&CellValue::Text(input));
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
            prop_assert!(!out.contains('"'));
            prop_assert!(!out.contains('\''));
            prop_assert!(!out.contains('\0'));
        }

        #[test]
        fn unescaping_restores_the_input(input in ".*") {
            prop_assume!(!input.contains('\0'));
            let out = sanitize_value(&CellValue::Text(input.clone()));
            prop_assert_eq!(unescape(&out), input);
        }
    }
}

//! The archive node tree: folder/file kinds and the walk that turns a
//! [`WorksheetData`] into the nested path -> content structure of the
//! package.

use futures::future::BoxFuture;

use crate::styles;
use crate::types::ExportError;
use crate::worksheet::WorksheetData;
use crate::xml;

/// One entry of the archive: raw file bytes or a nested folder.
#[derive(Debug)]
pub enum ArchiveEntry {
    File(Vec<u8>),
    Folder(ArchiveDirectory),
}

/// Insertion-ordered folder contents.
#[derive(Debug, Default)]
pub struct ArchiveDirectory {
    entries: Vec<(String, ArchiveEntry)>,
}

impl ArchiveDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nested folder with the given name, created on first access.
    pub fn folder_mut(&mut self, name: &str) -> &mut ArchiveDirectory {
        let pos = match self
            .entries
            .iter()
            .position(|(n, e)| n == name && matches!(e, ArchiveEntry::Folder(_)))
        {
            Some(pos) => pos,
            None => {
                self.entries
                    .push((name.to_string(), ArchiveEntry::Folder(ArchiveDirectory::new())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[pos].1 {
            ArchiveEntry::Folder(dir) => dir,
            ArchiveEntry::File(_) => unreachable!(),
        }
    }

    pub fn insert_file(&mut self, name: &str, bytes: Vec<u8>) {
        self.entries.push((name.to_string(), ArchiveEntry::File(bytes)));
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ArchiveEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Look up a file by slash-separated path.
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        let mut dir = self;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let entry = dir.entries.iter().find(|(n, _)| n == segment)?;
            match &entry.1 {
                ArchiveEntry::File(bytes) => {
                    return if segments.peek().is_none() {
                        Some(bytes)
                    } else {
                        None
                    };
                }
                ArchiveEntry::Folder(sub) => dir = sub,
            }
        }
        None
    }

    /// Full slash-separated paths of every file, depth-first.
    pub fn flatten(&self) -> Vec<(String, &[u8])> {
        let mut files = Vec::new();
        self.collect_files(String::new(), &mut files);
        files
    }

    fn collect_files<'a>(&'a self, prefix: String, files: &mut Vec<(String, &'a [u8])>) {
        for (name, entry) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            match entry {
                ArchiveEntry::File(bytes) => files.push((path, bytes)),
                ArchiveEntry::Folder(dir) => dir.collect_files(path, files),
            }
        }
    }
}

/// Folders of the package, a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    Root,
    RootRels,
    DocProps,
    Xl,
    XlRels,
    Theme,
    Worksheets,
    WorksheetsRels,
    Tables,
}

/// Files of the package, a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    RootRels,
    App,
    Core,
    WorkbookRels,
    Theme,
    Worksheet,
    Style,
    Workbook,
    ContentTypes,
    SharedStrings,
    WorksheetRels,
    Tables,
}

impl FolderKind {
    pub fn name(self) -> &'static str {
        match self {
            FolderKind::Root => "",
            FolderKind::RootRels => "_rels",
            FolderKind::DocProps => "docProps",
            FolderKind::Xl => "xl",
            FolderKind::XlRels => "_rels",
            FolderKind::Theme => "theme",
            FolderKind::Worksheets => "worksheets",
            FolderKind::WorksheetsRels => "_rels",
            FolderKind::Tables => "tables",
        }
    }

    pub fn child_folders(self, data: &WorksheetData) -> Vec<FolderKind> {
        match self {
            FolderKind::Root => vec![FolderKind::RootRels, FolderKind::DocProps, FolderKind::Xl],
            FolderKind::Xl => {
                let mut folders =
                    vec![FolderKind::XlRels, FolderKind::Theme, FolderKind::Worksheets];
                if data.uses_table() {
                    folders.push(FolderKind::Tables);
                }
                folders
            }
            FolderKind::Worksheets => {
                if data.uses_table() {
                    vec![FolderKind::WorksheetsRels]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    pub fn child_files(self, data: &WorksheetData) -> Vec<FileKind> {
        match self {
            FolderKind::Root => vec![FileKind::ContentTypes],
            FolderKind::RootRels => vec![FileKind::RootRels],
            FolderKind::DocProps => vec![FileKind::App, FileKind::Core],
            FolderKind::Xl => {
                let mut files = vec![FileKind::Style, FileKind::Workbook];
                if data.dictionary().has_strings() {
                    files.push(FileKind::SharedStrings);
                }
                files
            }
            FolderKind::XlRels => vec![FileKind::WorkbookRels],
            FolderKind::Theme => vec![FileKind::Theme],
            FolderKind::Worksheets => vec![FileKind::Worksheet],
            FolderKind::WorksheetsRels => vec![FileKind::WorksheetRels],
            FolderKind::Tables => vec![FileKind::Tables],
        }
    }
}

impl FileKind {
    pub fn name(self) -> &'static str {
        match self {
            FileKind::RootRels => ".rels",
            FileKind::App => "app.xml",
            FileKind::Core => "core.xml",
            FileKind::WorkbookRels => "workbook.xml.rels",
            FileKind::Theme => "theme1.xml",
            FileKind::Worksheet => "sheet1.xml",
            FileKind::Style => "styles.xml",
            FileKind::Workbook => "workbook.xml",
            FileKind::ContentTypes => "[Content_Types].xml",
            FileKind::SharedStrings => "sharedStrings.xml",
            FileKind::WorksheetRels => "sheet1.xml.rels",
            FileKind::Tables => "table1.xml",
        }
    }

    /// Synchronous part assembly. The worksheet is excluded here: its size
    /// scales with the dataset and it streams through
    /// [`xml::write_worksheet_xml`] instead.
    fn write(self, data: &WorksheetData) -> String {
        match self {
            FileKind::RootRels => xml::generate_root_rels(),
            FileKind::App => xml::generate_app_xml(&data.options().worksheet_name),
            FileKind::Core => xml::generate_core_xml(),
            FileKind::WorkbookRels => {
                xml::generate_workbook_rels(data.dictionary().has_strings())
            }
            FileKind::Theme => xml::generate_theme_xml(),
            FileKind::Style => {
                styles::generate_styles_xml(data.dictionary(), data.is_hierarchical())
            }
            FileKind::Workbook => xml::generate_workbook(&data.options().worksheet_name),
            FileKind::ContentTypes => xml::generate_content_types(
                data.dictionary().has_strings(),
                data.uses_table(),
            ),
            FileKind::SharedStrings => xml::generate_shared_strings(data.dictionary()),
            FileKind::WorksheetRels => xml::generate_worksheet_rels(),
            FileKind::Tables => xml::generate_table_xml(data),
            FileKind::Worksheet => String::new(),
        }
    }
}

/// Depth-first walk. Child folders are fully populated before any sibling
/// file of the current folder is written, so parts like the content types
/// and workbook relationships observe the dictionary state produced by the
/// worksheet stream.
pub fn populate_folder<'a>(
    folder: FolderKind,
    data: &'a mut WorksheetData,
    dir: &'a mut ArchiveDirectory,
) -> BoxFuture<'a, Result<(), ExportError>> {
    Box::pin(async move {
        for child in folder.child_folders(data) {
            let sub = dir.folder_mut(child.name());
            populate_folder(child, data, sub).await?;
        }
        for file in folder.child_files(data) {
            let content = match file {
                FileKind::Worksheet => xml::write_worksheet_xml(data).await,
                _ => file.write(data),
            };
            log::trace!("wrote archive part {} ({} bytes)", file.name(), content.len());
            dir.insert_file(file.name(), content.into_bytes());
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CellValue, ColumnOwner, ExportOptions, ExportRecord, OwnerMap, RecordData,
    };

    fn sample_data(export_as_table: bool) -> WorksheetData {
        let records = vec![
            ExportRecord::new(RecordData::Fields(vec![(
                "Name".to_string(),
                CellValue::from("A"),
            )])),
            ExportRecord::new(RecordData::Fields(vec![(
                "Name".to_string(),
                CellValue::from("B"),
            )])),
        ];
        let owners = OwnerMap::new(ColumnOwner::from_fields(["Name"]));
        let mut options = ExportOptions::default();
        options.export_as_table = export_as_table;
        WorksheetData::new(records, options, owners, 1, vec![])
    }

    #[tokio::test]
    async fn walk_produces_the_package_layout() {
        let mut data = sample_data(false);
        let mut root = ArchiveDirectory::new();
        populate_folder(FolderKind::Root, &mut data, &mut root)
            .await
            .unwrap();

        for path in [
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
            assert!(root.file(path).is_some(), "missing {}", path);
        }
        assert!(root.file("xl/tables/table1.xml").is_none());
        assert!(root.file("xl/worksheets/_rels/sheet1.xml.rels").is_none());
    }

    #[tokio::test]
    async fn table_mode_adds_table_parts() {
        let mut data = sample_data(true);
        let mut root = ArchiveDirectory::new();
        populate_folder(FolderKind::Root, &mut data, &mut root)
            .await
            .unwrap();

        assert!(root.file("xl/tables/table1.xml").is_some());
        assert!(root.file("xl/worksheets/_rels/sheet1.xml.rels").is_some());
        let sheet = String::from_utf8(root.file("xl/worksheets/sheet1.xml").unwrap().to_vec()).unwrap();
        assert!(sheet.contains("<tableParts count=\"1\">"));
        let types = String::from_utf8(root.file("[Content_Types].xml").unwrap().to_vec()).unwrap();
        assert!(types.contains("/xl/tables/table1.xml"));
    }

    #[tokio::test]
    async fn folders_resolve_before_sibling_files() {
        // the worksheet stream populates the dictionary; parts written
        // afterwards at higher levels must observe it
        let mut data = sample_data(false);
        let mut root = ArchiveDirectory::new();
        populate_folder(FolderKind::Root, &mut data, &mut root)
            .await
            .unwrap();

        let shared = String::from_utf8(root.file("xl/sharedStrings.xml").unwrap().to_vec()).unwrap();
        assert!(shared.contains("uniqueCount=\"3\""));
        let rels = String::from_utf8(root.file("xl/_rels/workbook.xml.rels").unwrap().to_vec()).unwrap();
        assert!(rels.contains("sharedStrings.xml"));
        let types = String::from_utf8(root.file("[Content_Types].xml").unwrap().to_vec()).unwrap();
        assert!(types.contains("/xl/sharedStrings.xml"));
    }

    #[tokio::test]
    async fn worksheet_rows_follow_input_order() {
        let mut data = sample_data(false);
        let mut root = ArchiveDirectory::new();
        populate_folder(FolderKind::Root, &mut data, &mut root)
            .await
            .unwrap();

        let sheet = String::from_utf8(root.file("xl/worksheets/sheet1.xml").unwrap().to_vec()).unwrap();
        // header "Name" -> 0, then "A" -> 1, "B" -> 2 in emission order
        assert!(sheet.contains("<row r=\"1\"><c r=\"A1\" t=\"s\"><v>0</v></c></row>"));
        assert!(sheet.contains("<row r=\"2\"><c r=\"A2\" t=\"s\"><v>1</v></c></row>"));
        assert!(sheet.contains("<row r=\"3\"><c r=\"A3\" t=\"s\"><v>2</v></c></row>"));
    }

    #[test]
    fn directory_path_lookup() {
        let mut root = ArchiveDirectory::new();
        root.insert_file("a.txt", b"top".to_vec());
        root.folder_mut("sub").insert_file("b.txt", b"nested".to_vec());
        assert_eq!(root.file("a.txt"), Some(&b"top"[..]));
        assert_eq!(root.file("sub/b.txt"), Some(&b"nested"[..]));
        assert!(root.file("sub/missing.txt").is_none());
        assert!(root.file("a.txt/oops").is_none());

        let flat = root.flatten();
        let paths: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, ["a.txt", "sub/b.txt"]);
    }
}

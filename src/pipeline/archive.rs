//! Zip packaging for all-pages PDF renders.
//!
//! Pages are appended as they are rendered, so entry order in the archive is
//! page order. Entries are named `page_<n>.<ext>` with 1-indexed `n`.

use crate::error::ConvertError;
use crate::format::Format;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// In-memory zip archive of encoded pages.
pub struct PageArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    target: Format,
    entries: usize,
}

impl PageArchive {
    /// Start an empty archive whose entries carry `target`'s extension.
    pub fn new(target: Format) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            target,
            entries: 0,
        }
    }

    /// Entry name for a 1-indexed page.
    pub fn entry_name(page: usize, target: Format) -> String {
        format!("page_{page}.{}", target.extension())
    }

    /// Append one encoded page.
    pub fn add_page(&mut self, page: usize, bytes: &[u8]) -> Result<(), ConvertError> {
        let name = Self::entry_name(page, self.target);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name.as_str(), options)
            .map_err(|e| archive_error(&name, e))?;
        self.writer
            .write_all(bytes)
            .map_err(|e| archive_error(&name, e))?;
        self.entries += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Write the central directory and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, ConvertError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| archive_error("central directory", e))?;
        Ok(cursor.into_inner())
    }
}

fn archive_error(entry: &str, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Encode {
        format: "ZIP".into(),
        detail: format!("{entry}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn entries_are_named_and_ordered_by_page() {
        let mut archive = PageArchive::new(Format::Jpeg);
        archive.add_page(1, b"first").unwrap();
        archive.add_page(2, b"second").unwrap();
        archive.add_page(3, b"third").unwrap();
        assert_eq!(archive.len(), 3);
        let bytes = archive.finish().unwrap();

        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["page_1.jpg", "page_2.jpg", "page_3.jpg"]);

        let mut content = String::new();
        zip.by_name("page_2.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn skipped_pages_leave_gaps_in_names() {
        let mut archive = PageArchive::new(Format::Png);
        archive.add_page(1, b"a").unwrap();
        archive.add_page(3, b"c").unwrap();
        let zip = ZipArchive::new(Cursor::new(archive.finish().unwrap())).unwrap();
        assert_eq!(zip.len(), 2);
        assert!(zip.file_names().any(|n| n == "page_3.png"));
        assert!(!zip.file_names().any(|n| n == "page_2.png"));
    }

    #[test]
    fn entry_name_uses_canonical_extension() {
        assert_eq!(PageArchive::entry_name(7, Format::Webp), "page_7.webp");
        assert_eq!(PageArchive::entry_name(1, Format::Jpeg), "page_1.jpg");
    }

    #[test]
    fn empty_archive_is_still_valid_zip() {
        let archive = PageArchive::new(Format::Bmp);
        assert!(archive.is_empty());
        let zip = ZipArchive::new(Cursor::new(archive.finish().unwrap())).unwrap();
        assert_eq!(zip.len(), 0);
    }
}

//! Data carried in and out of a conversion: the upload, the request built
//! from the user's selections, and the downloadable result.

use crate::config::PdfOptions;
use crate::error::{ConvertError, PageError};
use crate::format::{self, Domain, Format};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stem used when an upload's name has none (e.g. `.csv`).
const FALLBACK_STEM: &str = "converted";

/// Raw bytes of an uploaded file plus its declared name.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File stem used to name outputs; directory parts are discarded.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.trim().is_empty() && !s.starts_with('.'))
            .unwrap_or(FALLBACK_STEM)
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One conversion the user asked for.
///
/// Construction classifies the upload and validates the target, so a
/// request that exists is always dispatchable.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    upload: UploadedFile,
    source: Format,
    target: Format,
    pdf: PdfOptions,
}

impl ConversionRequest {
    /// Classify `upload` and pair it with `target` (an extension such as
    /// `"json"` or `"jpg"`).
    ///
    /// # Errors
    /// `UnsupportedFormat`-kind errors for an unknown source extension or a
    /// target not offered for that source.
    pub fn new(upload: UploadedFile, target: &str) -> Result<Self, ConvertError> {
        let source = format::classify(upload.name())?;
        let target = format::resolve_target(source, target)?;
        Ok(Self {
            upload,
            source,
            target,
            pdf: PdfOptions::default(),
        })
    }

    /// Attach PDF page/DPI choices. Ignored for non-PDF sources.
    pub fn with_pdf_options(mut self, pdf: PdfOptions) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn upload(&self) -> &UploadedFile {
        &self.upload
    }

    pub fn domain(&self) -> Domain {
        self.source.domain()
    }

    pub fn source(&self) -> Format {
        self.source
    }

    pub fn target(&self) -> Format {
        self.target
    }

    pub fn pdf_options(&self) -> &PdfOptions {
        &self.pdf
    }
}

/// Pages of an all-pages PDF render that made it into the archive, and the
/// ones that did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfRenderSummary {
    pub total_pages: usize,
    /// 1-indexed page numbers written to the archive, ascending.
    pub rendered_pages: Vec<usize>,
    pub failed_pages: Vec<PageError>,
}

impl PdfRenderSummary {
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty()
    }

    pub fn failed_page_numbers(&self) -> Vec<usize> {
        self.failed_pages.iter().map(PageError::page).collect()
    }
}

/// The downloadable output of one conversion.
#[derive(Clone, PartialEq)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
    /// Present only for all-pages PDF conversions.
    pub pdf_summary: Option<PdfRenderSummary>,
}

impl ConversionResult {
    pub(crate) fn single(bytes: Vec<u8>, stem: &str, target: Format) -> Self {
        Self {
            bytes,
            file_name: format!("{stem}.{}", target.extension()),
            mime_type: target.mime_type(),
            pdf_summary: None,
        }
    }

    pub(crate) fn archive(bytes: Vec<u8>, stem: &str, summary: PdfRenderSummary) -> Self {
        Self {
            bytes,
            file_name: format!("{stem}_all_pages.zip"),
            mime_type: "application/zip",
            pdf_summary: Some(summary),
        }
    }
}

impl fmt::Debug for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionResult")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("pdf_summary", &self.pdf_summary)
            .finish()
    }
}

/// Facts about a PDF needed before choosing a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfInfo {
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn stem_strips_directories_and_extension() {
        assert_eq!(UploadedFile::new("data/sales.csv", vec![]).stem(), "sales");
        assert_eq!(UploadedFile::new("scan.v2.pdf", vec![]).stem(), "scan.v2");
    }

    #[test]
    fn empty_stem_falls_back() {
        assert_eq!(UploadedFile::new(".csv", vec![]).stem(), "converted");
        assert_eq!(UploadedFile::new(" .png", vec![]).stem(), "converted");
    }

    #[test]
    fn request_rejects_unsupported_upload_before_reading_bytes() {
        let upload = UploadedFile::new("letter.docx", b"PK\x03\x04 not really".to_vec());
        let err = ConversionRequest::new(upload, "txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn request_records_domain_and_formats() {
        let req = ConversionRequest::new(UploadedFile::new("a.jpeg", vec![]), "png").unwrap();
        assert_eq!(req.domain(), Domain::Image);
        assert_eq!(req.source(), Format::Jpeg);
        assert_eq!(req.target(), Format::Png);
    }

    #[test]
    fn result_naming() {
        let single = ConversionResult::single(vec![1], "report", Format::Jpeg);
        assert_eq!(single.file_name, "report.jpg");
        assert_eq!(single.mime_type, "image/jpeg");

        let zip = ConversionResult::archive(vec![1], "report", PdfRenderSummary::default());
        assert_eq!(zip.file_name, "report_all_pages.zip");
        assert_eq!(zip.mime_type, "application/zip");
    }

    #[test]
    fn summary_lists_failed_pages() {
        let summary = PdfRenderSummary {
            total_pages: 3,
            rendered_pages: vec![1, 3],
            failed_pages: vec![PageError::RenderFailed {
                page: 2,
                detail: "bad content stream".into(),
            }],
        };
        assert!(!summary.is_complete());
        assert_eq!(summary.failed_page_numbers(), vec![2]);
    }
}

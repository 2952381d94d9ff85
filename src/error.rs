//! Error types for the fileshift library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the request cannot produce a result
//!   (unsupported extension, malformed input, unreadable PDF). Returned as
//!   `Err(ConvertError)` from [`crate::convert::convert`] and friends.
//!
//! * [`PageError`] — **Non-fatal**: one page of an all-pages PDF render
//!   failed while the others succeeded. Recorded in
//!   [`crate::output::PdfRenderSummary`] so the caller can report partial
//!   success instead of losing the whole archive to one bad page.
//!
//! Every `ConvertError` maps onto the closed [`ErrorKind`] set through
//! [`ConvertError::kind`], which is what a UI shows as the failure category.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Closed set of failure categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    ParseError,
    EncodingError,
    DecodeError,
    PdfReadError,
    PageOutOfRange,
    InvalidConfig,
    Engine,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::EncodingError => "EncodingError",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::PdfReadError => "PdfReadError",
            ErrorKind::PageOutOfRange => "PageOutOfRange",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::Engine => "Engine",
            ErrorKind::Io => "Io",
        };
        f.write_str(name)
    }
}

/// All fatal errors returned by the fileshift library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Classification ────────────────────────────────────────────────────
    /// The filename carries no extension at all.
    #[error("'{filename}' has no file extension\nRe-upload the file with an extension such as .csv or .png.")]
    MissingExtension { filename: String },

    /// The extension is not on the allow-list.
    #[error("Unsupported file format '.{extension}'")]
    UnsupportedFormat { extension: String },

    /// The source is supported but cannot be converted to the requested target.
    #[error("Cannot convert .{from} to .{target}\nSupported targets: {supported}")]
    UnsupportedTarget {
        from: String,
        target: String,
        supported: String,
    },

    // ── Content errors ────────────────────────────────────────────────────
    /// Tabular input could not be parsed, or the table could not be written.
    #[error("Failed to parse {format} data: {detail}")]
    Parse { format: String, detail: String },

    /// Text input is not valid UTF-8.
    #[error("Input is not valid UTF-8 text: {detail}")]
    Encoding { detail: String },

    /// Image bytes could not be decoded.
    #[error("Failed to decode {format} image: {detail}")]
    Decode { format: String, detail: String },

    /// A decoded image could not be written in the target format.
    #[error("Failed to encode {format} image: {detail}")]
    Encode { format: String, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt or unsupported: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password.
    #[error("PDF is encrypted and cannot be opened without a password")]
    EncryptedPdf,

    /// The document opened but has no pages to render.
    #[error("PDF has no pages")]
    EmptyPdf,

    /// Requested page number is outside `1..=total`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium returned an error while rasterising a single requested page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Every page of an all-pages render failed.
    #[error("All {total} pages failed to render\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first use.\n\
If the download failed you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The upload could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converted file could not be written.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// The user-facing failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::MissingExtension { .. }
            | ConvertError::UnsupportedFormat { .. }
            | ConvertError::UnsupportedTarget { .. } => ErrorKind::UnsupportedFormat,
            ConvertError::Parse { .. } => ErrorKind::ParseError,
            ConvertError::Encoding { .. } => ErrorKind::EncodingError,
            ConvertError::Decode { .. } | ConvertError::Encode { .. } => ErrorKind::DecodeError,
            ConvertError::CorruptPdf { .. }
            | ConvertError::EncryptedPdf
            | ConvertError::EmptyPdf
            | ConvertError::RasterisationFailed { .. }
            | ConvertError::AllPagesFailed { .. } => ErrorKind::PdfReadError,
            ConvertError::PageOutOfRange { .. } => ErrorKind::PageOutOfRange,
            ConvertError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            ConvertError::PdfiumBindingFailed(_) => ErrorKind::Engine,
            ConvertError::ReadFailed { .. } | ConvertError::OutputWriteFailed { .. } => {
                ErrorKind::Io
            }
        }
    }

    pub(crate) fn parse(format: impl fmt::Display, detail: impl fmt::Display) -> Self {
        ConvertError::Parse {
            format: format.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// A non-fatal error for a single page of an all-pages render.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// pdfium could not load or rasterise the page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rasterised page could not be encoded to the target format.
    #[error("Page {page}: encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}

impl From<PageError> for ConvertError {
    /// A page failure is fatal when that page was the only one requested.
    fn from(err: PageError) -> Self {
        match err {
            PageError::RenderFailed { page, detail } => {
                ConvertError::RasterisationFailed { page, detail }
            }
            PageError::EncodeFailed { page, detail } => ConvertError::Encode {
                format: format!("page {page}"),
                detail,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_errors_share_a_kind() {
        let missing = ConvertError::MissingExtension {
            filename: "README".into(),
        };
        let unknown = ConvertError::UnsupportedFormat {
            extension: "docx".into(),
        };
        assert_eq!(missing.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(unknown.kind(), ErrorKind::UnsupportedFormat);
        assert!(unknown.to_string().contains(".docx"));
    }

    #[test]
    fn pdf_failures_map_to_pdf_read_error() {
        for e in [
            ConvertError::EncryptedPdf,
            ConvertError::EmptyPdf,
            ConvertError::CorruptPdf {
                detail: "bad xref".into(),
            },
        ] {
            assert_eq!(e.kind(), ErrorKind::PdfReadError, "{e}");
        }
    }

    #[test]
    fn page_out_of_range_display() {
        let e = ConvertError::PageOutOfRange { page: 4, total: 3 };
        assert_eq!(e.kind(), ErrorKind::PageOutOfRange);
        let msg = e.to_string();
        assert!(msg.contains("Page 4"), "got: {msg}");
        assert!(msg.contains("3 pages"), "got: {msg}");
    }

    #[test]
    fn unsupported_target_lists_alternatives() {
        let e = ConvertError::UnsupportedTarget {
            from: "txt".into(),
            target: "png".into(),
            supported: "md".into(),
        };
        assert!(e.to_string().contains("Supported targets: md"));
    }

    #[test]
    fn page_error_reports_its_page() {
        let e = PageError::EncodeFailed {
            page: 7,
            detail: "disk full".into(),
        };
        assert_eq!(e.page(), 7);
        assert!(e.to_string().starts_with("Page 7"));
    }

    #[test]
    fn page_error_promotes_to_fatal_error() {
        let render: ConvertError = PageError::RenderFailed {
            page: 2,
            detail: "bad stream".into(),
        }
        .into();
        assert_eq!(render.kind(), ErrorKind::PdfReadError);

        let encode: ConvertError = PageError::EncodeFailed {
            page: 2,
            detail: "too large".into(),
        }
        .into();
        assert_eq!(encode.kind(), ErrorKind::DecodeError);
        assert!(encode.to_string().contains("page 2"));
    }

    #[test]
    fn error_kind_display_matches_variant_name() {
        assert_eq!(ErrorKind::PageOutOfRange.to_string(), "PageOutOfRange");
        assert_eq!(ErrorKind::DecodeError.to_string(), "DecodeError");
    }
}

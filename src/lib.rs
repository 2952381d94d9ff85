//! # fileshift
//!
//! Convert a file between closely related formats: tabular data, plain
//! text, raster images, and PDF pages to images.
//!
//! ## Supported conversions
//!
//! | Source | Targets |
//! |--------|---------|
//! | CSV, TSV, JSON, XLSX | each other (one uniform in-memory table in between) |
//! | TXT, MD | each other (UTF-8 checked, bytes unchanged) |
//! | PNG, JPG, WEBP, BMP | each other (alpha flattened onto white for JPG/BMP) |
//! | PDF | PNG, JPG, WEBP, BMP (one page, or all pages zipped) |
//!
//! Files are classified by extension only, so unsupported uploads are
//! rejected before any decoder sees their bytes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input     read bytes + file name
//!  ├─ 2. Classify  extension → Domain + Format; target checked against its list
//!  ├─ 3. Convert   tabular / text / images / render (pdfium)
//!  └─ 4. Output    bytes + `<stem>.<ext>` (or `<stem>_all_pages.zip`) + MIME type
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileshift::{convert, read_upload, ConversionConfig, ConversionRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let upload = read_upload("sales.csv".as_ref())?;
//!     let request = ConversionRequest::new(upload, "xlsx")?;
//!     let result = convert(&request, &ConversionConfig::default())?;
//!     std::fs::write(&result.file_name, &result.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! PDF sources take page and DPI choices through [`PdfOptions`]:
//!
//! ```rust,no_run
//! use fileshift::{convert, ConversionConfig, ConversionRequest, PdfOptions, UploadedFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let upload = UploadedFile::new("report.pdf", std::fs::read("report.pdf")?);
//! let request = ConversionRequest::new(upload, "png")?
//!     .with_pdf_options(PdfOptions::builder().all_pages().dpi(150).build()?);
//! let result = convert(&request, &ConversionConfig::default())?;
//! assert_eq!(result.file_name, "report_all_pages.zip");
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileshift` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! fileshift = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! PDF rendering binds the pdfium shared library on first use. It is looked
//! up via `PDFIUM_LIB_PATH`, then the per-user cache, then the system
//! library, and downloaded into the cache as a last resort. See
//! [`fileshift_pdfium`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, PageMode, PdfOptions, PdfOptionsBuilder,
    DEFAULT_DPI, MAX_DPI, MIN_DPI,
};
pub use convert::{convert, convert_to_file, inspect_pdf, Converter, ConverterState};
pub use error::{ConvertError, ErrorKind, PageError};
pub use format::{classify, resolve_target, Domain, Format};
pub use output::{ConversionRequest, ConversionResult, PdfInfo, PdfRenderSummary, UploadedFile};
pub use pipeline::input::read_upload;
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};

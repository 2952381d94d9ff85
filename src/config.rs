//! Configuration types for conversions.
//!
//! Two layers, mirroring where the values come from:
//!
//! * [`PdfOptions`] — per-request PDF choices the user makes next to the
//!   target dropdown (page mode, DPI). Plain data; serialisable.
//! * [`ConversionConfig`] — how this process runs conversions (progress
//!   sink, which pdfium library to bind). Set once per session.
//!
//! Both are built through builders that validate ranges up front so the
//! converters never see an impossible DPI or page number.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lowest accepted rasterisation DPI.
pub const MIN_DPI: u32 = 72;
/// Highest accepted rasterisation DPI.
pub const MAX_DPI: u32 = 300;
/// DPI used when the caller does not choose one.
pub const DEFAULT_DPI: u32 = 200;

/// Which pages of a PDF to rasterise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMode {
    /// A single page (1-indexed); output is one image.
    Single(usize),
    /// Every page in document order; output is a zip archive.
    All,
}

impl Default for PageMode {
    fn default() -> Self {
        PageMode::Single(1)
    }
}

impl fmt::Display for PageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMode::Single(p) => write!(f, "page {p}"),
            PageMode::All => f.write_str("all pages"),
        }
    }
}

/// PDF-specific options of a conversion request.
///
/// # Example
/// ```rust
/// use fileshift::{PageMode, PdfOptions};
///
/// let opts = PdfOptions::builder()
///     .dpi(150)
///     .mode(PageMode::All)
///     .build()
///     .unwrap();
/// assert_eq!(opts.dpi, 150);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfOptions {
    /// Page selection. Default: page 1.
    pub mode: PageMode,

    /// Rasterisation DPI, 72–300. Default: 200.
    ///
    /// PDF geometry is measured in points (1/72 inch), so a page renders at
    /// `points × dpi / 72` pixels along each axis.
    pub dpi: u32,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            mode: PageMode::default(),
            dpi: DEFAULT_DPI,
        }
    }
}

impl PdfOptions {
    pub fn builder() -> PdfOptionsBuilder {
        PdfOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Pixels per PDF point at this DPI.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }

    pub(crate) fn validate(&self) -> Result<(), ConvertError> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        Ok(())
    }
}

/// Builder for [`PdfOptions`].
#[derive(Debug)]
pub struct PdfOptionsBuilder {
    options: PdfOptions,
}

impl PdfOptionsBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options.dpi = dpi;
        self
    }

    pub fn mode(mut self, mode: PageMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Shorthand for `mode(PageMode::Single(page))`.
    pub fn page(self, page: usize) -> Self {
        self.mode(PageMode::Single(page))
    }

    /// Shorthand for `mode(PageMode::All)`.
    pub fn all_pages(self) -> Self {
        self.mode(PageMode::All)
    }

    /// Build the options, validating the DPI range.
    pub fn build(self) -> Result<PdfOptions, ConvertError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

/// Process-level settings shared by every conversion of a session.
#[derive(Clone, Default)]
pub struct ConversionConfig {
    /// Receives per-page events during all-pages PDF rendering.
    pub progress_callback: Option<ProgressCallback>,

    /// Explicit pdfium shared library. If None, the engine locator searches
    /// `PDFIUM_LIB_PATH`, its cache, the system library, then downloads.
    pub pdfium_library: Option<PathBuf>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RenderProgressCallback>"),
            )
            .field("pdfium_library", &self.pdfium_library)
            .finish()
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        if let Some(ref path) = self.config.pdfium_library {
            if !path.is_file() {
                return Err(ConvertError::InvalidConfig(format!(
                    "pdfium library '{}' does not exist",
                    path.display()
                )));
            }
        }
        Ok(self.config)
    }
}

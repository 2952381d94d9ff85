//! PDF rasterisation: render pages to images via pdfium.
//!
//! ## Why bind pdfium once?
//!
//! Binding loads the shared library and initialises pdfium's global state.
//! Doing that per conversion is slow, and dropping a second binding tears
//! down the first one's state, so the binding lives in a process-wide
//! `OnceLock` guarded by an init mutex.
//!
//! The binding remembers the explicit library path it was created from. A
//! later config naming a *different* library is rejected with
//! `InvalidConfig` rather than silently served by the first one; a config
//! with no explicit path uses whatever is bound.
//!
//! ## Sizing
//!
//! PDF geometry is in points (1/72 inch). Each page renders at exactly
//! `points × dpi / 72` pixels per axis, so doubling the DPI doubles both
//! pixel dimensions. Pages are rendered onto opaque white; the output never
//! carries alpha.

use crate::config::{ConversionConfig, PageMode, PdfOptions};
use crate::error::{ConvertError, PageError};
use crate::format::Format;
use crate::output::{ConversionResult, PdfInfo, PdfRenderSummary};
use crate::pipeline::archive::PageArchive;
use crate::pipeline::images::{encode_image, flatten_alpha};
use crate::progress::{NoopProgressCallback, RenderProgressCallback};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info, warn};

struct BoundPdfium {
    pdfium: Pdfium,
    /// Explicit library path the binding was created from, if any.
    library: Option<PathBuf>,
}

static PDFIUM: OnceLock<BoundPdfium> = OnceLock::new();
static PDFIUM_INIT: Mutex<()> = Mutex::new(());

/// Return the process-wide pdfium binding, creating it on first use.
fn pdfium(config: &ConversionConfig) -> Result<&'static Pdfium, ConvertError> {
    let requested = config.pdfium_library.as_deref();
    if let Some(bound) = PDFIUM.get() {
        check_library(bound.library.as_deref(), requested)?;
        return Ok(&bound.pdfium);
    }
    let _guard = PDFIUM_INIT.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(bound) = PDFIUM.get() {
        check_library(bound.library.as_deref(), requested)?;
        return Ok(&bound.pdfium);
    }

    let pdfium = fileshift_pdfium::bind_pdfium(requested, None)
        .map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))?;
    info!("PDFium bound");
    let bound = PDFIUM.get_or_init(|| BoundPdfium {
        pdfium,
        library: requested.map(Path::to_path_buf),
    });
    Ok(&bound.pdfium)
}

/// Reject a request for a library other than the one already bound.
fn check_library(bound: Option<&Path>, requested: Option<&Path>) -> Result<(), ConvertError> {
    match requested {
        Some(path) if bound != Some(path) => Err(ConvertError::InvalidConfig(format!(
            "pdfium is already bound from {}; cannot switch to '{}' within one process",
            bound.map_or_else(|| "the default lookup".to_string(), |p| format!("'{}'", p.display())),
            path.display()
        ))),
        _ => Ok(()),
    }
}

/// Pixel length of `points` at `dpi`, never below one pixel.
pub fn pixel_size(points: f32, dpi: u32) -> i32 {
    ((points * dpi as f32 / 72.0).round() as i32).max(1)
}

fn open<'a>(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<PdfDocument<'a>, ConvertError> {
    pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ConvertError::EncryptedPdf
        } else {
            ConvertError::CorruptPdf { detail: err_str }
        }
    })
}

/// Open a PDF just far enough to count its pages.
pub fn inspect(bytes: &[u8], config: &ConversionConfig) -> Result<PdfInfo, ConvertError> {
    let pdfium = pdfium(config)?;
    let document = open(pdfium, bytes)?;
    Ok(PdfInfo {
        page_count: document.pages().len() as usize,
    })
}

/// Render the pages selected by `options` and encode them as `target`.
///
/// A single page yields one image named `<stem>.<ext>`. All pages yield a
/// zip named `<stem>_all_pages.zip`; pages that fail are skipped and listed
/// in the result's summary, and only a render where every page fails is an
/// error.
pub fn render(
    bytes: &[u8],
    stem: &str,
    target: Format,
    options: &PdfOptions,
    config: &ConversionConfig,
) -> Result<ConversionResult, ConvertError> {
    options.validate()?;
    let pdfium = pdfium(config)?;
    let document = open(pdfium, bytes)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    if total_pages == 0 {
        return Err(ConvertError::EmptyPdf);
    }

    match options.mode {
        PageMode::Single(page) => {
            if page == 0 || page > total_pages {
                return Err(ConvertError::PageOutOfRange {
                    page,
                    total: total_pages,
                });
            }
            let encoded = render_page(&pages, page, target, options.dpi)?;
            Ok(ConversionResult::single(encoded, stem, target))
        }
        PageMode::All => {
            let noop = NoopProgressCallback;
            let progress: &dyn RenderProgressCallback = match config.progress_callback {
                Some(ref cb) => cb.as_ref(),
                None => &noop,
            };
            let (archive, summary) = render_all(&pages, total_pages, target, options.dpi, progress)?;
            Ok(ConversionResult::archive(archive, stem, summary))
        }
    }
}

fn render_all(
    pages: &PdfPages<'_>,
    total_pages: usize,
    target: Format,
    dpi: u32,
    progress: &dyn RenderProgressCallback,
) -> Result<(Vec<u8>, PdfRenderSummary), ConvertError> {
    progress.on_render_start(total_pages);

    let mut archive = PageArchive::new(target);
    let mut summary = PdfRenderSummary {
        total_pages,
        ..Default::default()
    };

    for page in 1..=total_pages {
        progress.on_page_start(page, total_pages);
        match render_page(pages, page, target, dpi) {
            Ok(encoded) => {
                archive.add_page(page, &encoded)?;
                progress.on_page_complete(page, total_pages, encoded.len());
                summary.rendered_pages.push(page);
            }
            Err(e) => {
                warn!("Skipping {}", e);
                progress.on_page_error(page, total_pages, &e.to_string());
                summary.failed_pages.push(e);
            }
        }
    }

    progress.on_render_complete(total_pages, summary.rendered_pages.len());

    if summary.rendered_pages.is_empty() {
        let first_error = summary
            .failed_pages
            .first()
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(ConvertError::AllPagesFailed {
            total: total_pages,
            first_error,
        });
    }

    info!(
        "Archived {}/{} pages",
        summary.rendered_pages.len(),
        total_pages
    );
    Ok((archive.finish()?, summary))
}

/// Rasterise one 1-indexed page and encode it.
fn render_page(
    pages: &PdfPages<'_>,
    page_num: usize,
    target: Format,
    dpi: u32,
) -> Result<Vec<u8>, PageError> {
    let render_failed = |detail: String| PageError::RenderFailed {
        page: page_num,
        detail,
    };

    let index = u16::try_from(page_num - 1)
        .map_err(|_| render_failed(format!("page index {} exceeds pdfium's limit", page_num)))?;
    let page = pages.get(index).map_err(|e| render_failed(format!("{:?}", e)))?;

    let width = pixel_size(page.width().value, dpi);
    let height = pixel_size(page.height().value, dpi);
    let render_config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| render_failed(format!("{:?}", e)))?;
    let image = DynamicImage::ImageRgb8(flatten_alpha(&bitmap.as_image()));
    debug!(
        "Rendered page {} → {}x{} px at {} DPI",
        page_num,
        image.width(),
        image.height(),
        dpi
    );

    encode_image(&image, target).map_err(|e| PageError::EncodeFailed {
        page: page_num,
        detail: e.to_string(),
    })
}

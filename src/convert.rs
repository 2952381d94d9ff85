//! Conversion entry points.
//!
//! [`convert`] is the whole pipeline as a pure function: a validated
//! [`ConversionRequest`] goes in, a downloadable [`ConversionResult`] comes
//! out. [`Converter`] wraps it in the upload form's session: it remembers
//! the last successful result and the last failure, and a failed request
//! never clobbers the previous result.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, ErrorKind};
use crate::format::Domain;
use crate::output::{ConversionRequest, ConversionResult, PdfInfo};
use crate::pipeline::{images, render, tabular, text};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Run one conversion.
///
/// Dispatch is an exhaustive match over the source's domain; the request
/// constructor has already guaranteed the target belongs to it.
///
/// # Errors
/// Any [`ConvertError`]; see [`ConvertError::kind`] for the category.
/// For all-pages PDF renders, individual page failures are *not* errors;
/// they are listed in [`ConversionResult::pdf_summary`].
pub fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionResult, ConvertError> {
    let start = Instant::now();
    let upload = request.upload();
    let (source, target) = (request.source(), request.target());
    info!("Converting {} ({}) → {}", upload.name(), source, target);

    let bytes = upload.bytes();
    let stem = upload.stem();
    let result = match request.domain() {
        Domain::Tabular => {
            ConversionResult::single(tabular::convert(bytes, source, target)?, stem, target)
        }
        Domain::Text => ConversionResult::single(text::convert(bytes, target)?, stem, target),
        Domain::Image => {
            ConversionResult::single(images::convert(bytes, source, target)?, stem, target)
        }
        Domain::Pdf => {
            debug!("PDF options: {}, {} DPI", request.pdf_options().mode, request.pdf_options().dpi);
            render::render(bytes, stem, target, request.pdf_options(), config)?
        }
    };

    info!(
        "Converted to {} ({} bytes) in {}ms",
        result.file_name,
        result.bytes.len(),
        start.elapsed().as_millis()
    );
    Ok(result)
}

/// Count the pages of a PDF without rendering any of them.
pub fn inspect_pdf(bytes: &[u8], config: &ConversionConfig) -> Result<PdfInfo, ConvertError> {
    render::inspect(bytes, config)
}

/// Write a result to `path`.
///
/// Uses atomic write (temp file in the destination directory + rename) so a
/// failed write never leaves a partial file behind. Missing parent
/// directories are created.
pub fn convert_to_file(result: &ConversionResult, path: impl AsRef<Path>) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let write_failed = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_failed)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_failed)?;
    tmp.write_all(&result.bytes).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    debug!("Wrote {} bytes to {}", result.bytes.len(), path.display());
    Ok(())
}

/// Where a [`Converter`] session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterState {
    /// Nothing submitted yet.
    Idle,
    /// A request is being processed.
    Converting,
    /// The last request succeeded; its result is available.
    Done,
    /// The last request failed.
    Failed { kind: ErrorKind, message: String },
}

/// One upload-form session: submit requests one at a time and keep the
/// latest successful result for download.
#[derive(Debug)]
pub struct Converter {
    config: ConversionConfig,
    state: ConverterState,
    result: Option<ConversionResult>,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            state: ConverterState::Idle,
            result: None,
        }
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    /// The most recent successful result, if any. Survives later failures.
    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    /// Convert `request`, replacing the held result only on success.
    pub fn submit(&mut self, request: &ConversionRequest) -> Result<&ConversionResult, ConvertError> {
        self.state = ConverterState::Converting;
        match convert(request, &self.config) {
            Ok(result) => {
                self.state = ConverterState::Done;
                Ok(self.result.insert(result))
            }
            Err(e) => {
                warn!("Conversion of {} failed: {}", request.upload().name(), e);
                self.state = ConverterState::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }
}

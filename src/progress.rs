//! Progress-callback trait for per-page PDF rendering events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! as each page of an all-pages render is rasterised and archived. Only
//! all-pages PDF conversions emit events; every other conversion is a single
//! step with nothing to report in between.
//!
//! # Example
//!
//! ```rust
//! use fileshift::{ConversionConfig, RenderProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl RenderProgressCallback for Counter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}: {bytes} bytes");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the PDF renderer as it works through the pages.
///
/// All methods default to no-ops so implementations only override what they
/// need. Calls arrive in page order on the converting thread.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once after the document is opened.
    fn on_render_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is rasterised.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been encoded; `encoded_bytes` is its size in
    /// the target format.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, encoded_bytes: usize) {
        let _ = (page_num, total_pages, encoded_bytes);
    }

    /// Called when a page is skipped because it failed.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_render_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;

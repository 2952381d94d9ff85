//! Converter stages, one per domain plus the plumbing they share.
//!
//! ## Data Flow
//!
//! ```text
//!                     ┌──▶ tabular ──────────────┐
//! input ──▶ classify ─┼──▶ text ─────────────────┼──▶ ConversionResult
//! (path)   (format)   ├──▶ images ───────────────┤
//!                     └──▶ render ──▶ archive ───┘
//!                          (pdfium)   (zip, all pages)
//! ```
//!
//! 1. [`input`]   — read a local file into an upload (name + bytes)
//! 2. [`tabular`] — CSV / TSV / JSON / XLSX through one in-memory table
//! 3. [`text`]    — TXT ⇄ MD relabel after a UTF-8 check
//! 4. [`images`]  — decode, flatten alpha where needed, re-encode
//! 5. [`render`]  — rasterise PDF pages at the chosen DPI; reuses
//!    [`images::encode_image`] for the output format
//! 6. [`archive`] — pack all-pages renders into a zip in page order
//!
//! Every stage is synchronous and works on byte slices; none of them touch
//! the filesystem except [`input`].

pub mod archive;
pub mod images;
pub mod input;
pub mod render;
pub mod tabular;
pub mod text;

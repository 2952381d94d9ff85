//! CLI binary for fileshift.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `ConversionRequest`, runs it, and writes the result next to the user.

use anyhow::{Context, Result};
use clap::Parser;
use fileshift::{
    classify, convert, convert_to_file, inspect_pdf, read_upload, ConversionConfig,
    ConversionRequest, ConversionResult, Format, PageMode, PdfOptions, ProgressCallback,
    RenderProgressCallback, DEFAULT_DPI, MAX_DPI, MIN_DPI,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for all-pages PDF renders: one bar plus a log line per
/// page.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_render_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, encoded_bytes: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>8} bytes", encoded_bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(Some('\u{2026}')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_render_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages rendered",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages rendered  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Spreadsheet formats
  fileshift sales.csv --to xlsx
  fileshift export.xlsx --to json -o data/export.json

  # Text relabel
  fileshift notes.txt --to md

  # Images (transparency is flattened onto white for jpg/bmp)
  fileshift logo.png --to jpg

  # PDF: one page, or every page into a zip
  fileshift report.pdf --to png --pages 3 --dpi 150
  fileshift report.pdf --to jpg --pages all

  # What can this file become?
  fileshift photo.webp --list-targets

  # Page count only
  fileshift --inspect-only report.pdf

SUPPORTED CONVERSIONS:
  csv  → json, xlsx, tsv        txt → md
  tsv  → csv, json, xlsx        md  → txt
  json → csv, tsv, xlsx         png, jpg, webp, bmp → any other of the four
  xlsx → csv, tsv, json         pdf → png, jpg, webp, bmp

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH             Path to an existing libpdfium — skips auto-download
  FILESHIFT_PDFIUM_CACHE_DIR  Override the default pdfium cache directory
  RUST_LOG                    Override the log filter (e.g. fileshift=debug)

  PDFium (~30 MB) is downloaded automatically the first time a PDF is
  converted and cached in ~/.cache/fileshift/pdfium-7690/.
"#;

/// Convert files between tabular, text, image and PDF-page formats.
#[derive(Parser, Debug)]
#[command(
    name = "fileshift",
    version,
    about = "Convert files between tabular, text, image and PDF-page formats",
    long_about = "Convert a file to a closely related format: CSV/TSV/JSON/XLSX between each \
other, TXT and MD between each other, PNG/JPG/WEBP/BMP between each other, and PDF pages to \
images. The format is taken from the file extension.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to convert.
    input: PathBuf,

    /// Target format extension (e.g. json, xlsx, md, jpg, png).
    #[arg(
        short,
        long,
        env = "FILESHIFT_TO",
        required_unless_present_any = ["list_targets", "inspect_only"]
    )]
    to: Option<String>,

    /// Output file or directory. Default: `<stem>.<ext>` in the current directory.
    #[arg(short, long, env = "FILESHIFT_OUTPUT")]
    output: Option<PathBuf>,

    /// PDF page selection: a 1-indexed page number, or `all` for a zip of every page.
    #[arg(long, env = "FILESHIFT_PAGES", default_value = "1")]
    pages: String,

    /// PDF rendering DPI (72–300).
    #[arg(long, env = "FILESHIFT_DPI", default_value_t = DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(MIN_DPI as i64..=MAX_DPI as i64))]
    dpi: u32,

    /// Explicit pdfium shared library to bind.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the formats this input can be converted to, then exit.
    #[arg(long)]
    list_targets: bool,

    /// Print PDF page count only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary of the result on stdout.
    #[arg(long, env = "FILESHIFT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FILESHIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILESHIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILESHIFT_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = classify(&file_name).context("Cannot convert this file")?;

    // ── List-targets mode ────────────────────────────────────────────────
    if cli.list_targets {
        let targets: Vec<&str> = source.targets().iter().map(|t| t.extension()).collect();
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "source": source.extension(),
                    "targets": targets,
                }))
                .context("Failed to serialise targets")?
            );
        } else {
            println!("{}", targets.join("\n"));
        }
        return Ok(());
    }

    let pdf_mode = parse_pages(&cli.pages)?;

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = source == Format::Pdf
        && pdf_mode == PageMode::All
        && !cli.inspect_only
        && !cli.quiet
        && !cli.no_progress
        && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────────
    // When neither the cache nor the system loader has a library, the first
    // PDF conversion downloads one (~30 MB) from bblanchon/pdfium-binaries
    // into the user cache, with a progress bar.
    if source == Format::Pdf && cli.pdfium_lib.is_none() && fileshift_pdfium::needs_download() {
        ensure_engine(cli.quiet)?;
    }

    let mut builder = ConversionConfig::builder();
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let upload = read_upload(&cli.input).context("Failed to read input")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        if source != Format::Pdf {
            anyhow::bail!("--inspect-only works on PDF files, got .{}", source);
        }
        let info = inspect_pdf(upload.bytes(), &config).context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise PDF info")?
            );
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", info.page_count);
        }
        return Ok(());
    }

    // ── Build request ────────────────────────────────────────────────────
    let target = cli.to.as_deref().unwrap_or_default();
    let pdf = PdfOptions::builder()
        .mode(pdf_mode)
        .dpi(cli.dpi)
        .build()
        .context("Invalid PDF options")?;
    let request = ConversionRequest::new(upload, target)
        .context("Cannot convert this file")?
        .with_pdf_options(pdf);

    // ── Run conversion ───────────────────────────────────────────────────
    let start = Instant::now();
    let result = convert(&request, &config).context("Conversion failed")?;
    let elapsed_ms = start.elapsed().as_millis();

    let output_path = output_path(cli.output.as_deref(), &result);
    convert_to_file(&result, &output_path).context("Failed to write output")?;

    if cli.json {
        let summary = serde_json::json!({
            "input": cli.input.display().to_string(),
            "output": output_path.display().to_string(),
            "file_name": result.file_name,
            "mime_type": result.mime_type,
            "bytes": result.bytes.len(),
            "duration_ms": elapsed_ms,
            "pdf_summary": result.pdf_summary,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        let partial = result
            .pdf_summary
            .as_ref()
            .is_some_and(|s| !s.is_complete());
        eprintln!(
            "{}  {}  {}ms  →  {}",
            if partial { cyan("⚠") } else { green("✔") },
            dim(&format!("{} bytes", result.bytes.len())),
            elapsed_ms,
            bold(&output_path.display().to_string()),
        );
        if let Some(ref summary) = result.pdf_summary {
            if !summary.is_complete() {
                eprintln!(
                    "   skipped pages: {}",
                    red(&summary
                        .failed_page_numbers()
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", "))
                );
            }
        }
    }

    Ok(())
}

/// Download pdfium into the cache, with a byte-progress bar unless quiet.
fn ensure_engine(quiet: bool) -> Result<()> {
    if quiet {
        fileshift_pdfium::ensure_pdfium_library(None).context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    fileshift_pdfium::ensure_pdfium_library(Some(&|downloaded, total| {
        if let Some(t) = total {
            if bar.length().unwrap_or(0) != t {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    }))
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Resolve `-o`: missing → result name in the current directory, an
/// existing directory → result name inside it, anything else → as given.
fn output_path(output: Option<&Path>, result: &ConversionResult) -> PathBuf {
    match output {
        None => PathBuf::from(&result.file_name),
        Some(dir) if dir.is_dir() => dir.join(&result.file_name),
        Some(path) => path.to_path_buf(),
    }
}

/// Parse `--pages` into a `PageMode`.
fn parse_pages(s: &str) -> Result<PageMode> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageMode::All);
    }

    let page: usize = s
        .parse()
        .with_context(|| format!("Invalid page '{s}': expected a page number or 'all'"))?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageMode::Single(page))
}

//! # fileshift-pdfium
//!
//! Finds a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render` and binds it, downloading a prebuilt copy on
//! first use when nothing suitable is installed.
//!
//! ## Resolution order
//!
//! [`bind_pdfium`] tries, in order:
//!
//! 1. an explicit path passed by the caller (e.g. the CLI's `--pdfium-lib`);
//! 2. `PDFIUM_LIB_PATH`, when it points at an existing file;
//! 3. a copy previously extracted into [`pdfium_cache_dir`];
//! 4. the system library (`libpdfium` on the loader path);
//! 5. a fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracted into the cache directory.
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH` — path to an existing pdfium library; skips download.
//! - `FILESHIFT_PDFIUM_CACHE_DIR` — override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress sink for the one-off library download: `(downloaded, total)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors raised while locating or binding the pdfium library.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

struct PlatformArchive {
    /// Asset filename in the GitHub release.
    archive_name: &'static str,
    /// Path of the library inside the archive.
    member: &'static str,
    /// Filename written into the cache directory.
    lib_name: &'static str,
}

fn platform_archive() -> Result<PlatformArchive, PdfiumLocateError> {
    let archive = |archive_name, member, lib_name| PlatformArchive {
        archive_name,
        member,
        lib_name,
    };

    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => Ok(archive(
            "pdfium-mac-arm64.tgz",
            "lib/libpdfium.dylib",
            "libpdfium.dylib",
        )),
        ("macos", "x86_64") => Ok(archive(
            "pdfium-mac-x64.tgz",
            "lib/libpdfium.dylib",
            "libpdfium.dylib",
        )),
        ("linux", "x86_64") => Ok(archive(
            "pdfium-linux-x64.tgz",
            "lib/libpdfium.so",
            "libpdfium.so",
        )),
        ("linux", "aarch64") => Ok(archive(
            "pdfium-linux-arm64.tgz",
            "lib/libpdfium.so",
            "libpdfium.so",
        )),
        ("windows", "x86_64") => Ok(archive("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll")),
        ("windows", "aarch64") => Ok(archive(
            "pdfium-win-arm64.tgz",
            "bin/pdfium.dll",
            "pdfium.dll",
        )),
        (os, arch) => Err(PdfiumLocateError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

/// Per-version cache directory for the downloaded library.
///
/// Defaults to `<platform cache dir>/fileshift/pdfium-{VERSION}`; set
/// `FILESHIFT_PDFIUM_CACHE_DIR` to relocate it.
pub fn pdfium_cache_dir() -> PathBuf {
    let version_dir = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(dir) = std::env::var("FILESHIFT_PDFIUM_CACHE_DIR") {
        return PathBuf::from(dir).join(version_dir);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("fileshift")
        .join(version_dir)
}

static DOWNLOADED: OnceLock<PathBuf> = OnceLock::new();

/// Path of an already-available library (`PDFIUM_LIB_PATH` or the cache),
/// without touching the network.
pub fn cached_pdfium_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        let p = PathBuf::from(p);
        if p.is_file() {
            return Some(p);
        }
        warn!("PDFIUM_LIB_PATH '{}' does not exist; ignoring", p.display());
    }

    let archive = platform_archive().ok()?;
    let p = pdfium_cache_dir().join(archive.lib_name);
    p.is_file().then_some(p)
}

/// Whether the system loader can find a pdfium library.
///
/// Loads and immediately unloads the library without initialising pdfium,
/// so a later [`bind_pdfium`] is unaffected.
pub fn system_pdfium_available() -> bool {
    match Pdfium::bind_to_system_library() {
        Ok(_) => true,
        Err(e) => {
            debug!("No system PDFium library: {e:?}");
            false
        }
    }
}

/// Whether [`bind_pdfium`] with no explicit path would have to download.
pub fn needs_download() -> bool {
    cached_pdfium_path().is_none() && !system_pdfium_available()
}

/// Make sure a library exists in the cache, downloading it if needed.
///
/// The download happens at most once per process.
pub fn ensure_pdfium_library(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumLocateError> {
    if let Some(path) = DOWNLOADED.get() {
        return Ok(path.clone());
    }
    if let Some(path) = cached_pdfium_path() {
        return Ok(path);
    }

    let archive = platform_archive()?;
    let cache_dir = pdfium_cache_dir();
    std::fs::create_dir_all(&cache_dir).map_err(PdfiumLocateError::CacheDir)?;

    let url = format!(
        "{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}",
        archive.archive_name
    );
    info!("Downloading PDFium from {url}");
    let bytes = download(&url, on_progress)?;

    let dest = cache_dir.join(archive.lib_name);
    extract_member(&bytes, archive.member, &dest)?;
    info!("PDFium cached at {}", dest.display());

    let _ = DOWNLOADED.set(dest.clone());
    Ok(dest)
}

/// Bind pdfium following the resolution order described at crate level.
pub fn bind_pdfium(
    explicit: Option<&Path>,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Pdfium, PdfiumLocateError> {
    if let Some(path) = explicit {
        return bind_pdfium_from_path(path);
    }

    if let Some(path) = cached_pdfium_path() {
        return bind_pdfium_from_path(&path);
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound system PDFium library");
            return Ok(Pdfium::new(bindings));
        }
        Err(e) => debug!("No system PDFium library: {e:?}"),
    }

    let path = ensure_pdfium_library(on_progress)?;
    bind_pdfium_from_path(&path)
}

/// Bind the library at `path` without consulting the cache or network.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumLocateError> {
    debug!("Binding PDFium from {}", path.display());
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::Bind {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })
}

fn download(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, PdfiumLocateError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("fileshift-pdfium/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumLocateError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumLocateError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumLocateError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded = 0u64;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumLocateError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Unpack one member of a `.tgz` into `dest`, via a sibling temp name so a
/// half-written library is never left at the final path.
fn extract_member(archive_bytes: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumLocateError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(archive_bytes));
    let entries = archive
        .entries()
        .map_err(|e| PdfiumLocateError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| PdfiumLocateError::Extract(e.to_string()))?;
        let is_member = entry
            .path()
            .map(|p| p.to_string_lossy() == member)
            .map_err(|e| PdfiumLocateError::Extract(e.to_string()))?;
        if !is_member {
            continue;
        }

        let partial = dest.with_extension("partial");
        entry
            .unpack(&partial)
            .map_err(|e| PdfiumLocateError::Extract(format!("Unpack failed: {e}")))?;
        std::fs::rename(&partial, dest).map_err(PdfiumLocateError::CacheDir)?;
        return Ok(());
    }

    Err(PdfiumLocateError::Extract(format!(
        "'{member}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_has_an_archive() {
        let archive = platform_archive().expect("current platform should be supported");
        assert!(archive.archive_name.ends_with(".tgz"));
        assert!(archive.member.ends_with(archive.lib_name));
    }

    #[test]
    fn cache_dir_is_versioned() {
        let dir = pdfium_cache_dir();
        assert!(dir.ends_with(format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn cache_dir_override_via_env() {
        std::env::set_var("FILESHIFT_PDFIUM_CACHE_DIR", "/tmp/fileshift_cache_override");
        let dir = pdfium_cache_dir();
        std::env::remove_var("FILESHIFT_PDFIUM_CACHE_DIR");
        assert!(dir.starts_with("/tmp/fileshift_cache_override"));
    }

    #[test]
    fn existing_library_path_never_needs_download() {
        let exe = std::env::current_exe().unwrap();
        std::env::set_var("PDFIUM_LIB_PATH", &exe);
        let cached = cached_pdfium_path();
        let download = needs_download();
        std::env::remove_var("PDFIUM_LIB_PATH");
        assert_eq!(cached, Some(exe));
        assert!(!download);
    }

    #[test]
    fn extract_reports_missing_member() {
        let mut gz = Vec::new();
        {
            let enc = flate2::write::GzEncoder::new(&mut gz, flate2::Compression::fast());
            let mut builder = tar::Builder::new(enc);
            let data = b"not a library";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder
                .append_data(&mut header, "lib/other.so", &data[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let dir = std::env::temp_dir().join("fileshift_pdfium_extract_test");
        std::fs::create_dir_all(&dir).unwrap();
        let err = extract_member(&gz, "lib/libpdfium.so", &dir.join("libpdfium.so")).unwrap_err();
        assert!(matches!(err, PdfiumLocateError::Extract(_)), "got {err:?}");
    }
}

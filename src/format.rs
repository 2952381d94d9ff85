//! Format classification: filename extension → [`Domain`] + [`Format`].
//!
//! Classification looks only at the lowercased extension, never at content,
//! so an unsupported upload is rejected before any decoder touches its bytes.
//! The allow-list and the per-source target lists are closed enums matched
//! exhaustively; adding a format is a compile error until every table below
//! knows about it.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The category an uploaded file belongs to; selects the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Tabular,
    Text,
    Image,
    Pdf,
}

/// Every concrete format fileshift reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    Tsv,
    Json,
    Xlsx,
    Txt,
    Md,
    Png,
    Jpeg,
    Webp,
    Bmp,
    Pdf,
}

impl Format {
    /// Parse a bare extension (`"CSV"`, `".jpeg"`, `"md"`), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            "txt" => Some(Self::Txt),
            "md" => Some(Self::Md),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            Self::Csv | Self::Tsv | Self::Json | Self::Xlsx => Domain::Tabular,
            Self::Txt | Self::Md => Domain::Text,
            Self::Png | Self::Jpeg | Self::Webp | Self::Bmp => Domain::Image,
            Self::Pdf => Domain::Pdf,
        }
    }

    /// Canonical extension written on output files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Tsv => "text/tab-separated-values",
            Self::Json => "application/json",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Txt => "text/plain",
            Self::Md => "text/markdown",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Pdf => "application/pdf",
        }
    }

    /// Whether encoded output in this format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png | Self::Webp)
    }

    /// Valid conversion targets for a source of this format, in the order a
    /// UI should offer them.
    pub fn targets(self) -> &'static [Format] {
        use Format::*;
        match self {
            Csv => &[Json, Xlsx, Tsv],
            Tsv => &[Csv, Json, Xlsx],
            Json => &[Csv, Tsv, Xlsx],
            Xlsx => &[Csv, Tsv, Json],
            Txt => &[Md],
            Md => &[Txt],
            Png => &[Jpeg, Webp, Bmp],
            Jpeg => &[Png, Webp, Bmp],
            Webp => &[Png, Jpeg, Bmp],
            Bmp => &[Png, Jpeg, Webp],
            Pdf => &[Png, Jpeg, Webp, Bmp],
        }
    }

    /// Whether `target` is in [`Format::targets`] for this source.
    pub fn can_convert_to(self, target: Format) -> bool {
        self.targets().contains(&target)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Classify an uploaded filename by its extension.
///
/// # Errors
/// [`ConvertError::MissingExtension`] when there is no extension,
/// [`ConvertError::UnsupportedFormat`] when it is not on the allow-list.
pub fn classify(filename: &str) -> Result<Format, ConvertError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ConvertError::MissingExtension {
            filename: filename.to_string(),
        })?;

    Format::from_extension(ext).ok_or_else(|| ConvertError::UnsupportedFormat {
        extension: ext.to_ascii_lowercase(),
    })
}

/// Parse a user-chosen target (e.g. from a dropdown or `--to`) and check it
/// against the source's target list.
pub fn resolve_target(source: Format, target: &str) -> Result<Format, ConvertError> {
    let unsupported = || ConvertError::UnsupportedTarget {
        from: source.extension().to_string(),
        target: target.trim().trim_start_matches('.').to_ascii_lowercase(),
        supported: source
            .targets()
            .iter()
            .map(|t| t.extension())
            .collect::<Vec<_>>()
            .join(", "),
    };

    let parsed = Format::from_extension(target).ok_or_else(unsupported)?;
    if source.can_convert_to(parsed) {
        Ok(parsed)
    } else {
        Err(unsupported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn classifies_every_allowed_extension() {
        let cases = [
            ("a.csv", Domain::Tabular),
            ("a.tsv", Domain::Tabular),
            ("a.json", Domain::Tabular),
            ("a.xlsx", Domain::Tabular),
            ("a.txt", Domain::Text),
            ("a.md", Domain::Text),
            ("a.png", Domain::Image),
            ("a.jpg", Domain::Image),
            ("a.jpeg", Domain::Image),
            ("a.webp", Domain::Image),
            ("a.bmp", Domain::Image),
            ("a.pdf", Domain::Pdf),
        ];
        for (name, domain) in cases {
            assert_eq!(classify(name).unwrap().domain(), domain, "{name}");
        }
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(classify("Report.XLSX").unwrap(), Format::Xlsx);
        assert_eq!(classify("photo.JpEg").unwrap(), Format::Jpeg);
    }

    #[test]
    fn docx_is_unsupported() {
        let err = classify("letter.docx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(matches!(err, ConvertError::UnsupportedFormat { ref extension } if extension == "docx"));
    }

    #[test]
    fn missing_extension_is_unsupported() {
        for name in ["Makefile", "archive.", ".hidden"] {
            let err = classify(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFormat, "{name}");
        }
    }

    #[test]
    fn jpeg_target_normalises_to_jpg() {
        let target = resolve_target(Format::Png, "JPEG").unwrap();
        assert_eq!(target, Format::Jpeg);
        assert_eq!(target.extension(), "jpg");
    }

    #[test]
    fn same_format_is_not_a_target() {
        let err = resolve_target(Format::Csv, "csv").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedTarget { .. }));
        assert!(err.to_string().contains("json, xlsx, tsv"));
    }

    #[test]
    fn cross_domain_target_is_rejected() {
        assert!(resolve_target(Format::Txt, "png").is_err());
        assert!(resolve_target(Format::Pdf, "csv").is_err());
        assert!(resolve_target(Format::Png, "pdf").is_err());
    }

    #[test]
    fn targets_never_include_the_source_or_cross_domains() {
        let all = [
            Format::Csv,
            Format::Tsv,
            Format::Json,
            Format::Xlsx,
            Format::Txt,
            Format::Md,
            Format::Png,
            Format::Jpeg,
            Format::Webp,
            Format::Bmp,
            Format::Pdf,
        ];
        for source in all {
            for &target in source.targets() {
                assert_ne!(source, target);
                let expected = if source == Format::Pdf {
                    Domain::Image
                } else {
                    source.domain()
                };
                assert_eq!(target.domain(), expected, "{source} -> {target}");
            }
        }
    }

    #[test]
    fn alpha_support() {
        assert!(Format::Png.supports_alpha());
        assert!(Format::Webp.supports_alpha());
        assert!(!Format::Jpeg.supports_alpha());
        assert!(!Format::Bmp.supports_alpha());
    }
}

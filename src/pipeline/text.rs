//! Text relabelling: TXT ⇄ MD.
//!
//! Markdown is plain UTF-8 text, so there is nothing to transform. The bytes
//! are checked for valid UTF-8 and handed back untouched; only the output
//! file extension changes.

use crate::error::ConvertError;
use crate::format::Format;
use tracing::debug;

/// Validate `bytes` as UTF-8 and return them unchanged for `target`.
pub fn convert(bytes: &[u8], target: Format) -> Result<Vec<u8>, ConvertError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ConvertError::Encoding {
        detail: e.to_string(),
    })?;
    debug!("Relabelled {} bytes of text as .{}", text.len(), target);
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn content_is_byte_identical() {
        let input = "# Notes\n\n- ünïcödé\r\n- trailing spaces   \n".as_bytes();
        assert_eq!(convert(input, Format::Md).unwrap(), input);
        assert_eq!(convert(input, Format::Txt).unwrap(), input);
    }

    #[test]
    fn empty_file_is_fine() {
        assert!(convert(b"", Format::Txt).unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let err = convert(b"caf\xe9 latin-1", Format::Md).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingError);
        assert!(err.to_string().contains("UTF-8"));
    }
}

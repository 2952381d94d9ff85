//! Raster image conversion: PNG / JPG / WEBP / BMP.
//!
//! Decoding trusts the bytes over the extension: magic-byte sniffing runs
//! first and the declared format is only a fallback, so a PNG saved as
//! `photo.jpg` still converts.
//!
//! Targets without an alpha channel (JPG, BMP) get transparent pixels
//! composited onto opaque white. PNG and WEBP keep alpha when the source has
//! it. WEBP output is lossless.

use crate::error::ConvertError;
use crate::format::Format;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Decode `bytes` (declared as `source`) and re-encode them as `target`.
pub fn convert(bytes: &[u8], source: Format, target: Format) -> Result<Vec<u8>, ConvertError> {
    let image = decode(bytes, source)?;
    debug!(
        "Decoded {} image: {}x{} {:?}",
        source,
        image.width(),
        image.height(),
        image.color()
    );
    encode_image(&image, target)
}

/// Decode an image, sniffing the real format before falling back to `declared`.
pub fn decode(bytes: &[u8], declared: Format) -> Result<DynamicImage, ConvertError> {
    if let Ok(reader) = ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        if let Ok(image) = reader.decode() {
            return Ok(image);
        }
    }
    let fallback = image_format(declared)?;
    image::load_from_memory_with_format(bytes, fallback).map_err(|e| ConvertError::Decode {
        format: declared.extension().to_uppercase(),
        detail: e.to_string(),
    })
}

/// Encode `image` as `target`, flattening alpha when the target has none.
///
/// Output is always 8 bits per channel.
pub fn encode_image(image: &DynamicImage, target: Format) -> Result<Vec<u8>, ConvertError> {
    let format = image_format(target)?;
    let prepared = if target.supports_alpha() && image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else if image.color().has_alpha() {
        DynamicImage::ImageRgb8(flatten_alpha(image))
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };

    let mut buf = Vec::new();
    prepared
        .write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| ConvertError::Encode {
            format: target.extension().to_uppercase(),
            detail: e.to_string(),
        })?;
    debug!("Encoded {} → {} bytes", target, buf.len());
    Ok(buf)
}

/// Composite every pixel over opaque white and drop the alpha channel.
///
/// `c' = (c·a + 255·(255 − a)) / 255`; fully opaque pixels are unchanged.
pub fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * a + 255 * (255 - a)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn image_format(format: Format) -> Result<ImageFormat, ConvertError> {
    match format {
        Format::Png => Ok(ImageFormat::Png),
        Format::Jpeg => Ok(ImageFormat::Jpeg),
        Format::Webp => Ok(ImageFormat::WebP),
        Format::Bmp => Ok(ImageFormat::Bmp),
        other => Err(ConvertError::UnsupportedFormat {
            extension: other.extension().to_string(),
        }),
    }
}

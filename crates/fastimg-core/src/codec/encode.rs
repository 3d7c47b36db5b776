//! Raster buffer encoding.
//!
//! Quality is a scalar in `[0, 1]` (the canvas export convention) and is
//! mapped to the JPEG encoder's 1-100 scale; PNG ignores it entirely.
//! JPEG has no alpha channel, so RGBA buffers are flattened to RGB on the
//! way out - callers that care pre-fill the surface with an opaque color
//! before drawing.

use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode an RGBA buffer to bytes under the given MIME type.
///
/// # Arguments
///
/// * `pixels` - RGBA8 pixel buffer
/// * `mime` - Target type: `image/jpeg` (and the sniffed `image/jpg`
///   spelling) or `image/png`. Any other `image/*` type is accepted but
///   encoded as JPEG with a warning, mirroring the advisory that non-JPEG
///   targets produce weaker compression.
/// * `quality` - Quality scalar in `[0, 1]`; ignored by lossless formats.
pub fn encode(pixels: &RgbaImage, mime: &str, quality: f64) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let mut buffer = Cursor::new(Vec::new());
    match mime {
        "image/png" => {
            PngEncoder::new(&mut buffer)
                .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
        other => {
            if other != "image/jpeg" && other != "image/jpg" {
                log::warn!("no encoder for {other}, falling back to image/jpeg");
            }
            // JPEG carries no alpha; flatten to RGB.
            let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
            encoder
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
    }

    Ok(buffer.into_inner())
}

/// Encode an RGBA buffer and wrap it as a base64 data URL.
///
/// This is the export half of the re-encode round trip: the produced string
/// is exactly what a subsequent [`decode`](crate::codec::decode) consumes.
pub fn encode_data_url(
    pixels: &RgbaImage,
    mime: &str,
    quality: f64,
) -> Result<String, EncodeError> {
    let bytes = encode(pixels, mime, quality)?;
    Ok(format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// Map a `[0, 1]` quality scalar to the JPEG encoder's 1-100 scale.
fn jpeg_quality(quality: f64) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x + y) * 8 % 256) as u8;
            image::Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_encode_jpeg_magic_bytes() {
        let bytes = encode(&gradient(16, 16), "image/jpeg", 0.8).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_png_magic_bytes() {
        let bytes = encode(&gradient(16, 16), "image/png", 1.0).unwrap();
        assert_eq!(&bytes[0..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_unknown_type_falls_back_to_jpeg() {
        let bytes = encode(&gradient(16, 16), "image/webp", 0.8).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let empty = RgbaImage::new(0, 0);
        let err = encode(&empty, "image/png", 1.0).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_lower_quality_smaller_output() {
        let img = gradient(64, 64);
        let high = encode(&img, "image/jpeg", 1.0).unwrap();
        let low = encode(&img, "image/jpeg", 0.1).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.5), 50);
        // Zero clamps to the encoder's minimum rather than an invalid 0.
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(2.0), 100);
        assert_eq!(jpeg_quality(-1.0), 1);
    }

    #[test]
    fn test_data_url_shape() {
        let url = encode_data_url(&gradient(4, 4), "image/png", 1.0).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.len() > "data:image/png;base64,".len());
    }
}

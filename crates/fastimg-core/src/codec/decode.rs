//! URI decoding into drawable images.

use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;
use thiserror::Error;

/// Errors that can occur while decoding a URI into an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The URI looks like a data URL but is missing the base64 payload.
    #[error("malformed data URL")]
    MalformedDataUrl,

    /// The base64 payload of a data URL could not be decoded.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The bytes are not a decodable image.
    #[error("invalid or unsupported image data: {0}")]
    InvalidFormat(String),

    /// I/O error while reading a file URI.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded image a draw context can paint from.
///
/// The natural dimensions are the decoder's own metadata; the pipeline
/// additionally tracks a logical size for the handle, which may differ
/// after resizing operations.
#[derive(Debug, Clone)]
pub struct DrawableImage {
    pixels: RgbaImage,
}

impl DrawableImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Width in pixels as reported by the decoder.
    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels as reported by the decoder.
    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    /// The decoded RGBA8 pixel buffer.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Decode a URI string into a drawable image.
///
/// Two URI forms are supported: embedded base64 data URLs
/// (`data:<mime>;base64,<payload>`), decoded entirely in memory, and
/// anything else, which is treated as a filesystem path and read
/// asynchronously. The caller is suspended until the decode completes.
///
/// A malformed or undecodable URI is fatal to the enclosing operation;
/// there is no retry.
pub async fn decode(uri: &str) -> Result<DrawableImage, DecodeError> {
    let bytes = if uri.starts_with("data:") {
        data_url_payload(uri)?
    } else {
        tokio::fs::read(uri).await?
    };

    let image = image::load_from_memory(&bytes)
        .map_err(|e| DecodeError::InvalidFormat(e.to_string()))?;

    Ok(DrawableImage::from_rgba(image.to_rgba8()))
}

/// Extract and decode the base64 payload of a data URL.
fn data_url_payload(uri: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = uri
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or(DecodeError::MalformedDataUrl)?;
    Ok(general_purpose::STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_data_url;

    fn gray_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([128, 128, 128, 255]))
    }

    #[tokio::test]
    async fn test_decode_png_data_url() {
        let url = encode_data_url(&gray_image(20, 10), "image/png", 1.0).unwrap();
        let decoded = decode(&url).await.unwrap();
        assert_eq!(decoded.natural_width(), 20);
        assert_eq!(decoded.natural_height(), 10);
    }

    #[tokio::test]
    async fn test_decode_jpeg_data_url() {
        let url = encode_data_url(&gray_image(8, 8), "image/jpeg", 0.9).unwrap();
        let decoded = decode(&url).await.unwrap();
        assert_eq!(decoded.natural_width(), 8);
        assert_eq!(decoded.natural_height(), 8);
    }

    #[tokio::test]
    async fn test_decode_missing_payload() {
        let err = decode("data:image/png").await.unwrap_err();
        assert!(matches!(err, DecodeError::MalformedDataUrl));
    }

    #[tokio::test]
    async fn test_decode_invalid_base64() {
        let err = decode("data:image/png;base64,!!!not-base64!!!")
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64(_)));
    }

    #[tokio::test]
    async fn test_decode_undecodable_bytes() {
        // Valid base64, but not an image.
        let url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(b"definitely not a png")
        );
        let err = decode(&url).await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let err = decode("/no/such/file.png").await.unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }
}

//! Image source resolution.
//!
//! The pipeline constructor and `mix` accept three reference forms: a plain
//! URI string, an in-memory binary blob with a declared content type, or a
//! drawable-handle object exposing a readable URI. Instead of duck-typing on
//! the reference at every use site, the forms are a closed [`ImageSource`]
//! variant resolved exactly once at the boundary into a URI plus a MIME type.
//!
//! MIME sniffing is best effort: data URLs carry their type between the
//! `data:` prefix and the `;base64` marker, anything else is synthesized
//! from the file extension as `image/<ext>`.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback type when a URI carries no usable extension.
const DEFAULT_MIME: &str = "image/jpeg";

/// Errors from source resolution.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A blob was supplied whose content type does not declare an image.
    #[error("blob content type {0:?} is not an image type")]
    NotAnImage(String),
}

/// An in-memory binary image payload with its declared content type.
///
/// Used both as a pipeline input form and as the output of
/// [`Pipeline::to_blob`](crate::Pipeline::to_blob).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlob {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Declared MIME type, e.g. `image/png`.
    pub content_type: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }
}

/// A drawable-handle reference: an already-placed image object that exposes
/// the URI it was loaded from (the moral equivalent of an `<img>` element's
/// `src`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    /// The URI the handle was loaded from.
    pub uri: String,
}

impl ImageHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// The closed set of image reference forms the pipeline accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// A URI string: a filesystem path or an embedded base64 data URL.
    Uri(String),
    /// A binary blob whose content type declares an image.
    Blob(ImageBlob),
    /// A drawable handle exposing the URI it was loaded from.
    Handle(ImageHandle),
}

impl From<&str> for ImageSource {
    fn from(uri: &str) -> Self {
        ImageSource::Uri(uri.to_string())
    }
}

impl From<String> for ImageSource {
    fn from(uri: String) -> Self {
        ImageSource::Uri(uri)
    }
}

impl From<ImageBlob> for ImageSource {
    fn from(blob: ImageBlob) -> Self {
        ImageSource::Blob(blob)
    }
}

impl From<ImageHandle> for ImageSource {
    fn from(handle: ImageHandle) -> Self {
        ImageSource::Handle(handle)
    }
}

/// A source resolved to a decodable URI and its sniffed MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub uri: String,
    pub mime: String,
}

/// Resolve an image reference into a URI string and a MIME type.
///
/// Handles yield their URI, URI strings pass through, and blobs are
/// converted to a base64 data URL under their declared content type. The
/// blob conversion here is synchronous and complete before any decode is
/// attempted; blobs whose content type does not contain `"image"` are
/// rejected with [`SourceError::NotAnImage`].
pub fn resolve(source: &ImageSource) -> Result<ResolvedSource, SourceError> {
    match source {
        ImageSource::Uri(uri) => Ok(ResolvedSource {
            mime: sniff_mime(uri),
            uri: uri.clone(),
        }),
        ImageSource::Handle(handle) => Ok(ResolvedSource {
            mime: sniff_mime(&handle.uri),
            uri: handle.uri.clone(),
        }),
        ImageSource::Blob(blob) => {
            if !blob.content_type.contains("image") {
                return Err(SourceError::NotAnImage(blob.content_type.clone()));
            }
            let payload = general_purpose::STANDARD.encode(&blob.bytes);
            Ok(ResolvedSource {
                uri: format!("data:{};base64,{}", blob.content_type, payload),
                mime: blob.content_type.clone(),
            })
        }
    }
}

/// Sniff a MIME type from a URI string (best effort).
///
/// Data URLs report the substring between the `data:` scheme prefix and the
/// `;base64` marker. Other URIs report `image/<extension>`; a URI without an
/// extension falls back to `image/jpeg`.
pub fn sniff_mime(uri: &str) -> String {
    if let Some(rest) = uri.strip_prefix("data:") {
        if let Some(end) = rest.find(";base64") {
            return rest[..end].to_string();
        }
    }

    match uri.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => {
            format!("image/{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_MIME.to_string(),
    }
}

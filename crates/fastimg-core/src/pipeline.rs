//! The chainable editing pipeline.
//!
//! A [`Pipeline`] is constructed with an unresolved image reference and
//! starts `Uninitialized`; [`Pipeline::ready`] resolves the source, decodes
//! it, and sizes the surface to the image's native dimensions. Every later
//! operation keeps the pipeline `Ready` - there is no terminal state short
//! of dropping the object.
//!
//! # The re-encode round trip
//!
//! `zip`, `clip`, and `scale` first export the current surface to an
//! encoded data URL and decode it back before redrawing. That keeps the
//! drawable handle being drawn identical to what the last export would
//! have produced - visual state and exportable state never diverge - at
//! the cost of a decode round trip and, for `zip`, deliberate lossy
//! requantization on every call. `rotate` skips the trip to preserve
//! un-reencoded pixel fidelity, and `mix` layers onto the live surface
//! content rather than a fresh copy.
//!
//! # Concurrency
//!
//! Single-threaded, cooperative: each operation suspends at its decode
//! (and, where present, re-encode) boundary and resumes on completion.
//! Callers must await each operation before issuing the next; overlapping
//! calls into one pipeline are a caller contract violation. There is no
//! queuing, cancellation, or retry, and operations are not transactional:
//! a failure leaves the surface in whatever state the failing step
//! produced.

use crate::codec::{self, DrawableImage};
use crate::error::PipelineError;
use crate::geometry::{self, Size};
use crate::source::{self, ImageBlob, ImageSource};
use crate::surface::{RasterSurface, WHITE};

/// Export type used when nothing better is known.
const FALLBACK_MIME: &str = "image/jpeg";

/// State owned by a ready pipeline.
///
/// `current` is the most recently decoded drawable handle; each mutating
/// operation that re-decodes replaces it, and the previous handle is
/// dropped - single-generation state, not a version chain. `current_size`
/// is the logical size the pipeline tracks for the handle, which is not
/// necessarily the decoder's own metadata.
struct PipelineState {
    surface: RasterSurface,
    current: DrawableImage,
    current_size: Size,
    /// MIME type recorded from the resolved input, the default export type.
    mime: String,
}

/// A chainable, stateful image editing pipeline over one raster surface.
pub struct Pipeline {
    input: ImageSource,
    state: Option<PipelineState>,
}

impl Pipeline {
    /// Create a pipeline over an image reference. Nothing is resolved or
    /// decoded until [`ready`](Self::ready).
    pub fn new(input: impl Into<ImageSource>) -> Self {
        Self {
            input: input.into(),
            state: None,
        }
    }

    /// Resolve the input reference, decode it, and initialize the surface
    /// to the image's native size. Must complete before any other call.
    ///
    /// Calling `ready` a second time re-resolves the *original* input and
    /// re-initializes the surface, discarding all prior edits. That is
    /// documented behavior, not a bug fix target.
    pub async fn ready(&mut self) -> Result<(), PipelineError> {
        let resolved = source::resolve(&self.input)?;
        let image = codec::decode(&resolved.uri).await?;
        log::debug!(
            "ready: {}x{} ({})",
            image.natural_width(),
            image.natural_height(),
            resolved.mime
        );

        let surface = RasterSurface::from_image(&image);
        let size = Size::new(
            image.natural_width() as f64,
            image.natural_height() as f64,
        );
        self.state = Some(PipelineState {
            surface,
            current: image,
            current_size: size,
            mime: resolved.mime,
        });
        Ok(())
    }

    /// Compress and optionally resize.
    ///
    /// The surface is exported at `quality` under `mime` (this is where
    /// lossy requantization happens), decoded back, and drawn scaled to
    /// fill the target size resolved against the current surface
    /// dimensions. A missing width or height is derived aspect-preserving;
    /// both missing keeps the surface size.
    ///
    /// Non-JPEG types are accepted but produce weaker compression; that is
    /// advisory, not an error.
    pub async fn zip(
        &mut self,
        quality: f64,
        width: Option<f64>,
        height: Option<f64>,
        mime: Option<&str>,
    ) -> Result<(), PipelineError> {
        let state = self.state.as_mut().ok_or(PipelineError::NotReady)?;
        let mime = mime.unwrap_or(FALLBACK_MIME);
        if mime != FALLBACK_MIME {
            log::warn!("zip under {mime} compresses worse than image/jpeg");
        }

        let target = geometry::resolve_aspect_size(
            width,
            height,
            state.surface.width() as f64,
            state.surface.height() as f64,
        );
        log::debug!("zip: quality {quality} -> {}x{}", target.width, target.height);

        let url = codec::encode_data_url(state.surface.pixels(), mime, quality)?;
        let image = codec::decode(&url).await?;

        state
            .surface
            .resize_and_clear(target.width.round() as u32, target.height.round() as u32, None);
        state
            .surface
            .draw_image(&image, 0.0, 0.0, target.width, target.height);

        state.current = image;
        state.current_size = target;
        Ok(())
    }

    /// Rotate clockwise by `degrees` around the surface center.
    ///
    /// Intentionally asymmetric with `clip`/`zip`/`scale`: no re-encode
    /// happens - rotation composes on the decoded handle from the last
    /// operation to preserve its pixel fidelity. The canvas grows to the
    /// rotated bounding box (an exact swap for quarter turns, the diagonal
    /// square otherwise) with an opaque fill, and the source is drawn
    /// centered under the rotated transform. `0` degrees is a no-op draw.
    pub async fn rotate(&mut self, degrees: f64) -> Result<(), PipelineError> {
        let state = self.state.as_mut().ok_or(PipelineError::NotReady)?;
        let Size { width, height } = state.current_size;
        let (bound_w, bound_h) =
            geometry::rotated_bounds(width.round() as u32, height.round() as u32, degrees);
        log::debug!("rotate: {degrees} deg -> {bound_w}x{bound_h}");

        let surface = &mut state.surface;
        surface.resize_and_clear(bound_w, bound_h, Some(WHITE));
        surface.save();
        surface.translate(bound_w as f64 / 2.0, bound_h as f64 / 2.0);
        surface.rotate_deg(degrees);
        surface.draw_image(&state.current, -width / 2.0, -height / 2.0, width, height);
        surface.restore();

        state.current_size = Size::new(bound_w as f64, bound_h as f64);
        Ok(())
    }

    /// Crop to a `width` x `height` window at `(x, y)` with rounded
    /// corners of `radius`.
    ///
    /// Re-encodes the surface, decodes it back, resizes to the target with
    /// an opaque fill, applies the rounded-rect clip, and draws the
    /// decoded image at its native size shifted by `(-x, -y)`. Target
    /// geometry is mandatory here (it also defines the clip path);
    /// `width == height` with `radius == width / 2` produces a circular
    /// crop, and zero radius an ordinary rectangle.
    pub async fn clip(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
    ) -> Result<(), PipelineError> {
        let state = self.state.as_mut().ok_or(PipelineError::NotReady)?;
        log::debug!("clip: {width}x{height} at ({x}, {y}) radius {radius}");

        let url = codec::encode_data_url(state.surface.pixels(), &state.mime, 1.0)?;
        let image = codec::decode(&url).await?;

        let surface = &mut state.surface;
        surface.resize_and_clear(width.round() as u32, height.round() as u32, Some(WHITE));
        surface.set_clip(geometry::rounded_rect_path(width, height, radius));
        surface.save();
        surface.translate(-x, -y);
        surface.draw_image(
            &image,
            0.0,
            0.0,
            image.natural_width() as f64,
            image.natural_height() as f64,
        );
        surface.restore();

        state.current = image;
        state.current_size = Size::new(width, height);
        Ok(())
    }

    /// Scale the surface by `x` horizontally and `y` vertically.
    ///
    /// `y` defaults to `x` when omitted; non-uniform scaling is supported.
    /// Re-encodes, decodes back, resizes to `(w*x, h*y)` with an opaque
    /// fill, and draws the decoded image stretched to the new surface size.
    pub async fn scale(&mut self, x: f64, y: Option<f64>) -> Result<(), PipelineError> {
        let state = self.state.as_mut().ok_or(PipelineError::NotReady)?;
        let y = y.unwrap_or(x);
        let target = Size::new(
            state.surface.width() as f64 * x,
            state.surface.height() as f64 * y,
        );
        log::debug!("scale: ({x}, {y}) -> {}x{}", target.width, target.height);

        let url = codec::encode_data_url(state.surface.pixels(), &state.mime, 1.0)?;
        let image = codec::decode(&url).await?;

        let surface = &mut state.surface;
        surface.resize_and_clear(
            target.width.round() as u32,
            target.height.round() as u32,
            Some(WHITE),
        );
        surface.draw_image(&image, 0.0, 0.0, target.width, target.height);

        state.current = image;
        state.current_size = target;
        Ok(())
    }

    /// Composite an external image onto the surface at `(x, y)`.
    ///
    /// The overlay reference is decoded directly - the surface is *not*
    /// re-encoded first, because this operation layers onto the live
    /// surface content in place without clearing it. An omitted width or
    /// height is derived aspect-preserving from the overlay image's own
    /// native size, not the surface's. Pixels outside the overlay rect are
    /// untouched.
    pub async fn mix(
        &mut self,
        overlay: impl Into<ImageSource>,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), PipelineError> {
        let overlay = overlay.into();
        let state = self.state.as_mut().ok_or(PipelineError::NotReady)?;

        let resolved = source::resolve(&overlay)?;
        let image = codec::decode(&resolved.uri).await?;
        let target = geometry::resolve_aspect_size(
            width,
            height,
            image.natural_width() as f64,
            image.natural_height() as f64,
        );
        log::debug!(
            "mix: {}x{} overlay at ({x}, {y})",
            target.width,
            target.height
        );

        state
            .surface
            .draw_image(&image, x, y, target.width, target.height);
        Ok(())
    }

    /// Export the surface as a base64 data URL without mutating it.
    ///
    /// `mime` defaults to the type recorded from the input at `ready()`.
    pub async fn to_data_url(
        &self,
        mime: Option<&str>,
        quality: f64,
    ) -> Result<String, PipelineError> {
        let state = self.state.as_ref().ok_or(PipelineError::NotReady)?;
        let mime = mime.unwrap_or(&state.mime);
        Ok(codec::encode_data_url(state.surface.pixels(), mime, quality)?)
    }

    /// Export the surface as encoded bytes plus content type, without
    /// mutating it.
    pub async fn to_blob(
        &self,
        mime: Option<&str>,
        quality: f64,
    ) -> Result<ImageBlob, PipelineError> {
        let state = self.state.as_ref().ok_or(PipelineError::NotReady)?;
        let mime = mime.unwrap_or(&state.mime);
        let bytes = codec::encode(state.surface.pixels(), mime, quality)?;
        Ok(ImageBlob::new(bytes, mime))
    }

    /// Current surface dimensions, once ready.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.state
            .as_ref()
            .map(|s| (s.surface.width(), s.surface.height()))
    }
}

//! fastimg core - a client-side raster image editing pipeline.
//!
//! One [`Pipeline`] owns one mutable drawing surface and exposes a
//! chainable sequence of asynchronous operations over it: initialize
//! (`ready`), quality/size compress (`zip`), rotate, crop with rounded
//! corners (`clip`), non-uniform scale, composite-overlay (`mix`), and
//! export (`to_data_url`/`to_blob`).
//!
//! # Example
//!
//! ```ignore
//! use fastimg_core::Pipeline;
//!
//! let mut img = Pipeline::new("photo.jpg");
//! img.ready().await?;
//! img.zip(0.2, Some(300.0), None, None).await?;
//! img.clip(20.0, 20.0, 150.0, 150.0, 15.0).await?;
//! let url = img.to_data_url(None, 1.0).await?;
//! ```

pub mod codec;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod source;
pub mod surface;

pub use codec::{DecodeError, DrawableImage, EncodeError};
pub use error::PipelineError;
pub use geometry::{resolve_aspect_size, rotated_bounds, rounded_rect_path, Size};
pub use pipeline::Pipeline;
pub use source::{ImageBlob, ImageHandle, ImageSource, SourceError};
pub use surface::RasterSurface;

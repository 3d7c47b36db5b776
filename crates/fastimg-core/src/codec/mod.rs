//! Encode/decode primitives for the pipeline.
//!
//! This module provides functionality for:
//! - Decoding a URI string (data URL or filesystem path) into a drawable
//!   image with known pixel dimensions
//! - Encoding a raster buffer to JPEG or PNG bytes at a given quality
//! - Wrapping encoded bytes as a base64 data URL
//!
//! # Architecture
//!
//! Decoding is the asynchronous suspension point of every pipeline
//! operation: file reads go through `tokio::fs`, data URLs are decoded in
//! memory. There is no retry anywhere; a failure rejects the enclosing
//! operation.

mod decode;
mod encode;

pub use decode::{decode, DecodeError, DrawableImage};
pub use encode::{encode, encode_data_url, EncodeError};

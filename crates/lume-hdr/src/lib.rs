/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A Radiance HDR (RGBE) decoder
//!
//! Decodes `.hdr` byte buffers into pixels plus header metadata for use
//! further down an asset loading pipeline.
//!
//! # Features
//! - Handles both run length encoded and flat pixel layouts
//! - Byte, `f32` and half float (`f16`) output representations
//! - No unsafe
//! - Fuzz tested decoder
//!
//! # Usage notes
//! The caller picks the output representation per decode call, the raw
//! RGBE quads are available through [`SampleType::U8`] passthrough or
//! [`HdrDecoder::decode_raw`], the float representations have the shared
//! exponent already applied.
//!
//! ```
//! use lume_core::sample::SampleType;
//! use lume_hdr::HdrDecoder;
//!
//! let file = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 1\n\x80\x80\x80\x81";
//! let image = HdrDecoder::new(file).decode(SampleType::F32).unwrap();
//! assert_eq!((image.width, image.height), (1, 1));
//! ```
//!
//! [`SampleType::U8`]: lume_core::sample::SampleType::U8

#![forbid(unsafe_code)]
pub extern crate lume_core;

pub use decoder::{HdrDecoder, HdrImage};
pub use errors::HdrDecodeErrors;
pub use header::RadianceHeader;

mod decoder;
mod errors;
mod header;

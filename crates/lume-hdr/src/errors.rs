/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use core::fmt::{Debug, Display, Formatter};

use lume_core::sample::SampleType;

/// HDR decoding errors
///
/// Every failure carries the kind of violation plus a short message,
/// decoding is all or nothing so any of these aborts the whole decode.
pub enum HdrDecodeErrors {
    /// The buffer ended where more bytes were expected
    Read(&'static str),
    /// The byte stream violates the RGBE grammar
    Format(&'static str),
    /// Too large dimensions for a given dimension
    TooLargeDimensions(&'static str, usize, usize),
    /// The converter does not implement the requested sample representation
    UnsupportedOutput(SampleType)
}

impl Debug for HdrDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            HdrDecodeErrors::Read(err) => {
                writeln!(f, "Read error: {err}")
            }
            HdrDecodeErrors::Format(err) => {
                writeln!(f, "Format error: {err}")
            }
            HdrDecodeErrors::TooLargeDimensions(dimension, expected, found) => {
                writeln!(
                    f,
                    "Too large dimensions for {dimension}, {found} exceeds {expected}"
                )
            }
            HdrDecodeErrors::UnsupportedOutput(sample) => {
                writeln!(
                    f,
                    "Cannot output {sample:?} samples, implemented outputs are U8, F32 and F16"
                )
            }
        }
    }
}

impl Display for HdrDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for HdrDecodeErrors {}

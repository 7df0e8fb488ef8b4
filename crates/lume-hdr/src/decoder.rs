/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use half::f16;
use lume_core::bytestream::ByteReader;
use lume_core::colorspace::ColorSpace;
use lume_core::log::trace;
use lume_core::options::DecoderOptions;
use lume_core::result::PixelData;
use lume_core::sample::SampleType;

use crate::errors::HdrDecodeErrors;
use crate::header::{read_header, RadianceHeader};

/// Scanline widths outside this range are never run length encoded
const RLE_MIN_WIDTH: usize = 8;
const RLE_MAX_WIDTH: usize = 0x7fff;

/// A decoded Radiance image
///
/// Returned by value from [`HdrDecoder::decode`], the decoder keeps no
/// reference to it.
#[derive(Clone, Debug, PartialEq)]
pub struct HdrImage {
    pub width:  usize,
    pub height: usize,
    /// Decoded samples, the variant agrees with `sample_type`
    pub pixels: PixelData,
    /// The header text as it appeared in the file
    pub header_text: String,
    pub gamma:    f32,
    pub exposure: f32,
    /// `RGBA` for raw RGBE quads, where the fourth channel is the shared
    /// exponent rather than alpha, `RGB` for the float representations
    pub pixel_format: ColorSpace,
    pub sample_type:  SampleType
}

/// A Radiance HDR decoder
///
/// Decoding is a single forward pass over the buffer, the header is
/// parsed first, then the run length encoded (or flat) pixel stream,
/// then the RGBE quads are converted to the representation the caller
/// asked for.
pub struct HdrDecoder<'a> {
    stream:  ByteReader<'a>,
    options: DecoderOptions,
    header:  Option<RadianceHeader>
}

impl<'a> HdrDecoder<'a> {
    /// Create a new HDR decoder
    ///
    /// # Arguments
    ///
    /// * `data`: Raw HDR file contents
    pub fn new(data: &'a [u8]) -> HdrDecoder<'a> {
        Self::new_with_options(data, DecoderOptions::default())
    }

    /// Create a new HDR decoder with the specified options
    ///
    /// # Arguments
    ///
    /// * `data`: Raw HDR file contents already in memory
    /// * `options`: Decoder options that influence how decoding occurs
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> HdrDecoder<'a> {
        HdrDecoder {
            stream: ByteReader::new(data),
            options,
            header: None
        }
    }

    /// Decode the textual header for the HDR image
    ///
    /// The struct is modified in place and data can be extracted from
    /// the appropriate getters. Decoding the header twice is a no-op.
    pub fn decode_headers(&mut self) -> Result<(), HdrDecodeErrors> {
        if self.header.is_some() {
            return Ok(());
        }
        let header = read_header(&mut self.stream)?;

        if header.height > self.options.max_height() {
            return Err(HdrDecodeErrors::TooLargeDimensions(
                "height",
                self.options.max_height(),
                header.height
            ));
        }
        if header.width > self.options.max_width() {
            return Err(HdrDecodeErrors::TooLargeDimensions(
                "width",
                self.options.max_width(),
                header.width
            ));
        }

        trace!("Program type: {}", header.program_type);
        trace!("Width: {}", header.width);
        trace!("Height: {}", header.height);
        trace!("Gamma: {}", header.gamma);
        trace!("Exposure: {}", header.exposure);

        self.header = Some(header);

        Ok(())
    }

    /// The parsed header, or `None` if the headers haven't been decoded
    pub fn header(&self) -> Option<&RadianceHeader> {
        self.header.as_ref()
    }

    /// Get image dimensions as a tuple of width and height
    /// or `None` if the headers haven't been decoded
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.header.as_ref().map(|h| (h.width, h.height))
    }

    /// Gamma from the header, or `None` if the headers haven't been decoded
    pub fn gamma(&self) -> Option<f32> {
        self.header.as_ref().map(|h| h.gamma)
    }

    /// Exposure from the header, or `None` if the headers haven't been decoded
    pub fn exposure(&self) -> Option<f32> {
        self.header.as_ref().map(|h| h.exposure)
    }

    /// Decode the pixel stream into raw RGBE quads
    ///
    /// The returned buffer holds `4 * width * height` bytes, one
    /// `R, G, B, exponent` quad per pixel in row major order.
    pub fn decode_raw(&mut self) -> Result<Vec<u8>, HdrDecodeErrors> {
        self.decode_headers()?;

        let (width, height) = self.dimensions().unwrap();

        self.read_pixels_rle(width, height)
    }

    /// Decode the image, converting pixels into the requested sample
    /// representation
    ///
    /// # Arguments
    ///
    /// * `sample_type`: Output representation. [`SampleType::U8`] passes
    ///   the raw RGBE quads through unchanged (4 components per pixel),
    ///   [`SampleType::F32`] and [`SampleType::F16`] apply the shared
    ///   exponent and return linear RGB triples. Anything else is an
    ///   [`UnsupportedOutput`](HdrDecodeErrors::UnsupportedOutput) error.
    pub fn decode(&mut self, sample_type: SampleType) -> Result<HdrImage, HdrDecodeErrors> {
        self.decode_headers()?;

        let rgbe = self.decode_raw()?;

        let (pixels, pixel_format) = match sample_type {
            SampleType::U8 => (PixelData::U8(rgbe), ColorSpace::RGBA),
            SampleType::F32 => (PixelData::F32(convert_rgbe_f32(&rgbe)), ColorSpace::RGB),
            SampleType::F16 => (PixelData::U16(convert_rgbe_f16(&rgbe)), ColorSpace::RGB),
            other => return Err(HdrDecodeErrors::UnsupportedOutput(other))
        };

        let header = self.header.as_ref().unwrap();

        Ok(HdrImage {
            width: header.width,
            height: header.height,
            pixels,
            header_text: header.raw_text.clone(),
            gamma: header.gamma,
            exposure: header.exposure,
            pixel_format,
            sample_type
        })
    }

    /// Read the pixel stream, undoing the run length encoding when the
    /// stream carries it
    ///
    /// Non eligible streams are flat RGBE quads already, those are
    /// returned verbatim.
    fn read_pixels_rle(&mut self, width: usize, height: usize) -> Result<Vec<u8>, HdrDecodeErrors> {
        if !(RLE_MIN_WIDTH..=RLE_MAX_WIDTH).contains(&width) {
            return Ok(self.stream.remaining().to_vec());
        }
        let probe: [u8; 4] = self
            .stream
            .peek_fixed_bytes()
            .map_err(|_| HdrDecodeErrors::Read("truncated scanline marker"))?;

        if probe[0] != 2 || probe[1] != 2 || probe[2] & 0x80 != 0 {
            // not run length encoded
            return Ok(self.stream.remaining().to_vec());
        }
        if usize::from(u16::from_be_bytes([probe[2], probe[3]])) != width {
            return Err(HdrDecodeErrors::Format("wrong scanline width"));
        }

        let mut data = vec![0_u8; 4 * width * height];
        // one scanline as four planes of `width` bytes,
        // first red, then green, then blue, then exponent
        let mut scanline = vec![0_u8; 4 * width];

        let mut offset = 0;
        let mut scanlines_left = height;

        while scanlines_left > 0 && !self.stream.eof() {
            let marker: [u8; 4] = self
                .stream
                .get_fixed_bytes_or_err()
                .map_err(|_| HdrDecodeErrors::Read("truncated scanline marker"))?;

            if marker[0] != 2
                || marker[1] != 2
                || usize::from(u16::from_be_bytes([marker[2], marker[3]])) != width
            {
                return Err(HdrDecodeErrors::Format("bad rgbe scanline format"));
            }

            self.read_rle_planes(&mut scanline)?;

            // deinterleave the planes back into per pixel quads
            for (i, quad) in data[offset..offset + 4 * width]
                .chunks_exact_mut(4)
                .enumerate()
            {
                quad[0] = scanline[i];
                quad[1] = scanline[i + width];
                quad[2] = scanline[i + 2 * width];
                quad[3] = scanline[i + 3 * width];
            }
            offset += 4 * width;
            scanlines_left -= 1;
        }
        Ok(data)
    }

    /// Fill one scanline buffer of run encoded channel data
    fn read_rle_planes(&mut self, scanline: &mut [u8]) -> Result<(), HdrDecodeErrors> {
        let ptr_end = scanline.len();
        let mut ptr = 0;

        while ptr < ptr_end && !self.stream.eof() {
            let mut count = usize::from(self.stream.get_u8());
            let encoded_run = count > 128;

            if encoded_run {
                count -= 128;
            }
            if count == 0 || ptr + count > ptr_end {
                return Err(HdrDecodeErrors::Format("bad scanline data"));
            }

            if encoded_run {
                // a run of the same value
                let value = self
                    .stream
                    .get_u8_err()
                    .map_err(|_| HdrDecodeErrors::Read("truncated run data"))?;

                scanline[ptr..ptr + count].fill(value);
            } else {
                // a literal run
                self.stream
                    .read_exact_bytes(&mut scanline[ptr..ptr + count])
                    .map_err(|_| HdrDecodeErrors::Read("truncated run data"))?;
            }
            ptr += count;
        }
        Ok(())
    }
}

/// Expand RGBE quads into linear RGB floats
///
/// Each channel is `mantissa * 2^(exponent - 128) / 255`. A zero
/// exponent byte is not special cased, it produces a subnormal value
/// rather than exact black.
fn convert_rgbe_f32(rgbe: &[u8]) -> Vec<f32> {
    let mut out = Vec::with_capacity((rgbe.len() / 4) * 3);

    for quad in rgbe.chunks_exact(4) {
        let scale = 2.0_f32.powi(i32::from(quad[3]) - 128) / 255.0;

        out.push(f32::from(quad[0]) * scale);
        out.push(f32::from(quad[1]) * scale);
        out.push(f32::from(quad[2]) * scale);
    }
    out
}

/// Expand RGBE quads into linear RGB half floats, stored as raw bits
fn convert_rgbe_f16(rgbe: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity((rgbe.len() / 4) * 3);

    for quad in rgbe.chunks_exact(4) {
        let scale = 2.0_f32.powi(i32::from(quad[3]) - 128) / 255.0;

        out.push(f16::from_f32(f32::from(quad[0]) * scale).to_bits());
        out.push(f16::from_f32(f32::from(quad[1]) * scale).to_bits());
        out.push(f16::from_f32(f32::from(quad[2]) * scale).to_bits());
    }
    out
}

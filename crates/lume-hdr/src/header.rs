/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Radiance header parsing
//!
//! The textual header of a Radiance file is a `#?<program>` magic line
//! followed by free form lines until both a `FORMAT=` line and a
//! `-Y <h> +X <w>` resolution line have been seen. Header bytes are
//! single byte characters, not UTF-8.

use lume_core::bytestream::ByteReader;

use crate::errors::HdrDecodeErrors;

/// Longest line the header scanner will look at before deciding
/// there is no line to read.
pub(crate) const MAX_HEADER_LINE: usize = 1024;

pub(crate) const VALID_PROGRAM_TYPE: u8 = 1;
pub(crate) const VALID_FORMAT: u8 = 2;
pub(crate) const VALID_DIMENSIONS: u8 = 4;

/// Parsed contents of a Radiance file header
///
/// Built line by line while scanning, immutable once handed out.
/// `width` and `height` are only meaningful because parsing fails before
/// returning a header whose resolution line was never seen.
#[derive(Clone, Debug)]
pub struct RadianceHeader {
    pub(crate) valid: u8,
    /// The header text exactly as consumed, newlines restored,
    /// including the trailing blank line
    pub raw_text:     String,
    /// Concatenated comment lines
    pub comments:     String,
    /// Program token from the `#?` magic line
    pub program_type: String,
    /// `FORMAT=` token, informational
    pub format:       String,
    pub gamma:        f32,
    pub exposure:     f32,
    pub width:        usize,
    pub height:       usize
}

impl Default for RadianceHeader {
    fn default() -> Self {
        RadianceHeader {
            valid:        0,
            raw_text:     String::new(),
            comments:     String::new(),
            program_type: String::new(),
            format:       String::new(),
            gamma:        1.0,
            exposure:     1.0,
            width:        0,
            height:       0
        }
    }
}

impl RadianceHeader {
    pub const fn has_program_type(&self) -> bool {
        self.valid & VALID_PROGRAM_TYPE != 0
    }

    pub const fn has_format(&self) -> bool {
        self.valid & VALID_FORMAT != 0
    }

    pub const fn has_dimensions(&self) -> bool {
        self.valid & VALID_DIMENSIONS != 0
    }
}

/// Parse the header, leaving the cursor at the first pixel data byte
///
/// Scanning stops as soon as both the format and the resolution are
/// known, later header lines are left unread for the pixel decoder to
/// reject.
pub(crate) fn read_header(stream: &mut ByteReader) -> Result<RadianceHeader, HdrDecodeErrors> {
    let mut header = RadianceHeader::default();

    if stream.eof() {
        return Err(HdrDecodeErrors::Read("no header found"));
    }
    let Some(line) = stream.read_line(MAX_HEADER_LINE, true) else {
        return Err(HdrDecodeErrors::Read("no header found"));
    };
    let line = single_byte_chars(line);

    let Some(token) = magic_token(&line) else {
        return Err(HdrDecodeErrors::Format("bad initial token"));
    };
    header.program_type = token.to_string();
    header.valid |= VALID_PROGRAM_TYPE;
    header.raw_text.push_str(&line);
    header.raw_text.push('\n');

    while let Some(line) = stream.read_line(MAX_HEADER_LINE, true) {
        let line = single_byte_chars(line);

        header.raw_text.push_str(&line);
        header.raw_text.push('\n');

        if line.starts_with('#') {
            header.comments.push_str(&line);
            header.comments.push('\n');
            continue;
        }
        // the matchers are not mutually exclusive, every one of them
        // gets a look at the line
        if let Some(gamma) = key_value(&line, "GAMMA") {
            header.gamma = gamma;
        }
        if let Some(exposure) = key_value(&line, "EXPOSURE") {
            header.exposure = exposure;
        }
        if let Some(format) = format_token(&line) {
            header.format = format.to_string();
            header.valid |= VALID_FORMAT;
        }
        if let Some((height, width)) = resolution(&line) {
            header.height = height;
            header.width = width;
            header.valid |= VALID_DIMENSIONS;
        }
        if header.has_format() && header.has_dimensions() {
            break;
        }
    }

    if !header.has_format() {
        return Err(HdrDecodeErrors::Format("missing format specifier"));
    }
    if !header.has_dimensions() {
        return Err(HdrDecodeErrors::Format("missing image size specifier"));
    }
    Ok(header)
}

/// Interpret raw line bytes as single byte characters
fn single_byte_chars(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

/// Match the `#?<token>` magic line, returning the program type token
fn magic_token(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#?")?;
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());

    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

/// Match a `<KEY> = <float>` line, tolerating whitespace around `=`
fn key_value(line: &str, key: &str) -> Option<f32> {
    let (lhs, rhs) = line.split_once('=')?;

    if lhs.trim() != key {
        return None;
    }
    rhs.trim().parse::<f32>().ok()
}

/// Match a `FORMAT=<token>` line
fn format_token(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("FORMAT=")?;
    let token = rest.trim();

    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Match the `-Y <height> +X <width>` resolution line
fn resolution(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();

    if tokens.next()? != "-Y" {
        return None;
    }
    let height = tokens.next()?.parse::<usize>().ok()?;

    if tokens.next()? != "+X" {
        return None;
    }
    let width = tokens.next()?.parse::<usize>().ok()?;

    if tokens.next().is_some() {
        return None;
    }
    Some((height, width))
}

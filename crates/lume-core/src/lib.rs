/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core routines shared by the lume decoders
//!
//! This crate provides the small set of building blocks the
//! decoders in the `lume` family have in common
//!
//! It currently contains
//!
//! - A bytestream reader with cursor and line scanning support
//! - Colorspace and sample type tags attached to decoded images
//! - Shared decoder options
//! - A simple enum type to hold pixel data across sample representations
//!
//! This library is `#[no_std]` with the `alloc` crate needed for `Vec`,
//! which we use for storing decoded bytes.
#![no_std]
extern crate alloc;

pub mod bytestream;
pub mod colorspace;
pub mod log;
pub mod options;
pub mod result;
pub mod sample;
pub mod serde;

/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Logging facade for the lume crates
//!
//! With the `log` feature enabled this re-exports the macros from the
//! [log](https://crates.io/crates/log) crate, without it the macros
//! expand to nothing, so decoders can unconditionally emit diagnostics.

#[cfg(feature = "log")]
pub use log::{debug, error, info, trace, warn};

// #[macro_export] is required to make macros work across crates
// but it always puts the macro in the crate root.
// #[doc(hidden)] + "pub use" is a workaround to namespace a macro.
#[cfg(not(feature = "log"))]
pub use crate::{
    __debug as debug, __error as error, __info as info, __trace as trace, __warn as warn
};

#[doc(hidden)]
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! __error {
    ($($arg:tt)+) => {};
}

#[doc(hidden)]
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! __warn {
    ($($arg:tt)+) => {};
}

#[doc(hidden)]
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! __info {
    ($($arg:tt)+) => {};
}

#[doc(hidden)]
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! __debug {
    ($($arg:tt)+) => {};
}

#[doc(hidden)]
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! __trace {
    ($($arg:tt)+) => {};
}

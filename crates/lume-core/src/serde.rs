#![cfg(feature = "serde")]

use alloc::format;

use serde::ser::*;

use crate::colorspace::ColorSpace;
use crate::sample::SampleType;

impl Serialize for ColorSpace {
    #[allow(clippy::uninlined_format_args)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        // colorspace serialization is simply its debug value
        serializer.serialize_str(&format!("{:?}", self))
    }
}

impl Serialize for SampleType {
    #[allow(clippy::uninlined_format_args)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        serializer.serialize_str(&format!("{:?}", self))
    }
}

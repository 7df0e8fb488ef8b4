#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    use lume_hdr::lume_core::sample::SampleType;

    let mut decoder = lume_hdr::HdrDecoder::new(data);
    let _ = decoder.decode(SampleType::F32);
});

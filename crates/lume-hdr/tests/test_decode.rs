/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use half::f16;
use lume_core::colorspace::ColorSpace;
use lume_core::sample::SampleType;
use lume_hdr::HdrDecoder;
use nanorand::{Rng, WyRand};

/// Assemble an in memory `.hdr` file around `pixel_data`
fn radiance_file(extra: &str, height: usize, width: usize, pixel_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();

    out.extend_from_slice(b"#?RADIANCE\n");
    out.extend_from_slice(extra.as_bytes());
    out.extend_from_slice(b"FORMAT=32-bit_rle_rgbe\n\n");
    out.extend_from_slice(format!("-Y {height} +X {width}\n").as_bytes());
    out.extend_from_slice(pixel_data);

    out
}

/// Run length encode one channel plane the way a Radiance writer would
fn encode_plane(plane: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;

    while i < plane.len() {
        let mut run = 1;

        while i + run < plane.len() && plane[i + run] == plane[i] && run < 127 {
            run += 1;
        }

        if run >= 2 {
            out.push(128 + run as u8);
            out.push(plane[i]);
            i += run;
        } else {
            let mut len = 1;

            while i + len < plane.len()
                && len < 128
                && (i + len + 1 >= plane.len() || plane[i + len + 1] != plane[i + len])
            {
                len += 1;
            }
            out.push(len as u8);
            out.extend_from_slice(&plane[i..i + len]);
            i += len;
        }
    }
}

/// Run length encode whole scanlines of RGBE quads, markers included
fn encode_scanlines(quads: &[u8], width: usize) -> Vec<u8> {
    let mut out = Vec::new();

    for scanline in quads.chunks_exact(4 * width) {
        out.extend_from_slice(&[2, 2, (width >> 8) as u8, (width & 255) as u8]);

        for channel in 0..4 {
            let plane: Vec<u8> = scanline.iter().skip(channel).step_by(4).copied().collect();
            encode_plane(&plane, &mut out);
        }
    }
    out
}

#[test]
fn narrow_images_decode_flat() {
    // width 4 is below the RLE eligible range, the pixel stream is the
    // quads verbatim
    let pixel_data: Vec<u8> = (0..32).collect();
    let file = radiance_file("", 2, 4, &pixel_data);

    let image = HdrDecoder::new(&file).decode(SampleType::U8).unwrap();

    assert_eq!((image.width, image.height), (4, 2));
    assert_eq!(image.pixel_format, ColorSpace::RGBA);
    assert_eq!(image.sample_type, SampleType::U8);

    let pixels = image.pixels.u8().unwrap();
    assert_eq!(pixels.len(), 4 * 4 * 2);
    assert_eq!(pixels, pixel_data);
}

#[test]
fn rle_scanline_with_runs_and_literals() {
    // one scanline, width 8: red is a run, green a literal run, blue a
    // mix of both, the exponent plane a run
    let blue = [1, 2, 2, 2, 2, 2, 3, 4];
    let pixel_data = [
        2, 2, 0, 8, // scanline marker
        136, 5, // red: run of 8 fives
        8, 0, 1, 2, 3, 4, 5, 6, 7, // green: literal 0..=7
        1, 1, // blue: single literal
        133, 2, // blue: run of 5 twos
        2, 3, 4, // blue: literal tail
        136, 128, // exponent: run of 8
    ];
    let file = radiance_file("", 1, 8, &pixel_data);

    let image = HdrDecoder::new(&file).decode(SampleType::U8).unwrap();
    let pixels = image.pixels.u8().unwrap();

    assert_eq!(pixels.len(), 4 * 8);
    for (i, quad) in pixels.chunks_exact(4).enumerate() {
        let expected = [5, i as u8, blue[i], 128];
        assert_eq!(quad, &expected[..]);
    }
}

#[test]
fn random_rle_round_trip() {
    let width = 32;
    let height = 4;
    let mut rng = WyRand::new_seed(0xDECADE);

    // random quads with occasional flat stretches so both run kinds
    // show up in the encoding
    let mut quads = vec![0_u8; 4 * width * height];
    for chunk in quads.chunks_exact_mut(16) {
        if rng.generate::<u8>() < 64 {
            chunk.fill(rng.generate::<u8>());
        } else {
            for byte in chunk.iter_mut() {
                *byte = rng.generate::<u8>();
            }
        }
    }

    let encoded = encode_scanlines(&quads, width);
    let file = radiance_file("", height, width, &encoded);

    let image = HdrDecoder::new(&file).decode(SampleType::U8).unwrap();

    assert_eq!(image.pixels.u8().unwrap(), quads);
}

#[test]
fn float_conversion_applies_shared_exponent() {
    // quad (128, 64, 32, 129), scale = 2^1 / 255
    let file = radiance_file("", 1, 1, &[128, 64, 32, 129]);

    let image = HdrDecoder::new(&file).decode(SampleType::F32).unwrap();

    assert_eq!(image.pixel_format, ColorSpace::RGB);

    let pixels = image.pixels.f32().unwrap();
    assert_eq!(pixels.len(), 3);

    let expected = [1.003_921_6, 0.501_960_8, 0.250_980_4];
    for (got, want) in pixels.iter().zip(expected) {
        assert!((got - want).abs() < 1e-4, "{got} != {want}");
    }
}

#[test]
fn half_float_conversion_matches_f32_narrowed() {
    let file = radiance_file("", 1, 1, &[128, 64, 32, 129]);

    let image = HdrDecoder::new(&file).decode(SampleType::F16).unwrap();

    assert_eq!(image.pixel_format, ColorSpace::RGB);

    let pixels = image.pixels.u16().unwrap();
    let scale = 2.0_f32.powi(1) / 255.0;
    let expected = [
        f16::from_f32(128.0 * scale).to_bits(),
        f16::from_f32(64.0 * scale).to_bits(),
        f16::from_f32(32.0 * scale).to_bits(),
    ];

    assert_eq!(pixels, expected);
}

#[test]
fn zero_exponent_is_tiny_but_not_black() {
    let file = radiance_file("", 1, 1, &[255, 255, 255, 0]);

    let image = HdrDecoder::new(&file).decode(SampleType::F32).unwrap();
    let pixels = image.pixels.f32().unwrap();

    // 255 * 2^-128 / 255 is subnormal, not zero
    assert!(pixels[0] > 0.0);
    assert!(pixels[0] < 1e-35);
}

#[test]
fn gamma_and_exposure_reach_the_result() {
    let file = radiance_file("GAMMA=2.2\nEXPOSURE=1.5\n", 1, 1, &[0, 0, 0, 0]);

    let image = HdrDecoder::new(&file).decode(SampleType::U8).unwrap();

    assert_eq!(image.gamma, 2.2);
    assert_eq!(image.exposure, 1.5);
    assert!(image.header_text.contains("GAMMA=2.2\n"));
    assert!(image.header_text.contains("EXPOSURE=1.5\n"));
}

#[test]
fn component_counts_follow_the_sample_type() {
    let pixel_data: Vec<u8> = (0..64).collect();
    let file = radiance_file("", 4, 4, &pixel_data);

    for (sample_type, components) in [
        (SampleType::U8, 4),
        (SampleType::F32, 3),
        (SampleType::F16, 3),
    ] {
        let image = HdrDecoder::new(&file).decode(sample_type).unwrap();
        assert_eq!(image.pixel_format.num_components(), components);
        assert_eq!(image.pixels.len(), 4 * 4 * components);
    }
}

#[test]
fn decoding_is_idempotent() {
    let quads: Vec<u8> = (0..128).collect();
    let encoded = encode_scanlines(&quads, 8);
    let file = radiance_file("EXPOSURE=2.0\n", 4, 8, &encoded);

    let first = HdrDecoder::new(&file).decode(SampleType::F32).unwrap();
    let second = HdrDecoder::new(&file).decode(SampleType::F32).unwrap();

    assert_eq!(first, second);
}

#[test]
fn incremental_header_api() {
    let file = radiance_file("GAMMA=2.2\n", 2, 4, &(0..32).collect::<Vec<u8>>());
    let mut decoder = HdrDecoder::new(&file);

    assert_eq!(decoder.dimensions(), None);

    decoder.decode_headers().unwrap();

    assert_eq!(decoder.dimensions(), Some((4, 2)));
    assert_eq!(decoder.gamma(), Some(2.2));
    assert_eq!(decoder.exposure(), Some(1.0));

    let header = decoder.header().unwrap();
    assert_eq!(header.program_type, "RADIANCE");
    assert_eq!(header.format, "32-bit_rle_rgbe");

    let raw = decoder.decode_raw().unwrap();
    assert_eq!(raw.len(), 4 * 4 * 2);
}

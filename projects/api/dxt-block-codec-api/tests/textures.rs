//! End-to-end texture encode/decode scenarios.

use dxt_block_codec_api::{
    decode_bc1, decode_bc3, decode_bc5, encode_bc1, encode_bc3, encode_bc5, ColorMode,
    Interpolation,
};

/// Deterministic LCG so the tests never depend on a random number crate.
struct Rng(u64);

impl Rng {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 32) as u32
    }
}

/// A texture-like image: per-tile gradients with a little noise.
fn textured_image(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Rng(seed);
    let mut rgba = vec![0u8; width * height * 4];
    let mut base = [128i32, 128, 128];

    for by in 0..height / 4 {
        for bx in 0..width / 4 {
            for (c, channel_base) in base.iter_mut().enumerate() {
                *channel_base = (*channel_base + (rng.next_u32() % 61) as i32 - 30).clamp(0, 255);
                let ramp_x = (rng.next_u32() % 25) as i32 - 12;
                let ramp_y = (rng.next_u32() % 25) as i32 - 12;
                for y in 0..4 {
                    for x in 0..4 {
                        let noise = (rng.next_u32() % 7) as i32 - 3;
                        let value = *channel_base + ramp_x * x as i32 + ramp_y * y as i32 + noise;
                        let offset = (((by * 4 + y) * width) + bx * 4 + x) * 4 + c;
                        rgba[offset] = value.clamp(0, 255) as u8;
                    }
                }
            }
            for y in 0..4 {
                for x in 0..4 {
                    let offset = (((by * 4 + y) * width) + bx * 4 + x) * 4 + 3;
                    rgba[offset] = 255;
                }
            }
        }
    }
    rgba
}

fn total_squared_error(a: &[u8], b: &[u8]) -> u64 {
    a.chunks_exact(4)
        .zip(b.chunks_exact(4))
        .map(|(pa, pb)| {
            (0..3)
                .map(|c| {
                    let d = pa[c] as i64 - pb[c] as i64;
                    (d * d) as u64
                })
                .sum::<u64>()
        })
        .sum()
}

#[test]
fn red_ramp_error_stays_within_one_interpolation_step() {
    // 8x8 linear red ramp across the columns
    let width = 8usize;
    let mut rgba = vec![0u8; width * 8 * 4];
    for y in 0..8 {
        for x in 0..8 {
            let offset = (y * width + x) * 4;
            rgba[offset] = (x * 255 / 7) as u8;
            rgba[offset + 3] = 255;
        }
    }

    let encoded = encode_bc1(&rgba, 8, 8, 5, ColorMode::FourColor, Interpolation::Ideal).unwrap();
    let decoded = decode_bc1(&encoded, 8, 8, Interpolation::Ideal).unwrap();

    for (src, dst) in rgba.chunks_exact(4).zip(decoded.chunks_exact(4)) {
        assert!(
            (src[0] as i32 - dst[0] as i32).abs() <= 8,
            "red {} decoded to {}",
            src[0],
            dst[0]
        );
        assert_eq!(dst[3], 255);
    }
}

#[test]
fn level_18_beats_level_5_on_a_textured_image() {
    let width = 64u32;
    let height = 64u32;
    let rgba = textured_image(width as usize, height as usize, 0x7E57);

    let level5 = encode_bc1(&rgba, width, height, 5, ColorMode::FourColor, Interpolation::Ideal)
        .unwrap();
    let level18 = encode_bc1(
        &rgba,
        width,
        height,
        18,
        ColorMode::FourColor,
        Interpolation::Ideal,
    )
    .unwrap();

    let decoded5 = decode_bc1(&level5, width, height, Interpolation::Ideal).unwrap();
    let decoded18 = decode_bc1(&level18, width, height, Interpolation::Ideal).unwrap();

    let mse5 = total_squared_error(&rgba, &decoded5);
    let mse18 = total_squared_error(&rgba, &decoded18);
    assert!(mse18 <= mse5, "level 18 mse {mse18} vs level 5 mse {mse5}");
}

#[test]
fn three_color_mode_never_hurts() {
    let width = 32u32;
    let height = 32u32;
    let rgba = textured_image(width as usize, height as usize, 0xC0FFEE);

    let four = encode_bc1(&rgba, width, height, 10, ColorMode::FourColor, Interpolation::Ideal)
        .unwrap();
    let three = encode_bc1(
        &rgba,
        width,
        height,
        10,
        ColorMode::ThreeColor,
        Interpolation::Ideal,
    )
    .unwrap();

    let err4 = total_squared_error(
        &rgba,
        &decode_bc1(&four, width, height, Interpolation::Ideal).unwrap(),
    );
    let err3 = total_squared_error(
        &rgba,
        &decode_bc1(&three, width, height, Interpolation::Ideal).unwrap(),
    );
    assert!(err3 <= err4, "3-color mse {err3} vs 4-color mse {err4}");
}

#[test]
fn bc3_round_trip_preserves_alpha_exactly_at_extremes() {
    let width = 16usize;
    let mut rgba = textured_image(width, 16, 0xA1FA);
    // punch a fully transparent hole through one block
    for y in 4..8 {
        for x in 8..12 {
            rgba[(y * width + x) * 4 + 3] = 0;
        }
    }

    let encoded = encode_bc3(&rgba, 16, 16, 5, Interpolation::Ideal).unwrap();
    let decoded = decode_bc3(&encoded, 16, 16, Interpolation::Ideal).unwrap();

    for y in 0..16 {
        for x in 0..16 {
            let offset = (y * width + x) * 4;
            let expected = if (4..8).contains(&y) && (8..12).contains(&x) {
                0
            } else {
                255
            };
            assert_eq!(decoded[offset + 3], expected, "alpha at ({x}, {y})");
        }
    }
}

#[test]
fn bc5_round_trip_tracks_two_channels() {
    let width = 16u32;
    let rgba = textured_image(16, 16, 0xBEE5);

    let encoded = encode_bc5(&rgba, width, 16, 0, 1).unwrap();
    let decoded = decode_bc5(&encoded, width, 16, 0, 1).unwrap();

    for (src, dst) in rgba.chunks_exact(4).zip(decoded.chunks_exact(4)) {
        // BC4 quantizes each channel within the block's min/max range
        assert!((src[0] as i32 - dst[0] as i32).abs() <= 24);
        assert!((src[1] as i32 - dst[1] as i32).abs() <= 24);
        assert_eq!(dst[2], 0);
        assert_eq!(dst[3], 255);
    }
}

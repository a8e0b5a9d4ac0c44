//! Single-color match tables.
//!
//! For a block of identical pixels the best encoding reproduces each channel
//! through the *interpolated* palette slot, which gives finer granularity
//! than either endpoint alone. These tables answer, for every 8-bit channel
//! value, which endpoint pair gets closest — one table per channel bit width
//! (5 or 6), palette mode (2/3 vs 1/2 interpolation) and interpolation
//! variant. They are built at encoder construction since they depend on the
//! interpolation variant.

use dxt_block_codec_common::color_565::{scale5_to_8, scale6_to_8};

use crate::interpolator::Interpolation;

/// Best endpoint pair for reproducing one 8-bit value, with the resulting
/// absolute error.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MatchEntry {
    /// Low endpoint in the table's bit width.
    pub low: u8,
    /// High endpoint in the table's bit width.
    pub high: u8,
    /// Absolute reproduction error (plus span penalty for ideal variants).
    pub error: u8,
}

pub(crate) type MatchTable = [MatchEntry; 256];

/// Builds the 256-entry match table for the given channel bit width
/// (5 or 6) and palette mode.
///
/// Entry `i` minimizes `|interpolated(high, low) - i|` over all endpoint
/// pairs, where `interpolated` is the 2/3 blend toward `high` in 4-color
/// mode and the midpoint in 3-color mode. Ideal variants add 3% of the
/// endpoint span to the error to discourage wide endpoints, since real
/// hardware only approximates their interpolation. Ties prefer equal
/// endpoints.
pub(crate) fn build_match_table(
    bits: u32,
    three_color: bool,
    interpolation: Interpolation,
) -> Box<MatchTable> {
    debug_assert!(bits == 5 || bits == 6);
    let size: u32 = 1 << bits;
    let ideal = interpolation.is_ideal();
    let use_8bit = interpolation.can_interpolate_8bit();

    let mut entries = Vec::with_capacity(256);
    for i in 0..256i32 {
        let mut best = MatchEntry {
            low: 0,
            high: 0,
            error: u8::MAX,
        };
        let mut lowest_error = 256i32;

        for low in 0..size as u8 {
            let low8 = if bits == 5 {
                scale5_to_8(low)
            } else {
                scale6_to_8(low)
            };
            for high in 0..size as u8 {
                let high8 = if bits == 5 {
                    scale5_to_8(high)
                } else {
                    scale6_to_8(high)
                };

                let value = match (use_8bit, three_color) {
                    (true, false) => interpolation.interpolate_8(high8, low8),
                    (true, true) => interpolation.interpolate_half_8(high8, low8),
                    (false, false) if bits == 5 => interpolation.interpolate_5(high, low),
                    (false, false) => interpolation.interpolate_6(high, low),
                    (false, true) if bits == 5 => interpolation.interpolate_half_5(high, low),
                    (false, true) => interpolation.interpolate_half_6(high, low),
                };

                let mut error = (value as i32 - i).abs();

                // We only need to factor in 3% error in the ideal modes.
                if ideal {
                    error += ((high8 as i32 - low8 as i32).abs() * 3) / 100;
                }

                if error < lowest_error || (error == lowest_error && low == high) {
                    best = MatchEntry {
                        low,
                        high,
                        error: error as u8,
                    };
                    lowest_error = error;
                }
            }
        }

        entries.push(best);
    }

    match entries.into_boxed_slice().try_into() {
        Ok(table) => table,
        Err(_) => unreachable!("match table always holds 256 entries"),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    use super::*;

    #[rstest]
    #[case(5, false)]
    #[case(5, true)]
    #[case(6, false)]
    #[case(6, true)]
    fn representable_values_match_exactly_with_equal_endpoints(
        #[case] bits: u32,
        #[case] three_color: bool,
    ) {
        // any value expanded from the table's own bit width is reproduced by
        // an equal endpoint pair with zero interpolation error
        let table = build_match_table(bits, three_color, Interpolation::Ideal);
        for v in 0..(1u32 << bits) as u8 {
            let expanded = if bits == 5 {
                scale5_to_8(v)
            } else {
                scale6_to_8(v)
            };
            let entry = table[expanded as usize];
            assert_eq!(entry.error, 0, "value {expanded} bits {bits}");
            assert_eq!(entry.low, entry.high);
            assert_eq!(entry.low, v);
        }
    }

    #[test]
    fn intermediate_values_use_the_interpolated_slot() {
        let table = build_match_table(5, false, Interpolation::Ideal);
        // 4 is not a representable 5-bit expansion (0 and 8 are neighbors);
        // an interpolated slot must beat both pure endpoints' error of 4,
        // net of the 3% span penalty
        let entry = table[4];
        assert!(entry.low != entry.high);
        let value = Interpolation::Ideal
            .interpolate_8(scale5_to_8(entry.high), scale5_to_8(entry.low));
        let span = (scale5_to_8(entry.high) as i32 - scale5_to_8(entry.low) as i32).abs();
        let error = (value as i32 - 4).abs() + span * 3 / 100;
        assert_eq!(entry.error as i32, error);
        assert!(error < 4);
    }

    #[test]
    fn hardware_variants_skip_the_span_penalty() {
        let table = build_match_table(5, false, Interpolation::Amd);
        for v in 0..32u8 {
            assert_eq!(table[scale5_to_8(v) as usize].error, 0);
        }
    }
}

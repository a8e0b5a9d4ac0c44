//! BC1 endpoint interpolation variants.
//!
//! Different GPUs reconstruct the two intermediate palette colors with
//! slightly different arithmetic. The encoder and decoder are parameterized
//! over four models:
//!
//! - [`Interpolation::Ideal`] — exact `(2a + b) / 3` on the 8-bit expanded
//!   endpoints, as described by the D3D10+ spec.
//! - [`Interpolation::IdealRound`] — as `Ideal`, with rounding
//!   (`(2a + b + 1) / 3`).
//! - [`Interpolation::Nvidia`] — fixed-point approximation of NV hardware.
//!   Red/blue interpolate from the raw 5-bit endpoints, green from the
//!   expanded 8-bit values, so this variant cannot operate purely on 8-bit
//!   inputs.
//! - [`Interpolation::Amd`] — AMD/ATI hardware approximation
//!   (`(43a + 21b + 32) >> 6`).
//!
//! All returned values lie in `0..=255`.

use derive_enum_all_values::AllValues;
use dxt_block_codec_common::color_565::{scale5_to_8, scale6_to_8, Color565};
use dxt_block_codec_common::color_8888::Color8888;

/// Endpoint interpolation model, fixed at encoder/decoder construction.
#[derive(AllValues, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Exact interpolation in 8-bit space, no rounding.
    #[default]
    Ideal,
    /// Exact interpolation in 8-bit space, with rounding.
    IdealRound,
    /// Nvidia hardware approximation (native bit-depth fixed point).
    Nvidia,
    /// AMD hardware approximation.
    Amd,
}

impl Interpolation {
    /// 2/3 interpolation of two 5-bit values, producing an 8-bit value
    /// (approximately `(2*v0 + v1) / 3` after expansion).
    #[inline]
    pub fn interpolate_5(self, v0: u8, v1: u8) -> u8 {
        debug_assert!(v0 < 32 && v1 < 32);
        match self {
            Interpolation::Nvidia => (((2 * v0 as u32 + v1 as u32) * 22) / 8) as u8,
            _ => self.interpolate_8(scale5_to_8(v0), scale5_to_8(v1)),
        }
    }

    /// 2/3 interpolation of two 6-bit values, producing an 8-bit value.
    #[inline]
    pub fn interpolate_6(self, v0: u8, v1: u8) -> u8 {
        debug_assert!(v0 < 64 && v1 < 64);
        match self {
            Interpolation::Nvidia => {
                // NV green interpolates over the expanded values
                let c0 = scale6_to_8(v0) as i32;
                let c1 = scale6_to_8(v1) as i32;
                let gdiff = c1 - c0;
                ((256 * c0 + (gdiff / 4) + 128 + gdiff * 80) >> 8) as u8
            }
            _ => self.interpolate_8(scale6_to_8(v0), scale6_to_8(v1)),
        }
    }

    /// 2/3 interpolation of two 8-bit values.
    ///
    /// Not accurate for variants where [`can_interpolate_8bit`] is false.
    ///
    /// [`can_interpolate_8bit`]: Interpolation::can_interpolate_8bit
    #[inline]
    pub fn interpolate_8(self, v0: u8, v1: u8) -> u8 {
        let (v0, v1) = (v0 as u32, v1 as u32);
        match self {
            Interpolation::Ideal | Interpolation::Nvidia => ((v0 * 2 + v1) / 3) as u8,
            Interpolation::IdealRound => ((v0 * 2 + v1 + 1) / 3) as u8,
            Interpolation::Amd => ((v0 * 43 + v1 * 21 + 32) >> 6) as u8,
        }
    }

    /// 1/2 interpolation of two 5-bit values, producing an 8-bit value.
    #[inline]
    pub fn interpolate_half_5(self, v0: u8, v1: u8) -> u8 {
        debug_assert!(v0 < 32 && v1 < 32);
        match self {
            Interpolation::Nvidia => (((v0 as u32 + v1 as u32) * 33) / 8) as u8,
            _ => self.interpolate_half_8(scale5_to_8(v0), scale5_to_8(v1)),
        }
    }

    /// 1/2 interpolation of two 6-bit values, producing an 8-bit value.
    #[inline]
    pub fn interpolate_half_6(self, v0: u8, v1: u8) -> u8 {
        debug_assert!(v0 < 64 && v1 < 64);
        match self {
            Interpolation::Nvidia => {
                let c0 = scale6_to_8(v0) as i32;
                let c1 = scale6_to_8(v1) as i32;
                let gdiff = c1 - c0;
                ((256 * c0 + gdiff / 4 + 128 + gdiff * 128) >> 8) as u8
            }
            _ => self.interpolate_half_8(scale6_to_8(v0), scale6_to_8(v1)),
        }
    }

    /// 1/2 interpolation of two 8-bit values.
    ///
    /// Not accurate for variants where [`can_interpolate_8bit`] is false.
    ///
    /// [`can_interpolate_8bit`]: Interpolation::can_interpolate_8bit
    #[inline]
    pub fn interpolate_half_8(self, v0: u8, v1: u8) -> u8 {
        let (v0, v1) = (v0 as u32, v1 as u32);
        match self {
            Interpolation::Amd => ((v0 + v1 + 1) >> 1) as u8,
            _ => ((v0 + v1) / 2) as u8,
        }
    }

    /// Whether the variant's palette can be computed from 8-bit expanded
    /// endpoints alone. False only for [`Interpolation::Nvidia`], which must
    /// stay in native bit depth.
    #[inline]
    pub fn can_interpolate_8bit(self) -> bool {
        self != Interpolation::Nvidia
    }

    /// Whether this is one of the ideal (non-hardware) variants. Ideal
    /// variants apply an endpoint-span penalty when building the single-color
    /// match tables, since real GPUs only approximate their interpolation.
    #[inline]
    pub fn is_ideal(self) -> bool {
        matches!(self, Interpolation::Ideal | Interpolation::IdealRound)
    }

    /// Generates the 4 palette colors for a BC1 block from two packed 5:6:5
    /// endpoints, with indices matching on-wire BC1 selectors. 3-color mode is
    /// used when `allow_3color` is set and `color1 >= color0`.
    pub fn palette_565(self, color0: u16, color1: u16, allow_3color: bool) -> [Color8888; 4] {
        let use_3color = allow_3color && color1 >= color0;
        self.palette(
            Color565::from_raw(color0),
            Color565::from_raw(color1),
            use_3color,
        )
    }

    /// Generates the 4 palette colors for a BC1 block, with indices matching
    /// on-wire BC1 selectors: slot 0 is `c0`, slot 1 is `c1`, slots 2 and 3
    /// are the interpolated colors (slot 3 is transparent black in 3-color
    /// mode).
    pub fn palette(self, c0: Color565, c1: Color565, use_3color: bool) -> [Color8888; 4] {
        let mut colors = [Color8888::default(); 4];
        colors[0] = Color8888::new(c0.red(), c0.green(), c0.blue(), 0xFF);
        colors[1] = Color8888::new(c1.red(), c1.green(), c1.blue(), 0xFF);

        if self == Interpolation::Nvidia {
            // interpolation can't be done on the 8-bit values, so work from the
            // native-depth components instead
            let (r0, g0, b0) = c0.components();
            let (r1, g1, b1) = c1.components();
            if use_3color {
                colors[2] = Color8888::new(
                    self.interpolate_half_5(r0, r1),
                    self.interpolate_half_6(g0, g1),
                    self.interpolate_half_5(b0, b1),
                    0xFF,
                );
                colors[3] = Color8888::new(0, 0, 0, 0); // transparent black
            } else {
                colors[2] = Color8888::new(
                    self.interpolate_5(r0, r1),
                    self.interpolate_6(g0, g1),
                    self.interpolate_5(b0, b1),
                    0xFF,
                );
                colors[3] = Color8888::new(
                    self.interpolate_5(r1, r0),
                    self.interpolate_6(g1, g0),
                    self.interpolate_5(b1, b0),
                    0xFF,
                );
            }
        } else if use_3color {
            colors[2] = self.interpolate_half_color(colors[0], colors[1]);
            colors[3] = Color8888::new(0, 0, 0, 0); // transparent black
        } else {
            colors[2] = self.interpolate_color(colors[0], colors[1]);
            colors[3] = self.interpolate_color(colors[1], colors[0]);
        }

        colors
    }

    #[inline]
    fn interpolate_color(self, c0: Color8888, c1: Color8888) -> Color8888 {
        Color8888::new(
            self.interpolate_8(c0.r, c1.r),
            self.interpolate_8(c0.g, c1.g),
            self.interpolate_8(c0.b, c1.b),
            0xFF,
        )
    }

    #[inline]
    fn interpolate_half_color(self, c0: Color8888, c1: Color8888) -> Color8888 {
        Color8888::new(
            self.interpolate_half_8(c0.r, c1.r),
            self.interpolate_half_8(c0.g, c1.g),
            self.interpolate_half_8(c0.b, c1.b),
            0xFF,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[rstest]
    #[case(Interpolation::Ideal)]
    #[case(Interpolation::IdealRound)]
    #[case(Interpolation::Nvidia)]
    #[case(Interpolation::Amd)]
    fn equal_endpoints_interpolate_to_themselves(#[case] interp: Interpolation) {
        for v in [0u8, 9, 20, 31] {
            assert_eq!(interp.interpolate_5(v, v), scale5_to_8(v));
            assert_eq!(interp.interpolate_half_5(v, v), scale5_to_8(v));
        }
        for v in [0u8, 21, 42, 63] {
            assert_eq!(interp.interpolate_6(v, v), scale6_to_8(v));
            assert_eq!(interp.interpolate_half_6(v, v), scale6_to_8(v));
        }
    }

    #[test]
    fn all_variants_enumerate() {
        assert_eq!(Interpolation::all_values().len(), 4);
    }

    #[test]
    fn ideal_follows_two_thirds_rule() {
        assert_eq!(Interpolation::Ideal.interpolate_8(255, 0), 170);
        assert_eq!(Interpolation::Ideal.interpolate_8(0, 255), 85);
        assert_eq!(Interpolation::IdealRound.interpolate_8(0, 255), 85);
        assert_eq!(Interpolation::IdealRound.interpolate_8(2, 0), 1);
        assert_eq!(Interpolation::Ideal.interpolate_8(2, 0), 1);
        assert_eq!(Interpolation::Ideal.interpolate_half_8(255, 0), 127);
        assert_eq!(Interpolation::Amd.interpolate_half_8(255, 0), 128);
    }

    #[test]
    fn nvidia_five_bit_formula() {
        // ((2*31 + 0) * 22) / 8 = 170
        assert_eq!(Interpolation::Nvidia.interpolate_5(31, 0), 170);
        // ((31 + 31) * 33) / 8 = 255
        assert_eq!(Interpolation::Nvidia.interpolate_half_5(31, 31), 255);
    }

    #[test]
    fn amd_formula() {
        // (255*43 + 0*21 + 32) >> 6 = 171
        assert_eq!(Interpolation::Amd.interpolate_8(255, 0), 171);
    }

    #[rstest]
    #[case(Interpolation::Ideal)]
    #[case(Interpolation::IdealRound)]
    #[case(Interpolation::Nvidia)]
    #[case(Interpolation::Amd)]
    fn palette_mode_follows_endpoint_order(#[case] interp: Interpolation) {
        // color1 >= color0 selects 3-color mode when allowed
        let three = interp.palette_565(0x0000, 0xFFFF, true);
        assert_eq!(three[3], Color8888::new(0, 0, 0, 0));

        let four = interp.palette_565(0xFFFF, 0x0000, true);
        assert_eq!(four[3].a, 0xFF);

        // and 4-color mode is forced when 3-color is not allowed
        let forced = interp.palette_565(0x0000, 0xFFFF, false);
        assert_eq!(forced[3].a, 0xFF);
    }

    #[test]
    fn ideal_palette_matches_decoder_law() {
        let palette = Interpolation::Ideal.palette_565(0xFFFF, 0x0000, true);
        assert_eq!(palette[0], Color8888::new(255, 255, 255, 255));
        assert_eq!(palette[1], Color8888::new(0, 0, 0, 255));
        assert_eq!(palette[2], Color8888::new(170, 170, 170, 255));
        assert_eq!(palette[3], Color8888::new(85, 85, 85, 255));

        let half = Interpolation::Ideal.palette_565(0x0000, 0xFFFF, true);
        assert_eq!(half[2], Color8888::new(127, 127, 127, 255));
    }
}

//! BC1 encoder configuration.
//!
//! The encoder exposes a pile of individual knobs, but almost every caller
//! should go through the 0..=19 quality levels, which map to tuned presets.
//! Level 5 is the default and roughly matches stb_dxt's HIGHQUAL.

use derive_enum_all_values::AllValues;
use thiserror::Error;

use crate::order_table::{BEST_ORDER_COUNT3, BEST_ORDER_COUNT4};

/// Highest accepted quality level.
pub const MAX_LEVEL: u32 = 19;

/// Smallest number of power iterations accepted for PCA.
pub const MIN_POWER_ITERATIONS: u32 = 4;
/// Largest number of power iterations accepted for PCA.
pub const MAX_POWER_ITERATIONS: u32 = 10;

/// The quality level was above [`MAX_LEVEL`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("quality level {0} is out of range, must be between 0 and 19 inclusive")]
pub struct LevelOutOfRangeError(pub u32);

/// Which palette modes the encoder may emit.
#[derive(AllValues, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Only 4-color blocks (`color0 > color1`). Required for BC3 color data.
    #[default]
    FourColor,
    /// 4-color blocks, plus 3-color blocks where they win.
    ThreeColor,
    /// As [`ColorMode::ThreeColor`], plus 3-color blocks using the
    /// transparent-black slot for near-black pixels.
    ThreeColorBlack,
}

impl ColorMode {
    /// True when 3-color blocks may be emitted.
    #[inline]
    pub fn allows_3color(self) -> bool {
        !matches!(self, ColorMode::FourColor)
    }
}

/// How much error accounting the selector finder performs.
#[derive(AllValues, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Perform no error checking at all. Selectors come from a pure
    /// projection onto the endpoint axis.
    None,
    /// A slightly lower quality, but ~30% faster MSE evaluation for
    /// 4-color blocks.
    Faster,
    /// Estimate the selector from the projection, then check it and one
    /// neighbor.
    Check2,
    /// Examine all palette entries per pixel (slower).
    Full,
}

/// How the initial endpoint pair is derived from the block.
#[derive(AllValues, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointMode {
    /// 2D least squares + inset + optimal rounding (the method used in
    /// Humus's GPU texture encoding demo).
    LeastSquares,
    /// Inset bounding box with diagonal correction, float arithmetic.
    BoundingBox,
    /// As [`EndpointMode::BoundingBox`] in integer arithmetic (faster,
    /// slightly less quality).
    BoundingBoxInt,
    /// Full PCA via power iteration on the color covariance matrix.
    Pca,
}

/// Tuning knobs for [`Bc1Encoder`](crate::encoder::Bc1Encoder), usually
/// produced by [`Bc1EncoderSettings::from_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bc1EncoderSettings {
    /// Run the least-squares refinement twice per pass.
    pub two_ls_passes: bool,
    /// Try a second initial-endpoint algorithm and keep the better result.
    pub two_ep_passes: bool,
    /// Run the cluster-fit refinement twice.
    pub two_cf_passes: bool,
    /// Ignore the ordering budgets and try every histogram during cluster
    /// fit. Extremely slow; for testing only.
    pub exhaustive: bool,
    /// Error accounting mode for 4-color selector searches.
    pub error_mode: ErrorMode,
    /// Initial endpoint algorithm.
    pub endpoint_mode: EndpointMode,
    /// PCA power iterations, 4..=10.
    pub power_iterations: u32,
    /// Endpoint neighborhood search budget, 0 disables the search.
    pub search_rounds: u32,
    /// Cluster-fit orderings to try in 4-color mode, 1..=128.
    pub orderings4: u32,
    /// Cluster-fit orderings to try in 3-color mode, 1..=32.
    pub orderings3: u32,
}

impl Default for Bc1EncoderSettings {
    fn default() -> Self {
        Self::from_level(5).unwrap_or_else(|_| unreachable!())
    }
}

impl Bc1EncoderSettings {
    /// Translates a quality level into its preset.
    pub fn from_level(level: u32) -> Result<Self, LevelOutOfRangeError> {
        let mut settings = Self {
            two_ls_passes: false,
            two_ep_passes: false,
            two_cf_passes: false,
            exhaustive: false,
            error_mode: ErrorMode::Check2,
            endpoint_mode: EndpointMode::Pca,
            power_iterations: 4,
            search_rounds: 0,
            orderings4: 0,
            orderings3: 0,
        };

        match level {
            0 => {
                // Faster/higher quality than stb_dxt default.
                settings.endpoint_mode = EndpointMode::BoundingBoxInt;
            }
            1 => {
                // Faster/higher quality than stb_dxt default. A bit higher
                // average quality vs level 0.
                settings.endpoint_mode = EndpointMode::LeastSquares;
            }
            2 => {
                // On average a little weaker than levels 0/1, but stronger on
                // outliers (very tough textures). Uses the default settings.
            }
            3 => {
                // Slightly stronger than stb_dxt HIGHQUAL.
                settings.two_ls_passes = true;
            }
            4 => {
                settings.two_ls_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.power_iterations = 6;
            }
            5 => {
                // stb_dxt HIGHQUAL + permit 3-color (if it's enabled).
                settings.two_ls_passes = true;
                settings.error_mode = ErrorMode::Faster;
            }
            6 => {
                settings.two_ls_passes = true;
                settings.error_mode = ErrorMode::Faster;
                settings.orderings4 = 1;
                settings.orderings3 = 1;
            }
            7 => {
                settings.two_ls_passes = true;
                settings.error_mode = ErrorMode::Faster;
                settings.orderings4 = 4;
                settings.orderings3 = 1;
            }
            8 => {
                settings.two_ls_passes = true;
                settings.error_mode = ErrorMode::Faster;
                settings.orderings4 = 8;
                settings.orderings3 = 1;
            }
            9 => {
                settings.two_ls_passes = true;
                settings.orderings4 = 11;
                settings.orderings3 = 3;
            }
            10 => {
                settings.two_ls_passes = true;
                settings.orderings4 = 20;
                settings.orderings3 = 8;
            }
            11 => {
                settings.two_ls_passes = true;
                settings.orderings4 = 28;
                settings.orderings3 = 16;
            }
            12 => {
                settings.two_ls_passes = true;
                settings.orderings4 = 32;
                settings.orderings3 = 32;
            }
            13 => {
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 32;
                settings.orderings3 = 32;
                settings.search_rounds = 20;
                settings.power_iterations = 6;
            }
            14 => {
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 32;
                settings.orderings3 = 32;
                settings.search_rounds = 32;
                settings.power_iterations = 6;
            }
            15 => {
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 56;
                settings.orderings3 = 32;
                settings.search_rounds = 32;
                settings.power_iterations = 6;
            }
            16 => {
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 80;
                settings.orderings3 = 32;
                settings.search_rounds = 256;
                settings.power_iterations = 6;
            }
            17 => {
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 128;
                settings.orderings3 = 32;
                settings.search_rounds = 256;
            }
            18 => {
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.two_cf_passes = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 128;
                settings.orderings3 = 32;
                settings.search_rounds = 256;
                settings.power_iterations = 6;
            }
            19 => {
                // This hidden level is *extremely* slow and abuses the
                // encoder. It's just for testing/training.
                settings.two_ls_passes = true;
                settings.two_ep_passes = true;
                settings.two_cf_passes = true;
                settings.exhaustive = true;
                settings.error_mode = ErrorMode::Full;
                settings.orderings4 = 128;
                settings.orderings3 = 32;
                settings.search_rounds = 256;
                settings.power_iterations = 6;
            }
            _ => return Err(LevelOutOfRangeError(level)),
        }

        settings.orderings4 = settings.orderings4.clamp(1, BEST_ORDER_COUNT4 as u32);
        settings.orderings3 = settings.orderings3.clamp(1, BEST_ORDER_COUNT3 as u32);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn level_20_is_rejected() {
        assert_eq!(
            Bc1EncoderSettings::from_level(20),
            Err(LevelOutOfRangeError(20))
        );
        assert_eq!(
            Bc1EncoderSettings::from_level(u32::MAX),
            Err(LevelOutOfRangeError(u32::MAX))
        );
    }

    #[test]
    fn every_level_has_a_preset() {
        for level in 0..=MAX_LEVEL {
            let settings = Bc1EncoderSettings::from_level(level).unwrap();
            assert!(settings.orderings4 >= 1 && settings.orderings4 <= 128);
            assert!(settings.orderings3 >= 1 && settings.orderings3 <= 32);
            assert!(settings.power_iterations >= MIN_POWER_ITERATIONS);
            assert!(settings.power_iterations <= MAX_POWER_ITERATIONS);
        }
    }

    #[rstest]
    #[case(0, EndpointMode::BoundingBoxInt, ErrorMode::Check2, 1, 1, 0)]
    #[case(1, EndpointMode::LeastSquares, ErrorMode::Check2, 1, 1, 0)]
    #[case(5, EndpointMode::Pca, ErrorMode::Faster, 1, 1, 0)]
    #[case(13, EndpointMode::Pca, ErrorMode::Full, 32, 32, 20)]
    #[case(18, EndpointMode::Pca, ErrorMode::Full, 128, 32, 256)]
    fn preset_table_spot_checks(
        #[case] level: u32,
        #[case] endpoint_mode: EndpointMode,
        #[case] error_mode: ErrorMode,
        #[case] orderings4: u32,
        #[case] orderings3: u32,
        #[case] search_rounds: u32,
    ) {
        let settings = Bc1EncoderSettings::from_level(level).unwrap();
        assert_eq!(settings.endpoint_mode, endpoint_mode);
        assert_eq!(settings.error_mode, error_mode);
        assert_eq!(settings.orderings4, orderings4);
        assert_eq!(settings.orderings3, orderings3);
        assert_eq!(settings.search_rounds, search_rounds);
    }

    #[test]
    fn configuration_enums_enumerate_for_tooling() {
        assert_eq!(ColorMode::all_values().len(), 3);
        assert_eq!(ErrorMode::all_values().len(), 4);
        assert_eq!(EndpointMode::all_values().len(), 4);
    }

    #[test]
    fn only_the_hidden_level_is_exhaustive() {
        for level in 0..=MAX_LEVEL {
            let settings = Bc1EncoderSettings::from_level(level).unwrap();
            assert_eq!(settings.exhaustive, level == 19);
        }
    }
}

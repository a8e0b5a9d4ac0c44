//! The BC1 block encoder.
//!
//! Encoding one block is a layered cascade: initial endpoints (bounding box,
//! 2D least squares or PCA), per-pixel selectors, least-squares endpoint
//! refinement, optional cluster-fit refinement over precomputed orderings,
//! optional 3-color and 3-color-with-black candidates, and a final voxel
//! hill-climb in endpoint space. The lowest-error candidate wins and is
//! packed with the mode-vs-endpoint-ordering invariant enforced.
//!
//! Selectors are kept in *linear* order while encoding (0 = low endpoint,
//! N-1 = high endpoint, 3 = transparent black in 3-color-black mode); the
//! swap to BC1's on-wire selector ordering happens at pack time.

use likely_stable::unlikely;

use dxt_block_codec_common::color_565::{
    precise_round_565, scale8_to_5, scale8_to_6, Color565,
};
use dxt_block_codec_common::color_8888::Color8888;
use dxt_block_codec_common::color_block::{BlockMetrics, ColorBlock};
use dxt_block_codec_common::vec4::{Vec4F, Vec4I};

use crate::block::Bc1Block;
use crate::histogram::Histogram;
use crate::interpolator::Interpolation;
use crate::order_table::{order_table3, order_table4, OrderTable};
use crate::settings::{Bc1EncoderSettings, ColorMode, EndpointMode, ErrorMode, LevelOutOfRangeError};
use crate::single_color::{build_match_table, MatchTable};

/// Encodes 4x4 pixel blocks to BC1.
///
/// Construction builds the interpolation-dependent single-color match tables
/// and forces the shared order tables, so [`encode_block`] itself never
/// allocates.
///
/// [`encode_block`]: Bc1Encoder::encode_block
pub struct Bc1Encoder {
    interpolation: Interpolation,
    color_mode: ColorMode,
    settings: Bc1EncoderSettings,

    // match tables used for single-color blocks; these depend on the
    // interpolation variant
    match5: Box<MatchTable>,
    match6: Box<MatchTable>,
    match5_half: Box<MatchTable>,
    match6_half: Box<MatchTable>,
}

/// Working state for one candidate encoding of a block.
#[derive(Debug, Clone)]
struct EncodeResult {
    low: Color565,
    high: Color565,
    /// Selectors in linear order.
    selectors: [u8; 16],
    /// `None` while the candidate has no valid selectors yet.
    color_mode: Option<ColorMode>,
    /// Accumulated squared error of the candidate.
    error: u32,
}

impl Default for EncodeResult {
    fn default() -> Self {
        Self {
            low: Color565::default(),
            high: Color565::default(),
            selectors: [0; 16],
            color_mode: None,
            error: u32::MAX,
        }
    }
}

impl Default for Bc1Encoder {
    fn default() -> Self {
        Self::with_settings(
            Bc1EncoderSettings::default(),
            ColorMode::default(),
            Interpolation::default(),
        )
    }
}

impl Bc1Encoder {
    /// Block count at or above which a texture driver should encode blocks in
    /// parallel.
    pub const PARALLEL_THRESHOLD: usize = 16;

    /// Creates an encoder for a quality level preset.
    pub fn new(
        level: u32,
        color_mode: ColorMode,
        interpolation: Interpolation,
    ) -> Result<Self, LevelOutOfRangeError> {
        Ok(Self::with_settings(
            Bc1EncoderSettings::from_level(level)?,
            color_mode,
            interpolation,
        ))
    }

    /// Creates an encoder from explicit settings.
    pub fn with_settings(
        settings: Bc1EncoderSettings,
        color_mode: ColorMode,
        interpolation: Interpolation,
    ) -> Self {
        // pay the shared-table construction cost up front
        let _ = order_table4();
        if color_mode.allows_3color() {
            let _ = order_table3();
        }

        Self {
            interpolation,
            color_mode,
            settings,
            match5: build_match_table(5, false, interpolation),
            match6: build_match_table(6, false, interpolation),
            match5_half: build_match_table(5, true, interpolation),
            match6_half: build_match_table(6, true, interpolation),
        }
    }

    /// The encoder's interpolation variant.
    #[inline]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// The palette modes this encoder may emit.
    #[inline]
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// The encoder's tuning knobs.
    #[inline]
    pub fn settings(&self) -> &Bc1EncoderSettings {
        &self.settings
    }

    /// Encodes one 4x4 block.
    pub fn encode_block(&self, pixels: &ColorBlock) -> Bc1Block {
        if unlikely(pixels.is_single_color()) {
            // single-color block, do it the fast way
            return self.write_block_solid(pixels.get(0));
        }

        let s = &self.settings;
        let metrics = pixels.metrics(false);

        let use_likely_orderings = s.exhaustive || s.orderings4 > 0 || s.orderings3 > 0;

        let mut needs_block_error = use_likely_orderings;
        needs_block_error |= self.color_mode == ColorMode::ThreeColor;
        needs_block_error |= self.color_mode == ColorMode::ThreeColorBlack && metrics.has_black;
        needs_block_error |= s.error_mode != ErrorMode::None;
        needs_block_error |= s.search_rounds > 0;
        let error_mode = if needs_block_error {
            s.error_mode
        } else {
            ErrorMode::None
        };

        let total_ls_passes = if s.two_ls_passes { 2 } else { 1 };
        let total_cf_passes = if s.two_cf_passes { 2 } else { 1 };
        let total_ep_passes = if needs_block_error && s.two_ep_passes {
            2
        } else {
            1
        };

        // Initial block generation
        let mut orig = EncodeResult::default();
        let mut result = EncodeResult::default();
        for round in 0..total_ep_passes {
            let endpoint_mode = if round == 1 {
                EndpointMode::BoundingBox
            } else {
                s.endpoint_mode
            };

            let mut trial_orig = EncodeResult::default();
            self.find_endpoints(&mut trial_orig, pixels, &metrics, endpoint_mode, false);

            let mut trial_result = trial_orig.clone();
            self.find_selectors(&mut trial_result, pixels, ColorMode::FourColor, error_mode);
            self.refine_block_ls::<4>(
                &mut trial_result,
                pixels,
                &metrics,
                ColorMode::FourColor,
                error_mode,
                total_ls_passes,
                order_table4(),
            );

            if !needs_block_error || trial_result.error < result.error {
                result = trial_result;
                orig = trial_orig;
            }
        }

        // First refinement pass using ordered cluster fit
        if result.error > 0 && use_likely_orderings {
            for _ in 0..total_cf_passes {
                self.refine_block_cf::<4>(
                    &mut result,
                    pixels,
                    &metrics,
                    ColorMode::FourColor,
                    s.error_mode,
                    s.orderings4,
                    order_table4(),
                );
            }
        }

        // try for a 3-color block
        if result.error > 0 && self.color_mode.allows_3color() {
            let mut trial_result = orig.clone();

            self.find_selectors(&mut trial_result, pixels, ColorMode::ThreeColor, ErrorMode::Full);
            self.refine_block_ls::<3>(
                &mut trial_result,
                pixels,
                &metrics,
                ColorMode::ThreeColor,
                ErrorMode::Full,
                total_ls_passes,
                order_table3(),
            );

            if trial_result.error > 0 && use_likely_orderings {
                for _ in 0..total_cf_passes {
                    self.refine_block_cf::<3>(
                        &mut trial_result,
                        pixels,
                        &metrics,
                        ColorMode::ThreeColor,
                        ErrorMode::Full,
                        s.orderings3,
                        order_table3(),
                    );
                }
            }

            if trial_result.error < result.error {
                result = trial_result;
            }
        }

        // try for a 3-color block with black pixels
        if result.error > 0
            && self.color_mode == ColorMode::ThreeColorBlack
            && metrics.has_black
            && !metrics.max.is_black()
        {
            let metrics_no_black = pixels.metrics(true);
            let mut trial_result = EncodeResult::default();

            self.find_endpoints(
                &mut trial_result,
                pixels,
                &metrics_no_black,
                EndpointMode::Pca,
                true,
            );
            self.find_selectors(
                &mut trial_result,
                pixels,
                ColorMode::ThreeColorBlack,
                ErrorMode::Full,
            );
            self.refine_block_ls::<3>(
                &mut trial_result,
                pixels,
                &metrics_no_black,
                ColorMode::ThreeColorBlack,
                ErrorMode::Full,
                total_ls_passes,
                order_table3(),
            );

            if trial_result.error < result.error {
                result = trial_result;
            }
        }

        // refine endpoints by searching for nearby colors
        if result.error > 0 && s.search_rounds > 0 {
            self.endpoint_search(&mut result, pixels);
        }

        self.write_block(&result)
    }

    fn match_tables(&self, three_color: bool) -> (&MatchTable, &MatchTable) {
        if three_color {
            (&self.match5_half, &self.match6_half)
        } else {
            (&self.match5, &self.match6)
        }
    }

    /// Best endpoints for a solid block of `color`, from the match tables.
    /// Selectors are left for the caller; the implied palette slot is the
    /// interpolated one.
    fn find_endpoints_single_color(&self, color: Color8888, three_color: bool) -> EncodeResult {
        let (match5, match6) = self.match_tables(three_color);
        let match_r = match5[color.r as usize];
        let match_g = match6[color.g as usize];
        let match_b = match5[color.b as usize];

        EncodeResult {
            low: Color565::from_components(match_r.low, match_g.low, match_b.low),
            high: Color565::from_components(match_r.high, match_g.high, match_b.high),
            selectors: [0; 16],
            color_mode: Some(if three_color {
                ColorMode::ThreeColor
            } else {
                ColorMode::FourColor
            }),
            error: match_r.error as u32 + match_g.error as u32 + match_b.error as u32,
        }
    }

    /// Single-color fallback for blocks whose selectors degenerated: encode
    /// everything through the interpolated slot for the block average, and
    /// account exact squared error against the real pixels.
    fn find_endpoints_single_color_pixels(
        &self,
        result: &mut EncodeResult,
        pixels: &ColorBlock,
        color: Color8888,
        three_color: bool,
    ) {
        let table_result = self.find_endpoints_single_color(color, three_color);
        result.low = table_result.low;
        result.high = table_result.high;
        result.color_mode = table_result.color_mode;

        let palette = self
            .interpolation
            .palette(result.low, result.high, three_color);
        // linear selector 2 decodes through the 2/3 slot, 1 through the half
        let (slot_color, slot) = if three_color {
            (palette[2], 1u8)
        } else {
            (palette[3], 2u8)
        };
        let slot_vector = Vec4I::from_color_rgb(slot_color);

        result.error = 0;
        for i in 0..16 {
            let diff = Vec4I::from_color_rgb(pixels.get(i)) - slot_vector;
            result.error += diff.sqr_mag();
            result.selectors[i] = slot;
        }
    }

    /// Derives an initial endpoint pair from the block, leaving the result
    /// incomplete (no selectors yet).
    fn find_endpoints(
        &self,
        result: &mut EncodeResult,
        pixels: &ColorBlock,
        metrics: &BlockMetrics,
        endpoint_mode: EndpointMode,
        ignore_black: bool,
    ) {
        if metrics.is_greyscale {
            // specialized greyscale case
            let first = pixels.get(0).r;

            if metrics.max.r - metrics.min.r < 2 {
                // single color block
                let r5 = scale8_to_5(first);
                let r6 = scale8_to_6(first);
                result.low = Color565::from_components(r5, r6, r5);
                result.high = result.low;
            } else {
                let l5 = scale8_to_5(metrics.min.r);
                let l6 = scale8_to_6(metrics.min.r);
                let h5 = scale8_to_5(metrics.max.r);
                let h6 = scale8_to_6(metrics.max.r);
                result.low = Color565::from_components(l5, l6, l5);
                result.high = Color565::from_components(h5, h6, h5);
            }
            result.color_mode = None;
            return;
        }

        match endpoint_mode {
            EndpointMode::LeastSquares => {
                // 2D least squares from Humus's example, with added inset and
                // optimal rounding. The widest channel is the independent
                // variable; each remaining channel is fitted as y = ax + b.
                let mut low = Vec4F::default();
                let mut high = Vec4F::default();

                let diff = Color8888::new(
                    metrics.max.r - metrics.min.r,
                    metrics.max.g - metrics.min.g,
                    metrics.max.b - metrics.min.b,
                    0xFF,
                );
                let chan0 = diff.max_channel_rgb();
                low[chan0] = metrics.min.channel(chan0) as f32;
                high[chan0] = metrics.max.channel(chan0) as f32;

                let mut sums_xy = [0i64; 3];
                for i in 0..16 {
                    let val = pixels.get(i);
                    let x = val.channel(chan0) as i64;
                    for (c, sum) in sums_xy.iter_mut().enumerate() {
                        *sum += x * val.channel(c) as i64;
                    }
                }

                let sum_x = metrics.sums[chan0] as i64;
                let sum_xx = sums_xy[chan0];

                let denominator = (16 * sum_xx - sum_x * sum_x) as f32;
                if denominator.abs() > 1e-8 {
                    for i in 1..3 {
                        // a = (m∑xy - ∑x∑y) / (m∑x² - (∑x)²)
                        // b = (∑x²∑y - ∑xy∑x) / (m∑x² - (∑x)²)
                        // see Giordano/Weir pg.103
                        let chan = (chan0 + i) % 3;
                        let sum_y = metrics.sums[chan] as i64;
                        let sum_xy = sums_xy[chan];

                        let a = (16 * sum_xy - sum_x * sum_y) as f32 / denominator;
                        let b = (sum_xx * sum_y - sum_xy * sum_x) as f32 / denominator;

                        low[chan] = b + a * low[chan0];
                        high[chan] = b + a * high[chan0];
                    }
                }

                // once per axis, inset towards the center by 1/16 of the delta
                // and rescale to unit range
                for c in 0..3 {
                    let inset = (high[c] - low[c]) / 16.0;
                    low[c] = (low[c] + inset) / 255.0;
                    high[c] = (high[c] - inset) / 255.0;
                }

                result.low = precise_round_565(low);
                result.high = precise_round_565(high);
            }
            EndpointMode::BoundingBox => {
                // Algorithm from icbc.h compress_dxt1_fast()
                let mut low = Vec4F::default();
                let mut high = Vec4F::default();
                let bias = 8.0 / 255.0;

                // rescale and inset values
                for c in 0..3 {
                    let l = metrics.min.channel(c) as f32 / 255.0;
                    let h = metrics.max.channel(c) as f32 / 255.0;
                    let inset = (h - l - bias) / 16.0;
                    low[c] = (l + inset).clamp(0.0, 1.0);
                    high[c] = (h - inset).clamp(0.0, 1.0);
                }

                // select the correct diagonal across the bounding box
                let (icov_xz, icov_yz) = self.diagonal_covariance(pixels, metrics);
                if icov_xz < 0 {
                    let (l, h) = (low[0], high[0]);
                    low[0] = h;
                    high[0] = l;
                }
                if icov_yz < 0 {
                    let (l, h) = (low[1], high[1]);
                    low[1] = h;
                    high[1] = l;
                }

                result.low = precise_round_565(low);
                result.high = precise_round_565(high);
            }
            EndpointMode::BoundingBoxInt => {
                // same as BoundingBox, converted to integer
                let mut min = Color8888::default();
                let mut max = Color8888::default();

                for c in 0..3 {
                    let inset =
                        ((metrics.max.channel(c) as i32 - metrics.min.channel(c) as i32) - 8) >> 4;
                    min.set_channel(c, (metrics.min.channel(c) as i32 + inset).clamp(0, 255) as u8);
                    max.set_channel(c, (metrics.max.channel(c) as i32 - inset).clamp(0, 255) as u8);
                }

                let (icov_xz, icov_yz) = self.diagonal_covariance(pixels, metrics);
                if icov_xz < 0 {
                    core::mem::swap(&mut min.r, &mut max.r);
                }
                if icov_yz < 0 {
                    core::mem::swap(&mut min.g, &mut max.g);
                }

                result.low = min.to_565_lossy();
                result.high = max.to_565_lossy();
            }
            EndpointMode::Pca => {
                // select 2 colors along the principal axis of the block
                let avg = Vec4F::from_color_rgb(metrics.avg);
                let min = Vec4F::from_color_rgb(metrics.min);
                let max = Vec4F::from_color_rgb(metrics.max);

                let mut axis = Vec4F::new(306.0, 601.0, 117.0, 0.0); // luma vector
                let mut covariance = [[0.0f32; 3]; 3];
                for (c, row) in covariance.iter_mut().enumerate() {
                    row[c] = 1.0;
                }

                for i in 0..16 {
                    let val = pixels.get(i);
                    if ignore_black && val.is_black() {
                        continue;
                    }
                    let diff = Vec4F::from_color_rgb(val) - avg;
                    for c1 in 0..3 {
                        for c2 in c1..3 {
                            covariance[c1][c2] += diff[c1] * diff[c2];
                        }
                    }
                }

                for c1 in 0..3 {
                    for c2 in c1..3 {
                        covariance[c1][c2] /= 255.0;
                        covariance[c2][c1] = covariance[c1][c2];
                    }
                }

                let mut delta = max - min;

                // realign the r and g axes to match the blue channel
                if covariance[0][2] < 0.0 {
                    delta[0] = -delta[0]; // r vs b
                }
                if covariance[1][2] < 0.0 {
                    delta[1] = -delta[1]; // g vs b
                }

                // stretch the delta vector towards the primary axis of the
                // data using power iteration
                for _ in 0..self.settings.power_iterations {
                    let mut next = Vec4F::default();
                    for (c, row) in covariance.iter().enumerate() {
                        next[c] = row[0] * delta[0] + row[1] * delta[1] + row[2] * delta[2];
                    }
                    delta = next;
                }

                // if we found any correlation this is our new axis, otherwise
                // fall back to the luma vector
                let k = delta.max_abs(3);
                if k >= 2.0 {
                    axis = delta * (2048.0 / k);
                }
                axis *= 16.0;

                let mut min_dot = f32::INFINITY;
                let mut max_dot = f32::NEG_INFINITY;
                let mut min_index = 0;
                let mut max_index = 0;

                for i in 0..16 {
                    let val = pixels.get(i);
                    if ignore_black && val.is_black() {
                        continue;
                    }
                    let dot = Vec4F::from_color_rgb(val).dot(axis);
                    if dot > max_dot {
                        max_dot = dot;
                        max_index = i;
                    }
                    if dot < min_dot {
                        min_dot = dot;
                        min_index = i;
                    }
                }

                result.low = pixels.get(min_index).to_565_lossy();
                result.high = pixels.get(max_index).to_565_lossy();
            }
        }

        result.color_mode = None;
    }

    /// Signs of the r-vs-b and g-vs-b covariances, for the bounding-box
    /// diagonal correction.
    fn diagonal_covariance(&self, pixels: &ColorBlock, metrics: &BlockMetrics) -> (i32, i32) {
        let mut icov_xz = 0i32;
        let mut icov_yz = 0i32;
        for i in 0..16 {
            let val = pixels.get(i);
            let b = val.b as i32 - metrics.avg.b as i32;
            icov_xz += b * (val.r as i32 - metrics.avg.r as i32);
            icov_yz += b * (val.g as i32 - metrics.avg.g as i32);
        }
        (icov_xz, icov_yz)
    }

    /// Linear-order palette for a candidate: index 0 is the low endpoint,
    /// index N-1 the high one, with the interpolated colors in between
    /// (and transparent black last in 3-color mode).
    fn linear_palette(&self, result: &EncodeResult, three_color: bool) -> [Vec4I; 4] {
        let colors = self
            .interpolation
            .palette(result.low, result.high, three_color);
        if three_color {
            [
                Vec4I::from_color_rgb(colors[0]),
                Vec4I::from_color_rgb(colors[2]),
                Vec4I::from_color_rgb(colors[1]),
                Vec4I::from_color_rgb(colors[3]),
            ]
        } else {
            [
                Vec4I::from_color_rgb(colors[0]),
                Vec4I::from_color_rgb(colors[2]),
                Vec4I::from_color_rgb(colors[3]),
                Vec4I::from_color_rgb(colors[1]),
            ]
        }
    }

    /// Assigns a linear-order selector to every pixel under the given error
    /// accounting mode. `result.error` coming in acts as an upper bound: the
    /// search short-circuits once it cannot beat it.
    fn find_selectors(
        &self,
        result: &mut EncodeResult,
        pixels: &ColorBlock,
        mode: ColorMode,
        error_mode: ErrorMode,
    ) {
        debug_assert!(error_mode == ErrorMode::Full || mode == ColorMode::FourColor);

        let three_color = mode != ColorMode::FourColor;
        let color_vectors = self.linear_palette(result, three_color);

        let mut total_error = 0u32;

        match error_mode {
            ErrorMode::None | ErrorMode::Faster => {
                let mut axis = color_vectors[3] - color_vectors[0];
                let mut dots = [0i32; 4];
                for (dot, cv) in dots.iter_mut().zip(color_vectors.iter()) {
                    *dot = axis.dot(*cv);
                }
                let t0 = dots[0] + dots[1];
                let t1 = dots[1] + dots[2];
                let t2 = dots[2] + dots[3];
                axis = axis * 2;

                for i in 0..16 {
                    let pixel_vector = Vec4I::from_color_rgb(pixels.get(i));
                    let dot = axis.dot(pixel_vector);
                    let level = (dot <= t0) as u8 + ((dot < t1) as u8) + ((dot < t2) as u8);
                    let selector = 3 - level;

                    if error_mode == ErrorMode::Faster {
                        let diff = pixel_vector - color_vectors[selector as usize];
                        total_error += diff.sqr_mag();
                        // check only once per row if we're accruing too much error
                        if i % 4 != 0 && total_error >= result.error {
                            break;
                        }
                    }

                    result.selectors[i] = selector;
                }
            }
            ErrorMode::Check2 => {
                let axis = color_vectors[3] - color_vectors[0];
                let f = 4.0 / (axis.sqr_mag() as f32 + 0.00000125);

                for i in 0..16 {
                    let pixel_vector = Vec4I::from_color_rgb(pixels.get(i));
                    let diff = pixel_vector - color_vectors[0];
                    let sel_f = diff.dot(axis) as f32 * f + 0.5;
                    let sel = (sel_f as i32).clamp(1, 3) as usize;

                    let err0 = (color_vectors[sel - 1] - pixel_vector).sqr_mag();
                    let err1 = (color_vectors[sel] - pixel_vector).sqr_mag();

                    let mut best_sel = sel;
                    let mut best_err = err1;
                    if err0 == err1 {
                        // prefer non-interpolation
                        if best_sel == 1 {
                            best_sel = 0;
                        }
                    } else if err0 < best_err {
                        best_sel = sel - 1;
                        best_err = err0;
                    }

                    total_error += best_err;
                    if total_error >= result.error {
                        break;
                    }

                    result.selectors[i] = best_sel as u8;
                }
            }
            ErrorMode::Full => {
                let max_sel: usize = if mode == ColorMode::ThreeColor { 3 } else { 4 };

                for i in 0..16 {
                    let pixel_vector = Vec4I::from_color_rgb(pixels.get(i));
                    let mut best_error = u32::MAX;
                    let mut best_sel = 0usize;

                    // exhaustively check the pixel's distance from each color
                    for (j, cv) in color_vectors.iter().enumerate().take(max_sel) {
                        let err = (*cv - pixel_vector).sqr_mag();
                        if err < best_error || (err == best_error && j == 3) {
                            best_error = err;
                            best_sel = j;
                        }
                    }

                    total_error += best_error;
                    if total_error >= result.error {
                        break;
                    }

                    result.selectors[i] = best_sel as u8;
                }
            }
        }

        result.error = total_error;
        result.color_mode = Some(mode);
    }

    /// Solves the 2x2 normal equations for improved endpoints given the
    /// current selectors. Returns false when the system is singular (all
    /// selectors effectively equal), in which case the caller falls through
    /// to the single-color path.
    fn refine_endpoints_ls<const N: usize>(
        &self,
        result: &mut EncodeResult,
        pixels: &ColorBlock,
        metrics: &BlockMetrics,
        mode: ColorMode,
        table: &OrderTable<N>,
    ) -> bool {
        let denominator = (N - 1) as f32;
        let weights = table.weights();

        let mut q00 = Vec4F::default();
        let mut matrix = Vec4F::default();

        for i in 0..16 {
            let color = pixels.get(i);
            let sel = result.selectors[i] as usize;

            if mode.allows_3color() && color.is_black() {
                // near-black pixels never constrain a 3-color fit
                continue;
            }
            if mode != ColorMode::FourColor && sel == 3 {
                // selector 3 is transparent black here; it doesn't constrain
                // the endpoints
                continue;
            }
            debug_assert!(sel < N);

            q00 += Vec4F::from_color_rgb(color) * sel as f32;
            matrix += weights[sel];
        }

        let det = matrix.det2x2();
        if det.abs() < 1e-8 {
            result.color_mode = None;
            return false;
        }

        let matrix =
            Vec4F::new(matrix[3], -matrix[1], -matrix[2], matrix[0]) * ((denominator / 255.0) / det);
        let q10 = Vec4F::from(metrics.sums) * denominator - q00;

        let low = q00 * matrix[0] + q10 * matrix[1];
        let high = q00 * matrix[2] + q10 * matrix[3];

        result.color_mode = Some(mode);
        result.low = precise_round_565(low);
        result.high = precise_round_565(high);
        true
    }

    /// Vectorized least-squares solve for a candidate ordering, using the
    /// prefix sums of the pixels sorted along the endpoint axis and the
    /// ordering's cached inverted matrix.
    fn refine_endpoints_ls_prefix<const N: usize>(
        &self,
        result: &mut EncodeResult,
        sums: &[Vec4F; 17],
        factors: Vec4F,
        hist: Histogram<N>,
        mode: ColorMode,
    ) {
        let denominator = (N - 1) as f32;

        let mut level = 0usize;
        let mut q10 = Vec4F::default();
        for i in 0..(N - 1) {
            level += hist[i] as usize;
            q10 += sums[level];
        }

        let q00 = sums[16] * denominator - q10;

        let low = q00 * factors[0] + q10 * factors[1];
        let high = q00 * factors[2] + q10 * factors[3];

        result.color_mode = Some(mode);
        result.low = precise_round_565(low);
        result.high = precise_round_565(high);
    }

    /// Repeated least-squares refinement: refit endpoints from the selectors,
    /// refit selectors from the endpoints, and keep going while both keep
    /// improving.
    #[allow(clippy::too_many_arguments)]
    fn refine_block_ls<const N: usize>(
        &self,
        result: &mut EncodeResult,
        pixels: &ColorBlock,
        metrics: &BlockMetrics,
        mode: ColorMode,
        error_mode: ErrorMode,
        passes: u32,
        table: &OrderTable<N>,
    ) {
        debug_assert!(error_mode != ErrorMode::None || passes == 1);

        for _ in 0..passes {
            let mut trial = result.clone();

            let multicolor = self.refine_endpoints_ls::<N>(&mut trial, pixels, metrics, mode, table);
            if !multicolor {
                // all selectors equal; a solid encoding of the average is
                // always at least as good
                self.find_endpoints_single_color_pixels(
                    &mut trial,
                    pixels,
                    metrics.avg,
                    mode != ColorMode::FourColor,
                );
            } else {
                self.find_selectors(&mut trial, pixels, mode, error_mode);
            }

            if trial.low == result.low && trial.high == result.high {
                break;
            }

            if error_mode == ErrorMode::None || trial.error < result.error {
                *result = trial;
            } else {
                return;
            }
        }
    }

    /// Cluster-fit refinement: walk the precomputed ranking of likely
    /// alternate selector histograms, solving each one's least squares from
    /// prefix sums, and keep whichever candidate wins.
    #[allow(clippy::too_many_arguments)]
    fn refine_block_cf<const N: usize>(
        &self,
        result: &mut EncodeResult,
        pixels: &ColorBlock,
        metrics: &BlockMetrics,
        mode: ColorMode,
        error_mode: ErrorMode,
        orderings: u32,
        table: &OrderTable<N>,
    ) {
        let orig = result.clone();
        let hist = Histogram::<N>::from_selectors(&orig.selectors);
        let start_hash = table.hash_for(&hist);

        let low8 = Vec4F::new(
            orig.low.red() as f32,
            orig.low.green() as f32,
            orig.low.blue() as f32,
            0.0,
        );
        let high8 = Vec4F::new(
            orig.high.red() as f32,
            orig.high.green() as f32,
            orig.high.blue() as f32,
            0.0,
        );
        let axis = high8 - low8;

        // sort pixel indices by their projection along the endpoint axis,
        // keeping the index in the low nibble
        let mut color_vectors = [Vec4F::default(); 16];
        let mut dots = [0u32; 16];
        for i in 0..16 {
            color_vectors[i] = Vec4F::from_color_rgb(pixels.get(i));
            let dot = 0x1000000 + color_vectors[i].dot(axis) as i32;
            debug_assert!(dot >= 0);
            dots[i] = ((dot as u32) << 4) | i as u32;
        }
        dots.sort_unstable();

        // cumulative sums of the sorted pixels; a candidate histogram's
        // selector boundaries become O(1) weighted sums
        let mut sums = [Vec4F::default(); 17];
        for i in 0..16 {
            let p = (dots[i] & 0xF) as usize;
            sums[i + 1] = sums[i] + color_vectors[p];
        }

        let q_total = if self.settings.exhaustive {
            table.order_count()
        } else {
            orderings as usize
        };
        for q in 0..q_total {
            let trial_hash = if self.settings.exhaustive {
                q as u16
            } else {
                table.best_orders(start_hash)[q]
            };

            let mut trial = orig.clone();
            if table.is_single_color(trial_hash) {
                self.find_endpoints_single_color_pixels(&mut trial, pixels, metrics.avg, N == 3);
            } else {
                self.refine_endpoints_ls_prefix::<N>(
                    &mut trial,
                    &sums,
                    table.factors(trial_hash),
                    table.histogram(trial_hash),
                    mode,
                );
                self.find_selectors(&mut trial, pixels, mode, error_mode);
            }

            if trial.error < result.error {
                *result = trial.clone();
            }
            if trial.error == 0 {
                break;
            }
        }
    }

    /// Voxel hill-climb in the quantized endpoint grid as a final polish.
    /// Alternates between the two endpoints, remembers the last improving
    /// direction and skips its inverse, and gives up after 32 consecutive
    /// non-improving iterations.
    fn endpoint_search(&self, result: &mut EncodeResult, pixels: &ColorBlock) {
        // the fourth element links each move to its inverse
        const VOXELS: [(i32, i32, i32, u8); 16] = [
            (1, 0, 0, 3),
            (0, 1, 0, 4),
            (0, 0, 1, 5),
            (-1, 0, 0, 0),
            (0, -1, 0, 1),
            (0, 0, -1, 2),
            (1, 1, 0, 9),
            (1, 0, 1, 10),
            (0, 1, 1, 11),
            (-1, -1, 0, 6),
            (-1, 0, -1, 7),
            (0, -1, -1, 8),
            (-1, 1, 0, 13),
            (1, -1, 0, 12),
            (0, -1, 1, 15),
            (0, 1, -1, 14),
        ];

        let mut prev_improvement_index = 0u32;
        let mut forbidden_direction = -1i32;

        for i in 0..self.settings.search_rounds {
            let voxel_index = (i & 15) as usize;
            debug_assert_eq!(VOXELS[VOXELS[voxel_index].3 as usize].3 as usize, voxel_index);

            if (i & 31) as i32 == forbidden_direction {
                continue;
            }

            let delta = VOXELS[voxel_index];
            let mut trial = result.clone();

            let endpoint = if i & 16 != 0 {
                &mut trial.low
            } else {
                &mut trial.high
            };
            let (r, g, b) = endpoint.components();
            *endpoint = Color565::from_components(
                (r as i32 + delta.0).clamp(0, 31) as u8,
                (g as i32 + delta.1).clamp(0, 63) as u8,
                (b as i32 + delta.2).clamp(0, 31) as u8,
            );

            match result.color_mode {
                Some(ColorMode::ThreeColor) => {
                    self.find_selectors(&mut trial, pixels, ColorMode::ThreeColor, ErrorMode::Full)
                }
                Some(ColorMode::ThreeColorBlack) => self.find_selectors(
                    &mut trial,
                    pixels,
                    ColorMode::ThreeColorBlack,
                    ErrorMode::Full,
                ),
                _ => self.find_selectors(
                    &mut trial,
                    pixels,
                    ColorMode::FourColor,
                    self.settings.error_mode,
                ),
            }

            if trial.error < result.error {
                *result = trial;
                forbidden_direction = delta.3 as i32 | (i & 16) as i32;
                prev_improvement_index = i;
            }

            if i - prev_improvement_index > 32 {
                break;
            }
        }
    }

    /// Packs a solid-color block via the match tables, handling the
    /// endpoint-ordering edge cases.
    fn write_block_solid(&self, color: Color8888) -> Bc1Block {
        let mut mask = 0xAAu8; // 2222: the interpolated slot everywhere
        let mut min16;
        let mut max16;

        if (color.r | color.g | color.b) == 0 {
            // quick shortcut for all-black blocks
            min16 = 0;
            max16 = 1;
            mask = 0x55; // 1111 (color1 only, color0 is ignored)
        } else {
            let mut result = self.find_endpoints_single_color(color, false);

            if self.color_mode.allows_3color() {
                let result_3color = self.find_endpoints_single_color(color, true);
                if result_3color.error < result.error {
                    result = result_3color;
                }
            }

            min16 = result.low.raw_value();
            max16 = result.high.raw_value();

            if result.color_mode == Some(ColorMode::FourColor) {
                if min16 == max16 {
                    // make sure this isn't accidentally a 3-color block by
                    // forcing max16 > min16
                    if min16 > 0 {
                        min16 -= 1;
                        mask = 0; // endpoints are equal so the mask doesn't matter
                    } else {
                        max16 = 1;
                        min16 = 0;
                        mask = 0x55; // 1111 (color1 only, color0 is ignored)
                    }
                } else if max16 < min16 {
                    core::mem::swap(&mut min16, &mut max16);
                    mask = 0xFF; // invert the mask to 3333
                }
                debug_assert!(max16 > min16);
            } else if max16 > min16 {
                // assure a 3-color block
                core::mem::swap(&mut min16, &mut max16);
            }
        }

        Bc1Block::with_row_mask(max16, min16, mask)
    }

    /// Packs a finished candidate, enforcing the mode-vs-endpoint-ordering
    /// invariant by swapping endpoints and remapping the linear selectors to
    /// their on-wire values.
    fn write_block(&self, result: &EncodeResult) -> Bc1Block {
        debug_assert!(result.color_mode.is_some());

        let mut ep1 = result.low.raw_value();
        let mut ep0 = result.high.raw_value();
        let mut lut: [u8; 4];

        if matches!(result.color_mode, Some(ColorMode::FourColor) | None) {
            lut = [1, 3, 2, 0];

            if ep1 > ep0 {
                core::mem::swap(&mut ep1, &mut ep0);
                lut = [0, 2, 3, 1];
            } else if ep1 == ep0 {
                if ep1 > 0 {
                    ep1 -= 1;
                    lut = [0, 0, 0, 0];
                } else {
                    ep0 = 1;
                    ep1 = 0;
                    lut = [1, 1, 1, 1];
                }
            }
            debug_assert!(ep0 > ep1);
        } else {
            lut = [1, 2, 0, 3];

            if ep1 < ep0 {
                core::mem::swap(&mut ep1, &mut ep0);
                lut = [0, 2, 1, 3];
            }
            debug_assert!(ep0 <= ep1);
        }

        let mut selectors = [[0u8; 4]; 4];
        for i in 0..16 {
            let wire = lut[result.selectors[i] as usize];
            debug_assert!(result.color_mode != Some(ColorMode::ThreeColor) || wire != 3);
            selectors[i / 4][i % 4] = wire;
        }

        Bc1Block::new(ep0, ep1, selectors)
    }
}

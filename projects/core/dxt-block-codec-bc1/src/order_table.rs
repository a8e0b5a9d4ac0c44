//! Precomputed cluster-fit order tables.
//!
//! For each of the 969 possible 4-selector histograms (153 for 3 selectors)
//! this table caches:
//!
//! - the histogram itself, in a fixed enumeration order whose index is the
//!   histogram's "hash";
//! - a reverse map from the packed histogram to its hash (the four degenerate
//!   all-16 histograms don't fit the packed form and resolve through
//!   dedicated sentinel hashes instead);
//! - the inverted 2x2 normal-equation matrix for least-squares endpoint
//!   fitting under that selector distribution (zeroed when the system is
//!   singular, which signals the single-color fallback);
//! - the most promising alternate histograms to try during cluster-fit
//!   refinement, ranked by ascending L1 distance in histogram space.
//!
//! The tables depend only on N, never on pixel data or the interpolation
//! variant, so one copy per N is built on first demand and shared for the
//! rest of the process.

use std::sync::OnceLock;

use dxt_block_codec_common::vec4::Vec4F;

use crate::histogram::Histogram;

/// Number of unique 4-bin histograms summing to 16.
pub(crate) const ORDER_COUNT4: usize = 969;
/// Number of unique 3-bin histograms summing to 16.
pub(crate) const ORDER_COUNT3: usize = 153;
/// Alternate orderings kept per histogram in 4-color mode.
pub(crate) const BEST_ORDER_COUNT4: usize = 128;
/// Alternate orderings kept per histogram in 3-color mode.
pub(crate) const BEST_ORDER_COUNT3: usize = 32;

const SINGULAR_EPSILON: f32 = 1e-8;

pub(crate) struct OrderTable<const N: usize> {
    orders: Vec<Histogram<N>>,
    reverse: Vec<u16>,
    factors: Vec<Vec4F>,
    best_orders: Vec<u16>,
    best_count: usize,
    single_color_hashes: [u16; N],
    weights: [Vec4F; N],
}

impl<const N: usize> OrderTable<N> {
    /// Selector weight vectors for the least-squares normal equations, in
    /// linear selector order. Each is `(N-1)^2 * (w(1-w), w^2, (1-w)^2,
    /// w(1-w))` for `w = sel / (N-1)`, so the accumulated matrix stays exact
    /// in small integers.
    fn make_weights() -> [Vec4F; N] {
        let denominator = (N - 1) as f32;
        let scale = denominator * denominator;
        let mut weights = [Vec4F::default(); N];
        for (sel, weight) in weights.iter_mut().enumerate() {
            let w = sel as f32 / denominator;
            *weight = Vec4F::new(w * (1.0 - w), w * w, (1.0 - w) * (1.0 - w), w * (1.0 - w))
                * scale;
        }
        weights
    }

    fn generate() -> Self {
        let order_count = match N {
            4 => ORDER_COUNT4,
            3 => ORDER_COUNT3,
            _ => unreachable!("order tables exist only for N = 3 and N = 4"),
        };
        let best_count = match N {
            4 => BEST_ORDER_COUNT4,
            _ => BEST_ORDER_COUNT3,
        };
        let weights = Self::make_weights();

        // enumerate every histogram summing to 16, lexicographically
        let mut orders = Vec::with_capacity(order_count);
        let mut bins = [0u8; N];
        enumerate_histograms(&mut bins, 0, 16, &mut orders);
        debug_assert_eq!(orders.len(), order_count);

        let mut reverse = vec![0u16; 1 << ((N - 1) * 4)];
        let mut factors = Vec::with_capacity(order_count);
        let mut single_color_hashes = [0u16; N];

        let denominator = (N - 1) as f32;
        for (index, h) in orders.iter().enumerate() {
            if h.any16() {
                for bin in 0..N {
                    if h[bin] == 16 {
                        single_color_hashes[bin] = index as u16;
                    }
                }
            } else {
                reverse[h.packed() as usize] = index as u16;
            }

            let mut matrix = Vec4F::default();
            for sel in 0..N {
                matrix += weights[sel] * h[sel] as f32;
            }

            let det = matrix.det2x2();
            if det.abs() < SINGULAR_EPSILON {
                factors.push(Vec4F::default());
            } else {
                let inverted = Vec4F::new(matrix[3], -matrix[1], -matrix[2], matrix[0])
                    * ((denominator / 255.0) / det);
                factors.push(inverted);
            }
        }

        // rank alternate histograms per row by L1 distance, nearest first
        let mut best_orders = Vec::with_capacity(order_count * best_count);
        let mut candidates: Vec<u16> = (0..order_count as u16).collect();
        for index in 0..order_count {
            let home = orders[index];
            candidates.sort_by_key(|c| {
                let other = orders[*c as usize];
                let mut distance = 0u32;
                for bin in 0..N {
                    distance += (home[bin] as i32 - other[bin] as i32).unsigned_abs();
                }
                (distance, *c)
            });
            // candidates[0] is the row itself (distance zero); skip it
            best_orders.extend_from_slice(&candidates[1..=best_count]);
        }

        Self {
            orders,
            reverse,
            factors,
            best_orders,
            best_count,
            single_color_hashes,
            weights,
        }
    }

    /// Total number of histograms for this N.
    #[inline]
    pub(crate) fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// The dense index of a histogram. Degenerate all-16 histograms resolve
    /// to their dedicated sentinel hashes.
    pub(crate) fn hash_for(&self, hist: &Histogram<N>) -> u16 {
        for bin in 0..N {
            if hist[bin] == 16 {
                return self.single_color_hashes[bin];
            }
        }
        self.reverse[hist.packed() as usize]
    }

    /// The histogram at a dense index.
    #[inline]
    pub(crate) fn histogram(&self, hash: u16) -> Histogram<N> {
        self.orders[hash as usize]
    }

    /// Cached inverted normal-equation matrix for a histogram. Zero when the
    /// system is singular.
    #[inline]
    pub(crate) fn factors(&self, hash: u16) -> Vec4F {
        self.factors[hash as usize]
    }

    /// The ranked alternate histograms for a starting histogram.
    #[inline]
    pub(crate) fn best_orders(&self, hash: u16) -> &[u16] {
        let start = hash as usize * self.best_count;
        &self.best_orders[start..start + self.best_count]
    }

    /// True when `hash` is one of the degenerate single-color sentinels.
    #[inline]
    pub(crate) fn is_single_color(&self, hash: u16) -> bool {
        self.single_color_hashes.contains(&hash)
    }

    /// Selector weight vectors in linear selector order.
    #[inline]
    pub(crate) fn weights(&self) -> &[Vec4F; N] {
        &self.weights
    }
}

fn enumerate_histograms<const N: usize>(
    bins: &mut [u8; N],
    index: usize,
    remaining: u8,
    out: &mut Vec<Histogram<N>>,
) {
    if index == N - 1 {
        bins[index] = remaining;
        out.push(Histogram::new(*bins));
        return;
    }
    for value in 0..=remaining {
        bins[index] = value;
        enumerate_histograms(bins, index + 1, remaining - value, out);
    }
}

/// Shared 4-color order table, built once per process on first demand.
pub(crate) fn order_table4() -> &'static OrderTable<4> {
    static TABLE: OnceLock<OrderTable<4>> = OnceLock::new();
    TABLE.get_or_init(OrderTable::generate)
}

/// Shared 3-color order table, built once per process on first demand.
pub(crate) fn order_table3() -> &'static OrderTable<3> {
    static TABLE: OnceLock<OrderTable<3>> = OnceLock::new();
    TABLE.get_or_init(OrderTable::generate)
}

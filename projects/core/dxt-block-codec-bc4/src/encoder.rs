//! The BC4 block encoder.
//!
//! BC4 always encodes with the block's min and max as endpoints, so the only
//! work is assigning selectors. The quantizer below is optimal for the
//! 8-level palette: it produces the same selector as testing all 8 decoded
//! values and picking the closest.

use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc4Block;
use crate::error::ChannelOutOfRangeError;

// selector value options in linear order, from the min endpoint to the max
const LEVELS: [u8; 8] = [1, 7, 6, 5, 4, 3, 2, 0];

/// Encodes one channel of 4x4 pixel blocks to BC4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bc4Encoder {
    channel: usize,
}

impl Bc4Encoder {
    /// Creates an encoder reading the given source channel
    /// (0 = red, 1 = green, 2 = blue, 3 = alpha).
    pub fn new(channel: u32) -> Result<Self, ChannelOutOfRangeError> {
        if channel > 3 {
            return Err(ChannelOutOfRangeError(channel));
        }
        Ok(Self {
            channel: channel as usize,
        })
    }

    /// The source channel this encoder reads.
    #[inline]
    pub fn channel(&self) -> u32 {
        self.channel as u32
    }

    /// Encodes one 4x4 block.
    pub fn encode_block(&self, pixels: &ColorBlock) -> Bc4Block {
        let mut min = u8::MAX;
        let mut max = 0u8;
        for i in 0..16 {
            let value = pixels.get(i).channel(self.channel);
            min = min.min(value);
            max = max.max(value);
        }

        if max == min {
            return Bc4Block::solid(min);
        }

        // BC4 floors its divisions, which the 4 bias compensates for. Values
        // are scaled by 14 (two x7 scale factors) so the thresholds between
        // adjacent palette entries stay integral.
        let bias = 4 - min as i32 * 14;
        let delta = max as i32 - min as i32;

        let mut thresholds = [0i32; 7];
        for (i, threshold) in thresholds.iter_mut().enumerate() {
            *threshold = delta * (1 + 2 * i as i32) - bias;
        }

        let mut selectors = [[0u8; 4]; 4];
        for y in 0..4 {
            for x in 0..4 {
                let value = pixels.get_xy(x, y).channel(self.channel) as i32 * 14;

                // level = number of thresholds this value reaches
                let mut level = 0usize;
                for threshold in &thresholds {
                    level += (value >= *threshold) as usize;
                }

                selectors[y][x] = LEVELS[level];
            }
        }

        Bc4Block::new(max, min, selectors)
    }
}

//! The BC1 block decoder.
//!
//! Decoding is a table lookup: build the 4-entry palette implied by the two
//! endpoints (and their ordering), then index it with each pixel's selector.

use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc1Block;
use crate::interpolator::Interpolation;

/// Decodes BC1 blocks to 4x4 pixel blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bc1Decoder {
    interpolation: Interpolation,
    write_alpha: bool,
}

impl Bc1Decoder {
    /// Creates a decoder using the given interpolation variant.
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            interpolation,
            write_alpha: true,
        }
    }

    /// As [`Bc1Decoder::new`], but controlling whether decoded alpha is
    /// written. With `write_alpha` off the destination block's alpha channel
    /// is preserved, which is what the BC3 decoder needs for its color half.
    pub fn with_write_alpha(interpolation: Interpolation, write_alpha: bool) -> Self {
        Self {
            interpolation,
            write_alpha,
        }
    }

    /// The decoder's interpolation variant.
    #[inline]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Decodes one block. 3-color mode applies when `color0 <= color1`.
    pub fn decode_block(&self, block: &Bc1Block) -> ColorBlock {
        let mut output = ColorBlock::default();
        self.decode_block_into(&mut output, block, true);
        output
    }

    /// Decodes one block into an existing pixel block.
    ///
    /// With `allow_3color` unset the 4-color palette is used regardless of
    /// endpoint ordering (BC3 color data is specified to decode that way).
    pub fn decode_block_into(&self, dest: &mut ColorBlock, block: &Bc1Block, allow_3color: bool) {
        let colors = self
            .interpolation
            .palette_565(block.color0, block.color1, allow_3color);

        for y in 0..4 {
            for x in 0..4 {
                let selector = block.selector(x, y);
                let mut color = colors[selector as usize];
                if !self.write_alpha {
                    color.a = dest.get_xy(x, y).a;
                }
                dest.set_xy(x, y, color);
            }
        }
    }
}

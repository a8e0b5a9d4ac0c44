//! The BC4 block decoder.

use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc4Block;
use crate::error::ChannelOutOfRangeError;

/// Decodes BC4 blocks into one channel of a 4x4 pixel block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bc4Decoder {
    channel: usize,
}

impl Bc4Decoder {
    /// Creates a decoder writing the given destination channel
    /// (0 = red, 1 = green, 2 = blue, 3 = alpha).
    pub fn new(channel: u32) -> Result<Self, ChannelOutOfRangeError> {
        if channel > 3 {
            return Err(ChannelOutOfRangeError(channel));
        }
        Ok(Self {
            channel: channel as usize,
        })
    }

    /// The destination channel this decoder writes.
    #[inline]
    pub fn channel(&self) -> u32 {
        self.channel as u32
    }

    /// Decodes one block into a fresh pixel block (other channels default to
    /// opaque black).
    pub fn decode_block(&self, block: &Bc4Block) -> ColorBlock {
        let mut output = ColorBlock::default();
        self.decode_block_into(&mut output, block);
        output
    }

    /// Decodes one block into the destination channel of an existing pixel
    /// block, leaving the other channels untouched.
    pub fn decode_block_into(&self, dest: &mut ColorBlock, block: &Bc4Block) {
        let values = block.values();
        let selectors = block.unpack_selectors();

        for y in 0..4 {
            for x in 0..4 {
                let selector = selectors[y][x];
                let mut color = dest.get_xy(x, y);
                color.set_channel(self.channel, values[selector as usize]);
                dest.set_xy(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Bc4Encoder;
    use dxt_block_codec_common::color_8888::Color8888;

    #[test]
    fn decodes_into_the_configured_channel_only() {
        let block = Bc4Block::new(200, 100, [[0, 1, 2, 3]; 4]);
        let decoder = Bc4Decoder::new(2).unwrap();
        let mut dest = ColorBlock::splat(Color8888::new(7, 8, 9, 10));
        decoder.decode_block_into(&mut dest, &block);

        let p = dest.get_xy(0, 0);
        assert_eq!((p.r, p.g, p.a), (7, 8, 10));
        assert_eq!(p.b, 200);
        assert_eq!(dest.get_xy(1, 0).b, 100);
    }

    #[test]
    fn encode_decode_stays_within_range_and_pins_extremes() {
        let mut pixels = [Color8888::default(); 16];
        for (i, p) in pixels.iter_mut().enumerate() {
            *p = Color8888::new(0, (20 + i * 13).min(255) as u8, 0, 255);
        }
        let source = ColorBlock::from_pixels(pixels);

        let encoder = Bc4Encoder::new(1).unwrap();
        let decoder = Bc4Decoder::new(1).unwrap();
        let decoded = decoder.decode_block(&encoder.encode_block(&source));

        let min = 20u8;
        let max = 215u8;
        for i in 0..16 {
            let value = decoded.get(i).g;
            assert!(value >= min && value <= max);
        }
        // the extreme pixels decode exactly
        assert_eq!(decoded.get(0).g, 20);
        assert_eq!(decoded.get(15).g, 215);
    }
}

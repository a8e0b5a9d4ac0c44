//! BC3 Block Format
//!
//! A BC3 block is 16 bytes on the wire: a BC4 alpha block at offset 0..8
//! followed by a BC1 color block at offset 8..16. The color block is always
//! in 4-color mode.

use dxt_block_codec_bc1::Bc1Block;
use dxt_block_codec_bc4::Bc4Block;

/// One encoded BC3 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bc3Block {
    /// The alpha half (a BC4 block over the alpha channel).
    pub alpha_block: Bc4Block,
    /// The color half (a BC1 block, 4-color mode).
    pub color_block: Bc1Block,
}

impl Bc3Block {
    /// Size of an encoded block in bytes.
    pub const SIZE: usize = 16;

    /// Creates a block from its two halves.
    pub const fn new(alpha_block: Bc4Block, color_block: Bc1Block) -> Self {
        Self {
            alpha_block,
            color_block,
        }
    }

    /// Serializes the block to its 16-byte little-endian wire form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..8].copy_from_slice(&self.alpha_block.to_bytes());
        bytes[8..].copy_from_slice(&self.color_block.to_bytes());
        bytes
    }

    /// Reads a block from its 16-byte little-endian wire form.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let mut alpha = [0u8; 8];
        let mut color = [0u8; 8];
        alpha.copy_from_slice(&bytes[..8]);
        color.copy_from_slice(&bytes[8..]);
        Self {
            alpha_block: Bc4Block::from_bytes(alpha),
            color_block: Bc1Block::from_bytes(color),
        }
    }
}

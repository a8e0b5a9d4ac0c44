//! BC5 Block Format
//!
//! A BC5 block is 16 bytes on the wire: two BC4 blocks concatenated, one per
//! encoded channel.

use dxt_block_codec_bc4::Bc4Block;

/// One encoded BC5 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bc5Block {
    /// The first channel's BC4 block.
    pub chan0_block: Bc4Block,
    /// The second channel's BC4 block.
    pub chan1_block: Bc4Block,
}

impl Bc5Block {
    /// Size of an encoded block in bytes.
    pub const SIZE: usize = 16;

    /// Creates a block from its two halves.
    pub const fn new(chan0_block: Bc4Block, chan1_block: Bc4Block) -> Self {
        Self {
            chan0_block,
            chan1_block,
        }
    }

    /// Serializes the block to its 16-byte little-endian wire form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..8].copy_from_slice(&self.chan0_block.to_bytes());
        bytes[8..].copy_from_slice(&self.chan1_block.to_bytes());
        bytes
    }

    /// Reads a block from its 16-byte little-endian wire form.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let mut chan0 = [0u8; 8];
        let mut chan1 = [0u8; 8];
        chan0.copy_from_slice(&bytes[..8]);
        chan1.copy_from_slice(&bytes[8..]);
        Self {
            chan0_block: Bc4Block::from_bytes(chan0),
            chan1_block: Bc4Block::from_bytes(chan1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        let block = Bc5Block::new(
            Bc4Block::new(255, 0, [[0, 1, 2, 3]; 4]),
            Bc4Block::new(7, 3, [[4, 5, 6, 7]; 4]),
        );
        let bytes = block.to_bytes();
        assert_eq!(bytes[0], 255);
        assert_eq!(bytes[8], 7);
        assert_eq!(Bc5Block::from_bytes(bytes), block);
    }
}

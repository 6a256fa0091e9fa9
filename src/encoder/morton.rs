//! Z-order interleave of tile indices and the block number derived from it.

use super::BLOCK_COUNT;
use crate::models::TileIndex;

/// Spread the low 16 bits of `n` into the even bit positions
pub fn part1by1(n: u32) -> u32 {
    let mut n = n & 0x0000_ffff;
    n = (n ^ (n << 8)) & 0x00ff_00ff;
    n = (n ^ (n << 4)) & 0x0f0f_0f0f;
    n = (n ^ (n << 2)) & 0x3333_3333;
    n = (n ^ (n << 1)) & 0x5555_5555;
    n
}

/// Interleave: x in even bits, y in odd bits. Inputs are masked to 16 bits,
/// so tiles 65536 apart on an axis share a code.
pub fn morton(x: u32, y: u32) -> u32 {
    (part1by1(y) << 1) | part1by1(x)
}

/// Morton code of a tile; indices are wrapped two's-complement to 32 bits first
pub fn tile_morton(tile: &TileIndex) -> u32 {
    morton(tile.x as u32, tile.y as u32)
}

/// Block number in 1..=BLOCK_COUNT
pub fn block_number(tile: &TileIndex) -> u32 {
    tile_morton(tile) % BLOCK_COUNT + 1
}

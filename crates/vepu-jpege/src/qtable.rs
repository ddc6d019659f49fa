//! # Quantization Table Packing
//!
//! The encoder reads its quantization tables column-pair interleaved rather
//! than in the natural order the file header advertises. Each table is
//! reordered through [`QP_REORDER_TABLE`] and packed four entries per word,
//! first entry in the most significant byte.

use crate::regs::QTABLE_WORDS;

/// Natural-order index of the entry the hardware expects at each position
#[rustfmt::skip]
pub const QP_REORDER_TABLE: [u8; 64] = [
    0,  8, 16, 24,  1,  9, 17, 25, 32, 40, 48, 56, 33, 41, 49, 57,
    2, 10, 18, 26,  3, 11, 19, 27, 34, 42, 50, 58, 35, 43, 51, 59,
    4, 12, 20, 28,  5, 13, 21, 29, 36, 44, 52, 60, 37, 45, 53, 61,
    6, 14, 22, 30,  7, 15, 23, 31, 38, 46, 54, 62, 39, 47, 55, 63,
];

/// Pack a natural-order table into hardware words
pub fn pack_qtable(table: &[u8; 64]) -> [u32; QTABLE_WORDS] {
    let mut words = [0u32; QTABLE_WORDS];

    for (word, order) in words.iter_mut().zip(QP_REORDER_TABLE.chunks_exact(4)) {
        *word = order
            .iter()
            .fold(0u32, |acc, &idx| (acc << 8) | table[idx as usize] as u32);
    }

    words
}

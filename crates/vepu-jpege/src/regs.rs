//! # VEPU1 Control Block
//!
//! The JPEG encoder is programmed through a flat block of 164 32-bit words.
//! Software fills the block, the driver copies it into the encoder's
//! register file, and after completion the driver copies the register file
//! back so status and output size can be read from the same block.
//!
//! ## Word Map
//!
//! ```text
//! Word   Field
//! ──────────────────────────────────────────────────────
//! 1      Interrupt / status
//! 2      Bus configuration and byte swapping
//! 5      Output stream base (descriptor + byte offset << 10)
//! 11-13  Input luma / Cb / Cr plane bases
//! 14     Encoder control (macroblock grid, mode, enable)
//! 15     Input control (row length, fill, format)
//! 22-23  Stream header remainder (up to 7 bytes)
//! 24     Output buffer limit / produced size
//! 37     Stream start bit offset
//! 53-55  RGB to YUV coefficients and channel masks
//! 64-79  Luma quantization table
//! 80-95  Chroma quantization table
//! ──────────────────────────────────────────────────────
//! ```
//!
//! Unlisted words are written as zero.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use vepu_core::{Error, Result};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Number of words in the control block
pub const NUM_REGS: usize = 164;

/// Words per quantization table (64 one-byte entries, four per word)
pub const QTABLE_WORDS: usize = 16;

// =============================================================================
// WORD INDICES
// =============================================================================

/// Named control-block words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Reg {
    /// Interrupt and completion status
    Status          = 1,
    /// Bus burst and swap configuration
    AxiConfig       = 2,
    /// Output stream base
    OutputBase      = 5,
    /// Input luma plane base
    InputLuma       = 11,
    /// Input Cb plane base
    InputCb         = 12,
    /// Input Cr plane base
    InputCr         = 13,
    /// Encoder control
    EncCtrl         = 14,
    /// Input control
    InputCtrl       = 15,
    /// First four header remainder bytes
    StrmHeaderRem0  = 22,
    /// Next three header remainder bytes
    StrmHeaderRem1  = 23,
    /// Free output bytes on submit, produced bits on completion
    StrmBufLimit    = 24,
    /// Valid bits in the header remainder
    StrmStartOffset = 37,
    /// Coefficients A and B
    RgbCoeffAb      = 53,
    /// Coefficients C and E
    RgbCoeffCe      = 54,
    /// Channel masks and coefficient F
    RgbMaskCoeffF   = 55,
    /// Start of the luma quantization table
    QtableLuma      = 64,
    /// Start of the chroma quantization table
    QtableChroma    = 80,
}

impl Reg {
    /// Word index
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Quantization table selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QTable {
    /// Luma table
    Luma,
    /// Chroma table
    Chroma,
}

impl QTable {
    const fn base(self) -> Reg {
        match self {
            Self::Luma => Reg::QtableLuma,
            Self::Chroma => Reg::QtableChroma,
        }
    }
}

static_assertions::const_assert!(Reg::RgbMaskCoeffF.index() < Reg::QtableLuma.index());
static_assertions::const_assert_eq!(
    Reg::QtableLuma.index() + QTABLE_WORDS,
    Reg::QtableChroma.index()
);
static_assertions::const_assert!(Reg::QtableChroma.index() + QTABLE_WORDS <= NUM_REGS);
static_assertions::const_assert_eq!(core::mem::size_of::<[u32; NUM_REGS]>(), 656);

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// Helper to extract fields from register values
pub const fn extract_field(value: u32, low_bit: u8, high_bit: u8) -> u32 {
    let mask = field_mask(low_bit, high_bit);
    (value & mask) >> low_bit
}

/// Helper to insert field into register value
pub const fn insert_field(value: u32, field: u32, low_bit: u8, high_bit: u8) -> u32 {
    let mask = field_mask(low_bit, high_bit);
    (value & !mask) | ((field << low_bit) & mask)
}

const fn field_mask(low_bit: u8, high_bit: u8) -> u32 {
    let width = (high_bit - low_bit + 1) as u32;
    let ones = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
    ones << low_bit
}

// =============================================================================
// ENCODER CONTROL (WORD 14)
// =============================================================================

/// Encoder control word layout
pub mod enc_ctrl {
    //! Word 14 fields

    /// Timeout interrupt enable
    pub const TIMEOUT_INT: u32 = 1 << 31;
    /// Picture width in macroblocks, bits 28..19
    pub const MB_WIDTH: (u8, u8) = (19, 28);
    /// Picture height in macroblocks, bits 18..10
    pub const MB_HEIGHT: (u8, u8) = (10, 18);
    /// Intra picture
    pub const PIC_INTRA: u32 = 1 << 3;
    /// Encoding mode, bits 2..1
    pub const MODE: (u8, u8) = (1, 2);
    /// JPEG encoding mode value
    pub const MODE_JPEG: u32 = 2;
    /// Encoder enable
    pub const ENABLE: u32 = 1 << 0;
}

/// Pack word 14 for a 16-aligned picture of `aligned_w` x `aligned_h`
pub const fn pack_enc_ctrl(aligned_w: u32, aligned_h: u32) -> u32 {
    let mut v = enc_ctrl::TIMEOUT_INT | enc_ctrl::PIC_INTRA | enc_ctrl::ENABLE;
    v = insert_field(v, aligned_w >> 4, enc_ctrl::MB_WIDTH.0, enc_ctrl::MB_WIDTH.1);
    v = insert_field(v, aligned_h >> 4, enc_ctrl::MB_HEIGHT.0, enc_ctrl::MB_HEIGHT.1);
    insert_field(v, enc_ctrl::MODE_JPEG, enc_ctrl::MODE.0, enc_ctrl::MODE.1)
}

// =============================================================================
// INPUT CONTROL (WORD 15)
// =============================================================================

/// Input control word layout
pub mod input_ctrl {
    //! Word 15 fields

    /// Luma row length in pixels, bits 25..12
    pub const ROW_LENGTH: (u8, u8) = (12, 25);
    /// Right fill in 4-pixel units, bits 11..10
    pub const X_FILL: (u8, u8) = (10, 11);
    /// Bottom fill in rows, bits 9..6
    pub const Y_FILL: (u8, u8) = (6, 9);
    /// Input format code, bits 5..2
    pub const FORMAT: (u8, u8) = (2, 5);
    /// Largest representable right fill
    pub const X_FILL_MAX: u32 = 3;
}

/// Pack word 15
pub const fn pack_input_ctrl(row_length: u32, x_fill: u32, y_fill: u32, format: u32) -> u32 {
    use input_ctrl::*;

    let mut v = insert_field(0, row_length, ROW_LENGTH.0, ROW_LENGTH.1);
    v = insert_field(v, x_fill, X_FILL.0, X_FILL.1);
    v = insert_field(v, y_fill, Y_FILL.0, Y_FILL.1);
    insert_field(v, format, FORMAT.0, FORMAT.1)
}

// =============================================================================
// CONTROL BLOCK
// =============================================================================

/// The 164-word control block exchanged with the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    words: Box<[u32; NUM_REGS]>,
}

impl ControlBlock {
    /// Allocate a zeroed control block
    pub fn try_new() -> Result<Self> {
        let mut words = Vec::new();
        words
            .try_reserve_exact(NUM_REGS)
            .map_err(|_| Error::AllocationFailed)?;
        words.resize(NUM_REGS, 0u32);

        let words: Box<[u32; NUM_REGS]> = words
            .into_boxed_slice()
            .try_into()
            .map_err(|_| Error::AllocationFailed)?;

        Ok(Self { words })
    }

    /// Zero every word
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Words in index order
    pub fn as_slice(&self) -> &[u32] {
        &self.words[..]
    }

    /// Mutable words in index order
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.words[..]
    }

    /// Word at raw index
    pub fn word(&self, idx: usize) -> u32 {
        self.words[idx]
    }

    /// Packed quantization table words
    pub fn qtable(&self, table: QTable) -> &[u32] {
        let base = table.base().index();
        &self.words[base..base + QTABLE_WORDS]
    }

    /// Mutable packed quantization table words
    pub fn qtable_mut(&mut self, table: QTable) -> &mut [u32] {
        let base = table.base().index();
        &mut self.words[base..base + QTABLE_WORDS]
    }

    // -------------------------------------------------------------------------
    // Field decoders
    // -------------------------------------------------------------------------

    /// Picture width in macroblocks
    pub fn mb_width(&self) -> u32 {
        let (lo, hi) = enc_ctrl::MB_WIDTH;
        extract_field(self[Reg::EncCtrl], lo, hi)
    }

    /// Picture height in macroblocks
    pub fn mb_height(&self) -> u32 {
        let (lo, hi) = enc_ctrl::MB_HEIGHT;
        extract_field(self[Reg::EncCtrl], lo, hi)
    }

    /// Check if the encoder enable bit is set
    pub fn is_enabled(&self) -> bool {
        self[Reg::EncCtrl] & enc_ctrl::ENABLE != 0
    }

    /// Luma row length in pixels
    pub fn row_length(&self) -> u32 {
        let (lo, hi) = input_ctrl::ROW_LENGTH;
        extract_field(self[Reg::InputCtrl], lo, hi)
    }

    /// Right fill in 4-pixel units
    pub fn x_fill(&self) -> u32 {
        let (lo, hi) = input_ctrl::X_FILL;
        extract_field(self[Reg::InputCtrl], lo, hi)
    }

    /// Bottom fill in rows
    pub fn y_fill(&self) -> u32 {
        let (lo, hi) = input_ctrl::Y_FILL;
        extract_field(self[Reg::InputCtrl], lo, hi)
    }

    /// Input format code
    pub fn format_code(&self) -> u32 {
        let (lo, hi) = input_ctrl::FORMAT;
        extract_field(self[Reg::InputCtrl], lo, hi)
    }

    /// Log every non-zero word
    pub fn dump(&self) {
        for (idx, val) in self.words.iter().enumerate().filter(|(_, v)| **v != 0) {
            log::trace!("reg[{:03}] {:08x}", idx, val);
        }
    }
}

impl Index<Reg> for ControlBlock {
    type Output = u32;

    fn index(&self, reg: Reg) -> &u32 {
        &self.words[reg.index()]
    }
}

impl IndexMut<Reg> for ControlBlock {
    fn index_mut(&mut self, reg: Reg) -> &mut u32 {
        &mut self.words[reg.index()]
    }
}

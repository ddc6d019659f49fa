//! # Input Format Dispatch
//!
//! Maps framework frame formats onto the encoder's input format codes, the
//! RGB channel bit positions, and the byte swapping the bus needs to present
//! pixels in the order the encoder reads them.

use vepu_core::FrameFormat;

// =============================================================================
// HARDWARE INPUT FORMAT
// =============================================================================

/// Encoder input format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HwFormat {
    /// YUV 4:2:0 planar
    Yuv420Planar     = 0,
    /// YUV 4:2:0 semi-planar
    Yuv420SemiPlanar = 1,
    /// Packed YUYV 4:2:2
    Yuyv422          = 2,
    /// Packed UYVY 4:2:2
    Uyvy422          = 3,
    /// 16-bit RGB 5:6:5
    Rgb565           = 4,
    /// 16-bit RGB 4:4:4
    Rgb444           = 5,
    /// 24-bit RGB, either channel order
    Rgb888           = 7,
    /// 32-bit RGB 10:10:10
    Rgb101010        = 8,
}

impl HwFormat {
    /// Raw code written to the input control word
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

// =============================================================================
// FORMAT INFO
// =============================================================================

/// Hardware view of one input format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Input format code
    pub hw: HwFormat,
    /// Most significant bit position of red within a pixel
    pub r_mask: u32,
    /// Most significant bit position of green within a pixel
    pub g_mask: u32,
    /// Most significant bit position of blue within a pixel
    pub b_mask: u32,
}

impl FormatInfo {
    const fn unmasked(hw: HwFormat) -> Self {
        Self::rgb(hw, 0, 0, 0)
    }

    const fn rgb(hw: HwFormat, r_mask: u32, g_mask: u32, b_mask: u32) -> Self {
        Self {
            hw,
            r_mask,
            g_mask,
            b_mask,
        }
    }

    /// Fallback used for formats the encoder cannot read
    pub const FALLBACK: Self = Self::unmasked(HwFormat::Yuv420Planar);
}

/// Hardware description of `fmt`, `None` if the encoder cannot read it
pub fn format_info(fmt: FrameFormat) -> Option<FormatInfo> {
    let info = match fmt {
        FrameFormat::Yuv420p => FormatInfo::unmasked(HwFormat::Yuv420Planar),
        FrameFormat::Yuv420sp => FormatInfo::unmasked(HwFormat::Yuv420SemiPlanar),
        FrameFormat::Yuv422Yuyv => FormatInfo::unmasked(HwFormat::Yuyv422),
        FrameFormat::Yuv422Uyvy => FormatInfo::unmasked(HwFormat::Uyvy422),
        FrameFormat::Rgb565 => FormatInfo::rgb(HwFormat::Rgb565, 4, 10, 15),
        FrameFormat::Rgb444 => FormatInfo::rgb(HwFormat::Rgb444, 3, 7, 11),
        FrameFormat::Rgb888 => FormatInfo::rgb(HwFormat::Rgb888, 7, 15, 23),
        FrameFormat::Bgr888 => FormatInfo::rgb(HwFormat::Rgb888, 23, 15, 7),
        FrameFormat::Rgb101010 => FormatInfo::unmasked(HwFormat::Rgb101010),
        _ => return None,
    };

    Some(info)
}

// =============================================================================
// BUS CONFIGURATION (WORD 2)
// =============================================================================

bitflags::bitflags! {
    /// Bus configuration bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AxiConfig: u32 {
        /// Swap 16-bit halves of output words
        const OUTPUT_SWAP16 = 1 << 15;
        /// Swap 16-bit halves of input words
        const INPUT_SWAP16 = 1 << 14;
        /// Burst length field, bits 13..8
        const BURST_LEN = 0x3F << 8;
        /// Clock gating
        const CLOCK_GATING = 1 << 4;
        /// Swap 32-bit halves of output words
        const OUTPUT_SWAP32 = 1 << 3;
        /// Swap bytes of input words
        const INPUT_SWAP8 = 1 << 2;
        /// Swap bytes of output words
        const OUTPUT_SWAP8 = 1 << 1;
        /// Swap 32-bit halves of input words
        const INPUT_SWAP32 = 1 << 0;
    }
}

/// AXI burst length used for every frame
pub const BURST_LENGTH: u32 = 16;

/// Word 2 for an input format code
pub fn axi_config(code: u32) -> u32 {
    let base = AxiConfig::OUTPUT_SWAP16
        | AxiConfig::CLOCK_GATING
        | AxiConfig::OUTPUT_SWAP32
        | AxiConfig::OUTPUT_SWAP8;

    let input = if code < HwFormat::Rgb565.code() {
        AxiConfig::INPUT_SWAP16 | AxiConfig::INPUT_SWAP8 | AxiConfig::INPUT_SWAP32
    } else if code < HwFormat::Rgb888.code() {
        AxiConfig::INPUT_SWAP16
    } else {
        AxiConfig::empty()
    };

    (base | input).bits() | ((BURST_LENGTH << 8) & AxiConfig::BURST_LEN.bits())
}

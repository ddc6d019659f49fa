//! # VEPU Core Types
//!
//! Fundamental type definitions shared by the encoder HALs.
//!
//! These types provide:
//! - The frame format vocabulary with its raw framework codes
//! - Color conversion selection and fixed-point coefficients
//! - Per-frame encode parameters
//! - Device configuration and driver protocol identification

use core::fmt;

// =============================================================================
// ALIGNMENT
// =============================================================================

/// Round `value` up to a multiple of `align` (power of two), wrapping on overflow
#[inline]
pub const fn align_up(value: u32, align: u32) -> u32 {
    let mask = align - 1;
    value.wrapping_add(mask) & !mask
}

/// Round `value` up to a multiple of `align` (power of two)
///
/// Returns `None` if the result does not fit in a `u32`.
#[inline]
pub const fn checked_align_up(value: u32, align: u32) -> Option<u32> {
    let mask = align - 1;
    match value.checked_add(mask) {
        Some(v) => Some(v & !mask),
        None => None,
    }
}

// =============================================================================
// FRAME FORMAT
// =============================================================================

/// Base code of the RGB family
const FMT_RGB_BASE: u32 = 0x10000;

/// Input frame pixel layout
///
/// Every known layout maps to its raw framework code. Codes this stack does
/// not know are carried through as [`FrameFormat::Other`] so the HAL can
/// degrade them instead of the caller having to reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameFormat {
    /// YUV 4:2:0, Y plane + interleaved UV plane
    #[default]
    Yuv420sp,
    /// 10-bit YUV 4:2:0 semi-planar
    Yuv420sp10Bit,
    /// YUV 4:2:2, Y plane + interleaved UV plane
    Yuv422sp,
    /// 10-bit YUV 4:2:2 semi-planar
    Yuv422sp10Bit,
    /// YUV 4:2:0, three planes
    Yuv420p,
    /// YUV 4:2:0, Y plane + interleaved VU plane
    Yuv420spVu,
    /// YUV 4:2:2, three planes
    Yuv422p,
    /// YUV 4:2:2, Y plane + interleaved VU plane
    Yuv422spVu,
    /// Packed YUV 4:2:2, Y0 U0 Y1 V0
    Yuv422Yuyv,
    /// Packed YUV 4:2:2, Y0 V0 Y1 U0
    Yuv422Yvyu,
    /// Packed YUV 4:2:2, U0 Y0 V0 Y1
    Yuv422Uyvy,
    /// Packed YUV 4:2:2, V0 Y0 U0 Y1
    Yuv422Vyuy,
    /// Luma only
    Yuv400,
    /// YUV 4:4:0 semi-planar
    Yuv440sp,
    /// YUV 4:1:1 semi-planar
    Yuv411sp,
    /// YUV 4:4:4 semi-planar
    Yuv444sp,
    /// 16-bit RGB 5:6:5
    Rgb565,
    /// 16-bit BGR 5:6:5
    Bgr565,
    /// 16-bit RGB 5:5:5
    Rgb555,
    /// 16-bit BGR 5:5:5
    Bgr555,
    /// 16-bit RGB 4:4:4
    Rgb444,
    /// 16-bit BGR 4:4:4
    Bgr444,
    /// 24-bit RGB
    Rgb888,
    /// 24-bit BGR
    Bgr888,
    /// 32-bit RGB 10:10:10
    Rgb101010,
    /// 32-bit BGR 10:10:10
    Bgr101010,
    /// 32-bit ARGB
    Argb8888,
    /// 32-bit ABGR
    Abgr8888,
    /// Raw code this stack does not know
    Other(u32),
}

impl FrameFormat {
    #[rustfmt::skip]
    const CODES: [(FrameFormat, u32); 28] = [
        (Self::Yuv420sp,      0x0),
        (Self::Yuv420sp10Bit, 0x1),
        (Self::Yuv422sp,      0x2),
        (Self::Yuv422sp10Bit, 0x3),
        (Self::Yuv420p,       0x4),
        (Self::Yuv420spVu,    0x5),
        (Self::Yuv422p,       0x6),
        (Self::Yuv422spVu,    0x7),
        (Self::Yuv422Yuyv,    0x8),
        (Self::Yuv422Yvyu,    0x9),
        (Self::Yuv422Uyvy,    0xA),
        (Self::Yuv422Vyuy,    0xB),
        (Self::Yuv400,        0xC),
        (Self::Yuv440sp,      0xD),
        (Self::Yuv411sp,      0xE),
        (Self::Yuv444sp,      0xF),
        (Self::Rgb565,        FMT_RGB_BASE),
        (Self::Bgr565,        FMT_RGB_BASE + 1),
        (Self::Rgb555,        FMT_RGB_BASE + 2),
        (Self::Bgr555,        FMT_RGB_BASE + 3),
        (Self::Rgb444,        FMT_RGB_BASE + 4),
        (Self::Bgr444,        FMT_RGB_BASE + 5),
        (Self::Rgb888,        FMT_RGB_BASE + 6),
        (Self::Bgr888,        FMT_RGB_BASE + 7),
        (Self::Rgb101010,     FMT_RGB_BASE + 8),
        (Self::Bgr101010,     FMT_RGB_BASE + 9),
        (Self::Argb8888,      FMT_RGB_BASE + 10),
        (Self::Abgr8888,      FMT_RGB_BASE + 11),
    ];

    /// Decode a raw framework code
    pub fn from_raw(raw: u32) -> Self {
        Self::CODES
            .iter()
            .find(|(_, code)| *code == raw)
            .map_or(Self::Other(raw), |(fmt, _)| *fmt)
    }

    /// Raw framework code
    pub fn raw(self) -> u32 {
        match self {
            Self::Other(raw) => raw,
            known => Self::CODES
                .iter()
                .find(|(fmt, _)| *fmt == known)
                .map_or(0, |(_, code)| *code),
        }
    }

    /// Check if the code is one this stack knows
    #[inline]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Check if this is an RGB family format
    #[inline]
    pub fn is_rgb(self) -> bool {
        self.raw() >= FMT_RGB_BASE
    }

    /// Check if this is a YUV family format
    #[inline]
    pub fn is_yuv(self) -> bool {
        !self.is_rgb()
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(raw) => write!(f, "Unknown(0x{:x})", raw),
            known => write!(f, "{:?}(0x{:x})", known, known.raw()),
        }
    }
}

// =============================================================================
// COLOR CONVERSION
// =============================================================================

/// RGB to YUV conversion selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorConversion {
    /// ITU-R BT.601
    #[default]
    Bt601,
    /// ITU-R BT.709
    Bt709,
    /// Caller-supplied coefficients
    Custom,
    /// Selector value this stack does not know
    Other(u32),
}

impl ColorConversion {
    /// Decode a raw selector
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Bt601,
            1 => Self::Bt709,
            2 => Self::Custom,
            other => Self::Other(other),
        }
    }

    /// Raw selector value
    pub const fn raw(self) -> u32 {
        match self {
            Self::Bt601 => 0,
            Self::Bt709 => 1,
            Self::Custom => 2,
            Self::Other(raw) => raw,
        }
    }
}

/// Fixed-point (2^16) RGB to YUV coefficients
///
/// ```text
/// Y  = A R + B G + C B
/// Cb = E (B - Y) + 128
/// Cr = F (R - Y) + 128
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorCoeffs {
    /// Red weight of luma
    pub a: u16,
    /// Green weight of luma
    pub b: u16,
    /// Blue weight of luma
    pub c: u16,
    /// Cb scale
    pub e: u16,
    /// Cr scale
    pub f: u16,
}

impl ColorCoeffs {
    /// Create a coefficient set
    pub const fn new(a: u16, b: u16, c: u16, e: u16, f: u16) -> Self {
        Self { a, b, c, e, f }
    }
}

// =============================================================================
// ENCODE PARAMETERS
// =============================================================================

/// Per-frame encode parameters supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    /// Picture width in pixels
    pub width: u32,
    /// Picture height in pixels
    pub height: u32,
    /// Padded row length in pixels
    pub hor_stride: u32,
    /// Padded plane height in rows
    pub ver_stride: u32,
    /// Input pixel layout
    pub format: FrameFormat,
    /// RGB to YUV conversion selector
    pub color_conversion: ColorConversion,
    /// Coefficients used with [`ColorConversion::Custom`]
    pub custom_coeffs: ColorCoeffs,
    /// Quantization quality level consumed by the header writer
    pub quality: u32,
}

impl EncodeParams {
    /// Parameters for a picture whose strides equal its size
    pub fn new(width: u32, height: u32, format: FrameFormat) -> Self {
        Self {
            width,
            height,
            hor_stride: width,
            ver_stride: height,
            format,
            ..Self::default()
        }
    }

    /// Set the padded strides
    pub fn with_stride(mut self, hor_stride: u32, ver_stride: u32) -> Self {
        self.hor_stride = hor_stride;
        self.ver_stride = ver_stride;
        self
    }
}

// =============================================================================
// QUANTIZATION TABLES
// =============================================================================

/// Luma and chroma quantization tables in natural order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantTables {
    /// Luma table
    pub luma: [u8; 64],
    /// Chroma table
    pub chroma: [u8; 64],
}

impl Default for QuantTables {
    fn default() -> Self {
        Self {
            luma: [1; 64],
            chroma: [1; 64],
        }
    }
}

// =============================================================================
// DEVICE CONFIGURATION
// =============================================================================

/// Kind of work a device context performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtxType {
    /// Decoder context
    Decoder,
    /// Encoder context
    Encoder,
}

/// Video coding standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coding {
    /// Motion JPEG / still JPEG
    Mjpeg,
    /// H.264 / AVC
    Avc,
    /// VP8
    Vp8,
}

bitflags::bitflags! {
    /// Hardware blocks present on a platform
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PlatformCaps: u32 {
        /// First generation video encoder
        const VEPU1 = 1 << 0;
        /// Second generation video encoder
        const VEPU2 = 1 << 1;
        /// First generation video decoder
        const VDPU1 = 1 << 2;
        /// Second generation video decoder
        const VDPU2 = 1 << 3;
        /// Rockchip encoder
        const RKVENC = 1 << 4;
    }
}

/// Parameters used to open a device handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Context type
    pub ctx_type: CtxType,
    /// Coding standard
    pub coding: Coding,
    /// Required hardware block
    pub platform: PlatformCaps,
    /// Enable the post-processor
    pub pp_enable: bool,
}

/// Register submission protocol spoken by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IoctlProtocol {
    /// Patch descriptors appended in-line after the control block
    #[default]
    Legacy,
    /// Patch descriptors sent alongside the control block
    Combined,
}

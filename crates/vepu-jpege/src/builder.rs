//! # Control Block Builder
//!
//! Translates one frame's encode parameters, buffers and file header into
//! the 164-word control block.
//!
//! ## Build Order
//!
//! ```text
//! check strides ─▶ write header ─▶ zero block ─▶ addresses + patches
//!        ─▶ format / geometry ─▶ header remainder ─▶ coefficients
//!        ─▶ quantization tables
//! ```
//!
//! Nothing here fails. Parameters the hardware cannot honor are logged,
//! recorded in [`Degradations`] and replaced by a fixed fallback; the
//! encoder then produces a wrong but deterministic stream.

use vepu_core::{
    checked_align_up, DmaBuffer, EncodeParams, FrameFormat, PatchDescriptor, PreludeWriter,
};

use crate::color::{self, BT601};
use crate::format::{self, FormatInfo};
use crate::qtable::pack_qtable;
use crate::regs::{self, input_ctrl, ControlBlock, QTable, Reg};

// =============================================================================
// DEGRADATIONS
// =============================================================================

bitflags::bitflags! {
    /// Parameter problems replaced by a fallback while building a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Degradations: u32 {
        /// Horizontal stride not a multiple of 8 or vertical stride odd
        const MISALIGNED_STRIDE = 1 << 0;
        /// Right fill larger than the 2-bit field
        const RIGHT_FILL_OVERFLOW = 1 << 1;
        /// Pixel format the encoder cannot read
        const UNSUPPORTED_FORMAT = 1 << 2;
        /// Unknown color conversion selector
        const UNSUPPORTED_COLOR_CONVERSION = 1 << 3;
        /// Width or height too large to round up to a macroblock
        const OVERSIZED_PICTURE = 1 << 4;
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Populate `regs` and `patches` for one frame
///
/// Writes the file header into `output` through `prelude`, then packs every
/// control word from scratch.
pub fn build_control_block<P>(
    regs: &mut ControlBlock,
    patches: &mut PatchDescriptor,
    syntax: &EncodeParams,
    prelude: &mut P,
    input: &dyn DmaBuffer,
    output: &mut dyn DmaBuffer,
) -> Degradations
where
    P: PreludeWriter + ?Sized,
{
    let mut degraded = Degradations::empty();
    let width = syntax.width;
    let height = syntax.height;
    let mut aligned = |size: u32| {
        checked_align_up(size, 16).unwrap_or_else(|| {
            log::error!("illegal resolution, width {}, height {}", width, height);
            degraded |= Degradations::OVERSIZED_PICTURE;
            size
        })
    };
    let aligned_w = aligned(width);
    let aligned_h = aligned(height);

    if (syntax.hor_stride & 0x7) != 0 || (syntax.ver_stride & 0x1) != 0 {
        log::error!(
            "illegal resolution, hor_stride {}, ver_stride {}, width {}, height {}",
            syntax.hor_stride,
            syntax.ver_stride,
            width,
            height
        );
        degraded |= Degradations::MISALIGNED_STRIDE;
    }

    // At most 3 once the width is 16-aligned
    let x_fill = (aligned_w - width) / 4;
    if x_fill > input_ctrl::X_FILL_MAX {
        log::error!(
            "right fill is illegal, hor_stride = {}, width = {}",
            aligned_w,
            width
        );
        degraded |= Degradations::RIGHT_FILL_OVERFLOW;
    }

    // The header writer also selects the quantization tables
    let qtables = prelude.write_header(output.as_mut_slice(), syntax);
    let bit_pos = prelude.bit_pos();
    let byte_pos = bit_pos.div_ceil(8);

    regs.clear();
    let input_fd = input.fd() as u32;
    regs[Reg::InputLuma] = input_fd;
    regs[Reg::InputCb] = input_fd;
    regs[Reg::InputCr] = input_fd;
    set_extra_info(patches, syntax);

    let info = format::format_info(syntax.format).unwrap_or_else(|| {
        log::error!("invalid input format {}", syntax.format);
        degraded |= Degradations::UNSUPPORTED_FORMAT;
        FormatInfo::FALLBACK
    });
    let fmt_code = info.hw.code();

    regs[Reg::AxiConfig] = format::axi_config(fmt_code);
    regs[Reg::OutputBase] = (output.fd() as u32).wrapping_add(byte_pos << 10);
    regs[Reg::EncCtrl] = regs::pack_enc_ctrl(aligned_w, aligned_h);
    regs[Reg::InputCtrl] =
        regs::pack_input_ctrl(syntax.hor_stride, x_fill, aligned_h - height, fmt_code);

    let (rem0, rem1) = header_remainder(output.as_mut_slice(), byte_pos as usize);
    regs[Reg::StrmHeaderRem0] = rem0;
    regs[Reg::StrmHeaderRem1] = rem1;
    regs[Reg::StrmBufLimit] = (output.size() as u32).saturating_sub(byte_pos);
    regs[Reg::StrmStartOffset] = ((byte_pos & 7) * 8) << 23;

    let coeffs = color::coeffs_for(syntax.color_conversion, &syntax.custom_coeffs)
        .unwrap_or_else(|| {
            log::error!(
                "invalid color conversion type {}",
                syntax.color_conversion.raw()
            );
            degraded |= Degradations::UNSUPPORTED_COLOR_CONVERSION;
            BT601
        });

    regs[Reg::RgbCoeffAb] = coeffs.a as u32 | (coeffs.b as u32) << 16;
    regs[Reg::RgbCoeffCe] = coeffs.c as u32 | (coeffs.e as u32) << 16;
    regs[Reg::RgbMaskCoeffF] = (info.r_mask & 0x1f) << 26
        | (info.g_mask & 0x1f) << 21
        | (info.b_mask & 0x1f) << 16
        | coeffs.f as u32;

    regs.qtable_mut(QTable::Luma)
        .copy_from_slice(&pack_qtable(&qtables.luma));
    regs.qtable_mut(QTable::Chroma)
        .copy_from_slice(&pack_qtable(&qtables.chroma));

    degraded
}

/// Record the chroma plane offsets the driver must add to words 12 and 13
pub fn set_extra_info(patches: &mut PatchDescriptor, syntax: &EncodeParams) {
    let luma_size = syntax.hor_stride.wrapping_mul(syntax.ver_stride);

    patches.reset();

    match syntax.format {
        FrameFormat::Yuv420p => {
            patches.add(Reg::InputCb.index() as u32, luma_size);
            patches.add(Reg::InputCr.index() as u32, luma_size.wrapping_mul(5) / 4);
        }
        FrameFormat::Yuv420sp => {
            patches.add(Reg::InputCb.index() as u32, luma_size);
            patches.add(Reg::InputCr.index() as u32, luma_size);
        }
        other => {
            log::debug!("other format({})", other);
        }
    }
}

/// Zero-pad the header tail and pack it into the two remainder words
///
/// `byte_pos` is the first byte after the header. The encoder restarts at
/// the 8-byte boundary below it, so the bytes of that window are handed to
/// it in words 22 and 23 and everything past the header inside the window
/// is cleared.
pub fn header_remainder(buf: &mut [u8], byte_pos: usize) -> (u32, u32) {
    let base = byte_pos & !0x7;
    let left = byte_pos & 0x7;
    let end = base.saturating_add(8).min(buf.len());

    if base + left < end {
        buf[base + left..end].fill(0);
    }

    let byte = |i: usize| buf.get(base + i).copied().unwrap_or(0) as u32;

    let rem0 = byte(0) << 24 | byte(1) << 16 | byte(2) << 8 | byte(3);
    let rem1 = if left > 4 {
        byte(4) << 24 | byte(5) << 16 | byte(6) << 8
    } else {
        0
    };

    (rem0, rem1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::NUM_REGS;
    use crate::testing::{FixedPrelude, HeapBuffer};
    use vepu_core::{align_up, ColorCoeffs, ColorConversion, QuantTables};

    const INPUT_FD: i32 = 10;
    const OUTPUT_FD: i32 = 20;

    struct Frame {
        regs: ControlBlock,
        patches: PatchDescriptor,
        input: HeapBuffer,
        output: HeapBuffer,
    }

    impl Frame {
        fn new() -> Self {
            Self {
                regs: ControlBlock::try_new().unwrap(),
                patches: PatchDescriptor::new(),
                input: HeapBuffer::new(INPUT_FD, 64),
                output: HeapBuffer::filled(OUTPUT_FD, 4096, 0xFF),
            }
        }

        fn build(&mut self, syntax: &EncodeParams, prelude: &mut FixedPrelude) -> Degradations {
            build_control_block(
                &mut self.regs,
                &mut self.patches,
                syntax,
                prelude,
                &self.input,
                &mut self.output,
            )
        }
    }

    fn params_1080p() -> EncodeParams {
        EncodeParams::new(1920, 1080, FrameFormat::Yuv420sp).with_stride(1920, 1088)
    }

    #[test]
    fn test_1080p_nv12_bt601() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(603);
        let degraded = frame.build(&params_1080p(), &mut prelude);
        let regs = &frame.regs;

        assert!(degraded.is_empty());
        assert_eq!(regs.format_code(), 1);
        assert_eq!(regs.x_fill(), 0);
        assert_eq!(regs.y_fill(), 8);
        assert_eq!(regs[Reg::AxiConfig], 0xD01F);
        assert_eq!(regs[Reg::EncCtrl], 0x83C1_100D);
        assert_eq!(regs[Reg::InputCtrl], 0x0078_0204);
        assert_eq!(regs[Reg::RgbCoeffAb], 19589 | 38443 << 16);
        assert_eq!(regs[Reg::RgbCoeffCe], 7504 | 37008 << 16);
        assert_eq!(regs[Reg::RgbMaskCoeffF], 46740);
    }

    #[test]
    fn test_addresses_and_patches() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(603);
        frame.build(&params_1080p(), &mut prelude);
        let regs = &frame.regs;

        assert_eq!(regs[Reg::InputLuma], INPUT_FD as u32);
        assert_eq!(regs[Reg::InputCb], INPUT_FD as u32);
        assert_eq!(regs[Reg::InputCr], INPUT_FD as u32);
        assert_eq!(regs[Reg::OutputBase], OUTPUT_FD as u32 + (603 << 10));
        assert_eq!(frame.patches.offset_of(12), Some(1920 * 1088));
        assert_eq!(frame.patches.offset_of(13), Some(1920 * 1088));
    }

    #[test]
    fn test_planar_patch_offsets() {
        let mut patches = PatchDescriptor::new();
        let syntax = EncodeParams::new(640, 480, FrameFormat::Yuv420p);
        set_extra_info(&mut patches, &syntax);
        assert_eq!(patches.offset_of(12), Some(640 * 480));
        assert_eq!(patches.offset_of(13), Some(640 * 480 * 5 / 4));

        let syntax = EncodeParams::new(640, 480, FrameFormat::Yuv422Yuyv);
        set_extra_info(&mut patches, &syntax);
        assert!(!patches.is_valid());
    }

    #[test]
    fn test_geometry_round_trip() {
        let cases = [
            (1920, 1080, 1920, 1088, FrameFormat::Yuv420sp, 1),
            (640, 480, 640, 480, FrameFormat::Yuv420p, 0),
            (1276, 718, 1280, 720, FrameFormat::Yuv422Uyvy, 3),
            (1000, 1000, 1008, 1008, FrameFormat::Bgr888, 7),
        ];

        for (w, h, hs, vs, fmt, code) in cases {
            let mut frame = Frame::new();
            let mut prelude = FixedPrelude::counting(16);
            let syntax = EncodeParams::new(w, h, fmt).with_stride(hs, vs);
            frame.build(&syntax, &mut prelude);
            let regs = &frame.regs;

            assert_eq!(regs.mb_width() * 16, align_up(w, 16));
            assert_eq!(regs.mb_height() * 16, align_up(h, 16));
            assert_eq!(regs.row_length(), hs);
            assert_eq!(regs.x_fill(), (align_up(w, 16) - w) / 4);
            assert_eq!(regs.y_fill() + h, align_up(h, 16));
            assert_eq!(regs.format_code(), code);
            assert!(regs.is_enabled());
        }
    }

    #[test]
    fn test_header_remainder_short_tail() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(603);
        frame.build(&params_1080p(), &mut prelude);
        let regs = &frame.regs;

        // bytes 600..603 are 0x58 0x59 0x5a
        assert_eq!(regs[Reg::StrmHeaderRem0], 0x5859_5A00);
        assert_eq!(regs[Reg::StrmHeaderRem1], 0);
        assert_eq!(regs[Reg::StrmBufLimit], 4096 - 603);
        assert_eq!(regs[Reg::StrmStartOffset], (3 * 8) << 23);
        assert_eq!(&frame.output.as_slice()[603..608], &[0; 5]);
        assert_eq!(frame.output.as_slice()[608], 0xFF);
    }

    #[test]
    fn test_header_remainder_long_tail() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(606);
        frame.build(&params_1080p(), &mut prelude);
        let regs = &frame.regs;

        assert_eq!(regs[Reg::StrmHeaderRem0], 0x5859_5A5B);
        assert_eq!(regs[Reg::StrmHeaderRem1], 0x5C5D_0000);
        assert_eq!(regs[Reg::StrmStartOffset], (6 * 8) << 23);
    }

    #[test]
    fn test_header_remainder_partial_byte() {
        let mut frame = Frame::new();
        // 4821 bits round up to 603 bytes
        let mut prelude = FixedPrelude::counting(603).with_bits(603 * 8 - 3);
        frame.build(&params_1080p(), &mut prelude);

        assert_eq!(frame.regs[Reg::OutputBase], OUTPUT_FD as u32 + (603 << 10));
        assert_eq!(frame.regs[Reg::StrmHeaderRem0], 0x5859_5A00);
    }

    #[test]
    fn test_header_remainder_window() {
        let mut buf: [u8; 24] = core::array::from_fn(|i| i as u8 + 1);
        assert_eq!(header_remainder(&mut buf, 8), (0, 0));
        assert_eq!(&buf[8..16], &[0; 8]);

        let mut buf: [u8; 24] = core::array::from_fn(|i| i as u8 + 1);
        assert_eq!(header_remainder(&mut buf, 13), (0x090A_0B0C, 0x0D00_0000));

        let mut buf: [u8; 20] = core::array::from_fn(|i| i as u8 + 1);
        assert_eq!(header_remainder(&mut buf, 19), (0x1112_1300, 0));
    }

    #[test]
    fn test_rgb_masks_and_custom_coeffs() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let mut syntax = EncodeParams::new(320, 240, FrameFormat::Rgb565);
        syntax.color_conversion = ColorConversion::Custom;
        syntax.custom_coeffs = ColorCoeffs::new(1, 2, 3, 4, 5);
        frame.build(&syntax, &mut prelude);
        let regs = &frame.regs;

        assert_eq!(regs[Reg::RgbCoeffAb], 0x0002_0001);
        assert_eq!(regs[Reg::RgbCoeffCe], 0x0004_0003);
        assert_eq!(regs[Reg::RgbMaskCoeffF], 4 << 26 | 10 << 21 | 15 << 16 | 5);
        assert_eq!(regs[Reg::AxiConfig], 0xD01A);
        assert!(!frame.patches.is_valid());
    }

    #[test]
    fn test_bt709() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let mut syntax = EncodeParams::new(320, 240, FrameFormat::Bgr888);
        syntax.color_conversion = ColorConversion::Bt709;
        frame.build(&syntax, &mut prelude);

        assert_eq!(frame.regs[Reg::RgbCoeffAb], 13933 | 46871 << 16);
        assert_eq!(frame.regs[Reg::RgbCoeffCe], 4732 | 35317 << 16);
        assert_eq!(
            frame.regs[Reg::RgbMaskCoeffF],
            23 << 26 | 15 << 21 | 7 << 16 | 41615
        );
    }

    #[test]
    fn test_unsupported_format_degrades() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let syntax = EncodeParams::new(320, 240, FrameFormat::Yuv422p);
        let degraded = frame.build(&syntax, &mut prelude);

        assert_eq!(degraded, Degradations::UNSUPPORTED_FORMAT);
        assert_eq!(frame.regs.format_code(), 0);
        assert_eq!(frame.regs[Reg::RgbMaskCoeffF] >> 16, 0);
        assert_eq!(frame.regs[Reg::AxiConfig], 0xD01F);
    }

    #[test]
    fn test_unknown_format_code_degrades() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let syntax = EncodeParams::new(320, 240, FrameFormat::from_raw(0x2_0000));
        let degraded = frame.build(&syntax, &mut prelude);

        assert_eq!(degraded, Degradations::UNSUPPORTED_FORMAT);
        assert_eq!(frame.regs.format_code(), 0);
        assert!(!frame.patches.is_valid());
    }

    #[test]
    fn test_oversized_picture_is_not_fatal() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let syntax = EncodeParams::new(u32::MAX - 3, 16, FrameFormat::Yuv420sp);
        let degraded = frame.build(&syntax, &mut prelude);

        assert!(degraded.contains(Degradations::OVERSIZED_PICTURE));
        assert_eq!(frame.regs.x_fill(), 0);
        assert_eq!(frame.regs.y_fill(), 0);
        assert_eq!(frame.regs.mb_height(), 1);
        assert!(frame.regs.is_enabled());

        let syntax = EncodeParams::new(64, u32::MAX, FrameFormat::Yuv420sp).with_stride(64, 64);
        let degraded = frame.build(&syntax, &mut prelude);
        assert_eq!(degraded, Degradations::OVERSIZED_PICTURE);
        assert_eq!(frame.regs.y_fill(), 0);
    }

    #[test]
    fn test_right_fill_fits_field() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);

        for w in (1..=64).chain([1921, 4095, u32::MAX - 16]) {
            let syntax = EncodeParams::new(w, 16, FrameFormat::Yuv420sp).with_stride(4096, 16);
            let degraded = frame.build(&syntax, &mut prelude);

            assert!(!degraded.contains(Degradations::RIGHT_FILL_OVERFLOW), "width {}", w);
            assert!(frame.regs.x_fill() <= input_ctrl::X_FILL_MAX);
            assert_eq!(frame.regs.x_fill(), (align_up(w, 16) - w) / 4);
        }
    }

    #[test]
    fn test_header_end_at_max_bit_pos() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16).with_bits(u32::MAX);
        frame.build(&params_1080p(), &mut prelude);

        assert_eq!(frame.regs[Reg::StrmBufLimit], 0);
        assert_eq!(frame.regs[Reg::StrmStartOffset], 0);
    }

    #[test]
    fn test_unsupported_color_conversion_degrades() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let mut syntax = EncodeParams::new(320, 240, FrameFormat::Yuv420sp);
        syntax.color_conversion = ColorConversion::Other(5);
        let degraded = frame.build(&syntax, &mut prelude);

        assert_eq!(degraded, Degradations::UNSUPPORTED_COLOR_CONVERSION);
        assert_eq!(frame.regs[Reg::RgbCoeffAb], 19589 | 38443 << 16);
    }

    #[test]
    fn test_misaligned_stride_is_not_fatal() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        let syntax = EncodeParams::new(100, 75, FrameFormat::Yuv420sp).with_stride(100, 75);
        let degraded = frame.build(&syntax, &mut prelude);

        assert_eq!(degraded, Degradations::MISALIGNED_STRIDE);
        assert_eq!(frame.regs.row_length(), 100);
        assert_eq!(frame.regs.x_fill(), 3);
        assert_eq!(frame.regs.y_fill(), 5);
    }

    #[test]
    fn test_quant_tables_packed() {
        let mut frame = Frame::new();
        let tables = QuantTables {
            luma: core::array::from_fn(|i| i as u8),
            chroma: core::array::from_fn(|i| 64 + i as u8),
        };
        let mut prelude = FixedPrelude::counting(16).with_tables(tables);
        frame.build(&params_1080p(), &mut prelude);

        assert_eq!(frame.regs.qtable(QTable::Luma), &pack_qtable(&tables.luma)[..]);
        assert_eq!(frame.regs.qtable(QTable::Chroma), &pack_qtable(&tables.chroma)[..]);
        assert_eq!(frame.regs.word(64), 0x0008_1018);
        assert_eq!(frame.regs.word(80), 0x4048_5058);
    }

    #[test]
    fn test_rebuild_clears_stale_words() {
        let mut frame = Frame::new();
        let mut prelude = FixedPrelude::counting(16);
        frame.regs.as_mut_slice()[NUM_REGS - 1] = 0xFFFF_FFFF;
        frame.regs[Reg::Status] = 0x70;
        frame.build(&params_1080p(), &mut prelude);

        assert_eq!(frame.regs.word(NUM_REGS - 1), 0);
        assert_eq!(frame.regs[Reg::Status], 0);
    }
}

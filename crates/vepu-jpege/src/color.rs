//! # RGB to YUV Conversion
//!
//! Fixed-point (2^16) coefficient presets for RGB input.

use vepu_core::{ColorCoeffs, ColorConversion};

/// ITU-R BT.601
///
/// ```text
/// Y  = 0.2989 R + 0.5866 G + 0.1145 B
/// Cb = 0.5647 (B - Y) + 128
/// Cr = 0.7132 (R - Y) + 128
/// ```
pub const BT601: ColorCoeffs = ColorCoeffs::new(19589, 38443, 7504, 37008, 46740);

/// ITU-R BT.709
///
/// ```text
/// Y  = 0.2126 R + 0.7152 G + 0.0722 B
/// Cb = 0.5389 (B - Y) + 128
/// Cr = 0.6350 (R - Y) + 128
/// ```
pub const BT709: ColorCoeffs = ColorCoeffs::new(13933, 46871, 4732, 35317, 41615);

/// Coefficients for a selector, `None` if the selector is unknown
pub fn coeffs_for(conv: ColorConversion, custom: &ColorCoeffs) -> Option<ColorCoeffs> {
    match conv {
        ColorConversion::Bt601 => Some(BT601),
        ColorConversion::Bt709 => Some(BT709),
        ColorConversion::Custom => Some(*custom),
        ColorConversion::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_match_ratios() {
        // 0.2989 * 65536, 0.7132 * 65536
        assert_eq!(BT601.a, 19589);
        assert_eq!(BT601.f, 46740);
        // 0.2126 * 65536
        assert_eq!(BT709.a, 13933);
    }

    #[test]
    fn test_selector_lookup() {
        let custom = ColorCoeffs::new(1, 2, 3, 4, 5);
        assert_eq!(coeffs_for(ColorConversion::Bt601, &custom), Some(BT601));
        assert_eq!(coeffs_for(ColorConversion::Bt709, &custom), Some(BT709));
        assert_eq!(coeffs_for(ColorConversion::Custom, &custom), Some(custom));
        assert_eq!(coeffs_for(ColorConversion::Other(7), &custom), None);
    }
}

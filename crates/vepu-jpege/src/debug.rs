//! # Debug Tracing
//!
//! Opt-in tracing of the HAL stages, selected by [`DebugFlags`].

bitflags::bitflags! {
    /// Debug trace categories
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DebugFlags: u32 {
        /// Stage enter/leave
        const FUNC = 1 << 0;
        /// Ingested encode parameters
        const INPUT = 1 << 1;
        /// Hardware status and stream length
        const OUTPUT = 1 << 2;
        /// Non-zero control-block words before submission
        const REGS = 1 << 3;
    }
}

/// Environment variable holding extra debug flags
pub const DEBUG_ENV: &str = "VEPU_JPEGE_DEBUG";

impl DebugFlags {
    /// Parse a decimal or `0x`-prefixed hex flag value
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let bits = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => s.parse::<u32>().ok()?,
        };
        Some(Self::from_bits_truncate(bits))
    }

    /// Flags from [`DEBUG_ENV`], empty if unset or malformed
    #[cfg(feature = "std")]
    pub fn from_env() -> Self {
        std::env::var(DEBUG_ENV)
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Log at debug level when `$flag` is enabled in `$flags`
macro_rules! jpege_dbg {
    ($flags:expr, $flag:ident, $($arg:tt)+) => {
        if $flags.contains($crate::debug::DebugFlags::$flag) {
            log::debug!($($arg)+);
        }
    };
}

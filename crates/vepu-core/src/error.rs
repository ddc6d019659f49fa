//! # VEPU Error Handling
//!
//! Error types for the encoder HAL stack.
//!
//! Only conditions that abort the current call are errors. Parameter
//! problems the hardware can still run with (odd strides, unsupported pixel
//! formats, unknown color conversion selectors) are logged and degraded by
//! the HALs instead of being reported here.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// VEPU Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// VEPU unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Device Errors
    // =========================================================================
    /// The device driver rejected or failed an operation
    Device(DeviceError),

    // =========================================================================
    // Memory Errors
    // =========================================================================
    /// Control block or submission buffer allocation failed
    AllocationFailed,

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,
    /// The context has been torn down
    NotInitialized,
}

impl Error {
    /// Device open/send/wait failure
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device(_))
    }

    /// Allocation failure
    pub fn is_allocation(&self) -> bool {
        matches!(self, Self::AllocationFailed)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(e) => write!(f, "device error: {}", e),
            Self::AllocationFailed => write!(f, "allocation failed"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::NotInitialized => write!(f, "context not initialized"),
        }
    }
}

// =============================================================================
// SUB-ERROR TYPES
// =============================================================================

/// Device driver error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Device node could not be opened for the requested coding
    OpenFailed,
    /// Control block submission failed
    SendFailed,
    /// Waiting for hardware completion failed
    WaitFailed,
    /// Hardware did not complete within the driver timeout
    Timeout,
    /// Releasing the device handle failed
    CloseFailed,
    /// Raw driver return code
    Driver(i32),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed => write!(f, "open failed"),
            Self::SendFailed => write!(f, "send failed"),
            Self::WaitFailed => write!(f, "wait failed"),
            Self::Timeout => write!(f, "hardware timeout"),
            Self::CloseFailed => write!(f, "close failed"),
            Self::Driver(code) => write!(f, "driver returned {}", code),
        }
    }
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

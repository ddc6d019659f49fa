//! # VEPU Collaborator Traits
//!
//! Interfaces to the components an encoder HAL drives but does not own the
//! implementation of.
//!
//! ## Trait Map
//!
//! ```text
//! DeviceFactory ──open──▶ EncoderDevice   (send / wait / close)
//!
//! DmaBuffer                               (descriptor, size, bytes)
//!
//! PreludeWriter                           (file header + quant tables)
//! ```

use crate::error::Result;
use crate::patch::PatchDescriptor;
use crate::types::{DeviceConfig, EncodeParams, IoctlProtocol, QuantTables};

// =============================================================================
// BUFFER TRAIT
// =============================================================================

/// A DMA-capable memory buffer shared with the hardware
pub trait DmaBuffer {
    /// Driver-visible descriptor written into control-block address words
    fn fd(&self) -> i32;

    /// Buffer capacity in bytes
    fn size(&self) -> usize;

    /// CPU view of the buffer
    fn as_slice(&self) -> &[u8];

    /// Mutable CPU view of the buffer
    fn as_mut_slice(&mut self) -> &mut [u8];
}

// =============================================================================
// DEVICE TRAITS
// =============================================================================

/// An open handle to a hardware encoder
///
/// Calls block the current thread. Timeouts are the driver's business and
/// surface as [`crate::DeviceError::Timeout`].
pub trait EncoderDevice {
    /// Submission protocol understood by the driver
    fn protocol(&self) -> IoctlProtocol;

    /// Queue a control block for execution
    ///
    /// `patches` is only passed with [`IoctlProtocol::Combined`]; legacy
    /// drivers receive descriptors in-line at the end of `regs`.
    fn send(&mut self, regs: &[u32], patches: Option<&PatchDescriptor>) -> Result<()>;

    /// Block until the hardware finishes and read the control block back
    fn wait(&mut self, regs: &mut [u32]) -> Result<()>;

    /// Release the handle
    fn close(&mut self) -> Result<()>;
}

/// Opens device handles
pub trait DeviceFactory {
    /// Device handle type
    type Device: EncoderDevice;

    /// Open a handle matching `cfg`
    fn open(&self, cfg: &DeviceConfig) -> Result<Self::Device>;
}

// =============================================================================
// PRELUDE TRAIT
// =============================================================================

/// Writes the standard file header that precedes hardware output
pub trait PreludeWriter {
    /// Write headers for `params` at the start of `buf`
    ///
    /// Returns the quantization tables the headers advertise, which the
    /// hardware must use for the entropy-coded body.
    fn write_header(&mut self, buf: &mut [u8], params: &EncodeParams) -> QuantTables;

    /// Number of bits written by the last [`PreludeWriter::write_header`]
    fn bit_pos(&self) -> u32;
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_obj_safe!(DmaBuffer, EncoderDevice, PreludeWriter);

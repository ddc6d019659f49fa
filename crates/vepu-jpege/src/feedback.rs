//! # Completion and Feedback
//!
//! Waits for the encoder and derives the frame's status and stream length
//! from the control block the driver copied back.
//!
//! Software writes the file header, the encoder appends the entropy-coded
//! body. The encoder restarts at the 8-byte boundary below the end of the
//! header and reports how much it wrote from there, so the two counts only
//! add up after rounding the header length down:
//!
//! ```text
//! |<──────── header (sw_bit) ───────>|
//! |<──── (sw_bit / 8) & !7 ────>|<─────────── hw_bytes ───────────>|
//! ```

use vepu_core::{DeviceError, EncoderDevice, Error, PreludeWriter, Result};

use crate::context::{device_error, JpegeVepu1};
use crate::hal::EncTask;
use crate::regs::Reg;

/// Status bits kept from word 1
pub const HW_STATUS_MASK: u32 = 0x70;

bitflags::bitflags! {
    /// Completion status reported in word 1
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HwStatus: u32 {
        /// Encoder was reset
        const RESET = 0x10;
        /// Output buffer ran full
        const BUFFER_FULL = 0x20;
        /// Encoder timed out
        const TIMEOUT = 0x40;
    }
}

/// Result of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feedback {
    /// Word 1 masked with [`HW_STATUS_MASK`]
    pub hw_status: u32,
    /// Total stream length in bytes, header included
    pub stream_length: usize,
}

impl Feedback {
    /// Decoded status bits
    pub fn status(&self) -> HwStatus {
        HwStatus::from_bits_truncate(self.hw_status)
    }

    /// Check if the encoder finished without error
    pub fn is_ok(&self) -> bool {
        self.hw_status == 0
    }
}

/// Final stream length from the header bit position and the encoder's byte count
#[inline]
pub const fn stream_length(sw_bit: u32, hw_bytes: usize) -> usize {
    ((sw_bit as usize / 8) & !7) + hw_bytes
}

impl<D: EncoderDevice, P: PreludeWriter> JpegeVepu1<D, P> {
    /// Block until the encoder finishes and collect the frame's feedback
    ///
    /// The stream length is also stored in `task.length`. On failure the
    /// previous feedback is kept.
    pub fn wait(&mut self, task: &mut EncTask<'_>) -> Result<Feedback> {
        jpege_dbg!(self.debug, FUNC, "wait enter");

        let (Some(dev), Some(regs), Some(prelude)) =
            (self.dev.as_mut(), self.regs.as_mut(), self.prelude.as_ref())
        else {
            return Err(Error::NotInitialized);
        };

        dev.wait(regs.as_mut_slice()).map_err(|e| {
            log::error!("failed to wait for hardware: {}", e);
            device_error(e, DeviceError::WaitFailed)
        })?;

        let hw_status = regs[Reg::Status] & HW_STATUS_MASK;
        let hw_bytes = (regs[Reg::StrmBufLimit] / 8) as usize;
        let sw_bit = prelude.bit_pos();
        let length = stream_length(sw_bit, hw_bytes);

        jpege_dbg!(
            self.debug,
            OUTPUT,
            "hw_status {:08x} sw_bit {} hw_bytes {} length {}",
            hw_status,
            sw_bit,
            hw_bytes,
            length
        );

        if hw_status != 0 {
            log::warn!(
                "encoder finished with status {:?}",
                HwStatus::from_bits_truncate(hw_status)
            );
        }

        self.feedback = Feedback {
            hw_status,
            stream_length: length,
        };
        task.length = length;

        jpege_dbg!(self.debug, FUNC, "wait leave");
        Ok(self.feedback)
    }

    /// Feedback of the last completed frame
    pub fn ret_task(&self) -> Result<&Feedback> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        Ok(&self.feedback)
    }
}

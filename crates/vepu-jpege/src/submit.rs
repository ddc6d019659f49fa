//! # Submission
//!
//! Hands the built control block to the driver in the layout its protocol
//! expects.
//!
//! ```text
//! Combined:  send(regs[164], Some(patches))
//! Legacy:    send(regs[164])                         no patches
//!            send(regs[164] ++ patch words[12])      patches present
//! ```

use alloc::vec::Vec;

use vepu_core::{
    DeviceError, EncoderDevice, Error, IoctlProtocol, PreludeWriter, Result,
    PATCH_DESCRIPTOR_WORDS,
};

use crate::context::{device_error, JpegeVepu1};
use crate::regs::NUM_REGS;

/// Words in a legacy submission carrying in-line patches
pub const LEGACY_SUBMIT_WORDS: usize = NUM_REGS + PATCH_DESCRIPTOR_WORDS;

/// Control block followed by the descriptor words
fn legacy_buffer(regs: &[u32], patches: &[u32]) -> Result<Vec<u32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(regs.len() + patches.len())
        .map_err(|_| Error::AllocationFailed)?;
    buf.extend_from_slice(regs);
    buf.extend_from_slice(patches);
    Ok(buf)
}

impl<D: EncoderDevice, P: PreludeWriter> JpegeVepu1<D, P> {
    /// Submit the current control block
    pub fn start(&mut self) -> Result<()> {
        jpege_dbg!(self.debug, FUNC, "start enter");

        let (Some(dev), Some(regs)) = (self.dev.as_mut(), self.regs.as_ref()) else {
            return Err(Error::NotInitialized);
        };

        let sent = match self.protocol {
            IoctlProtocol::Combined => dev.send(regs.as_slice(), Some(&self.patches)),
            IoctlProtocol::Legacy if self.patches.is_valid() => {
                let buf = legacy_buffer(regs.as_slice(), self.patches.as_words()).map_err(|e| {
                    log::error!("failed to alloc legacy submit buffer");
                    e
                })?;
                dev.send(&buf, None)
            }
            IoctlProtocol::Legacy => dev.send(regs.as_slice(), None),
        };

        sent.map_err(|e| {
            log::error!("failed to send regs to hardware: {}", e);
            device_error(e, DeviceError::SendFailed)
        })?;

        jpege_dbg!(self.debug, FUNC, "start leave");
        Ok(())
    }
}

//! # Test Collaborators
//!
//! In-memory stand-ins for the device driver, DMA buffers and the header
//! writer, so the HAL can be driven end to end without hardware.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use vepu_core::{
    DeviceConfig, DeviceError, DeviceFactory, DmaBuffer, EncodeParams, EncoderDevice, Error,
    IoctlProtocol, PatchDescriptor, PreludeWriter, QuantTables, Result,
};

use crate::regs::Reg;

// =============================================================================
// HEAP BUFFER
// =============================================================================

/// `Vec`-backed buffer with a fake descriptor
#[derive(Debug, Clone)]
pub struct HeapBuffer {
    fd: i32,
    data: Vec<u8>,
}

impl HeapBuffer {
    /// Zeroed buffer of `size` bytes
    pub fn new(fd: i32, size: usize) -> Self {
        Self::filled(fd, size, 0)
    }

    /// Buffer of `size` bytes set to `byte`
    pub fn filled(fd: i32, size: usize, byte: u8) -> Self {
        Self {
            fd,
            data: vec![byte; size],
        }
    }
}

impl DmaBuffer for HeapBuffer {
    fn fd(&self) -> i32 {
        self.fd
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// =============================================================================
// FIXED PRELUDE
// =============================================================================

/// Header writer that emits a caller-chosen byte string
#[derive(Debug, Clone)]
pub struct FixedPrelude {
    header: Vec<u8>,
    bits: Option<u32>,
    tables: QuantTables,
    bit_pos: u32,
    /// Number of headers written
    pub calls: usize,
}

impl FixedPrelude {
    /// Emit `header` verbatim
    pub fn new(header: Vec<u8>) -> Self {
        Self {
            header,
            bits: None,
            tables: QuantTables::default(),
            bit_pos: 0,
            calls: 0,
        }
    }

    /// Emit `len` bytes counting up from zero (wrapping at 256)
    pub fn counting(len: usize) -> Self {
        Self::new((0..len).map(|i| i as u8).collect())
    }

    /// Report `bits` as the bit position instead of the header length
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Report `tables` as the selected quantization tables
    pub fn with_tables(mut self, tables: QuantTables) -> Self {
        self.tables = tables;
        self
    }
}

impl PreludeWriter for FixedPrelude {
    fn write_header(&mut self, buf: &mut [u8], _params: &EncodeParams) -> QuantTables {
        let len = self.header.len().min(buf.len());
        buf[..len].copy_from_slice(&self.header[..len]);
        self.bit_pos = self.bits.unwrap_or((len * 8) as u32);
        self.calls += 1;
        self.tables
    }

    fn bit_pos(&self) -> u32 {
        self.bit_pos
    }
}

// =============================================================================
// MOCK DEVICE
// =============================================================================

/// One recorded `send`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Words passed to the driver
    pub regs: Vec<u32>,
    /// Descriptor passed alongside, combined protocol only
    pub patches: Option<PatchDescriptor>,
}

/// Everything the mock driver observed
#[derive(Debug, Clone, Default)]
pub struct DeviceLog {
    /// Configurations passed to `open`
    pub opened: Vec<DeviceConfig>,
    /// Submissions in order
    pub sends: Vec<Submission>,
    /// Completed waits
    pub waits: usize,
    /// Close calls
    pub closes: usize,
}

/// Scripted driver behavior
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    /// Protocol reported by opened devices
    pub protocol: IoctlProtocol,
    /// Word 1 after completion
    pub hw_status: u32,
    /// Word 24 after completion (bits produced by the encoder)
    pub hw_bits: u32,
    /// Fail `open`
    pub fail_open: Option<DeviceError>,
    /// Fail `send`
    pub fail_send: Option<DeviceError>,
    /// Fail `wait`
    pub fail_wait: Option<DeviceError>,
    /// Fail `close`
    pub fail_close: Option<DeviceError>,
}

/// Driver handle recording into a shared [`DeviceLog`]
#[derive(Debug)]
pub struct MockDevice {
    script: MockScript,
    log: Rc<RefCell<DeviceLog>>,
}

impl EncoderDevice for MockDevice {
    fn protocol(&self) -> IoctlProtocol {
        self.script.protocol
    }

    fn send(&mut self, regs: &[u32], patches: Option<&PatchDescriptor>) -> Result<()> {
        if let Some(e) = self.script.fail_send {
            return Err(e.into());
        }

        self.log.borrow_mut().sends.push(Submission {
            regs: regs.to_vec(),
            patches: patches.copied(),
        });
        Ok(())
    }

    fn wait(&mut self, regs: &mut [u32]) -> Result<()> {
        if let Some(e) = self.script.fail_wait {
            return Err(e.into());
        }

        regs[Reg::Status.index()] = self.script.hw_status;
        regs[Reg::StrmBufLimit.index()] = self.script.hw_bits;
        self.log.borrow_mut().waits += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.log.borrow_mut().closes += 1;
        match self.script.fail_close {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Opens [`MockDevice`]s sharing one log
#[derive(Debug, Default)]
pub struct MockDeviceFactory {
    /// Behavior of devices opened from now on
    pub script: MockScript,
    log: Rc<RefCell<DeviceLog>>,
}

impl MockDeviceFactory {
    /// Factory with `script`
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            log: Rc::default(),
        }
    }

    /// Snapshot of the shared log
    pub fn log(&self) -> DeviceLog {
        self.log.borrow().clone()
    }
}

impl DeviceFactory for MockDeviceFactory {
    type Device = MockDevice;

    fn open(&self, cfg: &DeviceConfig) -> Result<MockDevice> {
        if let Some(e) = self.script.fail_open {
            return Err(Error::Device(e));
        }

        self.log.borrow_mut().opened.push(*cfg);
        Ok(MockDevice {
            script: self.script.clone(),
            log: Rc::clone(&self.log),
        })
    }
}

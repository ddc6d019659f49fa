//! # HAL Operation Table
//!
//! The per-coding operation table the media framework drives, and the
//! per-frame task handed through it.

use core::fmt;

use vepu_core::{Coding, DmaBuffer, EncodeParams, EncoderDevice, PreludeWriter, Result};

use crate::context::JpegeVepu1;
use crate::feedback::Feedback;

/// HAL name reported to the framework
pub const HAL_NAME: &str = "hal_jpege_vepu1";

// =============================================================================
// TASK
// =============================================================================

/// One frame's parameters and buffers
pub struct EncTask<'a> {
    /// Encode parameters
    pub syntax: EncodeParams,
    /// Input picture
    pub input: &'a dyn DmaBuffer,
    /// Output stream, header written by software
    pub output: &'a mut dyn DmaBuffer,
    /// Stream length once the frame completed
    pub length: usize,
}

impl<'a> EncTask<'a> {
    /// Create a task for `syntax`
    pub fn new(
        syntax: EncodeParams,
        input: &'a dyn DmaBuffer,
        output: &'a mut dyn DmaBuffer,
    ) -> Self {
        Self {
            syntax,
            input,
            output,
            length: 0,
        }
    }
}

impl fmt::Debug for EncTask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncTask")
            .field("syntax", &self.syntax)
            .field("input_fd", &self.input.fd())
            .field("output_fd", &self.output.fd())
            .field("length", &self.length)
            .finish()
    }
}

// =============================================================================
// OPERATION TABLE
// =============================================================================

/// Encoder HAL operations, called in order once per frame
pub trait EncoderHal {
    /// HAL name
    fn name(&self) -> &'static str;

    /// Coding standard served
    fn coding(&self) -> Coding;

    /// Take over the task's parameters
    fn get_task(&mut self, task: &EncTask<'_>) -> Result<()>;

    /// Build the control block
    fn gen_regs(&mut self, task: &mut EncTask<'_>) -> Result<()>;

    /// Submit the control block
    fn start(&mut self, task: &mut EncTask<'_>) -> Result<()>;

    /// Wait for completion
    fn wait(&mut self, task: &mut EncTask<'_>) -> Result<()>;

    /// Feedback of the completed frame
    fn ret_task(&mut self, task: &mut EncTask<'_>) -> Result<Feedback>;

    /// Run every stage for one frame
    fn encode(&mut self, task: &mut EncTask<'_>) -> Result<Feedback> {
        self.get_task(task)?;
        self.gen_regs(task)?;
        self.start(task)?;
        self.wait(task)?;
        self.ret_task(task)
    }
}

static_assertions::assert_obj_safe!(EncoderHal);

impl<D: EncoderDevice, P: PreludeWriter> EncoderHal for JpegeVepu1<D, P> {
    fn name(&self) -> &'static str {
        HAL_NAME
    }

    fn coding(&self) -> Coding {
        Coding::Mjpeg
    }

    fn get_task(&mut self, task: &EncTask<'_>) -> Result<()> {
        JpegeVepu1::get_task(self, task)
    }

    fn gen_regs(&mut self, task: &mut EncTask<'_>) -> Result<()> {
        JpegeVepu1::gen_regs(self, task).map(|_| ())
    }

    fn start(&mut self, _task: &mut EncTask<'_>) -> Result<()> {
        JpegeVepu1::start(self)
    }

    fn wait(&mut self, task: &mut EncTask<'_>) -> Result<()> {
        JpegeVepu1::wait(self, task).map(|_| ())
    }

    fn ret_task(&mut self, _task: &mut EncTask<'_>) -> Result<Feedback> {
        JpegeVepu1::ret_task(self).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Degradations;
    use crate::context::HalConfig;
    use crate::regs::Reg;
    use crate::testing::{FixedPrelude, HeapBuffer, MockDevice, MockDeviceFactory, MockScript};
    use alloc::boxed::Box;
    use vepu_core::{DeviceError, Error, FrameFormat, IoctlProtocol};

    type Ctx = JpegeVepu1<MockDevice, FixedPrelude>;

    fn open(factory: &MockDeviceFactory) -> Ctx {
        Ctx::init(&HalConfig::default(), factory, FixedPrelude::counting(603)).unwrap()
    }

    #[test]
    fn test_identity() {
        let factory = MockDeviceFactory::default();
        let hal: Box<dyn EncoderHal> = Box::new(open(&factory));
        assert_eq!(hal.name(), "hal_jpege_vepu1");
        assert_eq!(hal.coding(), Coding::Mjpeg);
    }

    #[test]
    fn test_encode_1080p_frame() {
        let factory = MockDeviceFactory::new(MockScript {
            protocol: IoctlProtocol::Combined,
            hw_bits: 150_000 * 8,
            ..Default::default()
        });
        let mut ctx = open(&factory);
        let input = HeapBuffer::new(7, 1920 * 1088 * 3 / 2);
        let mut output = HeapBuffer::new(8, 1 << 20);
        let syntax = EncodeParams::new(1920, 1080, FrameFormat::Yuv420sp).with_stride(1920, 1088);
        let mut task = EncTask::new(syntax, &input, &mut output);

        let fb = ctx.encode(&mut task).unwrap();
        assert!(fb.is_ok());
        assert_eq!(fb.stream_length, 600 + 150_000);
        assert_eq!(task.length, fb.stream_length);

        let log = factory.log();
        assert_eq!(log.sends.len(), 1);
        assert_eq!(log.waits, 1);
        let regs = &log.sends[0].regs;
        assert_eq!(regs[Reg::EncCtrl.index()], 0x83C1_100D);
        assert_eq!(regs[Reg::InputCtrl.index()], 0x0078_0204);
        assert_eq!(regs[Reg::InputLuma.index()], 7);
        assert_eq!(log.sends[0].patches.unwrap().len(), 2);
    }

    #[test]
    fn test_unsupported_format_completes() {
        let factory = MockDeviceFactory::default();
        let mut ctx = open(&factory);
        let input = HeapBuffer::new(7, 64);
        let mut output = HeapBuffer::new(8, 4096);
        let syntax = EncodeParams::new(320, 240, FrameFormat::Yuv422p);
        let mut task = EncTask::new(syntax, &input, &mut output);

        let fb = ctx.encode(&mut task).unwrap();
        assert!(fb.is_ok());
        assert_eq!(ctx.degradations(), Degradations::UNSUPPORTED_FORMAT);
        assert_eq!(ctx.regs().unwrap().format_code(), 0);
    }

    #[test]
    fn test_encode_stops_at_failed_stage() {
        let factory = MockDeviceFactory::new(MockScript {
            fail_send: Some(DeviceError::SendFailed),
            ..Default::default()
        });
        let mut ctx = open(&factory);
        let input = HeapBuffer::new(7, 64);
        let mut output = HeapBuffer::new(8, 4096);
        let syntax = EncodeParams::new(320, 240, FrameFormat::Yuv420sp);
        let mut task = EncTask::new(syntax, &input, &mut output);

        let err = ctx.encode(&mut task).unwrap_err();
        assert_eq!(err, Error::Device(DeviceError::SendFailed));
        assert_eq!(factory.log().waits, 0);
    }

    #[test]
    fn test_context_reusable_after_failed_wait() {
        let factory = MockDeviceFactory::new(MockScript {
            fail_wait: Some(DeviceError::Timeout),
            ..Default::default()
        });
        let mut ctx = open(&factory);
        let input = HeapBuffer::new(7, 64);
        let mut output = HeapBuffer::new(8, 4096);
        let syntax = EncodeParams::new(320, 240, FrameFormat::Yuv420sp);
        let mut task = EncTask::new(syntax, &input, &mut output);

        for _ in 0..2 {
            let err = ctx.encode(&mut task).unwrap_err();
            assert_eq!(err, Error::Device(DeviceError::Timeout));
        }
        assert_eq!(factory.log().sends.len(), 2);
    }
}

//! # Encoder Context
//!
//! Owns the device handle, the header writer and the control block for the
//! lifetime of one JPEG encoding session.
//!
//! ## Lifecycle
//!
//! ```text
//!  init ──▶ [get_task ─▶ gen_regs ─▶ start ─▶ wait ─▶ ret_task]* ──▶ deinit
//! ```
//!
//! `deinit` runs at most once; it also runs on drop. Every stage called
//! afterwards fails with [`Error::NotInitialized`].

use core::fmt;

use vepu_core::{
    Coding, CtxType, DeviceConfig, DeviceError, DeviceFactory, EncodeParams, EncoderDevice, Error,
    IoctlProtocol, PatchDescriptor, PlatformCaps, PreludeWriter, Result,
};

use crate::builder::{self, Degradations};
use crate::debug::DebugFlags;
use crate::feedback::Feedback;
use crate::hal::EncTask;
use crate::regs::ControlBlock;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// HAL configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalConfig {
    /// Device open parameters
    pub device: DeviceConfig,
    /// Initial debug trace categories
    pub debug: DebugFlags,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                ctx_type: CtxType::Encoder,
                coding: Coding::Mjpeg,
                platform: PlatformCaps::VEPU1,
                pp_enable: false,
            },
            debug: DebugFlags::empty(),
        }
    }
}

/// Keep device errors, map anything else to `fallback`
pub(crate) fn device_error(err: Error, fallback: DeviceError) -> Error {
    match err {
        Error::Device(_) => err,
        _ => Error::Device(fallback),
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// VEPU1 JPEG encoder context
pub struct JpegeVepu1<D: EncoderDevice, P: PreludeWriter> {
    pub(crate) dev: Option<D>,
    pub(crate) prelude: Option<P>,
    pub(crate) regs: Option<ControlBlock>,
    pub(crate) patches: PatchDescriptor,
    pub(crate) protocol: IoctlProtocol,
    pub(crate) syntax: EncodeParams,
    pub(crate) feedback: Feedback,
    pub(crate) degradations: Degradations,
    pub(crate) debug: DebugFlags,
}

impl<D: EncoderDevice, P: PreludeWriter> JpegeVepu1<D, P> {
    /// Open the device and allocate the control block
    ///
    /// Nothing is returned on failure; a device opened before a later
    /// failure is closed again.
    pub fn init<F>(cfg: &HalConfig, factory: &F, prelude: P) -> Result<Self>
    where
        F: DeviceFactory<Device = D>,
    {
        let debug = Self::resolve_debug(cfg.debug);
        jpege_dbg!(debug, FUNC, "init enter");

        if cfg.device.ctx_type != CtxType::Encoder || cfg.device.coding != Coding::Mjpeg {
            log::error!(
                "invalid device config {:?}/{:?}",
                cfg.device.ctx_type,
                cfg.device.coding
            );
            return Err(Error::InvalidParameter);
        }

        let mut dev = factory.open(&cfg.device).map_err(|e| {
            log::error!("failed to open device: {}", e);
            device_error(e, DeviceError::OpenFailed)
        })?;
        let protocol = dev.protocol();

        let regs = match ControlBlock::try_new() {
            Ok(regs) => regs,
            Err(e) => {
                log::error!("failed to alloc vepu1 regs");
                if let Err(ce) = dev.close() {
                    log::warn!("failed to close device: {}", ce);
                }
                return Err(e);
            }
        };

        jpege_dbg!(debug, FUNC, "init leave, protocol {:?}", protocol);

        Ok(Self {
            dev: Some(dev),
            prelude: Some(prelude),
            regs: Some(regs),
            patches: PatchDescriptor::new(),
            protocol,
            syntax: EncodeParams::default(),
            feedback: Feedback::default(),
            degradations: Degradations::empty(),
            debug,
        })
    }

    #[cfg(feature = "std")]
    fn resolve_debug(flags: DebugFlags) -> DebugFlags {
        flags | DebugFlags::from_env()
    }

    #[cfg(not(feature = "std"))]
    fn resolve_debug(flags: DebugFlags) -> DebugFlags {
        flags
    }

    /// Release the header writer, the device and the control block
    ///
    /// Safe to call more than once. A close failure is logged and the
    /// remaining resources are still released.
    pub fn deinit(&mut self) {
        jpege_dbg!(self.debug, FUNC, "deinit enter");

        self.prelude = None;

        if let Some(mut dev) = self.dev.take() {
            if let Err(e) = dev.close() {
                log::warn!("failed to close device: {}", e);
            }
        }

        self.regs = None;
        self.patches.reset();

        jpege_dbg!(self.debug, FUNC, "deinit leave");
    }

    /// Check if the context still owns its resources
    pub fn is_initialized(&self) -> bool {
        self.dev.is_some() && self.regs.is_some() && self.prelude.is_some()
    }

    // =========================================================================
    // Frame stages
    // =========================================================================

    /// Take over the task's encode parameters
    pub fn get_task(&mut self, task: &EncTask<'_>) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        self.syntax = task.syntax;
        jpege_dbg!(
            self.debug,
            INPUT,
            "task {}x{} stride {}x{} format {} color {:?}",
            self.syntax.width,
            self.syntax.height,
            self.syntax.hor_stride,
            self.syntax.ver_stride,
            self.syntax.format,
            self.syntax.color_conversion
        );
        Ok(())
    }

    /// Write the file header and build the control block for the task
    ///
    /// Parameter problems never fail the call; they are returned (and kept
    /// in [`JpegeVepu1::degradations`]) instead.
    pub fn gen_regs(&mut self, task: &mut EncTask<'_>) -> Result<Degradations> {
        jpege_dbg!(self.debug, FUNC, "gen_regs enter");

        let (Some(regs), Some(prelude)) = (self.regs.as_mut(), self.prelude.as_mut()) else {
            return Err(Error::NotInitialized);
        };

        let degraded = builder::build_control_block(
            regs,
            &mut self.patches,
            &self.syntax,
            prelude,
            task.input,
            &mut *task.output,
        );
        self.degradations = degraded;

        if self.debug.contains(DebugFlags::REGS) {
            regs.dump();
        }

        jpege_dbg!(self.debug, FUNC, "gen_regs leave, degradations {:?}", degraded);
        Ok(degraded)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Degradations applied by the last `gen_regs`
    pub fn degradations(&self) -> Degradations {
        self.degradations
    }

    /// Parameters of the current task
    pub fn syntax(&self) -> &EncodeParams {
        &self.syntax
    }

    /// Control block, `None` after `deinit`
    pub fn regs(&self) -> Option<&ControlBlock> {
        self.regs.as_ref()
    }

    /// Patches recorded for the current frame
    pub fn patches(&self) -> &PatchDescriptor {
        &self.patches
    }

    /// Driver protocol resolved at init
    pub fn protocol(&self) -> IoctlProtocol {
        self.protocol
    }

    /// Active debug trace categories
    pub fn debug_flags(&self) -> DebugFlags {
        self.debug
    }
}

impl<D: EncoderDevice, P: PreludeWriter> fmt::Debug for JpegeVepu1<D, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JpegeVepu1")
            .field("initialized", &self.is_initialized())
            .field("protocol", &self.protocol)
            .field("syntax", &self.syntax)
            .field("feedback", &self.feedback)
            .field("degradations", &self.degradations)
            .finish_non_exhaustive()
    }
}

impl<D: EncoderDevice, P: PreludeWriter> Drop for JpegeVepu1<D, P> {
    fn drop(&mut self) {
        self.deinit();
    }
}

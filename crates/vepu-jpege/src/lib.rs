//! # VEPU1 JPEG Encoder HAL
//!
//! Drives the JPEG mode of the VEPU1 fixed-function video encoder.
//!
//! Software writes the JFIF headers, this crate turns the frame's
//! parameters into the encoder's 164-word control block, the driver runs
//! it, and the encoder appends the entropy-coded body.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Frame Pipeline                            │
//! │                                                                   │
//! │  ┌──────────┐   ┌──────────────┐   ┌──────────┐   ┌───────────┐   │
//! │  │ get_task │──▶│   gen_regs   │──▶│  start   │──▶│   wait    │   │
//! │  │ (params) │   │ (header +    │   │ (driver  │   │ (status,  │   │
//! │  │          │   │  regs)       │   │  send)   │   │  length)  │   │
//! │  └──────────┘   └──────┬───────┘   └──────────┘   └───────────┘   │
//! │                        │                                          │
//! │            ┌───────────┼───────────┬─────────────┐                │
//! │            ▼           ▼           ▼             ▼                │
//! │        ┌────────┐ ┌─────────┐ ┌─────────┐  ┌──────────┐           │
//! │        │ format │ │  color  │ │ qtable  │  │  regs    │           │
//! │        └────────┘ └─────────┘ └─────────┘  └──────────┘           │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut hal = JpegeVepu1::init(&HalConfig::default(), &factory, prelude)?;
//! let mut task = EncTask::new(params, &input, &mut output);
//! let feedback = hal.encode(&mut task)?;
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[macro_use]
pub mod debug;

pub mod builder;
pub mod color;
pub mod context;
pub mod feedback;
pub mod format;
pub mod hal;
pub mod qtable;
pub mod regs;
pub mod submit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use builder::{build_control_block, Degradations};
pub use context::{HalConfig, JpegeVepu1};
pub use debug::DebugFlags;
pub use feedback::{Feedback, HwStatus};
pub use hal::{EncTask, EncoderHal, HAL_NAME};
pub use regs::{ControlBlock, Reg, NUM_REGS};

//! # VEPU Core
//!
//! Shared vocabulary for the hardware encoder abstraction layers.
//!
//! Every per-coding HAL (JPEG today) is written against the types and
//! collaborator traits defined here, so the device driver, the DMA buffer
//! allocator and the bitstream header writers can be swapped without touching
//! the register-programming code.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        vepu-core                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Traits    │  │   Types     │  │     Error           │  │
//! │  │  (Device,   │  │ (Format,    │  │   Handling          │  │
//! │  │   Buffer,   │  │  Params,    │  │                     │  │
//! │  │   Prelude)  │  │  Patches)   │  │                     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod patch;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use error::{DeviceError, Error, Result};
pub use patch::{PatchDescriptor, RegPatch, MAX_PATCHES, PATCH_DESCRIPTOR_WORDS, PATCH_MAGIC};
pub use traits::*;
pub use types::*;

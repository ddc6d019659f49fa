//! # Register Patch Descriptors
//!
//! Some control-block words hold a buffer descriptor that only the driver can
//! turn into a device address (for example the chroma plane of a frame that
//! lives in the same allocation as its luma plane). The HAL records the
//! byte offset to add to such a word, and the driver applies it at
//! submission time.
//!
//! ## Wire Layout
//!
//! ```text
//! Offset  Size  Field
//! ──────────────────────────────────────
//! 0x00    4     Magic (0x004C4A46)
//! 0x04    4     Valid patch count
//! 0x08    8     Patch 0 (reg_idx, offset)
//! ...
//! 0x28    8     Patch 4
//! ──────────────────────────────────────
//! Total: 0x30 (48) bytes
//! ```

use bytemuck::{Pod, Zeroable};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Magic value the driver checks before applying patches
pub const PATCH_MAGIC: u32 = 0x004C_4A46;

/// Maximum number of patches per submission
pub const MAX_PATCHES: usize = 5;

/// Descriptor size in 32-bit words
pub const PATCH_DESCRIPTOR_WORDS: usize = core::mem::size_of::<PatchDescriptor>() / 4;

// =============================================================================
// PATCH ENTRY
// =============================================================================

/// One control-block word to be offset by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct RegPatch {
    /// Control-block word index
    pub reg_idx: u32,
    /// Byte offset added to the buffer address
    pub offset: u32,
}

// =============================================================================
// PATCH DESCRIPTOR
// =============================================================================

/// Per-frame list of driver-resolved address patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PatchDescriptor {
    magic: u32,
    count: u32,
    patches: [RegPatch; MAX_PATCHES],
}

static_assertions::const_assert_eq!(core::mem::size_of::<RegPatch>(), 8);
static_assertions::const_assert_eq!(core::mem::size_of::<PatchDescriptor>(), 48);
static_assertions::const_assert_eq!(PATCH_DESCRIPTOR_WORDS, 12);

impl Default for PatchDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchDescriptor {
    /// Create an empty descriptor
    pub const fn new() -> Self {
        Self {
            magic: PATCH_MAGIC,
            count: 0,
            patches: [RegPatch {
                reg_idx: 0,
                offset: 0,
            }; MAX_PATCHES],
        }
    }

    /// Drop all recorded patches
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Record an offset for control-block word `reg_idx`
    ///
    /// Zero offsets need no patching and are skipped. Returns `false` when
    /// the descriptor is full and the patch was dropped.
    pub fn add(&mut self, reg_idx: u32, offset: u32) -> bool {
        if offset == 0 {
            return true;
        }

        let count = self.count as usize;
        if count >= MAX_PATCHES {
            log::warn!(
                "patch descriptor full, dropping reg {} offset {}",
                reg_idx,
                offset
            );
            return false;
        }

        self.patches[count] = RegPatch { reg_idx, offset };
        self.count += 1;
        true
    }

    /// Check if any patch is recorded
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.count != 0
    }

    /// Number of recorded patches
    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Check if no patch is recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Magic value
    #[inline]
    pub fn magic(&self) -> u32 {
        self.magic
    }

    /// Recorded patches
    pub fn entries(&self) -> &[RegPatch] {
        &self.patches[..self.len()]
    }

    /// Offset recorded for `reg_idx`, if any
    pub fn offset_of(&self, reg_idx: u32) -> Option<u32> {
        self.entries()
            .iter()
            .find(|p| p.reg_idx == reg_idx)
            .map(|p| p.offset)
    }

    /// Descriptor as driver words
    pub fn as_words(&self) -> &[u32] {
        bytemuck::cast_ref::<Self, [u32; PATCH_DESCRIPTOR_WORDS]>(self)
    }
}

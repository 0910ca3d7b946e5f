//! Row kernels
//!
//! Pure functions that turn one window of source rows into `factor` (or
//! `factor / 2` at an image edge) destination rows. Each quality has a
//! portable scalar implementation which is the reference; the `sse41`
//! module carries vectorised versions that must produce identical bytes.
//!
//! Kernels operate on whole rows described by a [`RowGeometry`]. Callers are
//! responsible for length checks; kernels index with plain slice bounds.

pub mod interp;
pub mod mitchell;
pub mod nearest;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod sse41;

// ==============================================================================
// Geometry
// ==============================================================================

/// Shape of one source row and its upscaled counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowGeometry {
    /// Source width in pixels
    pub width: usize,
    /// Interleaved samples per pixel
    pub channels: usize,
    /// Integer upscale factor
    pub factor: usize,
}

impl RowGeometry {
    pub fn new(width: usize, channels: usize, factor: usize) -> Self {
        Self {
            width,
            channels,
            factor,
        }
    }

    /// Geometry whose destination row length fits in `usize`; `None`
    /// otherwise. The length accessors below never overflow on its result.
    pub fn checked(width: usize, channels: usize, factor: usize) -> Option<Self> {
        width.checked_mul(channels)?.checked_mul(factor)?;
        Some(Self::new(width, channels, factor))
    }

    /// Bytes in one source row
    pub fn src_len(&self) -> usize {
        self.width * self.channels
    }

    /// Bytes (or accumulators) in one destination row
    pub fn dst_len(&self) -> usize {
        self.width * self.channels * self.factor
    }
}

// ==============================================================================
// Kernel signatures
// ==============================================================================

/// Writes one replicated destination row
pub type ReplicateFn = fn(src: &[u8], dst: &mut [u8], geo: &RowGeometry);

/// Writes vertical phase `phase` of the pair (`top`, `bottom`)
pub type InterpRowFn =
    fn(top: &[u8], bottom: &[u8], phase: usize, dst: &mut [u8], geo: &RowGeometry);

/// Inline Mitchell: vertical weights over four rows into `columns`, then the
/// horizontal pass into `dst`
pub type MitchellRowFn = fn(
    rows: [&[u8]; 4],
    weights: &[i32; 4],
    columns: &mut [i32],
    dst: &mut [u8],
    geo: &RowGeometry,
);

/// Horizontal Mitchell pass of one source row into unshifted accumulators
pub type AccumulateFn = fn(src: &[u8], acc: &mut [i32], geo: &RowGeometry);

/// Vertical combine of four accumulator rows with rounding and clamping
pub type CombineFn = fn(rows: [&[i32]; 4], weights: &[i32; 4], dst: &mut [u8]);

/// The kernel set chosen for a doubler at creation time
#[derive(Clone, Copy)]
pub enum RowKernel {
    Nearest { replicate: ReplicateFn },
    Interp { row: InterpRowFn },
    Mitchell { row: MitchellRowFn },
    MitchellRing { accumulate: AccumulateFn, combine: CombineFn },
}

impl RowKernel {
    pub fn name(&self) -> &'static str {
        match self {
            RowKernel::Nearest { .. } => "nearest",
            RowKernel::Interp { .. } => "interp",
            RowKernel::Mitchell { .. } => "mitchell",
            RowKernel::MitchellRing { .. } => "mitchell-ring",
        }
    }
}

impl std::fmt::Debug for RowKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ==============================================================================
// Capability detection
// ==============================================================================

/// Whether the running CPU can execute the `sse41` kernels
pub fn simd_available() -> bool {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("sse4.1") {
            return true;
        }
    }
    false
}

/// Clamp-to-edge index into `0..len`
#[inline(always)]
pub(crate) fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

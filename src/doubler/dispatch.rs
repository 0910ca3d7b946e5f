//! Kernel selection: a fixed match over (quality, factor, channels, simd).

use super::{Factor, Quality};
use crate::kernels::{interp, mitchell, nearest, AccumulateFn, RowKernel};

/// Pick the kernel set for an effective configuration.
///
/// Returns the kernel and whether it is a vector implementation, or `None`
/// when no kernel exists for the combination.
pub fn select(
    quality: Quality,
    factor: Factor,
    channels: usize,
    simd: bool,
) -> Option<(RowKernel, bool)> {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        if simd {
            if let Some(kernel) = select_sse41(quality, factor, channels) {
                return Some((kernel, true));
            }
        }
    }
    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    let _ = simd;

    select_scalar(quality, factor, channels).map(|k| (k, false))
}

pub fn select_scalar(quality: Quality, factor: Factor, channels: usize) -> Option<RowKernel> {
    use Quality::*;

    let kernel = match (quality, factor, channels) {
        (Nearest, _, 1) => RowKernel::Nearest {
            replicate: nearest::replicate::<1>,
        },
        (Nearest, _, 3) => RowKernel::Nearest {
            replicate: nearest::replicate::<3>,
        },
        (Nearest, _, 4) => RowKernel::Nearest {
            replicate: nearest::replicate::<4>,
        },
        (Nearest, _, _) => RowKernel::Nearest {
            replicate: nearest::replicate_any,
        },

        (Interp, Factor::Two, 1) => RowKernel::Interp {
            row: interp::interp2_row::<1>,
        },
        (Interp, Factor::Two, 3) => RowKernel::Interp {
            row: interp::interp2_row::<3>,
        },
        (Interp, Factor::Two, 4) => RowKernel::Interp {
            row: interp::interp2_row::<4>,
        },
        (Interp, Factor::Four, 1) => RowKernel::Interp {
            row: interp::interp4_row::<1>,
        },
        (Interp, Factor::Four, 3) => RowKernel::Interp {
            row: interp::interp4_row::<3>,
        },
        (Interp, Factor::Four, 4) => RowKernel::Interp {
            row: interp::interp4_row::<4>,
        },

        (Mitchell, Factor::Two | Factor::Four, 1) => RowKernel::Mitchell {
            row: mitchell::mitchell_row::<1>,
        },
        (Mitchell, Factor::Two | Factor::Four, 3) => RowKernel::Mitchell {
            row: mitchell::mitchell_row::<3>,
        },
        (Mitchell, Factor::Two | Factor::Four, 4) => RowKernel::Mitchell {
            row: mitchell::mitchell_row::<4>,
        },

        _ => return None,
    };
    Some(kernel)
}

fn ring_accumulate(channels: usize) -> Option<AccumulateFn> {
    let accumulate: AccumulateFn = match channels {
        1 => mitchell::accumulate::<1>,
        3 => mitchell::accumulate::<3>,
        4 => mitchell::accumulate::<4>,
        _ => return None,
    };
    Some(accumulate)
}

/// Ring-path Mitchell with the scalar combine
pub fn scalar_ring(channels: usize) -> Option<RowKernel> {
    Some(RowKernel::MitchellRing {
        accumulate: ring_accumulate(channels)?,
        combine: mitchell::combine,
    })
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn select_sse41(quality: Quality, factor: Factor, channels: usize) -> Option<RowKernel> {
    use crate::kernels::sse41;
    use Quality::*;

    let kernel = match (quality, factor, channels) {
        (Nearest, _, 1) => RowKernel::Nearest {
            replicate: sse41::replicate1,
        },
        (Nearest, _, 4) => RowKernel::Nearest {
            replicate: sse41::replicate4,
        },
        (Interp, Factor::Two, 1) => RowKernel::Interp {
            row: sse41::interp2_row1,
        },
        (Interp, Factor::Two, 4) => RowKernel::Interp {
            row: sse41::interp2_row4,
        },
        (Interp, Factor::Four, 1) => RowKernel::Interp {
            row: sse41::interp4_row1,
        },
        (Interp, Factor::Four, 4) => RowKernel::Interp {
            row: sse41::interp4_row4,
        },
        (Mitchell, Factor::Two | Factor::Four, _) => RowKernel::MitchellRing {
            accumulate: ring_accumulate(channels)?,
            combine: sse41::combine,
        },
        _ => return None,
    };
    Some(kernel)
}

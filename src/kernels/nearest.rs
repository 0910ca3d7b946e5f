//! Nearest-neighbour replication for factors 2, 4 and 8.

use super::{ReplicateFn, RowGeometry};

/// Replicate each `C`-sample pixel `factor` times
pub fn replicate<const C: usize>(src: &[u8], dst: &mut [u8], geo: &RowGeometry) {
    let src = &src[..geo.width * C];
    let dst = &mut dst[..geo.width * C * geo.factor];
    for (px, out) in src
        .chunks_exact(C)
        .zip(dst.chunks_exact_mut(C * geo.factor))
    {
        for slot in out.chunks_exact_mut(C) {
            slot.copy_from_slice(px);
        }
    }
}

/// Runtime-channel variant for pixel layouts without a specialised kernel
pub fn replicate_any(src: &[u8], dst: &mut [u8], geo: &RowGeometry) {
    let c = geo.channels;
    let src = &src[..geo.src_len()];
    let dst = &mut dst[..geo.dst_len()];
    for (px, out) in src.chunks_exact(c).zip(dst.chunks_exact_mut(c * geo.factor)) {
        for slot in out.chunks_exact_mut(c) {
            slot.copy_from_slice(px);
        }
    }
}

/// Write `factor` identical rows from `src`. Returns the number of rows.
pub fn expand(
    replicate: ReplicateFn,
    src: &[u8],
    dst: &mut [&mut [u8]],
    geo: &RowGeometry,
) -> usize {
    let len = geo.dst_len();
    let (first, rest) = dst[..geo.factor].split_at_mut(1);
    replicate(src, &mut first[0][..], geo);
    for row in rest {
        row[..len].copy_from_slice(&first[0][..len]);
    }
    geo.factor
}

//! Linear interpolation kernels.
//!
//! Factor 2 uses the separable 3/4 + 1/4 filter with a single rounding step:
//! the vertical pass keeps its sums (scale 4) and the horizontal pass rounds
//! the combined scale-16 value. Factor 4 uses a cascade of rounded pairwise
//! averages, which the vector path reproduces with `pavgb`.
//!
//! Both factors treat the missing neighbour at a row end as a copy of the
//! edge sample. An edge row (no vertical neighbour) is the body computed with
//! the same row passed twice.

use super::{InterpRowFn, RowGeometry};

// ==============================================================================
// Factor 2
// ==============================================================================

#[inline(always)]
fn vsum(near: &[u8], far: &[u8], i: usize) -> u16 {
    3 * near[i] as u16 + far[i] as u16
}

/// First and last pixel of a factor-2 row
#[inline]
pub(crate) fn interp2_edges<const C: usize>(near: &[u8], far: &[u8], dst: &mut [u8], width: usize) {
    let last = (width - 1) * C;
    let out_last = (2 * width - 1) * C;
    for ch in 0..C {
        dst[ch] = ((vsum(near, far, ch) + 2) >> 2) as u8;
        dst[out_last + ch] = ((vsum(near, far, last + ch) + 2) >> 2) as u8;
    }
}

/// Interior pixel pairs for source columns `x_from..width`
#[inline]
pub(crate) fn interp2_span<const C: usize>(
    near: &[u8],
    far: &[u8],
    dst: &mut [u8],
    x_from: usize,
    width: usize,
) {
    for x in x_from.max(1)..width {
        for ch in 0..C {
            let l = vsum(near, far, (x - 1) * C + ch);
            let r = vsum(near, far, x * C + ch);
            dst[(2 * x - 1) * C + ch] = ((3 * l + r + 8) >> 4) as u8;
            dst[2 * x * C + ch] = ((l + 3 * r + 8) >> 4) as u8;
        }
    }
}

/// Factor-2 row. Phase 0 sits a quarter below `top`, phase 1 a quarter
/// above `bottom`.
pub fn interp2_row<const C: usize>(
    top: &[u8],
    bottom: &[u8],
    phase: usize,
    dst: &mut [u8],
    geo: &RowGeometry,
) {
    let (near, far) = if phase == 0 { (top, bottom) } else { (bottom, top) };
    interp2_edges::<C>(near, far, dst, geo.width);
    interp2_span::<C>(near, far, dst, 1, geo.width);
}

// ==============================================================================
// Factor 4
// ==============================================================================

/// Rounded mean, identical to `_mm_avg_epu8`
#[inline(always)]
pub fn avg(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16 + 1) >> 1) as u8
}

/// Four sub-positions between `l` and `r` (1/16, 6/16, 10/16, 15/16)
#[inline(always)]
pub fn quad(l: u8, r: u8) -> [u8; 4] {
    let m = avg(l, r);
    let l3 = avg(l, m);
    let l7 = avg(l, l3);
    let r3 = avg(r, m);
    let r7 = avg(r, r3);
    [avg(l, l7), avg(m, l3), avg(m, r3), avg(r, r7)]
}

#[inline(always)]
fn vquad(top: &[u8], bottom: &[u8], phase: usize, i: usize) -> u8 {
    quad(top[i], bottom[i])[phase]
}

/// Two leading and two trailing pixels of a factor-4 row
#[inline]
pub(crate) fn interp4_edges<const C: usize>(
    top: &[u8],
    bottom: &[u8],
    phase: usize,
    dst: &mut [u8],
    width: usize,
) {
    let last = (width - 1) * C;
    let out_last = (4 * width - 2) * C;
    for ch in 0..C {
        let first = vquad(top, bottom, phase, ch);
        dst[ch] = first;
        dst[C + ch] = first;
        let end = vquad(top, bottom, phase, last + ch);
        dst[out_last + ch] = end;
        dst[out_last + C + ch] = end;
    }
}

/// Interior quads for source columns `x_from..width`
#[inline]
pub(crate) fn interp4_span<const C: usize>(
    top: &[u8],
    bottom: &[u8],
    phase: usize,
    dst: &mut [u8],
    x_from: usize,
    width: usize,
) {
    for x in x_from.max(1)..width {
        let base = (4 * x - 2) * C;
        for ch in 0..C {
            let l = vquad(top, bottom, phase, (x - 1) * C + ch);
            let r = vquad(top, bottom, phase, x * C + ch);
            let q = quad(l, r);
            for (k, v) in q.into_iter().enumerate() {
                dst[base + k * C + ch] = v;
            }
        }
    }
}

/// Factor-4 row for vertical phase `phase` in `0..4`
pub fn interp4_row<const C: usize>(
    top: &[u8],
    bottom: &[u8],
    phase: usize,
    dst: &mut [u8],
    geo: &RowGeometry,
) {
    interp4_edges::<C>(top, bottom, phase, dst, geo.width);
    interp4_span::<C>(top, bottom, phase, dst, 1, geo.width);
}

// ==============================================================================
// Row-set drivers
// ==============================================================================

/// Blend two source rows into `factor` destination rows
pub fn body(
    row: InterpRowFn,
    top: &[u8],
    bottom: &[u8],
    dst: &mut [&mut [u8]],
    geo: &RowGeometry,
) -> usize {
    for (phase, out) in dst[..geo.factor].iter_mut().enumerate() {
        row(top, bottom, phase, out, geo);
    }
    geo.factor
}

/// First or last source row: horizontal filtering only, `factor / 2` rows
pub fn edge(row: InterpRowFn, src: &[u8], dst: &mut [&mut [u8]], geo: &RowGeometry) -> usize {
    let rows = geo.factor / 2;
    let len = geo.dst_len();
    let (first, rest) = dst[..rows].split_at_mut(1);
    row(src, src, 0, &mut first[0][..], geo);
    for out in rest {
        out[..len].copy_from_slice(&first[0][..len]);
    }
    rows
}

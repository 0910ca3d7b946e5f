//! SSE4.1 row kernels.
//!
//! Each wrapper has the same signature and the same output as its scalar
//! counterpart; interior blocks run in vector registers and the row ends
//! fall back to the scalar helpers. The module is crate-private: the only
//! caller is the dispatcher, which installs these after
//! [`super::simd_available`] reported SSE4.1.

use std::arch::x86_64::*;

use super::{interp, mitchell, nearest, RowGeometry};

#[inline(always)]
unsafe fn load(ptr: *const u8) -> __m128i {
    _mm_loadu_si128(ptr as *const __m128i)
}

#[inline(always)]
unsafe fn load8(ptr: *const u8) -> __m128i {
    _mm_loadl_epi64(ptr as *const __m128i)
}

#[inline(always)]
unsafe fn store(ptr: *mut u8, v: __m128i) {
    _mm_storeu_si128(ptr as *mut __m128i, v)
}

// ==============================================================================
// Nearest
// ==============================================================================

/// Gray replication, 16 source pixels per block
pub fn replicate1(src: &[u8], dst: &mut [u8], geo: &RowGeometry) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { replicate1_impl(src, dst, geo) }
}

#[target_feature(enable = "sse4.1")]
unsafe fn replicate1_impl(src: &[u8], dst: &mut [u8], geo: &RowGeometry) {
    let (width, f) = (geo.width, geo.factor);
    let src = &src[..width];
    let dst = &mut dst[..width * f];
    let blocks = width / 16;
    for blk in 0..blocks {
        let v = load(src.as_ptr().add(blk * 16));
        let out = dst.as_mut_ptr().add(blk * 16 * f);
        let lo = _mm_unpacklo_epi8(v, v);
        let hi = _mm_unpackhi_epi8(v, v);
        match f {
            2 => {
                store(out, lo);
                store(out.add(16), hi);
            }
            4 => {
                store(out, _mm_unpacklo_epi16(lo, lo));
                store(out.add(16), _mm_unpackhi_epi16(lo, lo));
                store(out.add(32), _mm_unpacklo_epi16(hi, hi));
                store(out.add(48), _mm_unpackhi_epi16(hi, hi));
            }
            _ => {
                for (k, half) in [lo, hi].into_iter().enumerate() {
                    let q0 = _mm_unpacklo_epi16(half, half);
                    let q1 = _mm_unpackhi_epi16(half, half);
                    let base = out.add(k * 64);
                    store(base, _mm_unpacklo_epi32(q0, q0));
                    store(base.add(16), _mm_unpackhi_epi32(q0, q0));
                    store(base.add(32), _mm_unpacklo_epi32(q1, q1));
                    store(base.add(48), _mm_unpackhi_epi32(q1, q1));
                }
            }
        }
    }
    let done = blocks * 16;
    nearest::replicate::<1>(
        &src[done..],
        &mut dst[done * f..],
        &RowGeometry::new(width - done, 1, f),
    );
}

/// Four-channel replication, four source pixels per block
pub fn replicate4(src: &[u8], dst: &mut [u8], geo: &RowGeometry) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { replicate4_impl(src, dst, geo) }
}

#[target_feature(enable = "sse4.1")]
unsafe fn replicate4_impl(src: &[u8], dst: &mut [u8], geo: &RowGeometry) {
    let (width, f) = (geo.width, geo.factor);
    let src = &src[..width * 4];
    let dst = &mut dst[..width * 4 * f];
    let blocks = width / 4;
    for blk in 0..blocks {
        let v = load(src.as_ptr().add(blk * 16));
        let out = dst.as_mut_ptr().add(blk * 16 * f);
        if f == 2 {
            store(out, _mm_unpacklo_epi32(v, v));
            store(out.add(16), _mm_unpackhi_epi32(v, v));
            continue;
        }
        let lanes = [
            _mm_shuffle_epi32(v, 0x00),
            _mm_shuffle_epi32(v, 0x55),
            _mm_shuffle_epi32(v, 0xAA),
            _mm_shuffle_epi32(v, 0xFF),
        ];
        // Each broadcast vector holds four copies of one pixel.
        let copies = f / 4;
        for (k, lane) in lanes.into_iter().enumerate() {
            for c in 0..copies {
                store(out.add((k * copies + c) * 16), lane);
            }
        }
    }
    let done = blocks * 4;
    nearest::replicate::<4>(
        &src[done * 4..],
        &mut dst[done * 4 * f..],
        &RowGeometry::new(width - done, 4, f),
    );
}

// ==============================================================================
// Interp
// ==============================================================================

/// Factor-2 interpolation, gray
pub fn interp2_row1(top: &[u8], bottom: &[u8], phase: usize, dst: &mut [u8], geo: &RowGeometry) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { interp2_row_impl::<1>(top, bottom, phase, dst, geo) }
}

/// Factor-2 interpolation, four channels
pub fn interp2_row4(top: &[u8], bottom: &[u8], phase: usize, dst: &mut [u8], geo: &RowGeometry) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { interp2_row_impl::<4>(top, bottom, phase, dst, geo) }
}

#[target_feature(enable = "sse4.1")]
unsafe fn interp2_row_impl<const C: usize>(
    top: &[u8],
    bottom: &[u8],
    phase: usize,
    dst: &mut [u8],
    geo: &RowGeometry,
) {
    let width = geo.width;
    let (near, far) = if phase == 0 { (top, bottom) } else { (bottom, top) };
    let near = &near[..width * C];
    let far = &far[..width * C];
    let dst = &mut dst[..2 * width * C];
    interp::interp2_edges::<C>(near, far, dst, width);

    // Eight 16-bit lanes: 8 gray pixels or 2 four-channel pixels.
    let step = 8 / C;
    let three = _mm_set1_epi16(3);
    let eight = _mm_set1_epi16(8);
    let mut x = 1;
    while x + step <= width {
        let l_off = (x - 1) * C;
        let r_off = x * C;
        let nl = _mm_cvtepu8_epi16(load8(near.as_ptr().add(l_off)));
        let fl = _mm_cvtepu8_epi16(load8(far.as_ptr().add(l_off)));
        let nr = _mm_cvtepu8_epi16(load8(near.as_ptr().add(r_off)));
        let fr = _mm_cvtepu8_epi16(load8(far.as_ptr().add(r_off)));
        let l = _mm_add_epi16(_mm_mullo_epi16(nl, three), fl);
        let r = _mm_add_epi16(_mm_mullo_epi16(nr, three), fr);
        let lo = _mm_add_epi16(_mm_mullo_epi16(l, three), r);
        let hi = _mm_add_epi16(l, _mm_mullo_epi16(r, three));
        let lo = _mm_srli_epi16(_mm_add_epi16(lo, eight), 4);
        let hi = _mm_srli_epi16(_mm_add_epi16(hi, eight), 4);
        let lo = _mm_packus_epi16(lo, lo);
        let hi = _mm_packus_epi16(hi, hi);
        let out = if C == 1 {
            _mm_unpacklo_epi8(lo, hi)
        } else {
            _mm_unpacklo_epi32(lo, hi)
        };
        store(dst.as_mut_ptr().add((2 * x - 1) * C), out);
        x += step;
    }
    interp::interp2_span::<C>(near, far, dst, x, width);
}

#[inline(always)]
unsafe fn avg(a: __m128i, b: __m128i) -> __m128i {
    _mm_avg_epu8(a, b)
}

#[inline(always)]
unsafe fn quad(l: __m128i, r: __m128i) -> [__m128i; 4] {
    let m = avg(l, r);
    let l3 = avg(l, m);
    let l7 = avg(l, l3);
    let r3 = avg(r, m);
    let r7 = avg(r, r3);
    [avg(l, l7), avg(m, l3), avg(m, r3), avg(r, r7)]
}

/// Factor-4 interpolation, gray
pub fn interp4_row1(top: &[u8], bottom: &[u8], phase: usize, dst: &mut [u8], geo: &RowGeometry) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { interp4_row_impl::<1>(top, bottom, phase, dst, geo) }
}

/// Factor-4 interpolation, four channels
pub fn interp4_row4(top: &[u8], bottom: &[u8], phase: usize, dst: &mut [u8], geo: &RowGeometry) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { interp4_row_impl::<4>(top, bottom, phase, dst, geo) }
}

#[target_feature(enable = "sse4.1")]
unsafe fn interp4_row_impl<const C: usize>(
    top: &[u8],
    bottom: &[u8],
    phase: usize,
    dst: &mut [u8],
    geo: &RowGeometry,
) {
    let width = geo.width;
    let top = &top[..width * C];
    let bottom = &bottom[..width * C];
    let dst = &mut dst[..4 * width * C];
    interp::interp4_edges::<C>(top, bottom, phase, dst, width);

    // Sixteen byte lanes: 16 gray pixels or 4 four-channel pixels.
    let step = 16 / C;
    let mut x = 1;
    while x + step <= width {
        let l_off = (x - 1) * C;
        let r_off = x * C;
        let l = quad(load(top.as_ptr().add(l_off)), load(bottom.as_ptr().add(l_off)))[phase];
        let r = quad(load(top.as_ptr().add(r_off)), load(bottom.as_ptr().add(r_off)))[phase];
        let [a, b, c, d] = quad(l, r);
        let out = dst.as_mut_ptr().add((4 * x - 2) * C);
        if C == 1 {
            let ab_lo = _mm_unpacklo_epi8(a, b);
            let ab_hi = _mm_unpackhi_epi8(a, b);
            let cd_lo = _mm_unpacklo_epi8(c, d);
            let cd_hi = _mm_unpackhi_epi8(c, d);
            store(out, _mm_unpacklo_epi16(ab_lo, cd_lo));
            store(out.add(16), _mm_unpackhi_epi16(ab_lo, cd_lo));
            store(out.add(32), _mm_unpacklo_epi16(ab_hi, cd_hi));
            store(out.add(48), _mm_unpackhi_epi16(ab_hi, cd_hi));
        } else {
            let ab_lo = _mm_unpacklo_epi32(a, b);
            let ab_hi = _mm_unpackhi_epi32(a, b);
            let cd_lo = _mm_unpacklo_epi32(c, d);
            let cd_hi = _mm_unpackhi_epi32(c, d);
            store(out, _mm_unpacklo_epi64(ab_lo, cd_lo));
            store(out.add(16), _mm_unpackhi_epi64(ab_lo, cd_lo));
            store(out.add(32), _mm_unpacklo_epi64(ab_hi, cd_hi));
            store(out.add(48), _mm_unpackhi_epi64(ab_hi, cd_hi));
        }
        x += step;
    }
    interp::interp4_span::<C>(top, bottom, phase, dst, x, width);
}

// ==============================================================================
// Mitchell
// ==============================================================================

/// Vertical combine of four accumulator rows, four lanes per block
pub fn combine(rows: [&[i32]; 4], weights: &[i32; 4], dst: &mut [u8]) {
    debug_assert!(is_x86_feature_detected!("sse4.1"));
    unsafe { combine_impl(rows, weights, dst) }
}

#[target_feature(enable = "sse4.1")]
unsafe fn combine_impl(rows: [&[i32]; 4], weights: &[i32; 4], dst: &mut [u8]) {
    let len = rows[0].len();
    let [a, b, c, d] = rows.map(|r| &r[..len]);
    let dst = &mut dst[..len];
    let w0 = _mm_set1_epi32(weights[0]);
    let w1 = _mm_set1_epi32(weights[1]);
    let w2 = _mm_set1_epi32(weights[2]);
    let w3 = _mm_set1_epi32(weights[3]);
    let round = _mm_set1_epi32(512 << mitchell::WEIGHT_SHIFT);
    let mut i = 0;
    while i + 4 <= len {
        let sa = _mm_mullo_epi32(_mm_loadu_si128(a.as_ptr().add(i) as *const __m128i), w0);
        let sb = _mm_mullo_epi32(_mm_loadu_si128(b.as_ptr().add(i) as *const __m128i), w1);
        let sc = _mm_mullo_epi32(_mm_loadu_si128(c.as_ptr().add(i) as *const __m128i), w2);
        let sd = _mm_mullo_epi32(_mm_loadu_si128(d.as_ptr().add(i) as *const __m128i), w3);
        let sum = _mm_add_epi32(_mm_add_epi32(sa, sb), _mm_add_epi32(sc, sd));
        let sum = _mm_srai_epi32(_mm_add_epi32(sum, round), 2 * mitchell::WEIGHT_SHIFT as i32);
        // Signed 32 -> unsigned 16 -> unsigned 8 saturation is the clamp.
        let packed = _mm_packus_epi32(sum, sum);
        let packed = _mm_packus_epi16(packed, packed);
        let bytes = (_mm_cvtsi128_si32(packed) as u32).to_le_bytes();
        dst[i..i + 4].copy_from_slice(&bytes);
        i += 4;
    }
    mitchell::combine([&a[i..], &b[i..], &c[i..], &d[i..]], weights, &mut dst[i..]);
}

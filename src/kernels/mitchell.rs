//! Mitchell-Netravali cubic kernels in 10-bit fixed point.
//!
//! Every output sample is the 4x4 weighted sum of its clamp-to-edge source
//! neighbourhood, rounded once after both axes:
//!
//! ```text
//! out = clamp((sum_j sum_k Pv[j] * Ph[k] * s[j][k] + (512 << 10)) >> 20, 0, 255)
//! ```
//!
//! Two evaluation orders are provided. The inline path sums vertically into a
//! column scratch and then filters horizontally. The ring path filters each
//! source row horizontally into i32 accumulators once, keeps four of them,
//! and combines vertically. The double sum is exact in i32 so both orders
//! yield the same bytes.

use super::{clamp_index, RowGeometry};

/// Fixed-point precision of one weight
pub const WEIGHT_SHIFT: u32 = 10;

const ROUND: i32 = 512 << WEIGHT_SHIFT;

/// Factor 2: positions 1/4 and 3/4 between the middle two taps
pub const PHASES_X2: [[i32; 4]; 2] = [[-24, 801, 262, -15], [-15, 262, 801, -24]];

/// Factor 4: positions 1/8, 3/8, 5/8 and 7/8 between the middle two taps
pub const PHASES_X4: [[i32; 4]; 4] = [
    [5, 881, 143, -5],
    [-36, 685, 402, -27],
    [-27, 402, 685, -36],
    [-5, 143, 881, 5],
];

/// Weight sets for a factor, one per output phase
pub fn phases(factor: usize) -> &'static [[i32; 4]] {
    match factor {
        4 => &PHASES_X4,
        _ => &PHASES_X2,
    }
}

/// Round a scale-2^20 sum back to a sample
#[inline(always)]
pub fn round_clamp(acc: i32) -> u8 {
    ((acc + ROUND) >> (2 * WEIGHT_SHIFT)).clamp(0, 255) as u8
}

// ==============================================================================
// Horizontal filter
// ==============================================================================

/// Horizontal Mitchell filter of one row of `C`-channel samples.
///
/// Walks tap windows starting at `i = -2 ..= width - 2`; the first window
/// only contributes the upper half of its phases and the last one only the
/// lower half, which yields exactly `factor * width` output pixels.
#[inline(always)]
fn filter_row<const C: usize, S, D>(
    src: &[S],
    dst: &mut [D],
    geo: &RowGeometry,
    finish: impl Fn(i32) -> D,
) where
    S: Copy + Into<i32>,
{
    let width = geo.width;
    let factor = geo.factor;
    let weights = phases(factor);
    let half = factor / 2;
    let mut out = 0;
    for i in -2..=(width as isize - 2) {
        let taps = [
            clamp_index(i, width) * C,
            clamp_index(i + 1, width) * C,
            clamp_index(i + 2, width) * C,
            clamp_index(i + 3, width) * C,
        ];
        let span = if i == -2 {
            half..factor
        } else if i == width as isize - 2 {
            0..half
        } else {
            0..factor
        };
        for p in span {
            let w = &weights[p];
            for ch in 0..C {
                let acc = w[0] * src[taps[0] + ch].into()
                    + w[1] * src[taps[1] + ch].into()
                    + w[2] * src[taps[2] + ch].into()
                    + w[3] * src[taps[3] + ch].into();
                dst[out + ch] = finish(acc);
            }
            out += C;
        }
    }
}

// ==============================================================================
// Inline path
// ==============================================================================

/// One destination row: vertical weights into `columns`, then horizontal
pub fn mitchell_row<const C: usize>(
    rows: [&[u8]; 4],
    weights: &[i32; 4],
    columns: &mut [i32],
    dst: &mut [u8],
    geo: &RowGeometry,
) {
    let len = geo.width * C;
    let [a, b, c, d] = rows;
    for (i, col) in columns[..len].iter_mut().enumerate() {
        *col = weights[0] * a[i] as i32
            + weights[1] * b[i] as i32
            + weights[2] * c[i] as i32
            + weights[3] * d[i] as i32;
    }
    filter_row::<C, i32, u8>(&columns[..len], dst, geo, round_clamp);
}

// ==============================================================================
// Ring path
// ==============================================================================

/// Horizontal pass of one source row into `factor * width * C` accumulators
pub fn accumulate<const C: usize>(src: &[u8], acc: &mut [i32], geo: &RowGeometry) {
    filter_row::<C, u8, i32>(&src[..geo.width * C], acc, geo, |v| v);
}

/// Vertical combine of four accumulator rows into one destination row
pub fn combine(rows: [&[i32]; 4], weights: &[i32; 4], dst: &mut [u8]) {
    let [a, b, c, d] = rows;
    let len = a.len();
    for (i, out) in dst[..len].iter_mut().enumerate() {
        *out = round_clamp(
            weights[0] * a[i] + weights[1] * b[i] + weights[2] * c[i] + weights[3] * d[i],
        );
    }
}

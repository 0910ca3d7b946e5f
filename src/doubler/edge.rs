//! Image-edge policy for INTERP and Mitchell upscaling.
//!
//! A Mitchell output row needs four source rows. Near the top and bottom of
//! the image the missing ones are replaced by the nearest real row. The
//! windowed path reads that situation off the presence pattern of the input
//! window; the ring path derives it from how many rows it has accumulated.
//! Both must produce the same rows for the same call, for any height.

use std::ops::Range;

use super::DoublerError;

/// Which of a window's output phases a call emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSpan {
    /// Every phase: a regular call
    All,
    /// First half: the last rows of the image
    Lower,
    /// Second half: the first rows of the image
    Upper,
}

impl PhaseSpan {
    pub fn range(self, factor: usize) -> Range<usize> {
        match self {
            PhaseSpan::All => 0..factor,
            PhaseSpan::Lower => 0..factor / 2,
            PhaseSpan::Upper => factor / 2..factor,
        }
    }

    pub fn rows(self, factor: usize) -> usize {
        self.range(factor).len()
    }
}

fn presence(window: &[Option<&[u8]>]) -> Vec<bool> {
    window.iter().map(Option::is_some).collect()
}

/// Resolve a four-slot window into the rows to filter.
///
/// `Ok(None)` means the call produces nothing (priming or drained).
pub fn mitchell_window<'a>(
    window: &[Option<&'a [u8]>],
) -> Result<Option<([&'a [u8]; 4], PhaseSpan)>, DoublerError> {
    let resolved = match (window[0], window[1], window[2], window[3]) {
        (None, None, None, Some(_)) => None,
        (None, None, Some(a), Some(b)) => Some(([a, a, a, b], PhaseSpan::Upper)),
        (None, None, Some(a), None) => Some(([a, a, a, a], PhaseSpan::Upper)),
        (None, Some(a), Some(b), Some(c)) => Some(([a, a, b, c], PhaseSpan::All)),
        (None, Some(a), Some(b), None) => Some(([a, a, b, b], PhaseSpan::All)),
        (Some(a), Some(b), Some(c), Some(d)) => Some(([a, b, c, d], PhaseSpan::All)),
        (Some(a), Some(b), Some(c), None) => Some(([a, b, c, c], PhaseSpan::All)),
        (Some(a), Some(b), None, None) => Some(([a, b, b, b], PhaseSpan::Lower)),
        (None, Some(a), None, None) => Some(([a, a, a, a], PhaseSpan::Lower)),
        (Some(_), None, None, None) => None,
        _ => {
            return Err(DoublerError::InvalidWindow {
                present: presence(window),
            })
        }
    };
    Ok(resolved)
}

/// Interp windows: either both rows or exactly one
pub fn interp_window<'a>(window: &[Option<&'a [u8]>]) -> Result<InterpRows<'a>, DoublerError> {
    match (window[0], window[1]) {
        (Some(top), Some(bottom)) => Ok(InterpRows::Pair(top, bottom)),
        (Some(row), None) | (None, Some(row)) => Ok(InterpRows::Edge(row)),
        (None, None) => Err(DoublerError::InvalidWindow {
            present: presence(window),
        }),
    }
}

#[derive(Debug, Clone, Copy)]
pub enum InterpRows<'a> {
    Pair(&'a [u8], &'a [u8]),
    Edge(&'a [u8]),
}

// ==============================================================================
// Ring phases
// ==============================================================================

/// Stage of the ring path, keyed on the number of rows accumulated so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPhase {
    /// First row stored, nothing to emit
    Priming,
    /// (A, A, A, B): upper half of the first interval
    Leading,
    /// (A, A, B, C)
    SecondLeading,
    /// Four distinct rows
    Body,
    /// (A, B, C, C)
    Trailing,
    /// (A, B, B, B): lower half of the last interval
    Final,
    /// Past the last output row
    Exhausted,
}

impl RingPhase {
    /// Classify call number `tmp_y` of an image `height` rows tall.
    ///
    /// Short images make several conditions true at once; the order below
    /// picks the one whose row pattern is still correct after clamping.
    pub fn classify(tmp_y: usize, height: usize) -> Self {
        if tmp_y == 0 {
            RingPhase::Priming
        } else if tmp_y == height + 1 {
            RingPhase::Final
        } else if tmp_y == 1 {
            RingPhase::Leading
        } else if tmp_y == 2 {
            RingPhase::SecondLeading
        } else if tmp_y == height {
            RingPhase::Trailing
        } else if tmp_y > height + 1 {
            RingPhase::Exhausted
        } else {
            RingPhase::Body
        }
    }

    /// Source rows (clamped into the image) and phases for this call
    pub fn taps(self, tmp_y: usize, height: usize) -> Option<([usize; 4], PhaseSpan)> {
        let y = tmp_y as isize;
        let (rows, span) = match self {
            RingPhase::Priming | RingPhase::Exhausted => return None,
            RingPhase::Leading => ([y - 1, y - 1, y - 1, y], PhaseSpan::Upper),
            RingPhase::SecondLeading => ([y - 2, y - 2, y - 1, y], PhaseSpan::All),
            RingPhase::Body => ([y - 3, y - 2, y - 1, y], PhaseSpan::All),
            RingPhase::Trailing => ([y - 3, y - 2, y - 1, y - 1], PhaseSpan::All),
            RingPhase::Final => ([y - 3, y - 2, y - 2, y - 2], PhaseSpan::Lower),
        };
        let last = height as isize - 1;
        Some((rows.map(|r| r.clamp(0, last) as usize), span))
    }
}

//! Whole-image driver over the streaming protocol.
//!
//! Call `n` of a doubler with support `s` receives source rows
//! `n - (s - 1) ..= n`, with rows outside the image passed as `None`. The
//! driver runs `height + s - 1` such calls and stacks the produced rows.

use crate::context::Context;
use crate::doubler::{Doubler, DoublerConfig, DoublerError};

/// Upscale a tightly packed `width x height x channels` image
pub fn upscale(ctx: &Context, config: &DoublerConfig, src: &[u8]) -> Result<Vec<u8>, DoublerError> {
    let mut doubler = Doubler::new(ctx, *config)?;
    run(&mut doubler, src)
}

/// Input window for call `call` with `support` rows
pub fn window<'a>(rows: &[&'a [u8]], call: usize, support: usize) -> Vec<Option<&'a [u8]>> {
    (0..support)
        .map(|k| {
            (call + k)
                .checked_sub(support - 1)
                .and_then(|r| rows.get(r).copied())
        })
        .collect()
}

/// Drive a freshly created doubler over `src` and return the output image
pub fn run(doubler: &mut Doubler, src: &[u8]) -> Result<Vec<u8>, DoublerError> {
    let src_len = doubler.input_row_len();
    let expected = src_len * doubler.height();
    if src.len() < expected {
        return Err(DoublerError::ImageTooShort {
            expected,
            actual: src.len(),
        });
    }

    let rows: Vec<&[u8]> = src[..expected].chunks_exact(src_len).collect();
    let dst_len = doubler.output_row_len();
    let factor = doubler.factor().get();
    let support = doubler.support();
    let mut out = vec![0u8; dst_len * factor * rows.len()];
    let mut written = 0;

    for call in 0..doubler.expected_calls() {
        let input = window(&rows, call, support);
        let mut dst: Vec<&mut [u8]> = out[written * dst_len..]
            .chunks_exact_mut(dst_len)
            .take(factor)
            .collect();
        written += doubler.process(&input, &mut dst)?;
    }

    log::debug!("upscaled {} rows into {}", rows.len(), written);
    Ok(out)
}

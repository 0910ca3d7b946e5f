//! Streaming doubler
//!
//! A [`Doubler`] upscales one source scanline per call. The caller supplies a
//! window of `support` rows (newest last, `None` outside the image) and
//! receives up to `factor` destination rows back. The controller owns kernel
//! selection, scratch memory and the per-call state machine; the arithmetic
//! lives in [`crate::kernels`].

pub mod dispatch;
pub mod edge;
pub mod ring;

use std::sync::Arc;

use crate::context::Context;
use crate::kernels::{
    interp, mitchell, nearest, AccumulateFn, CombineFn, InterpRowFn, MitchellRowFn, ReplicateFn,
    RowGeometry, RowKernel,
};
use crate::memory::{AccumBuffer, Allocator};

use edge::{InterpRows, RingPhase};
use ring::AccumRing;

// ==============================================================================
// Errors
// ==============================================================================

/// Errors reported by doubler creation and processing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DoublerError {
    #[error("Invalid scale factor: {factor} (must be 2, 4 or 8)")]
    InvalidFactor { factor: u32 },

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Channel count must be at least 1")]
    InvalidChannels,

    #[error("Invalid quality value: {value}")]
    InvalidQuality { value: i32 },

    #[error("No {quality} kernel for {channels} channels")]
    UnsupportedConfiguration { quality: Quality, channels: usize },

    #[error("Out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("Input window has {actual} rows, expected {expected}")]
    WindowTooShort { expected: usize, actual: usize },

    #[error("Invalid input window (present rows: {present:?})")]
    InvalidWindow { present: Vec<bool> },

    #[error("Input row {index} must be present")]
    MissingRow { index: usize },

    #[error("Input row has {actual} bytes, expected at least {expected}")]
    RowTooShort { expected: usize, actual: usize },

    #[error("Source image has {actual} bytes, expected at least {expected}")]
    ImageTooShort { expected: usize, actual: usize },

    #[error("Output has {actual} rows, this call writes {expected}")]
    NotEnoughOutputRows { expected: usize, actual: usize },

    #[error("Output row has {actual} bytes, expected at least {expected}")]
    OutputRowTooShort { expected: usize, actual: usize },

    #[error("Doubler already produced every output row")]
    Finished,
}

// ==============================================================================
// Configuration types
// ==============================================================================

/// Integer upscale factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl Factor {
    pub fn get(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for Factor {
    type Error = DoublerError;

    fn try_from(factor: u32) -> Result<Self, Self::Error> {
        match factor {
            2 => Ok(Factor::Two),
            4 => Ok(Factor::Four),
            8 => Ok(Factor::Eight),
            _ => Err(DoublerError::InvalidFactor { factor }),
        }
    }
}

/// Filter quality; the discriminants are the C wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Nearest = 0,
    Interp = 1,
    Mitchell = 3,
}

impl Quality {
    pub fn from_i32(value: i32) -> Result<Self, DoublerError> {
        match value {
            0 => Ok(Quality::Nearest),
            1 => Ok(Quality::Interp),
            3 => Ok(Quality::Mitchell),
            _ => Err(DoublerError::InvalidQuality { value }),
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Source rows needed per call (`in_lines`)
    pub fn support(self) -> usize {
        match self {
            Quality::Nearest => 1,
            Quality::Interp => 2,
            Quality::Mitchell => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::Nearest => "nearest",
            Quality::Interp => "interp",
            Quality::Mitchell => "mitchell",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Doubler creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoublerConfig {
    /// Source width in pixels
    pub width: usize,
    /// Source height in rows
    pub height: usize,
    /// Requested factor; validated at creation
    pub factor: u32,
    /// Requested quality; may be degraded for narrow images
    pub quality: Quality,
    /// Interleaved samples per pixel
    pub channels: usize,
}

impl DoublerConfig {
    pub fn new(
        width: usize,
        height: usize,
        factor: u32,
        quality: Quality,
        channels: usize,
    ) -> Self {
        Self {
            width,
            height,
            factor,
            quality,
            channels,
        }
    }
}

/// Lifecycle of a doubler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoublerState {
    /// No row processed yet
    Created,
    /// At least one call done, more expected
    Streaming,
    /// Every output row has been produced
    Done,
}

/// Quality actually run for a request.
///
/// Mitchell needs four source columns and interp two; factor 8 only has a
/// replicating kernel.
pub fn effective_quality(requested: Quality, factor: Factor, width: usize) -> Quality {
    let mut quality = requested;
    if quality == Quality::Mitchell && width < 4 {
        quality = Quality::Interp;
    }
    if quality == Quality::Interp && width < 2 {
        quality = Quality::Nearest;
    }
    if factor == Factor::Eight {
        quality = Quality::Nearest;
    }
    if quality != requested {
        log::warn!(
            "{} not available for width {} at factor {}, using {}",
            requested,
            width,
            factor.get(),
            quality
        );
    }
    quality
}

// ==============================================================================
// Engine
// ==============================================================================

/// Selected kernels together with the scratch they need
enum Engine {
    Nearest {
        replicate: ReplicateFn,
    },
    Interp {
        row: InterpRowFn,
    },
    Mitchell {
        row: MitchellRowFn,
        columns: AccumBuffer,
    },
    MitchellRing {
        accumulate: AccumulateFn,
        combine: CombineFn,
        ring: AccumRing,
    },
}

impl Engine {
    fn build(
        kernel: RowKernel,
        geo: &RowGeometry,
        allocator: Arc<dyn Allocator>,
    ) -> Result<Self, DoublerError> {
        Ok(match kernel {
            RowKernel::Nearest { replicate } => Engine::Nearest { replicate },
            RowKernel::Interp { row } => Engine::Interp { row },
            RowKernel::Mitchell { row } => Engine::Mitchell {
                row,
                columns: AccumBuffer::zeroed(allocator, geo.src_len())?,
            },
            RowKernel::MitchellRing { accumulate, combine } => Engine::MitchellRing {
                accumulate,
                combine,
                ring: AccumRing::new(allocator, geo.dst_len())?,
            },
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Engine::Nearest { .. } => "nearest",
            Engine::Interp { .. } => "interp",
            Engine::Mitchell { .. } => "mitchell",
            Engine::MitchellRing { .. } => "mitchell-ring",
        }
    }

    /// Run one call. Nothing is mutated unless every check passes.
    fn run(
        &mut self,
        window: &[Option<&[u8]>],
        output: &mut [&mut [u8]],
        geo: &RowGeometry,
        height: usize,
    ) -> Result<usize, DoublerError> {
        let factor = geo.factor;
        let dst_len = geo.dst_len();

        match self {
            Engine::Nearest { replicate } => {
                let src = window[0].ok_or(DoublerError::MissingRow { index: 0 })?;
                check_output(output, factor, dst_len)?;
                Ok(nearest::expand(*replicate, src, output, geo))
            }
            Engine::Interp { row } => match edge::interp_window(window)? {
                InterpRows::Pair(top, bottom) => {
                    check_output(output, factor, dst_len)?;
                    Ok(interp::body(*row, top, bottom, output, geo))
                }
                InterpRows::Edge(src) => {
                    check_output(output, factor / 2, dst_len)?;
                    Ok(interp::edge(*row, src, output, geo))
                }
            },
            Engine::Mitchell { row, columns } => {
                let Some((rows, span)) = edge::mitchell_window(window)? else {
                    return Ok(0);
                };
                let count = span.rows(factor);
                check_output(output, count, dst_len)?;
                let weights = mitchell::phases(factor);
                for (out, p) in output.iter_mut().zip(span.range(factor)) {
                    (*row)(rows, &weights[p], &mut columns[..], &mut out[..], geo);
                }
                Ok(count)
            }
            Engine::MitchellRing {
                accumulate,
                combine,
                ring,
            } => {
                let tmp_y = ring.filled();
                let newest = if tmp_y < height {
                    let index = window.len() - 1;
                    Some(window[index].ok_or(DoublerError::MissingRow { index })?)
                } else {
                    None
                };
                let taps = RingPhase::classify(tmp_y, height).taps(tmp_y, height);
                let count = taps.map_or(0, |(_, span)| span.rows(factor));
                check_output(output, count, dst_len)?;

                if let Some(src) = newest {
                    (*accumulate)(src, ring.row_mut(tmp_y), geo);
                }
                if let Some((rows, span)) = taps {
                    let weights = mitchell::phases(factor);
                    let acc = ring.rows(rows);
                    for (out, p) in output.iter_mut().zip(span.range(factor)) {
                        (*combine)(acc, &weights[p], &mut out[..dst_len]);
                    }
                }
                ring.advance();
                Ok(count)
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn check_output(output: &[&mut [u8]], rows: usize, row_len: usize) -> Result<(), DoublerError> {
    if output.len() < rows {
        return Err(DoublerError::NotEnoughOutputRows {
            expected: rows,
            actual: output.len(),
        });
    }
    if let Some(short) = output[..rows].iter().find(|r| r.len() < row_len) {
        return Err(DoublerError::OutputRowTooShort {
            expected: row_len,
            actual: short.len(),
        });
    }
    Ok(())
}

// ==============================================================================
// Doubler
// ==============================================================================

/// One image's worth of streaming upscaling state
#[derive(Debug)]
pub struct Doubler {
    geometry: RowGeometry,
    height: usize,
    factor: Factor,
    quality: Quality,
    support: usize,
    simd: bool,
    engine: Engine,
    in_y: usize,
    out_y: usize,
    state: DoublerState,
}

impl Doubler {
    /// Validate `config`, pick kernels for it and allocate scratch
    pub fn new(ctx: &Context, config: DoublerConfig) -> Result<Self, DoublerError> {
        let simd = ctx.simd_enabled();
        Self::build(ctx, config, |quality, factor, channels| {
            dispatch::select(quality, factor, channels, simd)
        })
    }

    /// Same as [`Doubler::new`] but Mitchell always runs the scalar ring path
    #[cfg(test)]
    pub(crate) fn with_scalar_ring(
        ctx: &Context,
        config: DoublerConfig,
    ) -> Result<Self, DoublerError> {
        Self::build(ctx, config, |quality, factor, channels| {
            let kernel = match quality {
                Quality::Mitchell => dispatch::scalar_ring(channels),
                _ => dispatch::select_scalar(quality, factor, channels),
            };
            kernel.map(|k| (k, false))
        })
    }

    fn build(
        ctx: &Context,
        config: DoublerConfig,
        choose: impl FnOnce(Quality, Factor, usize) -> Option<(RowKernel, bool)>,
    ) -> Result<Self, DoublerError> {
        let factor = Factor::try_from(config.factor)?;
        if config.width == 0 || config.height == 0 {
            return Err(DoublerError::InvalidDimensions {
                width: config.width,
                height: config.height,
            });
        }
        if config.channels == 0 {
            return Err(DoublerError::InvalidChannels);
        }
        let geometry = RowGeometry::checked(config.width, config.channels, factor.get()).ok_or(
            DoublerError::InvalidDimensions {
                width: config.width,
                height: config.height,
            },
        )?;

        let quality = effective_quality(config.quality, factor, config.width);
        let (kernel, simd) =
            choose(quality, factor, config.channels).ok_or(DoublerError::UnsupportedConfiguration {
                quality,
                channels: config.channels,
            })?;

        let engine = Engine::build(kernel, &geometry, ctx.allocator())?;

        log::debug!(
            "doubler {}x{}x{} factor {} using {} kernel{}",
            config.width,
            config.height,
            config.channels,
            factor.get(),
            engine.name(),
            if simd { " (sse4.1)" } else { "" }
        );

        Ok(Self {
            geometry,
            height: config.height,
            factor,
            quality,
            support: quality.support(),
            simd,
            engine,
            in_y: 0,
            out_y: 0,
            state: DoublerState::Created,
        })
    }

    /// Process one call of the caller protocol.
    ///
    /// `input` holds at least [`support`](Self::support) rows, newest last.
    /// `output` must hold as many rows as this call writes (at most
    /// `factor`), each at least [`output_row_len`](Self::output_row_len)
    /// bytes. Returns the number of rows written.
    pub fn process(
        &mut self,
        input: &[Option<&[u8]>],
        output: &mut [&mut [u8]],
    ) -> Result<usize, DoublerError> {
        if self.state == DoublerState::Done {
            return Err(DoublerError::Finished);
        }
        let window = input.get(..self.support).ok_or(DoublerError::WindowTooShort {
            expected: self.support,
            actual: input.len(),
        })?;
        let src_len = self.geometry.src_len();
        if let Some(short) = window.iter().flatten().find(|r| r.len() < src_len) {
            return Err(DoublerError::RowTooShort {
                expected: src_len,
                actual: short.len(),
            });
        }

        let rows = self.engine.run(window, output, &self.geometry, self.height)?;
        self.advance(rows);
        Ok(rows)
    }

    fn advance(&mut self, rows: usize) {
        if self.state == DoublerState::Created {
            self.state = DoublerState::Streaming;
            log::debug!("doubler streaming");
        }
        self.in_y += 1;
        self.out_y += rows;
        if self.in_y == self.expected_calls() {
            self.state = DoublerState::Done;
            log::debug!("doubler done after {} calls, {} rows", self.in_y, self.out_y);
        }
    }

    /// Source rows per call (`in_lines`)
    pub fn support(&self) -> usize {
        self.support
    }

    /// Calls needed for a whole image
    pub fn expected_calls(&self) -> usize {
        self.height + self.support - 1
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn factor(&self) -> Factor {
        self.factor
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.geometry.channels
    }

    pub fn in_y(&self) -> usize {
        self.in_y
    }

    pub fn out_y(&self) -> usize {
        self.out_y
    }

    pub fn state(&self) -> DoublerState {
        self.state
    }

    pub fn input_row_len(&self) -> usize {
        self.geometry.src_len()
    }

    pub fn output_row_len(&self) -> usize {
        self.geometry.dst_len()
    }

    pub fn uses_simd(&self) -> bool {
        self.simd
    }

    pub fn uses_ring(&self) -> bool {
        matches!(self.engine, Engine::MitchellRing { .. })
    }

    pub fn kernel_name(&self) -> &'static str {
        self.engine.name()
    }
}

// Scanline doubler library
// Streaming 2x/4x/8x image upscaling with scalar and SSE4.1 kernels

pub mod cli;
pub mod config;
pub mod context;
pub mod doubler;
pub mod ffi;
pub mod image;
pub mod kernels;
pub mod logging;
pub mod memory;

pub use cli::Cli;
pub use context::Context;
pub use doubler::{Doubler, DoublerConfig, DoublerError, DoublerState, Factor, Quality};
pub use logging::LogLevel;

use anyhow::{Context, Result};

use crate::doubler::{DoublerConfig, Quality};
use crate::logging::LogLevel;

/// Options for the benchmark binary, set via defaults and the command line
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub size: Size,
    pub factor: u32,
    pub quality: Quality,
    pub channels: usize,
    pub iterations: usize,
    /// Use vector kernels when the CPU has them
    pub simd: bool,
    pub log_level: LogLevel,
}

/// Source image size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            size: Size {
                width: 640,
                height: 480,
            },
            factor: 2,
            quality: Quality::Mitchell,
            channels: 4,
            iterations: 10,
            simd: true,
            log_level: LogLevel::Info,
        }
    }
}

impl BenchOptions {
    pub fn doubler_config(&self) -> DoublerConfig {
        DoublerConfig::new(
            self.size.width,
            self.size.height,
            self.factor,
            self.quality,
            self.channels,
        )
    }
}

/// Parse a size string in the format "WIDTHxHEIGHT"
pub fn parse_size(s: &str) -> Result<Size> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        anyhow::bail!("Size must be in WIDTHxHEIGHT format");
    }

    let width: usize = parts[0].parse().context("Invalid width value")?;
    let height: usize = parts[1].parse().context("Invalid height value")?;

    if width == 0 || height == 0 {
        anyhow::bail!("Size values must be positive");
    }

    Ok(Size { width, height })
}

/// Parse an upscale factor (2, 4 or 8)
pub fn parse_factor(s: &str) -> Result<u32> {
    let factor: u32 = s.parse().context("Invalid factor value")?;
    match factor {
        2 | 4 | 8 => Ok(factor),
        _ => anyhow::bail!("Factor must be 2, 4 or 8, got {}", factor),
    }
}

/// Parse a quality by name or by its numeric value
pub fn parse_quality(s: &str) -> Result<Quality> {
    match s.to_lowercase().as_str() {
        "nearest" | "0" => Ok(Quality::Nearest),
        "interp" | "linear" | "1" => Ok(Quality::Interp),
        "mitchell" | "3" => Ok(Quality::Mitchell),
        _ => anyhow::bail!(
            "Invalid quality: {}. Valid options: nearest, interp, mitchell",
            s
        ),
    }
}

/// Parse a channel count (at least 1)
pub fn parse_channels(s: &str) -> Result<usize> {
    let channels: usize = s.parse().context("Invalid channel count")?;
    if channels == 0 {
        anyhow::bail!("Channel count must be at least 1");
    }
    Ok(channels)
}

use crate::config::{parse_channels, parse_factor, parse_quality, parse_size, BenchOptions};
use crate::logging::LogLevel;
use anyhow::{Context, Result};
use clap::Parser;

/// Scanline doubler benchmark
#[derive(Parser, Debug, Default)]
#[command(name = "scanline-doubler")]
#[command(version)]
#[command(
    about = "Upscale a synthetic image by 2, 4 or 8 and report throughput",
    long_about = None
)]
pub struct Cli {
    /// Source image size (e.g., 640x480)
    #[arg(short, long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Upscale factor (2, 4, 8)
    #[arg(short, long, value_name = "FACTOR")]
    pub factor: Option<String>,

    /// Filter quality (nearest, interp, mitchell)
    #[arg(short, long, value_name = "QUALITY")]
    pub quality: Option<String>,

    /// Samples per pixel
    #[arg(short, long, value_name = "CHANNELS")]
    pub channels: Option<String>,

    /// Number of whole-image runs
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub iterations: Option<String>,

    /// Use the portable kernels only
    #[arg(long = "nosimd")]
    pub nosimd: bool,

    /// Log level (0 = nothing .. 5 = everything)
    #[arg(short, long, value_name = "LEVEL")]
    pub loglevel: Option<String>,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: BenchOptions) -> Result<BenchOptions> {
        if let Some(ref size) = self.size {
            opts.size = parse_size(size).context("Invalid size format")?;
        }

        if let Some(ref factor) = self.factor {
            opts.factor = parse_factor(factor)?;
        }

        if let Some(ref quality) = self.quality {
            opts.quality = parse_quality(quality)?;
        }

        if let Some(ref channels) = self.channels {
            opts.channels = parse_channels(channels)?;
        }

        if let Some(ref n) = self.iterations {
            let n: usize = n.parse().context("Invalid iteration count")?;
            if n == 0 {
                anyhow::bail!("Iteration count must be at least 1");
            }
            opts.iterations = n;
        }

        if self.nosimd {
            opts.simd = false;
        }

        if let Some(ref level) = self.loglevel {
            let level: i32 = level.parse().context("Invalid log level")?;
            opts.log_level = LogLevel::from_i32(level);
        }

        Ok(opts)
    }
}

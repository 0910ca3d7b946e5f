use std::time::Instant;

use anyhow::{Context as _, Result};
use clap::Parser;

use scanline_doubler::config::{BenchOptions, Size};
use scanline_doubler::{image, logging, Cli, Context, Doubler};

/// Diagonal gradient with a little texture so every kernel has work to do
fn synth_image(size: Size, channels: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size.width * size.height * channels);
    for y in 0..size.height {
        for x in 0..size.width {
            for c in 0..channels {
                let v = (x * 255 / size.width.max(1) + y * 3 + c * 40) ^ ((x * y) & 0x1f);
                data.push((v & 0xff) as u8);
            }
        }
    }
    data
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = cli.merge_into_options(BenchOptions::default())?;
    logging::init(options.log_level);

    let mut ctx = Context::new();
    let simd = ctx.force_simd(options.simd);
    log::info!(
        "sse4.1 available: {}, vector kernels: {}",
        ctx.cpu_supports_sse41(),
        simd
    );

    let config = options.doubler_config();
    let src = synth_image(options.size, options.channels);

    // Probe once so configuration errors surface before timing.
    let probe = Doubler::new(&ctx, config).context("Cannot create doubler")?;
    log::info!(
        "{}x{}x{} factor {}: {} kernel ({} requested), {} input rows per call",
        options.size.width,
        options.size.height,
        options.channels,
        probe.factor().get(),
        probe.kernel_name(),
        options.quality,
        probe.support()
    );
    drop(probe);

    let mut checksum = 0;
    let mut out_bytes = 0;
    let start = Instant::now();
    for _ in 0..options.iterations {
        let out = image::upscale(&ctx, &config, &src).context("Upscale failed")?;
        checksum = crc32fast::hash(&out);
        out_bytes = out.len();
    }
    let elapsed = start.elapsed();

    let per_run = elapsed.as_secs_f64() / options.iterations as f64;
    let mpix = (options.size.width * options.size.height) as f64 / per_run / 1e6;
    log::info!(
        "{} runs in {:.3}s ({:.2} ms/run, {:.1} Mpx/s source)",
        options.iterations,
        elapsed.as_secs_f64(),
        per_run * 1e3,
        mpix
    );
    println!("output {} bytes, crc32 {:08x}", out_bytes, checksum);
    Ok(())
}

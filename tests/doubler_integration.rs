//! End-to-end behaviour of the streaming doubler through the public API.

use rstest::rstest;
use scanline_doubler::image;
use scanline_doubler::{Context, Doubler, DoublerConfig, DoublerError, DoublerState, Quality};

fn scalar_ctx() -> Context {
    let mut ctx = Context::new();
    ctx.force_simd(false);
    ctx
}

fn pattern(len: usize, seed: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 97 + seed * 31 + (i >> 3) * 13) % 256) as u8).collect()
}

fn output_rows(count: usize, len: usize) -> Vec<Vec<u8>> {
    vec![vec![0u8; len]; count]
}

fn process(
    d: &mut Doubler,
    window: &[Option<&[u8]>],
    out: &mut [Vec<u8>],
) -> Result<usize, DoublerError> {
    let mut refs: Vec<&mut [u8]> = out.iter_mut().map(|r| r.as_mut_slice()).collect();
    d.process(window, &mut refs)
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_nearest_gray_factor_two() {
    let ctx = Context::new();
    let config = DoublerConfig::new(4, 1, 2, Quality::Nearest, 1);
    let out = image::upscale(&ctx, &config, &[10, 20, 30, 40]).unwrap();
    let row = [10, 10, 20, 20, 30, 30, 40, 40];
    assert_eq!(out.len(), 16);
    assert_eq!(&out[..8], &row);
    assert_eq!(&out[8..], &row);
}

#[test]
fn test_interp_flat_top_edge() {
    let ctx = Context::new();
    let mut d = Doubler::new(&ctx, DoublerConfig::new(2, 1, 2, Quality::Interp, 1)).unwrap();
    let row: &[u8] = &[100, 100];
    let mut out = output_rows(2, 4);

    assert_eq!(process(&mut d, &[None, Some(row)], &mut out).unwrap(), 1);
    assert_eq!(out[0], vec![100; 4]);
    assert_eq!(process(&mut d, &[Some(row), None], &mut out).unwrap(), 1);
    assert_eq!(out[0], vec![100; 4]);
    assert_eq!(d.state(), DoublerState::Done);
}

#[test]
fn test_nearest_rgb_factor_four() {
    let ctx = Context::new();
    let src = pattern(5 * 3 * 3, 1);
    let config = DoublerConfig::new(5, 3, 4, Quality::Nearest, 3);
    let out = image::upscale(&ctx, &config, &src).unwrap();
    let dst_len = 5 * 3 * 4;
    for (oy, row) in out.chunks_exact(dst_len).enumerate() {
        let sy = oy / 4;
        for (px, sample) in row.chunks_exact(3).enumerate() {
            let sx = px / 4;
            let base = (sy * 5 + sx) * 3;
            assert_eq!(sample, &src[base..base + 3], "pixel ({px}, {oy})");
        }
    }
}

// ============================================================================
// Creation
// ============================================================================

#[rstest]
#[case(2, Quality::Nearest, 1)]
#[case(4, Quality::Nearest, 1)]
#[case(8, Quality::Nearest, 1)]
#[case(2, Quality::Interp, 2)]
#[case(4, Quality::Interp, 2)]
#[case(8, Quality::Interp, 1)]
#[case(2, Quality::Mitchell, 4)]
#[case(4, Quality::Mitchell, 4)]
#[case(8, Quality::Mitchell, 1)]
fn test_support(#[case] factor: u32, #[case] quality: Quality, #[case] support: usize) {
    let d = Doubler::new(&Context::new(), DoublerConfig::new(16, 16, factor, quality, 4)).unwrap();
    assert_eq!(d.support(), support);
    assert_eq!(d.expected_calls(), 16 + support - 1);
}

#[rstest]
#[case(3, Quality::Mitchell, Quality::Interp)]
#[case(2, Quality::Mitchell, Quality::Interp)]
#[case(1, Quality::Mitchell, Quality::Nearest)]
#[case(1, Quality::Interp, Quality::Nearest)]
#[case(4, Quality::Mitchell, Quality::Mitchell)]
fn test_narrow_images_degrade(
    #[case] width: usize,
    #[case] requested: Quality,
    #[case] effective: Quality,
) {
    let d = Doubler::new(&Context::new(), DoublerConfig::new(width, 5, 2, requested, 1)).unwrap();
    assert_eq!(d.quality(), effective);
}

#[rstest]
#[case(DoublerConfig::new(8, 8, 1, Quality::Nearest, 1), DoublerError::InvalidFactor { factor: 1 })]
#[case(
    DoublerConfig::new(8, 8, 16, Quality::Nearest, 1),
    DoublerError::InvalidFactor { factor: 16 }
)]
#[case(
    DoublerConfig::new(8, 0, 2, Quality::Nearest, 1),
    DoublerError::InvalidDimensions { width: 8, height: 0 }
)]
#[case(DoublerConfig::new(8, 8, 2, Quality::Mitchell, 0), DoublerError::InvalidChannels)]
#[case(
    DoublerConfig::new(8, 8, 4, Quality::Mitchell, 2),
    DoublerError::UnsupportedConfiguration { quality: Quality::Mitchell, channels: 2 }
)]
fn test_creation_errors(#[case] config: DoublerConfig, #[case] expected: DoublerError) {
    assert_eq!(Doubler::new(&Context::new(), config).unwrap_err(), expected);
}

#[test]
fn test_arbitrary_channels_degrade_before_check() {
    // Narrow enough that Mitchell falls back to nearest, which supports any layout.
    let config = DoublerConfig::new(1, 4, 2, Quality::Mitchell, 2);
    let d = Doubler::new(&Context::new(), config).unwrap();
    assert_eq!(d.quality(), Quality::Nearest);
    let d = Doubler::new(&Context::new(), DoublerConfig::new(9, 4, 8, Quality::Interp, 6)).unwrap();
    assert_eq!(d.quality(), Quality::Nearest);
}

// ============================================================================
// Whole images
// ============================================================================

#[rstest]
fn test_row_count_and_completion(
    #[values(Quality::Nearest, Quality::Interp, Quality::Mitchell)] quality: Quality,
    #[values(2, 4, 8)] factor: u32,
    #[values(1, 3, 4)] channels: usize,
    #[values(1, 2, 3, 5)] height: usize,
) {
    let ctx = Context::new();
    let config = DoublerConfig::new(6, height, factor, quality, channels);
    let mut d = Doubler::new(&ctx, config).unwrap();
    let out = image::run(&mut d, &pattern(6 * height * channels, height)).unwrap();
    assert_eq!(d.out_y(), factor as usize * height);
    assert_eq!(d.in_y(), d.expected_calls());
    assert_eq!(d.state(), DoublerState::Done);
    assert_eq!(out.len(), d.output_row_len() * factor as usize * height);
}

#[rstest]
fn test_flat_field_invariance(
    #[values(Quality::Interp, Quality::Mitchell)] quality: Quality,
    #[values(2, 4)] factor: u32,
    #[values(1, 3, 4)] channels: usize,
    #[values(0, 1, 128, 254, 255)] value: u8,
) {
    let ctx = Context::new();
    let config = DoublerConfig::new(9, 4, factor, quality, channels);
    let out = image::upscale(&ctx, &config, &vec![value; 9 * 4 * channels]).unwrap();
    assert!(out.iter().all(|&v| v == value));
}

#[rstest]
fn test_simd_matches_scalar(
    #[values(Quality::Nearest, Quality::Interp, Quality::Mitchell)] quality: Quality,
    #[values(2, 4, 8)] factor: u32,
    #[values(1, 3, 4)] channels: usize,
    #[values(1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 33)] width: usize,
) {
    let height = 6;
    let src = pattern(width * height * channels, width);
    let config = DoublerConfig::new(width, height, factor, quality, channels);

    let scalar = image::upscale(&scalar_ctx(), &config, &src).unwrap();
    let mut ctx = Context::new();
    ctx.force_simd(true);
    let vector = image::upscale(&ctx, &config, &src).unwrap();
    assert_eq!(scalar, vector);
}

#[test]
fn test_mitchell_ring_only_with_simd() {
    let config = DoublerConfig::new(16, 4, 2, Quality::Mitchell, 4);
    let d = Doubler::new(&scalar_ctx(), config).unwrap();
    assert!(!d.uses_ring());
    assert!(!d.uses_simd());

    let mut ctx = Context::new();
    if ctx.force_simd(true) {
        let d = Doubler::new(&ctx, config).unwrap();
        assert!(d.uses_ring());
        assert!(d.uses_simd());
    }
}

#[test]
fn test_mitchell_clamps_alternating_input() {
    let ctx = Context::new();
    for factor in [2, 4] {
        let src: Vec<u8> = (0..8 * 8).map(|i| if (i + i / 8) % 2 == 0 { 0 } else { 255 }).collect();
        let config = DoublerConfig::new(8, 8, factor, Quality::Mitchell, 1);
        let out = image::upscale(&ctx, &config, &src).unwrap();
        // Overshoot on both sides must saturate, not wrap.
        assert!(out.contains(&0));
        assert!(out.contains(&255));
    }
}

// ============================================================================
// Edge handling
// ============================================================================

#[rstest]
fn test_missing_top_row_equals_duplicate(
    #[values(2, 4)] factor: u32,
    #[values(1, 3, 4)] channels: usize,
) {
    let ctx = scalar_ctx();
    let config = DoublerConfig::new(7, 6, factor, Quality::Mitchell, channels);
    let len = 7 * channels;
    let dst_len = len * factor as usize;
    let (r0, r1, r2) = (pattern(len, 0), pattern(len, 1), pattern(len, 2));

    let mut edge = Doubler::new(&ctx, config).unwrap();
    let mut out_edge = output_rows(factor as usize, dst_len);
    process(&mut edge, &[None, None, None, Some(&r0)], &mut out_edge).unwrap();
    process(&mut edge, &[None, None, Some(&r0), Some(&r1)], &mut out_edge).unwrap();
    let n = process(&mut edge, &[None, Some(&r0), Some(&r1), Some(&r2)], &mut out_edge).unwrap();

    let mut padded = Doubler::new(&ctx, config).unwrap();
    let mut out_padded = output_rows(factor as usize, dst_len);
    let window = [Some(&r0[..]), Some(&r0[..]), Some(&r1[..]), Some(&r2[..])];
    let m = process(&mut padded, &window, &mut out_padded).unwrap();

    assert_eq!(n, m);
    assert_eq!(out_edge, out_padded);
}

#[rstest]
fn test_missing_bottom_row_equals_duplicate(#[values(2, 4)] factor: u32) {
    let ctx = scalar_ctx();
    let config = DoublerConfig::new(5, 6, factor, Quality::Mitchell, 1);
    let dst_len = 5 * factor as usize;
    let rows: Vec<Vec<u8>> = (0..3).map(|s| pattern(5, s)).collect();

    let mut a = Doubler::new(&ctx, config).unwrap();
    let mut out_a = output_rows(factor as usize, dst_len);
    process(&mut a, &[Some(&rows[0]), Some(&rows[1]), Some(&rows[2]), None], &mut out_a).unwrap();

    let mut b = Doubler::new(&ctx, config).unwrap();
    let mut out_b = output_rows(factor as usize, dst_len);
    process(
        &mut b,
        &[Some(&rows[0]), Some(&rows[1]), Some(&rows[2]), Some(&rows[2])],
        &mut out_b,
    )
    .unwrap();
    assert_eq!(out_a, out_b);
}

#[test]
fn test_interp_edge_equals_duplicated_body() {
    let ctx = Context::new();
    for factor in [2u32, 4] {
        let config = DoublerConfig::new(6, 3, factor, Quality::Interp, 3);
        let row = pattern(18, 4);
        let dst_len = 18 * factor as usize;

        let mut edge = Doubler::new(&ctx, config).unwrap();
        let mut out_edge = output_rows(factor as usize, dst_len);
        let half = process(&mut edge, &[None, Some(&row)], &mut out_edge).unwrap();
        assert_eq!(half, factor as usize / 2);

        let mut body = Doubler::new(&ctx, config).unwrap();
        let mut out_body = output_rows(factor as usize, dst_len);
        let n = process(&mut body, &[Some(&row), Some(&row)], &mut out_body).unwrap();
        assert_eq!(n, factor as usize);
        for r in 0..half {
            assert_eq!(out_edge[r], out_body[r]);
        }
    }
}

// ============================================================================
// Errors during processing
// ============================================================================

#[test]
fn test_finished_after_last_call() {
    let ctx = Context::new();
    let config = DoublerConfig::new(4, 2, 2, Quality::Mitchell, 1);
    let mut d = Doubler::new(&ctx, config).unwrap();
    image::run(&mut d, &[7; 8]).unwrap();
    let mut out = output_rows(2, 8);
    let row: &[u8] = &[7; 4];
    assert_eq!(
        process(&mut d, &[Some(row), None, None, None], &mut out),
        Err(DoublerError::Finished)
    );
    assert_eq!(image::run(&mut d, &[7; 8]), Err(DoublerError::Finished));
}

#[test]
fn test_process_rejects_short_rows() {
    let ctx = Context::new();
    let mut d = Doubler::new(&ctx, DoublerConfig::new(4, 2, 2, Quality::Nearest, 3)).unwrap();
    let mut out = output_rows(2, 24);
    let short: &[u8] = &[0; 11];
    assert_eq!(
        process(&mut d, &[Some(short)], &mut out),
        Err(DoublerError::RowTooShort { expected: 12, actual: 11 })
    );
    let row: &[u8] = &[0; 12];
    let mut narrow = output_rows(2, 23);
    assert_eq!(
        process(&mut d, &[Some(row)], &mut narrow),
        Err(DoublerError::OutputRowTooShort { expected: 24, actual: 23 })
    );
    assert_eq!(d.state(), DoublerState::Created);
}

#[test]
fn test_extra_window_entries_are_ignored() {
    let ctx = Context::new();
    let mut d = Doubler::new(&ctx, DoublerConfig::new(2, 1, 2, Quality::Nearest, 1)).unwrap();
    let row: &[u8] = &[1, 2];
    let junk: &[u8] = &[9];
    let mut out = output_rows(2, 4);
    assert_eq!(process(&mut d, &[Some(row), Some(junk)], &mut out).unwrap(), 2);
    assert_eq!(out[1], vec![1, 1, 2, 2]);
}

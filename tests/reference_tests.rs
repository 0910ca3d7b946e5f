//! Whole-image output against direct clamp-to-edge formulations of each filter.

use proptest::collection::vec;
use proptest::prelude::*;
use scanline_doubler::image;
use scanline_doubler::kernels::interp::quad;
use scanline_doubler::kernels::mitchell::{phases, round_clamp};
use scanline_doubler::{Context, DoublerConfig, Quality};

/// A source image with its dimensions
#[derive(Debug, Clone)]
struct Image {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Image {
    fn at(&self, x: isize, y: isize, c: usize) -> u8 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.data[(y * self.width + x) * self.channels + c]
    }
}

/// Output position `o` on an axis of factor `f` with tap offset `back`:
/// first tap index and phase.
fn tap(o: usize, f: usize, back: isize) -> (isize, usize) {
    let t = o + f / 2;
    ((t / f) as isize - back, t % f)
}

fn mitchell_reference(img: &Image, f: usize) -> Vec<u8> {
    let w = phases(f);
    let mut out = Vec::new();
    for oy in 0..img.height * f {
        let (iy, py) = tap(oy, f, 2);
        for ox in 0..img.width * f {
            let (ix, px) = tap(ox, f, 2);
            for c in 0..img.channels {
                let mut acc = 0i32;
                for j in 0..4 {
                    for k in 0..4 {
                        let s = img.at(ix + k as isize, iy + j as isize, c) as i32;
                        acc += w[py][j] * w[px][k] * s;
                    }
                }
                out.push(round_clamp(acc));
            }
        }
    }
    out
}

fn interp2_reference(img: &Image) -> Vec<u8> {
    let weights = [[3u32, 1], [1, 3]];
    let mut out = Vec::new();
    for oy in 0..img.height * 2 {
        let (iy, py) = tap(oy, 2, 1);
        for ox in 0..img.width * 2 {
            let (ix, px) = tap(ox, 2, 1);
            for c in 0..img.channels {
                let mut acc = 0u32;
                for j in 0..2 {
                    for k in 0..2 {
                        let s = img.at(ix + k as isize, iy + j as isize, c) as u32;
                        acc += weights[py][j] * weights[px][k] * s;
                    }
                }
                out.push(((acc + 8) >> 4) as u8);
            }
        }
    }
    out
}

fn interp4_reference(img: &Image) -> Vec<u8> {
    let mut out = Vec::new();
    for oy in 0..img.height * 4 {
        let (iy, py) = tap(oy, 4, 1);
        for ox in 0..img.width * 4 {
            let (ix, px) = tap(ox, 4, 1);
            for c in 0..img.channels {
                let column = |x: isize| quad(img.at(x, iy, c), img.at(x, iy + 1, c))[py];
                out.push(quad(column(ix), column(ix + 1))[px]);
            }
        }
    }
    out
}

fn nearest_reference(img: &Image, f: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for oy in 0..img.height * f {
        for ox in 0..img.width * f {
            for c in 0..img.channels {
                out.push(img.at((ox / f) as isize, (oy / f) as isize, c));
            }
        }
    }
    out
}

fn image_strategy(min_width: usize) -> impl Strategy<Value = Image> {
    (min_width..40usize, 1usize..7, prop::sample::select(vec![1usize, 3, 4])).prop_flat_map(
        |(width, height, channels)| {
            vec(any::<u8>(), width * height * channels).prop_map(move |data| Image {
                width,
                height,
                channels,
                data,
            })
        },
    )
}

fn contexts() -> [Context; 2] {
    let mut scalar = Context::new();
    scalar.force_simd(false);
    [scalar, Context::new()]
}

fn run(ctx: &Context, img: &Image, factor: u32, quality: Quality) -> Vec<u8> {
    let config = DoublerConfig::new(img.width, img.height, factor, quality, img.channels);
    image::upscale(ctx, &config, &img.data).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_mitchell_matches_reference(
        img in image_strategy(4),
        factor in prop::sample::select(vec![2u32, 4]),
    ) {
        let expected = mitchell_reference(&img, factor as usize);
        for ctx in contexts() {
            prop_assert_eq!(run(&ctx, &img, factor, Quality::Mitchell), expected.clone());
        }
    }

    #[test]
    fn prop_interp2_matches_reference(img in image_strategy(2)) {
        let expected = interp2_reference(&img);
        for ctx in contexts() {
            prop_assert_eq!(run(&ctx, &img, 2, Quality::Interp), expected.clone());
        }
    }

    #[test]
    fn prop_interp4_matches_reference(img in image_strategy(2)) {
        let expected = interp4_reference(&img);
        for ctx in contexts() {
            prop_assert_eq!(run(&ctx, &img, 4, Quality::Interp), expected.clone());
        }
    }

    #[test]
    fn prop_nearest_blocks(
        img in image_strategy(1),
        factor in prop::sample::select(vec![2u32, 4, 8]),
    ) {
        let expected = nearest_reference(&img, factor as usize);
        for ctx in contexts() {
            prop_assert_eq!(run(&ctx, &img, factor, Quality::Nearest), expected.clone());
        }
    }

    #[test]
    fn prop_flat_images_stay_flat(
        value in any::<u8>(),
        width in 1usize..24,
        height in 1usize..6,
        factor in prop::sample::select(vec![2u32, 4]),
        quality in prop::sample::select(vec![Quality::Interp, Quality::Mitchell]),
    ) {
        let img = Image { width, height, channels: 3, data: vec![value; width * height * 3] };
        for ctx in contexts() {
            let out = run(&ctx, &img, factor, quality);
            prop_assert!(out.iter().all(|&v| v == value));
        }
    }
}

#[test]
fn test_reference_tap_mapping() {
    // Factor 2: the first pixel uses the upper phase over (-2..2) clamped.
    assert_eq!(tap(0, 2, 2), (-2, 1));
    assert_eq!(tap(1, 2, 2), (-1, 0));
    // Factor 4 interp: first two pixels sit on source 0.
    assert_eq!(tap(0, 4, 1), (-1, 2));
    assert_eq!(tap(2, 4, 1), (0, 0));
}

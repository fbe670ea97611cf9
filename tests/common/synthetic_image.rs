#![allow(dead_code)]

use depixel_cells::{ColorGrid, Yuv};

pub const LIGHT: Yuv = [0.9, 0.5, 0.5];
pub const DARK: Yuv = [0.1, 0.5, 0.5];
pub const RED: Yuv = [0.3, 0.35, 0.9];

/// Builds a grid from ASCII rows: `#` dark, `r` red, anything else light.
pub fn from_ascii(rows: &[&str]) -> ColorGrid {
    let height = rows.len();
    let width = rows[0].len();
    let pixels = rows
        .iter()
        .flat_map(|row| {
            row.chars().map(|ch| match ch {
                '#' => DARK,
                'r' => RED,
                _ => LIGHT,
            })
        })
        .collect();
    ColorGrid::from_pixels(height, width, pixels).expect("ascii rows form a valid grid")
}

pub fn uniform(height: usize, width: usize, color: Yuv) -> ColorGrid {
    ColorGrid::from_pixels(height, width, vec![color; height * width])
        .expect("uniform grid is valid")
}

const MULTIPLIER: u64 = 6364136223846793005;
const INCREMENT: u64 = 1442695040888963407;

/// Deterministic pseudo-random image over a small palette, dense in diagonal crossings.
pub fn noise(height: usize, width: usize, seed: u64) -> ColorGrid {
    let palette = [LIGHT, DARK, RED];
    let step = |s: u64| s.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
    let mut state = step(seed);
    let pixels = (0..height * width)
        .map(|_| {
            state = step(state);
            palette[((state >> 33) % palette.len() as u64) as usize]
        })
        .collect();
    ColorGrid::from_pixels(height, width, pixels).expect("noise grid is valid")
}

//! Debug renderings of the similarity graph and the reshaped cells.

use image::imageops::{FilterType, resize};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::cells::CellGraph;
use crate::colors::{generate_contrasting_colors, yuv_to_rgb};
use crate::direction::Direction;
use crate::similarity::AdjacencyGraph;
use crate::source::ColorGrid;

const GRID_COLOR: Rgb<u8> = Rgb([192, 192, 192]);
const EDGE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([40, 40, 40]);

/// Directions that visit every undirected edge exactly once.
const FORWARD: [Direction; 4] = [
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
];

/// Draws the source pixels upscaled by `scale`, a pixel grid, and one red segment per
/// similarity edge between pixel centers.
pub fn draw_similarity_graph(colors: &ColorGrid, graph: &AdjacencyGraph, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let base = colors.to_rgb_image();
    let mut canvas = resize(
        &base,
        base.width() * scale,
        base.height() * scale,
        FilterType::Nearest,
    );
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let s = scale as f32;

    for row in 0..=graph.height() {
        let y = row as f32 * s;
        draw_line_segment_mut(&mut canvas, (0.0, y), (w, y), GRID_COLOR);
    }
    for col in 0..=graph.width() {
        let x = col as f32 * s;
        draw_line_segment_mut(&mut canvas, (x, 0.0), (x, h), GRID_COLOR);
    }

    let center = |row: usize, col: usize| ((col as f32 + 0.5) * s, (row as f32 + 0.5) * s);
    for row in 0..graph.height() {
        for col in 0..graph.width() {
            for dir in FORWARD {
                if !graph.has_edge(row, col, dir) {
                    continue;
                }
                if let Some((nr, nc)) = dir.step(row, col, graph.height(), graph.width()) {
                    let (from, to) = (center(row, col), center(nr, nc));
                    draw_line_segment_mut(&mut canvas, from, to, EDGE_COLOR);
                }
            }
        }
    }

    canvas
}

/// Drops consecutive duplicates (including last-to-first) so the polygon can be filled.
///
/// Returns `None` when fewer than three distinct points remain.
fn fillable(mut points: Vec<Point<i32>>) -> Option<Vec<Point<i32>>> {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then_some(points)
}

fn outline(canvas: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    for (p1, p2) in points.iter().zip(points.iter().cycle().skip(1)) {
        draw_line_segment_mut(
            canvas,
            (p1.x as f32, p1.y as f32),
            (p2.x as f32, p2.y as f32),
            color,
        );
    }
}

/// Fills every cell with its pixel's color and outlines it.
///
/// # Arguments
///
/// * `colors` - source colors, one per cell.
/// * `cells` - built or collapsed cells of the same image.
/// * `scale` - output pixels per source pixel.
pub fn draw_cells(colors: &ColorGrid, cells: &CellGraph, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let mut canvas = RgbImage::from_pixel(
        cells.width() as u32 * scale,
        cells.height() as u32 * scale,
        Rgb([255, 255, 255]),
    );

    for row in 0..cells.height() {
        for col in 0..cells.width() {
            if let Some(poly) = fillable(cells.cell_points(row, col, scale as f64)) {
                draw_polygon_mut(&mut canvas, &poly, yuv_to_rgb(colors.get(row, col)));
            }
        }
    }
    for row in 0..cells.height() {
        for col in 0..cells.width() {
            let points = cells.cell_points(row, col, scale as f64);
            outline(&mut canvas, &points, OUTLINE_COLOR);
        }
    }

    canvas
}

/// Paints every cell with a contrasting color per connected component of `graph`.
///
/// Cells of pixels linked through the similarity graph share a color, which makes the
/// regions produced by the diagonal resolution easy to inspect.
pub fn draw_components(graph: &AdjacencyGraph, cells: &CellGraph, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let (labels, count) = graph.label_components();
    let palette = generate_contrasting_colors(count, 255);
    let mut canvas = RgbaImage::from_pixel(
        cells.width() as u32 * scale,
        cells.height() as u32 * scale,
        Rgba([0, 0, 0, 0]),
    );

    for row in 0..cells.height() {
        for col in 0..cells.width() {
            let color = palette[labels[row * graph.width() + col]];
            if let Some(poly) = fillable(cells.cell_points(row, col, scale as f64)) {
                draw_polygon_mut(&mut canvas, &poly, color);
            }
        }
    }

    canvas
}

use std::fs;
use std::path::PathBuf;

use depixel_cells::render::{draw_cells, draw_components, draw_similarity_graph};
use depixel_cells::{ColorGrid, DepixelConfig, Depixelizer};
use image::{DynamicImage, Rgb, RgbImage};

const SCALE: u32 = 24;

/// A tiny sprite used when no input image is given.
const SPRITE: [&str; 10] = [
    "...####...",
    ".##....##.",
    ".#......#.",
    "#..#..#..#",
    "#........#",
    "#.#....#.#",
    "#..####..#",
    ".#......#.",
    ".##....##.",
    "...####...",
];

fn sprite() -> DynamicImage {
    let mut img = RgbImage::new(SPRITE[0].len() as u32, SPRITE.len() as u32);
    for (y, row) in SPRITE.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let color = if ch == '#' {
                Rgb([40, 30, 90])
            } else {
                Rgb([250, 210, 60])
            };
            img.put_pixel(x as u32, y as u32, color);
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 1. Load the input, or fall back to the built-in sprite
    let mut args = std::env::args().skip(1);
    let img = match args.next() {
        Some(path) => {
            println!("Loading image from {}...", path);
            image::open(&path)?
        }
        None => {
            println!("No input given, using the built-in sprite");
            sprite()
        }
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "target/depixelize".into()));
    fs::create_dir_all(&out_dir)?;

    // 2. Run the pipeline stage by stage to keep the similarity graph snapshot
    let colors = ColorGrid::from_image(&img)?;
    let mut stepper = Depixelizer::new(colors.clone(), DepixelConfig::default())?;
    let raw = stepper.build_similarity_graph()?.clone();
    println!("Similarity edges: {}", raw.edge_count());
    let cleared = stepper.remove_trivial_edges()?;
    let summary = stepper.resolve_diagonals()?;
    println!(
        "Flat blocks cleared: {}, crossings resolved: {} (main {}, anti {}, cut {})",
        cleared,
        summary.total(),
        summary.kept_main,
        summary.kept_anti,
        summary.cut_both
    );
    let out = stepper.run()?;

    // 3. Visualize
    let path = out_dir.join("similarity_raw.png");
    let canvas = draw_similarity_graph(&colors, &raw, SCALE);
    canvas.save(&path)?;
    println!("Saved {}", path.display());

    let path = out_dir.join("similarity_resolved.png");
    let canvas = draw_similarity_graph(&colors, &out.graph, SCALE);
    canvas.save(&path)?;
    println!("Saved {}", path.display());

    let path = out_dir.join("cells.png");
    draw_cells(&colors, &out.cells, SCALE).save(&path)?;
    println!("Saved {}", path.display());

    let path = out_dir.join("components.png");
    let canvas = draw_components(&out.graph, &out.cells, SCALE);
    canvas.save(&path)?;
    println!("Saved {}", path.display());

    // 4. Export the collapsed cells
    let path = out_dir.join("cells.json");
    fs::write(&path, serde_json::to_string_pretty(&out.cells)?)?;
    println!("Saved {}", path.display());

    Ok(())
}

//! Triangulate a planar point set read from stdin (one `x y` pair per
//! line) and print the resulting mesh statistics. With no input, a small
//! scattered set is generated instead.
//!
//! Usage: triangulate_points [--incremental] < points.txt

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};
use terramesh_core::Point2d;
use terramesh_delaunay::{divconq_triangulate, incremental_triangulate, TriangulateOpts};

fn parse_points(input: &str) -> Result<Vec<Point2d>> {
    let mut points = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let x: f64 = parts
            .next()
            .context("missing x")?
            .parse()
            .with_context(|| format!("line {}", number + 1))?;
        let y: f64 = parts
            .next()
            .context("missing y")?
            .parse()
            .with_context(|| format!("line {}", number + 1))?;
        points.push(Point2d::new(x, y));
    }
    Ok(points)
}

fn scattered(count: usize) -> Vec<Point2d> {
    let mut state = 0xfeed_beef_cafe_f00du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..count)
        .map(|_| Point2d::new(next() * 100.0, next() * 100.0))
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let use_incremental = std::env::args().any(|a| a == "--incremental");

    let stdin = io::stdin();
    let points = if stdin.is_terminal() {
        println!("no input on stdin; triangulating 200 generated points");
        scattered(200)
    } else {
        let mut input = String::new();
        stdin.lock().read_to_string(&mut input)?;
        parse_points(&input)?
    };

    let mesh = if use_incremental {
        incremental_triangulate(&points)?
    } else {
        divconq_triangulate(&points, &TriangulateOpts::default())?
    };

    println!(
        "{} points in: {} triangles, {} hull edges, {} duplicates",
        points.len(),
        mesh.triangle_count(),
        mesh.hull_size,
        mesh.undead_count
    );
    Ok(())
}

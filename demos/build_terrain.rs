//! Build a full tiled terrain mesh from a procedural heightfield and export
//! the data pack plus the runtime quadtree.
//!
//! Usage: build_terrain [output_dir]

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use terramesh_core::{Aabb, HeightfieldOracle, LodSetting, MeshBuildConfig, Point3f};
use terramesh_io::{write_quadtree, DataPackWriter};
use terramesh_pipeline::{build_quadtree, BuildJob, CreateDataJob, TessellationJob};

fn main() -> Result<()> {
    env_logger::init();

    let output_dir: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| ".".to_string())
        .into();

    let config = MeshBuildConfig {
        tiles_x: 4,
        tiles_z: 4,
        quad_tree_depth: 2,
        lods: vec![LodSetting::new(5, 4.0), LodSetting::new(3, 8.0)],
        min_triangle_area: None,
    };
    let terrain_size = 256.0f32;
    let bound = Aabb::from_min_max(
        Point3f::new(0.0, -10.0, 0.0),
        Point3f::new(terrain_size, 40.0, terrain_size),
    );

    // Rolling hills with a flat plain in one corner, so some tiles collapse
    // aggressively and others keep their full subdivision.
    let oracle = HeightfieldOracle::from_fn(257, 257, 1.0, |x, z| {
        if x < 64.0 && z < 64.0 {
            0.0
        } else {
            8.0 * (x * 0.05).sin() * (z * 0.04).cos() + 12.0 * ((x + z) * 0.01).sin()
        }
    });

    info!("scanning {}x{} tiles", config.tiles_x, config.tiles_z);
    let mut scan = CreateDataJob::new(config.clone(), bound, &oracle)?;
    while !scan.is_done() {
        scan.update()?;
        print!("\rscanning... {:5.1}%", scan.progress() * 100.0);
    }
    println!();

    let mut tessellation = TessellationJob::new(&config, bound, scan.into_lod_tiles())?;
    while !tessellation.is_done() {
        tessellation.update()?;
        print!("\rtessellating... {:5.1}%", tessellation.progress() * 100.0);
    }
    println!();
    let meshes = tessellation.into_meshes();

    let mut total_faces = 0;
    for mesh in &meshes {
        for (level, lod) in mesh.lods.iter().enumerate() {
            info!(
                "tile {:2} LOD {}: {:4} vertices, {:4} faces",
                mesh.mesh_id,
                level,
                lod.vertex_count(),
                lod.face_count()
            );
            total_faces += lod.face_count();
        }
    }
    println!("{} tiles, {} faces in total", meshes.len(), total_faces);

    let pack_path = output_dir.join("terrain.pack");
    let mut pack = DataPackWriter::new();
    for mesh in &meshes {
        pack.add_tile(mesh)?;
    }
    let mut writer = BufWriter::new(
        File::create(&pack_path).with_context(|| format!("creating {}", pack_path.display()))?,
    );
    pack.finalize(&mut writer)?;

    let tree_path = output_dir.join("terrain.tree");
    let nodes = build_quadtree(bound, config.quad_tree_depth, &meshes).flatten();
    let mut writer = BufWriter::new(
        File::create(&tree_path).with_context(|| format!("creating {}", tree_path.display()))?,
    );
    write_quadtree(&mut writer, &nodes)?;

    println!(
        "wrote {} ({} meshes) and {} ({} nodes)",
        pack_path.display(),
        meshes.len(),
        tree_path.display(),
        nodes.len()
    );
    Ok(())
}

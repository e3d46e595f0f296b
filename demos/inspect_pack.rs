//! Print the contents of an exported terrain: the quadtree index and the
//! per-tile mesh records in the data pack.
//!
//! Usage: inspect_pack <terrain.tree> <terrain.pack>

use std::fs;

use anyhow::{bail, Context, Result};
use terramesh_io::{read_quadtree, DataPackReader};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (tree_path, pack_path) = match (args.next(), args.next()) {
        (Some(tree), Some(pack)) => (tree, pack),
        _ => bail!("usage: inspect_pack <terrain.tree> <terrain.pack>"),
    };

    let tree_bytes = fs::read(&tree_path).with_context(|| format!("reading {}", tree_path))?;
    let nodes = read_quadtree(&mut tree_bytes.as_slice())?;
    println!("{}: {} nodes", tree_path, nodes.len());

    let mesh_count = nodes.iter().filter(|n| n.has_mesh()).count();
    for (index, node) in nodes.iter().enumerate() {
        let kind = if node.is_leaf() { "leaf" } else { "node" };
        println!(
            "  [{:3}] {} lod {} mesh {:3} center ({:7.1}, {:5.1}, {:7.1}) size ({:5.1}, {:5.1}, {:5.1})",
            index,
            kind,
            node.lod_level,
            node.mesh_index,
            node.bound.center.x,
            node.bound.center.y,
            node.bound.center.z,
            node.bound.size.x,
            node.bound.size.y,
            node.bound.size.z,
        );
    }

    let pack_bytes = fs::read(&pack_path).with_context(|| format!("reading {}", pack_path))?;
    let reader = DataPackReader::new(&pack_bytes, mesh_count)?;
    println!("{}: {} mesh slots", pack_path, reader.len());
    for slot in 0..reader.len() {
        let tile = reader.read_tile(slot)?;
        print!("  mesh {:3}:", tile.mesh_id);
        for (level, lod) in tile.lods.iter().enumerate() {
            print!(
                " LOD{} {}v/{}f",
                level,
                lod.vertex_count(),
                lod.face_count()
            );
        }
        println!();
    }
    Ok(())
}

//! Runtime quadtree binary format
//!
//! `i32 nodeCount`, then per node: bound center as `f32 × 3`, bound size as
//! `f32 × 3`, `i32 meshIndex` (-1 for none), `i32 cellIndex`,
//! `u8 lodLevel`, `i32 childCount` and the child indices as `i32` each.
//! Node 0 is always the root.

use std::io::{Read, Write};

use terramesh_core::{Aabb, Point3f, QuadTreeNode, Vector3f};

use crate::error::{IoError, Result};
use crate::mesh_format::{read_count, read_f32, read_i32, read_u8, write_f32, write_i32, write_u8};

/// Serialize the flattened node array
pub fn write_quadtree<W: Write>(writer: &mut W, nodes: &[QuadTreeNode]) -> Result<()> {
    write_i32(writer, nodes.len() as i32)?;
    for node in nodes {
        write_f32(writer, node.bound.center.x)?;
        write_f32(writer, node.bound.center.y)?;
        write_f32(writer, node.bound.center.z)?;
        write_f32(writer, node.bound.size.x)?;
        write_f32(writer, node.bound.size.y)?;
        write_f32(writer, node.bound.size.z)?;
        write_i32(writer, node.mesh_index)?;
        write_i32(writer, node.cell_index)?;
        write_u8(writer, node.lod_level)?;
        write_i32(writer, node.children.len() as i32)?;
        for &child in &node.children {
            write_i32(writer, child)?;
        }
    }
    Ok(())
}

/// Deserialize the flattened node array, validating child indices
pub fn read_quadtree<R: Read>(reader: &mut R) -> Result<Vec<QuadTreeNode>> {
    let node_count = read_count(reader, "node")?;
    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let center = Point3f::new(read_f32(reader)?, read_f32(reader)?, read_f32(reader)?);
        let size = Vector3f::new(read_f32(reader)?, read_f32(reader)?, read_f32(reader)?);
        let mesh_index = read_i32(reader)?;
        let cell_index = read_i32(reader)?;
        let lod_level = read_u8(reader)?;
        let child_count = read_count(reader, "child")?;
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            let child = read_i32(reader)?;
            if child <= 0 || child as usize >= node_count {
                return Err(IoError::InvalidRecord {
                    message: format!(
                        "child index {} out of range for {} nodes",
                        child, node_count
                    ),
                });
            }
            children.push(child);
        }
        nodes.push(QuadTreeNode {
            bound: Aabb::new(center, size),
            mesh_index,
            cell_index,
            lod_level,
            children,
        });
    }
    Ok(nodes)
}

//! Tile mesh binary records
//!
//! Per LOD: `i32` vertex count, the position/normal/UV arrays
//! (`f32` components, vectors component-major), `i32` face count, faces as
//! `3 × i32` local vertex indices, then the tile's UV rectangle as four
//! `f32` values (min.x, min.y, max.x, max.y). A tile record is the mesh id,
//! the bounding volume as center and size, an `i32` LOD count and the LOD
//! records in order, finest first.

use std::io::{Read, Write};

use terramesh_core::{Aabb, LodMesh, Point3f, TileMeshData, UvRect, Vector2f, Vector3f};

use crate::error::{IoError, Result};

pub(crate) fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

pub(crate) fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let count = read_i32(reader)?;
    if count < 0 {
        return Err(IoError::InvalidRecord {
            message: format!("negative {} count: {}", what, count),
        });
    }
    Ok(count as usize)
}

fn write_vec3<W: Write>(writer: &mut W, v: &Vector3f) -> Result<()> {
    write_f32(writer, v.x)?;
    write_f32(writer, v.y)?;
    write_f32(writer, v.z)
}

fn read_vec3<R: Read>(reader: &mut R) -> Result<Vector3f> {
    Ok(Vector3f::new(
        read_f32(reader)?,
        read_f32(reader)?,
        read_f32(reader)?,
    ))
}

/// Serialize one LOD record
pub fn write_lod_mesh<W: Write>(writer: &mut W, mesh: &LodMesh) -> Result<()> {
    if mesh.normals.len() != mesh.vertices.len() || mesh.uvs.len() != mesh.vertices.len() {
        return Err(IoError::InvalidRecord {
            message: format!(
                "attribute arrays disagree: {} vertices, {} normals, {} uvs",
                mesh.vertices.len(),
                mesh.normals.len(),
                mesh.uvs.len()
            ),
        });
    }

    write_i32(writer, mesh.vertices.len() as i32)?;
    for position in &mesh.vertices {
        write_vec3(writer, &position.coords)?;
    }
    for normal in &mesh.normals {
        write_vec3(writer, normal)?;
    }
    for uv in &mesh.uvs {
        write_f32(writer, uv.x)?;
        write_f32(writer, uv.y)?;
    }
    write_i32(writer, mesh.faces.len() as i32)?;
    for face in &mesh.faces {
        for &index in face {
            write_i32(writer, index as i32)?;
        }
    }
    write_f32(writer, mesh.uv_rect.min.x)?;
    write_f32(writer, mesh.uv_rect.min.y)?;
    write_f32(writer, mesh.uv_rect.max.x)?;
    write_f32(writer, mesh.uv_rect.max.y)
}

/// Deserialize one LOD record
pub fn read_lod_mesh<R: Read>(reader: &mut R) -> Result<LodMesh> {
    let vertex_count = read_count(reader, "vertex")?;

    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        vertices.push(Point3f::from(read_vec3(reader)?));
    }
    let mut normals = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        normals.push(read_vec3(reader)?);
    }
    let mut uvs = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        uvs.push(Vector2f::new(read_f32(reader)?, read_f32(reader)?));
    }

    let face_count = read_count(reader, "face")?;
    let mut faces = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        let mut face = [0u32; 3];
        for slot in face.iter_mut() {
            let index = read_i32(reader)?;
            if index < 0 || index as usize >= vertex_count {
                return Err(IoError::InvalidRecord {
                    message: format!(
                        "face index {} out of range for {} vertices",
                        index, vertex_count
                    ),
                });
            }
            *slot = index as u32;
        }
        faces.push(face);
    }

    let uv_rect = UvRect::new(
        Vector2f::new(read_f32(reader)?, read_f32(reader)?),
        Vector2f::new(read_f32(reader)?, read_f32(reader)?),
    );

    Ok(LodMesh {
        vertices,
        normals,
        uvs,
        faces,
        uv_rect,
    })
}

/// Serialize a whole tile: id, bounds, LOD records
pub fn write_tile_mesh<W: Write>(writer: &mut W, tile: &TileMeshData) -> Result<()> {
    write_i32(writer, tile.mesh_id as i32)?;
    write_vec3(writer, &tile.bounds.center.coords)?;
    write_vec3(writer, &tile.bounds.size)?;
    write_i32(writer, tile.lods.len() as i32)?;
    for lod in &tile.lods {
        write_lod_mesh(writer, lod)?;
    }
    Ok(())
}

/// Deserialize a whole tile record
pub fn read_tile_mesh<R: Read>(reader: &mut R) -> Result<TileMeshData> {
    let mesh_id = read_i32(reader)?;
    if mesh_id < 0 {
        return Err(IoError::InvalidRecord {
            message: format!("negative mesh id: {}", mesh_id),
        });
    }
    let center = Point3f::from(read_vec3(reader)?);
    let size = read_vec3(reader)?;
    let lod_count = read_count(reader, "LOD")?;
    let mut lods = Vec::with_capacity(lod_count);
    for _ in 0..lod_count {
        lods.push(read_lod_mesh(reader)?);
    }
    Ok(TileMeshData {
        mesh_id: mesh_id as u32,
        bounds: Aabb::new(center, size),
        lods,
    })
}

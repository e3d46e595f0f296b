//! Per-tile mesh data produced by the build pipeline

use crate::bounds::Aabb;
use crate::point::{Point3f, Vector2f, Vector3f};
use serde::{Deserialize, Serialize};

/// Placement of a tile inside the whole-terrain UV space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub min: Vector2f,
    pub max: Vector2f,
}

impl UvRect {
    pub fn new(min: Vector2f, max: Vector2f) -> Self {
        Self { min, max }
    }

    /// The full terrain rectangle
    pub fn full() -> Self {
        Self {
            min: Vector2f::zeros(),
            max: Vector2f::new(1.0, 1.0),
        }
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::full()
    }
}

/// One level-of-detail mesh of a tile: parallel vertex attribute arrays and
/// a triangle index list, three indices per face.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LodMesh {
    pub vertices: Vec<Point3f>,
    pub normals: Vec<Vector3f>,
    pub uvs: Vec<Vector2f>,
    pub faces: Vec<[u32; 3]>,
    pub uv_rect: UvRect,
}

impl LodMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }
}

/// A terrain tile's final authored result: an id, world-space bounds and one
/// mesh per configured LOD level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMeshData {
    pub mesh_id: u32,
    pub bounds: Aabb,
    pub lods: Vec<LodMesh>,
}

impl TileMeshData {
    pub fn new(mesh_id: u32, bounds: Aabb) -> Self {
        Self {
            mesh_id,
            bounds,
            lods: Vec::new(),
        }
    }

    /// Whether every LOD level carries at least one triangle
    pub fn is_complete(&self) -> bool {
        !self.lods.is_empty() && self.lods.iter().all(|lod| !lod.is_empty())
    }
}

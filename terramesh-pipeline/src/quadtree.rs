//! Runtime quadtree spatial index
//!
//! Build-time: a recursive node tree partitions the terrain bounds into
//! quadrants down to the configured depth, and every produced tile mesh is
//! inserted into the unique leaf whose rectangle contains the tile center
//! (first match wins on the depth-first descent). Export flattens the tree
//! into an array of immutable nodes addressed by integer indices — node 0
//! is always the root — for compact serialization and cache-friendly
//! runtime traversal.

use log::warn;
use terramesh_core::{Aabb, Point3f, QuadTreeNode, TileMeshData, Vector3f};

/// Mutable build-time quadtree node holding its four children directly
#[derive(Debug)]
pub struct QuadTreeBuildNode {
    pub bound: Aabb,
    pub mesh_id: Option<u32>,
    pub cell_index: i32,
    pub lod_level: u8,
    pub children: [Option<Box<QuadTreeBuildNode>>; 4],
}

impl QuadTreeBuildNode {
    /// Recursively partition `bound` into quadrants, `depth` levels deep.
    /// Leaves activate LOD 0; each level up activates one LOD coarser.
    pub fn build(bound: Aabb, depth: u32) -> Self {
        let lod_level = depth.min(u8::MAX as u32) as u8;
        if depth == 0 {
            return Self {
                bound,
                mesh_id: None,
                cell_index: -1,
                lod_level,
                children: [None, None, None, None],
            };
        }

        let min = bound.min();
        let max = bound.max();
        let mid_x = (min.x + max.x) * 0.5;
        let mid_z = (min.z + max.z) * 0.5;
        let quadrant = |x0: f32, z0: f32, x1: f32, z1: f32| {
            Some(Box::new(Self::build(
                Aabb::from_min_max(Point3f::new(x0, min.y, z0), Point3f::new(x1, max.y, z1)),
                depth - 1,
            )))
        };

        Self {
            bound,
            mesh_id: None,
            cell_index: -1,
            lod_level,
            children: [
                quadrant(min.x, min.z, mid_x, mid_z),
                quadrant(mid_x, min.z, max.x, mid_z),
                quadrant(min.x, mid_z, mid_x, max.z),
                quadrant(mid_x, mid_z, max.x, max.z),
            ],
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    fn contains_planar(&self, point: &Point3f) -> bool {
        let min = self.bound.min();
        let max = self.bound.max();
        point.x >= min.x && point.x <= max.x && point.z >= min.z && point.z <= max.z
    }

    /// Insert a mesh into the unique leaf whose rectangle contains the
    /// center; depth-first, first match wins. Returns whether a leaf took
    /// it.
    pub fn add_mesh(&mut self, mesh_id: u32, cell_index: i32, center: Point3f) -> bool {
        if !self.contains_planar(&center) {
            return false;
        }
        if self.is_leaf() {
            if self.mesh_id.is_some() {
                return false;
            }
            self.mesh_id = Some(mesh_id);
            self.cell_index = cell_index;
            return true;
        }
        self.children
            .iter_mut()
            .flatten()
            .any(|child| child.add_mesh(mesh_id, cell_index, center))
    }

    /// Grow every ancestor bound on the path to the mesh's leaf so the tree
    /// bounds stay conservative in height.
    pub fn encapsulate_mesh_bounds(&mut self, mesh_bounds: &Aabb) {
        if !self.contains_planar(&mesh_bounds.center) {
            return;
        }
        self.bound.encapsulate(&mesh_bounds.min());
        self.bound.encapsulate(&mesh_bounds.max());
        for child in self.children.iter_mut().flatten() {
            child.encapsulate_mesh_bounds(mesh_bounds);
        }
    }

    /// Flatten into the arena+index node array; node 0 is the root.
    pub fn flatten(&self) -> Vec<QuadTreeNode> {
        let mut nodes = Vec::new();
        self.emit(&mut nodes);
        nodes
    }

    fn emit(&self, nodes: &mut Vec<QuadTreeNode>) -> i32 {
        let index = nodes.len() as i32;
        nodes.push(QuadTreeNode {
            bound: self.bound,
            mesh_index: self.mesh_id.map_or(-1, |id| id as i32),
            cell_index: self.cell_index,
            lod_level: self.lod_level,
            children: Vec::new(),
        });
        let children: Vec<i32> = self
            .children
            .iter()
            .flatten()
            .map(|child| child.emit(nodes))
            .collect();
        nodes[index as usize].children = children;
        index
    }
}

/// Build the runtime index over a finished mesh batch: partition the
/// terrain bounds to the configured depth and insert every tile mesh by its
/// bounds center.
pub fn build_quadtree(
    terrain_bound: Aabb,
    depth: u32,
    meshes: &[TileMeshData],
) -> QuadTreeBuildNode {
    let mut root = QuadTreeBuildNode::build(
        Aabb::new(
            terrain_bound.center,
            Vector3f::new(terrain_bound.size.x, 0.0, terrain_bound.size.z),
        ),
        depth,
    );
    for mesh in meshes {
        if !root.add_mesh(mesh.mesh_id, mesh.mesh_id as i32, mesh.bounds.center) {
            warn!(
                "mesh {} center ({}, {}) landed in no quadtree leaf",
                mesh.mesh_id, mesh.bounds.center.x, mesh.bounds.center.z
            );
            continue;
        }
        root.encapsulate_mesh_bounds(&mesh.bounds);
    }
    root
}

//! Runtime quadtree node
//!
//! The flat, immutable node record the build pipeline exports and the
//! runtime consumer deserializes. Nodes live in one array and reference
//! their children by index (node 0 is always the root), keeping traversal
//! cache-friendly and serialization trivial.

use crate::bounds::Aabb;
use serde::{Deserialize, Serialize};

/// One node of the flattened runtime quadtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadTreeNode {
    pub bound: Aabb,
    /// Index of the mesh activated by this node, -1 for none
    pub mesh_index: i32,
    pub cell_index: i32,
    pub lod_level: u8,
    /// Indices of child nodes in the flat array
    pub children: Vec<i32>,
}

impl QuadTreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh_index >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_and_mesh_flags() {
        let node = QuadTreeNode {
            bound: Aabb::default(),
            mesh_index: -1,
            cell_index: -1,
            lod_level: 0,
            children: vec![1, 2, 3, 4],
        };
        assert!(!node.is_leaf());
        assert!(!node.has_mesh());
    }
}

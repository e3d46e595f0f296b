//! # TerraMesh Delaunay
//!
//! 2D Delaunay triangulation for terrain tile tessellation.
//!
//! This crate provides a divide-and-conquer triangulator (Dwyer's algorithm
//! with alternating cuts) for the hot tile-meshing path, and a simpler
//! incremental triangulator for file-based reconstruction workflows. Both
//! operate on an arena-backed triangle mesh navigated through oriented
//! triangle and subsegment handles.

pub mod predicates;
pub mod mesh;
pub mod divconq;
pub mod incremental;

// Re-export commonly used items
pub use predicates::*;
pub use mesh::*;
pub use divconq::*;
pub use incremental::*;

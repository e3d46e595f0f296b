//! I/O for terramesh build artifacts
//!
//! Hand-written little-endian binary formats: fixed-width `i32` counts,
//! `f32` components written component-major with no padding. Three formats
//! are covered: per-tile mesh records, the flattened runtime quadtree, and
//! multi-mesh data packs headed by a fixed-size offset table for random
//! access.

pub mod error;
pub mod mesh_format;
pub mod quadtree_format;
pub mod datapack;

pub use error::*;
pub use mesh_format::*;
pub use quadtree_format::*;
pub use datapack::*;

#[cfg(test)]
mod tests;

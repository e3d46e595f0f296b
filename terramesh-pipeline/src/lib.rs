//! # TerraMesh Pipeline
//!
//! Orchestrates the terrain mesh build: incremental scan jobs sample every
//! tile across every LOD level, borders are reconciled between tiles and
//! LOD levels, a tessellation job triangulates each tile's final point set
//! and filters degenerate slivers, and the produced tile meshes are indexed
//! by a balanced quadtree for runtime LOD and visibility queries.
//!
//! Jobs are cooperative and single-threaded: the caller drives them by
//! repeated `update()` calls (for example once per UI frame) and reads
//! `progress()` until `is_done()`.

pub mod job;
pub mod scan;
pub mod tessellate;
pub mod quadtree;

pub use job::*;
pub use scan::*;
pub use tessellate::*;
pub use quadtree::*;

//! # TerraMesh Sampler
//!
//! Adaptive terrain sampling on per-tile quadtrees.
//!
//! For every terrain tile and LOD setting, a [`SampleTree`] raycasts the
//! tile's height grid through an external oracle, merges coplanar regions
//! under a slope-angle tolerance, and tracks eight labeled border slots
//! (four corners, four edge series) that the stitching pass reconciles
//! across neighboring tiles and across LOD levels so shared edges produce
//! identical vertex sets on both sides.

pub mod slots;
pub mod tree;
pub mod stitch;

pub use slots::*;
pub use tree::*;
pub use stitch::*;

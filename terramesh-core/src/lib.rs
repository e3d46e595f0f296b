//! Core data structures and traits for terramesh
//!
//! This crate provides the fundamental types shared by the terrain meshing
//! pipeline: surface samples, bounding volumes, per-tile mesh data, build
//! configuration and the terrain height oracle contract.

pub mod point;
pub mod bounds;
pub mod mesh;
pub mod quadtree;
pub mod config;
pub mod oracle;
pub mod error;

pub use point::*;
pub use bounds::*;
pub use mesh::*;
pub use quadtree::*;
pub use config::*;
pub use oracle::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Common result type for terramesh operations
pub type Result<T> = std::result::Result<T, Error>;

//! Build configuration for the terrain meshing pipeline

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings for one level of detail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodSetting {
    /// Power-of-two subdivision depth of the per-tile sample tree; a tile
    /// holds up to `4^subdivision` leaf cells at this LOD.
    pub subdivision: u32,
    /// Slope tolerance in degrees; sibling cells whose normals agree within
    /// this angle are merged into a single coarser cell.
    pub slope_angle_error: f32,
}

impl LodSetting {
    pub fn new(subdivision: u32, slope_angle_error: f32) -> Self {
        Self {
            subdivision,
            slope_angle_error,
        }
    }
}

/// Configuration of a full mesh build across the terrain tile grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshBuildConfig {
    /// Number of tiles along the world x axis
    pub tiles_x: u32,
    /// Number of tiles along the world z axis
    pub tiles_z: u32,
    /// Depth of the exported runtime quadtree over the tile grid
    pub quad_tree_depth: u32,
    /// LOD levels, finest first
    pub lods: Vec<LodSetting>,
    /// Planar area below which a produced triangle is discarded; when not
    /// set, a threshold is derived from the finest LOD's grid resolution.
    pub min_triangle_area: Option<f32>,
}

impl MeshBuildConfig {
    /// Validate the configuration before any job starts.
    ///
    /// All configuration errors are reported here, ahead of tile scanning,
    /// so a bad setup never produces partial output.
    pub fn validate(&self) -> Result<()> {
        if self.lods.is_empty() {
            return Err(Error::Config("no LOD settings configured".into()));
        }
        if self.tiles_x == 0 || self.tiles_z == 0 {
            return Err(Error::Config(format!(
                "tile grid must be non-empty, got {}x{}",
                self.tiles_x, self.tiles_z
            )));
        }
        for (i, lod) in self.lods.iter().enumerate() {
            if lod.subdivision == 0 {
                return Err(Error::Config(format!("LOD {} has zero subdivision", i)));
            }
            if lod.slope_angle_error <= 0.0 || !lod.slope_angle_error.is_finite() {
                return Err(Error::Config(format!(
                    "LOD {} slope angle error must be positive, got {}",
                    i, lod.slope_angle_error
                )));
            }
        }
        if let Some(area) = self.min_triangle_area {
            if area < 0.0 || !area.is_finite() {
                return Err(Error::Config(format!(
                    "minimum triangle area must be non-negative, got {}",
                    area
                )));
            }
        }
        Ok(())
    }

    /// The finest configured subdivision depth
    pub fn max_subdivision(&self) -> u32 {
        self.lods.iter().map(|l| l.subdivision).max().unwrap_or(0)
    }
}

impl Default for MeshBuildConfig {
    fn default() -> Self {
        Self {
            tiles_x: 1,
            tiles_z: 1,
            quad_tree_depth: 1,
            lods: vec![LodSetting::new(4, 5.0), LodSetting::new(2, 10.0)],
            min_triangle_area: None,
        }
    }
}

//! Tile scanning jobs
//!
//! A [`TileScanJob`] samples one LOD level of the whole tile grid, one tile
//! to completion per `update()` (its grid raycasts, border capture,
//! collapse and collection all happen in that step). [`CreateDataJob`] owns
//! one scanner per configured LOD, steps them in sequence, and finishes by
//! reconciling borders: same-LOD stitching per level, then cross-LOD border
//! copies from the finest level up to the coarsest.

use itertools::iproduct;
use terramesh_core::{
    Aabb, HeightOracle, MeshBuildConfig, Point3f, Result, UvRect, Vector2f,
};
use terramesh_sampler::{copy_borders_from_detail, stitch_same_lod, SampleTree};

use crate::job::BuildJob;

/// Fraction of overall progress assigned to scanning; the remainder is the
/// border reconciliation step.
const SCAN_PROGRESS_SPAN: f32 = 0.95;

/// Carve the terrain bounds into the tile rectangle at `(tx, tz)`
fn tile_bound(terrain: &Aabb, tiles_x: u32, tiles_z: u32, tx: u32, tz: u32) -> Aabb {
    let min = terrain.min();
    let max = terrain.max();
    let tile_w = terrain.size.x / tiles_x as f32;
    let tile_d = terrain.size.z / tiles_z as f32;
    Aabb::from_min_max(
        Point3f::new(min.x + tx as f32 * tile_w, min.y, min.z + tz as f32 * tile_d),
        Point3f::new(
            min.x + (tx + 1) as f32 * tile_w,
            max.y,
            min.z + (tz + 1) as f32 * tile_d,
        ),
    )
}

fn tile_uv_rect(tiles_x: u32, tiles_z: u32, tx: u32, tz: u32) -> UvRect {
    UvRect::new(
        Vector2f::new(tx as f32 / tiles_x as f32, tz as f32 / tiles_z as f32),
        Vector2f::new(
            (tx + 1) as f32 / tiles_x as f32,
            (tz + 1) as f32 / tiles_z as f32,
        ),
    )
}

/// Scans every tile of one LOD level, one tile per step
pub struct TileScanJob<'a, O: HeightOracle> {
    oracle: &'a O,
    slope_angle_error: f32,
    pub tiles: Vec<SampleTree>,
    cursor: usize,
}

impl<'a, O: HeightOracle> TileScanJob<'a, O> {
    pub fn new(
        config: &MeshBuildConfig,
        lod_index: usize,
        terrain_bound: Aabb,
        oracle: &'a O,
    ) -> Self {
        let lod = config.lods[lod_index];
        let tiles = iproduct!(0..config.tiles_z, 0..config.tiles_x)
            .map(|(tz, tx)| {
                SampleTree::new(
                    tx,
                    tz,
                    tile_bound(&terrain_bound, config.tiles_x, config.tiles_z, tx, tz),
                    tile_uv_rect(config.tiles_x, config.tiles_z, tx, tz),
                    lod.subdivision,
                )
            })
            .collect();
        Self {
            oracle,
            slope_angle_error: lod.slope_angle_error,
            tiles,
            cursor: 0,
        }
    }
}

impl<O: HeightOracle> BuildJob for TileScanJob<'_, O> {
    fn update(&mut self) -> Result<()> {
        if self.cursor >= self.tiles.len() {
            return Ok(());
        }
        let tree = &mut self.tiles[self.cursor];
        tree.scan(self.oracle);
        tree.combine(self.slope_angle_error);
        tree.collect();
        self.cursor += 1;
        Ok(())
    }

    fn progress(&self) -> f32 {
        self.cursor as f32 / self.tiles.len().max(1) as f32
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.tiles.len()
    }
}

/// Scans all tiles across all LOD levels, then reconciles borders
pub struct CreateDataJob<'a, O: HeightOracle> {
    config: MeshBuildConfig,
    scanners: Vec<TileScanJob<'a, O>>,
    terrain_bound: Aabb,
    current: usize,
    finished: bool,
}

impl<'a, O: HeightOracle> CreateDataJob<'a, O> {
    /// Validates the configuration up front; a bad setup never starts.
    pub fn new(config: MeshBuildConfig, terrain_bound: Aabb, oracle: &'a O) -> Result<Self> {
        config.validate()?;
        let scanners = (0..config.lods.len())
            .map(|lod_index| TileScanJob::new(&config, lod_index, terrain_bound, oracle))
            .collect();
        Ok(Self {
            config,
            scanners,
            terrain_bound,
            current: 0,
            finished: false,
        })
    }

    pub fn terrain_bound(&self) -> Aabb {
        self.terrain_bound
    }

    pub fn config(&self) -> &MeshBuildConfig {
        &self.config
    }

    /// Stitch within every LOD level, then copy borders from each finer
    /// level into the next coarser one so LOD transitions share compatible
    /// border vertex sets.
    fn end_process(&mut self) {
        for scanner in self.scanners.iter_mut() {
            stitch_same_lod(
                &mut scanner.tiles,
                self.config.tiles_x,
                self.config.tiles_z,
            );
        }

        // Distance tolerance: half the finest LOD's minimum edge length.
        let finest_cells = 1u32 << self.config.max_subdivision();
        let tile_w = self.terrain_bound.size.x / self.config.tiles_x as f32;
        let tile_d = self.terrain_bound.size.z / self.config.tiles_z as f32;
        let min_edge = (tile_w / finest_cells as f32).min(tile_d / finest_cells as f32);
        let tolerance = min_edge * 0.5;

        for lod in 1..self.scanners.len() {
            let (finer, coarser) = self.scanners.split_at_mut(lod);
            let fine_tiles = &finer[lod - 1].tiles;
            for (coarse, fine) in coarser[0].tiles.iter_mut().zip(fine_tiles) {
                copy_borders_from_detail(coarse, fine, tolerance);
            }
        }
    }

    /// The scanned and reconciled tile grids, one `Vec<SampleTree>` per LOD
    /// level, finest first. Call after the job reports done.
    pub fn into_lod_tiles(self) -> Vec<Vec<SampleTree>> {
        debug_assert!(self.finished, "scan job consumed before completion");
        self.scanners.into_iter().map(|s| s.tiles).collect()
    }
}

impl<O: HeightOracle> BuildJob for CreateDataJob<'_, O> {
    fn update(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        while self.current < self.scanners.len() && self.scanners[self.current].is_done() {
            self.current += 1;
        }
        if self.current < self.scanners.len() {
            self.scanners[self.current].update()?;
            return Ok(());
        }
        self.end_process();
        self.finished = true;
        Ok(())
    }

    fn progress(&self) -> f32 {
        if self.finished {
            return 1.0;
        }
        let total: usize = self.scanners.iter().map(|s| s.tiles.len()).sum();
        let done: usize = self.scanners.iter().map(|s| s.cursor).sum();
        done as f32 / total.max(1) as f32 * SCAN_PROGRESS_SPAN
    }

    fn is_done(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::drive_to_completion;
    use terramesh_core::{HeightfieldOracle, LodSetting};

    fn flat_terrain() -> (MeshBuildConfig, Aabb, HeightfieldOracle) {
        let config = MeshBuildConfig {
            tiles_x: 2,
            tiles_z: 2,
            quad_tree_depth: 1,
            lods: vec![LodSetting::new(2, 5.0)],
            min_triangle_area: Some(0.0),
        };
        let bound = Aabb::from_min_max(Point3f::new(0.0, -1.0, 0.0), Point3f::new(16.0, 1.0, 16.0));
        let oracle = HeightfieldOracle::flat(17, 17, 1.0, 0.0);
        (config, bound, oracle)
    }

    #[test]
    fn test_tile_bounds_partition_terrain() {
        let terrain = Aabb::from_min_max(Point3f::new(0.0, 0.0, 0.0), Point3f::new(8.0, 1.0, 8.0));
        let b00 = tile_bound(&terrain, 2, 2, 0, 0);
        let b11 = tile_bound(&terrain, 2, 2, 1, 1);
        assert_eq!(b00.min().x, 0.0);
        assert_eq!(b00.max().x, 4.0);
        assert_eq!(b11.min().z, 4.0);
        assert_eq!(b11.max().z, 8.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (mut config, bound, oracle) = flat_terrain();
        config.lods.clear();
        assert!(CreateDataJob::new(config, bound, &oracle).is_err());
    }

    #[test]
    fn test_progress_is_monotone() {
        let (config, bound, oracle) = flat_terrain();
        let mut job = CreateDataJob::new(config, bound, &oracle).unwrap();
        let mut last = 0.0f32;
        while !job.is_done() {
            job.update().unwrap();
            let now = job.progress();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(job.progress(), 1.0);
    }

    #[test]
    fn test_flat_grid_tiles_all_collapse() {
        let (config, bound, oracle) = flat_terrain();
        let mut job = CreateDataJob::new(config, bound, &oracle).unwrap();
        drive_to_completion(&mut job, 64).unwrap();

        let lods = job.into_lod_tiles();
        assert_eq!(lods.len(), 1);
        assert_eq!(lods[0].len(), 4);
        for tree in &lods[0] {
            assert_eq!(tree.leaf_count(), 1);
            assert_eq!(tree.sample_count(), 4);
        }
    }

    #[test]
    fn test_adjacent_borders_identical_after_stitch() {
        use terramesh_sampler::BorderSlot;

        let (config, bound, oracle) = flat_terrain();
        let mut job = CreateDataJob::new(config, bound, &oracle).unwrap();
        drive_to_completion(&mut job, 64).unwrap();

        let lods = job.into_lod_tiles();
        let tiles = &lods[0];
        // Tile 0 and tile 1 share tile 0's right edge.
        assert_eq!(
            tiles[0].boundaries.get(&BorderSlot::Right),
            tiles[1].boundaries.get(&BorderSlot::Left)
        );
        assert!(tiles[0].stitched_borders.contains(&BorderSlot::Right));
        assert!(tiles[1].stitched_borders.contains(&BorderSlot::Left));
    }
}

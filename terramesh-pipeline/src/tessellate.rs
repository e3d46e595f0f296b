//! Tessellation job
//!
//! Consumes the scanned, border-reconciled tile grids and produces the
//! final per-tile per-LOD mesh buffers: the border slot lists are merged
//! into the plain vertex list, the planar (x, z) point set is handed to the
//! divide-and-conquer triangulator, and faces whose projected area falls
//! below the minimum-triangle-area threshold are discarded — slivers from
//! near-duplicate boundary samples vanish while adjacent triangles absorb
//! the area. One tile (all its LOD levels) is tessellated per `update()`.

use std::collections::HashMap;

use log::{error, warn};
use terramesh_core::{
    Aabb, Error, LodMesh, MeshBuildConfig, Point2d, Result, SurfaceSample, TileMeshData,
};
use terramesh_delaunay::{counterclockwise, divconq_triangulate, TriangulateOpts};
use terramesh_sampler::SampleTree;

use crate::job::BuildJob;

/// Sliver threshold as a fraction of the finest grid cell area, used when
/// the configuration does not fix `min_triangle_area` explicitly.
const DERIVED_AREA_FACTOR: f32 = 0.01;

/// Triangulates every tile's final vertex set, one tile per step
pub struct TessellationJob {
    lod_tiles: Vec<Vec<SampleTree>>,
    min_triangle_area: f32,
    opts: TriangulateOpts,
    cursor: usize,
    tile_count: usize,
    pub meshes: Vec<TileMeshData>,
}

impl TessellationJob {
    pub fn new(config: &MeshBuildConfig, terrain_bound: Aabb, lod_tiles: Vec<Vec<SampleTree>>) -> Result<Self> {
        config.validate()?;
        if lod_tiles.len() != config.lods.len() {
            return Err(Error::InvalidData(format!(
                "expected {} LOD tile grids, got {}",
                config.lods.len(),
                lod_tiles.len()
            )));
        }
        let tile_count = (config.tiles_x * config.tiles_z) as usize;
        if lod_tiles.iter().any(|tiles| tiles.len() != tile_count) {
            return Err(Error::InvalidData(
                "LOD tile grid does not match the configured tile counts".into(),
            ));
        }

        let min_triangle_area = config.min_triangle_area.unwrap_or_else(|| {
            let cells = (1u32 << config.max_subdivision()) as f32;
            let tile_w = terrain_bound.size.x / config.tiles_x as f32;
            let tile_d = terrain_bound.size.z / config.tiles_z as f32;
            (tile_w / cells) * (tile_d / cells) * DERIVED_AREA_FACTOR
        });

        Ok(Self {
            lod_tiles,
            min_triangle_area,
            opts: TriangulateOpts::default(),
            cursor: 0,
            tile_count,
            meshes: Vec::with_capacity(tile_count),
        })
    }

    pub fn min_triangle_area(&self) -> f32 {
        self.min_triangle_area
    }

    /// The finished tile meshes, one per tile. Call after the job is done.
    pub fn into_meshes(self) -> Vec<TileMeshData> {
        debug_assert!(self.is_done(), "tessellation consumed before completion");
        self.meshes
    }

    fn tessellate_tile(&self, tile_index: usize) -> TileMeshData {
        let mut bounds: Option<Aabb> = None;
        let mut lods = Vec::with_capacity(self.lod_tiles.len());

        for (lod_level, tiles) in self.lod_tiles.iter().enumerate() {
            let tree = &tiles[tile_index];
            let lod_mesh = match tessellate_tree(tree, self.min_triangle_area, &self.opts) {
                Some(mesh) => mesh,
                None => {
                    // The tile contributes nothing at this LOD; the batch
                    // carries on with an empty record.
                    warn!(
                        "tile ({}, {}) produced no triangles at LOD {}",
                        tree.tile_x, tree.tile_z, lod_level
                    );
                    LodMesh {
                        uv_rect: tree.uv_rect,
                        ..LodMesh::default()
                    }
                }
            };
            for vertex in &lod_mesh.vertices {
                match bounds.as_mut() {
                    Some(bounds) => bounds.encapsulate(vertex),
                    None => bounds = Some(Aabb::new(*vertex, nalgebra::Vector3::zeros())),
                }
            }
            lods.push(lod_mesh);
        }

        let tree = &self.lod_tiles[0][tile_index];
        TileMeshData {
            mesh_id: tile_index as u32,
            bounds: bounds.unwrap_or(tree.bound),
            lods,
        }
    }
}

/// Triangulate one tile at one LOD. `None` when the tile has no usable
/// geometry at this level.
fn tessellate_tree(
    tree: &SampleTree,
    min_triangle_area: f32,
    opts: &TriangulateOpts,
) -> Option<LodMesh> {
    // Merge the border slot lists into the plain vertex list.
    let samples = tree.all_samples();
    if samples.len() < 3 {
        warn!(
            "tile ({}, {}) has {} samples, skipping tessellation",
            tree.tile_x,
            tree.tile_z,
            samples.len()
        );
        return None;
    }

    let points: Vec<Point2d> = samples
        .iter()
        .map(|s| Point2d::new(s.position.x as f64, s.position.z as f64))
        .collect();

    let mesh = match divconq_triangulate(&points, opts) {
        Ok(mesh) => mesh,
        Err(err) => {
            error!(
                "triangulation failed for tile ({}, {}): {}",
                tree.tile_x, tree.tile_z, err
            );
            return None;
        }
    };

    // Stitching can inject coincident samples; they surface as Undead
    // vertices and must account for every missing output vertex.
    let mut live_mesh = mesh;
    let numbered = live_mesh.number_vertices();
    if numbered + live_mesh.undead_count != samples.len() {
        error!(
            "vertex count mismatch on tile ({}, {}): {} numbered + {} undead != {} samples",
            tree.tile_x,
            tree.tile_z,
            numbered,
            live_mesh.undead_count,
            samples.len()
        );
        return None;
    }

    let faces = live_mesh.extract_faces();
    if faces.is_empty() {
        return None;
    }

    // Area filter, then compact the vertex arrays to referenced samples.
    let mut lod = LodMesh {
        uv_rect: tree.uv_rect,
        ..LodMesh::default()
    };
    let mut remap: HashMap<u32, u32> = HashMap::new();
    for face in faces {
        let [a, b, c] = face.map(|i| &samples[i as usize]);
        let area = 0.5
            * counterclockwise(
                Point2d::new(a.position.x as f64, a.position.z as f64),
                Point2d::new(b.position.x as f64, b.position.z as f64),
                Point2d::new(c.position.x as f64, c.position.z as f64),
            ) as f32;
        if area < min_triangle_area {
            continue;
        }
        let indices = face.map(|sample_index| {
            *remap.entry(sample_index).or_insert_with(|| {
                let sample: &SurfaceSample = &samples[sample_index as usize];
                let index = lod.vertices.len() as u32;
                lod.vertices.push(sample.position);
                lod.normals.push(sample.normal);
                lod.uvs.push(sample.uv);
                index
            })
        });
        lod.faces.push(indices);
    }

    if lod.faces.is_empty() {
        None
    } else {
        Some(lod)
    }
}

impl BuildJob for TessellationJob {
    fn update(&mut self) -> Result<()> {
        if self.cursor >= self.tile_count {
            return Ok(());
        }
        let mesh = self.tessellate_tile(self.cursor);
        self.meshes.push(mesh);
        self.cursor += 1;
        Ok(())
    }

    fn progress(&self) -> f32 {
        self.cursor as f32 / self.tile_count.max(1) as f32
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.tile_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::drive_to_completion;
    use crate::scan::CreateDataJob;
    use terramesh_core::{HeightfieldOracle, LodSetting, Point3f};

    fn scan_flat(
        tiles: u32,
        subdivision: u32,
    ) -> (MeshBuildConfig, Aabb, Vec<Vec<SampleTree>>) {
        let config = MeshBuildConfig {
            tiles_x: tiles,
            tiles_z: tiles,
            quad_tree_depth: 1,
            lods: vec![LodSetting::new(subdivision, 5.0)],
            min_triangle_area: Some(0.0),
        };
        let size = tiles as f32 * 8.0;
        let bound =
            Aabb::from_min_max(Point3f::new(0.0, -1.0, 0.0), Point3f::new(size, 1.0, size));
        let oracle = HeightfieldOracle::flat(size as usize + 1, size as usize + 1, 1.0, 0.0);
        let mut job = CreateDataJob::new(config.clone(), bound, &oracle).unwrap();
        drive_to_completion(&mut job, 1024).unwrap();
        (config, bound, job.into_lod_tiles())
    }

    #[test]
    fn test_flat_tile_gives_two_triangles() {
        let (config, bound, lod_tiles) = scan_flat(2, 2);
        let mut job = TessellationJob::new(&config, bound, lod_tiles).unwrap();
        drive_to_completion(&mut job, 16).unwrap();

        let meshes = job.into_meshes();
        assert_eq!(meshes.len(), 4);
        for mesh in &meshes {
            assert_eq!(mesh.lods.len(), 1);
            assert_eq!(mesh.lods[0].vertex_count(), 4);
            assert_eq!(mesh.lods[0].face_count(), 2);
        }
    }

    #[test]
    fn test_mesh_ids_and_bounds() {
        let (config, bound, lod_tiles) = scan_flat(2, 2);
        let mut job = TessellationJob::new(&config, bound, lod_tiles).unwrap();
        drive_to_completion(&mut job, 16).unwrap();

        let meshes = job.into_meshes();
        for (i, mesh) in meshes.iter().enumerate() {
            assert_eq!(mesh.mesh_id, i as u32);
            // Flat terrain: bounds are the tile rectangle at height zero.
            assert_eq!(mesh.bounds.size.y, 0.0);
            assert_eq!(mesh.bounds.size.x, 8.0);
        }
    }

    #[test]
    fn test_area_filter_drops_slivers() {
        let (config, bound, mut lod_tiles) = scan_flat(1, 2);
        // Inject a near-duplicate border sample: the sliver it would form
        // must not survive a positive area threshold.
        use terramesh_core::{SurfaceSample, Vector2f, Vector3f};
        use terramesh_sampler::BorderSlot;
        let tree = &mut lod_tiles[0][0];
        let nudged = SurfaceSample::new(
            Point3f::new(1e-4, 0.0, 0.0),
            Vector3f::y(),
            Vector2f::zeros(),
        );
        tree.boundaries
            .entry(BorderSlot::Bottom)
            .or_default()
            .insert(0, nudged);

        let config = MeshBuildConfig {
            min_triangle_area: Some(1e-3),
            ..config
        };
        let mut job = TessellationJob::new(&config, bound, lod_tiles).unwrap();
        drive_to_completion(&mut job, 4).unwrap();

        let meshes = job.into_meshes();
        let lod = &meshes[0].lods[0];
        for face in &lod.faces {
            let a = lod.vertices[face[0] as usize];
            let b = lod.vertices[face[1] as usize];
            let c = lod.vertices[face[2] as usize];
            let area = 0.5
                * ((b.x - a.x) * (c.z - a.z) - (b.z - a.z) * (c.x - a.x)).abs();
            assert!(area >= 1e-3);
        }
    }

    #[test]
    fn test_rejects_mismatched_grids() {
        let (config, bound, mut lod_tiles) = scan_flat(2, 2);
        lod_tiles[0].pop();
        assert!(TessellationJob::new(&config, bound, lod_tiles).is_err());
    }

    #[test]
    fn test_tiny_tile_skipped_not_fatal() {
        let (config, bound, mut lod_tiles) = scan_flat(1, 2);
        // Strip the tile down to fewer than three samples.
        let tree = &mut lod_tiles[0][0];
        tree.vertices.clear();
        tree.boundaries.clear();

        let mut job = TessellationJob::new(&config, bound, lod_tiles).unwrap();
        drive_to_completion(&mut job, 4).unwrap();
        let meshes = job.into_meshes();
        assert_eq!(meshes.len(), 1);
        assert!(meshes[0].lods[0].is_empty());
    }
}

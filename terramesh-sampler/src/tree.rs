//! Per-tile adaptive sample tree
//!
//! A full quadtree of the configured subdivision depth covers one terrain
//! tile. Sampling overwrites every node and leaf center through the height
//! oracle (normals are needed at every level, not just the leaves, because
//! the collapse test compares child normals against their parent's).
//! The max-resolution raycast grid is threaded into the covering leaves by
//! quadrant bit-extraction; collapsing merges the children's retained
//! samples and decimates them to the merged cell's corner stride, which is
//! what shrinks border series on flat ground. Collection then splits the
//! retained samples into the tile's interior vertex list and its eight
//! labeled border slots.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;
use terramesh_core::{Aabb, HeightOracle, Point3f, SurfaceSample, UvRect, Vector2f, Vector3f};

use crate::slots::BorderSlot;

/// Inward nudge applied when raycasting at tile-grid extremes, so a query
/// never lands exactly on a terrain tile seam.
const SEAM_EPSILON: f32 = 1e-6;

/// A retained max-resolution grid sample and the border slot it belongs to
/// (`None` for tile-interior samples)
#[derive(Debug, Clone)]
struct RetainedSample {
    slot: Option<BorderSlot>,
    sample: SurfaceSample,
}

/// A terminal cell holding its center sample and the retained grid samples
/// threaded into it
#[derive(Debug)]
pub struct SampleLeaf {
    pub sample: SurfaceSample,
    retained: BTreeMap<u64, RetainedSample>,
}

/// An internal cell owning exactly four children
#[derive(Debug)]
pub struct SampleNode {
    pub sample: SurfaceSample,
    pub children: [SampleChild; 4],
}

#[derive(Debug)]
pub enum SampleChild {
    Node(Box<SampleNode>),
    Leaf(SampleLeaf),
}

/// One tile's sampling quadtree plus its collected output: interior
/// vertices, the eight border slot lists, and the record of which slots
/// stitching has already reconciled.
#[derive(Debug)]
pub struct SampleTree {
    pub tile_x: u32,
    pub tile_z: u32,
    pub bound: Aabb,
    pub uv_rect: UvRect,
    subdivision: u32,
    root: SampleChild,
    pub vertices: Vec<SurfaceSample>,
    pub boundaries: HashMap<BorderSlot, Vec<SurfaceSample>>,
    pub stitched_borders: HashSet<BorderSlot>,
}

#[inline]
fn grid_key(x: u32, z: u32) -> u64 {
    ((z as u64) << 32) | x as u64
}

#[inline]
fn split_key(key: u64) -> (u64, u64) {
    (key & 0xffff_ffff, key >> 32)
}

/// Angle between two directions in degrees; degenerate inputs count as a
/// full disagreement so they never enable a collapse.
fn angle_between_degrees(a: &Vector3f, b: &Vector3f) -> f32 {
    match (a.try_normalize(1e-12), b.try_normalize(1e-12)) {
        (Some(a), Some(b)) => a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 180.0,
    }
}

fn merge_retained(map: &mut BTreeMap<u64, RetainedSample>, key: u64, entry: RetainedSample) {
    match map.entry(key) {
        std::collections::btree_map::Entry::Vacant(vacant) => {
            vacant.insert(entry);
        }
        std::collections::btree_map::Entry::Occupied(mut occupied) => {
            let existing = occupied.get_mut();
            existing.sample = existing.sample.averaged_with(&entry.sample);
            // Corner labels outrank edge labels, labeled outranks interior.
            let stronger = match (existing.slot, entry.slot) {
                (None, slot) => slot,
                (Some(old), Some(new)) if new.is_corner() && !old.is_corner() => Some(new),
                (old, _) => old,
            };
            existing.slot = stronger;
        }
    }
}

impl SampleTree {
    /// Build the full tree of the given subdivision depth over a tile.
    /// Every node and leaf center is pre-assigned its planar position and
    /// UV; heights and normals arrive with [`SampleTree::scan`].
    pub fn new(tile_x: u32, tile_z: u32, bound: Aabb, uv_rect: UvRect, subdivision: u32) -> Self {
        let max = (1u32 << subdivision) as f32;
        let root = Self::build_child(subdivision, 0, 0, &bound, &uv_rect, max);
        Self {
            tile_x,
            tile_z,
            bound,
            uv_rect,
            subdivision,
            root,
            vertices: Vec::new(),
            boundaries: HashMap::new(),
            stitched_borders: HashSet::new(),
        }
    }

    fn center_sample(bound: &Aabb, uv_rect: &UvRect, max: f32, gx: f32, gz: f32) -> SurfaceSample {
        let min = bound.min();
        let fx = gx / max;
        let fz = gz / max;
        SurfaceSample::new(
            Point3f::new(
                min.x + fx * bound.size.x,
                bound.center.y,
                min.z + fz * bound.size.z,
            ),
            Vector3f::y(),
            Vector2f::new(
                uv_rect.min.x + fx * (uv_rect.max.x - uv_rect.min.x),
                uv_rect.min.y + fz * (uv_rect.max.y - uv_rect.min.y),
            ),
        )
    }

    fn build_child(
        level: u32,
        x0: u32,
        z0: u32,
        bound: &Aabb,
        uv_rect: &UvRect,
        max: f32,
    ) -> SampleChild {
        let span = 1u32 << level;
        let center = Self::center_sample(
            bound,
            uv_rect,
            max,
            x0 as f32 + span as f32 * 0.5,
            z0 as f32 + span as f32 * 0.5,
        );
        if level == 0 {
            SampleChild::Leaf(SampleLeaf {
                sample: center,
                retained: BTreeMap::new(),
            })
        } else {
            let half = span / 2;
            SampleChild::Node(Box::new(SampleNode {
                sample: center,
                children: [
                    Self::build_child(level - 1, x0, z0, bound, uv_rect, max),
                    Self::build_child(level - 1, x0 + half, z0, bound, uv_rect, max),
                    Self::build_child(level - 1, x0, z0 + half, bound, uv_rect, max),
                    Self::build_child(level - 1, x0 + half, z0 + half, bound, uv_rect, max),
                ],
            }))
        }
    }

    pub fn subdivision(&self) -> u32 {
        self.subdivision
    }

    /// Grid resolution along one tile edge
    pub fn grid_max(&self) -> u32 {
        1 << self.subdivision
    }

    /// Map a max-resolution grid coordinate into world planar coordinates,
    /// clamped to the tile's bounds
    pub fn grid_to_world(&self, x: u32, z: u32) -> (f32, f32) {
        let min = self.bound.min();
        let max = self.bound.max();
        let f = self.grid_max() as f32;
        (
            (min.x + x as f32 / f * self.bound.size.x).clamp(min.x, max.x),
            (min.z + z as f32 / f * self.bound.size.z).clamp(min.z, max.z),
        )
    }

    fn grid_to_uv(&self, x: u32, z: u32) -> Vector2f {
        let f = self.grid_max() as f32;
        Vector2f::new(
            self.uv_rect.min.x + x as f32 / f * (self.uv_rect.max.x - self.uv_rect.min.x),
            self.uv_rect.min.y + z as f32 / f * (self.uv_rect.max.y - self.uv_rect.min.y),
        )
    }

    /// Overwrite every node and leaf center sample through the oracle,
    /// top-down. A missed query keeps the previously known height.
    pub fn run_sampling<O: HeightOracle>(&mut self, oracle: &O) {
        let (tile_x, tile_z) = (self.tile_x, self.tile_z);
        Self::sample_child(&mut self.root, oracle, tile_x, tile_z);
    }

    fn sample_child<O: HeightOracle>(child: &mut SampleChild, oracle: &O, tile_x: u32, tile_z: u32) {
        let sample = match child {
            SampleChild::Node(node) => &mut node.sample,
            SampleChild::Leaf(leaf) => &mut leaf.sample,
        };
        match oracle.sample(sample.position.x, sample.position.z) {
            Some(hit) => {
                sample.position.y = hit.position.y;
                sample.normal = hit.normal;
            }
            None => warn!(
                "height query missed at ({}, {}) on tile ({}, {}); keeping previous height",
                sample.position.x, sample.position.z, tile_x, tile_z
            ),
        }
        if let SampleChild::Node(node) = child {
            for c in node.children.iter_mut() {
                Self::sample_child(c, oracle, tile_x, tile_z);
            }
        }
    }

    /// Thread a max-resolution grid sample down into the covering leaf by
    /// repeated quadrant bit-extraction. A sample threaded twice onto the
    /// same grid point is averaged in place.
    pub fn add_boundary(
        &mut self,
        x: u32,
        z: u32,
        slot: Option<BorderSlot>,
        sample: SurfaceSample,
    ) {
        let key = grid_key(x, z);
        let mut level = self.subdivision;
        let (mut lx, mut lz) = (x, z);
        let mut current = &mut self.root;
        loop {
            match current {
                SampleChild::Leaf(leaf) => {
                    merge_retained(&mut leaf.retained, key, RetainedSample { slot, sample });
                    return;
                }
                SampleChild::Node(node) => {
                    level -= 1;
                    let ix = (lx >> level).min(1);
                    let iz = (lz >> level).min(1);
                    lx -= ix << level;
                    lz -= iz << level;
                    current = &mut node.children[(iz * 2 + ix) as usize];
                }
            }
        }
    }

    /// Raycast the tile: every node/leaf center plus the full max-resolution
    /// grid, with rim points landing in their labeled border slots. Queries
    /// at grid extremes are nudged inward so they never hit a tile seam.
    pub fn scan<O: HeightOracle>(&mut self, oracle: &O) {
        self.run_sampling(oracle);

        let max = self.grid_max();
        let (bmin, bmax) = (self.bound.min(), self.bound.max());
        for z in 0..=max {
            for x in 0..=max {
                let (wx, wz) = self.grid_to_world(x, z);
                let rx = nudge_off_seam(wx, bmin.x, bmax.x);
                let rz = nudge_off_seam(wz, bmin.z, bmax.z);
                let uv = self.grid_to_uv(x, z);
                let sample = match oracle.sample(rx, rz) {
                    Some(hit) => {
                        SurfaceSample::new(Point3f::new(wx, hit.position.y, wz), hit.normal, uv)
                    }
                    None => {
                        warn!(
                            "height query missed at ({}, {}) on tile ({}, {}); keeping previous height",
                            rx, rz, self.tile_x, self.tile_z
                        );
                        SurfaceSample::new(
                            Point3f::new(wx, self.bound.center.y, wz),
                            Vector3f::y(),
                            uv,
                        )
                    }
                };
                let slot = BorderSlot::classify(x, z, max);
                self.add_boundary(x, z, slot, sample);
            }
        }
    }

    /// Collapse sibling leaves whose normals agree with their parent within
    /// `theta` degrees, bottom-up, then attempt the root itself. Collapsing
    /// is irreversible: merged retained samples are decimated to the new
    /// cell's corner stride.
    pub fn combine(&mut self, theta: f32) {
        let subdivision = self.subdivision;
        Self::combine_child(&mut self.root, theta, subdivision, 0);
    }

    fn combine_child(child: &mut SampleChild, theta: f32, subdivision: u32, depth: u32) {
        let node = match child {
            SampleChild::Node(node) => node,
            SampleChild::Leaf(_) => return,
        };
        for c in node.children.iter_mut() {
            Self::combine_child(c, theta, subdivision, depth + 1);
        }
        let collapsible = node.children.iter().all(|c| match c {
            SampleChild::Leaf(leaf) => {
                angle_between_degrees(&leaf.sample.normal, &node.sample.normal) < theta
            }
            SampleChild::Node(_) => false,
        });
        if !collapsible {
            return;
        }

        let stride = 1u64 << (subdivision - depth);
        let mut retained = BTreeMap::new();
        for c in node.children.iter_mut() {
            if let SampleChild::Leaf(leaf) = c {
                for (key, entry) in std::mem::take(&mut leaf.retained) {
                    merge_retained(&mut retained, key, entry);
                }
            }
        }
        retained.retain(|&key, _| {
            let (x, z) = split_key(key);
            x % stride == 0 && z % stride == 0
        });

        *child = SampleChild::Leaf(SampleLeaf {
            sample: node.sample,
            retained,
        });
    }

    /// Gather the retained samples of every remaining leaf: interior ones
    /// into the vertex list, rim ones into their border slot lists ordered
    /// along the edge.
    pub fn collect(&mut self) {
        let mut vertices = Vec::new();
        let mut slot_maps: HashMap<BorderSlot, BTreeMap<u64, SurfaceSample>> = HashMap::new();
        Self::collect_child(&self.root, &mut vertices, &mut slot_maps);

        self.vertices = vertices;
        self.boundaries = slot_maps
            .into_iter()
            .map(|(slot, map)| (slot, map.into_values().collect()))
            .collect();
    }

    fn collect_child(
        child: &SampleChild,
        vertices: &mut Vec<SurfaceSample>,
        slots: &mut HashMap<BorderSlot, BTreeMap<u64, SurfaceSample>>,
    ) {
        match child {
            SampleChild::Node(node) => {
                for c in node.children.iter() {
                    Self::collect_child(c, vertices, slots);
                }
            }
            SampleChild::Leaf(leaf) => {
                for (&key, entry) in &leaf.retained {
                    match entry.slot {
                        Some(slot) => {
                            slots.entry(slot).or_default().insert(key, entry.sample);
                        }
                        None => vertices.push(entry.sample),
                    }
                }
            }
        }
    }

    /// Number of leaves currently in the tree
    pub fn leaf_count(&self) -> usize {
        fn count(child: &SampleChild) -> usize {
            match child {
                SampleChild::Leaf(_) => 1,
                SampleChild::Node(node) => node.children.iter().map(count).sum(),
            }
        }
        count(&self.root)
    }

    /// Total collected vertex count: interior plus every border slot
    pub fn sample_count(&self) -> usize {
        self.vertices.len() + self.boundaries.values().map(Vec::len).sum::<usize>()
    }

    /// The collected interior and border samples, chained for tessellation
    pub fn all_samples(&self) -> Vec<SurfaceSample> {
        let mut samples = self.vertices.clone();
        // Deterministic slot order keeps tessellation input reproducible.
        for slot in BorderSlot::ALL {
            if let Some(list) = self.boundaries.get(&slot) {
                samples.extend_from_slice(list);
            }
        }
        samples
    }
}

fn nudge_off_seam(w: f32, min: f32, max: f32) -> f32 {
    if w <= min {
        min + SEAM_EPSILON
    } else if w >= max {
        max - SEAM_EPSILON
    } else {
        w
    }
}

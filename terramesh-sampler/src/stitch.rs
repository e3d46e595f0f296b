//! Border stitching
//!
//! Two reconciliation passes keep tile seams crack-free. Between neighbors
//! at the same LOD the border list with more samples simply replaces the
//! shorter one (never a per-vertex merge), and corner normals are averaged
//! across every tile meeting at the point so shading stays continuous while
//! positions remain individually owned. Across LOD levels a coarse tile's
//! border slots absorb the matching fine-tile lists so the coarse border is
//! compatible with the fine one wherever the two meet.

use log::warn;
use terramesh_core::{SurfaceSample, Vector3f};

use crate::slots::BorderSlot;
use crate::tree::SampleTree;

/// Bound-proximity tolerance used to classify a fine tile against a coarse
/// container's edges
const CONTAINER_EPSILON: f32 = 0.01;

/// Force two adjacent tiles' facing border lists to become identical: the
/// list with more samples wins and the other tile receives a copy. Both
/// slots are recorded as stitched; a pair where both sides already were is
/// skipped, so the sweep may visit each tile pair twice at no cost.
pub fn stitch_border(a: &mut SampleTree, slot_a: BorderSlot, b: &mut SampleTree, slot_b: BorderSlot) {
    if a.stitched_borders.contains(&slot_a) && b.stitched_borders.contains(&slot_b) {
        return;
    }

    let list_a = a.boundaries.get(&slot_a).cloned().unwrap_or_default();
    let list_b = b.boundaries.get(&slot_b).cloned().unwrap_or_default();

    let winner = if list_a.len() >= list_b.len() {
        list_a
    } else {
        list_b
    };
    a.boundaries.insert(slot_a, winner.clone());
    b.boundaries.insert(slot_b, winner);

    a.stitched_borders.insert(slot_a);
    b.stitched_borders.insert(slot_b);
}

/// Average the normals of every corner sample meeting at a point and write
/// the result back into each of them. Positions and UVs stay untouched so
/// each tile keeps its own coordinates.
pub fn merge_corners(corners: &mut [&mut SurfaceSample]) {
    if corners.is_empty() {
        return;
    }
    let mut sum = Vector3f::zeros();
    for corner in corners.iter() {
        sum += corner.normal;
    }
    let average = sum / corners.len() as f32;
    let average = average.try_normalize(1e-12).unwrap_or(average);
    for corner in corners.iter_mut() {
        corner.normal = average;
    }
}

fn pair_mut<T>(slice: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = slice.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

/// Reconcile every border of a same-LOD tile grid: facing edge lists become
/// identical and corner normals are shared across all tiles meeting at each
/// grid node.
pub fn stitch_same_lod(tiles: &mut [SampleTree], tiles_x: u32, tiles_z: u32) {
    assert_eq!(tiles.len(), (tiles_x * tiles_z) as usize);
    let index = |tx: u32, tz: u32| (tz * tiles_x + tx) as usize;

    // Edge sweep: every tile looks at all four neighbors; the stitched sets
    // make the second visit of each pair a no-op.
    let neighbor_slots = [
        (1i64, 0i64, BorderSlot::Right),
        (-1, 0, BorderSlot::Left),
        (0, 1, BorderSlot::Top),
        (0, -1, BorderSlot::Bottom),
    ];
    for tz in 0..tiles_z {
        for tx in 0..tiles_x {
            for (dx, dz, slot) in neighbor_slots {
                let nx = tx as i64 + dx;
                let nz = tz as i64 + dz;
                if nx < 0 || nz < 0 || nx >= tiles_x as i64 || nz >= tiles_z as i64 {
                    continue;
                }
                let (a, b) = pair_mut(tiles, index(tx, tz), index(nx as u32, nz as u32));
                stitch_border(a, slot, b, slot.opposite());
            }
        }
    }

    // Corner sweep over every tile-grid node; up to four tiles meet at each.
    for cz in 0..=tiles_z {
        for cx in 0..=tiles_x {
            let mut participants: Vec<(usize, BorderSlot)> = Vec::with_capacity(4);
            if cx > 0 && cz > 0 {
                participants.push((index(cx - 1, cz - 1), BorderSlot::TopRight));
            }
            if cx < tiles_x && cz > 0 {
                participants.push((index(cx, cz - 1), BorderSlot::TopLeft));
            }
            if cx > 0 && cz < tiles_z {
                participants.push((index(cx - 1, cz), BorderSlot::BottomRight));
            }
            if cx < tiles_x && cz < tiles_z {
                participants.push((index(cx, cz), BorderSlot::BottomLeft));
            }

            // Two-phase: sum the present normals, then write the average
            // back to every participant.
            let mut sum = Vector3f::zeros();
            let mut present = 0;
            for &(tile, slot) in &participants {
                if let Some(sample) = tiles[tile].boundaries.get(&slot).and_then(|l| l.first()) {
                    sum += sample.normal;
                    present += 1;
                }
            }
            if present == 0 {
                continue;
            }
            let average = (sum / present as f32)
                .try_normalize(1e-12)
                .unwrap_or(sum / present as f32);
            for &(tile, slot) in &participants {
                if let Some(sample) = tiles[tile]
                    .boundaries
                    .get_mut(&slot)
                    .and_then(|l| l.first_mut())
                {
                    sample.normal = average;
                }
                tiles[tile].stitched_borders.insert(slot);
            }
        }
    }
}

/// Which coarse-container borders a fine tile's bounds line up with
fn matched_edges(coarse: &SampleTree, fine: &SampleTree) -> Vec<BorderSlot> {
    let cmin = coarse.bound.min();
    let cmax = coarse.bound.max();
    let fmin = fine.bound.min();
    let fmax = fine.bound.max();

    let mut edges = Vec::with_capacity(4);
    if (fmin.x - cmin.x).abs() <= CONTAINER_EPSILON {
        edges.push(BorderSlot::Left);
    }
    if (fmax.x - cmax.x).abs() <= CONTAINER_EPSILON {
        edges.push(BorderSlot::Right);
    }
    if (fmin.z - cmin.z).abs() <= CONTAINER_EPSILON {
        edges.push(BorderSlot::Bottom);
    }
    if (fmax.z - cmax.z).abs() <= CONTAINER_EPSILON {
        edges.push(BorderSlot::Top);
    }
    edges
}

fn edge_sort_key(slot: BorderSlot, sample: &SurfaceSample) -> f32 {
    match slot {
        BorderSlot::Bottom | BorderSlot::Top => sample.position.x,
        _ => sample.position.z,
    }
}

/// Merge a fine tile's boundary lists into the matching border slots of a
/// coarser-LOD container so the coarse border becomes compatible with the
/// fine one. For every matched edge, three fine lists are pulled in: the
/// edge series plus both adjoining corners. A fine sample is appended only
/// when no coarse sample sits within `tolerance` of it (half the finest
/// LOD's minimum edge length); lists stay ordered along their edge.
///
/// A fine tile whose bounds touch no coarse border indicates malformed tile
/// geometry upstream: logged and skipped, never fatal.
pub fn copy_borders_from_detail(coarse: &mut SampleTree, fine: &SampleTree, tolerance: f32) {
    let edges = matched_edges(coarse, fine);
    if edges.is_empty() {
        warn!(
            "detail tile ({}, {}) shares no border with container tile ({}, {}); skipping",
            fine.tile_x, fine.tile_z, coarse.tile_x, coarse.tile_z
        );
        return;
    }

    for slot in edges {
        let mut incoming: Vec<SurfaceSample> = Vec::new();
        if let Some(list) = fine.boundaries.get(&slot) {
            incoming.extend_from_slice(list);
        }
        for corner in slot.adjoining_corners() {
            if let Some(list) = fine.boundaries.get(&corner) {
                incoming.extend_from_slice(list);
            }
        }
        if incoming.is_empty() {
            continue;
        }

        // Existing coarse samples on this border: the edge series plus its
        // corner slots, so corner points are never duplicated into the edge.
        let mut existing: Vec<SurfaceSample> =
            coarse.boundaries.get(&slot).cloned().unwrap_or_default();
        for corner in slot.adjoining_corners() {
            if let Some(list) = coarse.boundaries.get(&corner) {
                existing.extend_from_slice(list);
            }
        }

        let mut merged = coarse.boundaries.remove(&slot).unwrap_or_default();
        for sample in incoming {
            let duplicate = existing.iter().any(|known| {
                (known.position - sample.position).norm() <= tolerance
            });
            if !duplicate {
                existing.push(sample);
                merged.push(sample);
            }
        }
        merged.sort_by(|a, b| {
            edge_sort_key(slot, a)
                .partial_cmp(&edge_sort_key(slot, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        coarse.boundaries.insert(slot, merged);
        coarse.stitched_borders.insert(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terramesh_core::{Aabb, Point3f, UvRect, Vector2f};

    fn tree_at(tile_x: u32, tile_z: u32, min: Point3f, size: f32) -> SampleTree {
        let bound = Aabb::from_min_max(min, Point3f::new(min.x + size, 1.0, min.z + size));
        SampleTree::new(tile_x, tile_z, bound, UvRect::full(), 2)
    }

    fn sample_at(x: f32, y: f32, z: f32) -> SurfaceSample {
        SurfaceSample::new(Point3f::new(x, y, z), Vector3f::y(), Vector2f::zeros())
    }

    #[test]
    fn test_longer_list_wins() {
        let mut a = tree_at(0, 0, Point3f::new(0.0, -1.0, 0.0), 8.0);
        let mut b = tree_at(1, 0, Point3f::new(8.0, -1.0, 0.0), 8.0);

        a.boundaries.insert(
            BorderSlot::Right,
            vec![
                sample_at(8.0, 0.0, 2.0),
                sample_at(8.0, 0.5, 4.0),
                sample_at(8.0, 0.0, 6.0),
            ],
        );
        b.boundaries
            .insert(BorderSlot::Left, vec![sample_at(8.0, 0.0, 4.0)]);

        stitch_border(&mut a, BorderSlot::Right, &mut b, BorderSlot::Left);

        assert_eq!(a.boundaries[&BorderSlot::Right].len(), 3);
        assert_eq!(
            a.boundaries[&BorderSlot::Right],
            b.boundaries[&BorderSlot::Left]
        );
        assert!(a.stitched_borders.contains(&BorderSlot::Right));
        assert!(b.stitched_borders.contains(&BorderSlot::Left));
    }

    #[test]
    fn test_stitch_skips_already_stitched_pair() {
        let mut a = tree_at(0, 0, Point3f::new(0.0, -1.0, 0.0), 8.0);
        let mut b = tree_at(1, 0, Point3f::new(8.0, -1.0, 0.0), 8.0);

        a.boundaries
            .insert(BorderSlot::Right, vec![sample_at(8.0, 0.0, 4.0)]);
        stitch_border(&mut a, BorderSlot::Right, &mut b, BorderSlot::Left);

        // A later, longer list must not disturb a reconciled pair.
        b.boundaries.insert(
            BorderSlot::Left,
            vec![sample_at(8.0, 9.0, 2.0), sample_at(8.0, 9.0, 6.0)],
        );
        stitch_border(&mut a, BorderSlot::Right, &mut b, BorderSlot::Left);
        assert_eq!(a.boundaries[&BorderSlot::Right].len(), 1);
    }

    #[test]
    fn test_merge_corners_averages_normals_only() {
        let mut s1 = sample_at(0.0, 0.0, 0.0);
        let mut s2 = sample_at(0.0, 1.0, 0.0);
        s1.normal = Vector3f::new(1.0, 0.0, 0.0);
        s2.normal = Vector3f::new(0.0, 1.0, 0.0);

        merge_corners(&mut [&mut s1, &mut s2]);

        let expected = Vector3f::new(1.0, 1.0, 0.0).normalize();
        assert!((s1.normal - expected).norm() < 1e-6);
        assert_eq!(s1.normal, s2.normal);
        // Positions stay individually owned.
        assert_eq!(s1.position.y, 0.0);
        assert_eq!(s2.position.y, 1.0);
    }

    #[test]
    fn test_same_lod_sweep_marks_all_shared_slots() {
        let size = 8.0;
        let mut tiles: Vec<SampleTree> = Vec::new();
        for tz in 0..2 {
            for tx in 0..2 {
                let mut tree = tree_at(
                    tx,
                    tz,
                    Point3f::new(tx as f32 * size, -1.0, tz as f32 * size),
                    size,
                );
                for corner in BorderSlot::CORNERS {
                    tree.boundaries.insert(corner, vec![sample_at(0.0, 0.0, 0.0)]);
                }
                tiles.push(tree);
            }
        }

        stitch_same_lod(&mut tiles, 2, 2);

        // Interior edges of a 2x2 grid: every facing slot is reconciled.
        assert!(tiles[0].stitched_borders.contains(&BorderSlot::Right));
        assert!(tiles[1].stitched_borders.contains(&BorderSlot::Left));
        assert!(tiles[0].stitched_borders.contains(&BorderSlot::Top));
        assert!(tiles[2].stitched_borders.contains(&BorderSlot::Bottom));
        // Corner slots are marked by the corner sweep.
        assert!(tiles[0].stitched_borders.contains(&BorderSlot::TopRight));
        assert!(tiles[3].stitched_borders.contains(&BorderSlot::BottomLeft));
    }

    #[test]
    fn test_corner_normals_shared_across_meeting_tiles() {
        let size = 8.0;
        let mut tiles: Vec<SampleTree> = Vec::new();
        let normals = [
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(1.0, 1.0, 0.0).normalize(),
        ];
        let meet_slots = [
            BorderSlot::TopRight,
            BorderSlot::TopLeft,
            BorderSlot::BottomRight,
            BorderSlot::BottomLeft,
        ];
        for (i, (tz, tx)) in [(0, 0), (0, 1), (1, 0), (1, 1)].into_iter().enumerate() {
            let mut tree = tree_at(
                tx,
                tz,
                Point3f::new(tx as f32 * size, -1.0, tz as f32 * size),
                size,
            );
            let mut sample = sample_at(size, 0.0, size);
            sample.normal = normals[i];
            tree.boundaries.insert(meet_slots[i], vec![sample]);
            tiles.push(tree);
        }

        stitch_same_lod(&mut tiles, 2, 2);

        // All four tiles now share the same normal at the center meet.
        let reference = tiles[0].boundaries[&BorderSlot::TopRight][0].normal;
        for (tile, slot) in tiles.iter().zip(meet_slots) {
            assert!((tile.boundaries[&slot][0].normal - reference).norm() < 1e-6);
        }
    }

    #[test]
    fn test_copy_borders_from_detail_superset() {
        let min = Point3f::new(0.0, -1.0, 0.0);
        let mut coarse = tree_at(0, 0, min, 8.0);
        let fine = {
            let mut fine = tree_at(0, 0, min, 8.0);
            fine.boundaries.insert(
                BorderSlot::Left,
                vec![
                    sample_at(0.0, 0.1, 2.0),
                    sample_at(0.0, 0.2, 4.0),
                    sample_at(0.0, 0.3, 6.0),
                ],
            );
            fine.boundaries
                .insert(BorderSlot::BottomLeft, vec![sample_at(0.0, 0.0, 0.0)]);
            fine.boundaries
                .insert(BorderSlot::TopLeft, vec![sample_at(0.0, 0.0, 8.0)]);
            fine
        };
        // The collapsed coarse tile owns its corners and a sparse edge.
        coarse
            .boundaries
            .insert(BorderSlot::BottomLeft, vec![sample_at(0.0, 0.0, 0.0)]);
        coarse
            .boundaries
            .insert(BorderSlot::TopLeft, vec![sample_at(0.0, 0.0, 8.0)]);
        coarse
            .boundaries
            .insert(BorderSlot::Left, vec![sample_at(0.0, 0.2, 4.0)]);

        copy_borders_from_detail(&mut coarse, &fine, 0.5);

        let left = &coarse.boundaries[&BorderSlot::Left];
        // The fine interior samples appear exactly once each; corners stay
        // in their corner slots.
        assert_eq!(left.len(), 3);
        for sample in left {
            assert!(fine.boundaries[&BorderSlot::Left]
                .iter()
                .any(|f| (f.position - sample.position).norm() <= 0.5));
        }
        // Ordered along the edge.
        for pair in left.windows(2) {
            assert!(pair[0].position.z < pair[1].position.z);
        }
        assert!(coarse.stitched_borders.contains(&BorderSlot::Left));
    }

    #[test]
    fn test_copy_borders_skips_disjoint_container() {
        let mut coarse = tree_at(0, 0, Point3f::new(0.0, -1.0, 0.0), 8.0);
        let fine = tree_at(5, 5, Point3f::new(40.0, -1.0, 40.0), 8.0);
        copy_borders_from_detail(&mut coarse, &fine, 0.5);
        assert!(coarse.boundaries.is_empty());
        assert!(coarse.stitched_borders.is_empty());
    }
}

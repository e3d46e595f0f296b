//! Property tests shared by both triangulators
//!
//! Every output is checked against the structural contract: positively
//! oriented faces, edges shared by at most two triangles, full vertex
//! coverage minus duplicates, and the empty-circumcircle property.

use std::collections::HashMap;

use terramesh_core::Point2d;
use terramesh_delaunay::{
    divconq_triangulate, in_circle, incremental_triangulate, OTri, TriMesh, TriangulateOpts,
    VertexKind,
};

fn pseudo_random_points(count: usize, salt: u64) -> Vec<Point2d> {
    // Deterministic low-discrepancy-ish scatter; good enough to exercise
    // merges without platform-dependent randomness.
    let mut state = salt.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..count)
        .map(|_| Point2d::new(next() * 100.0, next() * 100.0))
        .collect()
}

fn grid_points(n: usize) -> Vec<Point2d> {
    (0..n * n)
        .map(|i| Point2d::new((i % n) as f64, (i / n) as f64))
        .collect()
}

fn check_structure(mesh: &TriMesh, points: &[Point2d]) {
    let mut edge_counts: HashMap<(u32, u32), usize> = HashMap::new();
    let mut covered = vec![false; points.len()];

    for tri in mesh.live_triangles() {
        assert!(
            mesh.triangle_orientation(tri) > 0.0,
            "inverted or degenerate triangle {}",
            tri
        );
        let [v0, v1, v2] = mesh.triangle_vertices(tri);
        for v in [v0, v1, v2] {
            let sample = mesh.vertex(v).sample;
            if (sample as usize) < covered.len() {
                covered[sample as usize] = true;
            }
        }
        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            *edge_counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    assert!(
        edge_counts.values().all(|&c| c <= 2),
        "an edge is shared by more than two triangles"
    );

    // Coverage: every non-duplicate input appears in the mesh.
    let undead: Vec<usize> = mesh
        .vertices
        .iter()
        .filter(|v| v.kind == VertexKind::Undead && (v.sample as usize) < points.len())
        .map(|v| v.sample as usize)
        .collect();
    for (i, was_covered) in covered.iter().enumerate() {
        assert!(
            *was_covered || undead.contains(&i),
            "input point {} missing from the triangulation",
            i
        );
    }
}

fn check_delaunay(mesh: &TriMesh) {
    for tri in mesh.live_triangles() {
        let t = OTri::new(tri, 0);
        let a = mesh.vertex_point(mesh.org(t));
        let b = mesh.vertex_point(mesh.dest(t));
        let c = mesh.vertex_point(mesh.apex(t));
        for (index, vertex) in mesh.vertices.iter().enumerate() {
            if vertex.kind == VertexKind::Undead {
                continue;
            }
            let v = index as u32;
            if v == mesh.org(t) || v == mesh.dest(t) || v == mesh.apex(t) {
                continue;
            }
            assert!(
                in_circle(a, b, c, vertex.point()) <= 1e-9,
                "vertex {} strictly inside circumcircle of triangle {}",
                index,
                tri
            );
        }
    }
}

#[test]
fn test_divconq_properties_on_scattered_points() {
    for salt in 1..5u64 {
        let points = pseudo_random_points(120, salt);
        let mesh = divconq_triangulate(&points, &TriangulateOpts::default()).unwrap();
        check_structure(&mesh, &points);
        check_delaunay(&mesh);
    }
}

#[test]
fn test_incremental_properties_on_scattered_points() {
    for salt in 5..8u64 {
        let points = pseudo_random_points(90, salt);
        let mesh = incremental_triangulate(&points).unwrap();
        check_structure(&mesh, &points);
        check_delaunay(&mesh);
    }
}

#[test]
fn test_properties_on_degenerate_grid() {
    // Grids maximize collinear and cocircular ties.
    let points = grid_points(9);
    let mesh = divconq_triangulate(&points, &TriangulateOpts::default()).unwrap();
    check_structure(&mesh, &points);
    check_delaunay(&mesh);
    assert_eq!(mesh.triangle_count(), 2 * 8 * 8);

    let mesh = incremental_triangulate(&points).unwrap();
    check_structure(&mesh, &points);
    check_delaunay(&mesh);
    assert_eq!(mesh.triangle_count(), 2 * 8 * 8);
}

#[test]
fn test_duplicate_heavy_input() {
    let mut points = grid_points(5);
    let dup_count = points.len();
    points.extend(grid_points(5)); // every point duplicated once

    let mesh = divconq_triangulate(&points, &TriangulateOpts::default()).unwrap();
    assert_eq!(mesh.undead_count, dup_count);
    check_structure(&mesh, &points);
    check_delaunay(&mesh);

    // Identical to triangulating the unique set.
    let unique = divconq_triangulate(&grid_points(5), &TriangulateOpts::default()).unwrap();
    assert_eq!(mesh.triangle_count(), unique.triangle_count());
    assert_eq!(mesh.hull_size, unique.hull_size);
}

#[test]
fn test_both_algorithms_agree_on_counts() {
    for salt in 11..14u64 {
        let points = pseudo_random_points(70, salt);
        let dc = divconq_triangulate(&points, &TriangulateOpts::default()).unwrap();
        let inc = incremental_triangulate(&points).unwrap();
        assert_eq!(dc.triangle_count(), inc.triangle_count());
        assert_eq!(dc.hull_size, inc.hull_size);
    }
}

#[test]
fn test_extract_faces_reference_inputs() {
    let points = pseudo_random_points(40, 99);
    let mesh = divconq_triangulate(&points, &TriangulateOpts::default()).unwrap();
    for face in mesh.extract_faces() {
        for index in face {
            assert!((index as usize) < points.len());
        }
    }
}

//! Incremental Delaunay triangulation
//!
//! Inserts one vertex at a time into a single oversized enclosing triangle,
//! legalizing with Lawson edge flips after every insertion, and removes the
//! enclosure at the end. Functionally equivalent to the divide-and-conquer
//! triangulator but only expected O(n log n) with a favorable insertion
//! order; offered for file-based mesh reconstruction workflows rather than
//! the tile sampling path.

use terramesh_core::{Error, Point2d, Result};

use crate::mesh::{OTri, TriMesh, VertexKind, NO_VERTEX};
use crate::predicates::{counterclockwise, in_circle};

/// Where a point landed during location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    /// Coincides with an existing vertex (the handle's origin)
    OnVertex,
    /// On the interior of the handle's edge
    OnEdge,
    /// Strictly inside the handle's triangle
    InTriangle,
}

/// Triangulate a planar point set by incremental insertion.
///
/// Exact duplicates are marked [`VertexKind::Undead`] and excluded; fewer
/// than three distinct points is a caller error.
pub fn incremental_triangulate(points: &[Point2d]) -> Result<TriMesh> {
    if points.len() < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "triangulation needs at least 3 points, got {}",
            points.len()
        )));
    }

    let mut mesh = TriMesh::new();
    for (i, p) in points.iter().enumerate() {
        mesh.add_vertex(p.x, p.y, i as u32);
    }

    let box_vertices = make_enclosing_triangle(&mut mesh, points);

    let mut recent = OTri::new(1, 0);
    let input_count = points.len() as u32;
    for v in 0..input_count {
        if let Some(handle) = insert_vertex(&mut mesh, v, recent) {
            recent = handle;
        }
    }

    let distinct = input_count as usize - mesh.undead_count;
    if distinct < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "triangulation needs at least 3 distinct points, got {}",
            distinct
        )));
    }

    remove_enclosure(&mut mesh, box_vertices);

    Ok(mesh)
}

/// Build the single enclosing triangle whose corners sit far outside the
/// input's bounding box. Returns the three artificial vertex ids.
fn make_enclosing_triangle(mesh: &mut TriMesh, points: &[Point2d]) -> [u32; 3] {
    let mut min = Point2d::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2d::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let spread = (max.x - min.x).max(max.y - min.y).max(1.0);
    let cx = (min.x + max.x) * 0.5;
    let cy = (min.y + max.y) * 0.5;

    let a = mesh.add_vertex(cx - 50.0 * spread, cy - 40.0 * spread, u32::MAX);
    let b = mesh.add_vertex(cx + 50.0 * spread, cy - 40.0 * spread, u32::MAX);
    let c = mesh.add_vertex(cx, cy + 60.0 * spread, u32::MAX);

    let t = mesh.make_triangle();
    mesh.set_org(t, a);
    mesh.set_dest(t, b);
    mesh.set_apex(t, c);

    [a, b, c]
}

/// Walk toward `p` from `start`, returning the landing classification and a
/// handle whose origin / edge / face contains the point. Falls back to a
/// linear scan if the walk fails to settle.
fn locate(mesh: &TriMesh, p: Point2d, start: OTri) -> (Location, OTri) {
    let mut t = if start.is_ghost() || mesh.is_dead(start.tri) {
        OTri::new(1, 0)
    } else {
        start
    };

    let limit = 3 * mesh.triangle_count().max(16);
    for _ in 0..limit {
        if let Some(result) = classify(mesh, p, t) {
            return result;
        }
        // Cross the first edge that has the point strictly on its far side.
        let (a, b, c) = triangle_points(mesh, t);
        t = if counterclockwise(a, b, p) < 0.0 {
            mesh.sym(t)
        } else if counterclockwise(b, c, p) < 0.0 {
            mesh.sym(t.lnext())
        } else {
            mesh.sym(t.lprev())
        };
        debug_assert!(!t.is_ghost(), "point located outside the enclosure");
    }

    // The walk cycled on degenerate geometry; scan instead.
    for tri in mesh.live_triangles() {
        if let Some(result) = classify(mesh, p, OTri::new(tri, 0)) {
            return result;
        }
    }
    unreachable!("enclosing triangle guarantees containment");
}

fn triangle_points(mesh: &TriMesh, t: OTri) -> (Point2d, Point2d, Point2d) {
    (
        mesh.vertex_point(mesh.org(t)),
        mesh.vertex_point(mesh.dest(t)),
        mesh.vertex_point(mesh.apex(t)),
    )
}

/// `Some` when `p` is on or in the triangle of `t`, with the matching
/// location handle; `None` when it lies strictly outside.
fn classify(mesh: &TriMesh, p: Point2d, t: OTri) -> Option<(Location, OTri)> {
    let (a, b, c) = triangle_points(mesh, t);

    if p == a {
        return Some((Location::OnVertex, t));
    }
    if p == b {
        return Some((Location::OnVertex, t.lnext()));
    }
    if p == c {
        return Some((Location::OnVertex, t.lprev()));
    }

    let d_ab = counterclockwise(a, b, p);
    let d_bc = counterclockwise(b, c, p);
    let d_ca = counterclockwise(c, a, p);
    if d_ab < 0.0 || d_bc < 0.0 || d_ca < 0.0 {
        return None;
    }
    if d_ab == 0.0 {
        return Some((Location::OnEdge, t));
    }
    if d_bc == 0.0 {
        return Some((Location::OnEdge, t.lnext()));
    }
    if d_ca == 0.0 {
        return Some((Location::OnEdge, t.lprev()));
    }
    Some((Location::InTriangle, t))
}

/// Insert one vertex, splitting the containing face or edge and flipping
/// until every suspect edge is locally Delaunay. Returns a handle near the
/// insertion for the next locate, or `None` for a duplicate.
fn insert_vertex(mesh: &mut TriMesh, v: u32, recent: OTri) -> Option<OTri> {
    let p = mesh.vertex_point(v);
    let (location, site) = locate(mesh, p, recent);

    let mut suspects: Vec<OTri> = Vec::with_capacity(8);

    match location {
        Location::OnVertex => {
            mesh.vertices[v as usize].kind = VertexKind::Undead;
            mesh.undead_count += 1;
            return None;
        }
        Location::InTriangle => {
            // Split one triangle into three around the new vertex.
            let h = site;
            let (a_id, b_id) = (mesh.org(h), mesh.dest(h));
            let c_id = mesh.apex(h);
            let n_bc = mesh.sym(h.lnext());
            let n_ca = mesh.sym(h.lprev());

            mesh.set_apex(h, v);
            let t2 = mesh.make_triangle();
            mesh.set_org(t2, b_id);
            mesh.set_dest(t2, c_id);
            mesh.set_apex(t2, v);
            let t3 = mesh.make_triangle();
            mesh.set_org(t3, c_id);
            mesh.set_dest(t3, a_id);
            mesh.set_apex(t3, v);

            mesh.bond(t2, n_bc);
            mesh.bond(t3, n_ca);
            mesh.bond(h.lnext(), t2.lprev());
            mesh.bond(t2.lnext(), t3.lprev());
            mesh.bond(t3.lnext(), h.lprev());

            suspects.extend([h, t2, t3]);
        }
        Location::OnEdge => {
            // Split the two triangles sharing the edge into four.
            let h = site;
            let o = mesh.sym(h);
            debug_assert!(!o.is_ghost(), "edge split on the enclosure hull");

            let a_id = mesh.org(h);
            let b_id = mesh.dest(h);
            let c_id = mesh.apex(h);
            let d_id = mesh.apex(o);

            let n_bc = mesh.sym(h.lnext());
            let n_ad = mesh.sym(o.lnext());

            // h keeps (a, v, c); o keeps (b, v, d).
            mesh.set_dest(h, v);
            mesh.set_dest(o, v);

            let t2 = mesh.make_triangle();
            mesh.set_org(t2, v);
            mesh.set_dest(t2, b_id);
            mesh.set_apex(t2, c_id);
            let t4 = mesh.make_triangle();
            mesh.set_org(t4, v);
            mesh.set_dest(t4, a_id);
            mesh.set_apex(t4, d_id);

            mesh.bond(t2.lnext(), n_bc);
            mesh.bond(t4.lnext(), n_ad);
            mesh.bond(h.lnext(), t2.lprev());
            mesh.bond(o.lnext(), t4.lprev());
            mesh.bond(h, t4);
            mesh.bond(o, t2);

            suspects.extend([h.lprev(), t2.lnext(), o.lprev(), t4.lnext()]);
        }
    }

    let anchor = suspects[0];

    // Lawson legalization: every suspect edge faces away from the new
    // vertex; flip any that a neighboring apex invalidates.
    while let Some(edge) = suspects.pop() {
        if mesh.is_dead(edge.tri) || mesh.apex(edge) != v {
            continue;
        }
        let opposite = mesh.sym(edge);
        if opposite.is_ghost() {
            continue;
        }
        let far = mesh.apex(opposite);
        if far == NO_VERTEX {
            continue;
        }
        let violated = in_circle(
            mesh.vertex_point(mesh.org(edge)),
            mesh.vertex_point(mesh.dest(edge)),
            mesh.vertex_point(v),
            mesh.vertex_point(far),
        ) > 0.0;
        if violated {
            mesh.flip(edge);
            // The rotated quadrilateral exposes two new suspect edges.
            suspects.push(edge.lprev());
            suspects.push(opposite.lnext());
        }
    }

    Some(anchor)
}

/// Remove the enclosing triangle's corners and every triangle touching
/// them, dissolving the survivors' outward bonds into the ghost sentinel,
/// marking hull vertices and counting hull edges.
fn remove_enclosure(mesh: &mut TriMesh, box_vertices: [u32; 3]) {
    // Virus-mark every triangle incident to an enclosure corner.
    let doomed: Vec<u32> = mesh
        .live_triangles()
        .filter(|&tri| {
            mesh.triangle_vertices(tri)
                .iter()
                .any(|vert| box_vertices.contains(vert))
        })
        .collect();
    for &tri in &doomed {
        mesh.infect(tri);
    }

    let mut hull_size = 0;
    let survivors: Vec<u32> = mesh
        .live_triangles()
        .filter(|&tri| !mesh.is_infected(tri))
        .collect();
    for tri in survivors {
        for orient in 0..3 {
            let edge = OTri::new(tri, orient);
            let neighbor = mesh.sym(edge);
            if neighbor.is_ghost() || mesh.is_infected(neighbor.tri) {
                mesh.dissolve(edge);
                mesh.hull_entry = edge;
                hull_size += 1;
                for vert in [mesh.org(edge), mesh.dest(edge)] {
                    mesh.vertices[vert as usize].mark = 1;
                }
            }
        }
    }

    for &tri in &doomed {
        mesh.uninfect(tri);
        mesh.triangle_dealloc(tri);
    }
    // The corners leave the mesh like duplicates do, but they are not
    // counted as such.
    for vert in box_vertices {
        mesh.vertices[vert as usize].kind = VertexKind::Undead;
    }
    mesh.hull_size = hull_size;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divconq::{divconq_triangulate, TriangulateOpts};

    fn p(x: f64, y: f64) -> Point2d {
        Point2d::new(x, y)
    }

    #[test]
    fn test_single_triangle() {
        let mesh = incremental_triangulate(&[p(0.0, 0.0), p(2.0, 0.0), p(1.0, 1.5)]).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.hull_size, 3);
    }

    #[test]
    fn test_square_with_center() {
        let mesh = incremental_triangulate(&[
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.hull_size, 4);
    }

    #[test]
    fn test_point_on_edge_is_split() {
        // The middle point lands exactly on the first diagonal drawn.
        let mesh = incremental_triangulate(&[
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(mesh.hull_size, 5);
        for tri in mesh.live_triangles() {
            assert!(mesh.triangle_orientation(tri) > 0.0);
        }
    }

    #[test]
    fn test_duplicates_marked_undead() {
        let mesh = incremental_triangulate(&[
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(1.0, 1.5),
            p(2.0, 0.0),
            p(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(mesh.undead_count, 2);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_too_few_distinct_is_an_error() {
        assert!(incremental_triangulate(&[p(0.0, 0.0), p(1.0, 0.0)]).is_err());
        assert!(incremental_triangulate(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_matches_divconq_triangle_count() {
        let points: Vec<Point2d> = (0..60)
            .map(|i| {
                let x = (i * 37 % 101) as f64 / 11.0;
                let y = (i * 61 % 89) as f64 / 7.0;
                p(x, y)
            })
            .collect();
        let inc = incremental_triangulate(&points).unwrap();
        let dc = divconq_triangulate(&points, &TriangulateOpts::default()).unwrap();
        // Same point set: identical triangle and hull counts even when
        // cocircular ties pick different diagonals.
        assert_eq!(inc.triangle_count(), dc.triangle_count());
        assert_eq!(inc.hull_size, dc.hull_size);
    }

    #[test]
    fn test_delaunay_property_holds() {
        let points: Vec<Point2d> = (0..36)
            .map(|i| p((i % 6) as f64 + 0.01 * i as f64, (i / 6) as f64))
            .collect();
        let mesh = incremental_triangulate(&points).unwrap();

        for tri in mesh.live_triangles() {
            let t = OTri::new(tri, 0);
            let (a, b, c) = triangle_points(&mesh, t);
            for point in &points {
                if *point == a || *point == b || *point == c {
                    continue;
                }
                assert!(in_circle(a, b, c, *point) <= 1e-9);
            }
        }
    }
}

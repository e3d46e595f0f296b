//! Geometric predicates
//!
//! Orientation and in-circle tests over f64 planar coordinates. The fast
//! paths are plain determinant evaluations guarded by Shewchuk-style static
//! error bounds; when a result falls under its bound the determinant is
//! recomputed with fused-multiply-add error compensation, which keeps the
//! sign consistent on the near-degenerate inputs the gridded terrain
//! workload produces (collinear triples, cocircular cell corners). The same
//! evaluation is used everywhere within a triangulation run.

use terramesh_core::Point2d;

// Machine epsilon for the 53-bit significand, 2^-53.
const EPSILON: f64 = 1.1102230246251565e-16;

const CCW_ERR_BOUND: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const ICC_ERR_BOUND: f64 = (10.0 + 96.0 * EPSILON) * EPSILON;

/// Product of two f64 values together with its exact rounding error.
#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = f64::mul_add(a, b, -p);
    (p, e)
}

/// Error-compensated evaluation of `ax * by - ay * bx`.
#[inline]
fn cross_compensated(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (p1, e1) = two_product(ax, by);
    let (p2, e2) = two_product(ay, bx);
    (p1 - p2) + (e1 - e2)
}

/// Signed doubled area of the triangle `a`, `b`, `c`.
///
/// Positive when the points occur in counterclockwise order, negative when
/// clockwise, and (near) zero when collinear.
pub fn counterclockwise(a: Point2d, b: Point2d, c: Point2d) -> f64 {
    let detleft = (a.x - c.x) * (b.y - c.y);
    let detright = (a.y - c.y) * (b.x - c.x);
    let det = detleft - detright;

    let detsum = if detleft > 0.0 {
        if detright <= 0.0 {
            return det;
        }
        detleft + detright
    } else if detleft < 0.0 {
        if detright >= 0.0 {
            return det;
        }
        -detleft - detright
    } else {
        return det;
    };

    let errbound = CCW_ERR_BOUND * detsum;
    if det >= errbound || -det >= errbound {
        return det;
    }

    cross_compensated(a.x - c.x, a.y - c.y, b.x - c.x, b.y - c.y)
}

/// In-circle test.
///
/// For `a`, `b`, `c` in counterclockwise order, returns a positive value iff
/// `d` lies strictly inside the circle through them, negative when strictly
/// outside, and (near) zero when the four points are cocircular.
pub fn in_circle(a: Point2d, b: Point2d, c: Point2d, d: Point2d) -> f64 {
    let adx = a.x - d.x;
    let bdx = b.x - d.x;
    let cdx = c.x - d.x;
    let ady = a.y - d.y;
    let bdy = b.y - d.y;
    let cdy = c.y - d.y;

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let alift = adx * adx + ady * ady;

    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let blift = bdx * bdx + bdy * bdy;

    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdxcdy - cdxbdy) + blift * (cdxady - adxcdy) + clift * (adxbdy - bdxady);

    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * alift
        + (cdxady.abs() + adxcdy.abs()) * blift
        + (adxbdy.abs() + bdxady.abs()) * clift;
    let errbound = ICC_ERR_BOUND * permanent;
    if det > errbound || -det > errbound {
        return det;
    }

    alift * cross_compensated(bdx, bdy, cdx, cdy)
        + blift * cross_compensated(cdx, cdy, adx, ady)
        + clift * cross_compensated(adx, ady, bdx, bdy)
}

/// Circumcenter of the triangle `a`, `b`, `c`.
///
/// Used by Voronoi/quality tooling; not on the tile sampling path. The
/// denominator reuses [`counterclockwise`] so a near-degenerate triangle
/// yields a far-away but finite center rather than an inconsistent one.
pub fn find_circumcenter(a: Point2d, b: Point2d, c: Point2d) -> Point2d {
    let xdo = b.x - a.x;
    let ydo = b.y - a.y;
    let xao = c.x - a.x;
    let yao = c.y - a.y;
    let dodist = xdo * xdo + ydo * ydo;
    let aodist = xao * xao + yao * yao;

    let denominator = 0.5 / counterclockwise(b, c, a);

    let dx = (yao * dodist - ydo * aodist) * denominator;
    let dy = (xdo * aodist - xao * dodist) * denominator;

    Point2d::new(a.x + dx, a.y + dy)
}

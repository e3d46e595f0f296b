//! Terrain height oracle contract
//!
//! The sampler never touches a host engine directly; it queries heights and
//! normals through [`HeightOracle`]. The oracle must be a deterministic pure
//! function of the planar coordinates — the y component of a query point is
//! ignored by implementations.

use crate::point::{HeightSample, Point3f, Vector3f};

/// Height and interpolated-normal lookup over planar terrain coordinates.
///
/// Returning `None` signals a missed query (the equivalent of a raycast that
/// found no surface); callers fall back to the previously known height and
/// log a warning rather than aborting.
pub trait HeightOracle {
    fn sample(&self, x: f32, z: f32) -> Option<HeightSample>;
}

/// A height oracle over a regular grid of heights with bilinear interpolation
/// and central-difference normals.
///
/// Grid point `(i, j)` sits at world `(origin.x + i * cell, origin.z + j * cell)`.
#[derive(Debug, Clone)]
pub struct HeightfieldOracle {
    heights: Vec<f32>,
    width: usize,
    depth: usize,
    cell: f32,
    origin: Point3f,
}

impl HeightfieldOracle {
    pub fn new(heights: Vec<f32>, width: usize, depth: usize, cell: f32, origin: Point3f) -> Self {
        assert_eq!(heights.len(), width * depth, "height grid size mismatch");
        Self {
            heights,
            width,
            depth,
            cell,
            origin,
        }
    }

    /// A flat heightfield at constant height
    pub fn flat(width: usize, depth: usize, cell: f32, height: f32) -> Self {
        Self::new(
            vec![height; width * depth],
            width,
            depth,
            cell,
            Point3f::origin(),
        )
    }

    /// Build a heightfield by evaluating `f(x, z)` at every grid point
    pub fn from_fn<F: Fn(f32, f32) -> f32>(
        width: usize,
        depth: usize,
        cell: f32,
        f: F,
    ) -> Self {
        let mut heights = Vec::with_capacity(width * depth);
        for j in 0..depth {
            for i in 0..width {
                heights.push(f(i as f32 * cell, j as f32 * cell));
            }
        }
        Self::new(heights, width, depth, cell, Point3f::origin())
    }

    fn height_at(&self, i: usize, j: usize) -> f32 {
        let i = i.min(self.width - 1);
        let j = j.min(self.depth - 1);
        self.heights[j * self.width + i]
    }

    fn interpolated_height(&self, gx: f32, gz: f32) -> f32 {
        let i = (gx.floor() as usize).min(self.width - 1);
        let j = (gz.floor() as usize).min(self.depth - 1);
        let fx = gx - i as f32;
        let fz = gz - j as f32;

        let h00 = self.height_at(i, j);
        let h10 = self.height_at(i + 1, j);
        let h01 = self.height_at(i, j + 1);
        let h11 = self.height_at(i + 1, j + 1);

        let h0 = h00 + (h10 - h00) * fx;
        let h1 = h01 + (h11 - h01) * fx;
        h0 + (h1 - h0) * fz
    }
}

impl HeightOracle for HeightfieldOracle {
    fn sample(&self, x: f32, z: f32) -> Option<HeightSample> {
        let gx = (x - self.origin.x) / self.cell;
        let gz = (z - self.origin.z) / self.cell;
        if gx < 0.0 || gz < 0.0 || gx > (self.width - 1) as f32 || gz > (self.depth - 1) as f32 {
            return None;
        }

        let height = self.interpolated_height(gx, gz);

        // Central differences, one cell wide, clamped at the grid rim.
        let step = 1.0f32;
        let hx0 = self.interpolated_height((gx - step).max(0.0), gz);
        let hx1 = self.interpolated_height((gx + step).min((self.width - 1) as f32), gz);
        let hz0 = self.interpolated_height(gx, (gz - step).max(0.0));
        let hz1 = self.interpolated_height(gx, (gz + step).min((self.depth - 1) as f32));

        let dx = ((gx + step).min((self.width - 1) as f32) - (gx - step).max(0.0)) * self.cell;
        let dz = ((gz + step).min((self.depth - 1) as f32) - (gz - step).max(0.0)) * self.cell;

        let normal = Vector3f::new(-(hx1 - hx0) / dx, 1.0, -(hz1 - hz0) / dz).normalize();

        Some(HeightSample {
            position: Point3f::new(x, self.origin.y + height, z),
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_field_samples_up() {
        let oracle = HeightfieldOracle::flat(8, 8, 1.0, 2.5);
        let hit = oracle.sample(3.3, 4.7).unwrap();
        assert_relative_eq!(hit.position.y, 2.5);
        assert_relative_eq!(hit.normal.y, 1.0);
    }

    #[test]
    fn test_out_of_range_misses() {
        let oracle = HeightfieldOracle::flat(4, 4, 1.0, 0.0);
        assert!(oracle.sample(-0.1, 0.0).is_none());
        assert!(oracle.sample(0.0, 3.5).is_some());
        assert!(oracle.sample(0.0, 5.0).is_none());
    }

    #[test]
    fn test_ramp_normal_tilts() {
        // Height rises 1 per unit x: the normal leans back along -x.
        let oracle = HeightfieldOracle::from_fn(16, 16, 1.0, |x, _| x);
        let hit = oracle.sample(8.0, 8.0).unwrap();
        assert!(hit.normal.x < 0.0);
        assert_relative_eq!(hit.normal.x.abs(), hit.normal.y, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_bilinear_interpolation() {
        let oracle = HeightfieldOracle::from_fn(4, 4, 1.0, |x, z| x + z);
        let hit = oracle.sample(1.5, 2.25).unwrap();
        assert_relative_eq!(hit.position.y, 3.75, epsilon = 1e-5);
    }
}

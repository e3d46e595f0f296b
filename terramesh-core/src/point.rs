//! Point types and surface samples

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 2D point with double precision coordinates, used by the planar triangulator
pub type Point2d = Point2<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 2D vector with floating point components
pub type Vector2f = Vector2<f32>;

/// One sample of the terrain surface: world position, surface normal and the
/// UV of the sample inside the whole-terrain UV space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct SurfaceSample {
    pub position: Point3f,
    pub normal: Vector3f,
    pub uv: Vector2f,
}

unsafe impl Pod for SurfaceSample {}
unsafe impl Zeroable for SurfaceSample {}

impl SurfaceSample {
    pub fn new(position: Point3f, normal: Vector3f, uv: Vector2f) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Component-wise average of two samples
    pub fn averaged_with(&self, other: &SurfaceSample) -> SurfaceSample {
        SurfaceSample {
            position: Point3f::from((self.position.coords + other.position.coords) * 0.5),
            normal: (self.normal + other.normal) * 0.5,
            uv: (self.uv + other.uv) * 0.5,
        }
    }
}

impl Default for SurfaceSample {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            normal: Vector3f::new(0.0, 1.0, 0.0),
            uv: Vector2f::zeros(),
        }
    }
}

/// Result of a height oracle query: the hit position and interpolated normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub position: Point3f,
    pub normal: Vector3f,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_sample_average() {
        let a = SurfaceSample::new(
            Point3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            Vector2f::new(0.0, 0.0),
        );
        let b = SurfaceSample::new(
            Point3f::new(2.0, 4.0, 6.0),
            Vector3f::new(0.0, 0.0, 1.0),
            Vector2f::new(1.0, 1.0),
        );

        let avg = a.averaged_with(&b);
        assert_eq!(avg.position, Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(avg.normal, Vector3f::new(0.0, 0.5, 0.5));
        assert_eq!(avg.uv, Vector2f::new(0.5, 0.5));
    }

    #[test]
    fn test_surface_sample_default_is_up() {
        let s = SurfaceSample::default();
        assert_eq!(s.normal, Vector3f::new(0.0, 1.0, 0.0));
    }
}

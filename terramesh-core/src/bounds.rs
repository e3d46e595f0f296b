//! Axis-aligned bounding volumes
//!
//! Bounds are stored in the center + size convention used by the serialized
//! quadtree format, so the binary writers can emit them without conversion.

use crate::point::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box described by its center and full extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Point3f,
    pub size: Vector3f,
}

impl Aabb {
    /// Create bounds from a center and full size
    pub fn new(center: Point3f, size: Vector3f) -> Self {
        Self { center, size }
    }

    /// Create bounds spanning the two given corners
    pub fn from_min_max(min: Point3f, max: Point3f) -> Self {
        Self {
            center: Point3f::from((min.coords + max.coords) * 0.5),
            size: max - min,
        }
    }

    /// Minimum corner
    pub fn min(&self) -> Point3f {
        self.center - self.size * 0.5
    }

    /// Maximum corner
    pub fn max(&self) -> Point3f {
        self.center + self.size * 0.5
    }

    /// Whether the point lies inside the bounds (inclusive)
    pub fn contains(&self, point: &Point3f) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x
            && point.x <= max.x
            && point.y >= min.y
            && point.y <= max.y
            && point.z >= min.z
            && point.z <= max.z
    }

    /// Whether the two bounds overlap (inclusive)
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (amin, amax) = (self.min(), self.max());
        let (bmin, bmax) = (other.min(), other.max());
        amin.x <= bmax.x
            && amax.x >= bmin.x
            && amin.y <= bmax.y
            && amax.y >= bmin.y
            && amin.z <= bmax.z
            && amax.z >= bmin.z
    }

    /// Grow the bounds to contain the given point
    pub fn encapsulate(&mut self, point: &Point3f) {
        let min = self.min().coords.inf(&point.coords);
        let max = self.max().coords.sup(&point.coords);
        self.center = Point3f::from((min + max) * 0.5);
        self.size = Vector3f::from(max - min);
    }

    /// Clamp a point into the bounds
    pub fn clamp(&self, point: &Point3f) -> Point3f {
        let min = self.min();
        let max = self.max();
        Point3f::new(
            point.x.clamp(min.x, max.x),
            point.y.clamp(min.y, max.y),
            point.z.clamp(min.z, max.z),
        )
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            center: Point3f::origin(),
            size: Vector3f::zeros(),
        }
    }
}

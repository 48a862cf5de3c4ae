// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding regions
//!
//! Bounds are accumulated point by point in f64 precision. A region that has
//! never been expanded is invalid; a valid region whose extent is zero along
//! an axis is degenerate and is treated as "no usable area" by the placement
//! code.

use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding region in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    /// Minimum corner
    pub min: Point3<f64>,
    /// Maximum corner
    pub max: Point3<f64>,
    /// Number of points folded into this region
    pub sample_count: usize,
}

impl BoundingRegion {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
            sample_count: 0,
        }
    }

    /// Build bounds from an iterator of points, skipping non-finite ones
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut bounds = Self::new();
        for p in points {
            bounds.expand(p);
        }
        bounds
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, p: Point3<f64>) {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return;
        }
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
        self.sample_count += 1;
    }

    /// Grow this region to cover another one
    #[inline]
    pub fn union(&mut self, other: &BoundingRegion) {
        if !other.is_valid() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
        self.sample_count += other.sample_count;
    }

    /// Extent along each axis (zero for invalid bounds)
    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        if !self.is_valid() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Center of the box
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        if !self.is_valid() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Horizontal (XZ) footprint area
    #[inline]
    pub fn xz_area(&self) -> f64 {
        let size = self.size();
        size.x * size.z
    }

    /// True when the region is invalid or flat along X or Z
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        !self.is_valid() || size.x <= 0.0 || size.z <= 0.0
    }
}

impl Default for BoundingRegion {
    fn default() -> Self {
        Self::new()
    }
}

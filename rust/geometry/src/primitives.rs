// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry primitives
//!
//! Vector math comes from nalgebra; this module adds the triangle value type
//! and the handful of XZ-plane helpers the cutter needs. The cut plane is XZ,
//! Y carries the surface height and is only ever interpolated.

use nalgebra::{Point3, Vector3};

/// Triangle definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Vertices in winding order
    #[inline]
    pub fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Unnormalized face normal (edge1 x edge2), length is twice the area
    #[inline]
    pub fn face_normal(&self) -> Vector3<f64> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2)
    }

    /// Unit normal, `None` for degenerate triangles
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.face_normal().try_normalize(1e-12)
    }

    /// Calculate triangle area
    pub fn area(&self) -> f64 {
        self.face_normal().norm() * 0.5
    }

    /// Signed area of the XZ projection (positive when x -> z turns left)
    pub fn signed_area_xz(&self) -> f64 {
        cross_xz(&self.v0, &self.v1, &self.v2) * 0.5
    }

    /// True when every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.vertices().iter().all(is_finite_point)
    }
}

/// Z component of (b - a) x (c - b) taken in the XZ plane
#[inline]
pub fn cross_xz(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b.x - a.x) * (c.z - b.z) - (b.z - a.z) * (c.x - b.x)
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    nalgebra::distance(a, b)
}

#[inline]
pub fn is_finite_point(p: &Point3<f64>) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// Signed area of a closed XZ polygon (shoelace)
pub fn polygon_area_xz(points: &[Point3<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        twice_area += p.x * q.z - q.x * p.z;
    }
    twice_area * 0.5
}

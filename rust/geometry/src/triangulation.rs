// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation
//!
//! Fan triangulation only. It is correct for convex polygons, which is all
//! the rectangle clipper produces. A concave or non-rectangular aperture
//! would need ear clipping here instead.

use crate::primitives::{cross_xz, Triangle};
use nalgebra::Point3;

/// Check if a polygon is convex in the XZ plane (all turns have the same sign)
pub fn is_convex_xz(points: &[Point3<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let cross = cross_xz(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);

        if cross.abs() > 1e-10 {
            let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false; // Sign changed - not convex
            }
        }
    }

    true
}

/// Fan-triangulate a convex polygon from its first vertex.
///
/// Emits `(v0, v_i, v_i+1)` for `i in 1..len-1`, so the winding of the
/// polygon carries over to every triangle. Fewer than three vertices
/// yields nothing.
pub fn triangulate(polygon: &[Point3<f64>]) -> Vec<Triangle> {
    triangulate_from(polygon, 0)
}

/// Fan-triangulate a convex polygon around vertex `apex`.
///
/// Same as [`triangulate`] after rotating the loop to start at `apex`.
pub fn triangulate_from(polygon: &[Point3<f64>], apex: usize) -> Vec<Triangle> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }

    let at = |i: usize| polygon[(apex + i) % n];
    (1..n - 1)
        .map(|i| Triangle::new(at(0), at(i), at(i + 1)))
        .collect()
}

/// First vertex whose fan has no zero-area triangle.
///
/// A convex polygon with collinear vertices along one side fans cleanly
/// from any vertex off that side. Falls back to 0 when every choice
/// degenerates.
pub fn fan_apex(polygon: &[Point3<f64>]) -> usize {
    let n = polygon.len();
    if n <= 3 {
        return 0;
    }

    (0..n)
        .find(|&apex| {
            let at = |i: usize| &polygon[(apex + i) % n];
            (1..n - 1).all(|i| cross_xz(at(0), at(i), at(i + 1)) != 0.0)
        })
        .unwrap_or(0)
}

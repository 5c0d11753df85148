// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle vs. aperture rectangle classification

use crate::error::{Error, Result};
use crate::primitives::Triangle;
use nalgebra::Point3;

/// Axis-aligned aperture rectangle in the XZ plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApertureRect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl ApertureRect {
    /// Create a rectangle, rejecting non-finite or denormalized bounds
    pub fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> Result<Self> {
        let rect = Self {
            min_x,
            max_x,
            min_z,
            max_z,
        };
        rect.validate()?;
        Ok(rect)
    }

    /// Rectangle centred on `(cx, cz)` with the given half sizes
    pub fn from_center(cx: f64, cz: f64, half_x: f64, half_z: f64) -> Result<Self> {
        Self::new(cx - half_x, cx + half_x, cz - half_z, cz + half_z)
    }

    /// Check the bounds are finite and strictly ordered on both axes
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.min_x, self.max_x, self.min_z, self.max_z];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(Error::geometry(format!(
                "aperture rectangle has non-finite bounds {:?}",
                bounds
            )));
        }
        if self.min_x >= self.max_x || self.min_z >= self.max_z {
            return Err(Error::geometry(format!(
                "aperture rectangle is denormalized: x=[{}, {}] z=[{}, {}]",
                self.min_x, self.max_x, self.min_z, self.max_z
            )));
        }
        Ok(())
    }

    /// Closed-interval containment (boundary counts as inside)
    #[inline]
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    /// Open-interval containment (boundary counts as outside)
    #[inline]
    pub fn strictly_contains(&self, p: &Point3<f64>) -> bool {
        p.x > self.min_x && p.x < self.max_x && p.z > self.min_z && p.z < self.max_z
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Area of the overlap between this rectangle and an XZ box
    pub fn overlap_area(&self, other: &ApertureRect) -> f64 {
        let dx = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let dz = self.max_z.min(other.max_z) - self.min_z.max(other.min_z);
        if dx <= 0.0 || dz <= 0.0 {
            0.0
        } else {
            dx * dz
        }
    }
}

/// Where a triangle sits relative to the aperture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Every vertex inside or on the boundary: the triangle is part of the hole
    Inside,
    /// Every vertex strictly beyond the same rectangle edge
    Outside,
    /// Anything else, must go through the clipper
    Straddling,
}

/// Classify a triangle against the aperture rectangle.
///
/// The outside test only looks for a single separating axis edge, so a
/// triangle that wraps around a corner without touching the rectangle is
/// reported as `Straddling` and left to the clipper.
pub fn classify(triangle: &Triangle, rect: &ApertureRect) -> Containment {
    let [a, b, c] = triangle.vertices();

    if rect.contains(&a) && rect.contains(&b) && rect.contains(&c) {
        return Containment::Inside;
    }

    let all_left = a.x < rect.min_x && b.x < rect.min_x && c.x < rect.min_x;
    let all_right = a.x > rect.max_x && b.x > rect.max_x && c.x > rect.max_x;
    let all_below = a.z < rect.min_z && b.z < rect.min_z && c.z < rect.min_z;
    let all_above = a.z > rect.max_z && b.z > rect.max_z && c.z > rect.max_z;

    if all_left || all_right || all_below || all_above {
        Containment::Outside
    } else {
        Containment::Straddling
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cut scene state: the static base quad and the movable aperture.

use crate::builder::rebuild_mesh;
use crate::classify::ApertureRect;
use crate::config::CutConfig;
use crate::error::Result;
use crate::mesh::MeshBuffers;
use crate::primitives::Triangle;
use nalgebra::{Point3, Vector2};
use tracing::warn;

/// Static planar quad the aperture is cut out of
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseQuad {
    pub corners: [Point3<f64>; 4],
}

impl BaseQuad {
    pub fn new(corners: [Point3<f64>; 4]) -> Self {
        Self { corners }
    }

    /// Unit square at y = 0
    pub fn unit() -> Self {
        Self::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
    }

    /// The two triangles (0, 1, 2) and (0, 2, 3)
    pub fn triangles(&self) -> [Triangle; 2] {
        let [c0, c1, c2, c3] = self.corners;
        [Triangle::new(c0, c1, c2), Triangle::new(c0, c2, c3)]
    }
}

impl Default for BaseQuad {
    fn default() -> Self {
        Self::unit()
    }
}

/// Keyboard movement direction for the aperture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards -Z
    Forward,
    /// Towards +Z
    Backward,
    /// Towards -X
    Left,
    /// Towards +X
    Right,
}

impl Direction {
    /// Map a key name to a direction. Accepts both ZQSD and WASD layouts.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "z" | "w" => Some(Direction::Forward),
            "s" => Some(Direction::Backward),
            "q" | "a" => Some(Direction::Left),
            "d" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit offset in the XZ plane as `(dx, dz)`
    pub fn offset(self) -> (f64, f64) {
        match self {
            Direction::Forward => (0.0, -1.0),
            Direction::Backward => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// The movable rectangular aperture.
///
/// Only the centre moves; the rectangle and the quad are derived from it on
/// demand. `center.y` is the height the aperture quad is drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aperture {
    pub center: Point3<f64>,
    /// Half sizes along X and Z
    pub half_extents: Vector2<f64>,
}

impl Aperture {
    pub fn new(center: Point3<f64>, half_extents: Vector2<f64>) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Clip rectangle for the current centre
    pub fn rect(&self) -> Result<ApertureRect> {
        ApertureRect::from_center(
            self.center.x,
            self.center.z,
            self.half_extents.x,
            self.half_extents.y,
        )
    }

    /// Corners at the centre height, counter-clockwise from (min_x, min_z)
    pub fn quad(&self) -> [Point3<f64>; 4] {
        let (cx, y, cz) = (self.center.x, self.center.y, self.center.z);
        let (hx, hz) = (self.half_extents.x, self.half_extents.y);
        [
            Point3::new(cx - hx, y, cz - hz),
            Point3::new(cx + hx, y, cz - hz),
            Point3::new(cx + hx, y, cz + hz),
            Point3::new(cx - hx, y, cz + hz),
        ]
    }

    pub fn translate(&mut self, dx: f64, dz: f64) {
        self.center.x += dx;
        self.center.z += dz;
    }

    /// Move one `step` in `direction`
    pub fn nudge(&mut self, direction: Direction, step: f64) {
        let (dx, dz) = direction.offset();
        self.translate(dx * step, dz * step);
    }
}

impl Default for Aperture {
    fn default() -> Self {
        Self::new(Point3::new(1.0, 0.1, 1.0), Vector2::new(0.5, 0.5))
    }
}

/// Everything a rebuild reads
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CutScene {
    pub base: BaseQuad,
    pub aperture: Aperture,
}

impl CutScene {
    pub fn new(base: BaseQuad, aperture: Aperture) -> Self {
        Self { base, aperture }
    }

    /// Rebuild the cut mesh for the current aperture position
    pub fn rebuild(&self, config: &CutConfig) -> Result<MeshBuffers> {
        let rect = self.aperture.rect().map_err(|e| {
            warn!(error = %e, center = ?self.aperture.center, "invalid aperture");
            e
        })?;
        rebuild_mesh(&self.base.triangles(), &self.aperture.quad(), &rect, config)
    }
}

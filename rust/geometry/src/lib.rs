// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planecut Geometry
//!
//! Cuts a moving axis-aligned rectangular aperture out of a planar quad and
//! rebuilds a single welded, indexed triangle mesh on every move.
//!
//! The pipeline per rebuild is: classify each base triangle against the
//! aperture rectangle, clip straddling triangles with Sutherland-Hodgman
//! passes, fan-triangulate the convex pieces, then weld everything (cut base
//! plus the aperture's own quad) into one vertex/index buffer.

pub mod builder;
pub mod classify;
pub mod clip;
pub mod config;
pub mod error;
pub mod mesh;
pub mod primitives;
pub mod scene;
pub mod triangulation;
pub mod weld;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use builder::{rebuild_mesh, MeshBuilder, RebuildStats};
pub use classify::{classify, ApertureRect, Containment};
pub use clip::{clip_against_edge, clip_triangle_outside_rectangle, crosses_side_lines, Polygon};
pub use config::CutConfig;
pub use error::{Error, Result};
pub use mesh::{calculate_normals, IndexBuffer, Mesh, MeshBounds, MeshBuffers};
pub use primitives::Triangle;
pub use scene::{Aperture, BaseQuad, CutScene, Direction};
pub use triangulation::{fan_apex, is_convex_xz, triangulate, triangulate_from};
pub use weld::{VertexKey, VertexTable};

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for the aperture cutter
//!
//! The renderer owns the frame loop: it forwards key events, calls `tick()`
//! once per frame and re-uploads the buffers whenever `tick()` returns true.

use crate::session::CutSession;
use crate::utils::{console_debug, console_warn, set_panic_hook, to_js_error};
use planecut_geometry::{CutScene, IndexBuffer, MeshBounds, Point3};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Bounds object handed to JavaScript
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundsJs {
    min: [f32; 3],
    max: [f32; 3],
    sphere_center: [f32; 3],
    sphere_radius: f32,
}

impl From<&MeshBounds> for BoundsJs {
    fn from(bounds: &MeshBounds) -> Self {
        Self {
            min: [bounds.min.x, bounds.min.y, bounds.min.z],
            max: [bounds.max.x, bounds.max.y, bounds.max.z],
            sphere_center: [
                bounds.sphere_center.x,
                bounds.sphere_center.y,
                bounds.sphere_center.z,
            ],
            sphere_radius: bounds.sphere_radius,
        }
    }
}

/// Main Planecut API
#[wasm_bindgen]
pub struct PlaneCutApi {
    session: CutSession,
}

#[wasm_bindgen]
impl PlaneCutApi {
    /// Create the default scene (unit base quad, aperture at (1, 0.1, 1))
    /// and build its first mesh
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<PlaneCutApi, JsValue> {
        set_panic_hook();
        let session = CutSession::with_env_config(CutScene::default()).map_err(to_js_error)?;
        Ok(Self { session })
    }

    /// Move the aperture centre and rebuild. Returns false and keeps the
    /// previous mesh when the rebuild fails.
    #[wasm_bindgen(js_name = setApertureCenter)]
    pub fn set_aperture_center(&mut self, x: f64, y: f64, z: f64) -> bool {
        match self.session.set_aperture_center(Point3::new(x, y, z)) {
            Ok(()) => true,
            Err(e) => {
                console_warn(&format!("[planecut] setApertureCenter failed: {}", e));
                false
            }
        }
    }

    /// Returns true if the key is a movement key
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str) -> bool {
        self.session.key_down(key)
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&mut self, key: &str) -> bool {
        self.session.key_up(key)
    }

    /// Apply held movement keys once. Returns true when a new mesh is ready.
    pub fn tick(&mut self) -> bool {
        match self.session.tick() {
            Ok(moved) => moved,
            Err(e) => {
                console_warn(&format!("[planecut] rebuild failed, keeping last mesh: {}", e));
                false
            }
        }
    }

    /// Force a rebuild of the current scene
    pub fn rebuild(&mut self) -> Result<(), JsValue> {
        self.session.rebuild().map_err(to_js_error)?;
        let mesh = self.session.mesh();
        console_debug(&format!(
            "[planecut] rebuilt: {} vertices, {} triangles, {}-bit indices",
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.indices.width_bits()
        ));
        Ok(())
    }

    /// Get positions as Float32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.session.mesh().positions[..])
    }

    /// Get normals as Float32Array (copy to JS)
    #[wasm_bindgen(getter)]
    pub fn normals(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.session.mesh().normals[..])
    }

    /// Get indices as Uint16Array or Uint32Array, see `indexWidth`
    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> JsValue {
        match &self.session.mesh().indices {
            IndexBuffer::U16(v) => js_sys::Uint16Array::from(&v[..]).into(),
            IndexBuffer::U32(v) => js_sys::Uint32Array::from(&v[..]).into(),
        }
    }

    /// Index element width in bits (16 or 32)
    #[wasm_bindgen(getter, js_name = indexWidth)]
    pub fn index_width(&self) -> u8 {
        self.session.mesh().indices.width_bits()
    }

    #[wasm_bindgen(getter, js_name = vertexCount)]
    pub fn vertex_count(&self) -> usize {
        self.session.mesh().vertex_count()
    }

    #[wasm_bindgen(getter, js_name = triangleCount)]
    pub fn triangle_count(&self) -> usize {
        self.session.mesh().triangle_count()
    }

    /// Get `{ min, max, sphereCenter, sphereRadius }` of the current mesh
    #[wasm_bindgen(getter)]
    pub fn bounds(&self) -> JsValue {
        let bounds = BoundsJs::from(&self.session.mesh().bounds);
        match serde_wasm_bindgen::to_value(&bounds) {
            Ok(value) => value,
            Err(e) => {
                console_warn(&format!("[planecut] bounds conversion failed: {}", e));
                JsValue::NULL
            }
        }
    }

    /// Current aperture centre as [x, y, z]
    #[wasm_bindgen(getter, js_name = apertureCenter)]
    pub fn aperture_center(&self) -> Vec<f64> {
        let c = self.session.scene().aperture.center;
        vec![c.x, c.y, c.z]
    }

    /// Distance the aperture moves per tick for each held key
    #[wasm_bindgen(getter, js_name = moveStep)]
    pub fn move_step(&self) -> f64 {
        self.session.config().move_step
    }

    /// Get version string
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

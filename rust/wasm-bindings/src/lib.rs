// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planecut WebAssembly Bindings
//!
//! JavaScript API for the aperture cutter built with wasm-bindgen.

use wasm_bindgen::prelude::*;

mod api;
mod session;
mod utils;

pub use api::PlaneCutApi;
pub use session::CutSession;
pub use utils::set_panic_hook as init_panic_hook;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
}

/// Get the version of Planecut
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

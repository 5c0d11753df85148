// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cutter configuration, with optional overrides from environment variables.

use crate::error::{Error, Result};

/// Largest weld precision. At 12 decimals coordinates must stay below about
/// 9.2e6 in magnitude for `coordinate * 10^decimals` to fit an `i64`; the
/// builder rejects input outside that range.
pub const MAX_WELD_DECIMALS: u32 = 12;

/// Configuration for the cut pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutConfig {
    /// Decimal places used to quantize vertex keys when welding.
    pub weld_decimals: u32,
    /// Below this denominator an edge is treated as parallel to the clip line.
    pub parallel_epsilon: f64,
    /// Distance the aperture moves per movement input.
    pub move_step: f64,
}

impl CutConfig {
    pub const DEFAULT_WELD_DECIMALS: u32 = 6;
    pub const DEFAULT_PARALLEL_EPSILON: f64 = 1e-10;
    pub const DEFAULT_MOVE_STEP: f64 = 0.01;

    /// Load configuration from environment variables.
    ///
    /// Reads `PLANECUT_WELD_DECIMALS`, `PLANECUT_PARALLEL_EPSILON` and
    /// `PLANECUT_MOVE_STEP`; missing or unparsable values fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            weld_decimals: std::env::var("PLANECUT_WELD_DECIMALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Self::DEFAULT_WELD_DECIMALS),
            parallel_epsilon: std::env::var("PLANECUT_PARALLEL_EPSILON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Self::DEFAULT_PARALLEL_EPSILON),
            move_step: std::env::var("PLANECUT_MOVE_STEP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Self::DEFAULT_MOVE_STEP),
        }
    }

    /// Builder-style override of the weld precision
    pub fn with_weld_decimals(mut self, decimals: u32) -> Self {
        self.weld_decimals = decimals;
        self
    }

    /// Builder-style override of the movement step
    pub fn with_move_step(mut self, step: f64) -> Self {
        self.move_step = step;
        self
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.weld_decimals > MAX_WELD_DECIMALS {
            return Err(Error::config(format!(
                "weld_decimals must be at most {}, got {}",
                MAX_WELD_DECIMALS, self.weld_decimals
            )));
        }
        if !(self.parallel_epsilon.is_finite() && self.parallel_epsilon > 0.0) {
            return Err(Error::config(format!(
                "parallel_epsilon must be finite and positive, got {}",
                self.parallel_epsilon
            )));
        }
        if !(self.move_step.is_finite() && self.move_step > 0.0) {
            return Err(Error::config(format!(
                "move_step must be finite and positive, got {}",
                self.move_step
            )));
        }
        Ok(())
    }
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            weld_decimals: Self::DEFAULT_WELD_DECIMALS,
            parallel_epsilon: Self::DEFAULT_PARALLEL_EPSILON,
            move_step: Self::DEFAULT_MOVE_STEP,
        }
    }
}

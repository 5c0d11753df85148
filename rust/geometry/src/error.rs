// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while cutting and rebuilding the mesh
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid geometry input: {0}")]
    InvalidGeometryInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Too many vertices for a 32-bit index buffer: {0}")]
    IndexOverflow(usize),
}

impl Error {
    /// Shorthand for [`Error::InvalidGeometryInput`]
    pub fn geometry(msg: impl Into<String>) -> Self {
        Error::InvalidGeometryInput(msg.into())
    }

    /// Shorthand for [`Error::InvalidConfig`]
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for conversion runs.
//!
//! Only request-level problems surface here. Per-entity geometric failures
//! are absorbed by the pipeline and reported through [`Summary`](crate::Summary)
//! and tracing events.

use brep_index_topology::ShapeKind;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Enumeration was requested for a kind that names no concrete entity tier.
    #[error("unsupported entity kind: {0}")]
    UnsupportedEntityKind(ShapeKind),

    /// The input shape (or enumeration scope) does not reference a live entity.
    #[error("invalid input shape: {0}")]
    InvalidShape(String),

    #[error("invalid conversion config: {0}")]
    InvalidConfig(String),

    /// The caller cancelled the run. No partial dataset is produced.
    #[error("conversion cancelled")]
    Cancelled,

    /// An assembled dataset broke an index or shape invariant.
    #[error("dataset invariant violated: {0}")]
    InvalidDataset(String),

    #[error("topology error: {0}")]
    Topology(#[from] brep_index_topology::Error),
}

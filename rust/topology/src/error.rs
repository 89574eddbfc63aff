// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology operations.

use crate::keys::TopologyKey;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or loading a topology arena.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced topology entity was not found in the arena.
    #[error("topology entity not found: {0:?}")]
    NotFound(TopologyKey),

    /// Edges in a wire are not connected end-to-end.
    #[error("wire edges are not connected: edge {0} endpoint does not match edge {1} startpoint")]
    DisconnectedWire(usize, usize),

    /// A wire must have at least one edge.
    #[error("wire must have at least one edge")]
    EmptyWire,

    /// Orientation list length does not match the edge list.
    #[error("wire has {edges} edges but {orientations} orientations")]
    OrientationMismatch { edges: usize, orientations: usize },

    /// A face boundary must be a closed wire.
    #[error("face boundary wire is not closed")]
    OpenWire,

    /// A shell must have at least one face.
    #[error("shell must have at least one face")]
    EmptyShell,

    /// A compsolid must have at least one solid.
    #[error("compsolid must have at least one solid")]
    EmptyCompSolid,

    /// A circle or arc needs a non-zero radius and a non-degenerate axis.
    #[error("degenerate curve: {0}")]
    DegenerateCurve(String),

    /// A shape kind name that does not denote a concrete entity kind.
    #[error("unsupported entity kind: {0}")]
    UnsupportedKind(String),

    /// A snapshot refers to an entity index that does not exist.
    #[error("snapshot {tier} index {index} out of range")]
    DanglingIndex { tier: &'static str, index: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-entity geometric evaluation failures.
///
/// These are never fatal to a conversion: the engine drops, retries or
/// falls back depending on the variant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The entity carries no evaluable curve or surface.
    #[error("entity has no evaluable geometry")]
    NoGeometry,

    /// The kernel cannot evaluate this geometry parametrically.
    #[error("parametric evaluation unsupported")]
    Unsupported,

    /// The parameter lies outside the evaluable domain.
    #[error("parameter ({0}, {1}) outside domain")]
    OutOfDomain(f64, f64),

    /// Any other evaluation failure reported by the kernel.
    #[error("evaluation failed: {0}")]
    Failed(String),
}

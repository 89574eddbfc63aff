// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BRep-Index Engine
//!
//! Converts a boundary-representation model, reached through any
//! [`BrepKernel`](brep_index_topology::BrepKernel), into a deduplicated,
//! indexed and adjacency-annotated [`BrepDataset`].
//!
//! ```text
//! shape ─► ShapeGraphWalker ─► EntityCanonicalizer ─► AdjacencyBuilder ─► BrepDataset
//!                               │        │                 │
//!                         CurveSampler  SurfaceGridSampler WireOrderer
//! ```
//!
//! Every distinct entity gets one dense index per tier, in first-encounter
//! order. Edge samples and face grids have a fixed shape for the whole run.
//! Entities without evaluable geometry are dropped and counted in the
//! [`Summary`]; they never abort a conversion.

pub mod adjacency;
pub mod cancel;
pub mod canonical;
pub mod config;
pub mod dataset;
pub mod error;
pub mod palette;
pub mod pipeline;
pub mod sampling;
pub mod walker;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use adjacency::{Adjacency, AdjacencyBuilder, Membership};
pub use cancel::CancelToken;
pub use canonical::{EntityCanonicalizer, Interner};
pub use config::{ConversionConfig, GridPolicy, DEFAULT_GRID_SIZE, DEFAULT_MESH_DEFLECTION};
pub use dataset::{BrepDataset, EdgeRecord, FaceRecord, MembershipRecord, Normalization, Summary, WireRecord};
pub use error::{Error, Result};
pub use palette::{face_colors, ColorMode};
pub use pipeline::{convert, convert_with_cancel};
pub use sampling::{
    resample, CurveSampler, GridSource, GridTrace, LayerOutcome, MeshHint, SurfaceGridSampler,
};
pub use walker::ShapeGraphWalker;
pub use wire::{WireOrderer, WireTraversal};

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BRep-Index Topology
//!
//! Boundary-representation kernel interface and a reference in-memory kernel.
//!
//! [`BrepKernel`] is the narrow surface through which the indexing engine
//! talks to a geometric kernel: sub-shape exploration, entity identity, edge
//! endpoints, curve and surface evaluation and face triangulation.
//!
//! [`TopologyArena`] implements it over slot-map tiers from vertex up to
//! compound, with analytic lines, circles, planes and cylinders, and loads
//! from and saves to JSON snapshots.

pub mod arena;
pub mod construction;
pub mod error;
pub mod explore;
pub mod geometry;
pub mod kernel;
pub mod keys;
pub mod serialization;
pub mod traversal;

pub use arena::TopologyArena;
pub use construction::{make_box, make_cylinder, make_quad};
pub use error::{Error, EvalError, Result};
pub use geometry::{CurveGeometry, SurfaceGeometry};
pub use kernel::{
    BrepKernel, IdentityKey, Orientation, ParamRange, ShapeKind, SurfaceDomain, SurfaceType,
    TriangleMesh,
};
pub use keys::{
    CompSolidKey, CompoundKey, EdgeKey, FaceKey, ShapeRef, ShellKey, SolidKey, TopologyKey,
    VertexKey, WireKey,
};
pub use serialization::ArenaSnapshot;

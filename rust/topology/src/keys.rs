// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology key types for arena-based storage.
//!
//! Each topology entity gets a unique, type-safe key for O(1) lookup in the
//! arena. Keys are created by `slotmap::SlotMap` and remain valid even after
//! other entities are removed (generational indices).

use slotmap::{new_key_type, Key};

use crate::kernel::{IdentityKey, Orientation, ShapeKind};

new_key_type! {
    /// Key for a vertex (point in 3D space).
    pub struct VertexKey;

    /// Key for an edge (bounded curve segment between up to two vertices).
    pub struct EdgeKey;

    /// Key for a wire (chain of edges bounding a face).
    pub struct WireKey;

    /// Key for a face (bounded surface patch).
    pub struct FaceKey;

    /// Key for a shell (connected set of faces).
    pub struct ShellKey;

    /// Key for a solid (volume bounded by shells).
    pub struct SolidKey;

    /// Key for a compsolid (solids sharing faces).
    pub struct CompSolidKey;

    /// Key for a compound (arbitrary grouping).
    pub struct CompoundKey;
}

/// A key that can reference any topology entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKey {
    Vertex(VertexKey),
    Edge(EdgeKey),
    Wire(WireKey),
    Face(FaceKey),
    Shell(ShellKey),
    Solid(SolidKey),
    CompSolid(CompSolidKey),
    Compound(CompoundKey),
}

impl TopologyKey {
    /// Returns the shape kind of this key.
    pub fn kind(&self) -> ShapeKind {
        match self {
            TopologyKey::Vertex(_) => ShapeKind::Vertex,
            TopologyKey::Edge(_) => ShapeKind::Edge,
            TopologyKey::Wire(_) => ShapeKind::Wire,
            TopologyKey::Face(_) => ShapeKind::Face,
            TopologyKey::Shell(_) => ShapeKind::Shell,
            TopologyKey::Solid(_) => ShapeKind::Solid,
            TopologyKey::CompSolid(_) => ShapeKind::CompSolid,
            TopologyKey::Compound(_) => ShapeKind::Compound,
        }
    }

    /// Raw generational slot value, unique within one tier of one arena.
    pub fn raw(&self) -> u64 {
        match self {
            TopologyKey::Vertex(k) => k.data().as_ffi(),
            TopologyKey::Edge(k) => k.data().as_ffi(),
            TopologyKey::Wire(k) => k.data().as_ffi(),
            TopologyKey::Face(k) => k.data().as_ffi(),
            TopologyKey::Shell(k) => k.data().as_ffi(),
            TopologyKey::Solid(k) => k.data().as_ffi(),
            TopologyKey::CompSolid(k) => k.data().as_ffi(),
            TopologyKey::Compound(k) => k.data().as_ffi(),
        }
    }

    /// The orientation-independent identity of the entity behind this key.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(self.kind(), self.raw())
    }
}

/// An oriented handle to an arena entity.
///
/// Two handles with the same `key` denote the same entity; `orientation`
/// records the direction in which the entity is used by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeRef {
    pub key: TopologyKey,
    pub orientation: Orientation,
}

impl ShapeRef {
    /// A forward-oriented handle.
    pub fn new(key: impl Into<TopologyKey>) -> Self {
        Self {
            key: key.into(),
            orientation: Orientation::Forward,
        }
    }

    /// A handle with an explicit orientation.
    pub fn oriented(key: impl Into<TopologyKey>, orientation: Orientation) -> Self {
        Self {
            key: key.into(),
            orientation,
        }
    }

    /// The same entity with the opposite orientation.
    pub fn reversed(&self) -> Self {
        Self {
            key: self.key,
            orientation: self.orientation.reversed(),
        }
    }

    /// Re-expresses a child use relative to this handle's orientation.
    pub(crate) fn compose(&self, child: TopologyKey, local: Orientation) -> Self {
        Self {
            key: child,
            orientation: self.orientation.compose(local),
        }
    }
}

// Conversion impls from specific keys to TopologyKey
impl From<VertexKey> for TopologyKey {
    fn from(k: VertexKey) -> Self {
        TopologyKey::Vertex(k)
    }
}

impl From<EdgeKey> for TopologyKey {
    fn from(k: EdgeKey) -> Self {
        TopologyKey::Edge(k)
    }
}

impl From<WireKey> for TopologyKey {
    fn from(k: WireKey) -> Self {
        TopologyKey::Wire(k)
    }
}

impl From<FaceKey> for TopologyKey {
    fn from(k: FaceKey) -> Self {
        TopologyKey::Face(k)
    }
}

impl From<ShellKey> for TopologyKey {
    fn from(k: ShellKey) -> Self {
        TopologyKey::Shell(k)
    }
}

impl From<SolidKey> for TopologyKey {
    fn from(k: SolidKey) -> Self {
        TopologyKey::Solid(k)
    }
}

impl From<CompSolidKey> for TopologyKey {
    fn from(k: CompSolidKey) -> Self {
        TopologyKey::CompSolid(k)
    }
}

impl From<CompoundKey> for TopologyKey {
    fn from(k: CompoundKey) -> Self {
        TopologyKey::Compound(k)
    }
}

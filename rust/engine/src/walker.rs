// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deduplicated sub-shape enumeration.

use brep_index_topology::{BrepKernel, IdentityKey, Orientation, ShapeKind};
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};

/// Enumerates entities of one kind under a shape, each exactly once, in
/// first-encounter order.
///
/// Two uses of an entity with opposite orientations count as distinct unless
/// `ignore_orientation` is set, in which case the first-seen use wins.
pub struct ShapeGraphWalker<'k, K: BrepKernel> {
    kernel: &'k K,
    ignore_orientation: bool,
}

impl<'k, K: BrepKernel> ShapeGraphWalker<'k, K> {
    pub fn new(kernel: &'k K, ignore_orientation: bool) -> Self {
        Self {
            kernel,
            ignore_orientation,
        }
    }

    pub fn ignores_orientation(&self) -> bool {
        self.ignore_orientation
    }

    /// Entities of `kind` under `shape`.
    ///
    /// With a `scope`, only entities reachable from that sub-entity are
    /// reported. Sub-trees rooted at an `exclude` kind are not entered.
    pub fn enumerate(
        &self,
        shape: &K::Shape,
        kind: ShapeKind,
        scope: Option<&K::Shape>,
        exclude: Option<ShapeKind>,
    ) -> Result<Vec<K::Shape>> {
        if !kind.is_concrete() {
            return Err(Error::UnsupportedEntityKind(kind));
        }

        let root = scope.unwrap_or(shape);
        if self.kernel.is_null(root) {
            return Err(Error::InvalidShape(format!(
                "cannot enumerate {kind}s under a null shape"
            )));
        }

        let raw = self.kernel.explore(root, kind, exclude);
        let mut seen: FxHashSet<(IdentityKey, Option<Orientation>)> =
            FxHashSet::with_capacity_and_hasher(raw.len(), Default::default());

        Ok(raw
            .into_iter()
            .filter(|s| seen.insert(self.dedup_key(s)))
            .collect())
    }

    fn dedup_key(&self, shape: &K::Shape) -> (IdentityKey, Option<Orientation>) {
        let orientation = if self.ignore_orientation {
            None
        } else {
            Some(self.kernel.orientation(shape))
        };
        (self.kernel.identity(shape), orientation)
    }

    pub fn vertices(&self, shape: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Vertex, None, None)
    }

    pub fn edges(&self, shape: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Edge, None, None)
    }

    pub fn wires(&self, shape: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Wire, None, None)
    }

    pub fn faces(&self, shape: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Face, None, None)
    }

    pub fn shells(&self, shape: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Shell, None, None)
    }

    pub fn solids(&self, shape: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Solid, None, None)
    }

    /// Edges bounding one face.
    pub fn edges_of(&self, shape: &K::Shape, face: &K::Shape) -> Result<Vec<K::Shape>> {
        self.enumerate(shape, ShapeKind::Edge, Some(face), None)
    }
}

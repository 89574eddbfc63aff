// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Child lists, closedness checks and top-level entity discovery.

use rustc_hash::FxHashMap;

use crate::arena::TopologyArena;
use crate::keys::*;

impl TopologyArena {
    /// Outer loop first, then holes.
    pub fn face_wires(&self, key: FaceKey) -> Option<Vec<WireKey>> {
        let face = self.faces.get(key)?;
        Some(std::iter::once(face.outer_wire).chain(face.inner_wires.iter().copied()).collect())
    }

    pub fn shell_faces(&self, key: ShellKey) -> Option<&[FaceKey]> {
        self.shells.get(key).map(|s| s.faces.as_slice())
    }

    /// Outer shell first, then voids.
    pub fn solid_shells(&self, key: SolidKey) -> Option<Vec<ShellKey>> {
        let solid = self.solids.get(key)?;
        Some(std::iter::once(solid.outer_shell).chain(solid.inner_shells.iter().copied()).collect())
    }

    /// A wire is closed when each vertex is entered as often as it is left.
    /// The stored edge order does not matter.
    pub fn wire_is_closed(&self, key: WireKey) -> bool {
        let Some(wire) = self.wires.get(key) else {
            return false;
        };
        let mut balance: FxHashMap<VertexKey, i32> = FxHashMap::default();
        for (&edge, &forward) in wire.edges.iter().zip(&wire.orientations) {
            let Some(e) = self.edges.get(edge) else {
                return false;
            };
            let (from, to) = if forward { (e.start, e.end) } else { (e.end, e.start) };
            *balance.entry(from).or_default() += 1;
            *balance.entry(to).or_default() -= 1;
        }
        !wire.edges.is_empty() && balance.values().all(|&b| b == 0)
    }

    /// A shell is closed when every boundary edge is walked once in each
    /// direction (or any equal number of times).
    pub fn shell_is_closed(&self, key: ShellKey) -> bool {
        let Some(faces) = self.shell_faces(key) else {
            return false;
        };
        let mut usage: FxHashMap<EdgeKey, i32> = FxHashMap::default();
        for wire in faces.iter().filter_map(|&f| self.face_wires(f)).flatten() {
            let Some(w) = self.wires.get(wire) else {
                return false;
            };
            for (&edge, &forward) in w.edges.iter().zip(&w.orientations) {
                *usage.entry(edge).or_default() += if forward { 1 } else { -1 };
            }
        }
        !usage.is_empty() && usage.values().all(|&u| u == 0)
    }

    /// Entities nothing else references, compounds first and vertices last.
    ///
    /// A compound over these reaches the whole model.
    pub fn root_entities(&self) -> Vec<ShapeRef> {
        let tiers: [Vec<TopologyKey>; 8] = [
            self.compounds.keys().map(Into::into).collect(),
            self.compsolids.keys().map(Into::into).collect(),
            self.solids.keys().map(Into::into).collect(),
            self.shells.keys().map(Into::into).collect(),
            self.faces.keys().map(Into::into).collect(),
            self.wires.keys().map(Into::into).collect(),
            self.edges.keys().map(Into::into).collect(),
            self.vertices.keys().map(Into::into).collect(),
        ];
        tiers
            .into_iter()
            .flatten()
            .filter(|&key| !self.has_parent(key))
            .map(ShapeRef::new)
            .collect()
    }
}

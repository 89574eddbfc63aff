// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding relations expressed as canonical indices.

use brep_index_topology::{BrepKernel, ShapeKind};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::canonical::{EntityCanonicalizer, Interner};
use crate::error::Result;
use crate::walker::ShapeGraphWalker;

/// Faces, edges and vertices contained in a shell or solid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub face_indices: Vec<usize>,
    pub edge_indices: Vec<usize>,
    pub vertex_indices: Vec<usize>,
}

/// Adjacency lists indexed by canonical index of their owning tier.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    pub face_edges: Vec<Vec<usize>>,
    pub face_wires: Vec<Vec<usize>>,
    pub edge_vertices: Vec<SmallVec<[usize; 2]>>,
    pub wire_edges: Vec<Vec<usize>>,
    pub wire_vertices: Vec<Vec<usize>>,
    pub shells: Vec<Membership>,
    pub solids: Vec<Membership>,
    /// Raw entities skipped because they have no canonical index.
    pub dangling: usize,
}

pub struct AdjacencyBuilder<'a, 'k, K: BrepKernel> {
    kernel: &'k K,
    walker: &'a ShapeGraphWalker<'k, K>,
    canon: &'a EntityCanonicalizer<'k, K>,
    root: &'a K::Shape,
}

impl<'a, 'k, K: BrepKernel> AdjacencyBuilder<'a, 'k, K> {
    pub fn new(
        kernel: &'k K,
        walker: &'a ShapeGraphWalker<'k, K>,
        canon: &'a EntityCanonicalizer<'k, K>,
        root: &'a K::Shape,
    ) -> Self {
        Self {
            kernel,
            walker,
            canon,
            root,
        }
    }

    pub fn build(&self) -> Result<Adjacency> {
        let tiers = self.canon.tiers();
        let mut dangling = 0;

        let mut face_edges = Vec::with_capacity(tiers.faces.len());
        let mut face_wires = Vec::with_capacity(tiers.faces.len());
        for face in tiers.faces.entries() {
            let edges = self.walker.edges_of(self.root, &face.shape)?;
            face_edges.push(self.translate(&tiers.edges, &edges, &mut dangling));

            let wires =
                self.walker
                    .enumerate(self.root, ShapeKind::Wire, Some(&face.shape), None)?;
            face_wires.push(self.translate(&tiers.wires, &wires, &mut dangling));
        }

        let edge_vertices = tiers
            .edges
            .entries()
            .iter()
            .map(|edge| match self.kernel.edge_vertices(&edge.shape) {
                Some((first, last)) => self
                    .translate(&tiers.vertices, &[first, last], &mut dangling)
                    .into_iter()
                    .collect(),
                None => SmallVec::new(),
            })
            .collect();

        let mut wire_edges = Vec::with_capacity(tiers.wires.len());
        let mut wire_vertices = Vec::with_capacity(tiers.wires.len());
        for wire in tiers.wires.entries() {
            let traversal = &wire.payload;
            wire_edges.push(self.translate(&tiers.edges, &traversal.edges, &mut dangling));
            wire_vertices.push(self.translate(&tiers.vertices, &traversal.vertices, &mut dangling));
        }

        let shells = self.memberships(&tiers.shells, &mut dangling)?;
        let solids = self.memberships(&tiers.solids, &mut dangling)?;

        if dangling > 0 {
            tracing::debug!(dangling = dangling, "Skipped references to dropped entities");
        }

        Ok(Adjacency {
            face_edges,
            face_wires,
            edge_vertices,
            wire_edges,
            wire_vertices,
            shells,
            solids,
            dangling,
        })
    }

    fn memberships(
        &self,
        containers: &Interner<K::Shape, ()>,
        dangling: &mut usize,
    ) -> Result<Vec<Membership>> {
        let tiers = self.canon.tiers();
        containers
            .entries()
            .iter()
            .map(|c| {
                let scope = Some(&c.shape);
                let faces = self.walker.enumerate(self.root, ShapeKind::Face, scope, None)?;
                let edges = self.walker.enumerate(self.root, ShapeKind::Edge, scope, None)?;
                let vertices = self.walker.enumerate(self.root, ShapeKind::Vertex, scope, None)?;
                Ok(Membership {
                    face_indices: self.translate(&tiers.faces, &faces, dangling),
                    edge_indices: self.translate(&tiers.edges, &edges, dangling),
                    vertex_indices: self.translate(&tiers.vertices, &vertices, dangling),
                })
            })
            .collect()
    }

    /// Canonical indices of `shapes`, each once, in first-seen order.
    /// Entities without an index are counted as dangling and skipped.
    fn translate<P>(
        &self,
        tier: &Interner<K::Shape, P>,
        shapes: &[K::Shape],
        dangling: &mut usize,
    ) -> Vec<usize> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::with_capacity(shapes.len());
        for shape in shapes {
            match tier.get(&self.kernel.identity(shape)) {
                Some(i) => {
                    if seen.insert(i) {
                        out.push(i);
                    }
                }
                None => *dangling += 1,
            }
        }
        out
    }
}

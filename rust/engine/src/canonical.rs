// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity interning and dense canonical indices.
//!
//! Each tier maps [`IdentityKey`]s to indices in `[0, n)` handed out in
//! first-encounter order. A payload is computed once per identity, on first
//! sighting; identities whose payload cannot be computed are remembered as
//! dropped and never receive an index.

use brep_index_topology::{BrepKernel, IdentityKey, SurfaceType, TriangleMesh};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cancel::CancelToken;
use crate::config::ConversionConfig;
use crate::error::Result;
use crate::sampling::{
    polyline_length, resample, CurveSampler, MeshHint, SampledGrid, SurfaceGridSampler,
};
use crate::wire::{WireOrderer, WireTraversal};

/// One interned entity: the first-seen handle and its payload.
#[derive(Debug, Clone)]
pub struct Interned<S, P> {
    pub key: IdentityKey,
    pub shape: S,
    pub payload: P,
}

/// Identity → index map for a single entity tier.
#[derive(Debug)]
pub struct Interner<S, P> {
    index: FxHashMap<IdentityKey, usize>,
    dropped: FxHashSet<IdentityKey>,
    entries: Vec<Interned<S, P>>,
}

impl<S, P> Default for Interner<S, P> {
    fn default() -> Self {
        Self {
            index: FxHashMap::default(),
            dropped: FxHashSet::default(),
            entries: Vec::new(),
        }
    }
}

impl<S, P> Interner<S, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &IdentityKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Already interned or already dropped.
    pub fn has_seen(&self, key: &IdentityKey) -> bool {
        self.index.contains_key(key) || self.dropped.contains(key)
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    pub fn entries(&self) -> &[Interned<S, P>] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Interned<S, P>> {
        self.entries
    }

    /// Index for `key`, computing the payload only on first sighting.
    pub fn intern_with(
        &mut self,
        key: IdentityKey,
        shape: S,
        compute: impl FnOnce(&S) -> Option<P>,
    ) -> Option<usize> {
        if let Some(&i) = self.index.get(&key) {
            return Some(i);
        }
        if self.dropped.contains(&key) {
            return None;
        }
        let payload = compute(&shape);
        self.insert_computed(key, shape, payload)
    }

    fn insert_computed(&mut self, key: IdentityKey, shape: S, payload: Option<P>) -> Option<usize> {
        match payload {
            Some(payload) => {
                let i = self.entries.len();
                self.index.insert(key, i);
                self.entries.push(Interned {
                    key,
                    shape,
                    payload,
                });
                Some(i)
            }
            None => {
                self.dropped.insert(key);
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgePayload {
    pub points: Vec<[f64; 3]>,
    pub length: f64,
}

#[derive(Debug, Clone)]
pub struct FacePayload {
    pub grid: SampledGrid,
    pub surface_type: SurfaceType,
    pub mesh: Option<TriangleMesh>,
}

/// All canonical tiers of one run.
#[derive(Debug)]
pub struct CanonicalTiers<S> {
    pub vertices: Interner<S, [f64; 3]>,
    pub edges: Interner<S, EdgePayload>,
    pub wires: Interner<S, WireTraversal<S>>,
    pub faces: Interner<S, FacePayload>,
    pub shells: Interner<S, ()>,
    pub solids: Interner<S, ()>,
}

impl<S> Default for CanonicalTiers<S> {
    fn default() -> Self {
        Self {
            vertices: Interner::new(),
            edges: Interner::new(),
            wires: Interner::new(),
            faces: Interner::new(),
            shells: Interner::new(),
            solids: Interner::new(),
        }
    }
}

/// Computes per-entity payloads. Read-only, shared across rayon workers.
struct PayloadComputer<'k, K: BrepKernel> {
    kernel: &'k K,
    curves: CurveSampler<'k, K>,
    surfaces: SurfaceGridSampler<'k, K>,
    wires: WireOrderer<'k, K>,
    edge_sample_count: usize,
    arc_length_resample: bool,
    grid: (usize, usize),
    include_face_mesh: bool,
    mesh_deflection: f64,
}

impl<'k, K: BrepKernel> PayloadComputer<'k, K> {
    fn vertex(&self, vertex: &K::Shape) -> Option<[f64; 3]> {
        let point = self.kernel.vertex_point(vertex);
        if point.is_none() {
            tracing::debug!(entity = %self.kernel.identity(vertex), "Dropping vertex without point");
        }
        point.map(|p| [p.x, p.y, p.z])
    }

    fn edge(&self, edge: &K::Shape) -> Option<EdgePayload> {
        match self.curves.sample(edge, self.edge_sample_count) {
            Ok(points) => {
                let points = if self.arc_length_resample {
                    resample(&points, self.edge_sample_count)
                } else {
                    points
                };
                let length = polyline_length(&points);
                Some(EdgePayload { points, length })
            }
            Err(err) => {
                tracing::debug!(
                    entity = %self.kernel.identity(edge),
                    reason = %err,
                    "Dropping edge without evaluable curve"
                );
                None
            }
        }
    }

    fn face(&self, face: &K::Shape) -> Option<FacePayload> {
        let mesh = self
            .include_face_mesh
            .then(|| self.kernel.triangulate(face, self.mesh_deflection));
        let hint = match &mesh {
            Some(attempt) => MeshHint::Attempted(attempt.as_ref()),
            None => MeshHint::Pending,
        };
        let (u, v) = self.grid;
        let grid = self.surfaces.sample_with_mesh(face, u, v, hint);
        let mesh = mesh.flatten();

        if grid.trace.no_surface && grid.trace.source == crate::sampling::GridSource::Zero {
            tracing::debug!(
                entity = %self.kernel.identity(face),
                "Dropping face without surface or triangulation"
            );
            return None;
        }
        if grid.trace.degraded() {
            tracing::warn!(
                entity = %self.kernel.identity(face),
                source = ?grid.trace.source,
                layers = ?grid.trace.layers,
                "Face grid fell back"
            );
        }

        Some(FacePayload {
            surface_type: self.kernel.surface_type(face),
            grid,
            mesh,
        })
    }

    fn wire(&self, wire: &K::Shape) -> Option<WireTraversal<K::Shape>> {
        let traversal = self.wires.traverse(wire);
        if traversal.edges.is_empty() {
            tracing::debug!(entity = %self.kernel.identity(wire), "Dropping wire without edges");
            return None;
        }
        Some(traversal)
    }
}

/// Interns entities of one conversion run and owns their payloads.
pub struct EntityCanonicalizer<'k, K: BrepKernel> {
    kernel: &'k K,
    computer: PayloadComputer<'k, K>,
    parallel: bool,
    tiers: CanonicalTiers<K::Shape>,
}

impl<'k, K: BrepKernel> EntityCanonicalizer<'k, K> {
    pub fn new(kernel: &'k K, config: &ConversionConfig) -> Self {
        Self {
            kernel,
            computer: PayloadComputer {
                kernel,
                curves: CurveSampler::new(kernel),
                surfaces: SurfaceGridSampler::new(kernel, config.mesh_deflection),
                wires: WireOrderer::new(kernel),
                edge_sample_count: config.edge_sample_count,
                arc_length_resample: config.arc_length_resample,
                grid: (config.grid_u, config.grid_v),
                include_face_mesh: config.include_face_mesh,
                mesh_deflection: config.mesh_deflection,
            },
            parallel: config.parallel,
            tiers: CanonicalTiers::default(),
        }
    }

    pub fn intern_vertex(&mut self, vertex: &K::Shape) -> Option<usize> {
        let computer = &self.computer;
        self.tiers
            .vertices
            .intern_with(self.kernel.identity(vertex), vertex.clone(), |v| computer.vertex(v))
    }

    pub fn intern_edge(&mut self, edge: &K::Shape) -> Option<usize> {
        let computer = &self.computer;
        self.tiers
            .edges
            .intern_with(self.kernel.identity(edge), edge.clone(), |e| computer.edge(e))
    }

    pub fn intern_wire(&mut self, wire: &K::Shape) -> Option<usize> {
        let computer = &self.computer;
        self.tiers
            .wires
            .intern_with(self.kernel.identity(wire), wire.clone(), |w| computer.wire(w))
    }

    pub fn intern_face(&mut self, face: &K::Shape) -> Option<usize> {
        let computer = &self.computer;
        self.tiers
            .faces
            .intern_with(self.kernel.identity(face), face.clone(), |f| computer.face(f))
    }

    pub fn intern_shell(&mut self, shell: &K::Shape) -> Option<usize> {
        self.tiers
            .shells
            .intern_with(self.kernel.identity(shell), shell.clone(), |_| Some(()))
    }

    pub fn intern_solid(&mut self, solid: &K::Shape) -> Option<usize> {
        self.tiers
            .solids
            .intern_with(self.kernel.identity(solid), solid.clone(), |_| Some(()))
    }

    pub fn intern_vertices(&mut self, vertices: &[K::Shape]) -> Result<()> {
        let computer = &self.computer;
        intern_batch(
            &mut self.tiers.vertices,
            self.kernel,
            vertices,
            self.parallel,
            |v| Ok(computer.vertex(v)),
        )
    }

    pub fn intern_edges(&mut self, edges: &[K::Shape]) -> Result<()> {
        let computer = &self.computer;
        intern_batch(
            &mut self.tiers.edges,
            self.kernel,
            edges,
            self.parallel,
            |e| Ok(computer.edge(e)),
        )
    }

    pub fn intern_wires(&mut self, wires: &[K::Shape]) -> Result<()> {
        let computer = &self.computer;
        intern_batch(
            &mut self.tiers.wires,
            self.kernel,
            wires,
            self.parallel,
            |w| Ok(computer.wire(w)),
        )
    }

    /// Interns faces, checking `cancel` before sampling each one.
    pub fn intern_faces(&mut self, faces: &[K::Shape], cancel: &CancelToken) -> Result<()> {
        let computer = &self.computer;
        intern_batch(
            &mut self.tiers.faces,
            self.kernel,
            faces,
            self.parallel,
            |f| {
                cancel.check()?;
                Ok(computer.face(f))
            },
        )
    }

    pub fn vertex_index(&self, vertex: &K::Shape) -> Option<usize> {
        self.tiers.vertices.get(&self.kernel.identity(vertex))
    }

    pub fn edge_index(&self, edge: &K::Shape) -> Option<usize> {
        self.tiers.edges.get(&self.kernel.identity(edge))
    }

    pub fn wire_index(&self, wire: &K::Shape) -> Option<usize> {
        self.tiers.wires.get(&self.kernel.identity(wire))
    }

    pub fn face_index(&self, face: &K::Shape) -> Option<usize> {
        self.tiers.faces.get(&self.kernel.identity(face))
    }

    pub fn tiers(&self) -> &CanonicalTiers<K::Shape> {
        &self.tiers
    }

    pub fn into_tiers(self) -> CanonicalTiers<K::Shape> {
        self.tiers
    }
}

/// Interns a batch of handles in first-encounter order. Payloads of unseen
/// identities are computed up front (on the rayon pool when `parallel`);
/// indices are then assigned sequentially so the result does not depend on
/// scheduling.
fn intern_batch<K, P, F>(
    interner: &mut Interner<K::Shape, P>,
    kernel: &K,
    shapes: &[K::Shape],
    parallel: bool,
    compute: F,
) -> Result<()>
where
    K: BrepKernel,
    P: Send,
    F: Fn(&K::Shape) -> Result<Option<P>> + Sync,
{
    let mut pending_keys = FxHashSet::default();
    let pending: Vec<(IdentityKey, &K::Shape)> = shapes
        .iter()
        .map(|s| (kernel.identity(s), s))
        .filter(|(key, _)| !interner.has_seen(key) && pending_keys.insert(*key))
        .collect();

    let payloads: Vec<Option<P>> = if parallel {
        pending
            .par_iter()
            .map(|(_, shape)| compute(*shape))
            .collect::<Result<_>>()?
    } else {
        pending
            .iter()
            .map(|(_, shape)| compute(*shape))
            .collect::<Result<_>>()?
    };

    for ((key, shape), payload) in pending.into_iter().zip(payloads) {
        interner.insert_computed(key, shape.clone(), payload);
    }
    Ok(())
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity-ordered wire traversal.
//!
//! Kernels may enumerate a wire's edges in storage or hash order. The
//! orderer rebuilds a walk along shared endpoints so consecutive edges in
//! the result always meet at a vertex.

use brep_index_topology::{BrepKernel, IdentityKey, ShapeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Result of walking one wire.
#[derive(Debug, Clone)]
pub struct WireTraversal<S> {
    /// Each distinct edge once, in walk order.
    pub edges: Vec<S>,
    /// Each distinct vertex once, in the order the walk reaches it.
    pub vertices: Vec<S>,
    /// Every vertex is entered as often as it is left.
    pub closed: bool,
}

struct EdgeLink<S> {
    edge: S,
    /// `(first, last)` in the direction of the edge's use within the wire.
    ends: Option<[(S, IdentityKey); 2]>,
}

impl<S> EdgeLink<S> {
    /// Vertex identity the walk reaches after crossing this edge.
    fn exit(&self, reversed: bool) -> Option<IdentityKey> {
        self.ends
            .as_ref()
            .map(|e| if reversed { e[0].1 } else { e[1].1 })
    }
}

pub struct WireOrderer<'k, K: BrepKernel> {
    kernel: &'k K,
}

impl<'k, K: BrepKernel> WireOrderer<'k, K> {
    pub fn new(kernel: &'k K) -> Self {
        Self { kernel }
    }

    pub fn ordered_edges(&self, wire: &K::Shape) -> Vec<K::Shape> {
        self.traverse(wire).edges
    }

    pub fn ordered_vertices(&self, wire: &K::Shape) -> Vec<K::Shape> {
        self.traverse(wire).vertices
    }

    /// Walks the wire. Safe to call repeatedly; each call is an independent
    /// pass over the kernel's enumeration.
    pub fn traverse(&self, wire: &K::Shape) -> WireTraversal<K::Shape> {
        let raw = self.kernel.explore(wire, ShapeKind::Edge, None);
        let closed = self.is_balanced(&raw);

        let mut seen = FxHashSet::default();
        let links: Vec<EdgeLink<K::Shape>> = raw
            .into_iter()
            .filter(|e| seen.insert(self.kernel.identity(e)))
            .map(|edge| {
                let ends = self.kernel.edge_vertices(&edge).map(|(a, b)| {
                    let ka = self.kernel.identity(&a);
                    let kb = self.kernel.identity(&b);
                    [(a, ka), (b, kb)]
                });
                EdgeLink { edge, ends }
            })
            .collect();

        let order = chain(&links);

        let mut edges = Vec::with_capacity(links.len());
        let mut vertices = Vec::with_capacity(links.len() + 1);
        let mut seen_vertices = FxHashSet::default();

        for &(i, reversed) in &order {
            let link = &links[i];
            edges.push(link.edge.clone());
            if let Some(ends) = &link.ends {
                let (a, b) = if reversed { (&ends[1], &ends[0]) } else { (&ends[0], &ends[1]) };
                for (v, key) in [a, b] {
                    if seen_vertices.insert(*key) {
                        vertices.push(v.clone());
                    }
                }
            }
        }

        WireTraversal {
            edges,
            vertices,
            closed,
        }
    }

    fn is_balanced(&self, uses: &[K::Shape]) -> bool {
        if uses.is_empty() {
            return false;
        }
        let mut balance: FxHashMap<IdentityKey, i64> = FxHashMap::default();
        for edge in uses {
            match self.kernel.edge_vertices(edge) {
                Some((a, b)) => {
                    *balance.entry(self.kernel.identity(&a)).or_insert(0) += 1;
                    *balance.entry(self.kernel.identity(&b)).or_insert(0) -= 1;
                }
                None => return false,
            }
        }
        balance.values().all(|&b| b == 0)
    }
}

/// Greedy endpoint chaining. Returns `(link index, traversed reversed)` for
/// every link; links without vertices go last in enumeration order.
fn chain<S>(links: &[EdgeLink<S>]) -> Vec<(usize, bool)> {
    let mut incident: FxHashMap<IdentityKey, SmallVec<[usize; 4]>> = FxHashMap::default();
    for (i, link) in links.iter().enumerate() {
        if let Some(ends) = &link.ends {
            incident.entry(ends[0].1).or_default().push(i);
            incident.entry(ends[1].1).or_default().push(i);
        }
    }

    let mut used = vec![false; links.len()];
    let mut order = Vec::with_capacity(links.len());

    while let Some(start) = chain_start(links, &used, &incident) {
        used[start.0] = true;
        order.push(start);
        let mut tail = links[start.0].exit(start.1);

        while let Some(at) = tail {
            let candidates = match incident.get(&at) {
                Some(c) => c,
                None => break,
            };
            // Prefer continuing in the edge's own direction
            let next = candidates
                .iter()
                .copied()
                .filter(|&i| !used[i])
                .find(|&i| links[i].ends.as_ref().is_some_and(|e| e[0].1 == at))
                .map(|i| (i, false))
                .or_else(|| {
                    candidates
                        .iter()
                        .copied()
                        .find(|&i| !used[i])
                        .map(|i| (i, true))
                });

            match next {
                Some((i, reversed)) => {
                    used[i] = true;
                    order.push((i, reversed));
                    tail = links[i].exit(reversed);
                }
                None => break,
            }
        }
    }

    for (i, link) in links.iter().enumerate() {
        if link.ends.is_none() {
            order.push((i, false));
        }
    }

    order
}

/// Next chain head: an unused edge touching a dangling endpoint (oriented to
/// start there), else the first unused edge.
fn chain_start<S>(
    links: &[EdgeLink<S>],
    used: &[bool],
    incident: &FxHashMap<IdentityKey, SmallVec<[usize; 4]>>,
) -> Option<(usize, bool)> {
    let degree = |v: &IdentityKey| {
        incident
            .get(v)
            .map_or(0, |c| c.iter().filter(|&&i| !used[i]).count())
    };

    let open: Vec<(usize, &[(S, IdentityKey); 2])> = links
        .iter()
        .enumerate()
        .filter(|(i, _)| !used[*i])
        .filter_map(|(i, link)| link.ends.as_ref().map(|e| (i, e)))
        .collect();

    open.iter()
        .find(|(_, e)| degree(&e[0].1) == 1)
        .map(|(i, _)| (*i, false))
        .or_else(|| {
            open.iter()
                .find(|(_, e)| degree(&e[1].1) == 1)
                .map(|(i, _)| (*i, true))
        })
        .or_else(|| open.first().map(|(i, _)| (*i, false)))
}

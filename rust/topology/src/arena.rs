// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Slot-map storage for a B-rep model.
//!
//! Each tier of the hierarchy (vertex up to compound) lives in its own
//! [`SlotMap`], so keys stay valid for the life of the model. A single
//! reverse index records which entities reference each child; it is what
//! lets a snapshot with several loose top-level entities be grouped under
//! one compound.
//!
//! Edges carry an optional curve and faces an optional surface plus mesh.
//! Either may be absent; consumers treat that as "no evaluable geometry".

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::geometry::{CurveGeometry, SurfaceGeometry};
use crate::kernel::{ParamRange, SurfaceDomain, TriangleMesh};
use crate::keys::*;

#[derive(Debug, Clone)]
pub struct VertexData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A bounded piece of curve between two vertices.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: VertexKey,
    pub end: VertexKey,
    /// Missing for edges collapsed to a point.
    pub curve: Option<CurveGeometry>,
    pub range: ParamRange,
}

impl EdgeData {
    /// Seam-like edge: starts and ends on one vertex.
    pub fn is_closed(&self) -> bool {
        self.start == self.end
    }
}

/// Edge uses of a loop. `orientations[i]` is `true` when `edges[i]` runs
/// start to end. Stored order need not be walk order.
#[derive(Debug, Clone)]
pub struct WireData {
    pub edges: Vec<EdgeKey>,
    pub orientations: Vec<bool>,
}

/// A bounded surface patch: one outer loop and any number of hole loops.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub outer_wire: WireKey,
    pub inner_wires: Vec<WireKey>,
    pub surface: Option<SurfaceGeometry>,
    pub domain: Option<SurfaceDomain>,
    /// Attached tessellation; wins over ear clipping of the boundary.
    pub mesh: Option<TriangleMesh>,
}

#[derive(Debug, Clone)]
pub struct ShellData {
    pub faces: Vec<FaceKey>,
}

/// Outer boundary plus void shells.
#[derive(Debug, Clone)]
pub struct SolidData {
    pub outer_shell: ShellKey,
    pub inner_shells: Vec<ShellKey>,
}

#[derive(Debug, Clone)]
pub struct CompSolidData {
    pub solids: Vec<SolidKey>,
}

/// Free grouping of oriented entity uses.
#[derive(Debug, Clone)]
pub struct CompoundData {
    pub children: Vec<ShapeRef>,
}

/// In-memory B-rep model.
///
/// # Example
///
/// ```
/// use brep_index_topology::TopologyArena;
///
/// let mut model = TopologyArena::new();
/// let a = model.add_vertex(0.0, 0.0, 0.0);
/// let b = model.add_vertex(1.0, 0.0, 0.0);
/// let edge = model.add_edge(a, b).unwrap();
///
/// assert_eq!(model.vertex_count(), 2);
/// assert!(model.edge(edge).unwrap().curve.is_some());
/// ```
#[derive(Debug, Default)]
pub struct TopologyArena {
    pub(crate) vertices: SlotMap<VertexKey, VertexData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) wires: SlotMap<WireKey, WireData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData>,
    pub(crate) shells: SlotMap<ShellKey, ShellData>,
    pub(crate) solids: SlotMap<SolidKey, SolidData>,
    pub(crate) compsolids: SlotMap<CompSolidKey, CompSolidData>,
    pub(crate) compounds: SlotMap<CompoundKey, CompoundData>,

    /// child -> entities that reference it
    pub(crate) parents: FxHashMap<TopologyKey, FxHashSet<TopologyKey>>,
}

/// Read access and a count for one storage tier.
macro_rules! tier_access {
    ($($get:ident, $count:ident, $field:ident: $key:ty => $data:ty;)*) => {
        impl TopologyArena {
            $(
                pub fn $get(&self, key: $key) -> Option<&$data> {
                    self.$field.get(key)
                }

                pub fn $count(&self) -> usize {
                    self.$field.len()
                }
            )*
        }
    };
}

tier_access! {
    vertex, vertex_count, vertices: VertexKey => VertexData;
    edge, edge_count, edges: EdgeKey => EdgeData;
    wire, wire_count, wires: WireKey => WireData;
    face, face_count, faces: FaceKey => FaceData;
    shell, shell_count, shells: ShellKey => ShellData;
    solid, solid_count, solids: SolidKey => SolidData;
    compsolid, compsolid_count, compsolids: CompSolidKey => CompSolidData;
    compound, compound_count, compounds: CompoundKey => CompoundData;
}

impl TopologyArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> VertexKey {
        self.vertices.insert(VertexData { x, y, z })
    }

    /// Whether `key` still resolves to a stored entity.
    pub fn contains(&self, key: TopologyKey) -> bool {
        match key {
            TopologyKey::Vertex(k) => self.vertices.contains_key(k),
            TopologyKey::Edge(k) => self.edges.contains_key(k),
            TopologyKey::Wire(k) => self.wires.contains_key(k),
            TopologyKey::Face(k) => self.faces.contains_key(k),
            TopologyKey::Shell(k) => self.shells.contains_key(k),
            TopologyKey::Solid(k) => self.solids.contains_key(k),
            TopologyKey::CompSolid(k) => self.compsolids.contains_key(k),
            TopologyKey::Compound(k) => self.compounds.contains_key(k),
        }
    }

    /// Entities that reference `key` directly, in no particular order.
    pub fn parents(&self, key: TopologyKey) -> impl Iterator<Item = TopologyKey> + '_ {
        self.parents.get(&key).into_iter().flatten().copied()
    }

    pub fn has_parent(&self, key: TopologyKey) -> bool {
        self.parents.get(&key).is_some_and(|p| !p.is_empty())
    }

    pub(crate) fn link(&mut self, child: impl Into<TopologyKey>, parent: impl Into<TopologyKey>) {
        self.parents
            .entry(child.into())
            .or_default()
            .insert(parent.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_model_has_nothing_stored() {
        let model = TopologyArena::new();
        let counts = [
            model.vertex_count(),
            model.edge_count(),
            model.wire_count(),
            model.face_count(),
            model.shell_count(),
            model.solid_count(),
            model.compsolid_count(),
            model.compound_count(),
        ];
        assert_eq!(counts, [0; 8]);
        assert!(model.parents.is_empty());
    }

    #[test]
    fn vertex_keeps_its_coordinates() {
        let mut model = TopologyArena::new();
        let key = model.add_vertex(1.0, -2.0, 3.5);

        let v = model.vertex(key).unwrap();
        assert_eq!([v.x, v.y, v.z], [1.0, -2.0, 3.5]);
    }

    #[test]
    fn removed_keys_no_longer_resolve() {
        let mut model = TopologyArena::new();
        let key = model.add_vertex(0.0, 0.0, 0.0);
        assert!(model.contains(key.into()));

        model.vertices.remove(key);
        assert!(!model.contains(key.into()));
        assert!(model.vertex(key).is_none());
    }

    #[test]
    fn edges_register_as_vertex_parents() {
        let mut model = TopologyArena::new();
        let a = model.add_vertex(0.0, 0.0, 0.0);
        let b = model.add_vertex(0.0, 0.0, 1.0);
        let edge = model.add_edge(a, b).unwrap();

        assert!(model.has_parent(a.into()));
        assert_eq!(model.parents(b.into()).collect::<Vec<_>>(), vec![TopologyKey::from(edge)]);
        assert!(!model.has_parent(edge.into()));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of a model.
//!
//! A snapshot lists each tier as an array; entities point at each other by
//! array position. Curves, surfaces and attached meshes travel along.
//!
//! Snapshots written by hand may leave out anything derivable: an edge
//! without `curve`/`range` is a straight line, a wire without
//! `orientations` has them inferred from shared endpoints, and a face
//! without `surface` gets the plane of its outer boundary.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap};

use crate::arena::*;
use crate::error::{Error, Result};
use crate::geometry::{CurveGeometry, SurfaceGeometry};
use crate::kernel::{Orientation, ParamRange, ShapeKind, SurfaceDomain, TriangleMesh};
use crate::keys::*;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    #[serde(default)]
    pub vertices: Vec<VertexSnapshot>,
    #[serde(default)]
    pub edges: Vec<EdgeSnapshot>,
    #[serde(default)]
    pub wires: Vec<WireSnapshot>,
    #[serde(default)]
    pub faces: Vec<FaceSnapshot>,
    #[serde(default)]
    pub shells: Vec<ShellSnapshot>,
    #[serde(default)]
    pub solids: Vec<SolidSnapshot>,
    #[serde(default)]
    pub compsolids: Vec<CompSolidSnapshot>,
    /// Nested compounds come before the compounds holding them.
    #[serde(default)]
    pub compounds: Vec<CompoundSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: usize,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<CurveGeometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ParamRange>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireSnapshot {
    pub id: usize,
    pub edges: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientations: Option<Vec<bool>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub id: usize,
    pub outer_wire: usize,
    #[serde(default)]
    pub inner_wires: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceGeometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<SurfaceDomain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<TriangleMesh>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShellSnapshot {
    pub id: usize,
    pub faces: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolidSnapshot {
    pub id: usize,
    pub outer_shell: usize,
    #[serde(default)]
    pub inner_shells: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompSolidSnapshot {
    pub id: usize,
    pub solids: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompoundSnapshot {
    pub id: usize,
    pub children: Vec<MemberSnapshot>,
}

/// One compound member: entry `index` of the `kind` tier.
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub kind: ShapeKind,
    pub index: usize,
    #[serde(default)]
    pub orientation: Orientation,
}

/// Position of every key in slot-map iteration order.
fn positions<K: Key, V>(map: &SlotMap<K, V>) -> FxHashMap<K, usize> {
    map.keys().enumerate().map(|(i, k)| (k, i)).collect()
}

fn indices<K: Key>(at: &FxHashMap<K, usize>, keys: &[K]) -> Vec<usize> {
    keys.iter().map(|k| at[k]).collect()
}

/// Key lists per tier while a snapshot is being loaded.
#[derive(Default)]
struct Loaded {
    vertices: Vec<VertexKey>,
    edges: Vec<EdgeKey>,
    wires: Vec<WireKey>,
    faces: Vec<FaceKey>,
    shells: Vec<ShellKey>,
    solids: Vec<SolidKey>,
    compsolids: Vec<CompSolidKey>,
    compounds: Vec<CompoundKey>,
}

fn pick<K: Copy>(keys: &[K], tier: &'static str, index: usize) -> Result<K> {
    keys.get(index)
        .copied()
        .ok_or(Error::DanglingIndex { tier, index })
}

fn pick_all<K: Copy>(keys: &[K], tier: &'static str, indices: &[usize]) -> Result<Vec<K>> {
    indices.iter().map(|&i| pick(keys, tier, i)).collect()
}

impl Loaded {
    fn member(&self, kind: ShapeKind, index: usize) -> Result<TopologyKey> {
        Ok(match kind {
            ShapeKind::Vertex => pick(&self.vertices, "vertex", index)?.into(),
            ShapeKind::Edge => pick(&self.edges, "edge", index)?.into(),
            ShapeKind::Wire => pick(&self.wires, "wire", index)?.into(),
            ShapeKind::Face => pick(&self.faces, "face", index)?.into(),
            ShapeKind::Shell => pick(&self.shells, "shell", index)?.into(),
            ShapeKind::Solid => pick(&self.solids, "solid", index)?.into(),
            ShapeKind::CompSolid => pick(&self.compsolids, "compsolid", index)?.into(),
            ShapeKind::Compound => pick(&self.compounds, "compound", index)?.into(),
            ShapeKind::Shape => return Err(Error::UnsupportedKind(kind.to_string())),
        })
    }
}

impl TopologyArena {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ArenaSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }

    /// Flattens the model into position-indexed tiers.
    pub fn to_snapshot(&self) -> ArenaSnapshot {
        let vertex_at = positions(&self.vertices);
        let edge_at = positions(&self.edges);
        let wire_at = positions(&self.wires);
        let face_at = positions(&self.faces);
        let shell_at = positions(&self.shells);
        let solid_at = positions(&self.solids);
        let compsolid_at = positions(&self.compsolids);

        let mut compound_order = Vec::with_capacity(self.compounds.len());
        let mut compound_at = FxHashMap::default();
        for key in self.compounds.keys() {
            self.place_compound(key, &mut compound_at, &mut compound_order);
        }

        let position_of = |key: TopologyKey| match key {
            TopologyKey::Vertex(k) => vertex_at[&k],
            TopologyKey::Edge(k) => edge_at[&k],
            TopologyKey::Wire(k) => wire_at[&k],
            TopologyKey::Face(k) => face_at[&k],
            TopologyKey::Shell(k) => shell_at[&k],
            TopologyKey::Solid(k) => solid_at[&k],
            TopologyKey::CompSolid(k) => compsolid_at[&k],
            TopologyKey::Compound(k) => compound_at[&k],
        };

        ArenaSnapshot {
            vertices: self
                .vertices
                .values()
                .enumerate()
                .map(|(id, v)| VertexSnapshot {
                    id,
                    x: v.x,
                    y: v.y,
                    z: v.z,
                })
                .collect(),
            edges: self
                .edges
                .values()
                .enumerate()
                .map(|(id, e)| EdgeSnapshot {
                    id,
                    start: vertex_at[&e.start],
                    end: vertex_at[&e.end],
                    curve: e.curve.clone(),
                    range: Some(e.range),
                })
                .collect(),
            wires: self
                .wires
                .values()
                .enumerate()
                .map(|(id, w)| WireSnapshot {
                    id,
                    edges: indices(&edge_at, &w.edges),
                    orientations: Some(w.orientations.clone()),
                })
                .collect(),
            faces: self
                .faces
                .values()
                .enumerate()
                .map(|(id, f)| FaceSnapshot {
                    id,
                    outer_wire: wire_at[&f.outer_wire],
                    inner_wires: indices(&wire_at, &f.inner_wires),
                    surface: f.surface.clone(),
                    domain: f.domain,
                    mesh: f.mesh.clone(),
                })
                .collect(),
            shells: self
                .shells
                .values()
                .enumerate()
                .map(|(id, s)| ShellSnapshot {
                    id,
                    faces: indices(&face_at, &s.faces),
                })
                .collect(),
            solids: self
                .solids
                .values()
                .enumerate()
                .map(|(id, s)| SolidSnapshot {
                    id,
                    outer_shell: shell_at[&s.outer_shell],
                    inner_shells: indices(&shell_at, &s.inner_shells),
                })
                .collect(),
            compsolids: self
                .compsolids
                .values()
                .enumerate()
                .map(|(id, c)| CompSolidSnapshot {
                    id,
                    solids: indices(&solid_at, &c.solids),
                })
                .collect(),
            compounds: compound_order
                .iter()
                .enumerate()
                .map(|(id, &key)| CompoundSnapshot {
                    id,
                    children: self.compounds[key]
                        .children
                        .iter()
                        .map(|child| MemberSnapshot {
                            kind: child.key.kind(),
                            index: position_of(child.key),
                            orientation: child.orientation,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Post-order placement so nested compounds precede their holders.
    fn place_compound(
        &self,
        key: CompoundKey,
        at: &mut FxHashMap<CompoundKey, usize>,
        order: &mut Vec<CompoundKey>,
    ) {
        if at.contains_key(&key) {
            return;
        }
        let nested = self.compounds.get(key).into_iter().flat_map(|c| &c.children);
        for child in nested {
            if let TopologyKey::Compound(inner) = child.key {
                self.place_compound(inner, at, order);
            }
        }
        at.insert(key, order.len());
        order.push(key);
    }

    /// Rebuilds a model tier by tier through the regular constructors, so
    /// every reference is checked on the way in.
    pub fn from_snapshot(snap: &ArenaSnapshot) -> Result<Self> {
        let mut model = TopologyArena::new();
        let mut loaded = Loaded::default();

        for v in &snap.vertices {
            loaded.vertices.push(model.add_vertex(v.x, v.y, v.z));
        }

        for e in &snap.edges {
            let start = pick(&loaded.vertices, "vertex", e.start)?;
            let end = pick(&loaded.vertices, "vertex", e.end)?;
            let key = match (&e.curve, e.range) {
                (None, None) => model.add_edge(start, end)?,
                (curve, Some(range)) => model.add_edge_with_curve(start, end, curve.clone(), range)?,
                (Some(_), None) => {
                    return Err(Error::Serialization(format!(
                        "edge {} has a curve but no parameter range",
                        e.id
                    )))
                }
            };
            loaded.edges.push(key);
        }

        for w in &snap.wires {
            let edges = pick_all(&loaded.edges, "edge", &w.edges)?;
            let key = match &w.orientations {
                Some(orientations) => model.add_wire_with_orientations(&edges, orientations)?,
                None => model.add_wire(&edges)?,
            };
            loaded.wires.push(key);
        }

        for f in &snap.faces {
            let outer = pick(&loaded.wires, "wire", f.outer_wire)?;
            let inner = pick_all(&loaded.wires, "wire", &f.inner_wires)?;
            let key = match &f.surface {
                None => model.add_face_with_holes(outer, &inner)?,
                Some(surface) => {
                    let domain = f.domain.or_else(|| surface.natural_domain()).ok_or_else(|| {
                        Error::Serialization(format!(
                            "face {} has a surface but no parameter domain",
                            f.id
                        ))
                    })?;
                    model.add_face_with_surface(outer, &inner, surface.clone(), domain)?
                }
            };
            if let Some(mesh) = &f.mesh {
                model.set_face_mesh(key, mesh.clone())?;
            }
            loaded.faces.push(key);
        }

        for s in &snap.shells {
            let faces = pick_all(&loaded.faces, "face", &s.faces)?;
            loaded.shells.push(model.add_shell(&faces)?);
        }

        for s in &snap.solids {
            let outer = pick(&loaded.shells, "shell", s.outer_shell)?;
            let voids = pick_all(&loaded.shells, "shell", &s.inner_shells)?;
            loaded.solids.push(model.add_solid_with_voids(outer, &voids)?);
        }

        for c in &snap.compsolids {
            let solids = pick_all(&loaded.solids, "solid", &c.solids)?;
            loaded.compsolids.push(model.add_compsolid(&solids)?);
        }

        for c in &snap.compounds {
            let children = c
                .children
                .iter()
                .map(|m| Ok(ShapeRef::oriented(loaded.member(m.kind, m.index)?, m.orientation)))
                .collect::<Result<Vec<_>>>()?;
            loaded.compounds.push(model.add_compound(&children)?);
        }

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::{make_box, make_cylinder, make_quad};
    use crate::kernel::BrepKernel;

    #[test]
    fn roundtrip_empty_arena() {
        let arena = TopologyArena::new();
        let json = arena.to_json().unwrap();
        let restored = TopologyArena::from_json(&json).unwrap();

        assert_eq!(restored.vertex_count(), 0);
        assert_eq!(restored.edge_count(), 0);
    }

    #[test]
    fn roundtrip_single_face() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let v2 = arena.add_vertex(1.0, 1.0, 0.0);
        let v3 = arena.add_vertex(0.0, 1.0, 0.0);
        make_quad(&mut arena, [v0, v1, v2, v3]).unwrap();

        let json = arena.to_json().unwrap();
        let restored = TopologyArena::from_json(&json).unwrap();

        assert_eq!(restored.vertex_count(), 4);
        assert_eq!(restored.edge_count(), 4);
        assert_eq!(restored.wire_count(), 1);
        assert_eq!(restored.face_count(), 1);
    }

    #[test]
    fn roundtrip_cylinder_keeps_geometry() {
        let mut arena = TopologyArena::new();
        make_cylinder(&mut arena, [0.0; 3], 1.5, 2.0).unwrap();

        let json = arena.to_json().unwrap();
        let restored = TopologyArena::from_json(&json).unwrap();

        assert_eq!(restored.solid_count(), 1);
        let (_, lateral) = restored.faces.iter().next().unwrap();
        assert!(matches!(
            lateral.surface,
            Some(SurfaceGeometry::Cylinder { radius, .. }) if radius == 1.5
        ));
        let (_, wire) = restored.wires.iter().next().unwrap();
        assert_eq!(wire.orientations, vec![true, true, false, false]);
    }

    #[test]
    fn roundtrip_nested_compounds() {
        let mut arena = TopologyArena::new();
        let solid = make_box(&mut arena, [0.0; 3], [1.0; 3]).unwrap();
        let inner = arena.add_compound(&[ShapeRef::new(solid)]).unwrap();
        let v = arena.add_vertex(3.0, 3.0, 3.0);
        arena
            .add_compound(&[
                ShapeRef::new(inner),
                ShapeRef::oriented(v, Orientation::Reversed),
            ])
            .unwrap();

        let json = arena.to_json().unwrap();
        let restored = TopologyArena::from_json(&json).unwrap();

        assert_eq!(restored.compound_count(), 2);
        let roots = restored.root_entities();
        assert_eq!(roots.len(), 1);
        assert_eq!(
            restored.explore(&roots[0], ShapeKind::Face, None).len(),
            6
        );
    }

    #[test]
    fn minimal_hand_written_snapshot() {
        let json = r#"{
            "vertices": [
                {"id": 0, "x": 0.0, "y": 0.0, "z": 0.0},
                {"id": 1, "x": 1.0, "y": 0.0, "z": 0.0},
                {"id": 2, "x": 0.0, "y": 1.0, "z": 0.0}
            ],
            "edges": [
                {"id": 0, "start": 0, "end": 1},
                {"id": 1, "start": 1, "end": 2},
                {"id": 2, "start": 2, "end": 0}
            ],
            "wires": [{"id": 0, "edges": [0, 1, 2]}],
            "faces": [{"id": 0, "outer_wire": 0}]
        }"#;
        let arena = TopologyArena::from_json(json).unwrap();
        let (_, face) = arena.faces.iter().next().unwrap();
        assert!(matches!(face.surface, Some(SurfaceGeometry::Plane { .. })));
        let (_, edge) = arena.edges.iter().next().unwrap();
        assert!(edge.curve.is_some());
    }

    #[test]
    fn dangling_index_is_rejected() {
        let json = r#"{
            "vertices": [{"id": 0, "x": 0.0, "y": 0.0, "z": 0.0}],
            "edges": [{"id": 0, "start": 0, "end": 4}]
        }"#;
        assert!(matches!(
            TopologyArena::from_json(json),
            Err(Error::DanglingIndex { tier: "vertex", index: 4 })
        ));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            TopologyArena::from_json("{ not json"),
            Err(Error::Serialization(_))
        ));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`BrepKernel`] implementation for the in-memory arena.
//!
//! Shapes are oriented [`ShapeRef`] handles. Exploration walks the stored
//! hierarchy depth-first in stored child order, composing orientations on the
//! way down, and reports every use of a matching entity.

use nalgebra::Point3;

use crate::arena::TopologyArena;
use crate::error::EvalError;
use crate::kernel::{
    BrepKernel, IdentityKey, Orientation, ParamRange, ShapeKind, SurfaceDomain, SurfaceType,
    TriangleMesh,
};
use crate::keys::*;

impl TopologyArena {
    /// Direct oriented children of an entity use, in stored order.
    ///
    /// An edge yields its start vertex as a forward use and its end vertex
    /// as a reversed use. Missing entities have no children.
    pub fn children(&self, shape: &ShapeRef) -> Vec<ShapeRef> {
        use Orientation::{Forward, Reversed};

        match shape.key {
            TopologyKey::Compound(k) => match self.compounds.get(k) {
                Some(c) => c
                    .children
                    .iter()
                    .map(|child| shape.compose(child.key, child.orientation))
                    .collect(),
                None => Vec::new(),
            },
            TopologyKey::CompSolid(k) => match self.compsolids.get(k) {
                Some(cs) => cs
                    .solids
                    .iter()
                    .map(|&s| shape.compose(s.into(), Forward))
                    .collect(),
                None => Vec::new(),
            },
            TopologyKey::Solid(k) => self
                .solid_shells(k)
                .unwrap_or_default()
                .into_iter()
                .map(|s| shape.compose(s.into(), Forward))
                .collect(),
            TopologyKey::Shell(k) => self
                .shell_faces(k)
                .unwrap_or_default()
                .iter()
                .map(|&f| shape.compose(f.into(), Forward))
                .collect(),
            TopologyKey::Face(k) => self
                .face_wires(k)
                .unwrap_or_default()
                .into_iter()
                .map(|w| shape.compose(w.into(), Forward))
                .collect(),
            TopologyKey::Wire(k) => match self.wires.get(k) {
                Some(w) => w
                    .edges
                    .iter()
                    .zip(&w.orientations)
                    .map(|(&e, &fwd)| shape.compose(e.into(), Orientation::from(fwd)))
                    .collect(),
                None => Vec::new(),
            },
            TopologyKey::Edge(k) => match self.edges.get(k) {
                Some(e) => vec![
                    shape.compose(e.start.into(), Forward),
                    shape.compose(e.end.into(), Reversed),
                ],
                None => Vec::new(),
            },
            TopologyKey::Vertex(_) => Vec::new(),
        }
    }

    fn explore_into(
        &self,
        node: &ShapeRef,
        kind: ShapeKind,
        avoid: Option<ShapeKind>,
        out: &mut Vec<ShapeRef>,
    ) {
        let node_kind = node.key.kind();
        if node_kind == kind {
            out.push(*node);
            return;
        }
        if avoid == Some(node_kind) || !node_kind.can_contain(kind) {
            return;
        }
        for child in self.children(node) {
            self.explore_into(&child, kind, avoid, out);
        }
    }

    fn edge_data(&self, shape: &ShapeRef) -> Result<&crate::arena::EdgeData, EvalError> {
        match shape.key {
            TopologyKey::Edge(k) => self
                .edges
                .get(k)
                .ok_or_else(|| EvalError::Failed(format!("no edge {k:?}"))),
            _ => Err(EvalError::Unsupported),
        }
    }

    fn face_data(&self, shape: &ShapeRef) -> Result<&crate::arena::FaceData, EvalError> {
        match shape.key {
            TopologyKey::Face(k) => self
                .faces
                .get(k)
                .ok_or_else(|| EvalError::Failed(format!("no face {k:?}"))),
            _ => Err(EvalError::Unsupported),
        }
    }
}

impl BrepKernel for TopologyArena {
    type Shape = ShapeRef;

    fn is_null(&self, shape: &ShapeRef) -> bool {
        !self.contains(shape.key)
    }

    fn kind(&self, shape: &ShapeRef) -> ShapeKind {
        shape.key.kind()
    }

    fn orientation(&self, shape: &ShapeRef) -> Orientation {
        shape.orientation
    }

    fn identity(&self, shape: &ShapeRef) -> IdentityKey {
        shape.key.identity()
    }

    fn explore(&self, root: &ShapeRef, kind: ShapeKind, avoid: Option<ShapeKind>) -> Vec<ShapeRef> {
        let mut out = Vec::new();
        if kind.is_concrete() && !self.is_null(root) {
            self.explore_into(root, kind, avoid, &mut out);
        }
        out
    }

    fn edge_vertices(&self, edge: &ShapeRef) -> Option<(ShapeRef, ShapeRef)> {
        let data = self.edge_data(edge).ok()?;
        let (first, last) = if edge.orientation.is_forward() {
            (data.start, data.end)
        } else {
            (data.end, data.start)
        };
        Some((
            ShapeRef::oriented(first, Orientation::Forward),
            ShapeRef::oriented(last, Orientation::Reversed),
        ))
    }

    fn vertex_point(&self, vertex: &ShapeRef) -> Option<Point3<f64>> {
        match vertex.key {
            TopologyKey::Vertex(k) => TopologyArena::vertex_point(self, k),
            _ => None,
        }
    }

    fn curve_range(&self, edge: &ShapeRef) -> Result<ParamRange, EvalError> {
        let data = self.edge_data(edge)?;
        if data.curve.is_none() {
            return Err(EvalError::NoGeometry);
        }
        Ok(data.range)
    }

    fn curve_point(&self, edge: &ShapeRef, t: f64) -> Result<Point3<f64>, EvalError> {
        let data = self.edge_data(edge)?;
        let curve = data.curve.as_ref().ok_or(EvalError::NoGeometry)?;
        if !t.is_finite() {
            return Err(EvalError::OutOfDomain(t, 0.0));
        }
        Ok(curve.point_at(t))
    }

    fn surface_domain(&self, face: &ShapeRef) -> Result<SurfaceDomain, EvalError> {
        let data = self.face_data(face)?;
        let surface = data.surface.as_ref().ok_or(EvalError::NoGeometry)?;
        data.domain
            .or_else(|| surface.natural_domain())
            .ok_or(EvalError::NoGeometry)
    }

    fn surface_point(&self, face: &ShapeRef, u: f64, v: f64) -> Result<Point3<f64>, EvalError> {
        let data = self.face_data(face)?;
        let surface = data.surface.as_ref().ok_or(EvalError::NoGeometry)?;
        if !u.is_finite() || !v.is_finite() {
            return Err(EvalError::OutOfDomain(u, v));
        }
        Ok(surface.point_at(u, v))
    }

    fn surface_type(&self, face: &ShapeRef) -> SurfaceType {
        self.face_data(face)
            .ok()
            .and_then(|f| f.surface.as_ref())
            .map(|s| s.surface_type())
            .unwrap_or(SurfaceType::Other)
    }

    fn triangulate(&self, face: &ShapeRef, deflection: f64) -> Option<TriangleMesh> {
        match face.key {
            TopologyKey::Face(k) => self.triangulate_face(k, deflection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::{make_box, make_cylinder};
    use approx::assert_relative_eq;
    use rustc_hash::FxHashSet;

    fn unit_box() -> (TopologyArena, ShapeRef) {
        let mut arena = TopologyArena::new();
        let solid = make_box(&mut arena, [0.0; 3], [1.0; 3]).unwrap();
        (arena, ShapeRef::new(solid))
    }

    #[test]
    fn explore_box_reports_every_use() {
        let (arena, root) = unit_box();

        assert_eq!(arena.explore(&root, ShapeKind::Face, None).len(), 6);
        assert_eq!(arena.explore(&root, ShapeKind::Wire, None).len(), 6);

        let edges = arena.explore(&root, ShapeKind::Edge, None);
        assert_eq!(edges.len(), 24);

        let distinct: FxHashSet<_> = edges.iter().map(|e| arena.identity(e)).collect();
        assert_eq!(distinct.len(), 12);

        let oriented: FxHashSet<_> = edges.iter().copied().collect();
        assert_eq!(oriented.len(), 24);
    }

    #[test]
    fn explore_respects_avoid() {
        let (arena, root) = unit_box();
        assert!(arena
            .explore(&root, ShapeKind::Edge, Some(ShapeKind::Wire))
            .is_empty());
        assert_eq!(
            arena.explore(&root, ShapeKind::Face, Some(ShapeKind::Wire)).len(),
            6
        );
    }

    #[test]
    fn explore_root_of_target_kind_yields_itself() {
        let (arena, root) = unit_box();
        assert_eq!(arena.explore(&root, ShapeKind::Solid, None), vec![root]);
        assert!(arena.explore(&root, ShapeKind::Compound, None).is_empty());
        assert!(arena.explore(&root, ShapeKind::Shape, None).is_empty());
    }

    #[test]
    fn explore_composes_orientation() {
        let (arena, root) = unit_box();
        let forward = arena.explore(&root, ShapeKind::Edge, None);
        let reversed = arena.explore(&root.reversed(), ShapeKind::Edge, None);
        for (a, b) in forward.iter().zip(&reversed) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.orientation, b.orientation.reversed());
        }
    }

    #[test]
    fn edge_vertices_follow_orientation() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let e = ShapeRef::new(arena.add_edge(v0, v1).unwrap());

        let (a, b) = arena.edge_vertices(&e).unwrap();
        assert_eq!((a.key, b.key), (v0.into(), v1.into()));

        let (a, b) = arena.edge_vertices(&e.reversed()).unwrap();
        assert_eq!((a.key, b.key), (v1.into(), v0.into()));
    }

    #[test]
    fn curve_and_surface_evaluation() {
        let mut arena = TopologyArena::new();
        let solid = make_cylinder(&mut arena, [0.0; 3], 2.0, 1.0).unwrap();
        let root = ShapeRef::new(solid);

        let faces = arena.explore(&root, ShapeKind::Face, None);
        let lateral = &faces[0];
        assert_eq!(arena.surface_type(lateral), SurfaceType::Cylinder);
        assert_eq!(arena.surface_type(&faces[1]), SurfaceType::Plane);

        let domain = arena.surface_domain(lateral).unwrap();
        let p = arena.surface_point(lateral, domain.u.first, domain.v.last).unwrap();
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-12);

        let edges = arena.explore(&root, ShapeKind::Edge, None);
        let range = arena.curve_range(&edges[0]).unwrap();
        let q = arena.curve_point(&edges[0], range.mid()).unwrap();
        assert_relative_eq!(q.x, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn evaluation_errors() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(0.0, 0.0, 0.0);
        let degenerate = ShapeRef::new(arena.add_edge(v0, v1).unwrap());
        let vertex = ShapeRef::new(v0);

        assert_eq!(arena.curve_range(&degenerate), Err(EvalError::NoGeometry));
        assert_eq!(arena.curve_range(&vertex), Err(EvalError::Unsupported));
        assert_eq!(arena.surface_type(&vertex), SurfaceType::Other);
        assert!(arena.triangulate(&vertex, 0.01).is_none());
    }

    #[test]
    fn null_shapes_explore_to_nothing() {
        let mut arena = TopologyArena::new();
        let v = arena.add_vertex(0.0, 0.0, 0.0);
        arena.vertices.remove(v);
        let shape = ShapeRef::new(v);
        assert!(arena.is_null(&shape));
        assert!(arena.explore(&shape, ShapeKind::Vertex, None).is_empty());
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building a model bottom-up.
//!
//! Every `add_*` call checks that the entities it references exist and
//! records itself as their parent. Planar faces derive their plane from the
//! boundary; curved primitives come from [`make_cylinder`].

use std::f64::consts::TAU;

use nalgebra::{Point3, Vector3};

use crate::arena::*;
use crate::error::{Error, Result};
use crate::geometry::{CurveGeometry, SurfaceGeometry};
use crate::kernel::{ParamRange, SurfaceDomain, TriangleMesh};
use crate::keys::*;

impl TopologyArena {
    fn point_of(&self, vertex: VertexKey) -> Result<Point3<f64>> {
        self.vertex_point(vertex).ok_or(Error::NotFound(vertex.into()))
    }

    fn require<K: Into<TopologyKey> + Copy>(&self, keys: &[K]) -> Result<()> {
        match keys.iter().map(|&k| -> TopologyKey { k.into() }).find(|&k| !self.contains(k)) {
            Some(missing) => Err(Error::NotFound(missing)),
            None => Ok(()),
        }
    }

    /// Straight edge, parameterised by distance from `start`.
    ///
    /// Coincident endpoints give an edge with no curve.
    pub fn add_edge(&mut self, start: VertexKey, end: VertexKey) -> Result<EdgeKey> {
        let from = self.point_of(start)?;
        let span = self.point_of(end)? - from;
        let curve = CurveGeometry::line(from, span);
        let last = if curve.is_some() { span.norm() } else { 0.0 };
        self.add_edge_with_curve(start, end, curve, ParamRange::new(0.0, last))
    }

    pub fn add_edge_with_curve(
        &mut self,
        start: VertexKey,
        end: VertexKey,
        curve: Option<CurveGeometry>,
        range: ParamRange,
    ) -> Result<EdgeKey> {
        self.require(&[start, end])?;
        let key = self.edges.insert(EdgeData {
            start,
            end,
            curve,
            range,
        });
        self.link(start, key);
        self.link(end, key);
        Ok(key)
    }

    /// Full circle through `vertex`, centred on `center` in the plane with
    /// the given normal. The edge starts and ends on `vertex`.
    pub fn add_circle_edge(
        &mut self,
        vertex: VertexKey,
        center: Point3<f64>,
        normal: Vector3<f64>,
    ) -> Result<EdgeKey> {
        let radial = self.point_of(vertex)? - center;
        let curve = CurveGeometry::circle(center, normal, radial, radial.norm())
            .ok_or_else(|| Error::DegenerateCurve("circle through its own center".into()))?;
        self.add_edge_with_curve(vertex, vertex, Some(curve), ParamRange::new(0.0, TAU))
    }

    /// Counter-clockwise arc (about `normal`) from `start` to `end`.
    pub fn add_arc_edge(
        &mut self,
        start: VertexKey,
        end: VertexKey,
        center: Point3<f64>,
        normal: Vector3<f64>,
    ) -> Result<EdgeKey> {
        let from = self.point_of(start)? - center;
        let to = self.point_of(end)?;
        let radius = from.norm();
        let other = (to - center).norm();
        if (radius - other).abs() > 1e-6 * radius.max(1.0) {
            return Err(Error::DegenerateCurve(format!(
                "arc endpoints at different radii ({radius} vs {other})"
            )));
        }

        let curve = CurveGeometry::circle(center, normal, from, radius)
            .ok_or_else(|| Error::DegenerateCurve("arc through its own center".into()))?;
        // sweep in (0, 2π]
        let sweep = match curve.parameter_of(&to) {
            t if t <= 1e-12 => t + TAU,
            t => t,
        };
        self.add_edge_with_curve(start, end, Some(curve), ParamRange::new(0.0, sweep))
    }

    /// Wire from edges listed in walk order. Orientations are inferred from
    /// shared endpoints.
    pub fn add_wire(&mut self, edges: &[EdgeKey]) -> Result<WireKey> {
        self.require(edges)?;
        let orientations = self.chain_orientations(edges)?;
        Ok(self.insert_wire(edges, orientations))
    }

    /// Wire with explicit orientations. No connectivity check, so the stored
    /// order may differ from walk order.
    pub fn add_wire_with_orientations(
        &mut self,
        edges: &[EdgeKey],
        orientations: &[bool],
    ) -> Result<WireKey> {
        if edges.is_empty() {
            return Err(Error::EmptyWire);
        }
        if edges.len() != orientations.len() {
            return Err(Error::OrientationMismatch {
                edges: edges.len(),
                orientations: orientations.len(),
            });
        }
        self.require(edges)?;
        Ok(self.insert_wire(edges, orientations.to_vec()))
    }

    fn chain_orientations(&self, edges: &[EdgeKey]) -> Result<Vec<bool>> {
        let ends = |k: EdgeKey| (self.edges[k].start, self.edges[k].end);
        let Some((&first, rest)) = edges.split_first() else {
            return Err(Error::EmptyWire);
        };

        let (s0, e0) = ends(first);
        let first_forward = match rest.first().map(|&k| ends(k)) {
            None => true,
            Some((s1, e1)) if e0 == s1 || e0 == e1 => true,
            Some((s1, e1)) if s0 == s1 || s0 == e1 => false,
            Some(_) => return Err(Error::DisconnectedWire(0, 1)),
        };

        let mut orientations = Vec::with_capacity(edges.len());
        orientations.push(first_forward);
        let mut tip = if first_forward { e0 } else { s0 };
        for (i, &k) in rest.iter().enumerate() {
            let (s, e) = ends(k);
            let forward = match tip {
                t if t == s => true,
                t if t == e => false,
                _ => return Err(Error::DisconnectedWire(i, i + 1)),
            };
            tip = if forward { e } else { s };
            orientations.push(forward);
        }
        Ok(orientations)
    }

    fn insert_wire(&mut self, edges: &[EdgeKey], orientations: Vec<bool>) -> WireKey {
        let key = self.wires.insert(WireData {
            edges: edges.to_vec(),
            orientations,
        });
        for &edge in edges {
            self.link(edge, key);
        }
        key
    }

    pub fn add_face(&mut self, outer_wire: WireKey) -> Result<FaceKey> {
        self.add_face_with_holes(outer_wire, &[])
    }

    /// Planar face. A boundary that spans no plane (collinear points) gives a
    /// face without a surface.
    pub fn add_face_with_holes(
        &mut self,
        outer_wire: WireKey,
        inner_wires: &[WireKey],
    ) -> Result<FaceKey> {
        self.check_boundary(outer_wire, inner_wires)?;
        let (surface, domain) = self.planar_surface_for(outer_wire).unzip();
        Ok(self.insert_face(outer_wire, inner_wires, surface, domain))
    }

    /// Face on a given surface, trimmed to `domain`.
    pub fn add_face_with_surface(
        &mut self,
        outer_wire: WireKey,
        inner_wires: &[WireKey],
        surface: SurfaceGeometry,
        domain: SurfaceDomain,
    ) -> Result<FaceKey> {
        self.check_boundary(outer_wire, inner_wires)?;
        Ok(self.insert_face(outer_wire, inner_wires, Some(surface), Some(domain)))
    }

    /// Attaches a tessellation that [`triangulate_face`](Self::triangulate_face)
    /// returns instead of clipping the boundary.
    pub fn set_face_mesh(&mut self, face: FaceKey, mesh: TriangleMesh) -> Result<()> {
        let data = self.faces.get_mut(face).ok_or(Error::NotFound(face.into()))?;
        data.mesh = Some(mesh);
        Ok(())
    }

    fn check_boundary(&self, outer_wire: WireKey, inner_wires: &[WireKey]) -> Result<()> {
        self.require(&[outer_wire])?;
        if !self.wire_is_closed(outer_wire) {
            return Err(Error::OpenWire);
        }
        self.require(inner_wires)
    }

    fn insert_face(
        &mut self,
        outer_wire: WireKey,
        inner_wires: &[WireKey],
        surface: Option<SurfaceGeometry>,
        domain: Option<SurfaceDomain>,
    ) -> FaceKey {
        let key = self.faces.insert(FaceData {
            outer_wire,
            inner_wires: inner_wires.to_vec(),
            surface,
            domain,
            mesh: None,
        });
        for &wire in std::iter::once(&outer_wire).chain(inner_wires) {
            self.link(wire, key);
        }
        key
    }

    pub fn add_shell(&mut self, faces: &[FaceKey]) -> Result<ShellKey> {
        if faces.is_empty() {
            return Err(Error::EmptyShell);
        }
        self.require(faces)?;
        let key = self.shells.insert(ShellData {
            faces: faces.to_vec(),
        });
        for &face in faces {
            self.link(face, key);
        }
        Ok(key)
    }

    pub fn add_solid(&mut self, outer_shell: ShellKey) -> Result<SolidKey> {
        self.add_solid_with_voids(outer_shell, &[])
    }

    pub fn add_solid_with_voids(
        &mut self,
        outer_shell: ShellKey,
        inner_shells: &[ShellKey],
    ) -> Result<SolidKey> {
        self.require(&[outer_shell])?;
        self.require(inner_shells)?;
        let key = self.solids.insert(SolidData {
            outer_shell,
            inner_shells: inner_shells.to_vec(),
        });
        for &shell in std::iter::once(&outer_shell).chain(inner_shells) {
            self.link(shell, key);
        }
        Ok(key)
    }

    pub fn add_compsolid(&mut self, solids: &[SolidKey]) -> Result<CompSolidKey> {
        if solids.is_empty() {
            return Err(Error::EmptyCompSolid);
        }
        self.require(solids)?;
        let key = self.compsolids.insert(CompSolidData {
            solids: solids.to_vec(),
        });
        for &solid in solids {
            self.link(solid, key);
        }
        Ok(key)
    }

    /// Groups entity uses. Empty and nested compounds are allowed.
    pub fn add_compound(&mut self, children: &[ShapeRef]) -> Result<CompoundKey> {
        let members: Vec<TopologyKey> = children.iter().map(|c| c.key).collect();
        self.require(&members)?;
        let key = self.compounds.insert(CompoundData {
            children: children.to_vec(),
        });
        for member in members {
            self.link(member, key);
        }
        Ok(key)
    }
}

/// Planar four-sided face over `corners`, walked in the given order.
pub fn make_quad(model: &mut TopologyArena, corners: [VertexKey; 4]) -> Result<FaceKey> {
    let mut edges = [EdgeKey::default(); 4];
    for i in 0..4 {
        edges[i] = model.add_edge(corners[i], corners[(i + 1) % 4])?;
    }
    let wire = model.add_wire(&edges)?;
    model.add_face(wire)
}

/// Axis-aligned box: 8 vertices, 12 edges, 6 faces, every edge shared by two
/// faces with opposite orientations. Face normals point outward, in the
/// order -Z, +Z, -Y, +X, +Y, -X.
pub fn make_box(model: &mut TopologyArena, origin: [f64; 3], size: [f64; 3]) -> Result<SolidKey> {
    // corner bit 0 -> x, bit 1 -> y, bit 2 -> z, ordered around each ring
    const RING: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
    let mut corners = Vec::with_capacity(8);
    for level in [0.0, 1.0] {
        for (fx, fy) in RING {
            corners.push(model.add_vertex(
                origin[0] + fx * size[0],
                origin[1] + fy * size[1],
                origin[2] + level * size[2],
            ));
        }
    }

    // 0..4 bottom ring, 4..8 top ring, 8..12 uprights
    let mut edges = Vec::with_capacity(12);
    for ring in [0, 4] {
        for i in 0..4 {
            edges.push(model.add_edge(corners[ring + i], corners[ring + (i + 1) % 4])?);
        }
    }
    for i in 0..4 {
        edges.push(model.add_edge(corners[i], corners[i + 4])?);
    }

    const LOOPS: [[usize; 4]; 6] = [
        [3, 2, 1, 0],
        [4, 5, 6, 7],
        [0, 9, 4, 8],
        [1, 10, 5, 9],
        [2, 11, 6, 10],
        [3, 8, 7, 11],
    ];
    let faces = LOOPS
        .iter()
        .map(|lp| {
            let wire = model.add_wire(&lp.map(|i| edges[i]))?;
            model.add_face(wire)
        })
        .collect::<Result<Vec<_>>>()?;

    let shell = model.add_shell(&faces)?;
    model.add_solid(shell)
}

/// Right circular cylinder on `base_center`, axis +Z.
///
/// Two vertices and three edges: both rims plus one seam line. The lateral
/// face sits on a cylindrical surface over `[0, 2π] × [0, height]` and walks
/// the seam once in each direction.
pub fn make_cylinder(
    model: &mut TopologyArena,
    base_center: [f64; 3],
    radius: f64,
    height: f64,
) -> Result<SolidKey> {
    let base = Point3::from(base_center);
    let top = base + Vector3::z() * height;
    let rim_offset = Vector3::x() * radius;

    let low = model.add_vertex(base.x + rim_offset.x, base.y, base.z);
    let high = model.add_vertex(top.x + rim_offset.x, top.y, top.z);
    let low_rim = model.add_circle_edge(low, base, Vector3::z())?;
    let high_rim = model.add_circle_edge(high, top, Vector3::z())?;
    let seam = model.add_edge(low, high)?;

    let surface = SurfaceGeometry::cylinder(base, Vector3::z(), Vector3::x(), radius)
        .ok_or_else(|| Error::DegenerateCurve(format!("cylinder radius {radius}")))?;
    let domain = SurfaceDomain::new(ParamRange::new(0.0, TAU), ParamRange::new(0.0, height));
    let side_loop = model.add_wire_with_orientations(
        &[low_rim, seam, high_rim, seam],
        &[true, true, false, false],
    )?;
    let side = model.add_face_with_surface(side_loop, &[], surface, domain)?;

    let bottom_loop = model.add_wire_with_orientations(&[low_rim], &[false])?;
    let bottom = model.add_face(bottom_loop)?;
    let top_loop = model.add_wire(&[high_rim])?;
    let cap = model.add_face(top_loop)?;

    let shell = model.add_shell(&[side, bottom, cap])?;
    model.add_solid(shell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn corners(model: &mut TopologyArena, pts: [[f64; 3]; 4]) -> [VertexKey; 4] {
        pts.map(|[x, y, z]| model.add_vertex(x, y, z))
    }

    fn unit_square(model: &mut TopologyArena) -> [VertexKey; 4] {
        corners(
            model,
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        )
    }

    #[test]
    fn line_edge_is_parameterised_by_length() {
        let mut model = TopologyArena::new();
        let a = model.add_vertex(0.0, 0.0, 0.0);
        let b = model.add_vertex(3.0, 4.0, 0.0);
        let edge = model.add_edge(a, b).unwrap();

        let data = model.edge(edge).unwrap();
        assert_eq!((data.start, data.end), (a, b));
        assert_relative_eq!(data.range.last, 5.0);

        let end = model.edge_point(edge, 5.0).unwrap();
        assert_relative_eq!(end.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(end.y, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_length_edge_has_no_curve() {
        let mut model = TopologyArena::new();
        let a = model.add_vertex(1.0, 1.0, 1.0);
        let b = model.add_vertex(1.0, 1.0, 1.0);
        let edge = model.add_edge(a, b).unwrap();
        assert!(model.edge(edge).unwrap().curve.is_none());
    }

    #[test]
    fn stale_vertex_key_is_rejected() {
        let mut model = TopologyArena::new();
        let a = model.add_vertex(0.0, 0.0, 0.0);
        let gone = model.add_vertex(9.0, 9.0, 9.0);
        model.vertices.remove(gone);

        assert!(matches!(model.add_edge(a, gone), Err(Error::NotFound(_))));
    }

    #[test]
    fn circle_edge_closes_on_its_vertex() {
        let mut model = TopologyArena::new();
        let v = model.add_vertex(2.0, 0.0, 0.0);
        let edge = model.add_circle_edge(v, Point3::origin(), Vector3::z()).unwrap();

        assert!(model.edge(edge).unwrap().is_closed());
        assert_relative_eq!(model.edge_length(edge).unwrap(), 4.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn quarter_arc() {
        let mut model = TopologyArena::new();
        let a = model.add_vertex(1.0, 0.0, 0.0);
        let b = model.add_vertex(0.0, 1.0, 0.0);
        let edge = model.add_arc_edge(a, b, Point3::origin(), Vector3::z()).unwrap();

        let range = model.edge(edge).unwrap().range;
        assert_relative_eq!(range.last, FRAC_PI_2, epsilon = 1e-12);
        let mid = model.edge_point(edge, range.mid()).unwrap();
        assert_relative_eq!(mid.x, mid.y, epsilon = 1e-12);

        let far = model.add_vertex(0.0, 2.0, 0.0);
        assert!(matches!(
            model.add_arc_edge(a, far, Point3::origin(), Vector3::z()),
            Err(Error::DegenerateCurve(_))
        ));
    }

    #[test]
    fn wire_orientations_follow_shared_endpoints() {
        let mut model = TopologyArena::new();
        let [a, b, c, _] = unit_square(&mut model);
        let ab = model.add_edge(a, b).unwrap();
        let cb = model.add_edge(c, b).unwrap();
        let ca = model.add_edge(c, a).unwrap();

        let wire = model.add_wire(&[ab, cb, ca]).unwrap();
        assert_eq!(model.wire(wire).unwrap().orientations, vec![true, false, true]);
        assert!(model.wire_is_closed(wire));
    }

    #[test]
    fn first_edge_may_run_backwards() {
        let mut model = TopologyArena::new();
        let [a, b, c, _] = unit_square(&mut model);
        let ba = model.add_edge(b, a).unwrap();
        let bc = model.add_edge(b, c).unwrap();

        let wire = model.add_wire(&[ba, bc]).unwrap();
        assert_eq!(model.wire(wire).unwrap().orientations, vec![false, true]);
    }

    #[test]
    fn wire_rejects_empty_and_gaps() {
        let mut model = TopologyArena::new();
        let [a, b, c, d] = unit_square(&mut model);
        let ab = model.add_edge(a, b).unwrap();
        let cd = model.add_edge(c, d).unwrap();

        assert!(matches!(model.add_wire(&[]), Err(Error::EmptyWire)));
        assert!(matches!(model.add_wire(&[ab, cd]), Err(Error::DisconnectedWire(0, 1))));
    }

    #[test]
    fn explicit_orientations_keep_stored_order() {
        let mut model = TopologyArena::new();
        let [a, b, c, _] = unit_square(&mut model);
        let ab = model.add_edge(a, b).unwrap();
        let bc = model.add_edge(b, c).unwrap();
        let ca = model.add_edge(c, a).unwrap();

        let wire = model
            .add_wire_with_orientations(&[ab, ca, bc], &[true, true, true])
            .unwrap();
        assert_eq!(model.wire(wire).unwrap().edges, vec![ab, ca, bc]);
        assert!(model.wire_is_closed(wire));

        assert!(matches!(
            model.add_wire_with_orientations(&[ab, bc], &[true]),
            Err(Error::OrientationMismatch { edges: 2, orientations: 1 })
        ));
    }

    #[test]
    fn face_needs_closed_boundary() {
        let mut model = TopologyArena::new();
        let [a, b, c, _] = unit_square(&mut model);
        let ab = model.add_edge(a, b).unwrap();
        let bc = model.add_edge(b, c).unwrap();
        let open = model.add_wire(&[ab, bc]).unwrap();

        assert!(matches!(model.add_face(open), Err(Error::OpenWire)));
    }

    #[test]
    fn planar_face_gets_a_plane() {
        let mut model = TopologyArena::new();
        let square = unit_square(&mut model);
        let face = make_quad(&mut model, square).unwrap();

        let data = model.face(face).unwrap();
        assert!(matches!(data.surface, Some(SurfaceGeometry::Plane { .. })));
        assert!(data.inner_wires.is_empty());
        assert_eq!(model.edge_count(), 4);
        assert!(model.has_parent(data.outer_wire.into()));
    }

    #[test]
    fn face_with_hole_triangulates_both_loops() {
        let mut model = TopologyArena::new();
        let outer = corners(
            &mut model,
            [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 10.0, 0.0], [0.0, 10.0, 0.0]],
        );
        let outer_edges: Vec<_> = (0..4)
            .map(|i| model.add_edge(outer[i], outer[(i + 1) % 4]).unwrap())
            .collect();
        let outer_wire = model.add_wire(&outer_edges).unwrap();

        let h = [
            model.add_vertex(3.0, 3.0, 0.0),
            model.add_vertex(7.0, 3.0, 0.0),
            model.add_vertex(5.0, 7.0, 0.0),
        ];
        let hole_edges: Vec<_> = (0..3)
            .map(|i| model.add_edge(h[i], h[(i + 1) % 3]).unwrap())
            .collect();
        let hole = model.add_wire(&hole_edges).unwrap();

        let face = model.add_face_with_holes(outer_wire, &[hole]).unwrap();
        assert_eq!(model.face(face).unwrap().inner_wires, vec![hole]);
        assert_eq!(model.triangulate_face(face, 0.01).unwrap().vertex_count(), 7);
    }

    #[test]
    fn attached_mesh_replaces_triangulation() {
        let mut model = TopologyArena::new();
        let square = unit_square(&mut model);
        let face = make_quad(&mut model, square).unwrap();

        let mesh = TriangleMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            triangles: vec![[0, 1, 2]],
        };
        model.set_face_mesh(face, mesh.clone()).unwrap();
        assert_eq!(model.triangulate_face(face, 0.01), Some(mesh));
    }

    #[test]
    fn empty_containers_are_rejected() {
        let mut model = TopologyArena::new();
        assert!(matches!(model.add_shell(&[]), Err(Error::EmptyShell)));
        assert!(matches!(model.add_compsolid(&[]), Err(Error::EmptyCompSolid)));
    }

    #[test]
    fn box_is_closed_with_outward_normals() {
        let mut model = TopologyArena::new();
        let solid = make_box(&mut model, [0.0; 3], [2.0; 3]).unwrap();

        assert_eq!(
            (model.vertex_count(), model.edge_count(), model.wire_count(), model.face_count()),
            (8, 12, 6, 6)
        );
        let shell = model.solid(solid).unwrap().outer_shell;
        assert!(model.shell_is_closed(shell));

        let outward = [
            [0.0, 0.0, -1.0],
            [0.0, 0.0, 1.0],
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
        ];
        for (&face, n) in model.shell(shell).unwrap().faces.iter().zip(outward) {
            let normal = model.face_normal(face).unwrap();
            assert_relative_eq!(normal.x, n[0], epsilon = 1e-12);
            assert_relative_eq!(normal.y, n[1], epsilon = 1e-12);
            assert_relative_eq!(normal.z, n[2], epsilon = 1e-12);
        }
    }

    #[test]
    fn cylinder_layout() {
        let mut model = TopologyArena::new();
        let solid = make_cylinder(&mut model, [0.0; 3], 1.0, 3.0).unwrap();
        assert_eq!((model.vertex_count(), model.edge_count(), model.face_count()), (2, 3, 3));

        let shell = model.solid(solid).unwrap().outer_shell;
        assert!(model.shell_is_closed(shell));

        let faces = &model.shell(shell).unwrap().faces;
        let side = model.face(faces[0]).unwrap();
        assert!(matches!(side.surface, Some(SurfaceGeometry::Cylinder { .. })));
        assert_relative_eq!(side.domain.unwrap().v.last, 3.0);
        assert_relative_eq!(model.face_normal(faces[1]).unwrap().z, -1.0, epsilon = 1e-9);
        assert_relative_eq!(model.face_normal(faces[2]).unwrap().z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn a_face_may_bound_two_solids() {
        let mut model = TopologyArena::new();
        let wall = corners(
            &mut model,
            [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
        );
        let shared = make_quad(&mut model, wall).unwrap();

        let left = model.add_shell(&[shared]).unwrap();
        let right = model.add_shell(&[shared]).unwrap();
        let a = model.add_solid(left).unwrap();
        let b = model.add_solid(right).unwrap();
        assert_eq!(model.parents(shared.into()).count(), 2);

        let pair = model.add_compsolid(&[a, b]).unwrap();
        assert_eq!(model.compsolid(pair).unwrap().solids, vec![a, b]);
    }

    #[test]
    fn compounds_nest_and_may_be_empty() {
        let mut model = TopologyArena::new();
        let empty = model.add_compound(&[]).unwrap();
        let v = model.add_vertex(0.0, 0.0, 0.0);
        let outer = model
            .add_compound(&[ShapeRef::new(empty), ShapeRef::new(v)])
            .unwrap();

        assert_eq!(model.compound(outer).unwrap().children.len(), 2);
        assert!(model.parents(v.into()).any(|p| p == TopologyKey::from(outer)));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve and surface geometry carried by arena entities, and the geometric
//! queries built on it: evaluation, boundary discretization, face normals
//! and triangulation.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::arena::TopologyArena;
use crate::kernel::{ParamRange, SurfaceDomain, SurfaceType, TriangleMesh};
use crate::keys::*;

/// Deflection used when the arena discretizes boundaries for its own
/// bookkeeping (planar surface derivation, normals).
pub(crate) const BOOKKEEPING_DEFLECTION: f64 = 1e-3;

#[inline]
pub(crate) fn to_point(a: [f64; 3]) -> Point3<f64> {
    Point3::new(a[0], a[1], a[2])
}

#[inline]
pub(crate) fn to_vector(a: [f64; 3]) -> Vector3<f64> {
    Vector3::new(a[0], a[1], a[2])
}

#[inline]
pub(crate) fn to_array(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Parametric curve underlying an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveGeometry {
    /// `origin + t * direction`, `direction` of unit length.
    Line {
        origin: [f64; 3],
        direction: [f64; 3],
    },
    /// `center + radius * (cos t * x_axis + sin t * (normal × x_axis))`.
    Circle {
        center: [f64; 3],
        normal: [f64; 3],
        x_axis: [f64; 3],
        radius: f64,
    },
}

impl CurveGeometry {
    /// Line through `origin` along `direction` (normalized here).
    pub fn line(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let dir = direction.try_normalize(1e-15)?;
        Some(CurveGeometry::Line {
            origin: to_array(&origin),
            direction: [dir.x, dir.y, dir.z],
        })
    }

    /// Circle around `center` in the plane with normal `normal`; parameter 0
    /// lies in the direction of `x_axis`.
    pub fn circle(
        center: Point3<f64>,
        normal: Vector3<f64>,
        x_axis: Vector3<f64>,
        radius: f64,
    ) -> Option<Self> {
        let n = normal.try_normalize(1e-15)?;
        let x = (x_axis - n * n.dot(&x_axis)).try_normalize(1e-15)?;
        if !(radius > 0.0) {
            return None;
        }
        Some(CurveGeometry::Circle {
            center: to_array(&center),
            normal: [n.x, n.y, n.z],
            x_axis: [x.x, x.y, x.z],
            radius,
        })
    }

    /// Evaluates the curve at parameter `t`.
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        match self {
            CurveGeometry::Line { origin, direction } => {
                to_point(*origin) + to_vector(*direction) * t
            }
            CurveGeometry::Circle {
                center,
                normal,
                x_axis,
                radius,
            } => {
                let x = to_vector(*x_axis);
                let y = to_vector(*normal).cross(&x);
                to_point(*center) + (x * t.cos() + y * t.sin()) * *radius
            }
        }
    }

    /// Parameter of the orthogonal projection of `p` onto the curve. Circle
    /// parameters lie in `[0, 2π)`.
    pub fn parameter_of(&self, p: &Point3<f64>) -> f64 {
        match self {
            CurveGeometry::Line { origin, direction } => {
                (p - to_point(*origin)).dot(&to_vector(*direction))
            }
            CurveGeometry::Circle {
                center,
                normal,
                x_axis,
                ..
            } => {
                let x = to_vector(*x_axis);
                let y = to_vector(*normal).cross(&x);
                let d = p - to_point(*center);
                d.dot(&y).atan2(d.dot(&x)).rem_euclid(2.0 * PI)
            }
        }
    }

    /// Length of the curve over `range`.
    pub fn length(&self, range: &ParamRange) -> f64 {
        match self {
            CurveGeometry::Line { .. } => range.span().abs(),
            CurveGeometry::Circle { radius, .. } => radius * range.span().abs(),
        }
    }

    /// Number of segments needed to keep the chordal error below `deflection`.
    fn segments(&self, range: &ParamRange, deflection: f64) -> usize {
        match self {
            CurveGeometry::Line { .. } => 1,
            CurveGeometry::Circle { radius, .. } => {
                angular_segments(*radius, range.span().abs(), deflection)
            }
        }
    }
}

/// Segment count for an arc of `radius` sweeping `span` radians so the
/// chordal error stays below `deflection`.
fn angular_segments(radius: f64, span: f64, deflection: f64) -> usize {
    if deflection <= 0.0 || deflection >= radius {
        return ((span / FRAC_PI_2).ceil() as usize).max(4);
    }
    let step = 2.0 * (1.0 - deflection / radius).acos();
    ((span / step).ceil() as usize).clamp(4, 512)
}

/// Parametric surface underlying a face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceGeometry {
    /// `origin + u * x_axis + v * y_axis` with orthonormal axes.
    Plane {
        origin: [f64; 3],
        x_axis: [f64; 3],
        y_axis: [f64; 3],
    },
    /// `origin + radius * (cos u * x_axis + sin u * (axis × x_axis)) + v * axis`.
    Cylinder {
        origin: [f64; 3],
        axis: [f64; 3],
        x_axis: [f64; 3],
        radius: f64,
    },
    /// `center + radius * (cos v cos u, cos v sin u, sin v)`.
    Sphere { center: [f64; 3], radius: f64 },
}

impl SurfaceGeometry {
    /// Plane through `origin` spanned by `x_axis` and `normal × x_axis`.
    pub fn plane(origin: Point3<f64>, normal: Vector3<f64>, x_axis: Vector3<f64>) -> Option<Self> {
        let n = normal.try_normalize(1e-15)?;
        let x = (x_axis - n * n.dot(&x_axis)).try_normalize(1e-15)?;
        let y = n.cross(&x);
        Some(SurfaceGeometry::Plane {
            origin: to_array(&origin),
            x_axis: [x.x, x.y, x.z],
            y_axis: [y.x, y.y, y.z],
        })
    }

    /// Cylinder of `radius` around the line through `origin` along `axis`.
    pub fn cylinder(
        origin: Point3<f64>,
        axis: Vector3<f64>,
        x_axis: Vector3<f64>,
        radius: f64,
    ) -> Option<Self> {
        let a = axis.try_normalize(1e-15)?;
        let x = (x_axis - a * a.dot(&x_axis)).try_normalize(1e-15)?;
        if !(radius > 0.0) {
            return None;
        }
        Some(SurfaceGeometry::Cylinder {
            origin: to_array(&origin),
            axis: [a.x, a.y, a.z],
            x_axis: [x.x, x.y, x.z],
            radius,
        })
    }

    /// Evaluates the surface at `(u, v)`.
    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        match self {
            SurfaceGeometry::Plane {
                origin,
                x_axis,
                y_axis,
            } => to_point(*origin) + to_vector(*x_axis) * u + to_vector(*y_axis) * v,
            SurfaceGeometry::Cylinder {
                origin,
                axis,
                x_axis,
                radius,
            } => {
                let a = to_vector(*axis);
                let x = to_vector(*x_axis);
                let y = a.cross(&x);
                to_point(*origin) + (x * u.cos() + y * u.sin()) * *radius + a * v
            }
            SurfaceGeometry::Sphere { center, radius } => {
                let dir = Vector3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin());
                to_point(*center) + dir * *radius
            }
        }
    }

    pub fn surface_type(&self) -> SurfaceType {
        match self {
            SurfaceGeometry::Plane { .. } => SurfaceType::Plane,
            SurfaceGeometry::Cylinder { .. } => SurfaceType::Cylinder,
            SurfaceGeometry::Sphere { .. } => SurfaceType::Sphere,
        }
    }

    /// Full periodic domain for closed surfaces.
    pub fn natural_domain(&self) -> Option<SurfaceDomain> {
        match self {
            SurfaceGeometry::Plane { .. } | SurfaceGeometry::Cylinder { .. } => None,
            SurfaceGeometry::Sphere { .. } => Some(SurfaceDomain::new(
                ParamRange::new(0.0, 2.0 * PI),
                ParamRange::new(-FRAC_PI_2, FRAC_PI_2),
            )),
        }
    }
}

impl SurfaceGeometry {
    /// Grid segment counts over `domain` for the given deflection. Planes
    /// need none.
    fn grid_segments(&self, domain: &SurfaceDomain, deflection: f64) -> Option<(usize, usize)> {
        match self {
            SurfaceGeometry::Plane { .. } => None,
            SurfaceGeometry::Cylinder { radius, .. } => Some((
                angular_segments(*radius, domain.u.span().abs(), deflection),
                1,
            )),
            SurfaceGeometry::Sphere { radius, .. } => Some((
                angular_segments(*radius, domain.u.span().abs(), deflection),
                angular_segments(*radius, domain.v.span().abs(), deflection),
            )),
        }
    }

    /// Triangulates the untrimmed surface over `domain` on a regular
    /// parameter grid.
    fn grid_mesh(&self, domain: &SurfaceDomain, deflection: f64) -> Option<TriangleMesh> {
        let (nu, nv) = self.grid_segments(domain, deflection)?;

        let mut positions = Vec::with_capacity((nu + 1) * (nv + 1));
        for j in 0..=nv {
            let v = domain.v.sample(j, nv + 1);
            for i in 0..=nu {
                let u = domain.u.sample(i, nu + 1);
                positions.push(to_array(&self.point_at(u, v)));
            }
        }

        let row = (nu + 1) as u32;
        let mut triangles = Vec::with_capacity(nu * nv * 2);
        for j in 0..nv as u32 {
            for i in 0..nu as u32 {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                triangles.push([a, b, d]);
                triangles.push([a, d, c]);
            }
        }

        Some(TriangleMesh {
            positions,
            triangles,
        })
    }
}

/// Newell's method polygon normal (unit length), `None` if degenerate.
pub(crate) fn newell_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }

    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    let n = points.len();

    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }

    let len = normal.norm();
    if len < 1e-15 {
        return None; // degenerate polygon
    }

    Some(normal / len)
}

/// Appends a boundary ring: projected 2D coordinates for earcut, 3D positions
/// for the mesh.
fn push_ring(
    ring: &[Point3<f64>],
    (ax_u, ax_v): (usize, usize),
    coords_2d: &mut Vec<f64>,
    positions: &mut Vec<[f64; 3]>,
) {
    for p in ring {
        let c = to_array(p);
        coords_2d.push(c[ax_u]);
        coords_2d.push(c[ax_v]);
        positions.push(c);
    }
}

impl TopologyArena {
    /// Returns the 3D position of a vertex as a nalgebra Point3.
    pub fn vertex_point(&self, key: VertexKey) -> Option<Point3<f64>> {
        self.vertices
            .get(key)
            .map(|v| Point3::new(v.x, v.y, v.z))
    }

    /// Evaluates the curve of an edge at parameter `t`.
    pub fn edge_point(&self, key: EdgeKey, t: f64) -> Option<Point3<f64>> {
        let edge = self.edges.get(key)?;
        edge.curve.as_ref().map(|c| c.point_at(t))
    }

    /// Arc length of an edge's curve over its parameter range.
    pub fn edge_length(&self, key: EdgeKey) -> Option<f64> {
        let edge = self.edges.get(key)?;
        edge.curve.as_ref().map(|c| c.length(&edge.range))
    }

    /// Discretizes a wire into a closed polygon following the stored edge
    /// order and orientations. The closing point is not repeated.
    pub fn wire_polyline(&self, key: WireKey, deflection: f64) -> Option<Vec<Point3<f64>>> {
        let wire = self.wires.get(key)?;
        let mut points = Vec::with_capacity(wire.edges.len() * 2);

        for (i, &ek) in wire.edges.iter().enumerate() {
            let edge = self.edges.get(ek)?;
            let forward = wire.orientations[i];
            let start = if forward { edge.start } else { edge.end };

            match &edge.curve {
                Some(curve) => {
                    let n = curve.segments(&edge.range, deflection);
                    for s in 0..n {
                        let s = if forward { s } else { n - s };
                        points.push(curve.point_at(edge.range.sample(s, n + 1)));
                    }
                }
                None => points.push(self.vertex_point(start)?),
            }
        }

        Some(points)
    }

    /// Computes the outer-boundary normal of a face using Newell's method.
    pub fn face_normal(&self, key: FaceKey) -> Option<Vector3<f64>> {
        let face = self.faces.get(key)?;
        let points = self.wire_polyline(face.outer_wire, BOOKKEEPING_DEFLECTION)?;
        newell_normal(&points)
    }

    /// Derives a plane and its bounding UV domain from a closed boundary wire.
    pub(crate) fn planar_surface_for(&self, wire: WireKey) -> Option<(SurfaceGeometry, SurfaceDomain)> {
        let points = self.wire_polyline(wire, BOOKKEEPING_DEFLECTION)?;
        let normal = newell_normal(&points)?;
        let origin = points[0];

        let x_dir = points
            .iter()
            .skip(1)
            .map(|p| p - origin)
            .find(|d| (d - normal * normal.dot(d)).norm() > 1e-12)?;
        let plane = SurfaceGeometry::plane(origin, normal, x_dir)?;

        let (x, y) = match &plane {
            SurfaceGeometry::Plane { x_axis, y_axis, .. } => (to_vector(*x_axis), to_vector(*y_axis)),
            _ => return None,
        };

        let (mut u0, mut u1, mut v0, mut v1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &points {
            let d = p - origin;
            let (u, v) = (d.dot(&x), d.dot(&y));
            u0 = u0.min(u);
            u1 = u1.max(u);
            v0 = v0.min(v);
            v1 = v1.max(v);
        }

        Some((
            plane,
            SurfaceDomain::new(ParamRange::new(u0, u1), ParamRange::new(v0, v1)),
        ))
    }

    /// Triangulates a face.
    ///
    /// An attached mesh is returned as is. Curved surfaces are meshed on a
    /// grid over their parameter domain. Planar faces have their boundary
    /// wires discretized at `deflection`, projected onto the dominant plane
    /// and ear-clipped (holes supported).
    pub fn triangulate_face(&self, key: FaceKey, deflection: f64) -> Option<TriangleMesh> {
        let face = self.faces.get(key)?;
        if let Some(mesh) = &face.mesh {
            return Some(mesh.clone());
        }

        // Curved surfaces are meshed over their parameter domain
        if let (Some(surface), Some(domain)) = (&face.surface, &face.domain) {
            if let Some(mesh) = surface.grid_mesh(domain, deflection) {
                return Some(mesh);
            }
        }

        let outer = self.wire_polyline(face.outer_wire, deflection)?;
        if outer.len() < 3 {
            return None;
        }

        let normal = newell_normal(&outer)?;

        // Determine dominant axis for 2D projection
        let abs_n = Vector3::new(normal.x.abs(), normal.y.abs(), normal.z.abs());
        let (ax_u, ax_v) = if abs_n.z >= abs_n.x && abs_n.z >= abs_n.y {
            (0, 1) // project onto XY
        } else if abs_n.y >= abs_n.x {
            (0, 2) // project onto XZ
        } else {
            (1, 2) // project onto YZ
        };

        let mut coords_2d: Vec<f64> = Vec::new();
        let mut positions: Vec<[f64; 3]> = Vec::new();
        let axes = (ax_u, ax_v);

        push_ring(&outer, axes, &mut coords_2d, &mut positions);

        // Hole indices for earcutr
        let mut hole_indices: Vec<usize> = Vec::new();
        for &iw in &face.inner_wires {
            let hole = self.wire_polyline(iw, deflection)?;
            hole_indices.push(coords_2d.len() / 2);
            push_ring(&hole, axes, &mut coords_2d, &mut positions);
        }

        let indices = earcutr::earcut(&coords_2d, &hole_indices, 2).ok()?;

        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|c| [c[0] as u32, c[1] as u32, c[2] as u32])
            .collect();

        if triangles.is_empty() {
            return None;
        }

        Some(TriangleMesh {
            positions,
            triangles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::make_quad;
    use approx::assert_relative_eq;

    #[test]
    fn line_evaluation() {
        let line = CurveGeometry::line(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)).unwrap();
        let p = line.point_at(3.0);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 3.0);
        assert_relative_eq!(line.length(&ParamRange::new(0.0, 3.0)), 3.0);
    }

    #[test]
    fn circle_evaluation() {
        let circle = CurveGeometry::circle(
            Point3::origin(),
            Vector3::z(),
            Vector3::x(),
            2.0,
        )
        .unwrap();
        let p = circle.point_at(FRAC_PI_2);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(circle.length(&ParamRange::new(0.0, PI)), 2.0 * PI);
    }

    #[test]
    fn degenerate_geometry_rejected() {
        assert!(CurveGeometry::line(Point3::origin(), Vector3::zeros()).is_none());
        assert!(CurveGeometry::circle(Point3::origin(), Vector3::z(), Vector3::z(), 1.0).is_none());
        assert!(SurfaceGeometry::cylinder(Point3::origin(), Vector3::z(), Vector3::x(), 0.0).is_none());
    }

    #[test]
    fn cylinder_evaluation() {
        let cyl = SurfaceGeometry::cylinder(Point3::origin(), Vector3::z(), Vector3::x(), 1.0).unwrap();
        let p = cyl.point_at(0.0, 2.0);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.z, 2.0);
        assert_eq!(cyl.surface_type(), SurfaceType::Cylinder);
    }

    #[test]
    fn sphere_has_natural_domain() {
        let sphere = SurfaceGeometry::Sphere {
            center: [0.0, 0.0, 0.0],
            radius: 1.0,
        };
        let domain = sphere.natural_domain().unwrap();
        let north = sphere.point_at(domain.u.first, domain.v.last);
        assert_relative_eq!(north.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn face_normal_square() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let v2 = arena.add_vertex(1.0, 1.0, 0.0);
        let v3 = arena.add_vertex(0.0, 1.0, 0.0);
        let face = make_quad(&mut arena, [v0, v1, v2, v3]).unwrap();

        let n = arena.face_normal(face).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn planar_face_gets_surface_and_domain() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(2.0, 0.0, 0.0);
        let v2 = arena.add_vertex(2.0, 3.0, 0.0);
        let v3 = arena.add_vertex(0.0, 3.0, 0.0);
        let face = make_quad(&mut arena, [v0, v1, v2, v3]).unwrap();

        let data = arena.face(face).unwrap();
        let domain = data.domain.unwrap();
        assert_relative_eq!(domain.u.span(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(domain.v.span(), 3.0, epsilon = 1e-12);

        let surface = data.surface.as_ref().unwrap();
        let far = surface.point_at(domain.u.last, domain.v.last);
        assert_relative_eq!(far.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(far.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn triangulate_square() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let v2 = arena.add_vertex(1.0, 1.0, 0.0);
        let v3 = arena.add_vertex(0.0, 1.0, 0.0);
        let face = make_quad(&mut arena, [v0, v1, v2, v3]).unwrap();

        let mesh = arena.triangulate_face(face, 0.01).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn triangulate_square_with_hole() {
        let mut arena = TopologyArena::new();
        let ring = |arena: &mut TopologyArena, lo: f64, hi: f64| {
            let v = [
                arena.add_vertex(lo, lo, 0.0),
                arena.add_vertex(hi, lo, 0.0),
                arena.add_vertex(hi, hi, 0.0),
                arena.add_vertex(lo, hi, 0.0),
            ];
            let edges: Vec<_> = (0..4)
                .map(|i| arena.add_edge(v[i], v[(i + 1) % 4]).unwrap())
                .collect();
            arena.add_wire(&edges).unwrap()
        };
        let outer = ring(&mut arena, 0.0, 4.0);
        let hole = ring(&mut arena, 1.0, 3.0);
        let face = arena.add_face_with_holes(outer, &[hole]).unwrap();

        let mesh = arena.triangulate_face(face, 0.01).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.positions[4], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn triangulate_cylinder_on_grid() {
        let mut arena = TopologyArena::new();
        let solid = crate::construction::make_cylinder(&mut arena, [0.0; 3], 1.0, 2.0).unwrap();
        let shell = arena.solid(solid).unwrap().outer_shell;
        let lateral = arena.shell(shell).unwrap().faces[0];

        let mesh = arena.triangulate_face(lateral, 0.01).unwrap();
        assert_eq!(mesh.triangle_count(), 2 * (mesh.vertex_count() / 2 - 1));
        for p in &mesh.positions {
            assert_relative_eq!((p[0] * p[0] + p[1] * p[1]).sqrt(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn triangulate_disk_follows_deflection() {
        let mut arena = TopologyArena::new();
        let v = arena.add_vertex(1.0, 0.0, 0.0);
        let e = arena
            .add_circle_edge(v, Point3::origin(), Vector3::z())
            .unwrap();
        let w = arena.add_wire(&[e]).unwrap();
        let f = arena.add_face(w).unwrap();

        let coarse = arena.triangulate_face(f, 0.1).unwrap();
        let fine = arena.triangulate_face(f, 0.001).unwrap();
        assert!(fine.vertex_count() > coarse.vertex_count());
        assert_eq!(coarse.triangle_count(), coarse.vertex_count() - 2);
    }
}

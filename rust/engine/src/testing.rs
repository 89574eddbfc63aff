// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared unit-test fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};

use brep_index_topology::{
    make_box, make_cylinder, BrepKernel, EvalError, IdentityKey, Orientation, ParamRange,
    ShapeKind, ShapeRef, SurfaceDomain, SurfaceType, TopologyArena, TriangleMesh,
};
use nalgebra::Point3;

/// Unit cube at the origin.
pub(crate) fn unit_box() -> (TopologyArena, ShapeRef) {
    let mut arena = TopologyArena::new();
    let solid = make_box(&mut arena, [0.0; 3], [1.0; 3]).unwrap();
    (arena, ShapeRef::new(solid))
}

/// Cylinder of radius 1 and height 2 standing on the origin.
pub(crate) fn unit_cylinder() -> (TopologyArena, ShapeRef) {
    let mut arena = TopologyArena::new();
    let solid = make_cylinder(&mut arena, [0.0; 3], 1.0, 2.0).unwrap();
    (arena, ShapeRef::new(solid))
}

/// Evaluation faults injected by [`FlakyKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Every second surface evaluation fails, starting with the first.
    EveryOtherSurfacePoint,
    /// Evaluations on the first U row of the domain always fail.
    FirstRow,
    /// Faces report no parametric evaluation.
    SurfaceUnsupported,
    /// Surface evaluation and triangulation both fail.
    Everything,
    /// Faces have neither surface nor triangulation.
    NoSurfaceNoMesh,
    /// Edges carry no curve.
    NoCurves,
}

/// Wraps the reference kernel and injects evaluation failures.
pub(crate) struct FlakyKernel {
    inner: TopologyArena,
    fault: Fault,
    surface_calls: AtomicUsize,
    triangulate_calls: AtomicUsize,
}

impl FlakyKernel {
    pub(crate) fn new(inner: TopologyArena, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            surface_calls: AtomicUsize::new(0),
            triangulate_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn triangulate_calls(&self) -> usize {
        self.triangulate_calls.load(Ordering::SeqCst)
    }
}

impl BrepKernel for FlakyKernel {
    type Shape = ShapeRef;

    fn is_null(&self, shape: &ShapeRef) -> bool {
        self.inner.is_null(shape)
    }

    fn kind(&self, shape: &ShapeRef) -> ShapeKind {
        self.inner.kind(shape)
    }

    fn orientation(&self, shape: &ShapeRef) -> Orientation {
        self.inner.orientation(shape)
    }

    fn identity(&self, shape: &ShapeRef) -> IdentityKey {
        self.inner.identity(shape)
    }

    fn explore(&self, root: &ShapeRef, kind: ShapeKind, avoid: Option<ShapeKind>) -> Vec<ShapeRef> {
        self.inner.explore(root, kind, avoid)
    }

    fn edge_vertices(&self, edge: &ShapeRef) -> Option<(ShapeRef, ShapeRef)> {
        self.inner.edge_vertices(edge)
    }

    fn vertex_point(&self, vertex: &ShapeRef) -> Option<Point3<f64>> {
        BrepKernel::vertex_point(&self.inner, vertex)
    }

    fn curve_range(&self, edge: &ShapeRef) -> Result<ParamRange, EvalError> {
        match self.fault {
            Fault::NoCurves => Err(EvalError::NoGeometry),
            _ => self.inner.curve_range(edge),
        }
    }

    fn curve_point(&self, edge: &ShapeRef, t: f64) -> Result<Point3<f64>, EvalError> {
        match self.fault {
            Fault::NoCurves => Err(EvalError::NoGeometry),
            _ => self.inner.curve_point(edge, t),
        }
    }

    fn surface_domain(&self, face: &ShapeRef) -> Result<SurfaceDomain, EvalError> {
        match self.fault {
            Fault::SurfaceUnsupported => Err(EvalError::Unsupported),
            Fault::NoSurfaceNoMesh => Err(EvalError::NoGeometry),
            _ => self.inner.surface_domain(face),
        }
    }

    fn surface_point(&self, face: &ShapeRef, u: f64, v: f64) -> Result<Point3<f64>, EvalError> {
        match self.fault {
            Fault::EveryOtherSurfacePoint => {
                if self.surface_calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    return Err(EvalError::Failed("injected".into()));
                }
            }
            Fault::FirstRow => {
                let domain = self.inner.surface_domain(face)?;
                if u == domain.u.first {
                    return Err(EvalError::OutOfDomain(u, v));
                }
            }
            Fault::SurfaceUnsupported => return Err(EvalError::Unsupported),
            Fault::Everything => return Err(EvalError::Failed("injected".into())),
            Fault::NoSurfaceNoMesh => return Err(EvalError::NoGeometry),
            Fault::NoCurves => {}
        }
        self.inner.surface_point(face, u, v)
    }

    fn surface_type(&self, face: &ShapeRef) -> SurfaceType {
        self.inner.surface_type(face)
    }

    fn triangulate(&self, face: &ShapeRef, deflection: f64) -> Option<TriangleMesh> {
        self.triangulate_calls.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::Everything | Fault::NoSurfaceNoMesh => None,
            _ => self.inner.triangulate(face, deflection),
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric-kernel interface.
//!
//! The indexing engine consumes a B-rep only through [`BrepKernel`]: sub-shape
//! enumeration, identity, edge endpoints, curve/surface evaluation and face
//! triangulation. Any kernel (the in-memory [`TopologyArena`](crate::TopologyArena)
//! or a binding to an external CAD kernel) can drive a conversion by
//! implementing it.

use std::fmt;
use std::str::FromStr;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, EvalError};

/// Topological entity categories, ordered from most to least complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Compound = 0,
    CompSolid = 1,
    Solid = 2,
    Shell = 3,
    Face = 4,
    Wire = 5,
    Edge = 6,
    Vertex = 7,
    /// Generic "any shape" kind. Not a valid enumeration target.
    Shape = 8,
}

impl ShapeKind {
    /// Every concrete kind, most complex first.
    pub const CONCRETE: [ShapeKind; 8] = [
        ShapeKind::Compound,
        ShapeKind::CompSolid,
        ShapeKind::Solid,
        ShapeKind::Shell,
        ShapeKind::Face,
        ShapeKind::Wire,
        ShapeKind::Edge,
        ShapeKind::Vertex,
    ];

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Compound => "compound",
            ShapeKind::CompSolid => "compsolid",
            ShapeKind::Solid => "solid",
            ShapeKind::Shell => "shell",
            ShapeKind::Face => "face",
            ShapeKind::Wire => "wire",
            ShapeKind::Edge => "edge",
            ShapeKind::Vertex => "vertex",
            ShapeKind::Shape => "shape",
        }
    }

    /// `true` for the kinds a sub-shape enumeration can target.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, ShapeKind::Shape)
    }

    /// `true` if an entity of this kind can contain entities of `other`.
    pub fn can_contain(&self, other: ShapeKind) -> bool {
        match self {
            ShapeKind::Compound => true,
            ShapeKind::Shape => false,
            _ => (*self as u8) < (other as u8),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compound" => Ok(ShapeKind::Compound),
            "compsolid" => Ok(ShapeKind::CompSolid),
            "solid" => Ok(ShapeKind::Solid),
            "shell" => Ok(ShapeKind::Shell),
            "face" => Ok(ShapeKind::Face),
            "wire" => Ok(ShapeKind::Wire),
            "edge" => Ok(ShapeKind::Edge),
            "vertex" => Ok(ShapeKind::Vertex),
            other => Err(Error::UnsupportedKind(other.to_string())),
        }
    }
}

/// Direction in which a sub-shape is used by its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Forward,
    Reversed,
}

impl Orientation {
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
        }
    }

    /// Orientation of a child use seen through a parent with orientation `self`.
    pub fn compose(self, child: Orientation) -> Self {
        match self {
            Orientation::Forward => child,
            Orientation::Reversed => child.reversed(),
        }
    }

    pub fn is_forward(self) -> bool {
        self == Orientation::Forward
    }
}

impl From<bool> for Orientation {
    fn from(forward: bool) -> Self {
        if forward {
            Orientation::Forward
        } else {
            Orientation::Reversed
        }
    }
}

/// Orientation-independent identity of a kernel entity.
///
/// Derived from the kernel's own uniqueness guarantee (for the arena: the
/// generational slot of the entity within its tier). Two handles denote the
/// same entity iff their identity keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    kind: ShapeKind,
    id: u64,
}

impl IdentityKey {
    pub fn new(kind: ShapeKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:x}", self.kind, self.id)
    }
}

/// Closed parameter interval `[first, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub first: f64,
    pub last: f64,
}

impl ParamRange {
    pub fn new(first: f64, last: f64) -> Self {
        Self { first, last }
    }

    pub fn span(&self) -> f64 {
        self.last - self.first
    }

    pub fn mid(&self) -> f64 {
        0.5 * (self.first + self.last)
    }

    /// Parameter of sample `i` of `n` uniformly spaced samples spanning the
    /// range. A single sample sits at the midpoint.
    pub fn sample(&self, i: usize, n: usize) -> f64 {
        if n <= 1 {
            return self.mid();
        }
        self.first + self.span() * (i as f64) / ((n - 1) as f64)
    }

    /// Clamps `t` into the range (either bound ordering is accepted).
    pub fn clamp(&self, t: f64) -> f64 {
        let (lo, hi) = if self.first <= self.last {
            (self.first, self.last)
        } else {
            (self.last, self.first)
        };
        t.clamp(lo, hi)
    }

    pub fn contains(&self, t: f64) -> bool {
        self.clamp(t) == t
    }

    pub fn is_finite(&self) -> bool {
        self.first.is_finite() && self.last.is_finite()
    }
}

/// Rectangular parameter domain of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDomain {
    pub u: ParamRange,
    pub v: ParamRange,
}

impl SurfaceDomain {
    pub fn new(u: ParamRange, v: ParamRange) -> Self {
        Self { u, v }
    }

    pub fn clamp(&self, u: f64, v: f64) -> (f64, f64) {
        (self.u.clamp(u), self.v.clamp(v))
    }
}

/// Triangulated approximation of a face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub positions: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Analytic type of a face's underlying surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    SurfaceOfRevolution,
    SurfaceOfExtrusion,
    Bezier,
    BSpline,
    Other,
}

impl SurfaceType {
    /// Stable integer code (plane = 0 .. bspline = 8). Unknown surface types
    /// share the bezier code.
    pub fn code(&self) -> u8 {
        match self {
            SurfaceType::Plane => 0,
            SurfaceType::Cylinder => 1,
            SurfaceType::Cone => 2,
            SurfaceType::Sphere => 3,
            SurfaceType::Torus => 4,
            SurfaceType::SurfaceOfRevolution => 5,
            SurfaceType::SurfaceOfExtrusion => 6,
            SurfaceType::Bezier | SurfaceType::Other => 7,
            SurfaceType::BSpline => 8,
        }
    }
}

/// Primitive operations the indexing engine needs from a geometric kernel.
///
/// Implementations must be read-only with respect to the model: the engine
/// may call any method concurrently from several worker threads.
pub trait BrepKernel: Sync {
    /// Handle to an (oriented) entity of the model.
    type Shape: Clone + fmt::Debug + Send + Sync;

    /// `true` if the handle does not reference a live entity.
    fn is_null(&self, shape: &Self::Shape) -> bool;

    fn kind(&self, shape: &Self::Shape) -> ShapeKind;

    fn orientation(&self, shape: &Self::Shape) -> Orientation;

    /// Orientation-independent identity of the entity behind `shape`.
    fn identity(&self, shape: &Self::Shape) -> IdentityKey;

    /// Raw pre-order enumeration of the sub-shapes of `root` with kind
    /// `kind`, duplicates included, orientations composed from `root`.
    /// Sub-trees rooted at an entity of kind `avoid` are not entered. A root
    /// of kind `kind` yields itself.
    fn explore(
        &self,
        root: &Self::Shape,
        kind: ShapeKind,
        avoid: Option<ShapeKind>,
    ) -> Vec<Self::Shape>;

    /// First and last vertex of an edge in the direction of its orientation.
    /// `None` for edges without bounding vertices.
    fn edge_vertices(&self, edge: &Self::Shape) -> Option<(Self::Shape, Self::Shape)>;

    fn vertex_point(&self, vertex: &Self::Shape) -> Option<Point3<f64>>;

    fn curve_range(&self, edge: &Self::Shape) -> Result<ParamRange, EvalError>;

    fn curve_point(&self, edge: &Self::Shape, t: f64) -> Result<Point3<f64>, EvalError>;

    fn surface_domain(&self, face: &Self::Shape) -> Result<SurfaceDomain, EvalError>;

    fn surface_point(&self, face: &Self::Shape, u: f64, v: f64) -> Result<Point3<f64>, EvalError>;

    fn surface_type(&self, face: &Self::Shape) -> SurfaceType;

    /// Triangulated approximation of a face at the given chordal deflection.
    fn triangulate(&self, face: &Self::Shape, deflection: f64) -> Option<TriangleMesh>;
}

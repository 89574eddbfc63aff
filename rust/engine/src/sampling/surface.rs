// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-shape U×V surface grids with layered fallback.
//!
//! Layers are tried in order: parametric evaluation over the face's domain,
//! nearest-neighbour lookup on the face triangulation, then an all-zero grid.
//! Every attempt is recorded in a [`GridTrace`] so callers can see why a
//! face degraded.

use brep_index_topology::{BrepKernel, EvalError, ParamRange, TriangleMesh};
use serde::{Deserialize, Serialize};

/// U rows of V points each.
pub type Grid = Vec<Vec<[f64; 3]>>;

/// Sampling layer that produced a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSource {
    Parametric,
    Mesh,
    Zero,
}

/// Outcome of one attempted layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerOutcome {
    pub layer: GridSource,
    /// Failure reason; `None` when the layer produced the grid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayerOutcome {
    fn success(layer: GridSource) -> Self {
        Self { layer, error: None }
    }

    fn failure(layer: GridSource, error: impl Into<String>) -> Self {
        Self {
            layer,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridTrace {
    pub layers: Vec<LayerOutcome>,
    pub source: GridSource,
    /// Cells left at the origin after their retry also failed.
    pub zero_cells: usize,
    /// `[u, v]` positions of those cells in a parametric grid. A zero grid
    /// lists none; every cell of it is a fill.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zero_positions: Vec<[usize; 2]>,
    /// The parametric layer failed with `NoGeometry`.
    #[serde(skip)]
    pub no_surface: bool,
}

impl GridTrace {
    /// The grid did not come from the first layer.
    pub fn degraded(&self) -> bool {
        self.source != GridSource::Parametric
    }

    /// Whether cell `[i][j]` holds a zero fill instead of a surface sample.
    pub fn is_zero_cell(&self, i: usize, j: usize) -> bool {
        self.source == GridSource::Zero || self.zero_positions.contains(&[i, j])
    }
}

#[derive(Debug, Clone)]
pub struct SampledGrid {
    pub points: Grid,
    pub trace: GridTrace,
}

/// What the caller already knows about the face triangulation.
#[derive(Debug, Clone, Copy)]
pub enum MeshHint<'m> {
    /// Not attempted; the mesh layer triangulates on demand.
    Pending,
    /// Already attempted. `None` means it failed and is not retried.
    Attempted(Option<&'m TriangleMesh>),
}

pub struct SurfaceGridSampler<'k, K: BrepKernel> {
    kernel: &'k K,
    mesh_deflection: f64,
}

impl<'k, K: BrepKernel> SurfaceGridSampler<'k, K> {
    pub fn new(kernel: &'k K, mesh_deflection: f64) -> Self {
        Self {
            kernel,
            mesh_deflection,
        }
    }

    pub fn sample(&self, face: &K::Shape, u: usize, v: usize) -> SampledGrid {
        self.sample_with_mesh(face, u, v, MeshHint::Pending)
    }

    /// Like [`sample`](Self::sample), reusing an earlier triangulation
    /// attempt for the mesh layer.
    pub fn sample_with_mesh(
        &self,
        face: &K::Shape,
        u: usize,
        v: usize,
        mesh: MeshHint<'_>,
    ) -> SampledGrid {
        let mut layers = Vec::with_capacity(3);
        let mut no_surface = false;

        match self.parametric(face, u, v) {
            Ok((points, zero_positions)) => {
                layers.push(LayerOutcome::success(GridSource::Parametric));
                return SampledGrid {
                    points,
                    trace: GridTrace {
                        layers,
                        source: GridSource::Parametric,
                        zero_cells: zero_positions.len(),
                        zero_positions,
                        no_surface,
                    },
                };
            }
            Err(err) => {
                no_surface = matches!(err, EvalError::NoGeometry);
                layers.push(LayerOutcome::failure(GridSource::Parametric, err.to_string()));
            }
        }

        let owned;
        let mesh = match mesh {
            MeshHint::Attempted(m) => m,
            MeshHint::Pending => {
                owned = self.kernel.triangulate(face, self.mesh_deflection);
                owned.as_ref()
            }
        };

        match mesh.filter(|m| !m.is_empty()) {
            Some(mesh) => {
                layers.push(LayerOutcome::success(GridSource::Mesh));
                SampledGrid {
                    points: mesh_grid(mesh, u, v),
                    trace: GridTrace {
                        layers,
                        source: GridSource::Mesh,
                        zero_cells: 0,
                        zero_positions: Vec::new(),
                        no_surface,
                    },
                }
            }
            None => {
                layers.push(LayerOutcome::failure(GridSource::Mesh, "no triangulation"));
                layers.push(LayerOutcome::success(GridSource::Zero));
                SampledGrid {
                    points: zero_grid(u, v),
                    trace: GridTrace {
                        layers,
                        source: GridSource::Zero,
                        zero_cells: u * v,
                        zero_positions: Vec::new(),
                        no_surface,
                    },
                }
            }
        }
    }

    /// Evaluates every cell, retrying once with clamped parameters. Fails
    /// only when no cell could be evaluated.
    fn parametric(
        &self,
        face: &K::Shape,
        u: usize,
        v: usize,
    ) -> Result<(Grid, Vec<[usize; 2]>), EvalError> {
        let domain = self.kernel.surface_domain(face)?;
        if !domain.u.is_finite() || !domain.v.is_finite() {
            return Err(EvalError::OutOfDomain(domain.u.span(), domain.v.span()));
        }

        let mut zero_positions = Vec::new();
        let mut last_error = None;
        let mut grid = Vec::with_capacity(u);

        for i in 0..u {
            let up = domain.u.sample(i, u);
            let mut row = Vec::with_capacity(v);
            for j in 0..v {
                let vp = domain.v.sample(j, v);
                let point = self.kernel.surface_point(face, up, vp).or_else(|_| {
                    let (cu, cv) = domain.clamp(up, vp);
                    self.kernel.surface_point(face, cu, cv)
                });
                match point {
                    Ok(p) => row.push([p.x, p.y, p.z]),
                    Err(err) => {
                        zero_positions.push([i, j]);
                        last_error = Some(err);
                        row.push([0.0; 3]);
                    }
                }
            }
            grid.push(row);
        }

        if u * v > 0 && zero_positions.len() == u * v {
            return Err(last_error.unwrap_or(EvalError::Unsupported));
        }
        Ok((grid, zero_positions))
    }
}

pub fn zero_grid(u: usize, v: usize) -> Grid {
    vec![vec![[0.0; 3]; v]; u]
}

/// Nearest mesh vertex for each grid cell, measured in the plane of the two
/// axes along which the mesh extends furthest.
fn mesh_grid(mesh: &TriangleMesh, u: usize, v: usize) -> Grid {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for p in &mesh.positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }

    let mut axes = [0usize, 1, 2];
    axes.sort_by(|&a, &b| (max[b] - min[b]).total_cmp(&(max[a] - min[a])));
    let (a0, a1) = (axes[0], axes[1]);
    let range0 = ParamRange::new(min[a0], max[a0]);
    let range1 = ParamRange::new(min[a1], max[a1]);

    (0..u)
        .map(|i| {
            let t0 = range0.sample(i, u);
            (0..v)
                .map(|j| {
                    let t1 = range1.sample(j, v);
                    nearest(&mesh.positions, a0, a1, t0, t1)
                })
                .collect()
        })
        .collect()
}

fn nearest(positions: &[[f64; 3]], a0: usize, a1: usize, t0: f64, t1: f64) -> [f64; 3] {
    let mut best = positions[0];
    let mut best_d = f64::INFINITY;
    for p in positions {
        let d0 = p[a0] - t0;
        let d1 = p[a1] - t1;
        let d = d0 * d0 + d1 * d1;
        if d < best_d {
            best_d = d;
            best = *p;
        }
    }
    best
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output dataset and its assembly from canonical tiers.

use brep_index_topology::TriangleMesh;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::adjacency::{Adjacency, Membership};
use crate::canonical::CanonicalTiers;
use crate::config::{ConversionConfig, GridPolicy};
use crate::error::{Error, Result};
use crate::sampling::{Grid, GridSource, GridTrace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub points: Vec<[f64; 3]>,
    pub vertex_indices: SmallVec<[usize; 2]>,
    /// Polyline length of `points`.
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// U rows of V points; `null` when the grid failed and the policy omits it.
    pub grid_points: Option<Grid>,
    pub edge_indices: Vec<usize>,
    pub wire_indices: Vec<usize>,
    /// Stable surface type code (plane = 0 .. bspline = 8).
    pub surface_type: u8,
    pub grid: GridTrace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<TriangleMesh>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub ordered_edge_indices: Vec<usize>,
    pub ordered_vertex_indices: Vec<usize>,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub face_indices: Vec<usize>,
    pub edge_indices: Vec<usize>,
    pub vertex_indices: Vec<usize>,
    pub faces_count: usize,
    pub edges_count: usize,
    pub vertices_count: usize,
}

impl From<Membership> for MembershipRecord {
    fn from(m: Membership) -> Self {
        Self {
            faces_count: m.face_indices.len(),
            edges_count: m.edge_indices.len(),
            vertices_count: m.vertex_indices.len(),
            face_indices: m.face_indices,
            edge_indices: m.edge_indices,
            vertex_indices: m.vertex_indices,
        }
    }
}

/// Tier counts and degradation statistics of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub vertices: usize,
    pub edges: usize,
    pub wires: usize,
    pub faces: usize,
    pub shells: usize,
    pub solids: usize,
    pub compounds: usize,
    pub dropped_vertices: usize,
    pub dropped_edges: usize,
    pub dropped_faces: usize,
    pub mesh_fallback_faces: usize,
    pub zero_filled_faces: usize,
    pub zero_filled_cells: usize,
    pub dangling_references: usize,
}

/// Affine map applied by normalization: `p' = (p - center) * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub center: [f64; 3],
    pub scale: f64,
}

/// Indexed, adjacency-annotated dataset. Array position is canonical index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrepDataset {
    pub edge_sample_count: usize,
    /// `[u, v]` shape of every face grid.
    pub grid_shape: [usize; 2],
    pub vertices: Vec<[f64; 3]>,
    pub edges: Vec<EdgeRecord>,
    pub faces: Vec<FaceRecord>,
    pub wires: Vec<WireRecord>,
    pub shells: Vec<MembershipRecord>,
    pub solids: Vec<MembershipRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,
    pub summary: Summary,
}

impl BrepDataset {
    /// Builds the dataset from canonical tiers and their adjacency, then
    /// validates it.
    pub fn assemble<S>(
        tiers: CanonicalTiers<S>,
        adjacency: Adjacency,
        compounds: usize,
        config: &ConversionConfig,
    ) -> Result<Self> {
        let mut summary = Summary {
            dropped_vertices: tiers.vertices.dropped_count(),
            dropped_edges: tiers.edges.dropped_count(),
            dropped_faces: tiers.faces.dropped_count(),
            dangling_references: adjacency.dangling,
            compounds,
            ..Summary::default()
        };

        let vertices: Vec<[f64; 3]> = tiers
            .vertices
            .into_entries()
            .into_iter()
            .map(|v| v.payload)
            .collect();

        let edges: Vec<EdgeRecord> = tiers
            .edges
            .into_entries()
            .into_iter()
            .zip(adjacency.edge_vertices)
            .map(|(e, vertex_indices)| EdgeRecord {
                points: e.payload.points,
                vertex_indices,
                length: e.payload.length,
            })
            .collect();

        let faces: Vec<FaceRecord> = tiers
            .faces
            .into_entries()
            .into_iter()
            .zip(adjacency.face_edges)
            .zip(adjacency.face_wires)
            .map(|((f, edge_indices), wire_indices)| {
                let trace = f.payload.grid.trace;
                match trace.source {
                    GridSource::Parametric => {}
                    GridSource::Mesh => summary.mesh_fallback_faces += 1,
                    GridSource::Zero => summary.zero_filled_faces += 1,
                }
                summary.zero_filled_cells += trace.zero_cells;

                let omit = trace.source == GridSource::Zero && config.grid_policy == GridPolicy::Omit;
                FaceRecord {
                    grid_points: (!omit).then_some(f.payload.grid.points),
                    edge_indices,
                    wire_indices,
                    surface_type: f.payload.surface_type.code(),
                    grid: trace,
                    mesh: f.payload.mesh,
                }
            })
            .collect();

        let wires: Vec<WireRecord> = tiers
            .wires
            .into_entries()
            .into_iter()
            .zip(adjacency.wire_edges)
            .zip(adjacency.wire_vertices)
            .map(|((w, ordered_edge_indices), ordered_vertex_indices)| WireRecord {
                ordered_edge_indices,
                ordered_vertex_indices,
                is_closed: w.payload.closed,
            })
            .collect();

        let shells: Vec<MembershipRecord> = adjacency.shells.into_iter().map(Into::into).collect();
        let solids: Vec<MembershipRecord> = adjacency.solids.into_iter().map(Into::into).collect();

        summary.vertices = vertices.len();
        summary.edges = edges.len();
        summary.wires = wires.len();
        summary.faces = faces.len();
        summary.shells = shells.len();
        summary.solids = solids.len();

        let mut dataset = BrepDataset {
            edge_sample_count: config.edge_sample_count,
            grid_shape: [config.grid_u, config.grid_v],
            vertices,
            edges,
            faces,
            wires,
            shells,
            solids,
            normalization: None,
            summary,
        };

        if config.normalize {
            dataset.normalize();
        }
        dataset.validate()?;
        Ok(dataset)
    }

    /// Re-checks every index bound and fixed sample shape.
    pub fn validate(&self) -> Result<()> {
        let (nv, ne, nw, nf) = (
            self.vertices.len(),
            self.edges.len(),
            self.wires.len(),
            self.faces.len(),
        );

        let counts = [
            ("vertices", self.summary.vertices, nv),
            ("edges", self.summary.edges, ne),
            ("wires", self.summary.wires, nw),
            ("faces", self.summary.faces, nf),
            ("shells", self.summary.shells, self.shells.len()),
            ("solids", self.summary.solids, self.solids.len()),
        ];
        for (tier, reported, actual) in counts {
            if reported != actual {
                return Err(Error::InvalidDataset(format!(
                    "summary reports {reported} {tier}, dataset holds {actual}"
                )));
            }
        }

        for (i, edge) in self.edges.iter().enumerate() {
            check_indices("edge", i, "vertex", &edge.vertex_indices, nv)?;
            if edge.points.len() != self.edge_sample_count {
                return Err(Error::InvalidDataset(format!(
                    "edge {i} has {} samples, expected {}",
                    edge.points.len(),
                    self.edge_sample_count
                )));
            }
        }

        let [gu, gv] = self.grid_shape;
        for (i, face) in self.faces.iter().enumerate() {
            check_indices("face", i, "edge", &face.edge_indices, ne)?;
            check_indices("face", i, "wire", &face.wire_indices, nw)?;
            if let Some(grid) = &face.grid_points {
                if grid.len() != gu || grid.iter().any(|row| row.len() != gv) {
                    return Err(Error::InvalidDataset(format!(
                        "face {i} grid is not {gu}x{gv}"
                    )));
                }
            }
        }

        for (i, wire) in self.wires.iter().enumerate() {
            check_indices("wire", i, "edge", &wire.ordered_edge_indices, ne)?;
            check_indices("wire", i, "vertex", &wire.ordered_vertex_indices, nv)?;
        }

        for (tier, records) in [("shell", &self.shells), ("solid", &self.solids)] {
            for (i, m) in records.iter().enumerate() {
                check_indices(tier, i, "face", &m.face_indices, nf)?;
                check_indices(tier, i, "edge", &m.edge_indices, ne)?;
                check_indices(tier, i, "vertex", &m.vertex_indices, nv)?;
            }
        }

        Ok(())
    }

    /// Rescales every coordinate into [-1, 1]³ around the centre of the
    /// model's bounding box. Zero-filled grid cells neither count towards the
    /// box nor move; they stay at the origin.
    pub fn normalize(&mut self) {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        let mut extend = |p: &[f64; 3]| {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        };

        self.vertices.iter().for_each(&mut extend);
        self.edges.iter().flat_map(|e| &e.points).for_each(&mut extend);
        for face in &self.faces {
            let Some(grid) = &face.grid_points else { continue };
            for (i, row) in grid.iter().enumerate() {
                for (j, p) in row.iter().enumerate() {
                    if !face.grid.is_zero_cell(i, j) {
                        extend(p);
                    }
                }
            }
        }

        if min.iter().any(|m| !m.is_finite()) {
            return;
        }

        let center = [
            0.5 * (min[0] + max[0]),
            0.5 * (min[1] + max[1]),
            0.5 * (min[2] + max[2]),
        ];
        let extent = (0..3).map(|a| max[a] - min[a]).fold(0.0, f64::max);
        let scale = if extent > 0.0 { 2.0 / extent } else { 1.0 };

        let map = |p: &mut [f64; 3]| {
            for axis in 0..3 {
                p[axis] = (p[axis] - center[axis]) * scale;
            }
        };

        self.vertices.iter_mut().for_each(map);
        for edge in &mut self.edges {
            edge.points.iter_mut().for_each(map);
            edge.length *= scale;
        }
        for face in &mut self.faces {
            if let Some(grid) = &mut face.grid_points {
                for (i, row) in grid.iter_mut().enumerate() {
                    for (j, p) in row.iter_mut().enumerate() {
                        if !face.grid.is_zero_cell(i, j) {
                            map(p);
                        }
                    }
                }
            }
            if let Some(mesh) = &mut face.mesh {
                mesh.positions.iter_mut().for_each(map);
            }
        }

        self.normalization = Some(Normalization { center, scale });
    }
}

fn check_indices(tier: &str, owner: usize, target: &str, indices: &[usize], bound: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= bound) {
        Some(i) => Err(Error::InvalidDataset(format!(
            "{tier} {owner} references {target} {i}, only {bound} exist"
        ))),
        None => Ok(()),
    }
}

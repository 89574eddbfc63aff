// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end conversion: enumerate, canonicalize, cross-reference, assemble.

use std::time::Instant;

use brep_index_topology::{BrepKernel, IdentityKey, ShapeKind};
use rustc_hash::FxHashSet;

use crate::adjacency::AdjacencyBuilder;
use crate::cancel::CancelToken;
use crate::canonical::EntityCanonicalizer;
use crate::config::ConversionConfig;
use crate::dataset::BrepDataset;
use crate::error::{Error, Result};
use crate::walker::ShapeGraphWalker;

/// Converts `shape` into an indexed dataset.
pub fn convert<K: BrepKernel>(
    kernel: &K,
    shape: &K::Shape,
    config: &ConversionConfig,
) -> Result<BrepDataset> {
    convert_with_cancel(kernel, shape, config, &CancelToken::new())
}

/// Like [`convert`], aborting with [`Error::Cancelled`] once `cancel` is
/// raised. The token is checked between phases and before each face.
pub fn convert_with_cancel<K: BrepKernel>(
    kernel: &K,
    shape: &K::Shape,
    config: &ConversionConfig,
    cancel: &CancelToken,
) -> Result<BrepDataset> {
    config.validate()?;
    if kernel.is_null(shape) {
        return Err(Error::InvalidShape("input shape is null".into()));
    }

    let total_start = Instant::now();
    tracing::info!(
        kind = %kernel.kind(shape),
        edge_sample_count = config.edge_sample_count,
        grid_u = config.grid_u,
        grid_v = config.grid_v,
        ignore_orientation = config.ignore_orientation,
        "Starting conversion"
    );

    let walker = ShapeGraphWalker::new(kernel, config.ignore_orientation);
    let mut canon = EntityCanonicalizer::new(kernel, config);

    // Vertices and edges
    cancel.check()?;
    let phase_start = Instant::now();
    let vertices = walker.vertices(shape)?;
    canon.intern_vertices(&vertices)?;
    cancel.check()?;
    let edges = walker.edges(shape)?;
    canon.intern_edges(&edges)?;
    tracing::info!(
        vertices = canon.tiers().vertices.len(),
        edges = canon.tiers().edges.len(),
        elapsed_ms = phase_start.elapsed().as_millis(),
        "Vertex and edge sampling complete"
    );

    // Faces
    cancel.check()?;
    let phase_start = Instant::now();
    let faces = walker.faces(shape)?;
    canon.intern_faces(&faces, cancel)?;
    tracing::info!(
        faces = canon.tiers().faces.len(),
        dropped = canon.tiers().faces.dropped_count(),
        elapsed_ms = phase_start.elapsed().as_millis(),
        "Face sampling complete"
    );

    // Wires and containers
    cancel.check()?;
    let wires = walker.wires(shape)?;
    canon.intern_wires(&wires)?;
    for shell in walker.shells(shape)? {
        canon.intern_shell(&shell);
    }
    for solid in walker.solids(shape)? {
        canon.intern_solid(&solid);
    }
    let compounds = count_distinct(kernel, &walker.enumerate(shape, ShapeKind::Compound, None, None)?);

    cancel.check()?;
    let phase_start = Instant::now();
    let adjacency = AdjacencyBuilder::new(kernel, &walker, &canon, shape).build()?;
    tracing::debug!(
        dangling = adjacency.dangling,
        elapsed_ms = phase_start.elapsed().as_millis(),
        "Adjacency built"
    );

    cancel.check()?;
    let dataset = BrepDataset::assemble(canon.into_tiers(), adjacency, compounds, config)?;

    let s = &dataset.summary;
    tracing::info!(
        vertices = s.vertices,
        edges = s.edges,
        wires = s.wires,
        faces = s.faces,
        shells = s.shells,
        solids = s.solids,
        dropped_edges = s.dropped_edges,
        dropped_faces = s.dropped_faces,
        mesh_fallback_faces = s.mesh_fallback_faces,
        zero_filled_faces = s.zero_filled_faces,
        total_time_ms = total_start.elapsed().as_millis(),
        "Conversion complete"
    );

    Ok(dataset)
}

fn count_distinct<K: BrepKernel>(kernel: &K, shapes: &[K::Shape]) -> usize {
    shapes
        .iter()
        .map(|s| kernel.identity(s))
        .collect::<FxHashSet<IdentityKey>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{unit_box, Fault, FlakyKernel};
    use approx::assert_relative_eq;
    use brep_index_topology::{make_box, ShapeRef, TopologyArena};

    #[test]
    fn cube_summary() {
        let (arena, root) = unit_box();
        let dataset = convert(&arena, &root, &ConversionConfig::new(5).with_grid_size(4)).unwrap();

        let s = &dataset.summary;
        assert_eq!((s.vertices, s.edges, s.faces, s.wires), (8, 12, 6, 6));
        assert_eq!((s.shells, s.solids, s.compounds), (1, 1, 0));
        assert_eq!(s.dangling_references, 0);
        assert!(dataset.wires.iter().all(|w| w.is_closed));
        assert!(dataset.faces.iter().all(|f| f.surface_type == 0));
    }

    #[test]
    fn compound_of_two_boxes() {
        let mut arena = TopologyArena::new();
        let a = make_box(&mut arena, [0.0; 3], [1.0; 3]).unwrap();
        let b = make_box(&mut arena, [2.0, 0.0, 0.0], [1.0; 3]).unwrap();
        let c = arena
            .add_compound(&[ShapeRef::new(a), ShapeRef::new(b)])
            .unwrap();

        let dataset = convert(&arena, &ShapeRef::new(c), &ConversionConfig::new(3).with_grid_size(2)).unwrap();
        let s = &dataset.summary;
        assert_eq!((s.vertices, s.edges, s.faces, s.solids, s.compounds), (16, 24, 12, 2, 1));
    }

    #[test]
    fn omit_policy_nulls_failed_grids() {
        let (arena, root) = unit_box();
        let kernel = FlakyKernel::new(arena, Fault::Everything);
        let config = ConversionConfig::new(3)
            .with_grid_size(2)
            .with_grid_policy(crate::config::GridPolicy::Omit);

        let dataset = convert(&kernel, &root, &config).unwrap();
        assert_eq!(dataset.faces.len(), 6);
        assert!(dataset.faces.iter().all(|f| f.grid_points.is_none()));
        assert_eq!(dataset.summary.zero_filled_faces, 6);
    }

    #[test]
    fn rejects_invalid_config_and_null_shape() {
        let (arena, root) = unit_box();
        assert!(matches!(
            convert(&arena, &root, &ConversionConfig::new(1)),
            Err(Error::InvalidConfig(_))
        ));

        let empty = TopologyArena::new();
        assert!(matches!(
            convert(&empty, &root, &ConversionConfig::new(4)),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn normalized_output_fits_unit_box() {
        let mut arena = TopologyArena::new();
        let solid = ShapeRef::new(make_box(&mut arena, [10.0, 0.0, 0.0], [4.0, 2.0, 1.0]).unwrap());
        let config = ConversionConfig::new(4).with_grid_size(3).with_normalize(true);
        let dataset = convert(&arena, &solid, &config).unwrap();

        let all = dataset
            .vertices
            .iter()
            .chain(dataset.edges.iter().flat_map(|e| &e.points))
            .chain(dataset.faces.iter().flat_map(|f| f.grid_points.iter().flatten().flatten()));
        for p in all {
            assert!(p.iter().all(|c| (-1.0 - 1e-12..=1.0 + 1e-12).contains(c)));
        }
        assert!(dataset.normalization.is_some());
    }

    #[test]
    fn zero_filled_cells_do_not_skew_normalization() {
        let mut arena = TopologyArena::new();
        let solid = ShapeRef::new(make_box(&mut arena, [10.0, 0.0, 0.0], [4.0, 2.0, 1.0]).unwrap());
        let kernel = FlakyKernel::new(arena, Fault::FirstRow);
        let config = ConversionConfig::new(4).with_grid_size(3).with_normalize(true);
        let dataset = convert(&kernel, &solid, &config).unwrap();
        assert_eq!(dataset.summary.zero_filled_cells, 18);

        let n = dataset.normalization.unwrap();
        assert_relative_eq!(n.center[0], 12.0, epsilon = 1e-12);
        assert_relative_eq!(n.center[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.center[2], 0.5, epsilon = 1e-12);
        assert_relative_eq!(n.scale, 0.5, epsilon = 1e-12);

        let xs: Vec<f64> = dataset.vertices.iter().map(|p| p[0]).collect();
        assert_relative_eq!(xs.iter().copied().fold(f64::INFINITY, f64::min), -1.0, epsilon = 1e-12);
        assert_relative_eq!(xs.iter().copied().fold(f64::NEG_INFINITY, f64::max), 1.0, epsilon = 1e-12);

        for face in &dataset.faces {
            let grid = face.grid_points.as_ref().unwrap();
            assert!(grid[0].iter().all(|p| *p == [0.0; 3]));
            assert!(grid[1..].iter().flatten().all(|p| p.iter().all(|c| c.abs() <= 1.0 + 1e-12)));
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-run conversion configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default U = V surface grid resolution.
pub const DEFAULT_GRID_SIZE: usize = 32;

/// Default chordal deflection for face triangulation.
pub const DEFAULT_MESH_DEFLECTION: f64 = 0.01;

/// What to emit for a face whose every sampling layer failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPolicy {
    /// Emit an all-zero grid of the configured shape.
    #[default]
    ZeroFill,
    /// Emit no grid (`null`) for the face.
    Omit,
}

/// Options fixed for the duration of one conversion run.
///
/// The edge sample count has no default and must be supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Points sampled along every edge.
    pub edge_sample_count: usize,
    /// Grid resolution along U.
    pub grid_u: usize,
    /// Grid resolution along V.
    pub grid_v: usize,
    /// Collapse orientation-reversed uses of an entity during enumeration.
    pub ignore_orientation: bool,
    /// Chordal deflection used when triangulating faces.
    pub mesh_deflection: f64,
    /// Re-space edge samples evenly by arc length.
    pub arc_length_resample: bool,
    /// Rescale every emitted coordinate into [-1, 1]³ around the model's
    /// bounding-box centre.
    pub normalize: bool,
    /// Attach each face's triangulation to its record.
    pub include_face_mesh: bool,
    pub grid_policy: GridPolicy,
    /// Sample edges and faces on the rayon pool.
    pub parallel: bool,
}

impl ConversionConfig {
    pub fn new(edge_sample_count: usize) -> Self {
        Self {
            edge_sample_count,
            grid_u: DEFAULT_GRID_SIZE,
            grid_v: DEFAULT_GRID_SIZE,
            ignore_orientation: false,
            mesh_deflection: DEFAULT_MESH_DEFLECTION,
            arc_length_resample: false,
            normalize: false,
            include_face_mesh: false,
            grid_policy: GridPolicy::ZeroFill,
            parallel: true,
        }
    }

    /// Sets U = V grid resolution.
    pub fn with_grid_size(mut self, size: usize) -> Self {
        self.grid_u = size;
        self.grid_v = size;
        self
    }

    pub fn with_grid(mut self, u: usize, v: usize) -> Self {
        self.grid_u = u;
        self.grid_v = v;
        self
    }

    pub fn with_ignore_orientation(mut self, ignore: bool) -> Self {
        self.ignore_orientation = ignore;
        self
    }

    pub fn with_mesh_deflection(mut self, deflection: f64) -> Self {
        self.mesh_deflection = deflection;
        self
    }

    pub fn with_arc_length_resample(mut self, enabled: bool) -> Self {
        self.arc_length_resample = enabled;
        self
    }

    pub fn with_normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    pub fn with_face_mesh(mut self, enabled: bool) -> Self {
        self.include_face_mesh = enabled;
        self
    }

    pub fn with_grid_policy(mut self, policy: GridPolicy) -> Self {
        self.grid_policy = policy;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Rejects configurations that cannot produce fixed-shape samples.
    pub fn validate(&self) -> Result<()> {
        if self.edge_sample_count < 2 {
            return Err(Error::InvalidConfig(format!(
                "edge_sample_count must be at least 2, got {}",
                self.edge_sample_count
            )));
        }
        if self.grid_u == 0 || self.grid_v == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_u, self.grid_v
            )));
        }
        if !(self.mesh_deflection > 0.0 && self.mesh_deflection.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "mesh_deflection must be positive, got {}",
                self.mesh_deflection
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConversionConfig::new(30);
        assert_eq!(config.edge_sample_count, 30);
        assert_eq!((config.grid_u, config.grid_v), (32, 32));
        assert!(!config.ignore_orientation);
        assert_eq!(config.grid_policy, GridPolicy::ZeroFill);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = ConversionConfig::new(8)
            .with_grid_size(4)
            .with_ignore_orientation(true)
            .with_parallel(false);
        assert_eq!((config.grid_u, config.grid_v), (4, 4));
        assert!(config.ignore_orientation);
        assert!(!config.parallel);

        let config = config.with_grid(3, 5);
        assert_eq!((config.grid_u, config.grid_v), (3, 5));
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(matches!(
            ConversionConfig::new(1).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(ConversionConfig::new(4).with_grid(0, 4).validate().is_err());
        assert!(ConversionConfig::new(4)
            .with_mesh_deflection(0.0)
            .validate()
            .is_err());
    }
}

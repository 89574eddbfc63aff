// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-cardinality geometric sampling of edges and faces.

pub mod curve;
pub mod surface;

pub use curve::{polyline_length, resample, CurveSampler};
pub use surface::{
    zero_grid, Grid, GridSource, GridTrace, LayerOutcome, MeshHint, SampledGrid,
    SurfaceGridSampler,
};

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the command-line front end.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("missing edge sample count: pass --edge-samples or set EDGE_SAMPLE_COUNT")]
    MissingSampleCount,

    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable model: {0}")]
    Model(#[from] brep_index_topology::Error),

    #[error("model contains no entities")]
    EmptyModel,

    #[error("conversion failed: {0}")]
    Conversion(#[from] brep_index_engine::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

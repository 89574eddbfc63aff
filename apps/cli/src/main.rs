// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BRep-Index CLI - converts a B-rep snapshot into an indexed dataset.
//!
//! Reads a JSON topology snapshot, runs one conversion and writes the
//! dataset as JSON to `--output` or stdout. Logs go to stderr.
//!
//! # Environment
//!
//! - `EDGE_SAMPLE_COUNT`, `GRID_SIZE`, `MESH_DEFLECTION`,
//!   `IGNORE_ORIENTATION`, `NORMALIZE`, `WORKER_THREADS`: defaults for the
//!   matching flags
//! - `RUST_LOG`: log filter (default `info,brep_index_engine=debug`)
//! - `LOG_FORMAT=json`: structured JSON logs

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use brep_index_engine::{convert, face_colors, BrepDataset};
use brep_index_topology::{ShapeRef, TopologyArena};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod config;
mod error;

use config::{Config, USAGE};
use error::CliError;

/// Dataset plus optional per-face colours.
#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    dataset: &'a BrepDataset,
    #[serde(skip_serializing_if = "Option::is_none")]
    face_colors: Option<Vec<[f64; 3]>>,
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env().with_args(std::env::args().skip(1))?;
    if config.help {
        println!("{USAGE}");
        return Ok(());
    }
    let input = config
        .input
        .clone()
        .ok_or_else(|| CliError::Usage(format!("missing snapshot path\n\n{USAGE}")))?;
    let conversion = config.conversion()?;

    tracing::info!(
        input = %input.display(),
        edge_sample_count = conversion.edge_sample_count,
        grid_size = config.grid_size,
        worker_threads = config.worker_threads,
        "Starting BRep-Index CLI"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .expect("Failed to initialize rayon thread pool");

    let load_start = Instant::now();
    let (mut arena, root) = load_model(&input)?;
    tracing::info!(
        vertices = arena.vertex_count(),
        edges = arena.edge_count(),
        faces = arena.face_count(),
        load_time_ms = load_start.elapsed().as_millis(),
        "Model loaded"
    );
    let root = match root {
        Some(root) => root,
        None => wrap_roots(&mut arena)?,
    };

    let dataset = convert(&arena, &root, &conversion).map_err(CliError::from)?;
    let colors = config.face_colors.map(|mode| face_colors(&dataset, mode));

    let output = Output {
        dataset: &dataset,
        face_colors: colors,
    };
    write_output(&output, config.output.as_deref()).context("writing dataset")?;

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,brep_index_engine=debug".into()),
    );
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Loads a snapshot. Returns the single root entity when there is exactly one.
fn load_model(path: &Path) -> Result<(TopologyArena, Option<ShapeRef>), CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let arena = TopologyArena::from_json(&json)?;

    let roots = arena.root_entities();
    let root = match roots.as_slice() {
        [] => return Err(CliError::EmptyModel),
        [single] => Some(*single),
        _ => None,
    };
    Ok((arena, root))
}

/// Groups every unreferenced entity under one new compound.
fn wrap_roots(arena: &mut TopologyArena) -> Result<ShapeRef, CliError> {
    let roots = arena.root_entities();
    tracing::debug!(roots = roots.len(), "Wrapping top-level entities in a compound");
    let compound = arena.add_compound(&roots)?;
    Ok(ShapeRef::new(compound))
}

fn write_output(output: &Output<'_>, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer(&mut writer, output)?;
            writer.flush().map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Dataset written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer(&mut lock, output)?;
            writeln!(lock).map_err(|source| CliError::Write {
                path: "<stdout>".into(),
                source,
            })?;
        }
    }
    Ok(())
}

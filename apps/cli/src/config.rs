// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI configuration: environment variables first, then flags.

use std::path::PathBuf;
use std::str::FromStr;

use brep_index_engine::{
    ColorMode, ConversionConfig, GridPolicy, DEFAULT_GRID_SIZE, DEFAULT_MESH_DEFLECTION,
};

use crate::error::CliError;

pub const USAGE: &str = "\
brep-index [OPTIONS] <SNAPSHOT.json>

Options:
  --edge-samples <N>       points per edge (or EDGE_SAMPLE_COUNT; required)
  --grid-size <N>          U = V face grid resolution (default 32)
  --mesh-deflection <D>    chordal deflection for triangulation (default 0.01)
  --ignore-orientation     merge orientation-reversed entity uses
  --normalize              rescale coordinates into [-1, 1]^3
  --arc-length             re-space edge samples by arc length
  --face-mesh              attach face triangulations
  --omit-failed-grids      emit null for faces whose every grid layer failed
  --sequential             sample on the calling thread only
  --face-colors <MODE>     uniform | by_index | by_type
  --threads <N>            worker threads (or WORKER_THREADS)
  -o, --output <PATH>      write JSON here instead of stdout
  -h, --help               print this help";

#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Required; no default.
    pub edge_sample_count: Option<usize>,
    pub grid_size: usize,
    pub mesh_deflection: f64,
    pub ignore_orientation: bool,
    pub normalize: bool,
    pub arc_length: bool,
    pub face_mesh: bool,
    pub omit_failed_grids: bool,
    pub sequential: bool,
    pub face_colors: Option<ColorMode>,
    pub worker_threads: usize,
    pub help: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            input: None,
            output: None,
            edge_sample_count: std::env::var("EDGE_SAMPLE_COUNT")
                .ok()
                .and_then(|v| v.parse().ok()),
            grid_size: std::env::var("GRID_SIZE")
                .unwrap_or_else(|_| DEFAULT_GRID_SIZE.to_string())
                .parse()
                .unwrap_or(DEFAULT_GRID_SIZE),
            mesh_deflection: std::env::var("MESH_DEFLECTION")
                .unwrap_or_else(|_| DEFAULT_MESH_DEFLECTION.to_string())
                .parse()
                .unwrap_or(DEFAULT_MESH_DEFLECTION),
            ignore_orientation: env_flag("IGNORE_ORIENTATION"),
            normalize: env_flag("NORMALIZE"),
            arc_length: false,
            face_mesh: false,
            omit_failed_grids: false,
            sequential: false,
            face_colors: None,
            worker_threads: std::env::var("WORKER_THREADS")
                .unwrap_or_else(|_| num_cpus::get().to_string())
                .parse()
                .unwrap_or_else(|_| num_cpus::get()),
            help: false,
        }
    }

    /// Applies command-line flags on top of the environment.
    pub fn with_args<I>(mut self, args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => self.help = true,
                "--edge-samples" => self.edge_sample_count = Some(value(&arg, args.next())?),
                "--grid-size" => self.grid_size = value(&arg, args.next())?,
                "--mesh-deflection" => self.mesh_deflection = value(&arg, args.next())?,
                "--threads" => self.worker_threads = value(&arg, args.next())?,
                "--ignore-orientation" => self.ignore_orientation = true,
                "--normalize" => self.normalize = true,
                "--arc-length" => self.arc_length = true,
                "--face-mesh" => self.face_mesh = true,
                "--omit-failed-grids" => self.omit_failed_grids = true,
                "--sequential" => self.sequential = true,
                "--face-colors" => {
                    let raw = args.next().ok_or_else(|| missing(&arg))?;
                    self.face_colors = Some(raw.parse::<ColorMode>().map_err(|_| {
                        CliError::InvalidValue {
                            flag: arg.clone(),
                            value: raw.clone(),
                        }
                    })?);
                }
                "-o" | "--output" => {
                    self.output = Some(PathBuf::from(args.next().ok_or_else(|| missing(&arg))?))
                }
                flag if flag.starts_with('-') => {
                    return Err(CliError::Usage(format!("unknown option {flag}")));
                }
                _ => {
                    if self.input.replace(PathBuf::from(&arg)).is_some() {
                        return Err(CliError::Usage(format!("unexpected argument {arg}")));
                    }
                }
            }
        }
        Ok(self)
    }

    pub fn conversion(&self) -> Result<ConversionConfig, CliError> {
        let samples = self.edge_sample_count.ok_or(CliError::MissingSampleCount)?;
        let policy = if self.omit_failed_grids {
            GridPolicy::Omit
        } else {
            GridPolicy::ZeroFill
        };
        Ok(ConversionConfig::new(samples)
            .with_grid_size(self.grid_size)
            .with_mesh_deflection(self.mesh_deflection)
            .with_ignore_orientation(self.ignore_orientation)
            .with_normalize(self.normalize)
            .with_arc_length_resample(self.arc_length)
            .with_face_mesh(self.face_mesh)
            .with_grid_policy(policy)
            .with_parallel(!self.sequential))
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn missing(flag: &str) -> CliError {
    CliError::Usage(format!("{flag} needs a value"))
}

fn value<T: FromStr>(flag: &str, raw: Option<String>) -> Result<T, CliError> {
    let raw = raw.ok_or_else(|| missing(flag))?;
    raw.parse().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            input: None,
            output: None,
            edge_sample_count: None,
            grid_size: DEFAULT_GRID_SIZE,
            mesh_deflection: DEFAULT_MESH_DEFLECTION,
            ignore_orientation: false,
            normalize: false,
            arc_length: false,
            face_mesh: false,
            omit_failed_grids: false,
            sequential: false,
            face_colors: None,
            worker_threads: 1,
            help: false,
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_override_defaults() {
        let config = base()
            .with_args(args(&[
                "--edge-samples",
                "30",
                "--grid-size",
                "16",
                "--ignore-orientation",
                "--face-colors",
                "by_type",
                "-o",
                "out.json",
                "model.json",
            ]))
            .unwrap();

        assert_eq!(config.input, Some(PathBuf::from("model.json")));
        assert_eq!(config.output, Some(PathBuf::from("out.json")));
        assert_eq!(config.face_colors, Some(ColorMode::ByType));

        let conversion = config.conversion().unwrap();
        assert_eq!(conversion.edge_sample_count, 30);
        assert_eq!((conversion.grid_u, conversion.grid_v), (16, 16));
        assert!(conversion.ignore_orientation);
        assert!(conversion.parallel);
    }

    #[test]
    fn sample_count_is_required() {
        let config = base().with_args(args(&["model.json"])).unwrap();
        assert!(matches!(config.conversion(), Err(CliError::MissingSampleCount)));
    }

    #[test]
    fn bad_values_are_usage_errors() {
        assert!(matches!(
            base().with_args(args(&["--grid-size", "lots"])),
            Err(CliError::InvalidValue { .. })
        ));
        assert!(matches!(
            base().with_args(args(&["--edge-samples"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            base().with_args(args(&["--frobnicate"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            base().with_args(args(&["a.json", "b.json"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn omit_and_sequential_map_to_engine_options() {
        let conversion = base()
            .with_args(args(&["--edge-samples", "8", "--omit-failed-grids", "--sequential"]))
            .unwrap()
            .conversion()
            .unwrap();
        assert_eq!(conversion.grid_policy, GridPolicy::Omit);
        assert!(!conversion.parallel);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-face RGB colours for visualizing a dataset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::BrepDataset;
use crate::error::Error;

pub const UNIFORM_COLOR: [f64; 3] = [0.3, 0.8, 0.8];

/// Fallback for surface type codes outside [`BY_TYPE_COLORS`].
pub const UNKNOWN_TYPE_COLOR: [f64; 3] = [0.5, 0.5, 0.5];

pub const BY_INDEX_COLORS: [[f64; 3]; 11] = [
    [1.00, 0.67, 0.60],
    [0.00, 0.00, 0.70],
    [1.00, 1.00, 0.40],
    [1.00, 0.60, 0.80],
    [0.10, 1.00, 1.00],
    [0.75, 0.70, 1.00],
    [1.00, 0.90, 0.70],
    [0.40, 0.70, 1.00],
    [0.60, 0.00, 0.30],
    [0.90, 1.00, 0.70],
    [0.40, 0.00, 0.40],
];

/// Indexed by surface type code.
pub const BY_TYPE_COLORS: [[f64; 3]; 8] = [
    [1.00, 0.47, 0.20],
    [1.00, 0.87, 0.20],
    [0.67, 1.00, 0.00],
    [0.00, 0.70, 0.58],
    [0.10, 1.00, 1.00],
    [0.00, 0.58, 0.70],
    [0.00, 0.33, 1.00],
    [0.50, 0.40, 1.00],
];

const EXTRA_HUE_OFFSET: f64 = 0.27;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Uniform,
    ByIndex,
    ByType,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Uniform => "uniform",
            ColorMode::ByIndex => "by_index",
            ColorMode::ByType => "by_type",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "uniform" => Ok(ColorMode::Uniform),
            "by_index" | "index" => Ok(ColorMode::ByIndex),
            "by_type" | "type" => Ok(ColorMode::ByType),
            other => Err(Error::InvalidConfig(format!("unknown colour mode: {other}"))),
        }
    }
}

/// One colour per canonical face, in face order.
pub fn face_colors(dataset: &BrepDataset, mode: ColorMode) -> Vec<[f64; 3]> {
    let n = dataset.faces.len();
    match mode {
        ColorMode::Uniform => vec![UNIFORM_COLOR; n],
        ColorMode::ByIndex => index_colors(n),
        ColorMode::ByType => dataset
            .faces
            .iter()
            .map(|f| type_color(f.surface_type))
            .collect(),
    }
}

/// The base table, extended with evenly spaced hues when `n` exceeds it.
pub fn index_colors(n: usize) -> Vec<[f64; 3]> {
    let base = BY_INDEX_COLORS.len();
    let mut colors: Vec<[f64; 3]> = BY_INDEX_COLORS.iter().copied().take(n).collect();
    if n > base {
        let extra = n - base;
        colors.extend((0..extra).map(|i| {
            let hue = (i as f64 / extra as f64 + EXTRA_HUE_OFFSET).rem_euclid(1.0);
            hsv_to_rgb(hue, 1.0, 1.0)
        }));
    }
    colors
}

pub fn type_color(code: u8) -> [f64; 3] {
    BY_TYPE_COLORS
        .get(code as usize)
        .copied()
        .unwrap_or(UNKNOWN_TYPE_COLOR)
}

/// `h`, `s`, `v` in [0, 1].
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    if s <= 0.0 {
        return [v, v, v];
    }
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

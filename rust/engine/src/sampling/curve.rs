// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge sampling and polyline resampling.

use brep_index_topology::{BrepKernel, EvalError};

/// Samples an edge's curve at fixed counts of uniformly spaced parameters.
pub struct CurveSampler<'k, K: BrepKernel> {
    kernel: &'k K,
}

impl<'k, K: BrepKernel> CurveSampler<'k, K> {
    pub fn new(kernel: &'k K) -> Self {
        Self { kernel }
    }

    /// `n` points at `first + (last - first) * i / (n - 1)`.
    ///
    /// A failed evaluation is retried once with the parameter clamped into
    /// the curve range; a second failure fails the whole edge.
    pub fn sample(&self, edge: &K::Shape, n: usize) -> Result<Vec<[f64; 3]>, EvalError> {
        let range = self.kernel.curve_range(edge)?;
        if !range.is_finite() {
            return Err(EvalError::OutOfDomain(range.first, range.last));
        }

        (0..n)
            .map(|i| {
                let t = range.sample(i, n);
                self.kernel
                    .curve_point(edge, t)
                    .or_else(|_| self.kernel.curve_point(edge, range.clamp(t)))
                    .map(|p| [p.x, p.y, p.z])
            })
            .collect()
    }
}

/// Total chord length of a polyline.
pub fn polyline_length(points: &[[f64; 3]]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Resamples a polyline to `k` points equally spaced by arc length.
///
/// The first and last outputs are copies of the first and last inputs. A
/// polyline of zero length yields its first point `k` times.
pub fn resample(points: &[[f64; 3]], k: usize) -> Vec<[f64; 3]> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }
    if k == 1 {
        return vec![first];
    }

    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for w in points.windows(2) {
        total += distance(&w[0], &w[1]);
        cumulative.push(total);
    }

    if total <= 0.0 || !total.is_finite() {
        return vec![first; k];
    }

    let mut out = Vec::with_capacity(k);
    out.push(first);

    let mut seg = 0;
    for i in 1..k - 1 {
        let target = total * i as f64 / (k - 1) as f64;
        while seg + 2 < cumulative.len() && cumulative[seg + 1] < target {
            seg += 1;
        }

        let (a, b) = (cumulative[seg], cumulative[seg + 1]);
        let span = b - a;
        if span <= 0.0 {
            out.push(points[seg + 1]);
            continue;
        }
        let t = ((target - a) / span).clamp(0.0, 1.0);
        out.push(lerp(&points[seg], &points[seg + 1], t));
    }

    out.push(last);
    out
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

fn lerp(a: &[f64; 3], b: &[f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

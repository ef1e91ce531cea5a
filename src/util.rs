use std::f64::consts::PI;

use itertools::Itertools;

/// Rotor speed conversion, rpm to rad/s
pub const RPM_TO_RAD_PER_SEC: f64 = PI / 30.;

/// Rotor speed conversion, rad/s to rpm
pub const RAD_PER_SEC_TO_RPM: f64 = 30. / PI;

#[inline]
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * (i as f64) / ((n - 1) as f64))
            .collect_vec(),
    }
}

/// Derivative of y with respect to x using one-sided differences at the ends
/// and central differences on the interior points.
pub fn gradient(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n < 2 {
        return vec![0.; n];
    }
    (0..n)
        .map(|i| {
            let (a, b) = match i {
                0 => (0, 1),
                _ if i == n - 1 => (n - 2, n - 1),
                _ => (i - 1, i + 1),
            };
            (y[b] - y[a]) / (x[b] - x[a])
        })
        .collect_vec()
}

/// Values normalized to the interval [0, 1] spanned by the first and last entry.
pub fn normalize_span(r: &[f64]) -> Vec<f64> {
    match (r.first(), r.last()) {
        (Some(&r0), Some(&rn)) if rn != r0 => r.iter().map(|&ri| (ri - r0) / (rn - r0)).collect(),
        _ => vec![0.; r.len()],
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

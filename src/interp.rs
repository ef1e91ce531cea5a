use interp::{interp_slice, InterpMode};
use itertools::{izip, Itertools};
use serde::Deserialize;

use crate::error::{Result, StructuralError};

/// Method used to move distributed quantities from one radial grid to another.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpMethod {
    Linear,
    #[default]
    Akima,
    Pchip,
}

/// Interpolates `y(x)` onto `xp` after checking every `xp` lies inside the
/// range of `x`.
pub fn interp_onto(
    x: &[f64],
    y: &[f64],
    xp: &[f64],
    method: InterpMethod,
    quantity: &str,
) -> Result<Vec<f64>> {
    check_abscissae(x, quantity)?;
    check_domain(x, xp, quantity)?;
    if x.len() != y.len() {
        return Err(StructuralError::geometry(
            0,
            quantity,
            format!("has {} values for {} abscissae", y.len(), x.len()),
        ));
    }
    Ok(match method {
        InterpMethod::Linear => interp_slice(x, y, xp, &InterpMode::FirstLast),
        InterpMethod::Akima => HermiteSpline::akima(x, y).eval_slice(xp),
        InterpMethod::Pchip => HermiteSpline::pchip(x, y).eval_slice(xp),
    })
}

/// Returns an error for the first point in `xp` outside `[x[0], x[n-1]]`.
pub fn check_domain(x: &[f64], xp: &[f64], quantity: &str) -> Result<()> {
    let (min, max) = match (x.first(), x.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => return Err(StructuralError::geometry(0, quantity, "grid is empty")),
    };
    let tol = 1e-9 * (max - min).abs().max(1.);
    match xp
        .iter()
        .position(|&v| !(v >= min - tol && v <= max + tol))
    {
        Some(station) => Err(StructuralError::InterpolationDomain {
            station,
            quantity: quantity.to_string(),
            value: xp[station],
            min,
            max,
        }),
        None => Ok(()),
    }
}

fn check_abscissae(x: &[f64], quantity: &str) -> Result<()> {
    if x.len() < 2 {
        return Err(StructuralError::geometry(
            0,
            quantity,
            "needs at least two grid points",
        ));
    }
    match x.windows(2).position(|w| !(w[1] > w[0])) {
        Some(i) => Err(StructuralError::geometry(
            i + 1,
            quantity,
            "grid must be strictly increasing",
        )),
        None => Ok(()),
    }
}

//------------------------------------------------------------------------------
// Piecewise cubic Hermite interpolation
//------------------------------------------------------------------------------

/// Piecewise cubic Hermite curve through `(x, y)` with prescribed nodal slopes.
#[derive(Debug, Clone)]
pub struct HermiteSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl HermiteSpline {
    /// Akima (1970) slopes; the segment slopes are extended by two ghost
    /// segments at each end with linear extrapolation of the slope.
    pub fn akima(x: &[f64], y: &[f64]) -> Self {
        let m = segment_slopes(x, y);
        let n = x.len();
        if n < 3 {
            return Self::linear(x, y, &m);
        }

        // e[k] holds m[k-2]
        let mut e = vec![0.; m.len() + 4];
        e[2..m.len() + 2].copy_from_slice(&m);
        e[1] = 2. * e[2] - e[3];
        e[0] = 2. * e[1] - e[2];
        let k = m.len() + 2;
        e[k] = 2. * e[k - 1] - e[k - 2];
        e[k + 1] = 2. * e[k] - e[k - 1];

        let slopes = (0..n)
            .map(|i| {
                let w1 = (e[i + 3] - e[i + 2]).abs();
                let w2 = (e[i + 1] - e[i]).abs();
                if w1 + w2 == 0. {
                    0.5 * (e[i + 1] + e[i + 2])
                } else {
                    (w1 * e[i + 1] + w2 * e[i + 2]) / (w1 + w2)
                }
            })
            .collect_vec();

        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes,
        }
    }

    /// Monotone piecewise cubic (Fritsch-Carlson) slopes.
    pub fn pchip(x: &[f64], y: &[f64]) -> Self {
        let m = segment_slopes(x, y);
        let n = x.len();
        if n < 3 {
            return Self::linear(x, y, &m);
        }
        let h = x.windows(2).map(|w| w[1] - w[0]).collect_vec();

        let mut slopes = vec![0.; n];
        for k in 1..n - 1 {
            if m[k - 1] * m[k] > 0. {
                let w1 = 2. * h[k] + h[k - 1];
                let w2 = h[k] + 2. * h[k - 1];
                slopes[k] = (w1 + w2) / (w1 / m[k - 1] + w2 / m[k]);
            }
        }
        slopes[0] = pchip_end_slope(h[0], h[1], m[0], m[1]);
        slopes[n - 1] = pchip_end_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);

        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes,
        }
    }

    fn linear(x: &[f64], y: &[f64], m: &[f64]) -> Self {
        let slope = m.first().copied().unwrap_or(0.);
        Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes: vec![slope; x.len()],
        }
    }

    pub fn eval(&self, xp: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }
        // Segment containing xp, clamped to the first and last segment
        let j = self
            .x
            .partition_point(|&xi| xi <= xp)
            .saturating_sub(1)
            .min(n - 2);
        let h = self.x[j + 1] - self.x[j];
        let t = (xp - self.x[j]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2. * t3 - 3. * t2 + 1.;
        let h10 = t3 - 2. * t2 + t;
        let h01 = -2. * t3 + 3. * t2;
        let h11 = t3 - t2;
        h00 * self.y[j]
            + h10 * h * self.slopes[j]
            + h01 * self.y[j + 1]
            + h11 * h * self.slopes[j + 1]
    }

    pub fn eval_slice(&self, xp: &[f64]) -> Vec<f64> {
        xp.iter().map(|&v| self.eval(v)).collect_vec()
    }
}

fn segment_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    izip!(x.windows(2), y.windows(2))
        .map(|(xw, yw)| (yw[1] - yw[0]) / (xw[1] - xw[0]))
        .collect_vec()
}

/// Three point end slope, limited to preserve shape.
fn pchip_end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2. * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0. {
        0.
    } else if m0.signum() != m1.signum() && d.abs() > 3. * m0.abs() {
        3. * m0
    } else {
        d
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_data_is_reproduced() {
        let x = vec![0., 1., 2.5, 4., 7.];
        let y = x.iter().map(|v| 3. * v - 2.).collect_vec();
        let xp = vec![0., 0.3, 2., 5.5, 7.];
        for method in [InterpMethod::Linear, InterpMethod::Akima, InterpMethod::Pchip] {
            let yp = interp_onto(&x, &y, &xp, method, "y").unwrap();
            izip!(xp.iter(), yp.iter())
                .for_each(|(&xi, &yi)| assert_relative_eq!(yi, 3. * xi - 2., epsilon = 1e-12));
        }
    }

    #[test]
    fn test_nodes_are_reproduced() {
        let x = vec![0., 1., 2., 3., 4., 5.];
        let y = vec![0., 0.5, 3., 2., 2., 6.];
        let akima = HermiteSpline::akima(&x, &y);
        let pchip = HermiteSpline::pchip(&x, &y);
        izip!(x.iter(), y.iter()).for_each(|(&xi, &yi)| {
            assert_relative_eq!(akima.eval(xi), yi, epsilon = 1e-12);
            assert_relative_eq!(pchip.eval(xi), yi, epsilon = 1e-12);
        });
    }

    #[test]
    fn test_akima_flat_region_stays_flat() {
        let x = vec![0., 1., 2., 3., 4., 5.];
        let y = vec![0., 0., 0., 1., 1., 1.];
        let s = HermiteSpline::akima(&x, &y);
        assert_relative_eq!(s.eval(0.5), 0., epsilon = 1e-14);
        assert_relative_eq!(s.eval(4.5), 1., epsilon = 1e-14);
    }

    #[test]
    fn test_pchip_is_monotone() {
        let x = vec![0., 1., 2., 3., 4.];
        let y = vec![0., 0.1, 0.2, 5., 5.1];
        let s = HermiteSpline::pchip(&x, &y);
        let v = (0..=400).map(|i| s.eval(i as f64 / 100.)).collect_vec();
        v.windows(2).for_each(|w| assert!(w[1] >= w[0] - 1e-12));
    }

    #[test]
    fn test_domain_error() {
        let x = vec![1., 2., 3.];
        let y = vec![1., 2., 3.];
        let err = interp_onto(&x, &y, &[1.5, 3.5], InterpMethod::Akima, "Px").unwrap_err();
        assert_eq!(
            err,
            StructuralError::InterpolationDomain {
                station: 1,
                quantity: "Px".to_string(),
                value: 3.5,
                min: 1.,
                max: 3.,
            }
        );
    }

    #[test]
    fn test_non_increasing_grid() {
        let x = vec![1., 1., 3.];
        let y = vec![1., 2., 3.];
        let err = interp_onto(&x, &y, &[1.5], InterpMethod::Linear, "Px").unwrap_err();
        assert_eq!(err.station(), Some(1));
    }
}

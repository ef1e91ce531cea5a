use itertools::{izip, Itertools};

use crate::error::{Result, StructuralError};

#[derive(Debug, Clone)]
pub struct Quadrature {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl Quadrature {
    /// Gauss-Legendre rule mapped to the unit interval [0, 1].
    pub fn gauss_unit(order: usize) -> Result<Self> {
        let gl_rule = gauss_quad::GaussLegendre::new(order)
            .map_err(|e| StructuralError::Config(format!("gauss rule of order {order}: {e}")))?;
        let (points, weights) = gl_rule
            .into_node_weight_pairs()
            .iter()
            .rev()
            .map(|&(p, w)| ((p + 1.) / 2., w / 2.))
            .unzip();
        Ok(Quadrature { points, weights })
    }

    /// Trapezoidal rule on the physical abscissae `s`.
    pub fn trapezoidal(s: &[f64]) -> Self {
        let n = s.len();
        let mut weights = vec![0.; n];
        if n > 1 {
            weights[0] = (s[1] - s[0]) / 2.;
            for i in 1..n - 1 {
                weights[i] = (s[i + 1] - s[i - 1]) / 2.;
            }
            weights[n - 1] = (s[n - 1] - s[n - 2]) / 2.;
        }
        Self {
            points: s.to_vec(),
            weights,
        }
    }

    pub fn integrate(&self, f: &[f64]) -> f64 {
        izip!(self.weights.iter(), f.iter())
            .map(|(w, v)| w * v)
            .sum()
    }

    /// Integrates each component of a vector valued function.
    pub fn integrate_vectors(&self, f: &[[f64; 3]]) -> [f64; 3] {
        let c = (0..3)
            .map(|k| self.integrate(&f.iter().map(|v| v[k]).collect_vec()))
            .collect_vec();
        [c[0], c[1], c[2]]
    }
}

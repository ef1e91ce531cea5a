use faer::prelude::*;
use itertools::Itertools;
use tracing::debug;

use crate::{
    components::section::BeamProperties,
    elements::DOF_PER_NODE,
    error::{Result, StructuralError},
    external::CurvedBeamEigensolver,
    util::normalize_span,
};

/// Number of polynomial terms R², ..., R⁶ in a mode shape fit.
pub const N_MODE_TERMS: usize = 5;

/// Natural frequencies and polynomial mode shapes of the curved blade.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalResult {
    /// First natural frequencies in ascending order (Hz)
    pub freq: Vec<f64>,
    /// Rows: first flap, second flap, first edge; columns: R² to R⁶
    /// coefficients, each row summing to one
    pub mode_coefficients: [[f64; N_MODE_TERMS]; 3],
}

/// Runs the curved-beam eigensolver and reduces the mode shapes to the
/// polynomial form used by aeroelastic codes.
pub struct CurvedBeamModes<'a, E: CurvedBeamEigensolver> {
    pub eigensolver: &'a E,
    pub n_freq: usize,
}

impl<E: CurvedBeamEigensolver> CurvedBeamModes<'_, E> {
    pub fn analyze(&self, beam: &BeamProperties, precurve: &[f64], presweep: &[f64], omega: f64) -> Result<ModalResult> {
        let modes = self
            .eigensolver
            .modes(&beam.curved_model(precurve, presweep, omega))?;
        let n_nodes = beam.len();
        let n_modes = modes.freq.len();

        // Flapwise (DOF 0) and edgewise (DOF 1) displacement of every mode
        let component = |mode: usize, dof: usize| {
            (0..n_nodes)
                .map(|i| modes.shapes[(i * DOF_PER_NODE + dof, mode)])
                .collect_vec()
        };
        let energy = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>();

        let (flap_energy, edge_energy): (Vec<f64>, Vec<f64>) = (0..n_modes)
            .map(|j| (energy(&component(j, 0)), energy(&component(j, 1))))
            .unzip();
        let flap_modes = (0..n_modes)
            .filter(|&j| flap_energy[j] > edge_energy[j])
            .collect_vec();
        let edge_modes = (0..n_modes)
            .filter(|&j| edge_energy[j] > flap_energy[j])
            .collect_vec();
        debug!(?flap_modes, ?edge_modes, "curved beam modes classified");

        let pick = |modes: &[usize], k: usize, name: &str| {
            modes
                .get(k)
                .copied()
                .ok_or_else(|| StructuralError::fit(name, "mode not found among the computed modes"))
        };
        let r_norm = normalize_span(&beam.z);
        let flap_1 = pick(&flap_modes, 0, "first flap mode")?;
        let flap_2 = pick(&flap_modes, 1, "second flap mode")?;
        let edge_1 = pick(&edge_modes, 0, "first edge mode")?;

        let mode_coefficients = [
            fit_mode_shape(&r_norm, &component(flap_1, 0), "first flap mode")?,
            fit_mode_shape(&r_norm, &component(flap_2, 0), "second flap mode")?,
            fit_mode_shape(&r_norm, &component(edge_1, 1), "first edge mode")?,
        ];

        Ok(ModalResult {
            freq: modes.freq.into_iter().take(self.n_freq).collect(),
            mode_coefficients,
        })
    }
}

/// Least squares fit of `w(R) = a R² + b R³ + c R⁴ + d R⁵ + e R⁶` through the
/// normal equations, normalized so the coefficients sum to one.
pub fn fit_mode_shape(r: &[f64], w: &[f64], name: &str) -> Result<[f64; N_MODE_TERMS]> {
    if r.len() < N_MODE_TERMS || r.len() != w.len() {
        return Err(StructuralError::fit(
            name,
            format!("needs at least {N_MODE_TERMS} stations, got {}", r.len().min(w.len())),
        ));
    }
    let distinct = r.iter().sorted_by(|a, b| a.total_cmp(b)).dedup().count();
    if distinct < N_MODE_TERMS {
        return Err(StructuralError::fit(name, "normal matrix is singular"));
    }

    let mut a = Mat::<f64>::zeros(N_MODE_TERMS, N_MODE_TERMS);
    let mut b = Col::<f64>::zeros(N_MODE_TERMS);
    for (&x, &y) in r.iter().zip(w.iter()) {
        let phi: [f64; N_MODE_TERMS] = std::array::from_fn(|k| x.powi(k as i32 + 2));
        for i in 0..N_MODE_TERMS {
            b[i] += phi[i] * y;
            for j in 0..N_MODE_TERMS {
                a[(i, j)] += phi[i] * phi[j];
            }
        }
    }

    let coef = a.partial_piv_lu().solve(&b);
    let coef: [f64; N_MODE_TERMS] = std::array::from_fn(|k| coef[k]);
    if coef.iter().any(|c| !c.is_finite()) {
        return Err(StructuralError::fit(name, "normal matrix is singular"));
    }
    let sum: f64 = coef.iter().sum();
    if !(sum.abs() > f64::EPSILON * coef.iter().map(|c| c.abs()).sum::<f64>()) {
        return Err(StructuralError::fit(name, "coefficients sum to zero"));
    }
    Ok(coef.map(|c| c / sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components::section::SectionProperties, elements::curved::CurvedFrameEigensolver, util::linspace};
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_exact_polynomial() {
        let r = linspace(0., 1., 11);
        let w = r.iter().map(|x| 3. * x * x - x.powi(3) + 0.5 * x.powi(6)).collect_vec();
        let coef = fit_mode_shape(&r, &w, "test").unwrap();
        let expected = [3. / 2.5, -1. / 2.5, 0., 0., 0.5 / 2.5];
        for (c, e) in coef.iter().zip(expected.iter()) {
            assert_relative_eq!(c, e, epsilon = 1e-5);
        }
        // Scaling the shape does not change the normalized coefficients
        let w2 = w.iter().map(|v| -7. * v).collect_vec();
        let coef2 = fit_mode_shape(&r, &w2, "test").unwrap();
        for (c, e) in coef2.iter().zip(coef.iter()) {
            assert_relative_eq!(c, e, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_fit_errors() {
        let r = linspace(0., 1., 4);
        assert!(matches!(
            fit_mode_shape(&r, &[0., 1., 2., 3.], "short"),
            Err(StructuralError::NumericalFit { .. })
        ));
        let r = linspace(0., 1., 8);
        assert!(fit_mode_shape(&r, &[0.; 8], "flat").is_err());
        // Coincident stations leave the normal matrix singular
        assert!(fit_mode_shape(&[0.5; 6], &[1.; 6], "singular").is_err());
    }

    #[test]
    fn test_uniform_blade_modes() {
        let section = SectionProperties {
            ea: 1e10,
            ei_xx: 4e9,
            ei_yy: 1e9,
            gj: 1e9,
            rho_a: 200.,
            rho_j: 5.,
            ..Default::default()
        };
        let z = linspace(1., 31., 16);
        let beam = BeamProperties::uniform(&z, &section);
        let zeros = vec![0.; 16];
        let modal = CurvedBeamModes {
            eigensolver: &CurvedFrameEigensolver,
            n_freq: 5,
        };
        let result = modal.analyze(&beam, &zeros, &zeros, 0.).unwrap();
        assert_eq!(result.freq.len(), 5);
        assert!(result.freq.windows(2).all(|w| w[1] >= w[0]));
        for row in result.mode_coefficients.iter() {
            assert_relative_eq!(row.iter().sum::<f64>(), 1., epsilon = 1e-9);
        }
        // Cantilever first mode is dominated by the quadratic and cubic terms
        assert!(result.mode_coefficients[0][0] > 0.);
    }
}

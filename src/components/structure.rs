use itertools::{izip, Itertools};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    components::{
        loads::DamageMoments,
        section::{BeamProperties, StrainPoints},
    },
    config::AnalysisSettings,
    elements::beams::{BeamDisplacements, BeamResultants},
    error::{Result, StructuralError},
    external::BeamFiniteElementSolver,
    frames::DistributedLoad,
};

/// Seconds in a year, one load cycle per second.
const CYCLES_PER_YEAR: f64 = 365. * 24. * 3600.;

/// Form of the fatigue damage output. Defaults to Miner's ratio; the log
/// form is opt-in through `damage_model: log_utilization`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageModel {
    /// Miner's ratio N/Nf
    #[default]
    Miner,
    /// Natural log of the Miner's ratio
    LogUtilization,
}

//------------------------------------------------------------------------------
// Principal axes
//------------------------------------------------------------------------------

/// Bending stiffness about the principal axes through the elastic centre, in
/// profile axes (x chordwise, y flapwise).
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalAxes {
    pub ea: Vec<f64>,
    pub ei_11: Vec<f64>,
    pub ei_22: Vec<f64>,
    pub cos_alpha: Vec<f64>,
    pub sin_alpha: Vec<f64>,
}

impl PrincipalAxes {
    pub fn new(beam: &BeamProperties) -> Result<Self> {
        let n = beam.len();
        let mut axes = Self {
            ea: Vec::with_capacity(n),
            ei_11: Vec::with_capacity(n),
            ei_22: Vec::with_capacity(n),
            cos_alpha: Vec::with_capacity(n),
            sin_alpha: Vec::with_capacity(n),
        };
        for i in 0..n {
            let ea = beam.ea[i];
            if !(ea > 0.) {
                return Err(StructuralError::singular(i, "EA", ea));
            }

            // Airfoil to profile axes
            let (x_ec, y_ec) = (beam.y_ec[i], beam.x_ec[i]);
            let ei_xx = beam.ei_yy[i] - y_ec * y_ec * ea;
            let ei_yy = beam.ei_xx[i] - x_ec * x_ec * ea;
            let ei_xy = beam.ei_xy[i] - x_ec * y_ec * ea;

            let alpha = 0.5 * (2. * ei_xy).atan2(ei_yy - ei_xx);
            let ei_11 = ei_xx - ei_xy * alpha.tan();
            let ei_22 = ei_yy + ei_xy * alpha.tan();
            if !(ei_11 > 0.) {
                return Err(StructuralError::singular(i, "EI11", ei_11));
            }
            if !(ei_22 > 0.) {
                return Err(StructuralError::singular(i, "EI22", ei_22));
            }

            axes.ea.push(ea);
            axes.ei_11.push(ei_11);
            axes.ei_22.push(ei_22);
            axes.cos_alpha.push(alpha.cos());
            axes.sin_alpha.push(alpha.sin());
        }
        Ok(axes)
    }

    /// Axial strain at the points (x, y), given in airfoil axes relative to
    /// the elastic centre, under airfoil-axis moments and axial force.
    pub fn strain(&self, mx: &[f64], my: &[f64], fz: &[f64], x: &[f64], y: &[f64]) -> Vec<f64> {
        izip!(
            mx.iter(),
            my.iter(),
            fz.iter(),
            x.iter(),
            y.iter(),
            self.ea.iter(),
            self.ei_11.iter(),
            self.ei_22.iter(),
            izip!(self.cos_alpha.iter(), self.sin_alpha.iter())
        )
        .map(|(&mx, &my, &fz, &x, &y, &ea, &ei_11, &ei_22, (&ca, &sa))| {
            // Profile axes
            let (mx, my) = (my, mx);
            let (x, y) = (y, x);

            let m1 = mx * ca + my * sa;
            let m2 = -mx * sa + my * ca;
            let x1 = x * ca + y * sa;
            let y1 = -x * sa + y * ca;

            -(m1 / ei_11 * y1 - m2 / ei_22 * x1 + fz / ea)
        })
        .collect_vec()
    }

    /// Fatigue damage at the points from damage-equivalent moments.
    pub fn damage(&self, moments: &DamageMoments, x: &[f64], y: &[f64], limits: &FatigueLimits) -> Vec<f64> {
        let fz = vec![0.; moments.mx.len()];
        let n_cycles = CYCLES_PER_YEAR * limits.lifetime;
        self.strain(&moments.mx, &moments.my, &fz, x, y)
            .into_iter()
            .map(|eps| match limits.model {
                DamageModel::Miner => n_cycles * (limits.eta * eps.abs() / limits.e_max).powf(limits.m),
                DamageModel::LogUtilization => {
                    n_cycles.ln() - limits.m * (limits.e_max.ln() - limits.eta.ln() - eps.abs().ln())
                }
            })
            .collect_vec()
    }
}

/// S-N curve parameters for one material location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueLimits {
    /// Ultimate strain
    pub e_max: f64,
    /// Fatigue safety factor
    pub eta: f64,
    /// S-N slope
    pub m: f64,
    /// Years
    pub lifetime: f64,
    pub model: DamageModel,
}

//------------------------------------------------------------------------------
// Beam structure
//------------------------------------------------------------------------------

/// Distributed loads in airfoil axes for the structural load cases.
#[derive(Debug, Clone)]
pub struct StructuralLoads {
    /// Rated gust, for deflection
    pub rated: DistributedLoad,
    /// Power curve set point, for deflection
    pub power_curve: DistributedLoad,
    /// Extreme wind, for strain
    pub extreme: DistributedLoad,
}

/// Upper and lower strain values of a location along the span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceValues {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamStructureResult {
    pub blade_mass: f64,
    pub blade_moment_of_inertia: f64,
    /// Natural frequencies of the straight beam (Hz)
    pub freq: Vec<f64>,
    pub rated: BeamDisplacements,
    pub power_curve: BeamDisplacements,
    pub extreme_resultants: BeamResultants,
    pub strain_spar: SurfaceValues,
    pub strain_te: SurfaceValues,
    pub damage_spar: SurfaceValues,
    pub damage_te: SurfaceValues,
}

/// Runs the beam finite element service over the structural load cases and
/// recovers strain and fatigue damage.
pub struct BeamStructure<'a, S: BeamFiniteElementSolver> {
    pub solver: &'a S,
    pub settings: &'a AnalysisSettings,
}

impl<S: BeamFiniteElementSolver> BeamStructure<'_, S> {
    pub fn analyze(
        &self,
        beam: &BeamProperties,
        loads: &StructuralLoads,
        spar: &StrainPoints,
        te: &StrainPoints,
        damage_moments: &DamageMoments,
    ) -> Result<BeamStructureResult> {
        let model = beam.beam_model();
        let settings = self.settings;

        let rated = self.solver.solve(&model, &loads.rated)?;
        let power_curve = self.solver.solve(&model, &loads.power_curve)?;
        let mass = self.solver.mass_properties(&model)?;
        let freq = self.solver.natural_frequencies(&model, settings.n_freq)?;
        debug!(blade_mass = mass.mass, ?freq, "beam mass and frequencies");

        let axes = PrincipalAxes::new(beam)?;
        let extreme = self.solver.solve(&model, &loads.extreme)?;
        let res = &extreme.resultants;
        let strain_at = |p: &StrainPoints| SurfaceValues {
            upper: axes.strain(&res.mx, &res.my, &res.fz, &p.xu, &p.yu),
            lower: axes.strain(&res.mx, &res.my, &res.fz, &p.xl, &p.yl),
        };
        let strain_spar = strain_at(spar);
        let strain_te = strain_at(te);

        let limits = |e_max: f64| FatigueLimits {
            e_max,
            eta: settings.gamma_fatigue,
            m: settings.m_damage,
            lifetime: settings.lifetime,
            model: settings.damage_model,
        };
        let damage_at = |p: &StrainPoints, lim: &FatigueLimits| SurfaceValues {
            upper: axes.damage(damage_moments, &p.xu, &p.yu, lim),
            lower: axes.damage(damage_moments, &p.xl, &p.yl, lim),
        };
        let damage_spar = damage_at(spar, &limits(settings.strain_ult_spar));
        let damage_te = damage_at(te, &limits(settings.strain_ult_te));

        info!(
            blade_mass = mass.mass,
            tip_dx = rated.displacements.dx.last().copied().unwrap_or_default(),
            "beam structure analysed"
        );

        Ok(BeamStructureResult {
            blade_mass: mass.mass,
            blade_moment_of_inertia: mass.moment_of_inertia,
            freq,
            rated: rated.displacements,
            power_curve: power_curve.displacements,
            extreme_resultants: extreme.resultants,
            strain_spar,
            strain_te,
            damage_spar,
            damage_te,
        })
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::section::SectionProperties;
    use approx::assert_relative_eq;

    fn skewed_beam() -> BeamProperties {
        let section = SectionProperties {
            ea: 2e9,
            ei_xx: 8e8,
            ei_yy: 3e8,
            ei_xy: -5e7,
            gj: 1e8,
            rho_a: 300.,
            rho_j: 10.,
            x_ec: 0.05,
            y_ec: 0.2,
            ..Default::default()
        };
        BeamProperties::uniform(&[0., 10.], &section)
    }

    #[test]
    fn test_principal_cross_term_vanishes() {
        let beam = skewed_beam();
        let axes = PrincipalAxes::new(&beam).unwrap();
        let ea = beam.ea[0];
        let (x_ec, y_ec) = (beam.y_ec[0], beam.x_ec[0]);
        let ixx = beam.ei_yy[0] - y_ec * y_ec * ea;
        let iyy = beam.ei_xx[0] - x_ec * x_ec * ea;
        let ixy = beam.ei_xy[0] - x_ec * y_ec * ea;
        let (c, s) = (axes.cos_alpha[0], axes.sin_alpha[0]);

        // Second moments in the rotated axes x' = xc + ys, y' = -xs + yc
        let i11 = ixx * c * c - 2. * ixy * s * c + iyy * s * s;
        let i22 = ixx * s * s + 2. * ixy * s * c + iyy * c * c;
        let i12 = (ixx - iyy) * s * c + ixy * (c * c - s * s);
        assert_relative_eq!(i12, 0., epsilon = 1e-9 * ixx);
        assert_relative_eq!(axes.ei_11[0], i11, max_relative = 1e-12);
        assert_relative_eq!(axes.ei_22[0], i22, max_relative = 1e-12);
    }

    #[test]
    fn test_strain_matches_coupled_bending() {
        let beam = skewed_beam();
        let axes = PrincipalAxes::new(&beam).unwrap();
        let ea = beam.ea[0];
        let (x_ec, y_ec) = (beam.y_ec[0], beam.x_ec[0]);
        let ixx = beam.ei_yy[0] - y_ec * y_ec * ea;
        let iyy = beam.ei_xx[0] - x_ec * x_ec * ea;
        let ixy = beam.ei_xy[0] - x_ec * y_ec * ea;

        let (mx_af, my_af, fz) = (3e5, -1e6, 2e5);
        let (x_af, y_af) = (0.3, -0.8);
        let eps = axes.strain(&[mx_af], &[my_af], &[fz], &[x_af], &[y_af]);

        // Curvature from the coupled stiffness [[Ixx, -Ixy], [-Ixy, Iyy]]
        let (mx, my, x, y) = (my_af, mx_af, y_af, x_af);
        let det = ixx * iyy - ixy * ixy;
        let kx = (iyy * mx + ixy * my) / det;
        let ky = (ixy * mx + ixx * my) / det;
        let expected = -(kx * y - ky * x + fz / ea);
        assert_relative_eq!(eps[0], expected, max_relative = 1e-10);
    }

    #[test]
    fn test_flap_bending_compresses_upper_surface() {
        let section = SectionProperties {
            ea: 1e9,
            ei_xx: 4e8,
            ei_yy: 1e8,
            ..Default::default()
        };
        let axes = PrincipalAxes::new(&BeamProperties::uniform(&[0., 1.], &section)).unwrap();
        let eps = axes.strain(&[0.], &[2e5], &[0.], &[0.25], &[0.]);
        assert_relative_eq!(eps[0], -2e5 * 0.25 / 1e8, max_relative = 1e-12);
        // Axial tension (negative fz) stretches the section
        let eps = axes.strain(&[0.], &[0.], &[-1e6], &[0.25], &[0.]);
        assert_relative_eq!(eps[0], 1e-3, max_relative = 1e-12);
    }

    #[test]
    fn test_damage_models() {
        let section = SectionProperties {
            ea: 1e9,
            ei_xx: 4e8,
            ei_yy: 1e8,
            ..Default::default()
        };
        let axes = PrincipalAxes::new(&BeamProperties::uniform(&[0., 1.], &section)).unwrap();
        let moments = DamageMoments {
            mx: vec![0., 0.],
            my: vec![4e4, 0.],
        };
        let mut limits = FatigueLimits {
            e_max: 0.01,
            eta: 1.755,
            m: 10.,
            lifetime: 20.,
            model: DamageModel::Miner,
        };
        let miner = axes.damage(&moments, &[0.25, 0.25], &[0., 0.], &limits);
        let eps = 4e4 * 0.25 / 1e8;
        let n = CYCLES_PER_YEAR * 20.;
        assert_relative_eq!(miner[0], n * (1.755 * eps / 0.01_f64).powi(10), max_relative = 1e-10);
        assert_eq!(miner[1], 0.);

        limits.model = DamageModel::LogUtilization;
        let log = axes.damage(&moments, &[0.25, 0.25], &[0., 0.], &limits);
        assert_relative_eq!(log[0], miner[0].ln(), max_relative = 1e-10);

        assert_eq!(DamageModel::default(), DamageModel::Miner);
        assert_eq!(crate::config::AnalysisSettings::default().damage_model, DamageModel::Miner);
    }

    #[test]
    fn test_singular_stiffness() {
        let section = SectionProperties {
            ea: 1e9,
            ei_xx: 4e8,
            ei_yy: 0.,
            ..Default::default()
        };
        let beam = BeamProperties::uniform(&[0., 1., 2.], &section);
        let err = PrincipalAxes::new(&beam).unwrap_err();
        assert!(matches!(err, StructuralError::SingularStiffness { station: 0, .. }));
    }
}

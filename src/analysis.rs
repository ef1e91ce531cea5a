use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    components::{
        buckling::panel_buckling_strain,
        curvature::{blade_curvature, BladeCurvature},
        loads::{
            damage_loads, extreme_rotor_loads, gust_speed, power_curve_setpoint, AeroLoads, LoadAssembler, LoadCase,
            LoadCondition, RotorLoads,
        },
        margins::{margins, MarginInputs, StructuralMargins},
        mass::{mass_properties, RotorMass},
        modal::{CurvedBeamModes, ModalResult},
        resize::resize_sections,
        root_moment::{hub_loads, root_moment, HubLoads, RootLoads},
        section::{BeamProperties, SectionEngine},
        structure::{BeamStructure, BeamStructureResult, StructuralLoads},
        tip::{BladeDeflectionResult, BladeGeometry, TipDeflection},
    },
    config::{AnalysisSettings, OperatingConditions},
    error::{Result, StructuralError},
    external::{AerodynamicLoadProvider, BeamFiniteElementSolver, CurvedBeamEigensolver},
    input::BladeInput,
    util::linspace,
};

//------------------------------------------------------------------------------
// Load conditions
//------------------------------------------------------------------------------

/// Every operating point the analysis requests aerodynamic loads for.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConditions {
    /// Gust at rated rotor speed with the blade closest to the tower
    pub rated: LoadCondition,
    /// Parked rotor in the 50-year wind
    pub extreme: LoadCondition,
    pub power_curve: LoadCondition,
    pub parked_stuck: LoadCondition,
    pub parked_feathered: LoadCondition,
    /// Rated operation at each root-moment azimuth
    pub root_moment: Vec<LoadCondition>,
}

impl LoadConditions {
    pub fn new(settings: &AnalysisSettings, cond: &OperatingConditions) -> Result<Self> {
        let parked = |case, pitch| LoadCondition {
            case,
            v_hub: cond.v_extreme50,
            omega: 0.,
            pitch,
            azimuth: cond.azimuth_extreme,
        };
        Ok(Self {
            rated: LoadCondition {
                case: LoadCase::Rated,
                v_hub: gust_speed(cond.v_mean, cond.v_rated, settings.turbulence_class, settings.gust_std),
                omega: cond.omega_rated,
                pitch: cond.control_pitch,
                azimuth: 180.,
            },
            extreme: parked(LoadCase::Extreme, cond.pitch_extreme),
            power_curve: power_curve_setpoint(
                cond.control_tsr,
                cond.control_pitch,
                cond.v_rated,
                cond.rotor_radius,
                settings.v_factor_pc,
            )?,
            parked_stuck: parked(LoadCase::ParkedStuck, cond.pitch_extreme),
            parked_feathered: parked(LoadCase::ParkedFeathered, settings.pitch_load89),
            root_moment: root_moment_azimuths(settings, cond.n_blades)
                .into_iter()
                .map(|azimuth| LoadCondition {
                    case: LoadCase::RootMoment,
                    v_hub: cond.v_rated,
                    omega: cond.omega_rated,
                    pitch: cond.control_pitch,
                    azimuth,
                })
                .collect(),
        })
    }

    /// Conditions that need distributed loads, in the order
    /// rated, extreme, power curve, then the root-moment azimuths.
    fn distributed(&self) -> Vec<LoadCondition> {
        [self.rated, self.extreme, self.power_curve]
            .into_iter()
            .chain(self.root_moment.iter().copied())
            .collect()
    }
}

/// Azimuths of the root-moment cases, one per blade unless given explicitly.
fn root_moment_azimuths(settings: &AnalysisSettings, n_blades: usize) -> Vec<f64> {
    if settings.root_moment_azimuths.is_empty() {
        linspace(0., 360., n_blades + 1).into_iter().take(n_blades).collect()
    } else {
        settings.root_moment_azimuths.clone()
    }
}

//------------------------------------------------------------------------------
// Blade analysis
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub conditions: LoadConditions,
    pub beam: BeamProperties,
    pub curvature: BladeCurvature,
    /// Critical panel buckling strain of the spar cap
    pub eps_crit_spar: Vec<f64>,
    /// Critical panel buckling strain of the trailing edge panel
    pub eps_crit_te: Vec<f64>,
    pub structure: BeamStructureResult,
    pub modal: ModalResult,
    /// Root loads in the rated gust
    pub root_rated: RootLoads,
    /// Root loads at each root-moment azimuth
    pub root_azimuth: Vec<(f64, RootLoads)>,
    pub hub: HubLoads,
    pub tip: TipDeflection,
    pub blade_deflection: BladeDeflectionResult,
    pub mass: RotorMass,
    pub extreme_rotor: RotorLoads,
    pub margins: StructuralMargins,
}

/// Structural analysis of one blade with the external services it depends on.
pub struct BladeAnalysis<'a, A, S, E>
where
    A: AerodynamicLoadProvider,
    S: BeamFiniteElementSolver,
    E: CurvedBeamEigensolver,
{
    pub aero: &'a A,
    pub solver: &'a S,
    pub eigensolver: &'a E,
    pub settings: &'a AnalysisSettings,
    pub conditions: &'a OperatingConditions,
}

impl<A, S, E> BladeAnalysis<'_, A, S, E>
where
    A: AerodynamicLoadProvider,
    S: BeamFiniteElementSolver,
    E: CurvedBeamEigensolver,
{
    pub fn run(&self, blade: &BladeInput) -> Result<AnalysisResult> {
        let settings = self.settings;
        let cond = self.conditions;
        settings.validate()?;
        cond.validate()?;
        blade.validate()?;
        let st = &blade.stations;

        // Sections
        let layups = resize_sections(&blade.layups, &st.chord, &blade.targets, &blade.sectors)?;
        let engine = SectionEngine::new(&blade.materials);
        let beam = engine.properties(st, &blade.profiles, &layups)?;
        let eps_crit_spar = panel_buckling_strain(&st.chord, &layups, &blade.materials, &blade.sectors.spar)?;
        let eps_crit_te = panel_buckling_strain(&st.chord, &layups, &blade.materials, &blade.sectors.te)?;
        let spar = engine.strain_points(st, &blade.profiles, &layups, &beam, &blade.sectors.spar)?;
        let te = engine.strain_points(st, &blade.profiles, &layups, &beam, &blade.sectors.te)?;
        info!(n_stations = beam.len(), "section properties computed");

        let curvature = blade_curvature(&st.r, &st.precurve, &st.presweep, cond.precone)?;

        // Aerodynamic loads, one independent evaluation per condition
        let conditions = LoadConditions::new(settings, cond)?;
        let aero = conditions
            .distributed()
            .par_iter()
            .map(|c| self.aero.distributed_loads(c).map(|loads| (*c, loads)))
            .collect::<Result<Vec<(LoadCondition, AeroLoads)>>>()?;
        let (stuck, feathered) = rayon::join(
            || self.aero.rotor_thrust_torque(&conditions.parked_stuck),
            || self.aero.rotor_thrust_torque(&conditions.parked_feathered),
        );
        let aero_for = |target: &LoadCondition| {
            aero.iter()
                .find(|(c, _)| c == target)
                .map(|(_, loads)| loads)
                .ok_or_else(|| StructuralError::Config(format!("missing aerodynamic loads for {:?}", target.case)))
        };
        debug!(n_cases = aero.len(), "aerodynamic loads evaluated");

        // Structural loads in airfoil axes
        let assembler = LoadAssembler {
            r: &st.r,
            theta: &st.theta,
            rho_a: &beam.rho_a,
            curvature: &curvature,
            tilt: cond.tilt,
            gravity: settings.gravity,
            method: settings.interp_method,
        };
        let loads = StructuralLoads {
            rated: assembler.total_loads(aero_for(&conditions.rated)?, &conditions.rated)?,
            power_curve: assembler.total_loads(aero_for(&conditions.power_curve)?, &conditions.power_curve)?,
            extreme: assembler.total_loads(aero_for(&conditions.extreme)?, &conditions.extreme)?,
        };
        let damage = damage_loads(&blade.damage, &st.r, &st.theta)?;

        // Beam response and modes
        let structure = BeamStructure {
            solver: self.solver,
            settings,
        }
        .analyze(&beam, &loads, &spar, &te, &damage)?;
        let modal = CurvedBeamModes {
            eigensolver: self.eigensolver,
            n_freq: settings.n_freq,
        }
        .analyze(&beam, &st.precurve, &st.presweep, cond.omega_rated)?;
        info!(freq = ?modal.freq, "curved beam modes computed");

        // Root and hub loads
        let root_rated = root_moment(aero_for(&conditions.rated)?, &st.r, &curvature)?;
        let root_azimuth = conditions
            .root_moment
            .iter()
            .map(|c| -> Result<_> { Ok((c.azimuth, root_moment(aero_for(c)?, &st.r, &curvature)?)) })
            .collect::<Result<Vec<_>>>()?;
        let hub = hub_loads(&root_azimuth, cond.n_blades)?;

        // Deflection and clearance
        let geometry = BladeGeometry {
            r: &st.r,
            theta: &st.theta,
            precurve: &st.precurve,
            presweep: &st.presweep,
            hub_radius: cond.hub_radius,
            blade_length: cond.blade_length,
            tilt: cond.tilt,
            hub_height: cond.hub_height,
            downwind: cond.downwind,
        };
        let tip = geometry.tip_deflection(
            &structure.rated,
            conditions.rated.pitch,
            curvature.tip_cone(),
            settings.dynamic_factor,
            settings.gamma_m,
        )?;
        let blade_deflection = geometry.blade_deflection(
            &structure.power_curve,
            conditions.power_curve.pitch,
            &cond.precurve_control_r,
        )?;

        let mass = mass_properties(
            structure.blade_mass,
            structure.blade_moment_of_inertia,
            cond.tilt,
            cond.n_blades,
        )?;
        let extreme_rotor = extreme_rotor_loads(stuck?, feathered?, cond.n_blades)?;

        let margins = margins(
            &MarginInputs {
                freq_beam: &structure.freq,
                freq_curved: &modal.freq,
                strain_spar: &structure.strain_spar,
                strain_te: &structure.strain_te,
                eps_crit_spar: &eps_crit_spar,
                eps_crit_te: &eps_crit_te,
                damage_spar: &structure.damage_spar,
                damage_te: &structure.damage_te,
            },
            cond.omega_rated,
            cond.n_blades,
            settings,
        )?;

        info!(
            blade_mass = structure.blade_mass,
            tip_deflection = tip.tip_deflection,
            ground_clearance = tip.ground_clearance,
            root_bending_moment = root_rated.bending_moment,
            "blade analysis complete"
        );

        Ok(AnalysisResult {
            conditions,
            beam,
            curvature,
            eps_crit_spar,
            eps_crit_te,
            structure,
            modal,
            root_rated,
            root_azimuth,
            hub,
            tip,
            blade_deflection,
            mass,
            extreme_rotor,
            margins,
        })
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn conditions() -> OperatingConditions {
        OperatingConditions {
            v_rated: 11.4,
            v_mean: 10.,
            v_extreme50: 70.,
            omega_rated: 12.1,
            control_tsr: 7.55,
            control_pitch: 0.5,
            rotor_radius: 63.,
            pitch_extreme: 0.,
            azimuth_extreme: 90.,
            tilt: 5.,
            precone: 2.5,
            hub_height: 90.,
            downwind: false,
            n_blades: 3,
            hub_radius: 1.5,
            blade_length: 61.5,
            precurve_control_r: vec![],
        }
    }

    #[test]
    fn test_load_conditions() {
        let settings = AnalysisSettings::default();
        let c = LoadConditions::new(&settings, &conditions()).unwrap();

        assert_eq!(c.rated.azimuth, 180.);
        assert!(c.rated.v_hub > 11.4);
        assert_eq!(c.rated.omega, 12.1);

        assert_eq!(c.extreme.omega, 0.);
        assert_eq!(c.extreme.azimuth, 90.);
        assert_eq!(c.parked_feathered.pitch, 89.);
        assert_eq!(c.parked_stuck.pitch, 0.);

        assert_relative_eq!(c.power_curve.v_hub, 0.7 * 11.4, max_relative = 1e-14);
        assert_eq!(c.power_curve.pitch, 0.5);

        let azimuths = c.root_moment.iter().map(|r| r.azimuth).collect::<Vec<_>>();
        assert_eq!(azimuths, vec![0., 120., 240.]);

        let distributed = c.distributed();
        assert_eq!(distributed.len(), 6);
        assert_eq!(distributed[0], c.rated);
        assert_eq!(distributed[5].azimuth, 240.);
    }

    #[test]
    fn test_root_moment_azimuths() {
        let mut settings = AnalysisSettings::default();
        let mut cond = conditions();
        let azimuths = |s: &AnalysisSettings, c: &OperatingConditions| {
            let c = LoadConditions::new(s, c).unwrap();
            c.root_moment.iter().map(|r| r.azimuth).collect::<Vec<_>>()
        };

        cond.n_blades = 2;
        assert_eq!(azimuths(&settings, &cond), vec![0., 180.]);
        cond.n_blades = 4;
        assert_eq!(azimuths(&settings, &cond), vec![0., 90., 180., 270.]);

        settings.root_moment_azimuths = vec![0., 120., 240.];
        assert_eq!(azimuths(&settings, &cond), vec![0., 120., 240.]);
    }
}

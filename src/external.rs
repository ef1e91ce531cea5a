use serde::Deserialize;

use crate::{
    components::loads::{AeroLoads, LoadCase, LoadCondition, RotorLoads},
    config::read_yaml,
    elements::{
        beams::{BeamMass, BeamModel, BeamResponse, CantileverBeamSolver},
        curved::{CurvedBeamModel, CurvedFrameEigensolver, CurvedModes},
    },
    error::{Result, StructuralError},
    frames::DistributedLoad,
};

//------------------------------------------------------------------------------
// Service traits
//------------------------------------------------------------------------------

/// Aerodynamic analysis of the rotor.
pub trait AerodynamicLoadProvider: Sync {
    /// Distributed loads per unit length in blade axes.
    fn distributed_loads(&self, cond: &LoadCondition) -> Result<AeroLoads>;

    /// Rotor thrust and torque.
    fn rotor_thrust_torque(&self, cond: &LoadCondition) -> Result<RotorLoads>;
}

/// Static and modal analysis of a straight cantilever beam.
pub trait BeamFiniteElementSolver: Sync {
    fn solve(&self, model: &BeamModel, load: &DistributedLoad) -> Result<BeamResponse>;

    fn mass_properties(&self, model: &BeamModel) -> Result<BeamMass>;

    /// First `n` natural frequencies (Hz) in ascending order.
    fn natural_frequencies(&self, model: &BeamModel, n: usize) -> Result<Vec<f64>>;
}

/// Modal analysis of a curved, rotating blade.
pub trait CurvedBeamEigensolver: Sync {
    fn modes(&self, model: &CurvedBeamModel) -> Result<CurvedModes>;
}

impl BeamFiniteElementSolver for CantileverBeamSolver {
    fn solve(&self, model: &BeamModel, load: &DistributedLoad) -> Result<BeamResponse> {
        CantileverBeamSolver::solve(self, model, load)
    }

    fn mass_properties(&self, model: &BeamModel) -> Result<BeamMass> {
        CantileverBeamSolver::mass_properties(self, model)
    }

    fn natural_frequencies(&self, model: &BeamModel, n: usize) -> Result<Vec<f64>> {
        CantileverBeamSolver::natural_frequencies(self, model, n)
    }
}

impl CurvedBeamEigensolver for CurvedFrameEigensolver {
    fn modes(&self, model: &CurvedBeamModel) -> Result<CurvedModes> {
        CurvedFrameEigensolver::modes(self, model)
    }
}

//------------------------------------------------------------------------------
// Tabulated aerodynamic loads
//------------------------------------------------------------------------------

pub fn read_aero_loads_from_file(file_path: &str) -> Result<TabulatedAeroLoads> {
    read_yaml(file_path)
}

/// Aerodynamic loads computed elsewhere and tabulated per load case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabulatedAeroLoads {
    pub cases: Vec<TabulatedCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TabulatedCase {
    pub case: LoadCase,
    /// Rotor azimuth the table applies to (deg); any azimuth when absent
    #[serde(default)]
    pub azimuth: Option<f64>,
    #[serde(flatten)]
    pub loads: AeroLoads,
    #[serde(default)]
    pub thrust: f64,
    #[serde(default)]
    pub torque: f64,
}

impl TabulatedAeroLoads {
    /// Entry for the case of `cond`, preferring one tabulated at its azimuth.
    fn lookup(&self, cond: &LoadCondition) -> Result<&TabulatedCase> {
        let matching = || self.cases.iter().filter(|c| c.case == cond.case);
        matching()
            .find(|c| c.azimuth.is_some_and(|a| (a - cond.azimuth).abs() < 1e-9))
            .or_else(|| matching().find(|c| c.azimuth.is_none()))
            .ok_or_else(|| {
                StructuralError::Config(format!(
                    "no tabulated aerodynamic loads for {:?} at azimuth {}",
                    cond.case, cond.azimuth
                ))
            })
    }
}

impl AerodynamicLoadProvider for TabulatedAeroLoads {
    fn distributed_loads(&self, cond: &LoadCondition) -> Result<AeroLoads> {
        Ok(self.lookup(cond)?.loads.clone())
    }

    fn rotor_thrust_torque(&self, cond: &LoadCondition) -> Result<RotorLoads> {
        let entry = self.lookup(cond)?;
        Ok(RotorLoads {
            thrust: entry.thrust,
            torque: entry.torque,
        })
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

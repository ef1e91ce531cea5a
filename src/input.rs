use serde::Deserialize;

use crate::{
    components::{
        loads::DamageEquivalentMoments,
        resize::{StrainSectors, ThicknessTargets},
        section::AirfoilProfile,
    },
    config::read_yaml,
    error::{Result, StructuralError},
    laminate::{Material, SectionLayup},
};

pub fn read_blade_from_file(file_path: &str) -> Result<BladeInput> {
    let blade: BladeInput = read_yaml(file_path)?;
    blade.validate()?;
    Ok(blade)
}

/// Spanwise stations of the blade reference axis, ascending in r.
#[derive(Debug, Clone, Deserialize)]
pub struct Stations {
    pub r: Vec<f64>,
    pub chord: Vec<f64>,
    /// Structural twist (deg)
    pub theta: Vec<f64>,
    /// Pitch axis to leading edge distance as a fraction of chord
    pub le_location: Vec<f64>,
    pub precurve: Vec<f64>,
    pub presweep: Vec<f64>,
}

impl Stations {
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

/// Geometry, materials and laminate schedule of one blade.
#[derive(Debug, Clone, Deserialize)]
pub struct BladeInput {
    pub stations: Stations,
    pub materials: Vec<Material>,
    /// One profile per station
    pub profiles: Vec<AirfoilProfile>,
    /// One layup per station
    pub layups: Vec<SectionLayup>,
    pub sectors: StrainSectors,
    pub targets: ThicknessTargets,
    pub damage: DamageEquivalentMoments,
}

impl BladeInput {
    pub fn validate(&self) -> Result<()> {
        let n = self.stations.len();
        if n < 2 {
            return Err(StructuralError::geometry(0, "r", "needs at least two stations"));
        }
        let s = &self.stations;
        for (name, len) in [
            ("chord", s.chord.len()),
            ("theta", s.theta.len()),
            ("le_location", s.le_location.len()),
            ("precurve", s.precurve.len()),
            ("presweep", s.presweep.len()),
            ("profiles", self.profiles.len()),
            ("layups", self.layups.len()),
            ("spar sectors", self.sectors.spar.len()),
            ("te sectors", self.sectors.te.len()),
            ("chord_ref", self.targets.chord_ref.len()),
            ("spar thickness", self.targets.spar.len()),
            ("te thickness", self.targets.te.len()),
        ] {
            if len != n {
                return Err(StructuralError::geometry(
                    0,
                    name,
                    format!("has {len} values for {n} stations"),
                ));
            }
        }
        if let Some(i) = s.r.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(StructuralError::geometry(i + 1, "r", "must be strictly increasing"));
        }
        if let Some(i) = s.chord.iter().position(|c| !(*c > 0.)) {
            return Err(StructuralError::geometry(i, "chord", "must be positive"));
        }
        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate(i)?;
        }
        if self.materials.is_empty() {
            return Err(StructuralError::Config("blade has no materials".into()));
        }

        let d = &self.damage;
        if d.r_star.len() < 2 || d.mxb.len() != d.r_star.len() || d.myb.len() != d.r_star.len() {
            return Err(StructuralError::Config(
                "damage equivalent moments need matching r_star, mxb and myb with at least two entries".into(),
            ));
        }
        Ok(())
    }
}

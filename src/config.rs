use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    components::{loads::TurbulenceClass, structure::DamageModel},
    error::{Result, StructuralError},
    interp::InterpMethod,
};

pub(crate) fn read_yaml<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let yaml_file = std::fs::read_to_string(file_path).map_err(|e| StructuralError::Io {
        path: file_path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(serde_yaml::from_str(&yaml_file)?)
}

pub fn read_settings_from_file(file_path: &str) -> Result<AnalysisSettings> {
    read_yaml(file_path)
}

pub fn read_conditions_from_file(file_path: &str) -> Result<OperatingConditions> {
    read_yaml(file_path)
}

/// Safety factors, material limits and analysis options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Partial safety factor on loads
    pub gamma_f: f64,
    /// Partial safety factor on materials
    pub gamma_m: f64,
    /// Partial safety factor on natural frequencies
    pub gamma_freq: f64,
    /// Partial safety factor for fatigue
    pub gamma_fatigue: f64,
    pub strain_ult_spar: f64,
    pub strain_ult_te: f64,
    /// Slope of the S-N curve
    pub m_damage: f64,
    /// Design life (years)
    pub lifetime: f64,
    pub damage_model: DamageModel,
    /// Amplification of the static tip deflection
    pub dynamic_factor: f64,
    /// Number of natural frequencies kept
    pub n_freq: usize,
    pub gravity: f64,
    pub interp_method: InterpMethod,
    /// Fraction of rated speed used for the power curve deflection
    pub v_factor_pc: f64,
    /// Gust strength in standard deviations
    pub gust_std: f64,
    pub turbulence_class: TurbulenceClass,
    /// Pitch of the parked, feathered load case (deg)
    pub pitch_load89: f64,
    /// Rotor azimuths the root moment is evaluated at (deg). Empty places
    /// one case at each blade azimuth.
    pub root_moment_azimuths: Vec<f64>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            gamma_f: 1.35,
            gamma_m: 1.1,
            gamma_freq: 1.1,
            gamma_fatigue: 1.755,
            strain_ult_spar: 0.01,
            strain_ult_te: 0.0025,
            m_damage: 10.,
            lifetime: 20.,
            damage_model: DamageModel::default(),
            dynamic_factor: 1.2,
            n_freq: 5,
            gravity: 9.81,
            interp_method: InterpMethod::default(),
            v_factor_pc: 0.7,
            gust_std: 3.,
            turbulence_class: TurbulenceClass::default(),
            pitch_load89: 89.,
            root_moment_azimuths: vec![],
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("gamma_f", self.gamma_f),
            ("gamma_m", self.gamma_m),
            ("gamma_freq", self.gamma_freq),
            ("gamma_fatigue", self.gamma_fatigue),
            ("strain_ult_spar", self.strain_ult_spar),
            ("strain_ult_te", self.strain_ult_te),
            ("m_damage", self.m_damage),
            ("lifetime", self.lifetime),
        ];
        if let Some((name, v)) = positive.iter().find(|(_, v)| !(*v > 0.)) {
            return Err(StructuralError::Config(format!("{name} must be positive, got {v}")));
        }
        if self.n_freq == 0 {
            return Err(StructuralError::Config("n_freq must be at least 1".into()));
        }
        Ok(())
    }
}

/// Turbine and wind conditions the blade operates in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperatingConditions {
    /// Rated wind speed (m/s)
    pub v_rated: f64,
    /// IEC annual mean wind speed (m/s)
    pub v_mean: f64,
    /// 50-year extreme wind speed (m/s)
    pub v_extreme50: f64,
    /// Rated rotor speed (rpm)
    pub omega_rated: f64,
    pub control_tsr: f64,
    /// Region 2 pitch (deg)
    pub control_pitch: f64,
    pub rotor_radius: f64,
    /// Pitch of the stuck blade in the extreme case (deg)
    pub pitch_extreme: f64,
    /// Azimuth of the extreme case (deg)
    pub azimuth_extreme: f64,
    pub tilt: f64,
    pub precone: f64,
    pub hub_height: f64,
    #[serde(default)]
    pub downwind: bool,
    pub n_blades: usize,
    pub hub_radius: f64,
    pub blade_length: f64,
    /// Radii of the precurve spline control points
    #[serde(default)]
    pub precurve_control_r: Vec<f64>,
}

impl OperatingConditions {
    pub fn validate(&self) -> Result<()> {
        if self.n_blades == 0 {
            return Err(StructuralError::Config("n_blades must be at least 1".into()));
        }
        if !(self.rotor_radius > 0.) {
            return Err(StructuralError::Config(format!(
                "rotor_radius must be positive, got {}",
                self.rotor_radius
            )));
        }
        Ok(())
    }
}

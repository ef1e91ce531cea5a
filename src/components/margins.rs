use itertools::{izip, Itertools};

use crate::{
    components::structure::SurfaceValues,
    config::AnalysisSettings,
    error::{Result, StructuralError},
};

/// Blade frequencies relative to the rotor excitation frequencies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyMargins {
    /// Blade passing frequency over each natural frequency
    pub pn: Vec<f64>,
    /// Rotor frequency over each natural frequency
    pub p1: Vec<f64>,
}

/// Demand over capacity ratios; values below one satisfy the constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralMargins {
    pub freq_beam: FrequencyMargins,
    pub freq_curved: FrequencyMargins,
    pub strain_spar: SurfaceValues,
    pub strain_te: SurfaceValues,
    pub buckling_spar: SurfaceValues,
    pub buckling_te: SurfaceValues,
    pub damage_spar: SurfaceValues,
    pub damage_te: SurfaceValues,
}

/// Structural response the margins are evaluated from.
#[derive(Debug, Clone, Copy)]
pub struct MarginInputs<'a> {
    /// Straight beam natural frequencies (Hz)
    pub freq_beam: &'a [f64],
    /// Curved beam natural frequencies (Hz)
    pub freq_curved: &'a [f64],
    pub strain_spar: &'a SurfaceValues,
    pub strain_te: &'a SurfaceValues,
    /// Critical panel buckling strain of the spar cap
    pub eps_crit_spar: &'a [f64],
    /// Critical panel buckling strain of the trailing edge panel
    pub eps_crit_te: &'a [f64],
    pub damage_spar: &'a SurfaceValues,
    pub damage_te: &'a SurfaceValues,
}

fn frequency_margins(freq: &[f64], f_rotor: f64, n_blades: f64) -> Result<FrequencyMargins> {
    if let Some((i, &f)) = freq.iter().find_position(|f| !(**f > 0.)) {
        return Err(StructuralError::singular(i, "natural frequency", f));
    }
    Ok(FrequencyMargins {
        pn: freq.iter().map(|f| n_blades * f_rotor / f).collect(),
        p1: freq.iter().map(|f| f_rotor / f).collect(),
    })
}

fn scaled(values: &SurfaceValues, factor: f64, capacity: &[f64], quantity: &str) -> Result<SurfaceValues> {
    let ratio = |v: &[f64]| {
        izip!(v.iter(), capacity.iter())
            .enumerate()
            .map(|(i, (&e, &c))| {
                if c == 0. {
                    Err(StructuralError::singular(i, quantity, c))
                } else {
                    Ok(e * factor / c)
                }
            })
            .collect::<Result<Vec<_>>>()
    };
    Ok(SurfaceValues {
        upper: ratio(&values.upper)?,
        lower: ratio(&values.lower)?,
    })
}

/// Frequency, ultimate strain, buckling and fatigue margins at rotor speed
/// `omega` (rpm).
pub fn margins(
    inputs: &MarginInputs,
    omega: f64,
    n_blades: usize,
    settings: &AnalysisSettings,
) -> Result<StructuralMargins> {
    let f_rotor = omega / 60. * settings.gamma_freq;
    let n = n_blades as f64;
    let gamma_strain = settings.gamma_f * settings.gamma_m;

    let ultimate = |v: &SurfaceValues, limit: f64| vec![limit; v.upper.len().max(v.lower.len())];

    Ok(StructuralMargins {
        freq_beam: frequency_margins(inputs.freq_beam, f_rotor, n)?,
        freq_curved: frequency_margins(inputs.freq_curved, f_rotor, n)?,
        strain_spar: scaled(
            inputs.strain_spar,
            gamma_strain,
            &ultimate(inputs.strain_spar, settings.strain_ult_spar),
            "ultimate spar strain",
        )?,
        strain_te: scaled(
            inputs.strain_te,
            gamma_strain,
            &ultimate(inputs.strain_te, settings.strain_ult_te),
            "ultimate trailing edge strain",
        )?,
        buckling_spar: scaled(
            inputs.strain_spar,
            settings.gamma_f,
            inputs.eps_crit_spar,
            "spar buckling strain",
        )?,
        buckling_te: scaled(
            inputs.strain_te,
            settings.gamma_f,
            inputs.eps_crit_te,
            "trailing edge buckling strain",
        )?,
        damage_spar: inputs.damage_spar.clone(),
        damage_te: inputs.damage_te.clone(),
    })
}

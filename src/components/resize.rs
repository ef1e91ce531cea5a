use itertools::izip;
use serde::Deserialize;

use crate::{
    error::{Result, StructuralError},
    laminate::SectionLayup,
};

/// Target laminate thicknesses per station.
#[derive(Debug, Clone, Deserialize)]
pub struct ThicknessTargets {
    /// Chord of the reference section the layup thicknesses were defined for
    pub chord_ref: Vec<f64>,
    /// Spar cap thickness
    pub spar: Vec<f64>,
    /// Trailing-edge panel thickness
    pub te: Vec<f64>,
}

/// Sector indices of the spar cap and trailing-edge panel per station.
#[derive(Debug, Clone, Deserialize)]
pub struct StrainSectors {
    pub spar: Vec<usize>,
    pub te: Vec<usize>,
}

/// Scales every ply with chord/chord_ref (fixed thickness-to-chord ratio),
/// then rescales the upper and lower plies of the spar cap and trailing-edge
/// sectors so the sector thickness equals the target.
///
/// Upper and lower surfaces share the design thickness, so the upper surface
/// sets the base thickness of both.
pub fn resize_sections(
    layups: &[SectionLayup],
    chord: &[f64],
    targets: &ThicknessTargets,
    sectors: &StrainSectors,
) -> Result<Vec<SectionLayup>> {
    izip!(
        layups.iter(),
        chord.iter(),
        targets.chord_ref.iter(),
        targets.spar.iter(),
        targets.te.iter(),
        sectors.spar.iter(),
        sectors.te.iter(),
    )
    .enumerate()
    .map(
        |(station, (layup, &chord, &chord_ref, &spar_t, &te_t, &idx_spar, &idx_te))| {
            if chord_ref == 0. {
                return Err(StructuralError::geometry(station, "chord_ref", "is zero"));
            }
            let factor = chord / chord_ref;
            let mut layup = layup.clone();
            layup.upper.scale_thickness(factor);
            layup.lower.scale_thickness(factor);
            layup.webs.scale_thickness(factor);

            for (idx, target, name) in [(idx_spar, spar_t, "spar"), (idx_te, te_t, "te")] {
                scale_sector(&mut layup, station, idx, target, name)?;
            }
            Ok(layup)
        },
    )
    .collect()
}

fn scale_sector(
    layup: &mut SectionLayup,
    station: usize,
    idx: usize,
    target: f64,
    name: &str,
) -> Result<()> {
    let n = layup.upper.n_sectors().min(layup.lower.n_sectors());
    if idx >= n {
        return Err(StructuralError::geometry(
            station,
            &format!("{name} sector index"),
            format!("{idx} out of range for {n} sectors"),
        ));
    }
    let base = layup.upper.sectors[idx].thickness();
    if base == 0. {
        return Err(StructuralError::geometry(
            station,
            &format!("{name} sector thickness"),
            "sums to zero",
        ));
    }
    let ratio = target / base;
    layup.upper.sectors[idx]
        .plies
        .iter_mut()
        .chain(layup.lower.sectors[idx].plies.iter_mut())
        .for_each(|p| p.thickness *= ratio);
    Ok(())
}

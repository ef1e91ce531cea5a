use std::f64::consts::PI;

use itertools::izip;

use crate::{
    error::{Result, StructuralError},
    laminate::{Material, SectionLayup},
};

/// Critical compressive strain of the upper-surface panel in `sector` at each
/// station, treating the panel as a long orthotropic plate simply supported
/// along its edges. Values are negative (compression).
pub fn panel_buckling_strain(
    chord: &[f64],
    layups: &[SectionLayup],
    materials: &[Material],
    sector: &[usize],
) -> Result<Vec<f64>> {
    izip!(chord.iter(), layups.iter(), sector.iter())
        .enumerate()
        .map(|(station, (&c, layup, &idx))| {
            let stack = &layup.upper;
            let (Some(&a), Some(&b)) = (stack.loc.get(idx), stack.loc.get(idx + 1)) else {
                return Err(StructuralError::geometry(
                    station,
                    "buckling sector index",
                    format!("{idx} out of range for {} sectors", stack.n_sectors()),
                ));
            };
            let length = c * (b - a);
            if !(length > 0.) {
                return Err(StructuralError::geometry(station, "panel length", "must be positive"));
            }

            let lam = stack.sectors[idx]
                .stiffness(materials)
                .map_err(|e| e.at_station(station))?;
            let d = &lam.d;
            let d1 = d[(0, 0)];
            let d2 = d[(1, 1)];
            let d3 = d[(0, 1)] + 2. * d[(2, 2)];
            let n_xx = 2. * (PI / length).powi(2) * ((d1 * d2).sqrt() + d3);

            let axial = lam.thickness * lam.e_axial;
            if !(axial > 0.) {
                return Err(StructuralError::singular(station, "panel membrane stiffness", axial));
            }
            Ok(-n_xx / axial)
        })
        .collect()
}

use faer::prelude::*;
use serde::Deserialize;

use crate::error::{Result, StructuralError};

//------------------------------------------------------------------------------
// Material
//------------------------------------------------------------------------------

/// Orthotropic ply material in its principal axes.
#[derive(Debug, Clone, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: String,
    pub e1: f64,
    pub e2: f64,
    pub g12: f64,
    pub nu12: f64,
    pub rho: f64,
}

impl Material {
    pub fn isotropic(name: &str, e: f64, nu: f64, rho: f64) -> Self {
        Self {
            name: name.to_string(),
            e1: e,
            e2: e,
            g12: e / (2. * (1. + nu)),
            nu12: nu,
            rho,
        }
    }

    /// Plane stress reduced stiffness [Q11, Q12, Q22, Q66]
    fn reduced_stiffness(&self) -> [f64; 4] {
        let nu21 = self.nu12 * self.e2 / self.e1;
        let d = 1. - self.nu12 * nu21;
        [
            self.e1 / d,
            self.nu12 * self.e2 / d,
            self.e2 / d,
            self.g12,
        ]
    }

    /// Reduced stiffness rotated by `angle` degrees, in (1, 2, 6) order.
    pub fn rotated_stiffness(&self, angle: f64) -> Mat<f64> {
        let [q11, q12, q22, q66] = self.reduced_stiffness();
        let (s, c) = angle.to_radians().sin_cos();
        let (c2, s2) = (c * c, s * s);
        let (c4, s4, s2c2) = (c2 * c2, s2 * s2, s2 * c2);

        let qb11 = q11 * c4 + 2. * (q12 + 2. * q66) * s2c2 + q22 * s4;
        let qb22 = q11 * s4 + 2. * (q12 + 2. * q66) * s2c2 + q22 * c4;
        let qb12 = (q11 + q22 - 4. * q66) * s2c2 + q12 * (s4 + c4);
        let qb66 = (q11 + q22 - 2. * q12 - 2. * q66) * s2c2 + q66 * (s4 + c4);
        let qb16 = (q11 - q12 - 2. * q66) * s * c * c2 + (q12 - q22 + 2. * q66) * s * s2 * c;
        let qb26 = (q11 - q12 - 2. * q66) * s * s2 * c + (q12 - q22 + 2. * q66) * s * c * c2;

        mat![
            [qb11, qb12, qb16],
            [qb12, qb22, qb26],
            [qb16, qb26, qb66],
        ]
    }
}

//------------------------------------------------------------------------------
// Laminate
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Ply {
    /// Total thickness of the ply group (m)
    pub thickness: f64,
    /// Fibre orientation (deg)
    pub orientation: f64,
    /// Index into the material list
    pub material: usize,
}

/// Ordered plies from the outer mould line inward.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Laminate {
    pub plies: Vec<Ply>,
}

/// Classical laminate stiffness matrices plus derived wall properties.
#[derive(Debug, Clone)]
pub struct LaminateStiffness {
    pub a: Mat<f64>,
    pub b: Mat<f64>,
    pub d: Mat<f64>,
    /// Total thickness
    pub thickness: f64,
    /// Effective axial modulus 1/(h a11) from the inverse of [A B; B D]
    pub e_axial: f64,
    /// Effective in-plane shear modulus 1/(h a66)
    pub g_shear: f64,
    /// Mass per unit area
    pub mass_per_area: f64,
}

impl Laminate {
    pub fn thickness(&self) -> f64 {
        self.plies.iter().map(|p| p.thickness).sum()
    }

    /// Builds the A, B and D matrices with z measured from the mid-plane.
    pub fn stiffness(&self, materials: &[Material]) -> Result<LaminateStiffness> {
        let h = self.thickness();
        if !(h > 0.) {
            return Err(StructuralError::geometry(
                0,
                "laminate thickness",
                "must be positive",
            ));
        }

        let mut a = Mat::<f64>::zeros(3, 3);
        let mut b = Mat::<f64>::zeros(3, 3);
        let mut d = Mat::<f64>::zeros(3, 3);
        let mut mass_per_area = 0.;

        let mut z_bot = -h / 2.;
        for ply in self.plies.iter() {
            let material = materials.get(ply.material).ok_or_else(|| {
                StructuralError::geometry(
                    0,
                    "ply material",
                    format!("index {} not in material list", ply.material),
                )
            })?;
            let z_top = z_bot + ply.thickness;
            let q = material.rotated_stiffness(ply.orientation);
            let (h1, h2, h3) = (
                z_top - z_bot,
                (z_top.powi(2) - z_bot.powi(2)) / 2.,
                (z_top.powi(3) - z_bot.powi(3)) / 3.,
            );
            zip!(&mut a, &mut b, &mut d, &q).for_each(|unzip!(a, b, d, q)| {
                *a += *q * h1;
                *b += *q * h2;
                *d += *q * h3;
            });
            mass_per_area += material.rho * ply.thickness;
            z_bot = z_top;
        }

        // Compliance of the full coupled laminate
        let abd = Mat::<f64>::from_fn(6, 6, |i, j| match (i < 3, j < 3) {
            (true, true) => a[(i, j)],
            (true, false) => b[(i, j - 3)],
            (false, true) => b[(i - 3, j)],
            (false, false) => d[(i - 3, j - 3)],
        });
        let compliance = abd.full_piv_lu().solve(&Mat::<f64>::identity(6, 6));
        let (a11, a66) = (compliance[(0, 0)], compliance[(2, 2)]);
        if !(a11.is_finite() && a66.is_finite() && a11 > 0. && a66 > 0.) {
            return Err(StructuralError::singular(0, "laminate ABD", a11));
        }

        Ok(LaminateStiffness {
            a,
            b,
            d,
            thickness: h,
            e_axial: 1. / (h * a11),
            g_shear: 1. / (h * a66),
            mass_per_area,
        })
    }
}

/// Laminate definition along one surface of a section.
///
/// For the upper and lower surfaces `loc` holds the normalized chordwise
/// sector boundaries (one more than the number of sectors). For the shear
/// webs `loc` holds one normalized chordwise position per web.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaminateStack {
    pub loc: Vec<f64>,
    pub sectors: Vec<Laminate>,
}

impl LaminateStack {
    pub fn n_sectors(&self) -> usize {
        self.sectors.len()
    }

    /// Multiplies every ply thickness by `factor`.
    pub fn scale_thickness(&mut self, factor: f64) {
        self.sectors
            .iter_mut()
            .flat_map(|s| s.plies.iter_mut())
            .for_each(|p| p.thickness *= factor);
    }

    /// Sector containing the normalized chord position `x`.
    pub fn sector_at(&self, x: f64) -> Option<usize> {
        let n = self.sectors.len();
        (0..n).find(|&i| {
            x >= self.loc[i] && (x < self.loc[i + 1] || (i == n - 1 && x <= self.loc[i + 1]))
        })
    }
}

/// Laminate stacks of one blade station.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionLayup {
    pub upper: LaminateStack,
    pub lower: LaminateStack,
    #[serde(default)]
    pub webs: LaminateStack,
}

impl SectionLayup {
    pub fn n_webs(&self) -> usize {
        self.webs.loc.len()
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

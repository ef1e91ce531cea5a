use faer::prelude::*;
use interp::{interp, InterpMode};
use itertools::{izip, Itertools};
use serde::Deserialize;
use tracing::debug;

use crate::{
    elements::{beams::BeamModel, curved::CurvedBeamModel},
    error::{Result, StructuralError},
    input::Stations,
    laminate::{LaminateStack, LaminateStiffness, Material, SectionLayup},
    util::gradient,
};

//------------------------------------------------------------------------------
// Profile
//------------------------------------------------------------------------------

/// Outer mould line normalized by chord; x runs from the nose (0) to the
/// trailing edge (1) in profile axes.
#[derive(Debug, Clone, Deserialize)]
pub struct AirfoilProfile {
    pub x: Vec<f64>,
    pub y_upper: Vec<f64>,
    pub y_lower: Vec<f64>,
}

impl AirfoilProfile {
    pub fn upper_at(&self, x: f64) -> f64 {
        interp(&self.x, &self.y_upper, x, &InterpMode::default())
    }

    pub fn lower_at(&self, x: f64) -> f64 {
        interp(&self.x, &self.y_lower, x, &InterpMode::default())
    }

    pub fn validate(&self, station: usize) -> Result<()> {
        let n = self.x.len();
        if n < 2 || self.y_upper.len() != n || self.y_lower.len() != n {
            return Err(StructuralError::geometry(
                station,
                "profile",
                "needs matching x, y_upper and y_lower with at least two points",
            ));
        }
        if self.x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(StructuralError::geometry(station, "profile x", "must be strictly increasing"));
        }
        if self.x[0] < 0. || self.x[n - 1] > 1. {
            return Err(StructuralError::geometry(station, "profile x", "must lie within [0, 1]"));
        }
        Ok(())
    }
}

//------------------------------------------------------------------------------
// Section properties
//------------------------------------------------------------------------------

/// Beam properties of one section. Bending stiffnesses are about the pitch
/// axis in airfoil axes (x flapwise, y edgewise).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionProperties {
    pub ea: f64,
    /// Edgewise stiffness (bending about airfoil x)
    pub ei_xx: f64,
    /// Flapwise stiffness (bending about airfoil y)
    pub ei_yy: f64,
    pub ei_xy: f64,
    pub gj: f64,
    pub rho_a: f64,
    pub rho_j: f64,
    /// Flapwise mass inertia about the mass centre
    pub flap_iner: f64,
    /// Edgewise mass inertia about the mass centre
    pub edge_iner: f64,
    /// Elastic centre from the pitch axis, airfoil axes
    pub x_ec: f64,
    pub y_ec: f64,
    /// Orientation of the principal mass inertia axes including twist (deg)
    pub tw_iner: f64,
    /// Elastic centre from the nose, profile axes
    pub x_ec_nose: f64,
    pub y_ec_nose: f64,
}

/// Section properties of every station, one column per quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeamProperties {
    pub z: Vec<f64>,
    pub ea: Vec<f64>,
    pub ei_xx: Vec<f64>,
    pub ei_yy: Vec<f64>,
    pub ei_xy: Vec<f64>,
    pub gj: Vec<f64>,
    pub rho_a: Vec<f64>,
    pub rho_j: Vec<f64>,
    pub flap_iner: Vec<f64>,
    pub edge_iner: Vec<f64>,
    pub x_ec: Vec<f64>,
    pub y_ec: Vec<f64>,
    pub tw_iner: Vec<f64>,
    pub x_ec_nose: Vec<f64>,
    pub y_ec_nose: Vec<f64>,
}

impl BeamProperties {
    pub fn from_sections(z: &[f64], sections: &[SectionProperties]) -> Self {
        let col = |f: fn(&SectionProperties) -> f64| sections.iter().map(f).collect_vec();
        Self {
            z: z.to_vec(),
            ea: col(|s| s.ea),
            ei_xx: col(|s| s.ei_xx),
            ei_yy: col(|s| s.ei_yy),
            ei_xy: col(|s| s.ei_xy),
            gj: col(|s| s.gj),
            rho_a: col(|s| s.rho_a),
            rho_j: col(|s| s.rho_j),
            flap_iner: col(|s| s.flap_iner),
            edge_iner: col(|s| s.edge_iner),
            x_ec: col(|s| s.x_ec),
            y_ec: col(|s| s.y_ec),
            tw_iner: col(|s| s.tw_iner),
            x_ec_nose: col(|s| s.x_ec_nose),
            y_ec_nose: col(|s| s.y_ec_nose),
        }
    }

    /// Uniform properties at every station, elastic centre on the pitch axis.
    pub fn uniform(z: &[f64], section: &SectionProperties) -> Self {
        Self::from_sections(z, &vec![*section; z.len()])
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    pub fn beam_model(&self) -> BeamModel {
        BeamModel {
            z: self.z.clone(),
            ea: self.ea.clone(),
            ei_xx: self.ei_xx.clone(),
            ei_yy: self.ei_yy.clone(),
            ei_xy: self.ei_xy.clone(),
            gj: self.gj.clone(),
            rho_a: self.rho_a.clone(),
            rho_j: self.rho_j.clone(),
        }
    }

    /// Curved model following the blade shape, section axes oriented by the
    /// principal inertia angle.
    pub fn curved_model(&self, precurve: &[f64], presweep: &[f64], omega: f64) -> CurvedBeamModel {
        CurvedBeamModel {
            omega,
            twist: self.tw_iner.clone(),
            z: self.z.clone(),
            precurve: precurve.to_vec(),
            presweep: presweep.to_vec(),
            ea: self.ea.clone(),
            ei_flap: self.ei_yy.clone(),
            ei_edge: self.ei_xx.clone(),
            gj: self.gj.clone(),
            rho_a: self.rho_a.clone(),
            rho_j: self.rho_j.clone(),
        }
    }
}

/// Extreme fibre points of one sector on the upper and lower surface, in
/// airfoil axes relative to the elastic centre.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrainPoints {
    pub xu: Vec<f64>,
    pub yu: Vec<f64>,
    pub xl: Vec<f64>,
    pub yl: Vec<f64>,
}

//------------------------------------------------------------------------------
// Thin-wall section
//------------------------------------------------------------------------------

/// Straight piece of wall mid-line in profile axes relative to the pitch axis.
#[derive(Debug, Clone, Copy)]
struct Wall {
    a: [f64; 2],
    b: [f64; 2],
    /// Axial modulus times thickness
    et: f64,
    /// Shear modulus times thickness
    gt: f64,
    /// Mass per unit area
    mass: f64,
}

impl Wall {
    fn length(&self) -> f64 {
        ((self.b[0] - self.a[0]).powi(2) + (self.b[1] - self.a[1]).powi(2)).sqrt()
    }

    /// Line integrals of [1, X, Y, X², Y², XY] along the wall
    fn moments(&self) -> [f64; 6] {
        let l = self.length();
        let (xc, yc) = (0.5 * (self.a[0] + self.b[0]), 0.5 * (self.a[1] + self.b[1]));
        let (dx, dy) = (self.b[0] - self.a[0], self.b[1] - self.a[1]);
        [
            l,
            l * xc,
            l * yc,
            l * (xc * xc + dx * dx / 12.),
            l * (yc * yc + dy * dy / 12.),
            l * (xc * yc + dx * dy / 12.),
        ]
    }

    /// Line integrals of ρ² and ρ⁴ about `c` using 3 point Gauss quadrature.
    fn polar_moments(&self, c: [f64; 2]) -> (f64, f64) {
        const GAUSS: [(f64, f64); 3] = [
            (0.112_701_665_379_258_3, 5. / 18.),
            (0.5, 8. / 18.),
            (0.887_298_334_620_741_7, 5. / 18.),
        ];
        let l = self.length();
        GAUSS.iter().fold((0., 0.), |(k2, k4), &(s, w)| {
            let x = self.a[0] + s * (self.b[0] - self.a[0]) - c[0];
            let y = self.a[1] + s * (self.b[1] - self.a[1]) - c[1];
            let r2 = x * x + y * y;
            (k2 + w * l * r2, k4 + w * l * r2 * r2)
        })
    }
}

/// Wall on the upper or lower surface between two chord positions.
#[derive(Debug, Clone, Copy)]
struct SurfaceWall {
    wall: Wall,
    x_mid: f64,
}

/// Computes beam properties from laminate layups and profile geometry using
/// classical laminate theory and a thin-wall multi-cell section model.
pub struct SectionEngine<'a> {
    materials: &'a [Material],
}

impl<'a> SectionEngine<'a> {
    pub fn new(materials: &'a [Material]) -> Self {
        Self { materials }
    }

    /// Properties of all stations; the twist rate comes from local
    /// differentiation of the twist schedule.
    pub fn properties(
        &self,
        stations: &Stations,
        profiles: &[AirfoilProfile],
        layups: &[SectionLayup],
    ) -> Result<BeamProperties> {
        let twist_rate = gradient(&stations.r, &stations.theta)
            .into_iter()
            .map(f64::to_radians)
            .collect_vec();

        let sections = izip!(profiles.iter(), layups.iter(), twist_rate.iter())
            .enumerate()
            .map(|(i, (profile, layup, &th_prime))| {
                self.section(
                    i,
                    stations.chord[i],
                    stations.theta[i],
                    th_prime,
                    stations.le_location[i],
                    profile,
                    layup,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(n_stations = sections.len(), "section properties computed");
        Ok(BeamProperties::from_sections(&stations.r, &sections))
    }

    fn stack_stiffness(
        &self,
        station: usize,
        stack: &LaminateStack,
        name: &str,
    ) -> Result<Vec<LaminateStiffness>> {
        stack
            .sectors
            .iter()
            .map(|lam| {
                lam.stiffness(self.materials).map_err(|e| match e {
                    StructuralError::Geometry { reason, .. } => {
                        StructuralError::geometry(station, &format!("{name} laminate"), reason)
                    }
                    StructuralError::SingularStiffness { value, .. } => {
                        StructuralError::singular(station, &format!("{name} laminate ABD"), value)
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// Walls of one surface from the nose towards the trailing edge. `upper`
    /// selects the surface curve and the inward offset direction.
    #[allow(clippy::too_many_arguments)]
    fn surface_walls(
        &self,
        station: usize,
        chord: f64,
        x_pitch: f64,
        profile: &AirfoilProfile,
        stack: &LaminateStack,
        web_loc: &[f64],
        upper: bool,
    ) -> Result<Vec<SurfaceWall>> {
        let name = if upper { "upper" } else { "lower" };
        if stack.loc.len() != stack.sectors.len() + 1 {
            return Err(StructuralError::geometry(
                station,
                &format!("{name} sector locations"),
                "must have one more entry than sectors",
            ));
        }
        let abd = self.stack_stiffness(station, stack, name)?;
        let y_at = |x: f64| {
            chord
                * if upper {
                    profile.upper_at(x)
                } else {
                    profile.lower_at(x)
                }
        };

        let (lo, hi) = (stack.loc[0], stack.loc[stack.loc.len() - 1]);
        let mut xs = profile
            .x
            .iter()
            .chain(stack.loc.iter())
            .chain(web_loc.iter())
            .copied()
            .filter(|&x| x >= lo && x <= hi)
            .collect_vec();
        xs.sort_by(f64::total_cmp);
        xs.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        let mut walls = vec![];
        for w in xs.windows(2) {
            let x_mid = 0.5 * (w[0] + w[1]);
            let Some(k) = stack.sector_at(x_mid) else {
                continue;
            };
            let lam = &abd[k];
            let a = [w[0] * chord - x_pitch, y_at(w[0])];
            let b = [w[1] * chord - x_pitch, y_at(w[1])];
            let l = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            if !(l > 0.) {
                continue;
            }
            let d = [(b[0] - a[0]) / l, (b[1] - a[1]) / l];
            let n = if upper { [d[1], -d[0]] } else { [-d[1], d[0]] };
            let off = 0.5 * lam.thickness;
            walls.push(SurfaceWall {
                wall: Wall {
                    a: [a[0] + off * n[0], a[1] + off * n[1]],
                    b: [b[0] + off * n[0], b[1] + off * n[1]],
                    et: lam.e_axial * lam.thickness,
                    gt: lam.g_shear * lam.thickness,
                    mass: lam.mass_per_area,
                },
                x_mid,
            });
        }
        Ok(walls)
    }

    /// Web walls spanning between the upper and lower wall mid-lines.
    fn web_walls(
        &self,
        station: usize,
        chord: f64,
        x_pitch: f64,
        profile: &AirfoilProfile,
        layup: &SectionLayup,
    ) -> Result<Vec<Wall>> {
        let webs = &layup.webs;
        if webs.loc.len() != webs.sectors.len() {
            return Err(StructuralError::geometry(
                station,
                "web locations",
                "must have one entry per web laminate",
            ));
        }
        let abd = self.stack_stiffness(station, webs, "web")?;
        let skin = |stack: &LaminateStack, x: f64| -> Result<f64> {
            match stack.sector_at(x) {
                Some(k) => Ok(stack.sectors[k].thickness()),
                None => Ok(0.),
            }
        };

        izip!(webs.loc.iter(), abd.iter())
            .map(|(&w, lam)| {
                let top = chord * profile.upper_at(w) - 0.5 * skin(&layup.upper, w)?;
                let bottom = chord * profile.lower_at(w) + 0.5 * skin(&layup.lower, w)?;
                if !(top > bottom) {
                    return Err(StructuralError::geometry(
                        station,
                        "web height",
                        format!("is not positive at x/c = {w}"),
                    ));
                }
                let x = w * chord - x_pitch;
                Ok(Wall {
                    a: [x, top],
                    b: [x, bottom],
                    et: lam.e_axial * lam.thickness,
                    gt: lam.g_shear * lam.thickness,
                    mass: lam.mass_per_area,
                })
            })
            .collect()
    }

    /// Properties of one station.
    #[allow(clippy::too_many_arguments)]
    pub fn section(
        &self,
        station: usize,
        chord: f64,
        theta: f64,
        twist_rate: f64,
        le_location: f64,
        profile: &AirfoilProfile,
        layup: &SectionLayup,
    ) -> Result<SectionProperties> {
        profile.validate(station)?;
        if !(chord > 0.) {
            return Err(StructuralError::geometry(station, "chord", "must be positive"));
        }
        if layup.webs.loc.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(StructuralError::geometry(station, "web locations", "must be increasing"));
        }
        let x_pitch = le_location * chord;

        let upper = self.surface_walls(station, chord, x_pitch, profile, &layup.upper, &layup.webs.loc, true)?;
        let lower = self.surface_walls(station, chord, x_pitch, profile, &layup.lower, &layup.webs.loc, false)?;
        let webs = self.web_walls(station, chord, x_pitch, profile, layup)?;

        let all_walls = upper
            .iter()
            .chain(lower.iter())
            .map(|s| &s.wall)
            .chain(webs.iter())
            .collect_vec();

        // Stiffness and mass weighted integrals
        let mut e_int = [0.; 6];
        let mut m_int = [0.; 6];
        for wall in all_walls.iter() {
            let mom = wall.moments();
            for k in 0..6 {
                e_int[k] += wall.et * mom[k];
                m_int[k] += wall.mass * mom[k];
            }
        }
        let [ea, es_x, es_y, ei_x2, ei_y2, ei_xy] = e_int;
        let [rho_a, ms_x, ms_y, mi_x2, mi_y2, mi_xy] = m_int;

        if !(ea > 0.) {
            return Err(StructuralError::singular(station, "EA", ea));
        }
        if !(rho_a > 0.) {
            return Err(StructuralError::geometry(station, "rhoA", "must be positive"));
        }

        // Tension (elastic) centre and bending about it
        let tc = [es_x / ea, es_y / ea];
        let ec_xx = ei_x2 - ea * tc[0] * tc[0];
        let ec_yy = ei_y2 - ea * tc[1] * tc[1];
        let ec_xy = ei_xy - ea * tc[0] * tc[1];
        if !(ec_xx > 0.) {
            return Err(StructuralError::singular(station, "edgewise EI about elastic centre", ec_xx));
        }
        if !(ec_yy > 0.) {
            return Err(StructuralError::singular(station, "flapwise EI about elastic centre", ec_yy));
        }
        let det = ec_xx * ec_yy - ec_xy * ec_xy;
        if !(det > 0.) {
            return Err(StructuralError::singular(station, "bending stiffness determinant", det));
        }

        // Elastic centre inside the profile envelope
        let xn = (tc[0] + x_pitch) / chord;
        let tol = 1e-9 * chord;
        if !(0. ..=1.).contains(&xn)
            || tc[1] > chord * profile.upper_at(xn) + tol
            || tc[1] < chord * profile.lower_at(xn) - tol
        {
            return Err(StructuralError::geometry(
                station,
                "elastic centre",
                "lies outside the profile",
            ));
        }

        let gj = self.torsion(station, chord, &upper, &lower, &webs, &layup.webs.loc)?;
        let (ek2, ek4) = all_walls.iter().fold((0., 0.), |(k2, k4), wall| {
            let (p2, p4) = wall.polar_moments(tc);
            (k2 + wall.et * p2, k4 + wall.et * p4)
        });
        let gj = gj + twist_rate * twist_rate * (ek4 - ek2 * ek2 / ea);

        // Mass inertia about the mass centre
        let mc = [ms_x / rho_a, ms_y / rho_a];
        let edge_iner = mi_x2 - rho_a * mc[0] * mc[0];
        let flap_iner = mi_y2 - rho_a * mc[1] * mc[1];
        let iner_xy = mi_xy - rho_a * mc[0] * mc[1];
        let tw_iner = theta + (0.5 * (2. * iner_xy).atan2(edge_iner - flap_iner)).to_degrees();

        Ok(SectionProperties {
            ea,
            ei_xx: ei_x2,
            ei_yy: ei_y2,
            ei_xy,
            gj,
            rho_a,
            rho_j: flap_iner + edge_iner,
            flap_iner,
            edge_iner,
            x_ec: tc[1],
            y_ec: tc[0],
            tw_iner,
            x_ec_nose: tc[0] + x_pitch,
            y_ec_nose: tc[1],
        })
    }

    /// Saint-Venant torsional stiffness of the closed cells formed by the skin
    /// and the webs (Bredt-Batho, multi-cell).
    fn torsion(
        &self,
        station: usize,
        chord: f64,
        upper: &[SurfaceWall],
        lower: &[SurfaceWall],
        webs: &[Wall],
        web_loc: &[f64],
    ) -> Result<f64> {
        // Cell boundaries: nose, webs, trailing edge
        let bounds = std::iter::once(0.)
            .chain(web_loc.iter().copied())
            .chain(std::iter::once(1.))
            .collect_vec();
        let cells = (0..bounds.len() - 1)
            .filter(|&j| bounds[j + 1] - bounds[j] > 1e-9)
            .collect_vec();
        let n_cells = cells.len();
        if n_cells == 0 {
            return Err(StructuralError::singular(station, "GJ", 0.));
        }

        let web_flexibility = |k: usize| webs[k].length() / webs[k].gt;
        let mut a = Mat::<f64>::zeros(n_cells, n_cells);
        let mut rhs = Col::<f64>::zeros(n_cells);
        for (ci, &j) in cells.iter().enumerate() {
            let inside = |s: &&SurfaceWall| s.x_mid > bounds[j] && s.x_mid < bounds[j + 1];
            let skin_flexibility = upper
                .iter()
                .chain(lower.iter())
                .filter(inside)
                .map(|s| s.wall.length() / s.wall.gt)
                .sum::<f64>();

            // Webs bounding the cell: web j-1 on the nose side, web j on the TE side
            let web_sum = [j.checked_sub(1), Some(j).filter(|&k| k < webs.len())]
                .into_iter()
                .flatten()
                .map(web_flexibility)
                .sum::<f64>();
            a[(ci, ci)] = skin_flexibility + web_sum;

            // Enclosed area between the upper and lower mid-lines
            let strip = |s: &SurfaceWall| 0.5 * (s.wall.b[0] - s.wall.a[0]) * (s.wall.a[1] + s.wall.b[1]);
            let area = upper.iter().filter(inside).map(strip).sum::<f64>()
                - lower.iter().filter(inside).map(strip).sum::<f64>();
            rhs[ci] = 2. * area;
        }

        // Webs shared by two adjacent cells
        for ci in 0..n_cells.saturating_sub(1) {
            let (j, jn) = (cells[ci], cells[ci + 1]);
            if jn == j + 1 && j < webs.len() {
                a[(ci, ci + 1)] = -web_flexibility(j);
                a[(ci + 1, ci)] = -web_flexibility(j);
            }
        }

        if let Some(ci) = (0..n_cells).find(|&ci| !(a[(ci, ci)] > 0.)) {
            return Err(StructuralError::singular(station, "cell shear flexibility", a[(ci, ci)]));
        }

        let q = a.partial_piv_lu().solve(&rhs);
        let gj = (0..n_cells).map(|ci| rhs[ci] * q[ci]).sum::<f64>();
        if !(gj.is_finite() && gj > 0.) {
            return Err(StructuralError::singular(station, "GJ", gj));
        }
        debug!(station, n_cells, gj, chord, "torsional stiffness");
        Ok(gj)
    }

    /// Strain recovery points at the middle of `sector` on both surfaces.
    pub fn strain_points(
        &self,
        stations: &Stations,
        profiles: &[AirfoilProfile],
        layups: &[SectionLayup],
        beam: &BeamProperties,
        sector: &[usize],
    ) -> Result<StrainPoints> {
        let mut pts = StrainPoints::default();
        for (i, (profile, layup, &idx)) in izip!(profiles.iter(), layups.iter(), sector.iter()).enumerate() {
            let mid = |stack: &LaminateStack, name: &str| -> Result<f64> {
                match (stack.loc.get(idx), stack.loc.get(idx + 1)) {
                    (Some(a), Some(b)) => Ok(0.5 * (a + b)),
                    _ => Err(StructuralError::geometry(
                        i,
                        &format!("{name} strain sector"),
                        format!("index {idx} out of range"),
                    )),
                }
            };
            let c = stations.chord[i];
            let xun = mid(&layup.upper, "upper")?;
            let xln = mid(&layup.lower, "lower")?;

            // Profile axes relative to the elastic centre
            let xu = xun * c - beam.x_ec_nose[i];
            let yu = profile.upper_at(xun) * c - beam.y_ec_nose[i];
            let xl = xln * c - beam.x_ec_nose[i];
            let yl = profile.lower_at(xln) * c - beam.y_ec_nose[i];

            // Airfoil axes
            pts.xu.push(yu);
            pts.yu.push(xu);
            pts.xl.push(yl);
            pts.yl.push(xl);
        }
        Ok(pts)
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

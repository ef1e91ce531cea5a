use faer::prelude::*;
use itertools::{izip, Itertools};

use crate::{
    elements::{assemble_element, clamped_modes, frame_element, rotate_element, FrameSection, DOF_PER_NODE},
    error::{Result, StructuralError},
    util::{cross, dot, norm, RPM_TO_RAD_PER_SEC},
};

/// Blade axis following precurve and presweep with section properties at
/// each station. Positions are in the azimuth frame.
#[derive(Debug, Clone)]
pub struct CurvedBeamModel {
    /// Rotor speed (rpm)
    pub omega: f64,
    /// Orientation of the section axes about the blade axis (deg)
    pub twist: Vec<f64>,
    pub z: Vec<f64>,
    pub precurve: Vec<f64>,
    pub presweep: Vec<f64>,
    pub ea: Vec<f64>,
    /// Flapwise bending stiffness
    pub ei_flap: Vec<f64>,
    /// Edgewise bending stiffness
    pub ei_edge: Vec<f64>,
    pub gj: Vec<f64>,
    pub rho_a: Vec<f64>,
    pub rho_j: Vec<f64>,
}

/// Natural frequencies (Hz) in ascending order and the mode shapes with six
/// DOFs `[x, y, z, θx, θy, θz]` per station, root station included.
#[derive(Debug, Clone)]
pub struct CurvedModes {
    pub freq: Vec<f64>,
    pub shapes: Mat<f64>,
}

impl CurvedBeamModel {
    pub fn n_nodes(&self) -> usize {
        self.z.len()
    }

    fn validate(&self) -> Result<()> {
        let n = self.n_nodes();
        if n < 2 {
            return Err(StructuralError::geometry(0, "curved beam z", "needs at least two stations"));
        }
        for (name, v) in [
            ("twist", &self.twist),
            ("precurve", &self.precurve),
            ("presweep", &self.presweep),
            ("EA", &self.ea),
            ("EIflap", &self.ei_flap),
            ("EIedge", &self.ei_edge),
            ("GJ", &self.gj),
            ("rhoA", &self.rho_a),
            ("rhoJ", &self.rho_j),
        ] {
            if v.len() != n {
                return Err(StructuralError::geometry(
                    0,
                    name,
                    format!("has {} values for {} stations", v.len(), n),
                ));
            }
        }
        Ok(())
    }

    fn position(&self, i: usize) -> [f64; 3] {
        [self.precurve[i], self.presweep[i], self.z[i]]
    }

    /// Spanwise tension from the centrifugal load outboard of each station.
    fn tension(&self) -> Vec<f64> {
        let omega = self.omega * RPM_TO_RAD_PER_SEC;
        let f = izip!(self.rho_a.iter(), self.z.iter())
            .map(|(&m, &z)| m * omega * omega * z)
            .collect_vec();
        let mut t = vec![0.; self.n_nodes()];
        for i in (0..self.n_nodes() - 1).rev() {
            t[i] = t[i + 1] + 0.5 * (f[i] + f[i + 1]) * (self.z[i + 1] - self.z[i]);
        }
        t
    }

    /// Local-from-global rotation of element `i`: rows are the flapwise and
    /// edgewise section axes rotated by twist, then the element tangent.
    fn element_axes(&self, i: usize) -> Result<([[f64; 3]; 3], f64)> {
        let (a, b) = (self.position(i), self.position(i + 1));
        let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let l = norm(&d);
        if !(l > 0.) {
            return Err(StructuralError::geometry(i + 1, "curved beam element", "has zero length"));
        }
        let t = [d[0] / l, d[1] / l, d[2] / l];

        // Flapwise reference axis orthogonal to the tangent
        let xt = dot(&[1., 0., 0.], &t);
        let e1 = [1. - xt * t[0], -xt * t[1], -xt * t[2]];
        let n1 = norm(&e1);
        if !(n1 > 1e-9) {
            return Err(StructuralError::geometry(
                i + 1,
                "curved beam element",
                "is aligned with the flapwise axis",
            ));
        }
        let e1 = [e1[0] / n1, e1[1] / n1, e1[2] / n1];
        let e2 = cross(&t, &e1);

        let twist = 0.5 * (self.twist[i] + self.twist[i + 1]);
        let (s, c) = twist.to_radians().sin_cos();
        let r1 = [0, 1, 2].map(|k| c * e1[k] - s * e2[k]);
        let r2 = [0, 1, 2].map(|k| s * e1[k] + c * e2[k]);
        Ok(([r1, r2, t], l))
    }
}

/// Frame finite element eigensolver for a curved, rotating blade.
///
/// Each station interval is a straight Euler-Bernoulli frame element along
/// the chord between the two curved-axis points, with section axes rotated by
/// the local twist. Rotation adds geometric stiffness from the spanwise
/// centrifugal tension.
#[derive(Debug, Clone, Default)]
pub struct CurvedFrameEigensolver;

impl CurvedFrameEigensolver {
    pub fn modes(&self, model: &CurvedBeamModel) -> Result<CurvedModes> {
        model.validate()?;
        let n_nodes = model.n_nodes();
        let n_dofs = n_nodes * DOF_PER_NODE;
        let tension = model.tension();

        let section = |i: usize| FrameSection {
            ea: model.ea[i],
            ei_1: model.ei_flap[i],
            ei_2: model.ei_edge[i],
            ei_12: 0.,
            gj: model.gj[i],
            rho_a: model.rho_a[i],
            rho_j: model.rho_j[i],
            tension: tension[i],
        };

        let mut k = Mat::<f64>::zeros(n_dofs, n_dofs);
        let mut m = Mat::<f64>::zeros(n_dofs, n_dofs);
        for i in 0..n_nodes - 1 {
            let (rot, l) = model.element_axes(i)?;
            let (ke, me) = frame_element(&FrameSection::average(&section(i), &section(i + 1)), l);
            assemble_element(&mut k, &rotate_element(&ke, &rot), i);
            assemble_element(&mut m, &rotate_element(&me, &rot), i);
        }

        let (freq, shapes) = clamped_modes(&k, &m, DOF_PER_NODE)
            .map_err(|reason| StructuralError::fit("curved beam modes", reason))?;
        Ok(CurvedModes { freq, shapes })
    }
}

use faer::prelude::*;
use itertools::{izip, Itertools};

use crate::{
    elements::{assemble_element, clamped_modes, frame_element, hermite_shape, FrameSection, DOF_PER_NODE},
    error::{Result, StructuralError},
    frames::{DistributedLoad, Frame},
    quadrature::Quadrature,
};

/// Straight beam along z with sections given at each station, in the airfoil
/// aligned axes (x flapwise, y edgewise).
#[derive(Debug, Clone)]
pub struct BeamModel {
    pub z: Vec<f64>,
    pub ea: Vec<f64>,
    pub ei_xx: Vec<f64>,
    pub ei_yy: Vec<f64>,
    pub ei_xy: Vec<f64>,
    pub gj: Vec<f64>,
    pub rho_a: Vec<f64>,
    pub rho_j: Vec<f64>,
}

impl BeamModel {
    pub fn n_nodes(&self) -> usize {
        self.z.len()
    }

    fn section(&self, i: usize) -> FrameSection {
        // Displacement along x (flap) is resisted by EIyy, along y (edge) by EIxx
        FrameSection {
            ea: self.ea[i],
            ei_1: self.ei_yy[i],
            ei_2: self.ei_xx[i],
            ei_12: self.ei_xy[i],
            gj: self.gj[i],
            rho_a: self.rho_a[i],
            rho_j: self.rho_j[i],
            tension: 0.,
        }
    }

    fn validate(&self) -> Result<()> {
        let n = self.n_nodes();
        if n < 2 {
            return Err(StructuralError::geometry(0, "beam z", "needs at least two stations"));
        }
        for (name, v) in [
            ("EA", &self.ea),
            ("EIxx", &self.ei_xx),
            ("EIyy", &self.ei_yy),
            ("EIxy", &self.ei_xy),
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
        if let Some(i) = self.z.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(StructuralError::geometry(i + 1, "beam z", "must be strictly increasing"));
        }
        Ok(())
    }

    /// Assembled global stiffness and mass matrices, root DOFs first.
    fn assemble(&self) -> (Mat<f64>, Mat<f64>) {
        let n_dofs = self.n_nodes() * DOF_PER_NODE;
        let mut k = Mat::<f64>::zeros(n_dofs, n_dofs);
        let mut m = Mat::<f64>::zeros(n_dofs, n_dofs);
        for i in 0..self.n_nodes() - 1 {
            let section = FrameSection::average(&self.section(i), &self.section(i + 1));
            let (ke, me) = frame_element(&section, self.z[i + 1] - self.z[i]);
            assemble_element(&mut k, &ke, i);
            assemble_element(&mut m, &me, i);
        }
        (k, m)
    }
}

/// Nodal displacements of the beam axis in airfoil axes.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamDisplacements {
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
    pub dz: Vec<f64>,
    pub dtheta_x: Vec<f64>,
    pub dtheta_y: Vec<f64>,
    pub dtheta_z: Vec<f64>,
}

/// Section resultants at each station.
///
/// Forces are those the inboard span exerts on the outboard span so axial
/// tension gives a negative `fz`; moments are the moments of the outboard
/// loads about the station.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamResultants {
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub fz: Vec<f64>,
    pub mx: Vec<f64>,
    pub my: Vec<f64>,
    pub tz: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamResponse {
    pub displacements: BeamDisplacements,
    pub resultants: BeamResultants,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamMass {
    pub mass: f64,
    /// Out-of-plane moment of inertia ∫ρA z² dz about the rotor axis
    pub moment_of_inertia: f64,
}

/// Cantilever (fixed root, free tip) Euler-Bernoulli beam solver with
/// Hermite cubic bending in two planes and linear axial and torsion fields.
#[derive(Debug, Clone)]
pub struct CantileverBeamSolver {
    quadrature: Quadrature,
}

impl CantileverBeamSolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            quadrature: Quadrature::gauss_unit(4)?,
        })
    }

    /// Consistent nodal load vector of a linearly varying distributed load.
    fn load_vector(&self, model: &BeamModel, load: &DistributedLoad) -> Col<f64> {
        let mut f = Col::<f64>::zeros(model.n_nodes() * DOF_PER_NODE);
        for i in 0..model.n_nodes() - 1 {
            let l = model.z[i + 1] - model.z[i];
            let start = i * DOF_PER_NODE;
            izip!(self.quadrature.points.iter(), self.quadrature.weights.iter()).for_each(
                |(&xi, &w)| {
                    let lerp = |p: &[f64]| (1. - xi) * p[i] + xi * p[i + 1];
                    let (px, py, pz) = (lerp(&load.px), lerp(&load.py), lerp(&load.pz));
                    let h = hermite_shape(xi, l);
                    let wl = w * l;
                    // Bending in x: [u_x, θ_y], in y: [u_y, -θ_x]
                    f[start] += wl * h[0] * px;
                    f[start + 4] += wl * h[1] * px;
                    f[start + 6] += wl * h[2] * px;
                    f[start + 10] += wl * h[3] * px;
                    f[start + 1] += wl * h[0] * py;
                    f[start + 3] -= wl * h[1] * py;
                    f[start + 7] += wl * h[2] * py;
                    f[start + 9] -= wl * h[3] * py;
                    f[start + 2] += wl * (1. - xi) * pz;
                    f[start + 8] += wl * xi * pz;
                },
            );
        }
        f
    }

    /// Resultants from equilibrium of the outboard span; the load varies
    /// linearly between stations so Simpson's rule is exact per segment.
    fn resultants(model: &BeamModel, load: &DistributedLoad) -> BeamResultants {
        let n = model.n_nodes();
        let z = &model.z;
        let mut res = BeamResultants {
            vx: vec![0.; n],
            vy: vec![0.; n],
            fz: vec![0.; n],
            mx: vec![0.; n],
            my: vec![0.; n],
            tz: vec![0.; n],
        };
        for i in 0..n {
            let (mut fx, mut fy, mut fzz, mut mx, mut my) = (0., 0., 0., 0., 0.);
            for j in i..n - 1 {
                let h = z[j + 1] - z[j];
                let zm = 0.5 * (z[j] + z[j + 1]);
                let mid = |p: &[f64]| 0.5 * (p[j] + p[j + 1]);
                let simpson = |a: f64, m: f64, b: f64| h / 6. * (a + 4. * m + b);
                let arm = |zz: f64| zz - z[i];
                fx += 0.5 * h * (load.px[j] + load.px[j + 1]);
                fy += 0.5 * h * (load.py[j] + load.py[j + 1]);
                fzz += 0.5 * h * (load.pz[j] + load.pz[j + 1]);
                // (arm ẑ) × p = (-arm py, arm px, 0)
                mx -= simpson(
                    arm(z[j]) * load.py[j],
                    arm(zm) * mid(&load.py),
                    arm(z[j + 1]) * load.py[j + 1],
                );
                my += simpson(
                    arm(z[j]) * load.px[j],
                    arm(zm) * mid(&load.px),
                    arm(z[j + 1]) * load.px[j + 1],
                );
            }
            res.vx[i] = -fx;
            res.vy[i] = -fy;
            res.fz[i] = -fzz;
            res.mx[i] = mx;
            res.my[i] = my;
        }
        res
    }

    pub fn solve(&self, model: &BeamModel, load: &DistributedLoad) -> Result<BeamResponse> {
        model.validate()?;
        if load.frame != Frame::Airfoil {
            return Err(StructuralError::FrameMismatch {
                expected: Frame::Airfoil,
                found: load.frame,
            });
        }
        if load.len() != model.n_nodes() {
            return Err(StructuralError::geometry(
                0,
                "distributed load",
                format!("has {} stations, beam has {}", load.len(), model.n_nodes()),
            ));
        }

        let (k, _) = model.assemble();
        let f = self.load_vector(model, load);

        // Clamp the root node
        let n_free = k.nrows() - DOF_PER_NODE;
        let lu = k
            .submatrix(DOF_PER_NODE, DOF_PER_NODE, n_free, n_free)
            .partial_piv_lu();
        let u_free = lu.solve(f.subrows(DOF_PER_NODE, n_free));
        if let Some(i) = (0..n_free).find(|&i| !u_free[i].is_finite()) {
            return Err(StructuralError::singular(
                1 + i / DOF_PER_NODE,
                "beam stiffness",
                u_free[i],
            ));
        }

        let dof = |d: usize| {
            (0..model.n_nodes())
                .map(|i| match i {
                    0 => 0.,
                    _ => u_free[(i - 1) * DOF_PER_NODE + d],
                })
                .collect_vec()
        };

        Ok(BeamResponse {
            displacements: BeamDisplacements {
                dx: dof(0),
                dy: dof(1),
                dz: dof(2),
                dtheta_x: dof(3),
                dtheta_y: dof(4),
                dtheta_z: dof(5),
            },
            resultants: Self::resultants(model, load),
        })
    }

    pub fn mass_properties(&self, model: &BeamModel) -> Result<BeamMass> {
        model.validate()?;
        let (mut mass, mut inertia) = (0., 0.);
        for (z, rho_a) in izip!(model.z.windows(2), model.rho_a.windows(2)) {
            let l = z[1] - z[0];
            izip!(self.quadrature.points.iter(), self.quadrature.weights.iter()).for_each(
                |(&xi, &w)| {
                    let zz = z[0] + xi * l;
                    let m = (1. - xi) * rho_a[0] + xi * rho_a[1];
                    mass += w * l * m;
                    inertia += w * l * m * zz * zz;
                },
            );
        }
        Ok(BeamMass {
            mass,
            moment_of_inertia: inertia,
        })
    }

    pub fn natural_frequencies(&self, model: &BeamModel, n: usize) -> Result<Vec<f64>> {
        model.validate()?;
        let (k, m) = model.assemble();
        let (freq, _) = clamped_modes(&k, &m, DOF_PER_NODE)
            .map_err(|reason| StructuralError::fit("beam natural frequencies", reason))?;
        Ok(freq.into_iter().take(n).collect())
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::linspace;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn uniform(n: usize, length: f64) -> BeamModel {
        BeamModel {
            z: linspace(0., length, n),
            ea: vec![1e8; n],
            ei_xx: vec![4e6; n],
            ei_yy: vec![1e6; n],
            ei_xy: vec![0.; n],
            gj: vec![1e6; n],
            rho_a: vec![100.; n],
            rho_j: vec![5.; n],
        }
    }

    #[test]
    fn test_uniform_load_tip_deflection() {
        let (n, length) = (5, 10.);
        let model = uniform(n, length);
        let load = DistributedLoad::new(Frame::Airfoil, vec![200.; n], vec![-50.; n], vec![30.; n]);
        let solver = CantileverBeamSolver::new().unwrap();
        let res = solver.solve(&model, &load).unwrap();

        // Hermite elements are nodally exact for uniform load
        let l4 = length.powi(4);
        assert_relative_eq!(res.displacements.dx[n - 1], 200. * l4 / (8. * 1e6), max_relative = 1e-9);
        assert_relative_eq!(res.displacements.dy[n - 1], -50. * l4 / (8. * 4e6), max_relative = 1e-9);
        assert_relative_eq!(res.displacements.dz[n - 1], 30. * length * length / (2. * 1e8), max_relative = 1e-9);
        assert_eq!(res.displacements.dx[0], 0.);

        // Root resultants
        assert_relative_eq!(res.resultants.fz[0], -300., max_relative = 1e-12);
        assert_relative_eq!(res.resultants.my[0], 200. * length * length / 2., max_relative = 1e-12);
        assert_relative_eq!(res.resultants.mx[0], 50. * length * length / 2., max_relative = 1e-12);
        assert_relative_eq!(res.resultants.my[n - 1], 0., epsilon = 1e-12);
    }

    #[test]
    fn test_load_frame_is_checked() {
        let model = uniform(3, 10.);
        let load = DistributedLoad::zeros(Frame::Blade, 3);
        let solver = CantileverBeamSolver::new().unwrap();
        assert!(matches!(
            solver.solve(&model, &load),
            Err(StructuralError::FrameMismatch { .. })
        ));
    }

    #[test]
    fn test_mass_properties() {
        let mut model = uniform(4, 9.);
        model.z = vec![1., 4., 7., 10.];
        let solver = CantileverBeamSolver::new().unwrap();
        let mp = solver.mass_properties(&model).unwrap();
        assert_relative_eq!(mp.mass, 900., max_relative = 1e-12);
        assert_relative_eq!(mp.moment_of_inertia, 100. * (1000. - 1.) / 3., max_relative = 1e-12);
    }

    #[test]
    fn test_first_bending_frequency() {
        let (n, length) = (21, 10.);
        let model = uniform(n, length);
        let solver = CantileverBeamSolver::new().unwrap();
        let freq = solver.natural_frequencies(&model, 5).unwrap();
        assert_eq!(freq.len(), 5);
        let f1 = 1.875104_f64.powi(2) / (2. * PI) * (1e6 / (100. * length.powi(4))).sqrt();
        assert_relative_eq!(freq[0], f1, max_relative = 1e-4);
        // Edgewise is twice as stiff in frequency
        assert_relative_eq!(freq[1], 2. * f1, max_relative = 1e-4);
        freq.windows(2).for_each(|w| assert!(w[1] >= w[0]));
    }
}

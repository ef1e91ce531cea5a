pub mod beams;
pub mod curved;

use faer::prelude::*;

/// Degrees of freedom per node `[u1, u2, u3, θ1, θ2, θ3]`, axis 3 along the element
pub const DOF_PER_NODE: usize = 6;

/// Element DOFs `[w_a, s_a, w_b, s_b]` of the bending plane that displaces along
/// axis 1, with the sign relating the slope to the nodal rotation.
const PLANE_1: ([usize; 4], [f64; 4]) = ([0, 4, 6, 10], [1., 1., 1., 1.]);

/// Same for the bending plane that displaces along axis 2.
const PLANE_2: ([usize; 4], [f64; 4]) = ([1, 3, 7, 9], [1., -1., 1., -1.]);

/// Section data of a two-node frame element, constant along its length.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSection {
    /// Axial stiffness
    pub ea: f64,
    /// Bending stiffness for displacement along axis 1
    pub ei_1: f64,
    /// Bending stiffness for displacement along axis 2
    pub ei_2: f64,
    /// Coupling between the two bending planes
    pub ei_12: f64,
    /// Torsional stiffness
    pub gj: f64,
    /// Mass per unit length
    pub rho_a: f64,
    /// Polar mass moment of inertia per unit length
    pub rho_j: f64,
    /// Axial tension used for geometric stiffening
    pub tension: f64,
}

impl FrameSection {
    /// Element section as the average of the two end sections.
    pub fn average(a: &Self, b: &Self) -> Self {
        Self {
            ea: 0.5 * (a.ea + b.ea),
            ei_1: 0.5 * (a.ei_1 + b.ei_1),
            ei_2: 0.5 * (a.ei_2 + b.ei_2),
            ei_12: 0.5 * (a.ei_12 + b.ei_12),
            gj: 0.5 * (a.gj + b.gj),
            rho_a: 0.5 * (a.rho_a + b.rho_a),
            rho_j: 0.5 * (a.rho_j + b.rho_j),
            tension: 0.5 * (a.tension + b.tension),
        }
    }
}

//------------------------------------------------------------------------------
// Hermite cubic bending matrices (unit properties)
//------------------------------------------------------------------------------

fn hermite_stiffness(l: f64) -> [[f64; 4]; 4] {
    let l2 = l * l;
    let c = 1. / (l2 * l);
    [
        [12. * c, 6. * l * c, -12. * c, 6. * l * c],
        [6. * l * c, 4. * l2 * c, -6. * l * c, 2. * l2 * c],
        [-12. * c, -6. * l * c, 12. * c, -6. * l * c],
        [6. * l * c, 2. * l2 * c, -6. * l * c, 4. * l2 * c],
    ]
}

fn hermite_geometric(l: f64) -> [[f64; 4]; 4] {
    let l2 = l * l;
    let c = 1. / (30. * l);
    [
        [36. * c, 3. * l * c, -36. * c, 3. * l * c],
        [3. * l * c, 4. * l2 * c, -3. * l * c, -l2 * c],
        [-36. * c, -3. * l * c, 36. * c, -3. * l * c],
        [3. * l * c, -l2 * c, -3. * l * c, 4. * l2 * c],
    ]
}

fn hermite_mass(l: f64) -> [[f64; 4]; 4] {
    let l2 = l * l;
    let c = l / 420.;
    [
        [156. * c, 22. * l * c, 54. * c, -13. * l * c],
        [22. * l * c, 4. * l2 * c, 13. * l * c, -3. * l2 * c],
        [54. * c, 13. * l * c, 156. * c, -22. * l * c],
        [-13. * l * c, -3. * l2 * c, -22. * l * c, 4. * l2 * c],
    ]
}

/// Hermite cubic shape functions on ξ ∈ [0, 1] for `[w_a, s_a, w_b, s_b]`.
pub fn hermite_shape(xi: f64, l: f64) -> [f64; 4] {
    let (x2, x3) = (xi * xi, xi * xi * xi);
    [
        1. - 3. * x2 + 2. * x3,
        l * (xi - 2. * x2 + x3),
        3. * x2 - 2. * x3,
        l * (x3 - x2),
    ]
}

fn add_plane(
    m: &mut Mat<f64>,
    (dofs_a, signs_a): ([usize; 4], [f64; 4]),
    (dofs_b, signs_b): ([usize; 4], [f64; 4]),
    coef: f64,
    unit: &[[f64; 4]; 4],
) {
    for i in 0..4 {
        for j in 0..4 {
            m[(dofs_a[i], dofs_b[j])] += coef * signs_a[i] * signs_b[j] * unit[i][j];
        }
    }
}

fn add_bar(m: &mut Mat<f64>, dof: usize, coef: f64, unit: &[[f64; 2]; 2]) {
    let dofs = [dof, dof + DOF_PER_NODE];
    for i in 0..2 {
        for j in 0..2 {
            m[(dofs[i], dofs[j])] += coef * unit[i][j];
        }
    }
}

/// Local 12x12 stiffness (elastic plus geometric) and consistent mass matrices
/// of a straight frame element of length `l`.
pub fn frame_element(section: &FrameSection, l: f64) -> (Mat<f64>, Mat<f64>) {
    let n = 2 * DOF_PER_NODE;
    let mut k = Mat::<f64>::zeros(n, n);
    let mut m = Mat::<f64>::zeros(n, n);

    let kb = hermite_stiffness(l);
    let kg = hermite_geometric(l);
    let mb = hermite_mass(l);

    // Bending, including coupling between the planes
    add_plane(&mut k, PLANE_1, PLANE_1, section.ei_1, &kb);
    add_plane(&mut k, PLANE_2, PLANE_2, section.ei_2, &kb);
    add_plane(&mut k, PLANE_1, PLANE_2, section.ei_12, &kb);
    add_plane(&mut k, PLANE_2, PLANE_1, section.ei_12, &kb);
    add_plane(&mut k, PLANE_1, PLANE_1, section.tension, &kg);
    add_plane(&mut k, PLANE_2, PLANE_2, section.tension, &kg);

    // Axial and torsion
    let bar_k = [[1. / l, -1. / l], [-1. / l, 1. / l]];
    let bar_m = [[l / 3., l / 6.], [l / 6., l / 3.]];
    add_bar(&mut k, 2, section.ea, &bar_k);
    add_bar(&mut k, 5, section.gj, &bar_k);

    add_plane(&mut m, PLANE_1, PLANE_1, section.rho_a, &mb);
    add_plane(&mut m, PLANE_2, PLANE_2, section.rho_a, &mb);
    add_bar(&mut m, 2, section.rho_a, &bar_m);
    add_bar(&mut m, 5, section.rho_j, &bar_m);

    (k, m)
}

/// Returns `Tᵀ A T` where `T` applies the local-from-global rotation `rot` to
/// each of the four vector blocks of an element matrix.
pub fn rotate_element(a: &Mat<f64>, rot: &[[f64; 3]; 3]) -> Mat<f64> {
    let n = 2 * DOF_PER_NODE;
    let t = Mat::<f64>::from_fn(n, n, |i, j| {
        if i / 3 == j / 3 {
            rot[i % 3][j % 3]
        } else {
            0.
        }
    });
    t.transpose() * a * &t
}

/// Adds a 12x12 element matrix into the global matrix for the nodes `node_a`
/// and `node_a + 1`.
pub fn assemble_element(global: &mut Mat<f64>, elem: &Mat<f64>, node_a: usize) {
    let start = node_a * DOF_PER_NODE;
    let n = elem.nrows();
    let mut block = global.as_mut().submatrix_mut(start, start, n, n);
    zip!(&mut block, elem).for_each(|unzip!(g, e)| *g += *e);
}

/// Natural frequencies (Hz) and mode shapes of `k x = ω² m x` with the first
/// `n_fixed` DOFs clamped. Mode shapes include the clamped DOFs as zeros.
///
/// The problem is solved as `K⁻¹ M x = μ x` with `μ = 1/ω²` so DOFs without
/// inertia produce infinite frequencies that are discarded.
pub fn clamped_modes(
    k: &Mat<f64>,
    m: &Mat<f64>,
    n_fixed: usize,
) -> Result<(Vec<f64>, Mat<f64>), String> {
    let n_dofs = k.nrows();
    let n_free = n_dofs - n_fixed;
    let lu = k.submatrix(n_fixed, n_fixed, n_free, n_free).partial_piv_lu();
    let a = lu.solve(m.submatrix(n_fixed, n_fixed, n_free, n_free));
    if !(0..n_free).all(|j| (0..n_free).all(|i| a[(i, j)].is_finite())) {
        return Err("stiffness matrix is singular".to_string());
    }

    let eig = a.eigen().map_err(|e| format!("{e:?}"))?;
    let eig_val_raw = eig.S().column_vector();
    let eig_vec_raw = eig.U();

    let mu_max = (0..eig_val_raw.nrows())
        .map(|i| eig_val_raw[i].re)
        .fold(0., f64::max);

    // Keep modes with inertia, ordered by increasing frequency
    let mut order: Vec<_> = (0..eig_val_raw.nrows())
        .filter(|&i| eig_val_raw[i].re > 1e-12 * mu_max)
        .collect();
    order.sort_by(|&i, &j| eig_val_raw[j].re.total_cmp(&eig_val_raw[i].re));

    let freq = order
        .iter()
        .map(|&i| (1. / eig_val_raw[i].re).sqrt() / (2. * std::f64::consts::PI))
        .collect();

    let shapes = Mat::<f64>::from_fn(n_dofs, order.len(), |i, j| {
        if i < n_fixed {
            0.
        } else {
            eig_vec_raw[(i - n_fixed, order[j])].re
        }
    });

    Ok((freq, shapes))
}

use crate::{
    error::{Result, StructuralError},
    frames::{DirectionVector, Frame},
};

/// Mass and inertia of all blades about the hub centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotorMass {
    pub mass_all_blades: f64,
    /// Ixx, Iyy, Izz, Ixy, Ixz, Iyz in yaw axes
    pub i_all_blades: [f64; 6],
}

/// Rotor mass properties from the mass and out-of-plane moment of inertia of
/// a single blade. The blades are treated as a symmetric rotor, so the
/// in-plane moments are half the polar moment and the products vanish.
pub fn mass_properties(blade_mass: f64, blade_moment_of_inertia: f64, tilt: f64, n_blades: usize) -> Result<RotorMass> {
    if n_blades == 0 {
        return Err(StructuralError::Config("number of blades must be positive".into()));
    }
    let n = n_blades as f64;
    let i_beam = n * blade_moment_of_inertia;
    let i = DirectionVector::new(i_beam, i_beam / 2., i_beam / 2., Frame::Hub).to_frame(Frame::Yaw, tilt)?;

    Ok(RotorMass {
        mass_all_blades: n * blade_mass,
        i_all_blades: [i.x, i.y, i.z, 0., 0., 0.],
    })
}

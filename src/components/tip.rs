use interp::{interp_slice, InterpMode};
use itertools::{izip, Itertools};

use crate::{
    elements::beams::BeamDisplacements,
    error::{Result, StructuralError},
    frames::{DirectionVector, Frame},
};

/// Rotor azimuth the tip clearance is evaluated at, blade pointing down.
const CLEARANCE_AZIMUTH: f64 = 180.;

/// Undeflected blade geometry and its placement on the turbine.
#[derive(Debug, Clone)]
pub struct BladeGeometry<'a> {
    pub r: &'a [f64],
    /// Structural twist (deg)
    pub theta: &'a [f64],
    pub precurve: &'a [f64],
    pub presweep: &'a [f64],
    pub hub_radius: f64,
    pub blade_length: f64,
    /// Shaft tilt (deg)
    pub tilt: f64,
    pub hub_height: f64,
    pub downwind: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipDeflection {
    /// Amplified tip deflection along the yaw x axis
    pub tip_deflection: f64,
    /// Deflected tip position in yaw axes, relative to the tower base
    pub tip_position: [f64; 3],
    /// Height of the deflected tip above the ground
    pub ground_clearance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BladeDeflectionResult {
    /// Change in blade length that keeps the deflected arc length
    pub delta_blade_length: f64,
    /// Flapwise deflection at the precurve control points
    pub delta_precurve: Vec<f64>,
}

impl BladeGeometry<'_> {
    fn validate(&self, disp: &BeamDisplacements) -> Result<usize> {
        let n = self.r.len();
        if n < 2 {
            return Err(StructuralError::geometry(0, "r", "needs at least two stations"));
        }
        for (name, len) in [
            ("twist", self.theta.len()),
            ("precurve", self.precurve.len()),
            ("presweep", self.presweep.len()),
            ("deflection", disp.dx.len()),
        ] {
            if len != n {
                return Err(StructuralError::geometry(
                    0,
                    name,
                    format!("has {len} values for {n} stations"),
                ));
            }
        }
        Ok(n)
    }

    /// Deflection in blade axes at station `i`.
    fn blade_deflection_at(&self, disp: &BeamDisplacements, i: usize, pitch: f64) -> Result<DirectionVector> {
        DirectionVector::new(disp.dx[i], disp.dy[i], disp.dz[i], Frame::Airfoil)
            .to_frame(Frame::Blade, self.theta[i] + pitch)
    }

    /// Tip deflection toward the tower and the resulting ground clearance with
    /// the blade pointing down.
    pub fn tip_deflection(
        &self,
        disp: &BeamDisplacements,
        pitch: f64,
        cone_tip: f64,
        dynamic_factor: f64,
        gamma_m: f64,
    ) -> Result<TipDeflection> {
        let tip = self.validate(disp)? - 1;
        let to_yaw = [
            (Frame::Azimuth, cone_tip),
            (Frame::Hub, CLEARANCE_AZIMUTH),
            (Frame::Yaw, self.tilt),
        ];

        let delta = self.blade_deflection_at(disp, tip, pitch)?.through(&to_yaw)?;
        let tip_deflection = dynamic_factor * delta.x;

        let blade_yaw = DirectionVector::new(self.precurve[tip], self.presweep[tip], self.r[tip], Frame::Blade)
            .through(&to_yaw)?;
        let side = if self.downwind { -1. } else { 1. };
        let z_pos = self.hub_height + blade_yaw.z;
        let x_pos = side * blade_yaw.x + gamma_m * tip_deflection;

        Ok(TipDeflection {
            tip_deflection,
            tip_position: [x_pos, 0., z_pos],
            ground_clearance: z_pos,
        })
    }

    /// Deflected precurve expressed as a blade length change and a precurve
    /// adjustment at the spline control points `control_r`.
    pub fn blade_deflection(
        &self,
        disp: &BeamDisplacements,
        pitch: f64,
        control_r: &[f64],
    ) -> Result<BladeDeflectionResult> {
        let n = self.validate(disp)?;
        let delta_x = (0..n)
            .map(|i| Ok(self.blade_deflection_at(disp, i, pitch)?.x))
            .collect::<Result<Vec<_>>>()?;
        let precurve_out = izip!(self.precurve.iter(), delta_x.iter())
            .map(|(p, d)| p + d)
            .collect_vec();

        let planar_length = |precurve: &[f64]| {
            self.hub_radius
                + izip!(precurve.iter().tuple_windows(), self.r.iter().tuple_windows())
                    .map(|((p0, p1), (r0, r1))| (p1 - p0).hypot(r1 - r0))
                    .sum::<f64>()
        };
        let length_0 = planar_length(self.precurve);
        let length = planar_length(&precurve_out);

        Ok(BladeDeflectionResult {
            delta_blade_length: self.blade_length * (length_0 / length - 1.),
            delta_precurve: interp_slice(self.r, &delta_x, control_r, &InterpMode::FirstLast),
        })
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const R: [f64; 3] = [1.5, 32., 63.];
    const ZEROS: [f64; 3] = [0.; 3];

    fn geometry<'a>(precurve: &'a [f64], theta: &'a [f64], tilt: f64, downwind: bool) -> BladeGeometry<'a> {
        BladeGeometry {
            r: &R,
            theta,
            precurve,
            presweep: &ZEROS,
            hub_radius: 1.5,
            blade_length: 61.5,
            tilt,
            hub_height: 90.,
            downwind,
        }
    }

    fn flap_deflection(tip: f64) -> BeamDisplacements {
        BeamDisplacements {
            dx: vec![0., 0.25 * tip, tip],
            dy: ZEROS.to_vec(),
            dz: ZEROS.to_vec(),
            dtheta_x: ZEROS.to_vec(),
            dtheta_y: ZEROS.to_vec(),
            dtheta_z: ZEROS.to_vec(),
        }
    }

    #[test]
    fn test_tip_deflection_upwind() {
        let precurve = [0., -1., -2.];
        let g = geometry(&precurve, &ZEROS, 0., false);
        let tip = g.tip_deflection(&flap_deflection(3.), 0., 0., 1.2, 1.1).unwrap();
        assert_relative_eq!(tip.tip_deflection, 3.6, max_relative = 1e-12);
        assert_relative_eq!(tip.ground_clearance, 90. - 63., max_relative = 1e-12);
        assert_relative_eq!(tip.tip_position[0], -2. + 1.1 * 3.6, max_relative = 1e-12);
        assert_eq!(tip.tip_position[1], 0.);
        assert_eq!(tip.tip_position[2], tip.ground_clearance);
    }

    #[test]
    fn test_tip_deflection_downwind() {
        let precurve = [0., -1., -2.];
        let g = geometry(&precurve, &ZEROS, 0., true);
        let tip = g.tip_deflection(&flap_deflection(3.), 0., 0., 1.2, 1.1).unwrap();
        assert_relative_eq!(tip.tip_position[0], 2. + 1.1 * 3.6, max_relative = 1e-12);
    }

    #[test]
    fn test_pitched_tip_loses_flap_deflection() {
        let theta = [0., 0., 60.];
        let g = geometry(&ZEROS, &theta, 0., false);
        let tip = g.tip_deflection(&flap_deflection(3.), 30., 0., 1., 1.).unwrap();
        // Airfoil x rotated by 90 deg lies along the blade y axis
        assert_relative_eq!(tip.tip_deflection, 0., epsilon = 1e-12);
    }

    #[test]
    fn test_tilt_lowers_clearance_geometry() {
        let g = geometry(&ZEROS, &ZEROS, 5., false);
        let tip = g.tip_deflection(&flap_deflection(0.), 0., 0., 1.2, 1.1).unwrap();
        let t = 5_f64.to_radians();
        assert_relative_eq!(tip.ground_clearance, 90. - 63. * t.cos(), max_relative = 1e-12);
        assert_relative_eq!(tip.tip_position[0].abs(), 63. * t.sin(), max_relative = 1e-12);
    }

    #[test]
    fn test_blade_deflection() {
        let g = geometry(&ZEROS, &ZEROS, 0., false);
        let res = g.blade_deflection(&flap_deflection(0.), 0., &[10., 63.]).unwrap();
        assert_relative_eq!(res.delta_blade_length, 0., epsilon = 1e-14);
        assert_eq!(res.delta_precurve, vec![0., 0.]);

        let res = g
            .blade_deflection(&flap_deflection(4.), 0., &[0., 32., 47.5, 80.])
            .unwrap();
        // Bending lengthens the planar arc so the straight length shrinks
        assert!(res.delta_blade_length < 0.);
        assert_relative_eq!(res.delta_precurve[0], 0., epsilon = 1e-14);
        assert_relative_eq!(res.delta_precurve[1], 1., max_relative = 1e-12);
        assert_relative_eq!(res.delta_precurve[2], 2.5, max_relative = 1e-12);
        assert_relative_eq!(res.delta_precurve[3], 4., max_relative = 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let g = geometry(&ZEROS, &ZEROS, 0., false);
        let mut disp = flap_deflection(1.);
        disp.dx.pop();
        assert!(matches!(
            g.tip_deflection(&disp, 0., 0., 1.2, 1.1),
            Err(StructuralError::Geometry { .. })
        ));
    }
}

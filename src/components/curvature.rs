use itertools::{izip, Itertools};

use crate::error::{Result, StructuralError};

/// Blade axis in the azimuth frame and the cone it makes with the rotor plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BladeCurvature {
    pub x_az: Vec<f64>,
    pub y_az: Vec<f64>,
    pub z_az: Vec<f64>,
    /// Precone plus the local cone from precurve (deg)
    pub total_cone: Vec<f64>,
    /// Path length along the blade axis from the first station
    pub arc_length: Vec<f64>,
    /// Path length offset by the first radius
    pub s: Vec<f64>,
}

impl BladeCurvature {
    pub fn tip_cone(&self) -> f64 {
        self.total_cone.last().copied().unwrap_or_default()
    }
}

pub fn blade_curvature(r: &[f64], precurve: &[f64], presweep: &[f64], precone: f64) -> Result<BladeCurvature> {
    let n = r.len();
    if n < 2 {
        return Err(StructuralError::geometry(0, "r", "needs at least two stations"));
    }
    for (name, v) in [("precurve", precurve), ("presweep", presweep)] {
        if v.len() != n {
            return Err(StructuralError::geometry(
                0,
                name,
                format!("has {} values for {n} stations", v.len()),
            ));
        }
    }

    let x_az = precurve.to_vec();
    let y_az = presweep.to_vec();
    let z_az = r.to_vec();

    // Segment cone angles, blade z tilted toward -x for positive cone
    let segment_cone = izip!(x_az.iter().tuple_windows(), z_az.iter().tuple_windows())
        .enumerate()
        .map(|(i, ((x0, x1), (z0, z1)))| {
            let (dx, dz) = (x1 - x0, z1 - z0);
            if dx == 0. && dz == 0. {
                Err(StructuralError::geometry(i + 1, "blade axis", "repeats the previous station"))
            } else {
                Ok((-dx).atan2(dz))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let cone = (0..n)
        .map(|i| match i {
            0 => segment_cone[0],
            _ if i == n - 1 => segment_cone[n - 2],
            _ => 0.5 * (segment_cone[i - 1] + segment_cone[i]),
        })
        .collect_vec();
    let total_cone = cone.iter().map(|c| precone + c.to_degrees()).collect_vec();

    let mut arc_length = vec![0.; n];
    for i in 1..n {
        let d = [x_az[i] - x_az[i - 1], y_az[i] - y_az[i - 1], z_az[i] - z_az[i - 1]];
        arc_length[i] = arc_length[i - 1] + (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
    }
    let s = arc_length.iter().map(|a| r[0] + a).collect_vec();

    Ok(BladeCurvature {
        x_az,
        y_az,
        z_az,
        total_cone,
        arc_length,
        s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_blade() {
        let r = [1.5, 4., 9., 20.];
        let zeros = [0.; 4];
        let c = blade_curvature(&r, &zeros, &zeros, 2.5).unwrap();
        for i in 0..4 {
            assert_relative_eq!(c.arc_length[i], r[i] - r[0], epsilon = 1e-12);
            assert_relative_eq!(c.s[i], r[i], epsilon = 1e-12);
            assert_relative_eq!(c.total_cone[i], 2.5, epsilon = 1e-12);
        }
        assert_eq!(c.z_az, r.to_vec());
    }

    #[test]
    fn test_linear_precurve() {
        let r = [0., 10., 20.];
        let precurve = [0., -1., -2.];
        let c = blade_curvature(&r, &precurve, &[0.; 3], 0.).unwrap();
        let expected = 0.1_f64.atan().to_degrees();
        c.total_cone
            .iter()
            .for_each(|&a| assert_relative_eq!(a, expected, max_relative = 1e-12));
        assert_relative_eq!(c.arc_length[2], 2. * 101_f64.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(c.tip_cone(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_interior_cone_is_averaged() {
        let r = [0., 10., 20.];
        let precurve = [0., 0., -1.];
        let c = blade_curvature(&r, &precurve, &[0.; 3], 0.).unwrap();
        assert_relative_eq!(c.total_cone[0], 0., epsilon = 1e-12);
        assert_relative_eq!(c.total_cone[1], 0.5 * c.total_cone[2], max_relative = 1e-12);
    }

    #[test]
    fn test_errors() {
        assert!(blade_curvature(&[0.], &[0.], &[0.], 0.).is_err());
        assert!(blade_curvature(&[0., 1.], &[0.], &[0., 0.], 0.).is_err());
        let err = blade_curvature(&[0., 0.], &[0., 0.], &[0., 0.], 0.).unwrap_err();
        assert_eq!(err.station(), Some(1));
    }
}

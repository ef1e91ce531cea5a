use itertools::{izip, Itertools};
use serde::Deserialize;
use tracing::debug;

use crate::{
    components::curvature::BladeCurvature,
    error::{Result, StructuralError},
    frames::{DirectionVector, DistributedLoad, Frame},
    interp::{interp_onto, InterpMethod},
    util::{normalize_span, RAD_PER_SEC_TO_RPM, RPM_TO_RAD_PER_SEC},
};

//------------------------------------------------------------------------------
// Load conditions
//------------------------------------------------------------------------------

/// Operating points the blade is analysed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadCase {
    /// Gust at rated rotor speed, used for deflection
    Rated,
    /// Parked rotor in the 50-year extreme wind, used for strain
    Extreme,
    /// Representative point on the power curve, used for deflection
    PowerCurve,
    /// Parked rotor, one blade stuck at the extreme pitch
    ParkedStuck,
    /// Parked rotor, blade feathered
    ParkedFeathered,
    /// Rated operation at one of the root-moment azimuths
    RootMoment,
}

/// Inflow and rotor state an aerodynamic load distribution is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LoadCondition {
    pub case: LoadCase,
    /// Hub height wind speed (m/s)
    pub v_hub: f64,
    /// Rotor speed (rpm)
    pub omega: f64,
    /// Blade pitch (deg)
    pub pitch: f64,
    /// Rotor azimuth (deg)
    pub azimuth: f64,
}

/// Aerodynamic force per unit length in blade axes on the aerodynamic grid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AeroLoads {
    pub r: Vec<f64>,
    pub px: Vec<f64>,
    pub py: Vec<f64>,
    pub pz: Vec<f64>,
}

impl AeroLoads {
    pub fn zeros(r: &[f64]) -> Self {
        let n = r.len();
        Self {
            r: r.to_vec(),
            px: vec![0.; n],
            py: vec![0.; n],
            pz: vec![0.; n],
        }
    }

    /// Loads moved onto the grid `r_struct`, still in blade axes.
    pub fn on_grid(&self, r_struct: &[f64], method: InterpMethod) -> Result<DistributedLoad> {
        Ok(DistributedLoad::new(
            Frame::Blade,
            interp_onto(&self.r, &self.px, r_struct, method, "aerodynamic Px")?,
            interp_onto(&self.r, &self.py, r_struct, method, "aerodynamic Py")?,
            interp_onto(&self.r, &self.pz, r_struct, method, "aerodynamic Pz")?,
        ))
    }
}

//------------------------------------------------------------------------------
// Total loads
//------------------------------------------------------------------------------

/// Combines aerodynamic, gravity and centrifugal loading on the structural grid.
#[derive(Debug, Clone)]
pub struct LoadAssembler<'a> {
    pub r: &'a [f64],
    /// Structural twist (deg)
    pub theta: &'a [f64],
    pub rho_a: &'a [f64],
    pub curvature: &'a BladeCurvature,
    /// Shaft tilt (deg)
    pub tilt: f64,
    pub gravity: f64,
    pub method: InterpMethod,
}

impl LoadAssembler<'_> {
    /// Total distributed load in airfoil axes.
    pub fn total_loads(&self, aero: &AeroLoads, cond: &LoadCondition) -> Result<DistributedLoad> {
        let n = self.r.len();
        for (name, len) in [
            ("twist", self.theta.len()),
            ("rhoA", self.rho_a.len()),
            ("total cone", self.curvature.total_cone.len()),
        ] {
            if len != n {
                return Err(StructuralError::geometry(
                    0,
                    name,
                    format!("has {len} values for {n} stations"),
                ));
            }
        }

        let p_aero = aero.on_grid(self.r, self.method)?;
        let omega = cond.omega * RPM_TO_RAD_PER_SEC;

        let aero_vectors = p_aero.vectors();
        let blade = izip!(
            aero_vectors.iter(),
            self.rho_a.iter(),
            self.curvature.total_cone.iter(),
            self.curvature.z_az.iter()
        )
        .map(|(p_a, &rho_a, &cone, &z_az)| {
            let p_w = DirectionVector::new(0., 0., -rho_a * self.gravity, Frame::Yaw).through(&[
                (Frame::Hub, self.tilt),
                (Frame::Azimuth, cond.azimuth),
                (Frame::Blade, cone),
            ])?;
            let p_c = DirectionVector::new(0., 0., rho_a * omega * omega * z_az, Frame::Azimuth)
                .to_frame(Frame::Blade, cone)?;
            p_a.add(&p_w)?.add(&p_c)
        })
        .collect::<Result<Vec<_>>>()?;

        let angles = self.theta.iter().map(|&t| t + cond.pitch).collect_vec();
        let total = DistributedLoad::from_vectors(Frame::Blade, &blade)?.to_frame(Frame::Airfoil, &angles)?;
        debug!(case = ?cond.case, omega = cond.omega, pitch = cond.pitch, azimuth = cond.azimuth, "total loads assembled");
        Ok(total)
    }
}

//------------------------------------------------------------------------------
// Damage equivalent loads
//------------------------------------------------------------------------------

/// Damage equivalent bending moments in blade axes on a normalized span.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DamageEquivalentMoments {
    pub r_star: Vec<f64>,
    pub mxb: Vec<f64>,
    pub myb: Vec<f64>,
}

/// Damage equivalent moments on the structural grid in airfoil axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageMoments {
    pub mx: Vec<f64>,
    pub my: Vec<f64>,
}

pub fn damage_loads(moments: &DamageEquivalentMoments, r: &[f64], theta: &[f64]) -> Result<DamageMoments> {
    let r_star = normalize_span(r);
    let mxb = interp_onto(&moments.r_star, &moments.mxb, &r_star, InterpMethod::Akima, "damage Mxb")?;
    let myb = interp_onto(&moments.r_star, &moments.myb, &r_star, InterpMethod::Akima, "damage Myb")?;

    let (mx, my) = izip!(mxb.iter(), myb.iter(), theta.iter())
        .map(|(&x, &y, &t)| {
            let m = DirectionVector::new(x, y, 0., Frame::Blade).to_frame(Frame::Airfoil, t)?;
            Ok((m.x, m.y))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();
    Ok(DamageMoments { mx, my })
}

//------------------------------------------------------------------------------
// Gust and set points
//------------------------------------------------------------------------------

/// IEC turbulence category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TurbulenceClass {
    #[default]
    A,
    B,
    C,
}

impl TurbulenceClass {
    /// Reference turbulence intensity at 15 m/s
    pub fn i_ref(self) -> f64 {
        match self {
            TurbulenceClass::A => 0.16,
            TurbulenceClass::B => 0.14,
            TurbulenceClass::C => 0.12,
        }
    }
}

/// Gust speed from the extreme turbulence model, `std` standard deviations
/// above the hub speed.
pub fn gust_speed(v_mean: f64, v_hub: f64, class: TurbulenceClass, std: f64) -> f64 {
    let c = 2.;
    let sigma = c * class.i_ref() * (0.072 * (v_mean / c + 3.) * (v_hub / c - 4.) + 10.);
    v_hub + std * sigma
}

/// Operating point at `v_factor` times rated speed with the region 2 tip speed
/// ratio and pitch.
pub fn power_curve_setpoint(
    tsr: f64,
    control_pitch: f64,
    v_rated: f64,
    radius: f64,
    v_factor: f64,
) -> Result<LoadCondition> {
    if !(radius > 0.) {
        return Err(StructuralError::Config(format!(
            "rotor radius must be positive, got {radius}"
        )));
    }
    let v_hub = v_factor * v_rated;
    Ok(LoadCondition {
        case: LoadCase::PowerCurve,
        v_hub,
        omega: tsr * v_hub / radius * RAD_PER_SEC_TO_RPM,
        pitch: control_pitch,
        azimuth: 0.,
    })
}

//------------------------------------------------------------------------------
// Extreme rotor loads
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotorLoads {
    pub thrust: f64,
    pub torque: f64,
}

/// Rotor loads in the survival wind with one blade stuck at the extreme pitch
/// and the remaining blades feathered; the per-blade average of the two
/// rotor evaluations.
pub fn extreme_rotor_loads(stuck: RotorLoads, feathered: RotorLoads, n_blades: usize) -> Result<RotorLoads> {
    if n_blades == 0 {
        return Err(StructuralError::Config("number of blades must be positive".into()));
    }
    let n = n_blades as f64;
    Ok(RotorLoads {
        thrust: (stuck.thrust + feathered.thrust * (n - 1.)) / n,
        torque: (stuck.torque + feathered.torque * (n - 1.)) / n,
    })
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::curvature::blade_curvature;
    use approx::assert_relative_eq;

    fn condition(omega: f64, pitch: f64, azimuth: f64) -> LoadCondition {
        LoadCondition {
            case: LoadCase::Rated,
            v_hub: 10.,
            omega,
            pitch,
            azimuth,
        }
    }

    #[test]
    fn test_gravity_and_centrifugal() {
        let r = vec![1., 5., 10.];
        let zeros = vec![0.; 3];
        let curvature = blade_curvature(&r, &zeros, &zeros, 0.).unwrap();
        let rho_a = vec![200., 150., 100.];
        let assembler = LoadAssembler {
            r: &r,
            theta: &zeros,
            rho_a: &rho_a,
            curvature: &curvature,
            tilt: 0.,
            gravity: 9.81,
            method: InterpMethod::Akima,
        };
        let aero = AeroLoads::zeros(&[0., 12.]);

        // Blade pointing up at zero azimuth, gravity along -z
        let p = assembler.total_loads(&aero, &condition(0., 0., 0.)).unwrap();
        assert_eq!(p.frame, Frame::Airfoil);
        for i in 0..3 {
            assert_relative_eq!(p.pz[i], -rho_a[i] * 9.81, epsilon = 1e-9);
            assert_relative_eq!(p.px[i], 0., epsilon = 1e-9);
        }

        // Blade pointing down, gravity pulls outward and adds to the
        // centrifugal load
        let omega = 12.;
        let p = assembler.total_loads(&aero, &condition(omega, 0., 180.)).unwrap();
        let w = omega * RPM_TO_RAD_PER_SEC;
        for i in 0..3 {
            assert_relative_eq!(p.pz[i], rho_a[i] * (9.81 + w * w * r[i]), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_aero_loads_rotated_to_airfoil() {
        let r = vec![1., 5., 10.];
        let zeros = vec![0.; 3];
        let curvature = blade_curvature(&r, &zeros, &zeros, 0.).unwrap();
        let theta = vec![20., 10., 0.];
        let assembler = LoadAssembler {
            r: &r,
            theta: &theta,
            rho_a: &zeros,
            curvature: &curvature,
            tilt: 5.,
            gravity: 9.81,
            method: InterpMethod::Pchip,
        };
        let aero = AeroLoads {
            r: vec![0., 4., 8., 12.],
            px: vec![1000.; 4],
            py: vec![0.; 4],
            pz: vec![0.; 4],
        };
        let p = assembler.total_loads(&aero, &condition(0., 10., 0.)).unwrap();
        for i in 0..3 {
            let a = (theta[i] + 10.).to_radians();
            assert_relative_eq!(p.px[i], 1000. * a.cos(), max_relative = 1e-12);
            assert_relative_eq!(p.py[i], 1000. * a.sin(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_structural_grid_outside_aero_grid() {
        let r = vec![1., 5., 13.];
        let zeros = vec![0.; 3];
        let curvature = blade_curvature(&r, &zeros, &zeros, 0.).unwrap();
        let assembler = LoadAssembler {
            r: &r,
            theta: &zeros,
            rho_a: &zeros,
            curvature: &curvature,
            tilt: 0.,
            gravity: 9.81,
            method: InterpMethod::Akima,
        };
        let err = assembler
            .total_loads(&AeroLoads::zeros(&[0., 12.]), &condition(0., 0., 0.))
            .unwrap_err();
        assert!(matches!(err, StructuralError::InterpolationDomain { station: 2, .. }));
    }

    #[test]
    fn test_damage_loads() {
        let moments = DamageEquivalentMoments {
            r_star: vec![0., 0.5, 1.],
            mxb: vec![3000., 2000., 0.],
            myb: vec![6000., 4000., 0.],
        };
        let d = damage_loads(&moments, &[2., 7., 12.], &[90., 0., 0.]).unwrap();
        // Blade to airfoil at 90 deg maps (x, y) to (-y, x)
        assert_relative_eq!(d.mx[0], -6000., max_relative = 1e-12);
        assert_relative_eq!(d.my[0], 3000., max_relative = 1e-12);
        assert_relative_eq!(d.mx[1], 2000., max_relative = 1e-12);
        assert_relative_eq!(d.my[2], 0., epsilon = 1e-9);
    }

    #[test]
    fn test_gust_speed() {
        let v = gust_speed(10., 11.4, TurbulenceClass::B, 3.);
        let sigma = 2. * 0.14 * (0.072 * (5. + 3.) * (5.7 - 4.) + 10.);
        assert_relative_eq!(v, 11.4 + 3. * sigma, max_relative = 1e-14);
        assert!(gust_speed(10., 11.4, TurbulenceClass::A, 3.) > v);
    }

    #[test]
    fn test_power_curve_setpoint() {
        let c = power_curve_setpoint(7.5, 1., 11., 63., 0.7).unwrap();
        assert_relative_eq!(c.v_hub, 7.7, max_relative = 1e-14);
        assert_relative_eq!(c.omega, 7.5 * 7.7 / 63. * 30. / std::f64::consts::PI, max_relative = 1e-14);
        assert_eq!(c.azimuth, 0.);
        assert_eq!(c.case, LoadCase::PowerCurve);
        assert!(power_curve_setpoint(7.5, 1., 11., 0., 0.7).is_err());
    }

    #[test]
    fn test_extreme_rotor_loads() {
        let stuck = RotorLoads {
            thrust: 9e5,
            torque: 3e5,
        };
        let feathered = RotorLoads {
            thrust: 3e5,
            torque: 0.,
        };
        let ext = extreme_rotor_loads(stuck, feathered, 3).unwrap();
        assert_relative_eq!(ext.thrust, 5e5, max_relative = 1e-14);
        assert_relative_eq!(ext.torque, 1e5, max_relative = 1e-14);
        assert!(extreme_rotor_loads(stuck, feathered, 0).is_err());
    }
}

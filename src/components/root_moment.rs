use interp::{interp_slice, InterpMode};
use itertools::{izip, Itertools};

use crate::{
    components::{curvature::BladeCurvature, loads::AeroLoads},
    error::{Result, StructuralError},
    frames::{DirectionVector, Frame},
    interp::InterpMethod,
    quadrature::Quadrature,
    util::linspace,
};

/// Integrated aerodynamic loads at the blade root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootLoads {
    /// Root force in blade axes
    pub force: DirectionVector,
    /// Root moment in azimuth axes
    pub moment: DirectionVector,
    /// Magnitude of the root moment
    pub bending_moment: f64,
    /// Total cone at the root (deg)
    pub root_cone: f64,
}

/// Root force and moment from the aerodynamic loads, integrated along the
/// curved blade axis with the trapezoidal rule.
pub fn root_moment(aero: &AeroLoads, r: &[f64], curvature: &BladeCurvature) -> Result<RootLoads> {
    let p = aero.on_grid(r, InterpMethod::Linear)?;
    let trapz = Quadrature::trapezoidal(&curvature.s);

    let force = DirectionVector::new(
        trapz.integrate(&p.px),
        trapz.integrate(&p.py),
        trapz.integrate(&p.pz),
        Frame::Blade,
    );

    let vectors = p.vectors();
    let arm = izip!(
        vectors.iter(),
        curvature.total_cone.iter(),
        curvature.x_az.iter(),
        curvature.y_az.iter(),
        curvature.z_az.iter()
    )
    .map(|(load, &cone, &x, &y, &z)| {
        let load = load.to_frame(Frame::Azimuth, cone)?;
        Ok(DirectionVector::new(x, y, z, Frame::Azimuth).cross(&load)?.as_array())
    })
    .collect::<Result<Vec<_>>>()?;
    let moment = DirectionVector::from_array(trapz.integrate_vectors(&arm), Frame::Azimuth);

    Ok(RootLoads {
        force,
        moment,
        bending_moment: moment.magnitude(),
        root_cone: curvature.total_cone.first().copied().unwrap_or_default(),
    })
}

/// Sum of the root loads of all blades in hub axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HubLoads {
    pub force: DirectionVector,
    pub moment: DirectionVector,
}

/// Sums the root loads of `n_blades` blades, equally spaced around the rotor
/// starting at azimuth 0, in hub axes.
///
/// `cases` holds the root loads evaluated at given rotor azimuths (deg). The
/// loads of a blade are taken from the case at its azimuth, or interpolated
/// linearly and periodically between the neighbouring cases.
pub fn hub_loads(cases: &[(f64, RootLoads)], n_blades: usize) -> Result<HubLoads> {
    if n_blades == 0 {
        return Err(StructuralError::Config("number of blades must be positive".into()));
    }
    let table = cases
        .iter()
        .map(|&(azimuth, root)| (azimuth.rem_euclid(360.), root))
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .collect_vec();
    let (Some(&(az_first, first)), Some(&(az_last, last))) = (table.first(), table.last()) else {
        return Err(StructuralError::Config("hub loads need at least one root load case".into()));
    };
    if let Some(w) = table.windows(2).find(|w| w[1].0 - w[0].0 < 1e-9) {
        return Err(StructuralError::Config(format!(
            "root load cases repeat azimuth {}",
            w[1].0
        )));
    }

    // Close the table over one revolution
    let azimuth = std::iter::once(az_last - 360.)
        .chain(table.iter().map(|(a, _)| *a))
        .chain(std::iter::once(az_first + 360.))
        .collect_vec();
    let rows = std::iter::once(last)
        .chain(table.iter().map(|(_, r)| *r))
        .chain(std::iter::once(first))
        .collect_vec();

    let blade_azimuth = linspace(0., 360., n_blades + 1)
        .into_iter()
        .take(n_blades)
        .collect_vec();
    let at_blades = |value: fn(&RootLoads) -> f64| {
        let y = rows.iter().map(value).collect_vec();
        interp_slice(&azimuth, &y, &blade_azimuth, &InterpMode::FirstLast)
    };
    let (fx, fy, fz) = (at_blades(|r| r.force.x), at_blades(|r| r.force.y), at_blades(|r| r.force.z));
    let (mx, my, mz) = (
        at_blades(|r| r.moment.x),
        at_blades(|r| r.moment.y),
        at_blades(|r| r.moment.z),
    );
    let root_cone = first.root_cone;

    let zero = DirectionVector::new(0., 0., 0., Frame::Hub);
    (0..n_blades).try_fold(
        HubLoads {
            force: zero,
            moment: zero,
        },
        |acc, k| {
            let angle = blade_azimuth[k];
            let force = DirectionVector::new(fx[k], fy[k], fz[k], Frame::Blade)
                .through(&[(Frame::Azimuth, root_cone), (Frame::Hub, angle)])?;
            let moment = DirectionVector::new(mx[k], my[k], mz[k], Frame::Azimuth).to_frame(Frame::Hub, angle)?;
            Ok(HubLoads {
                force: acc.force.add(&force)?,
                moment: acc.moment.add(&moment)?,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::curvature::blade_curvature;
    use approx::assert_relative_eq;

    fn uniform_flap_load() -> (AeroLoads, Vec<f64>, BladeCurvature) {
        let r = linspace(2., 12., 6);
        let zeros = vec![0.; 6];
        let curvature = blade_curvature(&r, &zeros, &zeros, 0.).unwrap();
        let aero = AeroLoads {
            r: vec![0., 15.],
            px: vec![500., 500.],
            py: vec![0., 0.],
            pz: vec![0., 0.],
        };
        (aero, r, curvature)
    }

    #[test]
    fn test_uniform_flap_load() {
        let (aero, r, curvature) = uniform_flap_load();
        let root = root_moment(&aero, &r, &curvature).unwrap();
        assert_relative_eq!(root.force.x, 500. * 10., max_relative = 1e-12);
        assert_eq!(root.force.frame, Frame::Blade);
        // z × x points along +y
        assert_relative_eq!(root.moment.y, 500. * (144. - 4.) / 2., max_relative = 1e-12);
        assert_relative_eq!(root.moment.x, 0., epsilon = 1e-9);
        assert_relative_eq!(root.bending_moment, root.moment.y, max_relative = 1e-12);
    }

    #[test]
    fn test_outside_aero_grid() {
        let (mut aero, r, curvature) = uniform_flap_load();
        aero.r = vec![3., 15.];
        assert!(matches!(
            root_moment(&aero, &r, &curvature),
            Err(StructuralError::InterpolationDomain { station: 0, .. })
        ));
    }

    fn root_loads(force: [f64; 3], moment: [f64; 3]) -> RootLoads {
        let moment = DirectionVector::from_array(moment, Frame::Azimuth);
        RootLoads {
            force: DirectionVector::from_array(force, Frame::Blade),
            moment,
            bending_moment: moment.magnitude(),
            root_cone: 0.,
        }
    }

    #[test]
    fn test_hub_sum_cancels_in_plane_moments() {
        let (aero, r, curvature) = uniform_flap_load();
        let root = root_moment(&aero, &r, &curvature).unwrap();
        let cases = [(0., root), (120., root), (240., root)];
        let hub = hub_loads(&cases, 3).unwrap();
        assert_eq!(hub.force.frame, Frame::Hub);
        assert_relative_eq!(hub.force.x, 3. * root.force.x, max_relative = 1e-12);
        assert_relative_eq!(hub.moment.y, 0., epsilon = 1e-8);
        assert_relative_eq!(hub.moment.z, 0., epsilon = 1e-8);
    }

    #[test]
    fn test_hub_sum_counts_blades_not_cases() {
        // Same root loads at every azimuth: one contribution per blade
        let root = root_loads([2., 0., 0.], [1., 0., 0.]);
        let cases = [(0., root), (120., root), (240., root)];
        for n_blades in [1, 2, 3, 4] {
            let hub = hub_loads(&cases, n_blades).unwrap();
            assert_relative_eq!(hub.moment.x, n_blades as f64, max_relative = 1e-12);
            assert_relative_eq!(hub.force.x, 2. * n_blades as f64, max_relative = 1e-12);
        }
        let hub = hub_loads(&[(0., root)], 2).unwrap();
        assert_relative_eq!(hub.moment.x, 2., max_relative = 1e-12);
    }

    #[test]
    fn test_two_bladed_hub_sum() {
        // Blade 2 sits at 180 deg, where y and z change sign in hub axes
        let cases = [
            (0., root_loads([1., 2., 3.], [4., 5., 6.])),
            (180., root_loads([1., 0.5, 7.], [1., 2., 3.])),
        ];
        let hub = hub_loads(&cases, 2).unwrap();
        assert_relative_eq!(hub.moment.x, 4. + 1., max_relative = 1e-12);
        assert_relative_eq!(hub.moment.y, 5. - 2., max_relative = 1e-12);
        assert_relative_eq!(hub.moment.z, 6. - 3., max_relative = 1e-12);
        assert_relative_eq!(hub.force.x, 1. + 1., max_relative = 1e-12);
        assert_relative_eq!(hub.force.y, 2. - 0.5, max_relative = 1e-12);
        assert_relative_eq!(hub.force.z, 3. - 7., max_relative = 1e-12);
    }

    #[test]
    fn test_four_bladed_hub_sum_interpolates_azimuth() {
        // Cases at 0/120/240 deg, blades at 0/90/180/270 deg. The x axis is
        // the rotation axis so only the interpolation enters Mx.
        let m = |mx: f64| root_loads([0.; 3], [mx, 0., 0.]);
        let cases = [(240., m(70.)), (0., m(10.)), (120., m(40.))];
        let hub = hub_loads(&cases, 4).unwrap();
        let expected = 10. + (10. + 0.75 * 30.) + (40. + 0.5 * 30.) + (70. - 0.25 * 60.);
        assert_relative_eq!(hub.moment.x, expected, max_relative = 1e-12);

        // Azimuths outside [0, 360) wrap around
        let wrapped = [(-120., m(70.)), (360., m(10.)), (120., m(40.))];
        assert_eq!(hub_loads(&wrapped, 4).unwrap(), hub);
    }

    #[test]
    fn test_hub_sum_errors() {
        let root = root_loads([1., 0., 0.], [1., 0., 0.]);
        assert!(hub_loads(&[], 3).is_err());
        assert!(hub_loads(&[(0., root)], 0).is_err());
        assert!(matches!(
            hub_loads(&[(0., root), (360., root)], 2),
            Err(StructuralError::Config(_))
        ));
    }
}

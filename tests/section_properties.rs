use approx::assert_relative_eq;
use rotorstruct::{
    components::section::{AirfoilProfile, SectionEngine},
    input::Stations,
    laminate::{Laminate, LaminateStack, Material, Ply, SectionLayup},
};

const E: f64 = 2e11;
const NU: f64 = 0.3;
const RHO: f64 = 7850.;

/// Thin rectangular tube spanning the whole chord: mid-line width `b`,
/// mid-line height `h`, wall thickness `t`.
fn rectangular_tube(b: f64, h: f64, t: f64) -> (AirfoilProfile, SectionLayup) {
    let outer = (h + t) / (2. * b);
    let profile = AirfoilProfile {
        x: vec![0., 0.5, 1.],
        y_upper: vec![outer; 3],
        y_lower: vec![-outer; 3],
    };
    let wall = Laminate {
        plies: vec![
            Ply {
                thickness: t / 2.,
                orientation: 0.,
                material: 0,
            },
            Ply {
                thickness: t / 2.,
                orientation: 90.,
                material: 0,
            },
        ],
    };
    let surface = LaminateStack {
        loc: vec![0., 1.],
        sectors: vec![wall.clone()],
    };
    let layup = SectionLayup {
        upper: surface.clone(),
        lower: surface,
        webs: LaminateStack {
            loc: vec![0., 1.],
            sectors: vec![wall.clone(), wall],
        },
    };
    (profile, layup)
}

#[test]
fn test_isotropic_box_matches_closed_form() {
    let materials = vec![Material::isotropic("steel", E, NU, RHO)];
    let engine = SectionEngine::new(&materials);

    let dims = [(2.0, 0.8, 0.02), (1.5, 0.6, 0.015), (1.0, 0.4, 0.01)];
    let stations = Stations {
        r: vec![2., 10., 20.],
        chord: dims.iter().map(|d| d.0).collect(),
        theta: vec![0.; 3],
        le_location: vec![0.5; 3],
        precurve: vec![0.; 3],
        presweep: vec![0.; 3],
    };
    let (profiles, layups): (Vec<_>, Vec<_>) = dims.iter().map(|&(b, h, t)| rectangular_tube(b, h, t)).unzip();

    let beam = engine.properties(&stations, &profiles, &layups).unwrap();

    for (i, &(b, h, t)) in dims.iter().enumerate() {
        let area = 2. * (b + h) * t;
        let i_flap = 2. * b * t * (h / 2.).powi(2) + 2. * t * h.powi(3) / 12.;
        let i_edge = 2. * t * b.powi(3) / 12. + 2. * h * t * (b / 2.).powi(2);

        assert_relative_eq!(beam.ea[i], E * area, max_relative = 1e-2);
        assert_relative_eq!(beam.ei_yy[i], E * i_flap, max_relative = 1e-2);
        assert_relative_eq!(beam.ei_xx[i], E * i_edge, max_relative = 1e-2);
        assert_relative_eq!(beam.rho_a[i], RHO * area, max_relative = 1e-2);
        assert_relative_eq!(beam.ei_xy[i], 0., epsilon = 1e-6 * beam.ei_xx[i]);
    }
    assert_eq!(beam.z, stations.r);
}

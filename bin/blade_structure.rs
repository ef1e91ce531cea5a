use std::process;

use rotorstruct::{
    analysis::BladeAnalysis,
    config::{read_conditions_from_file, read_settings_from_file},
    elements::{beams::CantileverBeamSolver, curved::CurvedFrameEigensolver},
    error::Result,
    external::read_aero_loads_from_file,
    input::read_blade_from_file,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: blade_structure <blade.yaml> <settings.yaml> <conditions.yaml> <aero_loads.yaml>";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let [blade, settings, conditions, aero] = args.as_slice() else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    if let Err(e) = run(blade, settings, conditions, aero) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(blade: &str, settings: &str, conditions: &str, aero: &str) -> Result<()> {
    let blade = read_blade_from_file(blade)?;
    let settings = read_settings_from_file(settings)?;
    let conditions = read_conditions_from_file(conditions)?;
    let aero = read_aero_loads_from_file(aero)?;

    let solver = CantileverBeamSolver::new()?;
    let analysis = BladeAnalysis {
        aero: &aero,
        solver: &solver,
        eigensolver: &CurvedFrameEigensolver,
        settings: &settings,
        conditions: &conditions,
    };
    let res = analysis.run(&blade)?;

    info!(
        blade_mass = res.structure.blade_mass,
        rotor_mass = res.mass.mass_all_blades,
        "mass"
    );
    info!(beam = ?res.structure.freq, curved = ?res.modal.freq, "natural frequencies (Hz)");
    info!(
        tip_deflection = res.tip.tip_deflection,
        ground_clearance = res.tip.ground_clearance,
        delta_blade_length = res.blade_deflection.delta_blade_length,
        "deflection"
    );
    info!(
        root_bending_moment = res.root_rated.bending_moment,
        hub_force = ?res.hub.force.as_array(),
        hub_moment = ?res.hub.moment.as_array(),
        "root loads"
    );
    info!(
        thrust = res.extreme_rotor.thrust,
        torque = res.extreme_rotor.torque,
        "extreme rotor loads"
    );

    let max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let m = &res.margins;
    info!(
        strain_spar = max(&m.strain_spar.upper).max(max(&m.strain_spar.lower)),
        strain_te = max(&m.strain_te.upper).max(max(&m.strain_te.lower)),
        buckling_spar = max(&m.buckling_spar.upper).max(max(&m.buckling_spar.lower)),
        pn_beam = max(&m.freq_beam.pn),
        "largest margin ratios"
    );
    Ok(())
}

//! Submergence sweep for an elliptic hydrofoil.
//!
//! Builds a small elliptic foil, solves it in free flight and at a range of
//! depths below a free surface, and prints the resulting lift and drag
//! coefficients. The last configuration's full force report is exported as
//! JSON.

use std::fs::File;
use std::io::Write;

use log::info;

use hydroline::{
    BoundaryCondition, ForceReport, FreeSurfaceConfig, Freestream, LinearAirfoil, LinearDatabase,
    SceneGeometry, SolverOptions, Taper, Vec3, WingBuilder, froude_number, integrate_forces, solve,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let speed = 6.0;
    let freestream = Freestream::standard_water(Vec3::new(speed, 0.0, 0.0));
    let database = LinearDatabase::single(
        "naca0012",
        LinearAirfoil {
            cd0: 0.008,
            cd2: 0.01,
            cl_max: 1.4,
            ..LinearAirfoil::default()
        },
    );

    let wing = WingBuilder {
        taper: Taper::Elliptic,
        sections: 40,
        incidence: 4.0_f64.to_radians(),
        airfoil: "naca0012".to_string(),
        ..WingBuilder::new("hydrofoil", 2.0, 0.25)
    }
    .build();
    let geometry = SceneGeometry::new(vec![wing]);
    let options = SolverOptions::default();

    println!("hydroline {} - submergence sweep", hydroline::VERSION);
    println!("{:<12}{:>8}{:>10}{:>10}{:>8}", "depth (m)", "Fr", "CL", "CD", "iters");

    // Free-flight baseline.
    let solution = solve(
        &geometry,
        &database,
        &freestream,
        &FreeSurfaceConfig::disabled(),
        &options,
    )?;
    let report = integrate_forces(&geometry, &database, &freestream, &solution, Vec3::zero())?;
    println!(
        "{:<12}{:>8}{:>10.4}{:>10.5}{:>8}",
        "free", "-", report.cl, report.cd, solution.diagnostics.iterations
    );

    let mut last_report: Option<ForceReport> = None;
    for depth in [2.0, 1.0, 0.5, 0.3] {
        // Foil stays at the origin; the surface plane sits `depth` above it.
        let config = FreeSurfaceConfig {
            wave_corrections: true,
            submergence: depth,
            ..FreeSurfaceConfig::horizontal_plane(depth, BoundaryCondition::Biplane)
        };
        let froude = froude_number(speed, freestream.gravity, depth);
        info!("depth {depth} m, Froude {froude:.3}");

        let solution = solve(&geometry, &database, &freestream, &config, &options)?;
        let report = integrate_forces(&geometry, &database, &freestream, &solution, Vec3::zero())?;
        if !solution.diagnostics.converged {
            println!(
                "{depth:<12}{froude:>8.3}  did not converge (residual {:.3e})",
                solution.diagnostics.residual
            );
            continue;
        }
        println!(
            "{:<12}{:>8.3}{:>10.4}{:>10.5}{:>8}",
            depth, froude, report.cl, report.cd, solution.diagnostics.iterations
        );
        last_report = Some(report);
    }

    if let Some(report) = last_report {
        let mut file = File::create("hydroline_forces.json")?;
        file.write_all(report.to_json_pretty()?.as_bytes())?;
        println!("exported hydroline_forces.json");
    }

    Ok(())
}

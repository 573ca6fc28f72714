//! Force and moment integration over the converged circulation.
//!
//! Deterministic post-processing of a [`Solution`]: the inviscid force on
//! each strip follows Kutta-Joukowski, `ρ Γ (v_i × dl)`, the viscous drag
//! acts along the local flow, and the sectional pitching moment acts about
//! the local span axis. Totals are resolved both in the scene frame and in
//! the wind frame (lift, drag, side force). Non-convergence is propagated
//! as a flag, never silently dropped.

use serde::{Deserialize, Serialize};

use crate::airfoil::AirfoilDatabase;
use crate::conditions::Freestream;
use crate::error::Error;
use crate::geometry::SceneGeometry;
use crate::solver::{Solution, query_section};
use crate::vector::Vec3;

/// Sectional load distribution entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionLoad {
    /// Control point position.
    pub position: Vec3,
    /// Local effective angle of attack (rad).
    pub alpha: f64,
    /// Local Reynolds number.
    pub reynolds: f64,
    /// Circulation strength (m²/s).
    pub circulation: f64,
    /// Section lift coefficient.
    pub cl: f64,
    /// Section drag coefficient.
    pub cd: f64,
    /// Section moment coefficient.
    pub cm: f64,
}

/// Integrated loads for one lifting surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceForces {
    /// Surface name.
    pub name: String,
    /// Total force in the scene frame (N).
    pub force: Vec3,
    /// Total moment about the reference point (N·m).
    pub moment: Vec3,
    /// Wind-frame lift (N).
    pub lift: f64,
    /// Wind-frame drag (N).
    pub drag: f64,
    /// Wind-frame side force (N).
    pub side: f64,
    /// Per-section load distribution.
    pub sections: Vec<SectionLoad>,
}

/// Complete force and moment report for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceReport {
    /// Whether the underlying circulation distribution converged.
    pub converged: bool,
    /// Reference area used for the coefficients (m²).
    pub reference_area: f64,
    /// Total force in the scene frame (N).
    pub total_force: Vec3,
    /// Total moment about the reference point (N·m).
    pub total_moment: Vec3,
    /// Total wind-frame lift (N).
    pub lift: f64,
    /// Total wind-frame drag (N).
    pub drag: f64,
    /// Total wind-frame side force (N).
    pub side: f64,
    /// Lift coefficient.
    pub cl: f64,
    /// Drag coefficient.
    pub cd: f64,
    /// Side-force coefficient.
    pub cs: f64,
    /// Per-surface breakdown.
    pub surfaces: Vec<SurfaceForces>,
}

impl ForceReport {
    /// Serializes the report as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Wind-frame axes (drag, side, lift directions) for a freestream.
fn wind_axes(freestream: &Freestream) -> (Vec3, Vec3, Vec3) {
    let u_inf = freestream.direction();
    let u_lift = u_inf
        .cross(&Vec3::new(0.0, 1.0, 0.0))
        .normalized()
        .unwrap_or_else(Vec3::up);
    let u_side = u_lift.cross(&u_inf);
    (u_inf, u_side, u_lift)
}

/// Integrates forces and moments over every surface.
///
/// Moments are taken about `reference_point` in the scene frame. The airfoil
/// database supplies the sectional drag and moment coefficients at the
/// converged local flow state.
pub fn integrate_forces(
    geometry: &SceneGeometry,
    database: &dyn AirfoilDatabase,
    freestream: &Freestream,
    solution: &Solution,
    reference_point: Vec3,
) -> Result<ForceReport, Error> {
    let (u_inf, u_side, u_lift) = wind_axes(freestream);
    let rho = freestream.density;

    let mut surfaces = Vec::with_capacity(geometry.surfaces.len());
    let mut total_force = Vec3::zero();
    let mut total_moment = Vec3::zero();

    let mut index = 0;
    for surface in &geometry.surfaces {
        let mut surface_force = Vec3::zero();
        let mut surface_moment = Vec3::zero();
        let mut sections = Vec::with_capacity(surface.sections.len());

        for section in &surface.sections {
            let gamma = solution.circulation[index];
            let velocity = solution.local_velocity[index];
            let alpha = solution.alpha[index];
            let reynolds = solution.reynolds[index];
            let coefficients = query_section(database, &section.airfoil, alpha, reynolds)?;

            let speed_sq = velocity.magnitude_sq();
            let dynamic_pressure = 0.5 * rho * speed_sq;
            let flow_dir = velocity.normalized().unwrap_or(u_inf);

            let inviscid = velocity.cross(&section.bound_vector()).mul(rho * gamma);
            let viscous = flow_dir.mul(dynamic_pressure * section.area * coefficients.cd);
            let force = inviscid.add(&viscous);

            let arm = section.control_point.sub(&reference_point);
            let section_moment = section
                .u_span
                .mul(dynamic_pressure * section.area * section.chord * coefficients.cm);
            let moment = arm.cross(&force).add(&section_moment);

            surface_force = surface_force.add(&force);
            surface_moment = surface_moment.add(&moment);

            sections.push(SectionLoad {
                position: section.control_point,
                alpha,
                reynolds,
                circulation: gamma,
                cl: coefficients.cl,
                cd: coefficients.cd,
                cm: coefficients.cm,
            });
            index += 1;
        }

        total_force = total_force.add(&surface_force);
        total_moment = total_moment.add(&surface_moment);
        surfaces.push(SurfaceForces {
            name: surface.name.clone(),
            force: surface_force,
            moment: surface_moment,
            lift: surface_force.dot(&u_lift),
            drag: surface_force.dot(&u_inf),
            side: surface_force.dot(&u_side),
            sections,
        });
    }

    let q_ref = 0.5 * rho * freestream.speed().powi(2) * geometry.reference_area;
    let lift = total_force.dot(&u_lift);
    let drag = total_force.dot(&u_inf);
    let side = total_force.dot(&u_side);

    Ok(ForceReport {
        converged: solution.diagnostics.converged,
        reference_area: geometry.reference_area,
        total_force,
        total_moment,
        lift,
        drag,
        side,
        cl: lift / q_ref,
        cd: drag / q_ref,
        cs: side / q_ref,
        surfaces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airfoil::{LinearAirfoil, LinearDatabase};
    use crate::geometry::{Taper, WingBuilder};
    use crate::solver::{SolverOptions, solve};
    use crate::surface_effect::FreeSurfaceConfig;
    use approx::assert_relative_eq;

    fn scene(alpha: f64) -> SceneGeometry {
        let wing = WingBuilder {
            taper: Taper::Elliptic,
            sections: 32,
            incidence: alpha,
            airfoil: "section".to_string(),
            ..WingBuilder::new("wing", 2.0, 0.2)
        }
        .build();
        SceneGeometry::new(vec![wing])
    }

    fn database() -> LinearDatabase {
        LinearDatabase::single(
            "section",
            LinearAirfoil {
                cd0: 0.008,
                cd2: 0.01,
                cm_l0: -0.05,
                ..LinearAirfoil::default()
            },
        )
    }

    fn solve_scene(alpha: f64) -> (SceneGeometry, Freestream, Solution) {
        let geometry = scene(alpha);
        let freestream = Freestream::standard_water(Vec3::new(5.0, 0.0, 0.0));
        let solution = solve(
            &geometry,
            &database(),
            &freestream,
            &FreeSurfaceConfig::disabled(),
            &SolverOptions::default(),
        )
        .unwrap();
        (geometry, freestream, solution)
    }

    #[test]
    fn test_lift_is_positive_and_vertical() {
        let (geometry, freestream, solution) = solve_scene(0.05);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        assert!(report.converged);
        assert!(report.lift > 0.0);
        assert!(report.total_force.z > 0.0);
        // Lift dominates drag for an attached thin section.
        assert!(report.lift > 10.0 * report.drag);
    }

    #[test]
    fn test_drag_includes_profile_drag() {
        let (geometry, freestream, solution) = solve_scene(0.05);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        let q_ref = 0.5 * freestream.density * freestream.speed().powi(2) * geometry.reference_area;
        assert!(report.drag > 0.9 * q_ref * 0.008);
    }

    #[test]
    fn test_symmetric_wing_has_no_roll_or_yaw() {
        let (geometry, freestream, solution) = solve_scene(0.05);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        let scale = report.lift.abs().max(1.0);
        assert_relative_eq!(report.total_moment.x / scale, 0.0, epsilon = 1e-6);
        assert_relative_eq!(report.total_moment.z / scale, 0.0, epsilon = 1e-6);
        // Pitching moment from cm_l0 is present.
        assert!(report.total_moment.y.abs() > 0.0);
    }

    #[test]
    fn test_coefficients_match_forces() {
        let (geometry, freestream, solution) = solve_scene(0.05);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        let q_ref = 0.5 * freestream.density * freestream.speed().powi(2) * geometry.reference_area;
        assert_relative_eq!(report.cl * q_ref, report.lift, max_relative = 1e-12);
        assert_relative_eq!(report.cd * q_ref, report.drag, max_relative = 1e-12);
    }

    #[test]
    fn test_distribution_lengths() {
        let (geometry, freestream, solution) = solve_scene(0.05);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        assert_eq!(report.surfaces.len(), 1);
        assert_eq!(report.surfaces[0].sections.len(), geometry.section_count());
    }

    #[test]
    fn test_nonconvergence_flag_propagates() {
        let geometry = scene(0.05);
        let freestream = Freestream::standard_water(Vec3::new(5.0, 0.0, 0.0));
        let solution = solve(
            &geometry,
            &database(),
            &freestream,
            &FreeSurfaceConfig::disabled(),
            &SolverOptions {
                max_iterations: 1,
                tolerance: 1e-300,
                ..SolverOptions::default()
            },
        )
        .unwrap();
        assert!(!solution.diagnostics.converged);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        assert!(!report.converged);
    }

    #[test]
    fn test_json_export() {
        let (geometry, freestream, solution) = solve_scene(0.05);
        let report =
            integrate_forces(&geometry, &database(), &freestream, &solution, Vec3::zero()).unwrap();
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"cl\""));
        assert!(json.contains("\"surfaces\""));
        let back: ForceReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}

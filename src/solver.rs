//! Nonlinear circulation solver.
//!
//! Solves the lifting-line system for the circulation distribution: at every
//! control point the vortex lift `2 |v_i × dl_i| Γ_i` must equal the section
//! lift `V_i² Cl(α_i, Re_i) dS_i`, where `v_i` is the freestream plus the
//! velocity induced by all circulations (and images) through the influence
//! matrix. A linear solve provides the initial guess; a damped Newton
//! iteration with the analytic Jacobian closes the nonlinear system.
//!
//! The solve is a pure function of its inputs: no solver object, no shared
//! state, which keeps batch sweeps embarrassingly parallel.

use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use ndarray_linalg::Solve;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::airfoil::{AirfoilDatabase, SectionCoefficients};
use crate::conditions::Freestream;
use crate::error::{AirfoilError, ConfigError, Error};
use crate::geometry::SceneGeometry;
use crate::influence::InfluenceMatrix;
use crate::surface_effect::{FreeSurfaceConfig, froude_number};
use crate::vector::Vec3;

/// Angle-of-attack clamp used when retrying a failed airfoil query (rad).
const ALPHA_RETRY_CLAMP: f64 = 0.436_332_312_998_582_4; // 25 degrees

/// Floor for |v × dl| in Jacobian terms; avoids division blow-up when the
/// local flow momentarily aligns with the bound vortex.
const MIN_VORTEX_LIFT_ARM: f64 = 1e-12;

/// Initial guess strategy for the Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialGuess {
    /// Start from the linearized lifting-line solution.
    #[default]
    Linear,
    /// Start from zero circulation.
    Zero,
}

/// Tunable solver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Iteration cap; reaching it reports non-convergence, not an error.
    pub max_iterations: usize,
    /// Convergence tolerance on the max-norm of the residual.
    pub tolerance: f64,
    /// Newton step relaxation factor in (0, 1].
    pub relaxation: f64,
    /// Initial guess strategy.
    pub initial_guess: InitialGuess,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            relaxation: 1.0,
            initial_guess: InitialGuess::Linear,
        }
    }
}

impl SolverOptions {
    /// Rejects out-of-range options before solving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::BadSolverOption {
                name: "max_iterations",
                value: 0.0,
            });
        }
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(ConfigError::BadSolverOption {
                name: "tolerance",
                value: self.tolerance,
            });
        }
        if !(self.relaxation > 0.0 && self.relaxation <= 1.0) {
            return Err(ConfigError::BadSolverOption {
                name: "relaxation",
                value: self.relaxation,
            });
        }
        Ok(())
    }
}

/// Convergence report for a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Whether the residual dropped below tolerance within the cap.
    pub converged: bool,
    /// Newton iterations performed.
    pub iterations: usize,
    /// Final residual max-norm.
    pub residual: f64,
}

/// Converged (or best-effort) circulation distribution plus the local flow
/// state the force integrator consumes.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Circulation strengths, one per control point.
    pub circulation: Array1<f64>,
    /// Local total velocity at each control point.
    pub local_velocity: Vec<Vec3>,
    /// Local effective angle of attack (rad).
    pub alpha: Vec<f64>,
    /// Local Reynolds number.
    pub reynolds: Vec<f64>,
    /// Convergence diagnostics.
    pub diagnostics: Diagnostics,
}

/// Per-section constants extracted from the geometry once per solve.
struct SectionData<'a> {
    airfoil: &'a str,
    dl: Vec3,
    area: f64,
    chord: f64,
    u_axial: Vec3,
    u_normal: Vec3,
}

/// Flow state at the control points for a given circulation vector.
struct FlowState {
    velocity: Vec<Vec3>,
    speed_sq: Vec<f64>,
    v_axial: Vec<f64>,
    v_normal: Vec<f64>,
    alpha: Vec<f64>,
    reynolds: Vec<f64>,
    coefficients: Vec<SectionCoefficients>,
    /// v_i × dl_i
    vortex_arm: Vec<Vec3>,
    vortex_arm_mag: Vec<f64>,
    residual: Array1<f64>,
    /// False when the flow state contains non-finite values; the solver
    /// stops and reports non-convergence instead of propagating NaN.
    finite: bool,
}

/// Queries the database, retrying once with a clamped angle of attack
/// before giving up.
pub(crate) fn query_section(
    database: &dyn AirfoilDatabase,
    section: &str,
    alpha: f64,
    reynolds: f64,
) -> Result<SectionCoefficients, AirfoilError> {
    match database.coefficients(section, alpha, reynolds) {
        Ok(c) => Ok(c),
        Err(first) => {
            let clamped = alpha.clamp(-ALPHA_RETRY_CLAMP, ALPHA_RETRY_CLAMP);
            warn!(
                "airfoil '{section}' query failed at alpha = {alpha:.4}, retrying clamped to {clamped:.4}"
            );
            database
                .coefficients(section, clamped, reynolds)
                .map_err(|_| first)
        }
    }
}

/// Evaluates the flow state and lifting-line residual for a circulation
/// vector. Non-finite local velocities short-circuit to a state flagged
/// `finite: false` without touching the airfoil database.
fn evaluate(
    sections: &[SectionData<'_>],
    matrix: &InfluenceMatrix,
    database: &dyn AirfoilDatabase,
    freestream: &Freestream,
    circulation: &Array1<f64>,
) -> Result<FlowState, Error> {
    let n = sections.len();
    let nu = freestream.kinematic_viscosity;

    let mut state = FlowState {
        velocity: Vec::with_capacity(n),
        speed_sq: Vec::with_capacity(n),
        v_axial: Vec::with_capacity(n),
        v_normal: Vec::with_capacity(n),
        alpha: Vec::with_capacity(n),
        reynolds: Vec::with_capacity(n),
        coefficients: Vec::with_capacity(n),
        vortex_arm: Vec::with_capacity(n),
        vortex_arm_mag: Vec::with_capacity(n),
        residual: Array1::zeros(n),
        finite: true,
    };

    let induced: Vec<Vec3> = (0..n)
        .map(|i| freestream.velocity.add(&matrix.induced_velocity(i, circulation)))
        .collect();
    if induced
        .iter()
        .any(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
    {
        // Flag divergence and hand back a well-formed freestream-only state;
        // the solver stops and reports non-convergence.
        return Ok(freestream_fallback_state(sections, freestream, n));
    }

    for (i, section) in sections.iter().enumerate() {
        let v = induced[i];
        let speed_sq = v.magnitude_sq();
        let speed = speed_sq.sqrt();
        let v_axial = v.dot(&section.u_axial);
        let v_normal = v.dot(&section.u_normal);
        let alpha = v_normal.atan2(v_axial);
        let reynolds = speed * section.chord / nu;
        let coefficients = query_section(database, section.airfoil, alpha, reynolds)?;

        let arm = v.cross(&section.dl);
        let arm_mag = arm.magnitude();

        state.residual[i] =
            2.0 * arm_mag * circulation[i] - speed_sq * coefficients.cl * section.area;
        state.velocity.push(v);
        state.speed_sq.push(speed_sq);
        state.v_axial.push(v_axial);
        state.v_normal.push(v_normal);
        state.alpha.push(alpha);
        state.reynolds.push(reynolds);
        state.coefficients.push(coefficients);
        state.vortex_arm.push(arm);
        state.vortex_arm_mag.push(arm_mag);
    }

    Ok(state)
}

/// Well-formed placeholder state built from the freestream alone, used when
/// the induced velocities have gone non-finite. Residuals are infinite so
/// the caller can only report non-convergence.
fn freestream_fallback_state(
    sections: &[SectionData<'_>],
    freestream: &Freestream,
    n: usize,
) -> FlowState {
    let v = freestream.velocity;
    let speed_sq = v.magnitude_sq();
    let speed = speed_sq.sqrt();
    let mut state = FlowState {
        velocity: vec![v; n],
        speed_sq: vec![speed_sq; n],
        v_axial: Vec::with_capacity(n),
        v_normal: Vec::with_capacity(n),
        alpha: Vec::with_capacity(n),
        reynolds: Vec::with_capacity(n),
        coefficients: vec![SectionCoefficients::default(); n],
        vortex_arm: Vec::with_capacity(n),
        vortex_arm_mag: Vec::with_capacity(n),
        residual: Array1::from_elem(n, f64::INFINITY),
        finite: false,
    };
    for section in sections {
        let v_axial = v.dot(&section.u_axial);
        let v_normal = v.dot(&section.u_normal);
        let arm = v.cross(&section.dl);
        state.v_axial.push(v_axial);
        state.v_normal.push(v_normal);
        state.alpha.push(v_normal.atan2(v_axial));
        state.reynolds.push(speed * section.chord / freestream.kinematic_viscosity);
        state.vortex_arm_mag.push(arm.magnitude());
        state.vortex_arm.push(arm);
    }
    state
}

fn max_norm(residual: &Array1<f64>) -> f64 {
    residual.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()))
}

/// Linearized lifting-line solution used as the Newton initial guess.
fn linear_guess(
    sections: &[SectionData<'_>],
    matrix: &InfluenceMatrix,
    database: &dyn AirfoilDatabase,
    freestream: &Freestream,
) -> Result<Array1<f64>, Error> {
    let n = sections.len();
    let v_inf = freestream.velocity;
    let speed = freestream.speed();
    let nu = freestream.kinematic_viscosity;

    let mut a = Array2::<f64>::zeros((n, n));
    let mut b = Array1::<f64>::zeros(n);

    for (i, section) in sections.iter().enumerate() {
        let alpha_inf = v_inf.dot(&section.u_normal).atan2(v_inf.dot(&section.u_axial));
        let reynolds = speed * section.chord / nu;
        let coefficients = query_section(database, section.airfoil, alpha_inf, reynolds)?;

        for j in 0..n {
            a[[i, j]] = -(speed * coefficients.cl_alpha * section.area)
                * matrix.entry(i, j).dot(&section.u_normal);
        }
        a[[i, i]] += 2.0 * v_inf.cross(&section.dl).magnitude();
        b[i] = speed * speed * section.area * coefficients.cl;
    }

    Ok(a.solve_into(b)?)
}

/// Solves for the circulation distribution over the scene.
///
/// Configuration and geometry problems abort before iteration; failure to
/// converge is reported in [`Diagnostics`], with the best available
/// circulation, never as NaN.
pub fn solve(
    geometry: &SceneGeometry,
    database: &dyn AirfoilDatabase,
    freestream: &Freestream,
    surface_effect: &FreeSurfaceConfig,
    options: &SolverOptions,
) -> Result<Solution, Error> {
    freestream.validate()?;
    surface_effect.validate()?;
    options.validate()?;

    let matrix = InfluenceMatrix::build(geometry, freestream, surface_effect)?;
    let sections: Vec<SectionData<'_>> = geometry
        .sections()
        .map(|s| SectionData {
            airfoil: &s.airfoil,
            dl: s.bound_vector(),
            area: s.area,
            chord: s.chord,
            u_axial: s.u_axial,
            u_normal: s.u_normal,
        })
        .collect();
    let n = sections.len();

    info!(
        "solving {n} control points, surface effect {}",
        if surface_effect.enabled { "on" } else { "off" }
    );
    if surface_effect.wave_corrections {
        info!(
            "wave corrections active, depth Froude number {:.3}",
            froude_number(freestream.speed(), freestream.gravity, surface_effect.submergence)
        );
    }

    let mut circulation = match options.initial_guess {
        InitialGuess::Linear => linear_guess(&sections, &matrix, database, freestream)?,
        InitialGuess::Zero => Array1::zeros(n),
    };

    let nu = freestream.kinematic_viscosity;
    let mut state = evaluate(&sections, &matrix, database, freestream, &circulation)?;
    let mut residual = max_norm(&state.residual);
    let mut iterations = 0;
    let mut converged = state.finite && residual < options.tolerance;

    let mut jacobian = Array2::<f64>::zeros((n, n));
    while !converged && state.finite && iterations < options.max_iterations {
        for (i, section) in sections.iter().enumerate() {
            let arm_mag = state.vortex_arm_mag[i].max(MIN_VORTEX_LIFT_ARM);
            let coefficients = &state.coefficients[i];
            // Zero-or-negative lift slopes (stall) are clamped so the
            // Jacobian stays diagonally dominated.
            let cl_alpha = coefficients.cl_alpha.max(0.0);
            let plane_sq = state.v_axial[i] * state.v_axial[i]
                + state.v_normal[i] * state.v_normal[i];
            let speed = state.speed_sq[i].sqrt().max(MIN_VORTEX_LIFT_ARM);

            for j in 0..n {
                let m_ij = matrix.entry(i, j);
                let vortex_term = (2.0 * circulation[i] / arm_mag)
                    * state.vortex_arm[i].dot(&m_ij.cross(&section.dl));
                let v_dot = state.velocity[i].dot(&m_ij);
                let dalpha = (state.v_axial[i] * m_ij.dot(&section.u_normal)
                    - state.v_normal[i] * m_ij.dot(&section.u_axial))
                    / plane_sq;
                let dcl_dre = coefficients.cl_reynolds * section.chord / (nu * speed) * v_dot;

                jacobian[[i, j]] = vortex_term
                    - 2.0 * section.area * coefficients.cl * v_dot
                    - state.speed_sq[i] * section.area * (cl_alpha * dalpha + dcl_dre);
            }
            jacobian[[i, i]] += 2.0 * arm_mag;
        }

        let step = match jacobian.solve(&state.residual.mapv(|r| -r)) {
            Ok(step) => step,
            Err(err) => {
                warn!("Jacobian factorization failed after {iterations} iteration(s): {err}");
                break;
            }
        };

        circulation = circulation + step.mapv(|d| options.relaxation * d);
        iterations += 1;

        if circulation.iter().any(|g| !g.is_finite()) {
            warn!("circulation became non-finite at iteration {iterations}");
            residual = f64::INFINITY;
            break;
        }

        state = evaluate(&sections, &matrix, database, freestream, &circulation)?;
        residual = max_norm(&state.residual);
        debug!("iteration {iterations}: residual {residual:.3e}");
        converged = state.finite && residual < options.tolerance;
    }

    if !converged {
        warn!(
            "solver did not converge: {iterations} iteration(s), residual {residual:.3e}"
        );
    }

    // Non-finite circulations are never returned as a usable distribution.
    if circulation.iter().any(|g| !g.is_finite()) {
        circulation.fill(0.0);
    }

    Ok(Solution {
        circulation,
        local_velocity: state.velocity,
        alpha: state.alpha,
        reynolds: state.reynolds,
        diagnostics: Diagnostics {
            converged,
            iterations,
            residual,
        },
    })
}

/// Solves independent freestream conditions in parallel.
///
/// Each condition is a fully independent solve over the same geometry and
/// surface-effect configuration; results come back in input order.
pub fn solve_batch(
    geometry: &SceneGeometry,
    database: &dyn AirfoilDatabase,
    conditions: &[Freestream],
    surface_effect: &FreeSurfaceConfig,
    options: &SolverOptions,
) -> Vec<Result<Solution, Error>> {
    conditions
        .par_iter()
        .map(|freestream| solve(geometry, database, freestream, surface_effect, options))
        .collect()
}

//! Airfoil section database adapter.
//!
//! The solver consumes 2D section aerodynamics as a black box: given a
//! section identifier, an angle of attack, and a Reynolds number, the
//! database returns lift, drag, and moment coefficients together with the
//! local lift slope. Extrapolation and clamping policy outside the tabulated
//! range belongs to the adapter, not the solver.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::AirfoilError;

/// Section coefficients returned by a database query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionCoefficients {
    /// Lift coefficient.
    pub cl: f64,
    /// Drag coefficient.
    pub cd: f64,
    /// Pitching moment coefficient about the quarter chord.
    pub cm: f64,
    /// Lift slope dCl/dalpha (1/rad) at the queried angle.
    pub cl_alpha: f64,
    /// Lift sensitivity to Reynolds number dCl/dRe. Zero for most models.
    pub cl_reynolds: f64,
}

/// Black-box section aerodynamics consumed by the solver.
///
/// Implementations must be `Sync`; the solver queries sections from parallel
/// workers during batch sweeps.
pub trait AirfoilDatabase: Sync {
    /// Returns the section coefficients at the given angle of attack
    /// (radians) and Reynolds number.
    fn coefficients(
        &self,
        section: &str,
        alpha: f64,
        reynolds: f64,
    ) -> Result<SectionCoefficients, AirfoilError>;
}

/// Linear thin-airfoil model with a quadratic drag polar.
///
/// Lift is `cl_alpha * (alpha - alpha_l0)`, clamped to `±cl_max`; the lift
/// slope reported past the clamp is zero, which is how a stalled section
/// presents itself to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearAirfoil {
    /// Lift slope (1/rad).
    pub cl_alpha: f64,
    /// Zero-lift angle of attack (rad).
    pub alpha_l0: f64,
    /// Moment coefficient at zero lift.
    pub cm_l0: f64,
    /// Moment slope (1/rad).
    pub cm_alpha: f64,
    /// Drag polar constant term.
    pub cd0: f64,
    /// Drag polar linear-in-Cl term.
    pub cd1: f64,
    /// Drag polar quadratic-in-Cl term.
    pub cd2: f64,
    /// Maximum lift coefficient magnitude.
    pub cl_max: f64,
    /// Lift sensitivity to Reynolds number.
    pub cl_reynolds: f64,
}

impl Default for LinearAirfoil {
    fn default() -> Self {
        Self {
            cl_alpha: 2.0 * PI,
            alpha_l0: 0.0,
            cm_l0: 0.0,
            cm_alpha: 0.0,
            cd0: 0.0,
            cd1: 0.0,
            cd2: 0.0,
            cl_max: f64::INFINITY,
            cl_reynolds: 0.0,
        }
    }
}

impl LinearAirfoil {
    /// Evaluates the model at the given angle of attack.
    pub fn evaluate(&self, alpha: f64) -> SectionCoefficients {
        let mut cl = self.cl_alpha * (alpha - self.alpha_l0);
        let mut cl_alpha = self.cl_alpha;
        if cl.abs() > self.cl_max {
            cl = cl.signum() * self.cl_max;
            cl_alpha = 0.0;
        }
        let cd = self.cd0 + self.cd1 * cl + self.cd2 * cl * cl;
        let cm = self.cm_l0 + self.cm_alpha * (alpha - self.alpha_l0);
        SectionCoefficients {
            cl,
            cd,
            cm,
            cl_alpha,
            cl_reynolds: self.cl_reynolds,
        }
    }
}

/// Named collection of linear airfoil sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearDatabase {
    sections: HashMap<String, LinearAirfoil>,
}

impl LinearDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a section model under the given identifier.
    pub fn insert(&mut self, name: impl Into<String>, airfoil: LinearAirfoil) {
        self.sections.insert(name.into(), airfoil);
    }

    /// Single-section database, convenient for uniform wings.
    pub fn single(name: impl Into<String>, airfoil: LinearAirfoil) -> Self {
        let mut db = Self::new();
        db.insert(name, airfoil);
        db
    }
}

impl AirfoilDatabase for LinearDatabase {
    fn coefficients(
        &self,
        section: &str,
        alpha: f64,
        reynolds: f64,
    ) -> Result<SectionCoefficients, AirfoilError> {
        if !alpha.is_finite() || !reynolds.is_finite() {
            return Err(AirfoilError {
                section: section.to_string(),
                alpha,
                reynolds,
                reason: "non-finite query".to_string(),
            });
        }
        let airfoil = self.sections.get(section).ok_or_else(|| AirfoilError {
            section: section.to_string(),
            alpha,
            reynolds,
            reason: "unknown section identifier".to_string(),
        })?;
        Ok(airfoil.evaluate(alpha))
    }
}

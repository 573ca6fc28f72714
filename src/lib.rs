//! Nonlinear lifting-line solver for hydrofoils near a free surface.
//!
//! This library solves the general numerical lifting-line problem over one
//! or more discretized lifting surfaces:
//! - Influence matrix from the closed-form Biot-Savart law for jointed
//!   horseshoe vortices, with mirrored image elements enforcing a rigid-plane
//!   or free-surface boundary condition
//! - Damped Newton iteration on the nonlinear lifting-line equation, with a
//!   linearized solution as the initial guess
//! - Optional Froude-number wave corrections for submerged foils
//!   (experimental)
//! - Force and moment integration with per-section load distributions
//!
//! All quantities are SI. Solves are pure functions of their inputs, so
//! batch sweeps over operating conditions parallelize trivially.

#![warn(missing_docs)]
#![warn(clippy::doc_markdown)]

pub mod airfoil;
pub mod conditions;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod influence;
pub mod solver;
pub mod surface_effect;
pub mod vector;

// Re-export key types for easy use
pub use airfoil::{AirfoilDatabase, LinearAirfoil, LinearDatabase, SectionCoefficients};
pub use conditions::{Freestream, UnitSystem};
pub use error::{AirfoilError, ConfigError, Error, GeometryError};
pub use forces::{ForceReport, SectionLoad, SurfaceForces, integrate_forces};
pub use geometry::{SceneGeometry, Section, Surface, Taper, WingBuilder};
pub use influence::InfluenceMatrix;
pub use solver::{Diagnostics, InitialGuess, Solution, SolverOptions, solve, solve_batch};
pub use surface_effect::{BoundaryCondition, FreeSurfaceConfig, froude_number, wave_downwash};
pub use vector::Vec3;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

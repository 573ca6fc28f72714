//! Error taxonomy for the lifting-line solver.
//!
//! Configuration and geometry problems abort before any expensive
//! computation. Airfoil lookups may fail recoverably once (the solver retries
//! with a clamped angle of attack) before becoming fatal. Numerical
//! non-convergence is deliberately *not* represented here; it is reported as
//! data on [`crate::solver::Diagnostics`].

use thiserror::Error;

/// Invalid solver or surface-effect configuration, rejected before solving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The free-surface plane normal is not unit length.
    #[error("surface plane normal must be unit length, got |n| = {magnitude:.6}")]
    NonUnitNormal {
        /// Magnitude of the supplied normal.
        magnitude: f64,
    },

    /// Wave corrections were requested without a positive submergence depth.
    #[error("wave corrections require submergence > 0, got {submergence}")]
    WaveWithoutSubmergence {
        /// The offending submergence value.
        submergence: f64,
    },

    /// Wave corrections were requested without enabling the free surface.
    #[error("wave corrections require the free surface to be enabled")]
    WaveWithoutFreeSurface,

    /// Submergence must be a finite, non-negative depth in metres.
    #[error("submergence must be finite and non-negative, got {submergence}")]
    InvalidSubmergence {
        /// The offending submergence value.
        submergence: f64,
    },

    /// Only SI inputs are accepted; conversion happens upstream or not at all.
    #[error("imperial units are not supported; supply SI quantities")]
    ImperialUnits,

    /// A flow quantity that must be strictly positive was not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending quantity.
        name: &'static str,
        /// The supplied value.
        value: f64,
    },

    /// A solver option outside its allowed range.
    #[error("solver option {name} out of range: {value}")]
    BadSolverOption {
        /// Name of the offending option.
        name: &'static str,
        /// The supplied value.
        value: f64,
    },
}

/// Degenerate geometry detected while building the influence matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The scene holds no lifting surfaces.
    #[error("scene contains no lifting surfaces")]
    EmptyScene,

    /// A surface holds no sections.
    #[error("surface '{surface}' has no sections")]
    EmptySurface {
        /// Name of the offending surface.
        surface: String,
    },

    /// A bound vortex segment with (near-)zero length.
    #[error("zero-length bound vortex segment: surface '{surface}', section {section}")]
    DegenerateSegment {
        /// Name of the offending surface.
        surface: String,
        /// Section index within the surface.
        section: usize,
    },

    /// A section with non-positive chord or area.
    #[error("invalid section dimensions at surface '{surface}', section {section}: chord = {chord}, area = {area}")]
    BadSection {
        /// Name of the offending surface.
        surface: String,
        /// Section index within the surface.
        section: usize,
        /// Local chord length.
        chord: f64,
        /// Strip planform area.
        area: f64,
    },

    /// A control point coincident with a vortex node of some element.
    #[error("control point {control_point} coincides with a vortex node of element {element}")]
    CoincidentPoint {
        /// Global index of the control point.
        control_point: usize,
        /// Global index of the offending horseshoe element.
        element: usize,
    },
}

/// Airfoil database failure for a specific query.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("airfoil '{section}' lookup failed at alpha = {alpha:.4} rad, Re = {reynolds:.3e}: {reason}")]
pub struct AirfoilError {
    /// Section identifier that was queried.
    pub section: String,
    /// Queried angle of attack in radians.
    pub alpha: f64,
    /// Queried Reynolds number.
    pub reynolds: f64,
    /// Adapter-provided failure description.
    pub reason: String,
}

/// Top-level error for a solve.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, detected before solving.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Degenerate geometry, detected while building the influence matrix.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Persistent airfoil database failure.
    #[error("airfoil database error: {0}")]
    Airfoil(#[from] AirfoilError),

    /// The dense linear solve could not be factorized.
    #[error("linear system solve failed: {0}")]
    LinearSolve(#[from] ndarray_linalg::error::LinalgError),
}

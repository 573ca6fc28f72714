//! Freestream and fluid conditions.
//!
//! All quantities are SI: metres, seconds, kilograms, radians. Imperial
//! inputs are rejected at validation rather than converted.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::vector::Vec3;

/// Unit system tag carried by scene inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    /// SI units. The only system the solver computes in.
    #[default]
    Si,
    /// Imperial units. Recognized so it can be rejected explicitly.
    Imperial,
}

/// Uniform freestream and fluid properties for a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Freestream {
    /// Freestream velocity in the scene frame (m/s).
    pub velocity: Vec3,
    /// Fluid density (kg/m³).
    pub density: f64,
    /// Kinematic viscosity (m²/s).
    pub kinematic_viscosity: f64,
    /// Gravitational acceleration (m/s²), used by Froude-based corrections.
    pub gravity: f64,
    /// Unit system of the supplied quantities.
    pub units: UnitSystem,
}

impl Default for Freestream {
    fn default() -> Self {
        Self::standard_water(Vec3::new(1.0, 0.0, 0.0))
    }
}

impl Freestream {
    /// Fresh water at 20 °C under standard gravity.
    pub fn standard_water(velocity: Vec3) -> Self {
        Self {
            velocity,
            density: 998.2,
            kinematic_viscosity: 1.004e-6,
            gravity: 9.81,
            units: UnitSystem::Si,
        }
    }

    /// Sea-level standard air.
    pub fn standard_air(velocity: Vec3) -> Self {
        Self {
            velocity,
            density: 1.225,
            kinematic_viscosity: 1.46e-5,
            gravity: 9.81,
            units: UnitSystem::Si,
        }
    }

    /// Freestream speed (m/s).
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// Freestream unit direction. Validation guarantees a non-zero velocity.
    pub fn direction(&self) -> Vec3 {
        self.velocity
            .normalized()
            .unwrap_or_else(|| Vec3::new(1.0, 0.0, 0.0))
    }

    /// Rejects non-physical or non-SI conditions before a solve starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.units {
            UnitSystem::Si => {}
            UnitSystem::Imperial => return Err(ConfigError::ImperialUnits),
        }
        let speed = self.speed();
        if !(speed > 0.0) || !speed.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "freestream speed",
                value: speed,
            });
        }
        if !(self.density > 0.0) || !self.density.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "density",
                value: self.density,
            });
        }
        if !(self.kinematic_viscosity > 0.0) || !self.kinematic_viscosity.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "kinematic viscosity",
                value: self.kinematic_viscosity,
            });
        }
        if !(self.gravity > 0.0) || !self.gravity.is_finite() {
            return Err(ConfigError::NonPositive {
                name: "gravity",
                value: self.gravity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_water_valid() {
        let fs = Freestream::standard_water(Vec3::new(5.0, 0.0, 0.0));
        assert!(fs.validate().is_ok());
        assert_eq!(fs.speed(), 5.0);
    }

    #[test]
    fn test_imperial_rejected() {
        let fs = Freestream {
            units: UnitSystem::Imperial,
            ..Freestream::standard_water(Vec3::new(5.0, 0.0, 0.0))
        };
        assert_eq!(fs.validate(), Err(ConfigError::ImperialUnits));
    }

    #[test]
    fn test_zero_speed_rejected() {
        let fs = Freestream::standard_water(Vec3::zero());
        assert!(matches!(
            fs.validate(),
            Err(ConfigError::NonPositive { name: "freestream speed", .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let fs = Freestream::standard_water(Vec3::new(3.0, 0.0, 0.1));
        let json = serde_json::to_string(&fs).unwrap();
        let back: Freestream = serde_json::from_str(&json).unwrap();
        assert_eq!(fs, back);
    }
}

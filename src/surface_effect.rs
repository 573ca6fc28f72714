//! Free-surface and ground-plane boundary effects.
//!
//! A boundary near the foil is modeled by mirroring every vortex element
//! across the surface plane. The sign with which the mirrored element enters
//! the influence matrix encodes the boundary condition: a rigid plane
//! (ground effect) adds the image contribution, a biplane/free-surface
//! boundary subtracts it.
//!
//! An optional wave correction perturbs the induced velocity with the
//! wave part of the submerged-hydrofoil potential (Nishiyama's linearized
//! steady theory). The correction is experimental and only applies when
//! explicitly enabled with a positive submergence depth.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::vector::Vec3;

/// Admissible deviation of the plane normal from unit length.
const NORMAL_TOLERANCE: f64 = 1e-6;

/// Boundary condition enforced by the image system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Rigid plane (ground effect): the image enforces zero normal flow
    /// through the plane by symmetry. Image contribution is added.
    #[default]
    RigidPlane,
    /// Biplane/free-surface approximation: the image carries the opposite
    /// sense. Image contribution is subtracted.
    Biplane,
}

/// Surface-effect configuration for a solve. Immutable once solving starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSurfaceConfig {
    /// Whether any boundary is present. When false the remaining fields are
    /// ignored and the solve is free-flight.
    #[serde(alias = "has_free_surface")]
    pub enabled: bool,
    /// Unit normal of the surface plane.
    #[serde(alias = "surf_plane_normal", alias = "surface_plane_normal")]
    pub plane_normal: Vec3,
    /// Any point on the surface plane.
    #[serde(alias = "point_on_surface")]
    pub point_on_plane: Vec3,
    /// Which boundary condition the image system enforces.
    pub boundary: BoundaryCondition,
    /// Whether to apply the experimental wave correction.
    pub wave_corrections: bool,
    /// Submergence depth of the foil below the surface (m). Required
    /// positive when `wave_corrections` is set.
    pub submergence: f64,
}

impl Default for FreeSurfaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            plane_normal: Vec3::up(),
            point_on_plane: Vec3::zero(),
            boundary: BoundaryCondition::RigidPlane,
            wave_corrections: false,
            submergence: 0.0,
        }
    }
}

impl FreeSurfaceConfig {
    /// Free-flight configuration (no boundary).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Boundary at the plane z = `height` with the given condition.
    pub fn horizontal_plane(height: f64, boundary: BoundaryCondition) -> Self {
        Self {
            enabled: true,
            point_on_plane: Vec3::new(0.0, 0.0, height),
            boundary,
            ..Self::default()
        }
    }

    /// Rejects invalid combinations before any solve iteration runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.submergence.is_finite() || self.submergence < 0.0 {
            return Err(ConfigError::InvalidSubmergence {
                submergence: self.submergence,
            });
        }
        if self.wave_corrections {
            if !self.enabled {
                return Err(ConfigError::WaveWithoutFreeSurface);
            }
            if self.submergence <= 0.0 {
                return Err(ConfigError::WaveWithoutSubmergence {
                    submergence: self.submergence,
                });
            }
        }
        if self.enabled {
            let magnitude = self.plane_normal.magnitude();
            if (magnitude - 1.0).abs() > NORMAL_TOLERANCE {
                return Err(ConfigError::NonUnitNormal { magnitude });
            }
        }
        Ok(())
    }

    /// Sign with which an image contribution enters the influence matrix.
    pub fn image_sign(&self) -> f64 {
        match self.boundary {
            BoundaryCondition::RigidPlane => 1.0,
            BoundaryCondition::Biplane => -1.0,
        }
    }

    /// Mirrors a point across the surface plane.
    pub fn reflect_point(&self, point: &Vec3) -> Vec3 {
        point.reflect_about_plane(&self.plane_normal, &self.point_on_plane)
    }

    /// Mirrors a direction across the surface plane.
    pub fn reflect_direction(&self, direction: &Vec3) -> Vec3 {
        direction.reflect(&self.plane_normal)
    }
}

/// Depth Froude number V / sqrt(g h).
///
/// Returns infinity for zero submergence; callers gate on a validated
/// configuration before using the value.
pub fn froude_number(speed: f64, gravity: f64, submergence: f64) -> f64 {
    speed / (gravity * submergence).sqrt()
}

/// Downwash per unit circulation induced by the wave part of the hydrofoil
/// potential at the spanwise station `y` of a control point (the foil is
/// assumed centered about y = 0).
///
/// Nishiyama's linearized steady theory for a submerged hydrofoil; the
/// result is the z-velocity perturbation applied to the matrix diagonal
/// (before the common 1/(4 pi) factor). `speed` is the freestream speed and
/// `h` the submergence depth, both SI.
pub fn wave_downwash(y: f64, h: f64, speed: f64, gravity: f64) -> f64 {
    let k0 = speed * speed / gravity;
    let h2_4 = 4.0 * h * h;
    let y2 = y * y;
    let root = (y2 + h2_4).sqrt();
    let arg = 0.5 * k0 * root;

    let near_field = -(h2_4 - y2) / ((h2_4 + y2) * (h2_4 + y2));
    let wave_field = k0
        * (-k0 * h).exp()
        * ((1.0 + h2_4 / (y2 + h2_4)) * bessel::k0(arg)
            + 2.0
                * (2.0 * h / root - 1.0 / (k0 * root) + 8.0 * h * h / (k0 * root.powi(3)))
                * bessel::k1(arg));

    near_field + wave_field
}

/// Modified Bessel functions of the second kind, orders 0 and 1.
///
/// Polynomial approximations from Abramowitz & Stegun section 9.8,
/// accurate to a few parts in 1e7 over the positive axis.
pub mod bessel {
    /// Modified Bessel function I0.
    fn i0(x: f64) -> f64 {
        let ax = x.abs();
        if ax < 3.75 {
            let y = (x / 3.75) * (x / 3.75);
            1.0 + y
                * (3.5156229
                    + y * (3.0899424
                        + y * (1.2067492 + y * (0.2659732 + y * (0.360768e-1 + y * 0.45813e-2)))))
        } else {
            let y = 3.75 / ax;
            (ax.exp() / ax.sqrt())
                * (0.39894228
                    + y * (0.1328592e-1
                        + y * (0.225319e-2
                            + y * (-0.157565e-2
                                + y * (0.916281e-2
                                    + y * (-0.2057706e-1
                                        + y * (0.2635537e-1
                                            + y * (-0.1647633e-1 + y * 0.392377e-2))))))))
        }
    }

    /// Modified Bessel function I1.
    fn i1(x: f64) -> f64 {
        let ax = x.abs();
        let ans = if ax < 3.75 {
            let y = (x / 3.75) * (x / 3.75);
            ax * (0.5
                + y * (0.87890594
                    + y * (0.51498869
                        + y * (0.15084934 + y * (0.2658733e-1 + y * (0.301532e-2 + y * 0.32411e-3))))))
        } else {
            let y = 3.75 / ax;
            let tail = 0.2282967e-1 + y * (-0.2895312e-1 + y * (0.1787654e-1 - y * 0.420059e-2));
            let head = 0.39894228
                + y * (-0.3988024e-1
                    + y * (-0.362018e-2 + y * (0.163801e-2 + y * (-0.1031555e-1 + y * tail))));
            head * ax.exp() / ax.sqrt()
        };
        if x < 0.0 { -ans } else { ans }
    }

    /// Modified Bessel function K0 for x > 0.
    pub fn k0(x: f64) -> f64 {
        if x <= 2.0 {
            let y = x * x / 4.0;
            -(x / 2.0).ln() * i0(x)
                + (-0.57721566
                    + y * (0.42278420
                        + y * (0.23069756
                            + y * (0.3488590e-1
                                + y * (0.262698e-2 + y * (0.10750e-3 + y * 0.74e-5))))))
        } else {
            let y = 2.0 / x;
            ((-x).exp() / x.sqrt())
                * (1.25331414
                    + y * (-0.7832358e-1
                        + y * (0.2189568e-1
                            + y * (-0.1062446e-1
                                + y * (0.587872e-2 + y * (-0.251540e-2 + y * 0.53208e-3))))))
        }
    }

    /// Modified Bessel function K1 for x > 0.
    pub fn k1(x: f64) -> f64 {
        if x <= 2.0 {
            let y = x * x / 4.0;
            (x / 2.0).ln() * i1(x)
                + (1.0 / x)
                    * (1.0
                        + y * (0.15443144
                            + y * (-0.67278579
                                + y * (-0.18156897
                                    + y * (-0.1919402e-1
                                        + y * (-0.110404e-2 + y * (-0.4686e-4)))))))
        } else {
            let y = 2.0 / x;
            ((-x).exp() / x.sqrt())
                * (1.25331414
                    + y * (0.23498619
                        + y * (-0.3655620e-1
                            + y * (0.1504268e-1
                                + y * (-0.780353e-2 + y * (0.325614e-2 + y * (-0.68245e-3)))))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_valid() {
        assert!(FreeSurfaceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_wave_without_submergence_rejected() {
        let config = FreeSurfaceConfig {
            enabled: true,
            wave_corrections: true,
            submergence: 0.0,
            ..FreeSurfaceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::WaveWithoutSubmergence { submergence: 0.0 })
        );
    }

    #[test]
    fn test_wave_without_free_surface_rejected() {
        let config = FreeSurfaceConfig {
            wave_corrections: true,
            submergence: 1.0,
            ..FreeSurfaceConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::WaveWithoutFreeSurface));
    }

    #[test]
    fn test_non_unit_normal_rejected() {
        let config = FreeSurfaceConfig {
            enabled: true,
            plane_normal: Vec3::new(0.0, 0.0, 2.0),
            ..FreeSurfaceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonUnitNormal { .. })
        ));
    }

    #[test]
    fn test_negative_submergence_rejected() {
        let config = FreeSurfaceConfig {
            submergence: -0.5,
            ..FreeSurfaceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSubmergence { .. })
        ));
    }

    #[test]
    fn test_image_signs_are_opposite() {
        let rigid = FreeSurfaceConfig::horizontal_plane(0.0, BoundaryCondition::RigidPlane);
        let biplane = FreeSurfaceConfig::horizontal_plane(0.0, BoundaryCondition::Biplane);
        assert_eq!(rigid.image_sign(), -biplane.image_sign());
    }

    #[test]
    fn test_reflection_round_trip() {
        let config = FreeSurfaceConfig::horizontal_plane(0.25, BoundaryCondition::RigidPlane);
        let p = Vec3::new(0.4, -1.3, -0.6);
        let twice = config.reflect_point(&config.reflect_point(&p));
        assert_relative_eq!(twice.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(twice.y, p.y, epsilon = 1e-12);
        assert_relative_eq!(twice.z, p.z, epsilon = 1e-12);
    }

    #[test]
    fn test_reflect_point_across_elevated_plane() {
        let config = FreeSurfaceConfig::horizontal_plane(1.0, BoundaryCondition::Biplane);
        let image = config.reflect_point(&Vec3::new(0.0, 0.5, -1.0));
        assert_relative_eq!(image.z, 3.0);
        assert_relative_eq!(image.y, 0.5);
    }

    #[test]
    fn test_froude_number() {
        assert_relative_eq!(froude_number(3.0, 9.81, 1.0), 3.0 / 9.81_f64.sqrt());
        assert!(froude_number(3.0, 9.81, 0.0).is_infinite());
    }

    #[test]
    fn test_bessel_k0_tabulated() {
        assert_relative_eq!(bessel::k0(0.5), 0.9244191, epsilon = 1e-6);
        assert_relative_eq!(bessel::k0(1.0), 0.4210244, epsilon = 1e-6);
        assert_relative_eq!(bessel::k0(2.0), 0.1138939, epsilon = 1e-6);
        assert_relative_eq!(bessel::k0(5.0), 0.003691098, epsilon = 1e-6);
    }

    #[test]
    fn test_bessel_k1_tabulated() {
        assert_relative_eq!(bessel::k1(0.5), 1.6564411, epsilon = 1e-6);
        assert_relative_eq!(bessel::k1(1.0), 0.6019072, epsilon = 1e-6);
        assert_relative_eq!(bessel::k1(2.0), 0.1398659, epsilon = 1e-6);
    }

    #[test]
    fn test_wave_downwash_finite() {
        let w = wave_downwash(0.3, 0.5, 4.0, 9.81);
        assert!(w.is_finite());
    }

    #[test]
    fn test_wave_downwash_decays_with_depth() {
        let shallow = wave_downwash(0.0, 0.3, 4.0, 9.81).abs();
        let deep = wave_downwash(0.0, 5.0, 4.0, 9.81).abs();
        assert!(deep < shallow);
    }

    #[test]
    fn test_scene_file_key_names_accepted() {
        let json = r#"{
            "has_free_surface": true,
            "surf_plane_normal": {"x": 0.0, "y": 0.0, "z": 1.0},
            "point_on_surface": {"x": 0.0, "y": 0.0, "z": 0.5},
            "submergence": 0.5
        }"#;
        let config: FreeSurfaceConfig = serde_json::from_str(json).unwrap();
        assert!(config.enabled);
        assert_relative_eq!(config.point_on_plane.z, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = FreeSurfaceConfig {
            enabled: true,
            boundary: BoundaryCondition::Biplane,
            wave_corrections: true,
            submergence: 0.7,
            ..FreeSurfaceConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: FreeSurfaceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

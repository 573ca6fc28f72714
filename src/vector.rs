//! 3D vector operations for lifting-line calculations.

use serde::{Deserialize, Serialize};

/// Tolerance below which a vector magnitude is treated as zero.
const EPS: f64 = 1e-12;

/// 3D vector with utility methods for vortex and flow computations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Unit vector in Z direction (up, away from a submerged foil toward the surface).
    pub const fn up() -> Self {
        Self { x: 0.0, y: 0.0, z: 1.0 }
    }

    /// Magnitude (length) of the vector.
    #[inline(always)]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Squared magnitude (avoids sqrt, cheaper for comparisons).
    #[inline(always)]
    pub fn magnitude_sq(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Normalized vector (unit length). `None` for a degenerate vector.
    pub fn normalized(&self) -> Option<Self> {
        let mag = self.magnitude();
        if mag < EPS {
            None
        } else {
            let inv = 1.0 / mag;
            Some(Self::new(self.x * inv, self.y * inv, self.z * inv))
        }
    }

    /// Dot product.
    #[inline(always)]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product: self × other
    #[inline(always)]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Element-wise addition.
    #[inline(always)]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Element-wise subtraction.
    #[inline(always)]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Scalar multiplication.
    #[inline(always)]
    pub fn mul(&self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    /// Distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        self.sub(other).magnitude()
    }

    /// Check if vector is approximately zero.
    pub fn is_zero(&self, eps: f64) -> bool {
        self.magnitude_sq() < eps * eps
    }

    /// Reflect a direction across a plane with the given unit normal.
    ///
    /// The normal must be unit length; this is enforced upstream by
    /// configuration validation.
    pub fn reflect(&self, normal: &Self) -> Self {
        let dot = self.dot(normal);
        self.sub(&normal.mul(2.0 * dot))
    }

    /// Reflect a point across the plane through `point_on_plane` with the
    /// given unit normal.
    pub fn reflect_about_plane(&self, normal: &Self, point_on_plane: &Self) -> Self {
        let offset = self.sub(point_on_plane);
        let dot = offset.dot(normal);
        self.sub(&normal.mul(2.0 * dot))
    }

    /// Angle between two vectors (in radians).
    /// Returns 0.0 if either vector has zero magnitude.
    pub fn angle_between(&self, other: &Self) -> f64 {
        let mag_self = self.magnitude();
        let mag_other = other.magnitude();
        if mag_self < EPS || mag_other < EPS {
            return 0.0;
        }
        let dot = self.dot(other) / (mag_self * mag_other);
        dot.clamp(-1.0, 1.0).acos()
    }

    /// Convert to array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Convert from array.
    pub fn from_array(arr: &[f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_magnitude() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(v.magnitude(), 5.0);
    }

    #[test]
    fn test_normalize() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let normalized = v.normalized().unwrap();
        assert_relative_eq!(normalized.magnitude(), 1.0);
        assert_relative_eq!(normalized.x, 0.6);
        assert_relative_eq!(normalized.y, 0.8);
    }

    #[test]
    fn test_normalize_degenerate() {
        assert!(Vec3::zero().normalized().is_none());
    }

    #[test]
    fn test_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let cross = a.cross(&b);
        assert_relative_eq!(cross.x, 0.0);
        assert_relative_eq!(cross.y, 0.0);
        assert_relative_eq!(cross.z, 1.0);
    }

    #[test]
    fn test_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a.dot(&b), 32.0);
    }

    #[test]
    fn test_reflect_direction() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let n = Vec3::up();
        let r = v.reflect(&n);
        assert_relative_eq!(r.x, 1.0);
        assert_relative_eq!(r.y, 2.0);
        assert_relative_eq!(r.z, -3.0);
    }

    #[test]
    fn test_reflect_point_about_offset_plane() {
        let p = Vec3::new(0.5, -1.0, -2.0);
        let plane_point = Vec3::new(0.0, 0.0, 1.0);
        let r = p.reflect_about_plane(&Vec3::up(), &plane_point);
        assert_relative_eq!(r.x, 0.5);
        assert_relative_eq!(r.y, -1.0);
        assert_relative_eq!(r.z, 4.0);
    }

    #[test]
    fn test_reflect_round_trip() {
        let p = Vec3::new(1.2, -0.7, -3.1);
        let n = Vec3::new(0.0, 0.6, 0.8);
        let plane_point = Vec3::new(0.3, 0.1, -0.2);
        let twice = p
            .reflect_about_plane(&n, &plane_point)
            .reflect_about_plane(&n, &plane_point);
        assert_relative_eq!(twice.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(twice.y, p.y, epsilon = 1e-12);
        assert_relative_eq!(twice.z, p.z, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_between() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 2.0, 0.0);
        assert_relative_eq!(a.angle_between(&b), std::f64::consts::FRAC_PI_2);
    }
}

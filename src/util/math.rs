//! Math type re-exports and scene-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the few types
//! the scene data model needs beyond them: half-precision quaternions,
//! ranges and bounding boxes.

// Re-export glam types
pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec4,
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Integer vectors
    IVec2, IVec3, IVec4,
    // Matrices
    Mat4, DMat4,
    // Quaternions
    Quat, DQuat,
};

use half::f16;
use std::fmt;

/// Quaternion with half precision components.
///
/// Instancer rotations are frequently authored at half precision; all
/// arithmetic goes through [`Quat`].
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Quath {
    pub x: f16,
    pub y: f16,
    pub z: f16,
    pub w: f16,
}

impl Quath {
    /// Identity rotation.
    pub const IDENTITY: Self = Self {
        x: f16::ZERO,
        y: f16::ZERO,
        z: f16::ZERO,
        w: f16::ONE,
    };

    /// Create a new half quaternion from its components.
    #[inline]
    pub const fn new(x: f16, y: f16, z: f16, w: f16) -> Self {
        Self { x, y, z, w }
    }

    /// Convert from a single precision quaternion.
    #[inline]
    pub fn from_quat(q: Quat) -> Self {
        Self {
            x: f16::from_f32(q.x),
            y: f16::from_f32(q.y),
            z: f16::from_f32(q.z),
            w: f16::from_f32(q.w),
        }
    }

    /// Convert to a single precision quaternion.
    #[inline]
    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(self.x.to_f32(), self.y.to_f32(), self.z.to_f32(), self.w.to_f32())
    }
}

impl fmt::Debug for Quath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quath({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

/// Closed interval of single precision values (camera clipping range).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Range1f {
    pub min: f32,
    pub max: f32,
}

impl Range1f {
    /// Create a new range.
    #[inline]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Range as a `(min, max)` vector.
    #[inline]
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.min, self.max)
    }
}

/// 3D bounding box with double precision.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox3d {
    pub min: DVec3,
    pub max: DVec3,
}

impl BBox3d {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }
}

impl Default for BBox3d {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3d({:?} - {:?})", self.min, self.max)
    }
}

/// Rotation of `angle_degrees` around `axis`, matching the convention of
/// angular velocities (degrees per second). A zero axis yields identity.
pub fn axis_angle_degrees(axis: Vec3, angle_degrees: f32) -> Quat {
    let len = axis.length();
    if len <= f32::EPSILON || !len.is_finite() {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis / len, angle_degrees.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quath_round_trip() {
        let q = Quat::from_rotation_y(0.5);
        let h = Quath::from_quat(q);
        let back = h.to_quat();
        assert!((back.y - q.y).abs() < 1e-3);
        assert!((back.w - q.w).abs() < 1e-3);
        assert_eq!(Quath::default().to_quat(), Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(Quath::IDENTITY.to_quat(), Quat::IDENTITY);
    }

    #[test]
    fn test_bbox3d() {
        let mut b = BBox3d::EMPTY;
        assert!(b.is_empty());

        b.expand_by_point(DVec3::new(-1.0, -1.0, -1.0));
        b.expand_by_point(DVec3::new(1.0, 1.0, 1.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, DVec3::splat(-1.0));
    }

    #[test]
    fn test_axis_angle_degrees() {
        let q = axis_angle_degrees(Vec3::new(0.0, 0.0, 2.0), 90.0);
        let v = q * Vec3::X;
        assert!((v - Vec3::Y).length() < 1e-5);
        assert_eq!(axis_angle_degrees(Vec3::ZERO, 45.0), Quat::IDENTITY);
    }
}

//! 2D transform value type.
//!
//! A [`Transform2D`] describes position, rotation (radians, counter-clockwise)
//! and scale, applied in TRS order: scale first, then rotation, then
//! translation. Transforms compose with `*` (`parent * local`) and convert to
//! and from a 3×3 affine matrix for renderers.

use std::ops::Mul;

use glam::{Mat3, Vec2};

/// Position, rotation and scale of a node plus a render layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,
    pub layer: u32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
        layer: 0,
    };

    pub fn new(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            position,
            rotation,
            scale,
            layer: 0,
        }
    }

    /// Pure translation.
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Affine matrix equivalent to `translate(position) · rotate(rotation) · scale(scale)`.
    pub fn mat3(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Decompose an affine matrix. Shear is dropped and the layer is reset.
    pub fn from_mat3(mat: Mat3) -> Self {
        let x_axis = mat.x_axis.truncate();
        let y_axis = mat.y_axis.truncate();
        Self {
            position: mat.z_axis.truncate(),
            rotation: x_axis.y.atan2(x_axis.x),
            scale: Vec2::new(x_axis.length(), y_axis.length()),
            layer: 0,
        }
    }

    /// Inverse transform: reciprocal scale, negated rotation and the matching
    /// translation.
    ///
    /// Exact when the scale is uniform or the rotation is zero. A non-uniform
    /// scale combined with a rotation would need shear to invert, so the
    /// result is only an approximation in that case.
    pub fn inverse(&self) -> Self {
        let scale = self.scale.recip();
        let rotation = -self.rotation;
        let position = -(Vec2::from_angle(rotation).rotate(self.position) * scale);
        Self {
            position,
            rotation,
            scale,
            layer: self.layer,
        }
    }

    /// Apply scale, rotation and translation to a point; matches [`Self::mat3`].
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        Vec2::from_angle(self.rotation).rotate(point * self.scale) + self.position
    }
}

/// Composition `parent * local`. The result carries the layer of `local`.
impl Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: Transform2D) -> Transform2D {
        Transform2D {
            position: self.transform_point(rhs.position),
            rotation: self.rotation + rhs.rotation,
            scale: self.scale * rhs.scale,
            layer: rhs.layer,
        }
    }
}

impl Mul<Vec2> for Transform2D {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        self.transform_point(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPSILON: f32 = 1e-4;

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_identity_is_default() {
        let t = Transform2D::default();
        assert_eq!(t, Transform2D::IDENTITY);
        assert!(vec_approx_eq(t * Vec2::new(3.0, -2.0), Vec2::new(3.0, -2.0)));
    }

    #[test]
    fn test_point_order_is_scale_rotate_translate() {
        let t = Transform2D::new(Vec2::new(10.0, 0.0), FRAC_PI_2, Vec2::new(2.0, 2.0));
        // (1, 0) -> scaled (2, 0) -> rotated (0, 2) -> translated (10, 2)
        assert!(vec_approx_eq(t * Vec2::new(1.0, 0.0), Vec2::new(10.0, 2.0)));
    }

    #[test]
    fn test_mat3_matches_point_transform() {
        let t = Transform2D::new(Vec2::new(-4.0, 7.5), 0.7, Vec2::new(3.0, 0.5));
        let p = Vec2::new(1.25, -2.0);
        assert!(vec_approx_eq(t.mat3().transform_point2(p), t * p));
    }

    #[test]
    fn test_from_mat3_round_trip() {
        let t = Transform2D::new(Vec2::new(1.0, 2.0), 0.3, Vec2::new(2.0, 4.0)).with_layer(7);
        let back = Transform2D::from_mat3(t.mat3());
        assert!(vec_approx_eq(back.position, t.position));
        assert!((back.rotation - t.rotation).abs() < EPSILON);
        assert!(vec_approx_eq(back.scale, t.scale));
        assert_eq!(back.layer, 0);
    }

    #[test]
    fn test_inverse_cancels_uniform_transform() {
        let t = Transform2D::new(Vec2::new(5.0, -3.0), FRAC_PI_4, Vec2::splat(2.0));
        let id = t.inverse() * t;
        assert!(vec_approx_eq(id.position, Vec2::ZERO));
        assert!(id.rotation.abs() < EPSILON);
        assert!(vec_approx_eq(id.scale, Vec2::ONE));

        let p = Vec2::new(0.5, 9.0);
        assert!(vec_approx_eq(t.inverse() * (t * p), p));
        assert!(vec_approx_eq(t * (t.inverse() * p), p));
    }

    #[test]
    fn test_inverse_without_rotation_handles_non_uniform_scale() {
        let t = Transform2D::new(Vec2::new(2.0, 1.0), 0.0, Vec2::new(4.0, 0.5));
        let p = Vec2::new(-1.0, 3.0);
        assert!(vec_approx_eq(t.inverse() * (t * p), p));
    }

    #[test]
    fn test_composition_is_associative() {
        let a = Transform2D::new(Vec2::new(1.0, 2.0), 0.4, Vec2::splat(1.5));
        let b = Transform2D::new(Vec2::new(-3.0, 0.5), -1.1, Vec2::splat(0.5));
        let c = Transform2D::new(Vec2::new(0.0, 4.0), 2.0, Vec2::new(2.0, 3.0));
        let p = Vec2::new(0.75, -1.25);
        assert!(vec_approx_eq(((a * b) * c) * p, (a * (b * c)) * p));
    }

    #[test]
    fn test_composition_applies_rhs_first() {
        let parent = Transform2D::from_position(Vec2::new(5.0, 5.0));
        let local = Transform2D::from_position(Vec2::new(1.0, 0.0)).with_layer(3);
        let global = parent * local;
        assert!(vec_approx_eq(global.position, Vec2::new(6.0, 5.0)));
        assert_eq!(global.layer, 3);
    }
}

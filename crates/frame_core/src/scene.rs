//! Geometry and per-object transform for the spinning triangle.

use std::f32::consts::FRAC_PI_4;
use std::f32::consts::TAU;

use bevy_math::Mat4;
use bevy_math::Vec3;
use bytemuck::Pod;
use bytemuck::Zeroable;

use crate::gpu_buffer::ConstantData;
use crate::gpu_buffer::assert_constant_layout;
use crate::vertex::Vertex;

/// Mirrors `cbuffer PerObject : register(b0)` in `vertex12.hlsl`.
///
/// - Offset 0: model-view-projection matrix, column-major (64 bytes)
/// - Offset 64: tint color (16 bytes)
/// - Offset 80: rotation angle in radians (4 bytes)
/// - Offset 84: padding up to 256 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PerObjectConstants {
    pub mvp: [f32; 16],
    pub tint: [f32; 4],
    pub rotation: f32,
    pub _padding: [f32; 43],
}

const _: () = assert_constant_layout::<PerObjectConstants>();

impl ConstantData for PerObjectConstants {}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [1.0, 0.0, 0.0, 1.0],
        texcoord: [0.5, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0, 1.0],
        texcoord: [1.0, 1.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0, 1.0],
        texcoord: [0.0, 1.0],
    },
];

/// CPU-side animation state advanced by `update(dt)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneState {
    angle: f32,
}

impl SceneState {
    /// Advances the rotation by `dt` seconds, wrapped into `[0, 2π)`.
    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + dt).rem_euclid(TAU);
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn constants(&self, aspect_ratio: f32) -> PerObjectConstants {
        let model = Mat4::from_rotation_y(self.angle);
        let view = Mat4::look_at_lh(Vec3::new(0.0, 0.0, -2.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_lh(FRAC_PI_4, aspect_ratio, 0.1, 100.0);
        PerObjectConstants {
            mvp: (projection * view * model).to_cols_array(),
            tint: [1.0, 1.0, 1.0, 1.0],
            rotation: self.angle,
            _padding: [0.0; 43],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_fill_one_aligned_block() {
        assert_eq!(std::mem::size_of::<PerObjectConstants>(), 256);
        assert_eq!(std::mem::offset_of!(PerObjectConstants, tint), 64);
        assert_eq!(std::mem::offset_of!(PerObjectConstants, rotation), 80);
    }

    #[test]
    fn angle_wraps_at_two_pi() {
        let mut scene = SceneState::default();
        scene.advance(TAU - 0.25);
        scene.advance(0.5);
        assert!((scene.angle() - 0.25).abs() < 1e-5);
        assert!(scene.angle() >= 0.0 && scene.angle() < TAU);
    }

    #[test]
    fn unrotated_triangle_top_stays_centered() {
        let constants = SceneState::default().constants(16.0 / 9.0);
        let mvp = Mat4::from_cols_array(&constants.mvp);
        let clip = mvp * bevy_math::Vec4::new(0.0, 0.5, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!(clip.y / clip.w > 0.0);
    }
}

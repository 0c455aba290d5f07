//! Particle state and the draw record handed to renderers.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// One fluid sample.
///
/// `density` and `pressure` are only meaningful after the density pass of the
/// current step, and `force` only after the force pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub density: f32,
    pub pressure: f32,
}

impl Particle {
    /// A particle at rest at `position`.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// A particle at `position` moving with `velocity`.
    pub fn with_velocity(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            ..Default::default()
        }
    }

    /// Kinetic energy for the given particle mass.
    #[inline]
    pub fn kinetic_energy(&self, mass: f32) -> f32 {
        0.5 * mass * self.velocity.length_squared()
    }
}

/// What a renderer needs to draw one particle.
///
/// The layout is `#[repr(C)]` and `Pod` so a slice of vertices can be uploaded
/// directly with [`bytemuck::cast_slice`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 2],
    pub radius: f32,
}

impl ParticleVertex {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position: position.to_array(),
            radius,
        }
    }
}

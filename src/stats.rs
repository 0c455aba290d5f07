//! Per-step summary numbers for logging and sanity checks.

use crate::particle::Particle;
use glam::Vec2;
use std::fmt;

/// Aggregate state of the particle set after a step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    pub step: u64,
    pub particle_count: usize,
    pub min_density: f32,
    pub max_density: f32,
    pub mean_density: f32,
    pub max_speed: f32,
    /// Sum of `0.5 * m * |v|^2`.
    pub kinetic_energy: f32,
    pub centroid: Vec2,
}

impl StepStats {
    pub fn gather(step: u64, particles: &[Particle], mass: f32) -> Self {
        if particles.is_empty() {
            return Self {
                step,
                ..Default::default()
            };
        }

        let mut stats = Self {
            step,
            particle_count: particles.len(),
            min_density: f32::INFINITY,
            max_density: f32::NEG_INFINITY,
            ..Default::default()
        };
        let mut density_sum = 0.0;
        let mut position_sum = Vec2::ZERO;
        for p in particles {
            stats.min_density = stats.min_density.min(p.density);
            stats.max_density = stats.max_density.max(p.density);
            stats.max_speed = stats.max_speed.max(p.velocity.length());
            stats.kinetic_energy += p.kinetic_energy(mass);
            density_sum += p.density;
            position_sum += p.position;
        }
        let n = particles.len() as f32;
        stats.mean_density = density_sum / n;
        stats.centroid = position_sum / n;
        stats
    }

    /// Whether every number is finite. A blown-up simulation shows up here first.
    pub fn is_finite(&self) -> bool {
        self.min_density.is_finite()
            && self.max_density.is_finite()
            && self.max_speed.is_finite()
            && self.kinetic_energy.is_finite()
            && self.centroid.is_finite()
    }
}

impl fmt::Display for StepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {:>6} | n={} density [{:.4}, {:.4}] mean {:.4} | max speed {:.2} | KE {:.3e} | centroid ({:.1}, {:.1})",
            self.step,
            self.particle_count,
            self.min_density,
            self.max_density,
            self.mean_density,
            self.max_speed,
            self.kinetic_energy,
            self.centroid.x,
            self.centroid.y
        )
    }
}

//! Simulation-wide physical constants.
//!
//! Every particle shares the same mass, kernel radius and fluid parameters, so they
//! live here rather than on [`Particle`](crate::Particle). A configuration can be built
//! in code with the `with_*` methods or loaded from JSON:
//!
//! ```ignore
//! use sph2d::prelude::*;
//!
//! let config = SphConfig::default()
//!     .with_particle_count(1_000)
//!     .with_viscosity(100.0);
//! config.save("dam.json")?;
//!
//! let loaded = SphConfig::load("dam.json")?;
//! assert_eq!(config, loaded);
//! ```

use crate::error::ConfigError;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Physical and numerical parameters of a simulation run.
///
/// Coordinates are screen-like: the origin is the top-left corner of the domain and
/// `y` grows downward, so the default gravity points along `+y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphConfig {
    /// Domain width and height. Particles live in `[0, width] x [0, height]`.
    pub domain: Vec2,
    /// Kernel support radius `h`. Also the side length of a grid cell.
    pub kernel_radius: f32,
    /// Density at which pressure is zero.
    pub rest_density: f32,
    /// Stiffness of the linear equation of state.
    pub gas_constant: f32,
    /// Viscosity coefficient.
    pub viscosity: f32,
    /// External acceleration applied to every particle.
    pub gravity: Vec2,
    /// Mass shared by all particles.
    pub mass: f32,
    /// Fixed integration timestep.
    pub dt: f32,
    /// Velocity scale on wall contact, in the open interval `(-1, 0)`.
    pub bound_damping: f32,
    /// Distance from each wall at which particles are stopped.
    pub bound_epsilon: f32,
    /// Number of particles seeded into the dam.
    pub particle_count: usize,
    /// Seed for the jitter RNG.
    pub seed: u64,
    /// Maximum horizontal jitter added to each seeded particle.
    pub jitter: f32,
}

impl Default for SphConfig {
    fn default() -> Self {
        let kernel_radius = 16.0;
        Self {
            domain: Vec2::new(800.0, 600.0),
            kernel_radius,
            rest_density: 300.0,
            gas_constant: 2000.0,
            viscosity: 200.0,
            gravity: Vec2::new(0.0, 10.0),
            mass: 2.5,
            dt: 0.0007,
            bound_damping: -0.5,
            bound_epsilon: kernel_radius,
            particle_count: 500,
            seed: 0,
            jitter: 1.0,
        }
    }
}

impl SphConfig {
    /// Set the domain size.
    pub fn with_domain(mut self, width: f32, height: f32) -> Self {
        self.domain = Vec2::new(width, height);
        self
    }

    /// Set the kernel radius.
    ///
    /// When the boundary epsilon currently equals the kernel radius (the default),
    /// it follows the new radius.
    pub fn with_kernel_radius(mut self, h: f32) -> Self {
        if self.bound_epsilon == self.kernel_radius {
            self.bound_epsilon = h;
        }
        self.kernel_radius = h;
        self
    }

    /// Set the rest density.
    pub fn with_rest_density(mut self, rest_density: f32) -> Self {
        self.rest_density = rest_density;
        self
    }

    /// Set the gas constant of the equation of state.
    pub fn with_gas_constant(mut self, gas_constant: f32) -> Self {
        self.gas_constant = gas_constant;
        self
    }

    /// Set the viscosity coefficient.
    pub fn with_viscosity(mut self, viscosity: f32) -> Self {
        self.viscosity = viscosity;
        self
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the particle mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set the timestep.
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Set the wall damping factor and distance.
    pub fn with_boundary(mut self, damping: f32, epsilon: f32) -> Self {
        self.bound_damping = damping;
        self.bound_epsilon = epsilon;
        self
    }

    /// Set the number of particles seeded into the dam.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the jitter RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum seeding jitter.
    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    /// Radius used when drawing a particle.
    #[inline]
    pub fn draw_radius(&self) -> f32 {
        self.kernel_radius * 0.5
    }

    /// Number of grid cells along each axis.
    ///
    /// Cells are exactly one kernel radius wide, so the 3x3 block around a particle
    /// covers its whole support.
    pub fn grid_dims(&self) -> (usize, usize) {
        (
            (self.domain.x / self.kernel_radius).ceil() as usize,
            (self.domain.y / self.kernel_radius).ceil() as usize,
        )
    }

    /// Check every parameter, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("kernel_radius", self.kernel_radius)?;
        positive("domain.x", self.domain.x)?;
        positive("domain.y", self.domain.y)?;
        positive("rest_density", self.rest_density)?;
        positive("mass", self.mass)?;
        positive("dt", self.dt)?;
        non_negative("gas_constant", self.gas_constant)?;
        non_negative("viscosity", self.viscosity)?;
        non_negative("jitter", self.jitter)?;
        positive("bound_epsilon", self.bound_epsilon)?;

        if !self.gravity.is_finite() {
            return Err(ConfigError::invalid(
                "gravity",
                format!("must be finite, got {}", self.gravity),
            ));
        }
        if !(self.bound_damping > -1.0 && self.bound_damping < 0.0) {
            return Err(ConfigError::invalid(
                "bound_damping",
                format!("must lie in (-1, 0), got {}", self.bound_damping),
            ));
        }
        if 2.0 * self.bound_epsilon >= self.domain.min_element() {
            return Err(ConfigError::invalid(
                "bound_epsilon",
                format!(
                    "twice the epsilon ({}) must be smaller than the domain {}",
                    self.bound_epsilon, self.domain
                ),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("loading configuration from {}", path.display());
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be positive and finite, got {}", value),
        ))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be non-negative and finite, got {}", value),
        ))
    }
}

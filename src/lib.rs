//! # sph2d - 2D Smoothed Particle Hydrodynamics
//!
//! A fluid is represented by particles carrying mass, velocity and density. Every
//! step, densities and pressures are estimated from neighbors found through a
//! uniform grid, pressure/viscosity/gravity forces are accumulated with smoothing
//! kernels, and positions are integrated with a fixed timestep.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sph2d::prelude::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let mut solver = Solver::new(SphConfig::default())?;
//!
//!     // In your render loop:
//!     solver.step();
//!     for vertex in solver.particles() {
//!         draw_circle(vertex.position, vertex.radius);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Rendering
//!
//! The crate does not open windows. [`Solver::particles`] yields a
//! [`ParticleVertex`] per particle, and [`Solver::vertices`] collects them into a
//! `Vec` that can be uploaded with `bytemuck::cast_slice`.
//!
//! ## Neighbor search
//!
//! Grid cells are exactly one kernel radius wide, so the 3x3 block of cells around
//! a particle contains every particle inside its kernel support. Changing
//! [`SphConfig::kernel_radius`] resizes the grid with it.

pub mod config;
pub mod error;
pub mod kernels;
pub mod particle;
pub mod solver;
pub mod spatial;
pub mod spawn;
pub mod stats;

pub use config::SphConfig;
pub use error::ConfigError;
pub use glam::Vec2;
pub use kernels::Kernels;
pub use particle::{Particle, ParticleVertex};
pub use solver::{Solver, DENSITY_EPSILON};
pub use spatial::CellGrid;
pub use stats::StepStats;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::SphConfig;
    pub use crate::error::ConfigError;
    pub use crate::particle::{Particle, ParticleVertex};
    pub use crate::solver::Solver;
    pub use crate::stats::StepStats;
    pub use glam::Vec2;
}

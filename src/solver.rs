//! The SPH solver.
//!
//! Each [`Solver::step`] runs four passes in order:
//!
//! 1. rebuild the [`CellGrid`] from current positions
//! 2. density and pressure for every particle
//! 3. pressure, viscosity and gravity forces for every particle
//! 4. explicit Euler integration and wall reflection
//!
//! Passes 2 and 3 read neighbor state written by the previous pass, so each one
//! computes all of its results against an untouched particle array and only then
//! writes them back. The per-particle work inside a pass runs on the rayon pool.

use crate::config::SphConfig;
use crate::error::ConfigError;
use crate::kernels::Kernels;
use crate::particle::{Particle, ParticleVertex};
use crate::spatial::CellGrid;
use crate::spawn;
use crate::stats::StepStats;
use glam::Vec2;
use rayon::prelude::*;

/// Densities below this are treated as zero and never divided by.
pub const DENSITY_EPSILON: f32 = 1e-6;

/// Owns the particle collection and advances it one fixed timestep at a time.
#[derive(Clone, Debug)]
pub struct Solver {
    config: SphConfig,
    kernels: Kernels,
    particles: Vec<Particle>,
    grid: CellGrid,
    steps: u64,
}

impl Solver {
    /// Validate `config` and seed the dam-break scene.
    pub fn new(config: SphConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let particles = spawn::dam_break(&config);
        log::info!("initializing dam break with {} particles", particles.len());
        Ok(Self::assemble(config, particles))
    }

    /// Validate `config` and start from an explicit set of particles.
    ///
    /// Every position must lie in `[0, width) x [0, height)`.
    pub fn from_particles(
        config: SphConfig,
        particles: Vec<Particle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let domain = config.domain;
        let inside = |p: &Particle| {
            p.position.cmpge(Vec2::ZERO).all() && p.position.cmplt(domain).all()
        };
        if let Some(i) = particles.iter().position(|p| !inside(p)) {
            return Err(ConfigError::invalid(
                "particles",
                format!(
                    "particle {} at {} lies outside the domain {}",
                    i, particles[i].position, domain
                ),
            ));
        }
        log::info!("initializing solver with {} particles", particles.len());
        Ok(Self::assemble(config, particles))
    }

    fn assemble(config: SphConfig, particles: Vec<Particle>) -> Self {
        let kernels = Kernels::new(config.kernel_radius);
        let grid = CellGrid::for_config(&config);
        let (nx, ny) = grid.dims();
        log::info!(
            "grid {}x{} cells of {} for a {} domain",
            nx,
            ny,
            config.kernel_radius,
            config.domain
        );
        log::debug!(
            "poly6={:e} spiky_grad={:e} visc_lap={:e}",
            kernels.poly6,
            kernels.spiky_grad,
            kernels.visc_lap
        );
        Self {
            config,
            kernels,
            particles,
            grid,
            steps: 0,
        }
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self) {
        self.rebuild_grid();
        self.compute_density_pressure();
        self.compute_forces();
        self.integrate();
        self.steps += 1;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", self.stats());
        }
    }

    /// Advance the simulation by `steps` timesteps.
    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Re-bucket every particle into the grid.
    pub fn rebuild_grid(&mut self) {
        self.grid.build(&self.particles);
    }

    /// Sum kernel-weighted neighbor mass into each particle's density, then derive
    /// pressure from the equation of state. Requires a fresh grid.
    ///
    /// Pressure is negative wherever density is below the rest density.
    pub fn compute_density_pressure(&mut self) {
        let gas = self.config.gas_constant;
        let rest = self.config.rest_density;
        let densities: Vec<f32> = (0..self.particles.len())
            .into_par_iter()
            .map(|i| self.density_at(i))
            .collect();

        for (p, density) in self.particles.iter_mut().zip(densities) {
            p.density = density;
            p.pressure = gas * (density - rest);
        }
    }

    /// Accumulate the total force on each particle. Requires densities and
    /// pressures from [`compute_density_pressure`](Self::compute_density_pressure)
    /// for every particle.
    pub fn compute_forces(&mut self) {
        let forces: Vec<Vec2> = (0..self.particles.len())
            .into_par_iter()
            .map(|i| self.force_on(i))
            .collect();

        for (p, force) in self.particles.iter_mut().zip(forces) {
            p.force = force;
        }
    }

    /// Forward Euler step followed by wall reflection.
    pub fn integrate(&mut self) {
        let dt = self.config.dt;
        let domain = self.config.domain;
        let eps = self.config.bound_epsilon;
        let damping = self.config.bound_damping;

        self.particles.par_iter_mut().for_each(|p| {
            if p.density >= DENSITY_EPSILON {
                p.velocity += dt * p.force / p.density;
            }
            p.position += dt * p.velocity;
            reflect(p, domain, eps, damping);
        });
    }

    fn density_at(&self, i: usize) -> f32 {
        let pi = &self.particles[i];
        let mass = self.config.mass;
        self.grid
            .neighbors(pi.position)
            .map(|j| {
                let r2 = (self.particles[j].position - pi.position).length_squared();
                mass * self.kernels.poly6(r2)
            })
            .sum()
    }

    fn force_on(&self, i: usize) -> Vec2 {
        let pi = &self.particles[i];
        let mass = self.config.mass;
        let viscosity = self.config.viscosity;

        let mut f_press = Vec2::ZERO;
        let mut f_visc = Vec2::ZERO;
        for j in self.grid.neighbors(pi.position) {
            if j == i {
                continue;
            }
            let pj = &self.particles[j];
            f_press += pressure_term(&self.kernels, mass, pi, pj);
            f_visc += viscosity_term(&self.kernels, mass, viscosity, pi, pj);
        }

        let f_grav = if pi.density < DENSITY_EPSILON {
            Vec2::ZERO
        } else {
            self.config.gravity * mass / pi.density
        };
        f_press + f_visc + f_grav
    }

    /// Draw records for every particle, in particle order.
    pub fn particles(&self) -> impl ExactSizeIterator<Item = ParticleVertex> + '_ {
        let radius = self.config.draw_radius();
        self.particles
            .iter()
            .map(move |p| ParticleVertex::new(p.position, radius))
    }

    /// Collected draw records, ready for [`bytemuck::cast_slice`].
    pub fn vertices(&self) -> Vec<ParticleVertex> {
        self.particles().collect()
    }

    /// Full particle state.
    #[inline]
    pub fn state(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn config(&self) -> &SphConfig {
        &self.config
    }

    #[inline]
    pub fn kernels(&self) -> &Kernels {
        &self.kernels
    }

    /// Grid as of the last rebuild.
    #[inline]
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Number of completed steps.
    #[inline]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Diagnostics for the current state.
    pub fn stats(&self) -> StepStats {
        StepStats::gather(self.steps, &self.particles, self.config.mass)
    }
}

/// Pressure force on `pi` from `pj`.
///
/// Zero outside kernel support and when `pj` has no density to divide by.
pub fn pressure_term(kernels: &Kernels, mass: f32, pi: &Particle, pj: &Particle) -> Vec2 {
    if pj.density < DENSITY_EPSILON {
        return Vec2::ZERO;
    }
    let rij = pj.position - pi.position;
    let r = rij.length();
    kernels.spiky_gradient(rij, r) * mass * (pi.pressure + pj.pressure) / (2.0 * pj.density)
}

/// Viscosity force on `pi` from `pj`.
///
/// Zero outside kernel support and when `pj` has no density to divide by.
pub fn viscosity_term(
    kernels: &Kernels,
    mass: f32,
    viscosity: f32,
    pi: &Particle,
    pj: &Particle,
) -> Vec2 {
    if pj.density < DENSITY_EPSILON {
        return Vec2::ZERO;
    }
    let r = (pj.position - pi.position).length();
    viscosity * mass * (pj.velocity - pi.velocity) / pj.density * kernels.viscosity_laplacian(r)
}

/// Clamp `p` to `[eps, domain - eps]` on each axis, scaling the velocity
/// component by `damping` when it crosses a wall.
fn reflect(p: &mut Particle, domain: Vec2, eps: f32, damping: f32) {
    for axis in 0..2 {
        if p.position[axis] - eps < 0.0 {
            p.velocity[axis] *= damping;
            p.position[axis] = eps;
        }
        if p.position[axis] + eps > domain[axis] {
            p.velocity[axis] *= damping;
            p.position[axis] = domain[axis] - eps;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SphConfig {
        SphConfig::default()
    }

    fn solver_with(particles: Vec<Particle>) -> Solver {
        Solver::from_particles(config(), particles).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Solver::new(config().with_mass(-1.0)).unwrap_err();
        assert_eq!(err.field(), Some("mass"));
    }

    #[test]
    fn test_from_particles_rejects_outside_domain() {
        let outside = vec![Particle::new(Vec2::new(800.0, 10.0))];
        let err = Solver::from_particles(config(), outside).unwrap_err();
        assert_eq!(err.field(), Some("particles"));
    }

    #[test]
    fn test_new_seeds_dam() {
        let solver = Solver::new(config().with_particle_count(64)).unwrap();
        assert_eq!(solver.state().len(), 64);
        assert_eq!(solver.step_count(), 0);
    }

    #[test]
    fn test_density_includes_self() {
        let mut solver = solver_with(vec![Particle::new(Vec2::new(400.0, 300.0))]);
        solver.rebuild_grid();
        solver.compute_density_pressure();

        let k = *solver.kernels();
        let expected = config().mass * k.poly6 * k.h2 * k.h2 * k.h2;
        let p = solver.state()[0];
        assert!((p.density - expected).abs() <= 1e-6 * expected);
        assert!(p.pressure < 0.0);
    }

    #[test]
    fn test_neighbor_raises_density() {
        let mut solver = solver_with(vec![
            Particle::new(Vec2::new(400.0, 300.0)),
            Particle::new(Vec2::new(408.0, 300.0)),
        ]);
        solver.rebuild_grid();
        solver.compute_density_pressure();

        let k = *solver.kernels();
        let alone = config().mass * k.poly6(0.0);
        let state = solver.state();
        assert!(state[0].density > alone);
        assert_eq!(state[0].density, state[1].density);
    }

    #[test]
    fn test_pair_forces_are_opposite() {
        let mut solver = solver_with(vec![
            Particle::new(Vec2::new(400.0, 300.0)),
            Particle::new(Vec2::new(405.0, 303.0)),
        ]);
        solver.rebuild_grid();
        solver.compute_density_pressure();
        solver.compute_forces();

        let g = config().gravity * config().mass;
        let state = solver.state();
        let internal_a = state[0].force - g / state[0].density;
        let internal_b = state[1].force - g / state[1].density;
        assert!((internal_a + internal_b).length() <= 1e-3 * internal_a.length());
    }

    #[test]
    fn test_zero_density_neighbor_contributes_nothing() {
        let k = Kernels::new(16.0);
        let pi = Particle {
            density: 1.0,
            pressure: 5.0,
            ..Particle::new(Vec2::new(10.0, 10.0))
        };
        let pj = Particle {
            velocity: Vec2::new(1.0, 0.0),
            ..Particle::new(Vec2::new(12.0, 10.0))
        };
        assert_eq!(pressure_term(&k, 2.5, &pi, &pj), Vec2::ZERO);
        assert_eq!(viscosity_term(&k, 2.5, 200.0, &pi, &pj), Vec2::ZERO);
    }

    #[test]
    fn test_viscosity_pulls_toward_neighbor_velocity() {
        let k = Kernels::new(16.0);
        let pi = Particle {
            density: 1.0,
            ..Particle::new(Vec2::new(10.0, 10.0))
        };
        let pj = Particle {
            density: 1.0,
            velocity: Vec2::new(2.0, 0.0),
            ..Particle::new(Vec2::new(14.0, 10.0))
        };
        let f = viscosity_term(&k, 1.0, 1.0, &pi, &pj);
        assert!(f.x > 0.0);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_integrate_skips_force_without_density() {
        let mut solver = solver_with(vec![Particle::with_velocity(
            Vec2::new(400.0, 300.0),
            Vec2::new(10.0, 0.0),
        )]);
        solver.particles[0].force = Vec2::new(1.0e6, 1.0e6);
        solver.integrate();

        let p = solver.state()[0];
        assert_eq!(p.velocity, Vec2::new(10.0, 0.0));
        assert!((p.position.x - (400.0 + 10.0 * config().dt)).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_high_edge() {
        let mut p = Particle::with_velocity(Vec2::new(799.0, 300.0), Vec2::new(4.0, 0.0));
        reflect(&mut p, Vec2::new(800.0, 600.0), 16.0, -0.5);
        assert_eq!(p.position.x, 784.0);
        assert_eq!(p.velocity.x, -2.0);
    }

    #[test]
    fn test_reflect_leaves_interior_alone() {
        let mut p = Particle::with_velocity(Vec2::new(100.0, 100.0), Vec2::new(4.0, -3.0));
        reflect(&mut p, Vec2::new(800.0, 600.0), 16.0, -0.5);
        assert_eq!(p.position, Vec2::new(100.0, 100.0));
        assert_eq!(p.velocity, Vec2::new(4.0, -3.0));
    }

    #[test]
    fn test_vertices_use_draw_radius() {
        let solver = solver_with(vec![Particle::new(Vec2::new(40.0, 50.0))]);
        let vertices = solver.vertices();
        assert_eq!(
            vertices,
            vec![ParticleVertex::new(Vec2::new(40.0, 50.0), 8.0)]
        );
    }

    #[test]
    fn test_stats_describe_latest_step() {
        let mut solver = Solver::new(config().with_particle_count(20)).unwrap();
        solver.run(2);
        let stats = solver.stats();
        assert_eq!(stats.step, 2);
        assert_eq!(stats.particle_count, 20);
        assert!(stats.to_string().starts_with("step      2 | n=20"));
    }

    #[test]
    fn test_step_counts() {
        let mut solver = Solver::new(config().with_particle_count(32)).unwrap();
        solver.run(3);
        assert_eq!(solver.step_count(), 3);
    }
}

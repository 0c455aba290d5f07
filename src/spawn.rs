//! Initial particle placement.
//!
//! The default scene is a dam break: a block of fluid standing against nothing in
//! the left half of the domain, which collapses under gravity once stepping starts.

use crate::config::SphConfig;
use crate::particle::Particle;
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::iter;

/// Seed `config.particle_count` particles into the dam region.
///
/// Particles are laid out on a lattice with spacing `h`, row by row from the top
/// wall, over `x` in `[width / 4, width / 2]` and `y` in
/// `[epsilon, height - 2 * epsilon)`. Each `x` gets a jitter in `[0, jitter)` from an
/// RNG seeded with `config.seed`, so the same configuration always yields the same
/// particles. If the region is too small, fewer particles are returned.
pub fn dam_break(config: &SphConfig) -> Vec<Particle> {
    let count = config.particle_count.min(dam_capacity(config));
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut particles = Vec::with_capacity(count);
    for site in lattice(config).take(count) {
        let jitter = rng.gen::<f32>() * config.jitter;
        particles.push(Particle::new(site + Vec2::new(jitter, 0.0)));
    }

    if particles.len() < config.particle_count {
        log::warn!(
            "dam region only holds {} of the {} requested particles",
            particles.len(),
            config.particle_count
        );
    }
    particles
}

/// Number of lattice sites in the dam region, the most [`dam_break`] can seed.
pub fn dam_capacity(config: &SphConfig) -> usize {
    lattice(config).count()
}

/// Unjittered lattice sites of the dam region, in seeding order.
fn lattice(config: &SphConfig) -> impl Iterator<Item = Vec2> {
    let h = config.kernel_radius;
    let eps = config.bound_epsilon;
    let (width, height) = (config.domain.x, config.domain.y);
    iter::successors(Some(eps), move |y| Some(y + h))
        .take_while(move |&y| y < height - 2.0 * eps)
        .flat_map(move |y| {
            iter::successors(Some(width / 4.0), move |x| Some(x + h))
                .take_while(move |&x| x <= width / 2.0)
                .map(move |x| Vec2::new(x, y))
        })
}

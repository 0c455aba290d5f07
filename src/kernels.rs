//! 2D smoothing kernels (poly6, spiky gradient, viscosity Laplacian).
//!
//! The normalization constants depend only on the kernel radius, so they are
//! computed once when a solver is built and reused for every pair evaluation.

use glam::Vec2;
use std::f32::consts::PI;

/// Kernel radius and its precomputed normalization constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernels {
    /// Support radius `h`.
    pub h: f32,
    /// `h * h`, compared against squared distances.
    pub h2: f32,
    /// `4 / (pi * h^8)`.
    pub poly6: f32,
    /// `-10 / (pi * h^5)`.
    pub spiky_grad: f32,
    /// `40 / (pi * h^5)`.
    pub visc_lap: f32,
}

impl Kernels {
    pub fn new(h: f32) -> Self {
        let h2 = h * h;
        let h5 = h2 * h2 * h;
        let h8 = h5 * h2 * h;
        Self {
            h,
            h2,
            poly6: 4.0 / (PI * h8),
            spiky_grad: -10.0 / (PI * h5),
            visc_lap: 40.0 / (PI * h5),
        }
    }

    /// Poly6 weight for a squared distance. Zero at and beyond `h`.
    #[inline]
    pub fn poly6(&self, r2: f32) -> f32 {
        if r2 < self.h2 {
            let d = self.h2 - r2;
            self.poly6 * d * d * d
        } else {
            0.0
        }
    }

    /// Spiky pressure gradient along `rij = x_j - x_i`, before the mass and pressure
    /// weights are applied.
    ///
    /// Swapping `i` and `j` negates the result. Coincident particles get no push.
    #[inline]
    pub fn spiky_gradient(&self, rij: Vec2, r: f32) -> Vec2 {
        if r < self.h {
            let d = self.h - r;
            -rij.normalize_or_zero() * self.spiky_grad * d * d * d
        } else {
            Vec2::ZERO
        }
    }

    /// Viscosity Laplacian weight at distance `r`. Zero at and beyond `h`.
    #[inline]
    pub fn viscosity_laplacian(&self, r: f32) -> f32 {
        if r < self.h {
            self.visc_lap * (self.h - r)
        } else {
            0.0
        }
    }
}

//! Uniform grid for neighbor search.
//!
//! The domain is split into square cells exactly one kernel radius wide. Every
//! particle within kernel support of another therefore lies in the 3x3 block of
//! cells around it, so a query only has to look at nine cells.
//!
//! The grid is rebuilt from scratch every step with a counting sort: particle
//! indices are bucketed by cell id into one flat array, and `cell_start[id]..
//! cell_start[id + 1]` is the slice belonging to cell `id`. Inside a cell the
//! indices stay in ascending order.

use crate::config::SphConfig;
use crate::particle::Particle;
use glam::Vec2;

/// Offsets of the 3x3 block of cells around a particle's own cell (dx outer, dy inner).
const NEIGHBOR_OFFSETS: [(isize, isize); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Uniform cell grid over `[0, width] x [0, height]`.
#[derive(Clone, Debug)]
pub struct CellGrid {
    cell_size: f32,
    nx: usize,
    ny: usize,
    /// Prefix offsets into `entries`, one per cell plus a trailing total.
    cell_start: Vec<u32>,
    /// Particle indices sorted by cell.
    entries: Vec<u32>,
    /// Cell id of each particle from the last build.
    particle_cells: Vec<u32>,
}

impl CellGrid {
    /// Create an empty grid of `ceil(width / cell_size) x ceil(height / cell_size)` cells.
    pub fn new(cell_size: f32, domain: Vec2) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        let nx = ((domain.x / cell_size).ceil() as usize).max(1);
        let ny = ((domain.y / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            nx,
            ny,
            cell_start: vec![0; nx * ny + 1],
            entries: Vec::new(),
            particle_cells: Vec::new(),
        }
    }

    /// Grid sized so that cells are one kernel radius wide.
    pub fn for_config(config: &SphConfig) -> Self {
        Self::new(config.kernel_radius, config.domain)
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of cells along x and y.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Number of particles indexed by the last build.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row-major cell id.
    #[inline]
    pub fn cell_id(&self, ix: usize, iy: usize) -> usize {
        self.nx * iy + ix
    }

    /// Cell coordinates containing `position`.
    ///
    /// Positions are expected inside the domain; the boundary pass keeps them
    /// there. A position outside the grid is a logic error and trips a debug
    /// assertion. Release builds clamp it to the nearest edge cell.
    pub fn cell_coords(&self, position: Vec2) -> (usize, usize) {
        let cell = (position / self.cell_size).floor();
        debug_assert!(
            cell.x >= 0.0
                && cell.y >= 0.0
                && (cell.x as usize) < self.nx
                && (cell.y as usize) < self.ny,
            "position {} lies outside the {}x{} grid",
            position,
            self.nx,
            self.ny
        );
        let ix = (cell.x.max(0.0) as usize).min(self.nx - 1);
        let iy = (cell.y.max(0.0) as usize).min(self.ny - 1);
        (ix, iy)
    }

    /// Rebuild the grid from the current particle positions.
    pub fn build(&mut self, particles: &[Particle]) {
        let n = particles.len();
        assert!(n <= u32::MAX as usize, "too many particles for a u32 index");

        self.cell_start.clear();
        self.cell_start.resize(self.cell_count() + 1, 0);
        self.particle_cells.clear();

        for p in particles {
            let (ix, iy) = self.cell_coords(p.position);
            let id = self.cell_id(ix, iy);
            self.particle_cells.push(id as u32);
            self.cell_start[id + 1] += 1;
        }

        for id in 0..self.cell_count() {
            self.cell_start[id + 1] += self.cell_start[id];
        }

        // Scatter in index order so each cell's slice stays sorted.
        let mut cursor = self.cell_start.clone();
        self.entries.clear();
        self.entries.resize(n, 0);
        for (i, &id) in self.particle_cells.iter().enumerate() {
            let slot = &mut cursor[id as usize];
            self.entries[*slot as usize] = i as u32;
            *slot += 1;
        }
    }

    /// Particle indices in cell `id`.
    #[inline]
    pub fn cell(&self, id: usize) -> &[u32] {
        let start = self.cell_start[id] as usize;
        let end = self.cell_start[id + 1] as usize;
        &self.entries[start..end]
    }

    /// Particle indices in the 3x3 block of cells around `position`, including
    /// the cell that contains it. Cells past the grid edge are skipped.
    ///
    /// Callers must not rely on the order.
    pub fn neighbors(&self, position: Vec2) -> impl Iterator<Item = usize> + '_ {
        let (ix, iy) = self.cell_coords(position);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| {
                let jx = ix.checked_add_signed(dx)?;
                let jy = iy.checked_add_signed(dy)?;
                (jx < self.nx && jy < self.ny).then(|| self.cell(self.cell_id(jx, jy)))
            })
            .flatten()
            .map(|&i| i as usize)
    }

    /// Collected form of [`neighbors`](Self::neighbors).
    pub fn query(&self, position: Vec2) -> Vec<usize> {
        self.neighbors(position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles_at(positions: &[(f32, f32)]) -> Vec<Particle> {
        positions
            .iter()
            .map(|&(x, y)| Particle::new(Vec2::new(x, y)))
            .collect()
    }

    #[test]
    fn test_dims_cover_domain() {
        let grid = CellGrid::new(16.0, Vec2::new(800.0, 600.0));
        assert_eq!(grid.dims(), (50, 38));
        assert_eq!(grid.cell_count(), 1900);
    }

    #[test]
    fn test_cell_id_is_row_major() {
        let grid = CellGrid::new(10.0, Vec2::new(50.0, 30.0));
        assert_eq!(grid.cell_id(0, 0), 0);
        assert_eq!(grid.cell_id(4, 0), 4);
        assert_eq!(grid.cell_id(0, 1), 5);
        assert_eq!(grid.cell_id(3, 2), 13);
    }

    #[test]
    fn test_build_buckets_by_cell() {
        let mut grid = CellGrid::new(10.0, Vec2::new(50.0, 30.0));
        let particles = particles_at(&[(1.0, 1.0), (15.0, 1.0), (2.0, 9.0), (45.0, 25.0)]);
        grid.build(&particles);

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.cell(0), &[0, 2]);
        assert_eq!(grid.cell(1), &[1]);
        assert_eq!(grid.cell(grid.cell_id(4, 2)), &[3]);
        assert!(grid.cell(2).is_empty());
    }

    #[test]
    fn test_rebuild_clears_previous_contents() {
        let mut grid = CellGrid::new(10.0, Vec2::new(50.0, 30.0));
        grid.build(&particles_at(&[(1.0, 1.0), (2.0, 2.0)]));
        grid.build(&particles_at(&[(25.0, 25.0)]));
        assert_eq!(grid.len(), 1);
        assert!(grid.cell(0).is_empty());
        assert_eq!(grid.cell(grid.cell_id(2, 2)), &[0]);
    }

    #[test]
    fn test_query_covers_three_by_three_block() {
        let mut grid = CellGrid::new(10.0, Vec2::new(50.0, 50.0));
        // centre cell (2, 2), one particle in each surrounding cell, plus two far away
        let mut positions = Vec::new();
        for dy in 0..3 {
            for dx in 0..3 {
                positions.push((15.0 + dx as f32 * 10.0, 15.0 + dy as f32 * 10.0));
            }
        }
        positions.push((1.0, 45.0));
        positions.push((45.0, 1.0));
        grid.build(&particles_at(&positions));

        let mut found = grid.query(Vec2::new(25.0, 25.0));
        found.sort_unstable();
        assert_eq!(found, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_query_skips_cells_outside_grid() {
        let mut grid = CellGrid::new(10.0, Vec2::new(30.0, 30.0));
        grid.build(&particles_at(&[(1.0, 1.0), (11.0, 11.0), (25.0, 25.0)]));

        let mut found = grid.query(Vec2::new(0.5, 0.5));
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_query_has_no_duplicates() {
        let mut grid = CellGrid::new(10.0, Vec2::new(30.0, 30.0));
        let particles = particles_at(&[(5.0, 5.0), (6.0, 5.0), (15.0, 15.0), (25.0, 5.0)]);
        grid.build(&particles);

        let mut found = grid.query(Vec2::new(15.0, 15.0));
        let before = found.len();
        found.sort_unstable();
        found.dedup();
        assert_eq!(found.len(), before);
        assert_eq!(before, 4);
    }

    #[test]
    #[should_panic(expected = "outside")]
    #[cfg(debug_assertions)]
    fn test_negative_position_is_a_logic_error() {
        let grid = CellGrid::new(10.0, Vec2::new(30.0, 30.0));
        grid.cell_coords(Vec2::new(-1.0, 5.0));
    }
}

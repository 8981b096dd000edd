use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

pub const DEFAULT_HOLE_COUNT: usize = 9;

/// Index of a hole in the grid, counted row by row from zero.
pub type HoleId = usize;

/// Fixed-size row-major grid of holes. Purely positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleGrid {
    holes: usize,
}

impl HoleGrid {
    pub fn new(holes: usize) -> Result<Self> {
        if holes == 0 {
            return Err(Error::EmptyGrid);
        }
        Ok(Self { holes })
    }

    pub fn len(&self) -> usize {
        self.holes
    }

    pub fn is_empty(&self) -> bool {
        self.holes == 0
    }

    pub fn contains(&self, hole: HoleId) -> bool {
        hole < self.holes
    }
}

impl Default for HoleGrid {
    fn default() -> Self {
        Self {
            holes: DEFAULT_HOLE_COUNT,
        }
    }
}

/// Chooses where the next mole appears.
pub trait HoleSelector {
    /// Return an index in `0..hole_count`. `hole_count` is never zero.
    fn select(&mut self, hole_count: usize) -> HoleId;
}

/// Uniform selection; immediate repeats are allowed.
#[derive(Debug)]
pub struct RandomHoleSelector {
    rng: StdRng,
}

impl RandomHoleSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomHoleSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl HoleSelector for RandomHoleSelector {
    fn select(&mut self, hole_count: usize) -> HoleId {
        self.rng.gen_range(0..hole_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_is_rejected() {
        assert_eq!(HoleGrid::new(0), Err(Error::EmptyGrid));
        assert_eq!(HoleGrid::default().len(), 9);
    }

    #[test]
    fn contains_checks_bounds() {
        let grid = HoleGrid::new(4).unwrap();
        assert!(grid.contains(0));
        assert!(grid.contains(3));
        assert!(!grid.contains(4));
    }

    #[test]
    fn random_selection_stays_in_range_and_covers_grid() {
        let mut selector = RandomHoleSelector::seeded(7);
        let mut seen = [false; 9];
        for _ in 0..1000 {
            let hole = selector.select(9);
            assert!(hole < 9);
            seen[hole] = true;
        }
        assert!(seen.iter().all(|s| *s), "every hole should come up");
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let mut a = RandomHoleSelector::seeded(42);
        let mut b = RandomHoleSelector::seeded(42);
        let xs: Vec<_> = (0..20).map(|_| a.select(9)).collect();
        let ys: Vec<_> = (0..20).map(|_| b.select(9)).collect();
        assert_eq!(xs, ys);
    }
}

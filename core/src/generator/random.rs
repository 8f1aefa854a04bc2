use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::*;

/// Uniformly random placement over the cells outside the opening block, reproducible from its seed.
#[derive(Clone, Debug)]
pub struct RandomMineGenerator {
    seed: u64,
    rng: SmallRng,
}

impl RandomMineGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generator with a fresh seed from the thread-local RNG.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for RandomMineGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl MineGenerator for RandomMineGenerator {
    fn place_mines(&mut self, grid: &mut Grid, exclude: &[Coord2]) -> Result<()> {
        log::debug!("placing mines with seed {}", self.seed);
        engine::seed_mines(grid, exclude, &mut self.rng)
    }
}

use super::*;

/// Places mines at predetermined coordinates, for replays and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedMineGenerator {
    mines: Vec<Coord2>,
}

impl FixedMineGenerator {
    pub fn new(mines: impl Into<Vec<Coord2>>) -> Self {
        Self {
            mines: mines.into(),
        }
    }

    pub fn mines(&self) -> &[Coord2] {
        &self.mines
    }
}

impl MineGenerator for FixedMineGenerator {
    fn place_mines(&mut self, grid: &mut Grid, exclude: &[Coord2]) -> Result<()> {
        engine::place_mines(grid, &self.mines, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_given_layout() {
        let mut grid = Grid::new((3, 3), 1).unwrap();

        FixedMineGenerator::new([(2, 2)])
            .place_mines(&mut grid, &[(0, 0)])
            .unwrap();

        assert_eq!(grid[(2, 2)].content, Content::Mine);
        assert_eq!(grid[(1, 1)].content, Content::Number(1));
    }

    #[test]
    fn rejects_mine_in_opening() {
        let mut grid = Grid::new((3, 3), 1).unwrap();
        let exclude = engine::opening_block(&grid, (2, 2));

        let result = FixedMineGenerator::new([(1, 1)]).place_mines(&mut grid, &exclude);

        assert_eq!(result, Err(GameError::InvalidLayout));
        assert!(!grid.is_seeded());
    }
}

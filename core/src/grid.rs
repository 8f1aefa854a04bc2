use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Neighbor list that never spills to the heap.
pub type Neighbors = SmallVec<[Coord2; 8]>;

/// Authoritative board storage: cell contents and their visibility.
///
/// Indexing with out-of-bounds coordinates panics, callers validate player input with
/// [`Grid::validate_coords`] first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Cell>,
    mine_count: CellCount,
    seeded: bool,
}

impl Grid {
    /// Creates an unseeded grid, every cell `Empty` and `Hidden`.
    pub fn new(size: Coord2, mine_count: CellCount) -> Result<Self> {
        let total = mult(size.0, size.1);
        if total == 0 || mine_count >= total {
            return Err(GameError::InvalidConfiguration {
                size,
                mines: mine_count,
            });
        }
        Ok(Self {
            cells: Array2::default(size.to_nd_index()),
            mine_count,
            seeded: false,
        })
    }

    pub fn size(&self) -> Coord2 {
        let (width, height) = self.cells.dim();
        // construction goes through `Coord` sized dimensions
        (width as Coord, height as Coord)
    }

    pub fn width(&self) -> Coord {
        self.size().0
    }

    pub fn height(&self) -> Coord {
        self.size().1
    }

    pub fn total_cells(&self) -> CellCount {
        let (width, height) = self.size();
        mult(width, height)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    /// Whether mines have been placed and numbers computed.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub(crate) fn mark_seeded(&mut self) {
        self.seeded = true;
    }

    pub fn contains(&self, (x, y): Coord2) -> bool {
        let (width, height) = self.size();
        x < width && y < height
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds { coords })
        }
    }

    /// All in-bounds 8-connected neighbors: 3 for corners, 5 for edges, 8 otherwise.
    pub fn neighbors(&self, coords: Coord2) -> Neighbors {
        self.iter_neighbors(coords).collect()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.check_bounds(coords);
        NeighborIter::new(coords, self.size())
    }

    pub fn get(&self, coords: Coord2) -> Cell {
        self[coords]
    }

    pub fn set(&mut self, coords: Coord2, cell: Cell) {
        self[coords] = cell;
    }

    pub fn set_visibility(&mut self, coords: Coord2, visibility: Visibility) {
        self[coords].visibility = visibility;
    }

    /// Every cell with its coordinates, `x` major.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((x, y), &cell)| ((x as Coord, y as Coord), cell))
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (width, height) = self.size();
        (0..width).flat_map(move |x| (0..height).map(move |y| (x, y)))
    }

    pub fn count_neighbors(&self, coords: Coord2, pred: impl Fn(Cell) -> bool) -> u8 {
        // at most 8 neighbors
        self.iter_neighbors(coords)
            .filter(|&pos| pred(self[pos]))
            .count() as u8
    }

    pub fn count_cells(&self, pred: impl Fn(Cell) -> bool) -> usize {
        self.cells.iter().filter(|&&cell| pred(cell)).count()
    }

    fn check_bounds(&self, coords: Coord2) {
        assert!(
            self.contains(coords),
            "coordinates {coords:?} out of bounds for {:?} grid",
            self.size()
        );
    }
}

impl Index<Coord2> for Grid {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        self.check_bounds(coords);
        &self.cells[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Grid {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        self.check_bounds(coords);
        &mut self.cells[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_hidden_and_unseeded() {
        let grid = Grid::new((4, 3), 2).unwrap();

        assert_eq!(grid.size(), (4, 3));
        assert_eq!(grid.total_cells(), 12);
        assert_eq!(grid.safe_cell_count(), 10);
        assert!(!grid.is_seeded());
        assert!(grid.iter().all(|(_, cell)| cell == Cell::default()));
        assert_eq!(grid.coords().count(), 12);
    }

    #[test]
    fn new_rejects_empty_and_full_boards() {
        assert!(matches!(
            Grid::new((0, 5), 0),
            Err(GameError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Grid::new((2, 2), 4),
            Err(GameError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn neighbors_respect_bounds() {
        let grid = Grid::new((3, 3), 0).unwrap();

        assert_eq!(grid.neighbors((0, 0)).len(), 3);
        assert_eq!(grid.neighbors((1, 0)).len(), 5);
        assert_eq!(grid.neighbors((1, 1)).len(), 8);
        assert!(!grid.neighbors((1, 1)).contains(&(1, 1)));
    }

    #[test]
    fn set_then_get() {
        let mut grid = Grid::new((2, 2), 1).unwrap();
        let cell = Cell::new(Content::Number(1), Visibility::Flagged);

        grid.set((1, 0), cell);

        assert_eq!(grid.get((1, 0)), cell);
        assert_eq!(grid.get((0, 1)), Cell::default());
    }

    #[test]
    fn validate_coords_reports_out_of_bounds() {
        let grid = Grid::new((2, 3), 1).unwrap();

        assert_eq!(grid.validate_coords((1, 2)), Ok((1, 2)));
        assert_eq!(
            grid.validate_coords((2, 0)),
            Err(GameError::OutOfBounds { coords: (2, 0) })
        );
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_out_of_bounds_panics() {
        let grid = Grid::new((2, 2), 1).unwrap();
        grid.get((2, 2));
    }
}

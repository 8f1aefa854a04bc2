/// Board axis: widths, heights and positions, so a board is at most 255 cells a side.
pub type Coord = u8;

/// Cell and mine counts, wide enough for the largest `255 x 255` board.
pub type CellCount = u16;

/// Board position, `x` grows rightwards and `y` downwards.
pub type Coord2 = (Coord, Coord);

/// Converts a board position into the `[x, y]` index of the grid's backing array.
pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        let (x, y) = self;
        [usize::from(x), usize::from(y)]
    }
}

/// Number of cells on a `width x height` board.
pub const fn mult(width: Coord, height: Coord) -> CellCount {
    (width as CellCount).saturating_mul(height as CellCount)
}

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let next_x = coords.0.checked_add_signed(delta.0)?;
    let next_y = coords.1.checked_add_signed(delta.1)?;
    (next_x < bounds.0 && next_y < bounds.1).then_some((next_x, next_y))
}

/// Iterates the 8-connected neighbors of `center` that fall inside `bounds`, in a fixed order: the row above from
/// left to right, then left and right, then the row below from left to right.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: usize,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&delta) = DISPLACEMENTS.get(self.index) {
            self.index += 1;
            if let Some(pos) = apply_delta(self.center, delta, self.bounds) {
                return Some(pos);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(DISPLACEMENTS.len() - self.index))
    }
}

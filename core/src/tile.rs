use serde::{Deserialize, Serialize};

/// What a cell holds. Assigned once when the mines are seeded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Content {
    #[default]
    Empty,
    Mine,
    /// Count of adjacent mines, always in `1..=8`.
    Number(u8),
}

impl Content {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    /// Adjacent mine count for safe cells, `None` for mines.
    pub const fn adjacent_mines(self) -> Option<u8> {
        match self {
            Self::Empty => Some(0),
            Self::Number(count) => Some(count),
            Self::Mine => None,
        }
    }

    pub(crate) const fn from_count(count: u8) -> Self {
        if count == 0 {
            Self::Empty
        } else {
            Self::Number(count)
        }
    }
}

/// Player-facing state of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Hidden,
    Flagged,
    Questioned,
    Revealed,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub content: Content,
    pub visibility: Visibility,
}

impl Cell {
    pub const fn new(content: Content, visibility: Visibility) -> Self {
        Self {
            content,
            visibility,
        }
    }

    pub const fn is_revealed(&self) -> bool {
        matches!(self.visibility, Visibility::Revealed)
    }

    /// What a player is allowed to see of this cell, content stays hidden until revealed.
    pub const fn view(&self) -> CellView {
        match (self.visibility, self.content) {
            (Visibility::Hidden, _) => CellView::Hidden,
            (Visibility::Flagged, _) => CellView::Flagged,
            (Visibility::Questioned, _) => CellView::Questioned,
            (Visibility::Revealed, Content::Empty) => CellView::Empty,
            (Visibility::Revealed, Content::Number(count)) => CellView::Number(count),
            (Visibility::Revealed, Content::Mine) => CellView::Mine,
        }
    }
}

/// View model for rendering adapters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    Questioned,
    Empty,
    Number(u8),
    Mine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_hides_content_until_revealed() {
        let mine = Cell::new(Content::Mine, Visibility::Hidden);
        assert_eq!(mine.view(), CellView::Hidden);

        let flagged = Cell::new(Content::Number(3), Visibility::Flagged);
        assert_eq!(flagged.view(), CellView::Flagged);

        let revealed = Cell::new(Content::Number(3), Visibility::Revealed);
        assert_eq!(revealed.view(), CellView::Number(3));
    }

    #[test]
    fn content_from_count() {
        assert_eq!(Content::from_count(0), Content::Empty);
        assert_eq!(Content::from_count(4), Content::Number(4));
        assert_eq!(Content::Mine.adjacent_mines(), None);
    }
}

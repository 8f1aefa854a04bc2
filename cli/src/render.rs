use std::io::{self, Write};

use sweeper_core::*;

fn cell_char(view: CellView) -> char {
    match view {
        CellView::Hidden => '#',
        CellView::Flagged => 'F',
        CellView::Questioned => '?',
        CellView::Empty => '.',
        CellView::Number(n) => char::from(b'0' + n),
        CellView::Mine => '*',
    }
}

/// Draws the board with column and row labels, the mine that ended the game shown as `X`.
pub fn write_board<G: MineGenerator>(
    out: &mut impl Write,
    session: &GameSession<G>,
) -> io::Result<()> {
    let grid = session.grid();

    write!(out, "    ")?;
    for x in 0..grid.width() {
        write!(out, "{}", x % 10)?;
    }
    writeln!(out)?;

    for y in 0..grid.height() {
        write!(out, "{y:>3} ")?;
        for x in 0..grid.width() {
            let c = if session.triggered_mine() == Some((x, y)) {
                'X'
            } else {
                cell_char(grid[(x, y)].view())
            };
            write!(out, "{c}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_status<G: MineGenerator>(
    out: &mut impl Write,
    session: &GameSession<G>,
) -> io::Result<()> {
    let elapsed_ms = u64::try_from(session.elapsed_now().as_millis()).unwrap_or(u64::MAX);
    writeln!(
        out,
        "mines left: {}  time: {}",
        session.mines_left(),
        format_elapsed(elapsed_ms)
    )
}

pub fn write_scores<S: Storage>(
    out: &mut impl Write,
    store: &LeaderboardStore<S>,
) -> io::Result<()> {
    let mut empty = true;
    for key in store.keys() {
        empty = false;
        writeln!(out, "{}x{} with {} mines", key.width, key.height, key.mines)?;
        for (rank, entry) in store.entries_for(key).iter().enumerate() {
            writeln!(
                out,
                "{:>4}. {:<20} {}",
                rank + 1,
                entry.username,
                format_elapsed(entry.elapsed_ms)
            )?;
        }
    }
    if empty {
        writeln!(out, "No scores yet")?;
    }
    Ok(())
}

use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use connect4_minimax::board::{Board, Cell, Player};

/// Draws the board to stdout with 1-based column numbers above it
pub fn display(board: &Board) -> Result<()> {
    let mut stdout = stdout();

    let cols: String = (1..=board.column_count())
        .map(|column| format!("{:>3}", column))
        .collect();
    stdout.queue(PrintStyledContent(style(cols + "\n")))?;

    // cell 0 is the top of each column
    for cell in 0..board.cells_per_column() {
        for column in 0..board.column_count() {
            let content = board.cell(column, cell).unwrap_or(Cell::Empty);
            stdout.queue(PrintStyledContent(style(" ").on(Color::DarkBlue)))?;
            stdout.queue(PrintStyledContent(
                style(" O")
                    .attribute(Attribute::Bold)
                    .on(Color::DarkBlue)
                    .with(match content {
                        Cell::Taken(Player::One) => Color::Red,
                        Cell::Taken(Player::Two) => Color::Yellow,
                        Cell::Winning => Color::Green,
                        Cell::Empty => Color::DarkBlue,
                    }),
            ))?;
        }
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;
    Ok(())
}

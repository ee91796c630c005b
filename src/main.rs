use anyhow::{anyhow, Result};

use std::io::{stdin, stdout, Stdin, Write};
use std::time::Duration;

use connect4_minimax::{board::*, filter::Concentration, worker::AiPlayer, *};

mod display;
use display::*;

// how long to wait for a worker before giving up on it
const AI_TIMEOUT: Duration = Duration::from_secs(600);
// slow down play if both players are AI
const AI_VS_AI_DELAY: Duration = Duration::from_secs(3);

fn ask_yes_no(stdin: &Stdin, question: &str) -> Result<bool> {
    loop {
        let mut buffer = String::new();
        print!("{} y/n: ", question);
        stdout().flush()?;
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some(_letter @ 'y') => return Ok(true),
            Some(_letter @ 'n') => return Ok(false),
            _ => println!("Unknown answer given"),
        }
    }
}

fn ask_size(stdin: &Stdin, question: &str, default: usize, minimum: usize) -> Result<usize> {
    loop {
        let mut buffer = String::new();
        print!("{} (default {}): ", question, default);
        stdout().flush()?;
        stdin.read_line(&mut buffer)?;

        let answer = buffer.trim();
        if answer.is_empty() {
            return Ok(default);
        }
        match answer.parse::<usize>() {
            Ok(size) if size >= minimum => return Ok(size),
            _ => println!("Please enter a number of at least {}", minimum),
        }
    }
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Warn)?;

    let stdin = stdin();

    println!("Welcome to Connect 4\n");

    let columns = ask_size(&stdin, "Number of columns", DEFAULT_COLUMNS, WINNING_LENGTH)?;
    let cells = ask_size(&stdin, "Cells per column", DEFAULT_CELLS_PER_COLUMN, WINNING_LENGTH)?;
    let mut board = Board::new(columns, cells);

    let ai_players = (
        ask_yes_no(&stdin, "Is player 1 AI controlled?")?,
        ask_yes_no(&stdin, "Is player 2 AI controlled?")?,
    );
    let delay = if ai_players == (true, true) {
        AI_VS_AI_DELAY
    } else {
        MIN_MOVE_DELAY
    };

    let spawn = |controlled: bool, player: Player| -> Result<Option<AiPlayer>> {
        Ok(if controlled {
            Some(AiPlayer::spawn(player, Concentration, delay)?)
        } else {
            None
        })
    };
    let mut ai = [spawn(ai_players.0, Player::One)?, spawn(ai_players.1, Player::Two)?];
    let slot = |player: Player| (player.id() - 1) as usize;

    // game loop
    loop {
        display(&board)?;

        if board.settle_draw() {
            println!("Draw!");
            break;
        }
        let player = match board.current_player() {
            Some(player) => player,
            None => {
                match board.winner() {
                    Some(winner) => println!("Player {} wins!", winner),
                    None => println!("Draw!"),
                }
                break;
            }
        };

        // let an AI opponent think about its reply while a human moves
        if ai[slot(player)].is_none() {
            if let Some(opponent) = &mut ai[slot(player.other())] {
                opponent.plan(&board);
            }
        }

        let next_move = match &mut ai[slot(player)] {
            // AI player
            Some(ai_player) => {
                println!("AI is thinking...");
                stdout().flush()?;

                ai_player.take_turn(&board);
                let column = ai_player
                    .wait(&board, AI_TIMEOUT)
                    .ok_or_else(|| anyhow!("player {} did not find a move", player))?;
                println!("Best move: {}", column + 1);
                column
            }

            // human player
            None => {
                print!("Move input > ");
                stdout().flush()?;
                let mut input_str = String::new();
                stdin.read_line(&mut input_str)?;

                match input_str.trim().parse::<usize>() {
                    Ok(column) if column >= 1 => column - 1,
                    _ => {
                        println!("Invalid number: {}", input_str.trim());
                        continue;
                    }
                }
            }
        };

        if !board.play_at_column(next_move) {
            println!("Invalid move, column {} is full or out of range", next_move + 1);
            // try the move again
            continue;
        }
    }

    for ai_player in ai.iter_mut().flatten() {
        ai_player.terminate();
    }
    Ok(())
}

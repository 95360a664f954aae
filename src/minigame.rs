//! The widget boundary. A mini-game is a black box to the platform: it runs,
//! and it either reports a single completion score or asks to be closed.
//! Everything else (physics rules, timers, rendering) is the game's own
//! concern and never crosses this boundary.

use std::io::{BufRead, Write};

use crate::error::Result;

/// The one message a mini-game can send back to the platform.
#[derive(Clone, Debug, PartialEq)]
pub enum GameSignal {
    /// The game finished with a score in 0-100.
    Completed(u32),
    /// The player closed the game; any in-progress score is discarded.
    Close,
}

pub trait MiniGame {
    /// Run the game to completion or cancellation.
    fn run(&mut self) -> Result<GameSignal>;
}

/// Stand-in widget for games without a real implementation yet: the player
/// enters a score by hand. Invalid input re-prompts rather than aborting.
pub struct PlaceholderGame<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PlaceholderGame<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> MiniGame for PlaceholderGame<R, W> {
    fn run(&mut self) -> Result<GameSignal> {
        loop {
            write!(self.output, "Enter a score (0-100), or 'q' to close: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // EOF counts as closing the game.
                return Ok(GameSignal::Close);
            }
            let entry = line.trim();
            if entry.eq_ignore_ascii_case("q") {
                return Ok(GameSignal::Close);
            }
            match entry.parse::<u32>() {
                Ok(score) if score <= 100 => return Ok(GameSignal::Completed(score)),
                _ => writeln!(self.output, "Please enter a whole number from 0 to 100.")?,
            }
        }
    }
}

//! Line-oriented play session over a single engine.
//!
//! One command per line, one response per command. Input mistakes are
//! answered with an `error:` line; integrity failures end the session.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use log::{info, warn};

use crate::board::{Color, Square};
use crate::engine::{MoveStatus, RulesEngine};
use crate::movegen::Move;
use crate::opponent::{MoveSource, RandomMover};

const HELP: &str = "\
commands:
  new                      start a new game
  load <placement> <w|b>   set up a position, e.g. load 7k/6Q1/5K2/8/8/8/8/8 b
  show                     print the board
  move <from> <to>         play a move (e2 e3, e2e3 or ((1, 4), (2, 4)))
  legal <square>           list legal destinations of a piece
  status                   side to move, check and result
  go                       let the computer play for the side to move
  help                     this text
  quit                     leave
";

/// Settings for a console session, filled from the command line.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Color played by the computer. `None` means both sides are entered by hand.
    pub computer: Option<Color>,
    /// Seed for the computer's move choice.
    pub seed: Option<u64>,
}

pub struct Session {
    engine: RulesEngine,
    config: SessionConfig,
    opponent: Box<dyn MoveSource>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let opponent = match config.seed {
            Some(seed) => RandomMover::with_seed(seed),
            None => RandomMover::new(),
        };
        Session {
            engine: RulesEngine::new(),
            config,
            opponent: Box::new(opponent),
        }
    }

    pub fn engine(&self) -> &RulesEngine {
        &self.engine
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        info!(
            "session started, computer plays {}",
            self.config
                .computer
                .map_or("nobody".to_string(), |c| c.to_string())
        );
        write!(stdout, "{}", self.engine)?;
        writeln!(stdout)?;
        write!(stdout, "{}", self.computer_turn()?)?;
        stdout.flush()?;

        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }
            let response = self.handle_command(command)?;
            write!(stdout, "{}", response)?;
            stdout.flush()?;
            line.clear();
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "new" => self.handle_new(),
            "load" => self.handle_load(&parts[1..]),
            "show" => Ok(format!("{}\n", self.engine)),
            "move" => self.handle_move(&parts[1..]),
            "legal" => self.handle_legal(&parts[1..]),
            "status" => self.handle_status(),
            "go" => self.handle_go(),
            "help" => Ok(HELP.to_string()),
            "quit" => Ok(String::new()),
            other => Ok(input_error(format!("unknown command {other:?}, try help"))),
        }
    }

    fn handle_new(&mut self) -> Result<String> {
        self.engine = RulesEngine::new();
        let mut out = format!("{}\n", self.engine);
        out.push_str(&self.computer_turn()?);
        Ok(out)
    }

    fn handle_load(&mut self, parts: &[&str]) -> Result<String> {
        let [placement, color] = parts else {
            return Ok(input_error("usage: load <placement> <w|b>"));
        };
        let turn = match color.parse::<Color>() {
            Ok(turn) => turn,
            Err(e) => return Ok(input_error(e)),
        };
        match RulesEngine::from_placement(placement, turn) {
            Ok(engine) => {
                self.engine = engine;
                let mut out = format!("{}\n", self.engine);
                out.push_str(&self.computer_turn()?);
                Ok(out)
            }
            Err(e) => Ok(input_error(e)),
        }
    }

    fn handle_move(&mut self, parts: &[&str]) -> Result<String> {
        let parsed = match parts {
            [] => return Ok(input_error("usage: move <from> <to>")),
            [from, to] => match (from.parse::<Square>(), to.parse::<Square>()) {
                (Ok(from), Ok(to)) => Ok(Move::new(from, to)),
                _ => parts.join(" ").parse::<Move>(),
            },
            _ => parts.join(" ").parse::<Move>(),
        };
        let mv = match parsed {
            Ok(mv) => mv,
            Err(e) => return Ok(input_error(e)),
        };

        if let Some(winner) = self.engine.winner()? {
            return Ok(format!("game over, {winner} won\n"));
        }
        let mover = self.engine.turn_color();
        let mut out = self.play(mv)?;
        if self.engine.turn_color() == mover {
            return Ok(out);
        }
        out.push_str(&self.computer_turn()?);
        Ok(out)
    }

    fn handle_legal(&mut self, parts: &[&str]) -> Result<String> {
        let [square] = parts else {
            return Ok(input_error("usage: legal <square>"));
        };
        let square = match square.parse::<Square>() {
            Ok(square) => square,
            Err(e) => return Ok(input_error(e)),
        };
        let moves = self.engine.legal_moves(square)?;
        let list: Vec<String> = moves.iter().map(|sq| sq.to_string()).collect();
        Ok(format!("{}: {}\n", square, list.join(" ")))
    }

    fn handle_status(&mut self) -> Result<String> {
        let turn = self.engine.turn_color();
        let mut out = format!("{turn} to move\n");
        out.push_str(&self.describe_position()?);
        Ok(out)
    }

    fn handle_go(&mut self) -> Result<String> {
        if let Some(winner) = self.engine.winner()? {
            return Ok(format!("game over, {winner} won\n"));
        }
        match self.opponent.choose_move(&mut self.engine)? {
            Some(mv) => self.play(mv),
            None => Ok(format!("{} has no legal move\n", self.engine.turn_color())),
        }
    }

    /// Commits `mv` and reports the result.
    fn play(&mut self, mv: Move) -> Result<String> {
        let mover = self.engine.turn_color();
        let outcome = self.engine.make_move(mv.from, mv.to)?;
        match outcome.status {
            MoveStatus::Applied => {
                let mut out = format!("{} played {}", mover, mv.to_compact());
                if let Some(captured) = outcome.captured {
                    out.push_str(&format!(", capturing {captured}"));
                }
                out.push('\n');
                out.push_str(&self.describe_position()?);
                Ok(out)
            }
            MoveStatus::Rejected(reason) => {
                Ok(format!("illegal move {}: {}\n", mv.to_compact(), reason))
            }
        }
    }

    /// Plays one move for the computer if it is on move and the game is undecided.
    fn computer_turn(&mut self) -> Result<String> {
        if self.config.computer != Some(self.engine.turn_color()) {
            return Ok(String::new());
        }
        if self.engine.winner()?.is_some() {
            return Ok(String::new());
        }
        match self.opponent.choose_move(&mut self.engine)? {
            Some(mv) => {
                info!("{} plays {}", self.opponent.name(), mv);
                self.play(mv)
            }
            None => Ok(format!("{} has no legal move\n", self.engine.turn_color())),
        }
    }

    fn describe_position(&mut self) -> Result<String> {
        let mut out = String::new();
        if let Some(winner) = self.engine.winner()? {
            out.push_str(&format!("checkmate, {winner} wins\n"));
            return Ok(out);
        }
        let turn = self.engine.turn_color();
        if self.engine.is_in_check(turn)? {
            out.push_str(&format!("{turn} is in check\n"));
        }
        Ok(out)
    }
}

fn input_error(message: impl ToString) -> String {
    let message = message.to_string();
    warn!("{}", message);
    format!("error: {}\n", message)
}

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::RulesEngine;
use crate::error::IntegrityError;
use crate::movegen::Move;

/// Anything that can propose a move for the side to move: a human at the
/// console, a peer over the network, or a computer player.
pub trait MoveSource {
    fn name(&self) -> &str;

    /// Proposes a move, or `None` when the side to move has no legal move.
    /// The engine is borrowed mutably only because legality probing simulates
    /// moves; it is left as it was found.
    fn choose_move(&mut self, engine: &mut RulesEngine) -> Result<Option<Move>, IntegrityError>;
}

/// Plays a uniformly random legal move.
pub struct RandomMover {
    rng: StdRng,
}

impl RandomMover {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same game.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomMover {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveSource for RandomMover {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(&mut self, engine: &mut RulesEngine) -> Result<Option<Move>, IntegrityError> {
        let moves = engine.all_legal_moves()?;
        debug!("random mover choosing among {} moves", moves.len());
        Ok(moves.choose(&mut self.rng).copied())
    }
}

use crate::book_move::{BookMove, CastlingEncoding};
use crate::errors::Result;
use crate::fingerprint::Fingerprint;
use crate::game_record::{GameOutcome, GameRecord};
use crate::malformed_record;
use shakmaty::{Chess, Color, Position};

/// Weight credited to the mover for every position of a drawn game
pub const DRAW_WEIGHT: u64 = 1;
/// Weight credited to the winner's moves in a decisive game
pub const VICTORY_WEIGHT: u64 = 2;
/// Default number of plies indexed from the start of each game
pub const DEFAULT_MAX_PLY: usize = 6;

/// A move played from a position, with the weight it earned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub fingerprint: Fingerprint,
    pub book_move: BookMove,
    pub weight: u64,
}

/// Weight of a move made by `mover` in a game that ended with `outcome`
pub fn outcome_weight(outcome: Option<GameOutcome>, mover: Color) -> u64 {
    match outcome {
        Some(GameOutcome::Draw) => DRAW_WEIGHT,
        Some(decisive) if decisive.winner() == Some(mover) => VICTORY_WEIGHT,
        _ => 0,
    }
}

/// Replays the opening of a game and reports weighted observations
#[derive(Debug, Clone, Copy)]
pub struct MoveWalker {
    max_ply: usize,
    castling: CastlingEncoding,
}

impl Default for MoveWalker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLY)
    }
}

impl MoveWalker {
    pub fn new(max_ply: usize) -> Self {
        Self {
            max_ply,
            castling: CastlingEncoding::default(),
        }
    }

    pub fn with_castling(mut self, castling: CastlingEncoding) -> Self {
        self.castling = castling;
        self
    }

    pub fn max_ply(&self) -> usize {
        self.max_ply
    }

    /// Replay up to `max_ply` plies of `record`, calling `emit` for every
    /// observation with a nonzero weight.
    ///
    /// Stops at the first move the board model rejects. Observations already
    /// emitted for that game are not retracted; use [`MoveWalker::walk`] to
    /// get all-or-nothing behaviour.
    pub fn walk_with<F>(&self, record: &GameRecord, mut emit: F) -> Result<usize>
    where
        F: FnMut(Observation),
    {
        let mut pos = Chess::default();
        let mut plies = 0;

        for (ply, san) in record.moves.iter().take(self.max_ply).enumerate() {
            let fingerprint = Fingerprint::of(&pos);
            let m = san
                .to_move(&pos)
                .map_err(|e| malformed_record!(ply, "{} ({})", san, e))?;

            let weight = outcome_weight(record.outcome, pos.turn());
            if weight > 0 {
                let book_move = BookMove::from_move(&m, self.castling)
                    .ok_or_else(|| malformed_record!(ply, "{} has no origin square", san))?;
                emit(Observation {
                    fingerprint,
                    book_move,
                    weight,
                });
            }

            pos.play_unchecked(&m);
            plies += 1;
        }

        Ok(plies)
    }

    /// Replay `record` and collect its observations, or fail without any
    pub fn walk(&self, record: &GameRecord) -> Result<Vec<Observation>> {
        let mut observations = Vec::with_capacity(self.max_ply.min(record.len()));
        self.walk_with(record, |observation| observations.push(observation))?;
        Ok(observations)
    }
}

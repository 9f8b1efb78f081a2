use crate::errors::Result;
use crate::malformed_record;
use serde::{Deserialize, Serialize};
use shakmaty::san::{San, SanPlus};
use shakmaty::Color;

/// Final result of a recorded game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameOutcome {
    /// Parse a PGN `Result` tag. Unfinished or unknown results (`*`) yield `None`.
    pub fn from_result_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "1-0" => Some(GameOutcome::WhiteWins),
            "0-1" => Some(GameOutcome::BlackWins),
            "1/2-1/2" => Some(GameOutcome::Draw),
            _ => None,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameOutcome::WhiteWins => Some(Color::White),
            GameOutcome::BlackWins => Some(Color::Black),
            GameOutcome::Draw => None,
        }
    }
}

/// One game: its mainline moves from the standard start and its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub moves: Vec<San>,
    pub outcome: Option<GameOutcome>,
}

impl GameRecord {
    pub fn new(moves: Vec<San>, outcome: Option<GameOutcome>) -> Self {
        Self { moves, outcome }
    }

    /// Build a record from movetext such as `"1. e4 e5 2. Nf3 Nc6"`.
    ///
    /// Move numbers and a trailing result token are ignored.
    pub fn from_movetext(movetext: &str, outcome: Option<GameOutcome>) -> Result<Self> {
        let mut moves = Vec::new();
        for token in movetext.split_whitespace() {
            if token == "*" || GameOutcome::from_result_tag(token).is_some() {
                continue;
            }
            let token = token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
            if token.is_empty() {
                continue;
            }
            let san_plus: SanPlus = token
                .parse()
                .map_err(|_| malformed_record!(moves.len(), "invalid SAN token '{}'", token))?;
            moves.push(san_plus.san);
        }
        Ok(Self::new(moves, outcome))
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

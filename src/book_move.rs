use serde::{Deserialize, Serialize};
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, Move, Position, Role, Square};
use std::fmt;

const SQUARE_MASK: u16 = 0x3f;
const PROMOTION_MASK: u16 = 0x7;

/// How castling moves are written into the destination field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CastlingEncoding {
    /// King to its destination square (e1g1)
    #[default]
    KingToTarget,
    /// King onto its own rook (e1h1), as Polyglot files traditionally store it
    KingToRook,
}

impl CastlingEncoding {
    fn mode(self) -> CastlingMode {
        match self {
            CastlingEncoding::KingToTarget => CastlingMode::Standard,
            CastlingEncoding::KingToRook => CastlingMode::Chess960,
        }
    }
}

/// 16-bit packed move: destination in bits 0-5, origin in bits 6-11,
/// promotion code in bits 12-14.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BookMove(u16);

impl BookMove {
    pub fn new(from: Square, to: Square, promotion: Option<Role>) -> Self {
        let promotion_code = promotion.map_or(0, |role| role as u16 - 1);
        BookMove((to as u16) | ((from as u16) << 6) | (promotion_code << 12))
    }

    pub const fn from_raw(raw: u16) -> Self {
        BookMove(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Encode a board move. Drops (`Move::Put`) have no origin and yield `None`.
    pub fn from_move(m: &Move, castling: CastlingEncoding) -> Option<Self> {
        match m.to_uci(castling.mode()) {
            Uci::Normal {
                from,
                to,
                promotion,
            } => Some(Self::new(from, to, promotion)),
            _ => None,
        }
    }

    pub fn from(self) -> Square {
        Square::new(u32::from((self.0 >> 6) & SQUARE_MASK))
    }

    pub fn to(self) -> Square {
        Square::new(u32::from(self.0 & SQUARE_MASK))
    }

    pub fn promotion(self) -> Option<Role> {
        match (self.0 >> 12) & PROMOTION_MASK {
            1 => Some(Role::Knight),
            2 => Some(Role::Bishop),
            3 => Some(Role::Rook),
            4 => Some(Role::Queen),
            5 => Some(Role::King),
            _ => None,
        }
    }

    /// Resolve to a legal move in `pos`, accepting either castling form
    pub fn to_move(self, pos: &Chess) -> Option<Move> {
        pos.legal_moves().into_iter().find(|m| {
            Self::from_move(m, CastlingEncoding::KingToTarget) == Some(self)
                || Self::from_move(m, CastlingEncoding::KingToRook) == Some(self)
        })
    }
}

impl fmt::Display for BookMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(role) = self.promotion() {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

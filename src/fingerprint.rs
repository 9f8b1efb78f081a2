use serde::{Deserialize, Serialize};
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, EnPassantMode};
use std::fmt;

/// 64-bit position key, compatible with Polyglot book readers.
///
/// Covers piece placement, side to move, castling rights and the en passant
/// file. The en passant file only contributes when a pawn of the side to
/// move stands next to the double-pushed pawn, even if that pawn is pinned.
/// Positions that differ only in an en passant target no pawn can reach
/// share a key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Fingerprint of a board state
    pub fn of(pos: &Chess) -> Self {
        let hash: Zobrist64 = pos.zobrist_hash(EnPassantMode::PseudoLegal);
        Fingerprint(hash.0)
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Fingerprint(u64::from_be_bytes(bytes))
    }
}

impl From<Fingerprint> for u64 {
    fn from(fingerprint: Fingerprint) -> u64 {
        fingerprint.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

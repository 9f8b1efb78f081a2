use crate::book_move::BookMove;
use crate::fingerprint::Fingerprint;
use crate::walker::Observation;
use std::collections::HashMap;

/// Accumulated weight per move played from one position
pub type MoveWeights = HashMap<BookMove, u64>;

/// Mapping fingerprint -> (move -> summed weight).
///
/// Entries are only ever created or grown. Merging is pointwise addition,
/// so the result does not depend on the order shards are folded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateMap {
    positions: HashMap<Fingerprint, MoveWeights>,
}

impl AggregateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the (fingerprint, move) pair, creating it at zero first
    pub fn add(&mut self, fingerprint: Fingerprint, book_move: BookMove, weight: u64) {
        *self
            .positions
            .entry(fingerprint)
            .or_default()
            .entry(book_move)
            .or_insert(0) += weight;
    }

    pub fn record(&mut self, observation: &Observation) {
        self.add(
            observation.fingerprint,
            observation.book_move,
            observation.weight,
        );
    }

    pub fn extend<'a, I>(&mut self, observations: I)
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        for observation in observations {
            self.record(observation);
        }
    }

    /// Fold `other` into `self`, summing weights of identical pairs
    pub fn merge(&mut self, mut other: AggregateMap) {
        // Iterate over the smaller map
        if other.positions.len() > self.positions.len() {
            std::mem::swap(&mut self.positions, &mut other.positions);
        }

        for (fingerprint, moves) in other.positions {
            match self.positions.get_mut(&fingerprint) {
                Some(existing) => {
                    for (book_move, weight) in moves {
                        *existing.entry(book_move).or_insert(0) += weight;
                    }
                }
                None => {
                    self.positions.insert(fingerprint, moves);
                }
            }
        }
    }

    /// Combine any number of shard maps into one
    pub fn merge_all<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = AggregateMap>,
    {
        maps.into_iter().fold(Self::new(), |mut acc, map| {
            acc.merge(map);
            acc
        })
    }

    pub fn get(&self, fingerprint: Fingerprint) -> Option<&MoveWeights> {
        self.positions.get(&fingerprint)
    }

    pub fn weight(&self, fingerprint: Fingerprint, book_move: BookMove) -> u64 {
        self.get(fingerprint)
            .and_then(|moves| moves.get(&book_move))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct positions
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of (fingerprint, move) pairs, i.e. book entries once encoded
    pub fn entry_count(&self) -> usize {
        self.positions.values().map(|moves| moves.len()).sum()
    }

    pub fn total_weight(&self) -> u64 {
        self.positions
            .values()
            .flat_map(|moves| moves.values())
            .sum()
    }

    /// Positions in ascending fingerprint order
    pub fn sorted_positions(&self) -> Vec<(Fingerprint, &MoveWeights)> {
        let mut positions: Vec<_> = self
            .positions
            .iter()
            .map(|(fingerprint, moves)| (*fingerprint, moves))
            .collect();
        positions.sort_unstable_by_key(|(fingerprint, _)| *fingerprint);
        positions
    }
}

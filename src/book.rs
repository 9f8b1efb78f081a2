use crate::encoder::{BookEntry, ENTRY_SIZE};
use crate::errors::{BookError, Result};
use crate::fingerprint::Fingerprint;
use memmap2::Mmap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use shakmaty::{Chess, Move};
use std::fs::File;
use std::path::Path;

enum BookData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl BookData {
    fn bytes(&self) -> &[u8] {
        match self {
            BookData::Mapped(mmap) => mmap,
            BookData::Owned(bytes) => bytes,
        }
    }
}

/// Read-only view over a Polyglot book file
pub struct OpeningBook {
    data: BookData,
}

impl OpeningBook {
    /// Memory-map a book file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // Mapping a zero-length file fails on some platforms
        if file.metadata()?.len() == 0 {
            return Self::from_bytes(Vec::new());
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_data(BookData::Mapped(mmap))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_data(BookData::Owned(bytes))
    }

    fn from_data(data: BookData) -> Result<Self> {
        let len = data.bytes().len();
        if len % ENTRY_SIZE != 0 {
            return Err(BookError::MalformedBook(format!(
                "length {} is not a multiple of {}",
                len, ENTRY_SIZE
            )));
        }
        Ok(Self { data })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.data.bytes().len() / ENTRY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, index: usize) -> Option<BookEntry> {
        let start = index.checked_mul(ENTRY_SIZE)?;
        let chunk = self.data.bytes().get(start..start + ENTRY_SIZE)?;
        let bytes: &[u8; ENTRY_SIZE] = chunk.try_into().ok()?;
        Some(BookEntry::from_bytes(bytes))
    }

    fn key_at(&self, index: usize) -> Option<Fingerprint> {
        let start = index * ENTRY_SIZE;
        let chunk = self.data.bytes().get(start..start + 8)?;
        let bytes: [u8; 8] = chunk.try_into().ok()?;
        Some(Fingerprint::from_be_bytes(bytes))
    }

    pub fn iter(&self) -> impl Iterator<Item = BookEntry> + '_ {
        (0..self.len()).filter_map(move |i| self.entry(i))
    }

    /// Whether records are in non-decreasing key order
    pub fn is_sorted(&self) -> bool {
        (1..self.len()).all(|i| self.key_at(i - 1) <= self.key_at(i))
    }

    /// All records stored for a fingerprint, in file order
    pub fn entries_for(&self, key: Fingerprint) -> Vec<BookEntry> {
        // Lower bound
        let (mut low, mut high) = (0, self.len());
        while low < high {
            let mid = low + (high - low) / 2;
            match self.key_at(mid) {
                Some(k) if k < key => low = mid + 1,
                _ => high = mid,
            }
        }

        (low..self.len())
            .map_while(|i| self.entry(i).filter(|entry| entry.key == key))
            .collect()
    }

    /// Look up position in opening book
    pub fn lookup(&self, pos: &Chess) -> Vec<BookEntry> {
        self.entries_for(Fingerprint::of(pos))
    }

    pub fn contains(&self, pos: &Chess) -> bool {
        !self.lookup(pos).is_empty()
    }

    /// Legal book moves for the position with their weights
    pub fn moves(&self, pos: &Chess) -> Vec<(Move, u16)> {
        self.lookup(pos)
            .into_iter()
            .filter_map(|entry| entry.book_move.to_move(pos).map(|m| (m, entry.weight)))
            .collect()
    }

    /// Highest-weight book move
    pub fn best_move(&self, pos: &Chess) -> Option<Move> {
        self.moves(pos)
            .into_iter()
            .filter(|(_, weight)| *weight > 0)
            .max_by_key(|(_, weight)| *weight)
            .map(|(m, _)| m)
    }

    /// Pick a book move at random, proportionally to its weight
    pub fn choose_move<R: Rng + ?Sized>(&self, pos: &Chess, rng: &mut R) -> Option<Move> {
        let candidates: Vec<(Move, u16)> = self
            .moves(pos)
            .into_iter()
            .filter(|(_, weight)| *weight > 0)
            .collect();
        let dist = WeightedIndex::new(candidates.iter().map(|(_, weight)| *weight)).ok()?;
        let index = dist.sample(rng);
        candidates.into_iter().nth(index).map(|(m, _)| m)
    }

    /// Get opening book statistics
    pub fn statistics(&self) -> OpeningBookStats {
        let mut positions = 0;
        let mut max_moves_per_position = 0;
        let mut run = 0;
        let mut previous = None;

        for entry in self.iter() {
            if Some(entry.key) == previous {
                run += 1;
            } else {
                positions += 1;
                run = 1;
                previous = Some(entry.key);
            }
            max_moves_per_position = max_moves_per_position.max(run);
        }

        OpeningBookStats {
            entries: self.len(),
            positions,
            max_moves_per_position,
        }
    }
}

/// Statistics about the opening book coverage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningBookStats {
    pub entries: usize,
    pub positions: usize,
    pub max_moves_per_position: usize,
}

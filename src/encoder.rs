use crate::aggregate::{AggregateMap, MoveWeights};
use crate::book_move::BookMove;
use crate::errors::{BookError, Result};
use crate::fingerprint::Fingerprint;
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Size of one Polyglot record in bytes
pub const ENTRY_SIZE: usize = 16;
/// Largest weight a record can carry
pub const MAX_WEIGHT: u64 = u16::MAX as u64;

/// One 16-byte book record, stored big-endian:
/// key (8) | move (2) | weight (2) | learn (4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub key: Fingerprint,
    pub book_move: BookMove,
    pub weight: u16,
    pub learn: u32,
}

impl BookEntry {
    pub fn new(key: Fingerprint, book_move: BookMove, weight: u16) -> Self {
        Self {
            key,
            book_move,
            weight,
            learn: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0..8].copy_from_slice(&self.key.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.book_move.raw().to_be_bytes());
        bytes[10..12].copy_from_slice(&self.weight.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.learn.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; ENTRY_SIZE]) -> Self {
        let mut key = [0u8; 8];
        key.copy_from_slice(&bytes[0..8]);
        Self {
            key: Fingerprint::from_be_bytes(key),
            book_move: BookMove::from_raw(u16::from_be_bytes([bytes[8], bytes[9]])),
            weight: u16::from_be_bytes([bytes[10], bytes[11]]),
            learn: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }
}

/// Divisor applied to every weight of a position whose weights sum to `total`.
///
/// 1 while the total fits in 16 bits, `total / 65535` beyond that.
pub fn scale_factor(total: u64) -> f64 {
    (total as f64 / MAX_WEIGHT as f64).max(1.0)
}

/// Scale one position's weights into 16 bits.
///
/// Returned in descending scaled weight, ties by ascending move encoding.
/// Weights are truncated, so small moves next to a dominant one may drop
/// to zero or tie.
pub fn scale_weights(fingerprint: Fingerprint, moves: &MoveWeights) -> Result<Vec<(BookMove, u16)>> {
    let total: u64 = moves.values().sum();
    let scale = scale_factor(total);

    let mut scaled = moves
        .iter()
        .map(|(book_move, &weight)| {
            let value = (weight as f64 / scale).floor() as u64;
            u16::try_from(value)
                .map(|w| (*book_move, w))
                .map_err(|_| BookError::EncodingOverflow {
                    fingerprint: fingerprint.0,
                    weight: value,
                })
        })
        .collect::<Result<Vec<_>>>()?;

    scaled.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(scaled)
}

/// Counters for one encoding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub positions: usize,
    pub entries: usize,
    pub bytes_written: u64,
}

/// Serialize the merged map to `writer` in ascending key order
pub fn write_book<W: Write>(map: &AggregateMap, writer: &mut W) -> Result<EncodeStats> {
    let mut stats = EncodeStats::default();

    for (fingerprint, moves) in map.sorted_positions() {
        for (book_move, weight) in scale_weights(fingerprint, moves)? {
            writer.write_all(&BookEntry::new(fingerprint, book_move, weight).to_bytes())?;
            stats.entries += 1;
        }
        stats.positions += 1;
    }

    writer.flush()?;
    stats.bytes_written = (stats.entries * ENTRY_SIZE) as u64;
    Ok(stats)
}

/// Rewrite the book file at `path` in full.
///
/// Goes through a temporary sibling that is renamed over the target, so a
/// failed run never leaves a truncated book behind.
pub fn write_book_file<P: AsRef<Path>>(map: &AggregateMap, path: P) -> Result<EncodeStats> {
    let path = path.as_ref();
    let tmp_path = temporary_path(path);

    let result: Result<EncodeStats> = (|| {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        let stats = write_book(map, &mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(stats)
    })();

    match result {
        Ok(stats) => {
            fs::rename(&tmp_path, path)?;
            info!(
                "Wrote {} entries for {} positions to {}",
                stats.entries,
                stats.positions,
                path.display()
            );
            Ok(stats)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "book".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Square;

    fn weights(pairs: &[(u16, u64)]) -> MoveWeights {
        pairs
            .iter()
            .map(|&(raw, weight)| (BookMove::from_raw(raw), weight))
            .collect()
    }

    #[test]
    fn test_entry_layout() {
        let entry = BookEntry::new(
            Fingerprint(0x463b96181691fc9c),
            BookMove::new(Square::E2, Square::E4, None),
            0x0102,
        );
        let bytes = entry.to_bytes();
        assert_eq!(
            bytes,
            [0x46, 0x3b, 0x96, 0x18, 0x16, 0x91, 0xfc, 0x9c, 0x03, 0x1c, 0x01, 0x02, 0, 0, 0, 0]
        );
        assert_eq!(BookEntry::from_bytes(&bytes), entry);
    }

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(0), 1.0);
        assert_eq!(scale_factor(65535), 1.0);
        assert!(scale_factor(65536) > 1.0);
        assert_eq!(scale_factor(131070), 2.0);
    }

    #[test]
    fn test_small_totals_are_unchanged() {
        let moves = weights(&[(1, 40000), (2, 25535)]);
        let scaled = scale_weights(Fingerprint(1), &moves).unwrap();
        assert_eq!(
            scaled,
            vec![(BookMove::from_raw(1), 40000), (BookMove::from_raw(2), 25535)]
        );
    }

    #[test]
    fn test_large_totals_fit_sixteen_bits() {
        let moves = weights(&[(1, 1_000_000), (2, 500_000), (3, 10), (4, 1)]);
        let scaled = scale_weights(Fingerprint(1), &moves).unwrap();
        let total: u64 = 1_500_011;
        let scale = total as f64 / 65535.0;

        assert_eq!(scaled[0], (BookMove::from_raw(1), (1_000_000f64 / scale).floor() as u16));
        assert_eq!(scaled[1], (BookMove::from_raw(2), (500_000f64 / scale).floor() as u16));
        // Tiny weights collapse to zero next to the dominant moves
        assert_eq!(scaled[2], (BookMove::from_raw(3), 0));
        assert_eq!(scaled[3], (BookMove::from_raw(4), 0));
        assert!(scaled[0].1 > scaled[1].1);
    }

    #[test]
    fn test_single_huge_weight_saturates_exactly() {
        let moves = weights(&[(9, u32::MAX as u64)]);
        let scaled = scale_weights(Fingerprint(1), &moves).unwrap();
        assert_eq!(scaled, vec![(BookMove::from_raw(9), u16::MAX)]);
    }

    #[test]
    fn test_tie_order_by_move() {
        let moves = weights(&[(30, 2), (10, 2), (20, 5)]);
        let order: Vec<u16> = scale_weights(Fingerprint(1), &moves)
            .unwrap()
            .iter()
            .map(|(m, _)| m.raw())
            .collect();
        assert_eq!(order, vec![20, 10, 30]);
    }

    #[test]
    fn test_write_book_sorted_and_sized() {
        let mut map = AggregateMap::new();
        map.add(Fingerprint(u64::MAX), BookMove::from_raw(1), 1);
        map.add(Fingerprint(5), BookMove::from_raw(2), 3);
        map.add(Fingerprint(5), BookMove::from_raw(3), 4);
        map.add(Fingerprint(0x8000_0000_0000_0000), BookMove::from_raw(4), 2);

        let mut buffer = Vec::new();
        let stats = write_book(&map, &mut buffer).unwrap();

        assert_eq!(stats.entries, 4);
        assert_eq!(stats.positions, 3);
        assert_eq!(buffer.len() % ENTRY_SIZE, 0);
        assert_eq!(stats.bytes_written, buffer.len() as u64);

        let keys: Vec<u64> = buffer
            .chunks_exact(ENTRY_SIZE)
            .map(|chunk| u64::from_be_bytes(chunk[0..8].try_into().unwrap()))
            .collect();
        assert_eq!(keys, vec![5, 5, 0x8000_0000_0000_0000, u64::MAX]);
    }

    #[test]
    fn test_write_book_file_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.bin");
        std::fs::write(&path, b"stale contents that are not a book").unwrap();

        let mut map = AggregateMap::new();
        map.add(Fingerprint(1), BookMove::from_raw(1), 1);
        let stats = write_book_file(&map, &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap().len() as u64, stats.bytes_written);
        assert!(!dir.path().join("output.bin.tmp").exists());
    }
}

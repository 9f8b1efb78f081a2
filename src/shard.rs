use crate::aggregate::AggregateMap;
use crate::errors::Result;
use crate::game_record::GameRecord;
use crate::pgn_source::PgnSource;
use crate::walker::MoveWalker;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Counters for one processed source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStats {
    pub path: String,
    pub games_read: usize,
    /// Games dropped because a record was unreadable or a move illegal
    pub games_skipped: usize,
    /// Games without a decisive or drawn result
    pub games_unfinished: usize,
    pub observations: usize,
}

/// Output of one shard: its private aggregate plus counters
#[derive(Debug, Clone)]
pub struct ShardResult {
    pub path: PathBuf,
    pub map: AggregateMap,
    pub stats: ShardStats,
}

/// Aggregates a single game-record source into a local map.
///
/// A malformed game is skipped as a whole and the shard keeps going. A
/// source that cannot be opened or read fails the shard.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShardAggregator {
    walker: MoveWalker,
}

impl ShardAggregator {
    pub fn new(walker: MoveWalker) -> Self {
        Self { walker }
    }

    /// Read and aggregate one PGN file
    pub fn aggregate_path<P: AsRef<Path>>(&self, path: P) -> Result<ShardResult> {
        let path = path.as_ref();
        debug!("Aggregating {}", path.display());

        let source = PgnSource::open(path)?.with_max_plies(self.walker.max_ply());
        let (map, mut stats) = self.aggregate_records(source)?;
        stats.path = path.display().to_string();

        debug!(
            "Finished {}: {} games, {} skipped, {} positions",
            path.display(),
            stats.games_read,
            stats.games_skipped,
            map.len()
        );

        Ok(ShardResult {
            path: path.to_path_buf(),
            map,
            stats,
        })
    }

    /// Aggregate any stream of records
    pub fn aggregate_records<I>(&self, records: I) -> Result<(AggregateMap, ShardStats)>
    where
        I: IntoIterator<Item = Result<GameRecord>>,
    {
        let mut map = AggregateMap::new();
        let mut stats = ShardStats::default();

        for (index, record) in records.into_iter().enumerate() {
            stats.games_read += 1;

            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping game {}: {}", index + 1, e);
                    stats.games_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if record.outcome.is_none() {
                stats.games_unfinished += 1;
                continue;
            }

            match self.walker.walk(&record) {
                Ok(observations) => {
                    stats.observations += observations.len();
                    map.extend(&observations);
                }
                Err(e) => {
                    warn!("Skipping game {}: {}", index + 1, e);
                    stats.games_skipped += 1;
                }
            }
        }

        Ok((map, stats))
    }
}

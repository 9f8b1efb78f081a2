use crate::aggregate::AggregateMap;
use crate::book_move::CastlingEncoding;
use crate::config_error;
use crate::encoder::{write_book_file, EncodeStats};
use crate::errors::{BookError, Result};
use crate::shard::{ShardAggregator, ShardResult, ShardStats};
use crate::walker::{MoveWalker, DEFAULT_MAX_PLY};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What to do when a shard cannot be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Any failed shard fails the run and nothing is written
    #[default]
    FailFast,
    /// Merge the shards that succeeded and report the rest
    SkipFailedShards,
}

/// Book build configuration
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// Plies indexed from the start of every game
    pub max_ply: usize,
    /// Worker threads for shard aggregation
    pub num_threads: usize,
    pub failure_policy: FailurePolicy,
    pub castling: CastlingEncoding,
    pub show_progress: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_ply: DEFAULT_MAX_PLY,
            num_threads: num_cpus::get(),
            failure_policy: FailurePolicy::default(),
            castling: CastlingEncoding::default(),
            show_progress: false,
        }
    }
}

impl BookConfig {
    pub fn with_max_ply(mut self, max_ply: usize) -> Self {
        self.max_ply = max_ply;
        self
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_castling(mut self, castling: CastlingEncoding) -> Self {
        self.castling = castling;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_ply == 0 {
            return Err(config_error!("max_ply must be at least 1"));
        }
        if self.num_threads == 0 {
            return Err(config_error!("num_threads must be at least 1"));
        }
        Ok(())
    }
}

/// A shard that could not be aggregated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardFailure {
    pub path: String,
    pub error: String,
}

/// Merged statistics of every successful shard
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub map: AggregateMap,
    pub shards: Vec<ShardStats>,
    pub failures: Vec<ShardFailure>,
}

/// Summary of a complete build, suitable for `--report` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub generated_at: String,
    pub output: String,
    pub max_ply: usize,
    pub castling: CastlingEncoding,
    pub shards: Vec<ShardStats>,
    pub failures: Vec<ShardFailure>,
    pub games_read: usize,
    pub games_skipped: usize,
    pub games_unfinished: usize,
    pub positions: usize,
    pub entries: usize,
    pub bytes_written: u64,
    pub elapsed_ms: u64,
}

impl BuildReport {
    fn new(
        output: &Path,
        config: &BookConfig,
        aggregate: AggregateOutcome,
        encoded: EncodeStats,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            output: output.display().to_string(),
            max_ply: config.max_ply,
            castling: config.castling,
            games_read: aggregate.shards.iter().map(|s| s.games_read).sum(),
            games_skipped: aggregate.shards.iter().map(|s| s.games_skipped).sum(),
            games_unfinished: aggregate.shards.iter().map(|s| s.games_unfinished).sum(),
            shards: aggregate.shards,
            failures: aggregate.failures,
            positions: encoded.positions,
            entries: encoded.entries,
            bytes_written: encoded.bytes_written,
            elapsed_ms,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parallel shard aggregation, single-threaded merge, then encoding
pub struct BookBuilder {
    config: BookConfig,
    aggregator: ShardAggregator,
}

impl BookBuilder {
    pub fn new(config: BookConfig) -> Result<Self> {
        config.validate()?;
        let walker = MoveWalker::new(config.max_ply).with_castling(config.castling);
        Ok(Self {
            config,
            aggregator: ShardAggregator::new(walker),
        })
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Aggregate every source on the worker pool and merge the results.
    ///
    /// Workers never share state; merging starts once all of them are done.
    pub fn aggregate<P: AsRef<Path> + Sync>(&self, sources: &[P]) -> Result<AggregateOutcome> {
        info!(
            "Aggregating {} sources with {} threads (depth {})",
            sources.len(),
            self.config.num_threads,
            self.config.max_ply
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()
            .map_err(|e| config_error!("failed to build thread pool: {}", e))?;

        let pb = self.progress_bar(sources.len());
        let results: Vec<(PathBuf, Result<ShardResult>)> = pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    let path = source.as_ref();
                    let result = self.aggregator.aggregate_path(path);
                    pb.inc(1);
                    (path.to_path_buf(), result)
                })
                .collect()
        });
        pb.finish_and_clear();

        let total = results.len();
        let mut maps = Vec::with_capacity(total);
        let mut shards = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (path, result) in results {
            match result {
                Ok(shard) => {
                    shards.push(shard.stats);
                    maps.push(shard.map);
                }
                Err(e) => {
                    warn!("Shard {} failed: {}", path.display(), e);
                    failures.push(ShardFailure {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !failures.is_empty() && self.config.failure_policy == FailurePolicy::FailFast {
            return Err(BookError::ShardsFailed {
                failed: failures.len(),
                total,
                first_error: failures[0].error.clone(),
            });
        }

        let map = AggregateMap::merge_all(maps);
        info!(
            "Merged {} shards into {} positions ({} entries)",
            shards.len(),
            map.len(),
            map.entry_count()
        );

        Ok(AggregateOutcome {
            map,
            shards,
            failures,
        })
    }

    /// Aggregate `sources` and rewrite the book at `output`
    pub fn build<P, Q>(&self, sources: &[P], output: Q) -> Result<BuildReport>
    where
        P: AsRef<Path> + Sync,
        Q: AsRef<Path>,
    {
        let start = Instant::now();
        let output = output.as_ref();

        let aggregate = self.aggregate(sources)?;
        let encoded = write_book_file(&aggregate.map, output)?;

        Ok(BuildReport::new(
            output,
            &self.config,
            aggregate,
            encoded,
            start.elapsed().as_millis() as u64,
        ))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("📚 Aggregating [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("██░"),
        );
        pb
    }
}

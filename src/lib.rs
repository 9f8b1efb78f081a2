//! # Polyglot Book Builder
//!
//! Builds Polyglot opening books from collections of PGN games.
//!
//! Every finished game is replayed from the standard starting position up
//! to a fixed depth. Each ply is credited to the position it was played
//! from, weighted by the game's outcome for the side that moved. Sources
//! are aggregated in parallel into independent shards, merged, scaled into
//! 16-bit weights and written as big-endian 16-byte records sorted by
//! position key.
//!
//! ## Quick Start
//!
//! ```no_run
//! use polyglot_book_builder::{BookBuilder, BookConfig, OpeningBook};
//! use shakmaty::Chess;
//!
//! let builder = BookBuilder::new(BookConfig::default().with_max_ply(8))?;
//! let report = builder.build(&["games/2023.pgn", "games/2024.pgn.zst"], "book.bin")?;
//! println!("{} entries for {} positions", report.entries, report.positions);
//!
//! let book = OpeningBook::open("book.bin")?;
//! if let Some(m) = book.best_move(&Chess::default()) {
//!     println!("Book move: {:?}", m);
//! }
//! # Ok::<(), polyglot_book_builder::BookError>(())
//! ```

// Core modules
pub mod errors;
pub mod fingerprint;
pub mod book_move;

// Input
pub mod discovery;
pub mod game_record;
pub mod pgn_source;

// Aggregation and output
pub mod aggregate;
pub mod book;
pub mod encoder;
pub mod pipeline;
pub mod shard;
pub mod walker;

pub use aggregate::{AggregateMap, MoveWeights};
pub use book::{OpeningBook, OpeningBookStats};
pub use book_move::{BookMove, CastlingEncoding};
pub use discovery::{discover_sources, resolve_inputs};
pub use encoder::{write_book, write_book_file, BookEntry, EncodeStats, ENTRY_SIZE};
pub use errors::{BookError, Result};
pub use fingerprint::Fingerprint;
pub use game_record::{GameOutcome, GameRecord};
pub use pgn_source::PgnSource;
pub use pipeline::{
    AggregateOutcome, BookBuilder, BookConfig, BuildReport, FailurePolicy, ShardFailure,
};
pub use shard::{ShardAggregator, ShardResult, ShardStats};
pub use walker::{MoveWalker, Observation, DEFAULT_MAX_PLY};

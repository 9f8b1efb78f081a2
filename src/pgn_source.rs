use crate::errors::{BookError, Result};
use crate::game_record::{GameOutcome, GameRecord};
use crate::{malformed_record, source_unavailable};
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};
use shakmaty::san::San;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Whether a path names a zstd-compressed PGN file
pub fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zst"))
}

/// PGN visitor that turns each game into a [`GameRecord`]
struct RecordCollector {
    moves: Vec<San>,
    outcome: Option<GameOutcome>,
    max_plies: usize,
    error: Option<String>,
}

impl RecordCollector {
    fn new(max_plies: usize) -> Self {
        Self {
            moves: Vec::new(),
            outcome: None,
            max_plies,
            error: None,
        }
    }
}

impl Visitor for RecordCollector {
    type Result = std::result::Result<GameRecord, (usize, String)>;

    fn begin_game(&mut self) {
        self.moves.clear();
        self.outcome = None;
        self.error = None;
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        if key == b"Result" {
            self.outcome = std::str::from_utf8(value.as_bytes())
                .ok()
                .and_then(GameOutcome::from_result_tag);
        }
    }

    fn san(&mut self, san_plus: SanPlus) {
        if self.error.is_some() || self.moves.len() >= self.max_plies {
            return;
        }

        // pgn-reader carries its own board crate; go through SAN text
        let san_str = san_plus.san.to_string();
        match san_str.parse::<San>() {
            Ok(san) => self.moves.push(san),
            Err(_) => self.error = Some(format!("unreadable SAN '{}'", san_str)),
        }
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true) // Mainline only
    }

    fn end_game(&mut self) -> Self::Result {
        match self.error.take() {
            Some(reason) => Err((self.moves.len(), reason)),
            None => Ok(GameRecord::new(
                std::mem::take(&mut self.moves),
                self.outcome.take(),
            )),
        }
    }
}

/// Lazy, sequential stream of game records read from PGN text.
///
/// Yields `Err(MalformedRecord)` for a game that could not be read and keeps
/// going; an I/O failure yields `Err(SourceUnavailable)` once and ends the
/// stream.
pub struct PgnSource<R: Read> {
    reader: BufferedReader<R>,
    collector: RecordCollector,
    origin: PathBuf,
    finished: bool,
}

impl PgnSource<Box<dyn Read + Send>> {
    /// Open a `.pgn` file, or a `.pgn.zst` file decompressed on the fly
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| source_unavailable!(path, e))?;

        let input: Box<dyn Read + Send> = if is_compressed(path) {
            let decoder = zstd::stream::Decoder::new(file).map_err(|e| source_unavailable!(path, e))?;
            Box::new(decoder)
        } else {
            Box::new(BufReader::with_capacity(1024 * 1024, file))
        };

        Ok(Self::with_origin(input, path.to_path_buf()))
    }
}

impl<R: Read> PgnSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::with_origin(reader, PathBuf::from("<memory>"))
    }

    fn with_origin(reader: R, origin: PathBuf) -> Self {
        Self {
            reader: BufferedReader::new(reader),
            collector: RecordCollector::new(usize::MAX),
            origin,
            finished: false,
        }
    }

    /// Keep at most `max_plies` mainline moves per game
    pub fn with_max_plies(mut self, max_plies: usize) -> Self {
        self.collector.max_plies = max_plies;
        self
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }
}

impl<R: Read> Iterator for PgnSource<R> {
    type Item = Result<GameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_game(&mut self.collector) {
            Ok(Some(Ok(record))) => Some(Ok(record)),
            Ok(Some(Err((ply, reason)))) => Some(Err(malformed_record!(ply, reason))),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(BookError::SourceUnavailable {
                    path: self.origin.display().to_string(),
                    reason: e.to_string(),
                }))
            }
        }
    }
}

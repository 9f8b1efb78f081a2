use polyglot_book_builder::{
    BookBuilder, BookConfig, BookMove, CastlingEncoding, Fingerprint, OpeningBook, ENTRY_SIZE,
};
use shakmaty::{Chess, Position, Square};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const START: u64 = 0x463b96181691fc9c;
const AFTER_E4_D5: u64 = 0x0756b94461c50fb0;

fn write_pgn(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn game(result: &str, movetext: &str) -> String {
    format!(
        "[Event \"Test\"]\n[White \"A\"]\n[Black \"B\"]\n[Result \"{result}\"]\n\n{movetext} {result}\n\n"
    )
}

fn keys(bytes: &[u8]) -> Vec<u64> {
    bytes
        .chunks_exact(ENTRY_SIZE)
        .map(|chunk| u64::from_be_bytes(chunk[0..8].try_into().unwrap()))
        .collect()
}

fn builder(max_ply: usize) -> BookBuilder {
    BookBuilder::new(BookConfig::default().with_max_ply(max_ply).with_threads(2)).unwrap()
}

#[test]
fn single_white_win_indexes_only_white_plies() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_pgn(dir.path(), "games.pgn", &game("1-0", "1. e4 d5 2. e5 f5 3. Nf3"));
    let output = dir.path().join("book.bin");

    let report = builder(4).build(&[source], &output).unwrap();
    assert_eq!(report.entries, 2);

    let book = OpeningBook::open(&output).unwrap();
    let entries: Vec<_> = book.iter().collect();
    assert_eq!(entries.len(), 2);

    let e4 = entries.iter().find(|e| e.key == Fingerprint(START)).unwrap();
    assert_eq!(e4.book_move, BookMove::new(Square::E2, Square::E4, None));
    assert_eq!(e4.weight, 2);
    assert_eq!(e4.learn, 0);

    let e5 = entries.iter().find(|e| e.key == Fingerprint(AFTER_E4_D5)).unwrap();
    assert_eq!(e5.book_move, BookMove::new(Square::E4, Square::E5, None));
    assert_eq!(e5.weight, 2);
}

#[test]
fn identical_draws_in_two_shards_are_summed() {
    let dir = tempfile::tempdir().unwrap();
    let drawn = game("1/2-1/2", "1. d4 d5 2. c4");
    let a = write_pgn(dir.path(), "a.pgn", &drawn);
    let b = write_pgn(dir.path(), "b.pgn", &drawn);

    let outcome = builder(1).aggregate(&[a, b]).unwrap();
    let d4 = BookMove::new(Square::D2, Square::D4, None);
    assert_eq!(outcome.map.weight(Fingerprint(START), d4), 2);
    assert_eq!(outcome.map.entry_count(), 1);
}

#[test]
fn output_is_sorted_and_independent_of_shard_order() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![
        write_pgn(
            dir.path(),
            "one.pgn",
            &[
                game("1-0", "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6"),
                game("0-1", "1. e4 c5 2. Nf3 d6 3. d4 cxd4"),
            ]
            .concat(),
        ),
        write_pgn(
            dir.path(),
            "two.pgn",
            &[
                game("1/2-1/2", "1. d4 Nf6 2. c4 e6 3. Nc3 Bb4"),
                game("*", "1. c4 e5"),
                game("1-0", "1. e4 e6 2. d4 d5 3. Nc3 Nf6"),
            ]
            .concat(),
        ),
        write_pgn(dir.path(), "three.pgn", &game("0-1", "1. Nf3 d5 2. g3 Nf6 3. Bg2 c6")),
    ];

    let forward = dir.path().join("forward.bin");
    let backward = dir.path().join("backward.bin");
    builder(6).build(&sources, &forward).unwrap();
    let reversed: Vec<_> = sources.iter().rev().cloned().collect();
    builder(6).build(&reversed, &backward).unwrap();

    let forward = fs::read(forward).unwrap();
    let backward = fs::read(backward).unwrap();
    assert_eq!(forward, backward);
    assert_eq!(forward.len() % ENTRY_SIZE, 0);

    let keys = keys(&forward);
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    assert!(OpeningBook::from_bytes(forward).unwrap().is_sorted());
}

#[test]
fn malformed_games_do_not_stop_the_shard() {
    let dir = tempfile::tempdir().unwrap();
    let contents = [
        game("1-0", "1. e4 e5 2. Ke3"),
        game("1/2-1/2", "1. c4 e5"),
    ]
    .concat();
    let source = write_pgn(dir.path(), "mixed.pgn", &contents);

    let outcome = builder(6).aggregate(&[source]).unwrap();
    assert_eq!(outcome.shards[0].games_read, 2);
    assert_eq!(outcome.shards[0].games_skipped, 1);

    let c4 = BookMove::new(Square::C2, Square::C4, None);
    let e4 = BookMove::new(Square::E2, Square::E4, None);
    assert_eq!(outcome.map.weight(Fingerprint(START), c4), 1);
    assert_eq!(outcome.map.weight(Fingerprint(START), e4), 0);
}

#[test]
fn compressed_sources_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("games.pgn.zst");
    let file = fs::File::create(&path).unwrap();
    let mut encoder = zstd::Encoder::new(file, 3).unwrap();
    encoder
        .write_all(game("1-0", "1. e4 e5 2. Nf3").as_bytes())
        .unwrap();
    encoder.finish().unwrap();

    let outcome = builder(2).aggregate(&[path]).unwrap();
    let e4 = BookMove::new(Square::E2, Square::E4, None);
    assert_eq!(outcome.map.weight(Fingerprint(START), e4), 2);
}

#[test]
fn castling_encoding_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_pgn(
        dir.path(),
        "castle.pgn",
        &game("1-0", "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O"),
    );

    let mut pos = Chess::default();
    for (from, to) in [
        (Square::E2, Square::E4),
        (Square::E7, Square::E5),
        (Square::G1, Square::F3),
        (Square::B8, Square::C6),
        (Square::F1, Square::C4),
        (Square::F8, Square::C5),
    ] {
        let m = BookMove::new(from, to, None).to_move(&pos).unwrap();
        pos.play_unchecked(&m);
    }
    let before_castling = Fingerprint::of(&pos);

    let standard = builder(7).aggregate(&[source.clone()]).unwrap();
    assert_eq!(
        standard
            .map
            .weight(before_castling, BookMove::new(Square::E1, Square::G1, None)),
        2
    );

    let config = BookConfig::default()
        .with_max_ply(7)
        .with_castling(CastlingEncoding::KingToRook);
    let polyglot = BookBuilder::new(config).unwrap().aggregate(&[source]).unwrap();
    assert_eq!(
        polyglot
            .map
            .weight(before_castling, BookMove::new(Square::E1, Square::H1, None)),
        2
    );
}

#[test]
fn built_book_answers_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let contents = [
        game("1-0", "1. e4 e5"),
        game("1-0", "1. e4 c5"),
        game("1/2-1/2", "1. d4 d5"),
    ]
    .concat();
    let source = write_pgn(dir.path(), "games.pgn", &contents);
    let output = dir.path().join("book.bin");
    builder(2).build(&[source], &output).unwrap();

    let book = OpeningBook::open(&output).unwrap();
    let start = Chess::default();
    let best = book.best_move(&start).unwrap();
    assert_eq!(best.to(), Square::E4);
    assert_eq!(book.moves(&start).len(), 2);

    let stats = book.statistics();
    // Start position plus the position after 1. d4 (the draw credits Black)
    assert_eq!(stats.positions, 2);
    assert_eq!(stats.max_moves_per_position, 2);
}

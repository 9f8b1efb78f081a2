use clap::Parser;
use polyglot_book_builder::{BookMove, Fingerprint, GameRecord, OpeningBook};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about = "Inspect the entries of a Polyglot opening book", long_about = None)]
struct Args {
    /// Book file to read
    #[arg(short, long, default_value = "output.bin")]
    book: PathBuf,

    /// Position to probe (default: starting position)
    #[arg(long, conflicts_with = "moves")]
    fen: Option<String>,

    /// SAN moves played from the starting position, e.g. "e4 e5 Nf3"
    #[arg(long)]
    moves: Option<String>,

    /// Print book-wide statistics
    #[arg(long)]
    stats: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}

fn position_from(args: &Args) -> Result<Chess, Box<dyn std::error::Error>> {
    if let Some(fen) = &args.fen {
        let fen: Fen = fen.parse()?;
        return fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| format!("illegal position: {}", e).into());
    }

    let mut pos = Chess::default();
    if let Some(moves) = &args.moves {
        let record = GameRecord::from_movetext(moves, None)?;
        for san in &record.moves {
            let m = san
                .to_move(&pos)
                .map_err(|e| format!("{} is not playable: {}", san, e))?;
            pos.play_unchecked(&m);
        }
    }
    Ok(pos)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let book = OpeningBook::open(&args.book)?;

    if args.stats {
        let stats = book.statistics();
        println!("📊 {}", args.book.display());
        println!("  • Entries: {}", stats.entries);
        println!("  • Positions: {}", stats.positions);
        println!("  • Max moves per position: {}", stats.max_moves_per_position);
        println!();
    }

    let pos = position_from(&args)?;
    let key = Fingerprint::of(&pos);
    let entries = book.lookup(&pos);

    println!("🔑 Key {}", key);
    if entries.is_empty() {
        println!("  (not in book)");
        return Ok(());
    }

    let total: u64 = entries.iter().map(|e| e.weight as u64).sum();
    for entry in &entries {
        let share = if total > 0 {
            entry.weight as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        let legal = if entry.book_move.to_move(&pos).is_some() {
            ""
        } else {
            " (illegal here)"
        };
        println!(
            "  {:<6} weight {:>5} ({:>5.1}%){}",
            entry.book_move, entry.weight, share, legal
        );
    }

    if let Some(m) = book.choose_move(&pos, &mut rand::thread_rng()) {
        if let Some(book_move) = BookMove::from_move(&m, Default::default()) {
            println!("🎲 Weighted pick: {}", book_move);
        }
    }

    Ok(())
}

use clap::Parser;
use polyglot_book_builder::{
    resolve_inputs, BookBuilder, BookConfig, CastlingEncoding, FailurePolicy, DEFAULT_MAX_PLY,
};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about = "Build a Polyglot opening book from PGN games", long_about = None)]
struct Args {
    /// PGN files (.pgn or .pgn.zst) or directories containing them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of plies indexed from the start of every game
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_PLY)]
    depth: usize,

    /// Output book file
    #[arg(short, long, default_value = "output.bin")]
    output: PathBuf,

    /// Worker threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Keep going when a source cannot be read instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Encode castling as king-takes-rook (e1h1) like most Polyglot tools
    #[arg(long)]
    polyglot_castling: bool,

    /// Scan input directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Write a JSON build report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let sources = resolve_inputs(&args.inputs, args.recursive)?;

    let mut config = BookConfig::default()
        .with_max_ply(args.depth)
        .with_progress(!args.no_progress);
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }
    if args.keep_going {
        config = config.with_failure_policy(FailurePolicy::SkipFailedShards);
    }
    if args.polyglot_castling {
        config = config.with_castling(CastlingEncoding::KingToRook);
    }

    println!("📚 Polyglot Book Builder");
    println!("========================");
    println!("  • Sources: {}", sources.len());
    println!("  • Depth: {} plies", config.max_ply);
    println!("  • Threads: {}", config.num_threads);
    println!("  • Output: {}", args.output.display());
    println!();

    let builder = BookBuilder::new(config)?;
    let report = builder.build(&sources, &args.output)?;

    println!("✅ Book written to {}", report.output);
    println!("  • Games read: {}", report.games_read);
    println!("  • Games skipped: {}", report.games_skipped);
    println!("  • Games unfinished: {}", report.games_unfinished);
    println!("  • Positions: {}", report.positions);
    println!("  • Entries: {}", report.entries);
    println!("  • Size: {} bytes", report.bytes_written);
    println!("  • Elapsed: {:.2}s", report.elapsed_ms as f64 / 1000.0);
    if !report.failures.is_empty() {
        println!("⚠️  {} sources failed:", report.failures.len());
        for failure in &report.failures {
            println!("  • {}: {}", failure.path, failure.error);
        }
    }

    if let Some(path) = args.report {
        fs::write(&path, report.to_json()?)?;
        println!("📝 Report written to {}", path.display());
    }

    Ok(())
}

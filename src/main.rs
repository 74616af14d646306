use std::{path::PathBuf, time::Instant};

use clap::Parser;
use pawnstorm::{
    config::{ConfigError, EngineConfig},
    engine::Engine,
    perft::{parallel_divide, PerftError},
    position::{FenError, Position},
    search::{CancellationToken, SearchError, SearchLimits},
};
use thiserror::Error;

#[derive(Error, Debug)]
enum PawnstormError {
    #[error("Error during the perft command: {0}")]
    PerftError(#[from] PerftError),

    #[error("Error during the search command: {0}")]
    SearchError(#[from] SearchError),

    #[error("Invalid position: {0}")]
    FenError(#[from] FenError),

    #[error("{0}")]
    ConfigError(#[from] ConfigError),
}

mod arguments {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    /// A chess engine core: move generation, perft and search
    #[derive(Parser)]
    #[command(name = "pawnstorm", version, about)]
    pub struct PawnstormArgs {
        /// Configuration file of the engine
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        #[command(subcommand)]
        pub command: Commands,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Commands {
        /// Count the leaf nodes of the move tree of a position
        Perft {
            /// The depth of the move tree
            #[arg(short, long)]
            depth: u16,

            /// FEN string representing the position
            #[arg(short, long, default_value = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")]
            fen: String,

            /// The number of threads to use
            #[arg(short, long, default_value_t = 1)]
            threads: usize,
        },

        /// Search the best move of a position
        Search {
            /// FEN string representing the position
            #[arg(short, long, default_value = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")]
            fen: String,

            /// The maximum depth of the search
            #[arg(short, long)]
            depth: Option<u8>,

            /// The maximum number of nodes of the search
            #[arg(short, long)]
            nodes: Option<u64>,

            /// The maximum duration of the search, in milliseconds
            #[arg(short, long)]
            movetime: Option<u64>,
        },
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, ConfigError> {
    match path {
        Some(path) => EngineConfig::load(&path),
        None => Ok(EngineConfig::default()),
    }
}

fn run() -> Result<(), PawnstormError> {
    let args = arguments::PawnstormArgs::parse();

    pawnstorm::initialize();
    let config = load_config(args.config)?;

    match args.command {
        arguments::Commands::Perft { depth, fen, threads } => {
            let position = Position::new(&fen).map_err(|e| PerftError::InvalidFen(fen.clone(), e))?;
            let start = Instant::now();

            let divided = parallel_divide(&position, depth, threads);
            for (mv, nodes) in &divided {
                println!("{mv}\t{nodes}");
            }

            let nodes: u64 = divided.iter().map(|(_, nodes)| nodes).sum();
            let elapsed = start.elapsed();
            println!();
            println!("Nodes: {nodes}");
            println!("Time: {:.3}s", elapsed.as_secs_f64());
            println!("Nodes/s: {:.0}", nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON));
        }
        arguments::Commands::Search { fen, depth, nodes, movetime } => {
            let mut position = Position::new(&fen)?;
            let mut engine = Engine::new(&config);
            let token = CancellationToken::new();
            if let Some(movetime) = movetime {
                token.cancel_after(std::time::Duration::from_millis(movetime));
            }

            let limits = SearchLimits { depth: depth.unwrap_or(SearchLimits::default().depth), nodes };
            let result = engine.search(&mut position, limits, &token)?;

            let pv: Vec<String> = result.pv.iter().map(|mv| mv.to_string()).collect();
            println!("info depth {} score {} nodes {} pv {}", result.depth, result.score, result.nodes, pv.join(" "));
            match result.best_move {
                Some(mv) => println!("bestmove {mv}"),
                None => println!("bestmove 0000"),
            }
        }
    }

    Ok(())
}

/// Main entry point of the pawnstorm command-line tool.
fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

use colored::*;
use pawnstorm::{
    move_gen::move_list::MoveList,
    perft::{divide, parallel_divide, perft},
    position::Position,
    r#move::Move,
    zobrist::Zobrist,
};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::PathBuf, time::Instant};
use thiserror::Error;

const EXIT_FAILURE: i32 = 1;
const DIVIDE_THREADS: usize = 4;

//======================================================================================================================
// Error handling
//======================================================================================================================

/// Errors that are related to the test harness.
#[derive(Error, Debug)]
enum TestHarnessError {
    #[error("The manifest directory cannot be found")]
    ManifestDirNotFound,

    #[error("Resource path not found: {0:?}")]
    ResourcePathNotFound(PathBuf),

    #[error("Cannot read the test data file ({0:?})")]
    CannotReadTestDataFile(PathBuf),

    #[error("Cannot parse the test data file: {0}")]
    CannotParseTestDataFile(#[from] serde_json::Error),
}

/// Errors used when tests fail.
#[derive(Error, Debug)]
enum TestFailureError {
    #[error("Unable to parse the fen string : \"{0}\"")]
    UnableToParseFen(String),

    #[error("Unexpected node count at depth {depth}. Expected: {expected}, actual: {actual}")]
    UnexpectedNodeCount { depth: u16, expected: u64, actual: u64 },

    #[error("The position changed after a perft of depth {depth}\n\nExpected:\n{expected}\n\nActual:\n{actual}\n")]
    PositionNotRestored { depth: u16, expected: String, actual: String },

    #[error("Unexpected hashes after making {mv}. Incremental: {incremental:?}, computed: {computed:?}")]
    InconsistentHashes { mv: Move, incremental: (Zobrist, Zobrist), computed: (Zobrist, Zobrist) },

    #[error("The parallel divide does not match the sequential divide at depth {0}")]
    ParallelDivideMismatch(u16),
}

#[derive(Error, Debug)]
enum PerftSuiteError {
    #[error("Test harness error: {0}")]
    TestHarnessError(#[from] TestHarnessError),

    #[error("Test {test_name} failed: {test_failure_error}")]
    TestFailed { test_name: String, test_failure_error: TestFailureError },
}

//======================================================================================================================
// Test data
//======================================================================================================================

/// A perft test case: the expected node counts of a position, indexed by depth minus one.
#[derive(Debug, Deserialize)]
struct PerftTest {
    description: String,
    fen: String,
    nodes: Vec<u64>,
}

fn read_tests_data() -> Result<Vec<PerftTest>, PerftSuiteError> {
    let tests_file_path = get_resource_path("tests/data/perft_suite.json")?;
    let file =
        File::open(&tests_file_path).map_err(|_| TestHarnessError::CannotReadTestDataFile(tests_file_path.clone()))?;
    let reader = BufReader::new(file);

    let tests = serde_json::from_reader(reader).map_err(TestHarnessError::from)?;
    Ok(tests)
}

//======================================================================================================================
// Tests
//======================================================================================================================

/// Checks the node counts of every depth, and that the position is unchanged afterward.
fn test_node_counts(test: &PerftTest, position: &mut Position) -> Result<(), TestFailureError> {
    let original = position.clone();

    for (index, &expected) in test.nodes.iter().enumerate() {
        let depth = index as u16 + 1;
        let actual = perft(position, depth);
        if actual != expected {
            return Err(TestFailureError::UnexpectedNodeCount { depth, expected, actual });
        }

        if *position != original {
            return Err(TestFailureError::PositionNotRestored {
                depth,
                expected: original.to_string(),
                actual: position.to_string(),
            });
        }
    }

    Ok(())
}

/// Checks that the incremental hashes match hashes computed from scratch after every legal move of the position.
fn test_hashes(position: &mut Position) -> Result<(), TestFailureError> {
    let mut moves = MoveList::default();
    position.pseudo_moves(&mut moves);

    for mv in moves.iter() {
        let snapshot = position.snapshot();
        if position.make_move(mv) {
            let incremental = (position.hash(), position.pawn_hash());
            let computed = position.compute_hashes();
            position.unmake_move(mv, &snapshot);

            if incremental != computed {
                return Err(TestFailureError::InconsistentHashes { mv, incremental, computed });
            }
        }
    }

    Ok(())
}

/// Checks that the parallel divide reports the same counts as the sequential one.
fn test_parallel_divide(test: &PerftTest, position: &mut Position) -> Result<(), TestFailureError> {
    let depth = test.nodes.len().min(2) as u16;
    if parallel_divide(position, depth, DIVIDE_THREADS) != divide(position, depth) {
        return Err(TestFailureError::ParallelDivideMismatch(depth));
    }

    Ok(())
}

fn run_test(test: PerftTest) -> Result<(), PerftSuiteError> {
    let fail = |test_failure_error: TestFailureError| PerftSuiteError::TestFailed {
        test_name: test.description.clone(),
        test_failure_error,
    };

    let mut position =
        Position::new(&test.fen).map_err(|_| fail(TestFailureError::UnableToParseFen(test.fen.clone())))?;

    test_node_counts(&test, &mut position).map_err(fail)?;
    test_hashes(&mut position).map_err(fail)?;
    test_parallel_divide(&test, &mut position).map_err(fail)?;

    Ok(())
}

fn run_tests() -> Result<bool, PerftSuiteError> {
    let tests = read_tests_data()?;

    println!("\nrunning {} tests", tests.len());

    let start = Instant::now();
    let mut passed = 0;
    let mut failed = 0;
    let mut failures: Vec<PerftSuiteError> = Vec::new();
    for test in tests {
        print!("test {} ...", test.description);
        let result_string = match run_test(test) {
            Ok(_) => {
                passed += 1;
                "ok".green()
            }

            Err(error) => {
                failed += 1;
                failures.push(error);
                "FAILED".red()
            }
        };
        println!(" {}", result_string);
    }
    let seconds = start.elapsed().as_secs_f32();

    for failure in failures {
        println!("\n{}", failure)
    }

    println!(
        "\ntest result: {}. {} passed; {} failed; finished in {:.2}s\n",
        if failed == 0 { "ok".green() } else { "FAILED".red() },
        passed,
        failed,
        seconds
    );

    Ok(failed == 0)
}

//======================================================================================================================
// Main function and helpers
//======================================================================================================================

/// Get the path to a resource file, relative to the root of the package.
fn get_resource_path(relative_path: &str) -> Result<PathBuf, TestHarnessError> {
    let mut path = match option_env!("CARGO_MANIFEST_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().map_err(|_| TestHarnessError::ManifestDirNotFound)?,
    };
    path.push(relative_path);

    if !path.exists() {
        return Err(TestHarnessError::ResourcePathNotFound(path));
    }

    Ok(path)
}

/// The main function for the perft suite. It runs the tests and exits with a failure code if any of them fails.
fn main() {
    pawnstorm::initialize();

    match run_tests() {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FAILURE),
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(EXIT_FAILURE)
        }
    }
}

// Error taxonomy shared by the library modules. Command handlers wrap these
// in `anyhow` with extra context; tests match on the variants directly.

use std::path::PathBuf;
use thiserror::Error;

/// Errors the user can act on. Each message tells them what to run or fix.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("No config file found at {}. Please run 'evm-runners init' first!", .0.display())]
    NotInitialized(PathBuf),

    #[error("Levels directory {} not found. Please run 'evm-runners init' first!", .0.display())]
    LevelsDirMissing(PathBuf),

    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Invalid language '{0}'. Please use either 'sol', 'huff' or 'vy'.")]
    InvalidLanguage(String),

    #[error("Invalid bytecode: {0}")]
    InvalidBytecode(String),

    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error(
        "No solution file found! Searched in '{}'\nRun 'evm-runners start <level>' first or submit pure bytecode with -b <bytecode>",
        .0.display()
    )]
    NoSolutionFile(PathBuf),

    #[error("'{lang}' solution file not found! Searched in '{}'", .dir.display())]
    SolutionFileNotFound { lang: String, dir: PathBuf },

    #[error("More than one solution file found ({0})!\nDelete a solution file or use --lang to choose which one to use.")]
    AmbiguousSolution(String),

    #[error("You are not authenticated. Please run 'evm-runners auth discord' first!")]
    NotAuthenticated,

    #[error("Build failed:\n{0}")]
    BuildFailed(String),

    #[error("Terminal width is too small ({width} < {min}).\nPlease resize your terminal window.")]
    TerminalTooNarrow { width: u16, min: u16 },

    #[error("Request failed: {status} - {body}")]
    Http { status: u16, body: String },
}

// Library root
// ------------
// The binary (`main.rs`) only parses arguments; everything else lives here
// so it can be tested without a terminal.
//
// Module responsibilities:
// - `config`: the per-user `.env` settings file.
// - `levels`: the level catalog from `levels.toml`.
// - `api`: HTTP calls to the evm-runners server.
// - `toolchain`: running forge/huffc/vyper/git and parsing their output.
// - `solution`: bytecode validation, language detection and compilation.
// - `ui`: prompts, spinners and the interactive pickers.
// - `commands`: one handler per subcommand.
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod levels;
pub mod solution;
pub mod toolchain;
pub mod ui;

// Entrypoint for the CLI application.
// - Parses arguments with clap and dispatches to `commands`.
// - Any returned error is printed and turned into exit code 1.

use clap::{Parser, Subcommand};
use evm_runners::commands;
use evm_runners::config::Config;
use evm_runners::toolchain::SystemRunner;
use tracing_subscriber::EnvFilter;

const LONG_ABOUT: &str = "A terminal-based game for developers with EVM-based challenges.

How to play:
1. Run 'evm-runners init' to initialize the game
2. Run 'evm-runners levels' to list all available levels
3. Run 'evm-runners start <level>' to start solving a level
4. Run 'evm-runners validate <level>' to validate your solution
5. Run 'evm-runners submit <level>' to submit your solution";

#[derive(Parser)]
#[command(name = "evm-runners")]
#[command(version)]
#[command(about = "A terminal-based game for developers with EVM-based challenges", long_about = LONG_ABOUT)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config and clone the levels repository
    Init,

    /// Authenticate with Discord or link your wallet address
    Auth {
        /// `discord` or `wallet`
        #[arg(default_value = "discord")]
        method: String,
    },

    /// Start a level by copying its template
    Start {
        /// Level name; pick interactively when omitted
        level: Option<String>,

        /// Template language: sol, huff or vy
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Validate a solution against the level's tests
    Validate {
        level: String,

        /// Validate raw bytecode instead of a solution file
        #[arg(short, long)]
        bytecode: Option<String>,

        /// Solution language when several solution files exist
        #[arg(short, long)]
        lang: Option<String>,

        /// Show stack and setup traces
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate and submit a solution
    Submit {
        level: String,

        /// Submit raw bytecode instead of a solution file
        #[arg(short, long)]
        bytecode: Option<String>,

        /// Solution language when several solution files exist
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// List all available levels
    #[command(visible_alias = "list")]
    Levels,

    /// Show the gas and size leaderboards of a level
    Leaderboard {
        /// Level name; pick interactively when omitted
        level: Option<String>,
    },

    /// Link a wallet address to your account
    Address { address: Option<String> },

    /// Pull the latest levels
    Update,

    /// General information about evm-runners
    About,

    /// Print the evm-runners version
    Version,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// `init` creates the config and `about` is static text; everything else
// reads the config first.
fn needs_config(command: &Commands) -> bool {
    !matches!(command, Commands::Init | Commands::About)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runner = SystemRunner;

    if !needs_config(&cli.command) {
        return match cli.command {
            Commands::Init => commands::init::run(&runner),
            _ => {
                commands::about::run();
                Ok(())
            }
        };
    }

    let config = Config::load()?;
    match cli.command {
        Commands::Auth { method } => commands::auth::run(config, &runner, &method),
        Commands::Start { level, lang } => {
            commands::start::run(&config, level.as_deref(), lang.as_deref())
        }
        Commands::Validate { level, bytecode, lang, verbose } => commands::validate::run(
            &config,
            &runner,
            &level,
            bytecode.as_deref(),
            lang.as_deref(),
            verbose,
        ),
        Commands::Submit { level, bytecode, lang } => {
            commands::submit::run(&config, &runner, &level, bytecode.as_deref(), lang.as_deref())
        }
        Commands::Levels => commands::levels::run(&config),
        Commands::Leaderboard { level } => commands::leaderboard::run(&config, level.as_deref()),
        Commands::Address { address } => commands::auth::link_address(&config, address.as_deref()),
        Commands::Update => commands::update::run(&config, &runner),
        Commands::Version => {
            commands::about::version();
            Ok(())
        }
        Commands::Init | Commands::About => Ok(()),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

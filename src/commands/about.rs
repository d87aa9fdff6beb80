// `about` and `version`: static information, no config needed.

use crossterm::style::Stylize;

const BANNER: &str = r#"
  _____   ___ __ ___        _ __ _   _ _ __  _ __   ___ _ __ ___
 / _ \ \ / / '_ ` _ \ _____| '__| | | | '_ \| '_ \ / _ \ '__/ __|
|  __/\ V /| | | | | |_____| |  | |_| | | | | | | |  __/ |  \__ \
 \___| \_/ |_| |_| |_|     |_|   \__,_|_| |_|_| |_|\___|_|  |___/
"#;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("{}", BANNER);
    println!("A terminal-based game for developers with EVM-based levels");
    println!();
    println!("Sponsored by {} and {}", "@EthernautDAO".blue(), "@Optimism".blue());
    println!(
        "Authors: {}, {}, {}",
        "@0xkarmacoma".blue(),
        "@beskay0x".blue(),
        "@kyre_rs".blue()
    );
    println!();
    println!("Website: {}", "https://evmr.sh".blue());
    println!("Discord: {}", "https://discord.gg/2TwURWvnVT".blue());
    println!();
    println!("evm-runners is more than your typical CTF game:");
    println!();
    println!("  - No time limit");
    println!("  - Score based, not hack based");
    println!("  - Dual scores (gas and codesize), not a compound score");
    println!("  - Linear progression: levels get more complex as you progress");
    println!("  - Work in a language of your choice (Solidity, Vyper, Huff or raw bytecode)");
    println!("  - Singleplayer: play at your own pace and pick up useful skills");
    println!("  - Multiplayer: benchmark your scores against other players");
    println!();
}

pub fn version() {
    println!("evm-runners version {}", VERSION);
}

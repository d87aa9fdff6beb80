// `auth discord|wallet` and `address [address]`: account login through the
// browser PIN flow and wallet linking.

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::CliError;
use crate::toolchain::{Invocation, ToolRunner};
use crate::ui;
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Discord,
    Wallet,
}

impl AuthMethod {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "d" | "discord" => Ok(AuthMethod::Discord),
            "wallet" | "address" => Ok(AuthMethod::Wallet),
            other => anyhow::bail!("Invalid authentication method '{}'. Use 'discord' or 'wallet'.", other),
        }
    }
}

pub fn validate_address(raw: &str) -> Result<&str, CliError> {
    let address = raw.trim();
    if ADDRESS_RE.is_match(address) {
        Ok(address)
    } else {
        Err(CliError::InvalidAddress(address.to_string()))
    }
}

/// Platform command that opens a URL in the default browser.
fn browser_invocation(url: &str) -> Invocation {
    let cwd = std::env::temp_dir();
    if cfg!(target_os = "macos") {
        Invocation::new("open", &cwd).arg(url)
    } else if cfg!(target_os = "windows") {
        Invocation::new("cmd", &cwd).args(["/C", "start", "", url])
    } else {
        Invocation::new("xdg-open", &cwd).arg(url)
    }
}

pub fn run(config: Config, runner: &dyn ToolRunner, method: &str) -> Result<()> {
    match AuthMethod::parse(method)? {
        AuthMethod::Discord => discord(config, runner),
        AuthMethod::Wallet => link_address(&config, None),
    }
}

pub fn discord(mut config: Config, runner: &dyn ToolRunner) -> Result<()> {
    if config.is_authenticated() || !config.user_id.is_empty() || !config.user_name.is_empty() {
        let prompt = format!(
            "It seems like you authenticated before as '{}'. Do you want to update your info?",
            config.user_name
        );
        if !ui::confirm(&prompt)? {
            println!("Aborting authentication");
            return Ok(());
        }
    }

    let api = ApiClient::new(&config.server, None)?;
    let url = api.auth_url();
    println!("Opening {} in your default browser...", url);
    match runner.run(&browser_invocation(&url)) {
        Ok(out) if out.success => {}
        _ => println!("Could not open a browser. Please visit {} manually.", url),
    }

    println!("When you're done authenticating, enter the provided PIN code.\n");
    let pin = ui::input("PIN")?;

    let spinner = ui::spinner("Authenticating...")?;
    let result = api.exchange_pin(&pin);
    spinner.finish_and_clear();
    let resp = result?;

    config.user_id = resp.user_id();
    config.user_name = resp.name.clone();
    config.token = resp.access_token;
    config.save().context("Failed to save auth data")?;

    tracing::info!(user = %config.user_name, "authenticated");
    println!("\nSuccessfully authenticated as '{}'!", config.user_name);
    Ok(())
}

/// Link a wallet address, prompting for it when not given.
pub fn link_address(config: &Config, address: Option<&str>) -> Result<()> {
    config.require_auth()?;

    let raw = match address {
        Some(a) => a.to_string(),
        None => ui::input("Please enter your wallet address")?,
    };
    let address = validate_address(&raw)?;

    println!("\nLinking wallet address '{}' to your account...", address);
    let api = ApiClient::from_config(config)?;
    api.link_wallet(address).context("Failed to link wallet address")?;
    println!("Success!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_aliases() {
        assert_eq!(AuthMethod::parse("Discord").unwrap(), AuthMethod::Discord);
        assert_eq!(AuthMethod::parse("d").unwrap(), AuthMethod::Discord);
        assert_eq!(AuthMethod::parse("address").unwrap(), AuthMethod::Wallet);
        assert!(AuthMethod::parse("github").is_err());
    }

    #[test]
    fn addresses() {
        let good = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert_eq!(validate_address(&format!(" {good}\n")).unwrap(), good);
        for bad in ["", "0x123", "52908400098527886E0F7030069857D2E4169EE7", "0xZZ908400098527886E0F7030069857D2E4169EE7"] {
            assert!(matches!(validate_address(bad), Err(CliError::InvalidAddress(_))), "{bad}");
        }
    }

    #[test]
    fn browser_command_targets_url() {
        let inv = browser_invocation("https://evm-runners.fly.dev/auth");
        assert_eq!(inv.args.last().map(String::as_str), Some("https://evm-runners.fly.dev/auth"));
    }

    #[test]
    fn linking_requires_auth() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new_in(dir.path());
        let err = link_address(&config, Some("0x52908400098527886E0F7030069857D2E4169EE7")).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::NotAuthenticated)));
    }
}

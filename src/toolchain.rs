// External tool adapter: every subprocess the CLI starts (forge, huffc,
// vyper, git) goes through `ToolRunner`, which returns a typed result
// instead of raw bytes. Tests substitute a recording fake.

use anyhow::{Context, Result};
use rand::Rng;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// A fully described subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
    pub envs: Vec<(String, String)>,
    /// Stream stdout/stderr to the terminal instead of capturing them.
    pub inherit_stdio: bool,
}

impl Invocation {
    pub fn new(program: &str, dir: &Path) -> Self {
        Invocation {
            program: program.to_string(),
            args: Vec::new(),
            dir: dir.to_path_buf(),
            envs: Vec::new(),
            inherit_stdio: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn inherit_stdio(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }

    /// Shell-like rendering for logs and hints.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Runs external tools. Errors are reserved for "could not start the
/// process"; a non-zero exit comes back as `success == false`.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs tools on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        tracing::debug!(command = %invocation.display(), dir = %invocation.dir.display(), "running tool");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.dir);
        for (key, value) in &invocation.envs {
            cmd.env(key, value);
        }

        let not_found = || {
            format!(
                "Failed to run '{}'. Is it installed and on your PATH?",
                invocation.program
            )
        };

        if invocation.inherit_stdio {
            let status = cmd
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .with_context(not_found)?;
            return Ok(ProcessOutput {
                success: status.success(),
                code: status.code(),
                ..ProcessOutput::default()
            });
        }

        let output = cmd.output().with_context(not_found)?;
        tracing::debug!(status = ?output.status.code(), "tool finished");
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// Upper bounds for the randomized block context.
const MAX_BLOCK_NUMBER: u64 = 17_243_073;
const MAX_DIFFICULTY: u64 = 5_875_000_371;
const MAX_GAS_PRICE: u64 = 45_014_319_675;

/// Block environment injected into every scoring run so that solutions
/// depending on a fixed environment fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub coinbase: String,
    pub timestamp: u64,
    pub number: u64,
    pub difficulty: u64,
    pub prevrandao: String,
    pub gas_price: u64,
    pub base_fee: u64,
}

impl BlockContext {
    pub fn random() -> Self {
        let mut rng = rand::rng();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(MAX_BLOCK_NUMBER)
            .max(1);

        BlockContext {
            coinbase: format!("0x{}", hex::encode(rng.random::<[u8; 20]>())),
            timestamp: rng.random_range(0..now),
            number: rng.random_range(0..MAX_BLOCK_NUMBER),
            difficulty: rng.random_range(0..MAX_DIFFICULTY),
            prevrandao: format!("0x{}", hex::encode(rng.random::<[u8; 32]>())),
            gas_price: rng.random_range(0..MAX_GAS_PRICE),
            base_fee: rng.random_range(0..MAX_GAS_PRICE),
        }
    }

    fn to_args(&self) -> Vec<String> {
        vec![
            "--block-coinbase".into(),
            self.coinbase.clone(),
            "--block-timestamp".into(),
            self.timestamp.to_string(),
            "--block-number".into(),
            self.number.to_string(),
            "--block-difficulty".into(),
            self.difficulty.to_string(),
            "--block-prevrandao".into(),
            self.prevrandao.clone(),
            "--gas-price".into(),
            self.gas_price.to_string(),
            "--base-fee".into(),
            self.base_fee.to_string(),
        ]
    }
}

/// `forge test` for one test contract with the candidate bytecode in
/// `BYTECODE`.
pub fn forge_test(
    levels_dir: &Path,
    test_contract: &str,
    bytecode: &str,
    block: &BlockContext,
    verbose: bool,
) -> Invocation {
    Invocation::new("forge", levels_dir)
        .arg("test")
        .args(block.to_args())
        .args(["--match-contract", test_contract])
        .arg(if verbose { "-vvvv" } else { "-vv" })
        .env("BYTECODE", bytecode)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub gas: u64,
    pub size: u64,
}

static GAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"μ:\s*(\d+)").expect("gas pattern is valid"));
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Contract size:\s*(\d+)").expect("size pattern is valid"));

/// Pull the gas and size scores out of `forge test` output.
///
/// Gas is the mean (`μ`) of the level's `_gas` fuzz test; if no such line is
/// present, the first `μ` value in the output is used. A missing value stays
/// at zero.
pub fn parse_scores(output: &str) -> Result<Scores> {
    let mut scores = Scores::default();
    let mut gas_from_gas_test = false;
    let mut gas_seen = false;

    for line in output.lines() {
        if let Some(caps) = GAS_RE.captures(line) {
            let is_gas_test = line.contains("_gas");
            if !gas_seen || (is_gas_test && !gas_from_gas_test) {
                scores.gas = caps[1]
                    .parse()
                    .with_context(|| format!("Gas value out of range: {}", &caps[1]))?;
                gas_seen = true;
                gas_from_gas_test = is_gas_test;
            }
        }
        if let Some(caps) = SIZE_RE.captures(line) {
            scores.size = caps[1]
                .parse()
                .with_context(|| format!("Size value out of range: {}", &caps[1]))?;
        }
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORGE_OUTPUT: &str = "\
Running 2 tests for test/Average.t.sol:AverageTestBase
[PASS] test_average_size() (gas: 8937)
Logs:
  Contract size: 56

[PASS] test_average_gas(uint256,uint256) (runs: 256, μ: 1234, ~: 1200)
Test result: ok. 2 passed; 0 failed; finished in 12.05ms";

    #[test]
    fn extracts_gas_and_size() {
        let scores = parse_scores(FORGE_OUTPUT).unwrap();
        assert_eq!(scores, Scores { gas: 1234, size: 56 });
    }

    #[test]
    fn bare_markers_are_enough() {
        let scores = parse_scores("μ: 1234\nContract size: 56\n").unwrap();
        assert_eq!(scores, Scores { gas: 1234, size: 56 });
    }

    #[test]
    fn gas_test_line_wins_over_other_fuzz_tests() {
        let output = "[PASS] test_other(uint256) (runs: 256, μ: 99, ~: 99)\n\
                      [PASS] test_level_gas(uint256) (runs: 256, μ: 500, ~: 480)\n";
        assert_eq!(parse_scores(output).unwrap().gas, 500);
    }

    #[test]
    fn missing_values_stay_zero() {
        assert_eq!(parse_scores("nothing here").unwrap(), Scores::default());
    }

    #[test]
    fn forge_test_invocation_carries_block_context_and_bytecode() {
        let block = BlockContext::random();
        let inv = forge_test(Path::new("/levels"), "AverageTestBase", "0xdead", &block, false);

        assert_eq!(inv.program, "forge");
        assert_eq!(inv.args[0], "test");
        assert_eq!(inv.dir, PathBuf::from("/levels"));
        assert_eq!(inv.envs, vec![("BYTECODE".to_string(), "0xdead".to_string())]);
        assert_eq!(inv.args.last().map(String::as_str), Some("-vv"));

        let pos = inv.args.iter().position(|a| a == "--match-contract").unwrap();
        assert_eq!(inv.args[pos + 1], "AverageTestBase");
        for flag in [
            "--block-coinbase",
            "--block-timestamp",
            "--block-number",
            "--block-difficulty",
            "--block-prevrandao",
            "--gas-price",
            "--base-fee",
        ] {
            assert!(inv.args.iter().any(|a| a == flag), "missing {flag}");
        }
    }

    #[test]
    fn random_block_context_is_within_bounds() {
        let block = BlockContext::random();
        assert_eq!(block.coinbase.len(), 42);
        assert_eq!(block.prevrandao.len(), 66);
        assert!(block.number < MAX_BLOCK_NUMBER);
        assert!(block.difficulty < MAX_DIFFICULTY);
        assert!(block.gas_price < MAX_GAS_PRICE);
        assert!(block.base_fee < MAX_GAS_PRICE);
    }

    #[test]
    fn combined_output_joins_streams() {
        let out = ProcessOutput {
            success: false,
            code: Some(1),
            stdout: "out\n".into(),
            stderr: "err\n".into(),
        };
        assert_eq!(out.combined(), "out\nerr\n");
    }
}

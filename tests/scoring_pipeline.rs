use evm_runners::commands::validate::{check_solution, Outcome};
use evm_runners::levels::{find_level, load_levels};
use evm_runners::solution::SolutionType;
use evm_runners::toolchain::{Invocation, ProcessOutput, Scores, ToolRunner};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LEVELS_TOML: &str = r#"
[[levels]]
id = "1"
file = "01_Average"
contract = "Average"
type = "Math"
description = "Return the average of the array."
"#;

struct ScriptedForge {
    calls: RefCell<Vec<Invocation>>,
    output: ProcessOutput,
}

impl ScriptedForge {
    fn new(success: bool, stdout: &str) -> Self {
        ScriptedForge {
            calls: RefCell::new(Vec::new()),
            output: ProcessOutput { success, code: Some(i32::from(!success)), stdout: stdout.into(), stderr: String::new() },
        }
    }
}

impl ToolRunner for ScriptedForge {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ProcessOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok(self.output.clone())
    }
}

fn levels_dir(dir: &Path) {
    fs::write(dir.join("levels.toml"), LEVELS_TOML).unwrap();
}

#[test]
fn raw_bytecode_skips_compilation_and_is_scored() {
    let dir = tempdir().unwrap();
    levels_dir(dir.path());
    let levels = load_levels(dir.path()).unwrap();
    let level = find_level(&levels, "average").unwrap();

    let forge = ScriptedForge::new(
        true,
        "[PASS] test_average_gas(uint256[]) (runs: 256, μ: 1234, ~: 1200)\n\
         [PASS] test_average_size() (gas: 999)\n\
         Contract size: 42\n",
    );
    let outcome = check_solution(&forge, dir.path(), level, Some("0xdeadbeef"), None, false).unwrap();

    let calls = forge.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "forge");
    assert!(calls[0].args.iter().any(|a| a == "AverageTestBase"));
    assert!(calls[0]
        .envs
        .iter()
        .any(|(k, v)| k == "BYTECODE" && v == "0xdeadbeef"));

    match outcome {
        Outcome::Correct { bytecode, solution_type, scores, .. } => {
            assert_eq!(bytecode, "0xdeadbeef");
            assert_eq!(solution_type, SolutionType::Bytecode);
            assert_eq!(scores, Scores { gas: 1234, size: 42 });
        }
        other => panic!("expected a correct outcome, got {:?}", other),
    }
}

#[test]
fn failing_tests_are_an_incorrect_outcome() {
    let dir = tempdir().unwrap();
    levels_dir(dir.path());
    let levels = load_levels(dir.path()).unwrap();
    let level = find_level(&levels, "Average").unwrap();

    let forge = ScriptedForge::new(false, "[FAIL. Reason: wrong result] test_average()");
    let outcome = check_solution(&forge, dir.path(), level, Some("6001"), None, false).unwrap();

    match outcome {
        Outcome::Incorrect { output, .. } => assert!(output.contains("FAIL")),
        other => panic!("expected an incorrect outcome, got {:?}", other),
    }
}

#[test]
fn invalid_bytecode_never_reaches_forge() {
    let dir = tempdir().unwrap();
    levels_dir(dir.path());
    let levels = load_levels(dir.path()).unwrap();
    let level = find_level(&levels, "average").unwrap();

    let forge = ScriptedForge::new(true, "");
    let err = check_solution(&forge, dir.path(), level, Some("0xzz"), None, false).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("bytecode"));
    assert!(forge.calls.borrow().is_empty());
}

// `validate <level>`: build the solution (or take raw bytecode), run the
// level's forge tests against it and report the gas and size scores.

use crate::config::Config;
use crate::levels::{find_level, Level};
use crate::solution::{self, SolutionType};
use crate::toolchain::{self, BlockContext, Scores, ToolRunner};
use crate::ui;
use anyhow::Result;
use std::path::Path;

/// Result of a scoring run. A failing test run is a normal outcome, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Correct {
        bytecode: String,
        solution_type: SolutionType,
        scores: Scores,
        output: String,
    },
    Incorrect {
        solution_type: SolutionType,
        output: String,
    },
}

/// Compile (unless bytecode is given) and score a solution for `level`.
pub fn check_solution(
    runner: &dyn ToolRunner,
    levels_dir: &Path,
    level: &Level,
    bytecode: Option<&str>,
    lang: Option<&str>,
    verbose: bool,
) -> Result<Outcome> {
    let compiling = match bytecode {
        Some(_) => None,
        None => Some(ui::spinner("Compiling solution...")?),
    };
    let built = solution::bytecode_for(runner, levels_dir, level, bytecode, lang);
    if let Some(spinner) = compiling {
        spinner.finish_and_clear();
    }
    let (bytecode, solution_type) = built?;

    if verbose {
        println!(
            "To test the solution yourself, run 'forge test --mc {} -vvvvv' in {}\n",
            solution_type.user_test_contract(level),
            levels_dir.display()
        );
    }

    let invocation = toolchain::forge_test(
        levels_dir,
        &level.test_contract(),
        &bytecode,
        &BlockContext::random(),
        verbose,
    );
    let spinner = ui::spinner("Validating solution...")?;
    let result = runner.run(&invocation);
    spinner.finish_and_clear();
    let output = result?;

    if !output.success {
        tracing::info!(level = %level.contract, code = ?output.code, "scoring run failed");
        return Ok(Outcome::Incorrect { solution_type, output: output.combined() });
    }

    let combined = output.combined();
    let scores = toolchain::parse_scores(&combined)?;
    Ok(Outcome::Correct { bytecode, solution_type, scores, output: combined })
}

/// What `validate` prints for an outcome: the test output, then the verdict.
pub fn report(outcome: &Outcome) -> Vec<String> {
    match outcome {
        Outcome::Incorrect { output, .. } => {
            vec![output.clone(), "Solution is not correct!".to_string()]
        }
        Outcome::Correct { scores, output, .. } => vec![
            output.clone(),
            format!("Solution is correct! Gas: {}, Size: {}", scores.gas, scores.size),
        ],
    }
}

pub fn run(
    config: &Config,
    runner: &dyn ToolRunner,
    level_name: &str,
    bytecode: Option<&str>,
    lang: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let (levels_dir, levels) = super::load_catalog(config)?;
    let level = find_level(&levels, level_name)?;

    let outcome = check_solution(runner, levels_dir, level, bytecode, lang, verbose)?;
    for line in report(&outcome) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_runs_show_test_output_before_scores() {
        let outcome = Outcome::Correct {
            bytecode: "0x00".into(),
            solution_type: SolutionType::Bytecode,
            scores: Scores { gas: 1234, size: 56 },
            output: "[PASS] test_average_gas() (runs: 256, μ: 1234, ~: 1200)".into(),
        };
        assert_eq!(
            report(&outcome),
            vec![
                "[PASS] test_average_gas() (runs: 256, μ: 1234, ~: 1200)".to_string(),
                "Solution is correct! Gas: 1234, Size: 56".to_string(),
            ]
        );
    }

    #[test]
    fn incorrect_runs_end_with_the_verdict() {
        let outcome = Outcome::Incorrect {
            solution_type: SolutionType::Huff,
            output: "[FAIL] test_average()".into(),
        };
        assert_eq!(report(&outcome).last().map(String::as_str), Some("Solution is not correct!"));
    }
}

// `submit <level>`: validate locally, compare with the user's existing
// submissions and send the solution to the server when it improves on them.

use super::validate::{check_solution, Outcome};
use crate::api::{ApiClient, SubmissionData, SubmitRequest};
use crate::config::Config;
use crate::levels::find_level;
use crate::toolchain::{Scores, ToolRunner};
use crate::ui;
use anyhow::Result;

/// Lowest gas and lowest size across existing submissions. Entries whose
/// score does not parse are ignored.
pub fn best_scores(existing: &[SubmissionData]) -> (Option<u64>, Option<u64>) {
    let gas = existing.iter().filter_map(SubmissionData::gas_score).min();
    let size = existing.iter().filter_map(SubmissionData::size_score).min();
    (gas, size)
}

/// A candidate is worth submitting when it beats the best existing gas or
/// the best existing size. Ties are not improvements, and a zero score
/// means it could not be read, so it never wins a comparison.
pub fn is_improvement(candidate: Scores, existing: &[SubmissionData]) -> bool {
    let (best_gas, best_size) = best_scores(existing);
    let beats = |score: u64, best: Option<u64>| score > 0 && best.map_or(true, |b| score < b);
    beats(candidate.gas, best_gas) || beats(candidate.size, best_size)
}

/// Human-readable rank lines from the submission response.
pub fn rank_lines(response: &[SubmissionData]) -> Vec<String> {
    response
        .iter()
        .filter_map(|entry| {
            let rank = entry.rank?;
            let board = if entry.optimized_for.is_empty() { "overall" } else { entry.optimized_for.as_str() };
            Some(format!("Your solution ranks #{} on the {} leaderboard!", rank, board))
        })
        .collect()
}

pub fn run(
    config: &Config,
    runner: &dyn ToolRunner,
    level_name: &str,
    bytecode: Option<&str>,
    lang: Option<&str>,
) -> Result<()> {
    config.require_auth()?;
    let (levels_dir, levels) = super::load_catalog(config)?;
    let level = find_level(&levels, level_name)?;

    let (bytecode, solution_type, scores) =
        match check_solution(runner, levels_dir, level, bytecode, lang, false)? {
            Outcome::Incorrect { output, .. } => {
                println!("{}", output);
                println!("Solution is not correct! Nothing was submitted.");
                return Ok(());
            }
            Outcome::Correct { bytecode, solution_type, scores, .. } => {
                (bytecode, solution_type, scores)
            }
        };
    println!("Solution is correct! Gas: {}, Size: {}", scores.gas, scores.size);
    if scores.gas == 0 || scores.size == 0 {
        println!("Could not read the gas and size scores from the test output. Nothing was submitted.");
        return Ok(());
    }

    let api = ApiClient::from_config(config)?;
    let existing: Vec<SubmissionData> = api
        .user_submissions(Some(&level.id))?
        .into_iter()
        .filter(|s| s.level_id.is_empty() || s.level_id == level.id)
        .collect();

    if !is_improvement(scores, &existing) {
        let (gas, size) = best_scores(&existing);
        println!(
            "Your existing submission is at least as good (gas {}, size {}). Skipping submission.",
            gas.map(|g| g.to_string()).unwrap_or_default(),
            size.map(|s| s.to_string()).unwrap_or_default(),
        );
        return Ok(());
    }

    let spinner = ui::spinner("Submitting solution...")?;
    let result = api.submit(&SubmitRequest {
        bytecode: &bytecode,
        kind: solution_type.tag(),
        user_id: &config.user_id,
        level_id: &level.id,
    });
    spinner.finish_and_clear();
    let response = result?;

    println!("Solution for level '{}' submitted successfully!", level.contract.to_lowercase());
    for line in rank_lines(&response) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(gas: &str, size: &str) -> SubmissionData {
        SubmissionData { gas: gas.into(), size: size.into(), ..SubmissionData::default() }
    }

    #[test]
    fn equal_scores_are_not_better() {
        let existing = vec![sub("1000", "20"), sub("1500", "25")];
        assert!(!is_improvement(Scores { gas: 1000, size: 20 }, &existing));
        assert!(!is_improvement(Scores { gas: 1200, size: 22 }, &existing));
    }

    #[test]
    fn unread_scores_never_improve() {
        let existing = vec![sub("1000", "20")];
        assert!(!is_improvement(Scores { gas: 0, size: 0 }, &existing));
        assert!(!is_improvement(Scores { gas: 0, size: 0 }, &[]));
        assert!(!is_improvement(Scores { gas: 0, size: 25 }, &existing));
        assert!(is_improvement(Scores { gas: 0, size: 19 }, &existing));
    }

    #[test]
    fn either_metric_can_improve() {
        let existing = vec![sub("1000", "20")];
        assert!(is_improvement(Scores { gas: 999, size: 20 }, &existing));
        assert!(is_improvement(Scores { gas: 2000, size: 19 }, &existing));
    }

    #[test]
    fn best_is_taken_per_metric() {
        let existing = vec![sub("900", "30"), sub("1200", "15"), sub("n/a", "")];
        assert_eq!(best_scores(&existing), (Some(900), Some(15)));
        assert!(!is_improvement(Scores { gas: 900, size: 15 }, &existing));
    }

    #[test]
    fn first_submission_always_goes_through() {
        assert!(is_improvement(Scores { gas: 5000, size: 500 }, &[]));
    }

    #[test]
    fn ranks_are_reported() {
        let mut gas = sub("1", "2");
        gas.optimized_for = "gas".into();
        gas.rank = Some(3);
        let unranked = sub("1", "2");
        assert_eq!(
            rank_lines(&[gas, unranked]),
            vec!["Your solution ranks #3 on the gas leaderboard!".to_string()]
        );
    }
}

// `levels` / `list`: interactive level overview with solve counts and the
// user's solved markers.

use crate::api::{ApiClient, SubmissionData};
use crate::config::Config;
use crate::levels::{sorted_levels, Level};
use crate::ui::{self, LevelPicker};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Solve count per level keyed by contract name. Unreachable counts are
/// empty strings.
pub fn fetch_solves(api: &ApiClient, levels: &HashMap<String, Level>) -> HashMap<String, String> {
    levels
        .values()
        .map(|level| (level.contract.clone(), api.level_solves(&level.id)))
        .collect()
}

/// Ids of levels that have at least one of the user's submissions.
pub fn solved_level_ids(submissions: &[SubmissionData], levels: &HashMap<String, Level>) -> HashSet<String> {
    submissions
        .iter()
        .filter_map(|sub| {
            levels
                .values()
                .find(|l| l.id == sub.level_id || l.contract.eq_ignore_ascii_case(&sub.level_name))
                .map(|l| l.id.clone())
        })
        .collect()
}

pub fn run(config: &Config) -> Result<()> {
    let (_, levels) = super::load_catalog(config)?;
    ui::terminal_width()?;

    let api = ApiClient::from_config(config)?;
    let spinner = ui::spinner("Fetching levels...")?;
    let solves = fetch_solves(&api, &levels);
    let solved = if api.has_token() {
        match api.user_submissions_quick() {
            Ok(subs) => solved_level_ids(&subs, &levels),
            Err(e) => {
                tracing::debug!(error = %e, "could not fetch own submissions");
                HashSet::new()
            }
        }
    } else {
        HashSet::new()
    };
    spinner.finish_and_clear();

    let mut picker = LevelPicker::new(sorted_levels(&levels), solves, solved);
    ui::run_screen(&mut picker)?;

    if let Some(level) = picker.selected() {
        println!(
            "Run 'evm-runners start {}' to start solving this level!",
            level.contract.to_lowercase()
        );
    }
    Ok(())
}

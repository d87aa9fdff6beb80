// `leaderboard [level]`: top 10 gas and size submissions for a level.

use crate::api::{ApiClient, Metric};
use crate::config::Config;
use crate::levels::find_level;
use crate::ui::{self, LeaderboardView};
use anyhow::Result;

pub fn run(config: &Config, level_name: Option<&str>) -> Result<()> {
    let (_, levels) = super::load_catalog(config)?;
    let width = ui::terminal_width()?;

    let level = match level_name {
        Some(name) => find_level(&levels, name)?,
        None => match super::pick_level(&levels)? {
            Some(level) => level,
            None => return Ok(()),
        },
    };

    let api = ApiClient::new(&config.server, None)?;
    let spinner = ui::spinner("Fetching leaderboard...")?;
    let boards = api
        .leaderboard(Metric::Gas, &level.id)
        .and_then(|gas| Ok((gas, api.leaderboard(Metric::Size, &level.id)?)));
    spinner.finish_and_clear();
    let (gas, size) = boards?;

    let mut view = LeaderboardView::new(&gas, &size, width);
    ui::run_screen(&mut view)
}

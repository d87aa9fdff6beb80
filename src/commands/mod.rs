// Command handlers. Each subcommand lives in its own module and receives the
// already-loaded config plus the tool runner; `main` only parses arguments
// and dispatches.

pub mod about;
pub mod auth;
pub mod init;
pub mod leaderboard;
pub mod levels;
pub mod start;
pub mod submit;
pub mod update;
pub mod validate;

use crate::config::Config;
use crate::levels::{self as catalog, Level};
use crate::ui::{self, LevelPicker};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Levels directory and catalog, the starting point of most commands.
pub(crate) fn load_catalog(config: &Config) -> Result<(&Path, HashMap<String, Level>)> {
    let levels_dir = config.require_levels_dir()?;
    let levels = catalog::load_levels(levels_dir)?;
    Ok((levels_dir, levels))
}

/// Let the user choose a level interactively. `None` when they quit.
pub(crate) fn pick_level(levels: &HashMap<String, Level>) -> Result<Option<&Level>> {
    ui::terminal_width()?;
    let mut picker = LevelPicker::new(catalog::sorted_levels(levels), HashMap::new(), HashSet::new());
    ui::run_screen(&mut picker)?;
    Ok(picker.selected())
}

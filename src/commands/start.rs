// `start [level]`: copy a level template into `src/` so the player can
// begin working on it.

use crate::config::Config;
use crate::levels::{find_level, Level};
use crate::solution::{solution_path, template_path, SolutionType, SOLUTION_DIR};
use crate::ui::{self, LanguageChoice, LanguagePicker};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Copy the template for `level` in `lang` into the solution directory.
///
/// `overwrite` is asked before replacing an existing solution; returning
/// `false` leaves it untouched and yields `None`.
pub fn copy_template(
    levels_dir: &Path,
    level: &Level,
    lang: SolutionType,
    overwrite: impl FnOnce(&Path) -> Result<bool>,
) -> Result<Option<PathBuf>> {
    let (src, dst) = match (
        template_path(levels_dir, &level.file, lang),
        solution_path(levels_dir, &level.file, lang),
    ) {
        (Some(src), Some(dst)) => (src, dst),
        _ => anyhow::bail!("There are no templates for raw bytecode solutions"),
    };

    if !src.is_file() {
        anyhow::bail!(
            "No {} template found for level '{}' (looked for {})",
            lang,
            level.contract.to_lowercase(),
            src.display()
        );
    }
    if dst.exists() && !overwrite(&dst)? {
        return Ok(None);
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(&src, &dst)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(Some(dst))
}

pub fn run(config: &Config, level_name: Option<&str>, lang: Option<&str>) -> Result<()> {
    let (levels_dir, levels) = super::load_catalog(config)?;

    let level = match level_name {
        Some(name) => find_level(&levels, name)?,
        None => match super::pick_level(&levels)? {
            Some(level) => level,
            None => return Ok(()),
        },
    };

    let choice = match lang {
        Some(flag) => LanguageChoice::Template(SolutionType::from_flag(flag)?),
        None => {
            ui::terminal_width()?;
            let mut picker = LanguagePicker::new();
            ui::run_screen(&mut picker)?;
            match picker.selected() {
                Some(choice) => choice,
                None => return Ok(()),
            }
        }
    };

    let lang = match choice {
        LanguageChoice::Template(lang) => lang,
        LanguageChoice::NoTemplate => {
            println!(
                "No template copied. Create your solution in {} and run 'evm-runners validate {}' when ready.",
                levels_dir.join(SOLUTION_DIR).display(),
                level.contract.to_lowercase()
            );
            return Ok(());
        }
    };

    let copied = copy_template(levels_dir, level, lang, |dst| {
        ui::confirm(&format!("{} already exists. Overwrite it?", dst.display()))
    })?;

    match copied {
        Some(path) => {
            println!("Your challenge is ready! Edit {} to solve it. Good luck!", path.display());
            println!(
                "Run 'evm-runners validate {}' to check your solution.",
                level.contract.to_lowercase()
            );
        }
        None => println!("Keeping your existing solution file."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn level() -> Level {
        Level {
            id: "1".into(),
            file: "01_Average".into(),
            contract: "Average".into(),
            kind: "Math".into(),
            description: String::new(),
        }
    }

    fn write_template(dir: &Path, name: &str, body: &str) {
        let tpl = dir.join("template");
        fs::create_dir_all(&tpl).unwrap();
        fs::write(tpl.join(name), body).unwrap();
    }

    #[test]
    fn copies_template_into_src() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "01_Average.huff", "#define macro MAIN() = {}");

        let copied = copy_template(dir.path(), &level(), SolutionType::Huff, |_| Ok(true))
            .unwrap()
            .unwrap();
        assert_eq!(copied, dir.path().join("src").join("01_Average.huff"));
        assert_eq!(fs::read_to_string(copied).unwrap(), "#define macro MAIN() = {}");
    }

    #[test]
    fn declining_overwrite_keeps_existing_file() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "01_Average.sol", "template");
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("01_Average.sol"), "mine").unwrap();

        let copied = copy_template(dir.path(), &level(), SolutionType::Sol, |_| Ok(false)).unwrap();
        assert!(copied.is_none());
        assert_eq!(
            fs::read_to_string(dir.path().join("src").join("01_Average.sol")).unwrap(),
            "mine"
        );
    }

    #[test]
    fn missing_template_is_an_error() {
        let dir = tempdir().unwrap();
        let err = copy_template(dir.path(), &level(), SolutionType::Vyper, |_| Ok(true)).unwrap_err();
        assert!(err.to_string().contains("No vy template"));
    }
}

// `init`: create the config directory, clone the levels repository and
// write the config file. Safe to run again; an existing identity is kept.

use crate::config::Config;
use crate::error::CliError;
use crate::toolchain::{Invocation, ToolRunner};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const LEVELS_REPO: &str = "https://github.com/ethernautdao/evm-runners-levels.git";

/// Config to write during init: the existing one when present, otherwise a
/// fresh one pointing at the default levels checkout.
pub fn initial_config(config_dir: &Path, config_path: &Path) -> Result<Config> {
    match Config::load_from(config_path) {
        Ok(mut config) => {
            if config.levels_dir.as_os_str().is_empty() {
                config.levels_dir = Config::new_in(config_dir).levels_dir;
            }
            Ok(config)
        }
        Err(e) if matches!(e.downcast_ref::<CliError>(), Some(CliError::NotInitialized(_))) => {
            Ok(Config::new_in(config_dir))
        }
        Err(e) => Err(e),
    }
}

pub fn clone_levels(runner: &dyn ToolRunner, config_dir: &Path, levels_dir: &Path) -> Result<()> {
    let invocation = Invocation::new("git", config_dir)
        .args(["clone", "--recurse-submodules", LEVELS_REPO])
        .arg(levels_dir.to_string_lossy())
        .inherit_stdio();
    let output = runner.run(&invocation)?;
    if !output.success {
        anyhow::bail!("Failed to clone {} (exit code {:?})", LEVELS_REPO, output.code);
    }
    Ok(())
}

pub fn run(runner: &dyn ToolRunner) -> Result<()> {
    println!("Initializing evm-runners ...\n");

    let config_dir = Config::config_dir();
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    let config_path = Config::default_path();
    let config = initial_config(&config_dir, &config_path)?;

    if config.levels_dir.is_dir() {
        println!(
            "Levels directory {} already exists. Run 'evm-runners update' to pull the latest levels.",
            config.levels_dir.display()
        );
    } else {
        clone_levels(runner, &config_dir, &config.levels_dir)?;
        println!("\nevm-runners levels cloned into {}", config.levels_dir.display());
    }

    config.save_to(&config_path)?;
    println!("Config written to {}\n", config_path.display());
    println!("Next steps:");
    println!("  evm-runners auth discord    link your Discord account");
    println!("  evm-runners levels          browse the levels");
    println!("  evm-runners start <level>   start solving a level");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ProcessOutput;
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Invocation>>);

    impl ToolRunner for Recorder {
        fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
            self.0.borrow_mut().push(invocation.clone());
            Ok(ProcessOutput { success: true, code: Some(0), ..ProcessOutput::default() })
        }
    }

    #[test]
    fn fresh_install_uses_default_levels_dir() {
        let dir = tempdir().unwrap();
        let config = initial_config(dir.path(), &dir.path().join(".env")).unwrap();
        assert_eq!(config.levels_dir, dir.path().join("evm-runners-levels"));
        assert!(config.token.is_empty());
    }

    #[test]
    fn rerun_keeps_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut existing = Config::new_in(dir.path());
        existing.token = "tok".into();
        existing.user_name = "kyre".into();
        existing.save_to(&path).unwrap();

        let config = initial_config(dir.path(), &path).unwrap();
        assert_eq!(config.token, "tok");
        assert_eq!(config.user_name, "kyre");
    }

    #[test]
    fn clone_streams_git_output() {
        let dir = tempdir().unwrap();
        let runner = Recorder::default();
        let target = dir.path().join("levels");
        clone_levels(&runner, dir.path(), &target).unwrap();

        let calls = runner.0.borrow();
        assert_eq!(calls[0].program, "git");
        assert!(calls[0].inherit_stdio);
        assert_eq!(calls[0].args.first().map(String::as_str), Some("clone"));
        assert!(calls[0].args.contains(&LEVELS_REPO.to_string()));
        assert_eq!(calls[0].args.last().map(String::as_str), target.to_str());
    }
}

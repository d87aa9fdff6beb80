// `update`: pull the latest levels into the existing checkout.

use crate::config::Config;
use crate::toolchain::{Invocation, ToolRunner};
use anyhow::Result;

pub fn run(config: &Config, runner: &dyn ToolRunner) -> Result<()> {
    let levels_dir = config.require_levels_dir()?;

    println!("Updating evm-runners levels...\n");
    let output = runner.run(&Invocation::new("git", levels_dir).arg("pull").inherit_stdio())?;
    if !output.success {
        anyhow::bail!(
            "Failed to update the levels directory {} (exit code {:?})",
            levels_dir.display(),
            output.code
        );
    }
    println!("\nDone!");
    Ok(())
}

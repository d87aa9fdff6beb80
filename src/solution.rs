// Solution handling: bytecode validation, working out which language a
// level was solved in, and compiling it down to bytecode.

use crate::error::CliError;
use crate::levels::Level;
use crate::toolchain::{Invocation, ToolRunner};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const SOLUTION_DIR: &str = "src";
pub const TEMPLATE_DIR: &str = "template";

/// Language a submission was produced from. The `Display` form is the tag
/// the server expects in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionType {
    Sol,
    Huff,
    Vyper,
    Bytecode,
}

impl SolutionType {
    /// Source languages, in the order solution files are looked up.
    pub const SOURCES: [SolutionType; 3] = [SolutionType::Sol, SolutionType::Huff, SolutionType::Vyper];

    /// Parse a `--lang` value.
    pub fn from_flag(flag: &str) -> Result<Self, CliError> {
        match flag.trim().to_lowercase().as_str() {
            "sol" | "solidity" => Ok(SolutionType::Sol),
            "huff" => Ok(SolutionType::Huff),
            "vy" | "vyper" => Ok(SolutionType::Vyper),
            _ => Err(CliError::InvalidLanguage(flag.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            SolutionType::Sol => "sol",
            SolutionType::Huff => "huff",
            SolutionType::Vyper => "vy",
            SolutionType::Bytecode => "bytecode",
        }
    }

    pub fn extension(self) -> Option<&'static str> {
        match self {
            SolutionType::Sol => Some("sol"),
            SolutionType::Huff => Some("huff"),
            SolutionType::Vyper => Some("vy"),
            SolutionType::Bytecode => None,
        }
    }

    /// Test contract a player can run by hand to debug their solution.
    pub fn user_test_contract(self, level: &Level) -> String {
        match self {
            SolutionType::Sol => format!("{}TestSol", level.contract),
            SolutionType::Huff => format!("{}TestHuff", level.contract),
            SolutionType::Vyper => format!("{}TestVyper", level.contract),
            SolutionType::Bytecode => level.test_contract(),
        }
    }
}

impl fmt::Display for SolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Trim, strip one optional `0x`, check for non-empty even-length hex and
/// return it with exactly one `0x` prefix.
pub fn validate_bytecode(raw: &str) -> Result<String, CliError> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if body.is_empty() {
        return Err(CliError::InvalidBytecode("bytecode is empty".into()));
    }
    if body.len() % 2 != 0 {
        return Err(CliError::InvalidBytecode(format!(
            "odd length ({} hex characters)",
            body.len()
        )));
    }
    hex::decode(body).map_err(|e| CliError::InvalidBytecode(e.to_string()))?;

    Ok(format!("0x{}", body))
}

pub fn solution_path(levels_dir: &Path, file: &str, lang: SolutionType) -> Option<PathBuf> {
    lang.extension()
        .map(|ext| levels_dir.join(SOLUTION_DIR).join(format!("{}.{}", file, ext)))
}

pub fn template_path(levels_dir: &Path, file: &str, lang: SolutionType) -> Option<PathBuf> {
    lang.extension()
        .map(|ext| levels_dir.join(TEMPLATE_DIR).join(format!("{}.{}", file, ext)))
}

/// Decide which solution file to build for `file`.
///
/// With a `--lang` flag the matching file must exist. Without one there
/// must be exactly one solution file across the supported languages.
pub fn resolve_solution_type(
    levels_dir: &Path,
    file: &str,
    lang_flag: Option<&str>,
) -> Result<SolutionType, CliError> {
    let src_dir = levels_dir.join(SOLUTION_DIR);

    if let Some(flag) = lang_flag.filter(|f| !f.trim().is_empty()) {
        let lang = SolutionType::from_flag(flag)?;
        let exists = solution_path(levels_dir, file, lang).is_some_and(|p| p.is_file());
        if !exists {
            return Err(CliError::SolutionFileNotFound {
                lang: lang.tag().to_string(),
                dir: src_dir,
            });
        }
        return Ok(lang);
    }

    let found: Vec<SolutionType> = SolutionType::SOURCES
        .into_iter()
        .filter(|lang| solution_path(levels_dir, file, *lang).is_some_and(|p| p.is_file()))
        .collect();

    match found.as_slice() {
        [] => Err(CliError::NoSolutionFile(src_dir)),
        [only] => Ok(*only),
        many => Err(CliError::AmbiguousSolution(
            many.iter().map(|l| l.tag()).collect::<Vec<_>>().join(", "),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct ForgeArtifact {
    bytecode: ArtifactBytecode,
}

#[derive(Debug, Deserialize)]
struct ArtifactBytecode {
    object: String,
}

/// Compile the solution for `level` in language `lang` and return validated
/// bytecode.
pub fn compile(
    runner: &dyn ToolRunner,
    levels_dir: &Path,
    level: &Level,
    lang: SolutionType,
) -> Result<String> {
    let raw = match lang {
        SolutionType::Sol => {
            run_compiler(runner, Invocation::new("forge", levels_dir).arg("build"))?;

            let artifact_path = levels_dir
                .join("out")
                .join(format!("{}.sol", level.file))
                .join(format!("{}.json", level.contract));
            let data = fs::read_to_string(&artifact_path)
                .with_context(|| format!("Failed to read build artifact {}", artifact_path.display()))?;
            let artifact: ForgeArtifact = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse build artifact {}", artifact_path.display()))?;
            artifact.bytecode.object
        }
        SolutionType::Huff => run_compiler(
            runner,
            Invocation::new("huffc", levels_dir)
                .arg(source_arg(level, lang))
                .arg("--bytecode"),
        )?,
        SolutionType::Vyper => run_compiler(
            runner,
            Invocation::new("vyper", levels_dir).arg(source_arg(level, lang)),
        )?,
        SolutionType::Bytecode => {
            anyhow::bail!("Raw bytecode solutions have nothing to compile")
        }
    };

    Ok(validate_bytecode(&raw)?)
}

// Path of the solution relative to the levels dir, as compilers are run
// from there.
fn source_arg(level: &Level, lang: SolutionType) -> String {
    let ext = lang.extension().unwrap_or_default();
    Path::new(SOLUTION_DIR)
        .join(format!("{}.{}", level.file, ext))
        .to_string_lossy()
        .into_owned()
}

fn run_compiler(runner: &dyn ToolRunner, invocation: Invocation) -> Result<String> {
    let output = runner.run(&invocation)?;
    if !output.success {
        return Err(CliError::BuildFailed(output.combined()).into());
    }
    Ok(output.stdout)
}

/// Bytecode and language for a validation or submission run. Supplied
/// bytecode skips compilation entirely.
pub fn bytecode_for(
    runner: &dyn ToolRunner,
    levels_dir: &Path,
    level: &Level,
    bytecode: Option<&str>,
    lang_flag: Option<&str>,
) -> Result<(String, SolutionType)> {
    if let Some(raw) = bytecode {
        return Ok((validate_bytecode(raw)?, SolutionType::Bytecode));
    }

    let lang = resolve_solution_type(levels_dir, &level.file, lang_flag)?;
    tracing::info!(level = %level.contract, %lang, "compiling solution");
    let code = compile(runner, levels_dir, level, lang)?;
    Ok((code, lang))
}

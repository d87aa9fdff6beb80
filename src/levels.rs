// Level catalog loaded from `levels.toml` in the levels checkout.

use crate::error::CliError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const LEVELS_FILE: &str = "levels.toml";

/// One puzzle as declared in the manifest. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Level {
    pub id: String,
    /// File stem of the solution, template and test files.
    pub file: String,
    pub contract: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Level {
    /// Forge test contract that scores any solution for this level.
    pub fn test_contract(&self) -> String {
        format!("{}TestBase", self.contract)
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    levels: Vec<Level>,
}

/// Load the manifest, keyed by lower-cased contract name. Later entries with
/// the same name replace earlier ones.
pub fn load_levels(levels_dir: &Path) -> Result<HashMap<String, Level>> {
    if !levels_dir.is_dir() {
        return Err(CliError::LevelsDirMissing(levels_dir.to_path_buf()).into());
    }

    let path = levels_dir.join(LEVELS_FILE);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read levels manifest {}", path.display()))?;
    parse_levels(&raw).with_context(|| {
        format!(
            "Failed to parse {}. Try running 'evm-runners init' again!",
            path.display()
        )
    })
}

pub fn parse_levels(raw: &str) -> Result<HashMap<String, Level>> {
    let manifest: Manifest = toml::from_str(raw)?;
    Ok(manifest
        .levels
        .into_iter()
        .map(|level| (level.contract.to_lowercase(), level))
        .collect())
}

pub fn find_level<'a>(levels: &'a HashMap<String, Level>, name: &str) -> Result<&'a Level, CliError> {
    levels
        .get(&name.to_lowercase())
        .ok_or_else(|| CliError::InvalidLevel(name.to_string()))
}

/// Levels in display order: numeric ids ascending, anything else after them
/// in string order.
pub fn sorted_levels(levels: &HashMap<String, Level>) -> Vec<&Level> {
    let mut sorted: Vec<&Level> = levels.values().collect();
    sorted.sort_by(|a, b| {
        let key = |l: &Level| l.id.parse::<u64>().map_err(|_| l.id.clone());
        match (key(a), key(b)) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(x), Err(y)) => x.cmp(&y),
        }
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[[levels]]
id = "10"
file = "10_Sqrt"
contract = "Sqrt"
type = "Math"
description = "Compute the integer square root."

[[levels]]
id = "2"
file = "02_Average"
contract = "Average"
type = "Math"
description = """Return the average
of two numbers."""
"#;

    #[test]
    fn keys_are_lowercase_contract_names() {
        let levels = parse_levels(MANIFEST).unwrap();
        assert_eq!(levels.len(), 2);
        let level = find_level(&levels, "AVERAGE").unwrap();
        assert_eq!(level.file, "02_Average");
        assert_eq!(level.kind, "Math");
        assert_eq!(level.test_contract(), "AverageTestBase");
        assert!(matches!(
            find_level(&levels, "nope"),
            Err(CliError::InvalidLevel(name)) if name == "nope"
        ));
    }

    #[test]
    fn sorted_by_numeric_id() {
        let levels = parse_levels(MANIFEST).unwrap();
        let ids: Vec<&str> = sorted_levels(&levels).iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "10"]);
    }

    #[test]
    fn missing_field_is_rejected() {
        let raw = "[[levels]]\nid = \"1\"\nfile = \"01\"\ncontract = \"A\"\n";
        assert!(parse_levels(raw).is_err());
    }

    #[test]
    fn missing_directory_reports_init() {
        let dir = tempdir().unwrap();
        let err = load_levels(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::LevelsDirMissing(_))
        ));
    }

    #[test]
    fn loads_manifest_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("levels.toml"), MANIFEST).unwrap();
        let levels = load_levels(dir.path()).unwrap();
        assert!(levels.contains_key("sqrt"));
    }
}

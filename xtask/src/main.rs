use anyhow::Context;
use clap::{Parser, Subcommand};
use compatkit_types::app::AppSnapshot;
use compatkit_types::schema::{COMPATKIT_BUILD_V1, COMPATKIT_SNAPSHOT_V1};
use fs_err as fs;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print schema identifiers used by compatkit.
    PrintSchemas,
    /// Bless golden fixtures (overwrite expected outputs).
    BlessFixtures,
    /// Check that every fixture snapshot parses and carries a known schema.
    CheckFixtures {
        #[arg(long, default_value = "tests/fixtures")]
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            println!("{COMPATKIT_BUILD_V1}");
            println!("{COMPATKIT_SNAPSHOT_V1}");
        }
        Command::BlessFixtures => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "compatkit-core", "--test", "golden_fixtures"])
                .env("COMPATKIT_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                anyhow::bail!("bless-fixtures failed");
            }
        }
        Command::CheckFixtures { dir } => {
            let checked = check_fixtures(&dir)?;
            println!("checked {checked} fixture snapshot(s) under {}", dir.display());
        }
    }
    Ok(())
}

fn check_fixtures(dir: &Path) -> anyhow::Result<usize> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.join("app.json").is_file())
        .collect();
    entries.sort();

    for fixture in &entries {
        let path = fixture.join("app.json");
        let text = fs::read_to_string(&path)?;
        let snapshot: AppSnapshot = serde_json::from_str(&text)
            .with_context(|| format!("parse {}", path.display()))?;
        if snapshot.schema != COMPATKIT_SNAPSHOT_V1 {
            anyhow::bail!("{}: unknown schema {}", path.display(), snapshot.schema);
        }
    }
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(root: &Path, name: &str, body: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("app.json"), body).unwrap();
    }

    const MINIMAL: &str = r#"{
        "package": { "name": "demo" },
        "environment": "development",
        "appRoot": "/w/demo/app",
        "configPath": "/w/demo/config/environment"
    }"#;

    #[test]
    fn counts_valid_fixtures() {
        let temp = tempfile::tempdir().unwrap();
        write_fixture(temp.path(), "a", MINIMAL);
        write_fixture(temp.path(), "b", MINIMAL);
        std::fs::create_dir_all(temp.path().join("not-a-fixture")).unwrap();
        assert_eq!(check_fixtures(temp.path()).unwrap(), 2);
    }

    #[test]
    fn rejects_unknown_schema() {
        let temp = tempfile::tempdir().unwrap();
        let body = MINIMAL.replacen('{', r#"{ "schema": "compatkit.snapshot.v9","#, 1);
        write_fixture(temp.path(), "a", &body);
        let err = check_fixtures(temp.path()).unwrap_err();
        assert!(err.to_string().contains("compatkit.snapshot.v9"));
    }

    #[test]
    fn rejects_malformed_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        write_fixture(temp.path(), "a", r#"{ "package": {} }"#);
        assert!(check_fixtures(temp.path()).is_err());
    }
}

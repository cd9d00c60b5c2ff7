use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const MAX_ENTRIES: usize = 500;

/// Diagnostics go to stderr; stdout is reserved for prompts and `--json`.
/// `RUST_LOG` overrides the level picked from `--debug`.
pub fn init(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|err| anyhow!("invalid log filter: {err}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false).compact())
        .try_init()
        .map_err(|err| anyhow!("unable to install logger: {err}"))
}

#[derive(Debug, Serialize)]
pub struct ChangeLogEntry<'a> {
    pub timestamp: &'a str,
    pub source: &'a Path,
    pub target: &'a Path,
    pub action: &'a str,
}

/// Append-only JSONL record of every link this tool created or replaced.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    path: PathBuf,
}

impl ChangeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn record(&self, source: &Path, target: &Path, action: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".into());
        let entry = ChangeLogEntry {
            timestamp: &timestamp,
            source,
            target,
            action,
        };
        let json = serde_json::to_string(&entry)?;
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(file, "{json}")?;
        truncate_log(&self.path, MAX_ENTRIES)
    }
}

fn truncate_log(path: &Path, max_entries: usize) -> Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let reader = BufReader::new(file);
    let lines: Vec<_> = reader.lines().collect::<Result<_, _>>()?;
    if lines.len() <= max_entries {
        return Ok(());
    }
    let keep = &lines[lines.len() - max_entries..];
    fs::write(path, keep.join("\n") + "\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    #[test]
    fn records_one_json_line_per_change() {
        let temp = tempdir().expect("temp dir");
        let log = ChangeLog::new(temp.path().join("logs").join("changes.jsonl"));
        log.record(Path::new("/src/.bashrc"), Path::new("/home/.bashrc"), "created")
            .unwrap();
        log.record(Path::new("/src/.vimrc"), Path::new("/home/.vimrc"), "replaced")
            .unwrap();

        let text = fs::read_to_string(temp.path().join("logs").join("changes.jsonl")).unwrap();
        let rows: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["target"], "/home/.bashrc");
        assert_eq!(rows[1]["action"], "replaced");
        assert!(rows[0]["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn truncation_keeps_newest_entries() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("log.jsonl");
        let body: String = (0..10).map(|n| format!("{n}\n")).collect();
        fs::write(&path, body).expect("seed log");

        truncate_log(&path, 3).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "7\n8\n9\n");
    }
}

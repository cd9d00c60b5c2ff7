use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::config::Config;
use crate::engine::{Outcome, Reconciler};
use crate::error::{FsOp, LinkError};
use crate::fsops::LinkFs;
use crate::logging::ChangeLog;
use crate::mapper;
use crate::prompt::Confirm;
use crate::walk;

/// One line of a run's result, in walk order.
#[derive(Debug)]
pub struct EntryReport {
    pub source: PathBuf,
    /// `None` when the source path could not be mapped.
    pub target: Option<PathBuf>,
    pub outcome: Outcome,
}

/// Walks the source tree and reconciles every regular file. Only an
/// unreadable source root aborts; every other failure is recorded against
/// its entry and the walk moves on.
pub fn link_tree(
    config: &Config,
    fs: &dyn LinkFs,
    confirm: &mut dyn Confirm,
    change_log: Option<&ChangeLog>,
) -> Result<Vec<EntryReport>> {
    let mut reconciler = Reconciler::new(fs, confirm).with_diff_preview(config.show_diff);
    let mut reports = Vec::new();

    for item in walk::source_files(&config.source_root, &config.walk) {
        let source = match item {
            Ok(path) => path,
            Err(err) if err.depth() == 0 => {
                return Err(anyhow!(
                    "unable to read source root {}: {err}",
                    config.source_root.display()
                ));
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| config.source_root.clone());
                let report = EntryReport {
                    outcome: Outcome::Failed(LinkError::fs(FsOp::Read, &path, err.into())),
                    source: path,
                    target: None,
                };
                emit(config, &report);
                reports.push(report);
                continue;
            }
        };

        let mapped = mapper::map_to_target(&source, &config.source_root, &config.target_root);
        let report = match mapped {
            Ok(target) => {
                let outcome = reconciler.reconcile(&source, &target);
                EntryReport {
                    source,
                    target: Some(target),
                    outcome,
                }
            }
            Err(err) => EntryReport {
                source,
                target: None,
                outcome: Outcome::Failed(err),
            },
        };

        if let (Some(log), Some(target)) = (change_log, &report.target) {
            if report.outcome.is_mutation() && !config.dry_run {
                if let Err(err) = log.record(&report.source, target, report.outcome.label()) {
                    tracing::warn!(error = %err, "unable to write change log");
                }
            }
        }

        emit(config, &report);
        reports.push(report);
    }

    Ok(reports)
}

fn emit(config: &Config, report: &EntryReport) {
    if config.json {
        println!("{}", json_event(report, config.dry_run));
        return;
    }
    let prefix = if config.dry_run { "dry-run: " } else { "" };
    let target = report
        .target
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "?".into());
    match &report.outcome {
        Outcome::AlreadyCorrect => {}
        Outcome::Failed(err) => eprintln!("{prefix}failed {}: {err}", report.source.display()),
        outcome => println!(
            "{prefix}{} {target} -> {}",
            outcome.label(),
            report.source.display()
        ),
    }
}

pub fn json_event(report: &EntryReport, dry_run: bool) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert("source".into(), json!(report.source.display().to_string()));
    map.insert(
        "target".into(),
        json!(report.target.as_ref().map(|path| path.display().to_string())),
    );
    map.insert("outcome".into(), json!(report.outcome.label()));
    map.insert("dry_run".into(), json!(dry_run));
    if let Outcome::Failed(err) = &report.outcome {
        map.insert(
            "error".into(),
            json!({ "kind": err.kind(), "message": err.to_string() }),
        );
    }
    JsonValue::Object(map)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub created: usize,
    pub already_correct: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn tally(reports: &[EntryReport]) -> Self {
        let mut stats = Self::default();
        for report in reports {
            match report.outcome {
                Outcome::Created => stats.created += 1,
                Outcome::AlreadyCorrect => stats.already_correct += 1,
                Outcome::Replaced => stats.replaced += 1,
                Outcome::SkippedByUser => stats.skipped += 1,
                Outcome::Failed(_) => stats.failed += 1,
            }
        }
        stats
    }

    pub fn print(&self, dry_run: bool) {
        let label = if dry_run { "dry-run link" } else { "link" };
        println!(
            "{label} summary: created={}, already-correct={}, replaced={}, skipped={}, failed={}",
            self.created, self.already_correct, self.replaced, self.skipped, self.failed
        );
    }
}

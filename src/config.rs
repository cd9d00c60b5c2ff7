use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

use crate::Cli;
use crate::walk::{self, WalkFilter};

pub const ENV_PWD: &str = "PWD";
pub const ENV_HOME: &str = "HOME";

/// Settings for one run, built once from flags and environment and then
/// passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub dry_run: bool,
    pub force: bool,
    pub debug: bool,
    pub json: bool,
    pub show_diff: bool,
    pub walk: WalkFilter,
    pub change_log: Option<PathBuf>,
}

impl Config {
    /// Fills unset roots from `$PWD` / `$HOME` via `env`.
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let source_root = default_path(cli.source.as_deref(), ENV_PWD, &env)?;
        let target_root = default_path(cli.target.as_deref(), ENV_HOME, &env)?;

        Ok(Self {
            source_root,
            target_root,
            dry_run: cli.dry_run,
            force: cli.force,
            debug: cli.debug,
            json: cli.json,
            show_diff: cli.show_diff,
            walk: WalkFilter {
                include_vcs: cli.include_vcs,
                exclude: walk::build_exclude_globs(&cli.exclude)?,
            },
            change_log: cli.change_log.clone(),
        })
    }

    /// Canonicalizes both roots. A missing or non-directory root, or a target
    /// inside the source tree, makes the whole run meaningless.
    pub fn verify(mut self) -> Result<Self> {
        self.source_root = canonical_dir(&self.source_root, "source")?;
        self.target_root = canonical_dir(&self.target_root, "target")?;
        if self.target_root.starts_with(&self.source_root) {
            bail!(
                "target {} is inside source {}",
                self.target_root.display(),
                self.source_root.display()
            );
        }
        Ok(self)
    }

    pub fn log_debug(&self) {
        tracing::debug!(value = ?std::env::var_os(ENV_PWD), "ENV $PWD");
        tracing::debug!(value = ?std::env::var_os(ENV_HOME), "ENV $HOME");
        tracing::debug!(value = %self.source_root.display(), "ARG source");
        tracing::debug!(value = %self.target_root.display(), "ARG target");
        tracing::debug!(value = self.dry_run, "ARG dry-run");
        tracing::debug!(value = self.force, "ARG force");
        tracing::debug!(value = self.debug, "ARG debug");
        tracing::debug!(value = self.json, "ARG json");
        tracing::debug!(value = self.show_diff, "ARG show-diff");
        tracing::debug!(value = self.walk.include_vcs, "ARG include-vcs");
        tracing::debug!(value = ?self.change_log, "ARG change-log");
    }
}

fn default_path<F>(explicit: Option<&Path>, var: &str, env: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    env(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("${var} is not set; pass the path explicitly"))
}

fn canonical_dir(path: &Path, role: &str) -> Result<PathBuf> {
    let canonical = fs::canonicalize(path)
        .with_context(|| format!("resolving {role} {}", path.display()))?;
    if !canonical.is_dir() {
        bail!("{role} {} is not a directory", canonical.display());
    }
    Ok(canonical)
}

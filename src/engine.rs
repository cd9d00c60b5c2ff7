use std::fmt;
use std::path::Path;

use crate::diff;
use crate::error::{FsOp, LinkError};
use crate::fsops::LinkFs;
use crate::prompt::Confirm;
use crate::state::{self, TargetState};

/// Result of reconciling one source file.
#[derive(Debug)]
pub enum Outcome {
    Created,
    AlreadyCorrect,
    Replaced,
    SkippedByUser,
    Failed(LinkError),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::AlreadyCorrect => "already-correct",
            Outcome::Replaced => "replaced",
            Outcome::SkippedByUser => "skipped",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::Replaced)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(err) => write!(f, "failed: {err}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Decides and performs the action for one (source, target) pair.
///
/// Mutations go through `fs` and destructive actions through `confirm`, so
/// the decision table is the same for interactive, forced and dry runs.
pub struct Reconciler<'a> {
    fs: &'a dyn LinkFs,
    confirm: &'a mut dyn Confirm,
    show_diff: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(fs: &'a dyn LinkFs, confirm: &'a mut dyn Confirm) -> Self {
        Self {
            fs,
            confirm,
            show_diff: false,
        }
    }

    pub fn with_diff_preview(mut self, enabled: bool) -> Self {
        self.show_diff = enabled;
        self
    }

    pub fn reconcile(&mut self, source: &Path, target: &Path) -> Outcome {
        let state = match state::classify(source, target) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(
                    source = %source.display(),
                    target = %target.display(),
                    error = %err,
                    "unable to classify target"
                );
                return Outcome::Failed(err);
            }
        };

        let outcome = match self.act(&state, source, target) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed(err),
        };
        observe(source, target, &state, &outcome);
        outcome
    }

    fn act(
        &mut self,
        state: &TargetState,
        source: &Path,
        target: &Path,
    ) -> Result<Outcome, LinkError> {
        match state {
            TargetState::Absent => {
                self.create_link(source, target)?;
                Ok(Outcome::Created)
            }
            TargetState::SymlinkCorrect => Ok(Outcome::AlreadyCorrect),
            TargetState::SymlinkIncorrect {
                points_to,
                dangling,
            } => {
                let missing = if *dangling { " (missing)" } else { "" };
                let message = format!(
                    "{}: existing symlink points to {}{missing}, replace with new symlink?",
                    target.display(),
                    points_to.display()
                );
                if !self.confirm.confirm(&message) {
                    return Ok(Outcome::SkippedByUser);
                }
                self.remove(target)?;
                self.create_link(source, target)?;
                Ok(Outcome::Replaced)
            }
            TargetState::RegularDifferent | TargetState::RegularIdentical => {
                let message = if *state == TargetState::RegularIdentical {
                    format!(
                        "{}: existing file is identical, replace with symlink?",
                        target.display()
                    )
                } else {
                    if self.show_diff {
                        self.confirm.show(&diff::preview(target, source));
                    }
                    format!(
                        "{}: existing file differs, replace with symlink anyway?",
                        target.display()
                    )
                };
                if !self.confirm.confirm(&message) {
                    return Ok(Outcome::SkippedByUser);
                }
                self.remove(target)?;
                self.fs
                    .symlink(source, target)
                    .map_err(|err| LinkError::fs(FsOp::Symlink, target, err))?;
                Ok(Outcome::Replaced)
            }
            TargetState::Other { kind } => Err(LinkError::UnsupportedTargetType {
                path: target.to_path_buf(),
                kind: *kind,
            }),
        }
    }

    fn create_link(&self, source: &Path, target: &Path) -> Result<(), LinkError> {
        if let Some(parent) = target.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|err| LinkError::fs(FsOp::CreateDir, parent, err))?;
        }
        self.fs
            .symlink(source, target)
            .map_err(|err| LinkError::fs(FsOp::Symlink, target, err))
    }

    fn remove(&self, target: &Path) -> Result<(), LinkError> {
        self.fs
            .remove(target)
            .map_err(|err| LinkError::fs(FsOp::Remove, target, err))
    }
}

fn observe(source: &Path, target: &Path, state: &TargetState, outcome: &Outcome) {
    let source = source.display();
    let target = target.display();
    match outcome {
        Outcome::Failed(err) => tracing::warn!(
            %source, %target, %state, outcome = outcome.label(), error = %err, "reconciled"
        ),
        Outcome::Created | Outcome::Replaced => tracing::info!(
            %source, %target, %state, outcome = outcome.label(), "reconciled"
        ),
        Outcome::AlreadyCorrect | Outcome::SkippedByUser => tracing::debug!(
            %source, %target, %state, outcome = outcome.label(), "reconciled"
        ),
    }
}

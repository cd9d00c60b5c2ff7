use std::io;
use std::path::{Path, PathBuf};

/// Per-entry failures. None of these abort a run; they become
/// `Outcome::Failed` for the entry that produced them.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("cannot map {path} against {root}: {reason}")]
    PathResolution {
        path: PathBuf,
        root: PathBuf,
        reason: &'static str,
    },

    #[error("{op} failed for {path}: {source}")]
    Filesystem {
        op: FsOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported target entry type ({kind}) at {path}")]
    UnsupportedTargetType { path: PathBuf, kind: &'static str },
}

impl LinkError {
    pub fn fs(op: FsOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn path_resolution(path: &Path, root: &Path) -> Self {
        Self::PathResolution {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
            reason: "not below the root",
        }
    }

    /// A mapped target that would land back inside the source tree.
    pub fn target_in_source(target: &Path, source_root: &Path) -> Self {
        Self::PathResolution {
            path: target.to_path_buf(),
            root: source_root.to_path_buf(),
            reason: "target lies inside the source tree",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LinkError::PathResolution { .. } => "path-resolution",
            LinkError::Filesystem { .. } => "filesystem",
            LinkError::UnsupportedTargetType { .. } => "unsupported-target-type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Lstat,
    Read,
    Remove,
    CreateDir,
    Symlink,
}

impl std::fmt::Display for FsOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FsOp::Lstat => "lstat",
            FsOp::Read => "read",
            FsOp::Remove => "remove",
            FsOp::CreateDir => "mkdir",
            FsOp::Symlink => "symlink",
        };
        f.write_str(label)
    }
}

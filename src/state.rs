use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::error::{FsOp, LinkError};

const COMPARE_CHUNK_BYTES: usize = 64 * 1024;

/// What currently occupies a target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetState {
    Absent,
    SymlinkCorrect,
    /// `points_to` is the resolved path, or the raw link text when the link
    /// dangles.
    SymlinkIncorrect { points_to: PathBuf, dangling: bool },
    RegularIdentical,
    RegularDifferent,
    Other { kind: &'static str },
}

impl TargetState {
    pub fn label(&self) -> &'static str {
        match self {
            TargetState::Absent => "absent",
            TargetState::SymlinkCorrect => "symlink-correct",
            TargetState::SymlinkIncorrect { .. } => "symlink-incorrect",
            TargetState::RegularIdentical => "regular-identical",
            TargetState::RegularDifferent => "regular-different",
            TargetState::Other { .. } => "other",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies `target` against `source` without following the final
/// component of `target`.
pub fn classify(source: &Path, target: &Path) -> Result<TargetState, LinkError> {
    let meta = match fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(TargetState::Absent),
        Err(err) => return Err(LinkError::fs(FsOp::Lstat, target, err)),
    };
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        return classify_symlink(source, target);
    }

    if file_type.is_file() {
        // A linked ancestor directory can make the target the source itself.
        if same_file(source, target) {
            return Ok(TargetState::SymlinkCorrect);
        }
        return if files_equal(source, target)? {
            Ok(TargetState::RegularIdentical)
        } else {
            Ok(TargetState::RegularDifferent)
        };
    }

    Ok(TargetState::Other {
        kind: describe_file_type(&meta.file_type()),
    })
}

fn classify_symlink(source: &Path, target: &Path) -> Result<TargetState, LinkError> {
    match fs::canonicalize(target) {
        Ok(resolved) if resolved == source => Ok(TargetState::SymlinkCorrect),
        Ok(resolved) => Ok(TargetState::SymlinkIncorrect {
            points_to: resolved,
            dangling: false,
        }),
        Err(_) => {
            let raw =
                fs::read_link(target).map_err(|err| LinkError::fs(FsOp::Lstat, target, err))?;
            Ok(TargetState::SymlinkIncorrect {
                points_to: raw,
                dangling: true,
            })
        }
    }
}

fn same_file(source: &Path, target: &Path) -> bool {
    match fs::canonicalize(target) {
        Ok(resolved) => resolved == source,
        Err(_) => false,
    }
}

/// Full byte comparison. Lengths are checked first; content is streamed in
/// fixed chunks so large files are never held in memory.
pub fn files_equal(lhs: &Path, rhs: &Path) -> Result<bool, LinkError> {
    let lhs_len = fs::metadata(lhs)
        .map_err(|err| LinkError::fs(FsOp::Read, lhs, err))?
        .len();
    let rhs_len = fs::metadata(rhs)
        .map_err(|err| LinkError::fs(FsOp::Read, rhs, err))?
        .len();
    if lhs_len != rhs_len {
        return Ok(false);
    }

    let mut lhs_file = File::open(lhs).map_err(|err| LinkError::fs(FsOp::Read, lhs, err))?;
    let mut rhs_file = File::open(rhs).map_err(|err| LinkError::fs(FsOp::Read, rhs, err))?;
    let mut lhs_buf = vec![0u8; COMPARE_CHUNK_BYTES];
    let mut rhs_buf = vec![0u8; COMPARE_CHUNK_BYTES];

    loop {
        let read = read_full(&mut lhs_file, &mut lhs_buf)
            .map_err(|err| LinkError::fs(FsOp::Read, lhs, err))?;
        let other = read_full(&mut rhs_file, &mut rhs_buf)
            .map_err(|err| LinkError::fs(FsOp::Read, rhs, err))?;
        if read != other || lhs_buf[..read] != rhs_buf[..other] {
            return Ok(false);
        }
        if read == 0 {
            return Ok(true);
        }
    }
}

fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(unix)]
fn describe_file_type(file_type: &fs::FileType) -> &'static str {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_dir() {
        "directory"
    } else if file_type.is_block_device() {
        "block device"
    } else if file_type.is_char_device() {
        "character device"
    } else if file_type.is_fifo() {
        "fifo"
    } else if file_type.is_socket() {
        "socket"
    } else {
        "unknown"
    }
}

#[cfg(not(unix))]
fn describe_file_type(file_type: &fs::FileType) -> &'static str {
    if file_type.is_dir() { "directory" } else { "unknown" }
}

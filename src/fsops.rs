use std::fs;
use std::io;
use std::path::Path;

/// The mutating half of reconciliation. Reads (lstat, canonicalize, content
/// comparison) always hit the real filesystem; only these calls are routed
/// through the capability so a dry run can swallow them.
pub trait LinkFs {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl LinkFs for RealFs {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        create_symlink(original, link)
    }
}

/// Accepts every mutation without touching the disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunFs;

impl LinkFs for DryRunFs {
    fn create_dir_all(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }

    fn remove(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn symlink(&self, _original: &Path, _link: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
fn create_symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn create_symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dry_run_leaves_disk_alone() {
        let temp = tempdir().expect("temp dir");
        let file = temp.path().join("keep.txt");
        fs::write(&file, "keep").expect("write file");

        DryRunFs.remove(&file).unwrap();
        DryRunFs.create_dir_all(&temp.path().join("a/b")).unwrap();
        DryRunFs.symlink(&file, &temp.path().join("link")).unwrap();

        assert!(file.exists());
        assert!(!temp.path().join("a").exists());
        assert!(fs::symlink_metadata(temp.path().join("link")).is_err());
    }

    #[test]
    fn real_fs_removes_symlink_not_its_target() {
        let temp = tempdir().expect("temp dir");
        let file = temp.path().join("data.txt");
        fs::write(&file, "data").expect("write file");
        let link = temp.path().join("link");
        RealFs.symlink(&file, &link).unwrap();

        RealFs.remove(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(file.exists());
    }
}

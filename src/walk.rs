use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Which parts of the source tree are considered for linking.
#[derive(Debug, Clone, Default)]
pub struct WalkFilter {
    pub include_vcs: bool,
    pub exclude: Option<GlobSet>,
}

impl WalkFilter {
    fn prune(&self, root: &Path, entry: &DirEntry) -> bool {
        if !self.include_vcs && entry.file_type().is_dir() && is_vcs_dir(entry) {
            return true;
        }
        let Some(set) = &self.exclude else {
            return false;
        };
        match entry.path().strip_prefix(root) {
            Ok(relative) => set.is_match(normalize_slashes(relative).as_str()),
            Err(_) => false,
        }
    }
}

/// Every regular file strictly below `root`, in file-name order per
/// directory. Symlinks are not followed and never yielded. Errors are passed
/// through with the path they concern so the caller can decide whether they
/// are fatal.
pub fn source_files<'a>(
    root: &'a Path,
    filter: &'a WalkFilter,
) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !filter.prune(root, entry))
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(entry) => {
                if !entry.file_type().is_dir() {
                    tracing::debug!(
                        path = %entry.path().display(),
                        "skipping non-regular source entry"
                    );
                }
                None
            }
            Err(err) => Some(Err(err)),
        })
}

/// Patterns match paths relative to the source root; `*` stays within one
/// path component, `**` crosses directories.
pub fn build_exclude_globs(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| anyhow!("invalid exclude glob '{pattern}': {err}"))?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| anyhow!("unable to build exclude globs: {err}"))
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| VCS_DIRS.contains(&name))
        .unwrap_or(false)
}

fn normalize_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    fn collect(root: &Path, filter: &WalkFilter) -> Vec<String> {
        source_files(root, filter)
            .map(|item| item.expect("walk entry"))
            .map(|path| normalize_slashes(path.strip_prefix(root).unwrap()))
            .collect()
    }

    fn tree() -> tempfile::TempDir {
        let temp = tempdir().expect("temp dir");
        let root = temp.path();
        for dir in [".git/objects", ".config/nvim", "bin"] {
            fs::create_dir_all(root.join(dir)).expect("create dir");
        }
        for file in [
            ".bashrc",
            ".git/HEAD",
            ".git/objects/ab",
            ".config/nvim/init.lua",
            "bin/tool",
            "README.md",
        ] {
            fs::write(root.join(file), file).expect("write file");
        }
        temp
    }

    #[test]
    fn yields_files_in_name_order_and_prunes_vcs() {
        let temp = tree();
        let files = collect(temp.path(), &WalkFilter::default());
        assert_eq!(
            files,
            vec![".bashrc", ".config/nvim/init.lua", "README.md", "bin/tool"]
        );
    }

    #[test]
    fn include_vcs_keeps_git_dir() {
        let temp = tree();
        let filter = WalkFilter {
            include_vcs: true,
            exclude: None,
        };
        let files = collect(temp.path(), &filter);
        assert!(files.contains(&".git/HEAD".to_string()));
        assert!(files.contains(&".git/objects/ab".to_string()));
    }

    #[test]
    fn exclude_globs_match_relative_paths() {
        let temp = tree();
        let filter = WalkFilter {
            include_vcs: false,
            exclude: build_exclude_globs(&["README.md".into(), ".config".into()]).unwrap(),
        };
        assert_eq!(collect(temp.path(), &filter), vec![".bashrc", "bin/tool"]);
    }

    #[test]
    fn star_stays_within_one_component() {
        let temp = tree();
        fs::create_dir_all(temp.path().join("docs")).expect("docs");
        fs::write(temp.path().join("docs/x.md"), "x").expect("docs/x.md");

        let top_only = WalkFilter {
            include_vcs: false,
            exclude: build_exclude_globs(&["*.md".into()]).unwrap(),
        };
        let files = collect(temp.path(), &top_only);
        assert!(!files.contains(&"README.md".to_string()));
        assert!(files.contains(&"docs/x.md".to_string()));

        let everywhere = WalkFilter {
            include_vcs: false,
            exclude: build_exclude_globs(&["**/*.md".into()]).unwrap(),
        };
        let files = collect(temp.path(), &everywhere);
        assert!(!files.iter().any(|path| path.ends_with(".md")));
    }

    #[test]
    fn empty_root_yields_nothing() {
        let temp = tempdir().expect("temp dir");
        assert!(collect(temp.path(), &WalkFilter::default()).is_empty());
    }

    #[test]
    fn invalid_glob_is_rejected() {
        assert!(build_exclude_globs(&["a[".into()]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn source_symlinks_are_skipped() {
        let temp = tree();
        std::os::unix::fs::symlink(temp.path().join("bin"), temp.path().join("bin-link"))
            .expect("dir link");
        std::os::unix::fs::symlink(temp.path().join(".bashrc"), temp.path().join("rc-link"))
            .expect("file link");
        let files = collect(temp.path(), &WalkFilter::default());
        assert!(!files.iter().any(|path| path.contains("link")));
    }
}

use std::path::{Component, Path, PathBuf};

use crate::error::LinkError;

/// Maps a file under `source_root` onto the same relative location under
/// `target_root`. Pure path arithmetic; nothing touches the filesystem.
///
/// When the source root sits inside the target root (`~/dotfiles` into `~`),
/// a nested directory named like the source root maps back into the source
/// tree. Such targets are rejected so no source file is ever replaced.
pub fn map_to_target(
    source_path: &Path,
    source_root: &Path,
    target_root: &Path,
) -> Result<PathBuf, LinkError> {
    let relative = relative_to(source_path, source_root)?;
    let target = target_root.join(relative);
    if target.starts_with(source_root) {
        return Err(LinkError::target_in_source(&target, source_root));
    }
    Ok(target)
}

/// Path of `path` below `root`. The root itself and anything that needs `..`
/// to reach are rejected.
pub fn relative_to<'a>(path: &'a Path, root: &Path) -> Result<&'a Path, LinkError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| LinkError::path_resolution(path, root))?;

    let escapes = relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)));
    if relative.as_os_str().is_empty() || escapes {
        return Err(LinkError::path_resolution(path, root));
    }

    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_nested_file() {
        let target = map_to_target(
            Path::new("/src/a/b.txt"),
            Path::new("/src"),
            Path::new("/tgt"),
        )
        .unwrap();
        assert_eq!(target, PathBuf::from("/tgt/a/b.txt"));
    }

    #[test]
    fn round_trip_preserves_relative_path() {
        let source_root = Path::new("/home/me/dotfiles");
        let target_root = Path::new("/home/me");
        for rel in [".bashrc", ".config/nvim/init.lua", "bin/tool"] {
            let source = source_root.join(rel);
            let target = map_to_target(&source, source_root, target_root).unwrap();
            assert_eq!(
                relative_to(&target, target_root).unwrap(),
                relative_to(&source, source_root).unwrap()
            );
        }
    }

    #[test]
    fn rejects_path_outside_root() {
        let err = map_to_target(
            Path::new("/elsewhere/file"),
            Path::new("/src"),
            Path::new("/tgt"),
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::PathResolution { .. }));
    }

    #[test]
    fn rejects_root_itself() {
        let err = map_to_target(Path::new("/src"), Path::new("/src"), Path::new("/tgt"))
            .unwrap_err();
        assert!(matches!(err, LinkError::PathResolution { .. }));
    }

    #[test]
    fn rejects_parent_components() {
        let err = map_to_target(
            Path::new("/src/../etc/passwd"),
            Path::new("/src"),
            Path::new("/tgt"),
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::PathResolution { .. }));
    }

    #[test]
    fn rejects_target_that_lands_in_source_tree() {
        let err = map_to_target(
            Path::new("/home/me/dotfiles/dotfiles/x"),
            Path::new("/home/me/dotfiles"),
            Path::new("/home/me"),
        )
        .unwrap_err();
        match err {
            LinkError::PathResolution { path, .. } => {
                assert_eq!(path, PathBuf::from("/home/me/dotfiles/x"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let sibling = map_to_target(
            Path::new("/home/me/dotfiles/dotfiles2/x"),
            Path::new("/home/me/dotfiles"),
            Path::new("/home/me"),
        )
        .unwrap();
        assert_eq!(sibling, PathBuf::from("/home/me/dotfiles2/x"));
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_inside() {
        assert!(relative_to(Path::new("/src2/file"), Path::new("/src")).is_err());
    }
}

//! Dockerfile discovery.

use std::path::{Path, PathBuf};

use imagesmith_core::error::{ImageError, Result};

/// File names ending with this suffix are Dockerfiles
/// (`Dockerfile`, `base.Dockerfile`, but not `Dockerfile.bak`).
pub const DOCKERFILE_SUFFIX: &str = "Dockerfile";

/// Find every Dockerfile nested under `root`.
///
/// Symlinked files are reported when they point at a regular file;
/// symlinked directories are not descended into. An unreadable directory
/// anywhere in the tree fails the whole walk. Result order is unspecified.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk_dir(root, &mut found)?;
    tracing::debug!(
        root = %root.display(),
        count = found.len(),
        "Discovered Dockerfiles"
    );
    Ok(found)
}

fn walk_dir(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| ImageError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ImageError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ImageError::io(&path, e))?;

        if file_type.is_dir() {
            walk_dir(&path, found)?;
        } else if is_dockerfile_name(&path) && is_regular_file(&path, file_type) {
            found.push(path);
        }
    }
    Ok(())
}

fn is_dockerfile_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(DOCKERFILE_SUFFIX))
        .unwrap_or(false)
}

fn is_regular_file(path: &Path, file_type: std::fs::FileType) -> bool {
    if file_type.is_symlink() {
        // Dangling links are not Dockerfiles.
        return std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    }
    file_type.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "ARG BASE_IMAGE=\"alpine:3\"\n").unwrap();
    }

    fn relative(root: &Path, found: Vec<PathBuf>) -> BTreeSet<String> {
        found
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_finds_only_dockerfiles() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "resources/a/1/Dockerfile");
        touch(tmp.path(), "resources/b/c/2/Dockerfile");
        touch(tmp.path(), "resources/d/3/base.Dockerfile");
        touch(tmp.path(), "resources/a/1/init.sql");
        touch(tmp.path(), "resources/a/README.md");

        let found = discover(tmp.path()).unwrap();
        assert_eq!(
            relative(tmp.path(), found),
            BTreeSet::from([
                "resources/a/1/Dockerfile".to_string(),
                "resources/b/c/2/Dockerfile".to_string(),
                "resources/d/3/base.Dockerfile".to_string(),
            ])
        );
    }

    #[test]
    fn test_suffix_must_be_at_end() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "x/Dockerfile.bak");
        touch(tmp.path(), "x/Dockerfile.j2");
        assert!(discover(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_directory_named_dockerfile_is_not_reported() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("Dockerfile")).unwrap();
        touch(tmp.path(), "Dockerfile/inner/Dockerfile");
        let found = relative(tmp.path(), discover(tmp.path()).unwrap());
        assert_eq!(found, BTreeSet::from(["Dockerfile/inner/Dockerfile".to_string()]));
    }

    #[test]
    fn test_empty_tree() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = discover(&missing).unwrap_err();
        match err {
            ImageError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_fails() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ok/1/Dockerfile");
        touch(tmp.path(), "locked/1/Dockerfile");
        let locked = tmp.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the directory anyway; nothing to assert then.
        let readable = std::fs::read_dir(&locked).is_ok();
        let result = discover(tmp.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert!(matches!(result, Err(ImageError::Io { .. })));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "real/1/Dockerfile");
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();
        let found = relative(tmp.path(), discover(tmp.path()).unwrap());
        assert_eq!(found, BTreeSet::from(["real/1/Dockerfile".to_string()]));
    }
}

//! Filesystem utilities.

use keysmith_types::Result;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Expand a leading tilde to the home directory.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Resolve `path` against `base` into a clean absolute path.
///
/// Purely lexical: `.` components are dropped and `..` pops the previous
/// component. The filesystem is never consulted, so the path need not exist.
pub fn normalize_path(base: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let path = expand_path(path);
    let joined = if path.is_absolute() {
        path
    } else {
        base.as_ref().join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root leaves the root in place
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Modification time of `path` in nanoseconds since the Unix epoch.
///
/// Returns `None` if the file does not exist, including when a regular file
/// sits where one of its parent directories should be.
pub fn modified_nanos(path: impl AsRef<Path>) -> Result<Option<u128>> {
    let path = path.as_ref();
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(_) if path.ancestors().skip(1).any(Path::is_file) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let modified = metadata.modified()?;
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Ok(Some(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_normalize_relative() {
        let p = normalize_path("/repo", "secrets/./web/../db.age");
        assert_eq!(p, PathBuf::from("/repo/secrets/db.age"));
    }

    #[test]
    fn test_normalize_absolute_ignores_base() {
        let p = normalize_path("/repo", "/etc/keys/../x.age");
        assert_eq!(p, PathBuf::from("/etc/x.age"));
    }

    #[test]
    fn test_normalize_cannot_escape_root() {
        let p = normalize_path("/", "../../x");
        assert_eq!(p, PathBuf::from("/x"));
    }

    #[test]
    fn test_modified_nanos_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(modified_nanos(dir.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn test_modified_nanos_below_a_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("secrets"), "not a directory").unwrap();
        assert_eq!(modified_nanos(dir.path().join("secrets/x.age")).unwrap(), None);
    }

    #[test]
    fn test_modified_nanos_reflects_set_modified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        let file = std::fs::File::create(&path).unwrap();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        file.set_modified(when).unwrap();

        assert_eq!(
            modified_nanos(&path).unwrap(),
            Some(Duration::from_secs(1_000).as_nanos())
        );
    }
}

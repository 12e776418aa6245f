//! Destination path resolution and timestamp lookup.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Expand a leading `~` or `~/` to the user's home directory.
///
/// Other paths, including `~name` forms, are returned unchanged, as is
/// everything when `HOME` is not set.
pub fn replace_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Make `path` absolute against the current directory and resolve `.` and
/// `..` lexically. Symlinks are not followed and nothing needs to exist.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(
                    cleaned.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    cleaned.pop();
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

/// Current modification time of `path`.
pub fn mod_time(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_home_leaves_plain_paths() {
        assert_eq!(replace_home(Path::new("a/b.txt")), PathBuf::from("a/b.txt"));
        assert_eq!(replace_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_home_expands_tilde() {
        if let Some(home) = home_dir() {
            assert_eq!(replace_home(Path::new("~/notes.txt")), home.join("notes.txt"));
            assert_eq!(replace_home(Path::new("~")), home);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_absolutize_cleans_components() {
        assert_eq!(
            absolutize(Path::new("/a/./b/../c.txt")).unwrap(),
            PathBuf::from("/a/c.txt")
        );
        assert_eq!(absolutize(Path::new("/../x")).unwrap(), PathBuf::from("/x"));
    }

    #[test]
    fn test_absolutize_relative_uses_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("file.txt")).unwrap(), cwd.join("file.txt"));
    }

    #[test]
    fn test_mod_time_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(mod_time(&dir.path().join("missing")).is_err());
    }
}

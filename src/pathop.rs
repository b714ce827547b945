//! Small path helpers shared by the gitignore filter and discovery code.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, symlink-free form.
///
/// Falls back to a purely lexical normalization when the path does not
/// exist, so queries about hypothetical paths still behave sensibly.
pub fn absolute(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => lexical_absolute(path),
    }
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let mut absolute = if path.is_absolute() {
        PathBuf::new()
    } else {
        env::current_dir().unwrap_or_default()
    };

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                absolute.pop();
            }
            other => absolute.push(other.as_os_str()),
        }
    }

    absolute
}

/// Render a relative path with forward slashes, for glob matching.
pub fn slashed(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(p) => Some(p.to_string_lossy()),
            _ => None,
        })
        .collect();

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_absolute_collapses_dots() {
        let path = Path::new("/a/b/../c/./d");
        assert_eq!(lexical_absolute(path), PathBuf::from("/a/c/d"));
    }

    #[test]
    fn test_slashed_joins_components() {
        assert_eq!(slashed(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(slashed(Path::new("c.txt")), "c.txt");
    }
}

use crate::error::{Result, YamlincError};
use globset::GlobBuilder;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Characters that turn a filesystem specifier into a glob pattern
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Reads the contents of a file at the given path
///
/// # Errors
///
/// - `YamlincError::FileNotFound` if the path doesn't exist or isn't a file.
/// - `YamlincError::Io` if there's an error reading the file.
pub async fn read_file_contents(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(YamlincError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(std::convert::Into::into)
}

/// Splits text into lines on `\n` or `\r\n`; a trailing newline does not yield an empty line
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Whether the specifier contains glob metacharacters
pub fn is_glob_pattern(specifier: &str) -> bool {
    specifier.contains(GLOB_META)
}

/// Resolves a specifier against the base directory and normalizes it lexically.
/// Absolute specifiers ignore the base directory.
pub fn resolve_path(specifier: &str, base_dir: &Path) -> PathBuf {
    normalize_path(&base_dir.join(specifier))
}

/// Removes `.` components and folds `..` into the preceding component without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Expands a filesystem glob relative to the base directory into matching files, in lexical order.
///
/// The walk starts at the longest directory prefix without metacharacters. `*` and `?`
/// never cross a separator; `**` matches any number of directories. Hidden entries are
/// only matched when the pattern itself names a dot-prefixed component.
///
/// # Errors
///
/// - `YamlincError::Glob` if the pattern is malformed.
/// - `YamlincError::WalkDir` if a directory below the prefix cannot be read.
pub fn expand_glob(pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>> {
    // Only the pattern is split; the base directory is always literal
    let mut literal = PathBuf::new();
    let mut tail: Vec<String> = Vec::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if tail.is_empty() && !is_glob_pattern(&text) {
            literal.push(component.as_os_str());
        } else {
            tail.push(text.into_owned());
        }
    }
    let root = normalize_path(&base_dir.join(&literal));

    if tail.is_empty() {
        return Ok(if root.is_file() { vec![root] } else { Vec::new() });
    }
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let matcher = GlobBuilder::new(&tail.join("/"))
        .literal_separator(true)
        .build()?
        .compile_matcher();
    let max_depth = if tail.iter().any(|segment| segment.contains("**")) {
        usize::MAX
    } else {
        tail.len()
    };
    let include_hidden = tail.iter().any(|segment| segment.starts_with('.'));

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            include_hidden
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        });

    let mut matches = Vec::new();
    for entry in walker {
        let entry = entry?;
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let relative = entry_path.strip_prefix(&root).unwrap_or(entry_path);
        if matcher.is_match(relative) {
            matches.push(entry_path.to_path_buf());
        }
    }
    matches.sort();

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_file_contents() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.yaml");

        fs::write(&file_path, "key: value\n").unwrap();
        let result = read_file_contents(&file_path).await;
        assert_eq!(result.unwrap(), "key: value\n");

        let non_existent = temp_dir.path().join("nonexistent.yaml");
        let result = read_file_contents(&non_existent).await;
        assert!(matches!(result, Err(YamlincError::FileNotFound { .. })));

        // Directories are not readable sources
        let dir_path = temp_dir.path().join("dir");
        fs::create_dir(&dir_path).unwrap();
        let result = read_file_contents(&dir_path).await;
        assert!(matches!(result, Err(YamlincError::FileNotFound { .. })));
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_is_glob_pattern() {
        assert!(is_glob_pattern("conf/*.yaml"));
        assert!(is_glob_pattern("a?.yaml"));
        assert!(is_glob_pattern("[ab].yaml"));
        assert!(is_glob_pattern("{a,b}.yaml"));
        assert!(!is_glob_pattern("conf/a.yaml"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/base/./sub/../a.yaml")),
            PathBuf::from("/base/a.yaml")
        );
        assert_eq!(normalize_path(Path::new("/../a.yaml")), PathBuf::from("/a.yaml"));
        assert_eq!(normalize_path(Path::new("../a.yaml")), PathBuf::from("../a.yaml"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/project/conf");
        assert_eq!(
            resolve_path("../shared/a.yaml", base),
            PathBuf::from("/project/shared/a.yaml")
        );
        assert_eq!(resolve_path("/etc/x.yaml", base), PathBuf::from("/etc/x.yaml"));
    }

    #[test]
    fn test_expand_glob_order() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("c.yaml"), "c").unwrap();
        fs::write(base.join("a.yaml"), "a").unwrap();
        fs::write(base.join("b.yaml"), "b").unwrap();
        fs::write(base.join("notes.txt"), "n").unwrap();

        let matches = expand_glob("*.yaml", base).unwrap();
        let names: Vec<_> = matches
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml", "c.yaml"]);
    }

    #[test]
    fn test_expand_glob_does_not_cross_directories() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("conf/nested")).unwrap();
        fs::write(base.join("conf/a.yaml"), "a").unwrap();
        fs::write(base.join("conf/nested/b.yaml"), "b").unwrap();

        let matches = expand_glob("conf/*.yaml", base).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with("conf/a.yaml"));

        let matches = expand_glob("conf/**/*.yaml", base).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_expand_glob_skips_hidden() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join(".hidden.yaml"), "h").unwrap();
        fs::write(base.join("visible.yaml"), "v").unwrap();

        let matches = expand_glob("*.yaml", base).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with("visible.yaml"));

        let matches = expand_glob(".*.yaml", base).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with(".hidden.yaml"));
    }

    #[test]
    fn test_expand_glob_base_dir_with_metacharacters() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("conf[1]");
        fs::create_dir_all(base.join("sub")).unwrap();
        fs::write(base.join("a.yaml"), "a").unwrap();
        fs::write(base.join("sub/b.yaml"), "b").unwrap();

        let matches = expand_glob("*.yaml", &base).unwrap();
        assert_eq!(matches, vec![base.join("a.yaml")]);

        let matches = expand_glob("sub/../sub/*.yaml", &base).unwrap();
        assert_eq!(matches, vec![base.join("sub/b.yaml")]);
    }

    #[test]
    fn test_expand_glob_no_matches() {
        let temp_dir = TempDir::new().unwrap();
        assert!(expand_glob("*.yaml", temp_dir.path()).unwrap().is_empty());
        assert!(
            expand_glob("missing/*.yaml", temp_dir.path())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_expand_glob_invalid_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let result = expand_glob("[unclosed*.yaml", temp_dir.path());
        assert!(matches!(result, Err(YamlincError::Glob(_))));
    }
}

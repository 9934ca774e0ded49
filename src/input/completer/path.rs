use std::{
    fs,
    path::{Path, PathBuf},
};

use rustyline::completion::Pair;

use crate::path::PathExpander;

/// Completes file and directory names. Relative input is looked up under the
/// session's working directory, not the process's.
#[derive(Clone, Debug)]
pub struct PathCompleter {
    base_dir: PathBuf,
    expander: PathExpander,
}

impl PathCompleter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            expander: PathExpander::new(),
        }
    }

    pub fn set_base_dir(&mut self, base_dir: &Path) {
        if self.base_dir != base_dir {
            self.base_dir = base_dir.to_path_buf();
        }
    }

    pub fn complete_path(&self, incomplete: &str) -> Vec<Pair> {
        // Everything up to the last `/` is kept verbatim in the replacement.
        let (typed_dir, file_prefix) = match incomplete.rfind('/') {
            Some(idx) => incomplete.split_at(idx + 1),
            None => ("", incomplete),
        };

        let search_dir = self.search_dir(typed_dir);
        let Ok(entries) = fs::read_dir(&search_dir) else {
            return Vec::new();
        };

        let mut matches: Vec<Pair> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !name.starts_with(file_prefix) {
                    return None;
                }
                // Hidden entries only when asked for.
                if name.starts_with('.') && !file_prefix.starts_with('.') {
                    return None;
                }
                Some(completion_pair(typed_dir, &name, entry.path().is_dir()))
            })
            .collect();

        matches.sort_by(|a, b| a.display.cmp(&b.display));
        matches
    }

    fn search_dir(&self, typed_dir: &str) -> PathBuf {
        if typed_dir.is_empty() {
            return self.base_dir.clone();
        }
        let expanded = self
            .expander
            .expand(typed_dir)
            .unwrap_or_else(|_| PathBuf::from(typed_dir));
        if expanded.is_absolute() {
            expanded
        } else {
            self.base_dir.join(expanded)
        }
    }
}

fn completion_pair(typed_dir: &str, name: &str, is_dir: bool) -> Pair {
    let path = format!("{}{}", typed_dir, name);
    if is_dir {
        Pair {
            display: format!("{}/", name),
            replacement: format!("{}/", path),
        }
    } else {
        Pair {
            display: name.to_string(),
            replacement: format!("{} ", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("data.txt"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        fs::write(dir.path().join("docs").join("readme.md"), "").unwrap();
        dir
    }

    fn replacements(pairs: Vec<Pair>) -> Vec<String> {
        pairs.into_iter().map(|p| p.replacement).collect()
    }

    #[test]
    fn test_relative_to_base() {
        let dir = setup();
        let completer = PathCompleter::new(dir.path());
        assert_eq!(
            replacements(completer.complete_path("d")),
            ["data.txt ", "docs/"]
        );
        assert_eq!(
            replacements(completer.complete_path("docs/r")),
            ["docs/readme.md "]
        );
    }

    #[test]
    fn test_hidden_needs_dot() {
        let dir = setup();
        let completer = PathCompleter::new(dir.path());
        assert!(!replacements(completer.complete_path("")).contains(&".hidden ".to_string()));
        assert_eq!(replacements(completer.complete_path(".h")), [".hidden "]);
    }

    #[test]
    fn test_absolute_input() {
        let dir = setup();
        let completer = PathCompleter::new("/");
        let typed = format!("{}/do", dir.path().display());
        assert_eq!(
            replacements(completer.complete_path(&typed)),
            [format!("{}/docs/", dir.path().display())]
        );
    }

    #[test]
    fn test_missing_dir() {
        let completer = PathCompleter::new("/nonexistent-termina-dir");
        assert!(completer.complete_path("x").is_empty());
    }
}

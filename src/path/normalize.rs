use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `..` into its
/// parent. The filesystem is never consulted, so symlinks are not resolved.
/// `..` above the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = normalized.parent().is_none() && normalized.has_root();
                let empty = normalized.as_os_str().is_empty();
                let ends_in_parent = matches!(
                    normalized.components().next_back(),
                    Some(Component::ParentDir)
                );
                if empty || ends_in_parent {
                    normalized.push("..");
                } else if !at_root {
                    normalized.pop();
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

use std::path::{Component, Path};

/// True for non-empty relative paths made only of plain names, i.e. paths
/// that stay below whatever directory they are joined onto.
pub fn is_contained_relative_path(path: &str) -> bool {
    let mut components = Path::new(path).components().peekable();
    components.peek().is_some()
        && components.all(|component| matches!(component, Component::Normal(_)))
}

/// Returns true when `path` ends with any of `extensions` (e.g. `".bin"`).
pub fn has_extension<S: AsRef<str>>(path: &str, extensions: &[S]) -> bool {
    extensions
        .iter()
        .any(|extension| path.ends_with(extension.as_ref()))
}

/// Normalizes user supplied extensions so that `bin` and `.bin` mean the same thing.
pub fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim();
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

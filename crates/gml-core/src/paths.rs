//! File path normalization for `parserServices.filePath`

use std::fs;

/// Canonicalize `path` where the file system allows it and trim trailing
/// separators. Placeholders such as `<input>` are returned unchanged.
pub fn normalize_file_path(path: &str) -> String {
    if is_placeholder(path) {
        return path.to_string();
    }

    let resolved = fs::canonicalize(path)
        .map(|canonical| canonical.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string());

    trim_trailing_separators(&resolved).to_string()
}

pub fn is_placeholder(path: &str) -> bool {
    path.len() >= 2 && path.starts_with('<') && path.ends_with('>')
}

fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        // Only separators: keep the root.
        &path[..path.len().min(1)]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_pass_through() {
        assert_eq!(normalize_file_path("<input>"), "<input>");
        assert_eq!(normalize_file_path("<text>"), "<text>");
    }

    #[test]
    fn trailing_separators_are_trimmed() {
        assert_eq!(normalize_file_path("/no/such/dir///"), "/no/such/dir");
        assert_eq!(trim_trailing_separators("/"), "/");
        assert_eq!(trim_trailing_separators(""), "");
    }

    #[test]
    fn existing_paths_are_canonical() {
        let dir = std::env::temp_dir();
        let canonical = fs::canonicalize(&dir).unwrap();
        let input = format!("{}/./", dir.display());

        assert_eq!(normalize_file_path(&input), canonical.to_string_lossy());
    }
}

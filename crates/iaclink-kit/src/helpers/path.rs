//! Lexical path helpers.
//!
//! Configuration paths are handled as forward-slash strings and never touch
//! the file system: `..` is folded textually and symlinks are not followed.

/// Collapses `.`, `..` and repeated separators. Absolute paths cannot climb
/// above `/`; relative paths keep their leading `..` segments.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&"..") | None if !absolute => segments.push(".."),
                Some(_) => {
                    segments.pop();
                }
                None => {}
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Directory part of a file path, `.` when there is none
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => normalized[..index].to_string(),
        None => ".".to_string(),
    }
}

pub fn join(base: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        return normalize(relative);
    }
    normalize(&format!("{}/{}", base, relative))
}

/// `path` expressed relative to `root`, or `None` when it lies outside
pub fn relative_to(path: &str, root: &str) -> Option<String> {
    let path = normalize(path);
    let root = normalize(root);
    if path == root {
        return Some(".".to_string());
    }
    let prefix = if root.ends_with('/') { root } else { format!("{}/", root) };
    path.strip_prefix(&prefix).map(str::to_string)
}

pub fn is_within(path: &str, root: &str) -> bool {
    relative_to(path, root).is_some()
}

pub fn last_segment(path: &str) -> Option<&str> {
    path.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/repo/live/./vpc//main", "/repo/live/vpc/main")]
    #[test_case("/repo/live/../modules/vpc", "/repo/modules/vpc")]
    #[test_case("/../../etc", "/etc")]
    #[test_case("../../x", "../../x")]
    #[test_case("a/../../b", "../b")]
    #[test_case("./", ".")]
    #[test_case("C:\\repo\\vpc", "C:/repo/vpc")]
    fn test_normalize(input: &str, expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("/repo/live/vpc/terragrunt.hcl"), "/repo/live/vpc");
        assert_eq!(parent_dir("/terragrunt.hcl"), "/");
        assert_eq!(parent_dir("terragrunt.hcl"), ".");
    }

    #[test]
    fn test_join_and_relative() {
        assert_eq!(join("/repo/live/app", "../../modules/app"), "/repo/modules/app");
        assert_eq!(join("/repo/live/app", "/abs/mod"), "/abs/mod");
        assert_eq!(relative_to("/repo/modules/app", "/repo"), Some("modules/app".to_string()));
        assert_eq!(relative_to("/repository/x", "/repo"), None);
        assert_eq!(relative_to("/repo", "/repo/"), Some(".".to_string()));
        assert!(!is_within("/etc/passwd", "/repo"));
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("./modules/vpc/"), Some("vpc"));
        assert_eq!(last_segment(""), None);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Lexical helpers for '/'-separated paths.
//!
//! None of these touch the filesystem; symlinks are not resolved.

/// Directory part of `path`, `"."` when it has none.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// Join `name` onto `dir` unless `name` is already absolute.
pub fn join(dir: &str, name: &str) -> String {
    if name.starts_with('/') || dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Collapse `.`, `..` and repeated separators.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Replace the last component of `path` with `name`, keeping the separator.
pub fn replace_last_component(path: &str, name: &str) -> String {
    match path.rfind('/') {
        Some(idx) => format!("{}{name}", &path[..=idx]),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_dir_of_various_paths() {
        assert_eq!(parent_dir("/path/to/img"), "/path/to");
        assert_eq!(parent_dir("/img"), "/");
        assert_eq!(parent_dir("img"), ".");
        assert_eq!(parent_dir("sub/img"), "sub");
    }

    #[test]
    fn join_keeps_absolute_names() {
        assert_eq!(join("/a/b", "c"), "/a/b/c");
        assert_eq!(join("/", "c"), "/c");
        assert_eq!(join("/a/b", "/x/y"), "/x/y");
        assert_eq!(join(".", "c"), "./c");
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize("/a/b/../c/./d"), "/a/c/d");
        assert_eq!(normalize("/a//b/"), "/a/b");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("../a/../../b"), "../../b");
        assert_eq!(normalize("./"), ".");
    }

    #[test]
    fn replace_last_component_keeps_dot_dot() {
        assert_eq!(
            replace_last_component("../volume/image2", "../volume/image3"),
            "../volume/../volume/image3"
        );
        assert_eq!(replace_last_component("asdf", "test"), "test");
    }
}

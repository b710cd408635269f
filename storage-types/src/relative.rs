// SPDX-License-Identifier: GPL-3.0-only

use std::ptr;

use crate::error::{ChainQueryError, Result};
use crate::path::replace_last_component;
use crate::source::StorageSource;

/// Relative backing path from `top` down to `base`.
///
/// The result is expressed against the directory of `top` and is built by
/// stacking the `rel_path` of every node below `top` up to and including
/// `base`. `..` components are kept as written. When `top` and `base` are the
/// same node, its own `rel_path` is returned.
pub fn relative_backing_path(top: &StorageSource, base: &StorageSource) -> Result<String> {
    if !top.contains(base) {
        return Err(ChainQueryError::NotInChain {
            top: top.describe(),
            base: base.describe(),
        });
    }

    if ptr::eq(top, base) {
        return base
            .rel_path
            .clone()
            .ok_or_else(|| ChainQueryError::RelativePathUnavailable {
                path: base.describe(),
            });
    }

    let mut relative = String::new();
    for node in top.chain().skip(1) {
        let rel_path =
            node.rel_path
                .as_deref()
                .ok_or_else(|| ChainQueryError::RelativePathUnavailable {
                    path: node.describe(),
                })?;
        relative = replace_last_component(&relative, rel_path);

        if ptr::eq(node, base) {
            break;
        }
    }

    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{join, normalize, parent_dir};

    fn chain(nodes: &[(&str, Option<&str>)]) -> StorageSource {
        let mut built: Option<StorageSource> = None;
        for (idx, (path, rel_path)) in nodes.iter().enumerate().rev() {
            let mut node = StorageSource::new_file(*path);
            node.id = idx as u32;
            node.rel_path = rel_path.map(str::to_string);
            if let Some(below) = built.take() {
                node.set_backing(below);
            }
            built = Some(node);
        }
        built.expect("at least one node")
    }

    fn nth(head: &StorageSource, idx: usize) -> &StorageSource {
        head.chain().nth(idx).expect("node in chain")
    }

    fn simple() -> StorageSource {
        chain(&[
            ("/path/to/some/img", None),
            ("/path/to/some/asdf", Some("asdf")),
            ("/path/to/some/test", Some("test")),
            ("/path/to/some/blah", Some("blah")),
        ])
    }

    fn ovirt() -> StorageSource {
        chain(&[
            ("/path/to/volume/image1", None),
            ("/path/to/volume/image2", Some("../volume/image2")),
            ("/path/to/volume/image3", Some("../volume/image3")),
            ("/path/to/volume/image4", Some("../volume/image4")),
        ])
    }

    fn crazy() -> StorageSource {
        chain(&[
            ("/crazy/base/image", None),
            (
                "/crazy/base/directory/stuff/volumes/garbage/image2",
                Some("directory/stuff/volumes/garbage/image2"),
            ),
            ("/crazy/base/directory/image3", Some("../../../image3")),
            ("/crazy/base/blah/image4", Some("../blah/image4")),
        ])
    }

    #[test]
    fn same_node_returns_own_relative_path() {
        let head = simple();
        assert_eq!(relative_backing_path(nth(&head, 1), nth(&head, 1)).as_deref(), Ok("asdf"));
        assert_eq!(relative_backing_path(nth(&head, 3), nth(&head, 3)).as_deref(), Ok("blah"));

        let head = ovirt();
        assert_eq!(
            relative_backing_path(nth(&head, 2), nth(&head, 2)).as_deref(),
            Ok("../volume/image3")
        );
    }

    #[test]
    fn absolute_node_has_no_relative_form() {
        let head = simple();
        let err = relative_backing_path(&head, &head).unwrap_err();
        assert_eq!(
            err,
            ChainQueryError::RelativePathUnavailable {
                path: "/path/to/some/img".to_string()
            }
        );
    }

    #[test]
    fn flat_directory_chain() {
        let head = simple();
        assert_eq!(relative_backing_path(&head, nth(&head, 1)).as_deref(), Ok("asdf"));
        assert_eq!(relative_backing_path(&head, nth(&head, 3)).as_deref(), Ok("blah"));
        assert_eq!(relative_backing_path(nth(&head, 1), nth(&head, 2)).as_deref(), Ok("test"));
        assert_eq!(relative_backing_path(nth(&head, 1), nth(&head, 3)).as_deref(), Ok("blah"));
    }

    #[test]
    fn dot_dot_components_accumulate() {
        let head = ovirt();
        assert_eq!(
            relative_backing_path(&head, nth(&head, 2)).as_deref(),
            Ok("../volume/../volume/image3")
        );
        assert_eq!(
            relative_backing_path(nth(&head, 1), nth(&head, 3)).as_deref(),
            Ok("../volume/../volume/image4")
        );
        assert_eq!(
            relative_backing_path(&head, nth(&head, 3)).as_deref(),
            Ok("../volume/../volume/../volume/image4")
        );
    }

    #[test]
    fn nested_directories() {
        let head = crazy();
        assert_eq!(
            relative_backing_path(&head, nth(&head, 2)).as_deref(),
            Ok("directory/stuff/volumes/garbage/../../../image3")
        );
        assert_eq!(
            relative_backing_path(&head, nth(&head, 3)).as_deref(),
            Ok("directory/stuff/volumes/garbage/../../../../blah/image4")
        );
        assert_eq!(
            relative_backing_path(nth(&head, 2), nth(&head, 3)).as_deref(),
            Ok("../blah/image4")
        );
    }

    #[test]
    fn base_above_top_is_not_in_chain() {
        let head = simple();
        let err = relative_backing_path(nth(&head, 2), nth(&head, 1)).unwrap_err();
        assert!(matches!(err, ChainQueryError::NotInChain { .. }));

        let other = simple();
        let err = relative_backing_path(&head, nth(&other, 2)).unwrap_err();
        assert!(matches!(err, ChainQueryError::NotInChain { .. }));
    }

    #[test]
    fn absolute_hop_breaks_relative_path() {
        let head = chain(&[
            ("/a/top", None),
            ("/a/mid", Some("mid")),
            ("/b/base", None),
        ]);
        let err = relative_backing_path(&head, nth(&head, 2)).unwrap_err();
        assert_eq!(
            err,
            ChainQueryError::RelativePathUnavailable {
                path: "/b/base".to_string()
            }
        );
    }

    #[test]
    fn relative_path_resolves_back_to_base() {
        for head in [simple(), ovirt(), crazy()] {
            let top_dir = parent_dir(head.path.as_deref().expect("head path"));
            for base in head.chain().skip(1) {
                let relative = relative_backing_path(&head, base).expect("relative path");
                assert_eq!(
                    Some(normalize(&join(top_dir, &relative))),
                    base.path.clone(),
                    "{relative}"
                );
            }
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Resolve a disk-target specifier to a node of a backing chain.
//!
//! Accepted names, in order of precedence:
//!
//! - no name: the node directly below `from`
//! - the bare target (`vda`): the chain head
//! - an indexed target (`vda[2]`): the node with that id
//! - anything else: a path, either as recorded in the parent's header,
//!   absolute, or relative to the directory of any other node in the chain

use std::ptr;

use crate::path::{join, normalize, parent_dir};
use crate::source::StorageSource;

/// Outcome of [`lookup_chain`]; both fields are `None` when nothing matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainLookup<'a> {
    pub matched: Option<&'a StorageSource>,
    /// Node directly above `matched` in the chain.
    pub parent: Option<&'a StorageSource>,
}

impl<'a> ChainLookup<'a> {
    fn at(nodes: &[&'a StorageSource], idx: usize) -> Self {
        Self {
            matched: Some(nodes[idx]),
            parent: idx.checked_sub(1).map(|prev| nodes[prev]),
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}

pub fn lookup_chain<'a>(
    chain: &'a StorageSource,
    from: Option<&StorageSource>,
    name: Option<&str>,
    target: &str,
) -> ChainLookup<'a> {
    let nodes: Vec<&'a StorageSource> = chain.chain().collect();

    let start = match from {
        Some(from) => match nodes.iter().position(|node| ptr::eq(*node, from)) {
            Some(idx) => Some(idx),
            None => return ChainLookup::default(),
        },
        None => None,
    };

    let Some(name) = name else {
        return match start {
            Some(idx) if idx + 1 < nodes.len() => ChainLookup::at(&nodes, idx + 1),
            _ => ChainLookup::default(),
        };
    };

    if name == target {
        return match start {
            None => ChainLookup::at(&nodes, 0),
            Some(_) => ChainLookup::default(),
        };
    }

    if let Some(suffix) = name.strip_prefix(target)
        && suffix.starts_with('[')
    {
        return parse_index(suffix)
            .and_then(|index| nodes.iter().position(|node| node.id == index))
            .map(|idx| ChainLookup::at(&nodes, idx))
            .unwrap_or_default();
    }

    let first = start.map_or(0, |idx| idx + 1);
    (first..nodes.len())
        .find(|&idx| name_matches(name, &nodes, idx))
        .map(|idx| ChainLookup::at(&nodes, idx))
        .unwrap_or_default()
}

/// Parse `[<digits>]`. Anything else, nested brackets included, is rejected.
fn parse_index(suffix: &str) -> Option<u32> {
    let digits = suffix.strip_prefix('[')?.strip_suffix(']')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn name_matches(name: &str, nodes: &[&StorageSource], idx: usize) -> bool {
    let candidate = nodes[idx];
    let same = |field: &Option<String>| field.as_deref() == Some(name);

    if same(&candidate.path) || same(&candidate.backing_store_raw) || same(&candidate.rel_path) {
        return true;
    }

    let Some(candidate_path) = candidate.path.as_deref().filter(|_| candidate.is_local()) else {
        return false;
    };
    let wanted = normalize(candidate_path);

    nodes
        .iter()
        .enumerate()
        .filter(|&(other, node)| other != idx && node.is_local())
        .filter_map(|(_, node)| node.path.as_deref())
        .any(|other_path| normalize(&join(parent_dir(other_path), name)) == wanted)
}

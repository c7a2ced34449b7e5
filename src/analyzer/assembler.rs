//! Tree Assembler
//!
//! Places file nodes under directory nodes built from their relative paths.
//! Every level is ordered by name, so the same file set always yields the
//! same tree.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::types::{NodeKind, StructuralNode};

enum Entry {
    Directory(BTreeMap<String, Entry>),
    File(StructuralNode),
}

impl Entry {
    fn into_node(self, name: String) -> StructuralNode {
        match self {
            Entry::File(node) => node,
            Entry::Directory(entries) => {
                StructuralNode::new(NodeKind::Directory, name).with_children(into_children(entries))
            }
        }
    }
}

fn into_children(entries: BTreeMap<String, Entry>) -> Vec<StructuralNode> {
    entries
        .into_iter()
        .map(|(name, entry)| entry.into_node(name))
        .collect()
}

/// Path components usable as tree names; `.` and prefixes are dropped.
fn components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Insert a file under `dirs`; false when a path prefix is already a file.
fn insert(
    level: &mut BTreeMap<String, Entry>,
    dirs: &[String],
    file_name: String,
    file: StructuralNode,
) -> bool {
    match dirs.split_first() {
        None => {
            level.insert(file_name, Entry::File(file));
            true
        }
        Some((dir, rest)) => match level
            .entry(dir.clone())
            .or_insert_with(|| Entry::Directory(BTreeMap::new()))
        {
            Entry::Directory(children) => insert(children, rest, file_name, file),
            Entry::File(_) => false,
        },
    }
}

/// Build the root node from file nodes keyed by path relative to the root.
pub fn assemble(doc_name: &str, files: BTreeMap<PathBuf, StructuralNode>) -> StructuralNode {
    let mut top: BTreeMap<String, Entry> = BTreeMap::new();

    for (path, file) in files {
        let mut parts = components(&path);
        let Some(file_name) = parts.pop() else {
            tracing::warn!("Skipping file node with empty path: {}", file.title);
            continue;
        };

        if !insert(&mut top, &parts, file_name, file) {
            // A file cannot also be a directory on disk.
            tracing::warn!("Path conflict at {}", path.display());
        }
    }

    StructuralNode::new(NodeKind::Root, doc_name).with_children(into_children(top))
}

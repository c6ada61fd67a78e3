//! Accumulated index state for one scan root.

use std::collections::BTreeMap;
use std::path::MAIN_SEPARATOR;

use serde::Serialize;

use crate::entry::{fold, Entry};

/// A tolerated irregularity recorded during a scan.
///
/// Warnings never abort traversal; they exist so the UI can report why a
/// completed index might be smaller than the tree on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    /// A directory whose canonical path was already visited in this scan.
    CycleSkipped { path: String },
    /// A subtree that could not be entered (permissions, vanished mid-scan).
    SubtreeInaccessible { path: String },
}

/// The searchable state accumulated by one scan.
///
/// Written only by the owning scan's worker, one directory per write lock;
/// read concurrently by search through the surrounding `RwLock`. Entries
/// are keyed by path, so re-inserting a path replaces its entry and the
/// path stays unique within the snapshot. Never rolled back: a failed
/// subtree stops contributing, prior entries remain valid.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: BTreeMap<String, Entry>,
    /// Case-folded name to the paths carrying it, so search narrows
    /// candidates without walking the whole entry map.
    name_index: BTreeMap<String, Vec<String>>,
    warnings: Vec<ScanWarning>,
}

impl IndexSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`, replacing any previous entry at the same path.
    pub fn insert(&mut self, entry: Entry) {
        let folded = fold(&entry.name);
        let path = entry.path.clone();
        if let Some(previous) = self.entries.insert(path.clone(), entry) {
            remove_name_slot(&mut self.name_index, &fold(&previous.name), &path);
        }
        self.name_index.entry(folded).or_default().push(path);
    }

    pub fn push_warning(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Iterates entries whose case-folded name contains `needle`.
    ///
    /// `needle` must already be folded with the crate's case folding; an
    /// empty needle matches every entry.
    pub fn entries_with_name_containing<'a>(
        &'a self,
        needle: &'a str,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        let entries = &self.entries;
        self.name_index
            .iter()
            .filter(move |(name, _)| needle.is_empty() || name.contains(needle))
            .flat_map(|(_, paths)| paths.iter())
            .filter_map(move |path| entries.get(path))
    }

    /// Summed size of the indexed entries at or under `prefix`.
    ///
    /// Directory entries contribute zero, so this is the indexed file bytes
    /// below the path.
    pub fn size_under(&self, prefix: &str) -> u64 {
        let prefix = prefix.trim_end_matches(MAIN_SEPARATOR);
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .filter(|(path, _)| {
                path.as_str() == prefix || path[prefix.len()..].starts_with(MAIN_SEPARATOR)
            })
            .map(|(_, entry)| entry.size)
            .sum()
    }
}

fn remove_name_slot(
    name_index: &mut BTreeMap<String, Vec<String>>,
    folded: &str,
    path: &str,
) {
    if let Some(paths) = name_index.get_mut(folded) {
        paths.retain(|candidate| candidate != path);
        if paths.is_empty() {
            name_index.remove(folded);
        }
    }
}

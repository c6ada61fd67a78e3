//! Name and extension search over an index snapshot.

use serde::Serialize;

use crate::cancel::CancelToken;
use crate::entry::{fold, sort_entries, Entry};
use crate::index::IndexSnapshot;

/// A name/extension query. Both filters are ANDed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchQuery {
    /// Case-insensitive substring against entry names; empty matches all.
    pub name_pattern: String,
    /// Exact case-insensitive extension; empty means any. A non-empty
    /// filter excludes directories, which carry no extension.
    pub extension: String,
}

impl SearchQuery {
    pub fn new(name_pattern: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            extension: extension.into(),
        }
    }
}

/// Runs `query` against `snapshot`, ordered by the shared contract
/// (directories first, then case-insensitive name).
///
/// Returns `None` once `cancel` reports the search superseded; the caller
/// discards the result in that case. The snapshot is whatever the builder
/// has accumulated so far; eventual consistency with a live scan is
/// documented behavior.
pub fn search_snapshot(
    snapshot: &IndexSnapshot,
    query: &SearchQuery,
    cancel: &CancelToken,
) -> Option<Vec<Entry>> {
    cancel.is_active()?;

    let needle = fold(&query.name_pattern);
    let extension = fold(&query.extension);

    let mut matches = Vec::new();
    for (i, entry) in snapshot.entries_with_name_containing(&needle).enumerate() {
        cancel.is_active_sparse(i)?;
        if !extension.is_empty() && entry.extension.as_deref() != Some(extension.as_str()) {
            continue;
        }
        matches.push(entry.clone());
    }

    cancel.is_active()?;
    sort_entries(&mut matches);
    Some(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::SearchVersionTracker;

    fn snapshot() -> IndexSnapshot {
        let mut snapshot = IndexSnapshot::new();
        for (path, name, extension, is_directory) in [
            ("/r/docs", "docs", None, true),
            ("/r/docs/Report.pdf", "Report.pdf", Some("pdf"), false),
            ("/r/docs/report.txt", "report.txt", Some("txt"), false),
            ("/r/docs/notes.txtx", "notes.txtx", Some("txtx"), false),
            ("/r/docs/README", "README", None, false),
            ("/r/reports", "reports", None, true),
        ] {
            snapshot.insert(Entry {
                path: path.to_string(),
                name: name.to_string(),
                extension: extension.map(str::to_string),
                size: 1,
                modified: 0,
                is_directory,
            });
        }
        snapshot
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let results = search_snapshot(
            &snapshot(),
            &SearchQuery::new("REPORT", ""),
            &CancelToken::noop(),
        )
        .unwrap();
        let names: Vec<_> = results.iter().map(|entry| entry.name.as_str()).collect();
        // Directory first, then files in case-insensitive name order.
        assert_eq!(names, vec!["reports", "Report.pdf", "report.txt"]);
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let results =
            search_snapshot(&snapshot(), &SearchQuery::default(), &CancelToken::noop()).unwrap();
        assert_eq!(results.len(), 6);
    }

    #[test]
    fn extension_filter_is_exact() {
        let results = search_snapshot(
            &snapshot(),
            &SearchQuery::new("", "txt"),
            &CancelToken::noop(),
        )
        .unwrap();
        let names: Vec<_> = results.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["report.txt"]);
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        let results = search_snapshot(
            &snapshot(),
            &SearchQuery::new("", "PDF"),
            &CancelToken::noop(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Report.pdf");
    }

    #[test]
    fn filters_are_anded() {
        let results = search_snapshot(
            &snapshot(),
            &SearchQuery::new("report", "pdf"),
            &CancelToken::noop(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "/r/docs/Report.pdf");
    }

    #[test]
    fn extension_filter_excludes_directories() {
        let results = search_snapshot(
            &snapshot(),
            &SearchQuery::new("reports", "pdf"),
            &CancelToken::noop(),
        )
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn superseded_search_returns_none() {
        let tracker = SearchVersionTracker::new();
        let stale = tracker.token_for_version(tracker.next_version());
        tracker.next_version();

        assert!(search_snapshot(&snapshot(), &SearchQuery::default(), &stale).is_none());
    }
}

//! Greedy line diff.
//!
//! Two cursors walk the old and new lines. Equal lines are `Same`. An old
//! line that never appears again in the remaining new lines is `Delete`;
//! anything else is an `Add`. The script is not minimal (repeated lines can
//! produce detours) but it always replays exactly: `Same` + `Add` rebuild the
//! new text, `Same` + `Delete` rebuild the old one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Same,
    Add,
    Delete,
}

/// One step of the edit script. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<usize>,
    pub content: String,
}

impl DiffEntry {
    fn same(old_idx: usize, new_idx: usize, content: &str) -> Self {
        Self {
            kind: DiffKind::Same,
            old_line: Some(old_idx + 1),
            new_line: Some(new_idx + 1),
            content: content.to_string(),
        }
    }

    fn delete(old_idx: usize, content: &str) -> Self {
        Self {
            kind: DiffKind::Delete,
            old_line: Some(old_idx + 1),
            new_line: None,
            content: content.to_string(),
        }
    }

    fn add(new_idx: usize, content: &str) -> Self {
        Self {
            kind: DiffKind::Add,
            old_line: None,
            new_line: Some(new_idx + 1),
            content: content.to_string(),
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != DiffKind::Same
    }

    /// Line number to display: the new position when there is one.
    pub fn display_line(&self) -> usize {
        self.new_line.or(self.old_line).unwrap_or(0)
    }
}

/// Split file content into lines. Empty content has no lines at all.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').collect()
    }
}

pub fn compute_diff(old: &[&str], new: &[&str]) -> Vec<DiffEntry> {
    let mut entries = Vec::with_capacity(old.len().max(new.len()));
    let (mut i, mut j) = (0, 0);

    while i < old.len() || j < new.len() {
        if i < old.len() && j < new.len() && old[i] == new[j] {
            entries.push(DiffEntry::same(i, j, old[i]));
            i += 1;
            j += 1;
        } else if i < old.len() && (j >= new.len() || !new[j..].contains(&old[i])) {
            entries.push(DiffEntry::delete(i, old[i]));
            i += 1;
        } else {
            entries.push(DiffEntry::add(j, new[j]));
            j += 1;
        }
    }
    entries
}

/// Replay `Same` + `Add` entries.
pub fn apply_new(entries: &[DiffEntry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| e.kind != DiffKind::Delete)
        .map(|e| e.content.as_str())
        .collect()
}

/// Replay `Same` + `Delete` entries.
pub fn apply_old(entries: &[DiffEntry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| e.kind != DiffKind::Add)
        .map(|e| e.content.as_str())
        .collect()
}

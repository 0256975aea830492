use std::collections::BTreeSet;

use flagrefs_protocol::ReferenceHunksRep;

use crate::aggregate::{aggregate_by_path, PathReferences};
use crate::config::PayloadLimits;
use crate::reference::ReferenceLine;

/// One entry per path that produced at least one hunk, in path order.
pub fn assemble_hunk_reps(
    groups: &[PathReferences],
    project_key: &str,
    context_lines: i64,
) -> Vec<ReferenceHunksRep> {
    groups
        .iter()
        .filter_map(|group| {
            let hunks = group.make_hunk_reps(project_key, context_lines);
            if hunks.is_empty() {
                None
            } else {
                Some(ReferenceHunksRep {
                    path: group.path().to_string(),
                    hunks,
                })
            }
        })
        .collect()
}

/// Aggregate reference lines by path and assemble their hunks.
pub fn make_reference_hunks_reps(
    lines: Vec<ReferenceLine>,
    project_key: &str,
    context_lines: i64,
) -> Vec<ReferenceHunksRep> {
    assemble_hunk_reps(&aggregate_by_path(lines), project_key, context_lines)
}

/// Payload after [`PayloadLimits`] were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedPayload {
    pub references: Vec<ReferenceHunksRep>,
    pub truncated: bool,
}

/// Keep paths in order until either cap is reached.
pub fn apply_limits(references: Vec<ReferenceHunksRep>, limits: PayloadLimits) -> LimitedPayload {
    let mut kept = Vec::with_capacity(references.len().min(limits.max_files));
    let mut hunk_count = 0usize;
    let mut truncated = false;

    for mut reference in references {
        if kept.len() >= limits.max_files || hunk_count >= limits.max_hunks {
            truncated = true;
            break;
        }
        let remaining = limits.max_hunks - hunk_count;
        if reference.hunks.len() > remaining {
            reference.hunks.truncate(remaining);
            truncated = true;
        }
        hunk_count += reference.hunks.len();
        kept.push(reference);
        if truncated {
            break;
        }
    }

    LimitedPayload {
        references: kept,
        truncated,
    }
}

/// What a scan found, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub files: usize,
    pub hunks: usize,
    pub flag_keys: BTreeSet<String>,
}

impl ScanSummary {
    pub fn from_references(references: &[ReferenceHunksRep]) -> Self {
        let mut summary = Self {
            files: references.len(),
            ..Self::default()
        };
        for hunk in references.iter().flat_map(|r| &r.hunks) {
            summary.hunks += 1;
            summary.flag_keys.insert(hunk.flag_key.clone());
        }
        summary
    }

    /// Candidate keys with no reference anywhere in the scan.
    #[must_use]
    pub fn unreferenced<'a>(&self, keys: &'a [String]) -> Vec<&'a str> {
        keys.iter()
            .filter(|key| !self.flag_keys.contains(key.as_str()))
            .map(String::as_str)
            .collect()
    }
}

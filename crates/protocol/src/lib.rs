//! Wire types exchanged with the flag-management service.
//!
//! Field names follow the service's ingestion API, so everything is
//! serialized in camelCase.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One contiguous excerpt of a file that evidences a single flag key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HunkRep {
    pub starting_line_number: usize,
    /// Newline-terminated lines; empty when source text is suppressed.
    pub lines: String,
    pub proj_key: String,
    pub flag_key: String,
}

impl HunkRep {
    /// Number of lines carried in the block (0 for suppressed text).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.lines().count()
    }
}

/// All hunks found in one file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceHunksRep {
    pub path: String,
    pub hunks: Vec<HunkRep>,
}

/// A branch as known to the service, plus the references found on it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BranchRep {
    pub name: String,
    #[serde(default)]
    pub head: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_sequence_id: Option<i64>,
    #[serde(default)]
    pub sync_time: i64,
    #[serde(default)]
    pub references: Vec<ReferenceHunksRep>,
}

impl BranchRep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn total_hunks(&self) -> usize {
        self.references.iter().map(|r| r.hunks.len()).sum()
    }
}

pub fn serialize_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let raw = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(raw)
}

use serde::{Deserialize, Serialize};

use crate::error::{CodeRefsError, Result};

/// Keys shorter than this are never searched for.
pub const MIN_FLAG_KEY_LEN: usize = 3;

/// Longest line text (in characters) carried in a hunk before truncation.
pub const MAX_LINE_CHAR_COUNT: usize = 500;

pub const DEFAULT_MAX_FILES: usize = 10_000;
pub const DEFAULT_MAX_HUNKS: usize = 25_000;
pub const DEFAULT_CONTEXT_LINES: i64 = 2;
pub const DEFAULT_DELIMITERS: &str = "\"'`";
pub const DEFAULT_SEARCH_TOOL: &str = "rg";

/// Caps applied to an assembled payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLimits {
    pub max_files: usize,
    pub max_hunks: usize,
}

/// Configuration for one scan run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanOptions {
    /// Project key attached to every hunk
    pub project_key: String,

    /// Candidate flag keys, in caller order
    pub flags: Vec<String>,

    /// Context radius around each match; negative suppresses source text
    pub context_lines: i64,

    /// Regular expression over POSIX-style paths; matching paths are skipped
    pub exclude: Option<String>,

    /// Characters accepted as key boundaries in addition to non-word characters
    pub delimiters: String,

    /// Search binary to invoke
    pub search_tool: String,

    /// Maximum number of files carried in one payload
    pub max_files: usize,

    /// Maximum number of hunks carried in one payload
    pub max_hunks: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            project_key: String::new(),
            flags: Vec::new(),
            context_lines: DEFAULT_CONTEXT_LINES,
            exclude: None,
            delimiters: DEFAULT_DELIMITERS.to_string(),
            search_tool: DEFAULT_SEARCH_TOOL.to_string(),
            max_files: DEFAULT_MAX_FILES,
            max_hunks: DEFAULT_MAX_HUNKS,
        }
    }
}

impl ScanOptions {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.project_key.trim().is_empty() {
            return Err(CodeRefsError::invalid_config("project_key must be set"));
        }

        if self.search_tool.trim().is_empty() {
            return Err(CodeRefsError::invalid_config("search_tool must not be empty"));
        }

        if self.max_files == 0 || self.max_hunks == 0 {
            return Err(CodeRefsError::invalid_config(format!(
                "max_files ({}) and max_hunks ({}) must be > 0",
                self.max_files, self.max_hunks
            )));
        }

        Ok(())
    }

    /// Exclusion pattern, treating a blank string as "no exclusion".
    #[must_use]
    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Number of context lines to request from the search tool.
    #[must_use]
    pub fn search_context(&self) -> usize {
        usize::try_from(self.context_lines.max(0)).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub const fn limits(&self) -> PayloadLimits {
        PayloadLimits {
            max_files: self.max_files,
            max_hunks: self.max_hunks,
        }
    }
}

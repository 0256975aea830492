//! # Flag code references
//!
//! Turns raw line matches for feature-flag keys into compact hunks of source
//! text suitable for reporting to a flag-management service.
//!
//! ## Architecture
//!
//! ```text
//! search tool output
//!     │
//!     ├──> SearchRow            (path, match/context marker, line, text)
//!     │
//!     ├──> ReferenceBuilder     exclude paths, truncate text, annotate keys
//!     │
//!     ├──> aggregate_by_path    per-file lines + key -> line-numbers index
//!     │
//!     ├──> make_hunk_reps       per key: clip windows, merge, materialize
//!     │
//!     └──> assemble_hunk_reps   one ReferenceHunksRep per file with hunks
//! ```
//!
//! ## Example
//!
//! ```rust
//! use flagrefs_coderefs::{parse_search_output, ScanOptions, Scanner};
//!
//! let options = ScanOptions {
//!     project_key: "default".to_string(),
//!     flags: vec!["someFlag".to_string(), "anotherFlag".to_string()],
//!     context_lines: 0,
//!     ..Default::default()
//! };
//! let scanner = Scanner::new(options).unwrap();
//!
//! let rows = parse_search_output("flags.txt\x0012:\"someFlag\"\n").unwrap();
//! let outcome = scanner.process(&rows).unwrap();
//!
//! let hunk = &outcome.references[0].hunks[0];
//! assert_eq!(hunk.starting_line_number, 12);
//! assert_eq!(hunk.lines, "\"someFlag\"\n");
//! ```

mod aggregate;
mod assemble;
mod branches;
mod config;
mod error;
mod flags;
mod git;
mod hunk;
mod reference;
mod scan;
mod search;

pub use aggregate::{aggregate_by_path, PathReferences};
pub use assemble::{
    apply_limits, assemble_hunk_reps, make_reference_hunks_reps, LimitedPayload, ScanSummary,
};
pub use branches::calculate_stale_branches;
pub use config::{
    PayloadLimits, ScanOptions, DEFAULT_CONTEXT_LINES, DEFAULT_DELIMITERS, DEFAULT_MAX_FILES,
    DEFAULT_MAX_HUNKS, DEFAULT_SEARCH_TOOL, MAX_LINE_CHAR_COUNT, MIN_FLAG_KEY_LEN,
};
pub use error::{CodeRefsError, Result};
pub use flags::{filter_short_flag_keys, KeyMatcher};
pub use git::{parse_remote_heads, GitRepo};
pub use reference::{truncate_line, LineKind, ReferenceBuilder, ReferenceLine, SearchRow};
pub use scan::{ScanOutcome, Scanner};
pub use search::{parse_search_output, SearchCommand};

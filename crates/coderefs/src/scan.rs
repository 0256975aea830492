use std::path::Path;

use flagrefs_protocol::ReferenceHunksRep;

use crate::assemble::{apply_limits, make_reference_hunks_reps, ScanSummary};
use crate::config::ScanOptions;
use crate::error::Result;
use crate::flags::filter_short_flag_keys;
use crate::reference::{ReferenceBuilder, SearchRow};
use crate::search::SearchCommand;

/// Result of one scan run, ready to hand to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub references: Vec<ReferenceHunksRep>,
    /// Set when payload limits dropped paths or hunks.
    pub truncated: bool,
    pub summary: ScanSummary,
}

/// Validated options plus the compiled pieces they describe.
#[derive(Debug, Clone)]
pub struct Scanner {
    options: ScanOptions,
    builder: ReferenceBuilder,
    dropped_keys: usize,
}

impl Scanner {
    /// Validate `options`, drop short keys and compile the exclude pattern.
    pub fn new(options: ScanOptions) -> Result<Self> {
        options.validate()?;

        let (flags, dropped_keys) = filter_short_flag_keys(options.flags.clone());
        if dropped_keys > 0 {
            log::warn!(
                "Omitting {dropped_keys} flag key(s) shorter than {} characters",
                crate::config::MIN_FLAG_KEY_LEN
            );
        }

        let builder = ReferenceBuilder::new(
            flags,
            &options.delimiters,
            options.context_lines,
            options.exclude_pattern(),
        )?;

        Ok(Self {
            options,
            builder,
            dropped_keys,
        })
    }

    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Keys that will be searched for.
    #[must_use]
    pub fn flag_keys(&self) -> &[String] {
        self.builder.flag_keys()
    }

    #[must_use]
    pub const fn dropped_keys(&self) -> usize {
        self.dropped_keys
    }

    /// Run the configured search tool under `root`.
    pub fn search(&self, root: &Path) -> Result<Vec<SearchRow>> {
        SearchCommand::new(
            self.options.search_tool.as_str(),
            root,
            self.options.search_context(),
        )
        .run(self.flag_keys())
    }

    /// Turn search rows into the hunk payload.
    pub fn process(&self, rows: &[SearchRow]) -> Result<ScanOutcome> {
        let lines = self.builder.generate_references(rows)?;
        log::debug!("{} reference line(s) from {} row(s)", lines.len(), rows.len());

        let references = make_reference_hunks_reps(
            lines,
            &self.options.project_key,
            self.options.context_lines,
        );
        let limited = apply_limits(references, self.options.limits());
        if limited.truncated {
            log::warn!(
                "Payload truncated to {} file(s) / {} hunk(s)",
                self.options.max_files,
                self.options.max_hunks
            );
        }

        let summary = ScanSummary::from_references(&limited.references);
        Ok(ScanOutcome {
            references: limited.references,
            truncated: limited.truncated,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodeRefsError;

    fn options(flags: &[&str]) -> ScanOptions {
        ScanOptions {
            project_key: "default".to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn short_keys_are_dropped_and_counted() {
        let scanner = Scanner::new(options(&["ab", "someFlag", "x"])).unwrap();
        assert_eq!(scanner.flag_keys(), &["someFlag".to_string()]);
        assert_eq!(scanner.dropped_keys(), 2);
    }

    #[test]
    fn all_keys_dropped_is_not_an_error() {
        let scanner = Scanner::new(options(&["ab"])).unwrap();
        assert!(scanner.flag_keys().is_empty());
        let outcome = scanner.process(&[]).unwrap();
        assert!(outcome.references.is_empty());
        assert!(!outcome.truncated);
    }

    #[test]
    fn invalid_exclude_fails_before_processing() {
        let mut opts = options(&["someFlag"]);
        opts.exclude = Some("[".to_string());
        assert!(matches!(
            Scanner::new(opts),
            Err(CodeRefsError::InvalidExclude { .. })
        ));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut opts = options(&["someFlag"]);
        opts.project_key.clear();
        assert!(matches!(Scanner::new(opts), Err(CodeRefsError::InvalidConfig(_))));
    }
}

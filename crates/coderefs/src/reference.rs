//! Raw search rows and the reference lines built from them.

use regex::Regex;

use crate::config::MAX_LINE_CHAR_COUNT;
use crate::error::{CodeRefsError, Result};
use crate::flags::KeyMatcher;

/// Number of columns in a raw search row: `(ignored, path, mode, line, text)`.
pub const SEARCH_ROW_COLUMNS: usize = 5;

const TRUNCATION_MARKER: char = '…';

/// Whether the search tool emitted a row as a match or as surrounding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Match,
    Context,
}

impl LineKind {
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            ":" => Some(Self::Match),
            "-" => Some(Self::Context),
            _ => None,
        }
    }
}

/// One row of search tool output, split into its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRow {
    pub path: String,
    pub kind: LineKind,
    pub line_number: String,
    pub text: String,
}

impl SearchRow {
    /// Build a row from `(ignored, path, mode, line-number, text)` columns.
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        let [_, path, marker, line_number, text] = columns else {
            return Err(CodeRefsError::malformed_row(format!(
                "expected {SEARCH_ROW_COLUMNS} columns, got {}",
                columns.len()
            )));
        };
        let marker = marker.as_ref();
        let kind = LineKind::from_marker(marker).ok_or_else(|| {
            CodeRefsError::malformed_row(format!("unknown mode marker `{marker}`"))
        })?;
        Ok(Self {
            path: path.as_ref().to_string(),
            kind,
            line_number: line_number.as_ref().to_string(),
            text: text.as_ref().to_string(),
        })
    }

    /// Parsed 1-based line number. Only plain ASCII digits are accepted.
    pub fn parse_line_number(&self) -> Result<usize> {
        let digits_only =
            !self.line_number.is_empty() && self.line_number.bytes().all(|b| b.is_ascii_digit());
        match self.line_number.parse::<usize>() {
            Ok(n) if digits_only && n > 0 => Ok(n),
            _ => Err(CodeRefsError::malformed_row(format!(
                "{}: line number `{}` is not a positive integer",
                self.path, self.line_number
            ))),
        }
    }
}

/// A single source line as seen by the search, annotated with referenced keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLine {
    pub path: String,
    pub line_number: usize,
    pub line_text: String,
    /// Empty for lines that only provide context.
    pub flag_keys: Vec<String>,
}

/// Cap `line` at `max_chars` characters, marking the cut with `…`.
#[must_use]
pub fn truncate_line(line: &str, max_chars: usize) -> String {
    match line.char_indices().nth(max_chars) {
        None => line.to_string(),
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len_utf8());
            truncated.push_str(&line[..cut]);
            truncated.push(TRUNCATION_MARKER);
            truncated
        }
    }
}

/// Turns raw search rows into [`ReferenceLine`]s.
#[derive(Debug, Clone)]
pub struct ReferenceBuilder {
    matcher: KeyMatcher,
    context_lines: i64,
    exclude: Option<Regex>,
}

impl ReferenceBuilder {
    /// Fails if `exclude` is not a valid regular expression.
    pub fn new(
        flags: Vec<String>,
        delimiters: &str,
        context_lines: i64,
        exclude: Option<&str>,
    ) -> Result<Self> {
        let exclude = exclude
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CodeRefsError::InvalidExclude {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Self {
            matcher: KeyMatcher::new(flags, delimiters),
            context_lines,
            exclude,
        })
    }

    #[must_use]
    pub fn flag_keys(&self) -> &[String] {
        self.matcher.keys()
    }

    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }

    /// Build the reference line for one row, or `None` if its path is excluded.
    pub fn build_line(&self, row: &SearchRow) -> Result<Option<ReferenceLine>> {
        if self.is_excluded(&row.path) {
            log::debug!("Skipping excluded path {}", row.path);
            return Ok(None);
        }

        let line_number = row.parse_line_number()?;
        let flag_keys = match row.kind {
            LineKind::Match => self.matcher.find_referenced_flags(&row.text),
            LineKind::Context => Vec::new(),
        };
        let line_text = if self.context_lines < 0 {
            String::new()
        } else {
            truncate_line(&row.text, MAX_LINE_CHAR_COUNT)
        };

        Ok(Some(ReferenceLine {
            path: row.path.clone(),
            line_number,
            line_text,
            flag_keys,
        }))
    }

    pub fn generate_references<'a>(
        &self,
        rows: impl IntoIterator<Item = &'a SearchRow>,
    ) -> Result<Vec<ReferenceLine>> {
        let mut lines = Vec::new();
        for row in rows {
            if let Some(line) = self.build_line(row)? {
                lines.push(line);
            }
        }
        Ok(lines)
    }
}

//! Flag-key hygiene and delimiter-bounded key matching.

use crate::config::MIN_FLAG_KEY_LEN;

/// Drop keys too short to search for safely.
///
/// Returns the kept keys in input order and the number removed.
pub fn filter_short_flag_keys(flags: Vec<String>) -> (Vec<String>, usize) {
    let total = flags.len();
    let kept: Vec<String> = flags
        .into_iter()
        .filter(|key| key.chars().count() >= MIN_FLAG_KEY_LEN)
        .collect();
    let removed = total - kept.len();
    (kept, removed)
}

/// Finds which candidate keys occur in a line as delimiter-bounded tokens.
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    keys: Vec<String>,
    delimiters: Vec<char>,
}

impl KeyMatcher {
    pub fn new(keys: Vec<String>, delimiters: &str) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            if !key.is_empty() && !unique.contains(&key) {
                unique.push(key);
            }
        }
        Self {
            keys: unique,
            delimiters: delimiters.chars().collect(),
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Keys referenced by `line`, in candidate order.
    ///
    /// An occurrence counts when each side is the line edge, a delimiter, or a
    /// non-word character, and it is not swallowed by a longer candidate
    /// matched over the same span.
    #[must_use]
    pub fn find_referenced_flags(&self, line: &str) -> Vec<String> {
        let spans: Vec<Vec<(usize, usize)>> = self
            .keys
            .iter()
            .map(|key| {
                if line.contains(key.as_str()) {
                    self.bounded_spans(line, key)
                } else {
                    Vec::new()
                }
            })
            .collect();

        self.keys
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                spans[*idx]
                    .iter()
                    .any(|&(start, end)| !covered_by_longer(start, end, *idx, &spans))
            })
            .map(|(_, key)| key.clone())
            .collect()
    }

    fn bounded_spans(&self, line: &str, key: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start = 0usize;
        while start < line.len() {
            let Some(pos) = line[start..].find(key) else {
                break;
            };
            let idx = start + pos;
            let end = idx + key.len();
            let before = line[..idx].chars().next_back();
            let after = line[end..].chars().next();
            if self.is_boundary(before) && self.is_boundary(after) {
                spans.push((idx, end));
            }
            start = idx + line[idx..].chars().next().map_or(1, char::len_utf8);
        }
        spans
    }

    fn is_boundary(&self, ch: Option<char>) -> bool {
        match ch {
            None => true,
            Some(ch) => self.delimiters.contains(&ch) || !is_word_char(ch),
        }
    }
}

#[must_use]
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn covered_by_longer(start: usize, end: usize, own: usize, spans: &[Vec<(usize, usize)>]) -> bool {
    spans.iter().enumerate().any(|(idx, other)| {
        idx != own
            && other
                .iter()
                .any(|&(s, e)| s <= start && end <= e && e - s > end - start)
    })
}

use std::collections::{BTreeMap, HashMap};

use crate::reference::ReferenceLine;

/// All reference lines seen for one file, plus a key -> line-numbers index.
///
/// Lines are kept in increasing line order with one entry per line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReferences {
    path: String,
    lines: Vec<ReferenceLine>,
    flag_lines: BTreeMap<String, Vec<usize>>,
}

impl PathReferences {
    fn new(path: String) -> Self {
        Self {
            path,
            lines: Vec::new(),
            flag_lines: BTreeMap::new(),
        }
    }

    fn push(&mut self, line: ReferenceLine) {
        self.lines.push(line);
    }

    /// Sort and de-duplicate lines, then rebuild the key index.
    fn finish(&mut self) {
        let path = &self.path;
        self.lines.sort_by_key(|line| line.line_number);
        self.lines.dedup_by(|later, kept| {
            if later.line_number != kept.line_number {
                return false;
            }
            log::debug!("{path}: folding duplicate row for line {}", kept.line_number);
            for key in later.flag_keys.drain(..) {
                if !kept.flag_keys.contains(&key) {
                    kept.flag_keys.push(key);
                }
            }
            if kept.line_text.is_empty() {
                kept.line_text = std::mem::take(&mut later.line_text);
            }
            true
        });

        self.flag_lines.clear();
        for line in &self.lines {
            for key in &line.flag_keys {
                self.flag_lines
                    .entry(key.clone())
                    .or_default()
                    .push(line.line_number);
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn lines(&self) -> &[ReferenceLine] {
        &self.lines
    }

    /// Flag key -> line numbers at which it matched, in file order.
    #[must_use]
    pub const fn flag_lines(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.flag_lines
    }

    #[must_use]
    pub fn line_numbers_for(&self, flag_key: &str) -> &[usize] {
        self.flag_lines
            .get(flag_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Storage index of `line_number`, if the search emitted that line.
    #[must_use]
    pub fn position_of(&self, line_number: usize) -> Option<usize> {
        self.lines
            .binary_search_by_key(&line_number, |line| line.line_number)
            .ok()
    }
}

/// Partition reference lines by path, in order of first appearance.
///
/// Rows for one path may arrive in any order and may repeat; each group ends
/// up sorted by line number with duplicates folded together.
pub fn aggregate_by_path(lines: Vec<ReferenceLine>) -> Vec<PathReferences> {
    let mut groups: Vec<PathReferences> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();

    for line in lines {
        let idx = match by_path.get(&line.path) {
            Some(&idx) => idx,
            None => {
                groups.push(PathReferences::new(line.path.clone()));
                by_path.insert(line.path.clone(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[idx].push(line);
    }

    for group in &mut groups {
        group.finish();
    }
    groups
}

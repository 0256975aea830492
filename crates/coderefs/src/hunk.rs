//! Hunk building: per flag key, cover every match with up to `R` lines of
//! context, merging windows that overlap or touch.
//!
//! Windows are clipped on each side independently against the lines the
//! search actually emitted. A match on the first line of a file therefore
//! gets no leading context and still only `R` trailing lines, and a window
//! never reaches across a gap into a neighbouring hunk.

use flagrefs_protocol::HunkRep;

use crate::aggregate::PathReferences;

/// Inclusive range of storage positions within one [`PathReferences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: usize,
    end: usize,
}

impl PathReferences {
    /// Hunks for every flag key referenced in this file, ordered by starting line.
    #[must_use]
    pub fn make_hunk_reps(&self, project_key: &str, context_lines: i64) -> Vec<HunkRep> {
        let mut hunks: Vec<HunkRep> = self
            .flag_lines()
            .iter()
            .flat_map(|(flag_key, matched)| {
                self.hunks_for_flag(project_key, flag_key, matched, context_lines)
            })
            .collect();
        hunks.sort_by(|a, b| {
            a.starting_line_number
                .cmp(&b.starting_line_number)
                .then_with(|| a.flag_key.cmp(&b.flag_key))
        });
        hunks
    }

    fn hunks_for_flag(
        &self,
        project_key: &str,
        flag_key: &str,
        matched: &[usize],
        context_lines: i64,
    ) -> Vec<HunkRep> {
        // Text is suppressed: one empty hunk per match, never merged.
        if context_lines < 0 {
            return matched
                .iter()
                .map(|&line_number| HunkRep {
                    starting_line_number: line_number,
                    lines: String::new(),
                    proj_key: project_key.to_string(),
                    flag_key: flag_key.to_string(),
                })
                .collect();
        }

        let radius = usize::try_from(context_lines).unwrap_or(usize::MAX);
        let lines = self.lines();
        let mut windows: Vec<Window> = Vec::new();

        for &line_number in matched {
            let Some(pos) = self.position_of(line_number) else {
                log::warn!(
                    "{}: line {line_number} indexed for {flag_key} but not present",
                    self.path()
                );
                continue;
            };
            let window = self.window_around(pos, radius);
            if let Some(current) = windows.last_mut() {
                // Overlapping or touching windows merge.
                if lines[window.start].line_number
                    <= lines[current.end].line_number.saturating_add(1)
                {
                    current.end = current.end.max(window.end);
                    continue;
                }
            }
            windows.push(window);
        }

        windows
            .into_iter()
            .map(|window| self.materialize(window, project_key, flag_key))
            .collect()
    }

    /// Extend from `pos` by up to `radius` consecutive lines on each side.
    fn window_around(&self, pos: usize, radius: usize) -> Window {
        let lines = self.lines();
        let contiguous =
            |lo: usize| lines[lo].line_number.saturating_add(1) == lines[lo + 1].line_number;

        let mut start = pos;
        while pos - start < radius && start > 0 && contiguous(start - 1) {
            start -= 1;
        }

        let mut end = pos;
        while end - pos < radius && end + 1 < lines.len() && contiguous(end) {
            end += 1;
        }

        Window { start, end }
    }

    fn materialize(&self, window: Window, project_key: &str, flag_key: &str) -> HunkRep {
        let lines = &self.lines()[window.start..=window.end];
        let mut block = String::new();
        for line in lines {
            block.push_str(&line.line_text);
            block.push('\n');
        }
        HunkRep {
            starting_line_number: lines[0].line_number,
            lines: block,
            proj_key: project_key.to_string(),
            flag_key: flag_key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_by_path;
    use crate::reference::ReferenceLine;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const PROJ: &str = "test";

    fn line(line_number: usize, text: &str, keys: &[&str]) -> ReferenceLine {
        ReferenceLine {
            path: "a/b".to_string(),
            line_number,
            line_text: text.to_string(),
            flag_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn hunk(start: usize, lines: &str, flag_key: &str) -> HunkRep {
        HunkRep {
            starting_line_number: start,
            lines: lines.to_string(),
            proj_key: PROJ.to_string(),
            flag_key: flag_key.to_string(),
        }
    }

    fn build(refs: Vec<ReferenceLine>, context_lines: i64) -> Vec<HunkRep> {
        let groups = aggregate_by_path(refs);
        assert_eq!(groups.len(), 1);
        groups[0].make_hunk_reps(PROJ, context_lines)
    }

    fn five_lines_two_matches() -> Vec<ReferenceLine> {
        vec![
            line(5, "context -1", &[]),
            line(6, "flag-1", &["flag-1"]),
            line(7, "context inner", &[]),
            line(8, "flag-1", &["flag-1"]),
            line(9, "context +1", &[]),
        ]
    }

    #[test]
    fn single_reference_with_context_lines() {
        let refs = vec![
            line(5, "context -1", &[]),
            line(6, "flag-1", &["flag-1"]),
            line(7, "context +1", &[]),
        ];
        assert_eq!(
            build(refs, 1),
            vec![hunk(5, "context -1\nflag-1\ncontext +1\n", "flag-1")]
        );
    }

    #[test]
    fn overlapping_windows_merge_into_one_hunk() {
        let want = vec![hunk(
            5,
            "context -1\nflag-1\ncontext inner\nflag-1\ncontext +1\n",
            "flag-1",
        )];
        assert_eq!(build(five_lines_two_matches(), 1), want);
        assert_eq!(build(five_lines_two_matches(), 2), want);
    }

    #[test]
    fn separated_windows_make_separate_hunks() {
        let refs = vec![
            line(5, "a context -1", &[]),
            line(6, "a flag-1", &["flag-1"]),
            line(7, "a context +1", &[]),
            line(9, "b context -1", &[]),
            line(10, "b flag-1", &["flag-1"]),
            line(11, "b context +1", &[]),
        ];
        assert_eq!(
            build(refs, 1),
            vec![
                hunk(5, "a context -1\na flag-1\na context +1\n", "flag-1"),
                hunk(9, "b context -1\nb flag-1\nb context +1\n", "flag-1"),
            ]
        );
    }

    #[test]
    fn touching_windows_merge() {
        let refs = vec![
            line(5, "a", &[]),
            line(6, "flag-1", &["flag-1"]),
            line(7, "b", &[]),
            line(8, "c", &[]),
            line(9, "flag-1", &["flag-1"]),
            line(10, "d", &[]),
        ];
        assert_eq!(
            build(refs, 1),
            vec![hunk(5, "a\nflag-1\nb\nc\nflag-1\nd\n", "flag-1")]
        );
    }

    #[test]
    fn merging_is_per_flag_key() {
        let refs = vec![
            line(5, "context -1", &[]),
            line(6, "flag-1", &["flag-1"]),
            line(7, "context inner", &[]),
            line(8, "flag-2", &["flag-2"]),
            line(9, "context +1", &[]),
        ];
        assert_eq!(
            build(refs, 1),
            vec![
                hunk(5, "context -1\nflag-1\ncontext inner\n", "flag-1"),
                hunk(7, "context inner\nflag-2\ncontext +1\n", "flag-2"),
            ]
        );
    }

    #[test]
    fn adjacent_hunks_of_different_keys_stay_apart() {
        let refs = vec![
            line(5, "a context -1", &[]),
            line(6, "a flag-1", &["flag-1"]),
            line(7, "a context +1", &[]),
            line(8, "b context -1", &[]),
            line(9, "b flag-2", &["flag-2"]),
            line(10, "b context +1", &[]),
        ];
        assert_eq!(
            build(refs, 1),
            vec![
                hunk(5, "a context -1\na flag-1\na context +1\n", "flag-1"),
                hunk(8, "b context -1\nb flag-2\nb context +1\n", "flag-2"),
            ]
        );
    }

    #[test]
    fn zero_context_keeps_only_matched_lines() {
        assert_eq!(
            build(five_lines_two_matches(), 0),
            vec![hunk(6, "flag-1\n", "flag-1"), hunk(8, "flag-1\n", "flag-1")]
        );
    }

    #[test]
    fn zero_context_merges_adjacent_matches() {
        let refs = vec![line(3, "flag-1 a", &["flag-1"]), line(4, "flag-1 b", &["flag-1"])];
        assert_eq!(
            build(refs, 0),
            vec![hunk(3, "flag-1 a\nflag-1 b\n", "flag-1")]
        );
    }

    #[test]
    fn negative_context_yields_empty_hunks() {
        assert_eq!(
            build(five_lines_two_matches(), -1),
            vec![hunk(6, "", "flag-1"), hunk(8, "", "flag-1")]
        );
    }

    #[test]
    fn negative_context_never_merges_adjacent_matches() {
        let refs = vec![line(3, "", &["flag-1"]), line(4, "", &["flag-1"])];
        assert_eq!(
            build(refs, -1),
            vec![hunk(3, "", "flag-1"), hunk(4, "", "flag-1")]
        );
    }

    #[test]
    fn match_on_first_line_does_not_overextend() {
        let refs = vec![
            line(1, "flag-1", &["flag-1"]),
            line(2, "context+1", &[]),
            line(3, "context+3", &[]),
            line(10, "context-1", &[]),
            line(11, "flag-1", &["flag-1"]),
            line(12, "context+1", &[]),
        ];
        assert_eq!(
            build(refs, 1),
            vec![
                hunk(1, "flag-1\ncontext+1\n", "flag-1"),
                hunk(10, "context-1\nflag-1\ncontext+1\n", "flag-1"),
            ]
        );
    }

    #[test]
    fn window_stops_at_gap_after_match() {
        let refs = vec![
            line(1, "context-1", &[]),
            line(2, "flag-1", &["flag-1"]),
            line(3, "context+1", &[]),
            line(4, "context+2", &[]),
            line(10, "context+alot+shouldn'tbeinhunk", &[]),
        ];
        assert_eq!(
            build(refs, 2),
            vec![hunk(1, "context-1\nflag-1\ncontext+1\ncontext+2\n", "flag-1")]
        );
    }

    #[test]
    fn window_stops_at_gap_before_match() {
        let refs = vec![
            line(2, "far away", &[]),
            line(8, "context-1", &[]),
            line(9, "flag-1", &["flag-1"]),
        ];
        assert_eq!(
            build(refs, 3),
            vec![hunk(8, "context-1\nflag-1\n", "flag-1")]
        );
    }

    #[test]
    fn one_line_with_two_keys_gives_two_hunks() {
        let refs = vec![line(4, "\"a-flag\" \"b-flag\"", &["a-flag", "b-flag"])];
        assert_eq!(
            build(refs, 0),
            vec![
                hunk(4, "\"a-flag\" \"b-flag\"\n", "a-flag"),
                hunk(4, "\"a-flag\" \"b-flag\"\n", "b-flag"),
            ]
        );
    }

    #[test]
    fn out_of_order_rows_still_cover_every_match() {
        let refs = vec![
            line(9, "someFlag late", &["someFlag"]),
            line(2, "someFlag early", &["someFlag"]),
        ];
        assert_eq!(
            build(refs, 0),
            vec![
                hunk(2, "someFlag early\n", "someFlag"),
                hunk(9, "someFlag late\n", "someFlag"),
            ]
        );
    }

    /// Lines 1..=n with holes, and a subset of present lines marked as matches.
    fn file_strategy() -> impl Strategy<Value = (Vec<ReferenceLine>, i64)> {
        (
            prop::collection::vec((any::<bool>(), any::<bool>()), 1..60),
            -1i64..5,
        )
            .prop_map(|(slots, radius)| {
                let refs: Vec<ReferenceLine> = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, (present, _))| *present)
                    .map(|(idx, (_, matched))| {
                        let keys: &[&str] = if *matched { &["flag-1"] } else { &[] };
                        line(idx + 1, &format!("line {}", idx + 1), keys)
                    })
                    .collect();
                (refs, radius)
            })
    }

    fn covered_lines(hunk: &HunkRep) -> std::ops::RangeInclusive<usize> {
        let count = hunk.line_count().max(1);
        hunk.starting_line_number..=hunk.starting_line_number + count - 1
    }

    proptest! {
        #[test]
        fn proptest_hunks_cover_every_match((refs, radius) in file_strategy()) {
            let groups = aggregate_by_path(refs);
            prop_assume!(!groups.is_empty());
            let group = &groups[0];
            let hunks = group.make_hunk_reps(PROJ, radius);
            for matched in group.line_numbers_for("flag-1") {
                prop_assert!(hunks.iter().any(|h| covered_lines(h).contains(matched)));
            }
        }

        #[test]
        fn proptest_hunks_are_maximally_merged((refs, radius) in file_strategy()) {
            prop_assume!(radius >= 0);
            let groups = aggregate_by_path(refs);
            prop_assume!(!groups.is_empty());
            let hunks = groups[0].make_hunk_reps(PROJ, radius);
            for pair in hunks.windows(2) {
                let prev_end = *covered_lines(&pair[0]).end();
                let next_start = pair[1].starting_line_number;
                prop_assert!(
                    next_start > prev_end + 1,
                    "hunk at {} touches the one ending at {}",
                    next_start,
                    prev_end
                );
            }
        }

        #[test]
        fn proptest_hunks_stay_within_radius_of_their_matches((refs, radius) in file_strategy()) {
            prop_assume!(radius >= 0);
            let groups = aggregate_by_path(refs);
            prop_assume!(!groups.is_empty());
            let group = &groups[0];
            let hunks = group.make_hunk_reps(PROJ, radius);
            let reach = usize::try_from(radius).unwrap_or_default();
            let matched = group.line_numbers_for("flag-1");
            for h in hunks {
                let span = covered_lines(&h);
                let inside: Vec<usize> = matched
                    .iter()
                    .copied()
                    .filter(|m| span.contains(m))
                    .collect();
                prop_assert!(!inside.is_empty());
                for covered in span.clone() {
                    prop_assert!(
                        inside.iter().any(|m| m.abs_diff(covered) <= reach),
                        "line {} of hunk at {} is more than {} lines from any match",
                        covered,
                        h.starting_line_number,
                        reach
                    );
                }
            }
        }

        #[test]
        fn proptest_hunks_only_contain_emitted_lines((refs, radius) in file_strategy()) {
            prop_assume!(radius >= 0);
            let groups = aggregate_by_path(refs);
            prop_assume!(!groups.is_empty());
            let group = &groups[0];
            for h in group.make_hunk_reps(PROJ, radius) {
                let first = group.position_of(h.starting_line_number);
                prop_assert!(first.is_some());
                let first = first.unwrap_or_default();
                let expected: String = group.lines()[first..first + h.line_count()]
                    .iter()
                    .map(|l| format!("{}\n", l.line_text))
                    .collect();
                prop_assert_eq!(&h.lines, &expected);
            }
        }
    }
}

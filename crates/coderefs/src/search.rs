//! Drives ripgrep and parses its output into [`SearchRow`]s.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CodeRefsError, Result};
use crate::reference::SearchRow;

/// `path NUL line-number marker text`, as printed by `rg --null`.
static ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<path>[^\x00]+)\x00(?P<line>[0-9]+)(?P<mode>[:-])(?P<text>.*)$")
        .expect("valid search row regex")
});

const GROUP_SEPARATOR: &str = "--";

/// One invocation of the search tool over a directory tree.
#[derive(Debug, Clone)]
pub struct SearchCommand {
    tool: String,
    root: PathBuf,
    context_lines: usize,
}

impl SearchCommand {
    pub fn new(tool: impl Into<String>, root: impl AsRef<Path>, context_lines: usize) -> Self {
        Self {
            tool: tool.into(),
            root: root.as_ref().to_path_buf(),
            context_lines,
        }
    }

    /// Arguments passed to the tool; patterns are fed on stdin.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--no-config",
            "--color",
            "never",
            "--no-heading",
            "--with-filename",
            "--line-number",
            "--null",
            "--fixed-strings",
            "--file",
            "-",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if self.context_lines > 0 {
            args.push("--context".to_string());
            args.push(self.context_lines.to_string());
        }
        args.push("--".to_string());
        args.push(".".to_string());
        args
    }

    /// Search for every key and return the matched and context rows.
    pub fn run(&self, flag_keys: &[String]) -> Result<Vec<SearchRow>> {
        if flag_keys.is_empty() {
            log::debug!("No flag keys to search for; skipping {}", self.tool);
            return Ok(Vec::new());
        }

        if !self.root.is_dir() {
            return Err(CodeRefsError::invalid_config(format!(
                "search root {} is not a directory",
                self.root.display()
            )));
        }

        log::debug!(
            "Running {} {} in {}",
            self.tool,
            self.args().join(" "),
            self.root.display()
        );
        let mut child = Command::new(&self.tool)
            .args(self.args())
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => CodeRefsError::SearchToolMissing(self.tool.clone()),
                _ => CodeRefsError::IoError(err),
            })?;

        // A tool that exits early closes its stdin; its status explains why.
        let written = match child.stdin.take() {
            Some(mut stdin) => {
                let mut patterns = flag_keys.join("\n");
                patterns.push('\n');
                stdin.write_all(patterns.as_bytes())
            }
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        // 0 = matches, 1 = no matches.
        match output.status.code() {
            Some(0 | 1) => {
                written?;
                parse_search_output(&String::from_utf8_lossy(&output.stdout))
            }
            code => {
                if let Err(err) = written {
                    log::debug!("Writing patterns to {} failed: {err}", self.tool);
                }
                Err(CodeRefsError::SearchFailed {
                    tool: self.tool.clone(),
                    status: code.unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                })
            }
        }
    }
}

/// Parse captured `rg --null --line-number` output.
///
/// Group separators and blank lines are skipped; any other line that does not
/// look like a result row is an error.
pub fn parse_search_output(output: &str) -> Result<Vec<SearchRow>> {
    let mut rows = Vec::new();
    for raw in output.lines() {
        if raw.is_empty() || raw == GROUP_SEPARATOR {
            continue;
        }
        let caps = ROW_RE.captures(raw).ok_or_else(|| {
            CodeRefsError::malformed_row(format!("unrecognized search output line `{raw}`"))
        })?;
        let path = normalize_path(&caps["path"]);
        let columns = [&caps[0], path.as_str(), &caps["mode"], &caps["line"], &caps["text"]];
        rows.push(SearchRow::from_columns(&columns)?);
    }
    Ok(rows)
}

fn normalize_path(raw: &str) -> String {
    let mut path = raw.replace('\\', "/");
    while let Some(stripped) = path.strip_prefix("./") {
        path = stripped.to_string();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::LineKind;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn parses_match_and_context_rows() {
        let output = "./src/app.js\x0011-const a = 1;\n\
                      ./src/app.js\x0012:if (flags[\"someFlag\"]) {\n\
                      --\n\
                      lib\\util.py\x007:x = 'someFlag'\r\n";
        let rows = parse_search_output(output).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].path, "src/app.js");
        assert_eq!(rows[0].kind, LineKind::Context);
        assert_eq!(rows[0].line_number, "11");
        assert_eq!(rows[0].text, "const a = 1;");

        assert_eq!(rows[1].kind, LineKind::Match);
        assert_eq!(rows[1].text, "if (flags[\"someFlag\"]) {");

        assert_eq!(rows[2].path, "lib/util.py");
        assert_eq!(rows[2].text, "x = 'someFlag'");
    }

    #[test]
    fn text_may_contain_separators() {
        let rows = parse_search_output("a.txt\x003:b-c:d\n").unwrap();
        assert_eq!(rows[0].line_number, "3");
        assert_eq!(rows[0].text, "b-c:d");
    }

    #[test]
    fn empty_output_has_no_rows() {
        assert!(parse_search_output("").unwrap().is_empty());
    }

    #[test]
    fn unrecognized_output_is_an_error() {
        let err = parse_search_output("src/app.js:12:someFlag\n").unwrap_err();
        assert!(matches!(err, CodeRefsError::MalformedRow(_)));
    }

    #[test]
    fn args_request_context_only_when_positive() {
        let args = SearchCommand::new("rg", ".", 0).args();
        assert!(!args.contains(&"--context".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("."));

        let args = SearchCommand::new("rg", ".", 3).args();
        let idx = args.iter().position(|a| a == "--context").unwrap();
        assert_eq!(args[idx + 1], "3");
    }

    #[test]
    fn no_keys_does_not_spawn() {
        let cmd = SearchCommand::new("definitely-not-a-search-tool", ".", 0);
        assert!(cmd.run(&[]).unwrap().is_empty());
    }

    #[test]
    fn missing_tool_is_reported() {
        let cmd = SearchCommand::new("definitely-not-a-search-tool", ".", 0);
        let err = cmd.run(&["someFlag".to_string()]).unwrap_err();
        assert!(matches!(err, CodeRefsError::SearchToolMissing(_)));
    }

    #[test]
    fn missing_root_is_not_a_missing_tool() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("does-not-exist");
        let cmd = SearchCommand::new("sh", &root, 0);
        let err = cmd.run(&["someFlag".to_string()]).unwrap_err();
        assert!(matches!(err, CodeRefsError::InvalidConfig(_)), "{err}");
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[cfg(unix)]
    fn failing_tool(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("failing-search");
        std::fs::write(&script, "#!/bin/sh\necho 'regex parse error' >&2\nexit 2\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn error_status_carries_stderr() {
        let dir = tempdir().unwrap();
        let tool = failing_tool(dir.path());
        let cmd = SearchCommand::new(tool.to_string_lossy(), dir.path(), 0);
        match cmd.run(&["someFlag".to_string()]) {
            Err(CodeRefsError::SearchFailed { status, stderr, .. }) => {
                assert_eq!(status, 2);
                assert_eq!(stderr, "regex parse error");
            }
            other => panic!("expected SearchFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_status_instead_of_write_error() {
        let dir = tempdir().unwrap();
        let tool = failing_tool(dir.path());
        let cmd = SearchCommand::new(tool.to_string_lossy(), dir.path(), 0);
        // Enough patterns to overflow the pipe buffer after the tool has exited.
        let keys: Vec<String> = (0..20_000).map(|i| format!("someFlag{i:08}")).collect();
        let err = cmd.run(&keys).unwrap_err();
        assert!(
            matches!(err, CodeRefsError::SearchFailed { status: 2, .. }),
            "{err}"
        );
    }
}

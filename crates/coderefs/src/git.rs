use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CodeRefsError, Result};

const HEADS_PREFIX: &str = "refs/heads/";

/// Read-only view of the git checkout being scanned.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|err| CodeRefsError::git(format!("failed to run git: {err}")))?;
        if !output.status.success() {
            return Err(CodeRefsError::git(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn current_branch(&self) -> Result<String> {
        let name = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if name.is_empty() || name == "HEAD" {
            return Err(CodeRefsError::git(format!(
                "{} is not on a named branch",
                self.root.display()
            )));
        }
        Ok(name)
    }

    pub fn head_sha(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"])
    }

    /// Branch names that still exist on the default remote.
    pub fn remote_branches(&self) -> Result<HashSet<String>> {
        let output = self.run(&["ls-remote", "--quiet", "--heads"])?;
        Ok(parse_remote_heads(&output))
    }
}

/// Parse `git ls-remote --heads` output (`<sha>\trefs/heads/<name>`).
pub fn parse_remote_heads(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .filter_map(|(_, reference)| reference.trim().strip_prefix(HEADS_PREFIX))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

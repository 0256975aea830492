use std::collections::HashSet;

use flagrefs_protocol::BranchRep;

/// Names of known branches that no longer exist on the remote.
pub fn calculate_stale_branches(
    branches: &[BranchRep],
    remote_branches: &HashSet<String>,
) -> Vec<String> {
    branches
        .iter()
        .filter(|branch| !remote_branches.contains(&branch.name))
        .map(|branch| branch.name.clone())
        .collect()
}

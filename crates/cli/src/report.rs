use anyhow::{Context, Result};
use flagrefs_coderefs::ScanOutcome;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write `value` as JSON to `out`, or to stdout when no path is given.
pub(crate) fn write_json<T: Serialize>(value: &T, pretty: bool, out: Option<&Path>) -> Result<()> {
    let json = flagrefs_protocol::serialize_json(value, pretty)?;
    match out {
        Some(path) => fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

pub(crate) fn log_summary(outcome: &ScanOutcome, flag_keys: &[String]) {
    let summary = &outcome.summary;
    log::info!(
        "Found {} hunk(s) referencing {} of {} flag key(s) in {} file(s)",
        summary.hunks,
        summary.flag_keys.len(),
        flag_keys.len(),
        summary.files
    );
    let missing = summary.unreferenced(flag_keys);
    if !missing.is_empty() {
        log::debug!("No references found for: {}", missing.join(", "));
    }
}

use thiserror::Error;

/// Result type for code-reference operations
pub type Result<T> = std::result::Result<T, CodeRefsError>;

/// Errors that can occur while collecting code references
#[derive(Error, Debug)]
pub enum CodeRefsError {
    /// The path exclusion pattern did not compile
    #[error("Invalid exclude pattern `{pattern}`: {source}")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A search result row does not have the expected shape
    #[error("Malformed search row: {0}")]
    MalformedRow(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The search binary could not be spawned
    #[error("Search tool `{0}` not found")]
    SearchToolMissing(String),

    /// The search binary exited with an error status
    #[error("Search tool `{tool}` failed (status {status}): {stderr}")]
    SearchFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// A git invocation failed
    #[error("Git error: {0}")]
    Git(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CodeRefsError {
    /// Create a malformed row error
    pub fn malformed_row(msg: impl Into<String>) -> Self {
        Self::MalformedRow(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
    }
}

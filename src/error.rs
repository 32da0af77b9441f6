use crate::redmine_client::ClientError;
use thiserror::Error;

/// Failures that abort a tool call. Structured "not found" style results are
/// not errors; see `records::ToolResponse`.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("Gave up after {max_pages} pages with {total_count} records reported upstream")]
    PageLimitExceeded { max_pages: u64, total_count: u64 },
}

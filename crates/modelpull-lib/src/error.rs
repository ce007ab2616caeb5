use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelPullError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported host in {url}: expected a URL on {mirror_host} or {canonical_host}")]
    UnsupportedHost {
        url: String,
        mirror_host: String,
        canonical_host: String,
    },

    #[error(
        "{url} is not a \"Files and versions\" URL. Use the URL that contains `/tree/main`, not the model card"
    )]
    NotAListingUrl { url: String },

    #[error("Failed to fetch {url}: {reason}")]
    PageFetch { url: String, reason: String },

    #[error(
        "No files detected on {url}. Use the \"Files and versions\" URL that contains `/tree/main`, not the model card"
    )]
    EmptyListing { url: String },

    #[error(
        "Found {markers} download marker(s) on {url} but none links to a file; the page layout may have changed"
    )]
    UnusableDownloadLinks { url: String, markers: usize },

    #[error("Embedded file listing not found on {url}")]
    PayloadNotFound { url: String },

    #[error("Failed to parse file listing from {url}: {reason}")]
    PayloadParse { url: String, reason: String },

    #[error("Listing at {url} did not finish within {limit} continuation pages")]
    PaginationLimit { url: String, limit: usize },

    #[error("Listing is inconsistent, {} file(s) shown on the page are missing from the full listing: {}", .missing.len(), .missing.join(", "))]
    Consistency { missing: Vec<String> },

    #[error("Download directory creation failed at {path}: {reason}")]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("Download to {destination} cancelled by user")]
    UserAbort { destination: PathBuf },

    #[error("More than one file would be written to {path}")]
    DuplicateDestination { path: PathBuf },

    #[error("{failed} of {total} downloads did not complete")]
    TransfersFailed { failed: usize, total: usize },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}

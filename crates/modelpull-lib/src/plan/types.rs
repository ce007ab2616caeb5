use crate::config::DownloadConfig;
use std::path::PathBuf;

/// One file transfer derived from a listing entry and the download policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Repository-relative path, kept for reporting
    pub path: String,
    pub url: String,
    pub destination_path: PathBuf,
    pub skip: bool,
    /// Continue from bytes already on disk. When false, any existing copy
    /// is discarded before the first attempt so upstream edits are picked up.
    pub resume: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPolicy {
    /// Entries ending in one of these are never downloaded
    pub exclude_extensions: Vec<String>,
    /// Large immutable files that are only fetched when missing locally
    pub weight_extensions: Vec<String>,
    pub update_existing: bool,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self::from(&DownloadConfig::default())
    }
}

impl From<&DownloadConfig> for PlanPolicy {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            exclude_extensions: config.exclude_extensions.clone(),
            weight_extensions: config.weight_extensions.clone(),
            update_existing: config.update_existing,
        }
    }
}

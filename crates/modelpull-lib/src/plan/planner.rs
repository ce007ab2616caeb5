use super::types::{DownloadTask, PlanPolicy};
use crate::listing::Listing;
use crate::utils::has_extension;
use std::path::Path;

/// Turns a listing into download tasks. Only probes the destination for
/// existing files, nothing is written.
pub fn plan_downloads(
    listing: &Listing,
    destination_root: &Path,
    policy: &PlanPolicy,
) -> Vec<DownloadTask> {
    listing
        .iter()
        .filter(|entry| {
            let excluded = has_extension(&entry.path, &policy.exclude_extensions);
            if excluded {
                tracing::debug!(path = %entry.path, "Excluded by extension");
            }
            !excluded
        })
        .map(|entry| {
            let destination_path = destination_root.join(&entry.path);
            let is_weight = has_extension(&entry.path, &policy.weight_extensions);
            let skip = policy.update_existing && is_weight && destination_path.exists();

            DownloadTask {
                path: entry.path.clone(),
                url: entry.download_url.clone(),
                destination_path,
                skip,
                resume: is_weight,
            }
        })
        .collect()
}

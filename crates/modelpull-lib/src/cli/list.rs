use crate::cli::ListParams;
use crate::config::MirrorConfig;
use crate::error::ModelPullError;
use crate::listing::{Listing, ListingResolver, ListingUrl, ReqwestPageFetcher};
use itertools::Itertools;

/// Fetches and reconciles the listing behind `listing_url` over HTTP.
pub async fn resolve_listing(
    listing_url: &ListingUrl,
    mirror: &MirrorConfig,
) -> Result<Listing, ModelPullError> {
    let fetcher = ReqwestPageFetcher::new(mirror)?;
    let resolver = ListingResolver::new(fetcher, mirror.max_continuation_pages);
    resolver.resolve(listing_url).await
}

pub fn format_listing(listing: &Listing) -> String {
    let rule = "=".repeat(50);
    let rows = listing
        .iter()
        .map(|entry| format!("{:45} | {}", entry.path, entry.download_url))
        .join("\n");
    format!("{rule}\n{rows}\n{rule}\n{} files in total!", listing.len())
}

pub async fn run_list(params: ListParams) -> Result<Listing, ModelPullError> {
    let ListParams {
        listing_url,
        mirror,
    } = params;

    let listing = resolve_listing(&listing_url, &mirror).await?;
    println!("{}", format_listing(&listing));
    Ok(listing)
}

use super::fetcher::PageFetcher;
use super::page::ListingPage;
use super::types::{ContinuationPage, FileEntry, Listing, RawEntry};
use super::url::ListingUrl;
use crate::error::ModelPullError;
use crate::utils::is_contained_relative_path;
use itertools::Itertools;

/// Reconciles the links rendered on a listing page with the paginated tree
/// listing embedded in it and produces the canonical file list.
pub struct ListingResolver<F> {
    fetcher: F,
    max_continuation_pages: usize,
}

impl<F: PageFetcher> ListingResolver<F> {
    pub fn new(fetcher: F, max_continuation_pages: usize) -> Self {
        Self {
            fetcher,
            max_continuation_pages,
        }
    }

    pub async fn resolve(&self, listing_url: &ListingUrl) -> Result<Listing, ModelPullError> {
        let page_url = listing_url.page_url();
        tracing::info!("Resolving file listing of {}", page_url);

        let html = self.fetcher.fetch_text(page_url).await?;
        let page = ListingPage::parse(&html)?;

        if page.visible.is_empty() && page.markers_without_href > 0 {
            return Err(ModelPullError::UnusableDownloadLinks {
                url: page_url.to_string(),
                markers: page.markers_without_href,
            });
        }
        if page.visible.is_empty() {
            return Err(ModelPullError::EmptyListing {
                url: page_url.to_string(),
            });
        }

        let visible = page
            .visible
            .iter()
            .map(|link| FileEntry {
                path: link.path.clone(),
                download_url: listing_url.join_root_relative(&link.href),
            })
            .collect::<Vec<_>>();

        let first_page = page.pagination(page_url)?;
        let mut next_url = first_page.next_url().map(str::to_string);
        let mut raw_entries = first_page.entries;
        let mut continuation_pages = 0;

        while let Some(next) = next_url.take() {
            if continuation_pages >= self.max_continuation_pages {
                return Err(ModelPullError::PaginationLimit {
                    url: page_url.to_string(),
                    limit: self.max_continuation_pages,
                });
            }
            continuation_pages += 1;

            let continuation_url = listing_url.join_root_relative(&next);
            tracing::debug!(url = %continuation_url, page = continuation_pages, "Fetching continuation page");
            let body = self.fetcher.fetch_text(&continuation_url).await?;
            let continuation = serde_json::from_str::<ContinuationPage>(&body)
                .map_err(|e| ModelPullError::PayloadParse {
                    url: continuation_url.clone(),
                    reason: e.to_string(),
                })?
                .into_page();

            next_url = continuation.next_url().map(str::to_string);
            raw_entries.extend(continuation.entries);
        }

        let listing = build_listing(listing_url, raw_entries)?;
        tracing::info!(
            visible = visible.len(),
            total = listing.len(),
            continuation_pages,
            "Resolved file listing"
        );

        check_consistency(&visible, &listing)?;
        Ok(listing)
    }
}

fn build_listing(
    listing_url: &ListingUrl,
    raw_entries: Vec<RawEntry>,
) -> Result<Listing, ModelPullError> {
    let entries = raw_entries
        .into_iter()
        .filter(RawEntry::is_file)
        .map(|entry| {
            if !is_contained_relative_path(&entry.path) {
                return Err(ModelPullError::PayloadParse {
                    url: listing_url.page_url().to_string(),
                    reason: format!("file path {:?} escapes the repository root", entry.path),
                });
            }
            Ok(FileEntry {
                download_url: listing_url.download_url(&entry.path),
                path: entry.path,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Listing::new(entries))
}

/// Every file rendered on the page must be part of the full listing.
fn check_consistency(visible: &[FileEntry], listing: &Listing) -> Result<(), ModelPullError> {
    let missing = visible
        .iter()
        .filter(|entry| !listing.contains(entry))
        .inspect(|entry| {
            tracing::error!(path = %entry.path, url = %entry.download_url, "Visible file missing from listing")
        })
        .map(|entry| entry.path.clone())
        .collect_vec();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ModelPullError::Consistency { missing })
    }
}

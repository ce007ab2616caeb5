mod fetcher;
mod page;
mod resolver;
mod types;
mod url;

pub use fetcher::{PageFetcher, ReqwestPageFetcher};
pub use page::{ListingPage, VisibleLink};
pub use resolver::ListingResolver;
pub use types::{ContinuationPage, FileEntry, Listing, PaginationPage, RawEntry};
pub use url::{ListingUrl, decode_path, encode_download_url};

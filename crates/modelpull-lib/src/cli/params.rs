use crate::config::{MirrorConfig, TransportKind};
use crate::download::ExecuteOptions;
use crate::listing::ListingUrl;
use crate::plan::PlanPolicy;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ListParams {
    pub listing_url: ListingUrl,
    pub mirror: MirrorConfig,
}

#[derive(Debug, Clone)]
pub struct DownloadParams {
    pub listing_url: ListingUrl,
    pub mirror: MirrorConfig,
    pub destination_root: PathBuf,
    pub policy: PlanPolicy,
    pub options: ExecuteOptions,
    pub transport: TransportKind,
    pub assume_yes: bool,
}

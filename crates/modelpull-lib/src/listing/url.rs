use crate::config::MirrorConfig;
use crate::error::ModelPullError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::path::PathBuf;

const TREE_SEGMENT: &str = "tree/main";
const RESOLVE_SEGMENT: &str = "resolve/main";
const DOWNLOAD_QUERY: &str = "?download=true";

/// Everything except ASCII alphanumerics, `_.-~` and the URL delimiters `:/?=&`.
const DOWNLOAD_URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'=')
    .remove(b'&');

pub fn encode_download_url(raw: &str) -> String {
    utf8_percent_encode(raw, DOWNLOAD_URL_ENCODE_SET).to_string()
}

pub fn decode_path(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Recovers the repository path from a `.../resolve/main/<path>?download=true` href.
pub fn path_from_download_href(href: &str) -> String {
    let without_query = href.replace(DOWNLOAD_QUERY, "");
    let encoded = without_query
        .rsplit(&format!("{RESOLVE_SEGMENT}/"))
        .next()
        .unwrap_or_default();
    decode_path(encoded)
}

/// A "Files and versions" page URL on the mirror host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingUrl {
    page_url: String,
    mirror_host: String,
    repo_id: String,
}

impl ListingUrl {
    pub fn parse(input: &str, mirror: &MirrorConfig) -> Result<Self, ModelPullError> {
        let input = input.trim().trim_end_matches('/');
        let mirror_host = mirror.mirror_host.trim_end_matches('/');
        let canonical_host = mirror.canonical_host.trim_end_matches('/');

        let unsupported_host = || ModelPullError::UnsupportedHost {
            url: input.to_string(),
            mirror_host: mirror_host.to_string(),
            canonical_host: canonical_host.to_string(),
        };

        let rest = if let Some(rest) = input.strip_prefix(&format!("{mirror_host}/")) {
            rest
        } else if mirror.rewrite_from_canonical_host {
            let rest = input
                .strip_prefix(&format!("{canonical_host}/"))
                .ok_or_else(unsupported_host)?;
            tracing::debug!(from = canonical_host, to = mirror_host, "Rewriting listing URL host");
            rest
        } else {
            return Err(unsupported_host());
        };

        let not_a_listing = || ModelPullError::NotAListingUrl {
            url: input.to_string(),
        };

        let tree_start = rest
            .match_indices(&format!("/{TREE_SEGMENT}"))
            .map(|(index, _)| index)
            .find(|&index| {
                let after = &rest[index + TREE_SEGMENT.len() + 1..];
                after.is_empty() || after.starts_with('/')
            })
            .ok_or_else(not_a_listing)?;

        let repo_id = &rest[..tree_start];
        if repo_id.is_empty() {
            return Err(not_a_listing());
        }

        let page_url = format!("{mirror_host}/{rest}");
        ::url::Url::parse(&page_url).map_err(|_| not_a_listing())?;

        Ok(Self {
            page_url,
            mirror_host: mirror_host.to_string(),
            repo_id: repo_id.to_string(),
        })
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn mirror_host(&self) -> &str {
        &self.mirror_host
    }

    /// `<owner>/<repo>` as it appears in the URL.
    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Joins a root-relative link such as an anchor `href` or a `nextURL` onto the mirror host.
    pub fn join_root_relative(&self, link: &str) -> String {
        format!("{}{}", self.mirror_host, link)
    }

    /// Transport-safe download URL of a repository file.
    pub fn download_url(&self, path: &str) -> String {
        encode_download_url(&format!(
            "{}/{}/{RESOLVE_SEGMENT}/{path}{DOWNLOAD_QUERY}",
            self.mirror_host, self.repo_id
        ))
    }

    /// `./<owner>/<repo>`, used when no output directory is given.
    pub fn default_destination(&self) -> PathBuf {
        PathBuf::from(".").join(&self.repo_id)
    }
}

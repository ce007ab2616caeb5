use super::types::PaginationPage;
use super::url::path_from_download_href;
use crate::error::ModelPullError;
use scraper::{Html, Selector};

const DOWNLOAD_ANCHOR_SELECTOR: &str = r#"[title="Download file"]"#;
const TREE_LIST_SELECTOR: &str = r#"div[data-target="ViewerIndexTreeList"]"#;
const TREE_LIST_PROPS_ATTR: &str = "data-props";

/// A file link rendered on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleLink {
    pub href: String,
    pub path: String,
}

/// What a listing page carries before any continuation is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub visible: Vec<VisibleLink>,
    /// Raw `data-props` JSON of the tree list, if the page has one
    pub tree_props: Option<String>,
    /// Download markers that carried no `href`
    pub markers_without_href: usize,
}

impl ListingPage {
    pub fn parse(html: &str) -> Result<Self, ModelPullError> {
        let document = Html::parse_document(html);
        let anchors = selector(DOWNLOAD_ANCHOR_SELECTOR)?;
        let tree_list = selector(TREE_LIST_SELECTOR)?;

        let mut visible = Vec::new();
        let mut markers_without_href = 0;
        for anchor in document.select(&anchors) {
            let Some(href) = anchor.value().attr("href") else {
                tracing::warn!(
                    element = anchor.value().name(),
                    "Skipping download marker without href"
                );
                markers_without_href += 1;
                continue;
            };
            visible.push(VisibleLink {
                href: href.to_string(),
                path: path_from_download_href(href),
            });
        }

        let tree_props = document
            .select(&tree_list)
            .next()
            .and_then(|element| element.value().attr(TREE_LIST_PROPS_ATTR))
            .map(str::to_string);

        Ok(Self {
            visible,
            tree_props,
            markers_without_href,
        })
    }

    pub fn pagination(&self, url: &str) -> Result<PaginationPage, ModelPullError> {
        let props = self
            .tree_props
            .as_deref()
            .ok_or_else(|| ModelPullError::PayloadNotFound {
                url: url.to_string(),
            })?;

        serde_json::from_str(props).map_err(|e| ModelPullError::PayloadParse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn selector(css: &str) -> Result<Selector, ModelPullError> {
    Selector::parse(css)
        .map_err(|e| ModelPullError::Unexpected(eyre::eyre!("Invalid selector {css}: {e}")))
}

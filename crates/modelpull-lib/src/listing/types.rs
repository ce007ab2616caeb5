use serde::Deserialize;

/// A single downloadable file of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Decoded, human readable path relative to the repository root
    pub path: String,
    /// Percent-encoded URL the file is fetched from
    pub download_url: String,
}

/// One entry of the tree listing as served by the mirror. Fields other than
/// `type` and `path` (`oid`, `size`, `lfs`, ...) are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

impl RawEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// A slice of the tree listing plus the pointer to the next slice, if any.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PaginationPage {
    pub entries: Vec<RawEntry>,
    #[serde(rename = "nextURL", default)]
    pub next_url: Option<String>,
}

impl PaginationPage {
    /// Root-relative continuation URL, ignoring empty pointers.
    pub fn next_url(&self) -> Option<&str> {
        self.next_url.as_deref().filter(|next| !next.is_empty())
    }
}

/// Body of a continuation fetch. The mirror answers with a bare array of
/// entries; an object with its own `nextURL` is followed further.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ContinuationPage {
    Entries(Vec<RawEntry>),
    Page(PaginationPage),
}

impl ContinuationPage {
    pub fn into_page(self) -> PaginationPage {
        match self {
            ContinuationPage::Entries(entries) => PaginationPage {
                entries,
                next_url: None,
            },
            ContinuationPage::Page(page) => page,
        }
    }
}

/// The canonical, merged file listing of a repository, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    entries: Vec<FileEntry>,
}

impl Listing {
    pub fn new(entries: Vec<FileEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &FileEntry) -> bool {
        self.entries.contains(entry)
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Listing {
    type Item = FileEntry;
    type IntoIter = std::vec::IntoIter<FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_page_parses_payload_shape() {
        let page: PaginationPage = serde_json::from_str(
            r#"{
                "entries": [
                    {"type": "file", "oid": "abc", "size": 12, "path": "config.json"},
                    {"type": "directory", "oid": "def", "size": 0, "path": "onnx"}
                ],
                "nextURL": "/api/models/org/repo/tree/main?cursor=xyz"
            }"#,
        )
        .unwrap();

        assert_eq!(page.entries.len(), 2);
        assert!(page.entries[0].is_file());
        assert!(!page.entries[1].is_file());
        assert_eq!(
            page.next_url(),
            Some("/api/models/org/repo/tree/main?cursor=xyz")
        );
    }

    #[test]
    fn test_pagination_page_null_and_empty_next_url() {
        let page: PaginationPage =
            serde_json::from_str(r#"{"entries": [], "nextURL": null}"#).unwrap();
        assert_eq!(page.next_url(), None);

        let page: PaginationPage =
            serde_json::from_str(r#"{"entries": [], "nextURL": ""}"#).unwrap();
        assert_eq!(page.next_url(), None);

        let page: PaginationPage = serde_json::from_str(r#"{"entries": []}"#).unwrap();
        assert_eq!(page.next_url(), None);
    }

    #[test]
    fn test_continuation_page_accepts_bare_array() {
        let page: ContinuationPage =
            serde_json::from_str(r#"[{"type": "file", "path": "a.bin"}]"#).unwrap();
        let page = page.into_page();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.next_url(), None);
    }

    #[test]
    fn test_continuation_page_accepts_object() {
        let page: ContinuationPage = serde_json::from_str(
            r#"{"entries": [{"type": "file", "path": "a.bin"}], "nextURL": "/next"}"#,
        )
        .unwrap();
        let page = page.into_page();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.next_url(), Some("/next"));
    }
}

use modelpull_lib::config::MirrorConfig;
use modelpull_lib::listing::{ListingUrl, encode_download_url};
use eyre::WrapErr;
use std::path::{Path, PathBuf};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A wiremock server standing in for the mirror host.
pub struct StubMirror {
    pub server: MockServer,
}

impl StubMirror {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            mirror_host: self.server.uri(),
            rewrite_from_canonical_host: false,
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
            ..MirrorConfig::default()
        }
    }

    pub fn listing_url(&self, repo: &str) -> ListingUrl {
        ListingUrl::parse(
            &format!("{}/{}/tree/main", self.server.uri(), repo),
            &self.mirror_config(),
        )
        .expect("stub listing URL must parse")
    }

    /// Serves the "Files and versions" page of `repo`. `visible` are the
    /// repository paths rendered as download links, `entries` the embedded
    /// `(type, path)` payload.
    pub async fn mount_listing_page(
        &self,
        repo: &str,
        visible: &[&str],
        entries: &[(&str, &str)],
        next_url: Option<&str>,
    ) {
        let html = listing_page_html(repo, visible, entries, next_url);
        Mock::given(method("GET"))
            .and(path(format!("/{repo}/tree/main")))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
            .mount(&self.server)
            .await;
    }

    /// Serves a continuation page at `/api/models/<repo>/tree/main?cursor=<cursor>`
    /// and returns the root-relative URL to put into `nextURL`.
    pub async fn mount_continuation(
        &self,
        repo: &str,
        cursor: &str,
        body: serde_json::Value,
    ) -> String {
        let api_path = format!("/api/models/{repo}/tree/main");
        Mock::given(method("GET"))
            .and(path(api_path.clone()))
            .and(query_param("cursor", cursor))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
        format!("{api_path}?cursor={cursor}")
    }

    /// Serves a repository file, honouring `Range: bytes=<offset>-` for each
    /// offset in `resumable_from`. `expected_requests` is verified when the
    /// server is dropped.
    pub async fn mount_file(
        &self,
        repo: &str,
        file_path: &str,
        content: &[u8],
        resumable_from: &[usize],
        expected_requests: impl Into<wiremock::Times>,
    ) {
        let encoded_path = encoded_resolve_path(repo, file_path);

        for &offset in resumable_from {
            Mock::given(method("GET"))
                .and(path(encoded_path.clone()))
                .and(query_param("download", "true"))
                .and(header("range", format!("bytes={offset}-").as_str()))
                .respond_with(
                    ResponseTemplate::new(206)
                        .insert_header(
                            "content-range",
                            format!("bytes {}-{}/{}", offset, content.len() - 1, content.len())
                                .as_str(),
                        )
                        .set_body_bytes(content[offset..].to_vec()),
                )
                .with_priority(1)
                .mount(&self.server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path(encoded_path))
            .and(query_param("download", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .expect(expected_requests)
            .mount(&self.server)
            .await;
    }

    /// Answers every range request for `file_path` with 416, the way a server
    /// does when the local copy is at least as long as the remote file.
    pub async fn mount_unsatisfiable_range(&self, repo: &str, file_path: &str) {
        Mock::given(method("GET"))
            .and(path(encoded_resolve_path(repo, file_path)))
            .and(header_exists("range"))
            .respond_with(ResponseTemplate::new(416))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Number of requests for paths containing `fragment` that carried a `Range` header.
    pub async fn requests_with_range(&self, fragment: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().contains(fragment))
            .filter(|request| request.headers.contains_key("range"))
            .count()
    }

    /// Number of requests the server saw whose path contains `fragment`.
    pub async fn requests_for(&self, fragment: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().contains(fragment))
            .count()
    }
}

/// `/<repo>/resolve/main/<path>` with the path percent-encoded the way the mirror renders it.
pub fn encoded_resolve_path(repo: &str, file_path: &str) -> String {
    encode_download_url(&format!("/{repo}/resolve/main/{file_path}"))
}

pub fn download_href(repo: &str, file_path: &str) -> String {
    format!("{}?download=true", encoded_resolve_path(repo, file_path))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn listing_page_html(
    repo: &str,
    visible: &[&str],
    entries: &[(&str, &str)],
    next_url: Option<&str>,
) -> String {
    let props = serde_json::json!({
        "entries": entries
            .iter()
            .map(|(kind, path)| serde_json::json!({"type": kind, "oid": "0", "size": 1, "path": path}))
            .collect::<Vec<_>>(),
        "nextURL": next_url,
    });

    let rows = visible
        .iter()
        .map(|file_path| {
            format!(
                r#"<li><a href="/{repo}/blob/main/{file_path}">{file_path}</a><a title="Download file" href="{}" download>&#8595;</a></li>"#,
                escape_attr(&download_href(repo, file_path))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!doctype html>
<html>
<head><title>{repo} at main</title></head>
<body>
<header><a href="/{repo}">Model card</a> <a href="/{repo}/tree/main">Files and versions</a></header>
<div data-target="ViewerIndexTreeList" data-props="{}">
<ul>
{rows}
</ul>
</div>
</body>
</html>"#,
        escape_attr(&props.to_string())
    )
}

/// Writes a JSON config file pointing the mirror host at `mirror_host`.
pub fn write_config_file(dir: &Path, mirror_host: &str) -> eyre::Result<PathBuf> {
    let config_path = dir.join("modelpull.json");
    let config = serde_json::json!({
        "mirror": {
            "mirror_host": mirror_host,
            "rewrite_from_canonical_host": false,
            "request_timeout_secs": 10,
        },
        "download": {
            "parallelism": 2,
            "max_retries": 1,
            "retry_backoff_ms": 10,
        }
    });
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)
        .wrap_err_with(|| format!("Failed to write {}", config_path.display()))?;
    Ok(config_path)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("modelpull_lib=debug,modelpull_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn read_to_string(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub download: DownloadConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MirrorConfig {
    /// Host that listing pages and files are fetched from, without a trailing slash
    pub mirror_host: String,
    /// Upstream host whose URLs are rewritten to `mirror_host`
    pub canonical_host: String,
    pub rewrite_from_canonical_host: bool,
    /// Upper bound on continuation fetches while following `nextURL`
    pub max_continuation_pages: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            mirror_host: "https://hf-mirror.com".to_string(),
            canonical_host: "https://huggingface.co".to_string(),
            rewrite_from_canonical_host: true,
            max_continuation_pages: 64,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// HTTP range requests
    #[default]
    Http,
    /// External `wget -c`
    Wget,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DownloadConfig {
    pub exclude_extensions: Vec<String>,
    pub weight_extensions: Vec<String>,
    /// Skip weight files that already exist locally
    pub update_existing: bool,
    pub parallelism: usize,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub transport: TransportKind,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            exclude_extensions: vec![".h5".into(), ".ot".into(), ".msgpack".into()],
            weight_extensions: vec![".safetensors".into(), ".bin".into()],
            update_existing: true,
            parallelism: 4,
            max_retries: 5,
            retry_backoff_ms: 500,
            transport: TransportKind::Http,
        }
    }
}

use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::RANGE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Network error while fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed while fetching {url}: {reason}")]
    Command {
        program: String,
        url: String,
        reason: String,
    },

    #[error("Transfer of {url} stopped at {received} of {expected} bytes")]
    Incomplete {
        url: String,
        received: u64,
        expected: u64,
    },
}

impl TransferError {
    /// Client errors other than timeouts and rate limiting will not go away on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransferError::HttpStatus { status, .. } => {
                !(400..500).contains(status) || matches!(status, 408 | 429)
            }
            _ => true,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        TransferError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Bytes written during this call
    pub bytes_written: u64,
    /// Size of the destination file afterwards, when known
    pub total_size: Option<u64>,
    /// Whether the transfer continued an existing partial file
    pub resumed: bool,
}

/// Moves the bytes behind `url` into `destination`, continuing from whatever
/// is already on disk instead of starting over.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_with_resume(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<TransferReport, TransferError>;
}

async fn existing_len(path: &Path) -> Result<u64, TransferError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(TransferError::io(path, e)),
    }
}

/// Resumes with HTTP range requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("modelpull/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch_with_resume(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<TransferReport, TransferError> {
        let network = |source: reqwest::Error| TransferError::Network {
            url: url.to_string(),
            source,
        };

        let existing = existing_len(destination).await?;
        let mut request = self.client.get(url);
        if existing > 0 {
            request = request.header(RANGE, format!("bytes={existing}-"));
        }

        let response = request.send().await.map_err(network)?;
        let status = response.status();

        if status == StatusCode::RANGE_NOT_SATISFIABLE && existing > 0 {
            tracing::debug!(url, output = %destination.display(), bytes = existing, "Already complete");
            return Ok(TransferReport {
                bytes_written: 0,
                total_size: Some(existing),
                resumed: true,
            });
        }

        if !status.is_success() {
            return Err(TransferError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let resumed = existing > 0 && status == StatusCode::PARTIAL_CONTENT;
        let offset = if resumed { existing } else { 0 };
        let expected = response.content_length().map(|len| offset + len);

        let file = if resumed {
            tracing::debug!(url, output = %destination.display(), offset, "Resuming");
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(destination)
                .await
        } else {
            tokio::fs::File::create(destination).await
        }
        .map_err(|e| TransferError::io(destination, e))?;
        let mut writer = tokio::io::BufWriter::new(file);

        let mut bytes_written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(network)?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| TransferError::io(destination, e))?;
            bytes_written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| TransferError::io(destination, e))?;

        let total_size = offset + bytes_written;
        if let Some(expected) = expected
            && expected != total_size
        {
            return Err(TransferError::Incomplete {
                url: url.to_string(),
                received: total_size,
                expected,
            });
        }

        Ok(TransferReport {
            bytes_written,
            total_size: Some(total_size),
            resumed,
        })
    }
}

/// Delegates to `wget -c`, which resumes partial files on its own.
#[derive(Debug, Clone)]
pub struct WgetTransport {
    program: String,
}

impl WgetTransport {
    pub fn new() -> Self {
        Self::with_program("wget")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for WgetTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for WgetTransport {
    async fn fetch_with_resume(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<TransferReport, TransferError> {
        let command_failed = |reason: String| TransferError::Command {
            program: self.program.clone(),
            url: url.to_string(),
            reason,
        };

        let before = existing_len(destination).await?;
        let status = tokio::process::Command::new(&self.program)
            .arg("-c")
            .arg(url)
            .arg("-O")
            .arg(destination)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| command_failed(e.to_string()))?;

        if !status.success() {
            return Err(command_failed(status.to_string()));
        }

        let after = existing_len(destination).await?;
        Ok(TransferReport {
            bytes_written: after.saturating_sub(before),
            total_size: Some(after),
            resumed: before > 0,
        })
    }
}

//! Content dispatcher - resolves one address into a page or a file
//!
//! Given an address, the dispatcher either skips it (file already mirrored),
//! downloads it to its mirrored path, or parses it as a page and returns the
//! links that passed the path and prefix filters. Side effects per address are
//! at most one HTTP request, one directory creation, and one file write.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url, is_html, FetchResult};
use crate::crawler::parser::parse_html;
use crate::url::{mirror_path, should_follow};
use crate::MirrorError;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// What a successfully processed address turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// HTML page; its links were extracted
    Page,
    /// Non-page resource written to disk
    File,
    /// File already present locally; no request was made
    Skipped,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::File => "file",
            Self::Skipped => "skipped",
        }
    }
}

/// Per-address result of one processing attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Address fully handled; `links` are newly discovered addresses
    Success {
        kind: ResourceKind,
        links: Vec<String>,
    },

    /// Network, status, or parse failure; the address stays pending
    RetryableFailure { reason: String },
}

impl DownloadOutcome {
    pub fn page(links: Vec<String>) -> Self {
        Self::Success {
            kind: ResourceKind::Page,
            links,
        }
    }

    pub fn file() -> Self {
        Self::Success {
            kind: ResourceKind::File,
            links: Vec::new(),
        }
    }

    pub fn skipped() -> Self {
        Self::Success {
            kind: ResourceKind::Skipped,
            links: Vec::new(),
        }
    }

    pub fn retry(reason: impl Into<String>) -> Self {
        Self::RetryableFailure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Processes a single address
///
/// `Ok` carries the per-address outcome, including retryable failures.
/// `Err` is reserved for fatal conditions that must abort the run.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, address: &str) -> Result<DownloadOutcome, MirrorError>;
}

/// The HTTP-backed dispatcher used for real crawls
pub struct ContentDispatcher {
    client: Client,
    download_dir: PathBuf,
    root: String,
    container_id: Option<String>,
    overwrite: bool,
    no_recursion: bool,
}

impl ContentDispatcher {
    /// Creates a dispatcher with its own HTTP client
    pub fn new(config: &Config) -> crate::Result<Self> {
        let client = build_http_client(&config.http)?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a dispatcher sharing an existing HTTP client
    pub fn with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            download_dir: config.output.download_path.clone(),
            root: config.crawl.root_address(),
            container_id: config.crawl.container().map(str::to_string),
            overwrite: config.output.overwrite,
            no_recursion: config.crawl.no_recursion,
        }
    }

    /// Handles an HTML response, returning the links to enqueue
    fn handle_page(&self, address: &str, final_url: &str, body: &[u8]) -> DownloadOutcome {
        let is_root = address == self.root;
        if self.no_recursion && !is_root {
            tracing::debug!("Not following links on {} (no recursion)", address);
            return DownloadOutcome::page(Vec::new());
        }

        let base_url = match Url::parse(final_url) {
            Ok(url) => url,
            Err(e) => return DownloadOutcome::retry(format!("Invalid page URL: {}", e)),
        };

        let html = String::from_utf8_lossy(body);
        let parsed = parse_html(&html, &base_url, self.container_id.as_deref());
        if !parsed.container_found {
            tracing::debug!(
                "No element with id {:?} on {}",
                self.container_id.as_deref().unwrap_or_default(),
                address
            );
        }

        let links = parsed
            .links
            .into_iter()
            .filter(|link| should_follow(&link.href, &link.resolved, address))
            .filter(|link| !(self.no_recursion && link.resolved.ends_with('/')))
            .map(|link| link.resolved)
            .collect::<Vec<_>>();

        tracing::trace!("{} yielded {} links", address, links.len());
        DownloadOutcome::page(links)
    }

    /// Writes a downloaded body to its mirrored path
    async fn write_file(&self, address: &str, path: &Path, body: &[u8]) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| MirrorError::Filesystem {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, body)
            .await
            .map_err(|source| MirrorError::Filesystem {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Downloaded {} to {}", address, path.display());
        Ok(())
    }
}

#[async_trait]
impl Dispatch for ContentDispatcher {
    async fn dispatch(&self, address: &str) -> Result<DownloadOutcome, MirrorError> {
        let local_path = mirror_path(&self.download_dir, address);

        if !self.overwrite {
            if let Some(path) = &local_path {
                let exists = tokio::fs::metadata(path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if exists {
                    tracing::debug!("{} already exists, skipping", path.display());
                    return Ok(DownloadOutcome::skipped());
                }
            }
        }

        tracing::trace!("Fetching {}", address);
        match fetch_url(&self.client, address).await {
            FetchResult::Success {
                final_url,
                content_type,
                body,
                ..
            } => {
                if is_html(&content_type) {
                    return Ok(self.handle_page(address, &final_url, &body));
                }

                let path =
                    local_path.ok_or_else(|| MirrorError::Unmirrorable(address.to_string()))?;
                self.write_file(address, &path, &body).await?;
                Ok(DownloadOutcome::file())
            }

            FetchResult::HttpError { status_code } => {
                Ok(DownloadOutcome::retry(format!("HTTP {}", status_code)))
            }

            FetchResult::NetworkError { error } => Ok(DownloadOutcome::retry(error)),
        }
    }
}

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure for Mirror-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the root address
    pub fn for_root(root_url: impl Into<String>) -> Self {
        Self {
            crawl: CrawlConfig::new(root_url),
            output: OutputConfig::default(),
            checkpoint: CheckpointConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Location of the checkpoint file, resolved against the download directory
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output.download_path.join(&self.checkpoint.file)
    }
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Address the crawl starts from
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Id of the element links are extracted from (None = whole document)
    #[serde(
        rename = "container-id",
        default,
        deserialize_with = "empty_as_none"
    )]
    pub container_id: Option<String>,

    /// Maximum number of dispatch operations in flight per round
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Remember completed addresses so each is fetched at most once
    #[serde(rename = "prevent-loops", default = "default_true")]
    pub prevent_loops: bool,

    /// Only follow links found on the root page
    #[serde(rename = "no-recursion", default)]
    pub no_recursion: bool,

    /// Consecutive failures tolerated per address (0 = retry forever)
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,
}

impl CrawlConfig {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            container_id: None,
            concurrency: default_concurrency(),
            prevent_loops: true,
            no_recursion: false,
            max_retries: 0,
        }
    }

    /// The root address in normalized form
    ///
    /// This is the exact string the frontier is seeded with, so
    /// `http://host` and `http://host/` name the same address. Falls back to
    /// the configured text if it does not parse.
    pub fn root_address(&self) -> String {
        url::Url::parse(&self.root_url)
            .map(String::from)
            .unwrap_or_else(|_| self.root_url.clone())
    }

    /// The container id, with an empty id meaning the whole document
    pub fn container(&self) -> Option<&str> {
        self.container_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Download destination configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the mirrored tree is written under
    #[serde(rename = "download-path", default = "default_download_path")]
    pub download_path: PathBuf,

    /// Re-download files that already exist locally
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            overwrite: false,
        }
    }
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    /// Restore the frontier from the checkpoint file if one exists
    #[serde(default)]
    pub resume: bool,

    /// Save every this many successful completions (0 = never automatically)
    #[serde(rename = "backup-interval", default)]
    pub backup_interval: u64,

    /// Checkpoint file name, relative to the download directory
    #[serde(default = "default_checkpoint_file")]
    pub file: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            resume: false,
            backup_interval: 0,
            file: default_checkpoint_file(),
        }
    }
}

/// HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Cookies attached to every request
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            cookies: BTreeMap::new(),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

fn default_download_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_checkpoint_file() -> PathBuf {
    PathBuf::from("progress.json")
}

fn default_user_agent() -> String {
    format!("mirror-crawl/{}", env!("CARGO_PKG_VERSION"))
}

//! Configuration file loading and directory layout.
//!
//! Configuration is read from `--config <file>` or `~/.roomface/config.yaml`.
//! Every field is optional.
//!
//! ```yaml
//! root: /srv/roomface
//! intake_dir: uploads/all_photos
//! search_dir: uploads/search_photo
//! clusters_dir: clusters
//! extractor:
//!   program: $ROOMFACE_EXTRACTOR
//!   args: ["--model", "hog"]
//! clustering:
//!   eps: 0.06
//!   min_samples: 1
//!   metric: cosine
//!   workers: 0
//! matching:
//!   metric: euclidean
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use facegroup::{ClusterParams, CommandExtractor, MatchParams};
use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".roomface";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_INTAKE_DIR: &str = "uploads/all_photos";
pub const DEFAULT_SEARCH_DIR: &str = "uploads/search_photo";
pub const DEFAULT_CLUSTERS_DIR: &str = "clusters";

/// roomface configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory that relative paths resolve against. Default: `.`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Photos waiting to be clustered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake_dir: Option<PathBuf>,

    /// Photo waiting to be searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_dir: Option<PathBuf>,

    /// Cluster store root; rooms live in subdirectories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters_dir: Option<PathBuf>,

    pub extractor: ExtractorConfig,
    pub clustering: ClusterParams,
    pub matching: MatchParams,
}

/// External face extractor program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Program path; `$VAR` and `${VAR}` read the environment.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub program: String,

    /// Arguments placed before the image path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Resolved directories for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub intake_dir: PathBuf,
    pub search_dir: PathBuf,
    pub clusters_dir: PathBuf,
}

impl Config {
    /// Gets the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Loads the config. An explicit path must exist; a missing default
    /// file yields the default config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parses YAML (JSON is accepted as a subset).
    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;
        Ok(cfg.with_defaults())
    }

    fn with_defaults(mut self) -> Self {
        self.clustering = self.clustering.with_defaults();
        self
    }

    /// Resolves directories; relative paths are joined onto `root`.
    pub fn layout(&self) -> Layout {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let resolve = |dir: &Option<PathBuf>, default: &str| match dir {
            Some(d) => root.join(d),
            None => root.join(default),
        };
        Layout {
            intake_dir: resolve(&self.intake_dir, DEFAULT_INTAKE_DIR),
            search_dir: resolve(&self.search_dir, DEFAULT_SEARCH_DIR),
            clusters_dir: resolve(&self.clusters_dir, DEFAULT_CLUSTERS_DIR),
        }
    }

    /// Builds the configured face extractor.
    pub fn extractor(&self) -> Result<CommandExtractor> {
        let program = expand_env(&self.extractor.program);
        if program.is_empty() {
            if self.extractor.program.is_empty() {
                anyhow::bail!(
                    "no face extractor configured: set extractor.program in the config or pass --extractor"
                );
            }
            anyhow::bail!(
                "extractor program '{}' resolved to empty (env var not set?)",
                self.extractor.program
            );
        }
        Ok(CommandExtractor::new(program).with_args(self.extractor.args.iter().cloned()))
    }
}

/// Expand an environment variable reference (`$VAR` or `${VAR}`).
fn expand_env(s: &str) -> String {
    let Some(rest) = s.strip_prefix('$') else {
        return s.to_string();
    };
    let var_name = rest
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(rest);
    std::env::var(var_name).unwrap_or_default()
}

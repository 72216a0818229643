use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for scanlimit
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Thread pool settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Split and scheduling settings for prefix scans and split collection
    #[serde(default)]
    pub scan: ScanSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExecutorConfig {
    /// Worker threads for a dedicated pool (0 = rayon's global pool)
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScanSettings {
    /// Run on the thread pool instead of the calling thread (default: true)
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Fixed leaf size in elements (0 = derive from the source size)
    #[serde(default)]
    pub leaf_size: usize,

    /// How many leaves to aim for per worker thread
    #[serde(default = "default_splits_per_thread")]
    pub splits_per_thread: usize,

    /// Lower bound for derived leaf sizes
    #[serde(default = "default_min_leaf_size")]
    pub min_leaf_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_splits_per_thread() -> usize {
    4
}

fn default_min_leaf_size() -> usize {
    1024
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            leaf_size: 0,
            splits_per_thread: default_splits_per_thread(),
            min_leaf_size: default_min_leaf_size(),
        }
    }
}

impl ScanConfig {
    /// Load config from custom path or default XDG location
    pub fn load(custom_path: Option<&Path>) -> Result<Self> {
        let path = if let Some(p) = custom_path {
            p.to_path_buf()
        } else {
            match Self::default_config_path() {
                Ok(p) => p,
                Err(_) => return Ok(Self::default()),
            }
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| Error::ConfigIo {
            path: path.clone(),
            source,
        })?;

        let config: Self =
            toml::from_str(&contents).map_err(|source| Error::ConfigParse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Get default config path: ~/.config/scanlimit/config.toml
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(Error::NoConfigDir)?;

        Ok(config_dir.join("scanlimit").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.splits_per_thread == 0 {
            return Err(Error::InvalidArgument(
                "scan.splits_per_thread must be at least 1".to_string(),
            ));
        }
        if self.scan.min_leaf_size == 0 {
            return Err(Error::InvalidArgument(
                "scan.min_leaf_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Run everything on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.scan.parallel = false;
        self
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.scan.leaf_size = leaf_size;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.executor.threads = threads;
        self
    }

    /// Picks the leaf size for a source with the given estimated size.
    pub fn leaf_size_for(&self, estimated_size: Option<usize>, threads: usize) -> usize {
        if self.scan.leaf_size > 0 {
            return self.scan.leaf_size;
        }
        match estimated_size {
            Some(size) => {
                let target_leaves = threads.max(1) * self.scan.splits_per_thread.max(1);
                (size / target_leaves).max(self.scan.min_leaf_size.max(1))
            }
            None => self.scan.min_leaf_size.max(1),
        }
    }

    /// Split depth used for sources that cannot report their size.
    pub fn unknown_size_depth(&self, threads: usize) -> u32 {
        let target_leaves = threads.max(1) * self.scan.splits_per_thread.max(1);
        target_leaves.next_power_of_two().trailing_zeros()
    }
}

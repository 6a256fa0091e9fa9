use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::AdminLevel;
use crate::pip::{discover_boundary_files, load_boundaries, AdminSpatialIndex, PipService};

pub const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub boundaries: BoundariesConfig,

    /// Directory of the loaded config file; relative paths resolve against it
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BoundariesConfig {
    /// Scanned recursively for `*ADM<n>*.geojson` files
    pub dir: Option<PathBuf>,
    pub files: Vec<BoundaryFileConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoundaryFileConfig {
    pub level: AdminLevel,
    pub path: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load from `path` when given, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Explicit boundary files followed by discovered ones, without duplicates
    pub fn boundary_files(&self) -> Result<Vec<(AdminLevel, PathBuf)>> {
        let mut files: Vec<(AdminLevel, PathBuf)> = self
            .boundaries
            .files
            .iter()
            .map(|f| (f.level, self.resolve(&f.path)))
            .collect();

        if let Some(dir) = &self.boundaries.dir {
            for (level, path) in discover_boundary_files(self.resolve(dir))? {
                if !files.iter().any(|(_, p)| *p == path) {
                    files.push((level, path));
                }
            }
        }

        Ok(files)
    }

    /// Build the PIP service from the configured boundaries.
    ///
    /// `None` when no boundary files are configured.
    pub fn load_pip_service(&self) -> Result<Option<PipService>> {
        let files = self.boundary_files()?;
        if files.is_empty() {
            info!("No boundary files configured; admin resolution disabled");
            return Ok(None);
        }

        let loaded: Vec<_> = files
            .par_iter()
            .map(|(level, path)| load_boundaries(path, *level))
            .collect::<Result<Vec<_>>>()?;

        let boundaries = loaded.into_iter().flatten().collect();
        Ok(Some(PipService::new(AdminSpatialIndex::build(boundaries))))
    }
}

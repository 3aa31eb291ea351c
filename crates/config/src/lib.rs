//! Layered configuration.
//!
//! Values are read from, in increasing priority:
//! 1. built-in defaults,
//! 2. `config.toml`, `config.yaml` and `config.json` in the platform config
//!    directory, or a single explicitly given file instead,
//! 3. environment variables prefixed with `SHELF_`, with `__` separating
//!    nested keys (`SHELF_THUMBNAIL__SIZE=200`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SHELF_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding items and blobs.
    pub database: PathBuf,
    /// Default log filter directive; `RUST_LOG` wins when set.
    pub log: String,
    pub thumbnail: ThumbnailConfig,
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Length of the longer side of generated covers, in pixels.
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Render scale for the first page before thumbnailing.
    pub scale: f32,
    /// Directory containing the pdfium library. The system library is used
    /// when unset.
    pub library: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: project_dirs()
                .map(|dirs| dirs.data_dir().join("shelf.db"))
                .unwrap_or_else(|| PathBuf::from("shelf.db")),
            log: "info".to_string(),
            thumbnail: ThumbnailConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { size: 100 }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { scale: 2.0, library: None }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "shelf")
}

impl Config {
    /// Load configuration from every layer.
    ///
    /// An explicit `file` replaces the files from the config directory and
    /// must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, ENV_PREFIX)
    }

    fn load_with_env(file: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match file {
            Some(path) => figment.merge(file_provider(path)?),
            None => match project_dirs() {
                Some(dirs) => {
                    let dir = dirs.config_dir();
                    tracing::debug!(dir = %dir.display(), "looking for configuration files");
                    figment
                        .merge(Toml::file(dir.join("config.toml")))
                        .merge(Yaml::file(dir.join("config.yaml")))
                        .merge(Json::file(dir.join("config.json")))
                },
                None => figment,
            },
        };
        let config: Config = figment.merge(Env::prefixed(env_prefix).split("__")).extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.thumbnail.size == 0 {
            exn::bail!(ErrorKind::Validation("thumbnail.size must be greater than zero"));
        }
        if self.pdf.scale.is_nan() || self.pdf.scale <= 0.0 {
            exn::bail!(ErrorKind::Validation("pdf.scale must be greater than zero"));
        }
        Ok(())
    }
}

fn file_provider(path: &Path) -> Result<Figment> {
    if !path.is_file() {
        exn::bail!(ErrorKind::Missing(path.to_path_buf()));
    }
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    let figment = Figment::new();
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

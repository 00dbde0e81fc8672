use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("invalid value for [{section}] {key}: {reason}")]
  Invalid { section: &'static str, key: &'static str, reason: String },
  #[error("other: {0}")]
  Other(String),
}

/// Directory layout used by every Cantus component.
///
/// `CANTUS_BASE_DIR` switches to a portable layout rooted at that directory,
/// which is also what tests and containers use.
#[derive(Debug, Clone)]
pub struct CantusPaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
}

impl CantusPaths {
  pub fn new() -> Result<Self, ConfigError> {
    if let Ok(env_base) = std::env::var("CANTUS_BASE_DIR") {
      return Self::with_base(Path::new(&env_base));
    }

    let proj_dirs = ProjectDirs::from("com", "cantus", "cantus").ok_or(ConfigError::Directories)?;
    let paths = Self {
      base_dir: proj_dirs.config_dir().to_path_buf(),
      config_dir: proj_dirs.config_dir().to_path_buf(),
      data_dir: proj_dirs.data_dir().to_path_buf(),
    };
    paths.create_dirs()?;

    Ok(paths)
  }

  /// Portable layout: `config/` and `data/` below `base`.
  pub fn with_base(base: &Path) -> Result<Self, ConfigError> {
    let paths = Self {
      base_dir: base.to_path_buf(),
      config_dir: base.join("config"),
      data_dir: base.join("data"),
    };
    paths.create_dirs()?;

    Ok(paths)
  }

  pub fn detect() -> Result<Self, ConfigError> {
    Self::new()
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("cantus.toml")
  }

  fn create_dirs(&self) -> Result<(), ConfigError> {
    std::fs::create_dir_all(&self.config_dir)?;
    std::fs::create_dir_all(&self.data_dir)?;
    Ok(())
  }
}

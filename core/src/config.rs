//! Bridge configuration and engine traits.
//!
//! The user data directory follows the XDG data-home convention:
//! `$XDG_DATA_HOME/rime-cli`, else `$HOME/.local/share/rime-cli`. An optional
//! `rime-cli.toml` in that directory overrides the defaults below:
//!
//! ```toml
//! shared_data_dir = "/usr/share/rime-data"
//! max_line_bytes = 1023
//! poll_interval_ms = 100
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BridgeError, Result};

pub const DISTRIBUTION_NAME: &str = "Rime";
pub const DISTRIBUTION_CODE_NAME: &str = "rime-cli";
pub const DISTRIBUTION_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "rime.rime-cli";

/// Baked in at build time through `RIME_SHARED_DATA_DIR` when packagers set it.
pub const DEFAULT_SHARED_DATA_DIR: &str = match option_env!("RIME_SHARED_DATA_DIR") {
    Some(dir) => dir,
    None => "/usr/share/rime-data",
};

/// Payload bytes accepted per request line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1023;

pub const CONFIG_FILE_NAME: &str = "rime-cli.toml";

/// Static description of the deployment handed to the engine at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traits {
    pub shared_data_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub distribution_name: String,
    pub distribution_code_name: String,
    pub distribution_version: String,
    pub app_name: String,
}

impl Traits {
    pub fn new<S: Into<PathBuf>, U: Into<PathBuf>>(shared_data_dir: S, user_data_dir: U) -> Self {
        Self {
            shared_data_dir: shared_data_dir.into(),
            user_data_dir: user_data_dir.into(),
            distribution_name: DISTRIBUTION_NAME.to_string(),
            distribution_code_name: DISTRIBUTION_CODE_NAME.to_string(),
            distribution_version: DISTRIBUTION_VERSION.to_string(),
            app_name: APP_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub shared_data_dir: PathBuf,
    /// Overrides the XDG-derived user data directory.
    pub user_data_dir: Option<PathBuf>,
    pub max_line_bytes: usize,
    /// How often an idle reader re-checks the shutdown flag.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            shared_data_dir: PathBuf::from(DEFAULT_SHARED_DATA_DIR),
            user_data_dir: None,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            poll_interval_ms: 100,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|source| BridgeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `rime-cli.toml` from `dir` if it exists, defaults otherwise.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load_toml(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn user_data_dir(&self) -> Result<PathBuf> {
        match &self.user_data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_user_data_dir(),
        }
    }

    pub fn traits(&self) -> Result<Traits> {
        Ok(Traits::new(&self.shared_data_dir, self.user_data_dir()?))
    }
}

/// `$XDG_DATA_HOME/rime-cli`, else `$HOME/.local/share/rime-cli`.
pub fn default_user_data_dir() -> Result<PathBuf> {
    user_data_dir_from(
        std::env::var_os("XDG_DATA_HOME"),
        std::env::var_os("HOME").or_else(|| dirs::home_dir().map(OsString::from)),
    )
}

/// Resolve the user data directory from explicit environment values.
///
/// An empty `XDG_DATA_HOME` counts as unset.
pub fn user_data_dir_from(xdg_data_home: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    let data_home = match xdg_data_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = home.filter(|dir| !dir.is_empty()).ok_or(BridgeError::NoDataHome)?;
            PathBuf::from(home).join(".local").join("share")
        }
    };
    Ok(data_home.join(DISTRIBUTION_CODE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_data_home_wins() {
        let dir = user_data_dir_from(Some("/tmp/xdg".into()), Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/xdg/rime-cli"));
    }

    #[test]
    fn falls_back_to_home_local_share() {
        let dir = user_data_dir_from(None, Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.local/share/rime-cli"));

        let dir = user_data_dir_from(Some("".into()), Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.local/share/rime-cli"));
    }

    #[test]
    fn no_home_is_an_error() {
        assert!(matches!(
            user_data_dir_from(None, None),
            Err(BridgeError::NoDataHome)
        ));
    }

    #[test]
    fn traits_carry_distribution_metadata() {
        let traits = Traits::new("/usr/share/rime-data", "/tmp/user");
        assert_eq!(traits.distribution_name, "Rime");
        assert_eq!(traits.distribution_code_name, "rime-cli");
        assert_eq!(traits.app_name, "rime.rime-cli");
        assert_eq!(traits.distribution_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BridgeConfig::from_toml_str("max_line_bytes = 4096\n").unwrap();
        assert_eq!(config.max_line_bytes, 4096);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.shared_data_dir, PathBuf::from(DEFAULT_SHARED_DATA_DIR));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "max_line_bytes = \"many\"").unwrap();
        assert!(matches!(
            BridgeConfig::load_from_dir(dir.path()),
            Err(BridgeError::Config { .. })
        ));
    }
}

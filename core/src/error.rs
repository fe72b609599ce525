use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::api::Capabilities;

/// Fatal bridge conditions. Everything else is absorbed inside the loop.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Incompatible rime API: missing {}", .missing.names())]
    IncompatibleApi { missing: Capabilities },

    #[error("engine failed to create a session")]
    SessionCreate,

    #[error("cannot locate user data directory: neither XDG_DATA_HOME nor HOME is set")]
    NoDataHome,

    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid table config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("fst: {0}")]
    Fst(#[from] fst::Error),

    #[error("lexicon cache: {0}")]
    Cache(#[from] bincode::Error),

    #[error("lexicon cache is inconsistent: {keys} keys for {payloads} payload lists")]
    CacheMismatch { keys: usize, payloads: usize },
}

pub type Result<T> = std::result::Result<T, TableError>;

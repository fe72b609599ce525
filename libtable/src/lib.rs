//! libtable crate root
//!
//! A table-driven input method engine that plugs into `rime-bridge-core`
//! through the `RimeApi` contract. Codes typed by the user are looked up in
//! `.table` files found in the shared and user data directories; matches are
//! offered as a paged candidate menu.
//!
//! Public API exported here:
//! - `TableEngine` from `engine`
//! - `TableSession` from `session`
//! - `Lexicon` / `SourceStamp` / `TableSource` from `lexicon`
//! - `TableConfig` from `config`
//! - `CandidateList` / `Phrase` from `candidate`

pub mod candidate;
pub mod code_buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod session;

pub use candidate::{CandidateList, Phrase};
pub use code_buffer::CodeBuffer;
pub use config::TableConfig;
pub use engine::TableEngine;
pub use error::{Result, TableError};
pub use lexicon::{Lexicon, SourceStamp, TableSource};
pub use session::TableSession;

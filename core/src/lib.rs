//! rime-bridge-core
//!
//! Exposes an input method engine session as a newline-delimited JSON
//! request/response stream. The engine itself stays opaque: the bridge only
//! talks to it through the `RimeApi` capability contract.
//!
//! Public API:
//! - `RimeApi` / `Capabilities` - the engine contract and its presence check
//! - `EngineHandle` - a connected, initialized engine
//! - `SessionManager` - the single live session, recreated on demand
//! - `Request` - decoding of one request line into a `KeyEvent`
//! - `Response` / `Envelope` - projection of engine state onto the wire
//! - `Bridge` / `run` - the serve loop
//! - `Shutdown` - signal-driven stop flag
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rime_bridge_core::{run, BridgeConfig, EngineHandle, Shutdown, StdinSource};
//!
//! let config = BridgeConfig::default();
//! let shutdown = Shutdown::new();
//! shutdown.install()?;
//!
//! let engine = EngineHandle::connect(my_engine, config.traits()?)?;
//! let mut source = StdinSource::spawn(config.max_line_bytes, config.poll_interval());
//! let mut stdout = std::io::stdout().lock();
//! run(engine, shutdown, &mut source, &mut stdout)?;
//! ```

pub mod api;
pub use api::{Candidate, Capabilities, Commit, Composition, Context, Menu, RimeApi, SessionId};

pub mod bridge;
pub use bridge::{run, Bridge, StopReason};

pub mod config;
pub use config::{BridgeConfig, Traits};

pub mod error;
pub use error::{BridgeError, Result};

pub mod handle;
pub use handle::EngineHandle;

pub mod input;
pub use input::{BufReadSource, LineSource, RequestLine, StdinSource};

pub mod key_event;
pub use key_event::{keysym, KeyEvent, Modifiers};

pub mod request;
pub use request::Request;

pub mod response;
pub use response::{Envelope, Response, DEFAULT_SELECT_KEYS};

pub mod session;
pub use session::SessionManager;

pub mod shutdown;
pub use shutdown::Shutdown;

pub mod snapshot;
pub use snapshot::Snapshot;

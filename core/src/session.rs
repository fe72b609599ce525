//! The single live session.
//!
//! Sessions can disappear on the engine side at any time; that is only
//! discovered when the bridge is about to use one. `ensure_live` checks the
//! current id and swaps in a fresh session when the old one is gone, so from
//! the protocol's point of view there is always exactly one session.

use tracing::{debug, warn};

use crate::api::{RimeApi, SessionId};
use crate::error::{BridgeError, Result};

#[derive(Debug)]
pub struct SessionManager {
    current: SessionId,
}

impl SessionManager {
    /// Create the first session.
    pub fn open<E: RimeApi + ?Sized>(api: &mut E) -> Result<Self> {
        let current = api.create_session().ok_or(BridgeError::SessionCreate)?;
        debug!(session = %current, "session created");
        Ok(Self { current })
    }

    pub fn current(&self) -> SessionId {
        self.current
    }

    /// Return a live session id, recreating the session if the engine lost it.
    ///
    /// Failing to recreate is fatal: there is no second attempt.
    pub fn ensure_live<E: RimeApi + ?Sized>(&mut self, api: &mut E) -> Result<SessionId> {
        if !api.find_session(self.current) {
            let replacement = api.create_session().ok_or(BridgeError::SessionCreate)?;
            debug!(stale = %self.current, session = %replacement, "session recreated");
            self.current = replacement;
        }
        Ok(self.current)
    }

    /// Best-effort teardown at shutdown.
    pub fn destroy<E: RimeApi + ?Sized>(self, api: &mut E) {
        if api.destroy_session(self.current) {
            debug!(session = %self.current, "session destroyed");
        } else {
            warn!(session = %self.current, "engine did not destroy session");
        }
    }
}

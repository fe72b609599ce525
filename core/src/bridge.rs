//! The serve loop.
//!
//! One iteration: check the shutdown flag, pull one line, make sure the
//! session is alive, feed the key event, write exactly one response line and
//! flush. Only startup problems, session re-creation failures and I/O errors
//! stop the loop early; everything else is absorbed per line.

use std::io::Write;

use tracing::{debug, error, info, warn};

use crate::api::{RimeApi, SessionId};
use crate::error::Result;
use crate::handle::EngineHandle;
use crate::input::{LineSource, RequestLine};
use crate::key_event::KeyEvent;
use crate::request::Request;
use crate::response::{Envelope, Response};
use crate::session::SessionManager;
use crate::shutdown::Shutdown;

/// Why the serve loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfInput,
    Shutdown,
}

pub struct Bridge<E: RimeApi> {
    engine: EngineHandle<E>,
    session: SessionManager,
    shutdown: Shutdown,
}

impl<E: RimeApi> Bridge<E> {
    /// Open the first session on a connected engine.
    pub fn start(mut engine: EngineHandle<E>, shutdown: Shutdown) -> Result<Self> {
        let session = SessionManager::open(engine.api_mut())?;
        Ok(Self {
            engine,
            session,
            shutdown,
        })
    }

    pub fn engine(&self) -> &EngineHandle<E> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EngineHandle<E> {
        &mut self.engine
    }

    pub fn session(&self) -> SessionId {
        self.session.current()
    }

    /// Decode one line and dispatch it. Malformed lines become the neutral key.
    pub fn handle_line(&mut self, line: &RequestLine) -> Result<Response> {
        let request = Request::from_line(line);
        if let Request::Invalid(reason) = &request {
            error!(%reason, "Invalid json input");
        }
        self.dispatch(request.key_event())
    }

    /// Feed `key` into the live session and project the result.
    ///
    /// An unhandled key short-circuits to `null` without probing the engine.
    pub fn dispatch(&mut self, key: KeyEvent) -> Result<Response> {
        let session = self.session.ensure_live(self.engine.api_mut())?;
        let handled = self.engine.api_mut().process_key(session, key);
        debug!(keycode = key.keycode, modifiers = key.modifiers.raw(), handled, "key processed");
        if !handled {
            return Ok(Response::NoEffect);
        }
        Ok(Response::State(Envelope::project(self.engine.api(), session)))
    }

    pub fn serve<S, W>(&mut self, source: &mut S, out: &mut W) -> Result<StopReason>
    where
        S: LineSource + ?Sized,
        W: Write + ?Sized,
    {
        loop {
            if self.shutdown.is_requested() {
                return Ok(StopReason::Shutdown);
            }
            let Some(line) = source.next_line(&self.shutdown)? else {
                return Ok(if self.shutdown.is_requested() {
                    StopReason::Shutdown
                } else {
                    StopReason::EndOfInput
                });
            };
            let response = self.handle_line(&line)?;
            write_response(out, &response)?;
        }
    }

    /// Destroy the session, then finalize the engine.
    pub fn close(self) {
        let Self {
            mut engine,
            session,
            ..
        } = self;
        session.destroy(engine.api_mut());
        engine.finalize();
    }
}

/// Write one response line and flush it.
pub fn write_response<W: Write + ?Sized>(out: &mut W, response: &Response) -> Result<()> {
    let line = response.to_line()?;
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Serve `source` until it ends or shutdown is requested, then release the
/// session and the engine whatever the outcome.
pub fn run<E, S, W>(
    engine: EngineHandle<E>,
    shutdown: Shutdown,
    source: &mut S,
    out: &mut W,
) -> Result<StopReason>
where
    E: RimeApi,
    S: LineSource + ?Sized,
    W: Write + ?Sized,
{
    let mut bridge = Bridge::start(engine, shutdown)?;
    let outcome = bridge.serve(source, out);
    match &outcome {
        Ok(StopReason::EndOfInput) => info!("end of input"),
        Ok(StopReason::Shutdown) => info!("shutdown requested"),
        Err(e) => warn!(error = %e, "serve loop aborted"),
    }
    bridge.close();
    outcome
}

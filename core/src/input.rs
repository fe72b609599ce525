//! Request line framing.
//!
//! Requests are newline-delimited. Each line is read with an upper bound on
//! its payload; anything past the bound is drained up to the next newline so
//! the following request still starts on a fresh line.
//!
//! Two sources are provided:
//! - `BufReadSource` reads straight from any `BufRead` (pipes, tests)
//! - `StdinSource` reads stdin on a helper thread so an idle loop can still
//!   observe the shutdown flag while no input arrives

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error};

use crate::shutdown::Shutdown;

/// One raw request line, without its terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub bytes: Vec<u8>,
    /// The line was longer than the bound and got cut.
    pub oversized: bool,
}

impl RequestLine {
    pub fn new<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self {
            bytes: bytes.into(),
            oversized: false,
        }
    }
}

/// Read one line of at most `max_bytes` payload bytes.
///
/// Returns `Ok(None)` at end of input. A final line without a trailing
/// newline is still returned.
pub fn read_bounded_line<R: BufRead + ?Sized>(
    reader: &mut R,
    max_bytes: usize,
) -> io::Result<Option<RequestLine>> {
    let mut line = RequestLine::default();
    let mut saw_any = false;

    loop {
        let (consumed, done) = {
            let available = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            saw_any = true;

            let (chunk, consumed, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..pos], pos + 1, true),
                None => (available, available.len(), false),
            };

            // one spare byte so a CR before the newline does not count
            let room = max_bytes.saturating_add(1).saturating_sub(line.bytes.len());
            if chunk.len() > room {
                line.oversized = true;
            }
            line.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
            (consumed, done)
        };
        reader.consume(consumed);
        if done {
            break;
        }
    }

    if !saw_any {
        return Ok(None);
    }
    if line.bytes.last() == Some(&b'\r') {
        line.bytes.pop();
    }
    if line.bytes.len() > max_bytes {
        line.oversized = true;
        line.bytes.truncate(max_bytes);
    }
    Ok(Some(line))
}

/// Where the serve loop pulls request lines from.
pub trait LineSource {
    /// Next line, or `None` when input ended or shutdown was requested while
    /// waiting.
    fn next_line(&mut self, shutdown: &Shutdown) -> io::Result<Option<RequestLine>>;
}

/// Reads lines directly from a `BufRead`.
pub struct BufReadSource<R> {
    reader: R,
    max_bytes: usize,
}

impl<R: BufRead> BufReadSource<R> {
    pub fn new(reader: R, max_bytes: usize) -> Self {
        Self { reader, max_bytes }
    }
}

impl<R: BufRead> LineSource for BufReadSource<R> {
    fn next_line(&mut self, _shutdown: &Shutdown) -> io::Result<Option<RequestLine>> {
        read_bounded_line(&mut self.reader, self.max_bytes)
    }
}

/// Reads stdin on a helper thread and hands lines over a channel.
///
/// The helper thread only frames lines; all engine work stays on the caller's
/// thread.
pub struct StdinSource {
    lines: Receiver<io::Result<RequestLine>>,
    poll_interval: Duration,
}

impl StdinSource {
    pub fn spawn(max_bytes: usize, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let stdin = io::stdin();
                let mut reader = stdin.lock();
                loop {
                    match read_bounded_line(&mut reader, max_bytes) {
                        Ok(Some(line)) => {
                            if tx.send(Ok(line)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {
                            debug!("stdin closed");
                            break;
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            break;
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            // The sender died with the closure, so the loop sees end of input.
            error!(error = %e, "failed to spawn stdin reader");
        }
        Self::from_receiver(rx, poll_interval)
    }

    pub fn from_receiver(lines: Receiver<io::Result<RequestLine>>, poll_interval: Duration) -> Self {
        Self {
            lines,
            poll_interval,
        }
    }
}

impl LineSource for StdinSource {
    fn next_line(&mut self, shutdown: &Shutdown) -> io::Result<Option<RequestLine>> {
        loop {
            if shutdown.is_requested() {
                return Ok(None);
            }
            match self.lines.recv_timeout(self.poll_interval) {
                Ok(line) => return line.map(Some),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

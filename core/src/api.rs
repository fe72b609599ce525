//! Engine capability contract.
//!
//! The engine owns every linguistic decision; the bridge only needs the
//! operations below. A provider reports which of them it actually implements
//! through `capabilities()`, and `EngineHandle::connect` refuses providers
//! that fall short of `Capabilities::REQUIRED`.

use std::fmt;

use bitflags::bitflags;

use crate::config::Traits;
use crate::key_event::KeyEvent;

/// Opaque reference to engine-held session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

bitflags! {
    /// Operations an engine provider exposes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const SETUP             = 1 << 0;
        const INITIALIZE        = 1 << 1;
        const FINALIZE          = 1 << 2;
        const START_MAINTENANCE = 1 << 3;
        const CREATE_SESSION    = 1 << 4;
        const DESTROY_SESSION   = 1 << 5;
        const FIND_SESSION      = 1 << 6;
        const PROCESS_KEY       = 1 << 7;
        const GET_COMMIT        = 1 << 8;
        const FREE_COMMIT       = 1 << 9;
        const GET_CONTEXT       = 1 << 10;
        const FREE_CONTEXT      = 1 << 11;
    }
}

impl Capabilities {
    /// Everything the bridge calls.
    pub const REQUIRED: Capabilities = Capabilities::all();

    /// Lower-case operation names, e.g. `"get_commit, free_context"`.
    pub fn names(self) -> String {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Finalized text produced by a key event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    pub text: Option<String>,
}

/// In-progress, uncommitted input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    pub preedit: Option<String>,
}

/// One selectable interpretation of the composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub comment: Option<String>,
}

impl Candidate {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text: text.into(),
            comment: None,
        }
    }

    pub fn with_comment<T: Into<String>, C: Into<String>>(text: T, comment: C) -> Self {
        Self {
            text: text.into(),
            comment: Some(comment.into()),
        }
    }
}

/// The visible page of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    /// Candidates on the current page, in display order.
    pub candidates: Vec<Candidate>,
    /// Characters used to pick candidates by position; `None` means the
    /// engine has no opinion.
    pub select_keys: Option<String>,
}

/// Composition and menu read as a single snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub composition: Composition,
    pub menu: Menu,
}

/// The engine operations the bridge depends on.
///
/// Snapshots returned by `get_commit` / `get_context` are borrowed from the
/// engine and must be handed back through the matching `free_*` call; the
/// `Snapshot` guard does that automatically.
pub trait RimeApi {
    /// Which of the operations below this provider implements.
    fn capabilities(&self) -> Capabilities;

    fn setup(&mut self, traits: &Traits);

    fn initialize(&mut self, traits: &Traits);

    fn finalize(&mut self);

    /// Compile or refresh engine data. Returns true if a pass was started.
    fn start_maintenance(&mut self, full_check: bool) -> bool;

    fn create_session(&mut self) -> Option<SessionId>;

    fn destroy_session(&mut self, session: SessionId) -> bool;

    /// Whether `session` still denotes a live session.
    fn find_session(&self, session: SessionId) -> bool;

    /// Feed one key event. Returns true if the engine handled it.
    fn process_key(&mut self, session: SessionId, key: KeyEvent) -> bool;

    fn get_commit(&self, session: SessionId) -> Option<Commit>;

    fn free_commit(&self, commit: &mut Commit) -> bool;

    fn get_context(&self, session: SessionId) -> Option<Context>;

    fn free_context(&self, context: &mut Context) -> bool;
}

// Scripted engine shared by the bridge integration tests.
//
// Each `process_key` call pops the next `Reply` from the script; once the
// script runs dry every key is unhandled. All calls are logged so tests can
// check ordering and that snapshots were handed back.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use rime_bridge_core::{
    Candidate, Capabilities, Commit, Context, KeyEvent, RimeApi, SessionId, Traits,
};

#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub handled: bool,
    pub commit: Option<Commit>,
    pub context: Option<Context>,
}

impl Reply {
    pub fn unhandled() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            ..Self::default()
        }
    }

    pub fn commit(mut self, text: &str) -> Self {
        self.commit = Some(Commit {
            text: Some(text.to_string()),
        });
        self
    }

    pub fn preedit(mut self, preedit: &str) -> Self {
        let context = self.context.get_or_insert_with(Context::default);
        context.composition.preedit = Some(preedit.to_string());
        self
    }

    pub fn candidates(mut self, candidates: Vec<Candidate>) -> Self {
        let context = self.context.get_or_insert_with(Context::default);
        context.menu.candidates = candidates;
        self
    }

    pub fn select_keys(mut self, keys: &str) -> Self {
        let context = self.context.get_or_insert_with(Context::default);
        context.menu.select_keys = Some(keys.to_string());
        self
    }
}

#[derive(Debug)]
pub struct Script {
    pub capabilities: Capabilities,
    pub replies: VecDeque<Reply>,
    pub current: Reply,
    pub live: HashSet<u64>,
    pub next_session: u64,
    pub refuse_sessions: bool,
    pub keys: Vec<KeyEvent>,
    pub calls: Vec<&'static str>,
    pub outstanding: i32,
    pub traits: Option<Traits>,
    pub full_check: Option<bool>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::REQUIRED,
            replies: VecDeque::new(),
            current: Reply::default(),
            live: HashSet::new(),
            next_session: 1,
            refuse_sessions: false,
            keys: Vec::new(),
            calls: Vec::new(),
            outstanding: 0,
            traits: None,
            full_check: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    pub script: Rc<RefCell<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I: IntoIterator<Item = Reply>>(replies: I) -> Self {
        let engine = Self::new();
        engine.script.borrow_mut().replies.extend(replies);
        engine
    }

    pub fn push(&self, reply: Reply) {
        self.script.borrow_mut().replies.push_back(reply);
    }

    pub fn count(&self, call: &str) -> usize {
        self.script.borrow().calls.iter().filter(|c| **c == call).count()
    }

    /// Drop every live session behind the bridge's back.
    pub fn evict_all(&self) {
        self.script.borrow_mut().live.clear();
    }

    fn log(&self, call: &'static str) {
        self.script.borrow_mut().calls.push(call);
    }
}

impl RimeApi for ScriptedEngine {
    fn capabilities(&self) -> Capabilities {
        self.script.borrow().capabilities
    }

    fn setup(&mut self, traits: &Traits) {
        self.log("setup");
        self.script.borrow_mut().traits = Some(traits.clone());
    }

    fn initialize(&mut self, _traits: &Traits) {
        self.log("initialize");
    }

    fn finalize(&mut self) {
        self.log("finalize");
    }

    fn start_maintenance(&mut self, full_check: bool) -> bool {
        self.log("start_maintenance");
        self.script.borrow_mut().full_check = Some(full_check);
        true
    }

    fn create_session(&mut self) -> Option<SessionId> {
        self.log("create_session");
        let mut script = self.script.borrow_mut();
        if script.refuse_sessions {
            return None;
        }
        let id = script.next_session;
        script.next_session += 1;
        script.live.insert(id);
        Some(SessionId::new(id))
    }

    fn destroy_session(&mut self, session: SessionId) -> bool {
        self.log("destroy_session");
        self.script.borrow_mut().live.remove(&session.get())
    }

    fn find_session(&self, session: SessionId) -> bool {
        self.script.borrow().live.contains(&session.get())
    }

    fn process_key(&mut self, session: SessionId, key: KeyEvent) -> bool {
        self.log("process_key");
        let mut script = self.script.borrow_mut();
        assert!(script.live.contains(&session.get()), "key sent to dead session");
        script.keys.push(key);
        let reply = script.replies.pop_front().unwrap_or_default();
        script.current = reply;
        script.current.handled
    }

    fn get_commit(&self, _session: SessionId) -> Option<Commit> {
        self.log("get_commit");
        let mut script = self.script.borrow_mut();
        let commit = script.current.commit.clone();
        if commit.is_some() {
            script.outstanding += 1;
        }
        commit
    }

    fn free_commit(&self, commit: &mut Commit) -> bool {
        self.log("free_commit");
        commit.text = None;
        self.script.borrow_mut().outstanding -= 1;
        true
    }

    fn get_context(&self, _session: SessionId) -> Option<Context> {
        self.log("get_context");
        let mut script = self.script.borrow_mut();
        let context = Some(script.current.context.clone().unwrap_or_default());
        script.outstanding += 1;
        context
    }

    fn free_context(&self, context: &mut Context) -> bool {
        self.log("free_context");
        *context = Context::default();
        self.script.borrow_mut().outstanding -= 1;
        true
    }
}

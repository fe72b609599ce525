//! Per-session composition state and key handling.

use rime_bridge_core::api::{Candidate, Commit, Composition, Context, Menu};
use rime_bridge_core::{keysym, KeyEvent, Modifiers};

use crate::candidate::CandidateList;
use crate::code_buffer::CodeBuffer;
use crate::config::TableConfig;
use crate::lexicon::Lexicon;

/// Keys carrying any of these are left to the application.
const PASSTHROUGH: Modifiers = Modifiers::CONTROL
    .union(Modifiers::ALT)
    .union(Modifiers::SUPER)
    .union(Modifiers::RELEASE);

#[derive(Debug, Clone)]
pub struct TableSession {
    buffer: CodeBuffer,
    candidates: CandidateList,
    /// Text committed by the most recent key, cleared on the next one.
    commit: Option<String>,
}

impl TableSession {
    pub fn new(config: &TableConfig) -> Self {
        Self {
            buffer: CodeBuffer::new(),
            candidates: CandidateList::with_page_size(config.page_size),
            commit: None,
        }
    }

    pub fn is_composing(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn input(&self) -> &str {
        self.buffer.text()
    }

    pub fn pending_commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Feed one key. Returns whether the key was consumed.
    pub fn process_key(
        &mut self,
        key: KeyEvent,
        lexicon: Option<&Lexicon>,
        config: &TableConfig,
    ) -> bool {
        self.commit = None;

        if key.keycode == keysym::NONE || key.modifiers.intersects(PASSTHROUGH) {
            return false;
        }

        if !self.is_composing() {
            return match key.printable() {
                Some(ch) if ch.is_ascii_lowercase() => {
                    self.buffer.insert(ch);
                    self.refresh(lexicon, config);
                    true
                }
                _ => false,
            };
        }

        if let Some(ch) = key.printable() {
            if !self.candidates.is_empty() {
                if let Some(index) = config.selection_key_index(ch) {
                    if let Some(text) = self.candidates.on_page(index).map(|p| p.text.clone()) {
                        self.commit_text(text);
                    }
                    return true;
                }
            }
            if ch.is_ascii_lowercase() || key.keycode == keysym::APOSTROPHE {
                self.buffer.insert(ch);
                self.refresh(lexicon, config);
                return true;
            }
        }

        match key.keycode {
            keysym::SPACE => {
                let text = match self.candidates.highlighted() {
                    Some(phrase) => phrase.text.clone(),
                    None => self.buffer.text().to_string(),
                };
                self.commit_text(text);
            }
            keysym::RETURN | keysym::KP_ENTER => {
                let text = self.buffer.text().to_string();
                self.commit_text(text);
            }
            keysym::ESCAPE => self.reset(),
            keysym::BACKSPACE => {
                if self.buffer.delete_before() {
                    self.refresh(lexicon, config);
                }
            }
            keysym::DELETE => {
                if self.buffer.delete_after() {
                    self.refresh(lexicon, config);
                }
            }
            keysym::LEFT => {
                self.buffer.move_left();
            }
            keysym::RIGHT => {
                self.buffer.move_right();
            }
            keysym::HOME => self.buffer.move_to_start(),
            keysym::END => self.buffer.move_to_end(),
            keysym::PAGE_UP | keysym::MINUS | keysym::COMMA => {
                self.candidates.page_up();
            }
            keysym::PAGE_DOWN | keysym::EQUAL | keysym::PERIOD => {
                self.candidates.page_down();
            }
            keysym::UP => {
                self.candidates.cursor_up();
            }
            keysym::DOWN => {
                self.candidates.cursor_down();
            }
            // swallowed while composing
            _ => {}
        }
        true
    }

    fn refresh(&mut self, lexicon: Option<&Lexicon>, config: &TableConfig) {
        if self.buffer.is_empty() {
            self.candidates.clear();
            return;
        }
        let found = lexicon
            .map(|lx| lx.lookup(self.buffer.text(), config.completion, config.max_candidates))
            .unwrap_or_default();
        self.candidates.set_candidates(found);
    }

    fn commit_text(&mut self, text: String) {
        self.reset();
        if !text.is_empty() {
            self.commit = Some(text);
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.candidates.clear();
    }

    pub fn commit(&self) -> Option<Commit> {
        self.commit.as_ref().map(|text| Commit {
            text: Some(text.clone()),
        })
    }

    /// Snapshot of the composition and current menu page.
    pub fn context(&self, config: &TableConfig) -> Context {
        let composition = Composition {
            preedit: self.is_composing().then(|| self.buffer.text().to_string()),
        };

        let menu = Menu {
            candidates: self
                .candidates
                .current_page_candidates()
                .iter()
                .map(|phrase| Candidate {
                    text: phrase.text.clone(),
                    comment: phrase.comment.clone(),
                })
                .collect(),
            select_keys: Some(config.select_keys.clone()),
        };

        Context { composition, menu }
    }
}

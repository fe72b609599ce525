//! Raw key code buffer with caret tracking.
//!
//! Holds what the user typed (e.g. "nihao") before it is looked up. Codes are
//! ASCII, so byte offsets and char offsets coincide.

/// Typed code plus a caret position inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    /// Raw code as typed
    text: String,
    /// Caret offset into `text` (0 = before the first char)
    caret: usize,
}

impl CodeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the typed code.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the caret offset.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Check if nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Drop the code and move the caret home.
    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    /// Insert an ASCII code character at the caret. Anything else is ignored.
    /// Returns true if the character was inserted.
    pub fn insert(&mut self, ch: char) -> bool {
        if !ch.is_ascii() {
            return false;
        }
        self.text.insert(self.caret, ch);
        self.caret += 1;
        true
    }

    /// Remove the character before the caret (Backspace).
    /// Returns true if something was removed.
    pub fn delete_before(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        self.caret -= 1;
        self.text.remove(self.caret);
        true
    }

    /// Remove the character after the caret (Delete).
    /// Returns true if something was removed.
    pub fn delete_after(&mut self) -> bool {
        if self.caret >= self.text.len() {
            return false;
        }
        self.text.remove(self.caret);
        true
    }

    /// Move the caret one character left.
    /// Returns true if the caret moved.
    pub fn move_left(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        self.caret -= 1;
        true
    }

    /// Move the caret one character right.
    /// Returns true if the caret moved.
    pub fn move_right(&mut self) -> bool {
        if self.caret >= self.text.len() {
            return false;
        }
        self.caret += 1;
        true
    }

    /// Move the caret before the first character.
    pub fn move_to_start(&mut self) {
        self.caret = 0;
    }

    /// Move the caret after the last character.
    pub fn move_to_end(&mut self) {
        self.caret = self.text.len();
    }
}

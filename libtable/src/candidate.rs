//! Candidate phrases and the paged menu built from them.
//!
//! This module provides:
//! - `Phrase`: one table entry (text, weight, optional comment)
//! - `CandidateList`: paged list with a highlight cursor

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A table entry as stored in the compiled lexicon.
///
/// Weights are relative; higher ranks first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    /// Text committed when the phrase is chosen
    pub text: String,
    /// Ranking weight from the table (default 1)
    pub weight: u32,
    /// Annotation shown next to the text
    pub comment: Option<String>,
}

impl Phrase {
    /// Create a phrase without a comment.
    pub fn new<T: Into<String>>(text: T, weight: u32) -> Self {
        Self {
            text: text.into(),
            weight,
            comment: None,
        }
    }

    /// Attach a comment, replacing any existing one.
    pub fn with_comment<C: Into<String>>(mut self, comment: C) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Candidates for the current code, split into pages.
#[derive(Debug, Clone)]
pub struct CandidateList {
    /// All candidates, best first
    candidates: Vec<Phrase>,
    /// Number of candidates per page (at least 1)
    page_size: usize,
    /// Current page index (0-based)
    current_page: usize,
    /// Highlight position within the current page (0-based)
    cursor: usize,
}

impl CandidateList {
    /// Create an empty list with the given page size. Zero is raised to one.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
            cursor: 0,
        }
    }

    /// Get the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Set the candidates, resetting pagination state.
    pub fn set_candidates(&mut self, candidates: Vec<Phrase>) {
        self.candidates = candidates;
        self.current_page = 0;
        self.cursor = 0;
    }

    /// Remove all candidates.
    pub fn clear(&mut self) {
        self.set_candidates(Vec::new());
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Get the total number of pages.
    pub fn num_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.page_size)
    }

    /// Get the current page index (0-based).
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Check if the current page is the last one. An empty list counts as
    /// being on its last page.
    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.num_pages()
    }

    /// Get the highlight position within the current page (0-based).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn page_range(&self) -> Range<usize> {
        let start = (self.current_page * self.page_size).min(self.candidates.len());
        let end = (start + self.page_size).min(self.candidates.len());
        start..end
    }

    /// Get the candidates for the current page.
    pub fn current_page_candidates(&self) -> &[Phrase] {
        &self.candidates[self.page_range()]
    }

    /// Get the highlighted candidate.
    pub fn highlighted(&self) -> Option<&Phrase> {
        self.current_page_candidates().get(self.cursor)
    }

    /// Get the candidate at `index` on the current page.
    pub fn on_page(&self, index: usize) -> Option<&Phrase> {
        self.current_page_candidates().get(index)
    }

    /// Move the highlight to the previous candidate on the current page.
    /// Returns true if the cursor moved.
    pub fn cursor_up(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Move the highlight to the next candidate on the current page.
    /// Returns true if the cursor moved.
    pub fn cursor_down(&mut self) -> bool {
        if self.cursor + 1 < self.current_page_candidates().len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous page.
    /// Returns true if the page changed.
    pub fn page_up(&mut self) -> bool {
        if self.current_page == 0 {
            return false;
        }
        self.current_page -= 1;
        self.clamp_cursor();
        true
    }

    /// Move to the next page.
    /// Returns true if the page changed.
    pub fn page_down(&mut self) -> bool {
        if self.is_last_page() {
            return false;
        }
        self.current_page += 1;
        self.clamp_cursor();
        true
    }

    fn clamp_cursor(&mut self) {
        let len = self.current_page_candidates().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

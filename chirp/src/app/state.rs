//! Application state
//!
//! All state transitions happen through the reducer (see `reducer.rs`).

use libchirp::{Media, PostError, PostReceipt, MAX_MESSAGE_CHARS};

use super::actions::SubmissionId;

/// Editable message text and cursor
///
/// Stored as Unicode scalar values so the cursor and the length limit count
/// the same unit. Holds `0 <= cursor <= len <= MAX_MESSAGE_CHARS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl ComposeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.chars.len() >= MAX_MESSAGE_CHARS
    }

    /// Insert at the cursor; returns false (and changes nothing) when full
    pub fn insert(&mut self, c: char) -> bool {
        if self.is_full() {
            return false;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        true
    }

    /// Insert all of `text` at the cursor, or nothing if it would not fit
    pub fn insert_str(&mut self, text: &str) -> bool {
        let incoming: Vec<char> = text.chars().collect();
        if self.chars.len() + incoming.len() > MAX_MESSAGE_CHARS {
            return false;
        }
        let count = incoming.len();
        self.chars.splice(self.cursor..self.cursor, incoming);
        self.cursor += count;
        true
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.chars.len();
    }
}

/// Composer mode
///
/// `Posting` is entered only from `Idle` with a non-empty buffer, so at most
/// one submission is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerMode {
    Idle,
    Posting { submission: SubmissionId },
    Posted { receipt: PostReceipt },
    Failed(PostError),
}

impl ComposerMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, ComposerMode::Idle)
    }

    pub fn is_posting(&self) -> bool {
        matches!(self, ComposerMode::Posting { .. })
    }
}

/// Root application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: ComposerMode,
    pub buffer: ComposeBuffer,
    pub media: Option<Media>,
    pub should_quit: bool,
    next_submission: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: ComposerMode::Idle,
            buffer: ComposeBuffer::new(),
            media: None,
            should_quit: false,
            next_submission: 1,
        }
    }
}

/// Everything the renderer needs, detached from the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub cursor: usize,
    pub char_count: usize,
    pub has_media: bool,
    pub mode: ComposerMode,
    /// Message for the last failure, if the composer is showing one
    pub error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submit right now would start a post
    pub fn can_submit(&self) -> bool {
        self.mode.is_idle() && !self.buffer.is_empty()
    }

    /// Reserve the id for the next submission
    pub(crate) fn take_submission_id(&mut self) -> SubmissionId {
        let id = SubmissionId(self.next_submission);
        self.next_submission += 1;
        id
    }

    pub fn snapshot(&self) -> Snapshot {
        let error = match &self.mode {
            ComposerMode::Failed(err) => Some(err.user_message()),
            _ => None,
        };

        Snapshot {
            text: self.buffer.text(),
            cursor: self.buffer.cursor(),
            char_count: self.buffer.len(),
            has_media: self.media.is_some(),
            mode: self.mode.clone(),
            error,
        }
    }
}

//! Actions and commands for the reducer
//!
//! Actions describe what happened. Commands describe the one side effect a
//! transition may ask the event loop to perform.

use crossterm::event::KeyEvent;
use libchirp::{Media, PostOutcome};

/// Identifies one submission so a late result can be matched to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(pub u64);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the clipboard held when it was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    Image(Media),
    Text(String),
    Empty,
}

/// Cursor movement within the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone)]
pub enum Action {
    // === Input ===
    /// Keyboard input event
    Key(KeyEvent),

    /// Bracketed paste from the terminal
    Paste(String),

    /// Periodic tick
    Tick,

    /// Terminal resize event
    Resize(u16, u16),

    // === Editing ===
    Insert(char),
    InsertNewline,
    DeleteBackward,
    MoveCursor(CursorMove),

    /// Ask for the clipboard to be read
    RequestClipboard,

    /// Result of a clipboard read
    ClipboardRead(ClipboardPayload),

    // === Submission ===
    Submit,

    /// Result of a submission
    PostFinished {
        submission: SubmissionId,
        outcome: PostOutcome,
    },

    /// Quit the application
    Quit,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Publish `text` (and `media`) on a background task
    Submit {
        submission: SubmissionId,
        text: String,
        media: Option<Media>,
    },

    /// Read the clipboard on a background task
    ReadClipboard,
}

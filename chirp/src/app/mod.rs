//! Application module
//!
//! - Actions: What can happen
//! - State: What is true right now
//! - Reducer: `(State, Action) -> (State, Option<Command>)`

pub mod actions;
pub mod event;
pub mod reducer;
pub mod state;

pub use actions::{Action, ClipboardPayload, Command, CursorMove, SubmissionId};
pub use reducer::reduce;
pub use state::{AppState, ComposeBuffer, ComposerMode, Snapshot};

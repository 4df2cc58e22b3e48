//! Reducer for composer state transitions
//!
//! `(State, Action) -> (State, Option<Command>)`
//!
//! The reducer performs no I/O. Anything that can block (reading the
//! clipboard, posting) is returned as a [`Command`] for the event loop to
//! dispatch; its result comes back later as another action.

use super::actions::{Action, ClipboardPayload, Command, CursorMove};
use super::state::{AppState, ComposeBuffer, ComposerMode};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub fn reduce(state: AppState, action: Action) -> (AppState, Option<Command>) {
    match action {
        // === Input ===
        Action::Key(key) => handle_key(state, key),
        Action::Paste(text) => {
            let text = text.replace("\r\n", "\n").replace('\r', "\n");
            reduce(state, Action::ClipboardRead(ClipboardPayload::Text(text)))
        }
        Action::Tick | Action::Resize(_, _) => (state, None),

        Action::Quit => {
            let mut state = state;
            state.should_quit = true;
            (state, None)
        }

        // Everything below edits or submits, which only Idle allows
        _ if !state.mode.is_idle() => match action {
            Action::PostFinished {
                submission,
                outcome,
            } => finish_post(state, submission, outcome),
            _ => (state, None),
        },

        // === Editing ===
        Action::Insert(c) => edit(state, |buffer| {
            buffer.insert(c);
        }),
        Action::InsertNewline => edit(state, |buffer| {
            buffer.insert('\n');
        }),
        Action::DeleteBackward => edit(state, |buffer| {
            buffer.delete_backward();
        }),
        Action::MoveCursor(movement) => edit(state, |buffer| match movement {
            CursorMove::Left => buffer.move_left(),
            CursorMove::Right => buffer.move_right(),
            CursorMove::Home => buffer.move_home(),
            CursorMove::End => buffer.move_end(),
        }),

        Action::RequestClipboard => (state, Some(Command::ReadClipboard)),

        Action::ClipboardRead(payload) => merge_clipboard(state, payload),

        // === Submission ===
        Action::Submit => submit(state),

        // No submission in flight while Idle
        Action::PostFinished { .. } => (state, None),
    }
}

fn edit(mut state: AppState, f: impl FnOnce(&mut ComposeBuffer)) -> (AppState, Option<Command>) {
    f(&mut state.buffer);
    (state, None)
}

fn merge_clipboard(mut state: AppState, payload: ClipboardPayload) -> (AppState, Option<Command>) {
    match payload {
        ClipboardPayload::Image(media) => state.media = Some(media),
        // Over-length text is dropped without surfacing an error
        ClipboardPayload::Text(text) => {
            state.buffer.insert_str(&text);
        }
        ClipboardPayload::Empty => {}
    }
    (state, None)
}

fn submit(mut state: AppState) -> (AppState, Option<Command>) {
    if !state.can_submit() {
        return (state, None);
    }

    let submission = state.take_submission_id();
    let command = Command::Submit {
        submission,
        text: state.buffer.text(),
        media: state.media.clone(),
    };
    state.mode = ComposerMode::Posting { submission };
    (state, Some(command))
}

fn finish_post(
    mut state: AppState,
    submission: super::actions::SubmissionId,
    outcome: libchirp::PostOutcome,
) -> (AppState, Option<Command>) {
    // Only the result for the submission in flight counts, and only once
    if state.mode != (ComposerMode::Posting { submission }) {
        return (state, None);
    }

    state.mode = match outcome {
        Ok(receipt) => {
            state.media = None;
            ComposerMode::Posted { receipt }
        }
        Err(err) => ComposerMode::Failed(err),
    };
    (state, None)
}

/// Start a fresh message seeded with `c`
fn start_over(mut state: AppState, c: char) -> (AppState, Option<Command>) {
    let mut buffer = ComposeBuffer::new();
    buffer.insert(c);
    state.mode = ComposerMode::Idle;
    state.buffer = buffer;
    state.media = None;
    (state, None)
}

/// Printable character typed without Ctrl or Alt
fn printable(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

/// Map keys to actions. This is where keybindings are defined.
fn handle_key(state: AppState, key: KeyEvent) -> (AppState, Option<Command>) {
    if key.kind == KeyEventKind::Release {
        return (state, None);
    }

    // Global keybindings (work everywhere)
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
            return reduce(state, Action::Quit);
        }
        (KeyCode::Esc, _) => return reduce(state, Action::Quit),
        _ => {}
    }

    match &state.mode {
        ComposerMode::Idle => handle_composer_key(state, key),
        ComposerMode::Posting { .. } => (state, None),
        ComposerMode::Posted { .. } | ComposerMode::Failed(_) => match printable(&key) {
            Some(c) => start_over(state, c),
            None => (state, None),
        },
    }
}

fn handle_composer_key(state: AppState, key: KeyEvent) -> (AppState, Option<Command>) {
    let action = match (key.code, key.modifiers) {
        (KeyCode::Enter, m) if m.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) => {
            Action::InsertNewline
        }
        (KeyCode::Enter, _) => Action::Submit,
        (KeyCode::Char('j'), KeyModifiers::CONTROL) => Action::InsertNewline,
        (KeyCode::Char('v'), KeyModifiers::CONTROL) => Action::RequestClipboard,
        (KeyCode::Backspace, _) => Action::DeleteBackward,
        (KeyCode::Left, _) => Action::MoveCursor(CursorMove::Left),
        (KeyCode::Right, _) => Action::MoveCursor(CursorMove::Right),
        (KeyCode::Home, _) => Action::MoveCursor(CursorMove::Home),
        (KeyCode::End, _) => Action::MoveCursor(CursorMove::End),
        _ => match printable(&key) {
            Some(c) => Action::Insert(c),
            None => return (state, None),
        },
    };

    reduce(state, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::actions::SubmissionId;
    use libchirp::{PostError, PostReceipt};

    fn typed(text: &str) -> AppState {
        let mut state = AppState::new();
        for c in text.chars() {
            state = reduce(state, Action::Insert(c)).0;
        }
        state
    }

    #[test]
    fn test_reducer_does_not_touch_input_state() {
        let state = typed("hi");
        let before = state.clone();

        let (after, _) = reduce(state, Action::Insert('!'));

        assert_eq!(before.buffer.text(), "hi");
        assert_eq!(after.buffer.text(), "hi!");
    }

    #[test]
    fn test_quit_action() {
        let (state, command) = reduce(AppState::new(), Action::Quit);
        assert!(state.should_quit);
        assert!(command.is_none());
    }

    #[test]
    fn test_submit_empty_is_noop() {
        let (state, command) = reduce(AppState::new(), Action::Submit);
        assert!(state.mode.is_idle());
        assert!(command.is_none());
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let (state, _) = reduce(typed("hello"), Action::Submit);

        let (state, _) = reduce(
            state,
            Action::PostFinished {
                submission: SubmissionId(99),
                outcome: Ok(PostReceipt::default()),
            },
        );
        assert!(state.mode.is_posting());
    }

    #[test]
    fn test_only_first_result_is_honored() {
        let (state, command) = reduce(typed("hello"), Action::Submit);
        let submission = match command {
            Some(Command::Submit { submission, .. }) => submission,
            other => panic!("expected submit command, got {:?}", other),
        };

        let (state, _) = reduce(
            state,
            Action::PostFinished {
                submission,
                outcome: Err(PostError::Timeout(30)),
            },
        );
        let (state, _) = reduce(
            state,
            Action::PostFinished {
                submission,
                outcome: Ok(PostReceipt::default()),
            },
        );

        assert_eq!(state.mode, ComposerMode::Failed(PostError::Timeout(30)));
    }

    #[test]
    fn test_quit_while_posting_keeps_submission() {
        let (state, _) = reduce(typed("hello"), Action::Submit);
        let mode = state.mode.clone();

        let (state, _) = reduce(state, Action::Quit);
        assert!(state.should_quit);
        assert_eq!(state.mode, mode);
    }

    #[test]
    fn test_fresh_post_keeps_submission_counter() {
        let (state, first) = reduce(typed("one"), Action::Submit);
        let first = match first {
            Some(Command::Submit { submission, .. }) => submission,
            other => panic!("expected submit command, got {:?}", other),
        };
        let (state, _) = reduce(
            state,
            Action::PostFinished {
                submission: first,
                outcome: Ok(PostReceipt::default()),
            },
        );

        let (state, _) = start_over(state, 'x');
        assert!(state.mode.is_idle());
        assert_eq!(state.buffer.text(), "x");

        let (_, second) = reduce(state, Action::Submit);
        match second {
            Some(Command::Submit { submission, .. }) => assert_ne!(submission, first),
            other => panic!("expected submit command, got {:?}", other),
        }
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let (state, _) = reduce(AppState::new(), Action::Paste("a\r\nb\rc".to_string()));
        assert_eq!(state.buffer.text(), "a\nb\nc");
    }
}

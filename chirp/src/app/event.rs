//! Event handling infrastructure
//!
//! Terminal input and background results share one channel. An input
//! thread polls crossterm and forwards events (or a tick when nothing
//! happened); background tasks hold a clone of the sender and report their
//! results through it. The main loop blocks on [`EventHandler::next`].

use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event as CrosstermEvent};

use crate::app::Action;
use crate::error::{Result, TuiError};

pub struct EventHandler {
    tx: Sender<Action>,
    rx: Receiver<Action>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, tick_rate }
    }

    /// Sender for background tasks to report results
    pub fn sender(&self) -> Sender<Action> {
        self.tx.clone()
    }

    /// Start forwarding terminal events into the channel
    ///
    /// The thread exits once the receiving side is gone.
    pub fn spawn_input_thread(&self) -> thread::JoinHandle<()> {
        let tx = self.tx.clone();
        let tick_rate = self.tick_rate;

        thread::spawn(move || loop {
            let action = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(event) => translate(event),
                    Err(e) => {
                        tracing::error!("Failed to read terminal event: {}", e);
                        None
                    }
                },
                Ok(false) => Some(Action::Tick),
                Err(e) => {
                    tracing::error!("Failed to poll terminal: {}", e);
                    break;
                }
            };

            if let Some(action) = action {
                if tx.send(action).is_err() {
                    break;
                }
            }
        })
    }

    /// Block until the next event
    pub fn next(&self) -> Result<Action> {
        self.rx
            .recv()
            .map_err(|e| TuiError::Event(e.to_string()))
    }
}

/// Convert a terminal event into an action; `None` for events we ignore
pub fn translate(event: CrosstermEvent) -> Option<Action> {
    match event {
        CrosstermEvent::Key(key) => Some(Action::Key(key)),
        CrosstermEvent::Paste(text) => Some(Action::Paste(text)),
        CrosstermEvent::Resize(w, h) => Some(Action::Resize(w, h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_background_results_arrive_in_order() {
        let handler = EventHandler::new(Duration::from_millis(100));
        let tx = handler.sender();

        tx.send(Action::Tick).unwrap();
        tx.send(Action::Quit).unwrap();

        assert!(matches!(handler.next().unwrap(), Action::Tick));
        assert!(matches!(handler.next().unwrap(), Action::Quit));
    }

    #[test]
    fn test_translate_events() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(matches!(translate(CrosstermEvent::Key(key)), Some(Action::Key(_))));
        assert!(matches!(
            translate(CrosstermEvent::Paste("hi".to_string())),
            Some(Action::Paste(ref s)) if s == "hi"
        ));
        assert!(matches!(
            translate(CrosstermEvent::Resize(80, 24)),
            Some(Action::Resize(80, 24))
        ));
        assert!(translate(CrosstermEvent::FocusGained).is_none());
    }
}

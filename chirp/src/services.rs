//! Service layer adapter for the composer
//!
//! Bridges the synchronous event loop and the async [`PostingService`].
//! Commands from the reducer run on a tokio runtime; every result is sent
//! back into the event loop's channel as an [`Action`].
//!
//! # Example
//!
//! ```no_run
//! use chirp::app::{event::EventHandler, Command, SubmissionId};
//! use chirp::services::ServiceHandle;
//! use libchirp::Config;
//! use std::time::Duration;
//!
//! # fn example() -> chirp::error::Result<()> {
//! let events = EventHandler::new(Duration::from_millis(250));
//! let services = ServiceHandle::new(&Config::default(), events.sender())?;
//!
//! services.dispatch(Command::Submit {
//!     submission: SubmissionId(1),
//!     text: "Hello world".to_string(),
//!     media: None,
//! });
//! // The outcome arrives later as Action::PostFinished
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use libchirp::{
    ApiClient, CancelSignal, ChirpError, Config, EncryptedFileStore, PostingService, RateLimiter,
};
use uuid::Uuid;

use crate::app::{Action, Command};
use crate::clipboard::{read_payload, ArboardClipboard, ClipboardSource};
use crate::error::Result;

pub struct ServiceHandle {
    service: PostingService,
    runtime: tokio::runtime::Runtime,
    tx: Sender<Action>,
    clipboard: Arc<Mutex<Box<dyn ClipboardSource>>>,
}

impl ServiceHandle {
    /// Build the posting stack from `config` with the system clipboard
    ///
    /// # Errors
    ///
    /// Returns an error if the tokio runtime or the HTTP client cannot be
    /// created.
    pub fn new(config: &Config, tx: Sender<Action>) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;

        let limiter = Arc::new(RateLimiter::from_config(&config.limits));
        let client = ApiClient::from_config(config, limiter).map_err(ChirpError::from)?;
        let store = EncryptedFileStore::from_config(&config.storage);
        let service = PostingService::new(Arc::new(store), Arc::new(client));

        Ok(Self::from_parts(
            runtime,
            service,
            tx,
            Box::new(ArboardClipboard),
        ))
    }

    pub fn from_parts(
        runtime: tokio::runtime::Runtime,
        service: PostingService,
        tx: Sender<Action>,
        clipboard: Box<dyn ClipboardSource>,
    ) -> Self {
        Self {
            service,
            runtime,
            tx,
            clipboard: Arc::new(Mutex::new(clipboard)),
        }
    }

    /// Run `command` in the background
    ///
    /// Returns immediately; the result re-enters the event loop.
    pub fn dispatch(&self, command: Command) {
        match command {
            Command::Submit {
                submission,
                text,
                media,
            } => {
                let service = self.service.clone();
                let tx = self.tx.clone();
                let request_id = Uuid::new_v4();

                tracing::info!(%request_id, %submission, "Submitting message");
                self.runtime.spawn(async move {
                    let outcome = service.submit(&text, media, &CancelSignal::never()).await;
                    match &outcome {
                        Ok(receipt) => tracing::info!(%request_id, id = %receipt.id, "Submission succeeded"),
                        Err(e) => tracing::warn!(%request_id, "Submission failed: {}", e),
                    }
                    if tx.send(Action::PostFinished { submission, outcome }).is_err() {
                        tracing::debug!(%request_id, "Event loop gone, dropping result");
                    }
                });
            }
            Command::ReadClipboard => {
                let clipboard = Arc::clone(&self.clipboard);
                let tx = self.tx.clone();

                self.runtime.spawn_blocking(move || {
                    let payload = {
                        let mut source = clipboard
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner());
                        read_payload(source.as_mut())
                    };
                    if tx.send(Action::ClipboardRead(payload)).is_err() {
                        tracing::debug!("Event loop gone, dropping clipboard read");
                    }
                });
            }
        }
    }

    /// Stop without waiting for background work
    pub fn shutdown(self) {
        self.runtime.shutdown_background();
    }
}

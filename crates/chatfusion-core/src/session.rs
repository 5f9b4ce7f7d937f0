//! Conversation session controller
//!
//! Owns the transcript, the pending input and the awaiting-response flag for
//! one chat session. Completion calls run on a spawned tokio task and report
//! back through a channel, so the owning event loop stays responsive and
//! applies results with [`SessionController::next_resolution`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ai::{CompletionClient, CompletionError};
use crate::input::InputBuffer;
use crate::state::MessageEntry;
use crate::transcript::Transcript;

/// What `submit` did with the offered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank after trimming; nothing changed.
    Ignored,
    /// A request is already in flight; nothing changed.
    Rejected,
    /// User entry appended and request sent.
    Dispatched,
}

/// What `next_resolution` appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Replied,
    Failed,
    /// Result for a request that is no longer current; dropped.
    Stale,
}

struct Completed {
    request_id: u64,
    result: Result<String, CompletionError>,
}

struct InFlight {
    id: u64,
    task: JoinHandle<()>,
}

pub struct SessionController {
    transcript: Transcript,
    input: InputBuffer,
    awaiting: bool,
    client: Arc<dyn CompletionClient>,
    next_request_id: u64,
    in_flight: Option<InFlight>,
    results_tx: mpsc::UnboundedSender<Completed>,
    results_rx: mpsc::UnboundedReceiver<Completed>,
}

impl SessionController {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Self {
            transcript: Transcript::default(),
            input: InputBuffer::new(),
            awaiting: false,
            client,
            next_request_id: 0,
            in_flight: None,
            results_tx,
            results_rx,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Send whatever is currently in the input buffer.
    pub fn submit_input(&mut self) -> SubmitOutcome {
        let text = self.input.text().to_string();
        self.submit(&text)
    }

    /// Offer a message. At most one request is in flight at a time; offers
    /// made while waiting are rejected and leave the input untouched.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let prompt = text.trim();
        if prompt.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.awaiting {
            debug!("submit rejected: request already in flight");
            return SubmitOutcome::Rejected;
        }

        self.transcript.append(MessageEntry::user(prompt));
        self.input.clear();
        self.awaiting = true;

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        info!(
            request_id,
            model = self.client.model(),
            prompt_chars = prompt.chars().count(),
            "dispatching completion request"
        );

        let client = Arc::clone(&self.client);
        let tx = self.results_tx.clone();
        let prompt = prompt.to_string();
        let task = tokio::spawn(async move {
            let result = client.complete(&prompt).await;
            // Receiver gone means the session was torn down.
            let _ = tx.send(Completed { request_id, result });
        });

        self.in_flight = Some(InFlight { id: request_id, task });
        SubmitOutcome::Dispatched
    }

    /// Wait for the in-flight request to finish and append its outcome.
    ///
    /// Pends forever while nothing is in flight, which makes it safe to use
    /// as a `select!` branch. Cancel safe.
    pub async fn next_resolution(&mut self) -> Resolution {
        let Some(completed) = self.results_rx.recv().await else {
            // The controller holds a sender, so the channel never closes.
            return std::future::pending().await;
        };
        self.apply(completed)
    }

    fn apply(&mut self, completed: Completed) -> Resolution {
        let current = self.in_flight.as_ref().map(|f| f.id);
        if current != Some(completed.request_id) {
            debug!(request_id = completed.request_id, "discarding stale completion");
            return Resolution::Stale;
        }
        self.in_flight = None;

        let resolution = match completed.result {
            Ok(text) => {
                info!(
                    request_id = completed.request_id,
                    reply_chars = text.chars().count(),
                    "completion received"
                );
                self.transcript.append(MessageEntry::reply(text));
                Resolution::Replied
            }
            Err(err) => {
                warn!(
                    request_id = completed.request_id,
                    kind = ?err.kind(),
                    error = %err,
                    "completion request failed"
                );
                self.transcript.append(MessageEntry::failure());
                Resolution::Failed
            }
        };

        self.awaiting = false;
        resolution
    }

    /// Abort any in-flight request. Its result, if already queued, is
    /// discarded as stale.
    pub fn shutdown(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(request_id = in_flight.id, "aborting in-flight completion");
            in_flight.task.abort();
        }
        self.awaiting = false;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}

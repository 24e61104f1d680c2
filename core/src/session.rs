//! Conversation Session
//!
//! The session core: owns the ordered message history, the draft input, the
//! in-flight query lifecycle, and speech delegation. Surfaces feed user
//! intent in through the methods here and drain [`SessionEvent`]s out
//! through [`ConversationSession::poll`]; nothing else mutates session
//! state.
//!
//! # Single-Flight Queries
//!
//! The session is an explicit two-state machine: `Idle` and
//! `AwaitingReply`. Submitting while a reply is awaited is a no-op (the
//! submission is dropped, not queued), which removes any response
//! reordering hazard: at most one query is ever in flight.
//!
//! # Teardown
//!
//! Query and synthesis tasks carry the session's cancellation token. After
//! [`shutdown`](ConversationSession::shutdown), late-arriving results are
//! discarded instead of mutating torn-down state.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentBackend;
use crate::auth::{AuthContext, AuthError};
use crate::messages::{Message, MessageId, MessageRole, SessionEvent};
use crate::speech::{AudioOutput, SpeechController, VoiceSettings};

/// Greeting seeded into every new session
pub const GREETING: &str =
    "Hey there! 👋 I'm Cortex, your AI career assistant. What can I help you with today?";

/// Separator joining reply fragments into one assistant message
const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Query lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Ready for a new submission
    #[default]
    Idle,
    /// A query is in flight; new submissions are dropped
    AwaitingReply,
}

/// Async resolutions flowing back into the session
enum SessionSignal {
    /// The agent answered (or the boundary substituted the fallback)
    ReplyReady { fragments: Vec<String> },
}

/// A conversation session between the user and the Cortex assistant
pub struct ConversationSession {
    history: Vec<Message>,
    phase: SessionPhase,
    draft: String,
    speech: SpeechController,
    agent: Arc<dyn AgentBackend>,
    auth: AuthContext,
    signal_tx: mpsc::UnboundedSender<SessionSignal>,
    signal_rx: mpsc::UnboundedReceiver<SessionSignal>,
    events: VecDeque<SessionEvent>,
    cancel: CancellationToken,
}

impl ConversationSession {
    /// Create a session seeded with the assistant greeting
    ///
    /// The auth context is an explicit capability: the session never reads
    /// ambient credential state.
    pub fn new(
        agent: Arc<dyn AgentBackend>,
        audio: Arc<dyn AudioOutput>,
        auth: AuthContext,
        settings: VoiceSettings,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let speech =
            SpeechController::new(Arc::clone(&agent), audio, settings, cancel.child_token());

        let mut session = Self {
            history: Vec::new(),
            phase: SessionPhase::Idle,
            draft: String::new(),
            speech,
            agent,
            auth,
            signal_tx,
            signal_rx,
            events: VecDeque::new(),
            cancel,
        };
        session.append(Message::new(MessageRole::Assistant, GREETING.to_string()));
        session
    }

    // =========================================================================
    // Draft input
    // =========================================================================

    /// Current draft input
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft input
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Append a character to the draft input
    pub fn push_draft(&mut self, c: char) {
        self.draft.push(c);
    }

    /// Remove the last character from the draft input
    pub fn backspace_draft(&mut self) {
        self.draft.pop();
    }

    // =========================================================================
    // Query lifecycle
    // =========================================================================

    /// Submit the current draft as a user query
    ///
    /// Silently a no-op if the draft is empty/whitespace or a query is
    /// already pending. Otherwise appends the user message, clears the
    /// draft, and dispatches the query asynchronously. Resolution arrives
    /// through [`poll`](Self::poll).
    pub fn submit(&mut self) {
        if self.phase == SessionPhase::AwaitingReply {
            // Dropped, not queued
            tracing::debug!("Submission dropped: a query is already pending");
            return;
        }
        if self.draft.trim().is_empty() {
            return;
        }

        let text = std::mem::take(&mut self.draft);
        self.append(Message::new(MessageRole::User, text.clone()));
        self.phase = SessionPhase::AwaitingReply;
        self.events
            .push_back(SessionEvent::PendingChanged { pending: true });

        let agent = Arc::clone(&self.agent);
        let tx = self.signal_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            // query() never fails: the boundary substitutes the fallback
            let fragments = agent.query(&text).await;
            if cancel.is_cancelled() {
                return;
            }
            let _ = tx.send(SessionSignal::ReplyReady { fragments });
        });
    }

    /// Drain async resolutions and return the emitted surface events
    ///
    /// Call once per event-loop turn. Synchronous and cheap.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        while let Ok(signal) = self.signal_rx.try_recv() {
            // A reply queued before shutdown cancelled the token is just as
            // stale as one arriving after: drain it without applying.
            if self.cancel.is_cancelled() {
                continue;
            }
            match signal {
                SessionSignal::ReplyReady { fragments } => {
                    let content = fragments.join(FRAGMENT_SEPARATOR);
                    self.append(Message::new(MessageRole::Assistant, content));
                    self.phase = SessionPhase::Idle;
                    self.events
                        .push_back(SessionEvent::PendingChanged { pending: false });
                }
            }
        }

        if self.speech.poll() {
            self.events.push_back(SessionEvent::SpeechChanged {
                active: self.speech.active_message().cloned(),
            });
        }

        self.events.drain(..).collect()
    }

    // =========================================================================
    // Speech
    // =========================================================================

    /// Toggle speech for a message in the history
    ///
    /// Unknown ids are ignored. Same-id requests toggle the voice off;
    /// otherwise any current playback is superseded.
    pub fn request_speech(&mut self, message_id: &MessageId) {
        let Some(message) = self.history.iter().find(|m| &m.id == message_id) else {
            return;
        };
        let content = message.content.clone();
        self.speech.speak(message_id.clone(), &content);
        self.events.push_back(SessionEvent::SpeechChanged {
            active: self.speech.active_message().cloned(),
        });
    }

    /// The message currently being voiced, if any
    pub fn speaking_message(&self) -> Option<&MessageId> {
        self.speech.active_message()
    }

    // =========================================================================
    // State access
    // =========================================================================

    /// Ordered, append-only message history
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Newest assistant message, if any
    pub fn latest_assistant_message(&self) -> Option<&Message> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Whether a query is awaiting its reply
    pub fn pending(&self) -> bool {
        self.phase == SessionPhase::AwaitingReply
    }

    /// Current query lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The injected authentication capability
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tear the session down
    ///
    /// Stops any active playback and marks in-flight query/synthesis results
    /// as stale so they can no longer mutate state.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.speech.stop();
    }

    /// Log out: tear the session down and clear the stored credentials
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.shutdown();
        self.auth.logout()
    }

    /// Append a message and signal the surface to show it
    fn append(&mut self, message: Message) {
        self.history.push(message);
        // Every history mutation scrolls the view to the newest message
        self.events.push_back(SessionEvent::ScrollToLatest);
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

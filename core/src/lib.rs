//! Cortex Core - Headless Conversation Logic for the Cortex Chat Client
//!
//! This crate owns the client-side conversation state machine, completely
//! independent of any UI framework. It can drive a TUI, a web surface, or
//! run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     UI Surface                        │
//! │        (ratatui TUI, headless test harness)           │
//! │                                                       │
//! │     user intent (down)      SessionEvent (up)         │
//! └───────────────┬───────────────────▲──────────────────┘
//!                 │                   │
//! ┌───────────────▼───────────────────┴──────────────────┐
//! │                 ConversationSession                   │
//! │  ┌───────────┐ ┌──────────────────┐ ┌─────────────┐  │
//! │  │  History  │ │ SpeechController │ │ AuthContext │  │
//! │  └───────────┘ └────────┬─────────┘ └─────────────┘  │
//! │                         │                             │
//! │                 ┌───────▼────────┐                    │
//! │                 │  AgentBackend  │  (query + TTS)     │
//! │                 └────────────────┘                    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ConversationSession`]: message history, draft input, single-flight
//!   query lifecycle
//! - [`SpeechController`]: exclusive speech playback coordination
//! - [`AgentBackend`]: the remote agent (query answering + synthesis)
//! - [`LayoutResizer`]: pointer-driven two-pane resize state
//! - [`AuthContext`]: explicit credential capability
//!
//! # Module Overview
//!
//! - [`agent`]: agent backend abstraction and the HTTP client
//! - [`auth`]: credential storage, auth context, login client
//! - [`config`]: TOML + environment configuration
//! - [`layout`]: panel resize tracking
//! - [`messages`]: conversation messages and surface events
//! - [`session`]: the conversation session state machine
//! - [`sidebar`]: the named chat list for the left panel
//! - [`speech`]: speech controller and audio output abstraction
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework. It's pure client logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod auth;
pub mod config;
pub mod layout;
pub mod messages;
pub mod session;
pub mod sidebar;
pub mod speech;

// Re-exports for convenience
pub use agent::{
    AgentBackend, AudioClip, HttpAgentClient, SpeechRequest, AGENT_FALLBACK, DEFAULT_LANG_CODE,
    DEFAULT_VOICE,
};
pub use auth::{AuthClient, AuthContext, AuthError, FileTokenStore, StoredAuth, TokenStore};
pub use config::{
    default_config_path, load_config_from_path, ConfigError, CortexConfig, CortexToml,
    DEFAULT_BASE_URL,
};
pub use layout::{
    LayoutResizer, DEFAULT_PANEL_WIDTH, MAX_PANEL_WIDTH, MIN_PANEL_WIDTH,
};
pub use messages::{Message, MessageId, MessageRole, SessionEvent};
pub use session::{ConversationSession, SessionPhase, GREETING};
pub use sidebar::{ChatEntry, ChatId, ChatList};
pub use speech::{
    AudioOutput, NullAudioOutput, PlaybackCallback, PlaybackHandle, PlaybackOutcome,
    SpeechController, VoiceSettings,
};

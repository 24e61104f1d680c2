//! Agent Integration
//!
//! Communication with the Cortex backend: query answering and speech
//! synthesis.

mod http;
mod traits;

pub use http::HttpAgentClient;
pub use traits::{
    AgentBackend, AudioClip, SpeechRequest, AGENT_FALLBACK, DEFAULT_LANG_CODE, DEFAULT_VOICE,
};

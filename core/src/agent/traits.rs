//! Agent Backend Traits
//!
//! Trait definitions for the remote agent that answers queries and
//! synthesizes speech. The abstraction lets the session core run against
//! the real HTTP backend, a local stub, or a test mock without changes.
//!
//! # No-Throw Boundary
//!
//! Remote failures are converted to values *here*, at the boundary:
//! a failed query becomes the single fallback fragment and a failed
//! synthesis becomes `None`. The session layer therefore has no error
//! branches for the common case and the UI can never get stuck in an
//! error state.

use async_trait::async_trait;
use serde::Serialize;

/// Fixed fallback fragment shown when the agent cannot be reached
pub const AGENT_FALLBACK: &str =
    "Sorry, I couldn't connect to the AI agent. Please make sure the backend is running.";

/// Default synthesis voice
pub const DEFAULT_VOICE: &str = "af_heart";

/// Default synthesis language code
pub const DEFAULT_LANG_CODE: &str = "a";

/// Synthesized audio returned by the speech endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
}

impl AudioClip {
    /// Wrap raw encoded audio bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The raw encoded audio bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the clip, returning the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Clip length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the clip holds no audio at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Parameters for a speech synthesis request
///
/// Serializes directly to the `/tts/play` wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpeechRequest {
    /// Text to synthesize
    pub text: String,
    /// Synthesis voice
    pub voice: String,
    /// Language code
    pub lang_code: String,
}

impl SpeechRequest {
    /// Create a request with the default voice and language
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: DEFAULT_VOICE.to_string(),
            lang_code: DEFAULT_LANG_CODE.to_string(),
        }
    }

    /// Set the synthesis voice
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the language code
    pub fn with_lang_code(mut self, lang_code: impl Into<String>) -> Self {
        self.lang_code = lang_code.into();
        self
    }
}

/// Agent backend trait
///
/// Implement this trait to point the session core at a different backend.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Get the backend name (for logging)
    fn name(&self) -> &str;

    /// Send a user query and get the ordered reply fragments
    ///
    /// Never fails: any transport, HTTP, or protocol error degrades to a
    /// single-element list containing [`AGENT_FALLBACK`].
    async fn query(&self, text: &str) -> Vec<String>;

    /// Synthesize speech for a piece of text
    ///
    /// Returns `None` on any failure so callers can treat a missing clip
    /// as a soft no-audio outcome.
    async fn synthesize(&self, request: &SpeechRequest) -> Option<AudioClip>;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_defaults() {
        let request = SpeechRequest::new("hello");
        assert_eq!(request.text, "hello");
        assert_eq!(request.voice, DEFAULT_VOICE);
        assert_eq!(request.lang_code, DEFAULT_LANG_CODE);
    }

    #[test]
    fn test_speech_request_builder() {
        let request = SpeechRequest::new("hola")
            .with_voice("ef_dora")
            .with_lang_code("e");
        assert_eq!(request.voice, "ef_dora");
        assert_eq!(request.lang_code, "e");
    }

    #[test]
    fn test_speech_request_wire_format() {
        let request = SpeechRequest::new("hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["voice"], "af_heart");
        assert_eq!(json["lang_code"], "a");
    }

    #[test]
    fn test_audio_clip_debug_hides_payload() {
        let clip = AudioClip::new(vec![0u8; 4096]);
        let debug = format!("{clip:?}");
        assert!(debug.contains("4096"));
        assert!(debug.len() < 64);
    }
}

//! Speech Controller
//!
//! Owns at most one active speech playback at a time. Speaking a message
//! that is already the active speaker toggles it off; speaking a different
//! message stops the current playback first. Synthesis failures fail soft:
//! the voice simply returns to idle with no user-visible error.
//!
//! # State Machine
//!
//! ```text
//! Idle ──speak──► AwaitingAudio ──clip──► Playing ──settled──► Idle
//!   ▲                  │ no clip              │ speak same id
//!   └──────────────────┴──────────────────────┘
//! ```
//!
//! The only mechanism returning the controller to idle after a playback
//! starts is the two-outcome completion signal (`Ended | Errored`) delivered
//! through the controller's own signal channel, or an explicit stop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentBackend, AudioClip, SpeechRequest};
use crate::messages::MessageId;

/// Two-outcome completion signal for a playback stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The stream played to the end
    Ended,
    /// The stream failed partway through
    Errored,
}

/// Callback invoked exactly once when a playback stream settles
pub type PlaybackCallback = Box<dyn FnOnce(PlaybackOutcome) + Send + 'static>;

/// Handle to one active audio stream
///
/// Stopping releases the stream resources. Dropping a handle without
/// stopping is allowed; implementations should release on drop as well.
pub trait PlaybackHandle: Send {
    /// Stop playback and release the stream
    fn stop(&mut self);
}

/// Audio output device abstraction
///
/// The TUI provides a rodio-backed implementation; tests provide mocks.
pub trait AudioOutput: Send + Sync {
    /// Begin playing a clip
    ///
    /// `on_done` must be invoked exactly once when the stream ends or
    /// errors. If this returns `Err`, no playback started and the callback
    /// is never invoked.
    fn play(
        &self,
        clip: AudioClip,
        on_done: PlaybackCallback,
    ) -> anyhow::Result<Box<dyn PlaybackHandle>>;
}

/// Audio output that refuses every clip
///
/// Safe fallback when no audio device is available: speech requests fail
/// soft and the voice icon reverts to idle, matching a failed synthesis.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudioOutput;

impl AudioOutput for NullAudioOutput {
    fn play(
        &self,
        _clip: AudioClip,
        _on_done: PlaybackCallback,
    ) -> anyhow::Result<Box<dyn PlaybackHandle>> {
        anyhow::bail!("audio output disabled")
    }
}

/// Voice settings applied to every synthesis request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceSettings {
    /// Synthesis voice
    pub voice: String,
    /// Language code
    pub lang_code: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: crate::agent::DEFAULT_VOICE.to_string(),
            lang_code: crate::agent::DEFAULT_LANG_CODE.to_string(),
        }
    }
}

/// Where the voice currently is
enum VoicePhase {
    /// No synthesis or playback active
    Idle,
    /// Synthesis request in flight for this message
    AwaitingAudio { message_id: MessageId },
    /// Audio playing for this message
    Playing {
        message_id: MessageId,
        handle: Box<dyn PlaybackHandle>,
    },
}

impl std::fmt::Debug for VoicePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingAudio { message_id } => {
                write!(f, "AwaitingAudio({message_id})")
            }
            Self::Playing { message_id, .. } => write!(f, "Playing({message_id})"),
        }
    }
}

/// Async resolutions flowing back into the controller
enum SpeechSignal {
    /// Synthesis settled (with or without a clip)
    AudioReady {
        message_id: MessageId,
        clip: Option<AudioClip>,
    },
    /// A playback stream settled
    PlaybackDone {
        message_id: MessageId,
        outcome: PlaybackOutcome,
    },
}

/// Coordinates exclusive speech playback for a session
///
/// All state mutation happens inside [`speak`](Self::speak),
/// [`stop`](Self::stop), and [`poll`](Self::poll); nothing else writes the
/// active speaker.
pub struct SpeechController {
    agent: Arc<dyn AgentBackend>,
    audio: Arc<dyn AudioOutput>,
    settings: VoiceSettings,
    phase: VoicePhase,
    signal_tx: mpsc::UnboundedSender<SpeechSignal>,
    signal_rx: mpsc::UnboundedReceiver<SpeechSignal>,
    cancel: CancellationToken,
}

impl SpeechController {
    /// Create a controller bound to an agent and an audio device
    pub fn new(
        agent: Arc<dyn AgentBackend>,
        audio: Arc<dyn AudioOutput>,
        settings: VoiceSettings,
        cancel: CancellationToken,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            agent,
            audio,
            settings,
            phase: VoicePhase::Idle,
            signal_tx,
            signal_rx,
            cancel,
        }
    }

    /// The message currently being voiced (optimistically set while
    /// synthesis is still in flight), or `None` when idle
    pub fn active_message(&self) -> Option<&MessageId> {
        match &self.phase {
            VoicePhase::Idle => None,
            VoicePhase::AwaitingAudio { message_id } | VoicePhase::Playing { message_id, .. } => {
                Some(message_id)
            }
        }
    }

    /// Request speech for a message, toggling off if it is already active
    pub fn speak(&mut self, message_id: MessageId, text: &str) {
        // Toggle-off: speaking the active message stops it
        if self.active_message() == Some(&message_id) {
            tracing::debug!(%message_id, "Toggling speech off");
            self.stop();
            return;
        }

        // Only one voice at a time
        self.stop();

        self.phase = VoicePhase::AwaitingAudio {
            message_id: message_id.clone(),
        };

        let agent = Arc::clone(&self.agent);
        let request = SpeechRequest::new(text)
            .with_voice(&self.settings.voice)
            .with_lang_code(&self.settings.lang_code);
        let tx = self.signal_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let clip = agent.synthesize(&request).await;
            if cancel.is_cancelled() {
                return;
            }
            let _ = tx.send(SpeechSignal::AudioReady { message_id, clip });
        });
    }

    /// Stop any active playback and return the voice to idle
    pub fn stop(&mut self) {
        if let VoicePhase::Playing { mut handle, .. } =
            std::mem::replace(&mut self.phase, VoicePhase::Idle)
        {
            handle.stop();
        }
    }

    /// Drain settled synthesis and playback signals
    ///
    /// Returns `true` if the active speaker changed. Must be called from the
    /// surface's event loop; completes within one turn.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(signal) = self.signal_rx.try_recv() {
            // Signals queued before teardown cancelled the token must not
            // start a playback; drain them without applying.
            if self.cancel.is_cancelled() {
                continue;
            }
            changed |= self.apply(signal);
        }
        changed
    }

    fn apply(&mut self, signal: SpeechSignal) -> bool {
        match signal {
            SpeechSignal::AudioReady { message_id, clip } => {
                // Stale if the user toggled off or switched speakers while
                // synthesis was in flight
                let expected = matches!(
                    &self.phase,
                    VoicePhase::AwaitingAudio { message_id: id } if *id == message_id
                );
                if !expected {
                    tracing::debug!(%message_id, "Discarding stale synthesis result");
                    return false;
                }

                let Some(clip) = clip else {
                    // Failed synthesis: fail soft, icon reverts to idle
                    self.phase = VoicePhase::Idle;
                    return true;
                };

                let tx = self.signal_tx.clone();
                let done_id = message_id.clone();
                let on_done: PlaybackCallback = Box::new(move |outcome| {
                    let _ = tx.send(SpeechSignal::PlaybackDone {
                        message_id: done_id,
                        outcome,
                    });
                });

                match self.audio.play(clip, on_done) {
                    Ok(handle) => {
                        self.phase = VoicePhase::Playing { message_id, handle };
                        // Active speaker id is unchanged by starting playback
                        false
                    }
                    Err(error) => {
                        tracing::warn!(%error, %message_id, "Audio device refused playback");
                        self.phase = VoicePhase::Idle;
                        true
                    }
                }
            }
            SpeechSignal::PlaybackDone {
                message_id,
                outcome,
            } => {
                let current = matches!(
                    &self.phase,
                    VoicePhase::Playing { message_id: id, .. } if *id == message_id
                );
                if !current {
                    // Superseded playback; its handle was already stopped
                    return false;
                }
                tracing::debug!(%message_id, ?outcome, "Playback settled");
                self.phase = VoicePhase::Idle;
                true
            }
        }
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        // No dangling playback across teardown
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    /// Agent stub with a fixed synthesis result
    struct StubAgent {
        clip: Option<AudioClip>,
        synth_count: AtomicUsize,
    }

    impl StubAgent {
        fn with_clip() -> Self {
            Self {
                clip: Some(AudioClip::new(vec![1, 2, 3])),
                synth_count: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                clip: None,
                synth_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AgentBackend for StubAgent {
        fn name(&self) -> &str {
            "stub"
        }

        async fn query(&self, _text: &str) -> Vec<String> {
            Vec::new()
        }

        async fn synthesize(&self, _request: &SpeechRequest) -> Option<AudioClip> {
            self.synth_count.fetch_add(1, Ordering::SeqCst);
            self.clip.clone()
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    /// Records playback lifecycles and exposes the completion callbacks
    #[derive(Default)]
    struct RecordingAudio {
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
        started: Arc<AtomicUsize>,
        pending_done: Arc<Mutex<Vec<PlaybackCallback>>>,
    }

    struct RecordingHandle {
        active: Arc<AtomicUsize>,
        stopped: bool,
    }

    impl PlaybackHandle for RecordingHandle {
        fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.active.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    impl AudioOutput for RecordingAudio {
        fn play(
            &self,
            _clip: AudioClip,
            on_done: PlaybackCallback,
        ) -> anyhow::Result<Box<dyn PlaybackHandle>> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.started.fetch_add(1, Ordering::SeqCst);
            self.pending_done.lock().unwrap().push(on_done);
            Ok(Box::new(RecordingHandle {
                active: Arc::clone(&self.active),
                stopped: false,
            }))
        }
    }

    fn controller_with(
        agent: StubAgent,
        audio: Arc<RecordingAudio>,
    ) -> SpeechController {
        SpeechController::new(
            Arc::new(agent),
            audio,
            VoiceSettings::default(),
            CancellationToken::new(),
        )
    }

    /// Poll until `predicate` holds or a short timeout elapses
    async fn wait_until(
        controller: &mut SpeechController,
        predicate: impl Fn(&SpeechController) -> bool,
    ) {
        for _ in 0..100 {
            controller.poll();
            if predicate(controller) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within timeout");
    }

    #[tokio::test]
    async fn test_speak_starts_playback() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));
        let id = MessageId::new();

        controller.speak(id.clone(), "hello");
        assert_eq!(controller.active_message(), Some(&id));

        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 1
        })
        .await;
        assert_eq!(controller.active_message(), Some(&id));
    }

    #[tokio::test]
    async fn test_speak_same_id_toggles_off() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));
        let id = MessageId::new();

        controller.speak(id.clone(), "hello");
        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 1
        })
        .await;

        controller.speak(id.clone(), "hello");
        assert_eq!(controller.active_message(), None);
        assert_eq!(audio.active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_speak_new_id_stops_previous_playback() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));
        let first = MessageId::new();
        let second = MessageId::new();

        controller.speak(first, "one");
        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 1
        })
        .await;

        controller.speak(second.clone(), "two");
        assert_eq!(controller.active_message(), Some(&second));
        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 2
        })
        .await;

        // Never two handles live at once
        assert_eq!(audio.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(audio.active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_synthesis_returns_to_idle() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::failing(), Arc::clone(&audio));
        let id = MessageId::new();

        controller.speak(id.clone(), "hello");
        // Optimistically active while awaiting audio
        assert_eq!(controller.active_message(), Some(&id));

        wait_until(&mut controller, |c| c.active_message().is_none()).await;
        // No playback handle was ever created
        assert_eq!(audio.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_playback_end_signal_clears_active() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));
        let id = MessageId::new();

        controller.speak(id, "hello");
        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 1
        })
        .await;

        // Simulate the stream reaching its end
        let on_done = audio.pending_done.lock().unwrap().pop().unwrap();
        on_done(PlaybackOutcome::Ended);

        wait_until(&mut controller, |c| c.active_message().is_none()).await;
    }

    #[tokio::test]
    async fn test_playback_error_signal_clears_active() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));
        let id = MessageId::new();

        controller.speak(id, "hello");
        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 1
        })
        .await;

        let on_done = audio.pending_done.lock().unwrap().pop().unwrap();
        on_done(PlaybackOutcome::Errored);

        wait_until(&mut controller, |c| c.active_message().is_none()).await;
    }

    #[tokio::test]
    async fn test_toggle_off_before_synthesis_resolves_discards_clip() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));
        let id = MessageId::new();

        controller.speak(id.clone(), "hello");
        // Toggle off before the synthesis task resolves
        controller.speak(id, "hello");
        assert_eq!(controller.active_message(), None);

        // Give the spawned synthesis time to land, then drain
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.poll();

        // The late clip must not start a playback
        assert_eq!(audio.started.load(Ordering::SeqCst), 0);
        assert_eq!(controller.active_message(), None);
    }

    #[tokio::test]
    async fn test_clip_queued_before_teardown_never_plays() {
        let audio = Arc::new(RecordingAudio::default());
        let cancel = CancellationToken::new();
        let mut controller = SpeechController::new(
            Arc::new(StubAgent::with_clip()),
            Arc::clone(&audio) as Arc<dyn AudioOutput>,
            VoiceSettings::default(),
            cancel.clone(),
        );

        controller.speak(MessageId::new(), "hello");
        // Let the synthesis signal land in the channel, then tear down with
        // the clip already queued
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        controller.stop();
        controller.poll();

        assert_eq!(audio.started.load(Ordering::SeqCst), 0);
        assert_eq!(controller.active_message(), None);
    }

    #[tokio::test]
    async fn test_null_audio_output_fails_soft() {
        let mut controller = SpeechController::new(
            Arc::new(StubAgent::with_clip()),
            Arc::new(NullAudioOutput),
            VoiceSettings::default(),
            CancellationToken::new(),
        );
        let id = MessageId::new();

        controller.speak(id, "hello");
        wait_until(&mut controller, |c| c.active_message().is_none()).await;
    }

    #[tokio::test]
    async fn test_stop_releases_handle_on_teardown() {
        let audio = Arc::new(RecordingAudio::default());
        let mut controller = controller_with(StubAgent::with_clip(), Arc::clone(&audio));

        controller.speak(MessageId::new(), "hello");
        wait_until(&mut controller, |_| {
            audio.started.load(Ordering::SeqCst) == 1
        })
        .await;

        drop(controller);
        assert_eq!(audio.active.load(Ordering::SeqCst), 0);
    }
}

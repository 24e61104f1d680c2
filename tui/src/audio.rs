//! Audio Playback
//!
//! rodio-backed implementation of [`AudioOutput`]. The output stream is
//! owned by a dedicated thread because the underlying device stream is not
//! `Send` on every platform; playback requests cross over a channel and
//! come back as [`Sink`] handles, which are safely shareable.
//!
//! If no audio device is available the constructor fails and the caller
//! falls back to [`cortex_core::NullAudioOutput`], so a headless machine
//! still gets a working chat client.

use std::io::Cursor;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use parking_lot::Mutex;
use rodio::Sink;

use cortex_core::{AudioClip, AudioOutput, PlaybackCallback, PlaybackHandle, PlaybackOutcome};

/// A playback request crossing into the audio thread
struct PlayRequest {
    clip: AudioClip,
    on_done: PlaybackCallback,
    reply: mpsc::SyncSender<anyhow::Result<Arc<Sink>>>,
}

/// Audio output backed by the default rodio device
pub struct RodioOutput {
    requests: Mutex<mpsc::Sender<PlayRequest>>,
}

impl RodioOutput {
    /// Open the default audio device
    ///
    /// Fails when no device exists (headless hosts, CI). The audio thread
    /// owns the stream for the lifetime of the output.
    pub fn new() -> anyhow::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<PlayRequest>();
        let (init_tx, init_rx) = mpsc::sync_channel::<anyhow::Result<()>>(1);

        thread::Builder::new()
            .name("cortex-audio".to_string())
            .spawn(move || {
                let stream = match rodio::OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => {
                        let _ = init_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e.into()));
                        return;
                    }
                };

                while let Ok(request) = request_rx.recv() {
                    let source = match rodio::Decoder::new(Cursor::new(request.clip.into_bytes()))
                    {
                        Ok(source) => source,
                        Err(e) => {
                            // Decode failure: report through the reply so the
                            // caller sees Err and the callback is never run.
                            let _ = request.reply.send(Err(e.into()));
                            continue;
                        }
                    };

                    let sink = Arc::new(Sink::connect_new(stream.mixer()));
                    sink.append(source);

                    let watcher_sink = Arc::clone(&sink);
                    let on_done = request.on_done;
                    let spawned = thread::Builder::new()
                        .name("cortex-audio-watch".to_string())
                        .spawn(move || {
                            watcher_sink.sleep_until_end();
                            on_done(PlaybackOutcome::Ended);
                        });
                    if let Err(e) = spawned {
                        sink.stop();
                        let _ = request.reply.send(Err(e.into()));
                        continue;
                    }

                    let _ = request.reply.send(Ok(sink));
                }
            })
            .context("Failed to spawn audio thread")?;

        init_rx
            .recv()
            .context("Audio thread exited before reporting readiness")??;

        Ok(Self {
            requests: Mutex::new(request_tx),
        })
    }
}

impl AudioOutput for RodioOutput {
    fn play(
        &self,
        clip: AudioClip,
        on_done: PlaybackCallback,
    ) -> anyhow::Result<Box<dyn PlaybackHandle>> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.requests
            .lock()
            .send(PlayRequest {
                clip,
                on_done,
                reply: reply_tx,
            })
            .map_err(|_| anyhow::anyhow!("Audio thread is gone"))?;

        let sink = reply_rx
            .recv()
            .context("Audio thread dropped the playback request")??;
        Ok(Box::new(SinkHandle { sink }))
    }
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput").finish_non_exhaustive()
    }
}

/// Handle to one playing sink
struct SinkHandle {
    sink: Arc<Sink>,
}

impl PlaybackHandle for SinkHandle {
    fn stop(&mut self) {
        // Unblocks the watcher's sleep_until_end; the controller discards
        // the resulting stale completion signal.
        self.sink.stop();
    }
}

impl Drop for SinkHandle {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

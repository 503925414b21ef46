//! Music playback engine using rodio, with every decoded sample routed through
//! the analyser tap.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::analyser::Tap;
use super::capture::SampleCapture;
use super::source::{LoadId, Playback, PlaybackEvent};
use crate::catalog::TrackSource;
use crate::error::{Error, Result};

/// How often the audio thread checks whether the current track ran out.
const END_POLL: Duration = Duration::from_millis(200);

/// Commands sent to the audio playback thread.
enum PlayerCommand {
    Load(LoadId, TrackSource, Tap),
    Play,
    Pause,
    Stop,
    SetVolume(f32),
}

/// Player whose rodio output stream lives on a dedicated thread.
///
/// Every call returns immediately; failures come back as
/// [`PlaybackEvent`]s through [`Playback::poll_event`].
pub struct MusicPlayer {
    /// Sender to the audio thread for commands
    cmd_tx: Sender<PlayerCommand>,
    event_rx: Receiver<PlaybackEvent>,
}

impl MusicPlayer {
    /// Spawn the audio thread with an idle output.
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let (event_tx, event_rx) = mpsc::channel::<PlaybackEvent>();

        thread::spawn(move || match OutputStream::try_default() {
            Ok((stream, handle)) => {
                run_audio_thread(&handle, cmd_rx, event_tx);
                // Keep stream alive until thread exits
                drop(stream);
            }
            Err(err) => {
                log::error!("audio output unavailable: {err}");
                // Report every load so the controller can reset its state
                while let Ok(cmd) = cmd_rx.recv() {
                    if let PlayerCommand::Load(load, ..) = cmd {
                        let _ = event_tx.send(PlaybackEvent::Failed {
                            load,
                            reason: Error::Output(err.to_string()).to_string(),
                        });
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("audio thread has exited; command dropped");
        }
    }
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback for MusicPlayer {
    fn load(&mut self, load: LoadId, source: TrackSource, tap: Tap) {
        self.send(PlayerCommand::Load(load, source, tap));
    }

    fn play(&mut self) {
        self.send(PlayerCommand::Play);
    }

    fn pause(&mut self) {
        self.send(PlayerCommand::Pause);
    }

    fn stop(&mut self) {
        self.send(PlayerCommand::Stop);
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(PlayerCommand::SetVolume(volume));
    }

    fn poll_event(&mut self) -> Option<PlaybackEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn run_audio_thread(
    handle: &OutputStreamHandle,
    cmd_rx: Receiver<PlayerCommand>,
    event_tx: Sender<PlaybackEvent>,
) {
    // Current sink (if any) and the load it belongs to
    let mut sink: Option<Sink> = None;
    let mut current: LoadId = 0;
    let mut volume = 1.0f32;

    loop {
        let cmd = match cmd_rx.recv_timeout(END_POLL) {
            Ok(cmd) => cmd,
            Err(RecvTimeoutError::Timeout) => {
                let finished = sink.as_ref().is_some_and(|s| !s.is_paused() && s.empty());
                if finished {
                    sink = None;
                    let _ = event_tx.send(PlaybackEvent::Finished { load: current });
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match cmd {
            PlayerCommand::Load(load, source, tap) => {
                // Stop previous sink
                if let Some(s) = sink.take() {
                    s.stop();
                }
                current = load;
                match open_sink(handle, &source, tap) {
                    Ok(new_sink) => {
                        new_sink.set_volume(volume);
                        sink = Some(new_sink);
                    }
                    Err(err) => {
                        log::error!("playback failed: {err}");
                        let _ = event_tx.send(PlaybackEvent::Failed {
                            load,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            PlayerCommand::Play => {
                if let Some(s) = &sink {
                    s.play();
                }
            }
            PlayerCommand::Pause => {
                if let Some(s) = &sink {
                    s.pause();
                }
            }
            PlayerCommand::Stop => {
                if let Some(s) = sink.take() {
                    s.stop();
                }
            }
            PlayerCommand::SetVolume(v) => {
                volume = v;
                if let Some(s) = &sink {
                    s.set_volume(v);
                }
            }
        }
    }
    // If the command channel closed, make sure to stop the sink.
    if let Some(s) = sink.take() {
        s.stop();
    }
}

/// Build a paused sink with `source` queued behind a sample capture.
fn open_sink(handle: &OutputStreamHandle, source: &TrackSource, tap: Tap) -> Result<Sink> {
    let sink = Sink::try_new(handle).map_err(|e| Error::Output(e.to_string()))?;
    sink.pause();
    match source {
        TrackSource::File(path) => {
            let file = File::open(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            let decoder = Decoder::new(BufReader::new(file))
                .map_err(|e| Error::Decode(format!("{}: {e}", path.display())))?;
            sink.append(SampleCapture::new(decoder.convert_samples::<f32>(), tap));
        }
        TrackSource::Remote(url) => {
            let bytes = fetch(url)?;
            let decoder = Decoder::new(Cursor::new(bytes))
                .map_err(|e| Error::Decode(format!("{url}: {e}")))?;
            sink.append(SampleCapture::new(decoder.convert_samples::<f32>(), tap));
        }
    }
    Ok(sink)
}

/// Download a remote track into memory.
fn fetch(url: &str) -> Result<Vec<u8>> {
    log::info!("fetching {url}");
    let fail = |reason: String| Error::Fetch {
        url: url.to_string(),
        reason,
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| fail(e.to_string()))?;
    let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
    log::info!("fetched {} bytes from {url}", bytes.len());
    Ok(bytes.to_vec())
}

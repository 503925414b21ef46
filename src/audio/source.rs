//! The signal source: one controller deciding which producer feeds the
//! analyser, a catalog track or the microphone, never both.

use super::analyser::{Analyser, Tap};
use super::microphone::{MicrophoneRequest, MicrophoneStream};
use crate::catalog::{Track, TrackSource};
use crate::error::Error;

/// Identifies one [`Playback::load`] call. Events echo it back so the
/// controller can tell a late event about an earlier track from a current one.
pub type LoadId = u64;

/// Asynchronous notifications from a playback backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Loading, fetching or decoding failed; nothing is playing.
    Failed { load: LoadId, reason: String },
    /// The loaded track played to the end.
    Finished { load: LoadId },
}

impl PlaybackEvent {
    pub fn load(&self) -> LoadId {
        match self {
            Self::Failed { load, .. } | Self::Finished { load } => *load,
        }
    }
}

/// Something that can play catalog tracks through a tap.
///
/// Calls never block; failures surface later through `poll_event`.
pub trait Playback {
    /// Stop whatever is loaded and bind `source`, paused, writing into `tap`.
    /// Events about this track carry `load`.
    fn load(&mut self, load: LoadId, source: TrackSource, tap: Tap);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn poll_event(&mut self) -> Option<PlaybackEvent>;
}

/// Something that can grant a live input stream writing into a tap.
pub trait Microphone {
    fn request(&mut self, tap: Tap) -> MicrophoneRequest;
}

/// Outcomes the UI may want to surface.
#[derive(Debug)]
pub enum SourceEvent {
    MicrophoneStarted(String),
    MicrophoneFailed(Error),
    PlaybackFailed(String),
    TrackFinished,
}

enum MicState {
    Off,
    Pending { request: MicrophoneRequest, tap: Tap },
    Active { _stream: MicrophoneStream, tap: Tap },
}

/// Owner of the analyser and of both producers.
pub struct SignalSource {
    analyser: Analyser,
    catalog: Vec<Track>,
    playback: Box<dyn Playback>,
    microphone: Box<dyn Microphone>,
    current: Option<Track>,
    /// Tap bound to the loaded track, kept so playback can reclaim the analyser.
    track_tap: Option<Tap>,
    /// Id of the most recent load; events carrying another id are stale.
    load_id: LoadId,
    /// False once the backend dropped the current track (finished or failed).
    loaded: bool,
    playing: bool,
    volume: f32,
    mic: MicState,
}

impl SignalSource {
    pub fn new(
        analyser: Analyser,
        catalog: Vec<Track>,
        playback: Box<dyn Playback>,
        microphone: Box<dyn Microphone>,
        volume: f32,
    ) -> Self {
        let mut source = Self {
            analyser,
            catalog,
            playback,
            microphone,
            current: None,
            track_tap: None,
            load_id: 0,
            loaded: false,
            playing: false,
            volume: 0.0,
            mic: MicState::Off,
        };
        source.set_volume(volume);
        source
    }

    pub fn analyser(&self) -> &Analyser {
        &self.analyser
    }

    pub fn catalog(&self) -> &[Track] {
        &self.catalog
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_microphone_active(&self) -> bool {
        matches!(self.mic, MicState::Active { .. })
    }

    pub fn is_microphone_pending(&self) -> bool {
        matches!(self.mic, MicState::Pending { .. })
    }

    /// True when some producer is live: a playing track or the microphone.
    pub fn is_active(&self) -> bool {
        self.is_microphone_active() || (self.playing && self.current.is_some())
    }

    /// Swap the loaded track, keeping the current play/pause state.
    pub fn select_track(&mut self, track: Track) {
        if !matches!(self.mic, MicState::Off) {
            self.stop_microphone();
        }
        // Old producer goes before the new one is bound
        self.analyser.disconnect();
        self.playback.stop();

        let tap = self.analyser.tap();
        self.analyser.connect(&tap);
        self.load_id += 1;
        self.loaded = true;
        self.playback.load(self.load_id, track.source(), tap.clone());
        self.playback.set_volume(self.volume);
        if self.playing {
            self.playback.play();
        }
        log::info!("selected {} - {}", track.title, track.artist);
        self.track_tap = Some(tap);
        self.current = Some(track);
    }

    /// Select the catalog entry at `index`. Out-of-range indices are ignored.
    pub fn select_index(&mut self, index: usize) {
        if let Some(track) = self.catalog.get(index).cloned() {
            self.select_track(track);
        }
    }

    /// Flip play/pause, picking the first catalog track when nothing is loaded.
    pub fn toggle_playback(&mut self) {
        if self.current.is_none() {
            if self.is_microphone_active() || self.catalog.is_empty() {
                return;
            }
            self.playing = true;
            self.select_index(0);
            return;
        }
        if self.playing {
            self.playing = false;
            self.playback.pause();
        } else if !self.loaded {
            // The backend let go of the track; replay it from the start
            if let Some(track) = self.current.clone() {
                self.playing = true;
                self.select_track(track);
            }
        } else {
            if !matches!(self.mic, MicState::Off) {
                self.stop_microphone();
            }
            if let Some(tap) = &self.track_tap {
                self.analyser.connect(tap);
            }
            self.playing = true;
            self.playback.play();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.playback.set_volume(self.volume);
    }

    /// Ask for the microphone. The grant arrives through [`SignalSource::poll`].
    pub fn start_microphone(&mut self) {
        if !matches!(self.mic, MicState::Off) {
            return;
        }
        let tap = self.analyser.tap();
        let request = self.microphone.request(tap.clone());
        self.mic = MicState::Pending { request, tap };
    }

    /// Release the microphone. Playback stays paused.
    pub fn stop_microphone(&mut self) {
        match std::mem::replace(&mut self.mic, MicState::Off) {
            MicState::Active { tap, .. } => {
                if tap.is_connected() {
                    self.analyser.disconnect();
                }
                log::info!("microphone released");
            }
            MicState::Pending { .. } => log::info!("microphone request abandoned"),
            MicState::Off => {}
        }
    }

    /// Drain backend notifications. Call once per tick.
    pub fn poll(&mut self) -> Vec<SourceEvent> {
        let mut events = Vec::new();

        while let Some(event) = self.playback.poll_event() {
            if event.load() != self.load_id {
                log::debug!("ignoring stale playback event {event:?}");
                continue;
            }
            self.playing = false;
            self.loaded = false;
            match event {
                PlaybackEvent::Failed { reason, .. } => {
                    log::error!("playback failed: {reason}");
                    events.push(SourceEvent::PlaybackFailed(reason));
                }
                PlaybackEvent::Finished { .. } => {
                    log::info!("track finished");
                    events.push(SourceEvent::TrackFinished);
                }
            }
        }

        let outcome = match &self.mic {
            MicState::Pending { request, .. } => request.poll(),
            _ => None,
        };
        match outcome {
            Some(Ok(stream)) => {
                let MicState::Pending { tap, .. } = std::mem::replace(&mut self.mic, MicState::Off)
                else {
                    return events;
                };
                if self.playing {
                    self.playback.pause();
                    self.playing = false;
                }
                self.analyser.connect(&tap);
                events.push(SourceEvent::MicrophoneStarted(stream.device_name().to_string()));
                self.mic = MicState::Active {
                    _stream: stream,
                    tap,
                };
            }
            Some(Err(err)) => {
                // Nothing else changed while the request was pending
                log::warn!("microphone request failed: {err}");
                self.mic = MicState::Off;
                events.push(SourceEvent::MicrophoneFailed(err));
            }
            None => {}
        }
        events
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::sync::mpsc::{self, Sender};

    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::error::Result;

    /// Calls recorded by [`FakePlayback`].
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Load(TrackSource),
        Play,
        Pause,
        Stop,
        Volume(f32),
    }

    #[derive(Default)]
    pub struct FakeBackendState {
        pub calls: Vec<Call>,
        pub taps: Vec<Tap>,
        pub loads: Vec<LoadId>,
        pub events: VecDeque<PlaybackEvent>,
        pub mic_senders: Vec<Sender<Result<MicrophoneStream>>>,
    }

    pub type Shared = Rc<RefCell<FakeBackendState>>;

    pub struct FakePlayback(pub Shared);

    impl Playback for FakePlayback {
        fn load(&mut self, load: LoadId, source: TrackSource, tap: Tap) {
            let mut s = self.0.borrow_mut();
            s.calls.push(Call::Load(source));
            s.loads.push(load);
            s.taps.push(tap);
        }
        fn play(&mut self) {
            self.0.borrow_mut().calls.push(Call::Play);
        }
        fn pause(&mut self) {
            self.0.borrow_mut().calls.push(Call::Pause);
        }
        fn stop(&mut self) {
            self.0.borrow_mut().calls.push(Call::Stop);
        }
        fn set_volume(&mut self, volume: f32) {
            self.0.borrow_mut().calls.push(Call::Volume(volume));
        }
        fn poll_event(&mut self) -> Option<PlaybackEvent> {
            self.0.borrow_mut().events.pop_front()
        }
    }

    pub struct FakeMicrophone(pub Shared);

    impl Microphone for FakeMicrophone {
        fn request(&mut self, tap: Tap) -> MicrophoneRequest {
            let (tx, rx) = mpsc::channel();
            let mut s = self.0.borrow_mut();
            s.taps.push(tap);
            s.mic_senders.push(tx);
            MicrophoneRequest::new(rx)
        }
    }

    pub fn fake_source() -> (SignalSource, Shared) {
        let shared: Shared = Rc::default();
        let source = SignalSource::new(
            Analyser::new(256, 4096),
            builtin_catalog(),
            Box::new(FakePlayback(shared.clone())),
            Box::new(FakeMicrophone(shared.clone())),
            0.8,
        );
        (source, shared)
    }

    fn grant_microphone(shared: &Shared) {
        let tx = shared.borrow().mic_senders.last().cloned().unwrap();
        tx.send(Ok(MicrophoneStream::new("fake mic", None))).unwrap();
    }

    fn last_tap(shared: &Shared) -> Tap {
        shared.borrow().taps.last().cloned().unwrap()
    }

    pub fn last_load(shared: &Shared) -> LoadId {
        shared.borrow().loads.last().copied().unwrap()
    }

    pub fn push_event(shared: &Shared, event: PlaybackEvent) {
        shared.borrow_mut().events.push_back(event);
    }

    #[test]
    fn test_toggle_autoselects_first_track() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        assert!(source.is_playing());
        assert_eq!(source.current_track().unwrap().id, "track1");
        let calls = &shared.borrow().calls;
        assert!(matches!(calls[calls.len() - 3], Call::Load(_)));
        assert_eq!(calls.last(), Some(&Call::Play));
    }

    #[test]
    fn test_toggle_flips_play_state() {
        let (mut source, shared) = fake_source();
        source.select_index(1);
        assert!(!source.is_playing());
        source.toggle_playback();
        assert!(source.is_playing());
        source.toggle_playback();
        assert!(!source.is_playing());
        assert_eq!(shared.borrow().calls.last(), Some(&Call::Pause));
    }

    #[test]
    fn test_select_preserves_play_state() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        source.select_index(2);
        assert!(source.is_playing());
        assert_eq!(shared.borrow().calls.last(), Some(&Call::Play));

        source.toggle_playback();
        source.select_index(3);
        assert!(!source.is_playing());
        assert!(matches!(shared.borrow().calls.last(), Some(Call::Volume(_))));
    }

    #[test]
    fn test_switching_tracks_keeps_one_producer() {
        let (mut source, shared) = fake_source();
        source.select_index(0);
        let first = last_tap(&shared);
        source.select_index(1);
        let second = last_tap(&shared);

        assert_eq!(source.analyser().producer_count(), 1);
        assert!(!first.is_connected());
        assert!(second.is_connected());

        // Stop must reach the backend before the next load
        let calls = shared.borrow().calls.clone();
        let stops: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Call::Stop)
            .map(|(i, _)| i)
            .collect();
        let loads: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Call::Load(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(loads.len(), 2);
        assert!(stops[1] < loads[1]);
    }

    #[test]
    fn test_microphone_pauses_track_and_stop_does_not_resume() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        let track_tap = last_tap(&shared);
        assert!(source.is_playing());

        source.start_microphone();
        assert!(source.is_microphone_pending());
        grant_microphone(&shared);
        let events = source.poll();
        assert!(matches!(events.as_slice(), [SourceEvent::MicrophoneStarted(name)] if name == "fake mic"));
        assert!(source.is_microphone_active());
        assert!(!source.is_playing());
        assert_eq!(shared.borrow().calls.last(), Some(&Call::Pause));
        assert!(!track_tap.is_connected());
        assert!(last_tap(&shared).is_connected());
        assert_eq!(source.analyser().producer_count(), 1);

        source.stop_microphone();
        assert!(!source.is_microphone_active());
        assert!(!source.is_playing());
        assert_eq!(source.analyser().producer_count(), 0);
        assert!(!source.is_active());
    }

    #[test]
    fn test_microphone_failure_keeps_prior_state() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        let track_tap = last_tap(&shared);
        let calls_before = shared.borrow().calls.len();

        source.start_microphone();
        let tx = shared.borrow().mic_senders[0].clone();
        tx.send(Err(Error::Microphone("permission denied".into()))).unwrap();
        let events = source.poll();

        assert!(matches!(events.as_slice(), [SourceEvent::MicrophoneFailed(_)]));
        assert!(source.is_playing());
        assert!(track_tap.is_connected());
        assert!(!source.is_microphone_active());
        assert!(!source.is_microphone_pending());
        assert_eq!(shared.borrow().calls.len(), calls_before);

        // A new attempt is allowed after a failure
        source.start_microphone();
        assert!(source.is_microphone_pending());
    }

    #[test]
    fn test_resume_while_microphone_active_reclaims_analyser() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        let track_tap = last_tap(&shared);
        source.start_microphone();
        grant_microphone(&shared);
        source.poll();

        source.toggle_playback();
        assert!(source.is_playing());
        assert!(!source.is_microphone_active());
        assert!(track_tap.is_connected());
        assert_eq!(source.analyser().producer_count(), 1);
    }

    #[test]
    fn test_toggle_without_track_while_mic_active_is_noop() {
        let (mut source, shared) = fake_source();
        source.start_microphone();
        grant_microphone(&shared);
        source.poll();
        source.toggle_playback();
        assert!(source.current_track().is_none());
        assert!(source.is_microphone_active());
    }

    #[test]
    fn test_playback_failure_resets_flag() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        let load = last_load(&shared);
        push_event(
            &shared,
            PlaybackEvent::Failed {
                load,
                reason: "decode error".into(),
            },
        );
        let events = source.poll();
        assert!(matches!(events.as_slice(), [SourceEvent::PlaybackFailed(_)]));
        assert!(!source.is_playing());
        assert!(source.current_track().is_some());
    }

    #[test]
    fn test_events_for_previous_track_are_ignored() {
        let (mut source, shared) = fake_source();
        source.toggle_playback();
        let first = last_load(&shared);
        source.select_index(1);
        assert_ne!(last_load(&shared), first);

        push_event(
            &shared,
            PlaybackEvent::Failed {
                load: first,
                reason: "track1: 404".into(),
            },
        );
        push_event(&shared, PlaybackEvent::Finished { load: first });
        let events = source.poll();

        assert!(events.is_empty());
        assert!(source.is_playing());
        assert!(source.is_active());
        assert_eq!(source.current_track().unwrap().id, "track2");
    }

    #[test]
    fn test_resume_after_finish_reloads_track() {
        let (mut source, shared) = fake_source();
        source.select_index(2);
        source.toggle_playback();
        let load = last_load(&shared);
        push_event(&shared, PlaybackEvent::Finished { load });
        let events = source.poll();
        assert!(matches!(events.as_slice(), [SourceEvent::TrackFinished]));
        assert!(!source.is_playing());

        let before = shared.borrow().calls.len();
        source.toggle_playback();
        assert!(source.is_playing());
        assert_eq!(source.current_track().unwrap().id, "track3");
        assert!(last_load(&shared) > load);

        let calls = shared.borrow().calls[before..].to_vec();
        let load_at = calls.iter().position(|c| matches!(c, Call::Load(_))).unwrap();
        let play_at = calls.iter().position(|c| *c == Call::Play).unwrap();
        assert!(load_at < play_at);
        assert!(last_tap(&shared).is_connected());
        assert_eq!(source.analyser().producer_count(), 1);

        // A plain pause/resume of a loaded track does not reload
        source.toggle_playback();
        source.toggle_playback();
        assert_eq!(shared.borrow().calls.last(), Some(&Call::Play));
        assert_eq!(shared.borrow().loads.len(), 2);
    }

    #[test]
    fn test_volume_is_clamped() {
        let (mut source, shared) = fake_source();
        source.set_volume(1.7);
        assert_eq!(source.volume(), 1.0);
        source.set_volume(-0.2);
        assert_eq!(source.volume(), 0.0);
        assert_eq!(shared.borrow().calls.last(), Some(&Call::Volume(0.0)));
    }
}

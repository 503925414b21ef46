// src/app/state.rs
//! Application state management.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::event::KeyEvent;
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{layout::Rect, widgets::ListState, Frame};

use crate::{
    audio::{FeatureExtractor, FeatureSnapshot, SignalSource, SourceEvent},
    config::{Config, DisplayConfig},
    insight::{InsightGenerator, MOOD_INTERVAL},
    scene::{Renderer, SceneKind, Surface, Theme},
    scheduler::Scheduler,
    ui::{
        keybindings::{key_to_action, Action},
        layout::compute_layout,
        trail::TrailCanvas,
        widgets::{
            render_insights, render_player_panel, render_track_list, render_visual_controls,
            render_visualizer, visualizer_block, MicIndicator, PlayerView,
        },
    },
};

/// How long the "analyzing" banner stays up after a track change.
pub const ANALYZING_FOR: Duration = Duration::from_secs(2);

const VOLUME_STEP: f32 = 0.05;

/// The callback chains driven by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    /// Per-frame feature extraction, shared by every consumer.
    Features,
    /// Per-frame scene drawing.
    Scene,
    /// Mood smoothing interval.
    Mood,
    /// Elapsed-time counter for the progress bar.
    Clock,
}

/// Main application state.
pub struct App {
    /// Playback, microphone and the analyser they feed
    source: SignalSource,
    extractor: FeatureExtractor,
    /// Latest snapshot, replaced wholesale by the features chain
    snapshot: Arc<FeatureSnapshot>,
    scheduler: Scheduler<Chain>,
    renderer: Renderer,
    trail: TrailCanvas,
    insight: InsightGenerator,
    display: DisplayConfig,
    theme: Theme,

    /// Track list widget state
    list_state: ListState,
    /// Highlighted catalog index
    selected: usize,
    /// Elapsed playback time in seconds
    elapsed: u64,
    analyzing_until: Option<Instant>,
    controls_expanded: bool,
    mic_device: Option<String>,
    /// Last error worth showing
    status: Option<String>,
}

impl App {
    /// Create a new application instance and start its chains.
    pub fn new(source: SignalSource, config: &Config, now: Instant) -> Self {
        let display = config.display.clone();
        let mut scheduler = Scheduler::new(display.fps);
        scheduler.request_frame(Chain::Features, now);
        scheduler.set_interval(Chain::Mood, MOOD_INTERVAL, now);
        scheduler.set_interval(Chain::Clock, Duration::from_secs(1), now);

        let extractor = FeatureExtractor::new(&config.audio);
        let snapshot = extractor.latest();
        let renderer = Renderer::new(display.mode.build(), display.fade_alpha, display.seed);
        let insight_rng = match display.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };

        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            source,
            extractor,
            snapshot,
            scheduler,
            renderer,
            trail: TrailCanvas::new(display.cell_width, display.cell_height, display.trail_cutoff),
            insight: InsightGenerator::new(insight_rng),
            theme: display.theme,
            display,
            list_state,
            selected: 0,
            elapsed: 0,
            analyzing_until: None,
            controls_expanded: true,
            mic_device: None,
            status: None,
        }
    }

    pub fn source(&self) -> &SignalSource {
        &self.source
    }

    pub fn snapshot(&self) -> &FeatureSnapshot {
        &self.snapshot
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn insight(&self) -> &InsightGenerator {
        &self.insight
    }

    pub fn mode(&self) -> SceneKind {
        self.renderer.kind()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_analyzing(&self, now: Instant) -> bool {
        self.analyzing_until.is_some_and(|until| now < until)
    }

    /// When the run loop must wake up next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Lay out for the terminal `area` and measure the scene surface.
    pub fn resize(&mut self, area: Rect, now: Instant) {
        let layout = compute_layout(area, self.controls_expanded);
        let inner = visualizer_block(self.mode()).inner(layout.visualizer);
        self.trail.resize(inner);
        self.renderer
            .measure(self.trail.size(), &mut self.scheduler, Chain::Scene, now);
    }

    /// Drain source notifications and run every chain that is due.
    pub fn update(&mut self, now: Instant) {
        for event in self.source.poll() {
            self.on_source_event(event);
        }

        for (handle, chain) in self.scheduler.take_due(now) {
            match chain {
                Chain::Features => {
                    self.snapshot = self
                        .extractor
                        .extract(self.source.analyser(), self.source.is_active());
                    self.scheduler.request_frame(Chain::Features, now);
                }
                Chain::Scene => {
                    self.renderer.tick(
                        handle,
                        &mut self.trail,
                        &self.snapshot,
                        self.theme.palette(),
                        &mut self.scheduler,
                        Chain::Scene,
                        now,
                    );
                }
                Chain::Mood => {
                    self.insight.update(&self.snapshot);
                }
                Chain::Clock => {
                    if self.source.is_playing() && !self.source.is_microphone_active() {
                        let duration = self.source.current_track().map_or(0, |t| t.duration);
                        self.elapsed = (self.elapsed + 1).min(duration);
                    }
                }
            }
        }
    }

    fn on_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::MicrophoneStarted(device) => {
                self.mic_device = Some(device);
                self.status = None;
            }
            SourceEvent::MicrophoneFailed(err) => {
                self.status = Some(format!("Microphone unavailable: {err}"));
            }
            SourceEvent::PlaybackFailed(reason) => {
                self.status = Some(format!("Playback failed: {reason}"));
            }
            SourceEvent::TrackFinished => self.elapsed = 0,
        }
    }

    /// Handle a key event and return true if the app should quit.
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        match key_to_action(&key) {
            Action::Down => {
                if self.selected + 1 < self.source.catalog().len() {
                    self.selected += 1;
                }
            }
            Action::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            Action::Enter => {
                if self.selected < self.source.catalog().len() {
                    self.source.select_index(self.selected);
                    if !self.source.is_playing() {
                        self.source.toggle_playback();
                    }
                    self.track_changed(now);
                }
            }
            Action::TogglePlayback => {
                let before = self.current_id();
                self.source.toggle_playback();
                if self.current_id() != before {
                    self.track_changed(now);
                }
            }
            Action::ToggleMicrophone => {
                if self.source.is_microphone_active() || self.source.is_microphone_pending() {
                    self.source.stop_microphone();
                    self.mic_device = None;
                } else {
                    self.status = None;
                    self.source.start_microphone();
                }
            }
            Action::VolumeUp => self.source.set_volume(self.source.volume() + VOLUME_STEP),
            Action::VolumeDown => self.source.set_volume(self.source.volume() - VOLUME_STEP),
            Action::SetMode(kind) => self.switch_mode(kind, now),
            Action::NextMode => self.switch_mode(self.mode().next(), now),
            Action::NextTheme => self.theme = self.theme.next(),
            Action::ToggleControls => self.controls_expanded = !self.controls_expanded,
            Action::Quit => {
                self.renderer.suspend(&mut self.scheduler);
                return true; // Signal to quit
            }
            Action::None => {}
        }

        self.list_state.select(Some(self.selected));
        false
    }

    fn current_id(&self) -> Option<String> {
        self.source.current_track().map(|t| t.id.clone())
    }

    fn track_changed(&mut self, now: Instant) {
        self.elapsed = 0;
        self.status = None;
        self.mic_device = None;
        self.analyzing_until = Some(now + ANALYZING_FOR);
        if let Some(id) = self.current_id() {
            if let Some(index) = self.source.catalog().iter().position(|t| t.id == id) {
                self.selected = index;
            }
        }
    }

    /// Tear down the running scene and start `kind` on the same surface.
    fn switch_mode(&mut self, kind: SceneKind, now: Instant) {
        if kind == self.mode() {
            return;
        }
        log::info!("visual mode: {}", kind.name());
        self.renderer.suspend(&mut self.scheduler);
        self.trail.clear();
        self.renderer = Renderer::new(kind.build(), self.display.fade_alpha, self.display.seed);
        self.renderer
            .measure(self.trail.size(), &mut self.scheduler, Chain::Scene, now);
    }

    /// Draw the application UI.
    pub fn draw(&mut self, f: &mut Frame<'_>, now: Instant) {
        let layout = compute_layout(f.area(), self.controls_expanded);

        render_visualizer(
            f,
            layout.visualizer,
            &self.trail,
            self.mode(),
            self.snapshot.estimated_tempo,
            self.is_analyzing(now),
        );

        if let Some(area) = layout.tracks {
            render_track_list(
                f,
                area,
                self.source.catalog(),
                self.source.current_track(),
                self.source.is_playing(),
                &mut self.list_state,
            );
        }

        let mic = if self.source.is_microphone_active() {
            MicIndicator::Live(self.mic_device.as_deref().unwrap_or("microphone"))
        } else if self.source.is_microphone_pending() {
            MicIndicator::Pending
        } else {
            MicIndicator::Off
        };
        let view = PlayerView {
            track: self.source.current_track(),
            playing: self.source.is_playing(),
            mic,
            volume: self.source.volume(),
            elapsed: self.elapsed,
            status: self.status.as_deref(),
        };
        render_player_panel(f, layout.player, &view);

        if let Some(area) = layout.visual_controls {
            render_visual_controls(f, area, self.mode(), self.theme);
        }
        if let Some(area) = layout.insights {
            let phrase = self.insight.phrase();
            render_insights(
                f,
                area,
                &self.insight.mood(),
                phrase,
                self.theme.palette(),
                self.snapshot.is_active(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::tests::{fake_source, last_load, push_event, Call, Shared};
    use crate::audio::PlaybackEvent;
    use crate::error::Error;
    use crate::insight::MoodVector;
    use crate::scene::RendererState;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 40,
    };

    fn app() -> (App, Shared, Instant) {
        let (source, shared) = fake_source();
        let mut config = Config::default();
        config.display.seed = Some(5);
        let t0 = Instant::now();
        let mut app = App::new(source, &config, t0);
        app.resize(SCREEN, t0);
        (app, shared, t0)
    }

    fn key(app: &mut App, code: KeyCode, now: Instant) -> bool {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE), now)
    }

    #[test]
    fn test_startup_schedules_all_chains() {
        let (app, _, _) = app();
        assert_eq!(app.renderer().state(), RendererState::Active);
        // features, mood, clock and the scene frame
        assert_eq!(app.scheduler.pending(), 4);
        assert!(!app.snapshot().is_active());
    }

    #[test]
    fn test_silent_ticks_draw_and_keep_mood() {
        let (mut app, _, t0) = app();
        let step = app.scheduler.frame_interval();
        let mut now = t0;
        for _ in 0..100 {
            now += step;
            app.resize(SCREEN, now);
            app.update(now);
        }
        assert!(!app.snapshot().is_active());
        assert_eq!(app.snapshot().volume, 0.0);
        assert_eq!(app.insight().mood(), MoodVector::default());
        assert!(!app.trail.is_empty());
        assert_eq!(app.scheduler.pending(), 4);
    }

    #[test]
    fn test_enter_plays_highlighted_track() {
        let (mut app, shared, t0) = app();
        key(&mut app, KeyCode::Down, t0);
        key(&mut app, KeyCode::Enter, t0);
        assert_eq!(app.source().current_track().map(|t| t.id.as_str()), Some("track2"));
        assert!(app.source().is_playing());
        assert_eq!(shared.borrow().calls.last(), Some(&Call::Play));
        assert!(app.is_analyzing(t0 + Duration::from_secs(1)));
        assert!(!app.is_analyzing(t0 + ANALYZING_FOR));
    }

    #[test]
    fn test_active_source_moves_mood() {
        let (mut app, _, t0) = app();
        key(&mut app, KeyCode::Char(' '), t0);
        assert!(app.source().is_playing());
        app.update(t0 + Duration::from_secs(1));
        assert!(app.snapshot().is_active());
        assert_ne!(app.insight().mood(), MoodVector::default());
    }

    #[test]
    fn test_mode_switch_keeps_a_single_scene_chain() {
        let (mut app, _, t0) = app();
        key(&mut app, KeyCode::Char('3'), t0);
        assert_eq!(app.mode(), SceneKind::Dream3d);
        assert_eq!(app.renderer().state(), RendererState::Active);
        assert_eq!(app.scheduler.pending(), 4);
        key(&mut app, KeyCode::Char('v'), t0);
        assert_eq!(app.mode(), SceneKind::Particles);
        assert_eq!(app.scheduler.pending(), 4);
    }

    #[test]
    fn test_microphone_failure_reports_and_keeps_playing() {
        let (mut app, shared, t0) = app();
        key(&mut app, KeyCode::Char(' '), t0);
        key(&mut app, KeyCode::Char('m'), t0);
        let tx = shared.borrow().mic_senders.last().cloned().unwrap();
        tx.send(Err(Error::NoInputDevice)).unwrap();
        app.update(t0);
        assert!(app.source().is_playing());
        assert!(!app.source().is_microphone_active());
        assert!(app.status().unwrap().contains("Microphone"));
    }

    #[test]
    fn test_playback_failure_is_shown() {
        let (mut app, shared, t0) = app();
        key(&mut app, KeyCode::Char(' '), t0);
        let load = last_load(&shared);
        push_event(
            &shared,
            PlaybackEvent::Failed {
                load,
                reason: "bad header".into(),
            },
        );
        app.update(t0);
        assert!(!app.source().is_playing());
        assert_eq!(app.status(), Some("Playback failed: bad header"));
    }

    #[test]
    fn test_finished_track_rewinds_clock() {
        let (mut app, shared, t0) = app();
        key(&mut app, KeyCode::Char(' '), t0);
        app.update(t0 + Duration::from_secs(1));
        app.update(t0 + Duration::from_secs(2));
        assert_eq!(app.elapsed, 2);

        let load = last_load(&shared);
        push_event(&shared, PlaybackEvent::Finished { load });
        app.update(t0 + Duration::from_millis(2100));
        assert_eq!(app.elapsed, 0);
        assert!(!app.source().is_playing());

        // Play again starts the same track over
        key(&mut app, KeyCode::Char(' '), t0 + Duration::from_millis(2200));
        assert!(app.source().is_playing());
        assert_eq!(app.source().current_track().unwrap().id, "track1");
        assert!(last_load(&shared) > load);
    }

    #[test]
    fn test_volume_and_theme_keys() {
        let (mut app, _, t0) = app();
        key(&mut app, KeyCode::Char('+'), t0);
        assert!((app.source().volume() - 0.85).abs() < 1e-6);
        for _ in 0..10 {
            key(&mut app, KeyCode::Char('-'), t0);
        }
        assert!((app.source().volume() - 0.35).abs() < 1e-5);
        key(&mut app, KeyCode::Char('t'), t0);
        assert_eq!(app.theme(), Theme::Neon);
    }

    #[test]
    fn test_collapsing_controls_resizes_surface() {
        let (mut app, _, t0) = app();
        let before = app.renderer().size();
        key(&mut app, KeyCode::Char('c'), t0);
        app.resize(SCREEN, t0);
        assert_ne!(app.renderer().size(), before);
        assert_eq!(app.scheduler.pending(), 4);
    }

    #[test]
    fn test_quit_suspends_renderer() {
        let (mut app, _, t0) = app();
        assert!(key(&mut app, KeyCode::Char('q'), t0));
        assert_eq!(app.renderer().state(), RendererState::Suspended);
    }

    #[test]
    fn test_draw_renders_every_panel() {
        let (mut app, _, t0) = app();
        key(&mut app, KeyCode::Enter, t0);
        let mut terminal = Terminal::new(TestBackend::new(SCREEN.width, SCREEN.height)).unwrap();
        terminal.draw(|f| app.draw(f, t0)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Tracks"));
        assert!(text.contains("AI Insights"));
        assert!(text.contains("Analyzing"));
    }

    fn screen_text(app: &mut App, now: Instant) -> String {
        let mut terminal = Terminal::new(TestBackend::new(SCREEN.width, SCREEN.height)).unwrap();
        terminal.draw(|f| app.draw(f, now)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_insights_title_shows_whether_mood_is_live() {
        let (mut app, _, t0) = app();
        assert!(screen_text(&mut app, t0).contains("Static"));

        key(&mut app, KeyCode::Enter, t0);
        let now = t0 + app.scheduler.frame_interval();
        app.update(now);
        assert!(app.snapshot().is_active());
        let text = screen_text(&mut app, now);
        assert!(text.contains("Real-time"));
        assert!(!text.contains("Static"));
    }
}

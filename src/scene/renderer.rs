//! Scene lifecycle: measurement, per-frame ticking and teardown.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::palette::Palette;
use super::surface::{Surface, SurfaceSize};
use super::{Scene, SceneKind};
use crate::audio::FeatureSnapshot;
use crate::scheduler::{Scheduler, TickHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// No surface of known size yet.
    Uninitialized,
    Active,
    /// Torn down; ignores every further call.
    Suspended,
}

/// Drives one scene from its own frame chain.
pub struct Renderer {
    scene: Box<dyn Scene>,
    state: RendererState,
    size: Option<SurfaceSize>,
    handle: Option<TickHandle>,
    fade_alpha: f64,
    rng: StdRng,
}

impl Renderer {
    pub fn new(scene: Box<dyn Scene>, fade_alpha: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            scene,
            state: RendererState::Uninitialized,
            size: None,
            handle: None,
            fade_alpha,
            rng,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn kind(&self) -> SceneKind {
        self.scene.kind()
    }

    pub fn handle(&self) -> Option<TickHandle> {
        self.handle
    }

    pub fn size(&self) -> Option<SurfaceSize> {
        self.size
    }

    pub fn entity_count(&self) -> usize {
        self.scene.entity_count()
    }

    /// Report the surface size. Activates on the first usable size and
    /// rebuilds the pool whenever the size changes.
    pub fn measure<K: Copy>(
        &mut self,
        size: Option<SurfaceSize>,
        scheduler: &mut Scheduler<K>,
        key: K,
        now: Instant,
    ) {
        if self.state == RendererState::Suspended {
            return;
        }
        let Some(size) = size.filter(|s| !s.is_empty()) else {
            if self.state == RendererState::Active {
                log::debug!("{}: surface gone, waiting for a new one", self.kind().name());
                self.cancel(scheduler);
                self.state = RendererState::Uninitialized;
                self.size = None;
            }
            return;
        };
        if self.state == RendererState::Active && self.size == Some(size) {
            return;
        }

        log::debug!(
            "{}: surface {}x{}",
            self.kind().name(),
            size.width,
            size.height
        );
        self.scene.reset(size, &mut self.rng);
        self.size = Some(size);
        self.state = RendererState::Active;
        self.cancel(scheduler);
        self.handle = Some(scheduler.request_frame(key, now));
    }

    /// Run one frame if `handle` is this renderer's pending tick.
    ///
    /// Returns whether a frame was drawn. The next frame is requested only
    /// after drawing finished.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<K: Copy>(
        &mut self,
        handle: TickHandle,
        surface: &mut dyn Surface,
        snapshot: &FeatureSnapshot,
        palette: &Palette,
        scheduler: &mut Scheduler<K>,
        key: K,
        now: Instant,
    ) -> bool {
        if self.state != RendererState::Active || self.handle != Some(handle) {
            return false;
        }
        self.handle = None;

        let current = surface.size().filter(|s| !s.is_empty());
        if current.is_none() {
            self.state = RendererState::Uninitialized;
            self.size = None;
            return false;
        }
        if current != self.size {
            if let Some(size) = current {
                self.scene.reset(size, &mut self.rng);
            }
            self.size = current;
        }

        surface.fade(self.fade_alpha);
        self.scene.draw(surface, snapshot, palette);
        self.handle = Some(scheduler.request_frame(key, now));
        true
    }

    /// Tear down: cancel the pending tick and stop responding.
    pub fn suspend<K: Copy>(&mut self, scheduler: &mut Scheduler<K>) {
        self.cancel(scheduler);
        self.state = RendererState::Suspended;
    }

    fn cancel<K: Copy>(&mut self, scheduler: &mut Scheduler<K>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::particles::ParticleField;
    use crate::scene::surface::tests::{Op, RecordingSurface};
    use crate::scene::Theme;

    const KEY: u8 = 1;

    fn renderer() -> Renderer {
        Renderer::new(Box::new(ParticleField::new()), 0.1, Some(42))
    }

    fn loud() -> FeatureSnapshot {
        FeatureSnapshot::from_bins(vec![128; 128], vec![200; 128])
    }

    #[test]
    fn test_first_measurement_activates_and_schedules() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new(30);
        let mut r = renderer();
        assert_eq!(r.state(), RendererState::Uninitialized);

        r.measure(None, &mut scheduler, KEY, t0);
        assert_eq!(r.state(), RendererState::Uninitialized);
        assert_eq!(scheduler.pending(), 0);

        r.measure(Some(SurfaceSize::new(600.0, 400.0)), &mut scheduler, KEY, t0);
        assert_eq!(r.state(), RendererState::Active);
        assert_eq!(r.entity_count(), 40);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_tick_fades_draws_and_reschedules_once() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new(30);
        let mut r = renderer();
        let mut surface = RecordingSurface::new(600.0, 400.0);
        r.measure(surface.size, &mut scheduler, KEY, t0);

        let t1 = t0 + scheduler.frame_interval();
        let due = scheduler.take_due(t1);
        assert_eq!(due.len(), 1);
        let (handle, key) = due[0];
        let palette = Theme::Cyberpunk.palette();
        assert!(r.tick(handle, &mut surface, &loud(), palette, &mut scheduler, key, t1));
        assert_eq!(surface.ops[0], Op::Fade(0.1));
        assert_eq!(surface.fills().len(), 40);
        assert_eq!(scheduler.pending(), 1);

        // a stale handle does nothing
        assert!(!r.tick(handle, &mut surface, &loud(), palette, &mut scheduler, key, t1));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_resize_rebuilds_pool_inside_new_bounds() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new(30);
        let mut r = renderer();
        r.measure(Some(SurfaceSize::new(1200.0, 800.0)), &mut scheduler, KEY, t0);
        assert_eq!(r.entity_count(), 160);

        let mut surface = RecordingSurface::new(300.0, 200.0);
        r.measure(surface.size, &mut scheduler, KEY, t0);
        assert_eq!(r.entity_count(), 10);
        assert_eq!(scheduler.pending(), 1);

        let t1 = t0 + scheduler.frame_interval();
        let (handle, key) = scheduler.take_due(t1)[0];
        r.tick(handle, &mut surface, &loud(), Theme::Neon.palette(), &mut scheduler, key, t1);
        for op in &surface.ops {
            if let Op::Fill(path, _) = op {
                let (min, max) = path.bounds().unwrap();
                assert!(min.x > -40.0 && max.x < 340.0, "{min:?} {max:?}");
                assert!(min.y > -40.0 && max.y < 240.0, "{min:?} {max:?}");
            }
        }
    }

    #[test]
    fn test_surface_loss_stops_chain_without_error() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new(30);
        let mut r = renderer();
        let mut surface = RecordingSurface::new(600.0, 400.0);
        r.measure(surface.size, &mut scheduler, KEY, t0);

        surface.size = None;
        let t1 = t0 + scheduler.frame_interval();
        let (handle, key) = scheduler.take_due(t1)[0];
        assert!(!r.tick(handle, &mut surface, &loud(), Theme::Neon.palette(), &mut scheduler, key, t1));
        assert_eq!(r.state(), RendererState::Uninitialized);
        assert_eq!(scheduler.pending(), 0);
        assert!(surface.ops.is_empty());

        r.measure(Some(SurfaceSize::new(600.0, 400.0)), &mut scheduler, KEY, t1);
        assert_eq!(r.state(), RendererState::Active);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_suspend_cancels_pending_tick() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new(30);
        let mut r = renderer();
        r.measure(Some(SurfaceSize::new(600.0, 400.0)), &mut scheduler, KEY, t0);
        r.suspend(&mut scheduler);
        assert_eq!(r.state(), RendererState::Suspended);
        assert_eq!(scheduler.pending(), 0);

        r.measure(Some(SurfaceSize::new(10.0, 10.0)), &mut scheduler, KEY, t0);
        assert_eq!(r.state(), RendererState::Suspended);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_same_size_does_not_duplicate_chain() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new(30);
        let mut r = renderer();
        let size = Some(SurfaceSize::new(600.0, 400.0));
        r.measure(size, &mut scheduler, KEY, t0);
        r.measure(size, &mut scheduler, KEY, t0);
        r.measure(size, &mut scheduler, KEY, t0);
        assert_eq!(scheduler.pending(), 1);
    }
}

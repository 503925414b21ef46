//! The single analyser endpoint every audio source feeds.
//!
//! Sources write through a [`Tap`]. Only the tap most recently passed to
//! [`Analyser::connect`] reaches the sample buffer; anything written through a
//! disconnected tap is dropped, so a source that is still winding down on the
//! audio thread cannot bleed into the next one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use ringbuf::{traits::*, HeapRb};

/// Tap id meaning "never connected".
const UNBOUND: u64 = 0;

struct AnalyserState {
    /// Last id handed out by `connect`.
    generation: u64,
    /// Id of the tap currently feeding the buffer.
    connected: Option<u64>,
    samples: HeapRb<f32>,
}

/// Shared handle to the analyser's sample buffer.
#[derive(Clone)]
pub struct Analyser {
    state: Arc<Mutex<AnalyserState>>,
}

/// Write end handed to one audio source.
///
/// Clones share the same connection, so the copy moved into the audio thread
/// and the copy kept by the controller always agree on whether they are live.
#[derive(Clone)]
pub struct Tap {
    id: Arc<AtomicU64>,
    state: Arc<Mutex<AnalyserState>>,
}

impl Analyser {
    pub fn new(fft_size: usize, capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(AnalyserState {
                generation: UNBOUND,
                connected: None,
                samples: HeapRb::new(capacity.max(fft_size)),
            })),
        }
    }

    /// A tap that is not connected yet.
    pub fn tap(&self) -> Tap {
        Tap {
            id: Arc::new(AtomicU64::new(UNBOUND)),
            state: self.state.clone(),
        }
    }

    /// Detach the current producer (if any), then make `tap` the only one.
    pub fn connect(&self, tap: &Tap) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        Self::detach(&mut state);
        state.generation += 1;
        let id = state.generation;
        tap.id.store(id, Ordering::SeqCst);
        state.connected = Some(id);
        log::debug!("analyser: producer {id} connected");
    }

    /// Detach the current producer and forget its buffered samples.
    pub fn disconnect(&self) {
        if let Ok(mut state) = self.state.lock() {
            Self::detach(&mut state);
        }
    }

    fn detach(state: &mut AnalyserState) {
        if let Some(id) = state.connected.take() {
            log::debug!("analyser: producer {id} disconnected");
        }
        state.samples.clear();
    }

    /// Number of producers feeding the buffer; never more than one.
    pub fn producer_count(&self) -> usize {
        self.state
            .lock()
            .map(|s| usize::from(s.connected.is_some()))
            .unwrap_or(0)
    }

    /// Copy the most recent samples into `out`, aligned to its end.
    ///
    /// Slots with no sample yet are zeroed. Returns how many real samples were
    /// copied.
    pub fn latest(&self, out: &mut [f32]) -> usize {
        out.fill(0.0);
        let Ok(state) = self.state.lock() else {
            return 0;
        };
        let available = state.samples.occupied_len();
        let count = available.min(out.len());
        let offset = out.len() - count;
        for (slot, &sample) in out[offset..]
            .iter_mut()
            .zip(state.samples.iter().skip(available - count))
        {
            *slot = sample;
        }
        count
    }
}

impl Tap {
    /// Push samples if this tap is the connected one.
    pub fn push(&self, samples: &[f32]) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.connected != Some(self.id.load(Ordering::SeqCst)) {
            return;
        }
        for &sample in samples {
            // Buffer full: drop the oldest sample to make room
            if state.samples.is_full() {
                let _ = state.samples.try_pop();
            }
            let _ = state.samples.try_push(sample);
        }
    }

    pub fn is_connected(&self) -> bool {
        let id = self.id.load(Ordering::SeqCst);
        id != UNBOUND
            && self
                .state
                .lock()
                .map(|s| s.connected == Some(id))
                .unwrap_or(false)
    }
}

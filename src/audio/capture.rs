//! A wrapper source that feeds decoded samples into the analyser while passing
//! them through to the output.

use std::time::Duration;

use rodio::Source;

use super::analyser::Tap;

/// Frames collected before taking the analyser lock.
const BATCH_FRAMES: usize = 64;

/// Wraps a rodio source, downmixes each frame to mono and writes it to a tap.
pub struct SampleCapture<S> {
    source: S,
    tap: Tap,
    channels: u16,
    /// Channel index of the next sample within its frame
    position: u16,
    frame_sum: f32,
    pending: Vec<f32>,
}

impl<S> SampleCapture<S>
where
    S: Source<Item = f32>,
{
    pub fn new(source: S, tap: Tap) -> Self {
        let channels = source.channels().max(1);
        Self {
            source,
            tap,
            channels,
            position: 0,
            frame_sum: 0.0,
            pending: Vec::with_capacity(BATCH_FRAMES),
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.tap.push(&self.pending);
            self.pending.clear();
        }
    }
}

impl<S> Iterator for SampleCapture<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(sample) = self.source.next() else {
            self.flush();
            return None;
        };
        self.frame_sum += sample;
        self.position += 1;
        if self.position >= self.channels {
            self.pending.push(self.frame_sum / self.channels as f32);
            self.frame_sum = 0.0;
            self.position = 0;
            if self.pending.len() >= BATCH_FRAMES {
                self.flush();
            }
        }
        Some(sample)
    }
}

impl<S> Source for SampleCapture<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.source.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.source.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.source.total_duration()
    }
}

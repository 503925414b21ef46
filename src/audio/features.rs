//! Per-tick feature extraction: the immutable snapshot every scene reads.

use std::ops::Range;
use std::sync::Arc;

use super::analyser::Analyser;
use super::fft::{byte_time_domain_data, FftProcessor};
use crate::config::AudioConfig;

/// Lowest and highest tempo the heuristic reports.
pub const TEMPO_MIN: u32 = 90;
pub const TEMPO_MAX: u32 = 150;

/// Bins summed as "bass energy" for the tempo heuristic.
const TEMPO_BASS_BINS: usize = 10;

/// Audio features for one tick. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSnapshot {
    /// Time-domain bytes, 128 = zero crossing.
    pub waveform: Vec<u8>,
    /// Frequency magnitudes, low to high.
    pub spectrum: Vec<u8>,
    /// Mean spectrum magnitude normalised to [0,1].
    pub volume: f32,
    /// Heuristic tempo; `None` while no source is active.
    pub estimated_tempo: Option<u32>,
}

impl FeatureSnapshot {
    /// Zero-filled snapshot used whenever nothing is feeding the analyser.
    pub fn silence(bins: usize) -> Self {
        Self {
            waveform: vec![0; bins],
            spectrum: vec![0; bins],
            volume: 0.0,
            estimated_tempo: None,
        }
    }

    /// Build an active snapshot, deriving volume and tempo from `spectrum`.
    pub fn from_bins(waveform: Vec<u8>, spectrum: Vec<u8>) -> Self {
        let volume = volume_of(&spectrum);
        let estimated_tempo = Some(estimate_tempo(&spectrum));
        Self {
            waveform,
            spectrum,
            volume,
            estimated_tempo,
        }
    }

    /// True when a source was feeding the analyser for this tick.
    pub fn is_active(&self) -> bool {
        self.estimated_tempo.is_some()
    }

    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    /// Spectrum bin, or 0 when out of range.
    pub fn bin(&self, index: usize) -> u8 {
        self.spectrum.get(index).copied().unwrap_or(0)
    }

    /// Spectrum bin at `index / count` of the way through the spectrum.
    pub fn bin_at_fraction(&self, index: usize, count: usize) -> u8 {
        if count == 0 {
            return 0;
        }
        self.bin(index * self.spectrum.len() / count)
    }

    /// Sum of the spectrum over `range`, clipped to the bins that exist.
    pub fn band_sum(&self, range: Range<usize>) -> u32 {
        band_sum(&self.spectrum, range)
    }
}

/// Sum of `spectrum[range]`, clipped to the slice.
pub fn band_sum(spectrum: &[u8], range: Range<usize>) -> u32 {
    let end = range.end.min(spectrum.len());
    let start = range.start.min(end);
    spectrum[start..end].iter().map(|&v| u32::from(v)).sum()
}

/// `mean(spectrum) / 256`, clamped to [0,1]. Empty input is silent.
pub fn volume_of(spectrum: &[u8]) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }
    let mean = band_sum(spectrum, 0..spectrum.len()) as f32 / spectrum.len() as f32;
    (mean / 256.0).clamp(0.0, 1.0)
}

/// Placeholder tempo: `floor(90 + bass / 500 * 60)` over the first ten bins.
///
/// Not a beat tracker. It only moves with low-frequency energy, and is
/// clamped to [90, 150] because saturated bass would overshoot.
pub fn estimate_tempo(spectrum: &[u8]) -> u32 {
    let bass = band_sum(spectrum, 0..TEMPO_BASS_BINS) as f64;
    let raw = (90.0 + (bass / 500.0) * 60.0).floor() as u32;
    raw.clamp(TEMPO_MIN, TEMPO_MAX)
}

/// Reads the analyser once per tick and produces a [`FeatureSnapshot`].
pub struct FeatureExtractor {
    fft: FftProcessor,
    samples: Vec<f32>,
    latest: Arc<FeatureSnapshot>,
    was_active: bool,
}

impl FeatureExtractor {
    pub fn new(config: &AudioConfig) -> Self {
        let fft = FftProcessor::new(config);
        let bins = fft.bin_count();
        Self {
            fft,
            samples: vec![0.0; config.fft_size],
            latest: Arc::new(FeatureSnapshot::silence(bins)),
            was_active: false,
        }
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Arc<FeatureSnapshot> {
        Arc::clone(&self.latest)
    }

    /// Sample the analyser and replace the shared snapshot.
    ///
    /// With `active == false` the snapshot is silence regardless of what is
    /// still buffered.
    pub fn extract(&mut self, analyser: &Analyser, active: bool) -> Arc<FeatureSnapshot> {
        let bins = self.fft.bin_count();
        let snapshot = if active {
            if !self.was_active {
                self.fft.reset();
            }
            analyser.latest(&mut self.samples);
            let mut spectrum = vec![0u8; bins];
            let mut waveform = vec![0u8; bins];
            self.fft.byte_frequency_data(&self.samples, &mut spectrum);
            byte_time_domain_data(&self.samples, &mut waveform);
            FeatureSnapshot::from_bins(waveform, spectrum)
        } else {
            FeatureSnapshot::silence(bins)
        };
        self.was_active = active;
        self.latest = Arc::new(snapshot);
        self.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_snapshot() {
        let s = FeatureSnapshot::silence(128);
        assert_eq!(s.waveform.len(), 128);
        assert_eq!(s.spectrum.len(), 128);
        assert_eq!(s.volume, 0.0);
        assert_eq!(s.estimated_tempo, None);
        assert!(!s.is_active());
    }

    #[test]
    fn test_volume_bounds() {
        assert_eq!(volume_of(&[]), 0.0);
        assert_eq!(volume_of(&[0; 16]), 0.0);
        let full = volume_of(&[255; 128]);
        assert!((full - 255.0 / 256.0).abs() < 1e-6);
        assert!((volume_of(&[128; 4]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tempo_formula_and_clamp() {
        let mut spectrum = vec![0u8; 128];
        assert_eq!(estimate_tempo(&spectrum), 90);
        // bass = 250 -> 90 + 30
        spectrum[0] = 250;
        assert_eq!(estimate_tempo(&spectrum), 120);
        // bass = 2550 would give 396
        spectrum[..10].fill(255);
        assert_eq!(estimate_tempo(&spectrum), 150);
        // bins past the first ten do not count
        let mut high = vec![0u8; 128];
        high[10..].fill(255);
        assert_eq!(estimate_tempo(&high), 90);
    }

    #[test]
    fn test_tempo_on_short_spectrum() {
        assert_eq!(estimate_tempo(&[]), 90);
        assert_eq!(estimate_tempo(&[100, 100, 50]), 120);
    }

    #[test]
    fn test_band_sum_clips_out_of_range() {
        let s = FeatureSnapshot::from_bins(vec![0; 4], vec![1, 2, 3, 4]);
        assert_eq!(s.band_sum(0..2), 3);
        assert_eq!(s.band_sum(2..50), 7);
        assert_eq!(s.band_sum(20..50), 0);
        assert_eq!(s.bin(9), 0);
        assert_eq!(s.bin_at_fraction(3, 6), 3);
        assert_eq!(s.bin_at_fraction(1, 0), 0);
        let empty = FeatureSnapshot::silence(0);
        assert_eq!(empty.bin_at_fraction(2, 5), 0);
    }

    #[test]
    fn test_extract_inactive_is_silence() {
        let config = AudioConfig::default();
        let analyser = Analyser::new(config.fft_size, config.buffer_capacity);
        let tap = analyser.tap();
        analyser.connect(&tap);
        tap.push(&vec![0.5; 512]);

        let mut extractor = FeatureExtractor::new(&config);
        let snapshot = extractor.extract(&analyser, false);
        assert_eq!(*snapshot, FeatureSnapshot::silence(128));
        assert_eq!(extractor.latest(), snapshot);
    }

    #[test]
    fn test_extract_active_signal() {
        let config = AudioConfig::default();
        let analyser = Analyser::new(config.fft_size, config.buffer_capacity);
        let tap = analyser.tap();
        analyser.connect(&tap);
        let tone: Vec<f32> = (0..1024)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 3.0 * i as f32 / 256.0).sin())
            .collect();
        tap.push(&tone);

        let mut extractor = FeatureExtractor::new(&config);
        let snapshot = extractor.extract(&analyser, true);
        assert_eq!(snapshot.spectrum.len(), 128);
        assert_eq!(snapshot.waveform.len(), 128);
        assert!(snapshot.is_active());
        assert!(snapshot.volume > 0.0 && snapshot.volume <= 1.0);
        let tempo = snapshot.estimated_tempo.unwrap();
        assert!((TEMPO_MIN..=TEMPO_MAX).contains(&tempo));
        assert!(snapshot.spectrum[3] > snapshot.spectrum[100]);
    }
}

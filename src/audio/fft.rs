//! FFT computation producing analyser-style byte spectra.

use std::f32::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::AudioConfig;

/// FFT processor that turns a window of samples into byte magnitudes.
pub struct FftProcessor {
    /// FFT planner for frequency analysis
    fft_planner: FftPlanner<f32>,
    fft_size: usize,
    /// Precomputed Blackman window
    window: Vec<f32>,
    /// Smoothed linear magnitudes carried between frames
    smoothed: Vec<f32>,
    /// Smoothing factor (0.0 = no smoothing)
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    buffer: Vec<Complex<f32>>,
}

impl FftProcessor {
    pub fn new(config: &AudioConfig) -> Self {
        let fft_size = config.fft_size;
        Self {
            fft_planner: FftPlanner::new(),
            fft_size,
            window: (0..fft_size).map(|i| blackman(i, fft_size)).collect(),
            smoothed: vec![0.0; fft_size / 2],
            smoothing: config.smoothing,
            min_db: config.min_db,
            max_db: config.max_db,
            buffer: Vec::with_capacity(fft_size),
        }
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Compute the spectrum of `samples` into `out` as bytes in [0,255].
    ///
    /// `samples` shorter than the FFT size are zero padded; `out` receives
    /// `min(out.len(), bin_count)` bins and the rest is zeroed.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) {
        self.buffer.clear();
        self.buffer.extend(
            samples
                .iter()
                .take(self.fft_size)
                .zip(&self.window)
                .map(|(&sample, &w)| Complex::new(sample * w, 0.0)),
        );
        // Pad with zeros if needed
        self.buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        let fft = self.fft_planner.plan_fft_forward(self.fft_size);
        fft.process(&mut self.buffer);

        let scale = 1.0 / self.fft_size as f32;
        let db_range = self.max_db - self.min_db;
        out.fill(0);
        for (k, (slot, smoothed)) in out.iter_mut().zip(self.smoothed.iter_mut()).enumerate() {
            let magnitude = self.buffer[k].norm() * scale;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            let db = 20.0 * smoothed.max(1e-10).log10();
            let scaled = 255.0 * (db - self.min_db) / db_range;
            *slot = scaled.floor().clamp(0.0, 255.0) as u8;
        }
    }

    /// Drop smoothing history so a new source starts from silence.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

/// Map samples in [-1,1] to bytes centred on 128.
pub fn byte_time_domain_data(samples: &[f32], out: &mut [u8]) {
    out.fill(0);
    for (slot, &sample) in out.iter_mut().zip(samples) {
        *slot = (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8;
    }
}

/// Blackman window coefficient (a = 0.16).
fn blackman(index: usize, size: usize) -> f32 {
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * freq_bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    fn unsmoothed() -> AudioConfig {
        AudioConfig {
            smoothing: 0.0,
            ..AudioConfig::default()
        }
    }

    #[test]
    fn test_blackman_window_shape() {
        assert!(blackman(0, 256).abs() < 1e-6);
        assert!((blackman(128, 256) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut fft = FftProcessor::new(&AudioConfig::default());
        let mut out = vec![0u8; 128];
        fft.byte_frequency_data(&[0.0; 256], &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut fft = FftProcessor::new(&unsmoothed());
        let mut out = vec![0u8; 128];
        fft.byte_frequency_data(&sine(10, 256, 0.02), &mut out);
        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 10);
        assert!(out[10] > 150);
        assert!(out[60] < out[10]);
    }

    #[test]
    fn test_smoothing_lags_behind_input() {
        let mut fft = FftProcessor::new(&AudioConfig::default());
        let mut first = vec![0u8; 128];
        let mut second = vec![0u8; 128];
        let tone = sine(20, 256, 0.02);
        fft.byte_frequency_data(&tone, &mut first);
        fft.byte_frequency_data(&tone, &mut second);
        assert!(second[20] > first[20]);

        fft.reset();
        let mut after_reset = vec![0u8; 128];
        fft.byte_frequency_data(&tone, &mut after_reset);
        assert_eq!(after_reset[20], first[20]);
    }

    #[test]
    fn test_time_domain_bytes() {
        let mut out = [0u8; 4];
        byte_time_domain_data(&[0.0, -1.0, 0.999, 2.0], &mut out);
        assert_eq!(out, [128, 0, 255, 255]);
    }
}

//! Cosmetic "analysis" panel: a smoothed mood vector and a canned phrase.
//!
//! Both are heuristics over spectrum bands, not inference of any kind.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::audio::FeatureSnapshot;

/// How often the mood vector is blended toward the current signal.
pub const MOOD_INTERVAL: Duration = Duration::from_secs(1);

/// Weight kept from the previous mood on each update.
const RETAIN: f32 = 0.7;

pub const PHRASES: [&str; 6] = [
    "The syncopated rhythm suggests a complex emotional texture",
    "This track exhibits harmonic progression typical of introspective genres",
    "The frequency spectrum suggests influence from ambient electronica",
    "Audio fingerprint shows characteristics of post-modern composition",
    "This audio contains patterns frequently found in transformative works",
    "The tonal structure suggests an emotional narrative arc",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodVector {
    pub energetic: f32,
    pub calm: f32,
    pub dark: f32,
    pub euphoric: f32,
}

impl Default for MoodVector {
    fn default() -> Self {
        Self {
            energetic: 0.2,
            calm: 0.3,
            dark: 0.1,
            euphoric: 0.4,
        }
    }
}

impl MoodVector {
    /// Unsmoothed mood for one spectrum, each axis clamped to [0.1, 0.9].
    pub fn raw(snapshot: &FeatureSnapshot) -> Self {
        let bass = snapshot.band_sum(0..4) as f32 / (4.0 * 255.0);
        let mids = snapshot.band_sum(4..20) as f32 / (16.0 * 255.0);
        let treble = snapshot.band_sum(20..50) as f32 / (30.0 * 255.0);
        let clamp = |v: f32| v.clamp(0.1, 0.9);
        Self {
            energetic: clamp(bass * 1.2),
            calm: clamp(1.0 - bass * 0.8),
            dark: clamp((1.0 - treble) * 0.7),
            euphoric: clamp(mids + treble * 0.5),
        }
    }

    /// `RETAIN * self + (1 - RETAIN) * target`, per axis.
    pub fn blend(&self, target: &MoodVector) -> Self {
        let mix = |old: f32, new: f32| RETAIN * old + (1.0 - RETAIN) * new;
        Self {
            energetic: mix(self.energetic, target.energetic),
            calm: mix(self.calm, target.calm),
            dark: mix(self.dark, target.dark),
            euphoric: mix(self.euphoric, target.euphoric),
        }
    }

    /// Axes with their display labels.
    pub fn axes(&self) -> [(&'static str, f32); 4] {
        [
            ("Energetic", self.energetic),
            ("Calm", self.calm),
            ("Dark", self.dark),
            ("Euphoric", self.euphoric),
        ]
    }
}

pub struct InsightGenerator {
    mood: MoodVector,
    rng: StdRng,
}

impl InsightGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self {
            mood: MoodVector::default(),
            rng,
        }
    }

    pub fn mood(&self) -> MoodVector {
        self.mood
    }

    /// Interval callback. Silent snapshots leave the mood untouched.
    pub fn update(&mut self, snapshot: &FeatureSnapshot) -> bool {
        if !snapshot.is_active() {
            return false;
        }
        self.mood = self.mood.blend(&MoodVector::raw(snapshot));
        log::trace!("mood updated: {:?}", self.mood);
        true
    }

    /// A phrase drawn uniformly at random; called on every render pass.
    pub fn phrase(&mut self) -> &'static str {
        PHRASES.choose(&mut self.rng).copied().unwrap_or(PHRASES[0])
    }
}

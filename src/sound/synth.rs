//! Sample generators for sound cues and ambience.
//!
//! Both are plain iterators implementing rodio's `Source`, so they can be
//! appended to any sink on the shared output stream.

use std::f32::consts::TAU;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rodio::Source;

use crate::types::AmbienceType;

/// Output sample rate for every generated source.
pub const SAMPLE_RATE: u32 = 44_100;

/// Gain floor for exponential ramps (a ramp to zero is undefined).
const FLOOR: f32 = 0.0001;

const BUTTERWORTH_Q: f32 = 0.7071;

fn secs_to_samples(secs: f32) -> u32 {
    (secs * SAMPLE_RATE as f32).round() as u32
}

/// Exponential attack from the floor to `peak`, then exponential decay back
/// to the floor at `dur`. Silent outside `[0, dur)`.
fn envelope(t: f32, attack: f32, dur: f32, peak: f32) -> f32 {
    if t < 0.0 || t >= dur || peak <= FLOOR {
        return 0.0;
    }
    if t < attack {
        FLOOR * (peak / FLOOR).powf(t / attack)
    } else {
        let span = (dur - attack).max(f32::EPSILON);
        peak * (FLOOR / peak).powf((t - attack) / span)
    }
}

// ============================================================================
// Cue tones
// ============================================================================

/// Oscillator shape for cue tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

impl Waveform {
    fn sample(self, freq: f32, t: f32) -> f32 {
        let s = (TAU * freq * t).sin();
        match self {
            Waveform::Sine => s,
            Waveform::Square => {
                if s >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// One note in a cue pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneStep {
    /// Offset from the start of the cue
    pub at_ms: u32,
    pub freq: f32,
    /// Length of the note including its decay
    pub ms: u32,
    pub waveform: Waveform,
    pub peak: f32,
}

impl ToneStep {
    pub const fn sine(at_ms: u32, freq: f32, ms: u32, peak: f32) -> Self {
        Self {
            at_ms,
            freq,
            ms,
            waveform: Waveform::Sine,
            peak,
        }
    }

    pub const fn square(at_ms: u32, freq: f32, ms: u32, peak: f32) -> Self {
        Self {
            at_ms,
            freq,
            ms,
            waveform: Waveform::Square,
            peak,
        }
    }

    fn end_ms(&self) -> u32 {
        self.at_ms + self.ms
    }
}

/// A finite mix of overlapping tones.
#[derive(Debug, Clone)]
pub struct CueSource {
    steps: Vec<ToneStep>,
    pos: u32,
    len: u32,
}

const CUE_ATTACK: f32 = 0.008;

impl CueSource {
    pub fn new(steps: &[ToneStep]) -> Self {
        let end_ms = steps.iter().map(ToneStep::end_ms).max().unwrap_or(0);
        Self {
            steps: steps.to_vec(),
            pos: 0,
            len: secs_to_samples(end_ms as f32 / 1000.0),
        }
    }

    /// Total number of samples this cue produces.
    pub fn len_samples(&self) -> u32 {
        self.len
    }
}

impl Iterator for CueSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos >= self.len {
            return None;
        }
        let now = self.pos as f32 / SAMPLE_RATE as f32;
        self.pos += 1;

        let mixed: f32 = self
            .steps
            .iter()
            .map(|step| {
                let t = now - step.at_ms as f32 / 1000.0;
                let gain = envelope(t, CUE_ATTACK, step.ms as f32 / 1000.0, step.peak);
                if gain == 0.0 {
                    0.0
                } else {
                    gain * step.waveform.sample(step.freq, t)
                }
            })
            .sum();

        Some(mixed.clamp(-1.0, 1.0))
    }
}

impl Source for CueSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.len - self.pos) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.len as f32 / SAMPLE_RATE as f32,
        ))
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Second-order IIR filter (RBJ cookbook coefficients, direct form I).
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

impl Biquad {
    fn new(kind: FilterKind, freq: f32, q: f32) -> Self {
        let w0 = TAU * freq / SAMPLE_RATE as f32;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => ((1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0),
            FilterKind::HighPass => ((1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0),
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn lowpass(freq: f32) -> Self {
        Self::new(FilterKind::LowPass, freq, BUTTERWORTH_Q)
    }

    fn highpass(freq: f32) -> Self {
        Self::new(FilterKind::HighPass, freq, BUTTERWORTH_Q)
    }

    fn bandpass(freq: f32, q: f32) -> Self {
        Self::new(FilterKind::BandPass, freq, q)
    }

    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

// ============================================================================
// Ambience
// ============================================================================

/// A short enveloped event layered over the bed (rain droplet, cricket chirp).
#[derive(Debug, Clone)]
struct Burst {
    /// Samples until the burst begins
    delay: u32,
    pos: u32,
    len: u32,
    attack: f32,
    peak: f32,
}

impl Burst {
    /// Returns the envelope gain for the current sample and advances.
    fn advance(&mut self) -> Option<f32> {
        if self.delay > 0 {
            self.delay -= 1;
            return Some(0.0);
        }
        if self.pos >= self.len {
            return None;
        }
        let t = self.pos as f32 / SAMPLE_RATE as f32;
        let dur = self.len as f32 / SAMPLE_RATE as f32;
        self.pos += 1;
        Some(envelope(t, self.attack, dur, self.peak))
    }
}

/// An endless synthesized ambience bed.
///
/// - white: low-passed noise
/// - rain: band-limited noise plus high-passed noise droplets
/// - night: dark noise bed plus sine cricket chirps
pub struct AmbienceSource {
    kind: AmbienceType,
    rng: SmallRng,
    bed: Vec<Biquad>,
    event_filter: Biquad,
    burst: Option<Burst>,
    until_next: u32,
    chirp_phase: f32,
}

const CHIRP_FREQ: f32 = 3200.0;

impl AmbienceSource {
    /// Creates a source for `kind` with a random seed.
    ///
    /// Returns None for `AmbienceType::None`.
    pub fn new(kind: AmbienceType) -> Option<Self> {
        Self::with_seed(kind, rand::random())
    }

    /// Creates a deterministic source for `kind`.
    pub fn with_seed(kind: AmbienceType, seed: u64) -> Option<Self> {
        let bed = match kind {
            AmbienceType::None => return None,
            AmbienceType::White => vec![Biquad::lowpass(3200.0)],
            AmbienceType::Rain => vec![Biquad::bandpass(1200.0, 0.8), Biquad::lowpass(4000.0)],
            AmbienceType::Night => vec![Biquad::lowpass(900.0)],
        };

        Some(Self {
            kind,
            rng: SmallRng::seed_from_u64(seed),
            bed,
            event_filter: Biquad::highpass(2500.0),
            burst: None,
            until_next: 0,
            chirp_phase: 0.0,
        })
    }

    pub fn kind(&self) -> AmbienceType {
        self.kind
    }

    fn noise(&mut self) -> f32 {
        self.rng.random_range(-1.0..1.0)
    }

    fn schedule_event(&mut self) {
        match self.kind {
            AmbienceType::Rain => {
                let delay = self.rng.random_range(0.0..0.25);
                let peak = self.rng.random_range(0.12..0.30);
                let dur = self.rng.random_range(0.02..0.06);
                self.burst = Some(Burst {
                    delay: secs_to_samples(delay),
                    pos: 0,
                    len: secs_to_samples(dur),
                    attack: 0.005,
                    peak,
                });
                self.until_next = secs_to_samples(self.rng.random_range(0.06..0.18));
            }
            AmbienceType::Night => {
                let peak = self.rng.random_range(0.06..0.15);
                let dur = self.rng.random_range(0.03..0.09);
                self.burst = Some(Burst {
                    delay: secs_to_samples(0.03),
                    pos: 0,
                    len: secs_to_samples(dur),
                    attack: 0.006,
                    peak,
                });
                self.until_next = secs_to_samples(self.rng.random_range(0.24..0.80));
            }
            AmbienceType::White | AmbienceType::None => {
                self.until_next = u32::MAX;
            }
        }
    }

    fn event_sample(&mut self) -> f32 {
        if self.until_next == 0 {
            self.schedule_event();
        }
        self.until_next = self.until_next.saturating_sub(1);

        // Oscillators keep running between bursts, as a gated graph would.
        let signal = match self.kind {
            AmbienceType::Rain => {
                let n = self.noise();
                self.event_filter.process(n)
            }
            AmbienceType::Night => {
                self.chirp_phase = (self.chirp_phase + CHIRP_FREQ / SAMPLE_RATE as f32).fract();
                (TAU * self.chirp_phase).sin()
            }
            _ => return 0.0,
        };

        match self.burst.as_mut().and_then(Burst::advance) {
            Some(gain) => gain * signal,
            None => {
                self.burst = None;
                0.0
            }
        }
    }
}

impl Iterator for AmbienceSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let mut bed = self.noise();
        for filter in &mut self.bed {
            bed = filter.process(bed);
        }
        let event = self.event_sample();
        Some((bed + event).clamp(-1.0, 1.0))
    }
}

impl Source for AmbienceSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

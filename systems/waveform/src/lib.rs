#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural trace synthesizer driven by the activity level.
//!
//! Each simulated tick appends one sample at the leading edge, scrolls the
//! retained samples towards the trailing edge, and recomputes the stroke
//! style. Faster scrolling, taller waves, and more frequent spikes all follow
//! from a higher level.

use seizure_drill_core::{ActivityLevel, Event, RandomSource, Rgba, WaveSample, WaveStyle};
use tracing::trace;

const CALM: Rgba = Rgba::from_rgb_u8(50, 173, 230);
const AGITATED: Rgba = Rgba::from_rgb_u8(175, 82, 222);
const ELEVATED: Rgba = Rgba::from_rgb_u8(255, 149, 0);
const CRITICAL: Rgba = Rgba::from_rgb_u8(255, 59, 48);

const AGITATED_BREAKPOINT: f64 = 0.3;
const ELEVATED_BREAKPOINT: f64 = 0.6;

const SPIKE_MAGNITUDE: f64 = 80.0;
const NOISE_MAGNITUDE: f64 = 5.0;
const FLICKER_FLOOR: f64 = 0.6;

/// Geometry of the scrolling window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformConfig {
    /// Position at which new samples are appended.
    pub leading_edge: f64,
    /// Samples scrolled below this position are discarded.
    pub trailing_cutoff: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            leading_edge: 600.0,
            trailing_cutoff: -20.0,
        }
    }
}

/// Pure system that turns time ticks and the current level into a polyline.
#[derive(Debug)]
pub struct WaveformSynthesizer {
    config: WaveformConfig,
    offset: f64,
    samples: Vec<WaveSample>,
    style: WaveStyle,
}

impl WaveformSynthesizer {
    /// Creates an empty synthesizer using the provided window geometry.
    #[must_use]
    pub fn new(config: WaveformConfig) -> Self {
        Self {
            config,
            offset: 0.0,
            samples: Vec::new(),
            style: calm_style(),
        }
    }

    /// Advances one tick for every `TimeAdvanced` event in the batch.
    pub fn handle(
        &mut self,
        events: &[Event],
        level: ActivityLevel,
        random: &mut dyn RandomSource,
    ) {
        for event in events {
            if let Event::TimeAdvanced { .. } = event {
                self.tick(level, random);
            }
        }
    }

    /// Generates one sample and scrolls the window.
    pub fn tick(&mut self, level: ActivityLevel, random: &mut dyn RandomSource) {
        let intensity = level.get();
        self.offset += 2.0 + intensity * 15.0;

        let layer1 = (self.offset * 0.12).sin() * (30.0 + intensity * 60.0);
        let layer2 = (self.offset * 0.07).sin() * (15.0 + intensity * 40.0);
        let spike = if random.next_unit() > 0.95 - intensity * 0.5 {
            random.uniform(-SPIKE_MAGNITUDE, SPIKE_MAGNITUDE) * (0.5 + intensity)
        } else {
            0.0
        };
        let noise = random.uniform(-NOISE_MAGNITUDE, NOISE_MAGNITUDE);

        self.samples.push(WaveSample {
            position: self.config.leading_edge,
            amplitude: layer1 + layer2 + spike + noise,
        });

        let scroll = 4.0 + intensity * 10.0;
        let cutoff = self.config.trailing_cutoff;
        for sample in &mut self.samples {
            sample.position -= scroll;
        }
        self.samples.retain(|sample| sample.position >= cutoff);

        self.style = style_for_level(level, random);
        trace!(
            samples = self.samples.len(),
            spike,
            glow = self.style.glow,
            "waveform tick"
        );
    }

    /// Retained samples ordered from the trailing edge to the leading edge.
    #[must_use]
    pub fn samples(&self) -> &[WaveSample] {
        &self.samples
    }

    /// Style computed on the most recent tick.
    #[must_use]
    pub const fn style(&self) -> WaveStyle {
        self.style
    }

    /// Discards every sample and rewinds the scroll offset.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.samples.clear();
        self.style = calm_style();
    }
}

impl Default for WaveformSynthesizer {
    fn default() -> Self {
        Self::new(WaveformConfig::default())
    }
}

/// Stroke color for a level.
///
/// Cyan below 0.3, blending to purple by 0.6 and to orange by 0.85, and red
/// once the alert threshold is reached.
#[must_use]
pub fn band_color(level: ActivityLevel) -> Rgba {
    let value = level.get();
    if value < AGITATED_BREAKPOINT {
        CALM
    } else if value < ELEVATED_BREAKPOINT {
        CALM.lerp(AGITATED, (value - AGITATED_BREAKPOINT) / 0.3)
    } else if value < ActivityLevel::ALERT_THRESHOLD {
        AGITATED.lerp(
            ELEVATED,
            (value - ELEVATED_BREAKPOINT) / (ActivityLevel::ALERT_THRESHOLD - ELEVATED_BREAKPOINT),
        )
    } else {
        CRITICAL
    }
}

/// Full style descriptor for a level. Draws from `random` only while the
/// level exceeds the alert threshold, when the opacity flickers.
#[must_use]
pub fn style_for_level(level: ActivityLevel, random: &mut dyn RandomSource) -> WaveStyle {
    let alpha = if level.exceeds_alert_threshold() {
        random.uniform(FLICKER_FLOOR, 1.0)
    } else {
        1.0
    };
    WaveStyle {
        color: band_color(level),
        glow: 2.0 + level.get() * 12.0,
        alpha,
    }
}

fn calm_style() -> WaveStyle {
    WaveStyle {
        color: CALM,
        glow: 2.0,
        alpha: 1.0,
    }
}

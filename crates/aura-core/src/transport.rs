//! Transport state and controls

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::position::{BarsBeatsSixteenths, Position, TimeSignature};

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

pub const DEFAULT_BPM: f64 = 120.0;

/// Transport clock and loop region
///
/// Musical time is kept in quarter notes. While playing, the position is the
/// quarter count at the last anchor plus the wall-clock time elapsed since,
/// so a tempo change re-anchors instead of rescaling the past.
#[derive(Debug, Clone)]
pub struct Transport {
    state: PlaybackState,
    bpm: f64,
    time_signature: TimeSignature,
    loop_enabled: bool,
    /// Loop start in quarters
    loop_start: f64,
    /// Loop end in quarters
    loop_end: f64,
    /// Position in quarters at `anchor` (or the resting position when not playing)
    anchor_quarters: f64,
    anchor: Option<Instant>,
}

impl Default for Transport {
    fn default() -> Self {
        let time_signature = TimeSignature::default();
        Self {
            state: PlaybackState::Stopped,
            bpm: DEFAULT_BPM,
            time_signature,
            loop_enabled: false,
            loop_start: 0.0,
            loop_end: 4.0 * time_signature.quarters_per_bar(),
            anchor_quarters: 0.0,
            anchor: None,
        }
    }
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// Start or resume from the current position. No-op if already playing.
    pub fn start(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        self.anchor = Some(now);
        self.state = PlaybackState::Playing;
    }

    /// Freeze the position where it is
    pub fn pause(&mut self, now: Instant) {
        if !self.is_playing() {
            return;
        }
        self.anchor_quarters = self.quarters_at(now);
        self.anchor = None;
        self.state = PlaybackState::Paused;
    }

    /// Stop and rewind to zero
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.anchor = None;
        self.anchor_quarters = 0.0;
    }

    pub fn set_bpm(&mut self, bpm: f64, now: Instant) {
        self.reanchor(now);
        self.bpm = bpm;
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    pub fn seek(&mut self, position: Position, now: Instant) {
        self.anchor_quarters = position.to_quarters(self.bpm, self.time_signature);
        if self.is_playing() {
            self.anchor = Some(now);
        }
    }

    /// Enable or disable looping; `None` bounds keep their current value
    pub fn set_loop(&mut self, enabled: bool, start: Option<Position>, end: Option<Position>, now: Instant) {
        self.reanchor(now);
        self.loop_enabled = enabled;
        if let Some(start) = start {
            self.loop_start = start.to_quarters(self.bpm, self.time_signature);
        }
        if let Some(end) = end {
            self.loop_end = end.to_quarters(self.bpm, self.time_signature);
        }
    }

    pub fn loop_start(&self) -> BarsBeatsSixteenths {
        BarsBeatsSixteenths::from_quarters(self.loop_start, self.time_signature)
    }

    pub fn loop_end(&self) -> BarsBeatsSixteenths {
        BarsBeatsSixteenths::from_quarters(self.loop_end, self.time_signature)
    }

    /// Position in quarter notes at `now`, wrapped into the loop region when looping
    pub fn quarters_at(&self, now: Instant) -> f64 {
        let Some(anchor) = self.anchor else {
            return self.anchor_quarters;
        };
        let elapsed = now.saturating_duration_since(anchor).as_secs_f64();
        let quarters = self.anchor_quarters + elapsed * self.bpm / 60.0;

        let loop_len = self.loop_end - self.loop_start;
        let wraps = self.loop_enabled && loop_len > 0.0 && self.anchor_quarters < self.loop_end;
        if wraps && quarters >= self.loop_end {
            self.loop_start + (quarters - self.loop_start) % loop_len
        } else {
            quarters
        }
    }

    /// Position in seconds at `now`
    pub fn seconds_at(&self, now: Instant) -> f64 {
        self.quarters_at(now) * 60.0 / self.bpm
    }

    pub fn position_at(&self, now: Instant) -> BarsBeatsSixteenths {
        BarsBeatsSixteenths::from_quarters(self.quarters_at(now), self.time_signature)
    }

    /// Position in seconds right now
    pub fn seconds(&self) -> f64 {
        self.seconds_at(Instant::now())
    }

    /// Position right now
    pub fn position(&self) -> BarsBeatsSixteenths {
        self.position_at(Instant::now())
    }

    fn reanchor(&mut self, now: Instant) {
        if self.anchor.is_some() {
            self.anchor_quarters = self.quarters_at(now);
            self.anchor = Some(now);
        }
    }
}

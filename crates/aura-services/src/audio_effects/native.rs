//! Native stereo effect nodes using fundsp

use std::f32::consts::PI;
use std::fmt;

use fundsp::hacker::*;

use super::{check_range, AudioEffect, EffectError, EffectParam};

pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Keep filter corners below Nyquist
fn safe_cutoff(hz: f32, sample_rate: f32) -> f32 {
    hz.min(sample_rate * 0.49).max(10.0)
}

/// One-pole smoothing coefficient for a time constant in seconds
fn smoothing_coef(seconds: f32, sample_rate: f32) -> f32 {
    if seconds <= 0.0 {
        return 0.0;
    }
    (-1.0 / (seconds * sample_rate)).exp()
}

fn unknown(effect: &'static str, name: &str) -> EffectError {
    EffectError::UnknownParam { effect, param: name.to_string() }
}

// ---------------------------------------------------------------------------
// Three-band EQ
// ---------------------------------------------------------------------------

struct EqBands {
    low: An<FixedSvf<f64, LowshelfMode<f64>>>,
    mid: An<FixedSvf<f64, BellMode<f64>>>,
    high: An<FixedSvf<f64, HighshelfMode<f64>>>,
}

impl EqBands {
    fn tick(&mut self, x: f32) -> f32 {
        let x = self.low.tick(&Frame::from([x]))[0];
        let x = self.mid.tick(&Frame::from([x]))[0];
        self.high.tick(&Frame::from([x]))[0]
    }
}

/// Low shelf / mid bell / high shelf with per-band gain in dB
pub struct ThreeBandEq {
    low_db: f32,
    mid_db: f32,
    high_db: f32,
    low_frequency: f32,
    high_frequency: f32,
    sample_rate: f32,
    bands: [EqBands; 2],
}

impl ThreeBandEq {
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            low_db: 0.0,
            mid_db: 0.0,
            high_db: 0.0,
            low_frequency: 400.0,
            high_frequency: 2500.0,
            sample_rate,
            bands: [Self::flat_bands(), Self::flat_bands()],
        };
        eq.rebuild();
        eq
    }

    fn flat_bands() -> EqBands {
        EqBands {
            low: lowshelf_hz(400.0, 0.707, 1.0),
            mid: bell_hz(1000.0, 0.5, 1.0),
            high: highshelf_hz(2500.0, 0.707, 1.0),
        }
    }

    fn rebuild(&mut self) {
        let sr = self.sample_rate;
        let low_f = safe_cutoff(self.low_frequency, sr);
        let high_f = safe_cutoff(self.high_frequency, sr);
        let mid_f = (low_f * high_f).sqrt();
        let mid_q = (mid_f / (high_f - low_f).abs().max(1.0)).max(0.1);

        for bands in &mut self.bands {
            bands.low = lowshelf_hz(low_f, 0.707, db_amp(self.low_db));
            bands.mid = bell_hz(mid_f, mid_q, db_amp(self.mid_db));
            bands.high = highshelf_hz(high_f, 0.707, db_amp(self.high_db));
            bands.low.set_sample_rate(sr as f64);
            bands.mid.set_sample_rate(sr as f64);
            bands.high.set_sample_rate(sr as f64);
        }
    }
}

impl fmt::Debug for ThreeBandEq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreeBandEq")
            .field("low_db", &self.low_db)
            .field("mid_db", &self.mid_db)
            .field("high_db", &self.high_db)
            .finish()
    }
}

impl AudioEffect for ThreeBandEq {
    fn name(&self) -> &str { "EQ3" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let [bands_l, bands_r] = &mut self.bands;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = bands_l.tick(*l);
            *r = bands_r.tick(*r);
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "low" => self.low_db = check_range(name, value, -60.0, 24.0)?,
            "mid" => self.mid_db = check_range(name, value, -60.0, 24.0)?,
            "high" => self.high_db = check_range(name, value, -60.0, 24.0)?,
            "lowFrequency" => self.low_frequency = check_range(name, value, 20.0, 20000.0)?,
            "highFrequency" => self.high_frequency = check_range(name, value, 20.0, 20000.0)?,
            _ => return Err(unknown("EQ3", name)),
        }
        self.rebuild();
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("low", self.low_db, -60.0, 24.0, "dB"),
            EffectParam::new("mid", self.mid_db, -60.0, 24.0, "dB"),
            EffectParam::new("high", self.high_db, -60.0, 24.0, "dB"),
            EffectParam::new("lowFrequency", self.low_frequency, 20.0, 20000.0, "Hz"),
            EffectParam::new("highFrequency", self.high_frequency, 20.0, 20000.0, "Hz"),
        ]
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.rebuild();
    }
}

// ---------------------------------------------------------------------------
// Single filter (high-pass or high-shelf)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Highpass,
    Highshelf,
}

enum FilterCore {
    Highpass(An<FixedSvf<f64, HighpassMode<f64>>>),
    Highshelf(An<FixedSvf<f64, HighshelfMode<f64>>>),
}

impl FilterCore {
    fn tick(&mut self, x: f32) -> f32 {
        let input = Frame::from([x]);
        match self {
            Self::Highpass(f) => f.tick(&input)[0],
            Self::Highshelf(f) => f.tick(&input)[0],
        }
    }
}

/// Biquad-style filter node with frequency, Q and (shelf only) gain
pub struct FilterNode {
    kind: FilterKind,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
    cores: [FilterCore; 2],
}

impl FilterNode {
    pub fn new(kind: FilterKind, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let cores = [
            Self::build(kind, frequency, q, gain_db, sample_rate),
            Self::build(kind, frequency, q, gain_db, sample_rate),
        ];
        Self { kind, frequency, q, gain_db, sample_rate, cores }
    }

    pub fn highpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::Highpass, frequency, q, 0.0, sample_rate)
    }

    pub fn highshelf(frequency: f32, gain_db: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::Highshelf, frequency, 1.0, gain_db, sample_rate)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    fn build(kind: FilterKind, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> FilterCore {
        let cutoff = safe_cutoff(frequency, sample_rate);
        match kind {
            FilterKind::Highpass => {
                let mut f = highpass_hz(cutoff, q);
                f.set_sample_rate(sample_rate as f64);
                FilterCore::Highpass(f)
            }
            FilterKind::Highshelf => {
                let mut f = highshelf_hz(cutoff, q, db_amp(gain_db));
                f.set_sample_rate(sample_rate as f64);
                FilterCore::Highshelf(f)
            }
        }
    }

    fn rebuild(&mut self) {
        for core in &mut self.cores {
            *core = Self::build(self.kind, self.frequency, self.q, self.gain_db, self.sample_rate);
        }
    }
}

impl fmt::Debug for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterNode")
            .field("kind", &self.kind)
            .field("frequency", &self.frequency)
            .field("q", &self.q)
            .field("gain_db", &self.gain_db)
            .finish()
    }
}

impl AudioEffect for FilterNode {
    fn name(&self) -> &str {
        match self.kind {
            FilterKind::Highpass => "High Pass",
            FilterKind::Highshelf => "High Shelf",
        }
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let [core_l, core_r] = &mut self.cores;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = core_l.tick(*l);
            *r = core_r.tick(*r);
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "frequency" => self.frequency = check_range(name, value, 10.0, 22050.0)?,
            "Q" => self.q = check_range(name, value, 0.0001, 100.0)?,
            "gain" => self.gain_db = check_range(name, value, -60.0, 24.0)?,
            _ => return Err(unknown("Filter", name)),
        }
        self.rebuild();
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("frequency", self.frequency, 10.0, 22050.0, "Hz"),
            EffectParam::new("Q", self.q, 0.0001, 100.0, ""),
            EffectParam::new("gain", self.gain_db, -60.0, 24.0, "dB"),
        ]
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.rebuild();
    }
}

// ---------------------------------------------------------------------------
// Compressor
// ---------------------------------------------------------------------------

/// Feed-forward, stereo-linked compressor with a soft knee
#[derive(Debug)]
pub struct CompressorNode {
    threshold_db: f32,
    ratio: f32,
    attack: f32,
    release: f32,
    knee_db: f32,
    sample_rate: f32,
    /// Smoothed gain reduction in dB (always <= 0)
    envelope_db: f32,
}

impl CompressorNode {
    pub fn new(threshold_db: f32, ratio: f32, attack: f32, release: f32, sample_rate: f32) -> Self {
        Self {
            threshold_db,
            ratio,
            attack,
            release,
            knee_db: 30.0,
            sample_rate,
            envelope_db: 0.0,
        }
    }

    /// Static gain reduction for an input level
    fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let over = level_db - self.threshold_db;
        let slope = 1.0 / self.ratio - 1.0;
        let knee = self.knee_db;
        if knee > 0.0 && 2.0 * over.abs() <= knee {
            slope * (over + knee / 2.0).powi(2) / (2.0 * knee)
        } else if over > 0.0 {
            slope * over
        } else {
            0.0
        }
    }

    /// Current smoothed gain reduction in dB
    pub fn reduction_db(&self) -> f32 {
        self.envelope_db
    }
}

impl AudioEffect for CompressorNode {
    fn name(&self) -> &str { "Compressor" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let attack = smoothing_coef(self.attack, self.sample_rate);
        let release = smoothing_coef(self.release, self.sample_rate);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let peak = l.abs().max(r.abs()).max(1e-9);
            let target = self.gain_reduction_db(amp_db(peak));
            let coef = if target < self.envelope_db { attack } else { release };
            self.envelope_db = target + coef * (self.envelope_db - target);

            let gain = db_amp(self.envelope_db);
            *l *= gain;
            *r *= gain;
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "threshold" => self.threshold_db = check_range(name, value, -100.0, 0.0)?,
            "ratio" => self.ratio = check_range(name, value, 1.0, 20.0)?,
            "attack" => self.attack = check_range(name, value, 0.0, 1.0)?,
            "release" => self.release = check_range(name, value, 0.0, 1.0)?,
            "knee" => self.knee_db = check_range(name, value, 0.0, 40.0)?,
            _ => return Err(unknown("Compressor", name)),
        }
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("threshold", self.threshold_db, -100.0, 0.0, "dB"),
            EffectParam::new("ratio", self.ratio, 1.0, 20.0, ":1"),
            EffectParam::new("attack", self.attack, 0.0, 1.0, "s"),
            EffectParam::new("release", self.release, 0.0, 1.0, "s"),
            EffectParam::new("knee", self.knee_db, 0.0, 40.0, "dB"),
        ]
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
}

// ---------------------------------------------------------------------------
// High-band compressor
// ---------------------------------------------------------------------------

/// Splits at a crossover and compresses only the band above it
pub struct MultibandCompressorNode {
    high_frequency: f32,
    sample_rate: f32,
    splitters: [An<FixedSvf<f64, LowpassMode<f64>>>; 2],
    high: CompressorNode,
    scratch_l: Vec<f32>,
    scratch_r: Vec<f32>,
}

impl MultibandCompressorNode {
    pub fn new(high_frequency: f32, threshold_db: f32, ratio: f32, sample_rate: f32) -> Self {
        let mut node = Self {
            high_frequency,
            sample_rate,
            splitters: [lowpass_hz(1000.0, 0.707), lowpass_hz(1000.0, 0.707)],
            high: CompressorNode::new(threshold_db, ratio, 0.003, 0.25, sample_rate),
            scratch_l: Vec::new(),
            scratch_r: Vec::new(),
        };
        node.rebuild();
        node
    }

    fn rebuild(&mut self) {
        let cutoff = safe_cutoff(self.high_frequency, self.sample_rate);
        for splitter in &mut self.splitters {
            *splitter = lowpass_hz(cutoff, 0.707);
            splitter.set_sample_rate(self.sample_rate as f64);
        }
    }
}

impl fmt::Debug for MultibandCompressorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultibandCompressorNode")
            .field("high_frequency", &self.high_frequency)
            .field("high", &self.high)
            .finish()
    }
}

impl AudioEffect for MultibandCompressorNode {
    fn name(&self) -> &str { "Multiband Compressor" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = Ord::min(left.len(), right.len());
        self.scratch_l.resize(frames, 0.0);
        self.scratch_r.resize(frames, 0.0);

        let [split_l, split_r] = &mut self.splitters;
        for i in 0..frames {
            let low_l = split_l.tick(&Frame::from([left[i]]))[0];
            let low_r = split_r.tick(&Frame::from([right[i]]))[0];
            self.scratch_l[i] = left[i] - low_l;
            self.scratch_r[i] = right[i] - low_r;
            left[i] = low_l;
            right[i] = low_r;
        }

        self.high.process(&mut self.scratch_l[..frames], &mut self.scratch_r[..frames]);

        for i in 0..frames {
            left[i] += self.scratch_l[i];
            right[i] += self.scratch_r[i];
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "frequency" => {
                self.high_frequency = check_range(name, value, 20.0, 20000.0)?;
                self.rebuild();
                Ok(())
            }
            "threshold" | "ratio" | "attack" | "release" | "knee" => self.high.set_param(name, value),
            _ => Err(unknown("Multiband Compressor", name)),
        }
    }

    fn get_params(&self) -> Vec<EffectParam> {
        let mut params = vec![EffectParam::new("frequency", self.high_frequency, 20.0, 20000.0, "Hz")];
        params.extend(self.high.get_params());
        params
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.high.set_sample_rate(sample_rate);
        self.rebuild();
    }
}

// ---------------------------------------------------------------------------
// Distortion
// ---------------------------------------------------------------------------

/// Waveshaping distortion with dry/wet mix
#[derive(Debug)]
pub struct DistortionNode {
    distortion: f32,
    wet: f32,
}

impl DistortionNode {
    pub fn new(distortion: f32, wet: f32) -> Self {
        Self { distortion, wet }
    }

    fn shape(&self, x: f32) -> f32 {
        let k = self.distortion * 100.0;
        let deg = PI / 180.0;
        (3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())
    }
}

impl AudioEffect for DistortionNode {
    fn name(&self) -> &str { "Distortion" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        if self.wet <= 0.0 {
            return;
        }
        let dry = 1.0 - self.wet;
        for sample in left.iter_mut().chain(right.iter_mut()) {
            *sample = *sample * dry + self.shape(*sample) * self.wet;
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "distortion" => self.distortion = check_range(name, value, 0.0, 1.0)?,
            "wet" => self.wet = check_range(name, value, 0.0, 1.0)?,
            _ => return Err(unknown("Distortion", name)),
        }
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("distortion", self.distortion, 0.0, 1.0, ""),
            EffectParam::new("wet", self.wet, 0.0, 1.0, ""),
        ]
    }
}

// ---------------------------------------------------------------------------
// Noise gate
// ---------------------------------------------------------------------------

/// Closes the signal while its smoothed level sits below the threshold
#[derive(Debug)]
pub struct GateNode {
    threshold_db: f32,
    smoothing: f32,
    sample_rate: f32,
    follower: f32,
}

impl GateNode {
    pub fn new(threshold_db: f32, sample_rate: f32) -> Self {
        Self {
            threshold_db,
            smoothing: 0.1,
            sample_rate,
            follower: 0.0,
        }
    }
}

impl AudioEffect for GateNode {
    fn name(&self) -> &str { "Gate" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let coef = smoothing_coef(self.smoothing, self.sample_rate);
        let threshold = db_amp(self.threshold_db);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let level = l.abs().max(r.abs());
            self.follower = level + coef * (self.follower - level);
            if self.follower <= threshold {
                *l = 0.0;
                *r = 0.0;
            }
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "threshold" => self.threshold_db = check_range(name, value, -100.0, 0.0)?,
            "smoothing" => self.smoothing = check_range(name, value, 0.0, 1.0)?,
            _ => return Err(unknown("Gate", name)),
        }
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("threshold", self.threshold_db, -100.0, 0.0, "dB"),
            EffectParam::new("smoothing", self.smoothing, 0.0, 1.0, "s"),
        ]
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
}

// ---------------------------------------------------------------------------
// Reverb
// ---------------------------------------------------------------------------

/// Comb-filter delay line with one-pole damping in the feedback path
struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    damp_state: f32,
}

impl Comb {
    fn new(samples: usize, feedback: f32) -> Self {
        Self {
            buffer: vec![0.0; Ord::max(samples, 1)],
            pos: 0,
            feedback,
            damp_state: 0.0,
        }
    }

    fn tick(&mut self, input: f32, damping: f32) -> f32 {
        let out = self.buffer[self.pos];
        self.damp_state = out * (1.0 - damping) + self.damp_state * damping;
        self.buffer[self.pos] = input + self.damp_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }
}

struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
}

impl Allpass {
    const GAIN: f32 = 0.5;

    fn new(samples: usize) -> Self {
        Self { buffer: vec![0.0; Ord::max(samples, 1)], pos: 0 }
    }

    fn tick(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let out = delayed - input;
        self.buffer[self.pos] = input + delayed * Self::GAIN;
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }
}

/// Per-channel Schroeder network
struct ReverbChannel {
    pre_delay: Vec<f32>,
    pre_pos: usize,
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ReverbChannel {
    const COMB_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
    const ALLPASS_MS: [f32; 2] = [5.0, 1.7];

    fn new(decay: f32, pre_delay: f32, spread_ms: f32, sample_rate: f32) -> Self {
        let ms_to_samples = |ms: f32| (ms * sample_rate / 1000.0) as usize;
        let combs = Self::COMB_MS
            .iter()
            .map(|&ms| {
                let delay_s = (ms + spread_ms) / 1000.0;
                // RT60: each pass through the comb loses delay/decay of the 60 dB budget
                let feedback = 10f32.powf(-3.0 * delay_s / decay.max(0.001));
                Comb::new(ms_to_samples(ms + spread_ms), feedback)
            })
            .collect();
        let allpasses = Self::ALLPASS_MS
            .iter()
            .map(|&ms| Allpass::new(ms_to_samples(ms + spread_ms * 0.25)))
            .collect();

        Self {
            pre_delay: vec![0.0; Ord::max((pre_delay * sample_rate) as usize, 1)],
            pre_pos: 0,
            combs,
            allpasses,
        }
    }

    fn tick(&mut self, input: f32, damping: f32) -> f32 {
        let delayed = self.pre_delay[self.pre_pos];
        self.pre_delay[self.pre_pos] = input;
        self.pre_pos = (self.pre_pos + 1) % self.pre_delay.len();

        let mut wet: f32 = self.combs.iter_mut().map(|c| c.tick(delayed, damping)).sum();
        wet /= self.combs.len() as f32;
        for allpass in &mut self.allpasses {
            wet = allpass.tick(wet);
        }
        wet
    }
}

/// Algorithmic reverb. Decay and pre-delay are fixed at construction; only
/// the wet mix can change afterwards.
pub struct ReverbNode {
    decay: f32,
    pre_delay: f32,
    wet: f32,
    damping: f32,
    sample_rate: f32,
    channels: [ReverbChannel; 2],
}

impl ReverbNode {
    /// Right channel delay lines are offset for decorrelation
    const STEREO_SPREAD_MS: f32 = 0.53;

    pub fn new(decay: f32, pre_delay: f32, wet: f32, sample_rate: f32) -> Self {
        Self {
            decay,
            pre_delay,
            wet,
            damping: 0.2,
            sample_rate,
            channels: Self::build(decay, pre_delay, sample_rate),
        }
    }

    fn build(decay: f32, pre_delay: f32, sample_rate: f32) -> [ReverbChannel; 2] {
        [
            ReverbChannel::new(decay, pre_delay, 0.0, sample_rate),
            ReverbChannel::new(decay, pre_delay, Self::STEREO_SPREAD_MS, sample_rate),
        ]
    }
}

impl fmt::Debug for ReverbNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverbNode")
            .field("decay", &self.decay)
            .field("pre_delay", &self.pre_delay)
            .field("wet", &self.wet)
            .finish()
    }
}

impl AudioEffect for ReverbNode {
    fn name(&self) -> &str { "Reverb" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let [chan_l, chan_r] = &mut self.channels;
        let dry = 1.0 - self.wet;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let wet_l = chan_l.tick(*l, self.damping);
            let wet_r = chan_r.tick(*r, self.damping);
            *l = *l * dry + wet_l * self.wet;
            *r = *r * dry + wet_r * self.wet;
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "wet" => self.wet = check_range(name, value, 0.0, 1.0)?,
            "decay" | "preDelay" => {
                return Err(EffectError::ReadOnly { effect: "Reverb", param: name.to_string() });
            }
            _ => return Err(unknown("Reverb", name)),
        }
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("decay", self.decay, 0.001, 20.0, "s"),
            EffectParam::new("preDelay", self.pre_delay, 0.0, 1.0, "s"),
            EffectParam::new("wet", self.wet, 0.0, 1.0, ""),
        ]
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        if (sample_rate - self.sample_rate).abs() < 1.0 {
            return;
        }
        self.sample_rate = sample_rate;
        self.channels = Self::build(self.decay, self.pre_delay, sample_rate);
    }
}

// ---------------------------------------------------------------------------
// Stereo widener
// ---------------------------------------------------------------------------

/// Mid/side width control: 0 = mono, 1 = unchanged, 2 = doubled side signal
#[derive(Debug)]
pub struct StereoWidenerNode {
    width: f32,
}

impl StereoWidenerNode {
    pub fn new(width: f32) -> Self {
        Self { width }
    }
}

impl AudioEffect for StereoWidenerNode {
    fn name(&self) -> &str { "Stereo Widener" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mid = (*l + *r) * 0.5;
            let side = (*l - *r) * 0.5 * self.width;
            *l = mid + side;
            *r = mid - side;
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "width" => self.width = check_range(name, value, 0.0, 2.0)?,
            _ => return Err(unknown("Stereo Widener", name)),
        }
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![EffectParam::new("width", self.width, 0.0, 2.0, "")]
    }
}

// ---------------------------------------------------------------------------
// Feedback delay
// ---------------------------------------------------------------------------

/// Stereo delay with feedback and dry/wet mix
pub struct FeedbackDelayNode {
    delay_time: f32,
    feedback: f32,
    wet: f32,
    buffers: [Vec<f32>; 2],
    write_pos: usize,
    sample_rate: f32,
}

impl FeedbackDelayNode {
    pub const MAX_DELAY: f32 = 1.0;

    pub fn new(delay_time: f32, feedback: f32, wet: f32, sample_rate: f32) -> Self {
        let max_samples = Self::buffer_len(sample_rate);
        Self {
            delay_time: delay_time.clamp(0.0, Self::MAX_DELAY),
            feedback: feedback.clamp(0.0, 1.0),
            wet: wet.clamp(0.0, 1.0),
            buffers: [vec![0.0; max_samples], vec![0.0; max_samples]],
            write_pos: 0,
            sample_rate,
        }
    }
}

impl FeedbackDelayNode {
    /// Ring length for the longest delay, never below two slots
    fn buffer_len(sample_rate: f32) -> usize {
        Ord::max((Self::MAX_DELAY * sample_rate) as usize + 1, 2)
    }
}

impl fmt::Debug for FeedbackDelayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackDelayNode")
            .field("delay_time", &self.delay_time)
            .field("feedback", &self.feedback)
            .field("wet", &self.wet)
            .finish()
    }
}

impl AudioEffect for FeedbackDelayNode {
    fn name(&self) -> &str { "Feedback Delay" }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = self.buffers[0].len();
        let delay_samples = ((self.delay_time * self.sample_rate) as usize).clamp(1, len - 1);
        let dry = 1.0 - self.wet;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let read_pos = (self.write_pos + len - delay_samples) % len;
            for (sample, buffer) in [l, r].into_iter().zip(self.buffers.iter_mut()) {
                let delayed = buffer[read_pos];
                buffer[self.write_pos] = *sample + delayed * self.feedback;
                *sample = *sample * dry + delayed * self.wet;
            }
            self.write_pos = (self.write_pos + 1) % len;
        }
    }

    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError> {
        match name {
            "delayTime" => self.delay_time = check_range(name, value, 0.0, Self::MAX_DELAY)?,
            "feedback" => self.feedback = check_range(name, value, 0.0, 1.0)?,
            "wet" => self.wet = check_range(name, value, 0.0, 1.0)?,
            _ => return Err(unknown("Feedback Delay", name)),
        }
        Ok(())
    }

    fn get_params(&self) -> Vec<EffectParam> {
        vec![
            EffectParam::new("delayTime", self.delay_time, 0.0, Self::MAX_DELAY, "s"),
            EffectParam::new("feedback", self.feedback, 0.0, 1.0, ""),
            EffectParam::new("wet", self.wet, 0.0, 1.0, ""),
        ]
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        if (sample_rate - self.sample_rate).abs() < 1.0 {
            return;
        }
        self.sample_rate = sample_rate;
        let max_samples = Self::buffer_len(sample_rate);
        self.buffers = [vec![0.0; max_samples], vec![0.0; max_samples]];
        self.write_pos = 0;
    }
}

//! Master bus: shared mix point, gain, limiter and analyser tap

use std::fmt;
use std::sync::{Arc, Mutex};

use aura_core::clamp_volume_db;
use fundsp::hacker::*;

/// Samples kept by the analyser
pub const WAVEFORM_SIZE: usize = 256;
/// Output ceiling of the master limiter
pub const LIMITER_CEILING_DB: f32 = -1.0;
/// Attenuation applied while ducking
pub const DUCKING_DB: f32 = -12.0;

#[derive(Debug, Default)]
struct MixBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
}

/// Handle to the master bus input that tracks sum into
#[derive(Debug, Clone, Default)]
pub struct MasterInput {
    mix: Arc<Mutex<MixBuffer>>,
}

impl MasterInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the mix and size it for a block of `frames`
    pub fn clear(&self, frames: usize) {
        if let Ok(mut mix) = self.mix.lock() {
            mix.left.clear();
            mix.left.resize(frames, 0.0);
            mix.right.clear();
            mix.right.resize(frames, 0.0);
        }
    }

    /// Sum a stereo block into the mix, growing it to fit
    pub fn add(&self, left: &[f32], right: &[f32]) {
        if let Ok(mut mix) = self.mix.lock() {
            let MixBuffer { left: mix_l, right: mix_r } = &mut *mix;
            if mix_l.len() < left.len() {
                mix_l.resize(left.len(), 0.0);
            }
            if mix_r.len() < right.len() {
                mix_r.resize(right.len(), 0.0);
            }
            for (acc, s) in mix_l.iter_mut().zip(left) {
                *acc += s;
            }
            for (acc, s) in mix_r.iter_mut().zip(right) {
                *acc += s;
            }
        }
    }

    /// Size the mix for a block of `frames`, keeping what was already summed
    pub(crate) fn prepare(&self, frames: usize) {
        if let Ok(mut mix) = self.mix.lock() {
            mix.left.resize(frames, 0.0);
            mix.right.resize(frames, 0.0);
        }
    }

    /// Copy the mix out and zero it for the next block
    fn drain_into(&self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        if let Ok(mut mix) = self.mix.lock() {
            for (out, s) in left.iter_mut().zip(mix.left.iter_mut()) {
                *out = std::mem::take(s);
            }
            for (out, s) in right.iter_mut().zip(mix.right.iter_mut()) {
                *out = std::mem::take(s);
            }
        }
    }
}

/// Zero-gain stage at the end of the analyser branch. Pulls every analysed
/// sample and never reaches the output.
#[derive(Debug, Clone, Default)]
struct SilentSink {
    level: f32,
    frames: u64,
}

impl SilentSink {
    const GAIN: f32 = 0.0;

    fn consume(&mut self, sample: f32) {
        self.level = sample * Self::GAIN;
        self.frames += 1;
    }
}

/// Ring of the most recent mono samples for visualisation
#[derive(Debug, Clone)]
pub struct Analyser {
    ring: Vec<f32>,
    pos: usize,
    sink: SilentSink,
}

impl Default for Analyser {
    fn default() -> Self {
        Self { ring: vec![0.0; WAVEFORM_SIZE], pos: 0, sink: SilentSink::default() }
    }
}

impl Analyser {
    fn push(&mut self, sample: f32) {
        self.ring[self.pos] = sample;
        self.pos = (self.pos + 1) % self.ring.len();
        self.sink.consume(sample);
    }

    /// Oldest sample first
    pub fn waveform(&self) -> Vec<f32> {
        let (newer, older) = self.ring.split_at(self.pos);
        older.iter().chain(newer).copied().collect()
    }

    fn reset(&mut self) {
        self.ring.fill(0.0);
        self.pos = 0;
        self.sink = SilentSink::default();
    }
}

/// Gain stage and limiter feeding the output. The analyser taps the post-gain
/// signal plus the visualizer input and ends in a silent sink.
pub struct MasterBus {
    input: MasterInput,
    visualizer: MasterInput,
    vis_l: Vec<f32>,
    vis_r: Vec<f32>,
    volume_db: f32,
    ducking: bool,
    limiter: An<Limiter<U2>>,
    analyser: Analyser,
    sample_rate: f32,
    connected: bool,
}

impl MasterBus {
    pub fn new(sample_rate: f32) -> Self {
        let mut limiter = limiter_stereo(0.003, 0.01);
        limiter.set_sample_rate(sample_rate as f64);
        Self {
            input: MasterInput::new(),
            visualizer: MasterInput::new(),
            vis_l: Vec::new(),
            vis_r: Vec::new(),
            volume_db: 0.0,
            ducking: false,
            limiter,
            analyser: Analyser::default(),
            sample_rate,
            connected: true,
        }
    }

    /// Handle tracks use to reach the bus
    pub fn input(&self) -> MasterInput {
        self.input.clone()
    }

    /// Handle feeding the analyser only; nothing added here is heard
    pub fn visualizer_input(&self) -> MasterInput {
        self.visualizer.clone()
    }

    /// Size both inputs for the next block
    pub(crate) fn prepare(&self, frames: usize) {
        self.input.prepare(frames);
        self.visualizer.prepare(frames);
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db
    }

    /// Clamp to -60..=6 dB and return the stored value
    pub fn set_volume_db(&mut self, db: f32) -> f32 {
        self.volume_db = clamp_volume_db(db);
        self.volume_db
    }

    /// Linear gain of the gain stage, including ducking
    pub fn gain(&self) -> f32 {
        let duck = if self.ducking { DUCKING_DB } else { 0.0 };
        db_amp(self.volume_db + duck)
    }

    pub fn is_ducking(&self) -> bool {
        self.ducking
    }

    pub fn set_ducking(&mut self, ducking: bool) {
        self.ducking = ducking;
    }

    pub fn waveform(&self) -> Vec<f32> {
        self.analyser.waveform()
    }

    /// Frames pulled through the analyser branch since the last reset
    pub fn analysed_frames(&self) -> u64 {
        self.analyser.sink.frames
    }

    /// Last value leaving the analyser's zero-gain sink
    pub fn sink_level(&self) -> f32 {
        self.analyser.sink.level
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Render the accumulated mix into the output buffers and zero both inputs
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = Ord::min(left.len(), right.len());
        self.input.drain_into(left, right);
        self.vis_l.resize(frames, 0.0);
        self.vis_r.resize(frames, 0.0);
        self.visualizer.drain_into(&mut self.vis_l, &mut self.vis_r);
        if !self.connected {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        let gain = self.gain();
        let ceiling = db_amp(LIMITER_CEILING_DB);
        let taps = self.vis_l.iter().zip(&self.vis_r);
        for ((l, r), (v_l, v_r)) in left.iter_mut().zip(right.iter_mut()).zip(taps) {
            let (g_l, g_r) = (*l * gain, *r * gain);
            self.analyser.push((g_l + g_r + v_l + v_r) * 0.5);

            let limited = self.limiter.tick(&Frame::from([g_l / ceiling, g_r / ceiling]));
            *l = limited[0] * ceiling;
            *r = limited[1] * ceiling;
        }
    }

    /// Detach the output; later blocks render silence
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.input.clear(0);
        self.visualizer.clear(0);
        self.analyser.reset();
        self.limiter.reset();
    }
}

impl fmt::Debug for MasterBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterBus")
            .field("volume_db", &self.volume_db)
            .field("ducking", &self.ducking)
            .field("sample_rate", &self.sample_rate)
            .field("connected", &self.connected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_sum_into_input() {
        let mut bus = MasterBus::new(44100.0);
        let input = bus.input();
        let frames = 1024;
        input.clear(frames);
        input.add(&vec![0.1; frames], &vec![0.0; frames]);
        input.add(&vec![0.1; frames], &vec![0.2; frames]);

        let mut l = vec![0.0; frames];
        let mut r = vec![0.0; frames];
        bus.process(&mut l, &mut r);
        // limiter look-ahead delays the signal, so check the tail
        assert!((l[frames - 1] - 0.2).abs() < 0.02);
        assert!((r[frames - 1] - 0.2).abs() < 0.02);
    }

    #[test]
    fn test_limiter_holds_ceiling() {
        let mut bus = MasterBus::new(44100.0);
        let input = bus.input();
        let frames = 4410;
        input.clear(frames);
        input.add(&vec![4.0; frames], &vec![4.0; frames]);

        let mut l = vec![0.0; frames];
        let mut r = vec![0.0; frames];
        bus.process(&mut l, &mut r);
        let ceiling = db_amp(LIMITER_CEILING_DB);
        assert!(l[frames - 1] <= ceiling + 1e-3, "got {}", l[frames - 1]);
    }

    #[test]
    fn test_ducking_attenuates() {
        let mut bus = MasterBus::new(44100.0);
        let normal = bus.gain();
        bus.set_ducking(true);
        assert!((amp_db(bus.gain() / normal) - DUCKING_DB).abs() < 1e-3);
    }

    #[test]
    fn test_volume_clamped() {
        let mut bus = MasterBus::new(44100.0);
        assert_eq!(bus.set_volume_db(-80.0), -60.0);
        assert_eq!(bus.set_volume_db(3.0), 3.0);
    }

    #[test]
    fn test_waveform_tracks_latest_samples() {
        let mut bus = MasterBus::new(44100.0);
        assert_eq!(bus.waveform(), vec![0.0; WAVEFORM_SIZE]);

        let input = bus.input();
        input.clear(300);
        input.add(&[0.25; 300], &[0.25; 300]);
        let mut l = vec![0.0; 300];
        let mut r = vec![0.0; 300];
        bus.process(&mut l, &mut r);

        let waveform = bus.waveform();
        assert_eq!(waveform.len(), WAVEFORM_SIZE);
        assert!(waveform.iter().all(|s| (*s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_visualizer_input_is_not_heard() {
        let mut bus = MasterBus::new(44100.0);
        let frames = 1024;
        bus.visualizer_input().add(&vec![0.5; frames], &vec![0.5; frames]);

        let mut l = vec![0.0; frames];
        let mut r = vec![0.0; frames];
        bus.process(&mut l, &mut r);
        assert!(l.iter().chain(&r).all(|s| *s == 0.0));
        assert!(bus.waveform().iter().all(|s| (*s - 0.5).abs() < 1e-6));
        assert_eq!(bus.analysed_frames(), frames as u64);
        assert_eq!(bus.sink_level(), 0.0);
    }

    #[test]
    fn test_analyser_tap_leaves_output_untouched() {
        let frames = 1024;
        let mut plain = MasterBus::new(44100.0);
        let mut tapped = MasterBus::new(44100.0);
        for bus in [&plain, &tapped] {
            bus.input().add(&vec![0.2; frames], &vec![0.1; frames]);
        }
        tapped.visualizer_input().add(&vec![f32::NAN; frames], &vec![3.0; frames]);

        let (mut l1, mut r1) = (vec![0.0; frames], vec![0.0; frames]);
        let (mut l2, mut r2) = (vec![0.0; frames], vec![0.0; frames]);
        plain.process(&mut l1, &mut r1);
        tapped.process(&mut l2, &mut r2);
        assert_eq!(l1, l2);
        assert_eq!(r1, r2);
        assert!(l2.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_process_drains_inputs() {
        let mut bus = MasterBus::new(44100.0);
        let input = bus.input();
        input.add(&[0.5; 64], &[0.5; 64]);
        bus.prepare(128);

        let mut l = vec![0.0; 128];
        let mut r = vec![0.0; 128];
        bus.process(&mut l, &mut r);
        let waveform = bus.waveform();
        assert!(waveform[WAVEFORM_SIZE - 64..].iter().all(|s| *s == 0.0));
        assert!(waveform[WAVEFORM_SIZE - 128..WAVEFORM_SIZE - 64].iter().all(|s| (*s - 0.5).abs() < 1e-6));

        bus.process(&mut l, &mut r);
        assert!(bus.waveform()[WAVEFORM_SIZE - 128..].iter().all(|s| *s == 0.0));
    }
}

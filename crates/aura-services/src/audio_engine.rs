//! Audio engine: master bus, transport, track registry and broadcasts

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use aura_core::{
    clamp_knob, AudioEngineOptions, BarsBeatsSixteenths, AudioEngineState, InstrumentType, PlaybackState, Position,
    SmartKnobProfile, TimeSignature, TrackId, TrackOptions, TrackState, Transport, TransportState,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::audio_effects::EffectFactory;
use crate::context::{AudioContext, ContextError, ContextState, OfflineContext};
use crate::instrument_track::InstrumentTrack;
use crate::listeners::{ListenerId, Listeners};
use crate::master::{MasterBus, MasterInput};
use crate::position_tracker::{PositionTracker, SharedPosition, TRACK_INTERVAL};
use crate::smart_knob::SmartKnobProcessor;

pub const BPM_MIN: f64 = 20.0;
pub const BPM_MAX: f64 = 300.0;

#[derive(Debug, Error)]
pub enum AudioEngineError {
    #[error("Audio context error: {0}")]
    Context(#[from] ContextError),
    #[error("Audio context is {0:?} after resume")]
    NotRunning(ContextState),
}

/// Owns the audio graph for one session.
///
/// Mutations go through `&mut self`; the transport and the last sampled
/// playhead are shared with the position tracker thread.
#[derive(Debug)]
pub struct AudioEngine {
    context: Box<dyn AudioContext>,
    initialized: bool,
    disposed: bool,
    transport: Arc<Mutex<Transport>>,
    position: SharedPosition,
    tracker: Option<PositionTracker>,
    track_interval: Duration,
    master: MasterBus,
    tracks: Vec<InstrumentTrack>,
    next_track_id: u64,
    processor: Arc<SmartKnobProcessor>,
    factory: EffectFactory,
    state_listeners: Listeners<AudioEngineState>,
    position_listeners: Arc<Listeners<f64>>,
    scratch_l: Vec<f32>,
    scratch_r: Vec<f32>,
}

impl AudioEngine {
    pub fn new(context: Box<dyn AudioContext>) -> Self {
        Self::with_processor(context, SmartKnobProcessor::new())
    }

    /// Engine using a custom Smart Knob profile table
    pub fn with_processor(context: Box<dyn AudioContext>, processor: SmartKnobProcessor) -> Self {
        let sample_rate = context.sample_rate();
        Self {
            context,
            initialized: false,
            disposed: false,
            transport: Arc::new(Mutex::new(Transport::new())),
            position: SharedPosition::default(),
            tracker: None,
            track_interval: TRACK_INTERVAL,
            master: MasterBus::new(sample_rate),
            tracks: Vec::new(),
            next_track_id: 1,
            processor: Arc::new(processor),
            factory: EffectFactory::new(sample_rate),
            state_listeners: Listeners::new(),
            position_listeners: Arc::new(Listeners::new()),
            scratch_l: Vec::new(),
            scratch_r: Vec::new(),
        }
    }

    /// Engine over an [`OfflineContext`]
    pub fn offline(sample_rate: f32) -> Self {
        Self::new(Box::new(OfflineContext::new(sample_rate)))
    }

    /// Start the context and apply initial settings. A second call warns and
    /// changes nothing. Fails only when the context cannot run.
    pub fn initialize(&mut self, options: AudioEngineOptions) -> Result<(), AudioEngineError> {
        if self.initialized {
            warn!("Audio engine already initialized");
            return Ok(());
        }

        self.context.resume()?;
        let state = self.context.state();
        if state != ContextState::Running {
            return Err(AudioEngineError::NotRunning(state));
        }

        let now = Instant::now();
        self.with_transport(|t| {
            if valid_bpm(options.bpm) {
                t.set_bpm(options.bpm, now);
            } else {
                warn!("Initial BPM {} out of range, keeping {}", options.bpm, t.bpm());
            }
            t.set_time_signature(options.time_signature);
        });
        self.master.set_volume_db(options.master_volume);

        self.initialized = true;
        info!(
            "Audio engine initialized ({} Hz, {} bpm)",
            self.context.sample_rate(),
            self.bpm()
        );
        self.notify_state();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_context_running(&self) -> bool {
        self.context.state() == ContextState::Running
    }

    pub fn sample_rate(&self) -> f32 {
        self.context.sample_rate()
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// Access the transport (locks mutex)
    fn with_transport<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Transport) -> R,
    {
        self.transport.lock().ok().map(|mut t| f(&mut t))
    }

    /// Start playback, optionally from `start_time`
    pub fn play(&mut self, start_time: Option<Position>) {
        if !self.initialized {
            warn!("Audio engine not initialized; ignoring play");
            return;
        }
        let now = Instant::now();
        self.with_transport(|t| {
            if let Some(position) = start_time {
                t.seek(position, now);
            }
            t.start(now);
        });
        self.start_tracking();
        self.notify_state();
    }

    /// Halt playback, keeping the position
    pub fn pause(&mut self) {
        if !self.initialized {
            warn!("Audio engine not initialized; ignoring pause");
            return;
        }
        let now = Instant::now();
        let seconds = self.with_transport(|t| {
            t.pause(now);
            t.seconds_at(now)
        });
        self.stop_tracking();
        if let Some(seconds) = seconds {
            self.position.set(seconds);
        }
        self.notify_state();
    }

    /// Halt playback and rewind to zero
    pub fn stop(&mut self) {
        self.with_transport(|t| t.stop());
        self.position.set(0.0);
        self.stop_tracking();
        self.position_listeners.notify(&0.0);
        self.notify_state();
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.with_transport(|t| t.state()).unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state() == PlaybackState::Playing
    }

    pub fn bpm(&self) -> f64 {
        self.with_transport(|t| t.bpm()).unwrap_or(aura_core::DEFAULT_BPM)
    }

    /// Values outside 20..=300 are rejected with a warning
    pub fn set_bpm(&mut self, bpm: f64) {
        if !valid_bpm(bpm) {
            warn!("BPM {} out of range {}..={}", bpm, BPM_MIN, BPM_MAX);
            return;
        }
        let now = Instant::now();
        self.with_transport(|t| t.set_bpm(bpm, now));
        self.notify_state();
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.with_transport(|t| t.time_signature()).unwrap_or_default()
    }

    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) {
        self.with_transport(|t| t.set_time_signature(TimeSignature::new(numerator, denominator)));
        self.notify_state();
    }

    /// Current position in seconds, read from the transport clock
    pub fn position_seconds(&self) -> f64 {
        self.with_transport(|t| t.seconds()).unwrap_or_else(|| self.position.get())
    }

    /// Current position as bars:beats:sixteenths
    pub fn position_bbs(&self) -> BarsBeatsSixteenths {
        self.with_transport(|t| t.position()).unwrap_or_default()
    }

    pub fn set_position(&mut self, position: Position) {
        let now = Instant::now();
        if let Some(seconds) = self.with_transport(|t| {
            t.seek(position, now);
            t.seconds_at(now)
        }) {
            self.position.set(seconds);
        }
        self.notify_state();
    }

    /// `None` bounds keep their current value
    pub fn set_loop(&mut self, enabled: bool, start: Option<Position>, end: Option<Position>) {
        let now = Instant::now();
        self.with_transport(|t| t.set_loop(enabled, start, end, now));
        self.notify_state();
    }

    fn start_tracking(&mut self) {
        self.stop_tracking();
        match PositionTracker::start(
            Arc::clone(&self.transport),
            self.position.clone(),
            Arc::clone(&self.position_listeners),
            self.track_interval,
        ) {
            Ok(tracker) => self.tracker = Some(tracker),
            Err(e) => error!("Failed to start position tracking: {}", e),
        }
    }

    fn stop_tracking(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.stop();
        }
    }

    // -----------------------------------------------------------------------
    // Tracks
    // -----------------------------------------------------------------------

    /// Create a track wired to the master bus
    pub fn create_track(&mut self, options: TrackOptions) -> &mut InstrumentTrack {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;

        let track = InstrumentTrack::new(
            id,
            options,
            self.master.input(),
            Arc::clone(&self.processor),
            self.factory,
        );
        self.tracks.push(track);
        self.notify_state();

        let index = self.tracks.len() - 1;
        &mut self.tracks[index]
    }

    /// Dispose and remove a track; false if the id is unknown
    pub fn delete_track(&mut self, id: TrackId) -> bool {
        let Some(index) = self.tracks.iter().position(|t| t.id() == id) else {
            warn!("Cannot delete unknown track {}", id);
            return false;
        };
        let mut track = self.tracks.remove(index);
        track.dispose();
        self.notify_state();
        true
    }

    pub fn get_track(&self, id: TrackId) -> Option<&InstrumentTrack> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn get_track_mut(&mut self, id: TrackId) -> Option<&mut InstrumentTrack> {
        self.tracks.iter_mut().find(|t| t.id() == id)
    }

    /// Tracks in creation order
    pub fn get_all_tracks(&self) -> &[InstrumentTrack] {
        &self.tracks
    }

    fn track_or_warn(&mut self, id: TrackId) -> Option<&mut InstrumentTrack> {
        let track = self.tracks.iter_mut().find(|t| t.id() == id);
        if track.is_none() {
            warn!("Track {} not found", id);
        }
        track
    }

    /// Resolve solo across all tracks. Call after changing any solo flag.
    pub fn update_solo_state(&mut self) {
        let any_solo = self.tracks.iter().any(|t| t.is_soloed());
        for track in &mut self.tracks {
            let muted_by_solo = any_solo && !track.is_soloed();
            track.set_effective_mute(muted_by_solo);
        }
    }

    pub fn set_track_volume(&mut self, id: TrackId, db: f32) {
        if let Some(track) = self.track_or_warn(id) {
            track.set_volume(db);
            self.notify_state();
        }
    }

    pub fn set_track_pan(&mut self, id: TrackId, pan: f32) {
        if let Some(track) = self.track_or_warn(id) {
            track.set_pan(pan);
            self.notify_state();
        }
    }

    pub fn set_track_mute(&mut self, id: TrackId, mute: bool) {
        if let Some(track) = self.track_or_warn(id) {
            track.set_mute(mute);
            self.notify_state();
        }
    }

    /// Set a solo flag and resolve solo across all tracks
    pub fn set_track_solo(&mut self, id: TrackId, solo: bool) {
        if let Some(track) = self.track_or_warn(id) {
            track.set_solo(solo);
            self.update_solo_state();
            self.notify_state();
        }
    }

    pub fn set_smart_knob(&mut self, id: TrackId, value: f32) {
        let processor = Arc::clone(&self.processor);
        let Some(track) = self.track_or_warn(id) else {
            return;
        };
        processor.apply_smart_knob(track, clamp_knob(value));
        self.notify_state();
    }

    pub fn set_track_instrument_type(&mut self, id: TrackId, instrument_type: InstrumentType) {
        if let Some(track) = self.track_or_warn(id) {
            track.set_instrument_type(instrument_type);
            self.notify_state();
        }
    }

    /// Profile for the track's current instrument type
    pub fn smart_knob_profile(&self, id: TrackId) -> Option<&SmartKnobProfile> {
        let track = self.get_track(id)?;
        self.processor.profile(track.instrument_type())
    }

    pub fn smart_knob_processor(&self) -> &SmartKnobProcessor {
        &self.processor
    }

    // -----------------------------------------------------------------------
    // Master
    // -----------------------------------------------------------------------

    pub fn master_volume(&self) -> f32 {
        self.master.volume_db()
    }

    /// Clamped to -60..=6 dB
    pub fn set_master_volume(&mut self, db: f32) {
        self.master.set_volume_db(db);
        self.notify_state();
    }

    pub fn is_ducking(&self) -> bool {
        self.master.is_ducking()
    }

    /// Pull the master output down while another voice talks over it
    pub fn set_ducking(&mut self, ducking: bool) {
        self.master.set_ducking(ducking);
        self.notify_state();
    }

    /// Most recent analyser samples, oldest first
    pub fn waveform(&self) -> Vec<f32> {
        self.master.waveform()
    }

    /// Handle for summing external audio into the master bus. Blocks added
    /// between renders are mixed into the next one.
    pub fn master_input(&self) -> MasterInput {
        self.master.input()
    }

    /// Handle feeding the waveform analyser without reaching the output
    pub fn visualizer_input(&self) -> MasterInput {
        self.master.visualizer_input()
    }

    /// Render one block. `source` fills each track's input for the block;
    /// the buffers hold the master output afterwards.
    pub fn render<F>(&mut self, mut source: F, left: &mut [f32], right: &mut [f32])
    where
        F: FnMut(TrackId, &mut [f32], &mut [f32]),
    {
        let frames = Ord::min(left.len(), right.len());
        let (left, right) = (&mut left[..frames], &mut right[..frames]);
        if !self.initialized || !self.is_context_running() {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        self.master.prepare(frames);
        self.scratch_l.resize(frames, 0.0);
        self.scratch_r.resize(frames, 0.0);
        for track in &mut self.tracks {
            self.scratch_l.fill(0.0);
            self.scratch_r.fill(0.0);
            source(track.id(), &mut self.scratch_l[..], &mut self.scratch_r[..]);
            track.process(&mut self.scratch_l, &mut self.scratch_r);
        }
        self.master.process(left, right);
    }

    // -----------------------------------------------------------------------
    // Broadcasts
    // -----------------------------------------------------------------------

    /// Called with a full snapshot after every mutating operation
    pub fn subscribe(&self, listener: impl Fn(&AudioEngineState) + Send + 'static) -> ListenerId {
        self.state_listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.state_listeners.unsubscribe(id)
    }

    /// Called with the playhead in seconds about every 16 ms while playing
    pub fn on_position_change(&self, listener: impl Fn(&f64) + Send + 'static) -> ListenerId {
        self.position_listeners.subscribe(listener)
    }

    pub fn remove_position_listener(&self, id: ListenerId) -> bool {
        self.position_listeners.unsubscribe(id)
    }

    fn notify_state(&self) {
        if self.state_listeners.is_empty() {
            return;
        }
        let state = self.get_state();
        self.state_listeners.notify(&state);
    }

    pub fn get_state(&self) -> AudioEngineState {
        let transport = self
            .with_transport(|t| transport_state(t))
            .unwrap_or_else(|| transport_state(&Transport::default()));
        AudioEngineState {
            is_initialized: self.initialized,
            is_context_running: self.is_context_running(),
            master_volume: self.master.volume_db(),
            is_ducking: self.master.is_ducking(),
            transport,
            tracks: self.tracks.iter().map(|t| t.get_state()).collect::<Vec<TrackState>>(),
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Tear down every track, the transport, the master chain and all listeners
    pub fn dispose(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.stop_tracking();
        for track in &mut self.tracks {
            track.dispose();
        }
        self.tracks.clear();
        self.with_transport(|t| *t = Transport::new());
        self.position.set(0.0);
        self.master.disconnect();
        self.state_listeners.clear();
        self.position_listeners.clear();
        self.context.close();
        self.initialized = false;
        info!("Audio engine disposed");
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn valid_bpm(bpm: f64) -> bool {
    bpm.is_finite() && (BPM_MIN..=BPM_MAX).contains(&bpm)
}

fn transport_state(t: &Transport) -> TransportState {
    let now = Instant::now();
    TransportState {
        playback_state: t.state(),
        is_playing: t.is_playing(),
        bpm: t.bpm(),
        time_signature: t.time_signature(),
        position: t.position_at(now).to_string(),
        position_seconds: t.seconds_at(now),
        loop_enabled: t.loop_enabled(),
        loop_start: t.loop_start().to_string(),
        loop_end: t.loop_end().to_string(),
    }
}

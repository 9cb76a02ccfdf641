//! aura-services: Audio engine, tracks, effects and Smart Knob processing

pub mod audio_effects;
pub mod audio_engine;
pub mod channel;
pub mod context;
pub mod instrument_track;
pub mod listeners;
pub mod master;
pub mod position_tracker;
pub mod smart_knob;

pub use audio_effects::{AudioEffect, EffectChain, EffectError, EffectFactory, EffectNode, EffectParam};
pub use audio_engine::{AudioEngine, AudioEngineError, BPM_MAX, BPM_MIN};
pub use channel::ChannelStrip;
pub use context::{AudioContext, ContextError, ContextState, OfflineContext};
pub use instrument_track::InstrumentTrack;
pub use listeners::{ListenerId, Listeners};
pub use master::{MasterBus, MasterInput, DUCKING_DB, WAVEFORM_SIZE};
pub use position_tracker::{PositionTracker, SharedPosition, TRACK_INTERVAL};
pub use smart_knob::SmartKnobProcessor;

//! aura-core: Domain types for the aura audio engine

mod effect;
mod error;
mod instrument;
pub mod position;
pub mod profile;
pub mod smart_knob;
mod state;
mod track;
mod transport;

pub use effect::{EffectParams, EffectType};
pub use error::{AuraError, Result};
pub use instrument::InstrumentType;
pub use position::{BarsBeatsSixteenths, Position, TimeSignature};
pub use profile::{ProfileTable, SmartKnobProfile, FALLBACK_DISPLAY_NAME};
pub use smart_knob::{calculate_effect_params, clamp_knob, lerp, KNOB_DEFAULT, KNOB_MAX, KNOB_MIN};
pub use state::{AudioEngineOptions, AudioEngineState, TrackState, TransportState};
pub use track::{clamp_pan, clamp_volume_db, TrackId, TrackOptions, VOLUME_MAX_DB, VOLUME_MIN_DB};
pub use transport::{PlaybackState, Transport, DEFAULT_BPM};

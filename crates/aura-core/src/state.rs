//! Point-in-time snapshots broadcast to subscribers
//!
//! Snapshots are derived from live engine state on demand and never mutated
//! in place. Field names serialize in camelCase so a persistence layer can
//! store them verbatim.

use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentType;
use crate::position::TimeSignature;
use crate::track::TrackId;
use crate::transport::PlaybackState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackState {
    pub id: TrackId,
    pub name: String,
    pub instrument_type: InstrumentType,
    /// dB, -60..=6
    pub volume: f32,
    /// -1 (left) ..= 1 (right)
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    /// Audible mute after solo resolution
    pub effective_mute: bool,
    /// 0..=100
    pub smart_knob_value: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportState {
    pub playback_state: PlaybackState,
    pub is_playing: bool,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    /// Bar:Beat:Sixteenth
    pub position: String,
    pub position_seconds: f64,
    #[serde(rename = "loop")]
    pub loop_enabled: bool,
    pub loop_start: String,
    pub loop_end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioEngineState {
    pub is_initialized: bool,
    pub is_context_running: bool,
    pub master_volume: f32,
    pub is_ducking: bool,
    pub transport: TransportState,
    pub tracks: Vec<TrackState>,
}

impl AudioEngineState {
    pub fn track(&self, id: TrackId) -> Option<&TrackState> {
        self.tracks.iter().find(|t| t.id == id)
    }
}

/// Options for `AudioEngine::initialize`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioEngineOptions {
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub master_volume: f32,
}

impl Default for AudioEngineOptions {
    fn default() -> Self {
        Self {
            bpm: crate::transport::DEFAULT_BPM,
            time_signature: TimeSignature::default(),
            master_volume: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_state_json_shape() {
        let state = TrackState {
            id: TrackId(3),
            name: "PUNCH Track".into(),
            instrument_type: InstrumentType::Kick,
            volume: -6.0,
            pan: 0.25,
            mute: false,
            solo: true,
            effective_mute: false,
            smart_knob_value: 50.0,
            color: "#E85D4E".into(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["instrumentType"], "kick");
        assert_eq!(json["smartKnobValue"], 50.0);
        assert_eq!(json["id"], 3);
        let back: TrackState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_options_defaults_from_partial_json() {
        let opts: AudioEngineOptions = serde_json::from_str(r#"{"bpm": 90}"#).unwrap();
        assert_eq!(opts.bpm, 90.0);
        assert_eq!(opts.time_signature, TimeSignature::default());
        assert_eq!(opts.master_volume, 0.0);
    }
}

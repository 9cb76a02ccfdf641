//! Applies Smart Knob values to live tracks

use aura_core::{
    calculate_effect_params, clamp_knob, EffectParams, EffectType, InstrumentType, ProfileTable,
    SmartKnobProfile,
};
use tracing::{debug, warn};

use crate::instrument_track::InstrumentTrack;

/// Maps one knob value onto every effect in a track's profile.
///
/// Holds only the profile table, never per-track state, so one processor is
/// shared by every track of an engine.
#[derive(Debug, Clone)]
pub struct SmartKnobProcessor {
    profiles: ProfileTable,
}

impl Default for SmartKnobProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartKnobProcessor {
    pub fn new() -> Self {
        Self::with_profiles(ProfileTable::builtin())
    }

    pub fn with_profiles(profiles: ProfileTable) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn profile(&self, instrument: InstrumentType) -> Option<&SmartKnobProfile> {
        self.profiles.get(instrument)
    }

    pub fn display_name(&self, instrument: InstrumentType) -> &str {
        self.profiles.display_name(instrument)
    }

    /// Clamp `value`, record it on the track and push the resulting parameter
    /// bundle into each profile effect
    pub fn apply_smart_knob(&self, track: &mut InstrumentTrack, value: f32) {
        let value = clamp_knob(value);
        let instrument = track.instrument_type();
        let Some(profile) = self.profiles.get(instrument) else {
            warn!("No Smart Knob profile for instrument type {}", instrument);
            return;
        };

        track.record_smart_knob_value(value);
        for &effect in &profile.effects {
            let params = calculate_effect_params(effect, value);
            track.update_effect_params(effect, &params);
        }
        debug!(
            "Smart Knob {} on {} set to {:.1} ({} effects)",
            profile.display_name,
            track.id(),
            value,
            profile.effects.len()
        );
    }

    /// Preview the bundle for one effect without touching any track
    pub fn calculate_effect_params(&self, effect: EffectType, value: f32) -> EffectParams {
        calculate_effect_params(effect, clamp_knob(value))
    }

    /// Like [`Self::calculate_effect_params`], keyed by wire name; unknown names warn and yield `None`
    pub fn calculate_effect_params_by_name(&self, effect: &str, value: f32) -> Option<EffectParams> {
        match effect.parse::<EffectType>() {
            Ok(effect) => Some(self.calculate_effect_params(effect, value)),
            Err(e) => {
                warn!("Cannot map Smart Knob value: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aura_core::{TrackId, TrackOptions, KNOB_DEFAULT};

    use crate::audio_effects::{EffectFactory, DEFAULT_SAMPLE_RATE};
    use crate::master::MasterInput;

    #[test]
    fn test_preview_clamps_value() {
        let processor = SmartKnobProcessor::new();
        let params = processor.calculate_effect_params(EffectType::LowEq, 250.0);
        assert_eq!(params.get("gain"), Some(12.0));
    }

    #[test]
    fn test_preview_by_name() {
        let processor = SmartKnobProcessor::new();
        let params = processor.calculate_effect_params_by_name("compression", 100.0).unwrap();
        assert_eq!(params.get("threshold"), Some(-30.0));
        assert!(processor.calculate_effect_params_by_name("chorus", 50.0).is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut table = ProfileTable::builtin();
        table.remove(InstrumentType::Synth);
        let processor = SmartKnobProcessor::with_profiles(table);
        assert_eq!(processor.display_name(InstrumentType::Synth), "TONE");
        assert_eq!(processor.display_name(InstrumentType::Kick), "PUNCH");
    }

    #[test]
    fn test_missing_profile_leaves_track_untouched() {
        let mut track = InstrumentTrack::new(
            TrackId(1),
            TrackOptions::new(InstrumentType::Synth),
            MasterInput::new(),
            Arc::new(SmartKnobProcessor::new()),
            EffectFactory::new(DEFAULT_SAMPLE_RATE),
        );
        let types = track.effect_types();
        let before: Vec<_> = types.iter().map(|&e| track.effect_params(e)).collect();
        assert!(!types.is_empty());

        let mut table = ProfileTable::builtin();
        table.remove(InstrumentType::Synth);
        SmartKnobProcessor::with_profiles(table).apply_smart_knob(&mut track, 90.0);

        assert_eq!(track.smart_knob_value(), KNOB_DEFAULT);
        assert_eq!(track.effect_types(), types);
        let after: Vec<_> = types.iter().map(|&e| track.effect_params(e)).collect();
        assert_eq!(after, before);
    }
}

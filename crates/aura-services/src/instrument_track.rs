//! One track's signal path: input, effect chain, output, channel strip

use std::sync::Arc;

use aura_core::{
    EffectParams, EffectType, InstrumentType, SmartKnobProfile, TrackId, TrackOptions, TrackState,
    KNOB_DEFAULT,
};
use tracing::{debug, error, info};

use crate::audio_effects::{EffectChain, EffectFactory, EffectParam};
use crate::channel::ChannelStrip;
use crate::master::MasterInput;
use crate::smart_knob::SmartKnobProcessor;

/// A track wired input gain -> effect chain -> output gain -> channel -> master
#[derive(Debug)]
pub struct InstrumentTrack {
    id: TrackId,
    name: String,
    instrument_type: InstrumentType,
    color: String,
    smart_knob_value: f32,
    mute: bool,
    solo: bool,
    /// Muted by solo resolution on another track
    solo_muted: bool,
    input_gain: f32,
    output_gain: f32,
    chain: EffectChain,
    channel: ChannelStrip,
    master: Option<MasterInput>,
    processor: Arc<SmartKnobProcessor>,
    factory: EffectFactory,
}

impl InstrumentTrack {
    pub fn new(
        id: TrackId,
        options: TrackOptions,
        master: MasterInput,
        processor: Arc<SmartKnobProcessor>,
        factory: EffectFactory,
    ) -> Self {
        let instrument_type = options.instrument_type;
        let name = options
            .name
            .unwrap_or_else(|| format!("{} Track", processor.display_name(instrument_type)));
        let color = options
            .color
            .unwrap_or_else(|| instrument_type.default_color().to_string());

        let mut track = Self {
            id,
            name,
            instrument_type,
            color,
            smart_knob_value: KNOB_DEFAULT,
            mute: false,
            solo: false,
            solo_muted: false,
            input_gain: 1.0,
            output_gain: 1.0,
            chain: EffectChain::new(),
            channel: ChannelStrip::new(options.volume.unwrap_or(0.0), options.pan.unwrap_or(0.0)),
            master: Some(master),
            processor,
            factory,
        };
        track.rebuild_chain();

        info!("Track created: \"{}\" ({})", track.name, track.instrument_type);
        track
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn instrument_type(&self) -> InstrumentType {
        self.instrument_type
    }

    pub fn volume(&self) -> f32 {
        self.channel.volume_db()
    }

    /// Clamped to -60..=6 dB
    pub fn set_volume(&mut self, db: f32) {
        self.channel.set_volume_db(db);
    }

    pub fn pan(&self) -> f32 {
        self.channel.pan()
    }

    /// Clamped to -1..=1
    pub fn set_pan(&mut self, pan: f32) {
        self.channel.set_pan(pan);
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    /// While another track's solo silences this one the channel stays muted
    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
        if !self.solo_muted {
            self.channel.set_muted(mute);
        }
    }

    pub fn is_soloed(&self) -> bool {
        self.solo
    }

    /// Records the flag only; the engine resolves solo across all tracks
    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    /// Solo-resolution override: `true` silences the track regardless of its
    /// own mute flag, `false` hands control back to it
    pub fn set_effective_mute(&mut self, muted: bool) {
        self.solo_muted = muted;
        self.channel.set_muted(self.mute || muted);
    }

    pub fn is_effectively_muted(&self) -> bool {
        self.mute || self.solo_muted
    }

    pub fn smart_knob_value(&self) -> f32 {
        self.smart_knob_value
    }

    pub(crate) fn record_smart_knob_value(&mut self, value: f32) {
        self.smart_knob_value = value;
    }

    /// Knob label for this track's instrument type
    pub fn smart_knob_name(&self) -> &str {
        self.processor.display_name(self.instrument_type)
    }

    pub fn profile(&self) -> Option<&SmartKnobProfile> {
        self.processor.profile(self.instrument_type)
    }

    /// Switch instrument type: new default color, a chain rebuilt for the new
    /// profile, and the current knob value re-applied to it
    pub fn set_instrument_type(&mut self, instrument_type: InstrumentType) {
        if instrument_type == self.instrument_type {
            return;
        }
        let previous = self.instrument_type;
        self.instrument_type = instrument_type;
        self.color = instrument_type.default_color().to_string();
        self.rebuild_chain();

        let processor = Arc::clone(&self.processor);
        let value = self.smart_knob_value;
        processor.apply_smart_knob(self, value);
        info!("Track \"{}\" instrument changed: {} -> {}", self.name, previous, instrument_type);
    }

    fn rebuild_chain(&mut self) {
        self.chain.clear();
        let Some(profile) = self.processor.profile(self.instrument_type) else {
            debug!("No profile for {}, track {} runs an empty chain", self.instrument_type, self.id);
            return;
        };
        for &effect in &profile.effects {
            self.chain.add(effect, self.factory.create(effect));
        }
        debug!("Effect chain for {}: {:?}", self.id, self.chain.types());
    }

    /// Apply a parameter bundle to one effect, creating it in profile order
    /// if the chain lacks it. Node failures are logged, never returned.
    pub fn update_effect_params(&mut self, effect_type: EffectType, params: &EffectParams) {
        if !self.chain.contains(effect_type) {
            let node = self.factory.create(effect_type);
            let order = self
                .processor
                .profile(self.instrument_type)
                .map(|p| p.effects.clone())
                .unwrap_or_default();
            self.chain.insert_ordered(effect_type, node, &order);
            debug!("Added {} to {}, chain now {:?}", effect_type, self.id, self.chain.types());
        }

        let Some(node) = self.chain.get_mut(effect_type) else {
            return;
        };
        if let Err(e) = node.apply_params(effect_type, params) {
            error!("Failed to update {} on {}: {}", effect_type, self.id, e);
        }
    }

    /// Effect kinds in signal order
    pub fn effect_types(&self) -> Vec<EffectType> {
        self.chain.types()
    }

    /// Live parameters of one effect, if present
    pub fn effect_params(&self, effect_type: EffectType) -> Option<Vec<EffectParam>> {
        self.chain.get(effect_type).map(|node| node.get_params())
    }

    pub fn get_state(&self) -> TrackState {
        TrackState {
            id: self.id,
            name: self.name.clone(),
            instrument_type: self.instrument_type,
            volume: self.volume(),
            pan: self.pan(),
            mute: self.mute,
            solo: self.solo,
            effective_mute: self.is_effectively_muted(),
            smart_knob_value: self.smart_knob_value,
            color: self.color.clone(),
        }
    }

    /// Run one block through the track and sum it into the master input.
    /// The buffers hold the track's output afterwards.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let Some(master) = &self.master else {
            return;
        };

        for s in left.iter_mut().chain(right.iter_mut()) {
            *s *= self.input_gain;
        }
        self.chain.process(left, right);
        for s in left.iter_mut().chain(right.iter_mut()) {
            *s *= self.output_gain;
        }
        self.channel.process(left, right);
        master.add(left, right);
    }

    pub fn is_disposed(&self) -> bool {
        self.master.is_none()
    }

    /// Release the chain and detach from the master bus. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.master.take().is_none() {
            return;
        }
        self.chain.clear();
        self.channel.set_muted(true);
        info!("Track disposed: \"{}\"", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_effects::DEFAULT_SAMPLE_RATE;

    fn track(instrument: InstrumentType) -> InstrumentTrack {
        track_with(TrackOptions::new(instrument))
    }

    fn track_with(options: TrackOptions) -> InstrumentTrack {
        InstrumentTrack::new(
            TrackId(1),
            options,
            MasterInput::new(),
            Arc::new(SmartKnobProcessor::new()),
            EffectFactory::new(DEFAULT_SAMPLE_RATE),
        )
    }

    fn param(track: &InstrumentTrack, effect: EffectType, name: &str) -> Option<f32> {
        track
            .effect_params(effect)?
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }

    #[test]
    fn test_defaults_from_instrument() {
        let t = track(InstrumentType::Kick);
        assert_eq!(t.name(), "PUNCH Track");
        assert_eq!(t.color(), "#E85D4E");
        assert_eq!(t.smart_knob_value(), 50.0);
        assert_eq!(
            t.effect_types(),
            vec![EffectType::TransientShaper, EffectType::LowEq, EffectType::Compression]
        );
    }

    #[test]
    fn test_options_clamped() {
        let t = track_with(TrackOptions::new(InstrumentType::Bass).volume(-90.0).pan(2.0));
        let state = t.get_state();
        assert_eq!(state.volume, -60.0);
        assert_eq!(state.pan, 1.0);
    }

    #[test]
    fn test_mute_respects_solo_override() {
        let mut t = track(InstrumentType::Snare);
        t.set_effective_mute(true);
        t.set_mute(false);
        assert!(t.is_effectively_muted());

        t.set_effective_mute(false);
        assert!(!t.is_effectively_muted());
        t.set_mute(true);
        assert!(t.is_effectively_muted());
    }

    #[test]
    fn test_instrument_change_rebuilds_chain() {
        let mut t = track(InstrumentType::Kick);
        let processor = SmartKnobProcessor::new();
        processor.apply_smart_knob(&mut t, 80.0);

        t.set_instrument_type(InstrumentType::Vocal);
        assert_eq!(t.effect_types(), vec![EffectType::HighShelfEq, EffectType::Deesser]);
        assert_eq!(t.color(), "#9D65D8");
        // knob re-applied: 80% of 0..6 dB
        let gain = param(&t, EffectType::HighShelfEq, "gain").unwrap();
        assert!((gain - 4.8).abs() < 1e-4);
        assert!(t.effect_params(EffectType::LowEq).is_none());
    }

    #[test]
    fn test_late_effect_inserted_in_profile_order() {
        let mut t = track(InstrumentType::Kick);
        t.chain.remove(EffectType::LowEq);
        t.update_effect_params(EffectType::LowEq, &EffectParams::new().with("gain", 3.0));
        assert_eq!(
            t.effect_types(),
            vec![EffectType::TransientShaper, EffectType::LowEq, EffectType::Compression]
        );
        assert_eq!(param(&t, EffectType::LowEq, "low"), Some(3.0));
    }

    #[test]
    fn test_bad_param_is_swallowed() {
        let mut t = track(InstrumentType::Generic);
        t.update_effect_params(EffectType::Compression, &EffectParams::new().with("ratio", 500.0));
        assert_eq!(param(&t, EffectType::Compression, "ratio"), Some(4.0));
    }

    #[test]
    fn test_process_sums_into_master() {
        let master = MasterInput::new();
        let mut t = InstrumentTrack::new(
            TrackId(7),
            TrackOptions::new(InstrumentType::Piano),
            master.clone(),
            Arc::new(SmartKnobProcessor::new()),
            EffectFactory::new(DEFAULT_SAMPLE_RATE),
        );
        master.clear(64);
        let mut l = vec![0.5; 64];
        let mut r = vec![0.5; 64];
        t.process(&mut l, &mut r);
        assert!(l.iter().any(|s| *s != 0.0));

        t.set_mute(true);
        let mut l = vec![0.5; 64];
        let mut r = vec![0.5; 64];
        t.process(&mut l, &mut r);
        assert!(l.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut t = track(InstrumentType::Hihat);
        t.dispose();
        t.dispose();
        assert!(t.is_disposed());
        assert!(t.effect_types().is_empty());
    }
}

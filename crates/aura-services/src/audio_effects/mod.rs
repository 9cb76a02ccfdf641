//! Audio effects chain and built-in effects

mod factory;
mod native;

pub use factory::EffectFactory;
pub use native::{
    CompressorNode, DistortionNode, FeedbackDelayNode, FilterKind, FilterNode, GateNode,
    MultibandCompressorNode, ReverbNode, StereoWidenerNode, ThreeBandEq, DEFAULT_SAMPLE_RATE,
};

use std::fmt::Debug;

use aura_core::{EffectParams, EffectType};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EffectError {
    #[error("{effect} has no parameter '{param}'")]
    UnknownParam { effect: &'static str, param: String },
    #[error("{param} = {value} is outside {min}..={max}")]
    OutOfRange { param: String, value: f32, min: f32, max: f32 },
    #[error("{effect} parameter '{param}' is fixed after construction")]
    ReadOnly { effect: &'static str, param: String },
    #[error("{node} node cannot act as {effect_type}")]
    Mismatch { node: &'static str, effect_type: EffectType },
}

/// Validate a parameter value; non-finite values are out of range
pub(crate) fn check_range(param: &str, value: f32, min: f32, max: f32) -> Result<f32, EffectError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(EffectError::OutOfRange { param: param.to_string(), value, min, max })
    }
}

/// Stereo audio effect that processes samples in-place
pub trait AudioEffect: Send + Debug {
    fn name(&self) -> &str;
    fn process(&mut self, left: &mut [f32], right: &mut [f32]);
    fn set_param(&mut self, name: &str, value: f32) -> Result<(), EffectError>;
    fn get_params(&self) -> Vec<EffectParam>;
    /// Update sample rate for effects that depend on it
    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn param(&self, name: &str) -> Option<f32> {
        self.get_params().into_iter().find(|p| p.name == name).map(|p| p.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectParam {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub unit: String,
}

impl EffectParam {
    pub fn new(name: &str, value: f32, min: f32, max: f32, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            value,
            min,
            max,
            unit: unit.to_string(),
        }
    }
}

/// Live DSP node behind one effect slot
#[derive(Debug)]
pub enum EffectNode {
    Eq3(ThreeBandEq),
    Filter(FilterNode),
    Compressor(CompressorNode),
    MultibandCompressor(MultibandCompressorNode),
    Distortion(DistortionNode),
    Gate(GateNode),
    Reverb(ReverbNode),
    StereoWidener(StereoWidenerNode),
    FeedbackDelay(FeedbackDelayNode),
}

impl EffectNode {
    pub fn effect(&self) -> &dyn AudioEffect {
        match self {
            Self::Eq3(e) => e,
            Self::Filter(e) => e,
            Self::Compressor(e) => e,
            Self::MultibandCompressor(e) => e,
            Self::Distortion(e) => e,
            Self::Gate(e) => e,
            Self::Reverb(e) => e,
            Self::StereoWidener(e) => e,
            Self::FeedbackDelay(e) => e,
        }
    }

    pub fn effect_mut(&mut self) -> &mut dyn AudioEffect {
        match self {
            Self::Eq3(e) => e,
            Self::Filter(e) => e,
            Self::Compressor(e) => e,
            Self::MultibandCompressor(e) => e,
            Self::Distortion(e) => e,
            Self::Gate(e) => e,
            Self::Reverb(e) => e,
            Self::StereoWidener(e) => e,
            Self::FeedbackDelay(e) => e,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Eq3(_) => "Eq3",
            Self::Filter(_) => "Filter",
            Self::Compressor(_) => "Compressor",
            Self::MultibandCompressor(_) => "MultibandCompressor",
            Self::Distortion(_) => "Distortion",
            Self::Gate(_) => "Gate",
            Self::Reverb(_) => "Reverb",
            Self::StereoWidener(_) => "StereoWidener",
            Self::FeedbackDelay(_) => "FeedbackDelay",
        }
    }

    /// Whether this node is the kind the factory builds for `effect_type`
    pub fn serves(&self, effect_type: EffectType) -> bool {
        use EffectType::*;
        match (effect_type, self) {
            (LowEq | HighMidEq, Self::Eq3(_)) => true,
            (HighShelfEq | Exciter, Self::Filter(f)) => f.kind() == FilterKind::Highshelf,
            (HighPassFilter, Self::Filter(f)) => f.kind() == FilterKind::Highpass,
            (Compression | TransientShaper, Self::Compressor(_)) => true,
            (Deesser, Self::MultibandCompressor(_)) => true,
            (Saturation, Self::Distortion(_)) => true,
            (Gate, Self::Gate(_)) => true,
            (Reverb, Self::Reverb(_)) => true,
            (StereoImager, Self::StereoWidener(_)) => true,
            (Delay, Self::FeedbackDelay(_)) => true,
            _ => false,
        }
    }

    /// Apply a Smart Knob bundle. Keys the node has no field for are
    /// skipped; every applicable key is attempted and the first failure is
    /// returned.
    pub fn apply_params(&mut self, effect_type: EffectType, params: &EffectParams) -> Result<(), EffectError> {
        if !self.serves(effect_type) {
            return Err(EffectError::Mismatch { node: self.variant_name(), effect_type });
        }

        let mut result = Ok(());
        for (key, value) in params.iter() {
            let Some(target) = route_param(effect_type, key, value) else {
                continue;
            };
            if let Err(e) = self.effect_mut().set_param(target, value) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.effect_mut().process(left, right);
    }

    pub fn get_params(&self) -> Vec<EffectParam> {
        self.effect().get_params()
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.effect_mut().set_sample_rate(sample_rate);
    }
}

/// Node parameter a Smart Knob key lands on, per effect kind
fn route_param(effect_type: EffectType, key: &str, value: f32) -> Option<&'static str> {
    use EffectType::*;
    match (effect_type, key) {
        (LowEq, "gain") => Some("low"),
        (HighMidEq, "gain") => Some("mid"),
        (HighShelfEq | Exciter, "gain") => Some("gain"),
        // zero means "leave the corner where it is"
        (HighShelfEq | Exciter, "frequency") if value != 0.0 => Some("frequency"),
        (HighPassFilter, "frequency") => Some("frequency"),
        (HighPassFilter, "Q") if value != 0.0 => Some("Q"),
        (Compression | TransientShaper, "threshold") => Some("threshold"),
        (Compression | TransientShaper, "ratio") => Some("ratio"),
        (Compression | TransientShaper, "attack") => Some("attack"),
        (Compression | TransientShaper, "release") => Some("release"),
        (Saturation, "distortion") => Some("distortion"),
        (Saturation, "wet") => Some("wet"),
        (Gate, "threshold") => Some("threshold"),
        (Reverb, "wet") => Some("wet"),
        (StereoImager, "width") => Some("width"),
        (Delay, "delayTime") => Some("delayTime"),
        (Delay, "feedback") => Some("feedback"),
        (Delay, "wet") => Some("wet"),
        (Deesser, "frequency") => Some("frequency"),
        (Deesser, "threshold") => Some("threshold"),
        (Deesser, "ratio") => Some("ratio"),
        _ => None,
    }
}

/// Effects processed in order, keyed by effect kind
#[derive(Debug, Default)]
pub struct EffectChain {
    effects: Vec<(EffectType, EffectNode)>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, replacing any node already in the slot
    pub fn add(&mut self, effect_type: EffectType, node: EffectNode) {
        self.remove(effect_type);
        self.effects.push((effect_type, node));
    }

    /// Insert a node, then reorder the chain so kinds listed in `order` come
    /// first in that order. Kinds not in `order` keep their relative order at
    /// the end.
    pub fn insert_ordered(&mut self, effect_type: EffectType, node: EffectNode, order: &[EffectType]) {
        self.add(effect_type, node);
        self.effects.sort_by_key(|(t, _)| {
            order.iter().position(|o| o == t).unwrap_or(order.len())
        });
    }

    pub fn remove(&mut self, effect_type: EffectType) -> Option<EffectNode> {
        let index = self.effects.iter().position(|(t, _)| *t == effect_type)?;
        Some(self.effects.remove(index).1)
    }

    pub fn get(&self, effect_type: EffectType) -> Option<&EffectNode> {
        self.effects.iter().find(|(t, _)| *t == effect_type).map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, effect_type: EffectType) -> Option<&mut EffectNode> {
        self.effects.iter_mut().find(|(t, _)| *t == effect_type).map(|(_, n)| n)
    }

    pub fn contains(&self, effect_type: EffectType) -> bool {
        self.get(effect_type).is_some()
    }

    /// Effect kinds in signal order
    pub fn types(&self) -> Vec<EffectType> {
        self.effects.iter().map(|(t, _)| *t).collect()
    }

    /// Empty chain passes audio through untouched
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (_, node) in &mut self.effects {
            node.process(left, right);
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for (_, node) in &mut self.effects {
            node.set_sample_rate(sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::calculate_effect_params;

    const SR: f32 = DEFAULT_SAMPLE_RATE;

    #[test]
    fn test_check_range() {
        assert_eq!(check_range("gain", 3.0, -60.0, 24.0), Ok(3.0));
        assert!(check_range("gain", 30.0, -60.0, 24.0).is_err());
        assert!(check_range("gain", f32::INFINITY, -60.0, 24.0).is_err());
    }

    #[test]
    fn test_apply_low_eq_routes_gain_to_low_band() {
        let factory = EffectFactory::new(SR);
        let mut node = factory.create(EffectType::LowEq);
        node.apply_params(EffectType::LowEq, &calculate_effect_params(EffectType::LowEq, 100.0))
            .unwrap();
        assert_eq!(node.effect().param("low"), Some(12.0));
        assert_eq!(node.effect().param("mid"), Some(0.0));
    }

    #[test]
    fn test_apply_reverb_only_touches_wet() {
        let factory = EffectFactory::new(SR);
        let mut node = factory.create(EffectType::Reverb);
        node.apply_params(EffectType::Reverb, &calculate_effect_params(EffectType::Reverb, 100.0))
            .unwrap();
        assert_eq!(node.effect().param("wet"), Some(0.5));
        assert_eq!(node.effect().param("decay"), Some(1.5));
    }

    #[test]
    fn test_apply_gate_ignores_timing_keys() {
        let factory = EffectFactory::new(SR);
        let mut node = factory.create(EffectType::Gate);
        node.apply_params(EffectType::Gate, &calculate_effect_params(EffectType::Gate, 0.0))
            .unwrap();
        assert_eq!(node.effect().param("threshold"), Some(-100.0));
    }

    #[test]
    fn test_apply_rejects_wrong_node() {
        let factory = EffectFactory::new(SR);
        let mut node = factory.create(EffectType::Gate);
        let params = calculate_effect_params(EffectType::Reverb, 50.0);
        assert!(matches!(
            node.apply_params(EffectType::Reverb, &params),
            Err(EffectError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_every_effect_type_accepts_its_own_bundle() {
        let factory = EffectFactory::new(SR);
        for effect in EffectType::ALL {
            let mut node = factory.create(effect);
            assert!(node.serves(effect), "{effect}");
            for value in [0.0, 50.0, 100.0] {
                let params = calculate_effect_params(effect, value);
                assert_eq!(node.apply_params(effect, &params), Ok(()), "{effect} at {value}");
            }
        }
    }

    #[test]
    fn test_chain_insert_ordered() {
        let factory = EffectFactory::new(SR);
        let order = [EffectType::TransientShaper, EffectType::LowEq, EffectType::Compression];
        let mut chain = EffectChain::new();
        chain.add(EffectType::Reverb, factory.create(EffectType::Reverb));
        chain.insert_ordered(EffectType::Compression, factory.create(EffectType::Compression), &order);
        chain.insert_ordered(EffectType::TransientShaper, factory.create(EffectType::TransientShaper), &order);
        assert_eq!(
            chain.types(),
            vec![EffectType::TransientShaper, EffectType::Compression, EffectType::Reverb]
        );
        assert!(chain.remove(EffectType::Reverb).is_some());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_empty_chain_is_passthrough() {
        let mut chain = EffectChain::new();
        let mut l = vec![0.1, 0.2];
        let mut r = vec![-0.1, 0.4];
        chain.process(&mut l, &mut r);
        assert_eq!(l, vec![0.1, 0.2]);
        assert_eq!(r, vec![-0.1, 0.4]);
    }
}

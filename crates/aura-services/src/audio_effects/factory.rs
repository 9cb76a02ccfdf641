//! Builds default-state effect nodes for each effect kind

use aura_core::EffectType;
use tracing::warn;

use super::{
    CompressorNode, DistortionNode, EffectNode, FeedbackDelayNode, FilterNode, GateNode,
    MultibandCompressorNode, ReverbNode, StereoWidenerNode, ThreeBandEq,
};

/// Creates effect nodes at a fixed sample rate.
///
/// Some kinds are approximations built from a more general node: the exciter
/// is a high shelf, the transient shaper a fast-attack compressor, and the
/// de-esser a compressor working on the band above its crossover.
#[derive(Debug, Clone, Copy)]
pub struct EffectFactory {
    sample_rate: f32,
}

impl EffectFactory {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn create(&self, effect_type: EffectType) -> EffectNode {
        let sr = self.sample_rate;
        match effect_type {
            EffectType::LowEq | EffectType::HighMidEq => EffectNode::Eq3(ThreeBandEq::new(sr)),
            EffectType::HighShelfEq => EffectNode::Filter(FilterNode::highshelf(10000.0, 0.0, sr)),
            EffectType::Exciter => EffectNode::Filter(FilterNode::highshelf(4000.0, 0.0, sr)),
            EffectType::HighPassFilter => EffectNode::Filter(FilterNode::highpass(80.0, 0.7, sr)),
            EffectType::Compression => {
                EffectNode::Compressor(CompressorNode::new(-24.0, 4.0, 0.01, 0.1, sr))
            }
            EffectType::TransientShaper => {
                EffectNode::Compressor(CompressorNode::new(-20.0, 2.0, 0.001, 0.05, sr))
            }
            EffectType::Deesser => {
                EffectNode::MultibandCompressor(MultibandCompressorNode::new(2500.0, -24.0, 4.0, sr))
            }
            EffectType::Saturation => EffectNode::Distortion(DistortionNode::new(0.0, 0.0)),
            EffectType::Gate => EffectNode::Gate(GateNode::new(-100.0, sr)),
            EffectType::Reverb => EffectNode::Reverb(ReverbNode::new(1.5, 0.01, 0.0, sr)),
            EffectType::StereoImager => EffectNode::StereoWidener(StereoWidenerNode::new(1.0)),
            EffectType::Delay => EffectNode::FeedbackDelay(FeedbackDelayNode::new(0.25, 0.2, 0.0, sr)),
        }
    }

    /// Create from a wire name such as `"highShelfEQ"`; unknown names warn and yield `None`
    pub fn create_by_name(&self, name: &str) -> Option<EffectNode> {
        match name.parse::<EffectType>() {
            Ok(effect_type) => Some(self.create(effect_type)),
            Err(e) => {
                warn!("Cannot create effect: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approximations_use_general_nodes() {
        let factory = EffectFactory::new(48000.0);
        assert!(matches!(factory.create(EffectType::Exciter), EffectNode::Filter(_)));
        assert!(matches!(factory.create(EffectType::TransientShaper), EffectNode::Compressor(_)));
        assert!(matches!(
            factory.create(EffectType::Deesser),
            EffectNode::MultibandCompressor(_)
        ));
    }

    #[test]
    fn test_defaults() {
        let factory = EffectFactory::new(48000.0);
        let hp = factory.create(EffectType::HighPassFilter);
        assert_eq!(hp.effect().param("frequency"), Some(80.0));
        assert_eq!(hp.effect().param("Q"), Some(0.7));

        let comp = factory.create(EffectType::Compression);
        assert_eq!(comp.effect().param("threshold"), Some(-24.0));
        assert_eq!(comp.effect().param("ratio"), Some(4.0));

        let widener = factory.create(EffectType::StereoImager);
        assert_eq!(widener.effect().param("width"), Some(1.0));
    }

    #[test]
    fn test_create_by_name() {
        let factory = EffectFactory::new(44100.0);
        assert!(matches!(factory.create_by_name("reverb"), Some(EffectNode::Reverb(_))));
        assert!(factory.create_by_name("flanger").is_none());
    }
}

//! Smart Knob parameter mapping
//!
//! One 0-100 control value is turned into a parameter bundle for each effect
//! kind. The functions here are pure; applying bundles to live nodes happens
//! in the services layer.

use crate::effect::{EffectParams, EffectType};

pub const KNOB_MIN: f32 = 0.0;
pub const KNOB_MAX: f32 = 100.0;
pub const KNOB_DEFAULT: f32 = 50.0;

/// Linear range mapping. Not clamped: inputs outside `in_min..in_max` extrapolate.
pub fn lerp(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
}

/// Clamp a knob value into 0..=100. NaN maps to the minimum.
pub fn clamp_knob(value: f32) -> f32 {
    if value.is_nan() {
        return KNOB_MIN;
    }
    value.clamp(KNOB_MIN, KNOB_MAX)
}

fn knob(value: f32, out_min: f32, out_max: f32) -> f32 {
    lerp(value, KNOB_MIN, KNOB_MAX, out_min, out_max)
}

/// Parameter bundle for `effect` at knob position `value`
pub fn calculate_effect_params(effect: EffectType, value: f32) -> EffectParams {
    let params = EffectParams::new();
    match effect {
        EffectType::TransientShaper => params
            .with("attack", knob(value, 0.0, 1.0))
            .with("release", knob(value, 0.1, 0.5)),
        EffectType::LowEq => params
            .with("frequency", 60.0)
            .with("gain", knob(value, 0.0, 12.0))
            .with("Q", 1.5),
        EffectType::HighMidEq => params
            .with("frequency", 3000.0)
            .with("gain", knob(value, 0.0, 8.0))
            .with("Q", 1.2),
        EffectType::HighShelfEq => params
            .with("frequency", 10000.0)
            .with("gain", knob(value, 0.0, 6.0)),
        EffectType::HighPassFilter => params
            .with("frequency", knob(value, 80.0, 400.0))
            .with("Q", 0.7),
        EffectType::Compression => params
            .with("threshold", knob(value, 0.0, -30.0))
            .with("ratio", knob(value, 1.0, 8.0))
            .with("attack", 0.01)
            .with("release", 0.1),
        EffectType::Saturation => params
            .with("distortion", knob(value, 0.0, 0.8))
            .with("wet", knob(value, 0.0, 0.6)),
        EffectType::Gate => params
            .with("threshold", knob(value, -100.0, -30.0))
            .with("attack", 0.001)
            .with("release", 0.1),
        EffectType::Exciter => params
            .with("frequency", 4000.0)
            .with("gain", knob(value, 0.0, 8.0)),
        EffectType::StereoImager => params.with("width", knob(value, 0.5, 1.5)),
        EffectType::Reverb => params
            .with("decay", knob(value, 0.5, 4.0))
            .with("wet", knob(value, 0.0, 0.5))
            .with("preDelay", 0.01),
        EffectType::Delay => params
            .with("delayTime", knob(value, 0.1, 0.5))
            .with("feedback", knob(value, 0.0, 0.4))
            .with("wet", knob(value, 0.0, 0.3)),
        EffectType::Deesser => params
            .with("frequency", 6000.0)
            .with("threshold", knob(value, 0.0, -20.0))
            .with("ratio", 4.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_lerp() {
        assert!(approx(lerp(50.0, 0.0, 100.0, 0.0, 12.0), 6.0));
        assert!(approx(lerp(0.0, 0.0, 100.0, -100.0, -30.0), -100.0));
        assert!(approx(lerp(100.0, 0.0, 100.0, 0.0, -30.0), -30.0));
    }

    #[test]
    fn test_clamp_knob() {
        assert_eq!(clamp_knob(-5.0), 0.0);
        assert_eq!(clamp_knob(150.0), 100.0);
        assert_eq!(clamp_knob(42.5), 42.5);
        assert_eq!(clamp_knob(f32::NAN), 0.0);
    }

    #[test]
    fn test_kick_chain_at_full_knob() {
        let low = calculate_effect_params(EffectType::LowEq, 100.0);
        assert!(approx(low.get("gain").unwrap(), 12.0));
        assert!(approx(low.get("frequency").unwrap(), 60.0));
        assert!(approx(low.get("Q").unwrap(), 1.5));

        let comp = calculate_effect_params(EffectType::Compression, 100.0);
        assert!(approx(comp.get("threshold").unwrap(), -30.0));
        assert!(approx(comp.get("ratio").unwrap(), 8.0));
        assert!(approx(comp.get("attack").unwrap(), 0.01));
    }

    #[test]
    fn test_knob_endpoints() {
        // (effect, param, value at 0, value at 100)
        let cases = [
            (EffectType::TransientShaper, "attack", 0.0, 1.0),
            (EffectType::TransientShaper, "release", 0.1, 0.5),
            (EffectType::HighMidEq, "gain", 0.0, 8.0),
            (EffectType::HighShelfEq, "gain", 0.0, 6.0),
            (EffectType::HighPassFilter, "frequency", 80.0, 400.0),
            (EffectType::Saturation, "distortion", 0.0, 0.8),
            (EffectType::Saturation, "wet", 0.0, 0.6),
            (EffectType::Gate, "threshold", -100.0, -30.0),
            (EffectType::Exciter, "gain", 0.0, 8.0),
            (EffectType::StereoImager, "width", 0.5, 1.5),
            (EffectType::Reverb, "decay", 0.5, 4.0),
            (EffectType::Reverb, "wet", 0.0, 0.5),
            (EffectType::Delay, "delayTime", 0.1, 0.5),
            (EffectType::Delay, "feedback", 0.0, 0.4),
            (EffectType::Delay, "wet", 0.0, 0.3),
            (EffectType::Deesser, "threshold", 0.0, -20.0),
        ];
        for (effect, param, at_min, at_max) in cases {
            let lo = calculate_effect_params(effect, 0.0).get(param).unwrap();
            let hi = calculate_effect_params(effect, 100.0).get(param).unwrap();
            assert!(approx(lo, at_min), "{effect}.{param} at 0: {lo}");
            assert!(approx(hi, at_max), "{effect}.{param} at 100: {hi}");
        }
    }

    #[test]
    fn test_fixed_params_do_not_move() {
        for value in [0.0, 37.0, 100.0] {
            let deesser = calculate_effect_params(EffectType::Deesser, value);
            assert_eq!(deesser.get("frequency"), Some(6000.0));
            assert_eq!(deesser.get("ratio"), Some(4.0));
            let reverb = calculate_effect_params(EffectType::Reverb, value);
            assert_eq!(reverb.get("preDelay"), Some(0.01));
        }
    }
}

//! Smart Knob profiles: which effects a knob drives, per instrument type

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effect::EffectType;
use crate::instrument::InstrumentType;

/// Display label used when an instrument type has no profile
pub const FALLBACK_DISPLAY_NAME: &str = "TONE";

/// Knob label plus the ordered effect chain it controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartKnobProfile {
    pub display_name: String,
    /// Effects in signal order
    pub effects: Vec<EffectType>,
    #[serde(default)]
    pub description: String,
}

impl SmartKnobProfile {
    pub fn new(display_name: impl Into<String>, effects: Vec<EffectType>, description: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            effects,
            description: description.into(),
        }
    }

    /// Position of an effect in the chain, if the profile includes it
    pub fn position_of(&self, effect: EffectType) -> Option<usize> {
        self.effects.iter().position(|e| *e == effect)
    }
}

/// Lookup table from instrument type to profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileTable {
    profiles: BTreeMap<InstrumentType, SmartKnobProfile>,
}

impl ProfileTable {
    /// Table with no profiles at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The stock profile set
    pub fn builtin() -> Self {
        use EffectType::*;

        let mut table = Self::empty();
        table.insert(
            InstrumentType::Kick,
            SmartKnobProfile::new("PUNCH", vec![TransientShaper, LowEq, Compression], "Kick drum punch and weight"),
        );
        table.insert(
            InstrumentType::Snare,
            SmartKnobProfile::new("CRACK", vec![HighMidEq, Saturation, Gate], "Snare crack and snap"),
        );
        table.insert(
            InstrumentType::Hihat,
            SmartKnobProfile::new("CRISP", vec![HighPassFilter, Exciter], "Hi-hat clarity"),
        );
        table.insert(
            InstrumentType::Bass,
            SmartKnobProfile::new("GRIT", vec![Saturation, HighMidEq], "Bass grit and growl"),
        );
        table.insert(
            InstrumentType::Piano,
            SmartKnobProfile::new("SPACE", vec![StereoImager, Reverb], "Piano width and room"),
        );
        table.insert(
            InstrumentType::Vocal,
            SmartKnobProfile::new("AIR", vec![HighShelfEq, Deesser], "Vocal air and clarity"),
        );
        table.insert(
            InstrumentType::Synth,
            SmartKnobProfile::new("SHINE", vec![Exciter, HighShelfEq], "Synth brightness"),
        );
        table.insert(
            InstrumentType::Generic,
            SmartKnobProfile::new("TONE", vec![HighMidEq, Compression], "General tone shaping"),
        );
        table
    }

    pub fn get(&self, instrument: InstrumentType) -> Option<&SmartKnobProfile> {
        self.profiles.get(&instrument)
    }

    pub fn insert(&mut self, instrument: InstrumentType, profile: SmartKnobProfile) -> Option<SmartKnobProfile> {
        self.profiles.insert(instrument, profile)
    }

    pub fn remove(&mut self, instrument: InstrumentType) -> Option<SmartKnobProfile> {
        self.profiles.remove(&instrument)
    }

    /// Display label for an instrument type, falling back to [`FALLBACK_DISPLAY_NAME`]
    pub fn display_name(&self, instrument: InstrumentType) -> &str {
        self.get(instrument)
            .map(|p| p.display_name.as_str())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentType, &SmartKnobProfile)> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_instrument() {
        let table = ProfileTable::builtin();
        for instrument in InstrumentType::ALL {
            assert!(table.get(instrument).is_some(), "missing profile for {instrument}");
        }
    }

    #[test]
    fn test_kick_profile_order() {
        let table = ProfileTable::builtin();
        let kick = table.get(InstrumentType::Kick).unwrap();
        assert_eq!(kick.display_name, "PUNCH");
        assert_eq!(
            kick.effects,
            vec![EffectType::TransientShaper, EffectType::LowEq, EffectType::Compression]
        );
        assert_eq!(kick.position_of(EffectType::Compression), Some(2));
        assert_eq!(kick.position_of(EffectType::Reverb), None);
    }

    #[test]
    fn test_display_name_fallback() {
        let mut table = ProfileTable::builtin();
        table.remove(InstrumentType::Vocal);
        assert_eq!(table.display_name(InstrumentType::Vocal), FALLBACK_DISPLAY_NAME);
        assert_eq!(table.display_name(InstrumentType::Piano), "SPACE");
    }
}

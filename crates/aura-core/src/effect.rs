//! Effect kinds driven by the Smart Knob

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuraError;

/// DSP stage kind that can appear in a track's effect chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectType {
    #[serde(rename = "transientShaper")]
    TransientShaper,
    #[serde(rename = "lowEQ")]
    LowEq,
    #[serde(rename = "highMidEQ")]
    HighMidEq,
    #[serde(rename = "highShelfEQ")]
    HighShelfEq,
    #[serde(rename = "highPassFilter")]
    HighPassFilter,
    #[serde(rename = "compression")]
    Compression,
    #[serde(rename = "saturation")]
    Saturation,
    #[serde(rename = "gate")]
    Gate,
    #[serde(rename = "exciter")]
    Exciter,
    #[serde(rename = "stereoImager")]
    StereoImager,
    #[serde(rename = "reverb")]
    Reverb,
    #[serde(rename = "delay")]
    Delay,
    #[serde(rename = "deesser")]
    Deesser,
}

impl EffectType {
    pub const ALL: [EffectType; 13] = [
        Self::TransientShaper,
        Self::LowEq,
        Self::HighMidEq,
        Self::HighShelfEq,
        Self::HighPassFilter,
        Self::Compression,
        Self::Saturation,
        Self::Gate,
        Self::Exciter,
        Self::StereoImager,
        Self::Reverb,
        Self::Delay,
        Self::Deesser,
    ];

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientShaper => "transientShaper",
            Self::LowEq => "lowEQ",
            Self::HighMidEq => "highMidEQ",
            Self::HighShelfEq => "highShelfEQ",
            Self::HighPassFilter => "highPassFilter",
            Self::Compression => "compression",
            Self::Saturation => "saturation",
            Self::Gate => "gate",
            Self::Exciter => "exciter",
            Self::StereoImager => "stereoImager",
            Self::Reverb => "reverb",
            Self::Delay => "delay",
            Self::Deesser => "deesser",
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectType {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AuraError::UnknownEffectType(s.to_string()))
    }
}

/// Named numeric parameters for one effect, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectParams {
    values: Vec<(&'static str, f32)>,
}

impl EffectParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing entry with the same name
    pub fn with(mut self, name: &'static str, value: f32) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &'static str, value: f32) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

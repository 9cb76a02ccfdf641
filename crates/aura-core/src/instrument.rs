//! Instrument classification for tracks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuraError;

/// Instrument type of a track. Selects the default color and the Smart Knob profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Kick,
    Snare,
    Hihat,
    Bass,
    Piano,
    Vocal,
    Synth,
    #[default]
    Generic,
}

impl InstrumentType {
    pub const ALL: [InstrumentType; 8] = [
        Self::Kick,
        Self::Snare,
        Self::Hihat,
        Self::Bass,
        Self::Piano,
        Self::Vocal,
        Self::Synth,
        Self::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Snare => "snare",
            Self::Hihat => "hihat",
            Self::Bass => "bass",
            Self::Piano => "piano",
            Self::Vocal => "vocal",
            Self::Synth => "synth",
            Self::Generic => "generic",
        }
    }

    /// Default track color as a `#RRGGBB` hex string
    pub fn default_color(&self) -> &'static str {
        match self {
            Self::Kick => "#E85D4E",
            Self::Snare => "#FFB347",
            Self::Hihat => "#87CEEB",
            Self::Bass => "#4FD272",
            Self::Piano => "#5DADE2",
            Self::Vocal => "#9D65D8",
            Self::Synth => "#FF69B4",
            Self::Generic => "#808590",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentType {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AuraError::UnknownInstrumentType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instrument_type() {
        assert_eq!("kick".parse::<InstrumentType>(), Ok(InstrumentType::Kick));
        assert_eq!(" Vocal ".parse::<InstrumentType>(), Ok(InstrumentType::Vocal));
        assert!("tuba".parse::<InstrumentType>().is_err());
    }

    #[test]
    fn test_default_is_generic() {
        assert_eq!(InstrumentType::default(), InstrumentType::Generic);
        assert_eq!(InstrumentType::Generic.default_color(), "#808590");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&InstrumentType::Hihat).unwrap();
        assert_eq!(json, "\"hihat\"");
    }
}

//! Track identity and creation options

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentType;

/// Unique identifier for tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Volume range of a channel strip or the master bus, in dB
pub const VOLUME_MIN_DB: f32 = -60.0;
pub const VOLUME_MAX_DB: f32 = 6.0;

pub fn clamp_volume_db(db: f32) -> f32 {
    if db.is_nan() {
        return VOLUME_MIN_DB;
    }
    db.clamp(VOLUME_MIN_DB, VOLUME_MAX_DB)
}

pub fn clamp_pan(pan: f32) -> f32 {
    if pan.is_nan() {
        return 0.0;
    }
    pan.clamp(-1.0, 1.0)
}

/// Options for creating a track; unset fields take instrument defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackOptions {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instrument_type: InstrumentType,
    #[serde(default)]
    pub volume: Option<f32>,
    #[serde(default)]
    pub pan: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TrackOptions {
    pub fn new(instrument_type: InstrumentType) -> Self {
        Self {
            instrument_type,
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn volume(mut self, db: f32) -> Self {
        self.volume = Some(db);
        self
    }

    pub fn pan(mut self, pan: f32) -> Self {
        self.pan = Some(pan);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_volume_db(-100.0), -60.0);
        assert_eq!(clamp_volume_db(12.0), 6.0);
        assert_eq!(clamp_volume_db(-6.0), -6.0);
        assert_eq!(clamp_pan(1.5), 1.0);
        assert_eq!(clamp_pan(-0.3), -0.3);
        assert_eq!(clamp_pan(f32::NAN), 0.0);
    }

    #[test]
    fn test_options_builder() {
        let opts = TrackOptions::new(InstrumentType::Kick).volume(-6.0).pan(0.3);
        assert_eq!(opts.instrument_type, InstrumentType::Kick);
        assert_eq!(opts.volume, Some(-6.0));
        assert_eq!(opts.pan, Some(0.3));
        assert_eq!(opts.name, None);
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aura_core::{
    AudioEngineOptions, EffectType, InstrumentType, ProfileTable, SmartKnobProfile, TimeSignature,
    TrackOptions, FALLBACK_DISPLAY_NAME,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bpm: f64,
    pub time_signature: [u8; 2],
    pub master_volume: f32,
    pub sample_rate: u32,
    pub block_size: usize,
    pub render_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bpm: aura_core::DEFAULT_BPM,
            time_signature: [4, 4],
            master_volume: 0.0,
            sample_rate: 44100,
            block_size: 512,
            render_seconds: 2.0,
        }
    }
}

/// Sample rates an audio context accepts
const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 3000..=768_000;

impl EngineConfig {
    /// Replace values the engine cannot run with, warning for each
    pub fn sanitize(&mut self) {
        if !SAMPLE_RATE_RANGE.contains(&self.sample_rate) {
            let default = Self::default().sample_rate;
            warn!("Sample rate {} out of range, using {}", self.sample_rate, default);
            self.sample_rate = default;
        }
    }

    pub fn options(&self) -> AudioEngineOptions {
        let [numerator, denominator] = self.time_signature;
        AudioEngineOptions {
            bpm: self.bpm,
            time_signature: TimeSignature::new(numerator, denominator),
            master_volume: self.master_volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub instrument_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_knob: Option<f32>,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub solo: bool,
}

impl TrackConfig {
    /// Unknown or empty instrument names fall back to generic
    pub fn options(&self) -> TrackOptions {
        let instrument_type = if self.instrument_type.is_empty() {
            InstrumentType::default()
        } else {
            self.instrument_type.parse().unwrap_or_else(|e| {
                warn!("{}, using generic", e);
                InstrumentType::default()
            })
        };
        TrackOptions {
            name: self.name.clone(),
            instrument_type,
            volume: self.volume,
            pan: self.pan,
            color: self.color.clone(),
        }
    }
}

/// Partial profile; unset fields keep the built-in value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AppConfig {
    /// Built-in profiles with the configured overrides merged on top
    pub fn profile_table(&self) -> ProfileTable {
        let mut table = ProfileTable::builtin();
        for (name, patch) in &self.profiles {
            let instrument: InstrumentType = match name.parse() {
                Ok(instrument) => instrument,
                Err(e) => {
                    warn!("Skipping profile override: {}", e);
                    continue;
                }
            };

            let mut profile = table
                .get(instrument)
                .cloned()
                .unwrap_or_else(|| SmartKnobProfile::new(FALLBACK_DISPLAY_NAME, Vec::new(), ""));
            if let Some(display_name) = &patch.display_name {
                profile.display_name = display_name.clone();
            }
            if let Some(description) = &patch.description {
                profile.description = description.clone();
            }
            if let Some(effects) = &patch.effects {
                profile.effects = effects
                    .iter()
                    .filter_map(|e| match e.parse::<EffectType>() {
                        Ok(effect) => Some(effect),
                        Err(err) => {
                            warn!("Profile {}: {}", name, err);
                            None
                        }
                    })
                    .collect();
            }
            table.insert(instrument, profile);
        }
        table
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aura")
        .join("config.toml")
}

/// Missing or unparsable files yield the defaults
pub fn load_config(path: &Path) -> AppConfig {
    let Ok(text) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    let mut config: AppConfig = toml::from_str(&text).unwrap_or_else(|e| {
        warn!("Ignoring invalid config {}: {}", path.display(), e);
        AppConfig::default()
    });
    config.engine.sanitize();
    config
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [engine]
        bpm = 96
        time_signature = [3, 4]

        [[tracks]]
        instrument_type = "kick"
        volume = -6.0
        smart_knob = 80.0

        [[tracks]]
        name = "Lead"
        instrument_type = "theremin"
        solo = true

        [profiles.vocal]
        display_name = "SHEEN"
        effects = ["highShelfEQ", "chorus", "reverb"]

        [profiles.tuba]
        display_name = "BRASS"
    "#;

    #[test]
    fn test_parse_sample() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.engine.bpm, 96.0);
        assert_eq!(config.engine.sample_rate, 44100);
        assert_eq!(config.engine.options().time_signature, TimeSignature::new(3, 4));
        assert_eq!(config.tracks.len(), 2);

        let kick = config.tracks[0].options();
        assert_eq!(kick.instrument_type, InstrumentType::Kick);
        assert_eq!(kick.volume, Some(-6.0));
        assert_eq!(config.tracks[1].options().instrument_type, InstrumentType::Generic);
        assert!(config.tracks[1].solo);
    }

    #[test]
    fn test_profile_overrides_merge() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let table = config.profile_table();
        let vocal = table.get(InstrumentType::Vocal).unwrap();
        assert_eq!(vocal.display_name, "SHEEN");
        assert_eq!(vocal.effects, vec![EffectType::HighShelfEq, EffectType::Reverb]);
        assert_eq!(vocal.description, "Vocal air and clarity");
        assert_eq!(table.display_name(InstrumentType::Kick), "PUNCH");
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_defaults_round_trip() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_zero_sample_rate_falls_back() {
        let mut config: AppConfig = toml::from_str("[engine]\nsample_rate = 0").unwrap();
        config.engine.sanitize();
        assert_eq!(config.engine.sample_rate, 44100);

        let mut config: AppConfig = toml::from_str("[engine]\nsample_rate = 48000").unwrap();
        config.engine.sanitize();
        assert_eq!(config.engine.sample_rate, 48000);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/aura/config.toml"));
        assert_eq!(config, AppConfig::default());
    }
}

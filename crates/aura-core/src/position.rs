//! Musical time: time signatures and Bar:Beat:Sixteenth positions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuraError;

/// Time signature as (beats per bar, beat unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { numerator: 4, denominator: 4 }
    }
}

impl TimeSignature {
    /// Zero components are bumped to 1
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator: numerator.max(1),
            denominator: denominator.max(1),
        }
    }

    /// Bar length measured in quarter notes
    pub fn quarters_per_bar(&self) -> f64 {
        self.numerator.max(1) as f64 * 4.0 / self.denominator.max(1) as f64
    }
}

impl From<(u8, u8)> for TimeSignature {
    fn from((numerator, denominator): (u8, u8)) -> Self {
        Self::new(numerator, denominator)
    }
}

/// Position written as `bars:quarters:sixteenths`, all zero-based
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BarsBeatsSixteenths {
    pub bars: f64,
    pub quarters: f64,
    pub sixteenths: f64,
}

impl BarsBeatsSixteenths {
    pub fn new(bars: f64, quarters: f64, sixteenths: f64) -> Self {
        Self { bars, quarters, sixteenths }
    }

    /// Normalise a quarter-note count into bars/quarters/sixteenths
    pub fn from_quarters(quarters: f64, time_signature: TimeSignature) -> Self {
        let quarters = quarters.max(0.0);
        let per_bar = time_signature.quarters_per_bar();
        let bars = (quarters / per_bar).floor();
        let remainder = quarters - bars * per_bar;
        let whole = remainder.floor();
        Self {
            bars,
            quarters: whole,
            sixteenths: (remainder - whole) * 4.0,
        }
    }

    pub fn to_quarters(&self, time_signature: TimeSignature) -> f64 {
        self.bars * time_signature.quarters_per_bar() + self.quarters + self.sixteenths / 4.0
    }
}

fn format_component(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{rounded:.3}");
        s.trim_end_matches('0').to_string()
    }
}

impl fmt::Display for BarsBeatsSixteenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            format_component(self.bars),
            format_component(self.quarters),
            format_component(self.sixteenths)
        )
    }
}

impl FromStr for BarsBeatsSixteenths {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AuraError::InvalidPosition(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }

        let mut values = [0.0f64; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let value: f64 = part.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            *slot = value;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }
}

/// A transport position in either absolute or musical time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Seconds(f64),
    Musical(BarsBeatsSixteenths),
}

impl Position {
    pub fn zero() -> Self {
        Self::Seconds(0.0)
    }

    /// Quarter-note count at the given tempo and meter
    pub fn to_quarters(&self, bpm: f64, time_signature: TimeSignature) -> f64 {
        match self {
            Self::Seconds(secs) => secs.max(0.0) * bpm / 60.0,
            Self::Musical(bbs) => bbs.to_quarters(time_signature),
        }
    }
}

impl From<f64> for Position {
    fn from(secs: f64) -> Self {
        Self::Seconds(secs)
    }
}

impl From<BarsBeatsSixteenths> for Position {
    fn from(bbs: BarsBeatsSixteenths) -> Self {
        Self::Musical(bbs)
    }
}

impl FromStr for Position {
    type Err = AuraError;

    /// `"1:2:0"` parses as musical time, `"3.5"` as seconds
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            return s.parse().map(Self::Musical);
        }
        match s.trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(Self::Seconds(secs)),
            _ => Err(AuraError::InvalidPosition(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarters_per_bar() {
        assert_eq!(TimeSignature::default().quarters_per_bar(), 4.0);
        assert_eq!(TimeSignature::new(6, 8).quarters_per_bar(), 3.0);
        assert_eq!(TimeSignature::new(3, 4).quarters_per_bar(), 3.0);
        assert_eq!(TimeSignature::new(0, 0), TimeSignature::new(1, 1));
    }

    #[test]
    fn test_bbs_format() {
        let ts = TimeSignature::default();
        assert_eq!(BarsBeatsSixteenths::from_quarters(0.0, ts).to_string(), "0:0:0");
        assert_eq!(BarsBeatsSixteenths::from_quarters(5.0, ts).to_string(), "1:1:0");
        assert_eq!(BarsBeatsSixteenths::from_quarters(4.625, ts).to_string(), "1:0:2.5");
    }

    #[test]
    fn test_bbs_parse() {
        let ts = TimeSignature::default();
        let bbs: BarsBeatsSixteenths = "2:1:2".parse().unwrap();
        assert_eq!(bbs.to_quarters(ts), 9.5);
        let short: BarsBeatsSixteenths = "4".parse().unwrap();
        assert_eq!(short.to_quarters(ts), 16.0);
        assert!("1:x:0".parse::<BarsBeatsSixteenths>().is_err());
        assert!("1:2:3:4".parse::<BarsBeatsSixteenths>().is_err());
        assert!("-1:0:0".parse::<BarsBeatsSixteenths>().is_err());
    }

    #[test]
    fn test_position_parse() {
        let ts = TimeSignature::default();
        assert_eq!("1.5".parse::<Position>(), Ok(Position::Seconds(1.5)));
        let musical: Position = "1:0:0".parse().unwrap();
        assert_eq!(musical.to_quarters(120.0, ts), 4.0);
        // 1.5s at 120bpm is three quarters
        assert_eq!(Position::Seconds(1.5).to_quarters(120.0, ts), 3.0);
        assert!("soon".parse::<Position>().is_err());
    }
}

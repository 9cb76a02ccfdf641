//! Channel strip: volume, stereo pan and mute ahead of the master bus

use std::f32::consts::FRAC_PI_2;

use aura_core::{clamp_pan, clamp_volume_db};
use fundsp::hacker::db_amp;

/// Per-track output stage. Volume is stored in dB, pan in -1..=1.
#[derive(Debug, Clone)]
pub struct ChannelStrip {
    volume_db: f32,
    pan: f32,
    muted: bool,
}

impl Default for ChannelStrip {
    fn default() -> Self {
        Self { volume_db: 0.0, pan: 0.0, muted: false }
    }
}

impl ChannelStrip {
    pub fn new(volume_db: f32, pan: f32) -> Self {
        Self {
            volume_db: clamp_volume_db(volume_db),
            pan: clamp_pan(pan),
            muted: false,
        }
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db
    }

    /// Clamped to -60..=6 dB
    pub fn set_volume_db(&mut self, db: f32) {
        self.volume_db = clamp_volume_db(db);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = clamp_pan(pan);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Left/right gains of the equal-power pan law at `pan`
    fn pan_gains(pan: f32) -> (f32, f32) {
        let x = if pan <= 0.0 { pan + 1.0 } else { pan };
        let angle = x * FRAC_PI_2;
        (angle.cos(), angle.sin())
    }

    pub fn process(&self, left: &mut [f32], right: &mut [f32]) {
        if self.muted {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        let gain = db_amp(self.volume_db);
        let (gain_l, gain_r) = Self::pan_gains(self.pan);
        let pan_left = self.pan <= 0.0;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (in_l, in_r) = (*l * gain, *r * gain);
            // Stereo panner: the side moved away from folds into the other
            if pan_left {
                *l = in_l + in_r * gain_l;
                *r = in_r * gain_r;
            } else {
                *l = in_l * gain_l;
                *r = in_r + in_l * gain_r;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_center_is_transparent() {
        let strip = ChannelStrip::new(0.0, 0.0);
        let mut l = vec![0.5, -0.25];
        let mut r = vec![0.1, 0.3];
        strip.process(&mut l, &mut r);
        assert!(approx(l[0], 0.5) && approx(l[1], -0.25));
        assert!(approx(r[0], 0.1) && approx(r[1], 0.3));
    }

    #[test]
    fn test_hard_left_moves_everything_left() {
        let strip = ChannelStrip::new(0.0, -1.0);
        let mut l = vec![0.5];
        let mut r = vec![0.5];
        strip.process(&mut l, &mut r);
        assert!(approx(l[0], 1.0));
        assert!(approx(r[0], 0.0));
    }

    #[test]
    fn test_mute_and_volume() {
        let mut strip = ChannelStrip::new(-6.0, 0.0);
        let mut l = vec![1.0];
        let mut r = vec![1.0];
        strip.process(&mut l, &mut r);
        assert!(approx(l[0], db_amp(-6.0f32)));

        strip.set_muted(true);
        strip.process(&mut l, &mut r);
        assert_eq!((l[0], r[0]), (0.0, 0.0));
    }

    #[test]
    fn test_setters_clamp() {
        let mut strip = ChannelStrip::default();
        strip.set_volume_db(20.0);
        strip.set_pan(-3.0);
        assert_eq!(strip.volume_db(), 6.0);
        assert_eq!(strip.pan(), -1.0);
    }
}

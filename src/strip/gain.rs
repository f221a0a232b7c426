//! Volume/balance to linear gain mapping
//!
//! The forward mapping turns a strip's volume (dB) and balance into the
//! linear gains of its two output sides. The inverse reconstructs a
//! volume/balance pair from gains already present in the backend.

use crate::ipc::{BALANCE_MAX, BALANCE_MIN, VOLUME_MAX_DB, VOLUME_MIN_DB};

/// Convert dB to linear amplitude
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to dB, clamped to the volume range
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        VOLUME_MIN_DB
    } else {
        (20.0 * amplitude.log10()).clamp(VOLUME_MIN_DB, VOLUME_MAX_DB)
    }
}

/// Linear gains of the two output sides of a strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoGain {
    pub left: f32,
    pub right: f32,
}

impl StereoGain {
    /// Compute the side gains for a volume (dB) and balance (-1..1).
    ///
    /// Positive balance attenuates the left side, negative balance the
    /// right side. The other side always gets the full amplitude.
    pub fn from_volume_balance(volume_db: f32, balance: f32) -> Self {
        let base = db_to_amplitude(volume_db);
        let left = if balance > 0.0 {
            base * (1.0 - balance)
        } else {
            base
        };
        let right = if balance < 0.0 {
            base * (1.0 + balance)
        } else {
            base
        };
        Self { left, right }
    }

    /// Reconstruct `(volume_db, balance)` from existing side gains.
    ///
    /// Exact for gains produced by [`StereoGain::from_volume_balance`] inside
    /// the volume range. Otherwise only the volume is preserved.
    pub fn to_volume_balance(self) -> (f32, f32) {
        let left = self.left.max(0.0);
        let right = self.right.max(0.0);
        let peak = left.max(right);
        if peak <= 0.0 {
            return (VOLUME_MIN_DB, 0.0);
        }
        let balance = ((right - left) / peak).clamp(BALANCE_MIN, BALANCE_MAX);
        (amplitude_to_db(peak), balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_unity_centered() {
        let g = StereoGain::from_volume_balance(0.0, 0.0);
        assert!((g.left - 1.0).abs() < EPS);
        assert!((g.right - 1.0).abs() < EPS);
    }

    #[test]
    fn test_positive_balance_attenuates_left() {
        let base = db_to_amplitude(-6.0);
        let g = StereoGain::from_volume_balance(-6.0, 0.5);
        assert!((g.left - base * 0.5).abs() < EPS);
        assert!((g.right - base).abs() < EPS);
    }

    #[test]
    fn test_negative_balance_attenuates_right() {
        let base = db_to_amplitude(3.0);
        let g = StereoGain::from_volume_balance(3.0, -0.5);
        assert!((g.left - base).abs() < EPS);
        assert!((g.right - base * 0.5).abs() < EPS);
    }

    #[test]
    fn test_balance_monotonic() {
        let mut prev = StereoGain::from_volume_balance(-3.0, 0.0);
        for step in 1..=10 {
            let g = StereoGain::from_volume_balance(-3.0, step as f32 * 0.1);
            assert!(g.left < prev.left);
            assert_eq!(g.right, prev.right);
            prev = g;
        }

        let mut prev = StereoGain::from_volume_balance(-3.0, 0.0);
        for step in 1..=10 {
            let g = StereoGain::from_volume_balance(-3.0, -(step as f32) * 0.1);
            assert!(g.right < prev.right);
            assert_eq!(g.left, prev.left);
            prev = g;
        }
    }

    #[test]
    fn test_hard_pan_silences_side() {
        let g = StereoGain::from_volume_balance(0.0, 1.0);
        assert_eq!(g.left, 0.0);
        let g = StereoGain::from_volume_balance(0.0, -1.0);
        assert_eq!(g.right, 0.0);
    }

    #[test]
    fn test_reconstruct_calculator_output() {
        for &(vol, bal) in &[(0.0, 0.0), (-12.0, 0.3), (4.5, -0.8), (-40.0, 1.0)] {
            let g = StereoGain::from_volume_balance(vol, bal);
            let (v, b) = g.to_volume_balance();
            assert!((v - vol).abs() < 1e-3, "volume {} != {}", v, vol);
            assert!((b - bal).abs() < 1e-4, "balance {} != {}", b, bal);

            let again = StereoGain::from_volume_balance(v, b);
            assert!((again.left - g.left).abs() < 1e-4);
            assert!((again.right - g.right).abs() < 1e-4);
        }
    }

    #[test]
    fn test_reconstruct_foreign_gains_keeps_volume() {
        let g = StereoGain {
            left: 0.8,
            right: 0.2,
        };
        let (v, b) = g.to_volume_balance();
        assert!((v - amplitude_to_db(0.8)).abs() < EPS);
        // Louder left side reads as a pan to the left: balance = (R - L) / max
        assert!(b < 0.0);
    }

    #[test]
    fn test_reconstruct_silence() {
        let (v, b) = StereoGain {
            left: 0.0,
            right: 0.0,
        }
        .to_volume_balance();
        assert_eq!(v, VOLUME_MIN_DB);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_amplitude_to_db_clamps() {
        assert_eq!(amplitude_to_db(0.0), VOLUME_MIN_DB);
        assert_eq!(amplitude_to_db(100.0), VOLUME_MAX_DB);
        assert!(amplitude_to_db(1.0).abs() < EPS);
    }
}

//! Pinpon - a timing-based table pong rally
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball motion, boundary crossings, timing judge, match rules)
//! - `settings`: Data-driven tuning with difficulty presets
//! - `hud`: Read-only view model for whatever renders the game

pub mod hud;
pub mod settings;
pub mod sim;

pub use hud::HudSnapshot;
pub use settings::{Difficulty, Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;

    /// Depth thresholds, AI side is +Z
    pub const Z_AI_RACKET: f32 = 4.0;
    pub const Z_AI_TABLE: f32 = 2.0;
    pub const Z_NET: f32 = 0.0;
    pub const Z_PLAYER_TABLE: f32 = -2.0;
    pub const Z_PLAYER_RACKET: f32 = -4.0;
    pub const Z_FAIL_BOUNDARY: f32 = -5.0;

    /// Outer envelope; anything past it is a broken simulation
    pub const Z_ENVELOPE_MAX: f32 = 5.0;
    pub const Z_ENVELOPE_MIN: f32 = -6.0;

    /// Heights the ball snaps to at each boundary (cosmetic)
    pub const Y_AT_AI_RACKET: f32 = 1.1;
    pub const Y_AT_AI_TABLE: f32 = 0.8;
    pub const Y_AT_NET: f32 = 1.2;
    pub const Y_AT_PLAYER_TABLE: f32 = 0.8;
    pub const Y_AT_PLAYER_RACKET: f32 = 1.1;
    pub const Y_AT_FAIL: f32 = 1.2;

    /// Table lateral extent
    pub const TABLE_MIN_X: f32 = -1.5;
    pub const TABLE_MAX_X: f32 = 1.5;
    pub const TABLE_SAFE_MARGIN: f32 = 0.1;

    /// Timing window radii around the player racket depth
    pub const PERFECT_RADIUS: f32 = 0.3;
    pub const GOOD_RADIUS: f32 = 0.5;

    /// Ball travel speed (units/s)
    pub const BALL_SPEED: f32 = 2.5;
    /// Height rackets and serves sit at
    pub const RACKET_HEIGHT: f32 = 1.2;
    /// Below this a depth component counts as zero
    pub const DEPTH_EPSILON: f32 = 0.001;
    /// Below this a curve effect counts as a straight shot
    pub const CURVE_EPSILON: f32 = 0.01;
    /// Lateral racket/ball offset to return angle
    pub const RETURN_ANGLE_MULTIPLIER: f32 = 0.5;

    /// AI serve delay (seconds)
    pub const AI_SERVE_DELAY: f32 = 2.0;
    /// Serves per side before rotation
    pub const SERVES_PER_ROTATION: u32 = 2;
    pub const MAX_FAILURES: u32 = 3;
}

/// Linear interpolation factor of `value` between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Step `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_lerp() {
        assert!((inverse_lerp(-5.0, 0.0, -4.0) - 0.2).abs() < 1e-6);
        assert_eq!(inverse_lerp(-5.0, 0.0, -9.0), 0.0);
        assert_eq!(inverse_lerp(-5.0, 0.0, 3.0), 1.0);
        assert_eq!(inverse_lerp(1.0, 1.0, 3.0), 0.0);
    }

    #[test]
    fn test_move_towards() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.0, -1.0, 0.25), -0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
    }
}

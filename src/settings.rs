//! Game tuning and difficulty presets
//!
//! Everything the simulation reads as configuration lives here. Loaded from
//! JSON on native builds, falls back to defaults on any error.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Configuration loading/validation errors
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("invalid settings: {0}")]
    Validation(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::InvalidJson(e.to_string())
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e.to_string())
    }
}

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Timing window for this preset
    pub fn timing(&self) -> TimingWindow {
        match self {
            Difficulty::Easy => TimingWindow {
                perfect_radius: 0.4,
                good_radius: 0.7,
            },
            Difficulty::Normal => TimingWindow::default(),
            Difficulty::Hard => TimingWindow {
                perfect_radius: 0.2,
                good_radius: 0.35,
            },
        }
    }

    /// Ball speed for this preset
    pub fn ball_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 2.0,
            Difficulty::Normal => BALL_SPEED,
            Difficulty::Hard => 3.2,
        }
    }
}

/// Depth coordinates of every boundary, ordered AI side to player side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub ai_racket: f32,
    pub ai_table: f32,
    pub net: f32,
    pub player_table: f32,
    pub player_racket: f32,
    pub fail: f32,
    /// Outer envelope; crossing it forces a reset
    pub envelope_max: f32,
    pub envelope_min: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ai_racket: Z_AI_RACKET,
            ai_table: Z_AI_TABLE,
            net: Z_NET,
            player_table: Z_PLAYER_TABLE,
            player_racket: Z_PLAYER_RACKET,
            fail: Z_FAIL_BOUNDARY,
            envelope_max: Z_ENVELOPE_MAX,
            envelope_min: Z_ENVELOPE_MIN,
        }
    }
}

impl Thresholds {
    /// Whether a depth has escaped the outer envelope
    pub fn outside_envelope(&self, z: f32) -> bool {
        z > self.envelope_max || z < self.envelope_min
    }
}

/// Heights the ball is snapped to at each boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapHeights {
    pub ai_racket: f32,
    pub ai_table: f32,
    pub net: f32,
    pub player_table: f32,
    pub player_racket: f32,
    pub fail: f32,
}

impl Default for SnapHeights {
    fn default() -> Self {
        Self {
            ai_racket: Y_AT_AI_RACKET,
            ai_table: Y_AT_AI_TABLE,
            net: Y_AT_NET,
            player_table: Y_AT_PLAYER_TABLE,
            player_racket: Y_AT_PLAYER_RACKET,
            fail: Y_AT_FAIL,
        }
    }
}

/// Lateral extent of the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableBounds {
    pub min_x: f32,
    pub max_x: f32,
    /// Corrected shots aim this far inside the edges
    pub safe_margin: f32,
}

impl Default for TableBounds {
    fn default() -> Self {
        Self {
            min_x: TABLE_MIN_X,
            max_x: TABLE_MAX_X,
            safe_margin: TABLE_SAFE_MARGIN,
        }
    }
}

impl TableBounds {
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x
    }

    /// `contains` with a little slack on both edges
    #[inline]
    pub fn contains_within(&self, x: f32, tolerance: f32) -> bool {
        x >= self.min_x - tolerance && x <= self.max_x + tolerance
    }

    /// Clamp into the table shrunk by the safe margin
    #[inline]
    pub fn clamp_safe(&self, x: f32) -> f32 {
        x.clamp(self.min_x + self.safe_margin, self.max_x - self.safe_margin)
    }
}

/// Timing window radii, measured as depth distance from the player racket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingWindow {
    pub perfect_radius: f32,
    pub good_radius: f32,
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self {
            perfect_radius: PERFECT_RADIUS,
            good_radius: GOOD_RADIUS,
        }
    }
}

/// Racket movement and input conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RacketTuning {
    /// Player racket easing rate toward the pointer (1/s)
    pub player_move_speed: f32,
    /// Player racket lateral range
    pub player_min_x: f32,
    pub player_max_x: f32,
    /// Drag distance to curve
    pub drag_curve_multiplier: f32,
    /// Pointer vertical motion to swing depth
    pub swing_speed: f32,
    /// Pointer lateral velocity to curve
    pub swing_curve_multiplier: f32,
    /// Racket/ball distance that counts as contact during a swing
    pub hit_distance: f32,
    pub swing_start_z: f32,
    pub swing_end_z: f32,
    /// Depth range in which a drag return is accepted
    pub window_min_z: f32,
    pub window_max_z: f32,
    /// AI racket lateral speed (units/s)
    pub ai_move_speed: f32,
}

impl Default for RacketTuning {
    fn default() -> Self {
        Self {
            player_move_speed: 10.0,
            player_min_x: -2.2,
            player_max_x: 2.2,
            drag_curve_multiplier: 1.5,
            swing_speed: 5.0,
            swing_curve_multiplier: 0.3,
            hit_distance: 0.3,
            swing_start_z: -4.5,
            swing_end_z: -3.5,
            window_min_z: -4.5,
            window_max_z: -3.5,
            ai_move_speed: 5.0,
        }
    }
}

/// Complete game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub thresholds: Thresholds,
    pub heights: SnapHeights,
    pub table: TableBounds,
    pub timing: TimingWindow,
    pub rackets: RacketTuning,
    pub ball_speed: f32,
    pub max_failures: u32,
    /// Seconds before the AI serves
    pub ai_serve_delay: f32,
    pub player_serve_origin: Vec3,
    pub ai_serve_origin: Vec3,
    /// Serve targets are drawn from [-spread, spread)
    pub serve_spread: f32,
    /// Where a forced reset parks the ball
    pub idle_position: Vec3,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            thresholds: Thresholds::default(),
            heights: SnapHeights::default(),
            table: TableBounds::default(),
            timing: TimingWindow::default(),
            rackets: RacketTuning::default(),
            ball_speed: BALL_SPEED,
            max_failures: MAX_FAILURES,
            ai_serve_delay: AI_SERVE_DELAY,
            player_serve_origin: Vec3::new(0.0, RACKET_HEIGHT, Z_PLAYER_RACKET),
            ai_serve_origin: Vec3::new(0.0, RACKET_HEIGHT, Z_AI_RACKET),
            serve_spread: 1.0,
            idle_position: Vec3::new(0.0, RACKET_HEIGHT, Z_PLAYER_RACKET),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_difficulty(difficulty);
        settings
    }

    /// Apply a difficulty preset (updates timing window and ball speed)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.timing = difficulty.timing();
        self.ball_speed = difficulty.ball_speed();
    }

    /// Parse and validate settings from JSON. Missing fields take defaults;
    /// missing timing window and ball speed come from the difficulty preset.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let mut settings: Settings = serde_json::from_value(value.clone())?;
        let difficulty = settings.difficulty;
        if value.get("timing").is_none() {
            settings.timing = difficulty.timing();
        }
        if value.get("ball_speed").is_none() {
            settings.ball_speed = difficulty.ball_speed();
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the ordering and ranges the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        let t = &self.thresholds;
        let depths = [
            t.envelope_max,
            t.ai_racket,
            t.ai_table,
            t.net,
            t.player_table,
            t.player_racket,
            t.fail,
            t.envelope_min,
        ];
        if depths.windows(2).any(|w| w[0] <= w[1]) {
            return Err(SettingsError::Validation(format!(
                "thresholds must strictly decrease from AI side to player side: {:?}",
                depths
            )));
        }

        let table = &self.table;
        if table.min_x >= table.max_x {
            return Err(SettingsError::Validation(format!(
                "table min_x {} must be below max_x {}",
                table.min_x, table.max_x
            )));
        }
        if table.safe_margin < 0.0 || table.safe_margin * 2.0 >= table.max_x - table.min_x {
            return Err(SettingsError::Validation(format!(
                "safe margin {} does not fit the table",
                table.safe_margin
            )));
        }

        let timing = &self.timing;
        if timing.perfect_radius <= 0.0 || timing.perfect_radius > timing.good_radius {
            return Err(SettingsError::Validation(format!(
                "timing radii must satisfy 0 < perfect ({}) <= good ({})",
                timing.perfect_radius, timing.good_radius
            )));
        }

        let r = &self.rackets;
        if r.player_move_speed <= 0.0 || r.ai_move_speed <= 0.0 || r.swing_speed <= 0.0 {
            return Err(SettingsError::Validation(format!(
                "racket speeds must be positive (player {}, ai {}, swing {})",
                r.player_move_speed, r.ai_move_speed, r.swing_speed
            )));
        }
        if r.player_min_x >= r.player_max_x {
            return Err(SettingsError::Validation(format!(
                "racket range min_x {} must be below max_x {}",
                r.player_min_x, r.player_max_x
            )));
        }
        if r.window_min_z > r.window_max_z || r.swing_start_z > r.swing_end_z {
            return Err(SettingsError::Validation(format!(
                "return window [{}, {}] and swing range [{}, {}] must not be inverted",
                r.window_min_z, r.window_max_z, r.swing_start_z, r.swing_end_z
            )));
        }
        if r.hit_distance <= 0.0 {
            return Err(SettingsError::Validation("hit distance must be positive".into()));
        }

        if self.ball_speed <= 0.0 {
            return Err(SettingsError::Validation("ball speed must be positive".into()));
        }
        if self.max_failures == 0 {
            return Err(SettingsError::Validation("max_failures must be at least 1".into()));
        }
        if self.ai_serve_delay < 0.0 {
            return Err(SettingsError::Validation("ai serve delay cannot be negative".into()));
        }
        Ok(())
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .map_err(SettingsError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

//! Ball motion model
//!
//! Straight-line motion only: a position, a unit direction and a speed.
//! Reflections and returns replace the direction; nothing else acts on it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// The ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec3,
    /// Unit length while moving; +Z travels toward the AI
    pub dir: Vec3,
    pub speed: f32,
    pub moving: bool,
}

impl Default for Ball {
    fn default() -> Self {
        Self::new(BALL_SPEED)
    }
}

impl Ball {
    pub fn new(speed: f32) -> Self {
        Self {
            pos: Vec3::new(0.0, RACKET_HEIGHT, Z_PLAYER_RACKET),
            dir: Vec3::ZERO,
            speed,
            moving: false,
        }
    }

    /// Place the ball at `from` and send it toward `to`
    pub fn launch(&mut self, from: Vec3, to: Vec3) {
        self.pos = from;
        self.dir = (to - from).normalize_or_zero();
        self.moving = self.dir != Vec3::ZERO;
        if self.moving {
            log::debug!("Ball launched {} -> {}, dir {}", from, to, self.dir);
        } else {
            log::warn!("Degenerate launch at {}, ball left idle", from);
        }
    }

    /// Advance along the current direction
    pub fn advance(&mut self, dt: f32) {
        if self.moving {
            self.pos += self.dir * self.speed * dt;
        }
    }

    pub fn stop(&mut self) {
        self.moving = false;
        log::debug!("Ball stopped at {}", self.pos);
    }

    /// Park the ball at `pos` with no direction
    pub fn reset_to(&mut self, pos: Vec3) {
        self.pos = pos;
        self.dir = Vec3::ZERO;
        self.moving = false;
    }

    /// Replace the direction. Zero-length input is rejected and the old
    /// direction kept. Returns whether the direction changed.
    pub fn set_direction(&mut self, dir: Vec3) -> bool {
        match dir.try_normalize() {
            Some(d) => {
                self.dir = d;
                true
            }
            None => {
                log::warn!("Rejected zero-length direction, keeping {}", self.dir);
                false
            }
        }
    }

    /// Overwrite the vertical coordinate only
    #[inline]
    pub fn set_height(&mut self, y: f32) {
        self.pos.y = y;
    }

    /// Where the ball will be when it reaches depth `z` on its current heading.
    /// Returns the current position when the heading has no depth component.
    pub fn predict_position_at_depth(&self, z: f32) -> Vec3 {
        predict_at_depth(self.pos, self.dir, z)
    }

    /// Whether the ball is travelling toward the player's end
    #[inline]
    pub fn heading_to_player(&self) -> bool {
        self.dir.z < 0.0
    }
}

/// Extrapolate `pos` along `dir` to depth `z`
pub fn predict_at_depth(pos: Vec3, dir: Vec3, z: f32) -> Vec3 {
    if dir.z.abs() < DEPTH_EPSILON {
        return pos;
    }
    let t = (z - pos.z) / dir.z;
    pos + dir * t
}

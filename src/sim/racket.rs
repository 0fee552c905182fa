//! Racket controllers
//!
//! The AI racket just chases a lateral target. The player racket turns pointer
//! events into return attempts: press-drag-release with the primary button,
//! or a swing with the secondary button that connects on proximity.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::timing::{ReturnAttempt, ReturnKind};
use crate::consts::RACKET_HEIGHT;
use crate::move_towards;
use crate::settings::{RacketTuning, Settings};

/// Arrival tolerance for the AI racket
const AI_ARRIVE_EPSILON: f32 = 0.01;

/// AI racket: fixed depth, slides laterally to where it was told to go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRacket {
    pub x: f32,
    pub target_x: f32,
    pub moving: bool,
    depth: f32,
    speed: f32,
}

impl AiRacket {
    pub fn new(settings: &Settings) -> Self {
        Self {
            x: 0.0,
            target_x: 0.0,
            moving: false,
            depth: settings.thresholds.ai_racket,
            speed: settings.rackets.ai_move_speed,
        }
    }

    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.x, RACKET_HEIGHT, self.depth)
    }

    pub fn move_to(&mut self, x: f32) {
        self.target_x = x;
        self.moving = true;
        log::debug!("AI racket moving to x={:.2}", x);
    }

    pub fn update(&mut self, dt: f32) {
        if !self.moving {
            return;
        }
        self.x = move_towards(self.x, self.target_x, self.speed * dt);
        if (self.x - self.target_x).abs() < AI_ARRIVE_EPSILON {
            self.moving = false;
        }
    }
}

/// Pointer buttons the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    /// Drag returns
    Primary,
    /// Swings (and serves while the ball is idle)
    Secondary,
}

/// Pointer input in table world coordinates (x lateral, y vertical)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { button: PointerButton, pos: Vec2 },
    Up { button: PointerButton, pos: Vec2 },
    Move { pos: Vec2 },
}

/// In-progress secondary-button swing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    /// Racket depth, pushed forward by upward pointer motion
    pub depth: f32,
    /// Pointer position at the last update
    pub last_pointer: Vec2,
    /// Lateral pointer velocity (units/s)
    pub velocity_x: f32,
}

/// Player racket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRacket {
    pub x: f32,
    /// Set between an AI return and the end of the player's chance to hit it
    pub tracking: bool,
    /// Where the incoming ball was struck from, for presentation
    pub expected_x: Option<f32>,
    pub swing: Option<Swing>,
    /// Pointer x when the primary button went down inside the window
    drag_origin: Option<f32>,
    pointer: Vec2,
    depth: f32,
    tuning: RacketTuning,
}

impl PlayerRacket {
    pub fn new(settings: &Settings) -> Self {
        Self {
            x: 0.0,
            tracking: false,
            expected_x: None,
            swing: None,
            drag_origin: None,
            pointer: Vec2::new(0.0, RACKET_HEIGHT),
            depth: settings.thresholds.player_racket,
            tuning: settings.rackets,
        }
    }

    /// Racket position; swings move it off its resting depth
    pub fn pos(&self) -> Vec3 {
        let z = self.swing.map_or(self.depth, |s| s.depth);
        Vec3::new(self.x, RACKET_HEIGHT, z)
    }

    pub fn is_swinging(&self) -> bool {
        self.swing.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    pub fn start_tracking(&mut self, expected_x: f32) {
        self.tracking = true;
        self.expected_x = Some(expected_x);
        log::debug!("Player racket tracking, ball returned from x={:.2}", expected_x);
    }

    pub fn stop_tracking(&mut self) {
        self.tracking = false;
        self.expected_x = None;
        self.drag_origin = None;
        log::debug!("Player racket stopped tracking");
    }

    /// Whether a drag return would be accepted right now
    pub fn can_return(&self, ball: &Ball) -> bool {
        self.tracking
            && ball.moving
            && ball.pos.z >= self.tuning.window_min_z
            && ball.pos.z <= self.tuning.window_max_z
    }

    #[inline]
    fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.tuning.player_min_x, self.tuning.player_max_x)
    }

    /// Feed one pointer event. Returns a drag return attempt when a primary
    /// release completes one inside the window.
    pub fn handle_pointer(&mut self, event: PointerEvent, ball: &Ball) -> Option<ReturnAttempt> {
        match event {
            PointerEvent::Down { button, pos } => {
                self.on_pointer_down(button, pos, ball);
                None
            }
            PointerEvent::Up { button, pos } => self.on_pointer_up(button, pos, ball),
            PointerEvent::Move { pos } => {
                self.on_pointer_drag(pos);
                None
            }
        }
    }

    /// Secondary starts a swing; primary inside the window starts a drag
    pub fn on_pointer_down(&mut self, button: PointerButton, pos: Vec2, ball: &Ball) {
        self.pointer = pos;
        match button {
            PointerButton::Secondary => {
                if ball.moving && self.swing.is_none() {
                    self.drag_origin = None;
                    self.swing = Some(Swing {
                        depth: self.tuning.swing_start_z,
                        last_pointer: pos,
                        velocity_x: 0.0,
                    });
                    log::debug!("Swing started at z={:.2}", self.tuning.swing_start_z);
                }
            }
            PointerButton::Primary => {
                if self.swing.is_none() && self.drag_origin.is_none() && self.can_return(ball) {
                    self.drag_origin = Some(pos.x);
                }
            }
        }
    }

    /// Primary release completes a drag; secondary release abandons a swing
    pub fn on_pointer_up(
        &mut self,
        button: PointerButton,
        pos: Vec2,
        ball: &Ball,
    ) -> Option<ReturnAttempt> {
        self.pointer = pos;
        match button {
            PointerButton::Secondary => {
                if self.swing.is_some() {
                    self.end_swing();
                    log::debug!("Swing ended without a hit");
                }
                None
            }
            PointerButton::Primary => {
                let origin = self.drag_origin.take()?;
                if !self.can_return(ball) {
                    return None;
                }
                Some(ReturnAttempt {
                    kind: ReturnKind::Drag,
                    contact_depth: ball.pos.z,
                    racket_x: self.x,
                    lateral_input: pos.x - origin,
                    curve_multiplier: self.tuning.drag_curve_multiplier,
                })
            }
        }
    }

    /// Pointer moved; the racket follows it on the next `update`
    pub fn on_pointer_drag(&mut self, pos: Vec2) {
        self.pointer = pos;
    }

    /// Per-tick racket motion. During a swing, returns a swing attempt when
    /// the racket reaches the ball.
    pub fn update(&mut self, dt: f32, ball: &Ball) -> Option<ReturnAttempt> {
        let target_x = self.clamp_x(self.pointer.x);

        let Some(mut swing) = self.swing else {
            let t = (self.tuning.player_move_speed * dt).min(1.0);
            self.x += (target_x - self.x) * t;
            if self.drag_origin.is_some() && !self.can_return(ball) {
                self.drag_origin = None;
            }
            return None;
        };

        self.x = target_x;
        let delta = self.pointer - swing.last_pointer;
        swing.depth = (swing.depth + delta.y * self.tuning.swing_speed)
            .clamp(self.tuning.swing_start_z, self.tuning.swing_end_z);
        if dt > 0.0 {
            swing.velocity_x = delta.x / dt;
        }
        swing.last_pointer = self.pointer;
        self.swing = Some(swing);

        if !ball.moving {
            return None;
        }
        if self.pos().distance(ball.pos) > self.tuning.hit_distance {
            return None;
        }

        let attempt = ReturnAttempt {
            kind: ReturnKind::Swing,
            contact_depth: ball.pos.z,
            racket_x: self.x,
            lateral_input: swing.velocity_x,
            curve_multiplier: self.tuning.swing_curve_multiplier,
        };
        self.end_swing();
        Some(attempt)
    }

    /// Drop out of swing mode and back to the resting depth
    pub fn end_swing(&mut self) {
        if self.swing.take().is_some() {
            self.x = self.clamp_x(self.pointer.x);
        }
    }
}

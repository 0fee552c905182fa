//! Match rules: serving, serve rotation, failures and game over

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::boundary::BoundaryDetector;
use super::timer::{Timer, TimerHandle};
use crate::consts::SERVES_PER_ROTATION;
use crate::settings::Settings;

/// Either end of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Ai,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Player => Side::Ai,
            Side::Ai => Side::Player,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "PLAYER",
            Side::Ai => "AI",
        }
    }
}

/// What a failure led to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureOutcome {
    /// Already game over; nothing counted
    Ignored,
    GameOver,
    /// Play continues with `next` to serve
    NextServe {
        next: Side,
        rotated: bool,
        ai_serve: Option<TimerHandle>,
    },
}

/// Match progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Serves already taken by `serving` in this rotation
    pub serve_count: u32,
    pub serving: Side,
    pub failure_count: u32,
    pub max_failures: u32,
    pub game_over: bool,
}

impl MatchState {
    pub fn new(max_failures: u32) -> Self {
        Self {
            serve_count: 0,
            serving: Side::Player,
            failure_count: 0,
            max_failures,
            game_over: false,
        }
    }
}

/// Owns the match state and the delayed AI serve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchController {
    pub state: MatchState,
    ai_serve: Timer,
    ai_serve_delay: f32,
    player_origin: Vec3,
    ai_origin: Vec3,
    serve_spread: f32,
}

impl MatchController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            state: MatchState::new(settings.max_failures),
            ai_serve: Timer::new(),
            ai_serve_delay: settings.ai_serve_delay,
            player_origin: settings.player_serve_origin,
            ai_origin: settings.ai_serve_origin,
            serve_spread: settings.serve_spread,
        }
    }

    /// Whether `side` may serve right now
    pub fn can_serve(&self, side: Side, ball: &Ball) -> bool {
        !self.state.game_over && !ball.moving && self.state.serving == side
    }

    /// Serve from `side` toward a random lateral point on the far end.
    /// Returns false (and does nothing) if it is not `side`'s turn.
    pub fn serve(
        &mut self,
        side: Side,
        ball: &mut Ball,
        detector: &mut BoundaryDetector,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.can_serve(side, ball) {
            log::debug!(
                "{} serve ignored (serving {}, ball moving {}, game over {})",
                side.as_str(),
                self.state.serving.as_str(),
                ball.moving,
                self.state.game_over
            );
            return false;
        }
        self.ai_serve.cancel();

        let (origin, far) = match side {
            Side::Player => (self.player_origin, self.ai_origin),
            Side::Ai => (self.ai_origin, self.player_origin),
        };
        let x = if self.serve_spread > 0.0 {
            rng.random_range(-self.serve_spread..self.serve_spread)
        } else {
            0.0
        };
        let target = Vec3::new(x, origin.y, far.z);

        detector.reset_all();
        ball.launch(origin, target);
        log::info!(
            "{} SERVE ({}/{}) {} -> {}",
            side.as_str(),
            self.state.serve_count + 1,
            SERVES_PER_ROTATION,
            origin,
            target
        );
        true
    }

    /// Count a lost point and move the serve on
    pub fn on_player_failed(&mut self) -> FailureOutcome {
        if self.state.game_over {
            return FailureOutcome::Ignored;
        }

        self.state.failure_count += 1;
        log::info!(
            "PLAYER FAILED ({}/{})",
            self.state.failure_count,
            self.state.max_failures
        );

        if self.state.failure_count >= self.state.max_failures {
            self.state.game_over = true;
            self.ai_serve.cancel();
            log::info!(
                "GAME OVER - total failures {}/{}",
                self.state.failure_count,
                self.state.max_failures
            );
            return FailureOutcome::GameOver;
        }

        self.state.serve_count += 1;
        let rotated = self.state.serve_count >= SERVES_PER_ROTATION;
        if rotated {
            self.state.serve_count = 0;
            self.state.serving = self.state.serving.opposite();
            log::info!("Serve rotation, now serving: {}", self.state.serving.as_str());
        }

        let ai_serve = match self.state.serving {
            Side::Ai => {
                log::info!("AI will serve in {:.1}s", self.ai_serve_delay);
                Some(self.ai_serve.schedule(self.ai_serve_delay))
            }
            Side::Player => None,
        };

        FailureOutcome::NextServe {
            next: self.state.serving,
            rotated,
            ai_serve,
        }
    }

    /// Advance the AI serve timer. Returns true when the AI should serve now.
    pub fn poll_ai_serve(&mut self, dt: f32) -> bool {
        match self.ai_serve.advance(dt) {
            Some(_) if !self.state.game_over && self.state.serving == Side::Ai => true,
            Some(handle) => {
                log::debug!("Stale AI serve {:?} ignored", handle);
                false
            }
            None => false,
        }
    }

    pub fn ai_serve_pending(&self) -> bool {
        self.ai_serve.is_pending()
    }

    /// Seconds until the scheduled AI serve
    pub fn ai_serve_remaining(&self) -> Option<f32> {
        self.ai_serve.remaining()
    }

    /// Back to a fresh match with the player serving
    pub fn restart(&mut self, ball: &mut Ball, detector: &mut BoundaryDetector) {
        let max_failures = self.state.max_failures;
        self.state = MatchState::new(max_failures);
        self.ai_serve.cancel();
        ball.stop();
        detector.reset_all();
        log::info!(
            "Match restarted - serve: {} | failures 0/{}",
            self.state.serving.as_str(),
            max_failures
        );
    }
}

//! Game state and the glue between the simulation pieces
//!
//! All state that must be persisted for determinism lives here. Components
//! never reach for each other directly; the boundary detector reports events
//! and `GameState` routes them to the rackets and the match controller.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::boundary::{BoundaryDetector, BoundaryEvent};
use super::racket::{AiRacket, PlayerRacket};
use super::rules::{FailureOutcome, MatchController, Side};
use super::timing::{ReturnAttempt, TimingJudge, TimingResult};
use crate::settings::Settings;

/// Coarse game phase, derived from the match state and the ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball at rest, waiting for `serving` to serve
    Idle { serving: Side },
    /// Ball in play
    InFlight,
    /// Failure limit reached; only a restart leaves this phase
    GameOver,
}

/// Why the player lost a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Return missed the AI half of the table
    OffTable,
    /// Ball got past the player racket
    PassedFailLine,
}

/// Everything observable that happened during a tick, in order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Served { side: Side },
    /// Raw boundary crossing
    Boundary(BoundaryEvent),
    /// A player return was judged
    Timing(TimingResult),
    PlayerFailed {
        reason: FailureReason,
        failures: u32,
        max_failures: u32,
    },
    ServeRotated { serving: Side },
    AiServeScheduled { delay: f32 },
    GameOver,
    Restarted,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Fresh generator for the next random decision; every call gets its own stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream);
        self.stream += 1;
        rng
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub settings: Settings,
    pub ball: Ball,
    pub detector: BoundaryDetector,
    pub judge: TimingJudge,
    pub player: PlayerRacket,
    pub ai: AiRacket,
    pub rules: MatchController,
    /// Most recent successful return
    pub last_timing: Option<TimingResult>,
    /// Events raised during the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the given seed and default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_settings(seed, Settings::default())
    }

    pub fn with_settings(seed: u64, settings: Settings) -> Self {
        let mut ball = Ball::new(settings.ball_speed);
        ball.reset_to(settings.idle_position);
        Self {
            seed,
            rng_state: RngState::new(seed),
            time_ticks: 0,
            ball,
            detector: BoundaryDetector::new(&settings),
            judge: TimingJudge::new(&settings),
            player: PlayerRacket::new(&settings),
            ai: AiRacket::new(&settings),
            rules: MatchController::new(&settings),
            last_timing: None,
            events: Vec::new(),
            settings,
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.rules.state.game_over {
            GamePhase::GameOver
        } else if self.ball.moving {
            GamePhase::InFlight
        } else {
            GamePhase::Idle {
                serving: self.rules.state.serving,
            }
        }
    }

    /// Serve from `side` if it is that side's turn
    pub fn serve(&mut self, side: Side) -> bool {
        // Rejected requests must not consume a stream
        if !self.rules.can_serve(side, &self.ball) {
            log::debug!("{} serve request ignored", side.as_str());
            return false;
        }
        let mut rng = self.rng_state.next_rng();
        if !self
            .rules
            .serve(side, &mut self.ball, &mut self.detector, &mut rng)
        {
            return false;
        }

        self.player.end_swing();
        match side {
            // An AI serve comes straight at the player
            Side::Ai => self.player.start_tracking(self.ball.pos.x),
            Side::Player => self.player.stop_tracking(),
        }
        self.events.push(GameEvent::Served { side });
        true
    }

    /// Judge a player return and, if it connects, send the ball back
    pub fn apply_return(&mut self, attempt: ReturnAttempt) -> Option<TimingResult> {
        if !self.ball.moving {
            return None;
        }

        let verdict = self.judge.judge(&attempt, self.ball.pos);
        let dir = verdict.dir?;
        if !self.ball.set_direction(dir) {
            return None;
        }

        self.detector.reset_ai_side();
        self.player.stop_tracking();
        self.player.end_swing();
        self.last_timing = Some(verdict.result);
        self.events.push(GameEvent::Timing(verdict.result));
        Some(verdict.result)
    }

    /// Back to a fresh match
    pub fn restart(&mut self) {
        self.rules.restart(&mut self.ball, &mut self.detector);
        self.ball.reset_to(self.settings.idle_position);
        self.player.stop_tracking();
        self.player.end_swing();
        self.last_timing = None;
        self.events.push(GameEvent::Restarted);
    }

    /// Route one boundary event to whoever reacts to it
    pub fn dispatch(&mut self, event: BoundaryEvent) {
        self.events.push(GameEvent::Boundary(event));
        match event {
            BoundaryEvent::AiReturned { x, .. } => {
                self.ai.move_to(x);
                self.player.start_tracking(x);
            }
            BoundaryEvent::OffTable { .. } => self.player_failed(FailureReason::OffTable),
            BoundaryEvent::AutoFail { .. } => self.player_failed(FailureReason::PassedFailLine),
            BoundaryEvent::ForcedReset { .. } => {
                self.player.stop_tracking();
                self.player.end_swing();
            }
            BoundaryEvent::AiTableBounce { .. }
            | BoundaryEvent::PlayerTableBounce { .. }
            | BoundaryEvent::PlayerWindowOpened => {}
        }
    }

    fn player_failed(&mut self, reason: FailureReason) {
        self.player.stop_tracking();
        self.player.end_swing();

        match self.rules.on_player_failed() {
            FailureOutcome::Ignored => {}
            FailureOutcome::GameOver => {
                self.push_failed(reason);
                self.events.push(GameEvent::GameOver);
            }
            FailureOutcome::NextServe {
                next,
                rotated,
                ai_serve,
            } => {
                self.push_failed(reason);
                if rotated {
                    self.events.push(GameEvent::ServeRotated { serving: next });
                }
                if ai_serve.is_some() {
                    self.events.push(GameEvent::AiServeScheduled {
                        delay: self.settings.ai_serve_delay,
                    });
                }
            }
        }
    }

    fn push_failed(&mut self, reason: FailureReason) {
        self.events.push(GameEvent::PlayerFailed {
            reason,
            failures: self.rules.state.failure_count,
            max_failures: self.rules.state.max_failures,
        });
    }
}

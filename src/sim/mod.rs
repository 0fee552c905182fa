//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod ball;
pub mod boundary;
pub mod racket;
pub mod rules;
pub mod state;
pub mod tick;
pub mod timer;
pub mod timing;

pub use ball::Ball;
pub use boundary::{BoundaryDetector, BoundaryEvent, BoundaryFlags, Threshold, correct_trajectory};
pub use racket::{AiRacket, PlayerRacket, PointerButton, PointerEvent};
pub use rules::{FailureOutcome, MatchController, MatchState, Side};
pub use state::{FailureReason, GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use timer::{Timer, TimerHandle};
pub use timing::{
    CurveDirection, ReturnAttempt, ReturnKind, TimingGrade, TimingJudge, TimingResult,
};

//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::racket::{PointerButton, PointerEvent};
use super::rules::Side;
use super::state::{GamePhase, GameState};
use super::timing::TimingGrade;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer activity since the last tick, oldest first
    pub pointer: Vec<PointerEvent>,
    /// Explicit serve request (space / serve button)
    pub serve: Option<Side>,
    /// Restart the match (R)
    pub restart: bool,
    /// Idle/demo mode - the player side plays itself
    pub autoplay: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    if input.restart {
        state.restart();
    }

    // Don't tick if game over
    if state.phase() == GamePhase::GameOver {
        return;
    }

    state.time_ticks += 1;

    let mut input = input.clone();
    if input.autoplay {
        autoplay(state, &mut input);
    }

    if let Some(side) = input.serve {
        state.serve(side);
    }

    for &event in &input.pointer {
        // Secondary press with the ball at rest on our serve is a serve trigger
        if let PointerEvent::Down {
            button: PointerButton::Secondary,
            ..
        } = event
        {
            if state.rules.can_serve(Side::Player, &state.ball) {
                state.serve(Side::Player);
                continue;
            }
        }
        if let Some(attempt) = state.player.handle_pointer(event, &state.ball) {
            state.apply_return(attempt);
        }
    }

    if state.rules.poll_ai_serve(dt) {
        state.serve(Side::Ai);
    }

    if state.ball.moving {
        let prev_z = state.ball.pos.z;
        state.ball.advance(dt);
        let crossings = state.detector.evaluate(&mut state.ball, prev_z);
        for event in crossings {
            state.dispatch(event);
        }
    }

    state.ai.update(dt);
    if let Some(attempt) = state.player.update(dt, &state.ball) {
        state.apply_return(attempt);
    }
}

/// Fill in input for the player side: serve when it is our turn, follow the
/// ball, and drag-return once it is inside the perfect zone.
fn autoplay(state: &GameState, input: &mut TickInput) {
    if state.phase() == (GamePhase::Idle { serving: Side::Player }) {
        input.serve = Some(Side::Player);
        return;
    }

    let ball = &state.ball;
    if !ball.moving || !ball.heading_to_player() {
        return;
    }

    // Small oscillating offset so rallies don't repeat exactly
    let time_factor = state.time_ticks as f32 * 0.01;
    let offset = time_factor.sin() * 0.3;
    let aim = Vec2::new(ball.pos.x + offset, 0.0);
    input.pointer.push(PointerEvent::Move { pos: aim });

    if state.player.can_return(ball) && state.judge.grade_at(ball.pos.z) == TimingGrade::Perfect {
        input.pointer.push(PointerEvent::Down {
            button: PointerButton::Primary,
            pos: aim,
        });
        input.pointer.push(PointerEvent::Up {
            button: PointerButton::Primary,
            pos: aim,
        });
    }
}

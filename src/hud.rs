//! Read-only HUD model
//!
//! Turns game state into the strings and gauge values a renderer draws.
//! Nothing in here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::inverse_lerp;
use crate::sim::{GameEvent, GamePhase, GameState, TimingGrade, TimingResult};

/// How long timing feedback stays on screen (seconds)
pub const FEEDBACK_DURATION: f32 = 1.0;

pub const GAME_OVER_TEXT: &str = "GAME OVER\n\nPress R to Restart";

/// Fading "PERFECT / Curve to Left" style banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackBanner {
    pub text: String,
    pub grade: TimingGrade,
    remaining: f32,
}

impl FeedbackBanner {
    pub fn new(result: &TimingResult) -> Self {
        Self {
            text: result.label(),
            grade: result.grade,
            remaining: FEEDBACK_DURATION,
        }
    }

    /// Opacity, 1 when shown and fading linearly to 0
    pub fn alpha(&self) -> f32 {
        (self.remaining / FEEDBACK_DURATION).clamp(0.0, 1.0)
    }

    pub fn is_visible(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Timing gauge: where the incoming ball is, and how big the scoring zones are
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingGauge {
    /// 0 at the fail line, 1 at the net
    pub position: f32,
    /// Grade the ball would get if hit right now
    pub grade: TimingGrade,
    /// Zone widths as a fraction of the gauge
    pub perfect_size: f32,
    pub good_size: f32,
}

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    /// "Failures: n/m"
    pub failures: String,
    /// "Serving: PLAYER", or "AI serves in 1.4s" while the AI serve is pending
    pub serving: String,
    pub game_over: Option<String>,
    pub gauge: Option<TimingGauge>,
    pub feedback: Option<FeedbackBanner>,
}

impl HudSnapshot {
    pub fn capture(state: &GameState, feedback: Option<&FeedbackBanner>) -> Self {
        let m = &state.rules.state;
        let serving = match state.rules.ai_serve_remaining() {
            Some(secs) => format!("AI serves in {:.1}s", secs.max(0.0)),
            None => format!("Serving: {}", m.serving.as_str()),
        };

        Self {
            failures: format!("Failures: {}/{}", m.failure_count, m.max_failures),
            serving,
            game_over: (state.phase() == GamePhase::GameOver).then(|| GAME_OVER_TEXT.to_string()),
            gauge: gauge(state),
            feedback: feedback.filter(|b| b.is_visible()).cloned(),
        }
    }
}

/// Gauge is only meaningful while the ball is on its way to the player
fn gauge(state: &GameState) -> Option<TimingGauge> {
    let ball = &state.ball;
    if !ball.moving || !ball.heading_to_player() {
        return None;
    }

    let thresholds = state.detector.thresholds();
    let span = thresholds.net - thresholds.fail;
    let z = ball.pos.z.clamp(thresholds.fail, thresholds.net);
    let window = state.judge.window();
    Some(TimingGauge {
        position: inverse_lerp(thresholds.fail, thresholds.net, z),
        grade: state.judge.grade_at(ball.pos.z),
        perfect_size: window.perfect_radius * 2.0 / span,
        good_size: window.good_radius * 2.0 / span,
    })
}

/// Holds presentation-side HUD state across ticks
#[derive(Debug, Clone, Default)]
pub struct Hud {
    feedback: Option<FeedbackBanner>,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up this tick's events
    pub fn observe(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Timing(result) => self.feedback = Some(FeedbackBanner::new(result)),
                GameEvent::Restarted => self.feedback = None,
                _ => {}
            }
        }
    }

    /// Fade feedback by wall-clock frame time
    pub fn update(&mut self, dt: f32) {
        if let Some(banner) = &mut self.feedback {
            banner.remaining -= dt;
            if !banner.is_visible() {
                self.feedback = None;
            }
        }
    }

    pub fn feedback(&self) -> Option<&FeedbackBanner> {
        self.feedback.as_ref()
    }

    pub fn snapshot(&self, state: &GameState) -> HudSnapshot {
        HudSnapshot::capture(state, self.feedback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BoundaryEvent, CurveDirection};
    use glam::Vec3;

    fn perfect_left() -> TimingResult {
        TimingResult {
            grade: TimingGrade::Perfect,
            curve: Some(CurveDirection::Left),
            distance: 0.1,
        }
    }

    #[test]
    fn test_fresh_game_text() {
        let state = GameState::new(1);
        let hud = Hud::new().snapshot(&state);
        assert_eq!(hud.failures, "Failures: 0/3");
        assert_eq!(hud.serving, "Serving: PLAYER");
        assert_eq!(hud.game_over, None);
        assert_eq!(hud.gauge, None);
        assert_eq!(hud.feedback, None);
    }

    #[test]
    fn test_pending_ai_serve_countdown() {
        let mut state = GameState::new(1);
        state.dispatch(BoundaryEvent::AutoFail { z: -5.0 });
        state.dispatch(BoundaryEvent::AutoFail { z: -5.0 });
        let hud = HudSnapshot::capture(&state, None);
        assert_eq!(hud.failures, "Failures: 2/3");
        assert_eq!(hud.serving, "AI serves in 2.0s");
    }

    #[test]
    fn test_game_over_text() {
        let mut state = GameState::new(1);
        for _ in 0..3 {
            state.dispatch(BoundaryEvent::AutoFail { z: -5.0 });
        }
        let hud = HudSnapshot::capture(&state, None);
        assert_eq!(hud.game_over.as_deref(), Some(GAME_OVER_TEXT));
    }

    #[test]
    fn test_gauge_follows_incoming_ball() {
        let mut state = GameState::new(1);
        state
            .ball
            .launch(Vec3::new(0.0, 1.1, -4.0), Vec3::new(0.0, 1.1, -5.0));

        let gauge = HudSnapshot::capture(&state, None).gauge;
        let Some(gauge) = gauge else {
            panic!("gauge should be shown for an incoming ball");
        };
        assert!((gauge.position - 0.2).abs() < 1e-5);
        assert_eq!(gauge.grade, TimingGrade::Perfect);
        assert!((gauge.perfect_size - 0.12).abs() < 1e-5);
        assert!((gauge.good_size - 0.2).abs() < 1e-5);

        // Outgoing ball has no gauge
        state.ball.launch(Vec3::new(0.0, 1.1, -4.0), Vec3::new(0.0, 1.1, 4.0));
        assert_eq!(HudSnapshot::capture(&state, None).gauge, None);
    }

    #[test]
    fn test_feedback_fades_out() {
        let state = GameState::new(1);
        let mut hud = Hud::new();
        hud.observe(&[GameEvent::Timing(perfect_left())]);

        let banner = hud.snapshot(&state).feedback;
        assert_eq!(
            banner.as_ref().map(|b| b.text.as_str()),
            Some("PERFECT\nCurve to Left")
        );
        assert_eq!(banner.map(|b| b.alpha()), Some(1.0));

        hud.update(0.5);
        let alpha = hud.feedback().map(|b| b.alpha()).unwrap_or_default();
        assert!((alpha - 0.5).abs() < 1e-5);

        hud.update(0.6);
        assert!(hud.feedback().is_none());
    }

    #[test]
    fn test_restart_clears_feedback() {
        let mut hud = Hud::new();
        hud.observe(&[GameEvent::Timing(perfect_left()), GameEvent::Restarted]);
        assert!(hud.feedback().is_none());
    }
}

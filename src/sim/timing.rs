//! Return timing judge
//!
//! Classifies a return by how far the ball was from the player racket plane
//! at contact, then turns the player's lateral input into an outgoing heading.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::{CURVE_EPSILON, RETURN_ANGLE_MULTIPLIER};
use crate::settings::{Settings, TableBounds, TimingWindow};

/// Timing classification, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimingGrade {
    Perfect,
    Good,
    Miss,
}

impl TimingGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingGrade::Perfect => "PERFECT",
            TimingGrade::Good => "GOOD",
            TimingGrade::Miss => "MISS",
        }
    }

    /// Whether the ball goes back over the net
    pub fn is_return(&self) -> bool {
        !matches!(self, TimingGrade::Miss)
    }
}

/// Classify a depth distance from the racket plane
pub fn classify(distance: f32, window: &TimingWindow) -> TimingGrade {
    if distance <= window.perfect_radius {
        TimingGrade::Perfect
    } else if distance <= window.good_radius {
        TimingGrade::Good
    } else {
        TimingGrade::Miss
    }
}

/// Which way a curved return bends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveDirection {
    Left,
    Right,
}

impl CurveDirection {
    /// Direction of a curve effect, if it is large enough to count
    pub fn from_effect(curve: f32) -> Option<Self> {
        if curve.abs() <= CURVE_EPSILON {
            None
        } else if curve > 0.0 {
            Some(CurveDirection::Right)
        } else {
            Some(CurveDirection::Left)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CurveDirection::Left => "Curve to Left",
            CurveDirection::Right => "Curve to Right",
        }
    }
}

/// How the player produced the return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    /// Primary button press-drag-release; lateral input is the drag distance
    Drag,
    /// Secondary button swing; lateral input is pointer velocity at contact
    Swing,
}

/// A return attempt from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnAttempt {
    pub kind: ReturnKind,
    /// Ball depth when the return was made
    pub contact_depth: f32,
    pub racket_x: f32,
    pub lateral_input: f32,
    pub curve_multiplier: f32,
}

impl ReturnAttempt {
    /// Lateral bias of the return. Rightward input curves left.
    #[inline]
    pub fn curve_effect(&self) -> f32 {
        -self.lateral_input * self.curve_multiplier
    }
}

/// Classification handed to presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingResult {
    pub grade: TimingGrade,
    pub curve: Option<CurveDirection>,
    /// Depth distance from the racket plane at contact
    pub distance: f32,
}

impl TimingResult {
    /// Text shown to the player, e.g. "PERFECT\nCurve to Left"
    pub fn label(&self) -> String {
        match self.curve {
            Some(curve) => format!("{}\n{}", self.grade.as_str(), curve.label()),
            None => self.grade.as_str().to_string(),
        }
    }
}

/// Outcome of judging one attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnVerdict {
    pub result: TimingResult,
    /// New heading for the ball, `None` on a miss
    pub dir: Option<Vec3>,
    /// Set when a perfect curved return aimed straight at a table edge
    pub precision_shot: bool,
}

/// Judges return attempts against the configured timing window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingJudge {
    racket_depth: f32,
    /// Depth precision shots aim at
    target_depth: f32,
    window: TimingWindow,
    table: TableBounds,
}

impl TimingJudge {
    pub fn new(settings: &Settings) -> Self {
        Self {
            racket_depth: settings.thresholds.player_racket,
            target_depth: settings.thresholds.ai_table,
            window: settings.timing,
            table: settings.table,
        }
    }

    pub fn window(&self) -> &TimingWindow {
        &self.window
    }

    /// Grade a ball depth without judging an attempt (gauge colouring)
    pub fn grade_at(&self, depth: f32) -> TimingGrade {
        classify((depth - self.racket_depth).abs(), &self.window)
    }

    /// Judge an attempt made while the ball is at `ball_pos`
    pub fn judge(&self, attempt: &ReturnAttempt, ball_pos: Vec3) -> ReturnVerdict {
        let distance = (attempt.contact_depth - self.racket_depth).abs();
        let grade = classify(distance, &self.window);

        if !grade.is_return() {
            log::info!(
                "{:?} return missed (contact z={:.2}, distance {:.2})",
                attempt.kind,
                attempt.contact_depth,
                distance
            );
            return ReturnVerdict {
                result: TimingResult {
                    grade,
                    curve: None,
                    distance,
                },
                dir: None,
                precision_shot: false,
            };
        }

        let curve = attempt.curve_effect();
        let curve_dir = CurveDirection::from_effect(curve);
        let precision_shot = grade == TimingGrade::Perfect && curve_dir.is_some();

        let dir = if precision_shot {
            let edge_x = if curve > 0.0 {
                self.table.max_x
            } else {
                self.table.min_x
            };
            let target = Vec3::new(edge_x, ball_pos.y, self.target_depth);
            (target - ball_pos).normalize_or_zero()
        } else {
            return_direction(ball_pos.x, attempt.racket_x, curve)
        };

        log::info!(
            "{} {:?} return: racket x={:.2}, ball x={:.2}, curve {:.2}, dir {}",
            grade.as_str(),
            attempt.kind,
            attempt.racket_x,
            ball_pos.x,
            curve,
            dir
        );

        ReturnVerdict {
            result: TimingResult {
                grade,
                curve: curve_dir,
                distance,
            },
            dir: Some(dir),
            precision_shot,
        }
    }
}

/// Regular return heading: angle from where the racket met the ball, plus
/// curve, always travelling toward the AI
pub fn return_direction(ball_x: f32, racket_x: f32, curve: f32) -> Vec3 {
    let lateral = (racket_x - ball_x) * RETURN_ANGLE_MULTIPLIER + curve;
    Vec3::new(lateral, 0.0, 1.0).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn judge() -> TimingJudge {
        TimingJudge::new(&Settings::default())
    }

    fn attempt(contact_depth: f32, racket_x: f32, lateral_input: f32) -> ReturnAttempt {
        ReturnAttempt {
            kind: ReturnKind::Drag,
            contact_depth,
            racket_x,
            lateral_input,
            curve_multiplier: 1.5,
        }
    }

    #[test]
    fn test_classify_windows() {
        let w = TimingWindow::default();
        assert_eq!(classify(0.2, &w), TimingGrade::Perfect);
        assert_eq!(classify(0.3, &w), TimingGrade::Perfect);
        assert_eq!(classify(0.45, &w), TimingGrade::Good);
        assert_eq!(classify(0.5, &w), TimingGrade::Good);
        assert_eq!(classify(0.51, &w), TimingGrade::Miss);
    }

    #[test]
    fn test_contact_just_past_racket_is_perfect() {
        let v = judge().judge(&attempt(-4.2, 0.0, 0.0), Vec3::new(0.0, 1.1, -4.2));
        assert_eq!(v.result.grade, TimingGrade::Perfect);
        assert!((v.result.distance - 0.2).abs() < 1e-5);
        assert!(!v.precision_shot);
    }

    #[test]
    fn test_miss_keeps_heading() {
        let v = judge().judge(&attempt(-4.6, 0.0, 1.0), Vec3::new(0.0, 1.1, -4.6));
        assert_eq!(v.result.grade, TimingGrade::Miss);
        assert!(v.dir.is_none());
        assert!(v.result.curve.is_none());
    }

    #[test]
    fn test_straight_return_goes_forward() {
        let v = judge().judge(&attempt(-4.0, 0.0, 0.0), Vec3::new(0.0, 1.1, -4.0));
        assert_eq!(v.dir, Some(Vec3::Z));
        assert_eq!(v.result.label(), "PERFECT");
    }

    #[test]
    fn test_racket_offset_angles_return() {
        // Racket right of the ball pushes the ball right
        let v = judge().judge(&attempt(-4.4, 1.0, 0.0), Vec3::new(0.0, 1.1, -4.4));
        assert_eq!(v.result.grade, TimingGrade::Good);
        let dir = v.dir.unwrap();
        assert!(dir.x > 0.0 && dir.z > 0.0);
        assert!((dir.x / dir.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_rightward_drag_curves_left() {
        let v = judge().judge(&attempt(-4.45, 0.0, 0.4), Vec3::new(0.0, 1.1, -4.45));
        assert_eq!(v.result.grade, TimingGrade::Good);
        assert_eq!(v.result.curve, Some(CurveDirection::Left));
        let dir = v.dir.unwrap();
        assert!((dir.x / dir.z + 0.6).abs() < 1e-5);
        assert_eq!(v.result.label(), "GOOD\nCurve to Left");
    }

    #[test]
    fn test_perfect_curve_aims_at_table_edge() {
        let ball = Vec3::new(0.2, 1.1, -4.1);
        let v = judge().judge(&attempt(-4.1, 0.0, -0.5), ball);
        assert!(v.precision_shot);
        assert_eq!(v.result.curve, Some(CurveDirection::Right));

        let dir = v.dir.unwrap();
        let t = (2.0 - ball.z) / dir.z;
        let hit = ball + dir * t;
        assert!((hit.x - 1.5).abs() < 1e-4);
        assert!((hit.y - 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_tiny_curve_is_straight() {
        assert_eq!(CurveDirection::from_effect(0.005), None);
        assert_eq!(CurveDirection::from_effect(-0.02), Some(CurveDirection::Left));
        let v = judge().judge(&attempt(-4.0, 0.0, 0.005), Vec3::new(0.0, 1.1, -4.0));
        assert!(!v.precision_shot);
        assert!(v.result.curve.is_none());
    }

    #[test]
    fn test_grade_at() {
        let j = judge();
        assert_eq!(j.grade_at(-3.8), TimingGrade::Perfect);
        assert_eq!(j.grade_at(-3.6), TimingGrade::Good);
        assert_eq!(j.grade_at(-1.0), TimingGrade::Miss);
    }

    proptest! {
        #[test]
        fn prop_classification_is_monotonic(a in 0.0f32..2.0, b in 0.0f32..2.0) {
            let w = TimingWindow::default();
            let (near, far) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(classify(near, &w) <= classify(far, &w));
        }

        #[test]
        fn prop_returns_always_head_to_ai(
            contact in -4.5f32..-3.5,
            racket_x in -2.2f32..2.2,
            ball_x in -2.0f32..2.0,
            input in -3.0f32..3.0
        ) {
            let v = judge().judge(&attempt(contact, racket_x, input), Vec3::new(ball_x, 1.1, contact));
            if let Some(dir) = v.dir {
                prop_assert!(dir.z > 0.0);
                prop_assert!((dir.length() - 1.0).abs() < 1e-4);
            }
        }
    }
}

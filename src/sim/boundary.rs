//! Boundary crossing detection
//!
//! The ball only ever moves in straight lines, so every gameplay rule hangs off
//! the moment its depth coordinate passes one of a handful of fixed planes.
//! Each plane fires once per approach and stays fired until re-armed.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, predict_at_depth};
use super::rules::Side;
use crate::consts::DEPTH_EPSILON;
use crate::settings::{Settings, SnapHeights, TableBounds, Thresholds};

/// Depth planes that trigger a handler. The net has no handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Threshold {
    AiRacket,
    AiTable,
    PlayerTable,
    PlayerRacket,
    Fail,
}

impl Threshold {
    /// Evaluation order, AI side first
    pub const ALL: [Threshold; 5] = [
        Threshold::AiRacket,
        Threshold::AiTable,
        Threshold::PlayerTable,
        Threshold::PlayerRacket,
        Threshold::Fail,
    ];

    /// Side of the net the plane sits on; also the direction it is crossed in
    pub fn side(&self) -> Side {
        match self {
            Threshold::AiRacket | Threshold::AiTable => Side::Ai,
            Threshold::PlayerTable | Threshold::PlayerRacket | Threshold::Fail => Side::Player,
        }
    }

    pub fn depth(&self, thresholds: &Thresholds) -> f32 {
        match self {
            Threshold::AiRacket => thresholds.ai_racket,
            Threshold::AiTable => thresholds.ai_table,
            Threshold::PlayerTable => thresholds.player_table,
            Threshold::PlayerRacket => thresholds.player_racket,
            Threshold::Fail => thresholds.fail,
        }
    }

    pub fn height(&self, heights: &SnapHeights) -> f32 {
        match self {
            Threshold::AiRacket => heights.ai_racket,
            Threshold::AiTable => heights.ai_table,
            Threshold::PlayerTable => heights.player_table,
            Threshold::PlayerRacket => heights.player_racket,
            Threshold::Fail => heights.fail,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlagState {
    #[default]
    Armed,
    Fired,
}

/// One-shot state per threshold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFlags {
    states: [FlagState; 5],
}

impl BoundaryFlags {
    pub fn get(&self, threshold: Threshold) -> FlagState {
        self.states[threshold.index()]
    }

    pub fn is_armed(&self, threshold: Threshold) -> bool {
        self.get(threshold) == FlagState::Armed
    }

    /// Mark fired. Returns false if it had already fired.
    pub fn fire(&mut self, threshold: Threshold) -> bool {
        let slot = &mut self.states[threshold.index()];
        let was_armed = *slot == FlagState::Armed;
        *slot = FlagState::Fired;
        was_armed
    }

    pub fn reset_all(&mut self) {
        self.states = [FlagState::Armed; 5];
    }

    /// Re-arm every threshold on one side of the net
    pub fn reset_side(&mut self, side: Side) {
        for t in Threshold::ALL.iter().filter(|t| t.side() == side) {
            self.states[t.index()] = FlagState::Armed;
        }
    }
}

/// What happened at a boundary this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryEvent {
    /// AI racket sent the ball back; `x` is where it was struck
    AiReturned { x: f32, corrected: bool },
    /// Player's return bounced on the AI half
    AiTableBounce { x: f32 },
    /// Player's return missed the table
    OffTable { x: f32 },
    PlayerTableBounce { x: f32 },
    /// Ball reached the player racket plane; returns are judged from here
    PlayerWindowOpened,
    /// Ball passed the fail line unreturned
    AutoFail { z: f32 },
    /// Ball left the outer envelope and was parked
    ForcedReset { z: f32 },
}

impl BoundaryEvent {
    /// Whether this event costs the player a point
    pub fn is_failure(&self) -> bool {
        matches!(self, BoundaryEvent::OffTable { .. } | BoundaryEvent::AutoFail { .. })
    }
}

/// Result of steering a reflected shot back onto the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryCorrection {
    pub dir: Vec3,
    /// Lateral landing point before correction
    pub predicted_x: f32,
    /// Lateral landing point after correction
    pub target_x: f32,
    pub corrected: bool,
}

/// Keep a shot leaving `pos` along `dir` inside the table at depth `target_z`.
///
/// If the uncorrected landing point is off the table, the lateral component
/// is re-solved so the ball lands on the nearest edge pulled in by the safe
/// margin, with the same depth component.
pub fn correct_trajectory(
    pos: Vec3,
    dir: Vec3,
    target_z: f32,
    table: &TableBounds,
) -> TrajectoryCorrection {
    let unchanged = |x| TrajectoryCorrection {
        dir,
        predicted_x: x,
        target_x: x,
        corrected: false,
    };

    if dir.z.abs() < DEPTH_EPSILON {
        return unchanged(pos.x);
    }
    let time = (target_z - pos.z) / dir.z;
    let predicted_x = pos.x + dir.x * time;
    if table.contains(predicted_x) || time.abs() < DEPTH_EPSILON {
        return unchanged(predicted_x);
    }

    let target_x = table.clamp_safe(predicted_x);
    let mut new_dir = dir;
    new_dir.x = (target_x - pos.x) / time;

    TrajectoryCorrection {
        dir: new_dir.normalize(),
        predicted_x,
        target_x,
        corrected: true,
    }
}

/// Watches the ball's depth and runs the handler of every plane it crosses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryDetector {
    pub flags: BoundaryFlags,
    thresholds: Thresholds,
    heights: SnapHeights,
    table: TableBounds,
    idle_position: Vec3,
}

impl BoundaryDetector {
    pub fn new(settings: &Settings) -> Self {
        Self {
            flags: BoundaryFlags::default(),
            thresholds: settings.thresholds,
            heights: settings.heights,
            table: settings.table,
            idle_position: settings.idle_position,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Re-arm everything (new serve, restart)
    pub fn reset_all(&mut self) {
        self.flags.reset_all();
        log::debug!("Boundary flags reset");
    }

    /// Re-arm the AI-side planes after a successful player return
    pub fn reset_ai_side(&mut self) {
        self.flags.reset_side(Side::Ai);
        log::debug!("AI-side flags reset (player return)");
    }

    /// Run every handler whose plane the ball crossed between `prev_z` and its
    /// current depth. Handlers mutate the ball directly; everything the rest
    /// of the game needs to react to comes back as events, in firing order.
    pub fn evaluate(&mut self, ball: &mut Ball, prev_z: f32) -> Vec<BoundaryEvent> {
        let curr_z = ball.pos.z;
        // Handlers may flip the heading; crossings are judged on the heading
        // the ball arrived with.
        let heading = ball.dir.z;
        let mut events = Vec::new();

        for threshold in Threshold::ALL {
            if !self.crossed(threshold, prev_z, curr_z, heading) {
                continue;
            }
            self.flags.fire(threshold);
            let event = self.handle(threshold, ball);
            let is_off_table = matches!(event, BoundaryEvent::OffTable { .. });
            events.push(event);
            if is_off_table {
                return events;
            }
        }

        if self.thresholds.outside_envelope(curr_z) {
            self.force_reset(ball, curr_z);
            events.push(BoundaryEvent::ForcedReset { z: curr_z });
        }

        events
    }

    fn crossed(&self, threshold: Threshold, prev_z: f32, curr_z: f32, heading: f32) -> bool {
        if !self.flags.is_armed(threshold) {
            return false;
        }
        let depth = threshold.depth(&self.thresholds);
        match threshold.side() {
            Side::Ai => heading > 0.0 && prev_z < depth && curr_z >= depth,
            Side::Player => heading < 0.0 && prev_z > depth && curr_z <= depth,
        }
    }

    fn handle(&mut self, threshold: Threshold, ball: &mut Ball) -> BoundaryEvent {
        let x = ball.pos.x;
        let snap = threshold.height(&self.heights);
        match threshold {
            Threshold::AiRacket => {
                ball.set_height(snap);
                let mut dir = ball.dir;
                dir.z = -dir.z.abs();

                let correction =
                    correct_trajectory(ball.pos, dir, self.thresholds.player_table, &self.table);
                if correction.corrected {
                    log::debug!(
                        "Trajectory corrected: landing x {:.2} -> {:.2}, dir {}",
                        correction.predicted_x,
                        correction.target_x,
                        correction.dir
                    );
                } else {
                    log::debug!("Trajectory ok: landing x {:.2}", correction.predicted_x);
                }
                ball.set_direction(correction.dir);

                self.flags.reset_side(Side::Player);
                log::debug!("AI racket return at x={:.2}", x);
                BoundaryEvent::AiReturned {
                    x,
                    corrected: correction.corrected,
                }
            }
            Threshold::AiTable => {
                // Judge the bounce where the ball met the plane, not where the
                // tick left it
                let x = predict_at_depth(ball.pos, ball.dir, self.thresholds.ai_table).x;
                ball.set_height(snap);
                if self.table.contains_within(x, DEPTH_EPSILON) {
                    log::debug!("AI table bounce at x={:.2}", x);
                    BoundaryEvent::AiTableBounce { x }
                } else {
                    ball.stop();
                    log::info!("Return went off the table at x={:.2}", x);
                    BoundaryEvent::OffTable { x }
                }
            }
            Threshold::PlayerTable => {
                ball.set_height(snap);
                log::debug!("Player table bounce at x={:.2}", x);
                BoundaryEvent::PlayerTableBounce { x }
            }
            Threshold::PlayerRacket => {
                ball.set_height(snap);
                log::debug!("Ball at player racket plane, waiting for return");
                BoundaryEvent::PlayerWindowOpened
            }
            Threshold::Fail => {
                let z = ball.pos.z;
                ball.set_height(snap);
                ball.stop();
                log::info!("Ball passed the fail line at z={:.2}", z);
                BoundaryEvent::AutoFail { z }
            }
        }
    }

    /// Stop everything and park the ball at the idle position. Serve rotation
    /// is left alone; the next serve has to come from the match controller.
    fn force_reset(&mut self, ball: &mut Ball, z: f32) {
        log::error!("Ball escaped to z={:.2}, forcing reset", z);
        ball.stop();
        self.flags.reset_all();
        ball.reset_to(self.idle_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;

    fn detector() -> BoundaryDetector {
        BoundaryDetector::new(&Settings::default())
    }

    fn ball_at(pos: Vec3, dir: Vec3) -> Ball {
        let mut ball = Ball::default();
        ball.launch(pos, pos + dir);
        ball
    }

    /// Step until an event matching `pred` appears or the ball stops
    fn run_until(
        det: &mut BoundaryDetector,
        ball: &mut Ball,
        pred: impl Fn(&BoundaryEvent) -> bool,
    ) -> Option<BoundaryEvent> {
        for _ in 0..10_000 {
            if !ball.moving {
                return None;
            }
            let prev = ball.pos.z;
            ball.advance(SIM_DT);
            if let Some(e) = det.evaluate(ball, prev).into_iter().find(|e| pred(e)) {
                return Some(e);
            }
        }
        None
    }

    #[test]
    fn test_straight_ai_reflection_is_not_corrected() {
        let mut det = detector();
        let mut ball = Ball::default();
        ball.launch(Vec3::new(0.0, 1.2, -4.0), Vec3::new(0.0, 1.2, 4.0));

        let event = run_until(&mut det, &mut ball, |e| {
            matches!(e, BoundaryEvent::AiReturned { .. })
        });
        assert_eq!(
            event,
            Some(BoundaryEvent::AiReturned {
                x: 0.0,
                corrected: false
            })
        );
        assert!(ball.dir.z < 0.0);
        assert!(ball.dir.x.abs() < 1e-6);
        assert!((ball.dir.z + 1.0).abs() < 1e-6);
        assert_eq!(ball.pos.y, 1.1);
    }

    #[test]
    fn test_off_table_reflection_is_pulled_in() {
        let mut det = detector();
        // After reflection this heading lands at x = 0.5 + 6 * 0.25 = 2.0
        let mut ball = ball_at(Vec3::new(0.5, 1.2, 3.99), Vec3::new(0.25, 0.0, 1.0));
        ball.pos.z = 4.0;

        let events = det.evaluate(&mut ball, 3.99);
        assert!(matches!(
            events[0],
            BoundaryEvent::AiReturned {
                corrected: true,
                ..
            }
        ));
        let landing = ball.predict_position_at_depth(-2.0);
        assert!((landing.x - 1.4).abs() < 1e-4, "landing {}", landing.x);
        assert!((ball.dir.length() - 1.0).abs() < 1e-5);
        assert!(ball.dir.z < 0.0);
    }

    #[test]
    fn test_correct_trajectory_reports_prediction() {
        let table = TableBounds::default();
        let dir = Vec3::new(0.25, 0.0, -1.0).normalize();
        let c = correct_trajectory(Vec3::new(0.5, 1.1, 4.0), dir, -2.0, &table);
        assert!(c.corrected);
        assert!((c.predicted_x - 2.0).abs() < 1e-4);
        assert!((c.target_x - 1.4).abs() < 1e-6);

        let mirrored = Vec3::new(-0.25, 0.0, -1.0).normalize();
        let c = correct_trajectory(Vec3::new(-0.5, 1.1, 4.0), mirrored, -2.0, &table);
        assert!(c.corrected);
        assert!((c.target_x + 1.4).abs() < 1e-6);
    }

    #[test]
    fn test_handlers_fire_once_until_reset() {
        let mut det = detector();
        let mut ball = ball_at(Vec3::new(0.0, 1.2, 1.99), Vec3::Z);
        ball.pos.z = 2.0;

        let first = det.evaluate(&mut ball, 1.99);
        assert_eq!(first, vec![BoundaryEvent::AiTableBounce { x: 0.0 }]);
        let again = det.evaluate(&mut ball, 1.99);
        assert!(again.is_empty());

        det.reset_ai_side();
        let rearmed = det.evaluate(&mut ball, 1.99);
        assert_eq!(rearmed.len(), 1);
    }

    #[test]
    fn test_wrong_heading_does_not_fire() {
        let mut det = detector();
        // Travelling toward the player while passing z = 2 upward is impossible,
        // but a stale prev_z must not trigger the AI table either
        let mut ball = ball_at(Vec3::new(0.0, 1.2, 2.0), Vec3::NEG_Z);
        assert!(det.evaluate(&mut ball, 1.9).is_empty());
        assert!(det.flags.is_armed(Threshold::AiTable));
    }

    #[test]
    fn test_off_table_bounce_stops_ball_and_skips_rest() {
        let mut det = detector();
        let mut ball = ball_at(Vec3::new(1.8, 1.2, 1.99), Vec3::Z);
        ball.pos.z = 2.0;

        let events = det.evaluate(&mut ball, 1.99);
        assert_eq!(events, vec![BoundaryEvent::OffTable { x: 1.8 }]);
        assert!(events[0].is_failure());
        assert!(!ball.moving);
        assert_eq!(ball.pos.y, 0.8);
    }

    #[test]
    fn test_edge_shot_judged_at_the_plane() {
        let mut det = detector();
        let dir = Vec3::new(0.5, 0.0, 1.0);
        let mut ball = ball_at(Vec3::new(1.495, 1.2, 1.99), dir);
        // One tick past the plane the ball is already beyond the edge
        ball.pos = Vec3::new(1.505, 1.2, 2.01);

        let events = det.evaluate(&mut ball, 1.99);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], BoundaryEvent::AiTableBounce { .. }));
        assert!(ball.moving);
    }

    #[test]
    fn test_player_side_sequence() {
        let mut det = detector();
        let mut ball = Ball::default();
        ball.launch(Vec3::new(0.0, 1.2, 4.0), Vec3::new(0.0, 1.2, -4.0));

        let mut seen = Vec::new();
        while ball.moving {
            let prev = ball.pos.z;
            ball.advance(SIM_DT);
            seen.extend(det.evaluate(&mut ball, prev));
        }
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], BoundaryEvent::PlayerTableBounce { .. }));
        assert_eq!(seen[1], BoundaryEvent::PlayerWindowOpened);
        assert!(matches!(seen[2], BoundaryEvent::AutoFail { .. }));
        assert!(ball.pos.z <= -5.0);
        assert_eq!(ball.pos.y, 1.2);
    }

    #[test]
    fn test_fail_line_fires_exactly_once() {
        let mut det = detector();
        let mut ball = ball_at(Vec3::new(0.0, 1.2, -4.99), Vec3::NEG_Z);
        ball.pos.z = -5.01;

        let events = det.evaluate(&mut ball, -4.99);
        let fails = events.iter().filter(|e| e.is_failure()).count();
        assert_eq!(fails, 1);
        assert!(!ball.moving);

        // Even if something kept pushing the ball, the line stays fired
        ball.moving = true;
        ball.pos.z = -5.02;
        assert!(det.evaluate(&mut ball, -5.01).is_empty());
    }

    #[test]
    fn test_ai_return_rearms_player_side() {
        let mut det = detector();
        det.flags.fire(Threshold::PlayerTable);
        det.flags.fire(Threshold::PlayerRacket);
        det.flags.fire(Threshold::Fail);

        let mut ball = ball_at(Vec3::new(0.0, 1.2, 3.99), Vec3::Z);
        ball.pos.z = 4.0;
        det.evaluate(&mut ball, 3.99);

        assert!(!det.flags.is_armed(Threshold::AiRacket));
        assert!(det.flags.is_armed(Threshold::PlayerTable));
        assert!(det.flags.is_armed(Threshold::PlayerRacket));
        assert!(det.flags.is_armed(Threshold::Fail));
    }

    #[test]
    fn test_envelope_escape_forces_reset() {
        let mut det = detector();
        det.flags.fire(Threshold::AiRacket);
        let mut ball = ball_at(Vec3::new(0.3, 1.2, 5.0), Vec3::Z);
        ball.pos.z = 5.2;

        let events = det.evaluate(&mut ball, 5.0);
        assert_eq!(events, vec![BoundaryEvent::ForcedReset { z: 5.2 }]);
        assert!(!ball.moving);
        assert_eq!(ball.pos, Vec3::new(0.0, 1.2, -4.0));
        assert_eq!(ball.dir, Vec3::ZERO);
        assert!(Threshold::ALL.iter().all(|t| det.flags.is_armed(*t)));
    }

    #[test]
    fn test_reset_side() {
        let mut flags = BoundaryFlags::default();
        for t in Threshold::ALL {
            assert!(flags.fire(t));
            assert!(!flags.fire(t));
        }
        flags.reset_side(Side::Ai);
        assert!(flags.is_armed(Threshold::AiRacket));
        assert!(flags.is_armed(Threshold::AiTable));
        assert!(!flags.is_armed(Threshold::PlayerTable));
        flags.reset_side(Side::Player);
        assert!(Threshold::ALL.iter().all(|t| flags.is_armed(*t)));
    }

    proptest! {
        #[test]
        fn prop_reflected_shots_land_on_table(
            x in -3.0f32..3.0,
            dx in -2.0f32..2.0,
            dz in 0.05f32..1.0
        ) {
            let mut det = detector();
            let mut ball = ball_at(Vec3::new(x, 1.2, 3.99), Vec3::new(dx, 0.0, dz));
            ball.pos.z = 4.0;

            let events = det.evaluate(&mut ball, 3.99);
            let corrected = match events.first() {
                Some(BoundaryEvent::AiReturned { corrected, .. }) => *corrected,
                other => panic!("expected AI return, got {:?}", other),
            };
            prop_assert!(ball.dir.z < 0.0);

            let landing = ball.predict_position_at_depth(-2.0).x;
            let table = TableBounds::default();
            prop_assert!(landing >= table.min_x - 1e-3 && landing <= table.max_x + 1e-3);
            if corrected {
                prop_assert!(landing >= table.min_x + table.safe_margin - 1e-3);
                prop_assert!(landing <= table.max_x - table.safe_margin + 1e-3);
            }
        }

        #[test]
        fn prop_each_plane_fires_at_most_once(steps in 1usize..2000, dx in -0.3f32..0.3) {
            let mut det = detector();
            let mut ball = Ball::default();
            ball.launch(Vec3::new(0.0, 1.2, -3.9), Vec3::new(dx, 1.2, 4.0));

            let mut returns = 0;
            let mut fails = 0;
            for _ in 0..steps {
                let prev = ball.pos.z;
                ball.advance(SIM_DT);
                for e in det.evaluate(&mut ball, prev) {
                    match e {
                        BoundaryEvent::AiReturned { .. } => returns += 1,
                        e if e.is_failure() => fails += 1,
                        _ => {}
                    }
                }
            }
            prop_assert!(returns <= 1);
            prop_assert!(fails <= 1);
        }
    }
}

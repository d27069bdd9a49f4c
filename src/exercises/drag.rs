use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::gesture::{fingertip_centroid, GraspEdge, GraspMode, GraspThresholds, GraspTracker};

use super::{FrameInput, InteractionModel, Progress, Verdict};

const ENABLE_LOGS: bool = false;

/// Random draws tried before a respawn falls back to the target border.
const RESPAWN_ATTEMPTS: usize = 32;

use crate::log_debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Cumulative placements needed to clear each level.
    pub level_thresholds: Vec<u32>,
    pub time_limit_secs: u64,
    pub target: Rect,
    pub grasp: GraspMode,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            level_thresholds: vec![5, 10, 15, 20],
            time_limit_secs: 60,
            target: Rect::new(0.16, 0.2, 0.33, 0.42),
            grasp: GraspMode::Fist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Cube,
    Rectangle,
    Circle,
    Triangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Cube,
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Triangle,
    ];

    /// Width and height on a 4:3 play field, normalized.
    pub fn footprint(&self) -> (f32, f32) {
        match self {
            Self::Cube => (0.11, 0.145),
            Self::Rectangle => (0.155, 0.125),
            Self::Circle => (0.155, 0.21),
            Self::Triangle => (0.125, 0.165),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub center: Point,
    pub color: [u8; 3],
}

impl Shape {
    pub fn new(kind: ShapeKind, center: Point, color: [u8; 3]) -> Self {
        Self {
            kind,
            center,
            color,
        }
    }

    pub fn bounds(&self) -> Rect {
        let (w, h) = self.kind.footprint();
        Rect::centered(self.center, w, h)
    }

    /// Hit test against the drawn outline.
    pub fn contains(&self, p: Point) -> bool {
        match self.kind {
            ShapeKind::Circle => {
                let (w, h) = self.kind.footprint();
                let dx = (p.x - self.center.x) / (w / 2.0);
                let dy = (p.y - self.center.y) / (h / 2.0);
                dx * dx + dy * dy < 1.0
            }
            _ => self.bounds().contains(p),
        }
    }
}

/// Grab shapes and drop them in the target region before time runs out.
#[derive(Debug, Clone)]
pub struct DragModel {
    settings: DragSettings,
    shapes: Vec<Shape>,
    held: Option<usize>,
    tracker: GraspTracker,
}

impl DragModel {
    pub fn new(settings: DragSettings, grasp: GraspThresholds) -> Self {
        let tracker = GraspTracker::new(settings.grasp, grasp);
        Self {
            settings,
            shapes: Vec::new(),
            held: None,
            tracker,
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn held(&self) -> Option<&Shape> {
        self.held.and_then(|i| self.shapes.get(i))
    }

    pub fn target(&self) -> Rect {
        self.settings.target
    }

    fn initial_shapes() -> Vec<Shape> {
        vec![
            Shape::new(ShapeKind::Cube, Point::new(0.84, 0.28), [0, 255, 255]),
            Shape::new(ShapeKind::Rectangle, Point::new(0.86, 0.48), [255, 255, 0]),
            Shape::new(ShapeKind::Circle, Point::new(0.86, 0.73), [0, 0, 0]),
            Shape::new(ShapeKind::Triangle, Point::new(0.84, 0.92), [128, 128, 128]),
        ]
    }

    /// New random shape whose center lies outside `target`. Falls back to the
    /// target's right border, which `Rect::contains` treats as outside.
    fn random_shape(target: Rect, rng: &mut StdRng) -> Shape {
        let kind = *ShapeKind::ALL.choose(rng).unwrap_or(&ShapeKind::Cube);
        let center = (0..RESPAWN_ATTEMPTS)
            .map(|_| Point::new(rng.gen_range(0.2..0.85), rng.gen_range(0.25..0.9)))
            .find(|c| !target.contains(*c))
            .unwrap_or_else(|| Point::new(target.x + target.width, target.center().y));
        Shape::new(kind, center, rng.gen())
    }

    fn final_threshold(&self) -> u32 {
        self.settings.level_thresholds.last().copied().unwrap_or(0)
    }
}

impl InteractionModel for DragModel {
    fn reset(&mut self, _rng: &mut StdRng) {
        self.shapes = Self::initial_shapes();
        self.held = None;
        self.tracker.reset();
    }

    fn advance(&mut self, input: &FrameInput, progress: &mut Progress, rng: &mut StdRng) -> Verdict {
        let hand = input.primary_hand();
        let edge = self.tracker.update(hand.map(|h| &h.observation));

        match (edge, hand) {
            (GraspEdge::Engaged, Some(hand)) => {
                let cursor = input.point(fingertip_centroid(&hand.observation));
                self.held = self.shapes.iter().position(|s| s.contains(cursor));
                if let Some(index) = self.held {
                    log_debug!("grabbed {:?}", self.shapes[index].kind);
                }
            }
            (GraspEdge::Released, _) | (GraspEdge::Idle, _) => self.held = None,
            _ => {}
        }

        if let (Some(index), Some(hand)) = (self.held, hand) {
            self.shapes[index].center = input.point(fingertip_centroid(&hand.observation));

            if self.settings.target.contains(self.shapes[index].center) {
                progress.score += 1;
                self.shapes[index] = Self::random_shape(self.settings.target, rng);
                self.held = None;
            }
        }

        while progress.level < self.settings.level_thresholds.len()
            && progress.score >= self.settings.level_thresholds[progress.level]
        {
            progress.level += 1;
        }

        if progress.score >= self.final_threshold() {
            Verdict::Won
        } else {
            Verdict::Continue
        }
    }

    fn time_limit(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.settings.time_limit_secs))
    }

    fn instruction(&self) -> Option<&'static str> {
        Some("game2_level")
    }

    fn level_goal(&self, progress: &Progress) -> Option<u32> {
        self.settings
            .level_thresholds
            .get(progress.level)
            .or(self.settings.level_thresholds.last())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::fixtures::input_at;
    use crate::gesture::grasp::fixtures::fist_at;
    use rand::SeedableRng;
    use std::time::Instant;

    fn model() -> (DragModel, StdRng) {
        let mut rng = StdRng::seed_from_u64(21);
        let mut model = DragModel::new(DragSettings::default(), GraspThresholds::default());
        model.reset(&mut rng);
        (model, rng)
    }

    #[test]
    fn test_initial_set_has_one_of_each() {
        let (model, _) = model();
        let kinds: Vec<_> = model.shapes().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ShapeKind::ALL.to_vec());
        for shape in model.shapes() {
            assert!(!model.target().contains(shape.center));
        }
    }

    #[test]
    fn test_grab_follow_and_place() {
        let (mut model, mut rng) = model();
        let mut progress = Progress::default();
        let base = Instant::now();
        let cube = model.shapes()[0].center;

        model.advance(&input_at(base, 0, vec![fist_at((cube.x, cube.y), 0.04)]), &mut progress, &mut rng);
        assert_eq!(model.held().map(|s| s.kind), Some(ShapeKind::Cube));

        model.advance(&input_at(base, 33, vec![fist_at((0.6, 0.5), 0.04)]), &mut progress, &mut rng);
        let held = model.held().unwrap();
        assert!((held.center.x - 0.6).abs() < 1e-4);
        assert_eq!(progress.score, 0);

        let verdict = model.advance(&input_at(base, 66, vec![fist_at((0.3, 0.4), 0.04)]), &mut progress, &mut rng);
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(progress.score, 1);
        assert!(model.held().is_none());
        assert_eq!(model.shapes().len(), 4);
    }

    #[test]
    fn test_grab_needs_rising_edge_over_shape() {
        let (mut model, mut rng) = model();
        let mut progress = Progress::default();
        let base = Instant::now();
        let cube = model.shapes()[0].center;

        // Fist closed in empty space, then dragged onto the cube: no pick up.
        model.advance(&input_at(base, 0, vec![fist_at((0.5, 0.1), 0.04)]), &mut progress, &mut rng);
        model.advance(&input_at(base, 33, vec![fist_at((cube.x, cube.y), 0.04)]), &mut progress, &mut rng);
        assert!(model.held().is_none());
    }

    #[test]
    fn test_losing_the_hand_drops_the_shape() {
        let (mut model, mut rng) = model();
        let mut progress = Progress::default();
        let base = Instant::now();
        let cube = model.shapes()[0].center;

        model.advance(&input_at(base, 0, vec![fist_at((cube.x, cube.y), 0.04)]), &mut progress, &mut rng);
        assert!(model.held().is_some());
        model.advance(&input_at(base, 33, Vec::new()), &mut progress, &mut rng);
        assert!(model.held().is_none());
        assert!(model.shapes()[0].center.distance(&cube) < 1e-4);
    }

    #[test]
    fn test_thresholds_are_cumulative_milestones() {
        let (mut model, mut rng) = model();
        let mut progress = Progress {
            score: 9,
            ..Progress::default()
        };
        model.advance(&input_at(Instant::now(), 0, Vec::new()), &mut progress, &mut rng);
        assert_eq!(progress.level, 1);
        assert_eq!(model.level_goal(&progress), Some(10));

        progress.score = 20;
        let verdict = model.advance(&input_at(Instant::now(), 33, Vec::new()), &mut progress, &mut rng);
        assert_eq!(verdict, Verdict::Won);
        assert_eq!(progress.level, 4);
    }

    #[test]
    fn test_respawns_land_outside_the_target() {
        let mut rng = StdRng::seed_from_u64(3);
        let target = DragSettings::default().target;
        for _ in 0..500 {
            let shape = DragModel::random_shape(target, &mut rng);
            assert!(!target.contains(shape.center), "respawned inside target at {:?}", shape.center);
        }

        // A target covering the whole spawn area still leaves the border.
        let everywhere = Rect::new(0.1, 0.1, 0.8, 0.85);
        for _ in 0..20 {
            assert!(!everywhere.contains(DragModel::random_shape(everywhere, &mut rng).center));
        }
    }

    #[test]
    fn test_circle_hit_test_excludes_corners() {
        let circle = Shape::new(ShapeKind::Circle, Point::new(0.5, 0.5), [0, 0, 0]);
        assert!(circle.contains(Point::new(0.5, 0.5)));
        let corner = circle.bounds();
        assert!(!circle.contains(Point::new(corner.x + 0.005, corner.y + 0.005)));
    }
}

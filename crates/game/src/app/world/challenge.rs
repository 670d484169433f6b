use engine::{QuestionBank, QuestionDef, Rgba, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::terrain::{TerrainKind, TileGrid};
use crate::app::score::ScoreReporter;

pub const INTERACTION_RADIUS: f32 = 60.0;
pub const FEEDBACK_SECONDS: f32 = 1.5;
pub const HINT_AFTER_INCORRECT: u32 = 2;
const PLACEMENT_STRIDE: usize = 3;
const OBJECT_SIZE_TILES: f32 = 0.7;
pub const SOLVED_COLOR: Rgba = [96, 204, 112, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    Kiosk,
    Statue,
    Fountain,
    Signpost,
    Mailbox,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Kiosk,
        Archetype::Statue,
        Archetype::Fountain,
        Archetype::Signpost,
        Archetype::Mailbox,
    ];

    pub fn debug_name(self) -> &'static str {
        match self {
            Archetype::Kiosk => "kiosk",
            Archetype::Statue => "statue",
            Archetype::Fountain => "fountain",
            Archetype::Signpost => "signpost",
            Archetype::Mailbox => "mailbox",
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            Archetype::Kiosk => [230, 140, 40, 255],
            Archetype::Statue => [200, 200, 210, 255],
            Archetype::Fountain => [80, 170, 240, 255],
            Archetype::Signpost => [150, 100, 50, 255],
            Archetype::Mailbox => [210, 50, 60, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveObject {
    pub position: Vec2,
    pub size: Vec2,
    pub archetype: Archetype,
    pub question: QuestionDef,
    solved: bool,
}

impl InteractiveObject {
    pub fn new(position: Vec2, size: Vec2, archetype: Archetype, question: QuestionDef) -> Self {
        Self {
            position,
            size,
            archetype,
            question,
            solved: false,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (point.x - self.position.x).abs() <= self.size.x * 0.5
            && (point.y - self.position.y).abs() <= self.size.y * 0.5
    }

    pub fn display_color(&self) -> Rgba {
        if self.solved {
            SOLVED_COLOR
        } else {
            self.archetype.color()
        }
    }
}

fn is_placement_tile(kind: TerrainKind) -> bool {
    matches!(
        kind,
        TerrainKind::Sidewalk | TerrainKind::Park | TerrainKind::Path
    )
}

/// Row-major scan over every `PLACEMENT_STRIDE`-th eligible tile, keeping
/// each candidate with probability `still_needed / candidates_left`. Places
/// exactly `min(bank.len(), candidates)` objects, one question each.
pub fn place_objects(
    grid: &TileGrid,
    bank: &QuestionBank,
    rng: &mut impl Rng,
) -> Vec<InteractiveObject> {
    let candidates: Vec<(u32, u32)> = grid
        .iter()
        .filter(|(_, _, kind)| is_placement_tile(*kind))
        .map(|(col, row, _)| (col, row))
        .step_by(PLACEMENT_STRIDE)
        .collect();

    let mut questions: Vec<&QuestionDef> = bank.questions().iter().collect();
    questions.shuffle(rng);

    let size = Vec2::new(
        grid.tile_size() * OBJECT_SIZE_TILES,
        grid.tile_size() * OBJECT_SIZE_TILES,
    );
    let mut needed = questions.len().min(candidates.len());
    let mut left = candidates.len();
    let mut objects = Vec::with_capacity(needed);
    let mut questions = questions.into_iter();
    for (col, row) in candidates {
        if needed == 0 {
            break;
        }
        let keep = rng.gen_range(0..left) < needed;
        left -= 1;
        if !keep {
            continue;
        }
        let Some(question) = questions.next() else {
            break;
        };
        needed -= 1;
        let archetype = Archetype::ALL[objects.len() % Archetype::ALL.len()];
        objects.push(InteractiveObject::new(
            grid.tile_center(col, row),
            size,
            archetype,
            question.clone(),
        ));
    }
    objects
}

/// Trimmed and case-folded for comparison.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeSession {
    pub target: usize,
    pub draft: String,
    pub incorrect_attempts: u32,
    pub feedback: Option<Feedback>,
}

impl ChallengeSession {
    fn new(target: usize) -> Self {
        Self {
            target,
            draft: String::new(),
            incorrect_attempts: 0,
            feedback: None,
        }
    }

    pub fn hint_visible(&self) -> bool {
        self.incorrect_attempts >= HINT_AFTER_INCORRECT
    }

    fn accepts_input(&self) -> bool {
        self.feedback.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Opened,
    SessionAlreadyOpen,
    AlreadySolved,
    UnknownObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Correct { points: u32 },
    Incorrect,
    NoSession,
    AwaitingFeedback,
}

/// Interactive objects, the single optional session and the score counter.
#[derive(Debug, Clone, Default)]
pub struct ChallengeBoard {
    objects: Vec<InteractiveObject>,
    session: Option<ChallengeSession>,
    score: u64,
    nearby: Option<usize>,
}

impl ChallengeBoard {
    pub fn new(objects: Vec<InteractiveObject>) -> Self {
        Self {
            objects,
            ..Self::default()
        }
    }

    pub fn objects(&self) -> &[InteractiveObject] {
        &self.objects
    }

    pub fn session(&self) -> Option<&ChallengeSession> {
        self.session.as_ref()
    }

    pub fn is_session_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn solved_count(&self) -> usize {
        self.objects.iter().filter(|object| object.solved).count()
    }

    pub fn nearby(&self) -> Option<usize> {
        self.nearby
    }

    /// Nearest unsolved object within `INTERACTION_RADIUS`. Solved objects
    /// never surface the affordance again.
    pub fn update_proximity(&mut self, player: Vec2) -> Option<usize> {
        self.nearby = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, object)| !object.solved)
            .map(|(index, object)| (index, object.position.distance(player)))
            .filter(|(_, distance)| *distance <= INTERACTION_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index);
        self.nearby
    }

    pub fn object_at_point(&self, point: Vec2) -> Option<usize> {
        self.objects.iter().position(|object| object.contains(point))
    }

    pub fn activate(&mut self, index: usize) -> ActivationOutcome {
        if self.session.is_some() {
            debug!(object = index, "challenge_activation_ignored");
            return ActivationOutcome::SessionAlreadyOpen;
        }
        let Some(object) = self.objects.get(index) else {
            return ActivationOutcome::UnknownObject;
        };
        if object.solved {
            return ActivationOutcome::AlreadySolved;
        }
        info!(
            object = index,
            archetype = object.archetype.debug_name(),
            points = object.question.points,
            "challenge_opened"
        );
        self.session = Some(ChallengeSession::new(index));
        ActivationOutcome::Opened
    }

    /// Activates the current proximity target, if any.
    pub fn activate_nearby(&mut self) -> Option<ActivationOutcome> {
        let index = self.nearby?;
        Some(self.activate(index))
    }

    /// Appends typed characters to the draft. Ignored while feedback shows.
    pub fn push_text(&mut self, text: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.accepts_input() {
            return;
        }
        session
            .draft
            .extend(text.chars().filter(|ch| !ch.is_control()));
    }

    pub fn backspace(&mut self, presses: u32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.accepts_input() {
            return;
        }
        for _ in 0..presses {
            if session.draft.pop().is_none() {
                break;
            }
        }
    }

    /// Evaluates the draft. The score increment and the `solved` flip happen
    /// together, so a repeated submit can never score twice.
    pub fn submit(&mut self, reporter: &mut dyn ScoreReporter) -> SubmitOutcome {
        let Some(session) = self.session.as_mut() else {
            return SubmitOutcome::NoSession;
        };
        if !session.accepts_input() {
            return SubmitOutcome::AwaitingFeedback;
        }
        let Some(object) = self.objects.get_mut(session.target) else {
            self.session = None;
            return SubmitOutcome::NoSession;
        };

        if normalize_answer(&session.draft) != normalize_answer(&object.question.answer) {
            session.incorrect_attempts += 1;
            session.draft.clear();
            session.feedback = Some(Feedback {
                kind: FeedbackKind::Incorrect,
                remaining: FEEDBACK_SECONDS,
            });
            debug!(
                object = session.target,
                attempts = session.incorrect_attempts,
                "challenge_incorrect"
            );
            return SubmitOutcome::Incorrect;
        }

        let points = object.question.points;
        object.solved = true;
        self.score = self.score.saturating_add(u64::from(points));
        session.feedback = Some(Feedback {
            kind: FeedbackKind::Correct,
            remaining: FEEDBACK_SECONDS,
        });
        info!(
            object = session.target,
            points,
            score = self.score,
            "challenge_solved"
        );
        if let Err(error) = reporter.report_score_delta(points) {
            warn!(error = %error, points, "score_report_failed");
        }
        SubmitOutcome::Correct { points }
    }

    /// Closes the session without evaluating. Returns false when none is open.
    pub fn cancel(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        info!(object = session.target, "challenge_closed");
        true
    }

    /// Counts down the feedback indicator. A finished success closes the
    /// session; a finished failure reopens it for input.
    pub fn tick_feedback(&mut self, dt: f32) -> Option<FeedbackKind> {
        let session = self.session.as_mut()?;
        let feedback = session.feedback.as_mut()?;
        feedback.remaining -= dt;
        if feedback.remaining > 0.0 {
            return None;
        }
        let kind = feedback.kind;
        match kind {
            FeedbackKind::Correct => {
                self.session = None;
            }
            FeedbackKind::Incorrect => {
                session.feedback = None;
            }
        }
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::app::score::test_support::RecordingReporter;
    use crate::app::world::terrain::{generate_terrain, TerrainParams};

    fn question(answer: &str, points: u32) -> QuestionDef {
        QuestionDef {
            prompt: format!("What is {answer}?"),
            answer: answer.to_string(),
            hint: Some("think".to_string()),
            points,
        }
    }

    fn board(questions: &[(&str, u32)]) -> ChallengeBoard {
        let objects = questions
            .iter()
            .enumerate()
            .map(|(index, (answer, points))| {
                InteractiveObject::new(
                    Vec2::new(100.0 * (index as f32 + 1.0), 100.0),
                    Vec2::new(20.0, 20.0),
                    Archetype::ALL[index % Archetype::ALL.len()],
                    question(answer, *points),
                )
            })
            .collect();
        ChallengeBoard::new(objects)
    }

    #[test]
    fn correct_answer_scores_points_and_solves() {
        let mut board = board(&[("22", 15)]);
        let mut reporter = RecordingReporter::default();
        assert_eq!(board.activate(0), ActivationOutcome::Opened);
        board.push_text("22");
        assert_eq!(
            board.submit(&mut reporter),
            SubmitOutcome::Correct { points: 15 }
        );
        assert_eq!(board.score(), 15);
        assert!(board.objects()[0].is_solved());
        assert_eq!(reporter.deltas, vec![15]);
    }

    #[test]
    fn double_submit_scores_once() {
        let mut board = board(&[("22", 15)]);
        let mut reporter = RecordingReporter::default();
        board.activate(0);
        board.push_text("22");
        board.submit(&mut reporter);
        board.push_text("22");
        assert_eq!(board.submit(&mut reporter), SubmitOutcome::AwaitingFeedback);
        board.tick_feedback(FEEDBACK_SECONDS);
        assert_eq!(board.submit(&mut reporter), SubmitOutcome::NoSession);
        assert_eq!(board.activate(0), ActivationOutcome::AlreadySolved);
        assert_eq!(board.score(), 15);
        assert_eq!(reporter.deltas, vec![15]);
    }

    #[test]
    fn answers_ignore_case_and_surrounding_whitespace() {
        for attempt in ["Paris", " paris ", "PARIS"] {
            let mut board = board(&[("Paris", 10)]);
            board.activate(0);
            board.push_text(attempt);
            assert_eq!(
                board.submit(&mut RecordingReporter::default()),
                SubmitOutcome::Correct { points: 10 },
                "attempt {attempt:?}"
            );
        }
    }

    #[test]
    fn incorrect_answer_clears_draft_and_allows_retry_after_delay() {
        let mut board = board(&[("Paris", 10)]);
        let mut reporter = RecordingReporter::default();
        board.activate(0);
        board.push_text("Lyon");
        assert_eq!(board.submit(&mut reporter), SubmitOutcome::Incorrect);
        let session = board.session().expect("session stays open");
        assert!(session.draft.is_empty());
        assert_eq!(session.incorrect_attempts, 1);

        board.push_text("ignored");
        assert!(board.session().expect("session").draft.is_empty());
        assert_eq!(board.tick_feedback(FEEDBACK_SECONDS * 0.5), None);
        assert_eq!(
            board.tick_feedback(FEEDBACK_SECONDS),
            Some(FeedbackKind::Incorrect)
        );
        assert!(board.is_session_open());

        board.push_text("paris");
        assert_eq!(
            board.submit(&mut reporter),
            SubmitOutcome::Correct { points: 10 }
        );
        assert_eq!(
            board.tick_feedback(FEEDBACK_SECONDS + 0.1),
            Some(FeedbackKind::Correct)
        );
        assert!(!board.is_session_open());
    }

    #[test]
    fn hint_appears_after_second_miss() {
        let mut board = board(&[("Paris", 10)]);
        let mut reporter = RecordingReporter::default();
        board.activate(0);
        for expected_visible in [false, true] {
            board.push_text("nope");
            board.submit(&mut reporter);
            board.tick_feedback(FEEDBACK_SECONDS);
            assert_eq!(
                board.session().expect("session").hint_visible(),
                expected_visible
            );
        }
    }

    #[test]
    fn second_activation_is_a_no_op_while_session_open() {
        let mut board = board(&[("a", 1), ("b", 2)]);
        assert_eq!(board.activate(1), ActivationOutcome::Opened);
        assert_eq!(board.activate(0), ActivationOutcome::SessionAlreadyOpen);
        assert_eq!(board.session().expect("session").target, 1);
    }

    #[test]
    fn cancel_closes_without_evaluating() {
        let mut board = board(&[("Paris", 10)]);
        let mut reporter = RecordingReporter::default();
        assert!(!board.cancel());
        board.activate(0);
        board.push_text("Paris");
        assert!(board.cancel());
        assert!(!board.is_session_open());
        assert_eq!(board.score(), 0);
        assert!(reporter.deltas.is_empty());
        assert_eq!(board.submit(&mut reporter), SubmitOutcome::NoSession);

        board.activate(0);
        assert!(board.session().expect("fresh session").draft.is_empty());
    }

    #[test]
    fn backspace_trims_draft() {
        let mut board = board(&[("Paris", 10)]);
        board.activate(0);
        board.push_text("Par\u{8}is");
        board.backspace(2);
        assert_eq!(board.session().expect("session").draft, "Par");
        board.backspace(10);
        assert_eq!(board.session().expect("session").draft, "");
    }

    #[test]
    fn failed_score_report_keeps_the_score() {
        let mut board = board(&[("22", 15)]);
        let mut reporter = RecordingReporter {
            fail: true,
            ..RecordingReporter::default()
        };
        board.activate(0);
        board.push_text("22");
        assert_eq!(
            board.submit(&mut reporter),
            SubmitOutcome::Correct { points: 15 }
        );
        assert_eq!(board.score(), 15);
        assert_eq!(reporter.deltas, vec![15]);
    }

    #[test]
    fn proximity_picks_nearest_unsolved_within_radius() {
        let mut board = board(&[("a", 1), ("b", 1)]);
        assert_eq!(board.update_proximity(Vec2::new(160.0, 100.0)), Some(1));
        assert_eq!(board.update_proximity(Vec2::new(140.0, 100.0)), Some(0));
        assert_eq!(board.update_proximity(Vec2::new(150.0, 300.0)), None);

        board.objects[0].solved = true;
        assert_eq!(board.update_proximity(Vec2::new(100.0, 100.0)), None);
        assert_eq!(board.activate_nearby(), None);
    }

    #[test]
    fn click_resolves_object_bounds() {
        let board = board(&[("a", 1), ("b", 1)]);
        assert_eq!(board.object_at_point(Vec2::new(205.0, 95.0)), Some(1));
        assert_eq!(board.object_at_point(Vec2::new(150.0, 100.0)), None);
    }

    #[test]
    fn placement_uses_every_question_on_eligible_tiles() {
        let grid = generate_terrain(&TerrainParams::default(), &mut ChaCha8Rng::seed_from_u64(5))
            .expect("city");
        let bank = QuestionBank::new((0..12).map(|n| question(&n.to_string(), 5)).collect());
        let objects = place_objects(&grid, &bank, &mut ChaCha8Rng::seed_from_u64(6));
        assert_eq!(objects.len(), 12);
        for object in &objects {
            let (col, row) = grid.tile_coords_at(object.position);
            let kind = grid.get(col, row).expect("inside grid");
            assert!(is_placement_tile(kind), "object on {kind:?}");
            assert!(!object.is_solved());
        }
        let mut answers: Vec<&str> = objects
            .iter()
            .map(|object| object.question.answer.as_str())
            .collect();
        answers.sort_unstable();
        answers.dedup();
        assert_eq!(answers.len(), 12);
    }

    #[test]
    fn empty_bank_places_nothing() {
        let grid = generate_terrain(&TerrainParams::default(), &mut ChaCha8Rng::seed_from_u64(5))
            .expect("city");
        let objects = place_objects(&grid, &QuestionBank::default(), &mut ChaCha8Rng::seed_from_u64(6));
        assert!(objects.is_empty());
    }
}

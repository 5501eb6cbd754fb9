// Whole-game scenarios for `GameSession`, driven natively with simulated
// timestamps (16 ms frames on an 800x600 viewport).

use emotion_express::config::{GameConfig, GameVariant};
use emotion_express::emotion::{DetectionSample, Emotion};
use emotion_express::rng::ScriptedEmotions;
use emotion_express::session::{GameSession, GameState, SessionEvent};
use emotion_express::source::{EmotionSource, MockSource, SourceKind};

const FRAME_MS: f64 = 16.0;
const MAX_FRAMES: usize = 20_000;

struct Harness {
    session: GameSession,
    now: f64,
    events: Vec<SessionEvent>,
}

impl Harness {
    fn new(cfg: GameConfig, script: Vec<Emotion>) -> Self {
        let session = GameSession::new(cfg, Box::new(ScriptedEmotions::new(script)), 800.0, 600.0);
        Self {
            session,
            now: 0.0,
            events: Vec::new(),
        }
    }

    fn frame(&mut self, sample: &DetectionSample) {
        self.now += FRAME_MS;
        self.session.tick(self.now, sample);
        self.events.extend(self.session.drain_events());
    }

    /// Runs frames until `done` holds; panics if it never does.
    fn run_until(
        &mut self,
        mut sample: impl FnMut(f64) -> DetectionSample,
        mut done: impl FnMut(&GameSession, &[SessionEvent]) -> bool,
    ) {
        for _ in 0..MAX_FRAMES {
            if done(&self.session, &self.events) {
                return;
            }
            let s = sample(self.now);
            self.frame(&s);
        }
        panic!("condition not reached after {MAX_FRAMES} frames");
    }

    fn spawned(&self, index: usize) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, SessionEvent::GateSpawned { index: i, .. } if *i == index))
    }
}

fn showing(emotion: Emotion) -> impl FnMut(f64) -> DetectionSample {
    move |t| DetectionSample::face(emotion, 0.9, t)
}

fn no_face(t: f64) -> DetectionSample {
    DetectionSample::no_face(t)
}

// Seeded [happy, sad, surprised] round: holding a happy face clears gate 0 only.
#[test]
fn happy_face_clears_first_gate_then_second_gate_spawns() {
    let script = vec![Emotion::Happy, Emotion::Sad, Emotion::Surprised];
    let mut h = Harness::new(GameConfig::default(), script.clone());
    h.session.start(h.now);
    assert_eq!(
        h.session
            .round()
            .emotion_sequence
            .iter()
            .map(|g| g.emotion)
            .collect::<Vec<_>>(),
        script
    );

    h.run_until(showing(Emotion::Happy), |_, ev| {
        ev.iter().any(|e| matches!(e, SessionEvent::GatePassed { .. }))
    });
    assert_eq!(h.session.round().gates_passed, 1);

    h.run_until(showing(Emotion::Happy), |s, _| {
        s.gate().is_some_and(|g| g.spec.emotion == Emotion::Sad)
    });
    assert!(h.spawned(1));
    assert_eq!(h.session.round().gates_passed, 1);
    assert_eq!(h.session.round().active_gate_index, 1);
    assert_eq!(h.session.state(), GameState::Running);

    // a happy face never opens the sad gate
    h.run_until(showing(Emotion::Happy), |s, _| s.gate().is_some_and(|g| g.resets >= 1));
    assert_eq!(h.session.round().gates_passed, 1);
}

// A gate that was matched stays matched after the face is lost.
#[test]
fn matched_gate_passes_without_a_face() {
    let mut h = Harness::new(GameConfig::default(), vec![Emotion::Surprised]);
    h.session.start(h.now);
    h.run_until(showing(Emotion::Surprised), |_, ev| {
        ev.iter().any(|e| matches!(e, SessionEvent::GateMatched { .. }))
    });
    h.frame(&no_face(h.now));
    assert!(h.session.gate().is_some_and(|g| g.is_matched()));

    h.run_until(no_face, |s, _| s.round().gates_passed == 1);
    assert!(h.session.gate().is_some_and(|g| g.is_done()));
    assert_eq!(h.session.gate().map(|g| g.resets), Some(0));
}

// Without a face the same gate keeps coming back; nothing is ever failed.
#[test]
fn missed_gate_retries_forever() {
    let mut h = Harness::new(GameConfig::default(), vec![Emotion::Sad]);
    h.session.start(h.now);
    h.run_until(no_face, |s, _| s.gate().is_some_and(|g| g.resets >= 4));
    assert_eq!(h.session.state(), GameState::Running);
    assert_eq!(h.session.round().gates_passed, 0);
    assert_eq!(h.session.round().active_gate_index, 0);
    let resets = h
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::GateReset { index: 0, .. }))
        .count();
    assert_eq!(resets, 4);
}

// Round one needs 3 gates, round two 5; the counter starts over.
#[test]
fn round_transition_adds_two_gates() {
    let mut h = Harness::new(GameConfig::default(), vec![Emotion::Happy]);
    h.session.start(h.now);
    h.run_until(showing(Emotion::Happy), |s, _| {
        s.state() == GameState::RoundComplete
    });
    assert_eq!(h.session.round().round_number, 1);
    assert_eq!(h.session.round().gates_passed, 3);
    assert!(h.session.gate().is_none());
    assert!(h.events.contains(&SessionEvent::RoundComplete {
        round: 1,
        next_required: 5
    }));

    h.session.continue_next_round(h.now).unwrap();
    let round = h.session.round();
    assert_eq!(round.round_number, 2);
    assert_eq!(round.required_gate_count, 5);
    assert_eq!(round.gates_passed, 0);
    assert_eq!(round.emotion_sequence.len(), 5);
    assert_eq!(h.session.state(), GameState::Running);

    h.run_until(showing(Emotion::Happy), |s, _| s.gate().is_some());
}

// Stays Running through the completion delay, then stops.
#[test]
fn completion_delay_keeps_running() {
    let cfg = GameConfig {
        initial_gate_count: 1,
        ..GameConfig::default()
    };
    let mut h = Harness::new(cfg, vec![Emotion::Happy]);
    h.session.start(h.now);
    h.run_until(showing(Emotion::Happy), |s, _| s.round().gates_passed == 1);
    let passed_at = h.now;
    assert_eq!(h.session.state(), GameState::Running);
    h.run_until(showing(Emotion::Happy), |s, _| s.state() != GameState::Running);
    assert!(h.now - passed_at >= 400.0);
    assert_eq!(h.session.state(), GameState::RoundComplete);
}

// Quitting while the next spawn is pending means it never happens.
#[test]
fn quit_during_spawn_delay_discards_the_spawn() {
    let mut h = Harness::new(GameConfig::default(), vec![Emotion::Happy]);
    h.session.start(h.now);
    h.run_until(showing(Emotion::Happy), |s, _| s.round().gates_passed == 1);
    assert_eq!(h.session.pending_actions(), 1);

    h.session.quit();
    assert_eq!(h.session.state(), GameState::Idle);
    assert_eq!(h.session.pending_actions(), 0);
    for _ in 0..200 {
        h.frame(&no_face(h.now));
    }
    assert!(h.session.gate().is_none());
    assert!(!h.spawned(1));
    assert_eq!(h.session.state(), GameState::Idle);
}

// Restarting mid-round starts round one over with a fresh generation.
#[test]
fn restart_mid_round() {
    let mut h = Harness::new(GameConfig::default(), vec![Emotion::Sad]);
    h.session.start(h.now);
    let first = h.session.generation();
    h.run_until(no_face, |s, _| s.gate().is_some());

    h.session.start(h.now);
    assert!(h.session.generation() > first);
    assert!(h.session.gate().is_none());
    assert_eq!(h.session.round().round_number, 1);
    assert_eq!(h.session.pending_actions(), 1);
}

#[test]
fn max_rounds_ends_in_victory() {
    let cfg = GameConfig {
        variant: GameVariant::Rounds {
            max_rounds: Some(2),
        },
        ..GameConfig::default()
    };
    let mut h = Harness::new(cfg, vec![Emotion::Sad, Emotion::Happy]);
    h.session.start(h.now);

    let follow = |s: &GameSession, t: f64| match s.gate() {
        Some(g) => DetectionSample::face(g.spec.emotion, 1.0, t),
        None => DetectionSample::no_face(t),
    };
    for _ in 0..MAX_FRAMES {
        if h.session.state() == GameState::RoundComplete {
            break;
        }
        let s = follow(&h.session, h.now);
        h.frame(&s);
    }
    assert_eq!(h.session.state(), GameState::RoundComplete);

    h.session.continue_next_round(h.now).unwrap();
    for _ in 0..MAX_FRAMES {
        if h.session.state() == GameState::Victory {
            break;
        }
        let s = follow(&h.session, h.now);
        h.frame(&s);
    }
    assert_eq!(h.session.state(), GameState::Victory);
    assert!(h.events.contains(&SessionEvent::Victory { round: 2 }));
    assert!(h.session.continue_next_round(h.now).is_err());
}

// Express preset: three gates, matched on the first zone check, then victory.
#[test]
fn express_game_is_won_after_three_gates() {
    let mut h = Harness::new(
        GameConfig::express(),
        vec![Emotion::Surprised, Emotion::Sad, Emotion::Happy],
    );
    h.session.start(h.now);
    for _ in 0..MAX_FRAMES {
        if h.session.state() == GameState::Victory {
            break;
        }
        let s = match h.session.gate() {
            Some(g) => DetectionSample::face(g.spec.emotion, 1.0, h.now),
            None => DetectionSample::no_face(h.now),
        };
        h.frame(&s);
    }
    assert_eq!(h.session.state(), GameState::Victory);
    let passed = h
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::GatePassed { .. }))
        .count();
    assert_eq!(passed, 3);
    assert!(
        !h.events
            .iter()
            .any(|e| matches!(e, SessionEvent::GateReset { .. }))
    );
    assert!(h.events.contains(&SessionEvent::Victory { round: 1 }));
}

// The face only shows up while a gate sits in the zone; the happy gate opens,
// the sad one does not.
#[test]
fn face_shown_only_inside_zone() {
    let mut h = Harness::new(
        GameConfig::default(),
        vec![Emotion::Happy, Emotion::Sad, Emotion::Surprised],
    );
    h.session.start(h.now);
    for _ in 0..MAX_FRAMES {
        if h.session.gate().is_some_and(|g| g.resets >= 1) {
            break;
        }
        let s = if h.session.gate().is_some_and(|g| g.in_zone()) {
            DetectionSample::face(Emotion::Happy, 0.9, h.now)
        } else {
            DetectionSample::no_face(h.now)
        };
        h.frame(&s);
    }
    assert_eq!(h.session.round().gates_passed, 1);
    assert!(h.spawned(1));
    assert!(h.session.gate().is_some_and(|g| g.spec.emotion == Emotion::Sad));
    assert!(
        !h.events
            .iter()
            .any(|e| matches!(e, SessionEvent::GateMatched { index: 1, .. }))
    );
}

// Samples come from the mock source through its cell, as in the browser loop.
#[test]
fn mock_source_drives_a_full_round() {
    let mut h = Harness::new(GameConfig::default(), vec![Emotion::Happy]);
    let mut source = EmotionSource::new(SourceKind::Mock(MockSource::new(
        Box::new(ScriptedEmotions::new(vec![Emotion::Happy])),
        500.0,
    )));
    h.session.start(h.now);
    source.activate(h.now);
    assert!(!source.latest().face_detected);

    for _ in 0..MAX_FRAMES {
        if h.session.state() == GameState::RoundComplete {
            break;
        }
        assert!(source.poll(h.now).is_none());
        let s = source.latest();
        h.frame(&s);
    }
    assert_eq!(h.session.state(), GameState::RoundComplete);
    assert_eq!(source.latest().label, Some(Emotion::Happy));

    // next round starts from a blank detection
    h.session.continue_next_round(h.now).unwrap();
    source.clear_sample(h.now);
    source.activate(h.now);
    assert!(!source.latest().face_detected);
    source.poll(h.now);
    assert_eq!(source.latest().label, Some(Emotion::Happy));
}

// Victory drops confetti that keeps the frame loop alive until quit.
#[test]
fn victory_confetti_falls_until_quit() {
    let mut h = Harness::new(GameConfig::express(), vec![Emotion::Happy]);
    h.session.start(h.now);
    h.run_until(showing(Emotion::Happy), |s, _| s.state() == GameState::Victory);
    assert_eq!(h.session.effects().confetti.len(), 180);
    assert!(h.session.is_animating());

    let before: Vec<f64> = h.session.effects().confetti.iter().map(|c| c.y).collect();
    h.frame(&no_face(h.now));
    let after: Vec<f64> = h.session.effects().confetti.iter().map(|c| c.y).collect();
    assert_ne!(before, after);
    assert_eq!(h.session.state(), GameState::Victory);

    h.session.quit();
    assert!(h.session.effects().confetti.is_empty());
    assert!(!h.session.is_animating());
}

//! Round / game state machine.
//!
//! `GameSession` owns every mutable gameplay field. The frame loop calls
//! `tick` once per animation frame with the latest detection sample; user
//! actions come in through `start`, `continue_next_round` and `quit`.
//! Delayed transitions are `Scheduler` entries tied to `generation`, so a
//! delay that was pending when the player quit or restarted never fires.

use crate::config::{GameConfig, GameVariant};
use crate::effects::Effects;
use crate::emotion::{DetectionSample, Emotion};
use crate::error::{GameError, Result};
use crate::gate::{GateInstance, GateRules, GateStep};
use crate::layout::Layout;
use crate::rng::EmotionRng;
use crate::scheduler::{DeferredAction, Scheduler};
use crate::sequencer::{GateSequencer, GateSpec};

const MATCH_BURST: usize = 45;
const MATCH_SHAKE: f64 = 10.0;
const VICTORY_CONFETTI: usize = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Idle,
    Running,
    RoundComplete,
    Victory,
}

impl GameState {
    pub fn as_str(self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Running => "running",
            GameState::RoundComplete => "round_complete",
            GameState::Victory => "victory",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundState {
    pub round_number: u32,
    pub required_gate_count: usize,
    pub gates_passed: usize,
    pub active_gate_index: usize,
    pub emotion_sequence: Vec<GateSpec>,
}

/// Notifications for the presentation layer, drained once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    StateChanged(GameState),
    RoundStarted { round: u32, required: usize },
    GateSpawned { index: usize, emotion: Emotion },
    GateMatched { index: usize, emotion: Emotion },
    GatePassed { passed: usize, required: usize },
    GateReset { index: usize, resets: u32 },
    RoundComplete { round: u32, next_required: usize },
    Victory { round: u32 },
}

/// Scrolling background state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scene {
    pub track_offset: f64,
    pub frame: u64,
}

pub struct GameSession {
    config: GameConfig,
    state: GameState,
    round: RoundState,
    sequencer: GateSequencer,
    gate: Option<GateInstance>,
    generation: u64,
    scheduler: Scheduler,
    rng: Box<dyn EmotionRng>,
    layout: Layout,
    scene: Scene,
    effects: Effects,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(config: GameConfig, rng: Box<dyn EmotionRng>, width: f64, height: f64) -> Self {
        let layout = Layout::compute(&config, width, height);
        let effects = Effects::new(config.seed.unwrap_or(0x5EED));
        Self {
            config,
            state: GameState::Idle,
            round: RoundState::default(),
            sequencer: GateSequencer::default(),
            gate: None,
            generation: 0,
            scheduler: Scheduler::new(),
            rng,
            layout,
            scene: Scene::default(),
            effects,
            events: Vec::new(),
        }
    }

    // --- Accessors -----------------------------------------------------------

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == GameState::Running
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn gate(&self) -> Option<&GateInstance> {
        self.gate.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut Effects {
        &mut self.effects
    }

    /// Whether the frame loop should keep going: while running, and on the
    /// victory screen while confetti is falling.
    pub fn is_animating(&self) -> bool {
        match self.state {
            GameState::Running => true,
            GameState::Victory => !self.effects.confetti.is_empty(),
            GameState::Idle | GameState::RoundComplete => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.layout = Layout::compute(&self.config, width, height);
    }

    // --- Actions -------------------------------------------------------------

    /// Starts (or restarts) from round one. Valid from any state.
    pub fn start(&mut self, now: f64) {
        self.begin_round(1, self.config.initial_gate_count, now);
        log::info!(
            "game started (generation {}, {} gates)",
            self.generation,
            self.round.required_gate_count
        );
    }

    pub fn continue_next_round(&mut self, now: f64) -> Result<()> {
        if self.state != GameState::RoundComplete {
            return Err(GameError::InvalidTransition {
                action: "continue to the next round",
                state: self.state,
            });
        }
        let next_round = self.round.round_number + 1;
        let required = self.round.required_gate_count + self.config.gate_increment;
        self.begin_round(next_round, required, now);
        log::info!("round {next_round} started with {required} gates");
        Ok(())
    }

    /// Back to Idle from anywhere. Pending spawns / round ends are discarded.
    pub fn quit(&mut self) {
        self.generation += 1;
        self.scheduler.cancel_all();
        self.gate = None;
        self.effects.clear();
        self.set_state(GameState::Idle);
        log::info!("game quit (generation {})", self.generation);
    }

    // --- Frame ---------------------------------------------------------------

    /// One animation frame: due deferred actions, background scroll, gate
    /// advance + match check, effects. Always runs before the frame is drawn.
    pub fn tick(&mut self, now: f64, sample: &DetectionSample) {
        for action in self.scheduler.take_due(now, self.generation) {
            self.apply(action);
        }
        if self.state == GameState::Victory {
            self.effects
                .update_confetti(self.layout.width, self.layout.height);
        }
        if self.state != GameState::Running {
            return;
        }

        self.scene.frame += 1;
        self.scene.track_offset =
            (self.scene.track_offset + self.config.track_speed) % self.config.tie_spacing;

        let rules = GateRules::new(&self.config, &self.layout);
        let step = match self.gate.as_mut() {
            Some(gate) => gate.advance(&rules, sample),
            None => GateStep::Idle,
        };
        self.on_gate_step(step, now);

        let chimney = (
            self.layout.cx + self.layout.train_w * 0.12,
            self.layout.train_y - 18.0,
        );
        self.effects.update(Some(chimney));
    }

    fn on_gate_step(&mut self, step: GateStep, now: f64) {
        let index = self.round.active_gate_index;
        match step {
            GateStep::Idle | GateStep::Scrolling => {}
            GateStep::Matched => {
                if let Some(g) = &self.gate {
                    let (x, y) = (self.layout.cx, g.y + self.layout.gate_h / 2.0);
                    let emotion = g.spec.emotion;
                    self.effects.burst(x, y, emotion.color(), MATCH_BURST);
                    self.effects.kick(MATCH_SHAKE);
                    log::debug!("gate {index} matched {emotion}");
                    self.events.push(SessionEvent::GateMatched { index, emotion });
                }
            }
            GateStep::Reset => {
                let resets = self.gate.as_ref().map_or(0, |g| g.resets);
                log::debug!("gate {index} missed, retry #{resets}");
                self.events.push(SessionEvent::GateReset { index, resets });
            }
            GateStep::Resolved => self.resolve_gate(now),
        }
    }

    fn resolve_gate(&mut self, now: f64) {
        self.round.gates_passed = (self.round.gates_passed + 1).min(self.round.required_gate_count);
        self.round.active_gate_index += 1;
        self.events.push(SessionEvent::GatePassed {
            passed: self.round.gates_passed,
            required: self.round.required_gate_count,
        });
        if self.round.gates_passed >= self.round.required_gate_count {
            self.scheduler.schedule(
                now,
                self.config.completion_delay_ms,
                self.generation,
                DeferredAction::FinishRound,
            );
        } else {
            self.scheduler.schedule(
                now,
                self.config.next_spawn_delay_ms,
                self.generation,
                DeferredAction::SpawnGate,
            );
        }
    }

    fn apply(&mut self, action: DeferredAction) {
        if self.state != GameState::Running {
            return;
        }
        match action {
            DeferredAction::SpawnGate => self.spawn_gate(),
            DeferredAction::FinishRound => self.finish_round(),
        }
    }

    fn spawn_gate(&mut self) {
        let Some(spec) = self.sequencer.next() else {
            self.gate = None;
            return;
        };
        let start_y = self.layout.gate_start_y(&self.config);
        self.gate = Some(GateInstance::new(spec, start_y));
        let index = self.round.active_gate_index;
        log::debug!("spawned gate {index} ({})", spec.emotion);
        self.events.push(SessionEvent::GateSpawned {
            index,
            emotion: spec.emotion,
        });
    }

    fn finish_round(&mut self) {
        self.gate = None;
        let round = self.round.round_number;
        let victory = match self.config.variant {
            GameVariant::Express => true,
            GameVariant::Rounds { max_rounds } => max_rounds.is_some_and(|max| round >= max),
        };
        if victory {
            log::info!("victory after round {round}");
            self.effects
                .celebrate(self.layout.width, self.layout.height, VICTORY_CONFETTI);
            self.set_state(GameState::Victory);
            self.events.push(SessionEvent::Victory { round });
        } else {
            let next_required = self.round.required_gate_count + self.config.gate_increment;
            log::info!("round {round} complete");
            self.set_state(GameState::RoundComplete);
            self.events.push(SessionEvent::RoundComplete {
                round,
                next_required,
            });
        }
    }

    fn begin_round(&mut self, round_number: u32, required: usize, now: f64) {
        self.generation += 1;
        self.scheduler.cancel_all();
        self.sequencer = GateSequencer::generate(required, self.rng.as_mut());
        self.round = RoundState {
            round_number,
            required_gate_count: required,
            gates_passed: 0,
            active_gate_index: 0,
            emotion_sequence: self.sequencer.specs().to_vec(),
        };
        self.gate = None;
        self.scene = Scene::default();
        self.effects.clear();
        self.set_state(GameState::Running);
        self.events.push(SessionEvent::RoundStarted {
            round: round_number,
            required,
        });
        self.scheduler.schedule(
            now,
            self.config.first_spawn_delay_ms,
            self.generation,
            DeferredAction::SpawnGate,
        );
    }

    fn set_state(&mut self, state: GameState) {
        if self.state != state {
            self.state = state;
            self.events.push(SessionEvent::StateChanged(state));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedEmotions;

    fn session(cfg: GameConfig, script: Vec<Emotion>) -> GameSession {
        GameSession::new(cfg, Box::new(ScriptedEmotions::new(script)), 800.0, 600.0)
    }

    #[test]
    fn test_starts_idle() {
        let s = session(GameConfig::default(), vec![Emotion::Happy]);
        assert_eq!(s.state(), GameState::Idle);
        assert!(s.gate().is_none());
    }

    #[test]
    fn test_start_schedules_first_gate() {
        let mut s = session(GameConfig::default(), vec![Emotion::Happy]);
        s.start(0.0);
        assert_eq!(s.state(), GameState::Running);
        assert_eq!(s.round().required_gate_count, 3);
        assert_eq!(s.round().emotion_sequence.len(), 3);
        let none = DetectionSample::no_face(0.0);
        s.tick(999.0, &none);
        assert!(s.gate().is_none());
        s.tick(1000.0, &none);
        assert!(s.gate().is_some());
    }

    #[test]
    fn test_continue_rejected_unless_round_complete() {
        let mut s = session(GameConfig::default(), vec![Emotion::Happy]);
        assert!(matches!(
            s.continue_next_round(0.0),
            Err(GameError::InvalidTransition {
                state: GameState::Idle,
                ..
            })
        ));
        s.start(0.0);
        assert!(s.continue_next_round(0.0).is_err());
    }

    #[test]
    fn test_track_offset_wraps() {
        let mut s = session(GameConfig::default(), vec![Emotion::Happy]);
        s.start(0.0);
        let none = DetectionSample::no_face(0.0);
        for i in 0..100 {
            s.tick(i as f64, &none);
            assert!(s.scene().track_offset < s.config().tie_spacing);
        }
    }

    #[test]
    fn test_quit_clears_everything() {
        let mut s = session(GameConfig::default(), vec![Emotion::Happy]);
        s.start(0.0);
        let gen_before = s.generation();
        s.quit();
        assert_eq!(s.state(), GameState::Idle);
        assert_eq!(s.pending_actions(), 0);
        assert!(s.generation() > gen_before);
        assert!(s
            .drain_events()
            .contains(&SessionEvent::StateChanged(GameState::Idle)));
    }
}

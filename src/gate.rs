//! The active gate and the per-frame matching algorithm.

use crate::config::{GameConfig, MatchCadence};
use crate::emotion::DetectionSample;
use crate::layout::Layout;
use crate::sequencer::GateSpec;

/// Vertical band (canvas pixels) in which a gate's emotion is checked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneBounds {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePhase {
    Pending,
    InZone,
    Matched,
    Done,
}

/// Result of advancing a gate by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateStep {
    /// Already done; nothing moved.
    Idle,
    Scrolling,
    /// Matched on this frame.
    Matched,
    /// Became `Done` on this frame. Reported exactly once per gate.
    Resolved,
    /// Scrolled past the zone unmatched and went back to the start.
    Reset,
}

/// Per-frame rules derived from config + layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateRules {
    pub speed: f64,
    pub height: f64,
    pub zone: ZoneBounds,
    pub cadence: MatchCadence,
    pub resolve_on_match: bool,
    pub flash_peak: f64,
    pub flash_decay: f64,
}

impl GateRules {
    pub fn new(cfg: &GameConfig, layout: &Layout) -> Self {
        Self {
            speed: cfg.gate_speed,
            height: layout.gate_h,
            zone: layout.zone,
            cadence: cfg.match_cadence,
            resolve_on_match: cfg.resolve_on_match,
            flash_peak: cfg.flash_peak,
            flash_decay: cfg.flash_decay,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GateInstance {
    pub spec: GateSpec,
    pub y: f64,
    pub start_y: f64,
    pub phase: GatePhase,
    /// Success flash alpha, decays every frame.
    pub flash: f64,
    /// Consecutive eligible frames in the current pass.
    pub zone_ticks: u32,
    pub resets: u32,
}

impl GateInstance {
    pub fn new(spec: GateSpec, start_y: f64) -> Self {
        Self {
            spec,
            y: start_y,
            start_y,
            phase: GatePhase::Pending,
            flash: 0.0,
            zone_ticks: 0,
            resets: 0,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self.phase, GatePhase::Matched | GatePhase::Done)
    }

    pub fn is_done(&self) -> bool {
        self.phase == GatePhase::Done
    }

    pub fn in_zone(&self) -> bool {
        self.phase == GatePhase::InZone
    }

    /// Eligible while any part of the gate overlaps the zone.
    pub fn is_eligible(&self, rules: &GateRules) -> bool {
        let bottom = self.y + rules.height;
        bottom >= rules.zone.top && self.y <= rules.zone.bottom
    }

    pub fn advance(&mut self, rules: &GateRules, sample: &DetectionSample) -> GateStep {
        if self.phase == GatePhase::Done {
            return GateStep::Idle;
        }
        self.y += rules.speed;
        self.flash = (self.flash - rules.flash_decay).max(0.0);
        let past_zone = self.y > rules.zone.bottom;

        match self.phase {
            GatePhase::Pending | GatePhase::InZone => {
                if self.is_eligible(rules) {
                    self.phase = GatePhase::InZone;
                    self.zone_ticks += 1;
                    if rules.cadence.should_check(self.zone_ticks) && sample.matches(self.spec.emotion) {
                        self.phase = GatePhase::Matched;
                        self.flash = rules.flash_peak;
                        return GateStep::Matched;
                    }
                    GateStep::Scrolling
                } else if past_zone {
                    self.reset();
                    GateStep::Reset
                } else {
                    self.phase = GatePhase::Pending;
                    GateStep::Scrolling
                }
            }
            // Matched is sticky: only Done follows.
            GatePhase::Matched => {
                if rules.resolve_on_match || past_zone {
                    self.phase = GatePhase::Done;
                    GateStep::Resolved
                } else {
                    GateStep::Scrolling
                }
            }
            GatePhase::Done => GateStep::Idle,
        }
    }

    fn reset(&mut self) {
        self.y = self.start_y;
        self.phase = GatePhase::Pending;
        self.zone_ticks = 0;
        self.flash = 0.0;
        self.resets += 1;
    }
}

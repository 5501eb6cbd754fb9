//! Game tuning and runtime configuration.
//!
//! Everything is serde-deserialisable with defaults so the page can pass a
//! partial JSON object to `start_game`. Two presets mirror the two ways the
//! game is played: the endless multi-round live game (`Default`) and the
//! short three-gate mock game (`express`).

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameVariant {
    /// Rounds of growing length. `max_rounds: None` plays forever.
    Rounds { max_rounds: Option<u32> },
    /// A single round that ends in victory.
    Express,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Live,
    Mock,
}

/// How often an eligible gate consults the latest sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchCadence {
    EveryFrame,
    /// Check on the first eligible frame and every `frames` after it.
    Periodic { frames: u32 },
}

impl MatchCadence {
    /// `zone_ticks` is 1 on the first eligible frame.
    pub fn should_check(self, zone_ticks: u32) -> bool {
        match self {
            MatchCadence::EveryFrame => true,
            MatchCadence::Periodic { frames } if frames <= 1 => true,
            MatchCadence::Periodic { frames } => zone_ticks % frames == 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub variant: GameVariant,
    pub source: SourceMode,

    // --- Rounds ---
    pub initial_gate_count: usize,
    pub gate_increment: usize,

    // --- Motion ---
    pub track_speed: f64,
    pub tie_spacing: f64,
    pub gate_speed: f64,
    pub gate_height: f64,
    /// Gates start this far above the top edge (plus their own height).
    pub gate_start_offset: f64,

    // --- Geometry (fractions of viewport height) ---
    pub train_y_ratio: f64,
    pub train_height_ratio: f64,
    pub zone_top_ratio: f64,
    pub zone_bottom_ratio: f64,

    // --- Matching ---
    pub match_cadence: MatchCadence,
    /// Resolve a gate the moment it matches instead of when it clears the zone.
    pub resolve_on_match: bool,
    pub flash_peak: f64,
    pub flash_decay: f64,

    // --- Delays (ms) ---
    pub first_spawn_delay_ms: f64,
    pub next_spawn_delay_ms: f64,
    pub completion_delay_ms: f64,

    // --- Emotion source ---
    pub reconnect_backoff_ms: f64,
    pub frame_interval_ms: f64,
    pub capture_width: u32,
    pub capture_height: u32,
    pub capture_quality: f64,
    pub mock_interval_ms: f64,
    pub ws_path: String,
    /// Full socket URL; overrides `ws_path` when set.
    pub ws_url: Option<String>,

    pub log_level: LevelFilter,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            variant: GameVariant::Rounds { max_rounds: None },
            source: SourceMode::Live,
            initial_gate_count: 3,
            gate_increment: 2,
            track_speed: 3.0,
            tie_spacing: 40.0,
            gate_speed: 2.2,
            gate_height: 100.0,
            gate_start_offset: 40.0,
            train_y_ratio: 0.72,
            train_height_ratio: 0.14,
            zone_top_ratio: 0.55,
            zone_bottom_ratio: 0.79,
            match_cadence: MatchCadence::EveryFrame,
            resolve_on_match: false,
            flash_peak: 0.4,
            flash_decay: 0.01,
            first_spawn_delay_ms: 1000.0,
            next_spawn_delay_ms: 900.0,
            completion_delay_ms: 400.0,
            reconnect_backoff_ms: 2000.0,
            frame_interval_ms: 500.0,
            capture_width: 320,
            capture_height: 240,
            capture_quality: 0.6,
            mock_interval_ms: 500.0,
            ws_path: "/v1/emotion_classification/game-ws".to_string(),
            ws_url: None,
            log_level: LevelFilter::Info,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Fixed three-gate game against the mock source.
    pub fn express() -> Self {
        Self {
            variant: GameVariant::Express,
            source: SourceMode::Mock,
            gate_speed: 1.4,
            gate_height: 66.0,
            tie_spacing: 42.0,
            zone_bottom_ratio: 0.87,
            match_cadence: MatchCadence::Periodic { frames: 50 },
            resolve_on_match: true,
            first_spawn_delay_ms: 800.0,
            next_spawn_delay_ms: 1800.0,
            completion_delay_ms: 1200.0,
            ..Self::default()
        }
    }

    /// Partial JSON over a preset. `"preset": "express"` picks the base;
    /// any other key overrides it.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: serde_json::Value =
            serde_json::from_str(json).map_err(GameError::ConfigJson)?;
        let serde_json::Value::Object(mut overrides) = overrides else {
            return Err(GameError::Config("config must be a JSON object".into()));
        };
        let base = match overrides.remove("preset") {
            None => Self::default(),
            Some(serde_json::Value::String(name)) => match name.as_str() {
                "default" => Self::default(),
                "express" => Self::express(),
                other => return Err(GameError::Config(format!("unknown preset `{other}`"))),
            },
            Some(other) => return Err(GameError::Config(format!("bad preset {other}"))),
        };
        let mut merged = serde_json::to_value(&base).map_err(GameError::ConfigJson)?;
        if let Some(fields) = merged.as_object_mut() {
            fields.extend(overrides);
        }
        let cfg: GameConfig = serde_json::from_value(merged).map_err(GameError::ConfigJson)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_gate_count == 0 {
            return Err(GameError::Config("initial_gate_count must be at least 1".into()));
        }
        if self.gate_speed <= 0.0 || self.track_speed < 0.0 {
            return Err(GameError::Config("speeds must be positive".into()));
        }
        if self.tie_spacing <= 0.0 || self.gate_height <= 0.0 {
            return Err(GameError::Config("tie_spacing and gate_height must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.zone_top_ratio)
            || !(0.0..=1.0).contains(&self.zone_bottom_ratio)
            || self.zone_top_ratio >= self.zone_bottom_ratio
        {
            return Err(GameError::Config(format!(
                "match zone [{}, {}] must be an ordered range within 0..=1",
                self.zone_top_ratio, self.zone_bottom_ratio
            )));
        }
        if let MatchCadence::Periodic { frames: 0 } = self.match_cadence {
            return Err(GameError::Config("periodic cadence needs frames >= 1".into()));
        }
        if let GameVariant::Rounds { max_rounds: Some(0) } = self.variant {
            return Err(GameError::Config("max_rounds must be at least 1".into()));
        }
        if self.reconnect_backoff_ms < 0.0 || self.frame_interval_ms <= 0.0 || self.mock_interval_ms <= 0.0 {
            return Err(GameError::Config("source intervals must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.capture_quality) {
            return Err(GameError::Config("capture_quality must be within 0..=1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(GameConfig::default().validate().is_ok());
        assert!(GameConfig::express().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = GameConfig::from_json(r#"{"initial_gate_count":4,"source":"mock"}"#).unwrap();
        assert_eq!(cfg.initial_gate_count, 4);
        assert_eq!(cfg.source, SourceMode::Mock);
        assert_eq!(cfg.gate_increment, 2);
        assert_eq!(cfg.reconnect_backoff_ms, 2000.0);
    }

    #[test]
    fn test_tagged_enums_from_json() {
        let cfg = GameConfig::from_json(
            r#"{"variant":{"kind":"rounds","max_rounds":3},
                "match_cadence":{"kind":"periodic","frames":10},
                "log_level":"debug"}"#,
        )
        .unwrap();
        assert_eq!(cfg.variant, GameVariant::Rounds { max_rounds: Some(3) });
        assert_eq!(cfg.match_cadence, MatchCadence::Periodic { frames: 10 });
        assert_eq!(cfg.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_express_preset_with_overrides() {
        let cfg = GameConfig::from_json(r#"{"preset":"express","seed":7}"#).unwrap();
        assert_eq!(cfg.variant, GameVariant::Express);
        assert_eq!(cfg.match_cadence, MatchCadence::Periodic { frames: 50 });
        assert_eq!(cfg.seed, Some(7));

        assert!(matches!(
            GameConfig::from_json(r#"{"preset":"turbo"}"#),
            Err(GameError::Config(_))
        ));
        assert!(matches!(GameConfig::from_json("[1]"), Err(GameError::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_zone() {
        let err = GameConfig::from_json(r#"{"zone_top_ratio":0.9,"zone_bottom_ratio":0.5}"#);
        assert!(matches!(err, Err(GameError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            GameConfig::from_json("{"),
            Err(GameError::ConfigJson(_))
        ));
    }

    #[test]
    fn test_periodic_cadence() {
        let c = MatchCadence::Periodic { frames: 50 };
        assert!(c.should_check(1));
        assert!(!c.should_check(2));
        assert!(!c.should_check(50));
        assert!(c.should_check(51));
        assert!(MatchCadence::EveryFrame.should_check(2));
        assert!(MatchCadence::Periodic { frames: 1 }.should_check(7));
    }
}

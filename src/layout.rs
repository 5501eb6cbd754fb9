//! Viewport-derived geometry, recomputed on resize.

use crate::config::GameConfig;
use crate::gate::ZoneBounds;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    /// Horizontal centre of the track.
    pub cx: f64,
    pub track_width: f64,
    pub train_w: f64,
    pub train_y: f64,
    pub train_h: f64,
    pub gate_w: f64,
    pub gate_h: f64,
    pub zone: ZoneBounds,
}

impl Layout {
    pub fn compute(cfg: &GameConfig, width: f64, height: f64) -> Self {
        let track_width = (width * 0.12).clamp(100.0, 180.0);
        Self {
            width,
            height,
            cx: width / 2.0,
            track_width,
            train_w: track_width * 1.4,
            train_y: height * cfg.train_y_ratio,
            train_h: height * cfg.train_height_ratio,
            gate_w: track_width * 2.6,
            gate_h: cfg.gate_height,
            zone: ZoneBounds {
                top: height * cfg.zone_top_ratio,
                bottom: height * cfg.zone_bottom_ratio,
            },
        }
    }

    /// Where a freshly spawned (or reset) gate starts: fully above the screen.
    pub fn gate_start_y(&self, cfg: &GameConfig) -> f64 {
        -(self.gate_h + cfg.gate_start_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_scales_with_height() {
        let cfg = GameConfig::default();
        let l = Layout::compute(&cfg, 800.0, 1000.0);
        assert_eq!(l.zone.top, 550.0);
        assert!((l.zone.bottom - 790.0).abs() < 1e-9);
        assert_eq!(l.cx, 400.0);
    }

    #[test]
    fn test_track_width_clamped() {
        let cfg = GameConfig::default();
        assert_eq!(Layout::compute(&cfg, 300.0, 600.0).track_width, 100.0);
        assert_eq!(Layout::compute(&cfg, 4000.0, 600.0).track_width, 180.0);
    }

    #[test]
    fn test_gate_starts_offscreen() {
        let cfg = GameConfig::default();
        let l = Layout::compute(&cfg, 800.0, 600.0);
        assert!(l.gate_start_y(&cfg) + l.gate_h < 0.0);
    }
}

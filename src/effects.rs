//! Cosmetic particle state: match bursts, chimney smoke, screen shake and
//! victory confetti.
//! Only the frame tick mutates these; the renderer just reads them.

use crate::rng::Lcg;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub r: f64,
    pub color: &'static str,
    pub alpha: f64,
    decay: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Puff {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub alpha: f64,
    vx: f64,
    vy: f64,
    grow: f64,
}

/// Confetti piece; `rot` in radians.
#[derive(Clone, Debug, PartialEq)]
pub struct Confetti {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rot: f64,
    pub color: &'static str,
    vx: f64,
    vy: f64,
    spin: f64,
}

const CONFETTI_COLORS: [&str; 6] = [
    "#FF6B6B", "#FFE66D", "#4ECDC4", "#A78BFA", "#F472B6", "#42A5F5",
];
const PARTICLE_GRAVITY: f64 = 0.08;
const SMOKE_RATE: f64 = 0.3;
const SMOKE_FADE: f64 = 0.007;
const SHAKE_DAMPING: f64 = 0.88;
const SHAKE_FLOOR: f64 = 0.4;

#[derive(Clone, Debug)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub smoke: Vec<Puff>,
    pub confetti: Vec<Confetti>,
    pub shake: f64,
    rng: Lcg,
}

impl Effects {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            smoke: Vec::new(),
            confetti: Vec::new(),
            shake: 0.0,
            rng: Lcg::new(seed),
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.smoke.clear();
        self.confetti.clear();
        self.shake = 0.0;
    }

    pub fn burst(&mut self, x: f64, y: f64, color: &'static str, n: usize) {
        for _ in 0..n {
            let a = self.rng.range(0.0, std::f64::consts::TAU);
            let sp = self.rng.range(2.0, 7.0);
            self.particles.push(Particle {
                x,
                y,
                vx: a.cos() * sp,
                vy: a.sin() * sp,
                r: self.rng.range(2.0, 6.0),
                color,
                alpha: 1.0,
                decay: self.rng.range(0.012, 0.027),
            });
        }
    }

    /// Drops `n` confetti pieces from above the viewport.
    pub fn celebrate(&mut self, width: f64, height: f64, n: usize) {
        self.confetti.clear();
        for _ in 0..n {
            let color = CONFETTI_COLORS[self.rng.index(CONFETTI_COLORS.len())];
            self.confetti.push(Confetti {
                x: self.rng.range(0.0, width),
                y: -self.rng.range(0.0, height),
                w: self.rng.range(6.0, 14.0),
                h: self.rng.range(4.0, 9.0),
                rot: self.rng.range(0.0, std::f64::consts::TAU),
                color,
                vx: self.rng.range(-1.0, 1.0),
                vy: self.rng.range(2.0, 5.0),
                spin: self.rng.range(-4.0, 4.0).to_radians(),
            });
        }
    }

    /// Confetti falls forever; pieces leaving the bottom re-enter at the top.
    pub fn update_confetti(&mut self, width: f64, height: f64) {
        for c in &mut self.confetti {
            c.x += c.vx;
            c.y += c.vy;
            c.rot += c.spin;
            if c.y > height + 20.0 {
                c.y = -20.0;
                c.x = self.rng.range(0.0, width);
            }
        }
    }

    pub fn kick(&mut self, amount: f64) {
        self.shake = self.shake.max(amount);
    }

    /// Random shake offset for this frame; decays the shake.
    pub fn shake_offset(&mut self) -> (f64, f64) {
        if self.shake <= 0.0 {
            return (0.0, 0.0);
        }
        let dx = (self.rng.next_f64() - 0.5) * self.shake;
        let dy = (self.rng.next_f64() - 0.5) * self.shake;
        self.shake *= SHAKE_DAMPING;
        if self.shake < SHAKE_FLOOR {
            self.shake = 0.0;
        }
        (dx, dy)
    }

    /// `chimney` is where new smoke appears; `None` stops emission.
    pub fn update(&mut self, chimney: Option<(f64, f64)>) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += PARTICLE_GRAVITY;
            p.alpha -= p.decay;
        }
        self.particles.retain(|p| p.alpha > 0.0);

        if let Some((cx, cy)) = chimney {
            if self.rng.next_f64() < SMOKE_RATE {
                let puff = Puff {
                    x: cx + (self.rng.next_f64() - 0.5) * 6.0,
                    y: cy,
                    r: self.rng.range(2.0, 4.0),
                    alpha: 0.5,
                    vx: (self.rng.next_f64() - 0.5) * 0.4,
                    vy: -self.rng.range(0.8, 1.3),
                    grow: self.rng.range(0.06, 0.10),
                };
                self.smoke.push(puff);
            }
        }
        for s in &mut self.smoke {
            s.x += s.vx;
            s.y += s.vy;
            s.r += s.grow;
            s.alpha -= SMOKE_FADE;
        }
        self.smoke.retain(|s| s.alpha > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_particles_fade_out() {
        let mut fx = Effects::new(11);
        fx.burst(10.0, 10.0, "#fff", 45);
        assert_eq!(fx.particles.len(), 45);
        for _ in 0..100 {
            fx.update(None);
        }
        assert!(fx.particles.is_empty());
    }

    #[test]
    fn test_smoke_only_while_emitting() {
        let mut fx = Effects::new(2);
        for _ in 0..60 {
            fx.update(Some((0.0, 0.0)));
        }
        assert!(!fx.smoke.is_empty());
        for _ in 0..200 {
            fx.update(None);
        }
        assert!(fx.smoke.is_empty());
    }

    #[test]
    fn test_confetti_keeps_falling_inside_view() {
        let mut fx = Effects::new(8);
        fx.celebrate(800.0, 600.0, 180);
        assert_eq!(fx.confetti.len(), 180);
        assert!(fx.confetti.iter().all(|c| c.y <= 0.0 && (0.0..800.0).contains(&c.x)));
        for _ in 0..2000 {
            fx.update_confetti(800.0, 600.0);
        }
        assert_eq!(fx.confetti.len(), 180);
        assert!(fx.confetti.iter().all(|c| c.y <= 620.0 + 5.0));
        fx.clear();
        assert!(fx.confetti.is_empty());
    }

    #[test]
    fn test_shake_settles() {
        let mut fx = Effects::new(5);
        fx.kick(10.0);
        let mut frames = 0;
        while fx.shake > 0.0 {
            fx.shake_offset();
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(fx.shake_offset(), (0.0, 0.0));
    }
}

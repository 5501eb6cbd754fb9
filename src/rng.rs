//! Injectable randomness.
//!
//! Gate sequences and the mock source draw emotions through `EmotionRng` so
//! tests can script them. Visual effects use the concrete `Lcg` directly.

use crate::emotion::Emotion;

pub trait EmotionRng {
    fn next_emotion(&mut self) -> Emotion;
}

/// Small 64-bit linear congruential generator (not crypto secure).
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        // Avoid the all-zero start producing a visibly poor first draw.
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Seeded from browser entropy when the `rng` feature is on, otherwise
    /// from the caller-provided fallback (usually `performance.now()`).
    pub fn from_entropy(fallback: u64) -> Self {
        Self::new(entropy_seed().unwrap_or(fallback))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.state >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_f64() * len as f64) as usize % len
    }
}

impl EmotionRng for Lcg {
    fn next_emotion(&mut self) -> Emotion {
        Emotion::ALL[self.index(Emotion::ALL.len())]
    }
}

#[cfg(feature = "rng")]
fn entropy_seed() -> Option<u64> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf).ok()?;
    Some(u64::from_le_bytes(buf))
}

#[cfg(not(feature = "rng"))]
fn entropy_seed() -> Option<u64> {
    None
}

/// Replays a fixed list of emotions, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedEmotions {
    script: Vec<Emotion>,
    pos: usize,
}

impl ScriptedEmotions {
    pub fn new(script: Vec<Emotion>) -> Self {
        Self { script, pos: 0 }
    }
}

impl EmotionRng for ScriptedEmotions {
    fn next_emotion(&mut self) -> Emotion {
        if self.script.is_empty() {
            return Emotion::Happy;
        }
        let e = self.script[self.pos % self.script.len()];
        self.pos += 1;
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_is_deterministic_per_seed() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_lcg_f64_in_unit_interval() {
        let mut r = Lcg::new(7);
        for _ in 0..1000 {
            let v = r.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_lcg_covers_all_emotions() {
        let mut r = Lcg::new(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(r.next_emotion());
        }
        assert_eq!(seen.len(), Emotion::ALL.len());
    }

    #[test]
    fn test_lcg_emotions_roughly_uniform() {
        let mut counts = [0usize; 3];
        for seed in 0..20 {
            let mut r = Lcg::new(seed);
            for _ in 0..1500 {
                let i = Emotion::ALL.iter().position(|e| *e == r.next_emotion()).unwrap();
                counts[i] += 1;
            }
        }
        // 30_000 draws, expect ~10_000 each
        for c in counts {
            assert!((9_000..=11_000).contains(&c), "skewed counts {counts:?}");
        }
    }

    #[test]
    fn test_lcg_f64_spans_whole_interval() {
        let mut r = Lcg::new(99);
        let draws: Vec<f64> = (0..2000).map(|_| r.next_f64()).collect();
        assert!(draws.iter().any(|v| *v > 0.9));
        assert!(draws.iter().any(|v| *v < 0.1));
    }

    #[test]
    fn test_index_of_empty_is_zero() {
        assert_eq!(Lcg::new(3).index(0), 0);
    }

    #[test]
    fn test_scripted_cycles() {
        let mut s = ScriptedEmotions::new(vec![Emotion::Sad, Emotion::Happy]);
        assert_eq!(s.next_emotion(), Emotion::Sad);
        assert_eq!(s.next_emotion(), Emotion::Happy);
        assert_eq!(s.next_emotion(), Emotion::Sad);
    }
}

//! Per-round gate emotion sequence.

use crate::emotion::Emotion;
use crate::rng::EmotionRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateSpec {
    pub emotion: Emotion,
}

/// Ordered required emotions for one round. Iterating yields each spec once
/// and then `None`.
#[derive(Clone, Debug, Default)]
pub struct GateSequencer {
    specs: Vec<GateSpec>,
    cursor: usize,
}

impl GateSequencer {
    /// Draws `count` emotions uniformly with replacement; repeats are allowed.
    pub fn generate(count: usize, rng: &mut dyn EmotionRng) -> Self {
        let specs = (0..count)
            .map(|_| GateSpec {
                emotion: rng.next_emotion(),
            })
            .collect();
        Self { specs, cursor: 0 }
    }

    pub fn specs(&self) -> &[GateSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Index of the spec the next call to `next()` returns.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.specs.len().saturating_sub(self.cursor)
    }
}

impl Iterator for GateSequencer {
    type Item = GateSpec;

    fn next(&mut self) -> Option<GateSpec> {
        let spec = self.specs.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(spec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

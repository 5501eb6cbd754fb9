//! Deferred, cancellable session actions.
//!
//! Every entry remembers the session generation it was scheduled in. The
//! session bumps its generation on start / continue / quit, so an entry from
//! an older generation is dropped instead of applied.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredAction {
    SpawnGate,
    FinishRound,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Deferred {
    due_ms: f64,
    generation: u64,
    action: DeferredAction,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pending: Vec<Deferred>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: f64, delay_ms: f64, generation: u64, action: DeferredAction) {
        self.pending.push(Deferred {
            due_ms: now + delay_ms.max(0.0),
            generation,
            action,
        });
    }

    /// Removes and returns every action due at `now` for `generation`, in due
    /// order. Entries of other generations are discarded.
    pub fn take_due(&mut self, now: f64, generation: u64) -> Vec<DeferredAction> {
        let before = self.pending.len();
        self.pending.retain(|d| d.generation == generation);
        if self.pending.len() != before {
            log::debug!("dropped {} stale deferred action(s)", before - self.pending.len());
        }

        let mut due: Vec<Deferred> = Vec::new();
        self.pending.retain(|d| {
            if d.due_ms <= now {
                due.push(*d);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|d| d.action).collect()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

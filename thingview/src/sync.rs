//! Optimistic writes and their reconciliation with the gateway.
//!
//! Every property carries a generation counter. Local writes and pushed
//! updates both bump it, and a write outcome only lands if the counter hasn't
//! moved past the generation the write was issued with. Arrival order of
//! responses and pushes does not matter.

use serde_json::Value;

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// A local write went out; the property shows the transition state.
    Pending,
    Applied,
    /// A response that was superseded by a newer generation.
    Discarded,
    /// A failed write restored the last confirmed value.
    RolledBack,
    /// A failed write that newer information already replaced.
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyState {
    /// What is displayed. `None` is the transition state.
    value: Option<Value>,
    confirmed: Option<Value>,
    pending: Option<Generation>,
    generation: Generation,
}

impl PropertyState {
    pub fn new(initial: Option<Value>) -> Self {
        Self {
            value: initial.clone(),
            confirmed: initial,
            pending: None,
            generation: 0,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn confirmed(&self) -> Option<&Value> {
        self.confirmed.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Records a local write and returns the generation it must be
    /// reconciled with.
    pub fn begin_write(&mut self) -> Generation {
        self.generation += 1;
        self.pending = Some(self.generation);
        self.value = None;
        self.generation
    }

    pub fn apply_response(&mut self, generation: Generation, value: Value) -> Reconciliation {
        if generation < self.generation {
            return Reconciliation::Discarded;
        }

        self.confirm(value);
        Reconciliation::Applied
    }

    /// Pushed values are ground truth and override any pending write.
    pub fn apply_push(&mut self, value: Value) -> Reconciliation {
        self.generation += 1;
        self.confirm(value);
        Reconciliation::Applied
    }

    pub fn fail(&mut self, generation: Generation) -> Reconciliation {
        if generation < self.generation {
            return Reconciliation::Ignored;
        }

        self.value = self.confirmed.clone();
        self.pending = None;
        Reconciliation::RolledBack
    }

    fn confirm(&mut self, value: Value) {
        self.value = Some(value.clone());
        self.confirmed = Some(value);
        self.pending = None;
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::chain::FractalChain;
use crate::error::ListenerError;
use crate::fractal::{Fractal, FractalId};

#[derive(Debug, Clone, PartialEq)]
pub struct FractalEvent {
    /// Index passed to `process_index` when the fractal was confirmed.
    pub scan_index: usize,
    pub fractal_id: FractalId,
    pub fractal: Fractal,
}

/// Opaque handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener =
    Arc<dyn Fn(&FractalEvent, &FractalChain) -> Result<(), ListenerError> + Send + Sync>;

/// Subscription-id keyed listener registry. Ids grow monotonically, so map order
/// is registration order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: BTreeMap<SubscriptionId, Listener>,
}

impl Listeners {
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&FractalEvent, &FractalChain) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.subscribe_shared(Arc::new(listener))
    }

    /// Registers an already shared listener, e.g. one handler for several detectors.
    pub fn subscribe_shared(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, listener);
        id
    }

    /// Returns `false` when `id` was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calls every listener in registration order; the first failure stops the pass.
    pub fn notify(&self, event: &FractalEvent, chain: &FractalChain) -> Result<(), ListenerError> {
        for listener in self.entries.values() {
            listener(event, chain)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("next_id", &self.next_id)
            .field("ids", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

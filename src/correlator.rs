use crate::protocol::{RequestEnvelope, RpcMethod};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Tracks outstanding requests and hands out correlation ids
///
/// Ids start at 0 and increase monotonically for the lifetime of the owning
/// client; a disconnect wipes the pending table but never rewinds the
/// counter. Allocation and registration happen under one lock, so ids stay
/// unique under concurrent senders.
#[derive(Debug, Default)]
pub(crate) struct Correlator {
    state: Mutex<CorrelatorState>,
}

#[derive(Debug, Default)]
struct CorrelatorState {
    next_id: u64,
    pending: HashMap<u64, RpcMethod>,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id, register the pending request, and build the
    /// outbound envelope
    pub(crate) fn next_request(&self, method: RpcMethod, params: Option<Value>) -> RequestEnvelope {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.pending.insert(id, method);
        RequestEnvelope::new(id, method, params)
    }

    /// Remove and return the method a response id belongs to
    ///
    /// `None` means the id was never issued, already resolved, or wiped by
    /// a disconnect since the request went out.
    pub(crate) fn resolve(&self, id: u64) -> Option<RpcMethod> {
        self.state.lock().unwrap().pending.remove(&id)
    }

    /// Drop every outstanding request; called on disconnect
    pub(crate) fn clear(&self) {
        self.state.lock().unwrap().pending.clear();
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

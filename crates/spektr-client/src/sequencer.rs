//! Ordering of overlapping responses.
//!
//! Requests for the same resource may resolve in any order. Each request is
//! tagged with a sequence number when it is issued; its response is applied
//! only if no later-issued request for the same key has already been
//! applied. The freshest data that has arrived always wins.

use std::collections::HashMap;
use std::hash::Hash;

/// Issued for one request; hand it back with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    seq: u64,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug)]
pub struct RequestSequencer<K> {
    next: u64,
    issued: HashMap<K, u64>,
    applied: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> RequestSequencer<K> {
    pub fn new() -> Self {
        Self {
            next: 0,
            issued: HashMap::new(),
            applied: HashMap::new(),
        }
    }

    /// Tag a new request for `key`.
    pub fn issue(&mut self, key: K) -> Ticket<K> {
        self.next += 1;
        self.issued.insert(key.clone(), self.next);
        Ticket { key, seq: self.next }
    }

    /// Whether `ticket` is the most recently issued one for its key. Only
    /// that request's failure says anything about the current state.
    pub fn is_latest(&self, ticket: &Ticket<K>) -> bool {
        self.issued.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Whether the response for `ticket` may be applied. Accepting records
    /// the ticket, so older responses for the same key are refused after.
    pub fn accept(&mut self, ticket: &Ticket<K>) -> bool {
        match self.applied.get(&ticket.key) {
            Some(&last) if last >= ticket.seq => false,
            _ => {
                self.applied.insert(ticket.key.clone(), ticket.seq);
                true
            }
        }
    }
}

impl<K: Eq + Hash + Clone> Default for RequestSequencer<K> {
    fn default() -> Self {
        Self::new()
    }
}

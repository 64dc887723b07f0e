use crate::address::Address;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Breadth-first queue of discovered URLs.
///
/// `visited` and `pending` hold identity keys and never overlap. A key is
/// queued at most once for the lifetime of the frontier.
#[derive(Debug, Default)]
pub struct Frontier {
    visited: HashSet<String>,
    pending: HashSet<String>,
    queue: VecDeque<Address>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an address unless it was already seen. Returns true if it was added.
    pub fn enqueue(&mut self, address: Address) -> bool {
        let key = address.identity_key();
        if self.visited.contains(&key) || self.pending.contains(&key) {
            return false;
        }
        debug!("Queuing {}", key);
        self.pending.insert(key);
        self.queue.push_back(address);
        true
    }

    pub fn dequeue_next(&mut self) -> Option<Address> {
        self.queue.pop_front()
    }

    pub fn mark_visited(&mut self, address: &Address) {
        let key = address.identity_key();
        self.pending.remove(&key);
        self.visited.insert(key);
    }

    /// Whether the address is already visited or waiting
    pub fn is_known(&self, address: &Address) -> bool {
        let key = address.identity_key();
        self.visited.contains(&key) || self.pending.contains(&key)
    }

    pub fn is_visited(&self, address: &Address) -> bool {
        self.visited.contains(&address.identity_key())
    }

    /// Addresses still waiting, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &Address> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }
}

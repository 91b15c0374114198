//! Withdrawal queue
//!
//! A singly linked LIFO of pending withdrawal claims over an arena of stable
//! slot indices. Each newly inserted claim becomes the new front; settlement
//! drains strictly from the front (last initiated, first settled). Freed
//! slots are recycled through a free list.
//!
//! # Invariants
//!
//! - At most one live claim per receiver address
//! - Walking `next` links from the head visits every live node exactly once;
//!   the visit count equals the maintained size counter, and no cycle exists
//!   ([`WithdrawalQueue::check_links`] verifies this mechanically)

use crate::types::{Address, Amount};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slot index sentinel for "no node"
const NIL: u32 = u32::MAX;

/// A recorded, not-yet-settled claim for a share amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWithdrawal {
    /// Account whose shares back the claim
    pub owner: Address,

    /// Account the settled payout goes to (queue key)
    pub receiver: Address,

    /// Claimed share amount
    pub shares: Amount,
}

#[derive(Debug, Clone)]
enum Slot {
    Occupied { entry: PendingWithdrawal, next: u32 },
    Free { next_free: u32 },
}

/// Arena-backed singly linked LIFO keyed by receiver address
#[derive(Debug, Clone, Default)]
pub struct WithdrawalQueue {
    slots: Vec<Slot>,
    head: u32,
    free_head: u32,
    len: usize,
    by_receiver: HashMap<Address, u32>,
}

impl WithdrawalQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: NIL,
            free_head: NIL,
            len: 0,
            by_receiver: HashMap::new(),
        }
    }

    /// Number of live pending claims
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no live claims
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `receiver` has a live pending claim
    pub fn contains(&self, receiver: &Address) -> bool {
        self.by_receiver.contains_key(receiver)
    }

    /// Shares pending for `receiver` (zero when no claim exists)
    pub fn pending_shares(&self, receiver: &Address) -> Amount {
        match self.by_receiver.get(receiver) {
            Some(&idx) => match &self.slots[idx as usize] {
                Slot::Occupied { entry, .. } => entry.shares,
                Slot::Free { .. } => 0,
            },
            None => 0,
        }
    }

    /// Insert a claim at the front
    ///
    /// Fails when the receiver already has a live claim; the one-claim-per-
    /// receiver invariant is enforced here, not by callers.
    pub fn push_front(&mut self, entry: PendingWithdrawal) -> Result<()> {
        if self.contains(&entry.receiver) {
            return Err(Error::PendingWithdrawalAddress(entry.receiver.clone()));
        }

        let receiver = entry.receiver.clone();
        let slot = Slot::Occupied {
            entry,
            next: self.head,
        };

        let idx = if self.free_head != NIL {
            let idx = self.free_head;
            self.free_head = match self.slots[idx as usize] {
                Slot::Free { next_free } => next_free,
                Slot::Occupied { .. } => NIL, // free list never points at occupied slots
            };
            self.slots[idx as usize] = slot;
            idx
        } else {
            self.slots.push(slot);
            (self.slots.len() - 1) as u32
        };

        self.head = idx;
        self.by_receiver.insert(receiver, idx);
        self.len += 1;
        Ok(())
    }

    /// The front claim (most recently inserted), without removing it
    pub fn peek_front(&self) -> Option<&PendingWithdrawal> {
        if self.head == NIL {
            return None;
        }
        match &self.slots[self.head as usize] {
            Slot::Occupied { entry, .. } => Some(entry),
            Slot::Free { .. } => None,
        }
    }

    /// Remove and return the front claim, relinking the head
    pub fn pop_front(&mut self) -> Option<PendingWithdrawal> {
        if self.head == NIL {
            return None;
        }
        let idx = self.head;
        let (entry, next) = match std::mem::replace(
            &mut self.slots[idx as usize],
            Slot::Free {
                next_free: self.free_head,
            },
        ) {
            Slot::Occupied { entry, next } => (entry, next),
            Slot::Free { next_free } => {
                // Head pointed at a free slot: restore and bail. Unreachable
                // while the link invariant holds.
                self.slots[idx as usize] = Slot::Free { next_free };
                return None;
            }
        };

        self.free_head = idx;
        self.head = next;
        self.by_receiver.remove(&entry.receiver);
        self.len -= 1;
        Some(entry)
    }

    /// Iterate live claims front to back (settlement order)
    pub fn iter(&self) -> impl Iterator<Item = &PendingWithdrawal> {
        QueueIter {
            queue: self,
            cursor: self.head,
            visited: 0,
        }
    }

    /// Mechanically verify the link invariant
    ///
    /// Walks from the head, checking that the walk terminates, visits
    /// exactly `len` occupied slots with no repeats, and that the receiver
    /// index agrees with the links.
    pub fn check_links(&self) -> std::result::Result<(), String> {
        let mut visited = vec![false; self.slots.len()];
        let mut count = 0usize;
        let mut cursor = self.head;

        while cursor != NIL {
            let idx = cursor as usize;
            if idx >= self.slots.len() {
                return Err(format!("link out of bounds: {}", idx));
            }
            if visited[idx] {
                return Err(format!("cycle through slot {}", idx));
            }
            visited[idx] = true;

            match &self.slots[idx] {
                Slot::Occupied { entry, next } => {
                    match self.by_receiver.get(&entry.receiver) {
                        Some(&mapped) if mapped == cursor => {}
                        _ => return Err(format!("receiver index disagrees at slot {}", idx)),
                    }
                    count += 1;
                    cursor = *next;
                }
                Slot::Free { .. } => {
                    return Err(format!("live link into free slot {}", idx));
                }
            }
        }

        if count != self.len {
            return Err(format!("walk visited {} nodes, size counter says {}", count, self.len));
        }
        if self.by_receiver.len() != self.len {
            return Err("receiver index size disagrees with size counter".to_string());
        }
        Ok(())
    }
}

struct QueueIter<'a> {
    queue: &'a WithdrawalQueue,
    cursor: u32,
    visited: usize,
}

impl<'a> Iterator for QueueIter<'a> {
    type Item = &'a PendingWithdrawal;

    fn next(&mut self) -> Option<Self::Item> {
        // Visit cap makes iteration terminate even on corrupted links.
        if self.cursor == NIL || self.visited >= self.queue.slots.len() {
            return None;
        }
        match &self.queue.slots[self.cursor as usize] {
            Slot::Occupied { entry, next } => {
                self.cursor = *next;
                self.visited += 1;
                Some(entry)
            }
            Slot::Free { .. } => None,
        }
    }
}

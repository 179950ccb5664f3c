//! # Admission queue: per-type FIFO lanes plus a global ordering index.
//!
//! Each request type owns one lane. Every enqueue stamps the entry with the next
//! value of a monotonic global sequence, which is the only tie-break used
//! across types.
//!
//! ## Invariants
//! - Within a lane, entries are strictly FIFO (heads hold the lane's smallest seq).
//! - When capacity frees, the next admitted entry is the one with the smallest
//!   seq among lanes whose type still has per-type room (oldest-first, not
//!   round-robin, not priority-by-type).
//! - `remove` takes an entry out of the middle of a lane without reordering
//!   the rest.

use std::collections::{HashMap, VecDeque};

use tokio::time::Instant;

use crate::requests::{RequestId, RequestType};

/// One waiting entry.
#[derive(Debug)]
pub(crate) struct Pending<T> {
    pub id: RequestId,
    pub request_type: RequestType,
    pub enqueued_at: Instant,
    pub seq: u64,
    pub item: T,
}

#[derive(Debug)]
struct Lane<T> {
    max_queue: usize,
    waiters: VecDeque<Pending<T>>,
}

impl<T> Lane<T> {
    fn new(max_queue: usize) -> Self {
        Self {
            max_queue,
            waiters: VecDeque::new(),
        }
    }
}

/// Per-type FIFO lanes with cross-type oldest-first selection.
#[derive(Debug)]
pub(crate) struct AdmissionQueue<T> {
    lanes: HashMap<RequestType, Lane<T>>,
    next_seq: u64,
}

impl<T> AdmissionQueue<T> {
    pub fn new() -> Self {
        Self {
            lanes: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Creates the lane for `ty` with the given ceiling. No-op if present.
    pub fn register(&mut self, ty: &RequestType, max_queue: usize) {
        self.lanes
            .entry(ty.clone())
            .or_insert_with(|| Lane::new(max_queue));
    }

    /// Sets (or creates) the ceiling of `ty`'s lane. Returns the previous one.
    pub fn set_max_queue(&mut self, ty: &RequestType, max_queue: usize) -> Option<usize> {
        match self.lanes.get_mut(ty) {
            Some(lane) => Some(std::mem::replace(&mut lane.max_queue, max_queue)),
            None => {
                self.lanes.insert(ty.clone(), Lane::new(max_queue));
                None
            }
        }
    }

    pub fn max_queue(&self, ty: &RequestType) -> Option<usize> {
        self.lanes.get(ty).map(|l| l.max_queue)
    }

    /// True if `ty`'s lane has reached its ceiling (unknown lanes count as full).
    pub fn is_full(&self, ty: &RequestType) -> bool {
        self.lanes
            .get(ty)
            .is_none_or(|l| l.waiters.len() >= l.max_queue)
    }

    /// Appends to the tail of the entry's lane and assigns the next global seq.
    ///
    /// The lane is created with ceiling `0` if missing; callers register first.
    pub fn enqueue(&mut self, id: RequestId, ty: &RequestType, item: T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let lane = self
            .lanes
            .entry(ty.clone())
            .or_insert_with(|| Lane::new(0));
        lane.waiters.push_back(Pending {
            id,
            request_type: ty.clone(),
            enqueued_at: Instant::now(),
            seq,
            item,
        });
        seq
    }

    /// Head of `ty`'s lane.
    pub fn next_eligible(&self, ty: &RequestType) -> Option<&Pending<T>> {
        self.lanes.get(ty).and_then(|l| l.waiters.front())
    }

    /// The type whose head is the oldest waiter among lanes accepted by `eligible`.
    pub fn oldest_eligible<F>(&self, mut eligible: F) -> Option<RequestType>
    where
        F: FnMut(&RequestType) -> bool,
    {
        self.lanes
            .keys()
            .filter_map(|ty| self.next_eligible(ty).map(|head| (ty, head.seq)))
            .filter(|(ty, _)| eligible(ty))
            .min_by_key(|(_, seq)| *seq)
            .map(|(ty, _)| ty.clone())
    }

    pub fn pop_front(&mut self, ty: &RequestType) -> Option<Pending<T>> {
        self.lanes.get_mut(ty).and_then(|l| l.waiters.pop_front())
    }

    /// Removes an entry from anywhere in its lane, preserving the others' order.
    pub fn remove(&mut self, id: RequestId) -> Option<Pending<T>> {
        for lane in self.lanes.values_mut() {
            if let Some(pos) = lane.waiters.iter().position(|p| p.id == id) {
                return lane.waiters.remove(pos);
            }
        }
        None
    }

    /// Empties every lane, oldest first.
    pub fn drain(&mut self) -> Vec<Pending<T>> {
        let mut all: Vec<Pending<T>> = self
            .lanes
            .values_mut()
            .flat_map(|l| l.waiters.drain(..))
            .collect();
        all.sort_by_key(|p| p.seq);
        all
    }

    pub fn len(&self, ty: &RequestType) -> usize {
        self.lanes.get(ty).map_or(0, |l| l.waiters.len())
    }

    pub fn total_len(&self) -> usize {
        self.lanes.values().map(|l| l.waiters.len()).sum()
    }

    /// True if any lane with waiters has reached its ceiling.
    pub fn any_at_ceiling(&self) -> bool {
        self.lanes
            .values()
            .any(|l| !l.waiters.is_empty() && l.waiters.len() >= l.max_queue)
    }
}

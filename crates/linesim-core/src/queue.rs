//! Bounded component buffers between the inspectors and the workstations.
//!
//! Capacity is a logical limit checked by [`ComponentQueue::has_space`];
//! storage grows on demand, so any capacity the configuration accepts is
//! cheap to construct.

use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use crate::id::{ComponentId, QueueId};

/// Default capacity of every component queue.
pub const DEFAULT_CAPACITY: usize = 2;

/// A bounded FIFO buffer of inspected components awaiting a workstation.
///
/// Every length change appends `(time, new_length)` to an append-only
/// occupancy history used for time-weighted averaging. The history never
/// feeds control decisions.
#[derive(Debug, Clone)]
pub struct ComponentQueue {
    id: QueueId,
    capacity: usize,
    contents: VecDeque<ComponentId>,
    /// `(time, length)` pairs, non-decreasing in time. The first entry marks
    /// the start of the statistics window.
    history: Vec<(f64, usize)>,
    /// Components removed since the statistics window started.
    departures: u64,
}

impl ComponentQueue {
    pub fn new(id: QueueId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            contents: VecDeque::new(),
            history: vec![(0.0, 0)],
            departures: 0,
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn length(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn has_space(&self) -> bool {
        self.contents.len() < self.capacity
    }

    /// Components currently buffered, front first.
    pub fn contents(&self) -> impl Iterator<Item = &ComponentId> {
        self.contents.iter()
    }

    pub fn departures(&self) -> u64 {
        self.departures
    }

    pub fn occupancy_history(&self) -> &[(f64, usize)] {
        &self.history
    }

    /// Append a component at the back.
    ///
    /// # Panics
    ///
    /// Panics if the queue is full; the scheduler must check
    /// [`has_space`](Self::has_space) first.
    pub fn enqueue(&mut self, component: ComponentId, time: f64) {
        assert!(
            self.has_space(),
            "enqueue into full queue {} (capacity {})",
            self.id.name(),
            self.capacity
        );
        self.contents.push_back(component);
        self.record(time);
    }

    /// Remove the component at the front.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    pub fn dequeue(&mut self, time: f64) -> ComponentId {
        let component = self
            .contents
            .pop_front()
            .unwrap_or_else(|| panic!("dequeue from empty queue {}", self.id.name()));
        self.departures += 1;
        self.record(time);
        component
    }

    fn record(&mut self, time: f64) {
        debug_assert!(
            self.history.last().is_none_or(|&(t, _)| t <= time),
            "occupancy history must be non-decreasing in time"
        );
        self.history.push((time, self.contents.len()));
    }

    /// Time-weighted mean length over `[window_start, as_of]`, where the
    /// window starts at the first history entry. Returns `0.0` for an empty
    /// window.
    pub fn time_weighted_average_occupancy(&self, as_of: f64) -> f64 {
        let start = self.history[0].0;
        let window = as_of - start;
        if window <= 0.0 {
            return 0.0;
        }
        let mut area = 0.0;
        for pair in self.history.windows(2) {
            let (t0, len) = pair[0];
            let t1 = pair[1].0.min(as_of);
            if t1 > t0 {
                area += len as f64 * (t1 - t0);
            }
        }
        if let Some(&(t_last, len)) = self.history.last()
            && as_of > t_last
        {
            area += len as f64 * (as_of - t_last);
        }
        area / window
    }

    /// Restart the statistics window at `time`, keeping the contents.
    pub fn reset_statistics(&mut self, time: f64) {
        self.history.clear();
        self.history.push((time, self.contents.len()));
        self.departures = 0;
    }
}

/// The five queues of the line, addressable by [`QueueId`].
#[derive(Debug, Clone)]
pub struct QueueSet {
    queues: [ComponentQueue; 5],
}

impl QueueSet {
    /// Build the queue set with per-queue capacities in [`QueueId::ALL`] order.
    pub fn new(capacities: [usize; 5]) -> Self {
        Self {
            queues: QueueId::ALL.map(|id| ComponentQueue::new(id, capacities[id.index()])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentQueue> {
        self.queues.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ComponentQueue> {
        self.queues.iter_mut()
    }

    /// Whether any of the given queues can take another component.
    pub fn any_space(&self, ids: &[QueueId]) -> bool {
        ids.iter().any(|&id| self[id].has_space())
    }

    /// Whether every given queue holds at least one component.
    pub fn all_nonempty(&self, ids: &[QueueId]) -> bool {
        ids.iter().all(|&id| !self[id].is_empty())
    }
}

impl Index<QueueId> for QueueSet {
    type Output = ComponentQueue;

    fn index(&self, id: QueueId) -> &ComponentQueue {
        &self.queues[id.index()]
    }
}

impl IndexMut<QueueId> for QueueSet {
    fn index_mut(&mut self, id: QueueId) -> &mut ComponentQueue {
        &mut self.queues[id.index()]
    }
}

//! Simulation events and the future-event list.
//!
//! Events are processed in strict time order. Events scheduled for the same
//! time are processed in the order they were scheduled (FIFO by insertion
//! sequence), which keeps runs bit-for-bit reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::id::{ComponentId, EntityId, InspectorId, ProductId, WorkstationId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A scheduled occurrence. Every variant carries the time it fires at and
/// only the fields its handler needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A raw component reaches an inspector's single inspection slot.
    Arrival {
        time: f64,
        inspector: InspectorId,
        component: ComponentId,
    },
    /// An inspector finishes inspecting a component.
    InspectionDone {
        time: f64,
        inspector: InspectorId,
        component: ComponentId,
    },
    /// A workstation finishes assembling a product, which leaves the system.
    ProductionDone {
        time: f64,
        station: WorkstationId,
        product: ProductId,
    },
}

/// Discriminant tag for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Arrival,
    Departure,
}

impl Event {
    pub fn time(&self) -> f64 {
        match *self {
            Event::Arrival { time, .. }
            | Event::InspectionDone { time, .. }
            | Event::ProductionDone { time, .. } => time,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Arrival { .. } => EventKind::Arrival,
            Event::InspectionDone { .. } | Event::ProductionDone { .. } => EventKind::Departure,
        }
    }

    /// The entity whose handler runs when this event is dispatched.
    pub fn entity(&self) -> EntityId {
        match *self {
            Event::Arrival { inspector, .. } | Event::InspectionDone { inspector, .. } => {
                EntityId::Inspector(inspector)
            }
            Event::ProductionDone { station, .. } => EntityId::Workstation(station),
        }
    }
}

// ---------------------------------------------------------------------------
// Future-event list
// ---------------------------------------------------------------------------

/// Heap entry. Orders so that `BinaryHeap` (a max-heap) pops the earliest
/// time first, then the lowest insertion sequence.
#[derive(Debug)]
struct Scheduled {
    event: Event,
    seq: u64,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .time()
            .total_cmp(&self.event.time())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered collection of pending events.
#[derive(Debug, Default)]
pub struct FutureEventList {
    heap: BinaryHeap<Scheduled>,
    /// Insertion counter for FIFO tie-breaking.
    next_seq: u64,
}

impl FutureEventList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event. Its time must be finite.
    pub fn schedule(&mut self, event: Event) {
        assert!(
            event.time().is_finite(),
            "event scheduled at non-finite time: {event:?}"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { event, seq });
    }

    /// Remove and return the earliest event, or `None` if the list is empty.
    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.heap.pop().map(|s| s.event)
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|s| s.event.time())
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total events ever scheduled.
    pub fn total_scheduled(&self) -> u64 {
        self.next_seq
    }
}

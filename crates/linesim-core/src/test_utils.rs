//! Shared helpers for unit tests, integration tests, and benches.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::SimConfig;
use crate::engine::Engine;
use crate::event::{Event, EventKind};
use crate::id::{ComponentId, ComponentType, QueueId};
use crate::observe::Observation;
use crate::queue::{DEFAULT_CAPACITY, QueueSet};
use crate::rng::UniformStream;

/// A uniform stream that replays fixed values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedStream {
    values: Vec<f64>,
    next: usize,
}

impl ScriptedStream {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
        }
    }
}

impl UniformStream for ScriptedStream {
    fn next_uniform(&mut self) -> f64 {
        assert!(!self.values.is_empty(), "scripted stream has no values");
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v
    }
}

pub fn component(kind: ComponentType, sequence: u64) -> ComponentId {
    ComponentId { kind, sequence }
}

pub fn c1(sequence: u64) -> ComponentId {
    component(ComponentType::C1, sequence)
}

/// A default-capacity queue set with the C1 queues pre-filled to the given
/// lengths (c11, c12, c13). C2 and C3 stay empty.
pub fn queues_with_c1_lengths(lengths: [usize; 3]) -> QueueSet {
    let mut queues = QueueSet::new([DEFAULT_CAPACITY; 5]);
    let mut seq = 0;
    for (q, len) in [QueueId::C11, QueueId::C12, QueueId::C13].into_iter().zip(lengths) {
        for _ in 0..len {
            queues[q].enqueue(c1(seq), 0.0);
            seq += 1;
        }
    }
    queues
}

/// Subscribe a listener that records every observation.
pub fn record_observations(engine: &mut Engine) -> Rc<RefCell<Vec<Observation>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.subscribe(Box::new(move |o| sink.borrow_mut().push(o.clone())));
    log
}

/// Build an engine from `config` and run it to its target.
pub fn run_to_target(config: SimConfig) -> Engine {
    let mut engine = Engine::new(config).expect("valid config");
    engine.run().expect("run completes");
    engine
}

/// Step until finished, collecting every dispatched event.
pub fn dispatched_events(engine: &mut Engine) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = engine.step().expect("run completes") {
        events.push(event);
    }
    events
}

pub fn event_kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(Event::kind).collect()
}

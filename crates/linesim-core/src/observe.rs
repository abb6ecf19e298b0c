//! Passive observation of domain occurrences.
//!
//! The engine reports what happens to components and entities as
//! [`Observation`]s. Listeners are called synchronously, in registration
//! order, while the event that caused the observation is being dispatched.
//! Listeners cannot mutate the simulation.

use crate::id::{ComponentId, InspectorId, ProductId, QueueId, WorkstationId};

/// Something that happened during a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    ComponentCreated {
        time: f64,
        inspector: InspectorId,
        component: ComponentId,
    },
    ComponentQueued {
        time: f64,
        queue: QueueId,
        component: ComponentId,
    },
    ComponentsConsumed {
        time: f64,
        station: WorkstationId,
        product: ProductId,
        components: Vec<ComponentId>,
    },
    InspectorBlocked {
        time: f64,
        inspector: InspectorId,
        component: ComponentId,
    },
    InspectorUnblocked {
        time: f64,
        inspector: InspectorId,
        component: ComponentId,
    },
    ProductCompleted {
        time: f64,
        product: ProductId,
        /// Products departed so far, including this one.
        total: u64,
    },
    StatisticsReset {
        time: f64,
    },
}

/// Discriminant tag for observations, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationKind {
    ComponentCreated,
    ComponentQueued,
    ComponentsConsumed,
    InspectorBlocked,
    InspectorUnblocked,
    ProductCompleted,
    StatisticsReset,
}

impl Observation {
    pub fn kind(&self) -> ObservationKind {
        match self {
            Observation::ComponentCreated { .. } => ObservationKind::ComponentCreated,
            Observation::ComponentQueued { .. } => ObservationKind::ComponentQueued,
            Observation::ComponentsConsumed { .. } => ObservationKind::ComponentsConsumed,
            Observation::InspectorBlocked { .. } => ObservationKind::InspectorBlocked,
            Observation::InspectorUnblocked { .. } => ObservationKind::InspectorUnblocked,
            Observation::ProductCompleted { .. } => ObservationKind::ProductCompleted,
            Observation::StatisticsReset { .. } => ObservationKind::StatisticsReset,
        }
    }
}

/// A listener receives observations read-only.
pub type Listener = Box<dyn FnMut(&Observation)>;

struct Subscription {
    filter: Option<ObservationKind>,
    listener: Listener,
}

/// Fan-out of observations to registered listeners.
#[derive(Default)]
pub struct ObserverBus {
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for ObserverBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverBus")
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}

impl ObserverBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every observation.
    pub fn subscribe(&mut self, listener: Listener) {
        self.subscriptions.push(Subscription {
            filter: None,
            listener,
        });
    }

    /// Receive only observations of one kind.
    pub fn subscribe_to(&mut self, kind: ObservationKind, listener: Listener) {
        self.subscriptions.push(Subscription {
            filter: Some(kind),
            listener,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Build and deliver an observation. The builder only runs when someone
    /// is listening.
    pub fn emit_with(&mut self, build: impl FnOnce() -> Observation) {
        if self.subscriptions.is_empty() {
            return;
        }
        let observation = build();
        let kind = observation.kind();
        for sub in &mut self.subscriptions {
            if sub.filter.is_none_or(|k| k == kind) {
                (sub.listener)(&observation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn reset(time: f64) -> Observation {
        Observation::StatisticsReset { time }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = ObserverBus::new();
        for tag in ["a", "b"] {
            let log = Rc::clone(&log);
            bus.subscribe(Box::new(move |_| log.borrow_mut().push(tag)));
        }
        bus.emit_with(|| reset(1.0));
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn filtered_listener_skips_other_kinds() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = ObserverBus::new();
        let c = Rc::clone(&count);
        bus.subscribe_to(
            ObservationKind::ProductCompleted,
            Box::new(move |_| *c.borrow_mut() += 1),
        );
        bus.emit_with(|| reset(1.0));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn builder_not_called_without_listeners() {
        let mut bus = ObserverBus::new();
        bus.emit_with(|| panic!("should not build"));
        assert!(bus.is_empty());
    }
}

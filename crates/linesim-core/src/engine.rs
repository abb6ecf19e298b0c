//! The simulation engine: owns every entity and the future-event list, and
//! implements the routing and blocking protocol that couples them.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`SimState`] (clock, product count, statistics window, id counters)
//! - A [`FutureEventList`] of pending events
//! - Two [`Inspector`]s, a [`QueueSet`] of five queues, three [`Workstation`]s
//! - The routing and component-selection streams
//! - An [`ObserverBus`] for passive listeners
//!
//! Entities never call each other. All cross-entity effects happen here:
//!
//! - **Arrival generation** -- an inspector gets its next raw component only
//!   after its previous output has been placed in a queue.
//! - **Routing** -- C1 goes to the shortest C1 queue with space, ties broken by
//!   the configured [`TieBreak`](crate::policy::TieBreak); C2 and C3 each have
//!   one queue.
//! - **Blocking** -- an inspector whose every matching queue is full keeps its
//!   component and receives no new arrival.
//! - **Notification** -- whenever a workstation consumes, and again when it
//!   finishes a product, every inspector feeding that station is notified. A
//!   notified inspector that is blocked and now has room is unblocked and its
//!   component routed, within the same dispatch.

use tracing::{debug, info, trace};

use crate::config::{ConfigError, SimConfig};
use crate::event::{Event, FutureEventList};
use crate::id::{ComponentId, ComponentType, InspectorId, ProductId, QueueId, WorkstationId};
use crate::inspector::{Inspector, InspectorState};
use crate::observe::{Listener, Observation, ObservationKind, ObserverBus};
use crate::query::{EngineSnapshot, InspectorSnapshot, QueueSnapshot, WorkstationSnapshot};
use crate::queue::{ComponentQueue, QueueSet};
use crate::rng::{RngStreams, ServiceTime, UniformStream, pick_index};
use crate::sim::{SimState, StateHash};
use crate::topology::queues_for;
use crate::workstation::Workstation;

/// Errors that end a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The event list ran dry before the target was reached. Under a correct
    /// routing protocol this cannot happen.
    #[error("future-event list empty at t={clock} with {produced} of {target} products made")]
    Stalled { clock: f64, produced: u64, target: u64 },
}

/// The discrete-event scheduler for the line.
pub struct Engine {
    config: SimConfig,
    state: SimState,
    fel: FutureEventList,
    inspectors: [Inspector; 2],
    queues: QueueSet,
    workstations: [Workstation; 3],
    /// Random C1 tie-breaking.
    policy_stream: Box<dyn UniformStream>,
    /// Inspector 2's C2/C3 choice.
    selection_stream: Box<dyn UniformStream>,
    observers: ObserverBus,
    started: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("pending_events", &self.fel.len())
            .field("inspectors", &self.inspectors)
            .field("queues", &self.queues)
            .field("workstations", &self.workstations)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine whose streams derive from `config.seed`.
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        let streams = RngStreams::from_seed(config.seed);
        Self::with_streams(config, streams)
    }

    /// Create an engine with caller-supplied random streams.
    pub fn with_streams(config: SimConfig, streams: RngStreams) -> Result<Self, EngineError> {
        config.validate()?;

        let RngStreams {
            insp1_c1,
            insp2_c2,
            insp2_c3,
            w1,
            w2,
            w3,
            policy,
            selection,
        } = streams;

        let inspect = |kind: ComponentType, stream| ServiceTime::new(config.inspector_rate(kind), stream);
        let assemble =
            |station: WorkstationId, stream| ServiceTime::new(config.workstation_rate(station), stream);

        let inspectors = [
            Inspector::new(InspectorId::Insp1).with_service(ComponentType::C1, inspect(ComponentType::C1, insp1_c1)),
            Inspector::new(InspectorId::Insp2)
                .with_service(ComponentType::C2, inspect(ComponentType::C2, insp2_c2))
                .with_service(ComponentType::C3, inspect(ComponentType::C3, insp2_c3)),
        ];
        let workstations = [
            Workstation::new(WorkstationId::W1, assemble(WorkstationId::W1, w1)),
            Workstation::new(WorkstationId::W2, assemble(WorkstationId::W2, w2)),
            Workstation::new(WorkstationId::W3, assemble(WorkstationId::W3, w3)),
        ];

        Ok(Self {
            queues: QueueSet::new(config.capacities),
            config,
            state: SimState::new(),
            fel: FutureEventList::new(),
            inspectors,
            workstations,
            policy_stream: policy,
            selection_stream: selection,
            observers: ObserverBus::new(),
            started: false,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn clock(&self) -> f64 {
        self.state.clock
    }

    pub fn products_departed(&self) -> u64 {
        self.state.products_departed
    }

    pub fn inspector(&self, id: InspectorId) -> &Inspector {
        &self.inspectors[id.index()]
    }

    pub fn queue(&self, id: QueueId) -> &ComponentQueue {
        &self.queues[id]
    }

    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    pub fn workstation(&self, id: WorkstationId) -> &Workstation {
        &self.workstations[id.index()]
    }

    pub fn pending_events(&self) -> usize {
        self.fel.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state.products_departed >= self.config.target_products
    }

    /// Register a listener for every observation.
    pub fn subscribe(&mut self, listener: Listener) {
        self.observers.subscribe(listener);
    }

    /// Register a listener for one kind of observation.
    pub fn subscribe_to(&mut self, kind: ObservationKind, listener: Listener) {
        self.observers.subscribe_to(kind, listener);
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Schedule the first arrival for each inspector. Idempotent; called
    /// implicitly by the first [`step`](Self::step).
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            seed = self.config.seed,
            target = self.config.target_products,
            warmup = self.config.warmup_products,
            tie_break = %self.config.tie_break,
            "starting run"
        );
        for inspector in InspectorId::ALL {
            self.schedule_arrival(inspector);
        }
    }

    /// Dispatch the earliest pending event and return it. Returns `Ok(None)`
    /// once the target has been reached.
    pub fn step(&mut self) -> Result<Option<Event>, EngineError> {
        if self.is_finished() {
            return Ok(None);
        }
        self.start();

        let Some(event) = self.fel.pop_earliest() else {
            return Err(EngineError::Stalled {
                clock: self.state.clock,
                produced: self.state.products_departed,
                target: self.config.target_products,
            });
        };
        assert!(
            event.time() >= self.state.clock,
            "clock would regress from {} to {}",
            self.state.clock,
            event.time()
        );
        self.state.clock = event.time();
        self.state.dispatched += 1;
        debug!(time = event.time(), kind = ?event.kind(), entity = %event.entity(), "dispatch");

        match event {
            Event::Arrival {
                inspector,
                component,
                ..
            } => self.on_arrival(inspector, component),
            Event::InspectionDone {
                inspector,
                component,
                ..
            } => self.on_inspection_done(inspector, component),
            Event::ProductionDone {
                station, product, ..
            } => self.on_production_done(station, product),
        }
        Ok(Some(event))
    }

    /// Dispatch events until the target product count is reached.
    pub fn run(&mut self) -> Result<(), EngineError> {
        while !self.is_finished() {
            self.step()?;
        }
        info!(
            clock = self.state.clock,
            products = self.state.products_departed,
            events = self.state.dispatched,
            "run complete"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn on_arrival(&mut self, inspector: InspectorId, component: ComponentId) {
        let time = self.state.clock;
        if let Some(done) = self.inspectors[inspector.index()].begin_inspection(component, time) {
            self.fel.schedule(done);
        }
    }

    fn on_inspection_done(&mut self, inspector: InspectorId, component: ComponentId) {
        let time = self.state.clock;
        let insp = &mut self.inspectors[inspector.index()];
        debug_assert_eq!(insp.held_component(), Some(component));

        let has_room = self.queues.any_space(queues_for(component.kind));
        match insp.complete_inspection(time, has_room) {
            Some(released) => self.deliver(inspector, released),
            None => {
                debug!(time, inspector = inspector.name(), %component, "inspector blocked");
                self.observers.emit_with(|| Observation::InspectorBlocked {
                    time,
                    inspector,
                    component,
                });
            }
        }
    }

    fn on_production_done(&mut self, station: WorkstationId, product: ProductId) {
        let time = self.state.clock;
        let finished = self.workstations[station.index()].complete_service(time);
        debug_assert_eq!(finished, product);
        self.state.products_departed += 1;
        let total = self.state.products_departed;
        trace!(time, %product, total, "product departed");
        self.observers
            .emit_with(|| Observation::ProductCompleted { time, product, total });

        self.try_start(station);
        for inspector in station.feeders() {
            self.notify(inspector);
        }

        if self.config.warmup_products > 0 && total == self.config.warmup_products {
            self.reset_statistics();
        }
    }

    // -----------------------------------------------------------------------
    // Routing protocol
    // -----------------------------------------------------------------------

    /// Place a released component in its queue, let the consuming station
    /// react, then give the inspector its next raw component.
    fn deliver(&mut self, inspector: InspectorId, component: ComponentId) {
        let time = self.state.clock;
        let queue = self
            .target_queue(component)
            .unwrap_or_else(|| panic!("no queue has space for released {component}"));
        self.queues[queue].enqueue(component, time);
        self.observers.emit_with(|| Observation::ComponentQueued {
            time,
            queue,
            component,
        });

        self.try_start(queue.consumer());
        self.schedule_arrival(inspector);
    }

    /// Choose the destination queue for a component, or `None` if every
    /// matching queue is full.
    fn target_queue(&mut self, component: ComponentId) -> Option<QueueId> {
        let candidates = queues_for(component.kind);
        match component.kind {
            ComponentType::C1 => {
                let partner = self.blocked_partner();
                self.config.tie_break.select(
                    candidates,
                    &self.queues,
                    partner,
                    self.policy_stream.as_mut(),
                )
            }
            ComponentType::C2 | ComponentType::C3 => {
                candidates.iter().copied().find(|&q| self.queues[q].has_space())
            }
        }
    }

    /// The C1 queue feeding the same station as inspector 2's blocked
    /// component, if inspector 2 is blocked.
    fn blocked_partner(&self) -> Option<QueueId> {
        let InspectorState::Blocked(held) = self.inspectors[InspectorId::Insp2.index()].state()
        else {
            return None;
        };
        let station = queues_for(held.kind).first()?.consumer();
        queues_for(ComponentType::C1)
            .iter()
            .copied()
            .find(|q| q.consumer() == station)
    }

    /// Start a job at `station` if it can, then notify its feeders since
    /// consumption freed a slot in each required queue.
    fn try_start(&mut self, station: WorkstationId) {
        let time = self.state.clock;
        let Some(start) = self.workstations[station.index()].attempt_service(&mut self.queues, time)
        else {
            return;
        };
        self.fel.schedule(start.departure);
        trace!(time, product = %start.product, "production started");
        self.observers.emit_with(|| Observation::ComponentsConsumed {
            time,
            station,
            product: start.product,
            components: start.consumed.iter().map(|&(_, c)| c).collect(),
        });

        for inspector in station.feeders() {
            self.notify(inspector);
        }
    }

    /// Unblock `inspector` and route its component if it is blocked and a
    /// matching queue now has room. Otherwise a no-op.
    fn notify(&mut self, inspector: InspectorId) {
        let time = self.state.clock;
        let InspectorState::Blocked(held) = self.inspectors[inspector.index()].state() else {
            return;
        };
        if !self.queues.any_space(queues_for(held.kind)) {
            return;
        }
        let component = self.inspectors[inspector.index()].unblock(time);
        debug!(time, inspector = inspector.name(), %component, "inspector unblocked");
        self.observers.emit_with(|| Observation::InspectorUnblocked {
            time,
            inspector,
            component,
        });
        self.deliver(inspector, component);
    }

    fn schedule_arrival(&mut self, inspector: InspectorId) {
        let time = self.state.clock;
        let component = self.next_component(inspector);
        self.observers.emit_with(|| Observation::ComponentCreated {
            time,
            inspector,
            component,
        });
        self.fel.schedule(Event::Arrival {
            time,
            inspector,
            component,
        });
    }

    /// Create the next component for an inspector. Inspector 2 draws C2 or
    /// C3 with equal probability.
    fn next_component(&mut self, inspector: InspectorId) -> ComponentId {
        let kinds = inspector.component_types();
        let kind = if kinds.len() == 1 {
            kinds[0]
        } else {
            kinds[pick_index(self.selection_stream.as_mut(), kinds.len())]
        };
        let counter = &mut self.state.next_component[kind.index()];
        let component = ComponentId {
            kind,
            sequence: *counter,
        };
        *counter += 1;
        component
    }

    fn reset_statistics(&mut self) {
        let time = self.state.clock;
        for queue in self.queues.iter_mut() {
            queue.reset_statistics(time);
        }
        for inspector in &mut self.inspectors {
            inspector.reset_statistics(time);
        }
        for station in &mut self.workstations {
            station.reset_statistics(time);
        }
        self.state.stats_start = time;
        self.state.products_at_stats_start = self.state.products_departed;
        info!(
            time,
            products = self.state.products_departed,
            "warm-up complete; statistics reset"
        );
        self.observers
            .emit_with(|| Observation::StatisticsReset { time });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Per-entity counters as of the current clock, with ongoing busy and
    /// blocked intervals included.
    pub fn snapshot(&self) -> EngineSnapshot {
        let as_of = self.state.clock;
        EngineSnapshot {
            clock: as_of,
            stats_start: self.state.stats_start,
            products_departed: self.state.products_departed,
            products_in_window: self.state.products_in_window(),
            target_products: self.config.target_products,
            dispatched: self.state.dispatched,
            inspectors: self
                .inspectors
                .iter()
                .map(|i| InspectorSnapshot {
                    id: i.id(),
                    blocked: i.is_blocked(),
                    held: i.held_component(),
                    busy_time: i.busy_time(as_of),
                    blocked_time: i.blocked_time(as_of),
                    completed: i.completed(),
                    blocked_episodes: i.blocked_episodes(),
                })
                .collect(),
            queues: self
                .queues
                .iter()
                .map(|q| QueueSnapshot {
                    id: q.id(),
                    length: q.length(),
                    capacity: q.capacity(),
                    departures: q.departures(),
                    average_occupancy: q.time_weighted_average_occupancy(as_of),
                })
                .collect(),
            workstations: self
                .workstations
                .iter()
                .map(|w| WorkstationSnapshot {
                    id: w.id(),
                    busy: w.is_busy(),
                    busy_time: w.busy_time(as_of),
                    products_made: w.products_made(),
                })
                .collect(),
        }
    }

    /// Fingerprint of the full dynamic state, for determinism checks.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_f64(self.state.clock);
        h.write_u64(self.state.products_departed);
        h.write_u64(self.state.dispatched);
        for n in self.state.next_component {
            h.write_u64(n);
        }
        for queue in self.queues.iter() {
            h.write_u64(queue.length() as u64);
            for c in queue.contents() {
                h.write_u64(c.kind.index() as u64);
                h.write_u64(c.sequence);
            }
        }
        for insp in &self.inspectors {
            h.write_u64(match insp.state() {
                InspectorState::Free => 0,
                InspectorState::Inspecting(_) => 1,
                InspectorState::Blocked(_) => 2,
            });
            h.write_f64(insp.busy_time(self.state.clock));
            h.write_f64(insp.blocked_time(self.state.clock));
        }
        for station in &self.workstations {
            h.write_u64(station.products_made());
            h.write_f64(station.busy_time(self.state.clock));
        }
        h.finish()
    }
}

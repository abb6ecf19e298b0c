//! Linesim Core -- the discrete-event engine for a small manufacturing line.
//!
//! Two inspectors feed five bounded component queues that supply three
//! workstations. The engine advances a simulation clock by popping the
//! earliest pending event from a future-event list and dispatching it to the
//! entity it names; entity handlers may schedule further events.
//!
//! # Dispatch Loop
//!
//! Each call to [`engine::Engine::step`] performs exactly one dispatch:
//!
//! 1. **Pop** -- Remove the earliest event (ties broken FIFO by insertion).
//! 2. **Advance** -- Set the clock to the event time. The clock never regresses.
//! 3. **Dispatch** -- Run the arrival or departure handler to completion.
//! 4. **Route** -- Deliver finished components, block or unblock inspectors,
//!    and start workstation jobs whose inputs are all present.
//! 5. **Bookkeeping** -- Count departed products and apply the warm-up reset.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns every entity, the clock, and the event list.
//! - [`event::FutureEventList`] -- Min-heap of pending [`event::Event`]s.
//! - [`queue::ComponentQueue`] -- Bounded FIFO buffer with occupancy history.
//! - [`inspector::Inspector`] -- Free / Inspecting / Blocked state machine.
//! - [`workstation::Workstation`] -- Consumes one unit per required queue.
//! - [`policy::TieBreak`] -- Named strategy for choosing among C1 queues.
//! - [`config::SimConfig`] -- Rates, capacities, target, and seed.
//! - [`rng::SimRng`] -- Deterministic SplitMix64 uniform stream.

pub mod config;
pub mod engine;
pub mod event;
pub mod id;
pub mod inspector;
pub mod observe;
pub mod policy;
pub mod query;
pub mod queue;
pub mod rng;
pub mod sim;
pub mod topology;
pub mod workstation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

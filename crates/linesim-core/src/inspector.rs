//! Single-server inspector state machine.
//!
//! An inspector holds at most one component. It is always in exactly one of
//! three states:
//!
//! ```text
//!   Free --begin_inspection--> Inspecting --complete(room)--> Free
//!                                   |
//!                                   +--complete(no room)--> Blocked --unblock--> Free
//! ```
//!
//! Time is credited to the state being left on every transition: inspecting
//! time to `total_busy`, blocked time to `total_blocked`.

use tracing::warn;

use crate::event::Event;
use crate::id::{ComponentId, ComponentType, InspectorId};
use crate::rng::ServiceTime;

/// Where an inspector is in its cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InspectorState {
    #[default]
    Free,
    Inspecting(ComponentId),
    /// Finished inspecting but every matching queue is full.
    Blocked(ComponentId),
}

#[derive(Debug)]
pub struct Inspector {
    id: InspectorId,
    state: InspectorState,
    /// Service-time distribution per component type this inspector handles.
    services: [Option<ServiceTime>; 3],
    last_event_time: f64,
    total_busy: f64,
    total_blocked: f64,
    /// Inspections completed (released or blocked) since the window started.
    completed: u64,
    /// Times this inspector entered `Blocked` since the window started.
    blocked_episodes: u64,
}

impl Inspector {
    pub fn new(id: InspectorId) -> Self {
        Self {
            id,
            state: InspectorState::Free,
            services: [None, None, None],
            last_event_time: 0.0,
            total_busy: 0.0,
            total_blocked: 0.0,
            completed: 0,
            blocked_episodes: 0,
        }
    }

    /// Register the service-time distribution for one component type.
    pub fn with_service(mut self, kind: ComponentType, service: ServiceTime) -> Self {
        self.services[kind.index()] = Some(service);
        self
    }

    pub fn id(&self) -> InspectorId {
        self.id
    }

    pub fn state(&self) -> InspectorState {
        self.state
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.state, InspectorState::Blocked(_))
    }

    pub fn is_free(&self) -> bool {
        self.state == InspectorState::Free
    }

    /// The component being inspected or waiting to be delivered.
    pub fn held_component(&self) -> Option<ComponentId> {
        match self.state {
            InspectorState::Free => None,
            InspectorState::Inspecting(c) | InspectorState::Blocked(c) => Some(c),
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn blocked_episodes(&self) -> u64 {
        self.blocked_episodes
    }

    /// Busy time including the ongoing interval up to `as_of`.
    pub fn busy_time(&self, as_of: f64) -> f64 {
        match self.state {
            InspectorState::Inspecting(_) => self.total_busy + (as_of - self.last_event_time),
            _ => self.total_busy,
        }
    }

    /// Blocked time including the ongoing interval up to `as_of`.
    pub fn blocked_time(&self, as_of: f64) -> f64 {
        match self.state {
            InspectorState::Blocked(_) => self.total_blocked + (as_of - self.last_event_time),
            _ => self.total_blocked,
        }
    }

    fn accrue(&mut self, time: f64) {
        let delta = time - self.last_event_time;
        debug_assert!(delta >= 0.0, "inspector clock regressed");
        match self.state {
            InspectorState::Inspecting(_) => self.total_busy += delta,
            InspectorState::Blocked(_) => self.total_blocked += delta,
            InspectorState::Free => {}
        }
        self.last_event_time = time;
    }

    /// Start inspecting `component` and return its `InspectionDone` event.
    ///
    /// If the inspection slot is already occupied nothing is admitted: time
    /// is accrued and `None` is returned.
    pub fn begin_inspection(&mut self, component: ComponentId, time: f64) -> Option<Event> {
        self.accrue(time);
        if !self.is_free() {
            warn!(
                inspector = self.id.name(),
                %component,
                "arrival while inspection slot occupied; not admitted"
            );
            return None;
        }
        let id = self.id;
        let service = self.services[component.kind.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("{} cannot inspect {}", id.name(), component));
        let duration = service.sample();
        self.state = InspectorState::Inspecting(component);
        Some(Event::InspectionDone {
            time: time + duration,
            inspector: self.id,
            component,
        })
    }

    /// Finish the current inspection.
    ///
    /// With `has_room` the component is released to the caller and the
    /// inspector becomes free. Without it the inspector keeps the component,
    /// becomes blocked, and `None` is returned.
    ///
    /// # Panics
    ///
    /// Panics if the inspector is not inspecting.
    pub fn complete_inspection(&mut self, time: f64, has_room: bool) -> Option<ComponentId> {
        let InspectorState::Inspecting(component) = self.state else {
            panic!("{} completed inspection while {:?}", self.id.name(), self.state);
        };
        self.accrue(time);
        self.completed += 1;
        if has_room {
            self.state = InspectorState::Free;
            Some(component)
        } else {
            self.state = InspectorState::Blocked(component);
            self.blocked_episodes += 1;
            None
        }
    }

    /// Release the held component of a blocked inspector.
    ///
    /// # Panics
    ///
    /// Panics if the inspector is not blocked.
    pub fn unblock(&mut self, time: f64) -> ComponentId {
        let InspectorState::Blocked(component) = self.state else {
            panic!("{} unblocked while {:?}", self.id.name(), self.state);
        };
        self.accrue(time);
        self.state = InspectorState::Free;
        component
    }

    /// Restart statistics at `time`, keeping the current state.
    pub fn reset_statistics(&mut self, time: f64) {
        self.last_event_time = time;
        self.total_busy = 0.0;
        self.total_blocked = 0.0;
        self.completed = 0;
        self.blocked_episodes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedStream, c1};

    fn insp1(draws: &[f64]) -> Inspector {
        Inspector::new(InspectorId::Insp1).with_service(
            ComponentType::C1,
            ServiceTime::new(1.0, Box::new(ScriptedStream::new(draws))),
        )
    }

    fn done_time(e: Option<Event>) -> f64 {
        match e {
            Some(Event::InspectionDone { time, .. }) => time,
            other => panic!("expected InspectionDone, got {other:?}"),
        }
    }

    #[test]
    fn inspect_and_release() {
        let mut insp = insp1(&[0.5]);
        let t = done_time(insp.begin_inspection(c1(0), 1.0));
        assert!((t - (1.0 + std::f64::consts::LN_2)).abs() < 1e-12);
        assert_eq!(insp.state(), InspectorState::Inspecting(c1(0)));

        assert_eq!(insp.complete_inspection(t, true), Some(c1(0)));
        assert!(insp.is_free());
        assert!((insp.busy_time(t) - std::f64::consts::LN_2).abs() < 1e-12);
        assert_eq!(insp.blocked_time(t), 0.0);
    }

    #[test]
    fn block_then_unblock_splits_time() {
        let mut insp = insp1(&[0.5]);
        insp.begin_inspection(c1(0), 0.0);
        assert_eq!(insp.complete_inspection(2.0, false), None);
        assert!(insp.is_blocked());
        assert_eq!(insp.held_component(), Some(c1(0)));
        assert_eq!(insp.blocked_episodes(), 1);

        // Ongoing blocked interval is visible before the transition.
        assert!((insp.blocked_time(3.0) - 1.0).abs() < 1e-12);

        assert_eq!(insp.unblock(5.0), c1(0));
        assert!((insp.busy_time(5.0) - 2.0).abs() < 1e-12);
        assert!((insp.blocked_time(9.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn occupied_slot_admits_nothing() {
        let mut insp = insp1(&[0.5, 0.5]);
        insp.begin_inspection(c1(0), 0.0);
        assert!(insp.begin_inspection(c1(1), 0.25).is_none());
        assert_eq!(insp.held_component(), Some(c1(0)));
        assert!((insp.busy_time(0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "unblocked while")]
    fn unblock_free_inspector_panics() {
        let mut insp = insp1(&[]);
        insp.unblock(0.0);
    }

    #[test]
    #[should_panic(expected = "completed inspection while")]
    fn complete_without_inspection_panics() {
        let mut insp = insp1(&[]);
        insp.complete_inspection(0.0, true);
    }

    #[test]
    #[should_panic(expected = "cannot inspect")]
    fn unsupported_component_panics() {
        let mut insp = Inspector::new(InspectorId::Insp2);
        insp.begin_inspection(c1(0), 0.0);
    }

    #[test]
    fn reset_keeps_state() {
        let mut insp = insp1(&[0.5]);
        insp.begin_inspection(c1(0), 0.0);
        insp.complete_inspection(1.0, false);
        insp.reset_statistics(4.0);
        assert!(insp.is_blocked());
        assert_eq!(insp.blocked_time(4.0), 0.0);
        assert_eq!(insp.blocked_episodes(), 0);
        assert!((insp.blocked_time(6.0) - 2.0).abs() < 1e-12);
    }
}

//! The fixed wiring of the line: which inspector feeds which queues, and
//! which queues each workstation draws from.
//!
//! ```text
//! insp1 (C1) --+--> c11 --------------> w1
//!              +--> c12 --+
//!              +--> c13 --|--+
//! insp2 (C2) -----> c2  --+--|--------> w2
//! insp2 (C3) -----> c3  -----+--------> w3
//! ```

use crate::id::{ComponentType, InspectorId, QueueId, WorkstationId};

/// Queues that accept components of the given type, in index order.
pub fn queues_for(kind: ComponentType) -> &'static [QueueId] {
    match kind {
        ComponentType::C1 => &[QueueId::C11, QueueId::C12, QueueId::C13],
        ComponentType::C2 => &[QueueId::C2],
        ComponentType::C3 => &[QueueId::C3],
    }
}

/// The inspector that produces components of the given type.
pub fn inspector_for(kind: ComponentType) -> InspectorId {
    match kind {
        ComponentType::C1 => InspectorId::Insp1,
        ComponentType::C2 | ComponentType::C3 => InspectorId::Insp2,
    }
}

impl InspectorId {
    /// Component types this inspector can produce.
    pub fn component_types(self) -> &'static [ComponentType] {
        match self {
            InspectorId::Insp1 => &[ComponentType::C1],
            InspectorId::Insp2 => &[ComponentType::C2, ComponentType::C3],
        }
    }
}

impl QueueId {
    /// The component type this queue buffers.
    pub fn component_type(self) -> ComponentType {
        match self {
            QueueId::C11 | QueueId::C12 | QueueId::C13 => ComponentType::C1,
            QueueId::C2 => ComponentType::C2,
            QueueId::C3 => ComponentType::C3,
        }
    }

    /// The workstation that consumes from this queue.
    pub fn consumer(self) -> WorkstationId {
        match self {
            QueueId::C11 => WorkstationId::W1,
            QueueId::C12 | QueueId::C2 => WorkstationId::W2,
            QueueId::C13 | QueueId::C3 => WorkstationId::W3,
        }
    }

    /// The inspector whose output lands in this queue.
    pub fn feeder(self) -> InspectorId {
        inspector_for(self.component_type())
    }
}

impl WorkstationId {
    /// Queues this station takes one unit from per product, in dequeue order.
    pub fn required_queues(self) -> &'static [QueueId] {
        match self {
            WorkstationId::W1 => &[QueueId::C11],
            WorkstationId::W2 => &[QueueId::C12, QueueId::C2],
            WorkstationId::W3 => &[QueueId::C13, QueueId::C3],
        }
    }

    /// Inspectors feeding any of this station's queues, deduplicated, in
    /// inspector order.
    pub fn feeders(self) -> Vec<InspectorId> {
        InspectorId::ALL
            .into_iter()
            .filter(|i| self.required_queues().iter().any(|q| q.feeder() == *i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_queue_is_required_by_its_consumer() {
        for q in QueueId::ALL {
            assert!(q.consumer().required_queues().contains(&q));
        }
    }

    #[test]
    fn queue_types_match_queues_for() {
        for kind in ComponentType::ALL {
            for q in queues_for(kind) {
                assert_eq!(q.component_type(), kind);
            }
        }
    }

    #[test]
    fn station_feeders() {
        assert_eq!(WorkstationId::W1.feeders(), vec![InspectorId::Insp1]);
        assert_eq!(
            WorkstationId::W2.feeders(),
            vec![InspectorId::Insp1, InspectorId::Insp2]
        );
        assert_eq!(
            WorkstationId::W3.feeders(),
            vec![InspectorId::Insp1, InspectorId::Insp2]
        );
    }

    #[test]
    fn inspector_types_round_trip() {
        for insp in InspectorId::ALL {
            for kind in insp.component_types() {
                assert_eq!(inspector_for(*kind), insp);
            }
        }
    }
}

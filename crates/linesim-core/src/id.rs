use serde::{Deserialize, Serialize};
use std::fmt;

/// The three component types that flow through the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    C1,
    C2,
    C3,
}

impl ComponentType {
    pub const ALL: [ComponentType; 3] = [ComponentType::C1, ComponentType::C2, ComponentType::C3];

    /// Dense index for array lookups.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentType::C1 => "c1",
            ComponentType::C2 => "c2",
            ComponentType::C3 => "c3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// A single inspected component. Cheap to copy; never held by two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    pub kind: ComponentType,
    /// Per-type creation counter, starting at 0.
    pub sequence: u64,
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.name(), self.sequence)
    }
}

/// Identifies one of the two inspectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InspectorId {
    Insp1,
    Insp2,
}

impl InspectorId {
    pub const ALL: [InspectorId; 2] = [InspectorId::Insp1, InspectorId::Insp2];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            InspectorId::Insp1 => "insp1",
            InspectorId::Insp2 => "insp2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }
}

/// Identifies one of the five component queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueueId {
    C11,
    C12,
    C13,
    C2,
    C3,
}

impl QueueId {
    pub const ALL: [QueueId; 5] = [
        QueueId::C11,
        QueueId::C12,
        QueueId::C13,
        QueueId::C2,
        QueueId::C3,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            QueueId::C11 => "c11",
            QueueId::C12 => "c12",
            QueueId::C13 => "c13",
            QueueId::C2 => "c2",
            QueueId::C3 => "c3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.name() == name)
    }
}

/// Identifies one of the three workstations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkstationId {
    W1,
    W2,
    W3,
}

impl WorkstationId {
    pub const ALL: [WorkstationId; 3] = [WorkstationId::W1, WorkstationId::W2, WorkstationId::W3];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            WorkstationId::W1 => "w1",
            WorkstationId::W2 => "w2",
            WorkstationId::W3 => "w3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.name() == name)
    }
}

/// Identifies a finished product by the station that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId {
    pub station: WorkstationId,
    /// Per-station production counter, starting at 0.
    pub sequence: u64,
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.station.name(), self.sequence)
    }
}

/// Any entity that an event or a configuration entry can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Inspector(InspectorId),
    Queue(QueueId),
    Workstation(WorkstationId),
}

impl EntityId {
    /// Resolve a topology name such as `"insp2"`, `"c13"`, or `"w1"`.
    pub fn from_name(name: &str) -> Option<Self> {
        InspectorId::from_name(name)
            .map(EntityId::Inspector)
            .or_else(|| QueueId::from_name(name).map(EntityId::Queue))
            .or_else(|| WorkstationId::from_name(name).map(EntityId::Workstation))
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityId::Inspector(i) => i.name(),
            EntityId::Queue(q) => q.name(),
            EntityId::Workstation(w) => w.name(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

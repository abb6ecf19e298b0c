//! C1 queue selection.
//!
//! Inspector 1's output may go to any of c11, c12, or c13. The shortest
//! queue with space always wins; [`TieBreak`] decides between queues of
//! equal shortest length. Dispatches via enum match (no trait objects) so the
//! policy is serializable and comparable.

use serde::{Deserialize, Serialize};

use crate::id::QueueId;
use crate::queue::QueueSet;
use crate::rng::{UniformStream, pick_index};

/// How to choose among equally short C1 queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// c11 before c12 before c13.
    #[default]
    LowestIndex,
    /// c13 before c12 before c11.
    HighestIndex,
    /// Uniformly at random among the tied queues, drawing from the routing
    /// stream only when more than one queue is tied.
    Random,
    /// If inspector 2 is blocked, send C1 to the queue paired with its held
    /// component's station (c12 for C2, c13 for C3) when that queue has
    /// space, so the station can start sooner. Otherwise `LowestIndex`.
    PreferBlocking,
}

impl TieBreak {
    pub const ALL: [TieBreak; 4] = [
        TieBreak::LowestIndex,
        TieBreak::HighestIndex,
        TieBreak::Random,
        TieBreak::PreferBlocking,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TieBreak::LowestIndex => "lowest-index",
            TieBreak::HighestIndex => "highest-index",
            TieBreak::Random => "random",
            TieBreak::PreferBlocking => "prefer-blocking",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Pick the destination among `candidates` (in index order), or `None`
    /// if none has space.
    ///
    /// `blocked_partner` is the C1 queue paired with inspector 2's blocked
    /// component, if inspector 2 is blocked.
    pub fn select(
        self,
        candidates: &[QueueId],
        queues: &QueueSet,
        blocked_partner: Option<QueueId>,
        stream: &mut dyn UniformStream,
    ) -> Option<QueueId> {
        if self == TieBreak::PreferBlocking
            && let Some(partner) = blocked_partner
            && candidates.contains(&partner)
            && queues[partner].has_space()
        {
            return Some(partner);
        }

        let shortest = candidates
            .iter()
            .filter(|&&q| queues[q].has_space())
            .map(|&q| queues[q].length())
            .min()?;
        let ties: Vec<QueueId> = candidates
            .iter()
            .copied()
            .filter(|&q| queues[q].has_space() && queues[q].length() == shortest)
            .collect();

        match self {
            TieBreak::LowestIndex | TieBreak::PreferBlocking => ties.first().copied(),
            TieBreak::HighestIndex => ties.last().copied(),
            TieBreak::Random if ties.len() == 1 => Some(ties[0]),
            TieBreak::Random => Some(ties[pick_index(stream, ties.len())]),
        }
    }
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;
    use crate::test_utils::queues_with_c1_lengths;

    const C1_QUEUES: [QueueId; 3] = [QueueId::C11, QueueId::C12, QueueId::C13];

    #[test]
    fn shortest_wins_regardless_of_policy() {
        let queues = queues_with_c1_lengths([2, 1, 0]);
        let mut rng = SimRng::new(1);
        for policy in TieBreak::ALL {
            assert_eq!(
                policy.select(&C1_QUEUES, &queues, None, &mut rng),
                Some(QueueId::C13),
                "{policy}"
            );
        }
    }

    #[test]
    fn lowest_and_highest_index() {
        let queues = queues_with_c1_lengths([1, 1, 1]);
        let mut rng = SimRng::new(1);
        assert_eq!(
            TieBreak::LowestIndex.select(&C1_QUEUES, &queues, None, &mut rng),
            Some(QueueId::C11)
        );
        assert_eq!(
            TieBreak::HighestIndex.select(&C1_QUEUES, &queues, None, &mut rng),
            Some(QueueId::C13)
        );
    }

    #[test]
    fn all_full_selects_nothing() {
        let queues = queues_with_c1_lengths([2, 2, 2]);
        let mut rng = SimRng::new(1);
        for policy in TieBreak::ALL {
            assert_eq!(
                policy.select(&C1_QUEUES, &queues, Some(QueueId::C12), &mut rng),
                None
            );
        }
    }

    #[test]
    fn prefer_blocking_uses_partner_with_space() {
        let queues = queues_with_c1_lengths([0, 1, 0]);
        let mut rng = SimRng::new(1);
        assert_eq!(
            TieBreak::PreferBlocking.select(&C1_QUEUES, &queues, Some(QueueId::C12), &mut rng),
            Some(QueueId::C12)
        );
        // Not blocked: falls back to lowest index.
        assert_eq!(
            TieBreak::PreferBlocking.select(&C1_QUEUES, &queues, None, &mut rng),
            Some(QueueId::C11)
        );
    }

    #[test]
    fn prefer_blocking_skips_full_partner() {
        let queues = queues_with_c1_lengths([1, 2, 1]);
        let mut rng = SimRng::new(1);
        assert_eq!(
            TieBreak::PreferBlocking.select(&C1_QUEUES, &queues, Some(QueueId::C12), &mut rng),
            Some(QueueId::C11)
        );
    }

    #[test]
    fn random_without_tie_does_not_draw() {
        let queues = queues_with_c1_lengths([1, 0, 1]);
        let mut rng = SimRng::new(3);
        let before = rng.state();
        assert_eq!(
            TieBreak::Random.select(&C1_QUEUES, &queues, None, &mut rng),
            Some(QueueId::C12)
        );
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn names_round_trip() {
        for policy in TieBreak::ALL {
            assert_eq!(TieBreak::from_name(policy.name()), Some(policy));
        }
        assert_eq!(TieBreak::from_name("tie321"), None);
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&TieBreak::PreferBlocking).unwrap();
        assert_eq!(json, "\"prefer-blocking\"");
    }
}

//! End-to-end scenarios driving the engine through its public API.

use linesim_core::config::SimConfig;
use linesim_core::engine::Engine;
use linesim_core::event::EventKind;
use linesim_core::id::{ComponentType, InspectorId, QueueId, WorkstationId};
use linesim_core::inspector::InspectorState;
use linesim_core::observe::{Observation, ObservationKind};
use linesim_core::policy::TieBreak;
use linesim_core::rng::{RngStreams, SimRng};
use linesim_core::test_utils::*;

const C1_QUEUES: [QueueId; 3] = [QueueId::C11, QueueId::C12, QueueId::C13];

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9 * b.abs().max(1.0)
}

// ---------------------------------------------------------------------------
// Stalled station 1: inspector 1 blocks with every C1 queue full
// ---------------------------------------------------------------------------

#[test]
fn stalled_station_one_blocks_inspector_one() {
    // W1 starts on the first C1 it sees and holds it past the end of the run,
    // so c11 fills behind it and no W1 product is ever made.
    let config = SimConfig::default()
        .with_seed(420)
        .with_target(10)
        .with_workstation_rate(WorkstationId::W1, 1e-9);
    let mut streams = RngStreams::from_seed(config.seed);
    streams.w1 = Box::new(ScriptedStream::new(&[1.0 - f64::EPSILON / 2.0]));
    let mut engine = Engine::with_streams(config, streams).unwrap();

    while !engine.inspector(InspectorId::Insp1).is_blocked() {
        assert!(
            engine.step().unwrap().is_some(),
            "run finished before inspector 1 blocked"
        );
    }
    assert_eq!(engine.queue(QueueId::C11).length(), 2);
    assert!(engine.workstation(WorkstationId::W1).is_busy());
    assert_eq!(engine.workstation(WorkstationId::W1).products_made(), 0);
    // Blocked only when every C1 queue is full.
    for q in C1_QUEUES {
        assert!(!engine.queue(q).has_space());
    }

    engine.run().unwrap();
    assert_eq!(engine.products_departed(), 10);
    assert_eq!(engine.workstation(WorkstationId::W1).products_made(), 0);
    assert_eq!(
        engine.workstation(WorkstationId::W2).products_made()
            + engine.workstation(WorkstationId::W3).products_made(),
        10
    );
}

// ---------------------------------------------------------------------------
// Golden trace
// ---------------------------------------------------------------------------

#[test]
fn fixed_seed_reproduces_golden_trace() {
    let mut engine = Engine::new(SimConfig::default().with_seed(60).with_target(5)).unwrap();
    let events = dispatched_events(&mut engine);

    let expected: Vec<EventKind> = "AADADADDADADDDADADADADDDADADAD"
        .chars()
        .map(|c| match c {
            'A' => EventKind::Arrival,
            _ => EventKind::Departure,
        })
        .collect();
    assert_eq!(event_kinds(&events), expected);
    assert!(close(engine.clock(), 113.39600604197348), "{}", engine.clock());

    let made: Vec<u64> = WorkstationId::ALL
        .iter()
        .map(|&w| engine.workstation(w).products_made())
        .collect();
    assert_eq!(made, vec![4, 1, 0]);

    let now = engine.clock();
    let insp1 = engine.inspector(InspectorId::Insp1);
    let insp2 = engine.inspector(InspectorId::Insp2);
    assert!(close(insp1.busy_time(now), 113.39600604197348));
    assert_eq!(insp1.blocked_time(now), 0.0);
    assert!(close(insp2.busy_time(now), 85.8127242661868));
    assert!(close(insp2.blocked_time(now), 27.583281775786674));
    assert_eq!(insp1.completed(), 7);
    assert_eq!(insp2.completed(), 5);
    assert_eq!(insp2.blocked_episodes(), 1);
    assert!(matches!(
        insp2.state(),
        InspectorState::Blocked(c) if c.kind == ComponentType::C3
    ));

    assert!(close(engine.workstation(WorkstationId::W1).busy_time(now), 31.957568131951973));
    assert!(close(engine.workstation(WorkstationId::W2).busy_time(now), 0.768027863309868));
    assert_eq!(engine.workstation(WorkstationId::W3).busy_time(now), 0.0);

    let lengths: Vec<usize> = QueueId::ALL.iter().map(|&q| engine.queue(q).length()).collect();
    assert_eq!(lengths, vec![1, 0, 0, 1, 2]);
}

// ---------------------------------------------------------------------------
// Tie-break policies
// ---------------------------------------------------------------------------

#[test]
fn lowest_index_always_picks_first_empty_queue() {
    let queues = queues_with_c1_lengths([0, 0, 1]);
    let mut rng = SimRng::new(7);
    for _ in 0..1000 {
        assert_eq!(
            TieBreak::LowestIndex.select(&C1_QUEUES, &queues, None, &mut rng),
            Some(QueueId::C11)
        );
    }
}

#[test]
fn random_tie_break_is_uniform_over_tied_queues() {
    let queues = queues_with_c1_lengths([0, 0, 1]);
    let mut rng = SimRng::new(7);
    let trials = 3000;
    let mut counts = [0u32; 3];
    for _ in 0..trials {
        let q = TieBreak::Random
            .select(&C1_QUEUES, &queues, None, &mut rng)
            .unwrap();
        counts[q.index()] += 1;
    }
    assert_eq!(counts[QueueId::C13.index()], 0);

    let expected = trials as f64 / 2.0;
    let chi_square: f64 = counts[..2]
        .iter()
        .map(|&n| (n as f64 - expected).powi(2) / expected)
        .sum();
    // One degree of freedom, p = 0.001.
    assert!(chi_square < 10.83, "chi-square {chi_square} for {counts:?}");
}

#[test]
fn every_policy_completes_a_run() {
    for policy in TieBreak::ALL {
        let engine = run_to_target(SimConfig::default().with_target(200).with_tie_break(policy));
        assert_eq!(engine.products_departed(), 200, "{policy}");
    }
}

// ---------------------------------------------------------------------------
// Conservation and blocking protocol
// ---------------------------------------------------------------------------

#[test]
fn components_are_conserved() {
    let mut engine = Engine::new(SimConfig::default().with_seed(11).with_target(300)).unwrap();
    let log = record_observations(&mut engine);

    while engine.step().unwrap().is_some() {
        let mut created = [0i64; 3];
        let mut queued = [0i64; 3];
        let mut consumed = [0i64; 3];
        for o in log.borrow().iter() {
            match o {
                Observation::ComponentCreated { component, .. } => created[component.kind.index()] += 1,
                Observation::ComponentQueued { component, .. } => queued[component.kind.index()] += 1,
                Observation::ComponentsConsumed { components, .. } => {
                    for c in components {
                        consumed[c.kind.index()] += 1;
                    }
                }
                _ => {}
            }
        }
        for kind in ComponentType::ALL {
            let k = kind.index();
            let buffered: i64 = linesim_core::topology::queues_for(kind)
                .iter()
                .map(|&q| engine.queue(q).length() as i64)
                .sum();
            assert_eq!(queued[k], consumed[k] + buffered, "{kind:?}");
        }
        // Each inspector has at most one component created but not yet queued.
        assert!((0..=1).contains(&(created[0] - queued[0])));
        assert!((0..=1).contains(&(created[1] + created[2] - queued[1] - queued[2])));
    }
}

#[test]
fn blocked_inspector_receives_no_new_arrivals() {
    let mut engine = Engine::new(SimConfig::default().with_seed(60).with_target(5)).unwrap();
    let log = record_observations(&mut engine);
    dispatched_events(&mut engine);

    let mut blocked = false;
    for o in log.borrow().iter() {
        match o {
            Observation::InspectorBlocked { inspector, .. } if *inspector == InspectorId::Insp2 => {
                blocked = true
            }
            Observation::InspectorUnblocked { inspector, .. } if *inspector == InspectorId::Insp2 => {
                blocked = false
            }
            Observation::ComponentCreated { inspector, .. } if *inspector == InspectorId::Insp2 => {
                assert!(!blocked, "component created for a blocked inspector");
            }
            _ => {}
        }
    }
}

#[test]
fn unblocked_component_is_queued_in_same_dispatch() {
    let mut engine = Engine::new(SimConfig::default().with_seed(3).with_target(500)).unwrap();
    let log = record_observations(&mut engine);
    engine.run().unwrap();

    let log = log.borrow();
    for (i, o) in log.iter().enumerate() {
        if let Observation::InspectorUnblocked { time, component, .. } = o {
            match &log[i + 1] {
                Observation::ComponentQueued {
                    time: t,
                    component: c,
                    ..
                } => {
                    assert_eq!(t, time);
                    assert_eq!(c, component);
                }
                other => panic!("expected ComponentQueued after unblock, got {other:?}"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Determinism and warm-up
// ---------------------------------------------------------------------------

#[test]
fn same_seed_same_state_hash() {
    let a = run_to_target(SimConfig::default().with_seed(99).with_target(500));
    let b = run_to_target(SimConfig::default().with_seed(99).with_target(500));
    assert_eq!(a.state_hash(), b.state_hash());
    assert_eq!(a.snapshot(), b.snapshot());

    let c = run_to_target(SimConfig::default().with_seed(100).with_target(500));
    assert_ne!(a.state_hash(), c.state_hash());
}

#[test]
fn warmup_reset_is_observed_once() {
    let mut engine =
        Engine::new(SimConfig::default().with_target(100).with_warmup(20)).unwrap();
    let resets = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&resets);
    engine.subscribe_to(
        ObservationKind::StatisticsReset,
        Box::new(move |o| sink.borrow_mut().push(o.clone())),
    );
    engine.run().unwrap();

    assert_eq!(resets.borrow().len(), 1);
    let snap = engine.snapshot();
    assert!(snap.stats_start > 0.0);
    assert_eq!(snap.products_in_window, 80);
    // Products made stays cumulative.
    let made: u64 = snap.workstations.iter().map(|w| w.products_made).sum();
    assert_eq!(made, 100);
}

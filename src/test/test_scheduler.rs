// EonSim: Elastic Optical Network Disaster Simulator written in Rust
// Copyright (C) 2023-2024 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Test the discrete-event loop end to end.

use maplit::btreemap;
use ordered_float::NotNan;
use pretty_assertions::assert_eq;

use crate::event::Event;
use crate::prelude::*;

fn t(x: f64) -> SimTime {
    NotNan::new(x).unwrap()
}

fn isp_spec(members: Vec<u32>, datacenter: u32, delay: f64, normal: &str, disaster: &str) -> IspSpec {
    IspSpec {
        members,
        datacenter,
        reaction_delay: delay,
        normal_policy: normal.to_string(),
        disaster_policy: disaster.to_string(),
        migration_slot_demand: 1,
        migration_volume: 0.0,
    }
}

#[test]
fn single_link_saturation() {
    // five unit requests with infinite holding times on a four-slot link
    let scenario = Scenario {
        graph: GraphSpec {
            nodes: 2,
            links: vec![LinkSpec { a: 0, b: 1, weight: 1.0 }],
        },
        num_slots: 4,
        k_paths: 5,
        isps: vec![isp_spec(vec![0, 1], 0, 1000.0, "first_fit", "first_fit_da")],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: None,
        traffic: TrafficSpec::Replay(
            (0..5)
                .map(|i| RequestSpec {
                    arrival: i as f64,
                    src: 0,
                    dst: 1,
                    slot_demand: 1,
                    holding_time: f64::INFINITY,
                })
                .collect(),
        ),
    };
    let mut sim = scenario.build().unwrap();
    sim.run_until(t(10.0)).unwrap();

    for i in 0..4u64 {
        let req = sim.request(RequestId(i + 1)).unwrap();
        assert_eq!(req.status, RequestStatus::Active);
        let window = req.allocation.as_ref().unwrap().window;
        assert_eq!(window, SpectrumWindow::new(i as usize, 1));
    }
    let fifth = sim.request(RequestId(5)).unwrap();
    assert_eq!(fifth.status, RequestStatus::Blocked(BlockReason::NoWindow));
    assert_eq!(
        sim.metrics().total().blocked,
        btreemap! { BlockReason::NoWindow => 1 }
    );
    assert_eq!(sim.metrics().total().admitted, 4);
}

/// Two ISPs on a line; the link inside the first ISP is scheduled to fail.
///
/// ```text
/// A --- B --- C --- D
/// ISP0        ISP1
/// ```
fn reaction_scenario() -> Scenario {
    Scenario {
        graph: GraphSpec {
            nodes: 4,
            links: vec![
                LinkSpec { a: 0, b: 1, weight: 1.0 },
                LinkSpec { a: 1, b: 2, weight: 1.0 },
                LinkSpec { a: 2, b: 3, weight: 1.0 },
            ],
        },
        num_slots: 8,
        k_paths: 5,
        isps: vec![
            isp_spec(vec![0, 1], 0, 15.0, "first_fit", "first_fit_da"),
            isp_spec(vec![2, 3], 3, 85.0, "first_fit", "first_fit_da"),
        ],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: Some(DisasterSpec::Schedule {
            epicenter: 1,
            start: 5.0,
            end: 100.0,
            link_failures: vec![(0, 1, 25.0)],
            node_failures: vec![],
        }),
        traffic: TrafficSpec::Replay(vec![
            RequestSpec {
                arrival: 19.0,
                src: 0,
                dst: 1,
                slot_demand: 1,
                holding_time: 100.0,
            },
            RequestSpec {
                arrival: 21.0,
                src: 0,
                dst: 1,
                slot_demand: 1,
                holding_time: 100.0,
            },
        ]),
    }
}

#[test]
fn the_reaction_switches_the_policy() {
    let mut sim = reaction_scenario().build().unwrap();

    // before the reaction the doomed link is still admissible
    sim.run_until(t(19.5)).unwrap();
    assert!(!sim.isps()[0].has_reacted());
    assert_eq!(
        sim.request(RequestId(1)).unwrap().status,
        RequestStatus::Active
    );

    // after the reaction at t = 20, the identical request has no safe path
    sim.run_until(t(22.0)).unwrap();
    assert!(sim.isps()[0].has_reacted());
    assert_eq!(
        sim.request(RequestId(2)).unwrap().status,
        RequestStatus::Blocked(BlockReason::NoSafePath)
    );

    // the scheduled failure then disrupts the admission made at t = 19
    sim.run_until(t(30.0)).unwrap();
    assert_eq!(
        sim.request(RequestId(1)).unwrap().status,
        RequestStatus::Disrupted
    );
    assert_eq!(sim.metrics().per_isp()[&IspId(0)].disrupted, 1);

    // the switch is monotonic
    sim.run().unwrap();
    assert!(sim.isps().iter().all(|isp| isp.has_reacted()));
}

#[test]
fn the_reaction_injects_the_migration() {
    let scenario = Scenario {
        graph: GraphSpec {
            nodes: 4,
            links: vec![
                LinkSpec { a: 0, b: 1, weight: 1.0 },
                LinkSpec { a: 1, b: 2, weight: 1.0 },
                LinkSpec { a: 2, b: 3, weight: 1.0 },
            ],
        },
        num_slots: 8,
        k_paths: 5,
        isps: vec![IspSpec {
            members: vec![0, 1, 2, 3],
            datacenter: 1,
            reaction_delay: 5.0,
            normal_policy: "first_fit".to_string(),
            disaster_policy: "best_fit_da".to_string(),
            migration_slot_demand: 2,
            migration_volume: 10.0,
        }],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: Some(DisasterSpec::Schedule {
            epicenter: 0,
            start: 10.0,
            end: 100.0,
            link_failures: vec![],
            node_failures: vec![],
        }),
        traffic: TrafficSpec::Replay(vec![]),
    };
    let mut sim = scenario.build().unwrap();
    sim.run().unwrap();

    // the migration goes from the datacenter to the member farthest from the epicenter
    let migration = sim.request(RequestId(1)).unwrap();
    assert_eq!(migration.class, TrafficClass::Migration);
    assert_eq!(migration.src, NodeId::new(1));
    assert_eq!(migration.dst, NodeId::new(3));
    assert_eq!(migration.slot_demand, 2);
    assert_eq!(migration.status, RequestStatus::Completed);

    // volume / (width x throughput) = 10 / 2 gives five seconds of transfer
    assert_eq!(migration.holding_time, 5.0);
    let record = &sim.metrics().migrations()[&IspId(0)];
    assert_eq!(record.volume, 10.0);
    assert_eq!(record.started_at, t(15.0));
    assert_eq!(record.completed_at, Some(t(20.0)));

    let per_class = &sim.metrics().per_class()[&TrafficClass::Migration];
    assert_eq!(per_class.arrivals, 1);
    assert_eq!(per_class.admitted, 1);
}

#[test]
fn simultaneous_events_follow_the_kind_priority() {
    // at t = 10: a disaster step, a reaction, a departure, and an arrival
    let scenario = Scenario {
        graph: GraphSpec {
            nodes: 3,
            links: vec![
                LinkSpec { a: 0, b: 1, weight: 1.0 },
                LinkSpec { a: 1, b: 2, weight: 1.0 },
            ],
        },
        num_slots: 4,
        k_paths: 5,
        isps: vec![isp_spec(vec![0, 1, 2], 0, 0.0, "first_fit", "first_fit_da")],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: Some(DisasterSpec::Schedule {
            epicenter: 2,
            start: 10.0,
            end: 50.0,
            link_failures: vec![(1, 2, 10.0)],
            node_failures: vec![],
        }),
        traffic: TrafficSpec::Replay(vec![
            RequestSpec {
                arrival: 0.0,
                src: 0,
                dst: 1,
                slot_demand: 1,
                holding_time: 10.0,
            },
            RequestSpec {
                arrival: 10.0,
                src: 0,
                dst: 1,
                slot_demand: 1,
                holding_time: 5.0,
            },
        ]),
    };
    let mut sim = scenario.build().unwrap();
    sim.run_until(t(5.0)).unwrap();

    // failures first, then reactions, then departures, then admissions
    assert_eq!(sim.step().unwrap(), Some(Event::DisasterStep(0)));
    assert_eq!(sim.step().unwrap(), Some(Event::IspReaction(IspId(0))));
    assert_eq!(sim.step().unwrap(), Some(Event::Departure(RequestId(1))));
    assert_eq!(sim.step().unwrap(), Some(Event::Arrival(RequestId(2))));
    // the reaction injected its migration after the pre-scheduled arrival
    assert_eq!(sim.step().unwrap(), Some(Event::Arrival(RequestId(3))));
    assert_eq!(sim.now(), t(10.0));
}

fn mesh_scenario(traffic_seed: u64) -> Scenario {
    Scenario {
        graph: GraphSpec {
            nodes: 5,
            links: vec![
                LinkSpec { a: 0, b: 1, weight: 1.0 },
                LinkSpec { a: 1, b: 2, weight: 1.0 },
                LinkSpec { a: 2, b: 3, weight: 1.0 },
                LinkSpec { a: 3, b: 4, weight: 1.0 },
                LinkSpec { a: 4, b: 0, weight: 1.0 },
                LinkSpec { a: 1, b: 3, weight: 2.5 },
            ],
        },
        num_slots: 16,
        k_paths: 4,
        isps: vec![
            IspSpec {
                members: vec![0, 1, 2],
                datacenter: 1,
                reaction_delay: 8.0,
                normal_policy: "first_fit".to_string(),
                disaster_policy: "da_with_blocking".to_string(),
                migration_slot_demand: 2,
                migration_volume: 5.0,
            },
            IspSpec {
                members: vec![3, 4],
                datacenter: 4,
                reaction_delay: 3.0,
                normal_policy: "best_fit".to_string(),
                disaster_policy: "best_fit_sw_da".to_string(),
                migration_slot_demand: 2,
                migration_volume: 5.0,
            },
        ],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: Some(DisasterSpec::Radius {
            epicenter: 0,
            radius: 1.2,
            start: 10.0,
            end: 30.0,
            seed: 7,
        }),
        traffic: TrafficSpec::Poisson {
            arrival_rate: 5.0,
            mean_holding: 2.0,
            slot_demands: vec![(1, 0.5), (2, 0.3), (4, 0.2)],
            count: 200,
            seed: traffic_seed,
        },
    }
}

#[test]
fn every_arrival_is_accounted_for() {
    let mut sim = mesh_scenario(42).build().unwrap();
    sim.run().unwrap();

    let snapshot = sim.snapshot();
    let total = snapshot.outcomes.admitted + snapshot.outcomes.blocked + snapshot.outcomes.disrupted;
    // 200 traffic arrivals plus one migration per ISP
    assert_eq!(total, 202);
    assert_eq!(snapshot.outcomes.pending, 0);
    assert_eq!(sim.metrics().records().len(), 202);

    // once everything departed, the grid must be completely free again
    let topo = sim.topology();
    for link in topo.graph().edge_indices() {
        for slot in 0..topo.num_slots() {
            assert!(!topo.grid().is_occupied(link, slot));
        }
    }
}

#[test]
fn identical_seeds_give_identical_runs() {
    let mut one = mesh_scenario(42).build().unwrap();
    let mut other = mesh_scenario(42).build().unwrap();
    one.run().unwrap();
    other.run().unwrap();

    assert_eq!(one.snapshot(), other.snapshot());
    assert_eq!(one.metrics().records(), other.metrics().records());
}

#[test]
fn different_seeds_differ() {
    let mut one = mesh_scenario(42).build().unwrap();
    let mut other = mesh_scenario(43).build().unwrap();
    one.run().unwrap();
    other.run().unwrap();
    assert_ne!(one.metrics().records(), other.metrics().records());
}

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

//! Test the disaster timeline and the disruption of active requests.

use lazy_static::lazy_static;
use ordered_float::NotNan;
use pretty_assertions::assert_eq;

use crate::disaster::{Disaster, FailedResource};
use crate::prelude::*;
use crate::topology::Topology;
use crate::types::EonGraph;

lazy_static! {
    static ref A: NodeId = NodeId::new(0);
    static ref B: NodeId = NodeId::new(1);
    static ref C: NodeId = NodeId::new(2);
}

fn t(x: f64) -> SimTime {
    NotNan::new(x).unwrap()
}

/// A -- B -- C with unit weights.
fn line_scenario() -> Scenario {
    Scenario {
        graph: GraphSpec {
            nodes: 3,
            links: vec![
                LinkSpec { a: 0, b: 1, weight: 1.0 },
                LinkSpec { a: 1, b: 2, weight: 1.0 },
            ],
        },
        num_slots: 4,
        k_paths: 5,
        isps: vec![IspSpec {
            members: vec![0, 1, 2],
            datacenter: 0,
            reaction_delay: 100.0,
            normal_policy: "first_fit".to_string(),
            disaster_policy: "first_fit_da".to_string(),
            migration_slot_demand: 1,
            migration_volume: 0.0,
        }],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: Some(DisasterSpec::Schedule {
            epicenter: 2,
            start: 10.0,
            end: 20.0,
            link_failures: vec![(1, 2, 10.0)],
            node_failures: vec![],
        }),
        traffic: TrafficSpec::Replay(vec![RequestSpec {
            arrival: 0.0,
            src: 0,
            dst: 2,
            slot_demand: 2,
            holding_time: f64::INFINITY,
        }]),
    }
}

#[test]
fn a_failing_link_disrupts_the_request_crossing_it() {
    let mut sim = line_scenario().build().unwrap();
    sim.run_until(t(15.0)).unwrap();

    // the request lost its allocation and found no alternative path
    let req = sim.request(RequestId(1)).unwrap();
    assert_eq!(req.status, RequestStatus::Disrupted);
    assert!(req.allocation.is_none());
    assert_eq!(sim.metrics().total().disrupted, 1);
    assert_eq!(sim.metrics().total().rerouted, 0);

    // the slots on the surviving link were released
    let topo = sim.topology();
    let head = topo.link_between(*A, *B).unwrap();
    assert!(!topo.grid().is_occupied(head, 0));
    assert!(!topo.grid().is_occupied(head, 1));
    assert!(topo.is_link_failed(topo.link_between(*B, *C).unwrap()));

    let outcomes = sim.snapshot().outcomes;
    assert_eq!(outcomes.disrupted, 1);
    assert_eq!(outcomes.admitted, 0);
}

#[test]
fn resources_are_restored_when_the_disaster_ends() {
    let mut sim = line_scenario().build().unwrap();
    sim.run_until(t(30.0)).unwrap();

    let topo = sim.topology();
    assert!(!topo.is_link_failed(topo.link_between(*B, *C).unwrap()));
    let d = sim.disaster().unwrap();
    assert!(d.announced_links().is_empty());
    assert!(d.announced_nodes().is_empty());
}

/// A small mesh for generated disasters.
fn mesh() -> Topology {
    let mut g = EonGraph::default();
    let nodes: Vec<_> = (0..6).map(|_| g.add_node(())).collect();
    for i in 0..5 {
        g.add_edge(nodes[i], nodes[i + 1], 1.0);
    }
    g.add_edge(nodes[0], nodes[5], 4.0);
    Topology::new(g, 8, 3).unwrap()
}

#[test]
fn generated_timelines_are_deterministic() {
    let topo = mesh();
    let epicenter = NodeId::new(2);
    let one = Disaster::generate(&topo, epicenter, 1.5, t(10.0), t(50.0), 99);
    let other = Disaster::generate(&topo, epicenter, 1.5, t(10.0), t(50.0), 99);
    assert_eq!(one, other);
    assert!(!one.timeline().is_empty());
}

#[test]
fn generated_timelines_are_monotone_and_local() {
    let topo = mesh();
    let epicenter = NodeId::new(2);
    let radius = 1.5;
    let d = Disaster::generate(&topo, epicenter, radius, t(10.0), t(50.0), 7);

    let distances = topo.distances_from(epicenter);
    let mut last = t(10.0);
    for failure in d.timeline() {
        assert!(failure.time >= last, "failure times must grow");
        assert!(failure.time < t(50.0));
        last = failure.time;
        match failure.resource {
            FailedResource::Node(n) => assert!(distances[&n] <= radius),
            FailedResource::Link(_) => {}
        }
    }
    // the epicenter itself is doomed
    assert!(d.announced_nodes().contains(&epicenter));
    // nodes outside the radius survive
    assert!(!d.announced_nodes().contains(&NodeId::new(5)));
}

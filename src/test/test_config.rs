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

//! Test scenario validation and the policy registry.

use std::str::FromStr;

use pretty_assertions::assert_eq;

use crate::prelude::*;

fn valid() -> Scenario {
    Scenario {
        graph: GraphSpec {
            nodes: 2,
            links: vec![LinkSpec { a: 0, b: 1, weight: 1.0 }],
        },
        num_slots: 8,
        k_paths: 3,
        isps: vec![IspSpec {
            members: vec![0, 1],
            datacenter: 0,
            reaction_delay: 10.0,
            normal_policy: "first_fit".to_string(),
            disaster_policy: "first_fit_da".to_string(),
            migration_slot_demand: 1,
            migration_volume: 1.0,
        }],
        per_slot_throughput: 1.0,
        admission_theta: 1,
        disaster: None,
        traffic: TrafficSpec::Replay(vec![]),
    }
}

fn config_error(scenario: Scenario) -> ConfigError {
    match scenario.build() {
        Err(SimulationError::Config(e)) => e,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn the_policy_registry_is_a_closed_set() {
    for id in RoutingPolicy::IDENTIFIERS {
        let policy = RoutingPolicy::from_str(id).unwrap();
        assert_eq!(policy.to_string(), id);
    }
    assert_eq!(
        RoutingPolicy::from_str("shortest_path"),
        Err(ConfigError::UnknownPolicy("shortest_path".to_string()))
    );
}

#[test]
fn unknown_policies_are_fatal() {
    let mut scenario = valid();
    scenario.isps[0].normal_policy = "round_robin".to_string();
    assert_eq!(
        config_error(scenario),
        ConfigError::UnknownPolicy("round_robin".to_string())
    );
}

#[test]
fn empty_graphs_are_fatal() {
    let mut scenario = valid();
    scenario.graph.links.clear();
    assert_eq!(config_error(scenario), ConfigError::EmptyGraph);
}

#[test]
fn membership_must_be_disjoint() {
    let mut scenario = valid();
    scenario.isps.push(IspSpec {
        members: vec![1],
        datacenter: 1,
        reaction_delay: 10.0,
        normal_policy: "first_fit".to_string(),
        disaster_policy: "first_fit_da".to_string(),
        migration_slot_demand: 1,
        migration_volume: 1.0,
    });
    assert_eq!(config_error(scenario), ConfigError::OverlappingMembership(1));
}

#[test]
fn membership_must_cover_every_node() {
    let mut scenario = valid();
    scenario.isps[0].members = vec![0];
    assert_eq!(config_error(scenario), ConfigError::UncoveredNode(1));
}

#[test]
fn the_datacenter_must_be_a_member() {
    let mut scenario = valid();
    scenario.isps[0].members = vec![0];
    scenario.isps.push(IspSpec {
        members: vec![1],
        datacenter: 0,
        reaction_delay: 10.0,
        normal_policy: "first_fit".to_string(),
        disaster_policy: "first_fit_da".to_string(),
        migration_slot_demand: 1,
        migration_volume: 1.0,
    });
    assert_eq!(
        config_error(scenario),
        ConfigError::DatacenterNotMember(IspId(1), 0)
    );
}

#[test]
fn dangling_node_references_are_fatal() {
    let mut scenario = valid();
    scenario.disaster = Some(DisasterSpec::Schedule {
        epicenter: 7,
        start: 0.0,
        end: 1.0,
        link_failures: vec![],
        node_failures: vec![],
    });
    assert_eq!(config_error(scenario), ConfigError::UnknownNode(7));
}

#[test]
fn negative_times_are_fatal() {
    let mut scenario = valid();
    scenario.traffic = TrafficSpec::Replay(vec![RequestSpec {
        arrival: -1.0,
        src: 0,
        dst: 1,
        slot_demand: 1,
        holding_time: 1.0,
    }]);
    assert_eq!(config_error(scenario), ConfigError::InvalidTime(-1.0));
}

#[test]
fn slot_demands_must_fit_the_grid() {
    let mut scenario = valid();
    scenario.traffic = TrafficSpec::Replay(vec![RequestSpec {
        arrival: 0.0,
        src: 0,
        dst: 1,
        slot_demand: 9,
        holding_time: 1.0,
    }]);
    assert_eq!(config_error(scenario), ConfigError::InvalidSlotDemand(9, 8));
}

#[test]
fn unknown_links_in_the_schedule_are_fatal() {
    let mut scenario = valid();
    scenario.disaster = Some(DisasterSpec::Schedule {
        epicenter: 0,
        start: 0.0,
        end: 1.0,
        link_failures: vec![(0, 0, 0.5)],
        node_failures: vec![],
    });
    assert_eq!(config_error(scenario), ConfigError::UnknownLink(0, 0));
}

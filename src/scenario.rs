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

//! Scenario description and validation.
//!
//! A [`Scenario`] is the opaque input structure handed to the core: graph adjacency, grid and
//! catalogue sizes, the ISPs with their policy identifiers, the disaster descriptor, and the
//! traffic parameters. It is fully serializable; persisting a scenario and reloading it
//! reproduces the identical run. [`Scenario::build`] validates everything and hands back a
//! ready [`Simulator`]; every validation failure is a fatal configuration error.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::disaster::{Disaster, FailedResource, Failure};
use crate::isp::Isp;
use crate::metrics::Metrics;
use crate::policies::RoutingPolicy;
use crate::request::{Request, TrafficClass};
use crate::scheduler::Simulator;
use crate::topology::Topology;
use crate::traffic::{PoissonTraffic, TrafficSource};
use crate::types::{
    ConfigError, EonGraph, IspId, NodeId, RequestId, SimTime, SimulationError,
};

/// Graph adjacency of the scenario. Nodes are numbered `0..nodes` and referenced by number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Number of nodes.
    pub nodes: u32,
    /// Undirected weighted links.
    pub links: Vec<LinkSpec>,
}

/// One undirected link with its physical length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// One endpoint.
    pub a: u32,
    /// The other endpoint.
    pub b: u32,
    /// Physical length (the routing weight).
    pub weight: f64,
}

/// One ISP of the scenario. Policies are referenced by their string identifiers; see
/// [`RoutingPolicy::IDENTIFIERS`] for the closed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IspSpec {
    /// The nodes owned by this ISP. Membership must be disjoint between ISPs and cover every
    /// node of the graph.
    pub members: Vec<u32>,
    /// The member node hosting the datacenter.
    pub datacenter: u32,
    /// Seconds between the disaster start and this ISP's reaction.
    pub reaction_delay: f64,
    /// Policy used before the reaction.
    pub normal_policy: String,
    /// Policy used from the reaction on.
    pub disaster_policy: String,
    /// Window width of the migration request.
    pub migration_slot_demand: usize,
    /// Data volume to evacuate at reaction time.
    pub migration_volume: f64,
}

/// Disaster descriptor: either an explicit failure schedule or a seeded generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisasterSpec {
    /// Explicit failure schedule with absolute timestamps.
    Schedule {
        /// The epicenter node.
        epicenter: u32,
        /// Disaster start time.
        start: f64,
        /// Disaster end time; failed resources are restored here.
        end: f64,
        /// Failing links as (endpoint, endpoint, failure time).
        link_failures: Vec<(u32, u32, f64)>,
        /// Failing nodes as (node, failure time).
        node_failures: Vec<(u32, f64)>,
    },
    /// Generate the schedule from the epicenter and a radius in weighted graph distance.
    Radius {
        /// The epicenter node.
        epicenter: u32,
        /// Every resource within this weighted distance of the epicenter fails.
        radius: f64,
        /// Disaster start time.
        start: f64,
        /// Disaster end time.
        end: f64,
        /// Seed for the failure-time draws.
        seed: u64,
    },
}

/// Traffic parameters: a materialized list for replay, or a seeded Poisson process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrafficSpec {
    /// Replay this exact request list.
    Replay(Vec<RequestSpec>),
    /// Draw arrivals from a Poisson process.
    Poisson {
        /// Arrival rate lambda.
        arrival_rate: f64,
        /// Mean holding time mu.
        mean_holding: f64,
        /// Slot demands with their relative weights.
        slot_demands: Vec<(usize, f64)>,
        /// How many arrivals to emit.
        count: u64,
        /// Seed for all traffic draws.
        seed: u64,
    },
}

/// One materialized request for replayable scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Absolute arrival time.
    pub arrival: f64,
    /// Source node.
    pub src: u32,
    /// Destination node.
    pub dst: u32,
    /// Demanded window width.
    pub slot_demand: usize,
    /// Holding time; may be infinite.
    pub holding_time: f64,
}

/// A fully materialized scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Graph adjacency.
    pub graph: GraphSpec,
    /// Spectrum slots per link.
    #[serde(default = "default_num_slots")]
    pub num_slots: usize,
    /// Paths precomputed per node pair.
    #[serde(default = "default_k_paths")]
    pub k_paths: usize,
    /// The ISPs partitioning the node set.
    pub isps: Vec<IspSpec>,
    /// Throughput of a single spectrum slot, used to size migrations.
    #[serde(default = "default_throughput")]
    pub per_slot_throughput: f64,
    /// Free-run decrement threshold of the admission-controlled policy.
    #[serde(default = "default_theta")]
    pub admission_theta: usize,
    /// The disaster, if any.
    #[serde(default)]
    pub disaster: Option<DisasterSpec>,
    /// Traffic parameters.
    pub traffic: TrafficSpec,
}

fn default_num_slots() -> usize {
    128
}

fn default_k_paths() -> usize {
    5
}

fn default_throughput() -> f64 {
    1.0
}

fn default_theta() -> usize {
    1
}

impl Scenario {
    /// Validate the scenario and build a ready-to-run simulator.
    pub fn build(&self) -> Result<Simulator, SimulationError> {
        let graph = self.build_graph()?;
        let topology = Topology::new(graph, self.num_slots, self.k_paths)?;
        let (isps, isp_of_node) = self.build_isps(&topology)?;
        let disaster = self.build_disaster(&topology)?;
        let traffic = self.build_traffic(&topology, &isp_of_node)?;
        let metrics = Metrics::new(self.admission_theta);
        Ok(Simulator::new(
            topology,
            isps,
            isp_of_node,
            disaster,
            traffic,
            metrics,
            self.per_slot_throughput,
            self.admission_theta,
        ))
    }

    fn build_graph(&self) -> Result<EonGraph, ConfigError> {
        let mut graph = EonGraph::default();
        let nodes: Vec<NodeId> = (0..self.graph.nodes).map(|_| graph.add_node(())).collect();
        for link in &self.graph.links {
            let a = *nodes
                .get(link.a as usize)
                .ok_or(ConfigError::UnknownNode(link.a))?;
            let b = *nodes
                .get(link.b as usize)
                .ok_or(ConfigError::UnknownNode(link.b))?;
            if !(link.weight.is_finite() && link.weight >= 0.0) {
                return Err(ConfigError::InvalidLinkWeight(link.weight));
            }
            if graph.find_edge(a, b).is_none() {
                graph.add_edge(a, b, link.weight);
            }
        }
        Ok(graph)
    }

    fn build_isps(
        &self,
        topo: &Topology,
    ) -> Result<(Vec<Isp>, HashMap<NodeId, IspId>), ConfigError> {
        let zone_size = if self.isps.is_empty() {
            self.num_slots
        } else {
            self.num_slots / self.isps.len()
        };
        let mut isps = Vec::with_capacity(self.isps.len());
        let mut isp_of_node: HashMap<NodeId, IspId> = HashMap::new();
        for (i, spec) in self.isps.iter().enumerate() {
            let id = IspId::from(i);
            let mut members = BTreeSet::new();
            for &m in &spec.members {
                let node = self.node(topo, m)?;
                if isp_of_node.insert(node, id).is_some() {
                    return Err(ConfigError::OverlappingMembership(m));
                }
                members.insert(node);
            }
            let datacenter = self.node(topo, spec.datacenter)?;
            if !members.contains(&datacenter) {
                return Err(ConfigError::DatacenterNotMember(id, spec.datacenter));
            }
            if !(spec.reaction_delay.is_finite() && spec.reaction_delay >= 0.0) {
                return Err(ConfigError::InvalidTime(spec.reaction_delay));
            }
            if spec.migration_slot_demand == 0 || spec.migration_slot_demand > self.num_slots {
                return Err(ConfigError::InvalidSlotDemand(
                    spec.migration_slot_demand,
                    self.num_slots,
                ));
            }
            let normal = RoutingPolicy::from_str(&spec.normal_policy)?;
            let disaster = RoutingPolicy::from_str(&spec.disaster_policy)?;
            let zone = i * zone_size..(i + 1) * zone_size;
            isps.push(Isp::new(
                id,
                members,
                datacenter,
                spec.reaction_delay,
                normal,
                disaster,
                zone,
                spec.migration_slot_demand,
                spec.migration_volume,
            ));
        }
        // every node must be owned by exactly one ISP
        for node in topo.graph().node_indices() {
            if !isp_of_node.contains_key(&node) {
                return Err(ConfigError::UncoveredNode(node.index() as u32));
            }
        }
        Ok((isps, isp_of_node))
    }

    fn build_disaster(&self, topo: &Topology) -> Result<Option<Disaster>, ConfigError> {
        let Some(spec) = &self.disaster else {
            return Ok(None);
        };
        let disaster = match spec {
            DisasterSpec::Schedule {
                epicenter,
                start,
                end,
                link_failures,
                node_failures,
            } => {
                let epicenter = self.node(topo, *epicenter)?;
                let (start, end) = self.interval(*start, *end)?;
                let mut timeline = Vec::new();
                for &(a, b, t) in link_failures {
                    let na = self.node(topo, a)?;
                    let nb = self.node(topo, b)?;
                    let link = topo
                        .link_between(na, nb)
                        .ok_or(ConfigError::UnknownLink(a, b))?;
                    timeline.push(Failure {
                        resource: FailedResource::Link(link),
                        time: self.time(t)?,
                    });
                }
                for &(n, t) in node_failures {
                    timeline.push(Failure {
                        resource: FailedResource::Node(self.node(topo, n)?),
                        time: self.time(t)?,
                    });
                }
                Disaster::from_schedule(epicenter, start, end, timeline)
            }
            DisasterSpec::Radius {
                epicenter,
                radius,
                start,
                end,
                seed,
            } => {
                let epicenter = self.node(topo, *epicenter)?;
                let (start, end) = self.interval(*start, *end)?;
                Disaster::generate(topo, epicenter, *radius, start, end, *seed)
            }
        };
        Ok(Some(disaster))
    }

    fn build_traffic(
        &self,
        topo: &Topology,
        isp_of_node: &HashMap<NodeId, IspId>,
    ) -> Result<TrafficSource, ConfigError> {
        match &self.traffic {
            TrafficSpec::Replay(specs) => {
                let mut indexed: Vec<(usize, &RequestSpec)> = specs.iter().enumerate().collect();
                indexed.sort_by(|(ia, a), (ib, b)| {
                    a.arrival
                        .partial_cmp(&b.arrival)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(ia.cmp(ib))
                });
                let mut requests = Vec::with_capacity(indexed.len());
                for (seq, (_, spec)) in indexed.into_iter().enumerate() {
                    let src = self.node(topo, spec.src)?;
                    let dst = self.node(topo, spec.dst)?;
                    if spec.slot_demand == 0 || spec.slot_demand > self.num_slots {
                        return Err(ConfigError::InvalidSlotDemand(
                            spec.slot_demand,
                            self.num_slots,
                        ));
                    }
                    if spec.holding_time < 0.0 || spec.holding_time.is_nan() {
                        return Err(ConfigError::InvalidTime(spec.holding_time));
                    }
                    let isp = isp_of_node.get(&src).copied().unwrap_or(IspId(0));
                    requests.push(Request::new(
                        RequestId((seq + 1) as u64),
                        src,
                        dst,
                        spec.slot_demand,
                        spec.holding_time,
                        TrafficClass::Datapath,
                        isp,
                        self.time(spec.arrival)?,
                    ));
                }
                Ok(TrafficSource::Replay { requests, next: 0 })
            }
            TrafficSpec::Poisson {
                arrival_rate,
                mean_holding,
                slot_demands,
                count,
                seed,
            } => {
                for &(d, _) in slot_demands {
                    if d == 0 || d > self.num_slots {
                        return Err(ConfigError::InvalidSlotDemand(d, self.num_slots));
                    }
                }
                let nodes: Vec<NodeId> = topo.graph().node_indices().collect();
                Ok(TrafficSource::Poisson(PoissonTraffic::new(
                    *arrival_rate,
                    *mean_holding,
                    slot_demands,
                    nodes,
                    *count,
                    *seed,
                )?))
            }
        }
    }

    fn node(&self, topo: &Topology, index: u32) -> Result<NodeId, ConfigError> {
        let node = NodeId::new(index as usize);
        if topo.graph().contains_node(node) {
            Ok(node)
        } else {
            Err(ConfigError::UnknownNode(index))
        }
    }

    fn time(&self, t: f64) -> Result<SimTime, ConfigError> {
        if t.is_finite() && t >= 0.0 {
            NotNan::new(t).map_err(|_| ConfigError::InvalidTime(t))
        } else {
            Err(ConfigError::InvalidTime(t))
        }
    }

    fn interval(&self, start: f64, end: f64) -> Result<(SimTime, SimTime), ConfigError> {
        let start = self.time(start)?;
        let end = self.time(end)?;
        if end < start {
            return Err(ConfigError::InvalidTime(end.into_inner()));
        }
        Ok((start, end))
    }
}

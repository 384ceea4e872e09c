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

//! Internet service providers.
//!
//! An ISP owns a disjoint set of nodes, a datacenter on one of them, and a pair of routing
//! policies. It starts routing with the normal policy and switches to the disaster policy when
//! its reaction event fires, `reaction_delay` seconds after the disaster starts. The switch is a
//! plain field swap and is irrevocable within a run. At the same instant the ISP starts
//! evacuating its datacenter towards the member node farthest from the epicenter.

use std::collections::BTreeSet;
use std::ops::Range;

use log::info;
use serde::{Deserialize, Serialize};

use crate::policies::RoutingPolicy;
use crate::request::{Request, TrafficClass};
use crate::topology::Topology;
use crate::types::{IspId, NodeId, RequestId, SimTime};

/// The reaction state of an ISP. Transitions only ever go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IspState {
    /// Routing with the normal policy; the disaster notice has not arrived yet.
    Normal,
    /// The disaster notice arrived; routing with the disaster policy from now on.
    Reacted,
}

/// A routing domain owning a subset of nodes and a policy pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Isp {
    id: IspId,
    members: BTreeSet<NodeId>,
    datacenter: NodeId,
    reaction_delay: f64,
    normal_policy: RoutingPolicy,
    disaster_policy: RoutingPolicy,
    state: IspState,
    zone_start: usize,
    zone_end: usize,
    migration_slot_demand: usize,
    migration_volume: f64,
}

impl Isp {
    /// Create a new ISP in the `Normal` state. The spectrum zone is assigned by the scenario
    /// builder, which partitions the grid among all ISPs.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: IspId,
        members: BTreeSet<NodeId>,
        datacenter: NodeId,
        reaction_delay: f64,
        normal_policy: RoutingPolicy,
        disaster_policy: RoutingPolicy,
        zone: Range<usize>,
        migration_slot_demand: usize,
        migration_volume: f64,
    ) -> Self {
        Self {
            id,
            members,
            datacenter,
            reaction_delay,
            normal_policy,
            disaster_policy,
            state: IspState::Normal,
            zone_start: zone.start,
            zone_end: zone.end,
            migration_slot_demand,
            migration_volume,
        }
    }

    /// The ISP identifier.
    pub fn id(&self) -> IspId {
        self.id
    }

    /// The member nodes of this ISP.
    pub fn member_nodes(&self) -> &BTreeSet<NodeId> {
        &self.members
    }

    /// Whether the given node belongs to this ISP.
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// The node hosting this ISP's datacenter.
    pub fn datacenter(&self) -> NodeId {
        self.datacenter
    }

    /// How long after the disaster start this ISP learns of it.
    pub fn reaction_delay(&self) -> f64 {
        self.reaction_delay
    }

    /// The spectrum zone of this ISP under the sliding-window policy family.
    pub fn zone(&self) -> Range<usize> {
        self.zone_start..self.zone_end
    }

    /// The window width of this ISP's migration request.
    pub fn migration_slot_demand(&self) -> usize {
        self.migration_slot_demand
    }

    /// The data volume to evacuate from the datacenter.
    pub fn migration_volume(&self) -> f64 {
        self.migration_volume
    }

    /// The policy currently routing this ISP's requests.
    pub fn active_policy(&self) -> RoutingPolicy {
        match self.state {
            IspState::Normal => self.normal_policy,
            IspState::Reacted => self.disaster_policy,
        }
    }

    /// The reaction state.
    pub fn state(&self) -> IspState {
        self.state
    }

    /// Whether the reaction event has fired.
    pub fn has_reacted(&self) -> bool {
        self.state == IspState::Reacted
    }

    /// Switch to the disaster policy. Called when the reaction event fires; there is no way
    /// back within a run.
    pub(crate) fn react(&mut self, now: SimTime) {
        if self.state == IspState::Normal {
            info!(
                "{}: reacting at t={now}, switching {} -> {}",
                self.id, self.normal_policy, self.disaster_policy
            );
            self.state = IspState::Reacted;
        }
    }

    /// Build this ISP's migration request: from the datacenter towards the member node with the
    /// greatest weighted distance from the epicenter (unreachable members count as infinitely
    /// far, ties go to the lowest node index). The holding time is sized so that the migration
    /// moves exactly the configured volume at `per_slot_throughput` per slot.
    pub(crate) fn migration_request(
        &self,
        topo: &Topology,
        epicenter: NodeId,
        id: RequestId,
        now: SimTime,
        per_slot_throughput: f64,
    ) -> Request {
        let distances = topo.distances_from(epicenter);
        let mut best: Option<(f64, NodeId)> = None;
        for &node in &self.members {
            let d = distances.get(&node).copied().unwrap_or(f64::INFINITY);
            if best.map(|(bd, _)| d > bd).unwrap_or(true) {
                best = Some((d, node));
            }
        }
        let dst = best.map(|(_, n)| n).unwrap_or(self.datacenter);
        let holding =
            self.migration_volume / (self.migration_slot_demand as f64 * per_slot_throughput);
        info!(
            "{}: starting migration {id} from {} to {} ({} slots, {:.1}s)",
            self.id,
            self.datacenter.index(),
            dst.index(),
            self.migration_slot_demand,
            holding
        );
        Request::new(
            id,
            self.datacenter,
            dst,
            self.migration_slot_demand,
            holding,
            TrafficClass::Migration,
            self.id,
            now,
        )
    }
}

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

//! Module containing all type definitions

use ordered_float::NotNan;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Undirected;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) type IndexType = u32;
/// Node identification (and index into the graph)
pub type NodeId = NodeIndex<IndexType>;
/// Link identification (and edge index into the graph)
pub type LinkId = EdgeIndex<IndexType>;
/// Physical length of a link in kilometers
pub type LinkWeight = f64;
/// The fiber topology graph. Nodes carry no payload; edges carry their physical length. The
/// spectrum grid is kept outside of the graph (see [`crate::spectrum::SpectrumGrid`]).
pub type EonGraph = StableGraph<(), LinkWeight, Undirected, IndexType>;

/// Simulation timestamp in seconds. `NotNan` gives the event queue a total order.
pub type SimTime = NotNan<f64>;

/// ISP identifier. ISPs are numbered by their position in the scenario, which also determines
/// their spectrum zone under the sliding-window family of policies.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IspId(pub u32);

impl std::fmt::Display for IspId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ISP{}", self.0)
    }
}

impl From<u32> for IspId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

impl From<usize> for IspId {
    fn from(x: usize) -> Self {
        Self(x as u32)
    }
}

impl IspId {
    /// Get the index of this ISP into the scenario's ISP list.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Request identifier, unique within a simulation run. Identifiers are assigned in arrival
/// order, so sorting by id reproduces arrival order.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(x: u64) -> Self {
        Self(x)
    }
}

/// Contiguous spectrum window `[start, start + width)`, identical on every link of the
/// allocated path (spectrum continuity).
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpectrumWindow {
    /// First slot index of the window.
    pub start: usize,
    /// Number of slots in the window.
    pub width: usize,
}

impl SpectrumWindow {
    /// Create a new window starting at `start` spanning `width` slots.
    pub fn new(start: usize, width: usize) -> Self {
        Self { start, width }
    }

    /// One-past-the-end slot index.
    pub fn end(&self) -> usize {
        self.start + self.width
    }

    /// Iterate over the slot indices of the window.
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

impl std::fmt::Display for SpectrumWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// Scenario validation error. All of these are fatal at startup, before any event is processed.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigError {
    /// The policy identifier is not in the closed set of known policies.
    #[error("Unknown routing policy identifier: {0}")]
    UnknownPolicy(String),
    /// The scenario graph has no nodes or no links.
    #[error("The scenario graph is empty")]
    EmptyGraph,
    /// A node index referenced by the scenario does not exist in the graph.
    #[error("Scenario references node {0} which does not exist in the graph")]
    UnknownNode(u32),
    /// A link referenced by the scenario does not exist in the graph.
    #[error("Scenario references link {0} -- {1} which does not exist in the graph")]
    UnknownLink(u32, u32),
    /// A node is claimed by more than one ISP.
    #[error("Node {0} is a member of more than one ISP")]
    OverlappingMembership(u32),
    /// A node belongs to no ISP. Every node must be owned by exactly one ISP.
    #[error("Node {0} is not a member of any ISP")]
    UncoveredNode(u32),
    /// An ISP's datacenter must be one of its member nodes.
    #[error("{0}: datacenter node {1} is not a member node")]
    DatacenterNotMember(IspId, u32),
    /// A time value is negative or not finite.
    #[error("Invalid time value: {0}")]
    InvalidTime(f64),
    /// A link weight is negative or not finite.
    #[error("Invalid link weight: {0}")]
    InvalidLinkWeight(f64),
    /// A slot demand of zero or exceeding the grid size can never be satisfied.
    #[error("Invalid slot demand: {0} (grid has {1} slots)")]
    InvalidSlotDemand(usize, usize),
    /// The spectrum grid must have at least one slot.
    #[error("The spectrum grid must have at least one slot per link")]
    EmptyGrid,
    /// A probability distribution is empty or has non-positive total weight.
    #[error("Invalid traffic distribution: {0}")]
    InvalidDistribution(String),
}

/// Fatal simulation error. Invariant violations abort the run rather than produce untrusted
/// metrics; routing blocks and disruptions are outcomes, never errors.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A release touched a slot that the allocation does not hold.
    #[error("Released slot {slot} on link {link:?} which is not occupied")]
    ReleaseUnheldSlot {
        /// The link on which the violation occurred.
        link: LinkId,
        /// The offending slot index.
        slot: usize,
    },
    /// A path references a link that does not exist in the graph.
    #[error("Path references missing link between {0:?} and {1:?}")]
    LinkNotFound(NodeId, NodeId),
    /// A path references a node that does not exist in the graph.
    #[error("Path references missing node {0:?}")]
    NodeNotFound(NodeId),
    /// An event referenced a request that is not registered.
    #[error("Unknown request: {0}")]
    RequestNotFound(RequestId),
    /// The event queue produced an event before the current simulation time.
    #[error("Event at time {event} popped while the clock is already at {now}")]
    TimeRanBackwards {
        /// Current simulation time.
        now: SimTime,
        /// Timestamp of the offending event.
        event: SimTime,
    },
    /// The run exceeded the event limit. This guards against runaway event generation.
    #[error("Simulation did not terminate after processing {0} events")]
    EventLimitExceeded(usize),
}

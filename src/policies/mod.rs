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

//! # Routing policies
//!
//! A policy decides the path and the spectrum window for a request. Policies form a closed sum:
//! every variant is a case of [`RoutingPolicy`], and the string identifiers at the scenario
//! boundary map onto the variants through [`std::str::FromStr`]. Every variant honors spectrum
//! continuity and returns the first acceptable result under its own ordering.
//!
//! The shared candidate engine lives in this module: enumerate the catalogued paths in order,
//! optionally restrict them to a subgraph (subnet policies) and to the set of paths clear of
//! announced failures (disaster-aware policies), then search a window with first-fit or
//! best-fit inside the policy's spectrum zone. [`crate::topology::Topology::try_allocate`]
//! remains the only admission gate.

use std::collections::BTreeSet;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::disaster::Disaster;
use crate::isp::Isp;
use crate::paths::Path;
use crate::request::{BlockReason, Request};
use crate::topology::Topology;
use crate::types::{ConfigError, IspId, NodeId, SimTime, SpectrumWindow};

mod admission;
mod baseline;
mod disaster_aware;

/// The result of a routing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The request was admitted on the given path and window. The spectrum has already been
    /// occupied through the topology when this is returned.
    Accepted(Path, SpectrumWindow),
    /// The request was refused, with the reason.
    Blocked(BlockReason),
}

impl Outcome {
    /// Returns `true` for an accepted outcome.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_, _))
    }
}

/// Everything a policy may consult besides the topology: the ISPs (for zones, membership, and
/// migration demands), the disaster state, the current time, and the admission threshold.
#[derive(Debug)]
pub struct RouteCtx<'a> {
    /// All ISPs of the scenario, indexed by [`IspId::index`].
    pub isps: &'a [Isp],
    /// The ISP owning the routed request.
    pub isp: IspId,
    /// The disaster, if the scenario has one.
    pub disaster: Option<&'a Disaster>,
    /// Current simulation time.
    pub now: SimTime,
    /// Free-run decrement threshold of the admission-controlled policy.
    pub theta: usize,
}

impl<'a> RouteCtx<'a> {
    /// The ISP owning the routed request.
    pub fn owning_isp(&self) -> &'a Isp {
        &self.isps[self.isp.index()]
    }

    /// The disaster, but only once the owning ISP has reacted to it. Disaster-aware policies
    /// behave like their baseline counterparts before the reaction event fires.
    pub(crate) fn announced_disaster(&self) -> Option<&'a Disaster> {
        if self.owning_isp().has_reacted() {
            self.disaster
        } else {
            None
        }
    }
}

/// The closed set of routing policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingPolicy {
    /// Shortest path first, lowest window first.
    #[serde(rename = "first_fit")]
    FirstFit,
    /// Shortest path first, tightest window first.
    #[serde(rename = "best_fit")]
    BestFit,
    /// First-fit restricted to the owning ISP's spectrum zone.
    #[serde(rename = "sliding_window")]
    SlidingWindow,
    /// Intra-ISP traffic first-fit inside the ISP's subgraph and zone; cross-ISP traffic falls
    /// through to plain first-fit.
    #[serde(rename = "subnet")]
    Subnet,
    /// First-fit avoiding announced failures after the ISP's reaction.
    #[serde(rename = "first_fit_da")]
    FirstFitDisasterAware,
    /// Best-fit avoiding announced failures after the ISP's reaction.
    #[serde(rename = "best_fit_da")]
    BestFitDisasterAware,
    /// Best-fit inside the ISP's zone, avoiding announced failures.
    #[serde(rename = "best_fit_sw_da")]
    BestFitSlidingWindowDisasterAware,
    /// Subnet routing avoiding announced failures; cross-ISP traffic uses
    /// [`RoutingPolicy::FirstFitDisasterAware`].
    #[serde(rename = "subnet_da")]
    SubnetDisasterAware,
    /// Disaster-aware best-fit that refuses admissions harming migration headroom.
    #[serde(rename = "da_with_blocking")]
    DisasterAwareWithBlocking,
}

impl RoutingPolicy {
    /// All policy identifiers accepted at the scenario boundary.
    pub const IDENTIFIERS: [&'static str; 9] = [
        "first_fit",
        "best_fit",
        "sliding_window",
        "subnet",
        "first_fit_da",
        "best_fit_da",
        "best_fit_sw_da",
        "subnet_da",
        "da_with_blocking",
    ];

    /// Decide path and window for a request. On `Accepted`, the spectrum has been occupied.
    pub fn route(&self, req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
        match self {
            Self::FirstFit => baseline::first_fit(req, topo),
            Self::BestFit => baseline::best_fit(req, topo),
            Self::SlidingWindow => baseline::sliding_window(req, topo, ctx),
            Self::Subnet => baseline::subnet(req, topo, ctx),
            Self::FirstFitDisasterAware => disaster_aware::first_fit_da(req, topo, ctx),
            Self::BestFitDisasterAware => disaster_aware::best_fit_da(req, topo, ctx),
            Self::BestFitSlidingWindowDisasterAware => {
                disaster_aware::best_fit_sw_da(req, topo, ctx)
            }
            Self::SubnetDisasterAware => disaster_aware::subnet_da(req, topo, ctx),
            Self::DisasterAwareWithBlocking => admission::da_with_blocking(req, topo, ctx),
        }
    }

    /// Re-route a request whose allocation was lost to a failure. The old allocation must
    /// already be released by the caller; selection is identical to [`Self::route`].
    pub fn reroute(&self, req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
        self.route(req, topo, ctx)
    }
}

impl std::fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FirstFit => "first_fit",
            Self::BestFit => "best_fit",
            Self::SlidingWindow => "sliding_window",
            Self::Subnet => "subnet",
            Self::FirstFitDisasterAware => "first_fit_da",
            Self::BestFitDisasterAware => "best_fit_da",
            Self::BestFitSlidingWindowDisasterAware => "best_fit_sw_da",
            Self::SubnetDisasterAware => "subnet_da",
            Self::DisasterAwareWithBlocking => "da_with_blocking",
        };
        f.write_str(s)
    }
}

impl FromStr for RoutingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_fit" => Ok(Self::FirstFit),
            "best_fit" => Ok(Self::BestFit),
            "sliding_window" => Ok(Self::SlidingWindow),
            "subnet" => Ok(Self::Subnet),
            "first_fit_da" => Ok(Self::FirstFitDisasterAware),
            "best_fit_da" => Ok(Self::BestFitDisasterAware),
            "best_fit_sw_da" => Ok(Self::BestFitSlidingWindowDisasterAware),
            "subnet_da" => Ok(Self::SubnetDisasterAware),
            "da_with_blocking" => Ok(Self::DisasterAwareWithBlocking),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// How a window is picked inside a free run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fit {
    /// Lowest start index.
    First,
    /// Tightest run, then lowest start index.
    Best,
}

impl Fit {
    fn find(
        &self,
        topo: &Topology,
        path: &Path,
        width: usize,
        zone: Range<usize>,
    ) -> Option<usize> {
        match self {
            Fit::First => topo.grid().first_fit(path.links(), width, zone),
            Fit::Best => topo.grid().best_fit(path.links(), width, zone),
        }
    }
}

/// The shared candidate engine. Paths are enumerated in catalogue order, restricted first to
/// `subgraph` (if given, every node of the path must be in the set; exhausting the catalogue
/// here blocks with `no_path`), then to paths clear of failures announced by `disaster` (if
/// given; exhausting the remaining candidates here blocks with `no_safe_path`). The first
/// remaining path with a feasible window wins; running out of windows blocks with `no_window`.
pub(crate) fn route_filtered(
    req: &Request,
    topo: &mut Topology,
    zone: Range<usize>,
    fit: Fit,
    subgraph: Option<&BTreeSet<NodeId>>,
    disaster: Option<&Disaster>,
) -> Outcome {
    let mut in_subgraph = false;
    let mut safe = false;
    let selected = {
        let paths = topo.paths(req.src, req.dst);
        let mut selected: Option<(Path, usize)> = None;
        for path in paths {
            if let Some(members) = subgraph {
                if !path.nodes().iter().all(|n| members.contains(n)) {
                    continue;
                }
            }
            in_subgraph = true;
            if let Some(d) = disaster {
                if !d.is_path_safe(path) {
                    continue;
                }
            }
            safe = true;
            if !topo.is_usable(path) {
                continue;
            }
            if let Some(start) = fit.find(topo, path, req.slot_demand, zone.clone()) {
                selected = Some((path.clone(), start));
                break;
            }
        }
        selected
    };

    match selected {
        Some((path, start)) => {
            let window = SpectrumWindow::new(start, req.slot_demand);
            if topo.try_allocate(&path, window) {
                Outcome::Accepted(path, window)
            } else {
                // the search already proved the window free and the path usable
                Outcome::Blocked(BlockReason::NoWindow)
            }
        }
        None if !in_subgraph => Outcome::Blocked(BlockReason::NoPath),
        None if !safe => Outcome::Blocked(BlockReason::NoSafePath),
        None => Outcome::Blocked(BlockReason::NoWindow),
    }
}

/// The full spectrum zone.
pub(crate) fn full_zone(topo: &Topology) -> Range<usize> {
    0..topo.num_slots()
}

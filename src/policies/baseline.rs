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

//! Baseline policies without disaster awareness: first-fit, best-fit, the statically isolated
//! sliding window, and subnet routing.

use super::{full_zone, route_filtered, Fit, Outcome, RouteCtx};
use crate::request::Request;
use crate::topology::Topology;

/// Enumerate paths in catalogue order, scan slot indices ascending, take the first window that
/// allocates. The deterministic baseline.
pub(super) fn first_fit(req: &Request, topo: &mut Topology) -> Outcome {
    let zone = full_zone(topo);
    route_filtered(req, topo, zone, Fit::First, None, None)
}

/// Same path order as first-fit, but per path the window leaving the tightest fit wins.
pub(super) fn best_fit(req: &Request, topo: &mut Topology) -> Outcome {
    let zone = full_zone(topo);
    route_filtered(req, topo, zone, Fit::Best, None, None)
}

/// First-fit restricted to the owning ISP's spectrum zone. The zones partition the grid into
/// fixed contiguous stripes, one per ISP, giving static spectrum isolation.
pub(super) fn sliding_window(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let zone = ctx.owning_isp().zone();
    route_filtered(req, topo, zone, Fit::First, None, None)
}

/// Requests staying inside the owning ISP are routed first-fit within the ISP's subgraph and
/// spectrum zone. Cross-ISP requests fall through to plain first-fit over the whole graph.
pub(super) fn subnet(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let isp = ctx.owning_isp();
    if isp.contains(req.src) && isp.contains(req.dst) {
        route_filtered(
            req,
            topo,
            isp.zone(),
            Fit::First,
            Some(isp.member_nodes()),
            None,
        )
    } else {
        first_fit(req, topo)
    }
}

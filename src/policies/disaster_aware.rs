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

//! Disaster-aware policy variants.
//!
//! Each variant behaves exactly like its baseline counterpart until the owning ISP's reaction
//! event fires. Afterwards the candidate paths are filtered against the set of failures
//! announced by the current time, and a request for which the filter leaves nothing is blocked
//! with `no_safe_path`. The catalogue itself is never recomputed.

use super::{baseline, full_zone, route_filtered, Fit, Outcome, RouteCtx};
use crate::request::Request;
use crate::topology::Topology;

/// First-fit over the paths clear of announced failures.
pub(super) fn first_fit_da(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let zone = full_zone(topo);
    route_filtered(req, topo, zone, Fit::First, None, ctx.announced_disaster())
}

/// Best-fit over the paths clear of announced failures.
pub(super) fn best_fit_da(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let zone = full_zone(topo);
    route_filtered(req, topo, zone, Fit::Best, None, ctx.announced_disaster())
}

/// Best-fit inside the owning ISP's spectrum zone, over the paths clear of announced failures.
pub(super) fn best_fit_sw_da(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let zone = ctx.owning_isp().zone();
    route_filtered(req, topo, zone, Fit::Best, None, ctx.announced_disaster())
}

/// Subnet routing over the paths clear of announced failures. Cross-ISP requests use
/// [`first_fit_da`], mirroring the baseline subnet fallback.
pub(super) fn subnet_da(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let isp = ctx.owning_isp();
    if isp.contains(req.src) && isp.contains(req.dst) {
        route_filtered(
            req,
            topo,
            isp.zone(),
            Fit::First,
            Some(isp.member_nodes()),
            ctx.announced_disaster(),
        )
    } else {
        first_fit_da(req, topo, ctx)
    }
}

/// Plain disaster-aware best-fit, used as the second chance of the admission-controlled policy.
pub(super) fn second_chance(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    match ctx.announced_disaster() {
        Some(_) => best_fit_da(req, topo, ctx),
        None => baseline::best_fit(req, topo),
    }
}

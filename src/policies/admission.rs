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

//! The admission-controlled disaster-aware policy.
//!
//! Before admitting a request, the policy estimates how much migration headroom the candidate
//! allocation would destroy: for every ISP with a member node on the candidate path, it counts
//! the contiguous free runs that could still fit that ISP's migration demand on each link of
//! the path, before and after a simulated admission. A candidate whose total decrease exceeds
//! the threshold `theta` is skipped. If every candidate is skipped, the request gets a second
//! chance through plain disaster-aware best-fit, so the admission control reorders candidates
//! rather than starving regular traffic outright.

use log::trace;

use super::{disaster_aware, Outcome, RouteCtx};
use crate::paths::Path;
use crate::request::{BlockReason, Request};
use crate::topology::Topology;
use crate::types::SpectrumWindow;

/// Disaster-aware best-fit with migration-headroom admission control.
pub(super) fn da_with_blocking(req: &Request, topo: &mut Topology, ctx: &RouteCtx<'_>) -> Outcome {
    let disaster = ctx.announced_disaster();
    let selected = {
        let paths = topo.paths(req.src, req.dst);
        if paths.is_empty() {
            return Outcome::Blocked(BlockReason::NoPath);
        }
        let mut selected: Option<(Path, SpectrumWindow)> = None;
        for path in paths {
            if let Some(d) = disaster {
                if !d.is_path_safe(path) {
                    continue;
                }
            }
            if !topo.is_usable(path) {
                continue;
            }
            let start = match topo
                .grid()
                .best_fit(path.links(), req.slot_demand, 0..topo.num_slots())
            {
                Some(start) => start,
                None => continue,
            };
            let window = SpectrumWindow::new(start, req.slot_demand);
            if headroom_loss_acceptable(topo, ctx, path, window) {
                selected = Some((path.clone(), window));
                break;
            }
            trace!("{}: candidate {path} {window} refused by admission control", req.id);
        }
        selected
    };

    match selected {
        Some((path, window)) => {
            if topo.try_allocate(&path, window) {
                Outcome::Accepted(path, window)
            } else {
                Outcome::Blocked(BlockReason::NoWindow)
            }
        }
        // every candidate was either infeasible or refused; the second chance keeps regular
        // traffic from starving when the grid is tight everywhere
        None => disaster_aware::second_chance(req, topo, ctx),
    }
}

/// Check the free-run decrement criterion for one candidate. For each ISP with a member node on
/// the path, the number of free runs of at least that ISP's migration demand is counted on every
/// link of the path, before and after a simulated admission of `window`. The candidate is
/// acceptable if no ISP loses more than `theta` such runs in total.
fn headroom_loss_acceptable(
    topo: &Topology,
    ctx: &RouteCtx<'_>,
    path: &Path,
    window: SpectrumWindow,
) -> bool {
    for isp in ctx.isps {
        if !path.nodes().iter().any(|n| isp.contains(*n)) {
            continue;
        }
        let demand = isp.migration_slot_demand();
        if demand == 0 {
            continue;
        }
        let mut decrease: i64 = 0;
        for link in path.links() {
            let before = topo.grid().runs_at_least(*link, demand) as i64;
            let after = topo.grid().runs_at_least_excluding(*link, demand, window) as i64;
            decrease += before - after;
        }
        if decrease > ctx.theta as i64 {
            return false;
        }
    }
    true
}

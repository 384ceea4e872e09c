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

//! Per-link spectrum occupancy and the free-run analysis shared by all routing policies.
//!
//! Every link carries the same fixed grid of `S` boolean slots. An allocation occupies the same
//! contiguous window on every link of its path (spectrum continuity), so all window searches
//! operate on the *joint* occupancy of a path: a slot counts as free only if it is free on every
//! link. The grid itself never decides anything about paths or failures; it only answers slot
//! questions.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_with::{As, Same};

use crate::types::{LinkId, SimulationError, SpectrumWindow};

/// A maximal run of contiguous slots that are free on every link of the inspected path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRun {
    /// First slot of the run.
    pub start: usize,
    /// Number of contiguous free slots.
    pub len: usize,
}

impl FreeRun {
    /// One-past-the-end slot index of the run.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Slot occupancy state for every link of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumGrid {
    num_slots: usize,
    #[serde(with = "As::<Vec<(Same, Same)>>")]
    slots: HashMap<LinkId, Vec<bool>>,
}

impl SpectrumGrid {
    /// Create a grid with `num_slots` slots for each of the given links, all free.
    pub fn new(num_slots: usize, links: impl IntoIterator<Item = LinkId>) -> Self {
        Self {
            num_slots,
            slots: links
                .into_iter()
                .map(|l| (l, vec![false; num_slots]))
                .collect(),
        }
    }

    /// The number of slots per link.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Check whether a single slot is occupied on the given link. Unknown links count as
    /// occupied, so a stray query can never invent capacity.
    pub fn is_occupied(&self, link: LinkId, slot: usize) -> bool {
        self.slots
            .get(&link)
            .and_then(|s| s.get(slot))
            .copied()
            .unwrap_or(true)
    }

    /// Check whether the window is free on every given link.
    pub fn window_is_free(&self, links: &[LinkId], window: SpectrumWindow) -> bool {
        if window.end() > self.num_slots {
            return false;
        }
        links
            .iter()
            .all(|l| window.slots().all(|s| !self.is_occupied(*l, s)))
    }

    /// Occupy the window on every given link. The caller must have checked
    /// [`Self::window_is_free`] first; this is enforced by [`crate::topology::Topology`], which
    /// is the only admission gate.
    pub(crate) fn occupy(&mut self, links: &[LinkId], window: SpectrumWindow) {
        for l in links {
            if let Some(slots) = self.slots.get_mut(l) {
                for s in window.slots() {
                    slots[s] = true;
                }
            }
        }
    }

    /// Free the window on every given link. Every slot must currently be occupied; releasing a
    /// slot that is not held is an invariant violation and aborts the simulation.
    pub(crate) fn release(
        &mut self,
        links: &[LinkId],
        window: SpectrumWindow,
    ) -> Result<(), SimulationError> {
        // validate before mutating, so a failed release leaves the grid untouched
        for l in links {
            for s in window.slots() {
                if !self.is_occupied(*l, s) {
                    return Err(SimulationError::ReleaseUnheldSlot { link: *l, slot: s });
                }
            }
        }
        for l in links {
            if let Some(slots) = self.slots.get_mut(l) {
                for s in window.slots() {
                    slots[s] = false;
                }
            }
        }
        Ok(())
    }

    /// Compute the maximal free runs within `zone`, where a slot counts as free only if it is
    /// free on every one of the given links.
    pub fn free_runs(&self, links: &[LinkId], zone: Range<usize>) -> Vec<FreeRun> {
        let zone = zone.start..zone.end.min(self.num_slots);
        let mut runs: Vec<FreeRun> = Vec::new();
        for slot in zone {
            let free = links.iter().all(|l| !self.is_occupied(*l, slot));
            match runs.last_mut() {
                Some(run) if free && run.end() == slot => run.len += 1,
                _ if free => runs.push(FreeRun { start: slot, len: 1 }),
                _ => {}
            }
        }
        runs
    }

    /// First-fit window search: the lowest start index in `zone` at which `width` slots are
    /// jointly free on all links.
    pub fn first_fit(&self, links: &[LinkId], width: usize, zone: Range<usize>) -> Option<usize> {
        self.free_runs(links, zone)
            .into_iter()
            .find(|run| run.len >= width)
            .map(|run| run.start)
    }

    /// Best-fit window search: place the window at the start of the tightest free run that still
    /// fits, so the window ends up adjacent to an occupied slot or the zone boundary and the
    /// largest leftover free run is minimized. Ties are broken by the lowest start index.
    pub fn best_fit(&self, links: &[LinkId], width: usize, zone: Range<usize>) -> Option<usize> {
        self.free_runs(links, zone)
            .into_iter()
            .filter(|run| run.len >= width)
            .min_by_key(|run| (run.len, run.start))
            .map(|run| run.start)
    }

    /// Count the free runs of length at least `min_len` on a single link.
    pub fn runs_at_least(&self, link: LinkId, min_len: usize) -> usize {
        self.free_runs(&[link], 0..self.num_slots)
            .into_iter()
            .filter(|run| run.len >= min_len)
            .count()
    }

    /// Count the free runs of length at least `min_len` on a single link as they would look
    /// *after* occupying `window`. This simulates an admission without touching the grid and is
    /// used by the admission-controlled policy to estimate migration headroom loss.
    pub fn runs_at_least_excluding(
        &self,
        link: LinkId,
        min_len: usize,
        window: SpectrumWindow,
    ) -> usize {
        self.free_runs(&[link], 0..self.num_slots)
            .into_iter()
            .flat_map(|run| {
                if window.start >= run.end() || window.end() <= run.start {
                    // window does not intersect this run
                    vec![run]
                } else {
                    let left = FreeRun {
                        start: run.start,
                        len: window.start.saturating_sub(run.start),
                    };
                    let right = FreeRun {
                        start: window.end(),
                        len: run.end().saturating_sub(window.end()),
                    };
                    vec![left, right]
                }
            })
            .filter(|run| run.len >= min_len)
            .count()
    }
}

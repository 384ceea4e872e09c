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

//! Bandwidth requests and their allocation records.

use serde::{Deserialize, Serialize};

use crate::paths::Path;
use crate::types::{IspId, NodeId, RequestId, SimTime, SpectrumWindow};

/// The class of a request. Migration requests are injected by an ISP's reaction and may be
/// shielded by disaster-aware admission control; everything else is regular datapath traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrafficClass {
    /// Regular traffic between two nodes.
    Datapath,
    /// Best-effort datacenter evacuation started at ISP reaction time.
    Migration,
}

impl std::fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Datapath => f.write_str("datapath"),
            Self::Migration => f.write_str("migration"),
        }
    }
}

/// Why an admission attempt was refused. Blocking is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockReason {
    /// The catalogue holds no path between source and destination.
    NoPath,
    /// No catalogued path offers a contiguous window of the demanded width.
    NoWindow,
    /// Disaster-aware filtering left no path clear of announced failures.
    NoSafePath,
    /// Admission control refused the request to protect migration headroom.
    AdmissionControl,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPath => f.write_str("no_path"),
            Self::NoWindow => f.write_str("no_window"),
            Self::NoSafePath => f.write_str("no_safe_path"),
            Self::AdmissionControl => f.write_str("admission_control"),
        }
    }
}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Created but not yet routed.
    Pending,
    /// Admitted and holding spectrum.
    Active,
    /// Departed after its holding time elapsed.
    Completed,
    /// Refused at admission, with the reason.
    Blocked(BlockReason),
    /// Lost its allocation to a failure and could not be re-routed.
    Disrupted,
    /// Lost its allocation to a failure and was successfully re-routed; still holding spectrum.
    Rerouted,
}

/// The spectrum a request currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// The admitted path.
    pub path: Path,
    /// The window occupied on every link of the path.
    pub window: SpectrumWindow,
    /// When the allocation was made.
    pub admitted_at: SimTime,
}

/// A bandwidth demand plus its mutable allocation record. A request is owned by its originating
/// ISP for its entire lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier, assigned in arrival order.
    pub id: RequestId,
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dst: NodeId,
    /// Demanded window width in slots.
    pub slot_demand: usize,
    /// How long the allocation is held once admitted.
    pub holding_time: f64,
    /// Datapath or migration.
    pub class: TrafficClass,
    /// The ISP owning this request (the ISP of the source node).
    pub isp: IspId,
    /// Arrival timestamp.
    pub arrival: SimTime,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// Spectrum currently held, if any.
    pub allocation: Option<Allocation>,
    /// When the allocation was last released (departure or disruption).
    pub released_at: Option<SimTime>,
}

impl Request {
    /// Create a new pending request.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RequestId,
        src: NodeId,
        dst: NodeId,
        slot_demand: usize,
        holding_time: f64,
        class: TrafficClass,
        isp: IspId,
        arrival: SimTime,
    ) -> Self {
        Self {
            id,
            src,
            dst,
            slot_demand,
            holding_time,
            class,
            isp,
            arrival,
            status: RequestStatus::Pending,
            allocation: None,
            released_at: None,
        }
    }

    /// Whether the request currently holds spectrum.
    pub fn is_active(&self) -> bool {
        matches!(self.status, RequestStatus::Active | RequestStatus::Rerouted)
    }

    /// Record an admission. Initial admissions become `Active`, admissions after a disruption
    /// become `Rerouted`.
    pub(crate) fn admit(&mut self, path: Path, window: SpectrumWindow, now: SimTime) {
        let rerouted = self.released_at.is_some();
        self.allocation = Some(Allocation {
            path,
            window,
            admitted_at: now,
        });
        self.status = if rerouted {
            RequestStatus::Rerouted
        } else {
            RequestStatus::Active
        };
    }

    /// Record a blocked admission attempt.
    pub(crate) fn block(&mut self, reason: BlockReason) {
        self.status = RequestStatus::Blocked(reason);
        self.allocation = None;
    }

    /// Record the departure of an active request.
    pub(crate) fn complete(&mut self, now: SimTime) {
        self.status = RequestStatus::Completed;
        self.allocation = None;
        self.released_at = Some(now);
    }

    /// Take the current allocation for release, marking the release time.
    pub(crate) fn take_allocation(&mut self, now: SimTime) -> Option<Allocation> {
        self.released_at = Some(now);
        self.allocation.take()
    }

    /// Record a disruption that could not be re-routed.
    pub(crate) fn disrupt(&mut self) {
        self.status = RequestStatus::Disrupted;
        self.allocation = None;
    }
}

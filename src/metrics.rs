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

//! Metrics accumulation.
//!
//! One `Metrics` instance exists per simulation run and is threaded through the scheduler
//! explicitly; there is no global sink. All counters are monotonic. A [`MetricsSnapshot`] can
//! be taken at any simulation time, which supports time-series sampling during the disaster
//! interval.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::request::{BlockReason, Request, RequestStatus, TrafficClass};
use crate::types::{IspId, RequestId, SimTime};

/// Counter family kept per class, per ISP, and for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Requests that arrived.
    pub arrivals: u64,
    /// Requests admitted at first attempt.
    pub admitted: u64,
    /// Requests refused at admission, by reason.
    pub blocked: BTreeMap<BlockReason, u64>,
    /// Active requests that lost their allocation and could not be re-routed.
    pub disrupted: u64,
    /// Active requests that lost their allocation and were re-routed successfully.
    pub rerouted: u64,
}

impl Counters {
    /// Total number of blocked requests across all reasons.
    pub fn blocked_total(&self) -> u64 {
        self.blocked.values().sum()
    }
}

/// Per-ISP record of the datacenter evacuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Volume the admitted migration will move (holding time x width x per-slot throughput).
    pub volume: f64,
    /// Admission time of the migration request.
    pub started_at: SimTime,
    /// Departure time, once the transfer finished.
    pub completed_at: Option<SimTime>,
    /// Holding time of the migration request, used to estimate progress.
    pub holding_time: f64,
}

/// Final per-request bookkeeping, also used to check run determinism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Owning ISP.
    pub isp: IspId,
    /// Datapath or migration.
    pub class: TrafficClass,
    /// Demanded window width.
    pub slot_demand: usize,
    /// Arrival time.
    pub arrival: SimTime,
    /// Lifecycle state at recording time.
    pub status: RequestStatus,
}

/// Per-demand offered/blocked tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandCounters {
    /// Requests offered with this slot demand.
    pub offered: u64,
    /// Requests blocked with this slot demand.
    pub blocked: u64,
}

/// The per-run metrics sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    theta: usize,
    total: Counters,
    per_class: BTreeMap<TrafficClass, Counters>,
    per_isp: BTreeMap<IspId, Counters>,
    by_slot_demand: BTreeMap<usize, DemandCounters>,
    migrations: BTreeMap<IspId, MigrationRecord>,
    records: BTreeMap<RequestId, RequestRecord>,
}

impl Metrics {
    /// Create an empty sink. `theta` is the admission threshold of the run, carried into every
    /// snapshot.
    pub fn new(theta: usize) -> Self {
        Self {
            theta,
            total: Counters::default(),
            per_class: BTreeMap::new(),
            per_isp: BTreeMap::new(),
            by_slot_demand: BTreeMap::new(),
            migrations: BTreeMap::new(),
            records: BTreeMap::new(),
        }
    }

    fn each(&mut self, req: &Request, f: impl Fn(&mut Counters)) {
        f(&mut self.total);
        f(self.per_class.entry(req.class).or_default());
        f(self.per_isp.entry(req.isp).or_default());
    }

    fn update_record(&mut self, req: &Request) {
        self.records.insert(
            req.id,
            RequestRecord {
                isp: req.isp,
                class: req.class,
                slot_demand: req.slot_demand,
                arrival: req.arrival,
                status: req.status,
            },
        );
    }

    /// Record an arrival.
    pub(crate) fn record_arrival(&mut self, req: &Request) {
        self.each(req, |c| c.arrivals += 1);
        self.by_slot_demand
            .entry(req.slot_demand)
            .or_default()
            .offered += 1;
        self.update_record(req);
    }

    /// Record a successful admission. For the first admission of a migration request,
    /// `migration_volume` carries the transferred volume.
    pub(crate) fn record_admission(&mut self, req: &Request, migration_volume: Option<f64>) {
        self.each(req, |c| c.admitted += 1);
        if let Some(volume) = migration_volume {
            self.migrations.entry(req.isp).or_insert(MigrationRecord {
                volume,
                started_at: req.arrival,
                completed_at: None,
                holding_time: req.holding_time,
            });
        }
        self.update_record(req);
    }

    /// Record a blocked admission.
    pub(crate) fn record_block(&mut self, req: &Request, reason: BlockReason) {
        self.each(req, |c| *c.blocked.entry(reason).or_default() += 1);
        self.by_slot_demand
            .entry(req.slot_demand)
            .or_default()
            .blocked += 1;
        self.update_record(req);
    }

    /// Record a departure.
    pub(crate) fn record_departure(&mut self, req: &Request, now: SimTime) {
        if req.class == TrafficClass::Migration {
            if let Some(m) = self.migrations.get_mut(&req.isp) {
                m.completed_at.get_or_insert(now);
            }
        }
        self.update_record(req);
    }

    /// Record a disruption that could not be re-routed.
    pub(crate) fn record_disrupted(&mut self, req: &Request) {
        self.each(req, |c| c.disrupted += 1);
        self.update_record(req);
    }

    /// Record a successful re-route after a disruption.
    pub(crate) fn record_rerouted(&mut self, req: &Request) {
        self.each(req, |c| c.rerouted += 1);
        self.update_record(req);
    }

    /// Counters for the whole run.
    pub fn total(&self) -> &Counters {
        &self.total
    }

    /// Counters per traffic class.
    pub fn per_class(&self) -> &BTreeMap<TrafficClass, Counters> {
        &self.per_class
    }

    /// Counters per ISP.
    pub fn per_isp(&self) -> &BTreeMap<IspId, Counters> {
        &self.per_isp
    }

    /// Migration bookkeeping per ISP.
    pub fn migrations(&self) -> &BTreeMap<IspId, MigrationRecord> {
        &self.migrations
    }

    /// Per-request outcome table.
    pub fn records(&self) -> &BTreeMap<RequestId, RequestRecord> {
        &self.records
    }

    /// Take a snapshot at the given simulation time.
    pub fn snapshot(&self, now: SimTime) -> MetricsSnapshot {
        let mut outcomes = OutcomeTally::default();
        for r in self.records.values() {
            match r.status {
                RequestStatus::Active | RequestStatus::Rerouted | RequestStatus::Completed => {
                    outcomes.admitted += 1
                }
                RequestStatus::Blocked(_) => outcomes.blocked += 1,
                RequestStatus::Disrupted => outcomes.disrupted += 1,
                RequestStatus::Pending => outcomes.pending += 1,
            }
        }
        let migration_progress = self
            .migrations
            .iter()
            .map(|(isp, m)| {
                let fraction = match m.completed_at {
                    Some(_) => 1.0,
                    None if m.holding_time > 0.0 => {
                        let elapsed = now.into_inner() - m.started_at.into_inner();
                        (elapsed / m.holding_time).clamp(0.0, 1.0)
                    }
                    None => 1.0,
                };
                (*isp, fraction)
            })
            .collect();
        MetricsSnapshot {
            time: now,
            theta: self.theta,
            total: self.total.clone(),
            per_class: self.per_class.clone(),
            per_isp: self.per_isp.clone(),
            by_slot_demand: self.by_slot_demand.clone(),
            migrations: self.migrations.clone(),
            migration_progress,
            outcomes,
        }
    }
}

/// Final-outcome tally over all requests seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    /// Requests holding or having held an allocation.
    pub admitted: u64,
    /// Requests refused at admission.
    pub blocked: u64,
    /// Requests lost to the disaster.
    pub disrupted: u64,
    /// Requests not yet routed.
    pub pending: u64,
}

/// A serializable view of the metrics at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// The simulation time of the snapshot.
    pub time: SimTime,
    /// Admission threshold of the run.
    pub theta: usize,
    /// Counters for the whole run.
    pub total: Counters,
    /// Counters per traffic class.
    pub per_class: BTreeMap<TrafficClass, Counters>,
    /// Counters per ISP.
    pub per_isp: BTreeMap<IspId, Counters>,
    /// Offered/blocked tallies per slot demand.
    pub by_slot_demand: BTreeMap<usize, DemandCounters>,
    /// Migration bookkeeping per ISP.
    pub migrations: BTreeMap<IspId, MigrationRecord>,
    /// Estimated fraction of the datacenter volume moved so far, per ISP.
    pub migration_progress: BTreeMap<IspId, f64>,
    /// Final-outcome tally over all requests.
    pub outcomes: OutcomeTally,
}

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

//! # The discrete-event loop
//!
//! The [`Simulator`] owns every mutable piece of the run: topology, ISPs, disaster, requests,
//! metrics, and the event queue. All state changes happen inside an event handler on a single
//! logical thread, so no admission can ever race the spectrum grid. Arrival events route a
//! request through the owning ISP's active policy and enqueue the departure on success. Each
//! traffic arrival also draws the next one, which replaces the coroutine-based generator of a
//! scripting implementation with plain events. Disaster-step events announce failures and
//! disrupt the active requests crossing them, reaction events switch ISP policies and inject
//! the migrations, and the end event restores the damaged resources.
//!
//! The run terminates once the queue drains: all arrivals have been emitted and each has
//! departed or been blocked. [`Simulator::step`] and [`Simulator::run_until`] expose the loop
//! one event at a time, so a driver can sample metrics mid-run.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use ordered_float::NotNan;

use crate::disaster::{Disaster, FailedResource};
use crate::event::{Event, EventQueue};
use crate::isp::Isp;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policies::{Outcome, RouteCtx};
use crate::request::{Request, TrafficClass};
use crate::topology::Topology;
use crate::traffic::TrafficSource;
use crate::types::{IspId, NodeId, RequestId, SimTime, SimulationError};

static DEFAULT_STOP_AFTER: usize = 1_000_000;

/// The discrete-event simulator for one scenario run.
#[derive(Debug)]
pub struct Simulator {
    topology: Topology,
    isps: Vec<Isp>,
    isp_of_node: HashMap<NodeId, IspId>,
    disaster: Option<Disaster>,
    traffic: TrafficSource,
    metrics: Metrics,
    queue: EventQueue,
    requests: BTreeMap<RequestId, Request>,
    now: SimTime,
    next_request_id: u64,
    per_slot_throughput: f64,
    theta: usize,
    stop_after: Option<usize>,
    events_processed: usize,
}

impl Simulator {
    /// Assemble a simulator and schedule the initial events: the complete disaster timeline,
    /// one reaction event per ISP, the restoration, and the first arrival.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        topology: Topology,
        isps: Vec<Isp>,
        isp_of_node: HashMap<NodeId, IspId>,
        disaster: Option<Disaster>,
        traffic: TrafficSource,
        metrics: Metrics,
        per_slot_throughput: f64,
        theta: usize,
    ) -> Self {
        let mut sim = Self {
            topology,
            isps,
            isp_of_node,
            disaster,
            traffic,
            metrics,
            queue: EventQueue::new(),
            requests: BTreeMap::new(),
            now: NotNan::default(),
            next_request_id: 1,
            per_slot_throughput,
            theta,
            stop_after: Some(DEFAULT_STOP_AFTER),
            events_processed: 0,
        };
        if let Some(d) = &sim.disaster {
            for (k, failure) in d.timeline().iter().enumerate() {
                sim.queue.push(Event::DisasterStep(k), failure.time);
            }
            sim.queue.push(Event::DisasterEnd, d.end());
            let start = d.start();
            for isp in &sim.isps {
                sim.queue
                    .push(Event::IspReaction(isp.id()), start + isp.reaction_delay());
            }
        }
        sim.pump_arrival();
        sim
    }

    /// Current simulation time: the timestamp of the last processed event.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The metrics accumulated so far.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Convenience for `self.metrics().snapshot(self.now())`.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.now)
    }

    /// The topology of the run.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The ISPs of the run.
    pub fn isps(&self) -> &[Isp] {
        &self.isps
    }

    /// The disaster of the run, if any.
    pub fn disaster(&self) -> Option<&Disaster> {
        self.disaster.as_ref()
    }

    /// Look up a request by id.
    pub fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(&id)
    }

    /// All requests seen so far, keyed by id (ascending arrival order).
    pub fn requests(&self) -> &BTreeMap<RequestId, Request> {
        &self.requests
    }

    /// Replace the event limit guarding against runaway event generation.
    pub fn set_event_limit(&mut self, stop_after: Option<usize>) {
        self.stop_after = stop_after;
    }

    /// Process every remaining event.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// Process every event with a timestamp not after `until`.
    pub fn run_until(&mut self, until: SimTime) -> Result<(), SimulationError> {
        while let Some(t) = self.queue.peek_time() {
            if t > until {
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    /// Process the next event. Returns the handled event, or `None` once the queue is empty.
    pub fn step(&mut self) -> Result<Option<Event>, SimulationError> {
        let Some((time, event)) = self.queue.pop() else {
            return Ok(None);
        };
        if time < self.now {
            return Err(SimulationError::TimeRanBackwards {
                now: self.now,
                event: time,
            });
        }
        if let Some(limit) = self.stop_after {
            if self.events_processed >= limit {
                return Err(SimulationError::EventLimitExceeded(limit));
            }
        }
        self.events_processed += 1;
        self.now = time;
        match event {
            Event::Arrival(id) => self.handle_arrival(id)?,
            Event::Departure(id) => self.handle_departure(id)?,
            Event::DisasterStep(k) => self.handle_disaster_step(k)?,
            Event::IspReaction(isp) => self.handle_reaction(isp)?,
            Event::DisasterEnd => self.handle_disaster_end(),
        }
        Ok(Some(event))
    }

    /// Ask the traffic source for the next arrival and schedule it.
    fn pump_arrival(&mut self) {
        let id = RequestId(self.next_request_id);
        if let Some(req) = self.traffic.next_arrival(self.now, id, &self.isp_of_node) {
            self.next_request_id = self.next_request_id.max(req.id.0 + 1);
            let id = req.id;
            let time = req.arrival;
            self.requests.insert(id, req);
            self.queue.push(Event::Arrival(id), time);
        }
    }

    fn handle_arrival(&mut self, id: RequestId) -> Result<(), SimulationError> {
        // draw the next arrival first, keeping the id sequence independent of routing outcomes
        let is_traffic = self
            .requests
            .get(&id)
            .map(|r| r.class == TrafficClass::Datapath)
            .unwrap_or(false);
        if is_traffic {
            self.pump_arrival();
        }

        let (outcome, holding, class) = {
            let req = self
                .requests
                .get(&id)
                .ok_or(SimulationError::RequestNotFound(id))?;
            self.metrics.record_arrival(req);
            let policy = self.isps[req.isp.index()].active_policy();
            let ctx = RouteCtx {
                isps: &self.isps,
                isp: req.isp,
                disaster: self.disaster.as_ref(),
                now: self.now,
                theta: self.theta,
            };
            let outcome = policy.route(req, &mut self.topology, &ctx);
            (outcome, req.holding_time, req.class)
        };

        match outcome {
            Outcome::Accepted(path, window) => {
                let volume = (class == TrafficClass::Migration)
                    .then(|| holding * window.width as f64 * self.per_slot_throughput);
                let req = self
                    .requests
                    .get_mut(&id)
                    .ok_or(SimulationError::RequestNotFound(id))?;
                debug!("{id}: admitted on {path} {window}");
                req.admit(path, window, self.now);
                self.metrics.record_admission(&*req, volume);
                self.queue.push(Event::Departure(id), self.now + holding);
            }
            Outcome::Blocked(reason) => {
                let req = self
                    .requests
                    .get_mut(&id)
                    .ok_or(SimulationError::RequestNotFound(id))?;
                debug!("{id}: blocked ({reason})");
                req.block(reason);
                self.metrics.record_block(&*req, reason);
            }
        }
        Ok(())
    }

    fn handle_departure(&mut self, id: RequestId) -> Result<(), SimulationError> {
        let alloc = {
            let req = self
                .requests
                .get_mut(&id)
                .ok_or(SimulationError::RequestNotFound(id))?;
            if !req.is_active() {
                warn!("{id}: stale departure ignored");
                return Ok(());
            }
            req.take_allocation(self.now)
        };
        if let Some(a) = alloc {
            self.topology.release(&a.path, a.window)?;
        }
        let req = self
            .requests
            .get_mut(&id)
            .ok_or(SimulationError::RequestNotFound(id))?;
        req.complete(self.now);
        debug!("{id}: departed");
        self.metrics.record_departure(&*req, self.now);
        Ok(())
    }

    fn handle_disaster_step(&mut self, index: usize) -> Result<(), SimulationError> {
        let resource = match self.disaster.as_mut() {
            Some(d) => d.announce(index, &mut self.topology),
            None => None,
        };
        let Some(resource) = resource else {
            return Ok(());
        };
        // disrupt the active requests crossing the failed resource, in arrival order
        let affected: Vec<RequestId> = self
            .requests
            .values()
            .filter(|r| r.is_active())
            .filter(|r| {
                r.allocation
                    .as_ref()
                    .map(|a| match resource {
                        FailedResource::Link(l) => a.path.crosses_link(l),
                        FailedResource::Node(n) => a.path.crosses_node(n),
                    })
                    .unwrap_or(false)
            })
            .map(|r| r.id)
            .collect();
        for id in affected {
            self.disrupt(id)?;
        }
        Ok(())
    }

    /// Cancel an in-flight request and try to re-route it under the owning ISP's active policy.
    fn disrupt(&mut self, id: RequestId) -> Result<(), SimulationError> {
        self.queue.cancel_departure(id);
        let alloc = self
            .requests
            .get_mut(&id)
            .ok_or(SimulationError::RequestNotFound(id))?
            .take_allocation(self.now);
        if let Some(a) = alloc {
            self.topology.release(&a.path, a.window)?;
        }

        let (outcome, holding) = {
            let req = self
                .requests
                .get(&id)
                .ok_or(SimulationError::RequestNotFound(id))?;
            let policy = self.isps[req.isp.index()].active_policy();
            let ctx = RouteCtx {
                isps: &self.isps,
                isp: req.isp,
                disaster: self.disaster.as_ref(),
                now: self.now,
                theta: self.theta,
            };
            (
                policy.reroute(req, &mut self.topology, &ctx),
                req.holding_time,
            )
        };

        let req = self
            .requests
            .get_mut(&id)
            .ok_or(SimulationError::RequestNotFound(id))?;
        match outcome {
            Outcome::Accepted(path, window) => {
                debug!("{id}: disrupted, re-routed on {path} {window}");
                req.admit(path, window, self.now);
                self.metrics.record_rerouted(&*req);
                self.queue.push(Event::Departure(id), self.now + holding);
            }
            Outcome::Blocked(reason) => {
                debug!("{id}: disrupted, re-route failed ({reason})");
                req.disrupt();
                self.metrics.record_disrupted(&*req);
            }
        }
        Ok(())
    }

    fn handle_reaction(&mut self, isp: IspId) -> Result<(), SimulationError> {
        let idx = isp.index();
        self.isps[idx].react(self.now);
        let Some(d) = self.disaster.as_ref() else {
            return Ok(());
        };
        // inject the migration as an immediate arrival; same-time arrivals are ordered after
        // every reaction by the queue's kind priority
        let req = self.isps[idx].migration_request(
            &self.topology,
            d.epicenter(),
            RequestId(self.next_request_id),
            self.now,
            self.per_slot_throughput,
        );
        self.next_request_id += 1;
        let id = req.id;
        self.requests.insert(id, req);
        self.queue.push(Event::Arrival(id), self.now);
        Ok(())
    }

    fn handle_disaster_end(&mut self) {
        if let Some(d) = self.disaster.as_mut() {
            d.restore();
        }
        self.topology.restore_all();
    }
}

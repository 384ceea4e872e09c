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

//! Events and the deterministic event queue.
//!
//! Events are totally ordered by (timestamp, kind priority, insertion counter). The kind
//! priority resolves simultaneous events: failures become visible before ISP reactions,
//! reactions before departures, and departures before new admissions at the same instant. The
//! insertion counter breaks the remaining ties in insertion order, so two runs over the same
//! scenario pop the exact same sequence.

use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::types::{IspId, RequestId, SimTime};

/// Event to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// A request arrives and asks to be routed.
    Arrival(RequestId),
    /// An active request's holding time elapsed; its spectrum is released.
    Departure(RequestId),
    /// The failure timeline entry at this index is announced.
    DisasterStep(usize),
    /// The ISP learns of the disaster and switches policies.
    IspReaction(IspId),
    /// The disaster interval ends and failed resources are restored.
    DisasterEnd,
}

impl Event {
    /// Kind priority at equal timestamps. Lower values are processed first.
    fn rank(&self) -> u8 {
        match self {
            Event::DisasterStep(_) | Event::DisasterEnd => 0,
            Event::IspReaction(_) => 1,
            Event::Departure(_) => 2,
            Event::Arrival(_) => 3,
        }
    }
}

/// Total order on enqueued events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) struct EventPriority {
    time: SimTime,
    rank: u8,
    seq: u64,
}

/// The scheduler's min-heap. Keyed by event, so a pending departure can be removed when its
/// request is disrupted.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    queue: PriorityQueue<Event, Reverse<EventPriority>>,
    seq: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event at the given time.
    pub fn push(&mut self, event: Event, time: SimTime) {
        let priority = EventPriority {
            time,
            rank: event.rank(),
            seq: self.seq,
        };
        self.seq += 1;
        self.queue.push(event, Reverse(priority));
    }

    /// Pop the next event together with its timestamp.
    pub fn pop(&mut self) -> Option<(SimTime, Event)> {
        self.queue
            .pop()
            .map(|(event, Reverse(p))| (p.time, event))
    }

    /// The timestamp of the next event, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|(_, Reverse(p))| p.time)
    }

    /// Remove the pending departure of a request, if one is enqueued. Used when a disruption
    /// cancels an in-flight allocation.
    pub fn cancel_departure(&mut self, request: RequestId) -> bool {
        self.queue.remove(&Event::Departure(request)).is_some()
    }

    /// The number of enqueued events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Return `true` if no event is enqueued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

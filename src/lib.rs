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

#![deny(missing_docs, missing_debug_implementations)]

//! # EonSim
//!
//! This is a library for simulating routing and spectrum assignment in an elastic optical
//! network while a localized disaster progressively disables links and nodes.
//!
//! The network is a weighted graph partitioned among internet service providers. Every link
//! carries a fixed grid of spectrum slots, and a request occupies the same contiguous window
//! of slots on every link of its path. Requests arrive as a Poisson process (or from a
//! materialized replay list), are routed by the owning ISP's active
//! [`RoutingPolicy`](policies::RoutingPolicy), and release their window when the holding time
//! elapses. The disaster announces failures along a fixed timeline; each ISP learns of it
//! after its own reaction delay, switches to its disaster policy, and evacuates its datacenter
//! to the member node farthest from the epicenter. The
//! [`Metrics`](metrics::Metrics) sink measures blocking and migration throughput so that
//! routing strategies can be compared.
//!
//! The whole simulation is a single-threaded discrete-event loop (see
//! [`Simulator`](scheduler::Simulator)) over a queue with a deterministic total order: given
//! the same [`Scenario`](scenario::Scenario), two runs produce identical metrics and identical
//! per-request outcomes.
//!
//! ## Example usage
//!
//! The following scenario saturates a single link of four slots with five unit-demand
//! requests under first-fit; the fifth finds no window.
//!
//! ```
//! use eonsim::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let scenario = Scenario {
//!         graph: GraphSpec {
//!             nodes: 2,
//!             links: vec![LinkSpec { a: 0, b: 1, weight: 1.0 }],
//!         },
//!         num_slots: 4,
//!         k_paths: 5,
//!         isps: vec![IspSpec {
//!             members: vec![0, 1],
//!             datacenter: 0,
//!             reaction_delay: 0.0,
//!             normal_policy: "first_fit".to_string(),
//!             disaster_policy: "first_fit_da".to_string(),
//!             migration_slot_demand: 1,
//!             migration_volume: 0.0,
//!         }],
//!         per_slot_throughput: 1.0,
//!         admission_theta: 1,
//!         disaster: None,
//!         traffic: TrafficSpec::Replay(
//!             (0..5)
//!                 .map(|i| RequestSpec {
//!                     arrival: i as f64,
//!                     src: 0,
//!                     dst: 1,
//!                     slot_demand: 1,
//!                     holding_time: 100.0,
//!                 })
//!                 .collect(),
//!         ),
//!     };
//!
//!     let mut sim = scenario.build()?;
//!     sim.run()?;
//!
//!     let snapshot = sim.snapshot();
//!     assert_eq!(snapshot.outcomes.admitted, 4);
//!     assert_eq!(snapshot.outcomes.blocked, 1);
//!     Ok(())
//! }
//! ```

pub mod disaster;
pub mod event;
pub mod isp;
pub mod metrics;
pub mod paths;
pub mod policies;
pub mod prelude;
pub mod request;
pub mod scenario;
pub mod scheduler;
pub mod spectrum;
pub mod topology;
pub mod traffic;
pub mod types;

#[cfg(test)]
mod test;

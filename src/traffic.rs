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

//! Arrival generation.
//!
//! Arrivals either replay a materialized request list or are drawn on the fly from a seeded
//! Poisson process: exponential interarrival gaps at rate lambda, exponential holding times
//! with mean mu, a weighted slot-demand distribution, and a uniformly random ordered pair of
//! distinct nodes. Each draw consumes the rng in a fixed order, so the same seed always
//! produces the same request sequence. There is no coroutine behind this; the scheduler asks
//! for the next arrival whenever the previous one is handled.

use std::collections::HashMap;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Exp;

use crate::request::{Request, TrafficClass};
use crate::types::{ConfigError, IspId, NodeId, RequestId, SimTime};

/// Where arrivals come from.
#[derive(Debug, Clone)]
pub enum TrafficSource {
    /// Replay a pre-materialized list, already sorted by arrival time.
    Replay {
        /// The materialized requests.
        requests: Vec<Request>,
        /// Index of the next request to emit.
        next: usize,
    },
    /// Draw arrivals from a seeded Poisson process.
    Poisson(PoissonTraffic),
}

/// Seeded on-the-fly arrival generator.
#[derive(Debug, Clone)]
pub struct PoissonTraffic {
    rng: StdRng,
    interarrival: Exp<f64>,
    holding: Exp<f64>,
    demands: Vec<usize>,
    demand_weights: WeightedIndex<f64>,
    nodes: Vec<NodeId>,
    remaining: u64,
}

impl PoissonTraffic {
    /// Create a generator emitting `count` requests. `nodes` must be the graph's nodes in index
    /// order; `demands` pairs each slot demand with its relative weight.
    pub fn new(
        arrival_rate: f64,
        mean_holding: f64,
        demands: &[(usize, f64)],
        nodes: Vec<NodeId>,
        count: u64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if !(arrival_rate.is_finite() && arrival_rate > 0.0) {
            return Err(ConfigError::InvalidDistribution(format!(
                "arrival rate {arrival_rate} must be positive"
            )));
        }
        if !(mean_holding.is_finite() && mean_holding > 0.0) {
            return Err(ConfigError::InvalidDistribution(format!(
                "mean holding time {mean_holding} must be positive"
            )));
        }
        if nodes.len() < 2 {
            return Err(ConfigError::InvalidDistribution(
                "traffic needs at least two nodes".to_string(),
            ));
        }
        let interarrival = Exp::new(arrival_rate)
            .map_err(|_| ConfigError::InvalidDistribution("arrival rate".to_string()))?;
        let holding = Exp::new(1.0 / mean_holding)
            .map_err(|_| ConfigError::InvalidDistribution("holding time".to_string()))?;
        let demand_weights = WeightedIndex::new(demands.iter().map(|(_, w)| *w))
            .map_err(|e| ConfigError::InvalidDistribution(e.to_string()))?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            interarrival,
            holding,
            demands: demands.iter().map(|(d, _)| *d).collect(),
            demand_weights,
            nodes,
            remaining: count,
        })
    }
}

impl TrafficSource {
    /// Produce the next request, or `None` once the configured arrival count is exhausted. The
    /// owning ISP is resolved through `isp_of`, the node-to-ISP map of the scenario.
    pub(crate) fn next_arrival(
        &mut self,
        now: SimTime,
        id: RequestId,
        isp_of: &HashMap<NodeId, IspId>,
    ) -> Option<Request> {
        match self {
            TrafficSource::Replay { requests, next } => {
                let req = requests.get(*next)?.clone();
                *next += 1;
                Some(req)
            }
            TrafficSource::Poisson(gen) => {
                if gen.remaining == 0 {
                    return None;
                }
                gen.remaining -= 1;
                let gap: f64 = gen.interarrival.sample(&mut gen.rng);
                let src_idx = gen.rng.gen_range(0..gen.nodes.len());
                // draw the destination among the remaining nodes, keeping the pair distinct
                let mut dst_idx = gen.rng.gen_range(0..gen.nodes.len() - 1);
                if dst_idx >= src_idx {
                    dst_idx += 1;
                }
                let demand_idx = gen.demand_weights.sample(&mut gen.rng);
                let holding: f64 = gen.holding.sample(&mut gen.rng);

                let src = gen.nodes[src_idx];
                let dst = gen.nodes[dst_idx];
                let isp = isp_of.get(&src).copied().unwrap_or(IspId(0));
                Some(Request::new(
                    id,
                    src,
                    dst,
                    gen.demands[demand_idx],
                    holding,
                    TrafficClass::Datapath,
                    isp,
                    now + gap,
                ))
            }
        }
    }

    /// How many arrivals this source will still emit.
    pub fn remaining(&self) -> u64 {
        match self {
            TrafficSource::Replay { requests, next } => (requests.len() - next) as u64,
            TrafficSource::Poisson(gen) => gen.remaining,
        }
    }
}

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

//! Convenience re-export of common members.

pub use crate::metrics::{Metrics, MetricsSnapshot};
pub use crate::policies::{Outcome, RoutingPolicy};
pub use crate::request::{BlockReason, Request, RequestStatus, TrafficClass};
pub use crate::scenario::{
    DisasterSpec, GraphSpec, IspSpec, LinkSpec, RequestSpec, Scenario, TrafficSpec,
};
pub use crate::scheduler::Simulator;
pub use crate::types::{
    ConfigError, IspId, LinkId, NodeId, RequestId, SimTime, SimulationError, SpectrumWindow,
};

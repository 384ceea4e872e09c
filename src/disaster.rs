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

//! The disaster lifecycle.
//!
//! The failure timeline is fixed at construction, either from an explicit schedule or generated
//! from (epicenter, radius, seed). Replaying the same scenario therefore yields the identical
//! disruption sequence. The full schedule counts as announced the moment the disaster starts:
//! a reacted ISP avoids every resource on the timeline, including those that have not failed
//! yet. Failures are *applied* in timestamp order as the scheduler reaches them, marking the
//! resource failed in the topology and disrupting the active requests crossing it. When the
//! clock passes the end of the disaster, the damaged resources are restored and the announced
//! set is emptied.

use std::collections::HashSet;

use log::{debug, warn};
use ordered_float::NotNan;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp1};
use serde::{Deserialize, Serialize};

use crate::paths::Path;
use crate::topology::Topology;
use crate::types::{LinkId, NodeId, SimTime};

/// A resource taken down by the disaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailedResource {
    /// A single link fails.
    Link(LinkId),
    /// A node fails, taking every incident link with it.
    Node(NodeId),
}

/// One entry of the failure timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// The failing resource.
    pub resource: FailedResource,
    /// When the failure is applied.
    pub time: SimTime,
}

/// A localized disaster with a precomputed failure timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disaster {
    epicenter: NodeId,
    start: SimTime,
    end: SimTime,
    timeline: Vec<Failure>,
    announced_nodes: HashSet<NodeId>,
    announced_links: HashSet<LinkId>,
}

impl Disaster {
    /// Create a disaster from an explicit failure schedule. The timeline is sorted by
    /// (timestamp, resource) so that replays observe the identical order.
    pub fn from_schedule(
        epicenter: NodeId,
        start: SimTime,
        end: SimTime,
        mut timeline: Vec<Failure>,
    ) -> Self {
        timeline.sort_by_key(|f| (f.time, resource_order(f.resource)));
        Self::with_timeline(epicenter, start, end, timeline)
    }

    /// Generate the failure timeline from the epicenter and a radius measured in weighted graph
    /// distance. Every node within the radius fails, as does every link with an endpoint within
    /// the radius. The disaster spreads outward: resources are ordered by their distance from
    /// the epicenter, and the failure times grow monotonically within `[start, end)` with
    /// seeded exponential increments.
    pub fn generate(
        topo: &Topology,
        epicenter: NodeId,
        radius: f64,
        start: SimTime,
        end: SimTime,
        seed: u64,
    ) -> Self {
        let distances = topo.distances_from(epicenter);
        let graph = topo.graph();

        // collect affected resources with their spreading key
        let mut resources: Vec<(NotNan<f64>, FailedResource)> = Vec::new();
        for node in graph.node_indices() {
            if let Some(d) = distances.get(&node) {
                if *d <= radius {
                    let key = NotNan::new(*d).unwrap_or_default();
                    resources.push((key, FailedResource::Node(node)));
                }
            }
        }
        for edge in graph.edge_references() {
            let da = distances.get(&edge.source()).copied();
            let db = distances.get(&edge.target()).copied();
            let near = match (da, db) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => continue,
            };
            if near <= radius {
                let key = NotNan::new(near).unwrap_or_default();
                resources.push((key, FailedResource::Link(edge.id())));
            }
        }
        resources.sort_by_key(|(key, r)| (*key, resource_order(*r)));

        if resources.is_empty() {
            warn!("disaster at node {} affects no resources", epicenter.index());
        }

        // monotone failure times within [start, end)
        let mut rng = StdRng::seed_from_u64(seed);
        let increments: Vec<f64> = (0..resources.len() + 1)
            .map(|_| Exp1.sample(&mut rng))
            .collect();
        let total: f64 = increments.iter().sum();
        let duration = end.into_inner() - start.into_inner();

        let mut timeline = Vec::with_capacity(resources.len());
        let mut acc = 0.0;
        for ((_, resource), inc) in resources.into_iter().zip(&increments) {
            acc += inc;
            let time = start.into_inner() + duration * acc / total;
            timeline.push(Failure {
                resource,
                time: NotNan::new(time).unwrap_or(start),
            });
        }

        Self::with_timeline(epicenter, start, end, timeline)
    }

    /// The announced failure set is the whole timeline, known from the start.
    fn with_timeline(
        epicenter: NodeId,
        start: SimTime,
        end: SimTime,
        timeline: Vec<Failure>,
    ) -> Self {
        let mut announced_nodes = HashSet::new();
        let mut announced_links = HashSet::new();
        for failure in &timeline {
            match failure.resource {
                FailedResource::Link(l) => {
                    announced_links.insert(l);
                }
                FailedResource::Node(n) => {
                    announced_nodes.insert(n);
                }
            }
        }
        Self {
            epicenter,
            start,
            end,
            timeline,
            announced_nodes,
            announced_links,
        }
    }

    /// The node at the center of the disaster.
    pub fn epicenter(&self) -> NodeId {
        self.epicenter
    }

    /// When the disaster starts.
    pub fn start(&self) -> SimTime {
        self.start
    }

    /// When the disaster ends and resources are restored.
    pub fn end(&self) -> SimTime {
        self.end
    }

    /// The full failure timeline, in application order.
    pub fn timeline(&self) -> &[Failure] {
        &self.timeline
    }

    /// The nodes announced as failing, until the disaster ends.
    pub fn announced_nodes(&self) -> &HashSet<NodeId> {
        &self.announced_nodes
    }

    /// The links announced as failing, until the disaster ends.
    pub fn announced_links(&self) -> &HashSet<LinkId> {
        &self.announced_links
    }

    /// Check that the path crosses no announced resource. A path through a node announced as
    /// failing is unsafe even if the node's incident links are not listed individually.
    pub fn is_path_safe(&self, path: &Path) -> bool {
        path.nodes()
            .iter()
            .all(|n| !self.announced_nodes.contains(n))
            && path
                .links()
                .iter()
                .all(|l| !self.announced_links.contains(l))
    }

    /// Apply the timeline entry at `index`: mark the resource failed in the topology. A node
    /// failure also takes down every incident link. Applying the same entry twice has no
    /// further effect.
    pub(crate) fn announce(&mut self, index: usize, topo: &mut Topology) -> Option<FailedResource> {
        let failure = *self.timeline.get(index)?;
        match failure.resource {
            FailedResource::Link(link) => {
                debug!("disaster: link {link:?} fails at t={}", failure.time);
                topo.fail_link(link);
            }
            FailedResource::Node(node) => {
                debug!("disaster: node {} fails at t={}", node.index(), failure.time);
                topo.fail_node(node);
            }
        }
        Some(failure.resource)
    }

    /// The disaster is over: forget the announced failures. The topology restores its failure
    /// marks separately.
    pub(crate) fn restore(&mut self) {
        debug!("disaster over, resources restored");
        self.announced_nodes.clear();
        self.announced_links.clear();
    }
}

/// Deterministic ordering of resources with equal keys: links before nodes, then by index.
fn resource_order(r: FailedResource) -> (u8, usize) {
    match r {
        FailedResource::Link(l) => (0, l.index()),
        FailedResource::Node(n) => (1, n.index()),
    }
}

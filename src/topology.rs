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

//! # Topology
//!
//! The topology owns the fiber graph, the spectrum grid, the path catalogue, and the failure
//! marks. It is the single admission gate: [`Topology::try_allocate`] is the only way spectrum
//! becomes occupied, and it either occupies the full window on every link of the path or leaves
//! the grid untouched. Failing a resource never releases existing allocations; disruption
//! accounting is the disaster subsystem's job.

use std::collections::{BinaryHeap, HashMap, HashSet};

use log::trace;
use ordered_float::NotNan;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::paths::{Path, PathCatalogue};
use crate::spectrum::SpectrumGrid;
use crate::types::{
    ConfigError, EonGraph, LinkId, LinkWeight, NodeId, SimulationError, SpectrumWindow,
};

/// Fiber topology with per-link spectrum bookkeeping and failure marks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    graph: EonGraph,
    grid: SpectrumGrid,
    catalogue: PathCatalogue,
    failed_nodes: HashSet<NodeId>,
    failed_links: HashSet<LinkId>,
}

impl Topology {
    /// Build a topology from a graph, the grid size, and the catalogue depth. The catalogue is
    /// precomputed here for all node pairs and stays immutable for the rest of the run.
    pub fn new(graph: EonGraph, num_slots: usize, k_paths: usize) -> Result<Self, ConfigError> {
        if graph.node_count() == 0 || graph.edge_count() == 0 {
            return Err(ConfigError::EmptyGraph);
        }
        if num_slots == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let grid = SpectrumGrid::new(num_slots, graph.edge_indices());
        let catalogue = PathCatalogue::build(&graph, k_paths);
        Ok(Self {
            graph,
            grid,
            catalogue,
            failed_nodes: HashSet::new(),
            failed_links: HashSet::new(),
        })
    }

    /// Reference to the underlying graph.
    pub fn graph(&self) -> &EonGraph {
        &self.graph
    }

    /// Reference to the spectrum grid, for read-only free-run analysis by the policies.
    pub fn grid(&self) -> &SpectrumGrid {
        &self.grid
    }

    /// The number of spectrum slots per link.
    pub fn num_slots(&self) -> usize {
        self.grid.num_slots()
    }

    /// The catalogued paths between `src` and `dst`, shortest first.
    pub fn paths(&self, src: NodeId, dst: NodeId) -> &[Path] {
        self.catalogue.paths(src, dst)
    }

    /// Look up the link between two adjacent nodes.
    pub fn link_between(&self, a: NodeId, b: NodeId) -> Option<LinkId> {
        self.graph.find_edge(a, b)
    }

    /// Try to occupy `window` on every link of `path`. Returns `true` and occupies the slots if
    /// the path is usable and every slot of the window is free on every link; otherwise returns
    /// `false` and leaves the grid unchanged. No partial allocation is ever visible.
    pub fn try_allocate(&mut self, path: &Path, window: SpectrumWindow) -> bool {
        if !self.is_usable(path) {
            return false;
        }
        if !self.grid.window_is_free(path.links(), window) {
            return false;
        }
        self.grid.occupy(path.links(), window);
        trace!("allocated {window} on {path}");
        true
    }

    /// Free `window` on every link of `path`. The slots must be occupied by this exact
    /// allocation; releasing anything else is a fatal invariant violation.
    pub fn release(&mut self, path: &Path, window: SpectrumWindow) -> Result<(), SimulationError> {
        self.grid.release(path.links(), window)?;
        trace!("released {window} on {path}");
        Ok(())
    }

    /// Check that no node and no link of the path is marked failed.
    pub fn is_usable(&self, path: &Path) -> bool {
        path.nodes().iter().all(|n| !self.failed_nodes.contains(n))
            && path.links().iter().all(|l| !self.failed_links.contains(l))
    }

    /// Mark a link as failed. Existing allocations on the link are not released.
    pub fn fail_link(&mut self, link: LinkId) {
        self.failed_links.insert(link);
    }

    /// Mark a node as failed, along with every incident link.
    pub fn fail_node(&mut self, node: NodeId) {
        self.failed_nodes.insert(node);
        let incident: Vec<LinkId> = self.graph.edges(node).map(|e| e.id()).collect();
        self.failed_links.extend(incident);
    }

    /// Check whether a link is marked failed.
    pub fn is_link_failed(&self, link: LinkId) -> bool {
        self.failed_links.contains(&link)
    }

    /// Check whether a node is marked failed.
    pub fn is_node_failed(&self, node: NodeId) -> bool {
        self.failed_nodes.contains(&node)
    }

    /// Clear every failure mark. Called when the disaster interval ends and the damaged
    /// resources come back into service.
    pub fn restore_all(&mut self) {
        self.failed_nodes.clear();
        self.failed_links.clear();
    }

    /// Weighted shortest-path distance from `origin` to every reachable node. Used to place
    /// migration destinations and to resolve the disaster radius.
    pub fn distances_from(&self, origin: NodeId) -> HashMap<NodeId, LinkWeight> {
        let mut dist: HashMap<NodeId, NotNan<f64>> = HashMap::new();
        let mut heap: BinaryHeap<std::cmp::Reverse<(NotNan<f64>, NodeId)>> = BinaryHeap::new();
        let zero = NotNan::default();
        dist.insert(origin, zero);
        heap.push(std::cmp::Reverse((zero, origin)));
        while let Some(std::cmp::Reverse((d, u))) = heap.pop() {
            if dist.get(&u).map(|best| d > *best).unwrap_or(true) {
                continue;
            }
            for edge in self.graph.edges(u) {
                let v = if edge.source() == u {
                    edge.target()
                } else {
                    edge.source()
                };
                let w = match NotNan::new(*edge.weight()) {
                    Ok(w) => w,
                    Err(_) => continue,
                };
                let nd = d + w;
                if dist.get(&v).map(|best| nd < *best).unwrap_or(true) {
                    dist.insert(v, nd);
                    heap.push(std::cmp::Reverse((nd, v)));
                }
            }
        }
        dist.into_iter().map(|(n, d)| (n, d.into_inner())).collect()
    }
}

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

//! Simple paths and the precomputed K-shortest-path catalogue.
//!
//! The catalogue is built once per topology with Yen's algorithm (Dijkstra as the inner
//! shortest-path routine) and never mutated afterwards, not even when a disaster disables
//! resources. Disaster-aware policies filter the catalogue at routing time instead. Paths are
//! ordered ascending by total physical length; equal-length paths are ordered by their node-id
//! sequence so that two runs over the same scenario always see the same catalogue.

use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use itertools::Itertools;
use ordered_float::NotNan;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_with::{As, Same};

use crate::types::{EonGraph, LinkId, LinkWeight, NodeId, SimulationError};

/// An ordered sequence of vertices forming a simple path, together with the traversed links and
/// the total physical length. Paths are immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    nodes: Vec<NodeId>,
    links: Vec<LinkId>,
    length: LinkWeight,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for Path {}

impl Path {
    /// Build a path from a vertex sequence, resolving the traversed links against the graph.
    pub fn from_nodes(graph: &EonGraph, nodes: Vec<NodeId>) -> Result<Self, SimulationError> {
        let mut links = Vec::with_capacity(nodes.len().saturating_sub(1));
        let mut length = 0.0;
        for w in nodes.windows(2) {
            let link = graph
                .find_edge(w[0], w[1])
                .ok_or(SimulationError::LinkNotFound(w[0], w[1]))?;
            length += graph
                .edge_weight(link)
                .copied()
                .ok_or(SimulationError::LinkNotFound(w[0], w[1]))?;
            links.push(link);
        }
        Ok(Self {
            nodes,
            links,
            length,
        })
    }

    /// The vertex sequence of the path.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The links traversed by the path, in order.
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Total physical length of the path.
    pub fn length(&self) -> LinkWeight {
        self.length
    }

    /// First vertex of the path.
    pub fn src(&self) -> NodeId {
        self.nodes[0]
    }

    /// Last vertex of the path.
    pub fn dst(&self) -> NodeId {
        *self.nodes.last().unwrap_or(&self.nodes[0])
    }

    /// Check whether the path visits the given node.
    pub fn crosses_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Check whether the path traverses the given link.
    pub fn crosses_link(&self, link: LinkId) -> bool {
        self.links.contains(&link)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nodes.iter().map(|n| n.index()).join(" -> "))
    }
}

/// Dense catalogue of the K shortest loopless paths for every ordered node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCatalogue {
    k: usize,
    #[serde(with = "As::<Vec<(Same, Same)>>")]
    paths: HashMap<(NodeId, NodeId), Vec<Path>>,
}

impl PathCatalogue {
    /// Precompute the catalogue for all ordered pairs of nodes in the graph.
    pub fn build(graph: &EonGraph, k: usize) -> Self {
        let nodes: Vec<NodeId> = graph.node_indices().collect();
        let mut paths = HashMap::new();
        for &src in &nodes {
            for &dst in &nodes {
                if src == dst {
                    continue;
                }
                let found = yen_k_shortest(graph, src, dst, k);
                if !found.is_empty() {
                    paths.insert((src, dst), found);
                }
            }
        }
        Self { k, paths }
    }

    /// The number of paths computed per pair.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The catalogued paths between `src` and `dst`, shortest first. Returns an empty slice if
    /// `src == dst` or the pair is disconnected.
    pub fn paths(&self, src: NodeId, dst: NodeId) -> &[Path] {
        self.paths
            .get(&(src, dst))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Yen's K shortest loopless paths. Candidates are kept in a set ordered by (cost, vertex
/// sequence), and the final list is sorted the same way, which fixes the tie-breaking order.
fn yen_k_shortest(graph: &EonGraph, src: NodeId, dst: NodeId, k: usize) -> Vec<Path> {
    let no_nodes: HashSet<NodeId> = HashSet::new();
    let no_links: HashSet<LinkId> = HashSet::new();

    let mut chosen: Vec<(NotNan<f64>, Vec<NodeId>)> = Vec::new();
    match dijkstra(graph, src, dst, &no_nodes, &no_links) {
        Some(first) => chosen.push(first),
        None => return Vec::new(),
    }

    let mut candidates: BTreeSet<(NotNan<f64>, Vec<NodeId>)> = BTreeSet::new();

    while chosen.len() < k {
        let prev = &chosen[chosen.len() - 1].1;
        for i in 0..prev.len() - 1 {
            let spur = prev[i];
            let root = &prev[..=i];

            // ban every edge that would reproduce an already chosen path with this root
            let mut banned_links: HashSet<LinkId> = HashSet::new();
            for (_, p) in &chosen {
                if p.len() > i + 1 && p[..=i] == *root {
                    if let Some(e) = graph.find_edge(p[i], p[i + 1]) {
                        banned_links.insert(e);
                    }
                }
            }
            // ban the root nodes except the spur itself, keeping the result loopless
            let banned_nodes: HashSet<NodeId> = root[..i].iter().copied().collect();

            if let Some((spur_cost, spur_nodes)) =
                dijkstra(graph, spur, dst, &banned_nodes, &banned_links)
            {
                let mut nodes: Vec<NodeId> = root[..i].to_vec();
                nodes.extend(spur_nodes);
                let cost = prefix_cost(graph, &nodes[..=i]) + spur_cost;
                if !chosen.iter().any(|(_, p)| *p == nodes) {
                    candidates.insert((cost, nodes));
                }
            }
        }
        match candidates.pop_first() {
            Some(best) => chosen.push(best),
            None => break,
        }
    }

    chosen.sort();
    chosen
        .into_iter()
        .filter_map(|(_, nodes)| Path::from_nodes(graph, nodes).ok())
        .collect()
}

/// Sum of edge weights along a vertex prefix.
fn prefix_cost(graph: &EonGraph, nodes: &[NodeId]) -> NotNan<f64> {
    let mut cost = 0.0;
    for w in nodes.windows(2) {
        if let Some(e) = graph.find_edge(w[0], w[1]) {
            cost += graph.edge_weight(e).copied().unwrap_or(0.0);
        }
    }
    NotNan::new(cost).unwrap_or_default()
}

/// Dijkstra with predecessor tracking, avoiding the banned nodes and links. Returns the cost and
/// vertex sequence of the shortest path, or `None` if `dst` is unreachable. The heap is keyed by
/// (distance, node index), which makes the expansion order deterministic.
fn dijkstra(
    graph: &EonGraph,
    src: NodeId,
    dst: NodeId,
    banned_nodes: &HashSet<NodeId>,
    banned_links: &HashSet<LinkId>,
) -> Option<(NotNan<f64>, Vec<NodeId>)> {
    if banned_nodes.contains(&src) || banned_nodes.contains(&dst) {
        return None;
    }

    let mut dist: HashMap<NodeId, NotNan<f64>> = HashMap::new();
    let mut pred: HashMap<NodeId, NodeId> = HashMap::new();
    let mut heap: BinaryHeap<std::cmp::Reverse<(NotNan<f64>, NodeId)>> = BinaryHeap::new();

    let zero = NotNan::default();
    dist.insert(src, zero);
    heap.push(std::cmp::Reverse((zero, src)));

    while let Some(std::cmp::Reverse((d, u))) = heap.pop() {
        if dist.get(&u).map(|best| d > *best).unwrap_or(true) {
            continue;
        }
        if u == dst {
            break;
        }
        for edge in graph.edges(u) {
            if banned_links.contains(&edge.id()) {
                continue;
            }
            let v = if edge.source() == u {
                edge.target()
            } else {
                edge.source()
            };
            if banned_nodes.contains(&v) {
                continue;
            }
            let w = match NotNan::new(*edge.weight()) {
                Ok(w) => w,
                Err(_) => continue,
            };
            let nd = d + w;
            if dist.get(&v).map(|best| nd < *best).unwrap_or(true) {
                dist.insert(v, nd);
                pred.insert(v, u);
                heap.push(std::cmp::Reverse((nd, v)));
            }
        }
    }

    let cost = *dist.get(&dst)?;
    let mut nodes = vec![dst];
    let mut cur = dst;
    while cur != src {
        cur = *pred.get(&cur)?;
        nodes.push(cur);
    }
    nodes.reverse();
    Some((cost, nodes))
}

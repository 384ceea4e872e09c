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

//! Test allocation, release, and failure marking on the topology.

use pretty_assertions::assert_eq;

use crate::paths::Path;
use crate::topology::Topology;
use crate::types::{ConfigError, EonGraph, NodeId, SpectrumWindow};

/// A -- B -- C with unit weights and 8 slots.
fn line() -> (Topology, [NodeId; 3]) {
    let mut g = EonGraph::default();
    let a = g.add_node(());
    let b = g.add_node(());
    let c = g.add_node(());
    g.add_edge(a, b, 1.0);
    g.add_edge(b, c, 1.0);
    (Topology::new(g, 8, 5).unwrap(), [a, b, c])
}

fn w(start: usize, width: usize) -> SpectrumWindow {
    SpectrumWindow::new(start, width)
}

#[test]
fn empty_graphs_are_rejected() {
    assert_eq!(
        Topology::new(EonGraph::default(), 8, 5).err(),
        Some(ConfigError::EmptyGraph)
    );
    let mut g = EonGraph::default();
    g.add_node(());
    g.add_node(());
    assert_eq!(Topology::new(g, 8, 5).err(), Some(ConfigError::EmptyGraph));
}

#[test]
fn allocation_is_atomic() {
    let (mut topo, [a, b, c]) = line();
    let full = topo.paths(a, c)[0].clone();
    let tail = Path::from_nodes(topo.graph(), vec![b, c]).unwrap();

    // occupy slots 2..4 on the tail link only
    assert!(topo.try_allocate(&tail, w(2, 2)));
    // the full path cannot take the window, and the head link stays untouched
    assert!(!topo.try_allocate(&full, w(2, 2)));
    let head_link = topo.link_between(a, b).unwrap();
    assert!(!topo.grid().is_occupied(head_link, 2));
    assert!(!topo.grid().is_occupied(head_link, 3));
    // a disjoint window still fits
    assert!(topo.try_allocate(&full, w(4, 2)));
}

#[test]
fn release_then_reallocate_is_a_no_op_on_the_grid() {
    let (mut topo, [a, _, c]) = line();
    let path = topo.paths(a, c)[0].clone();
    let links = path.links().to_vec();

    assert!(topo.try_allocate(&path, w(0, 3)));
    let occupied: Vec<_> = topo.grid().free_runs(&links, 0..8);
    topo.release(&path, w(0, 3)).unwrap();
    assert!(topo.try_allocate(&path, w(0, 3)));
    assert_eq!(topo.grid().free_runs(&links, 0..8), occupied);
}

#[test]
fn releasing_unheld_slots_is_fatal() {
    let (mut topo, [a, _, c]) = line();
    let path = topo.paths(a, c)[0].clone();
    assert!(topo.release(&path, w(0, 1)).is_err());
}

#[test]
fn failed_links_refuse_allocations_but_keep_existing_ones() {
    let (mut topo, [a, b, c]) = line();
    let path = topo.paths(a, c)[0].clone();
    assert!(topo.try_allocate(&path, w(0, 2)));

    let link = topo.link_between(b, c).unwrap();
    topo.fail_link(link);
    assert!(!topo.is_usable(&path));
    assert!(!topo.try_allocate(&path, w(4, 2)));
    // the existing allocation is not auto-released
    assert!(topo.grid().is_occupied(link, 0));
    // releasing it afterwards still works
    topo.release(&path, w(0, 2)).unwrap();
}

#[test]
fn failing_a_node_takes_its_incident_links() {
    let (mut topo, [a, b, c]) = line();
    topo.fail_node(b);
    assert!(topo.is_node_failed(b));
    assert!(topo.is_link_failed(topo.link_between(a, b).unwrap()));
    assert!(topo.is_link_failed(topo.link_between(b, c).unwrap()));

    topo.restore_all();
    assert!(!topo.is_node_failed(b));
    let path = topo.paths(a, c)[0].clone();
    assert!(topo.is_usable(&path));
    assert!(topo.try_allocate(&path, w(0, 1)));
}

#[test]
fn weighted_distances() {
    let (topo, [a, b, c]) = line();
    let dist = topo.distances_from(a);
    assert_eq!(dist.get(&a), Some(&0.0));
    assert_eq!(dist.get(&b), Some(&1.0));
    assert_eq!(dist.get(&c), Some(&2.0));
}

// src/model/network.rs

use crate::error::{Result, SimError};
use crate::model::demand::DemandGenerator;
use crate::model::node::Node;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use tracing::{debug, warn};

/// Position of a node in the graph's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position of an edge in the graph's edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(usize);

impl EdgeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A directed transport link. Goods flow from `from` to `to`.
#[derive(Debug, Clone)]
pub struct Edge {
    from: NodeIndex,
    to: NodeIndex,
    /// Transit time in days.
    pub lead_time: f64,
    /// Maximum flow in units, if constrained.
    pub capacity: Option<f64>,
}

impl Edge {
    pub fn from(&self) -> NodeIndex {
        self.from
    }

    pub fn to(&self) -> NodeIndex {
        self.to
    }
}

/// The path used for a lead-time query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkPath {
    pub nodes: Vec<String>,
    pub lead_time: f64,
}

/// Original capacities of the edges touched by a capacity disruption.
#[derive(Debug, Clone)]
#[must_use = "dropping the token loses the capacities needed to restore the network"]
pub struct CapacityRestore {
    node_id: String,
    original: Vec<(EdgeIndex, Option<f64>)>,
}

impl CapacityRestore {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Follow edges in the direction of goods flow.
    Downstream,
    /// Follow edges against the flow.
    Upstream,
}

/// Directed supply-chain network with lead-time weighted edges.
///
/// Nodes and edges live in arenas and are referenced by index, so the graph
/// can be shared read-only across simulation workers.
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIndex>>,
    incoming: Vec<Vec<EdgeIndex>>,
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Fails with `DuplicateNode` if the identifier is taken.
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex> {
        if self.index.contains_key(node.id()) {
            return Err(SimError::DuplicateNode(node.id().to_string()));
        }

        let idx = NodeIndex(self.nodes.len());
        debug!(node = node.id(), role = %node.role, "Adding node");
        self.index.insert(node.id().to_string(), idx);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(idx)
    }

    /// Adds a directed edge `from -> to`.
    ///
    /// Connecting an already connected pair replaces the existing edge's
    /// lead time and capacity.
    pub fn add_edge(
        &mut self,
        from_id: &str,
        to_id: &str,
        lead_time: f64,
        capacity: Option<f64>,
    ) -> Result<EdgeIndex> {
        let from = self.node_index(from_id)?;
        let to = self.node_index(to_id)?;

        if from == to {
            return Err(SimError::invalid(format!("self-loop on node {from_id}")));
        }
        if !(lead_time.is_finite() && lead_time >= 0.0) {
            return Err(SimError::invalid(format!(
                "lead time must be non-negative, got {lead_time}"
            )));
        }
        if let Some(cap) = capacity {
            if !(cap.is_finite() && cap >= 0.0) {
                return Err(SimError::invalid(format!(
                    "capacity must be non-negative, got {cap}"
                )));
            }
        }

        if let Some(existing) = self.edge_between(from, to) {
            warn!(from = from_id, to = to_id, lead_time, "Replacing existing edge");
            let edge = &mut self.edges[existing.0];
            edge.lead_time = lead_time;
            edge.capacity = capacity;
            return Ok(existing);
        }

        let idx = EdgeIndex(self.edges.len());
        debug!(from = from_id, to = to_id, lead_time, ?capacity, "Adding edge");
        self.edges.push(Edge {
            from,
            to,
            lead_time,
            capacity,
        });
        self.outgoing[from.0].push(idx);
        self.incoming[to.0].push(idx);
        Ok(idx)
    }

    pub fn node_index(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| SimError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Result<&Node> {
        let idx = self.node_index(id)?;
        Ok(&self.nodes[idx.0])
    }

    pub fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        let idx = self.node_index(id)?;
        Ok(&mut self.nodes[idx.0])
    }

    pub fn node_at(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_at(&self, idx: EdgeIndex) -> &Edge {
        &self.edges[idx.0]
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        (0..self.edges.len()).map(EdgeIndex)
    }

    /// The edge `from -> to`, if the pair is connected.
    pub fn edge(&self, from_id: &str, to_id: &str) -> Result<Option<&Edge>> {
        let from = self.node_index(from_id)?;
        let to = self.node_index(to_id)?;
        Ok(self.edge_between(from, to).map(|idx| &self.edges[idx.0]))
    }

    pub(crate) fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
        self.outgoing[from.0]
            .iter()
            .copied()
            .find(|&e| self.edges[e.0].to == to)
    }

    /// Identifiers of an edge's endpoints.
    pub fn endpoint_ids(&self, idx: EdgeIndex) -> (&str, &str) {
        let edge = &self.edges[idx.0];
        (self.nodes[edge.from.0].id(), self.nodes[edge.to.0].id())
    }

    pub(crate) fn incident_edges(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.incoming[idx.0]
            .iter()
            .chain(self.outgoing[idx.0].iter())
            .copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Replaces (or installs) the demand generator of a node.
    pub fn set_demand(&mut self, id: &str, demand: DemandGenerator) -> Result<()> {
        let node = self.node_mut(id)?;
        debug!(node = id, mean = demand.mean(), std_dev = demand.std_dev(), "Setting demand");
        node.demand = Some(demand);
        Ok(())
    }

    /// Nodes that carry a demand generator, in insertion order.
    pub fn demand_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.demand.is_some())
            .map(|(i, _)| NodeIndex(i))
            .collect()
    }

    /// Total lead time along the quickest path from `from_id` to `to_id`.
    pub fn path_lead_time(&self, from_id: &str, to_id: &str) -> Result<f64> {
        self.shortest_path(from_id, to_id).map(|path| path.lead_time)
    }

    /// The quickest path by lead time. When several paths tie, the one
    /// discovered first wins.
    pub fn shortest_path(&self, from_id: &str, to_id: &str) -> Result<NetworkPath> {
        let from = self.node_index(from_id)?;
        let to = self.node_index(to_id)?;

        let tree = self.shortest_lead_times(from, Direction::Downstream, &|e| {
            self.edges[e.0].lead_time
        });

        let Some((lead_time, _)) = tree[to.0] else {
            return Err(SimError::NoPath {
                from: from_id.to_string(),
                to: to_id.to_string(),
            });
        };

        // Walk predecessor edges back to the source.
        let mut path = vec![to];
        let mut cursor = to;
        while let Some((_, Some(edge))) = tree[cursor.0] {
            cursor = self.edges[edge.0].from;
            path.push(cursor);
        }
        path.reverse();

        Ok(NetworkPath {
            nodes: path.into_iter().map(|i| self.nodes[i.0].id().to_string()).collect(),
            lead_time,
        })
    }

    /// Identifiers of all nodes with a directed path into `id`.
    pub fn upstream_nodes(&self, id: &str) -> Result<Vec<String>> {
        let idx = self.node_index(id)?;
        Ok(self.ids(self.reachable(idx, Direction::Upstream)))
    }

    /// Identifiers of all nodes reachable from `id`.
    pub fn downstream_nodes(&self, id: &str) -> Result<Vec<String>> {
        let idx = self.node_index(id)?;
        Ok(self.ids(self.reachable(idx, Direction::Downstream)))
    }

    /// Longest of the quickest lead times from any upstream node into `id`.
    /// A node without upstream nodes has zero network lead time.
    pub fn upstream_lead_time(&self, id: &str) -> Result<f64> {
        let idx = self.node_index(id)?;
        Ok(self.upstream_lead_time_at(idx))
    }

    pub(crate) fn upstream_lead_time_at(&self, idx: NodeIndex) -> f64 {
        self.upstream_lead_time_with(idx, &|e| self.edges[e.0].lead_time)
    }

    pub(crate) fn upstream_lead_time_with(
        &self,
        idx: NodeIndex,
        weight: &dyn Fn(EdgeIndex) -> f64,
    ) -> f64 {
        self.shortest_lead_times(idx, Direction::Upstream, weight)
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx.0)
            .filter_map(|(_, entry)| entry.map(|(dist, _)| dist))
            .fold(0.0, f64::max)
    }

    /// Breadth-first reachability, excluding the start node itself.
    pub(crate) fn reachable(&self, start: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start.0] = true;

        while let Some(current) = queue.pop_front() {
            for &e in self.adjacent(current, direction) {
                let next = self.far_end(e, direction);
                if !seen[next.0] {
                    seen[next.0] = true;
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }

        order
    }

    fn adjacent(&self, idx: NodeIndex, direction: Direction) -> &[EdgeIndex] {
        match direction {
            Direction::Downstream => &self.outgoing[idx.0],
            Direction::Upstream => &self.incoming[idx.0],
        }
    }

    /// The endpoint of `e` reached when travelling in `direction`.
    fn far_end(&self, e: EdgeIndex, direction: Direction) -> NodeIndex {
        let edge = &self.edges[e.0];
        match direction {
            Direction::Downstream => edge.to,
            Direction::Upstream => edge.from,
        }
    }

    /// Single-source Dijkstra over lead-time weights.
    ///
    /// Returns, per node, the best distance and the edge it was reached by
    /// (`None` for the source). Unreached nodes are `None`. Distances only
    /// improve on a strictly shorter path, so the first discovered of several
    /// equal paths is kept.
    pub(crate) fn shortest_lead_times(
        &self,
        source: NodeIndex,
        direction: Direction,
        weight: &dyn Fn(EdgeIndex) -> f64,
    ) -> Vec<Option<(f64, Option<EdgeIndex>)>> {
        let mut best: Vec<Option<(f64, Option<EdgeIndex>)>> = vec![None; self.nodes.len()];
        let mut settled = vec![false; self.nodes.len()];
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;

        best[source.0] = Some((0.0, None));
        heap.push(Frontier {
            dist: 0.0,
            seq,
            node: source,
        });

        while let Some(Frontier { dist, node, .. }) = heap.pop() {
            if settled[node.0] {
                continue;
            }
            settled[node.0] = true;

            for &e in self.adjacent(node, direction) {
                let next = self.far_end(e, direction);
                if settled[next.0] {
                    continue;
                }
                let candidate = dist + weight(e);
                let improves = match best[next.0] {
                    Some((current, _)) => candidate < current,
                    None => true,
                };
                if improves {
                    best[next.0] = Some((candidate, Some(e)));
                    seq += 1;
                    heap.push(Frontier {
                        dist: candidate,
                        seq,
                        node: next,
                    });
                }
            }
        }

        best
    }

    /// Cuts the capacity of every edge touching `id` by `reduction` (0 to 1).
    ///
    /// Edges without a capacity limit are left alone. The returned token
    /// restores the original capacities.
    pub fn apply_capacity_disruption(&mut self, id: &str, reduction: f64) -> Result<CapacityRestore> {
        let idx = self.node_index(id)?;
        if !(0.0..=1.0).contains(&reduction) {
            return Err(SimError::invalid(format!(
                "capacity reduction must be between 0 and 1, got {reduction}"
            )));
        }

        let touched: Vec<EdgeIndex> = self.incident_edges(idx).collect();
        let mut original = Vec::with_capacity(touched.len());
        for e in touched {
            let edge = &mut self.edges[e.0];
            original.push((e, edge.capacity));
            if let Some(cap) = edge.capacity.as_mut() {
                *cap *= 1.0 - reduction;
            }
        }

        debug!(node = id, reduction, edges = original.len(), "Applied capacity disruption");
        Ok(CapacityRestore {
            node_id: id.to_string(),
            original,
        })
    }

    /// Puts back the capacities recorded by [`NetworkGraph::apply_capacity_disruption`].
    pub fn restore_capacity(&mut self, restore: CapacityRestore) {
        for (e, capacity) in restore.original {
            if let Some(edge) = self.edges.get_mut(e.0) {
                edge.capacity = capacity;
            }
        }
        debug!(node = restore.node_id.as_str(), "Restored capacity");
    }

    fn ids(&self, indices: Vec<NodeIndex>) -> Vec<String> {
        indices
            .into_iter()
            .map(|i| self.nodes[i.0].id().to_string())
            .collect()
    }
}

/// Heap entry for Dijkstra: smallest distance first, then earliest discovery.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    dist: f64,
    seq: u64,
    node: NodeIndex,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so both keys are reversed.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

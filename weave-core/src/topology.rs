//! Network topology - the connection graph and structural queries
//!
//! Undirected graph keyed by node id. Edges are stored once under the sorted
//! endpoint pair; each node keeps its own adjacency set. Nodes and adjacency
//! live in ordered maps so every traversal below is deterministic.
//!
//! Queries against unknown ids return `None` or empty results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Node identifier in the topology
pub type NodeId = String;

/// Number of nodes reported in [`TopologyAnalysis::central_nodes`]
pub const TOP_CENTRAL_NODES: usize = 5;

/// A node and its adjacency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyNode<T> {
    pub id: NodeId,
    pub data: T,
    pub connections: BTreeSet<NodeId>,
}

impl<T> TopologyNode<T> {
    pub fn degree(&self) -> usize {
        self.connections.len()
    }
}

/// Key of an undirected edge: the endpoint ids in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(pub NodeId, pub NodeId);

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

/// An undirected weighted edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

/// Result of a shortest-path query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Node ids from source to target inclusive
    pub path: Vec<NodeId>,
    /// Hop count
    pub distance: usize,
}

/// A connected component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub nodes: Vec<NodeId>,
    pub size: usize,
    pub edge_count: usize,
    /// Edges present over edges possible within the component
    pub density: f64,
    pub geometry: String,
}

/// A node with its normalized centrality score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralNode {
    pub id: NodeId,
    pub score: f64,
}

/// Aggregate structural report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyAnalysis {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub average_degree: f64,
    pub clusters: Vec<Cluster>,
    pub central_nodes: Vec<CentralNode>,
    /// `1 - largest_cluster / node_count`
    pub resilience: f64,
    pub is_connected: bool,
    pub diameter: usize,
}

/// Cosmetic label for a cluster of `size` nodes
pub fn geometry_label(size: usize) -> &'static str {
    match size {
        0 => "void",
        1 => "point",
        2 => "vesica",
        3 => "triangle",
        4 => "tetrahedron",
        5 => "pentagram",
        6 => "hexagram",
        7 => "seed-of-life",
        8..=12 => "fruit-of-life",
        _ => "flower-of-life",
    }
}

/// The connection graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology<T = ()> {
    nodes: BTreeMap<NodeId, TopologyNode<T>>,
    edges: BTreeMap<EdgeKey, Edge>,
}

impl<T> Default for Topology<T> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }
}

impl<T> Topology<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; no-op if it already exists
    pub fn add_node(&mut self, id: &str, data: T) {
        self.nodes.entry(id.to_string()).or_insert_with(|| TopologyNode {
            id: id.to_string(),
            data,
            connections: BTreeSet::new(),
        });
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, id: &str) -> Option<TopologyNode<T>> {
        let node = self.nodes.remove(id)?;
        for peer in &node.connections {
            self.edges.remove(&EdgeKey::new(id, peer));
            if let Some(other) = self.nodes.get_mut(peer) {
                other.connections.remove(id);
            }
        }
        Some(node)
    }

    pub fn node(&self, id: &str) -> Option<&TopologyNode<T>> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Insert or overwrite the edge between `a` and `b`, stamped with wall-clock time
    ///
    /// Callers with their own time source use [`Topology::add_edge_at`];
    /// [`AgentNetwork`](crate::AgentNetwork) always does.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64) -> bool {
        self.add_edge_at(a, b, weight, Utc::now())
    }

    /// Insert or overwrite an edge; `false` if either endpoint is missing
    ///
    /// Self-loops are rejected.
    pub fn add_edge_at(
        &mut self,
        a: &str,
        b: &str,
        weight: f64,
        created_at: DateTime<Utc>,
    ) -> bool {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return false;
        }

        self.edges.insert(EdgeKey::new(a, b), Edge { weight, created_at });
        if let Some(node) = self.nodes.get_mut(a) {
            node.connections.insert(b.to_string());
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.connections.insert(a.to_string());
        }
        true
    }

    /// Remove the edge between `a` and `b`; `false` if there was none
    pub fn remove_edge(&mut self, a: &str, b: &str) -> bool {
        if self.edges.remove(&EdgeKey::new(a, b)).is_none() {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(a) {
            node.connections.remove(b);
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.connections.remove(a);
        }
        true
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    pub fn neighbors(&self, id: &str) -> Vec<&NodeId> {
        self.nodes
            .get(id)
            .map(|node| node.connections.iter().collect())
            .unwrap_or_default()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.nodes.get(id).map(TopologyNode::degree).unwrap_or(0)
    }

    /// Breadth-first search from `source`: node -> (parent, hops)
    fn bfs(&self, source: &str) -> HashMap<&str, (Option<&str>, usize)> {
        let mut visited: HashMap<&str, (Option<&str>, usize)> = HashMap::new();
        let Some((source, _)) = self.nodes.get_key_value(source) else {
            return visited;
        };

        let mut queue = VecDeque::new();
        visited.insert(source.as_str(), (None, 0));
        queue.push_back(source.as_str());

        while let Some(current) = queue.pop_front() {
            let hops = visited[current].1;
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for next in &node.connections {
                if !visited.contains_key(next.as_str()) {
                    visited.insert(next.as_str(), (Some(current), hops + 1));
                    queue.push_back(next.as_str());
                }
            }
        }

        visited
    }

    fn trace<'a>(
        tree: &HashMap<&'a str, (Option<&'a str>, usize)>,
        target: &'a str,
    ) -> Vec<&'a str> {
        let mut path = vec![target];
        let mut cursor = target;
        while let Some(&(Some(parent), _)) = tree.get(cursor) {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        path
    }

    /// Hop-count shortest path; `None` if unreachable or either id unknown
    ///
    /// Edge weights are not considered.
    pub fn shortest_path(&self, a: &str, b: &str) -> Option<Path> {
        if !self.nodes.contains_key(b) {
            return None;
        }
        let tree = self.bfs(a);
        let (b, (_, distance)) = tree.get_key_value(b)?;
        let path = Self::trace(&tree, *b).into_iter().map(str::to_string).collect();
        Some(Path {
            path,
            distance: *distance,
        })
    }

    /// Approximate betweenness centrality, normalized by the observed maximum
    ///
    /// For each reachable pair only the first shortest path BFS discovers is
    /// counted, so ties between equal-length paths are not split. Interior
    /// nodes of that path score one point. Scores are divided by the highest
    /// score; all zero when no node is ever interior.
    pub fn centrality(&self) -> BTreeMap<NodeId, f64> {
        let mut counts: BTreeMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();

        for source in self.nodes.keys() {
            let tree = self.bfs(source);
            for target in tree.keys() {
                if *target <= source.as_str() {
                    continue;
                }
                let path = Self::trace(&tree, *target);
                if path.len() > 2 {
                    for interior in &path[1..path.len() - 1] {
                        if let Some(count) = counts.get_mut(interior) {
                            *count += 1;
                        }
                    }
                }
            }
        }

        let max = counts.values().copied().max().unwrap_or(0);
        counts
            .into_iter()
            .map(|(id, count)| {
                let score = if max == 0 { 0.0 } else { count as f64 / max as f64 };
                (id.to_string(), score)
            })
            .collect()
    }

    /// Connected components, each listed in id order
    pub fn detect_clusters(&self) -> Vec<Cluster> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut clusters = Vec::new();

        for start in self.nodes.keys() {
            if seen.contains(start.as_str()) {
                continue;
            }

            let mut members: BTreeSet<&str> = BTreeSet::new();
            let mut stack = vec![start.as_str()];
            while let Some(current) = stack.pop() {
                if !members.insert(current) {
                    continue;
                }
                if let Some(node) = self.nodes.get(current) {
                    stack.extend(
                        node.connections
                            .iter()
                            .map(String::as_str)
                            .filter(|next| !members.contains(next)),
                    );
                }
            }
            seen.extend(members.iter().copied());

            let size = members.len();
            let degree_sum: usize = members.iter().map(|id| self.degree(id)).sum();
            let edge_count = degree_sum / 2;
            let possible = size * size.saturating_sub(1) / 2;
            let density = if possible == 0 {
                0.0
            } else {
                edge_count as f64 / possible as f64
            };

            clusters.push(Cluster {
                nodes: members.into_iter().map(str::to_string).collect(),
                size,
                edge_count,
                density,
                geometry: geometry_label(size).to_string(),
            });
        }

        clusters
    }

    /// Exactly one component and at least one node
    pub fn is_connected(&self) -> bool {
        !self.nodes.is_empty() && self.detect_clusters().len() == 1
    }

    /// Longest shortest path between any two reachable nodes
    pub fn diameter(&self) -> usize {
        self.nodes
            .keys()
            .filter_map(|source| self.bfs(source).values().map(|(_, hops)| *hops).max())
            .max()
            .unwrap_or(0)
    }

    /// Edges present over edges possible in the whole graph
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        self.edges.len() as f64 / (n * (n - 1) / 2) as f64
    }

    pub fn average_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        2.0 * self.edges.len() as f64 / self.nodes.len() as f64
    }

    /// Full structural report
    pub fn analyze(&self) -> TopologyAnalysis {
        let clusters = self.detect_clusters();
        let node_count = self.nodes.len();

        let mut central_nodes: Vec<CentralNode> = self
            .centrality()
            .into_iter()
            .map(|(id, score)| CentralNode { id, score })
            .collect();
        // Stable sort keeps id order among equal scores
        central_nodes.sort_by(|a, b| b.score.total_cmp(&a.score));
        central_nodes.truncate(TOP_CENTRAL_NODES);

        let largest = clusters.iter().map(|c| c.size).max().unwrap_or(0);
        let resilience = if node_count == 0 {
            0.0
        } else {
            1.0 - largest as f64 / node_count as f64
        };

        TopologyAnalysis {
            node_count,
            edge_count: self.edges.len(),
            density: self.density(),
            average_degree: self.average_degree(),
            is_connected: node_count > 0 && clusters.len() == 1,
            clusters,
            central_nodes,
            resilience,
            diameter: self.diameter(),
        }
    }
}

use crate::codec::LayoutEngine;
use crate::graph::{Edge, Node, Position};
use ahash::AHashMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

/// Left-to-right layered layout.
///
/// Each node is ranked by the longest path reaching it, ranks become columns and
/// nodes within a rank are stacked in declaration order. Returned positions are
/// the top-left corner of each node box.
#[derive(Debug, Clone, Copy)]
pub struct LayeredLayout {
    pub node_width: f64,
    pub node_height: f64,
    pub node_separation: f64,
    pub rank_separation: f64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            node_height: 150.0,
            node_separation: 60.0,
            rank_separation: 120.0,
        }
    }
}

impl LayeredLayout {
    fn ranks(&self, nodes: &[Node], edges: &[Edge]) -> Vec<usize> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index: AHashMap<&str, NodeIndex> = AHashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.insert(node.id.as_str(), graph.add_node(i));
        }
        for edge in edges {
            if let (Some(&src), Some(&dst)) =
                (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            {
                graph.add_edge(src, dst, ());
            }
        }

        let mut ranks = vec![0usize; nodes.len()];
        match toposort(&graph, None) {
            Ok(order) => {
                for idx in order {
                    let rank = ranks[graph[idx]];
                    for next in graph.neighbors(idx) {
                        let slot = &mut ranks[graph[next]];
                        *slot = (*slot).max(rank + 1);
                    }
                }
            }
            Err(_) => {
                debug!("Cyclic graph, laying out in declaration order");
                for (i, rank) in ranks.iter_mut().enumerate() {
                    *rank = i;
                }
            }
        }
        ranks
    }
}

impl LayoutEngine for LayeredLayout {
    fn layout(&self, nodes: &[Node], edges: &[Edge]) -> AHashMap<String, Position> {
        let ranks = self.ranks(nodes, edges);
        let mut slots_used: AHashMap<usize, usize> = AHashMap::new();
        let column = self.node_width + self.rank_separation;
        let row = self.node_height + self.node_separation;

        nodes
            .iter()
            .zip(ranks)
            .map(|(node, rank)| {
                let slot = slots_used.entry(rank).or_insert(0);
                let position = Position::new(rank as f64 * column, *slot as f64 * row);
                *slot += 1;
                (node.id.clone(), position)
            })
            .collect()
    }
}

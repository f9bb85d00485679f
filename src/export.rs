//! Graph export: read-side projections of the stored combinations.
//!
//! Every fact `a + b = c` becomes two directed edges, `a → c` and `b → c`.
//! Inputs are never linked to each other. Nodes are all distinct names in any
//! position. Nothing here writes to the store.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::store::{StoreResult, TripleStore};
use crate::triple::{Element, Triple};

/// A directed input → output edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: Element,
    pub target: Element,
}

/// Node/edge view of all stored facts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Distinct element names, sorted.
    pub nodes: Vec<Element>,
    /// Two edges per fact, in fact order.
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Project a set of facts.
    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut nodes = BTreeSet::new();
        let mut edges = Vec::with_capacity(triples.len() * 2);
        for t in triples {
            nodes.insert(t.a.clone());
            nodes.insert(t.b.clone());
            nodes.insert(t.c.clone());
            edges.push(GraphEdge {
                source: t.a.clone(),
                target: t.c.clone(),
            });
            edges.push(GraphEdge {
                source: t.b.clone(),
                target: t.c.clone(),
            });
        }
        Self {
            nodes: nodes.into_iter().collect(),
            edges,
        }
    }
}

/// Read every stored fact and project it to nodes and edges.
pub fn export_graph(store: &dyn TripleStore) -> StoreResult<Graph> {
    let mut triples = store.all()?;
    triples.sort();
    let graph = Graph::from_triples(&triples);
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "exported graph"
    );
    Ok(graph)
}

/// Build a petgraph derivation graph.
///
/// Edge weights name the other input, so `Fire → Steam` carries `Water`.
pub fn derivation_graph(triples: &[Triple]) -> DiGraph<Element, Element> {
    let mut graph = DiGraph::new();
    let mut index: HashMap<Element, NodeIndex> = HashMap::new();
    for t in triples {
        let a = ensure_node(&mut graph, &mut index, &t.a);
        let b = ensure_node(&mut graph, &mut index, &t.b);
        let c = ensure_node(&mut graph, &mut index, &t.c);
        graph.add_edge(a, c, t.b.clone());
        graph.add_edge(b, c, t.a.clone());
    }
    graph
}

fn ensure_node(
    graph: &mut DiGraph<Element, Element>,
    index: &mut HashMap<Element, NodeIndex>,
    name: &str,
) -> NodeIndex {
    if let Some(&idx) = index.get(name) {
        return idx;
    }
    let idx = graph.add_node(name.to_string());
    index.insert(name.to_string(), idx);
    idx
}

/// Render facts as Graphviz DOT.
pub fn to_dot(triples: &[Triple]) -> String {
    format!("{}", Dot::new(&derivation_graph(triples)))
}

/// Facts that produce an element, found by walking backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lineage {
    /// The element the walk started from.
    pub element: Element,
    /// Producing facts, nearest first. Each appears once.
    pub triples: Vec<Triple>,
    /// Deepest step actually taken.
    pub depth_reached: usize,
}

/// Walk backwards from `element` through the facts that produce it.
///
/// Each step replaces an element by the inputs of every fact yielding it, up
/// to `max_depth` steps. The walk stops naturally at elements nothing
/// produces, such as the seeds.
pub fn lineage(store: &dyn TripleStore, element: &str, max_depth: usize) -> StoreResult<Lineage> {
    let mut producers: HashMap<Element, Vec<Triple>> = HashMap::new();
    for t in store.all()? {
        producers.entry(t.c.clone()).or_default().push(t);
    }
    for list in producers.values_mut() {
        list.sort();
    }

    let mut visited: HashSet<Element> = HashSet::new();
    let mut collected: Vec<Triple> = Vec::new();
    let mut seen_triples: HashSet<Triple> = HashSet::new();
    let mut depth_reached = 0;

    // BFS queue: (element, current depth)
    let mut queue: VecDeque<(Element, usize)> = VecDeque::new();
    visited.insert(element.to_string());
    queue.push_back((element.to_string(), 0));

    while let Some((name, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(facts) = producers.get(&name) else {
            continue;
        };
        for t in facts {
            if !seen_triples.insert(t.clone()) {
                continue;
            }
            collected.push(t.clone());
            depth_reached = depth_reached.max(depth + 1);
            for input in [&t.a, &t.b] {
                if visited.insert(input.clone()) {
                    queue.push_back((input.clone(), depth + 1));
                }
            }
        }
    }

    Ok(Lineage {
        element: element.to_string(),
        triples: collected,
        depth_reached,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemTripleStore;

    fn sample_store() -> MemTripleStore {
        let store = MemTripleStore::new();
        store.insert(&Triple::new("Fire", "Water", "Steam")).unwrap();
        store.insert(&Triple::new("Fire", "Earth", "Lava")).unwrap();
        store
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.into(),
            target: target.into(),
        }
    }

    #[test]
    fn export_nodes_and_edges() {
        let graph = export_graph(&sample_store()).unwrap();
        assert_eq!(graph.nodes, vec!["Earth", "Fire", "Lava", "Steam", "Water"]);

        let edges: BTreeSet<GraphEdge> = graph.edges.into_iter().collect();
        let expected: BTreeSet<GraphEdge> = [
            edge("Fire", "Steam"),
            edge("Water", "Steam"),
            edge("Fire", "Lava"),
            edge("Earth", "Lava"),
        ]
        .into_iter()
        .collect();
        assert_eq!(edges, expected);
    }

    #[test]
    fn empty_store_exports_empty_graph() {
        let graph = export_graph(&MemTripleStore::new()).unwrap();
        assert_eq!(graph, Graph::default());
    }

    #[test]
    fn self_combination_gives_two_parallel_edges() {
        let graph = Graph::from_triples(&[Triple::new("Fire", "Fire", "Inferno")]);
        assert_eq!(graph.nodes, vec!["Fire", "Inferno"]);
        assert_eq!(
            graph.edges,
            vec![edge("Fire", "Inferno"), edge("Fire", "Inferno")]
        );
    }

    #[test]
    fn derivation_graph_shares_nodes() {
        let triples = sample_store().all().unwrap();
        let graph = derivation_graph(&triples);
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn dot_mentions_every_node() {
        let triples = sample_store().all().unwrap();
        let dot = to_dot(&triples);
        assert!(dot.starts_with("digraph"));
        for name in ["Fire", "Water", "Steam", "Earth", "Lava"] {
            assert!(dot.contains(name), "missing {name} in {dot}");
        }
    }

    #[test]
    fn lineage_walks_back_to_seeds() {
        let store = sample_store();
        store.insert(&Triple::new("Steam", "Lava", "Geyser")).unwrap();
        store.insert(&Triple::new("Air", "Water", "Rain")).unwrap();

        let shallow = lineage(&store, "Geyser", 1).unwrap();
        assert_eq!(shallow.triples, vec![Triple::new("Lava", "Steam", "Geyser")]);
        assert_eq!(shallow.depth_reached, 1);

        let full = lineage(&store, "Geyser", 10).unwrap();
        assert_eq!(full.triples.len(), 3);
        assert_eq!(full.depth_reached, 2);
        assert!(!full.triples.iter().any(|t| t.c == "Rain"));
    }

    #[test]
    fn lineage_of_seed_is_empty() {
        let result = lineage(&sample_store(), "Fire", 5).unwrap();
        assert!(result.triples.is_empty());
        assert_eq!(result.depth_reached, 0);
    }
}

//! Co-authorship graph.
//!
//! One node per distinct creator name and one weighted link per pair of
//! creators who share a record, in the `{"nodes": [...], "links": [...]}`
//! shape force-directed graph front ends expect.
//!
//! ## Usage
//!
//! ```rust
//! use dppi::{CoauthorGraph, Publication};
//!
//! let mut first = Publication::new("iPRES", 2023, "One", "eng");
//! first.creators = vec!["A".to_string(), "B".to_string()];
//! let mut second = Publication::new("iPRES", 2023, "Two", "eng");
//! second.creators = vec!["A".to_string(), "B".to_string(), "C".to_string()];
//!
//! let graph = CoauthorGraph::from_publications(&[first, second]);
//! assert_eq!(graph.nodes[0].count, 2);
//! assert_eq!(graph.edge_weight("A", "B"), Some(2));
//! ```

use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::jsonl::json_lines;
use crate::{Publication, Result};

/// A creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Position in [`CoauthorGraph::nodes`]
    pub id: usize,
    pub name: String,
    /// Number of records the creator appears on
    pub count: usize,
    pub group: u32,
}

/// Two creators who share `value` records. `source` and `target` are node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub value: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CoauthorGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl CoauthorGraph {
    /// Builds the graph from merged records.
    ///
    /// Nodes are numbered in order of first appearance and names are matched
    /// exactly. A name repeated on one record counts once. Each unordered pair
    /// of distinct creators on a record adds one to its link; the link runs
    /// from the lexically greater name to the lesser. Links keep the order
    /// their pairs were first seen in.
    pub fn from_publications<'p, I>(publications: I) -> Self
    where
        I: IntoIterator<Item = &'p Publication>,
    {
        let mut graph = Self::default();
        let mut node_ids: HashMap<&str, usize> = HashMap::new();
        let mut link_ids: HashMap<(usize, usize), usize> = HashMap::new();

        for publication in publications {
            let creators: Vec<&String> = publication.creators.iter().unique().collect();
            for creator in &creators {
                let id = *node_ids.entry(creator.as_str()).or_insert_with(|| {
                    graph.nodes.push(Node {
                        id: graph.nodes.len(),
                        name: creator.to_string(),
                        count: 0,
                        group: 0,
                    });
                    graph.nodes.len() - 1
                });
                graph.nodes[id].count += 1;
            }

            let pairs = creators
                .iter()
                .cartesian_product(&creators)
                .filter(|(x, y)| x > y);
            for (x, y) in pairs {
                let pair = (node_ids[x.as_str()], node_ids[y.as_str()]);
                let link = *link_ids.entry(pair).or_insert_with(|| {
                    graph.links.push(Link {
                        source: pair.0,
                        target: pair.1,
                        value: 0,
                    });
                    graph.links.len() - 1
                });
                graph.links[link].value += 1;
            }
        }
        graph
    }

    /// Reads merged records from a JSON-Lines file and builds the graph.
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let input: Box<dyn BufRead> = Box::new(BufReader::new(File::open(path)?));
        let publications = json_lines::<Publication>(input)
            .map(|line| line.map(|(_, publication)| publication))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_publications(&publications))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    /// Weight of the link between two creators, in either direction.
    pub fn edge_weight(&self, a: &str, b: &str) -> Option<usize> {
        let id = |name: &str| self.nodes.iter().position(|node| node.name == name);
        let (a, b) = (id(a)?, id(b)?);
        self.links
            .iter()
            .find(|link| (link.source, link.target) == (a, b) || (link.source, link.target) == (b, a))
            .map(|link| link.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(creators: &[&str]) -> Publication {
        let mut publication = Publication::new("iPRES", 2023, "T", "eng");
        publication.creators = creators.iter().map(|c| c.to_string()).collect();
        publication
    }

    #[test]
    fn test_counts_and_weights() {
        let graph = CoauthorGraph::from_publications(&[record(&["A", "B"]), record(&["A", "B", "C"])]);

        let counts: Vec<_> = graph.nodes.iter().map(|n| (n.name.as_str(), n.count)).collect();
        assert_eq!(counts, vec![("A", 2), ("B", 2), ("C", 1)]);
        assert_eq!(graph.edge_weight("A", "B"), Some(2));
        assert_eq!(graph.edge_weight("B", "A"), Some(2));
        assert_eq!(graph.edge_weight("A", "C"), Some(1));
        assert_eq!(graph.edge_weight("B", "C"), Some(1));
        assert_eq!(graph.links.len(), 3);
    }

    #[test]
    fn test_self_pairs_and_solo_records() {
        let graph = CoauthorGraph::from_publications(&[record(&["A"]), record(&["B", "B"])]);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].count, 1);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_repeated_creator_counts_once_per_record() {
        let graph = CoauthorGraph::from_publications(&[record(&["A", "B", "A"]), record(&["B", "A"])]);
        let counts: Vec<_> = graph.nodes.iter().map(|n| (n.name.as_str(), n.count)).collect();
        assert_eq!(counts, vec![("A", 2), ("B", 2)]);
        assert_eq!(graph.edge_weight("A", "B"), Some(2));
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let graph = CoauthorGraph::from_publications(&[record(&["A", "B"])]);
        assert_eq!(
            serde_json::to_value(&graph).unwrap(),
            json!({
                "nodes": [
                    {"id": 0, "name": "A", "count": 1, "group": 0},
                    {"id": 1, "name": "B", "count": 1, "group": 0}
                ],
                "links": [{"source": 1, "target": 0, "value": 1}]
            })
        );
    }
}

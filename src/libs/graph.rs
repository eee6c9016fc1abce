use indexmap::IndexMap;
use levenshtein::levenshtein;
use log::debug;
use petgraph::graphmap::UnGraphMap;
use std::collections::HashSet;

use crate::libs::finder::REPEAT_SPACER_MAX_SIMILARITY;
use crate::libs::pool::{StringPool, StringToken};
use crate::libs::rainbow::Rainbow;
use crate::libs::read::ReadRecord;

/// Uniqueness key of a spacer edge: (from repeat, spacer, to repeat)
pub type SpacerKey = (StringToken, StringToken, StringToken);

/// One distinct repeat identity within a group
#[derive(Debug, Clone)]
pub struct CrisprNode {
    pub repeat_token: StringToken,
    pub coverage: usize,
    pub attached: bool,
}

/// A directed, spacer-labelled edge between two repeat nodes
#[derive(Debug, Clone)]
pub struct SpacerInstance {
    pub from: StringToken,
    pub spacer: StringToken,
    pub to: StringToken,
    pub coverage: usize,
    pub attached: bool,
}

/// Serializable node record handed to the output collaborator
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: usize,
    pub repeat: String,
    pub coverage: usize,
    pub color: (u8, u8, u8),
    pub attached: bool,
}

/// Serializable edge record handed to the output collaborator
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub from_id: usize,
    pub to_id: usize,
    pub spacer: String,
    pub coverage: usize,
    pub attached: bool,
}

/// A whole group, ready for rendering
#[derive(Debug, Clone)]
pub struct GroupGraph {
    pub canonical_repeat: String,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

//----------------------------
// NodeManager
//----------------------------
/// Owns one canonical direct repeat: every read assigned to the
/// repeat, the repeat-instance nodes those reads observe, and the
/// spacer edges connecting them. Nodes and edges keep their
/// first-observation order, which is the order they are emitted in.
pub struct NodeManager {
    canonical_repeat: String,
    nodes: IndexMap<StringToken, CrisprNode>,
    spacers: IndexMap<SpacerKey, SpacerInstance>,
    reads: Vec<ReadRecord>,
    min_coverage: usize,
    max_coverage: usize,
}

impl NodeManager {
    pub fn new(canonical_repeat: &str) -> Self {
        Self {
            canonical_repeat: canonical_repeat.to_string(),
            nodes: IndexMap::new(),
            spacers: IndexMap::new(),
            reads: Vec::new(),
            min_coverage: 0,
            max_coverage: 0,
        }
    }

    pub fn canonical_repeat(&self) -> &str {
        &self.canonical_repeat
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn spacer_count(&self) -> usize {
        self.spacers.len()
    }

    pub fn min_coverage(&self) -> usize {
        self.min_coverage
    }

    pub fn max_coverage(&self) -> usize {
        self.max_coverage
    }

    /// Walk a record's intervals left to right, interning each repeat
    /// occurrence and the spacer between consecutive occurrences. The
    /// record is only read; the manager takes ownership of it.
    pub fn add_read_record(&mut self, record: ReadRecord, pool: &mut StringPool) {
        let bases = &record.read.bases;
        let intervals = record.positions.intervals();

        let mut prev_token: StringToken = 0;
        for (i, &(s, e)) in intervals.iter().enumerate() {
            let token = pool.intern(&bases[s..e]);
            self.nodes
                .entry(token)
                .or_insert_with(|| CrisprNode {
                    repeat_token: token,
                    coverage: 0,
                    attached: true,
                })
                .coverage += 1;

            if i > 0 {
                let (_, prev_end) = intervals[i - 1];
                let spacer_token = pool.intern(&bases[prev_end..s]);
                let key = (prev_token, spacer_token, token);
                self.spacers
                    .entry(key)
                    .or_insert_with(|| SpacerInstance {
                        from: prev_token,
                        spacer: spacer_token,
                        to: token,
                        coverage: 0,
                        attached: true,
                    })
                    .coverage += 1;
            }
            prev_token = token;
        }

        self.reads.push(record);
        self.refresh_coverage_limits(false);
    }

    /// Near-identical repeats must share a node. Tokens whose pairwise
    /// similarity reaches the QC threshold cluster together; the
    /// highest-coverage member absorbs the observations of the rest.
    pub fn collapse_variants(&mut self, pool: &StringPool) {
        if self.nodes.len() < 2 {
            return;
        }

        let tokens: Vec<StringToken> = self.nodes.keys().copied().collect();

        let mut graph = UnGraphMap::<StringToken, ()>::new();
        for &t in &tokens {
            graph.add_node(t);
        }
        for i in 0..tokens.len() {
            for j in i + 1..tokens.len() {
                let a = pool.resolve(tokens[i]).unwrap();
                let b = pool.resolve(tokens[j]).unwrap();
                let max_len = a.len().max(b.len());
                if max_len == 0 {
                    continue;
                }
                let similarity = 1.0 - levenshtein(a, b) as f64 / max_len as f64;
                if similarity >= REPEAT_SPACER_MAX_SIMILARITY {
                    graph.add_edge(tokens[i], tokens[j], ());
                }
            }
        }

        let mut remap: IndexMap<StringToken, StringToken> = IndexMap::new();
        for component in petgraph::algo::tarjan_scc(&graph) {
            if component.len() < 2 {
                continue;
            }
            // highest coverage represents the cluster; first
            // observation breaks ties
            let rep = component
                .iter()
                .copied()
                .max_by_key(|t| {
                    (
                        self.nodes[t].coverage,
                        std::cmp::Reverse(self.nodes.get_index_of(t).unwrap()),
                    )
                })
                .unwrap();
            for &t in &component {
                if t != rep {
                    remap.insert(t, rep);
                }
            }
        }
        if remap.is_empty() {
            return;
        }
        debug!(
            "collapsed {} repeat variants in group {}",
            remap.len(),
            self.canonical_repeat
        );

        let resolve = |t: StringToken| -> StringToken { *remap.get(&t).unwrap_or(&t) };

        let mut nodes: IndexMap<StringToken, CrisprNode> = IndexMap::new();
        for (token, node) in self.nodes.drain(..) {
            let target = resolve(token);
            nodes
                .entry(target)
                .or_insert_with(|| CrisprNode {
                    repeat_token: target,
                    coverage: 0,
                    attached: true,
                })
                .coverage += node.coverage;
        }
        self.nodes = nodes;

        let mut spacers: IndexMap<SpacerKey, SpacerInstance> = IndexMap::new();
        for (_, edge) in self.spacers.drain(..) {
            let from = resolve(edge.from);
            let to = resolve(edge.to);
            let key = (from, edge.spacer, to);
            spacers
                .entry(key)
                .or_insert_with(|| SpacerInstance {
                    from,
                    spacer: edge.spacer,
                    to,
                    coverage: 0,
                    attached: true,
                })
                .coverage += edge.coverage;
        }
        self.spacers = spacers;

        self.refresh_coverage_limits(false);
    }

    /// Prune the graph: nodes far below the group's peak coverage are
    /// detached, as are edges touching them and unsupported edges
    /// between otherwise well-covered nodes.
    pub fn clean_graph(&mut self) {
        self.refresh_coverage_limits(false);
        let threshold = 2.max(self.max_coverage.div_ceil(10));

        for node in self.nodes.values_mut() {
            node.attached = node.coverage >= threshold;
        }

        for edge in self.spacers.values_mut() {
            let from = &self.nodes[&edge.from];
            let to = &self.nodes[&edge.to];
            let endpoint_gone = !from.attached || !to.attached;
            let unsupported = edge.coverage == 1 && from.coverage >= 4 && to.coverage >= 4;
            edge.attached = !(endpoint_gone || unsupported);
        }

        self.refresh_coverage_limits(true);
    }

    fn refresh_coverage_limits(&mut self, attached_only: bool) {
        let covs: Vec<usize> = self
            .nodes
            .values()
            .filter(|n| !attached_only || n.attached)
            .map(|n| n.coverage)
            .collect();
        self.min_coverage = covs.iter().min().copied().unwrap_or(0);
        self.max_coverage = covs.iter().max().copied().unwrap_or(0);
    }

    /// Number of connected components among attached nodes, following
    /// attached edges in either direction. Spacer chains can loop a
    /// repeat back onto itself, so traversal keeps a visited set.
    pub fn component_count(&self) -> usize {
        let mut visited: HashSet<StringToken> = HashSet::new();
        let mut components = 0;

        for (&token, node) in &self.nodes {
            if !node.attached || visited.contains(&token) {
                continue;
            }
            components += 1;

            let mut stack = vec![token];
            visited.insert(token);
            while let Some(current) = stack.pop() {
                for edge in self.spacers.values().filter(|e| e.attached) {
                    for next in [edge.from, edge.to] {
                        if (edge.from == current || edge.to == current)
                            && !visited.contains(&next)
                        {
                            visited.insert(next);
                            stack.push(next);
                        }
                    }
                }
            }
        }
        components
    }

    /// Emit the group in first-observation order for rendering
    pub fn describe(&self, pool: &StringPool) -> GroupGraph {
        let rainbow = Rainbow::new(self.min_coverage, self.max_coverage);

        let nodes: Vec<NodeRecord> = self
            .nodes
            .values()
            .enumerate()
            .map(|(id, node)| NodeRecord {
                id,
                repeat: pool.resolve(node.repeat_token).unwrap_or("").to_string(),
                coverage: node.coverage,
                color: rainbow.color(node.coverage),
                attached: node.attached,
            })
            .collect();

        let edges: Vec<EdgeRecord> = self
            .spacers
            .values()
            .map(|edge| EdgeRecord {
                from_id: self.nodes.get_index_of(&edge.from).unwrap(),
                to_id: self.nodes.get_index_of(&edge.to).unwrap(),
                spacer: pool.resolve(edge.spacer).unwrap_or("").to_string(),
                coverage: edge.coverage,
                attached: edge.attached,
            })
            .collect();

        GroupGraph {
            canonical_repeat: self.canonical_repeat.clone(),
            nodes,
            edges,
        }
    }
}

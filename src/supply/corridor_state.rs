//! Corridor robustness and per-settlement supply state
//!
//! Works only from a reachability report plus the raw graph and control.
//! Edges the faction traversed are `open` if they lie on a cycle of the
//! traversed subgraph and `brittle` if they are bridges of it. Edges between
//! two settlements the faction controls that it never traversed are `cut`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{canonical_cmp, EdgeId, FactionId, SettlementId, Turn};
use crate::graph::{PoliticalControl, SettlementGraph};
use crate::supply::reachability::{FactionReachability, ReachabilityReport, REACHABILITY_SCHEMA};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorState {
    Open,
    Brittle,
    Cut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyState {
    Adequate,
    Strained,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorridorCounts {
    pub open: usize,
    pub brittle: usize,
    pub cut: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyStateCounts {
    pub adequate: usize,
    pub strained: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionCorridors {
    pub edges: BTreeMap<EdgeId, CorridorState>,
    pub counts: CorridorCounts,
}

impl FactionCorridors {
    pub fn state(&self, edge: &str) -> Option<CorridorState> {
        self.edges.get(edge).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorridorReport {
    pub schema: u32,
    pub turn: Turn,
    pub factions: BTreeMap<FactionId, FactionCorridors>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionSupplyStates {
    pub settlements: BTreeMap<SettlementId, SupplyState>,
    pub counts: SupplyStateCounts,
}

impl FactionSupplyStates {
    pub fn state(&self, settlement: &str) -> Option<SupplyState> {
        self.settlements.get(settlement).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyStateReport {
    pub schema: u32,
    pub turn: Turn,
    pub factions: BTreeMap<FactionId, FactionSupplyStates>,
}

/// Bridge flag for each edge of the subgraph formed by `edges`.
///
/// Iterative Tarjan lowlink; nodes are numbered in canonical order so the
/// walk itself is deterministic.
fn bridge_flags(edges: &[EdgeId]) -> Vec<bool> {
    let mut names: Vec<&str> = edges.iter().flat_map(|e| [e.a(), e.b()]).collect();
    names.sort_unstable_by(|x, y| canonical_cmp(x, y));
    names.dedup();
    let index: AHashMap<&str, usize> = names.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    let n = names.len();
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (k, edge) in edges.iter().enumerate() {
        let (a, b) = (index[edge.a()], index[edge.b()]);
        adjacency[a].push((b, k));
        adjacency[b].push((a, k));
    }

    const UNSEEN: usize = usize::MAX;
    let mut disc = vec![UNSEEN; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;
    let mut bridge = vec![false; edges.len()];

    for root in 0..n {
        if disc[root] != UNSEEN {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;
        // (node, edge it was entered through, next adjacency position)
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, UNSEEN, 0)];
        while let Some(top) = stack.last_mut() {
            let (u, via, pos) = *top;
            if pos < adjacency[u].len() {
                top.2 += 1;
                let (v, k) = adjacency[u][pos];
                if k == via {
                    continue;
                }
                if disc[v] == UNSEEN {
                    disc[v] = timer;
                    low[v] = timer;
                    timer += 1;
                    stack.push((v, k, 0));
                } else {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let Some(&(parent, _, _)) = stack.last() {
                    low[parent] = low[parent].min(low[u]);
                    if low[u] > disc[parent] {
                        bridge[via] = true;
                    }
                }
            }
        }
    }
    bridge
}

/// Whether dropping `edge` from `edge_set` leaves its endpoints disconnected
pub fn edge_disconnects_endpoints(edge: &EdgeId, edge_set: &BTreeSet<EdgeId>) -> bool {
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for e in edge_set.iter().filter(|e| *e != edge) {
        adjacency.entry(e.a()).or_default().push(e.b());
        adjacency.entry(e.b()).or_default().push(e.a());
    }

    let (start, goal) = edge.endpoints();
    let mut seen: AHashSet<&str> = AHashSet::from_iter([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        if current == goal {
            return false;
        }
        for &next in adjacency.get(current).into_iter().flatten() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    true
}

fn classify_faction(
    reach: &FactionReachability,
    faction: &str,
    control: &PoliticalControl,
    graph: &SettlementGraph,
) -> FactionCorridors {
    let bridges = bridge_flags(&reach.edges_used);
    let mut corridors = FactionCorridors::default();

    for (edge, is_bridge) in reach.edges_used.iter().zip(bridges) {
        let state = if is_bridge {
            corridors.counts.brittle += 1;
            CorridorState::Brittle
        } else {
            corridors.counts.open += 1;
            CorridorState::Open
        };
        corridors.edges.insert(edge.clone(), state);
    }

    for edge in graph.edges() {
        let (a, b) = edge.id.endpoints();
        if corridors.edges.contains_key(&edge.id) {
            continue;
        }
        if control.is_controlled_by(a, faction) && control.is_controlled_by(b, faction) {
            corridors.edges.insert(edge.id.clone(), CorridorState::Cut);
            corridors.counts.cut += 1;
        }
    }
    corridors
}

pub fn derive_corridor_states(
    reachability: &ReachabilityReport,
    control: &PoliticalControl,
    graph: &SettlementGraph,
) -> CorridorReport {
    let factions = reachability
        .factions
        .iter()
        .map(|(faction, reach)| {
            let corridors = classify_faction(reach, faction.as_str(), control, graph);
            tracing::debug!(
                %faction,
                open = corridors.counts.open,
                brittle = corridors.counts.brittle,
                cut = corridors.counts.cut,
                "classified corridors"
            );
            (faction.clone(), corridors)
        })
        .collect();

    CorridorReport {
        schema: REACHABILITY_SCHEMA,
        turn: reachability.turn,
        factions,
    }
}

fn supply_states_for(reach: &FactionReachability, corridors: &FactionCorridors) -> FactionSupplyStates {
    // Adjacency over open corridors only
    let mut open: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for (edge, _) in corridors
        .edges
        .iter()
        .filter(|(_, state)| **state == CorridorState::Open)
    {
        open.entry(edge.a()).or_default().push(edge.b());
        open.entry(edge.b()).or_default().push(edge.a());
    }

    // Seeded sources are exactly the listed sources that were reachable
    let mut adequate: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for source in reach.sources.iter().filter(|s| reach.is_reachable(s.as_str())) {
        if adequate.insert(source.as_str()) {
            queue.push_back(source.as_str());
        }
    }
    while let Some(current) = queue.pop_front() {
        for &next in open.get(current).into_iter().flatten() {
            if adequate.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let mut states = FactionSupplyStates::default();
    for sid in &reach.controlled {
        let state = if reach.is_isolated(sid.as_str()) {
            states.counts.critical += 1;
            SupplyState::Critical
        } else if adequate.contains(sid.as_str()) {
            states.counts.adequate += 1;
            SupplyState::Adequate
        } else {
            states.counts.strained += 1;
            SupplyState::Strained
        };
        states.settlements.insert(sid.clone(), state);
    }
    states
}

/// Per-settlement supply state for every controlled settlement of every faction
pub fn derive_supply_states(
    reachability: &ReachabilityReport,
    corridors: &CorridorReport,
) -> SupplyStateReport {
    let empty = FactionCorridors::default();
    let factions = reachability
        .factions
        .iter()
        .map(|(faction, reach)| {
            let faction_corridors = corridors.factions.get(faction).unwrap_or(&empty);
            (faction.clone(), supply_states_for(reach, faction_corridors))
        })
        .collect();

    SupplyStateReport {
        schema: REACHABILITY_SCHEMA,
        turn: reachability.turn,
        factions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::FactionRecord;
    use crate::graph::RawEdge;
    use crate::supply::reachability::compute_supply_reachability;

    fn ids(list: &[&str]) -> Vec<EdgeId> {
        let mut out: Vec<EdgeId> = list.iter().map(|s| EdgeId::parse(s).unwrap()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_bridge_flags_triangle_with_tail() {
        let edges = ids(&["A__B", "B__C", "A__C", "C__D"]);
        let flags = bridge_flags(&edges);
        let bridges: Vec<&str> = edges
            .iter()
            .zip(&flags)
            .filter(|(_, b)| **b)
            .map(|(e, _)| e.as_str())
            .collect();
        assert_eq!(bridges, vec!["C__D"]);
    }

    #[test]
    fn test_bridge_flags_agree_with_removal_check() {
        let edges = ids(&["A__B", "B__C", "C__D", "D__A", "D__E", "E__F", "F__G", "E__G", "G__H"]);
        let set: BTreeSet<EdgeId> = edges.iter().cloned().collect();
        for (edge, flag) in edges.iter().zip(bridge_flags(&edges)) {
            assert_eq!(flag, edge_disconnects_endpoints(edge, &set), "{edge}");
        }
    }

    /// Square S1-S2-S4-S3-S1 with a tail S4-S5, plus S6 cut off by enemy S7
    fn scenario() -> (SettlementGraph, PoliticalControl) {
        let graph = SettlementGraph::from_edges(&[
            RawEdge::new("S1", "S2"),
            RawEdge::new("S2", "S4"),
            RawEdge::new("S3", "S4"),
            RawEdge::new("S1", "S3"),
            RawEdge::new("S4", "S5"),
            RawEdge::new("S5", "S7"),
            RawEdge::new("S6", "S7"),
        ])
        .unwrap();
        let control = PoliticalControl::from_pairs([
            ("S1", Some("A")),
            ("S2", Some("A")),
            ("S3", Some("A")),
            ("S4", Some("A")),
            ("S5", Some("A")),
            ("S6", Some("A")),
            ("S7", Some("B")),
        ]);
        (graph, control)
    }

    #[test]
    fn test_corridor_and_supply_states() {
        let (graph, control) = scenario();
        let factions = vec![FactionRecord::new("A").with_sources(["S1"])];
        let reach = compute_supply_reachability(&control, &graph, &factions, &[], 2);
        let corridors = derive_corridor_states(&reach, &control, &graph);
        let a = &corridors.factions["A"];

        assert_eq!(a.state("S1__S2"), Some(CorridorState::Open));
        assert_eq!(a.state("S3__S4"), Some(CorridorState::Open));
        assert_eq!(a.state("S4__S5"), Some(CorridorState::Brittle));
        assert_eq!(a.state("S5__S7"), None);
        assert_eq!(a.counts, CorridorCounts { open: 4, brittle: 1, cut: 0 });

        let supply = derive_supply_states(&reach, &corridors);
        let a = &supply.factions["A"];
        assert_eq!(a.state("S4"), Some(SupplyState::Adequate));
        assert_eq!(a.state("S5"), Some(SupplyState::Strained));
        assert_eq!(a.state("S6"), Some(SupplyState::Critical));
        assert_eq!(a.state("S7"), None);
        assert_eq!(
            a.counts,
            SupplyStateCounts {
                adequate: 4,
                strained: 1,
                critical: 1
            }
        );
    }

    #[test]
    fn test_untraversed_friendly_edge_is_cut() {
        let graph = SettlementGraph::from_edges(&[RawEdge::new("S1", "S2")]).unwrap();
        let control = PoliticalControl::from_pairs([("S1", Some("A")), ("S2", Some("A"))]);
        // no sources, nothing traversed
        let reach = compute_supply_reachability(&control, &graph, &[], &[], 0);
        let corridors = derive_corridor_states(&reach, &control, &graph);
        assert_eq!(corridors.factions["A"].state("S1__S2"), Some(CorridorState::Cut));

        let supply = derive_supply_states(&reach, &corridors);
        assert_eq!(supply.factions["A"].counts.critical, 2);
    }
}

//! Supply reachability
//!
//! Multi-source BFS per faction, seeded at the supply sources it currently
//! controls. A step is allowed into a settlement the faction controls, or
//! across an edge or into a settlement covered by an active corridor right.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::{EdgeId, FactionId, SettlementId, Turn};
use crate::forces::{reported_factions, FactionRecord};
use crate::graph::{PoliticalControl, SettlementGraph};
use crate::supply::corridor_rights::{resolve_corridor_rights, CorridorGrant};

pub const REACHABILITY_SCHEMA: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionReachability {
    /// Every listed source, controlled or not
    pub sources: Vec<SettlementId>,
    pub controlled: Vec<SettlementId>,
    pub reachable_controlled: Vec<SettlementId>,
    pub isolated_controlled: Vec<SettlementId>,
    /// Edges the traversal was allowed to cross from a visited settlement
    pub edges_used: Vec<EdgeId>,
    pub corridors_active_count: usize,
    pub rights_edges_used_count: usize,
    pub rights_nodes_used_count: usize,
}

impl FactionReachability {
    pub fn is_reachable(&self, settlement: &str) -> bool {
        self.reachable_controlled
            .binary_search_by(|sid| sid.as_str().cmp(settlement))
            .is_ok()
    }

    pub fn is_isolated(&self, settlement: &str) -> bool {
        self.isolated_controlled
            .binary_search_by(|sid| sid.as_str().cmp(settlement))
            .is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityReport {
    pub schema: u32,
    pub turn: Turn,
    pub factions: BTreeMap<FactionId, FactionReachability>,
}

pub fn compute_supply_reachability(
    control: &PoliticalControl,
    graph: &SettlementGraph,
    factions: &[FactionRecord],
    grants: &[CorridorGrant],
    turn: Turn,
) -> ReachabilityReport {
    let mut sources_by_faction: BTreeMap<&str, BTreeSet<SettlementId>> = BTreeMap::new();
    for record in factions {
        sources_by_faction
            .entry(record.id.as_str())
            .or_default()
            .extend(record.supply_sources.iter().cloned());
    }

    let by_faction = reported_factions(control, factions)
        .into_iter()
        .map(|faction| {
            let sources = sources_by_faction
                .get(faction.as_str())
                .cloned()
                .unwrap_or_default();
            let reach = reach_faction(control, graph, &faction, sources, grants, turn);
            (faction, reach)
        })
        .collect();

    ReachabilityReport {
        schema: REACHABILITY_SCHEMA,
        turn,
        factions: by_faction,
    }
}

fn reach_faction(
    control: &PoliticalControl,
    graph: &SettlementGraph,
    faction: &FactionId,
    sources: BTreeSet<SettlementId>,
    grants: &[CorridorGrant],
    turn: Turn,
) -> FactionReachability {
    let rights = resolve_corridor_rights(grants, faction.as_str(), turn, graph);
    let controlled = control.settlements_of(faction.as_str());

    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for source in sources.iter().filter(|s| controlled.contains(*s)) {
        if visited.insert(source.as_str()) {
            queue.push_back(source.as_str());
        }
    }
    let unseeded = sources.len() - visited.len();
    if unseeded > 0 {
        tracing::debug!(%faction, unseeded, "supply sources not controlled, not seeded");
    }

    let mut edges_used: BTreeSet<EdgeId> = BTreeSet::new();
    let mut rights_edges_used = 0usize;
    let mut rights_nodes_used = 0usize;

    while let Some(current) = queue.pop_front() {
        for (neighbor, edge) in graph.incident_edges(current) {
            let by_control = controlled.contains(neighbor);
            let by_edge_right = rights.covers_edge(edge.id.as_str());
            let by_node_right = rights.covers_settlement(neighbor.as_str());
            if !(by_control || by_edge_right || by_node_right) {
                continue;
            }
            edges_used.insert(edge.id.clone());
            if !visited.insert(neighbor.as_str()) {
                continue;
            }
            queue.push_back(neighbor.as_str());
            // A right is used only by the step that discovers a settlement
            // control alone would not have let in
            if !by_control {
                rights_edges_used += usize::from(by_edge_right);
                rights_nodes_used += usize::from(by_node_right);
            }
        }
    }

    let (reachable_controlled, isolated_controlled): (Vec<SettlementId>, Vec<SettlementId>) =
        controlled
            .iter()
            .cloned()
            .partition(|sid| visited.contains(sid.as_str()));

    FactionReachability {
        sources: sources.into_iter().collect(),
        controlled: controlled.into_iter().collect(),
        reachable_controlled,
        isolated_controlled,
        edges_used: edges_used.into_iter().collect(),
        corridors_active_count: rights.active_grants,
        rights_edges_used_count: rights_edges_used,
        rights_nodes_used_count: rights_nodes_used,
    }
}

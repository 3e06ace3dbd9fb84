//! Negotiated supply-corridor rights
//!
//! A grant lets one faction trace supply across edges or settlements it does
//! not control. Holding a right never implies control.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{EdgeId, FactionId, SettlementId, Turn};
use crate::graph::SettlementGraph;

/// What a grant covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorridorScope {
    Edges { edge_ids: Vec<EdgeId> },
    Settlements { settlement_ids: Vec<SettlementId> },
    /// Not resolvable to graph elements; skipped by reachability
    Region { region_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorridorGrant {
    pub id: String,
    pub beneficiary: FactionId,
    pub scope: CorridorScope,
    #[serde(default)]
    pub since_turn: Turn,
    /// Exclusive end of validity, open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_turn: Option<Turn>,
}

impl CorridorGrant {
    pub fn is_active_at(&self, turn: Turn) -> bool {
        self.since_turn <= turn && self.until_turn.map_or(true, |until| until > turn)
    }
}

/// Resolved rights of one faction for one turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorridorRights {
    pub edges: BTreeSet<EdgeId>,
    pub settlements: BTreeSet<SettlementId>,
    /// Active grants that resolved to edges or settlements
    pub active_grants: usize,
}

impl CorridorRights {
    pub fn covers_edge(&self, edge: &str) -> bool {
        self.edges.contains(edge)
    }

    pub fn covers_settlement(&self, settlement: &str) -> bool {
        self.settlements.contains(settlement)
    }
}

/// Collect every right active for `faction` at `turn`.
///
/// Edge grants also open their endpoints; settlement grants also open every
/// edge incident to the settlement.
pub fn resolve_corridor_rights(
    grants: &[CorridorGrant],
    faction: &str,
    turn: Turn,
    graph: &SettlementGraph,
) -> CorridorRights {
    let mut rights = CorridorRights::default();
    for grant in grants
        .iter()
        .filter(|g| g.beneficiary.as_str() == faction && g.is_active_at(turn))
    {
        match &grant.scope {
            CorridorScope::Edges { edge_ids } => {
                rights.active_grants += 1;
                for edge in edge_ids {
                    rights.settlements.insert(SettlementId::from(edge.a()));
                    rights.settlements.insert(SettlementId::from(edge.b()));
                    rights.edges.insert(edge.clone());
                }
            }
            CorridorScope::Settlements { settlement_ids } => {
                rights.active_grants += 1;
                for sid in settlement_ids {
                    for (_, edge) in graph.incident_edges(sid.as_str()) {
                        rights.edges.insert(edge.id.clone());
                    }
                    rights.settlements.insert(sid.clone());
                }
            }
            CorridorScope::Region { region_id } => {
                tracing::warn!(
                    grant = %grant.id,
                    %region_id,
                    "region-scoped corridor grant is not supported, skipping"
                );
            }
        }
    }
    rights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RawEdge;

    fn graph() -> SettlementGraph {
        SettlementGraph::from_edges(&[
            RawEdge::new("S1", "S2"),
            RawEdge::new("S2", "S3"),
            RawEdge::new("S3", "S4"),
        ])
        .unwrap()
    }

    fn grant(scope: CorridorScope, since: Turn, until: Option<Turn>) -> CorridorGrant {
        CorridorGrant {
            id: "G1".to_string(),
            beneficiary: FactionId::from("RBiH"),
            scope,
            since_turn: since,
            until_turn: until,
        }
    }

    #[test]
    fn test_validity_window() {
        let g = grant(CorridorScope::Region { region_id: "R".into() }, 3, Some(5));
        assert!(!g.is_active_at(2));
        assert!(g.is_active_at(3));
        assert!(g.is_active_at(4));
        assert!(!g.is_active_at(5));
        let open = grant(CorridorScope::Region { region_id: "R".into() }, 0, None);
        assert!(open.is_active_at(1000));
    }

    #[test]
    fn test_edge_scope_opens_endpoints() {
        let grants = vec![grant(
            CorridorScope::Edges {
                edge_ids: vec![EdgeId::parse("S2__S3").unwrap()],
            },
            0,
            None,
        )];
        let rights = resolve_corridor_rights(&grants, "RBiH", 1, &graph());
        assert!(rights.covers_edge("S2__S3"));
        assert!(rights.covers_settlement("S2"));
        assert!(rights.covers_settlement("S3"));
        assert!(!rights.covers_edge("S1__S2"));
        assert_eq!(rights.active_grants, 1);

        let other = resolve_corridor_rights(&grants, "RS", 1, &graph());
        assert_eq!(other, CorridorRights::default());
    }

    #[test]
    fn test_settlement_scope_opens_incident_edges() {
        let grants = vec![grant(
            CorridorScope::Settlements {
                settlement_ids: vec![SettlementId::from("S2")],
            },
            0,
            None,
        )];
        let rights = resolve_corridor_rights(&grants, "RBiH", 0, &graph());
        let edges: Vec<&str> = rights.edges.iter().map(|e| e.as_str()).collect();
        assert_eq!(edges, vec!["S1__S2", "S2__S3"]);
    }

    #[test]
    fn test_region_scope_is_skipped() {
        let grants = vec![grant(CorridorScope::Region { region_id: "Posavina".into() }, 0, None)];
        let rights = resolve_corridor_rights(&grants, "RBiH", 0, &graph());
        assert!(rights.edges.is_empty());
        assert!(rights.settlements.is_empty());
        assert_eq!(rights.active_grants, 0);
    }

    #[test]
    fn test_scope_is_tagged() {
        let json = r#"{"id":"G","beneficiary":"RBiH","scope":{"kind":"edges","edge_ids":["S1__S2"]},"since_turn":1}"#;
        let g: CorridorGrant = serde_json::from_str(json).unwrap();
        assert!(matches!(g.scope, CorridorScope::Edges { .. }));
        assert!(g.until_turn.is_none());
        let bad = r#"{"id":"G","beneficiary":"RBiH","scope":{"kind":"edges","edge_ids":["S2__S1"]}}"#;
        assert!(serde_json::from_str::<CorridorGrant>(bad).is_err());
    }
}

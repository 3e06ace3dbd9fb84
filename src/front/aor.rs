//! Area-of-responsibility derivation
//!
//! AoRs are emergent and non-exclusive. An edge that has carried enough
//! pressure for long enough is claimed by every active formation of each
//! faction touching it. Nothing here is persisted: an edge that drops below
//! either gate loses its claims on the same derivation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::config::AorConfig;
use crate::core::types::{EdgeId, FactionId, FormationId, SettlementId};
use crate::forces::Formation;
use crate::front::eligibility::PressureEdge;
use crate::front::state::FrontState;

/// An eligible edge that passed the pressure and persistence gates
#[derive(Debug, Clone, PartialEq)]
pub struct SustainedEdge<'a> {
    pub edge: &'a PressureEdge,
    pub pressure: i64,
    pub active_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AorEntry {
    pub formation_id: FormationId,
    pub faction_id: FactionId,
    pub edge_ids: Vec<EdgeId>,
    /// Endpoints of `edge_ids` held by the formation's faction
    pub settlement_ids: Vec<SettlementId>,
    pub influence_weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AorMembership {
    pub by_formation: BTreeMap<FormationId, AorEntry>,
}

impl AorMembership {
    pub fn is_empty(&self) -> bool {
        self.by_formation.is_empty()
    }

    pub fn get(&self, formation: &str) -> Option<&AorEntry> {
        self.by_formation.get(formation)
    }

    /// Formations claiming `edge`, in canonical order
    pub fn claimants(&self, edge: &str) -> Vec<&FormationId> {
        self.by_formation
            .values()
            .filter(|entry| entry.edge_ids.iter().any(|id| id.as_str() == edge))
            .map(|entry| &entry.formation_id)
            .collect()
    }
}

/// Settlements that are an endpoint of at least one eligible edge, sorted
pub fn front_active_settlements(eligible: &[PressureEdge]) -> BTreeSet<SettlementId> {
    eligible
        .iter()
        .flat_map(|edge| [edge.id.a(), edge.id.b()])
        .map(SettlementId::from)
        .collect()
}

pub fn is_settlement_front_active(settlement: &str, eligible: &[PressureEdge]) -> bool {
    eligible.iter().any(|edge| edge.id.touches(settlement))
}

/// Eligible edges with `|pressure| >= min_pressure` and
/// `active_streak >= min_active_streak`, in edge order
pub fn sustained_edges<'a>(
    eligible: &'a [PressureEdge],
    front: &FrontState,
    config: &AorConfig,
) -> Vec<SustainedEdge<'a>> {
    eligible
        .iter()
        .filter_map(|edge| {
            let pressure = front.pressure(edge.id.as_str()).abs();
            let active_streak = front.active_streak(edge.id.as_str());
            (pressure >= config.min_pressure && active_streak >= config.min_active_streak).then_some(
                SustainedEdge {
                    edge,
                    pressure,
                    active_streak,
                },
            )
        })
        .collect()
}

fn influence_weight(edges: &[&SustainedEdge<'_>], config: &AorConfig) -> f64 {
    if edges.is_empty() {
        return 0.0;
    }
    let total: f64 = edges
        .iter()
        .map(|s| {
            let pressure = (s.pressure as f64 / config.pressure_scale).min(1.0);
            let persistence = (s.active_streak as f64 / config.streak_scale).min(1.0);
            (pressure + persistence) / 2.0
        })
        .sum();
    (total / edges.len() as f64).clamp(0.0, 1.0)
}

/// Derive AoR membership for every active formation
pub fn derive_aor_membership(
    eligible: &[PressureEdge],
    front: &FrontState,
    formations: &BTreeMap<FormationId, Formation>,
    config: &AorConfig,
) -> AorMembership {
    let sustained = sustained_edges(eligible, front, config);
    let mut membership = AorMembership::default();
    if sustained.is_empty() {
        return membership;
    }

    // Formations of the same faction share one claim set
    let mut by_faction: BTreeMap<&FactionId, (Vec<EdgeId>, Vec<SettlementId>, f64)> =
        BTreeMap::new();

    for formation in formations.values().filter(|f| f.is_active()) {
        if !by_faction.contains_key(&formation.faction) {
            let faction = formation.faction.as_str();
            let claimed: Vec<&SustainedEdge<'_>> = sustained
                .iter()
                .filter(|s| s.edge.involves_faction(faction))
                .collect();
            let edge_ids = claimed.iter().map(|s| s.edge.id.clone()).collect();
            let settlements: BTreeSet<SettlementId> = claimed
                .iter()
                .flat_map(|s| {
                    let (a, b) = s.edge.id.endpoints();
                    [
                        (s.edge.side_a.as_str() == faction).then(|| SettlementId::from(a)),
                        (s.edge.side_b.as_str() == faction).then(|| SettlementId::from(b)),
                    ]
                })
                .flatten()
                .collect();
            let weight = influence_weight(&claimed, config);
            by_faction.insert(
                &formation.faction,
                (edge_ids, settlements.into_iter().collect(), weight),
            );
        }

        let Some((edge_ids, settlement_ids, weight)) = by_faction.get(&formation.faction) else {
            continue;
        };
        if edge_ids.is_empty() {
            continue;
        }
        membership.by_formation.insert(
            formation.id.clone(),
            AorEntry {
                formation_id: formation.id.clone(),
                faction_id: formation.faction.clone(),
                edge_ids: edge_ids.clone(),
                settlement_ids: settlement_ids.clone(),
                influence_weight: *weight,
            },
        );
    }

    tracing::debug!(
        sustained = sustained.len(),
        formations = membership.by_formation.len(),
        "derived AoR membership"
    );
    membership
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EligibilityConfig;
    use crate::forces::FormationStatus;
    use crate::front::eligibility::eligible_pressure_edges;
    use crate::graph::{PoliticalControl, RawEdge, SettlementGraph};

    fn eligible() -> Vec<PressureEdge> {
        let graph =
            SettlementGraph::from_edges(&[RawEdge::new("S1", "S2"), RawEdge::new("S2", "S3")])
                .unwrap();
        let control = PoliticalControl::from_pairs([
            ("S1", Some("RBiH")),
            ("S2", Some("RS")),
            ("S3", Some("RBiH")),
        ]);
        eligible_pressure_edges(&control, &graph, &EligibilityConfig::default())
    }

    fn front(pressure: i64, streak: u32) -> FrontState {
        let mut front = FrontState::new();
        let id = EdgeId::parse("S1__S2").unwrap();
        front.set_pressure(id.clone(), pressure, 0);
        front.front_segments.insert(
            id,
            crate::front::state::FrontSegment {
                active: true,
                active_streak: streak,
                ..Default::default()
            },
        );
        front
    }

    fn formations() -> BTreeMap<FormationId, Formation> {
        [
            Formation::new("F-RBiH-1", "RBiH"),
            Formation::new("F-RBiH-2", "RBiH"),
            Formation::new("F-RS-1", "RS"),
            Formation::new("F-RS-2", "RS").with_status(FormationStatus::Inactive),
        ]
        .into_iter()
        .map(|f| (f.id.clone(), f))
        .collect()
    }

    #[test]
    fn test_front_active_predicate() {
        let eligible = eligible();
        let active: Vec<String> = front_active_settlements(&eligible)
            .into_iter()
            .map(|s| s.0)
            .collect();
        assert_eq!(active, vec!["S1", "S2", "S3"]);
        assert!(is_settlement_front_active("S2", &eligible));
        assert!(!is_settlement_front_active("S9", &eligible));
    }

    #[test]
    fn test_sustained_edge_claimed_by_both_sides() {
        let membership =
            derive_aor_membership(&eligible(), &front(10, 3), &formations(), &AorConfig::default());
        assert_eq!(membership.by_formation.len(), 3);
        let claimants: Vec<&str> = membership
            .claimants("S1__S2")
            .into_iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(claimants, vec!["F-RBiH-1", "F-RBiH-2", "F-RS-1"]);

        let rbih = membership.get("F-RBiH-1").unwrap();
        assert_eq!(rbih.settlement_ids, vec![SettlementId::from("S1")]);
        // (10/100 + 3/10) / 2
        assert!((rbih.influence_weight - 0.2).abs() < 1e-12);
        assert!(membership.get("F-RS-2").is_none());
    }

    #[test]
    fn test_entry_dissolves_below_threshold() {
        let config = AorConfig::default();
        assert!(!derive_aor_membership(&eligible(), &front(10, 3), &formations(), &config).is_empty());
        assert!(derive_aor_membership(&eligible(), &front(3, 3), &formations(), &config).is_empty());
        assert!(derive_aor_membership(&eligible(), &front(10, 2), &formations(), &config).is_empty());
    }

    #[test]
    fn test_negative_pressure_counts_by_magnitude() {
        let membership =
            derive_aor_membership(&eligible(), &front(-10, 3), &formations(), &AorConfig::default());
        assert!(!membership.is_empty());
    }

    #[test]
    fn test_influence_weight_saturates() {
        let membership = derive_aor_membership(
            &eligible(),
            &front(500, 40),
            &formations(),
            &AorConfig::default(),
        );
        let entry = membership.get("F-RS-1").unwrap();
        assert_eq!(entry.influence_weight, 1.0);
    }
}

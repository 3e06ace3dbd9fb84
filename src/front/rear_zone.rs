//! Rear political-control zones
//!
//! Controlled settlements that touch no front edge. Read-only: control is
//! consulted, never written.

use serde::{Deserialize, Serialize};

use crate::core::config::RearZoneConfig;
use crate::core::types::SettlementId;
use crate::front::aor::front_active_settlements;
use crate::front::eligibility::PressureEdge;
use crate::graph::PoliticalControl;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RearZone {
    /// Sorted
    pub settlement_ids: Vec<SettlementId>,
}

impl RearZone {
    pub fn contains(&self, settlement: &str) -> bool {
        self.settlement_ids
            .binary_search_by(|sid| sid.as_str().cmp(settlement))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.settlement_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settlement_ids.is_empty()
    }

    /// Authority volatility multiplier: damped in the rear, 1.0 on the front
    pub fn authority_stabilization_factor(&self, settlement: &str, config: &RearZoneConfig) -> f64 {
        if self.contains(settlement) {
            config.stabilization_factor
        } else {
            1.0
        }
    }
}

pub fn derive_rear_zone(control: &PoliticalControl, eligible: &[PressureEdge]) -> RearZone {
    let front_active = front_active_settlements(eligible);
    let settlement_ids = control
        .controlled()
        .map(|(sid, _)| sid)
        .filter(|sid| !front_active.contains(*sid))
        .cloned()
        .collect();
    RearZone { settlement_ids }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EligibilityConfig;
    use crate::front::eligibility::eligible_pressure_edges;
    use crate::graph::{RawEdge, SettlementGraph};

    #[test]
    fn test_rear_zone_excludes_front_and_uncontrolled() {
        let graph = SettlementGraph::from_edges(&[
            RawEdge::new("S1", "S2"),
            RawEdge::new("S2", "S3"),
            RawEdge::new("S3", "S4"),
            RawEdge::new("S4", "S5"),
        ])
        .unwrap();
        let control = PoliticalControl::from_pairs([
            ("S1", Some("RBiH")),
            ("S2", Some("RS")),
            ("S3", Some("RS")),
            ("S4", Some("RS")),
            ("S5", None),
        ]);
        let snapshot = control.clone();
        let eligible = eligible_pressure_edges(&control, &graph, &EligibilityConfig::default());
        let rear = derive_rear_zone(&control, &eligible);

        assert_eq!(
            rear.settlement_ids,
            vec![SettlementId::from("S3"), SettlementId::from("S4")]
        );
        assert!(!rear.contains("S5"));
        assert_eq!(control, snapshot);

        let config = RearZoneConfig::default();
        assert_eq!(rear.authority_stabilization_factor("S3", &config), 0.5);
        assert_eq!(rear.authority_stabilization_factor("S1", &config), 1.0);
    }
}

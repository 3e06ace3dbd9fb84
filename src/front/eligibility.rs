//! Pressure eligibility filter
//!
//! The single source of truth for "is this a front edge". Diffusion, AoR and
//! rear-zone detection all consume the list produced here, never their own
//! re-derivation of it.

use serde::{Deserialize, Serialize};

use crate::core::config::EligibilityConfig;
use crate::core::types::{EdgeId, FactionId};
use crate::graph::{ContactType, PoliticalControl, SettlementGraph};

/// An edge with both endpoints held by different factions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureEdge {
    pub id: EdgeId,
    /// Controller of `id.a()`
    pub side_a: FactionId,
    /// Controller of `id.b()`
    pub side_b: FactionId,
    pub contact: ContactType,
    pub weight: f64,
}

impl PressureEdge {
    /// Which side holds `settlement`, if it is an endpoint
    pub fn side_of(&self, settlement: &str) -> Option<&FactionId> {
        if self.id.a() == settlement {
            Some(&self.side_a)
        } else if self.id.b() == settlement {
            Some(&self.side_b)
        } else {
            None
        }
    }

    pub fn involves_faction(&self, faction: &str) -> bool {
        self.side_a.as_str() == faction || self.side_b.as_str() == faction
    }
}

/// Front edges in canonical edge-id order.
///
/// An edge qualifies when both endpoints have a non-null controller, the
/// controllers differ, and the static weight is finite and inside the
/// configured range.
pub fn eligible_pressure_edges(
    control: &PoliticalControl,
    graph: &SettlementGraph,
    config: &EligibilityConfig,
) -> Vec<PressureEdge> {
    graph
        .edges()
        .iter()
        .filter(|edge| {
            edge.weight.is_finite()
                && edge.weight >= config.min_weight
                && edge.weight <= config.max_weight
        })
        .filter_map(|edge| {
            let (a, b) = edge.id.endpoints();
            let side_a = control.controller(a)?;
            let side_b = control.controller(b)?;
            (side_a != side_b).then(|| PressureEdge {
                id: edge.id.clone(),
                side_a: side_a.clone(),
                side_b: side_b.clone(),
                contact: edge.contact,
                weight: edge.weight,
            })
        })
        .collect()
}

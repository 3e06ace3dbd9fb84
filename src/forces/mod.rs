//! Factions and their formations

pub mod formation;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, SettlementId};
use crate::graph::PoliticalControl;

pub use formation::{Formation, FormationKind, FormationStatus};

/// A faction record; controlled territory is read from political control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionRecord {
    pub id: FactionId,
    #[serde(default)]
    pub supply_sources: Vec<SettlementId>,
}

impl FactionRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: FactionId::from(id),
            supply_sources: Vec::new(),
        }
    }

    pub fn with_sources<'a>(mut self, sources: impl IntoIterator<Item = &'a str>) -> Self {
        self.supply_sources
            .extend(sources.into_iter().map(SettlementId::from));
        self
    }
}

/// Factions a per-faction report covers: every faction record plus every
/// controller on the map, in canonical order
pub fn reported_factions(
    control: &PoliticalControl,
    factions: &[FactionRecord],
) -> BTreeSet<FactionId> {
    let mut ids = control.factions();
    ids.extend(factions.iter().map(|record| record.id.clone()));
    ids
}

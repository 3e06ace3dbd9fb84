//! Corps layer: territories, enclaves, sectors and front walks

pub mod sector;
pub mod territory;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, FormationId, MunicipalityId, SettlementId};
use crate::forces::{reported_factions, FactionRecord, Formation};
use crate::front::{front_active_settlements, PressureEdge};
use crate::graph::{PoliticalControl, SettlementGraph};

pub use sector::{partition_corps_sectors, walk_sector_front, CorpsSectorPartition, FrontWalk};
pub use territory::{detect_disconnected_territories, DisconnectedTerritories};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpsSector {
    pub settlement_ids: BTreeSet<SettlementId>,
    pub front_walk: FrontWalk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionCorps {
    pub territories: DisconnectedTerritories,
    pub sectors: BTreeMap<FormationId, CorpsSector>,
    /// Held settlements no corps wave reached
    pub unassigned: BTreeSet<SettlementId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpsReport {
    pub factions: BTreeMap<FactionId, FactionCorps>,
}

/// Partition every component of `faction`'s territory separately, so a corps
/// seeded in the main territory never reaches into an enclave
pub fn derive_faction_corps(
    faction: &str,
    control: &PoliticalControl,
    graph: &SettlementGraph,
    formations: &BTreeMap<FormationId, Formation>,
    front_active: &BTreeSet<SettlementId>,
    municipalities: &BTreeMap<SettlementId, MunicipalityId>,
) -> FactionCorps {
    let territories = detect_disconnected_territories(faction, control, graph);
    let mut sectors: BTreeMap<FormationId, CorpsSector> = BTreeMap::new();
    let mut unassigned = BTreeSet::new();

    for component in territories.components() {
        let partition = partition_corps_sectors(faction, component, control, graph, formations);
        unassigned.extend(
            component
                .iter()
                .filter(|sid| !partition.corps_by_settlement.contains_key(*sid))
                .cloned(),
        );
        for (corps_id, settlements) in partition.sector_by_corps {
            sectors
                .entry(corps_id)
                .or_default()
                .settlement_ids
                .extend(settlements);
        }
    }

    for sector in sectors.values_mut() {
        sector.front_walk =
            walk_sector_front(&sector.settlement_ids, front_active, graph, municipalities);
    }

    FactionCorps {
        territories,
        sectors,
        unassigned,
    }
}

pub fn derive_corps_report(
    control: &PoliticalControl,
    graph: &SettlementGraph,
    factions: &[FactionRecord],
    formations: &BTreeMap<FormationId, Formation>,
    eligible: &[PressureEdge],
    municipalities: &BTreeMap<SettlementId, MunicipalityId>,
) -> CorpsReport {
    let front_active = front_active_settlements(eligible);
    let factions = reported_factions(control, factions)
        .into_iter()
        .map(|faction| {
            let corps = derive_faction_corps(
                faction.as_str(),
                control,
                graph,
                formations,
                &front_active,
                municipalities,
            );
            tracing::debug!(
                %faction,
                enclaves = corps.territories.enclaves.len(),
                sectors = corps.sectors.len(),
                unassigned = corps.unassigned.len(),
                "partitioned corps sectors"
            );
            (faction, corps)
        })
        .collect();

    CorpsReport { factions }
}

//! Corps sector partitioning and front walks

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::types::{FormationId, MunicipalityId, SettlementId};
use crate::forces::{Formation, FormationKind};
use crate::graph::{PoliticalControl, SettlementGraph};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpsSectorPartition {
    pub sector_by_corps: BTreeMap<FormationId, BTreeSet<SettlementId>>,
    pub corps_by_settlement: BTreeMap<SettlementId, FormationId>,
}

/// Front-line visitation order inside one sector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontWalk {
    pub settlement_order: Vec<SettlementId>,
    /// Deduplicated; empty when no municipality map is supplied
    pub municipality_order: Vec<MunicipalityId>,
}

fn valid_seed<'a>(
    hq: Option<&'a SettlementId>,
    faction: &str,
    territory: &BTreeSet<SettlementId>,
    control: &PoliticalControl,
) -> Option<&'a SettlementId> {
    hq.filter(|sid| territory.contains(*sid) && control.is_controlled_by(sid.as_str(), faction))
}

/// HQ seed per corps. Active corps assets seed from their own HQ; a corps
/// without one falls back to the HQ of its first active brigade that has a
/// valid HQ.
fn corps_seeds<'a>(
    faction: &str,
    territory: &BTreeSet<SettlementId>,
    control: &PoliticalControl,
    formations: &'a BTreeMap<FormationId, Formation>,
) -> BTreeMap<FormationId, &'a SettlementId> {
    let of_faction = || {
        formations
            .values()
            .filter(move |f| f.faction.as_str() == faction && f.is_active())
    };

    let mut seeds = BTreeMap::new();
    for corps in of_faction().filter(|f| f.kind == FormationKind::CorpsAsset) {
        if let Some(hq) = valid_seed(corps.hq.as_ref(), faction, territory, control) {
            seeds.insert(corps.id.clone(), hq);
        }
    }
    for brigade in of_faction().filter(|f| f.kind == FormationKind::Brigade) {
        let Some(corps_id) = brigade.parent_corps() else {
            continue;
        };
        if seeds.contains_key(&corps_id) {
            continue;
        }
        if let Some(hq) = valid_seed(brigade.hq.as_ref(), faction, territory, control) {
            seeds.insert(corps_id, hq);
        }
    }
    seeds
}

/// Split one territory among the corps seeded inside it.
///
/// Multi-source BFS over settlements of `territory` held by `faction`; corps
/// are seeded in id order and the first wave to reach a settlement keeps it.
pub fn partition_corps_sectors(
    faction: &str,
    territory: &BTreeSet<SettlementId>,
    control: &PoliticalControl,
    graph: &SettlementGraph,
    formations: &BTreeMap<FormationId, Formation>,
) -> CorpsSectorPartition {
    let mut partition = CorpsSectorPartition::default();
    let seeds = corps_seeds(faction, territory, control, formations);
    if seeds.is_empty() {
        return partition;
    }

    let mut queue: VecDeque<(&SettlementId, &FormationId)> = VecDeque::new();
    for (corps_id, &seed) in &seeds {
        if partition.corps_by_settlement.contains_key(seed) {
            continue;
        }
        partition
            .corps_by_settlement
            .insert(seed.clone(), corps_id.clone());
        queue.push_back((seed, corps_id));
    }

    while let Some((current, corps_id)) = queue.pop_front() {
        for neighbor in graph.neighbors(current.as_str()) {
            let Some(neighbor) = territory.get(neighbor) else {
                continue;
            };
            if !control.is_controlled_by(neighbor.as_str(), faction)
                || partition.corps_by_settlement.contains_key(neighbor)
            {
                continue;
            }
            partition
                .corps_by_settlement
                .insert(neighbor.clone(), corps_id.clone());
            queue.push_back((neighbor, corps_id));
        }
    }

    for (sid, corps_id) in &partition.corps_by_settlement {
        partition
            .sector_by_corps
            .entry(corps_id.clone())
            .or_default()
            .insert(sid.clone());
    }
    partition
}

/// Walk the front-active settlements of a sector.
///
/// Each connected run of front-active settlements is walked breadth-first
/// from its smallest settlement id; runs are concatenated in order of that
/// id and municipalities are kept at their first appearance.
pub fn walk_sector_front(
    sector: &BTreeSet<SettlementId>,
    front_active: &BTreeSet<SettlementId>,
    graph: &SettlementGraph,
    municipalities: &BTreeMap<SettlementId, MunicipalityId>,
) -> FrontWalk {
    let sector_front: BTreeSet<&SettlementId> = sector
        .iter()
        .filter(|sid| front_active.contains(*sid))
        .collect();

    let mut walk = FrontWalk::default();
    let mut visited: BTreeSet<&SettlementId> = BTreeSet::new();
    let mut seen_municipalities: BTreeSet<&MunicipalityId> = BTreeSet::new();

    for &seed in &sector_front {
        if !visited.insert(seed) {
            continue;
        }
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            walk.settlement_order.push(current.clone());
            if let Some(municipality) = municipalities.get(current) {
                if seen_municipalities.insert(municipality) {
                    walk.municipality_order.push(municipality.clone());
                }
            }
            for neighbor in graph.neighbors(current.as_str()) {
                if let Some(&n) = sector_front.get(neighbor) {
                    if visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
    }
    walk
}

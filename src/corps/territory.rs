//! Disconnected-territory detection

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::types::SettlementId;
use crate::graph::{PoliticalControl, SettlementGraph};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectedTerritories {
    /// Largest connected component
    pub main_territory: BTreeSet<SettlementId>,
    /// Every other component, largest first, ties by smallest member id
    pub enclaves: Vec<BTreeSet<SettlementId>>,
}

impl DisconnectedTerritories {
    /// Main territory followed by enclaves
    pub fn components(&self) -> impl Iterator<Item = &BTreeSet<SettlementId>> {
        std::iter::once(&self.main_territory).chain(self.enclaves.iter())
    }
}

/// Connected components of `faction`'s territory over edges whose endpoints
/// it both controls
pub fn detect_disconnected_territories(
    faction: &str,
    control: &PoliticalControl,
    graph: &SettlementGraph,
) -> DisconnectedTerritories {
    let held = control.settlements_of(faction);
    let mut visited: BTreeSet<&SettlementId> = BTreeSet::new();
    let mut components: Vec<BTreeSet<SettlementId>> = Vec::new();

    for seed in &held {
        if !visited.insert(seed) {
            continue;
        }
        let mut component = BTreeSet::new();
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            component.insert(current.clone());
            for neighbor in graph.neighbors(current.as_str()) {
                if let Some(n) = held.get(neighbor) {
                    if visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        components.push(component);
    }

    components.sort_by(|x, y| {
        y.len()
            .cmp(&x.len())
            .then_with(|| x.first().cmp(&y.first()))
    });

    let mut components = components.into_iter();
    let main_territory = components.next().unwrap_or_default();
    DisconnectedTerritories {
        main_territory,
        enclaves: components.collect(),
    }
}

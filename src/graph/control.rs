//! Political control state
//!
//! Per-settlement controller. An explicit `null` means nobody holds the
//! settlement; a settlement missing from the map has unknown control. The
//! two are different: unknown never counts as controlled, and never counts
//! as contested either.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, SettlementId};

/// Control of a single settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus<'a> {
    Controlled(&'a FactionId),
    Uncontrolled,
    Unknown,
}

impl<'a> ControlStatus<'a> {
    pub fn faction(&self) -> Option<&'a FactionId> {
        match self {
            Self::Controlled(faction) => Some(faction),
            Self::Uncontrolled | Self::Unknown => None,
        }
    }

    pub fn is_controlled_by(&self, faction: &str) -> bool {
        matches!(self, Self::Controlled(f) if f.as_str() == faction)
    }
}

/// Settlement → controller map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoliticalControl {
    controllers: BTreeMap<SettlementId, Option<FactionId>>,
}

impl PoliticalControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(settlement, controller)` pairs; later pairs win
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let controllers = pairs
            .into_iter()
            .map(|(sid, faction)| (SettlementId::from(sid), faction.map(FactionId::from)))
            .collect();
        Self { controllers }
    }

    pub fn set(&mut self, settlement: SettlementId, controller: Option<FactionId>) {
        self.controllers.insert(settlement, controller);
    }

    pub fn status(&self, settlement: &str) -> ControlStatus<'_> {
        match self.controllers.get(settlement) {
            Some(Some(faction)) => ControlStatus::Controlled(faction),
            Some(None) => ControlStatus::Uncontrolled,
            None => ControlStatus::Unknown,
        }
    }

    pub fn controller(&self, settlement: &str) -> Option<&FactionId> {
        self.status(settlement).faction()
    }

    pub fn is_controlled_by(&self, settlement: &str, faction: &str) -> bool {
        self.status(settlement).is_controlled_by(faction)
    }

    /// Iterate `(settlement, controller)` in canonical settlement order
    pub fn iter(&self) -> impl Iterator<Item = (&SettlementId, Option<&FactionId>)> {
        self.controllers.iter().map(|(sid, f)| (sid, f.as_ref()))
    }

    /// All settlements with a (non-null) controller
    pub fn controlled(&self) -> impl Iterator<Item = (&SettlementId, &FactionId)> {
        self.controllers
            .iter()
            .filter_map(|(sid, f)| f.as_ref().map(|f| (sid, f)))
    }

    /// Settlements held by one faction, sorted
    pub fn settlements_of(&self, faction: &str) -> BTreeSet<SettlementId> {
        self.controlled()
            .filter(|(_, f)| f.as_str() == faction)
            .map(|(sid, _)| sid.clone())
            .collect()
    }

    /// Every faction that currently holds at least one settlement, sorted
    pub fn factions(&self) -> BTreeSet<FactionId> {
        self.controlled().map(|(_, f)| f.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

//! Formation records (brigades and corps)

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, FormationId, SettlementId};

/// Tag prefix that assigns a formation to a corps when `corps_id` is unset
pub const CORPS_TAG_PREFIX: &str = "corps:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationKind {
    #[default]
    Brigade,
    CorpsAsset,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationStatus {
    #[default]
    Active,
    Inactive,
    Disbanded,
    #[serde(other)]
    Other,
}

/// A formation of one faction, optionally subordinate to a corps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    pub id: FormationId,
    pub faction: FactionId,
    #[serde(default)]
    pub kind: FormationKind,
    #[serde(default)]
    pub status: FormationStatus,
    #[serde(default, alias = "hq_sid", skip_serializing_if = "Option::is_none")]
    pub hq: Option<SettlementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corps_id: Option<FormationId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Formation {
    pub fn new(id: &str, faction: &str) -> Self {
        Self {
            id: FormationId::from(id),
            faction: FactionId::from(faction),
            kind: FormationKind::Brigade,
            status: FormationStatus::Active,
            hq: None,
            corps_id: None,
            tags: Vec::new(),
        }
    }

    pub fn corps(id: &str, faction: &str, hq: &str) -> Self {
        Self::new(id, faction)
            .with_kind(FormationKind::CorpsAsset)
            .with_hq(hq)
    }

    pub fn with_kind(mut self, kind: FormationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_status(mut self, status: FormationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_hq(mut self, hq: &str) -> Self {
        self.hq = Some(SettlementId::from(hq));
        self
    }

    pub fn with_corps(mut self, corps_id: &str) -> Self {
        self.corps_id = Some(FormationId::from(corps_id));
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == FormationStatus::Active
    }

    /// Parent corps, from `corps_id` or else the first `corps:<id>` tag
    pub fn parent_corps(&self) -> Option<FormationId> {
        if let Some(id) = &self.corps_id {
            return Some(id.clone());
        }
        self.tags.iter().find_map(|tag| {
            let id = tag.strip_prefix(CORPS_TAG_PREFIX)?.trim();
            (!id.is_empty()).then(|| FormationId::from(id))
        })
    }
}

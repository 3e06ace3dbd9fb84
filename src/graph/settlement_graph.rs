//! Settlement contact graph
//!
//! Static undirected graph of settlements. Built once per turn from the raw
//! edge list and handed to every derivation by reference; nothing caches an
//! adjacency map behind the caller's back.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{EdgeId, SettlementId};

/// How two settlements touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    #[default]
    SharedBorder,
    PointTouch,
    DistanceContact,
}

impl ContactType {
    /// Coupling weight used when an edge carries no explicit weight
    pub fn base_weight(&self) -> f64 {
        match self {
            Self::SharedBorder => 1.0,
            Self::PointTouch => 0.7,
            Self::DistanceContact => 0.4,
        }
    }
}

/// Edge as it arrives from the adjacency data, endpoints in any order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub a: String,
    pub b: String,
    #[serde(default)]
    pub contact: ContactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl RawEdge {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: a.to_string(),
            b: b.to_string(),
            contact: ContactType::default(),
            weight: None,
        }
    }

    pub fn with_contact(mut self, contact: ContactType) -> Self {
        self.contact = contact;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Canonicalized contact edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEdge {
    pub id: EdgeId,
    pub contact: ContactType,
    pub weight: f64,
}

/// The settlement graph with sorted adjacency
#[derive(Debug, Clone, Default)]
pub struct SettlementGraph {
    settlements: BTreeSet<SettlementId>,
    edges: Vec<SettlementEdge>,
    edge_index: AHashMap<EdgeId, usize>,
    /// Per settlement: (neighbor, index into `edges`), sorted by neighbor
    adjacency: BTreeMap<SettlementId, Vec<(SettlementId, usize)>>,
}

impl SettlementGraph {
    /// Build the graph from raw edges.
    ///
    /// Self-loops are skipped, duplicate pairs keep their first occurrence,
    /// and invalid settlement ids are a hard error.
    pub fn from_edges(raw_edges: &[RawEdge]) -> Result<Self> {
        let mut by_id: BTreeMap<EdgeId, SettlementEdge> = BTreeMap::new();
        let mut self_loops = 0usize;
        let mut duplicates = 0usize;

        for raw in raw_edges {
            SettlementId::validate(&raw.a)?;
            SettlementId::validate(&raw.b)?;
            if raw.a == raw.b {
                self_loops += 1;
                continue;
            }
            let id = EdgeId::canonical(&raw.a, &raw.b)?;
            if by_id.contains_key(&id) {
                duplicates += 1;
                continue;
            }
            let weight = raw.weight.unwrap_or_else(|| raw.contact.base_weight());
            by_id.insert(
                id.clone(),
                SettlementEdge {
                    id,
                    contact: raw.contact,
                    weight,
                },
            );
        }

        if self_loops > 0 || duplicates > 0 {
            tracing::warn!(
                self_loops,
                duplicates,
                "skipped degenerate entries while building settlement graph"
            );
        }

        let edges: Vec<SettlementEdge> = by_id.into_values().collect();
        let mut settlements = BTreeSet::new();
        let mut adjacency: BTreeMap<SettlementId, Vec<(SettlementId, usize)>> = BTreeMap::new();
        let mut edge_index = AHashMap::with_capacity(edges.len());

        for (idx, edge) in edges.iter().enumerate() {
            let (a, b) = edge.id.endpoints();
            let a = SettlementId::from(a);
            let b = SettlementId::from(b);
            settlements.insert(a.clone());
            settlements.insert(b.clone());
            adjacency.entry(a.clone()).or_default().push((b.clone(), idx));
            adjacency.entry(b).or_default().push((a, idx));
            edge_index.insert(edge.id.clone(), idx);
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_by(|x, y| x.0.cmp(&y.0));
        }

        Ok(Self {
            settlements,
            edges,
            edge_index,
            adjacency,
        })
    }

    /// Add settlements that have no contact edges
    pub fn with_settlements<I, S>(mut self, settlements: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for sid in settlements {
            let sid = sid.as_ref();
            SettlementId::validate(sid)?;
            self.settlements.insert(SettlementId::from(sid));
        }
        Ok(self)
    }

    pub fn settlements(&self) -> &BTreeSet<SettlementId> {
        &self.settlements
    }

    pub fn contains(&self, settlement: &str) -> bool {
        self.settlements.contains(settlement)
    }

    pub fn settlement_count(&self) -> usize {
        self.settlements.len()
    }

    /// All edges, sorted by edge id
    pub fn edges(&self) -> &[SettlementEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: &str) -> Option<&SettlementEdge> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx])
    }

    pub fn has_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    fn adjacent(&self, settlement: &str) -> &[(SettlementId, usize)] {
        self.adjacency
            .get(settlement)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Neighbors of a settlement in canonical order
    pub fn neighbors(&self, settlement: &str) -> impl Iterator<Item = &SettlementId> + '_ {
        self.adjacent(settlement).iter().map(|(sid, _)| sid)
    }

    /// `(neighbor, connecting edge)` pairs in canonical neighbor order
    pub fn incident_edges(
        &self,
        settlement: &str,
    ) -> impl Iterator<Item = (&SettlementId, &SettlementEdge)> + '_ {
        self.adjacent(settlement)
            .iter()
            .map(|(sid, idx)| (sid, &self.edges[*idx]))
    }

    pub fn degree(&self, settlement: &str) -> usize {
        self.adjacent(settlement).len()
    }
}

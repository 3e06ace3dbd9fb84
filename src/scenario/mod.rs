//! Scenario files and generated scenarios

pub mod generation;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::graph::{RawEdge, SettlementGraph};
use crate::turn::TurnState;

pub use generation::{generate_grid_scenario, settlement_id, GridScenarioConfig};

/// Static adjacency plus the initial turn state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub edges: Vec<RawEdge>,
    pub state: TurnState,
}

impl Scenario {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build the settlement graph, including settlements that only appear in
    /// the control map
    pub fn graph(&self) -> Result<SettlementGraph> {
        SettlementGraph::from_edges(&self.edges)?.with_settlements(
            self.state
                .political_controllers
                .iter()
                .map(|(sid, _)| sid.as_str()),
        )
    }
}

//! Per-turn derivation suite
//!
//! Order is fixed: eligibility (pure) -> diffusion (the single write, to
//! front pressure) -> every other derivation as a pure read over the
//! post-diffusion state. Nothing derived here is cached across turns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::DerivationConfig;
use crate::core::error::Result;
use crate::core::types::{EdgeId, FormationId, MunicipalityId, SettlementId, Turn};
use crate::corps::{derive_corps_report, CorpsReport};
use crate::forces::{FactionRecord, Formation};
use crate::front::{
    advance_front_segments, derive_aor_membership, derive_rear_zone, diffuse_pressure,
    eligible_pressure_edges, AorMembership, DiffusionReport, FrontState, RearZone,
};
use crate::graph::{PoliticalControl, SettlementGraph};
use crate::supply::{
    compute_supply_reachability, derive_corridor_states, derive_supply_states, CorridorGrant,
    CorridorReport, ReachabilityReport, SupplyStateReport,
};

/// Everything the suite reads, plus the front state it writes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    #[serde(default)]
    pub turn: Turn,
    #[serde(default)]
    pub political_controllers: PoliticalControl,
    #[serde(default)]
    pub factions: Vec<FactionRecord>,
    #[serde(default)]
    pub formations: BTreeMap<FormationId, Formation>,
    #[serde(flatten)]
    pub front: FrontState,
    #[serde(default)]
    pub supply_rights: Vec<CorridorGrant>,
    /// Settlement to municipality, used only to order front walks
    #[serde(default)]
    pub municipalities: BTreeMap<SettlementId, MunicipalityId>,
}

impl TurnState {
    pub fn new(turn: Turn) -> Self {
        Self {
            turn,
            ..Self::default()
        }
    }

    pub fn add_formation(&mut self, formation: Formation) {
        self.formations.insert(formation.id.clone(), formation);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: Turn,
    pub eligible_edges: Vec<EdgeId>,
    pub diffusion: DiffusionReport,
    pub aor: AorMembership,
    pub rear_zone: RearZone,
    pub reachability: ReachabilityReport,
    pub corridors: CorridorReport,
    pub supply_states: SupplyStateReport,
    pub corps: CorpsReport,
}

/// Run the full derivation suite for `state.turn`.
///
/// Only `state.front.front_pressure` may change; control, formations and
/// everything else are read-only.
pub fn run_turn(
    state: &mut TurnState,
    graph: &SettlementGraph,
    config: &DerivationConfig,
) -> Result<TurnReport> {
    let turn = state.turn;
    let eligible = eligible_pressure_edges(&state.political_controllers, graph, &config.eligibility);

    let diffusion = diffuse_pressure(&mut state.front, graph, &eligible, turn, &config.diffusion)?;

    let state: &TurnState = state;
    let control: &PoliticalControl = &state.political_controllers;

    let aor = derive_aor_membership(&eligible, &state.front, &state.formations, &config.aor);
    let rear_zone = derive_rear_zone(control, &eligible);
    let reachability =
        compute_supply_reachability(control, graph, &state.factions, &state.supply_rights, turn);
    let corridors = derive_corridor_states(&reachability, control, graph);
    let supply_states = derive_supply_states(&reachability, &corridors);
    let corps = derive_corps_report(
        control,
        graph,
        &state.factions,
        &state.formations,
        &eligible,
        &state.municipalities,
    );

    tracing::info!(
        turn,
        eligible = eligible.len(),
        diffusion_applied = diffusion.applied,
        aor_formations = aor.by_formation.len(),
        rear = rear_zone.len(),
        "turn derived"
    );

    Ok(TurnReport {
        turn,
        eligible_edges: eligible.into_iter().map(|edge| edge.id).collect(),
        diffusion,
        aor,
        rear_zone,
        reachability,
        corridors,
        supply_states,
        corps,
    })
}

/// Orchestrator step: advance segment activity, run the suite, move the
/// clock forward
pub fn advance_turn(
    state: &mut TurnState,
    graph: &SettlementGraph,
    config: &DerivationConfig,
) -> Result<TurnReport> {
    let eligible = eligible_pressure_edges(&state.political_controllers, graph, &config.eligibility);
    advance_front_segments(&mut state.front, &eligible, state.turn);
    let report = run_turn(state, graph, config)?;
    state.turn += 1;
    Ok(report)
}

//! Supply layer: corridor rights, reachability, corridor and supply states

pub mod corridor_rights;
pub mod corridor_state;
pub mod reachability;

pub use corridor_rights::{resolve_corridor_rights, CorridorGrant, CorridorRights, CorridorScope};
pub use corridor_state::{
    derive_corridor_states, derive_supply_states, edge_disconnects_endpoints, CorridorCounts,
    CorridorReport, CorridorState, FactionCorridors, FactionSupplyStates, SupplyState,
    SupplyStateCounts, SupplyStateReport,
};
pub use reachability::{
    compute_supply_reachability, FactionReachability, ReachabilityReport, REACHABILITY_SCHEMA,
};

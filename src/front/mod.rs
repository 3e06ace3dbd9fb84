//! Front layer: eligibility, pressure state, diffusion, AoR and rear zones

pub mod aor;
pub mod diffusion;
pub mod eligibility;
pub mod rear_zone;
pub mod state;

pub use aor::{
    derive_aor_membership, front_active_settlements, is_settlement_front_active,
    sustained_edges, AorEntry, AorMembership,
};
pub use diffusion::{diffuse_pressure, DiffusionReport, DiffusionStats, NotAppliedReason};
pub use eligibility::{eligible_pressure_edges, PressureEdge};
pub use rear_zone::{derive_rear_zone, RearZone};
pub use state::{advance_front_segments, FrontSegment, FrontState, PressureField, PressureRecord};

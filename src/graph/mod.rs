//! Settlement graph and political control primitives

pub mod control;
pub mod settlement_graph;

pub use control::{ControlStatus, PoliticalControl};
pub use settlement_graph::{ContactType, RawEdge, SettlementEdge, SettlementGraph};

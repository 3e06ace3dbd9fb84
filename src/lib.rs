//! Frontline - deterministic front, supply and corps derivations
//!
//! Each turn the suite turns raw control and adjacency into front pressure,
//! areas of responsibility, rear zones, supply reachability, corridor
//! robustness and corps sectors. Every derivation is recomputed from scratch
//! and ordered canonically, so identical input gives byte-identical output.

pub mod core;
pub mod corps;
pub mod forces;
pub mod front;
pub mod graph;
pub mod scenario;
pub mod supply;
pub mod turn;

pub use crate::core::config::DerivationConfig;
pub use crate::core::error::{FrontError, Result};
pub use crate::turn::{advance_turn, run_turn, TurnReport, TurnState};

pub mod config;
pub mod error;
pub mod types;

pub use config::DerivationConfig;
pub use error::{FrontError, Result};
pub use types::{
    canonical_cmp, EdgeId, FactionId, FormationId, MunicipalityId, SettlementId, Turn,
};

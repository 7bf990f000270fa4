//! Configuration loaded from `~/mentor/config.json`.

mod schema;

pub use schema::{
    API_KEY_ENV, AgentDefaults, AgentsConfig, Config, EstimatorKind, MemoryConfig, ProviderConfig,
    ProvidersConfig,
};

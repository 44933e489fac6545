pub mod config;
pub mod promoter;

pub use config::{
    AgentSettings, CatalogSettings, LlmSettings, RetrievalSettings, SandboxSettings,
    StorageSettings,
};
pub use promoter::{AffiliatePromoterAgent, StageOutput};

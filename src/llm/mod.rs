pub mod extract;
pub mod openrouter;
pub mod provider;

pub use extract::extract_code_blocks;
pub use openrouter::OpenRouterProvider;
pub use provider::CodeGenerationBackend;

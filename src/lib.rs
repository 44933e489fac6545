pub mod core;
pub mod conversation;
pub mod prompts;

// Backend and execution collaborators
pub mod llm;
pub mod sandbox;
pub mod sensor;
pub mod rag;
pub mod db;

// Marketplaces, content and publishing
pub mod catalog;

// The staged controller and its settings
pub mod agent;

// Cycle orchestration
pub mod flow;

// Optional components
pub mod cli;
pub mod logging;

#[cfg(test)]
mod testing;

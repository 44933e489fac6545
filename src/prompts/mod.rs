//! Prompt templates
//!
//! - `TemplateName` / schema - which placeholders each template must declare
//! - `PromptTemplateStore` - template set validated at construction
//! - `PromptGenerator` - typed rendering, one method per prompt purpose

mod defaults;
mod generator;
mod schema;
mod store;

pub use defaults::{default_prompts, default_template, DEFAULT_API_DESCRIPTOR};
pub use generator::PromptGenerator;
pub use schema::{extract_placeholders, render, TemplateName};
pub use store::PromptTemplateStore;

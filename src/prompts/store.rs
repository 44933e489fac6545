//! Validated prompt template store

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use super::defaults::{default_prompts, default_template};
use super::schema::{braced, extract_placeholders, TemplateName};
use crate::core::{AgentError, AgentResult, ConfigurationError};

/// Named prompt templates checked against the placeholder schema.
///
/// Built once per agent and immutable afterwards.
#[derive(Debug, Clone)]
pub struct PromptTemplateStore {
    templates: HashMap<TemplateName, String>,
}

impl PromptTemplateStore {
    /// Build a store from a custom template map, or the defaults when `None`.
    pub fn new(prompts: Option<HashMap<String, String>>) -> Result<Self, ConfigurationError> {
        let prompts = prompts.unwrap_or_else(default_prompts);
        Self::validate(&prompts)?;

        let templates = TemplateName::ALL
            .into_iter()
            .filter_map(|name| {
                prompts
                    .get(name.as_str())
                    .map(|body| (name, body.clone()))
            })
            .collect();

        Ok(Self { templates })
    }

    /// Load a custom template set from a JSON object of `name -> body`
    pub fn from_json_file(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let prompts: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse prompt file {:?}", path))
            .map_err(|e| ConfigurationError::invalid(format!("{:#}", e)))?;

        tracing::info!("[Prompts] Loaded {} custom templates from {:?}", prompts.len(), path);
        Self::new(Some(prompts)).map_err(AgentError::from)
    }

    /// Check a template map against the schema.
    ///
    /// Keys outside the schema are ignored.
    pub fn validate(prompts: &HashMap<String, String>) -> Result<(), ConfigurationError> {
        let missing_templates: Vec<String> = TemplateName::ALL
            .into_iter()
            .filter(|name| !prompts.contains_key(name.as_str()))
            .map(|name| name.as_str().to_string())
            .collect();
        if !missing_templates.is_empty() {
            return Err(ConfigurationError::MissingTemplates(missing_templates));
        }

        for name in TemplateName::ALL {
            let Some(body) = prompts.get(name.as_str()) else {
                continue;
            };
            let actual = extract_placeholders(body);
            let required = name.required_set();

            let missing: Vec<&String> = required.difference(&actual).collect();
            if !missing.is_empty() {
                return Err(ConfigurationError::MissingPlaceholders {
                    template: name.as_str().to_string(),
                    placeholders: braced(missing),
                });
            }

            let unexpected: Vec<&String> = actual.difference(&required).collect();
            if !unexpected.is_empty() {
                return Err(ConfigurationError::UnexpectedPlaceholders {
                    template: name.as_str().to_string(),
                    placeholders: braced(unexpected),
                });
            }
        }

        for key in prompts.keys() {
            if TemplateName::from_key(key).is_none() {
                tracing::debug!("[Prompts] Ignoring unknown template: {}", key);
            }
        }

        Ok(())
    }

    /// Template body for `name`
    pub fn get(&self, name: TemplateName) -> &str {
        self.templates
            .get(&name)
            .map(String::as_str)
            .unwrap_or_else(|| default_template(name))
    }
}

impl Default for PromptTemplateStore {
    fn default() -> Self {
        Self {
            templates: TemplateName::ALL
                .into_iter()
                .map(|name| (name, default_template(name).to_string()))
                .collect(),
        }
    }
}

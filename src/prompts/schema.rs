//! Required placeholder schema
//!
//! The placeholder set each template must declare is written down here
//! explicitly rather than recovered from the default template bodies, so
//! editing a default never silently changes what custom templates are
//! checked against.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Names of the templates an agent renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateName {
    SystemPrompt,
    ResearchCodePromptFirst,
    ResearchCodePrompt,
    StrategyPrompt,
    AffiliatePromoterCodePrompt,
    RegenCodePrompt,
}

impl TemplateName {
    pub const ALL: [TemplateName; 6] = [
        TemplateName::SystemPrompt,
        TemplateName::ResearchCodePromptFirst,
        TemplateName::ResearchCodePrompt,
        TemplateName::StrategyPrompt,
        TemplateName::AffiliatePromoterCodePrompt,
        TemplateName::RegenCodePrompt,
    ];

    /// Key used for this template in a custom template map
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateName::SystemPrompt => "system_prompt",
            TemplateName::ResearchCodePromptFirst => "research_code_prompt_first",
            TemplateName::ResearchCodePrompt => "research_code_prompt",
            TemplateName::StrategyPrompt => "strategy_prompt",
            TemplateName::AffiliatePromoterCodePrompt => "affiliate_promoter_code_prompt",
            TemplateName::RegenCodePrompt => "regen_code_prompt",
        }
    }

    /// Placeholder names (without braces) this template must declare
    pub fn required_placeholders(&self) -> &'static [&'static str] {
        match self {
            TemplateName::SystemPrompt => {
                &["role", "today_date", "metric_name", "time", "metric_state"]
            }
            TemplateName::ResearchCodePromptFirst => &["apis_str"],
            TemplateName::ResearchCodePrompt => &[
                "notifications_str",
                "prev_strategy",
                "rag_summary",
                "before_metric_state",
                "after_metric_state",
            ],
            TemplateName::StrategyPrompt => {
                &["notifications_str", "research_output_str", "metric_name", "time"]
            }
            TemplateName::AffiliatePromoterCodePrompt => &["strategy_output", "apis_str"],
            TemplateName::RegenCodePrompt => &["errors", "previous_code"],
        }
    }

    /// Required placeholders as a set of names
    pub fn required_set(&self) -> BTreeSet<String> {
        self.required_placeholders()
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == key)
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collect the names of every `{name}` marker in a template body
pub fn extract_placeholders(body: &str) -> BTreeSet<String> {
    PLACEHOLDER_PATTERN
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Substitute `{name}` markers in a single pass.
///
/// Values are inserted verbatim: braces inside a value are never expanded.
/// Markers with no matching value are left in place.
pub fn render(body: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(body, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match values.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => value.to_string(),
                None => {
                    tracing::warn!("[Prompts] No value supplied for placeholder {{{}}}", name);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Format placeholder names the way error messages report them
pub(crate) fn braced<'a>(names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    names.into_iter().map(|n| format!("{{{}}}", n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_placeholders() {
        let found = extract_placeholders("Hi {role}, today is {today_date}. Again {role}.");
        let expected: BTreeSet<String> = ["role", "today_date"].iter().map(|s| s.to_string()).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_extract_ignores_empty_braces() {
        assert!(extract_placeholders("no markers {} here").is_empty());
    }

    #[test]
    fn test_render_is_single_pass() {
        let rendered = render("code: {previous_code}", &[("previous_code", "print(f\"{x}\")")]);
        assert_eq!(rendered, "code: print(f\"{x}\")");
    }

    #[test]
    fn test_render_leaves_unknown_markers() {
        assert_eq!(render("{a} and {b}", &[("a", "1")]), "1 and {b}");
    }

    #[test]
    fn test_template_keys_round_trip() {
        for name in TemplateName::ALL {
            assert_eq!(TemplateName::from_key(name.as_str()), Some(name));
        }
        assert_eq!(TemplateName::from_key("unknown_prompt"), None);
    }
}

//! Stages of a promotion cycle

use serde::{Deserialize, Serialize};
use std::fmt;

/// One sub-step of a cycle that calls the code-generation backend.
///
/// Each stage follows the same pattern: render a prompt, call the backend
/// with the accumulated history, unwrap the reply, extend a stage-local history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Research with no prior context
    ResearchFirst,
    /// Research informed by notifications, the previous strategy and retrieval
    Research,
    /// Strategy formulation from research output
    Strategy,
    /// Code that implements the chosen strategy
    PromotionCode,
    /// Fix for code that failed in the sandbox
    Regeneration,
}

impl Stage {
    /// Name of the agent method that runs this stage
    pub fn method_name(&self) -> &'static str {
        match self {
            Stage::ResearchFirst => "gen_research_code_on_first",
            Stage::Research => "gen_research_code",
            Stage::Strategy => "gen_strategy",
            Stage::PromotionCode => "gen_affiliate_promoter_code",
            Stage::Regeneration => "gen_better_code",
        }
    }

    /// Whether the stage asks the backend for extracted code rather than plain text
    pub fn expects_code(&self) -> bool {
        matches!(self, Stage::PromotionCode | Stage::Regeneration)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

//! Prompt rendering
//!
//! One method per prompt purpose. Each takes exactly the values its template
//! declares, so a call site cannot forget or misname a placeholder.

use chrono::{Local, NaiveDate};

use super::defaults::DEFAULT_API_DESCRIPTOR;
use super::schema::{render, TemplateName};
use super::store::PromptTemplateStore;

/// Renders prompts from a validated template store
#[derive(Debug, Clone, Default)]
pub struct PromptGenerator {
    store: PromptTemplateStore,
    /// Date used for `{today_date}`; today in local time when unset
    fixed_date: Option<NaiveDate>,
}

impl PromptGenerator {
    pub fn new(store: PromptTemplateStore) -> Self {
        Self {
            store,
            fixed_date: None,
        }
    }

    /// Pin `{today_date}` to a specific date
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn store(&self) -> &PromptTemplateStore {
        &self.store
    }

    fn today(&self) -> String {
        self.fixed_date
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Join API descriptors, falling back to the built-in descriptor
    fn apis_str(apis: &[String]) -> String {
        if apis.is_empty() {
            DEFAULT_API_DESCRIPTOR.to_string()
        } else {
            apis.join(",\n")
        }
    }

    /// System prompt setting the agent's role, date, goal and current metric
    pub fn generate_system_prompt(
        &self,
        role: &str,
        time: &str,
        metric_name: &str,
        metric_state: &str,
    ) -> String {
        let today_date = self.today();
        render(
            self.store.get(TemplateName::SystemPrompt),
            &[
                ("role", role),
                ("today_date", &today_date),
                ("metric_name", metric_name),
                ("time", time),
                ("metric_state", metric_state),
            ],
        )
    }

    /// Research prompt for an agent with no prior context
    pub fn generate_research_code_prompt_first(&self, apis: &[String]) -> String {
        let apis_str = Self::apis_str(apis);
        render(
            self.store.get(TemplateName::ResearchCodePromptFirst),
            &[("apis_str", &apis_str)],
        )
    }

    /// Research prompt informed by notifications, the previous strategy and retrieval
    pub fn generate_research_code_prompt(
        &self,
        notifications_str: &str,
        prev_strategy: &str,
        rag_summary: &str,
        before_metric_state: &str,
        after_metric_state: &str,
    ) -> String {
        render(
            self.store.get(TemplateName::ResearchCodePrompt),
            &[
                ("notifications_str", notifications_str),
                ("prev_strategy", prev_strategy),
                ("rag_summary", rag_summary),
                ("before_metric_state", before_metric_state),
                ("after_metric_state", after_metric_state),
            ],
        )
    }

    pub fn generate_strategy_prompt(
        &self,
        notifications_str: &str,
        research_output_str: &str,
        metric_name: &str,
        time: &str,
    ) -> String {
        render(
            self.store.get(TemplateName::StrategyPrompt),
            &[
                ("notifications_str", notifications_str),
                ("research_output_str", research_output_str),
                ("metric_name", metric_name),
                ("time", time),
            ],
        )
    }

    /// Prompt asking for code that implements a strategy
    pub fn generate_affiliate_promoter_code_prompt(
        &self,
        strategy_output: &str,
        apis: &[String],
    ) -> String {
        let apis_str = Self::apis_str(apis);
        render(
            self.store.get(TemplateName::AffiliatePromoterCodePrompt),
            &[("strategy_output", strategy_output), ("apis_str", &apis_str)],
        )
    }

    /// Prompt asking for a fix to code that failed
    pub fn regen_code(&self, previous_code: &str, errors: &str) -> String {
        render(
            self.store.get(TemplateName::RegenCodePrompt),
            &[("errors", errors), ("previous_code", previous_code)],
        )
    }
}

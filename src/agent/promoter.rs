//! AffiliatePromoterAgent - the staged generation controller
//!
//! Every stage renders one prompt, sends it to the backend on top of the
//! accumulated history, and hands back the reply together with a
//! stage-local history (`prompt`, `reply`). Nothing is merged into the
//! accumulated history until the caller decides the stage output is worth
//! keeping (`extend_history`).

use std::sync::Arc;

use crate::conversation::{ChatHistory, Message};
use crate::core::{GenerationError, Stage};
use crate::llm::CodeGenerationBackend;
use crate::prompts::PromptGenerator;

/// Text (or code) produced by a stage, plus the stage-local history
pub type StageOutput = (String, ChatHistory);

pub struct AffiliatePromoterAgent {
    agent_id: String,
    backend: Arc<dyn CodeGenerationBackend>,
    prompts: PromptGenerator,
    chat_history: ChatHistory,
}

impl AffiliatePromoterAgent {
    pub fn new(
        agent_id: impl Into<String>,
        backend: Arc<dyn CodeGenerationBackend>,
        prompts: PromptGenerator,
    ) -> Self {
        let agent_id = agent_id.into();
        tracing::info!(
            "[Agent] Created {} on {} ({})",
            agent_id,
            backend.provider_name(),
            backend.model()
        );

        Self {
            agent_id,
            backend,
            prompts,
            chat_history: ChatHistory::empty(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Accumulated history sent ahead of every stage prompt
    pub fn chat_history(&self) -> &ChatHistory {
        &self.chat_history
    }

    pub fn prompts(&self) -> &PromptGenerator {
        &self.prompts
    }

    /// Forget the accumulated history
    pub fn reset(&mut self) {
        tracing::debug!(
            "[Agent] Reset, dropping {} messages",
            self.chat_history.len()
        );
        self.chat_history = ChatHistory::empty();
    }

    /// Merge a stage history into the accumulated one
    pub fn extend_history(&mut self, stage_history: &ChatHistory) {
        self.chat_history = &self.chat_history + stage_history;
    }

    /// Single system message for the start of a cycle. Does not call the backend.
    pub fn prepare_system(
        &self,
        role: &str,
        time: &str,
        metric_name: &str,
        metric_state: &str,
    ) -> ChatHistory {
        ChatHistory::from_message(Message::system(self.prompts.generate_system_prompt(
            role,
            time,
            metric_name,
            metric_state,
        )))
    }

    pub async fn gen_research_code_on_first(
        &self,
        apis: &[String],
    ) -> Result<StageOutput, GenerationError> {
        let prompt = self.prompts.generate_research_code_prompt_first(apis);
        self.run_stage(Stage::ResearchFirst, prompt).await
    }

    pub async fn gen_research_code(
        &self,
        notifications_str: &str,
        prev_strategy: &str,
        rag_summary: &str,
        before_metric_state: &str,
        after_metric_state: &str,
    ) -> Result<StageOutput, GenerationError> {
        let prompt = self.prompts.generate_research_code_prompt(
            notifications_str,
            prev_strategy,
            rag_summary,
            before_metric_state,
            after_metric_state,
        );
        self.run_stage(Stage::Research, prompt).await
    }

    pub async fn gen_strategy(
        &self,
        notifications_str: &str,
        research_output_str: &str,
        metric_name: &str,
        time: &str,
    ) -> Result<StageOutput, GenerationError> {
        let prompt = self.prompts.generate_strategy_prompt(
            notifications_str,
            research_output_str,
            metric_name,
            time,
        );
        self.run_stage(Stage::Strategy, prompt).await
    }

    /// Code implementing `strategy_output`. Returns the first extracted block.
    pub async fn gen_affiliate_promoter_code(
        &self,
        strategy_output: &str,
        apis: &[String],
    ) -> Result<StageOutput, GenerationError> {
        let prompt = self
            .prompts
            .generate_affiliate_promoter_code_prompt(strategy_output, apis);
        self.run_stage(Stage::PromotionCode, prompt).await
    }

    /// Fixed version of `prev_code` given the errors it produced
    pub async fn gen_better_code(
        &self,
        prev_code: &str,
        errors: &str,
    ) -> Result<StageOutput, GenerationError> {
        let prompt = self.prompts.regen_code(prev_code, errors);
        self.run_stage(Stage::Regeneration, prompt).await
    }

    async fn run_stage(&self, stage: Stage, prompt: String) -> Result<StageOutput, GenerationError> {
        let stage_history = ChatHistory::from_message(Message::user(prompt));
        let request = &self.chat_history + &stage_history;

        tracing::info!(
            "[Agent] {} ({} messages in context)",
            stage,
            request.len()
        );

        let (output, raw) = if stage.expects_code() {
            let (codes, raw) = self
                .backend
                .generate_code(&request)
                .await
                .map_err(|e| GenerationError::new(stage, format!("{:#}", e)))?;

            tracing::debug!("[Agent] {} produced {} code candidates", stage, codes.len());
            let first = codes
                .into_iter()
                .next()
                .ok_or_else(|| GenerationError::new(stage, "backend returned no code candidates"))?;
            (first, raw)
        } else {
            let text = self
                .backend
                .completion(&request)
                .await
                .map_err(|e| GenerationError::new(stage, format!("{:#}", e)))?;
            (text.clone(), text)
        };

        Ok((output, stage_history.append(Message::assistant(raw))))
    }
}

impl std::fmt::Debug for AffiliatePromoterAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffiliatePromoterAgent")
            .field("agent_id", &self.agent_id)
            .field("provider", &self.backend.provider_name())
            .field("model", &self.backend.model())
            .field("chat_history_len", &self.chat_history.len())
            .finish()
    }
}

//! One unassisted promotion cycle
//!
//! ```text
//! reset -> system prompt -> research code -> run (+regen) -> strategy
//!       -> promotion code -> run (+regen) -> record -> product pass
//! ```

use std::sync::Arc;

use serde_json::{json, Value};

use super::promotion::{ProductPromotion, PromotionReport};
use crate::agent::AffiliatePromoterAgent;
use crate::core::{AgentError, AgentResult};
use crate::db::PersistenceClient;
use crate::llm::extract_code_blocks;
use crate::rag::{RetrievalClient, ScoredStrategy, StrategyData};
use crate::sandbox::{CodeExecutionSandbox, ExecutionOutput};
use crate::sensor::MetricsSensor;

pub const NO_RELEVANT_STRATEGIES: &str = "No relevant strategies";
const NO_NOTIFICATIONS: &str = "No new notifications";
const UNKNOWN_METRIC_STATE: &str = "Unknown";

/// Collaborators a cycle calls out to
pub struct AgentServices {
    pub sandbox: Arc<dyn CodeExecutionSandbox>,
    pub sensor: Arc<dyn MetricsSensor>,
    pub persistence: Arc<dyn PersistenceClient>,
    /// Strategy lookup and saving are skipped when unset
    pub retrieval: Option<Arc<dyn RetrievalClient>>,
    /// Product discovery and publishing after the strategy cycle
    pub promotion: Option<ProductPromotion>,
    pub session_id: String,
    /// Regeneration attempts after a failed run
    pub max_code_retries: u32,
}

/// Goal and context for one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    pub role: String,
    pub time: String,
    pub metric_name: String,
    pub apis: Vec<String>,
    /// Strategy carried out in the previous cycle
    pub prev_strategy: Option<StrategyData>,
    /// What happened in the environment since then
    pub notification: Option<String>,
}

/// What a cycle did
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub research_code: String,
    pub research_output: ExecutionOutput,
    pub strategy: String,
    pub promotion_code: String,
    pub promotion_output: ExecutionOutput,
    /// Regenerations needed across both runs
    pub regenerations: u32,
    pub metric_before: i64,
    pub metric_after: i64,
    /// The strategy record persisted for this cycle
    pub strategy_record: StrategyData,
    pub promotion: Option<PromotionReport>,
}

/// Turn retrieved strategies into the `{rag_summary}` text
pub fn summarize_strategies(strategies: &[ScoredStrategy]) -> String {
    if strategies.is_empty() {
        return NO_RELEVANT_STRATEGIES.to_string();
    }
    strategies
        .iter()
        .map(|s| s.strategy.summarized_desc.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run a full cycle for `inputs`
pub async fn unassisted_flow(
    agent: &mut AffiliatePromoterAgent,
    services: &AgentServices,
    inputs: &CycleInputs,
) -> AgentResult<CycleReport> {
    agent.reset();
    tracing::info!("[Flow] Starting cycle for {}", agent.agent_id());

    let metric_before = read_metric(services, &inputs.metric_name).await?;
    let system = agent.prepare_system(
        &inputs.role,
        &inputs.time,
        &inputs.metric_name,
        &metric_before.to_string(),
    );
    agent.extend_history(&system);

    // Research: contextual whenever there is a previous strategy, even without notifications
    let (research_text, research_history) = match inputs.prev_strategy {
        Some(ref prev) => {
            let rag_summary = match inputs.notification {
                Some(ref notification) => retrieve_summary(services, notification).await,
                None => NO_RELEVANT_STRATEGIES.to_string(),
            };
            let notification = inputs.notification.as_deref().unwrap_or(NO_NOTIFICATIONS);
            let params = prev.parameter_map();
            let metric_state = |key: &str| {
                params
                    .get(key)
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| UNKNOWN_METRIC_STATE.to_string())
            };
            agent
                .gen_research_code(
                    notification,
                    &prev.summarized_desc,
                    &rag_summary,
                    &metric_state("metric_before"),
                    &metric_state("metric_after"),
                )
                .await?
        }
        None => agent.gen_research_code_on_first(&inputs.apis).await?,
    };
    agent.extend_history(&research_history);

    let research_code = extract_code_blocks(&research_text)
        .into_iter()
        .next()
        .unwrap_or(research_text);
    let (research_code, research_output, research_regens) =
        execute_with_regen(agent, services, research_code).await?;
    tracing::info!("[Flow] Research output: {} chars", research_output.stdout.len());

    // Strategy
    let notification = inputs.notification.as_deref().unwrap_or(NO_NOTIFICATIONS);
    let (strategy, strategy_history) = agent
        .gen_strategy(
            notification,
            &research_output.stdout,
            &inputs.metric_name,
            &inputs.time,
        )
        .await?;
    agent.extend_history(&strategy_history);
    tracing::info!("[Flow] Strategy: {}", strategy);

    // Promotion code
    let (code, code_history) = agent
        .gen_affiliate_promoter_code(&strategy, &inputs.apis)
        .await?;
    agent.extend_history(&code_history);
    let (promotion_code, promotion_output, promotion_regens) =
        execute_with_regen(agent, services, code).await?;

    let metric_after = read_metric(services, &inputs.metric_name).await?;
    tracing::info!(
        "[Flow] {}: {} -> {}",
        inputs.metric_name,
        metric_before,
        metric_after
    );

    // Record
    let mut strategy_record = StrategyData::new(agent.agent_id(), &strategy, &promotion_code)
        .with_result(promotion_output.stdout.clone());
    strategy_record.parameters = json!({
        "metric_name": inputs.metric_name,
        "metric_before": metric_before.to_string(),
        "metric_after": metric_after.to_string(),
    });
    if let Some(ref notification) = inputs.notification {
        strategy_record = strategy_record.with_notification(notification.clone());
    }

    services
        .persistence
        .insert_chat_history(&services.session_id, agent.chat_history())
        .await
        .map_err(|e| AgentError::collaborator("Failed to persist chat history", e))?;
    services
        .persistence
        .insert_strategy_and_result(&strategy_record)
        .await
        .map_err(|e| AgentError::collaborator("Failed to persist strategy", e))?;

    if let Some(ref retrieval) = services.retrieval {
        if let Err(e) = retrieval.save_result_batch(std::slice::from_ref(&strategy_record)).await {
            tracing::warn!("[Flow] Could not save strategy for retrieval: {:#}", e);
        }
    }

    let promotion = match services.promotion {
        Some(ref promotion) => Some(promotion.run().await),
        None => None,
    };

    tracing::info!("[Flow] Cycle complete");

    Ok(CycleReport {
        research_code,
        research_output,
        strategy,
        promotion_code,
        promotion_output,
        regenerations: research_regens + promotion_regens,
        metric_before,
        metric_after,
        strategy_record,
        promotion,
    })
}

/// Run `code`, asking for fixes until it runs cleanly or retries run out.
///
/// Only the exchange that produced working code is kept in the agent's
/// history; failed fix attempts are dropped.
pub async fn execute_with_regen(
    agent: &mut AffiliatePromoterAgent,
    services: &AgentServices,
    mut code: String,
) -> AgentResult<(String, ExecutionOutput, u32)> {
    let mut regenerations = 0;
    let mut pending_history = None;

    loop {
        let output = services
            .sandbox
            .run(&code)
            .await
            .map_err(|e| AgentError::collaborator("Sandbox could not run code", e))?;

        if !output.failed() {
            if let Some(history) = pending_history {
                agent.extend_history(&history);
            }
            return Ok((code, output, regenerations));
        }

        let errors = output.error_text();
        if regenerations >= services.max_code_retries {
            tracing::error!(
                "[Flow] Code still failing after {} regenerations",
                regenerations
            );
            return Err(AgentError::Execution(format!(
                "code still failing after {} regenerations:\n{}",
                regenerations, errors
            )));
        }

        regenerations += 1;
        tracing::warn!(
            "[Flow] Run failed, regenerating ({}/{})",
            regenerations,
            services.max_code_retries
        );
        let (fixed, history) = agent.gen_better_code(&code, &errors).await?;
        code = fixed;
        pending_history = Some(history);
    }
}

async fn read_metric(services: &AgentServices, metric_name: &str) -> AgentResult<i64> {
    services
        .sensor
        .metric(metric_name)
        .await
        .map_err(|e| AgentError::collaborator(format!("Failed to read {}", metric_name), e))
}

async fn retrieve_summary(services: &AgentServices, notification: &str) -> String {
    let Some(ref retrieval) = services.retrieval else {
        return NO_RELEVANT_STRATEGIES.to_string();
    };
    match retrieval.relevant_strategies(notification).await {
        Ok(strategies) => summarize_strategies(&strategies),
        Err(e) => {
            tracing::warn!("[Flow] Strategy retrieval failed: {:#}", e);
            NO_RELEVANT_STRATEGIES.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::testing::{
        fenced, test_agent, RecordingPersistence, ScriptedBackend, ScriptedSandbox, StubRetrieval,
    };
    use crate::sensor::StaticMetricsSensor;

    fn services(sandbox: ScriptedSandbox, persistence: Arc<RecordingPersistence>) -> AgentServices {
        AgentServices {
            sandbox: Arc::new(sandbox),
            sensor: Arc::new(StaticMetricsSensor::default()),
            persistence,
            retrieval: None,
            promotion: None,
            session_id: "session-1".into(),
            max_code_retries: 2,
        }
    }

    fn inputs() -> CycleInputs {
        CycleInputs {
            role: "influencer".into(),
            time: "24h".into(),
            metric_name: "followers".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summarize_strategies() {
        assert_eq!(summarize_strategies(&[]), NO_RELEVANT_STRATEGIES);

        let scored = |desc: &str| ScoredStrategy {
            strategy: StrategyData::new("a", desc, ""),
            score: 0.9,
        };
        assert_eq!(
            summarize_strategies(&[scored("Post at noon"), scored(" "), scored("Use threads")]),
            "Post at noon\nUse threads"
        );
    }

    #[tokio::test]
    async fn test_first_cycle_happy_path() {
        let backend = ScriptedBackend::new([
            fenced("print('research')"),
            "Post a laptop deal thread".to_string(),
            fenced("print('posted')"),
        ]);
        let mut agent = test_agent(backend.clone());
        let persistence = Arc::new(RecordingPersistence::default());
        let sandbox = ScriptedSandbox::new([
            ScriptedSandbox::ok("laptops trending"),
            ScriptedSandbox::ok("posted"),
        ]);
        let services = services(sandbox.clone(), persistence.clone());

        let report = unassisted_flow(&mut agent, &services, &inputs()).await.unwrap();

        assert_eq!(report.research_code, "print('research')");
        assert_eq!(report.research_output.stdout, "laptops trending");
        assert_eq!(report.strategy, "Post a laptop deal thread");
        assert_eq!(report.promotion_code, "print('posted')");
        assert_eq!(report.regenerations, 0);
        assert_eq!(report.metric_before, 1000);
        assert_eq!(sandbox.runs(), vec!["print('research')", "print('posted')"]);

        // system + (user, assistant) x 3
        let history = agent.chat_history();
        assert_eq!(history.len(), 7);
        assert_eq!(history.messages()[0].role(), Role::System);
        assert!(history.messages()[3].content().contains("laptops trending"));

        assert_eq!(persistence.histories().len(), 1);
        let strategies = persistence.strategies();
        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].summarized_desc, "Post a laptop deal thread");
        assert_eq!(strategies[0].strategy_result, "posted");
    }

    #[tokio::test]
    async fn test_regeneration_keeps_only_successful_fix() {
        let backend = ScriptedBackend::new([
            fenced("research()"),
            "strategy".to_string(),
            fenced("broken()"),
            fenced("still_broken()"),
            fenced("fixed()"),
        ]);
        let mut agent = test_agent(backend.clone());
        let sandbox = ScriptedSandbox::new([
            ScriptedSandbox::ok("research done"),
            ScriptedSandbox::err("NameError: broken"),
            ScriptedSandbox::err("NameError: still_broken"),
            ScriptedSandbox::ok("done"),
        ]);
        let services = services(sandbox, Arc::new(RecordingPersistence::default()));

        let report = unassisted_flow(&mut agent, &services, &inputs()).await.unwrap();
        assert_eq!(report.promotion_code, "fixed()");
        assert_eq!(report.regenerations, 2);

        // The second regeneration request saw the first failure's errors
        let request = backend.last_request().unwrap();
        assert!(request.last().unwrap().content().contains("NameError: still_broken"));

        // system + research + strategy + code + the successful fix
        assert_eq!(agent.chat_history().len(), 9);
        let last = agent.chat_history().last().unwrap();
        assert!(last.content().contains("fixed()"));
    }

    #[tokio::test]
    async fn test_retries_exhausted_is_execution_error() {
        let backend = ScriptedBackend::new([
            fenced("research()"),
            fenced("fix1()"),
            fenced("fix2()"),
        ]);
        let mut agent = test_agent(backend);
        let sandbox = ScriptedSandbox::new([
            ScriptedSandbox::err("boom 0"),
            ScriptedSandbox::err("boom 1"),
            ScriptedSandbox::err("boom 2"),
        ]);
        let persistence = Arc::new(RecordingPersistence::default());
        let services = services(sandbox, persistence.clone());

        let err = unassisted_flow(&mut agent, &services, &inputs()).await.unwrap_err();
        match err {
            AgentError::Execution(msg) => {
                assert!(msg.contains("after 2 regenerations"));
                assert!(msg.contains("boom 2"));
            }
            other => panic!("expected execution error, got {:?}", other),
        }
        assert!(persistence.strategies().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let mut agent = test_agent(ScriptedBackend::failing("upstream 503"));
        let services = services(ScriptedSandbox::default(), Arc::new(RecordingPersistence::default()));

        let err = unassisted_flow(&mut agent, &services, &inputs()).await.unwrap_err();
        assert!(matches!(err, AgentError::Generation(_)));
        assert!(err.to_string().contains("gen_research_code_on_first"));
    }

    #[tokio::test]
    async fn test_contextual_cycle_uses_retrieval_and_previous_metrics() {
        let backend = ScriptedBackend::new([
            fenced("research()"),
            "strategy".to_string(),
            fenced("post()"),
        ]);
        let mut agent = test_agent(backend.clone());
        let sandbox = ScriptedSandbox::new([ScriptedSandbox::ok("r"), ScriptedSandbox::ok("p")]);
        let retrieval = Arc::new(StubRetrieval::new(["Threads beat single posts"]));

        let mut services = services(sandbox, Arc::new(RecordingPersistence::default()));
        services.retrieval = Some(retrieval.clone() as Arc<dyn RetrievalClient>);

        let mut prev = StrategyData::new("agent-test", "Posted a laptop deal", "");
        prev.parameters = json!({"metric_before": "900", "metric_after": "1000"});
        let inputs = CycleInputs {
            prev_strategy: Some(prev),
            notification: Some("@fan: loved the laptop deal".into()),
            ..inputs()
        };

        let report = unassisted_flow(&mut agent, &services, &inputs).await.unwrap();

        let research_prompt = agent.chat_history().messages()[1].content().to_string();
        assert!(research_prompt.contains("@fan: loved the laptop deal"));
        assert!(research_prompt.contains("Posted a laptop deal"));
        assert!(research_prompt.contains("Threads beat single posts"));
        assert!(research_prompt.contains("<BeforeStrategyExecution>\n900"));
        assert!(research_prompt.contains("<AfterStrategyExecution>\n1000"));

        assert_eq!(retrieval.queries(), vec!["@fan: loved the laptop deal"]);
        assert_eq!(retrieval.saved().len(), 1);
        assert_eq!(
            report.strategy_record.notification().as_deref(),
            Some("@fan: loved the laptop deal")
        );
    }

    #[tokio::test]
    async fn test_previous_strategy_without_notifications_stays_contextual() {
        let backend = ScriptedBackend::new([
            fenced("research()"),
            "strategy".to_string(),
            fenced("post()"),
        ]);
        let mut agent = test_agent(backend);
        let sandbox = ScriptedSandbox::new([ScriptedSandbox::ok("r"), ScriptedSandbox::ok("p")]);
        let retrieval = Arc::new(StubRetrieval::new(["Threads beat single posts"]));

        let mut services = services(sandbox, Arc::new(RecordingPersistence::default()));
        services.retrieval = Some(retrieval.clone() as Arc<dyn RetrievalClient>);

        let inputs = CycleInputs {
            prev_strategy: Some(StrategyData::new("agent-test", "Posted a laptop deal", "")),
            notification: None,
            ..inputs()
        };

        let report = unassisted_flow(&mut agent, &services, &inputs).await.unwrap();

        let research_prompt = agent.chat_history().messages()[1].content().to_string();
        assert!(research_prompt.contains(NO_NOTIFICATIONS));
        assert!(research_prompt.contains("Posted a laptop deal"));
        assert!(research_prompt.contains(NO_RELEVANT_STRATEGIES));
        assert!(research_prompt.contains("<BeforeStrategyExecution>\nUnknown"));
        assert!(retrieval.queries().is_empty());
        assert_eq!(report.strategy_record.notification(), None);
    }
}

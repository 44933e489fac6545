use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use affiliate_promoter::agent::{AffiliatePromoterAgent, AgentSettings};
use affiliate_promoter::catalog::publishers_from_env;
use affiliate_promoter::cli::Console;
use affiliate_promoter::db::JsonlStore;
use affiliate_promoter::flow::{
    run_autonomous_loop, AgentServices, CycleInputs, LoopSchedule, ProductPromotion,
};
use affiliate_promoter::llm::{CodeGenerationBackend, OpenRouterProvider};
use affiliate_promoter::logging;
use affiliate_promoter::prompts::{PromptGenerator, PromptTemplateStore};
use affiliate_promoter::rag::{HttpRetrievalClient, RetrievalClient};
use affiliate_promoter::sandbox::ProcessSandbox;
use affiliate_promoter::sensor::StaticMetricsSensor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional settings file as the only argument; the environment overrides it
    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = AgentSettings::load(settings_path.as_deref())?;
    settings.validate()?;

    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    tracing::info!("=== Affiliate Promoter Starting ===");

    let console = Console::new();

    let store = match settings.prompts_file {
        Some(ref path) => PromptTemplateStore::from_json_file(path)?,
        None => PromptTemplateStore::default(),
    };
    let prompts = PromptGenerator::new(store);

    let backend = OpenRouterProvider::from_settings(&settings.llm)?;
    console.print_banner(&settings, &backend.model());

    let mut agent = AffiliatePromoterAgent::new(&settings.agent_id, Arc::new(backend), prompts);

    let retrieval = HttpRetrievalClient::from_settings(
        &settings.retrieval,
        &settings.agent_id,
        &settings.session_id,
    )?
    .map(|client| Arc::new(client) as Arc<dyn RetrievalClient>);
    if retrieval.is_none() {
        tracing::info!("No retrieval service configured, strategies are not looked up");
    }

    let promotion = settings.catalog.enabled.then(|| {
        ProductPromotion::from_settings(&settings.catalog).with_publishers(publishers_from_env())
    });

    let services = AgentServices {
        sandbox: Arc::new(ProcessSandbox::from_settings(&settings.sandbox)),
        sensor: Arc::new(StaticMetricsSensor::default()),
        persistence: Arc::new(JsonlStore::new(&settings.storage.data_dir)),
        retrieval,
        promotion,
        session_id: settings.session_id.clone(),
        max_code_retries: settings.max_code_retries,
    };

    let inputs = CycleInputs {
        role: settings.role.clone(),
        time: settings.time.clone(),
        metric_name: settings.metric_name.clone(),
        apis: settings.apis.clone(),
        ..Default::default()
    };
    let schedule = LoopSchedule::new(
        Duration::from_secs(settings.cycle_interval_secs),
        settings.max_cycles,
    );

    let cycles = run_autonomous_loop(&mut agent, &services, inputs, schedule, |cycle, result| {
        console.print_cycle(cycle, result)
    })
    .await;

    console.print_separator();
    console.print_system(&format!("Stopped after {} cycles", cycles));
    tracing::info!("=== Affiliate Promoter Shutting Down ===");

    Ok(())
}

//! Autonomous loop: run cycles back to back until stopped
//!
//! Each cycle picks up the notifications gathered since the last one and the
//! strategy it carried out. A failed cycle is logged and the loop moves on.

use std::future::Future;
use std::time::Duration;

use super::cycle::{unassisted_flow, AgentServices, CycleInputs, CycleReport};
use crate::agent::AffiliatePromoterAgent;
use crate::core::AgentResult;

/// How long and how often to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSchedule {
    /// Pause between cycles
    pub interval: Duration,
    /// Stop after this many cycles; run until interrupted when `None`
    pub max_cycles: Option<u32>,
}

impl LoopSchedule {
    pub fn new(interval: Duration, max_cycles: Option<u32>) -> Self {
        Self {
            interval,
            max_cycles,
        }
    }
}

/// Run cycles until `schedule` is exhausted or Ctrl-C is pressed.
///
/// Returns how many cycles were attempted.
pub async fn run_autonomous_loop<F>(
    agent: &mut AffiliatePromoterAgent,
    services: &AgentServices,
    inputs: CycleInputs,
    schedule: LoopSchedule,
    on_cycle: F,
) -> u32
where
    F: FnMut(u32, &AgentResult<CycleReport>),
{
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[Loop] Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_autonomous_loop_until(agent, services, inputs, schedule, on_cycle, shutdown).await
}

/// Same as `run_autonomous_loop`, stopping when `shutdown` resolves
pub async fn run_autonomous_loop_until<F, S>(
    agent: &mut AffiliatePromoterAgent,
    services: &AgentServices,
    mut inputs: CycleInputs,
    schedule: LoopSchedule,
    mut on_cycle: F,
    shutdown: S,
) -> u32
where
    F: FnMut(u32, &AgentResult<CycleReport>),
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if inputs.prev_strategy.is_none() {
        match services.persistence.latest_strategy(agent.agent_id()).await {
            Ok(prev) => inputs.prev_strategy = prev,
            Err(e) => tracing::warn!("[Loop] Could not load previous strategy: {:#}", e),
        }
    }

    let mut cycles = 0;
    loop {
        if schedule.max_cycles.is_some_and(|max| cycles >= max) {
            break;
        }
        cycles += 1;
        tracing::info!("[Loop] Cycle {}", cycles);

        inputs.notification = collect_notifications(services).await;

        let result = tokio::select! {
            result = unassisted_flow(agent, services, &inputs) => result,
            _ = &mut shutdown => {
                tracing::info!("[Loop] Interrupted during cycle {}", cycles);
                break;
            }
        };

        match result {
            Ok(ref report) => inputs.prev_strategy = Some(report.strategy_record.clone()),
            Err(ref e) => tracing::error!("[Loop] Cycle {} failed: {}", cycles, e),
        }
        on_cycle(cycles, &result);

        let last = schedule.max_cycles.is_some_and(|max| cycles >= max);
        if last || schedule.interval.is_zero() {
            continue;
        }

        tracing::info!("[Loop] Sleeping {:?} before the next cycle", schedule.interval);
        tokio::select! {
            _ = tokio::time::sleep(schedule.interval) => {}
            _ = &mut shutdown => {
                tracing::info!("[Loop] Interrupted after cycle {}", cycles);
                break;
            }
        }
    }

    tracing::info!("[Loop] Stopped after {} cycles", cycles);
    cycles
}

/// Pending notifications joined into one block; `None` when there are none
async fn collect_notifications(services: &AgentServices) -> Option<String> {
    match services.sensor.notifications().await {
        Ok(notifications) if notifications.is_empty() => None,
        Ok(notifications) => Some(notifications.join("\n")),
        Err(e) => {
            tracing::warn!("[Loop] Could not read notifications: {:#}", e);
            None
        }
    }
}

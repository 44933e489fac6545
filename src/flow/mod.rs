//! Cycle orchestration
//!
//! - `unassisted_flow` - one research / strategy / promotion cycle
//! - `run_autonomous_loop` - cycles back to back on a schedule
//! - `ProductPromotion` - product discovery and publishing after a cycle

mod autonomous;
mod cycle;
mod promotion;

pub use autonomous::{run_autonomous_loop, run_autonomous_loop_until, LoopSchedule};
pub use cycle::{
    execute_with_regen, summarize_strategies, unassisted_flow, AgentServices, CycleInputs,
    CycleReport, NO_RELEVANT_STRATEGIES,
};
pub use promotion::{ProductPromotion, PromotionReport};

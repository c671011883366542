use std::time::Duration;

use crate::config::WorkflowSettings;
use crate::planner::PlannerStrategy;

/// Default number of iterations a single run may take.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Per-run executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Upper bound on iterations, the terminal one included.
    pub max_steps: usize,
    /// Strategy asked first on every iteration. The rule-based plan is the
    /// fallback either way.
    pub strategy: PlannerStrategy,
    /// Pause between iterations.
    pub step_delay: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            strategy: PlannerStrategy::Agentic,
            step_delay: Duration::ZERO,
        }
    }
}

impl From<&WorkflowSettings> for WorkflowConfig {
    fn from(settings: &WorkflowSettings) -> Self {
        Self {
            max_steps: settings.max_steps,
            strategy: settings.planner,
            step_delay: settings.step_delay(),
        }
    }
}

//! Step planner: decides the single next action for a document.
//!
//! Two strategies share one contract. The rule-based plan walks the pipeline
//! and picks the first stage whose output is missing. The agentic plan asks
//! a [`DecisionOracle`], parses its reply, and falls back to the rule-based
//! plan whenever the reply is unusable or the oracle errors. Planning never
//! mutates state and never consults the audit trail.

pub mod decision;
pub mod prompt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::DecisionOracle;
use crate::db::DatabaseError;
use crate::document::{Action, DocumentId, Presence, PIPELINE};
use crate::sanitize::{truncate_for_log, LOG_TEXT_LIMIT};
use crate::store::DocumentStore;

pub use decision::{parse_decision, Decision, MatchRule};
pub use prompt::status_prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerStrategy {
    #[default]
    Agentic,
    RuleBased,
}

/// Why an agentic plan ended up on the rule-based path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoOracle,
    OracleFailed,
    Unparseable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum PlanSource {
    Rules,
    Oracle(MatchRule),
    Fallback(FallbackReason),
}

/// A planned action and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub action: Action,
    pub source: PlanSource,
}

/// The rule-based decision as a pure function of which outputs exist.
pub fn next_action(presence: Presence) -> Action {
    PIPELINE
        .into_iter()
        .find(|a| !presence.has(*a))
        .unwrap_or(Action::Complete)
}

pub struct StepPlanner {
    store: Arc<dyn DocumentStore>,
    oracle: Option<Arc<dyn DecisionOracle>>,
}

impl StepPlanner {
    pub fn new(store: Arc<dyn DocumentStore>, oracle: Option<Arc<dyn DecisionOracle>>) -> Self {
        Self { store, oracle }
    }

    /// A planner without an oracle. Agentic requests fall back to rules.
    pub fn rule_based(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, None)
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// `Ok(None)` when the document does not exist.
    pub fn plan_rule_based(&self, id: DocumentId) -> Result<Option<Action>, DatabaseError> {
        Ok(self.plan_with(id, PlannerStrategy::RuleBased)?.map(|p| p.action))
    }

    /// `Ok(None)` when the document does not exist. Oracle trouble is never
    /// surfaced: it resolves to the rule-based action.
    pub fn plan_agentic(&self, id: DocumentId) -> Result<Option<Action>, DatabaseError> {
        Ok(self.plan_with(id, PlannerStrategy::Agentic)?.map(|p| p.action))
    }

    pub fn plan_with(
        &self,
        id: DocumentId,
        strategy: PlannerStrategy,
    ) -> Result<Option<Plan>, DatabaseError> {
        let Some(doc) = self.store.get_document(id)? else {
            tracing::warn!(document_id = id, "Document not found, nothing to plan");
            return Ok(None);
        };
        let presence = doc.presence();

        let plan = match strategy {
            PlannerStrategy::RuleBased => Plan {
                action: next_action(presence),
                source: PlanSource::Rules,
            },
            PlannerStrategy::Agentic => self.consult_oracle(id, presence),
        };

        tracing::info!(
            document_id = id,
            action = %plan.action,
            source = ?plan.source,
            "Planned next step"
        );
        Ok(Some(plan))
    }

    fn consult_oracle(&self, id: DocumentId, presence: Presence) -> Plan {
        let fallback = |reason| Plan {
            action: next_action(presence),
            source: PlanSource::Fallback(reason),
        };

        let Some(oracle) = &self.oracle else {
            return fallback(FallbackReason::NoOracle);
        };

        let raw = match oracle.decide(&status_prompt(presence)) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(document_id = id, error = %e, "Oracle failed, using rule-based plan");
                return fallback(FallbackReason::OracleFailed);
            }
        };

        let decision = parse_decision(&raw);
        tracing::debug!(
            document_id = id,
            raw = %truncate_for_log(&raw, LOG_TEXT_LIMIT),
            ?decision,
            "Parsed oracle reply"
        );

        match decision {
            Decision::Parsed { action, rule } => Plan {
                action,
                source: PlanSource::Oracle(rule),
            },
            Decision::Fallback => {
                tracing::warn!(
                    document_id = id,
                    raw = %truncate_for_log(&raw, LOG_TEXT_LIMIT),
                    "Could not parse oracle reply, using rule-based plan"
                );
                fallback(FallbackReason::Unparseable)
            }
        }
    }
}

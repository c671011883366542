use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Span};

use crate::capability::{illustration_prompt, Capabilities};
use crate::db::DatabaseError;
use crate::document::{Action, DocumentId, DocumentRecord, DocumentStatus};
use crate::planner::{Plan, PlannerStrategy, StepPlanner};
use crate::sanitize::redact_path;
use crate::storage::{ArtifactKind, ArtifactStorage, UploadStorage};
use crate::store::DocumentStore;

use super::config::WorkflowConfig;
use super::error::StepError;
use super::progress::{NoopProgress, ProgressEvent, ProgressKind, ProgressReporter};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// Terminal status persisted.
    Completed,
    /// The step budget ran out first. Running again resumes.
    Exhausted,
    /// No plan could be made (unknown document or unreadable store).
    CannotProgress,
}

/// A finished run: every event it produced and how it ended.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub document_id: DocumentId,
    pub outcome: WorkflowOutcome,
    pub events: Vec<ProgressEvent>,
}

impl WorkflowReport {
    pub fn count(&self, kind: ProgressKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

/// Drives one document toward `complete`, one action per iteration.
///
/// Each iteration plans (configured strategy first, rule-based on failure),
/// runs the chosen action against its capability, persists the output and
/// emits exactly one [`ProgressEvent`]. Capability failures, missing inputs
/// and store errors all become events; none of them ends the run. Only the
/// terminal action, an unplannable document or the step budget stop it.
pub struct WorkflowExecutor {
    store: Arc<dyn DocumentStore>,
    planner: StepPlanner,
    capabilities: Capabilities,
    uploads: UploadStorage,
    artifacts: ArtifactStorage,
    config: WorkflowConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl WorkflowExecutor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        planner: StepPlanner,
        capabilities: Capabilities,
        uploads: UploadStorage,
        artifacts: ArtifactStorage,
    ) -> Self {
        Self {
            store,
            planner,
            capabilities,
            uploads,
            artifacts,
            config: WorkflowConfig::default(),
            reporter: Arc::new(NoopProgress),
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn uploads(&self) -> &UploadStorage {
        &self.uploads
    }

    /// Starts a run with the configured step budget.
    pub fn run(&self, document_id: DocumentId) -> WorkflowRun<'_> {
        self.run_workflow(document_id, self.config.max_steps)
    }

    /// Starts a run with an explicit step budget. Nothing happens until the
    /// returned iterator is polled.
    pub fn run_workflow(&self, document_id: DocumentId, max_steps: usize) -> WorkflowRun<'_> {
        WorkflowRun {
            executor: self,
            document_id,
            max_steps,
            step: 0,
            outcome: None,
            span: info_span!("workflow.run", document_id, max_steps),
        }
    }

    /// Runs to the end and collects every event.
    pub fn run_to_end(&self, document_id: DocumentId) -> WorkflowReport {
        self.run(document_id).into_report()
    }

    /// Configured strategy first; the rule-based plan when that yields
    /// nothing or errors.
    fn plan(&self, id: DocumentId) -> Result<Option<Plan>, DatabaseError> {
        let strategy = self.config.strategy;
        match self.planner.plan_with(id, strategy) {
            Ok(Some(plan)) => return Ok(Some(plan)),
            Ok(None) => debug!(document_id = id, ?strategy, "Planner returned nothing"),
            Err(e) => warn!(document_id = id, error = %e, ?strategy, "Planner failed"),
        }
        // Asked again even when rule-based was the configured strategy; a
        // transient read error gets a second chance.
        self.planner.plan_with(id, PlannerStrategy::RuleBased)
    }

    fn load(&self, id: DocumentId) -> Result<DocumentRecord, StepError> {
        self.store.get_document(id)?.ok_or(StepError::Vanished)
    }

    /// Runs one planned action against a fresh read of the record. Outputs
    /// that already exist are never recomputed.
    fn execute(&self, id: DocumentId, action: Action) -> Result<StepEffect, StepError> {
        let doc = self.load(id)?;

        if !action.is_terminal() && doc.presence().has(action) {
            return Ok(StepEffect::Skipped(format!(
                "{} already present, nothing to do",
                output_name(action)
            )));
        }

        match action {
            Action::ExtractText => {
                let Some(path) = self.uploads.resolve(&doc.filename) else {
                    return Err(StepError::SourceMissing(doc.filename.clone()));
                };
                debug!(file = %redact_path(&path), "Extracting text");
                let text = self.capabilities.extractor.extract_text(&path)?;
                if text.trim().is_empty() {
                    return Ok(StepEffect::Skipped(
                        "No text could be extracted".to_string(),
                    ));
                }
                persisted(self.store.update_extracted_text(id, &text)?, "extracted text")?;
                Ok(StepEffect::Applied("Text extracted"))
            }
            Action::Summarize => {
                let Some(text) = doc.text() else {
                    return Ok(StepEffect::Skipped(
                        "No extracted text to summarize".to_string(),
                    ));
                };
                let summary = self.capabilities.summarizer.summarize(text)?;
                if summary.trim().is_empty() {
                    return Ok(StepEffect::Skipped("Summarizer returned nothing".to_string()));
                }
                persisted(self.store.update_summary(id, &summary)?, "summary")?;
                Ok(StepEffect::Applied("Summarized"))
            }
            Action::Tts => {
                let Some(summary) = doc.summary_text() else {
                    return Ok(StepEffect::Skipped(
                        "No summary to convert to speech".to_string(),
                    ));
                };
                let audio = self.capabilities.speech.synthesize_speech(summary)?;
                if audio.is_empty() {
                    return Ok(StepEffect::Skipped("Speech synthesis returned nothing".to_string()));
                }
                let path = self.artifacts.store(ArtifactKind::Audio, id, &audio)?;
                persisted(self.store.update_tts_path(id, &path)?, "audio path")?;
                Ok(StepEffect::Applied("TTS generated"))
            }
            Action::GenerateImage => {
                let Some(summary) = doc.summary_text() else {
                    return Ok(StepEffect::Skipped(
                        "No summary available to generate image".to_string(),
                    ));
                };
                let image = self
                    .capabilities
                    .images
                    .generate_image(&illustration_prompt(summary))?;
                if image.is_empty() {
                    return Ok(StepEffect::Skipped("Image generation returned nothing".to_string()));
                }
                let path = self.artifacts.store(ArtifactKind::Image, id, &image)?;
                persisted(self.store.update_image_path(id, &path)?, "image path")?;
                Ok(StepEffect::Applied("Image generated"))
            }
            Action::Complete => self.complete(&doc),
        }
    }

    /// Persists the terminal status, but only when every output exists. An
    /// oracle asking to finish early is treated as a missing precondition.
    fn complete(&self, doc: &DocumentRecord) -> Result<StepEffect, StepError> {
        if !doc.presence().all() {
            return Ok(StepEffect::Skipped(
                "Not every output exists yet, cannot complete".to_string(),
            ));
        }
        persisted(
            self.store.update_status(doc.id, DocumentStatus::Complete)?,
            "terminal status",
        )?;
        Ok(StepEffect::Completed)
    }
}

enum StepEffect {
    Applied(&'static str),
    Skipped(String),
    Completed,
}

fn persisted(written: bool, what: &'static str) -> Result<(), StepError> {
    if written {
        Ok(())
    } else {
        Err(StepError::Rejected(what))
    }
}

fn output_name(action: Action) -> &'static str {
    match action {
        Action::ExtractText => "Extracted text",
        Action::Summarize => "Summary",
        Action::Tts => "Audio",
        Action::GenerateImage => "Image",
        Action::Complete => "Terminal status",
    }
}

/// A lazy, finite, non-restartable sequence of progress events.
///
/// Each call to `next` performs at most one iteration of the workflow. The
/// run ends after the terminal event, a halt, or when `max_steps`
/// iterations have been taken; [`WorkflowRun::outcome`] tells which.
pub struct WorkflowRun<'a> {
    executor: &'a WorkflowExecutor,
    document_id: DocumentId,
    max_steps: usize,
    step: usize,
    outcome: Option<WorkflowOutcome>,
    span: Span,
}

impl WorkflowRun<'_> {
    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    /// Iterations taken so far.
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// `None` while the run can still produce events.
    pub fn outcome(&self) -> Option<WorkflowOutcome> {
        self.outcome
    }

    /// Drains the run and returns everything it produced.
    pub fn into_report(mut self) -> WorkflowReport {
        let events: Vec<ProgressEvent> = self.by_ref().collect();
        WorkflowReport {
            document_id: self.document_id,
            outcome: self.outcome.unwrap_or(WorkflowOutcome::Exhausted),
            events,
        }
    }

    fn finish(&mut self, outcome: WorkflowOutcome) {
        self.outcome = Some(outcome);
        info!(
            document_id = self.document_id,
            steps = self.step,
            ?outcome,
            "Workflow finished"
        );
    }

    fn iterate(&mut self) -> ProgressEvent {
        let id = self.document_id;
        let step = self.step;
        let executor = self.executor;

        let plan = match executor.plan(id) {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                self.finish(WorkflowOutcome::CannotProgress);
                return ProgressEvent::halted(id, step, format!("Document {} not found", id));
            }
            Err(e) => {
                self.finish(WorkflowOutcome::CannotProgress);
                return ProgressEvent::halted(id, step, e.to_string());
            }
        };
        let action = plan.action;
        let _action_span = info_span!("workflow.action", action = %action).entered();

        match executor.execute(id, action) {
            Ok(StepEffect::Applied(message)) => {
                info!(document_id = id, %action, "{}", message);
                ProgressEvent::applied(id, step, action, message)
            }
            Ok(StepEffect::Skipped(message)) => {
                info!(document_id = id, %action, "Skipped: {}", message);
                ProgressEvent::skipped(id, step, action, message)
            }
            Ok(StepEffect::Completed) => {
                self.finish(WorkflowOutcome::Completed);
                ProgressEvent::completed(id, step)
            }
            Err(StepError::Vanished) => {
                self.finish(WorkflowOutcome::CannotProgress);
                ProgressEvent::halted(id, step, StepError::Vanished.to_string())
            }
            Err(e) => {
                warn!(document_id = id, %action, error = %e, "Step failed");
                ProgressEvent::failed(id, step, action, e.to_string())
            }
        }
    }
}

impl Iterator for WorkflowRun<'_> {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        let run_span = self.span.clone();
        let _run = run_span.enter();
        if self.outcome.is_some() {
            return None;
        }
        if self.step >= self.max_steps {
            self.finish(WorkflowOutcome::Exhausted);
            return None;
        }

        let delay = self.executor.config.step_delay;
        if self.step > 0 && !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.step += 1;
        let _step = info_span!("workflow.step", step = self.step).entered();
        if self.step == 1 {
            info!(
                document_id = self.document_id,
                max_steps = self.max_steps,
                "Starting workflow"
            );
        }

        let event = self.iterate();
        self.executor.reporter.report(&event);
        Some(event)
    }
}

impl std::iter::FusedIterator for WorkflowRun<'_> {}

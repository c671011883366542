//! Test harness for isolated workflow runs.
//!
//! The `TestHarness` owns a temporary upload/output tree, an in-memory
//! database and a set of scripted capabilities whose calls are counted, so
//! tests can assert both on persisted state and on what was invoked.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use docflow::capability::{
    Capabilities, DecisionOracle, ImageGenerator, SpeechSynthesizer, Summarizer, TextExtractor,
};
use docflow::error::CapabilityError;
use docflow::planner::{PlannerStrategy, StepPlanner};
use docflow::storage::{ArtifactStorage, UploadStorage};
use docflow::workflow::{WorkflowConfig, WorkflowExecutor};
use docflow::{Database, DocumentId, DocumentRecord, DocumentStore};

pub fn api_error(message: &str) -> CapabilityError {
    CapabilityError::Api {
        status: 500,
        body: message.to_string(),
    }
}

/// Capability fakes with per-capability call counters and failure scripts.
///
/// Each capability fails once per queued failure and succeeds afterwards.
#[derive(Default)]
pub struct FakeCapabilities {
    pub extract_calls: AtomicUsize,
    pub summarize_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub image_prompts: Mutex<Vec<String>>,
    extract_failures: Mutex<VecDeque<CapabilityError>>,
    summarize_failures: Mutex<VecDeque<CapabilityError>>,
    speech_failures: Mutex<VecDeque<CapabilityError>>,
    image_failures: Mutex<VecDeque<CapabilityError>>,
    extracted_text: Mutex<Option<String>>,
}

impl FakeCapabilities {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_extract(&self, error: CapabilityError) {
        self.extract_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_summarize(&self, error: CapabilityError) {
        self.summarize_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_speech(&self, error: CapabilityError) {
        self.speech_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_image(&self, error: CapabilityError) {
        self.image_failures.lock().unwrap().push_back(error);
    }

    /// Overrides what extraction returns instead of reading the file.
    pub fn extract_returns(&self, text: &str) {
        *self.extracted_text.lock().unwrap() = Some(text.to_string());
    }

    pub fn total_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
            + self.summarize_calls.load(Ordering::SeqCst)
            + self.speech_calls.load(Ordering::SeqCst)
            + self.image_calls.load(Ordering::SeqCst)
    }

    pub fn capabilities(self: &Arc<Self>) -> Capabilities {
        Capabilities {
            extractor: self.clone(),
            summarizer: self.clone(),
            speech: self.clone(),
            images: self.clone(),
        }
    }

    fn scripted_failure(queue: &Mutex<VecDeque<CapabilityError>>) -> Option<CapabilityError> {
        queue.lock().unwrap().pop_front()
    }
}

impl TextExtractor for FakeCapabilities {
    fn extract_text(&self, path: &Path) -> Result<String, CapabilityError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::scripted_failure(&self.extract_failures) {
            return Err(e);
        }
        if let Some(text) = self.extracted_text.lock().unwrap().clone() {
            return Ok(text);
        }
        Ok(std::fs::read_to_string(path).unwrap_or_default().trim().to_string())
    }
}

impl Summarizer for FakeCapabilities {
    fn summarize(&self, text: &str) -> Result<String, CapabilityError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::scripted_failure(&self.summarize_failures) {
            return Err(e);
        }
        Ok(format!("- {}", text.lines().next().unwrap_or_default()))
    }
}

impl SpeechSynthesizer for FakeCapabilities {
    fn synthesize_speech(&self, _text: &str) -> Result<Vec<u8>, CapabilityError> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::scripted_failure(&self.speech_failures) {
            return Err(e);
        }
        Ok(b"ID3fake-mp3".to_vec())
    }
}

impl ImageGenerator for FakeCapabilities {
    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, CapabilityError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        if let Some(e) = Self::scripted_failure(&self.image_failures) {
            return Err(e);
        }
        Ok(b"\x89PNGfake".to_vec())
    }
}

/// Oracle that replays queued replies, then repeats its last one.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, CapabilityError>>>,
    last: Mutex<Option<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::scripted(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn scripted(replies: Vec<Result<String, CapabilityError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl DecisionOracle for ScriptedOracle {
    fn decide(&self, status_summary: &str) -> Result<String, CapabilityError> {
        self.prompts.lock().unwrap().push(status_summary.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                Ok(reply)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| api_error("no scripted reply")),
        }
    }
}

/// Isolated environment: temp directories, in-memory store, fakes.
pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub db: Arc<Database>,
    pub fakes: Arc<FakeCapabilities>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");

        Self {
            temp_dir,
            upload_dir,
            output_dir,
            db: Arc::new(Database::open_in_memory().expect("Failed to open database")),
            fakes: FakeCapabilities::new(),
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a file directly into the upload directory.
    pub fn write_upload(&self, filename: &str, content: &str) -> PathBuf {
        let path = self.upload_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write upload");
        path
    }

    /// Writes a file outside the upload directory, as a user would pick it.
    pub fn write_source(&self, filename: &str, content: &str) -> PathBuf {
        let dir = self.temp_dir.path().join("source");
        std::fs::create_dir_all(&dir).expect("Failed to create source dir");
        let path = dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write source");
        path
    }

    pub fn planner(&self, oracle: Option<Arc<ScriptedOracle>>) -> StepPlanner {
        StepPlanner::new(
            self.db.clone(),
            oracle.map(|o| o as Arc<dyn DecisionOracle>),
        )
    }

    /// Executor planning with rules only.
    pub fn rule_executor(&self) -> WorkflowExecutor {
        self.executor(None, PlannerStrategy::RuleBased)
    }

    /// Executor consulting the given oracle first.
    pub fn agentic_executor(&self, oracle: Arc<ScriptedOracle>) -> WorkflowExecutor {
        self.executor(Some(oracle), PlannerStrategy::Agentic)
    }

    pub fn executor(
        &self,
        oracle: Option<Arc<ScriptedOracle>>,
        strategy: PlannerStrategy,
    ) -> WorkflowExecutor {
        WorkflowExecutor::new(
            self.db.clone(),
            self.planner(oracle),
            self.fakes.capabilities(),
            UploadStorage::new(&self.upload_dir),
            ArtifactStorage::new(&self.output_dir),
        )
        .with_config(WorkflowConfig {
            strategy,
            ..WorkflowConfig::default()
        })
    }

    pub fn document(&self, id: DocumentId) -> DocumentRecord {
        self.db
            .get_document(id)
            .expect("Failed to read document")
            .expect("Document not found")
    }
}

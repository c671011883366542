pub mod broadcast;
pub mod capability;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod intake;
pub mod planner;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod storage;
pub mod store;
pub mod worker;
pub mod workflow;

pub use broadcast::WorkflowProgressBroadcaster;
pub use capability::{
    Capabilities, DecisionOracle, ImageGenerator, OpenAiClient, SpeechSynthesizer, Summarizer,
    TextExtractor,
};
pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use document::{Action, DocumentId, DocumentRecord, DocumentStatus, Presence};
pub use error::{
    CapabilityError, ConfigError, DocflowError, ProcessError, Result, StorageError, UploadError,
    WorkerError,
};
pub use intake::{DocumentIntake, UploadReport};
pub use planner::{Plan, PlanSource, PlannerStrategy, StepPlanner};
pub use processor::{DocumentFormat, ProcessorRegistry};
pub use secrets::{SecretError, SecretSource};
pub use storage::{ArtifactStorage, UploadStorage};
pub use store::DocumentStore;
pub use worker::WorkflowPool;
pub use workflow::{
    ProgressEvent, ProgressKind, ProgressReporter, WorkflowConfig, WorkflowExecutor,
    WorkflowOutcome, WorkflowReport, WorkflowRun,
};

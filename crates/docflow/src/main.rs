//! `docflow` command-line caller.
//!
//! Reads the JSON config (default `~/.docflow/config.json`), opens the
//! document database and drives documents through the workflow. Logging
//! honours `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use docflow::capability::DecisionOracle;
use docflow::config::default_config_path;
use docflow::db::default_database_path;
use docflow::{
    load_config, ArtifactStorage, Capabilities, Config, Database, DocumentIntake, DocumentStore,
    OpenAiClient, PlannerStrategy, ProcessorRegistry, StepPlanner, UploadStorage, WorkflowConfig,
    WorkflowExecutor, WorkflowPool, WorkflowReport,
};

#[derive(Parser)]
#[command(name = "docflow", version, about = "Document workflow engine")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and run its workflow
    Upload {
        file: PathBuf,
        /// Override the configured step budget
        #[arg(long)]
        max_steps: Option<usize>,
    },
    /// Run (or resume) the workflow of an existing document
    Run {
        id: i64,
        #[arg(long)]
        max_steps: Option<usize>,
        /// Skip the oracle and plan from the pipeline order only
        #[arg(long)]
        rule_based: bool,
    },
    /// Print a document record
    Show { id: i64 },
    /// List documents, newest first
    List {
        #[arg(long, default_value = "20")]
        limit: u64,
        #[arg(long, default_value = "0")]
        offset: u64,
    },
    /// Print the audit trail of a document
    Audit { id: i64 },
    /// Run several documents through the worker pool
    Batch {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

fn init_tracing() {
    // Bridges `log` records from the database layer.
    let _ = tracing_log::LogTracer::init();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn open_database(config: &Config) -> anyhow::Result<Arc<Database>> {
    let path = config
        .database_file()
        .or_else(default_database_path)
        .context("Could not determine database path")?;
    let db = Database::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(Arc::new(db))
}

fn build_executor(
    config: &Config,
    db: Arc<Database>,
    strategy: Option<PlannerStrategy>,
) -> anyhow::Result<WorkflowExecutor> {
    let client = Arc::new(
        OpenAiClient::from_config(&config.openai).context("Failed to set up OpenAI client")?,
    );
    let capabilities = Capabilities::with_openai(ProcessorRegistry::new(&config.ocr), client.clone());

    let oracle: Arc<dyn DecisionOracle> = client;
    let planner = StepPlanner::new(db.clone(), Some(oracle));

    let mut workflow = WorkflowConfig::from(&config.workflow);
    if let Some(strategy) = strategy {
        workflow.strategy = strategy;
    }

    Ok(WorkflowExecutor::new(
        db,
        planner,
        capabilities,
        UploadStorage::new(config.upload_dir()),
        ArtifactStorage::new(config.output_dir()),
    )
    .with_config(workflow))
}

fn print_report(report: &WorkflowReport) {
    for event in &report.events {
        println!(
            "[{}] step {} {} {}",
            event.kind,
            event.step,
            event.action.map(|a| a.token()).unwrap_or("-"),
            event.message
        );
    }
    info!(document_id = report.document_id, outcome = ?report.outcome, "Run finished");
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path().context("Could not determine home directory")?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let db = open_database(&config)?;

    match cli.command {
        Commands::Upload { file, max_steps } => {
            let executor = Arc::new(build_executor(&config, db, None)?);
            let budget = max_steps.unwrap_or(executor.config().max_steps);
            let extractor = Arc::new(ProcessorRegistry::new(&config.ocr));
            let intake = DocumentIntake::new(executor, extractor);
            let report = intake
                .upload_with_budget(&file, budget)
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            print_json(&report)?;
        }
        Commands::Run {
            id,
            max_steps,
            rule_based,
        } => {
            let strategy = rule_based.then_some(PlannerStrategy::RuleBased);
            let executor = build_executor(&config, db, strategy)?;
            let budget = max_steps.unwrap_or(executor.config().max_steps);
            let report = executor.run_workflow(id, budget).into_report();
            print_report(&report);
        }
        Commands::Show { id } => match db.get_document(id)? {
            Some(doc) => print_json(&doc)?,
            None => bail!("Document {} not found", id),
        },
        Commands::List { limit, offset } => {
            print_json(&db.list_documents(limit, offset)?)?;
        }
        Commands::Audit { id } => {
            print_json(&db.audit_trail(id)?)?;
        }
        Commands::Batch { ids } => {
            let executor = Arc::new(build_executor(&config, db, None)?);
            let pool = WorkflowPool::new(executor, config.workers.min(ids.len()))?;
            let mut submitted = 0;
            for id in ids {
                match pool.submit(id) {
                    Ok(()) => submitted += 1,
                    Err(e) => tracing::warn!(document_id = id, error = %e, "Not submitted"),
                }
            }
            for _ in 0..submitted {
                let Some(report) = pool.recv_result() else {
                    break;
                };
                print_report(&report);
            }
            pool.shutdown();
            pool.wait();
        }
    }

    Ok(())
}

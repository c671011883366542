use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info};

use crate::document::DocumentId;
use crate::error::WorkerError;
use crate::workflow::{WorkflowExecutor, WorkflowReport};

type InFlight = Arc<Mutex<HashSet<DocumentId>>>;

/// Runs complete workflows for submitted documents on a fixed set of threads.
///
/// A document id is refused while a run for it is queued or executing, so
/// two workers never drive the same document at once.
pub struct WorkflowPool {
    job_sender: Sender<DocumentId>,
    result_receiver: Receiver<WorkflowReport>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    in_flight: InFlight,
}

impl WorkflowPool {
    pub fn new(executor: Arc<WorkflowExecutor>, worker_count: usize) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be at least 1".to_string(),
            ));
        }

        let (job_sender, job_receiver) = bounded::<DocumentId>(worker_count * 2);
        // Results are unbounded so a caller still submitting never blocks a
        // worker that is trying to hand back a report.
        let (result_sender, result_receiver) = unbounded::<WorkflowReport>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let in_flight: InFlight = Arc::new(Mutex::new(HashSet::new()));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_executor = Arc::clone(&executor);
            let worker_in_flight = Arc::clone(&in_flight);

            let handle = thread::Builder::new()
                .name(format!("docflow-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(
                        worker_id,
                        job_rx,
                        result_tx,
                        shutdown_flag,
                        worker_executor,
                        worker_in_flight,
                    );
                })
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
            in_flight,
        })
    }

    /// Queues a full workflow run. Blocks while the queue is full.
    pub fn submit(&self, document_id: DocumentId) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| WorkerError::ChannelClosed)?;
            if !in_flight.insert(document_id) {
                return Err(WorkerError::AlreadyInFlight(document_id));
            }
        }

        if self.job_sender.send(document_id).is_err() {
            release(&self.in_flight, document_id);
            return Err(WorkerError::ChannelClosed);
        }
        debug!("Queued document {}", document_id);
        Ok(())
    }

    pub fn is_in_flight(&self, document_id: DocumentId) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(&document_id))
            .unwrap_or(false)
    }

    pub fn try_recv_result(&self) -> Option<WorkflowReport> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<WorkflowReport> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn wait(self) {
        // Closing the queue lets idle workers exit.
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

fn release(in_flight: &InFlight, document_id: DocumentId) {
    if let Ok(mut set) = in_flight.lock() {
        set.remove(&document_id);
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<DocumentId>,
    result_sender: Sender<WorkflowReport>,
    shutdown: Arc<AtomicBool>,
    executor: Arc<WorkflowExecutor>,
    in_flight: InFlight,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(document_id) => {
                debug!("Worker {} running document {}", worker_id, document_id);

                let report = executor.run_to_end(document_id);
                release(&in_flight, document_id);

                if let Err(e) = result_sender.send(report) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};

use crate::bridge::ProcessBridge;
use crate::config::AppConfig;
use crate::error::{QueueError, TaskError, WorkerError};
use crate::queue::{ResultBackend, ResultMessage, TaskBroker, TaskHandle, TaskMessage};

use super::handler::{EngineTaskHandler, HandlerRegistry};
use super::phase::{PhaseTransition, TransitionError, WorkerPhase};
use super::shutdown::ShutdownListener;

/// Counters for one `run` of the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub dequeued: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub store_errors: usize,
}

enum Outcome {
    Succeeded { stored: bool },
    Failed { stored: bool },
}

pub struct Worker {
    broker: Arc<dyn TaskBroker>,
    backend: Arc<dyn ResultBackend>,
    registry: Arc<HandlerRegistry>,
    slots: usize,
    poll_interval: Duration,
    phase: watch::Sender<WorkerPhase>,
}

impl Worker {
    /// Registers the command and upload handlers under the configured task names.
    pub fn new(
        config: &AppConfig,
        broker: Arc<dyn TaskBroker>,
        backend: Arc<dyn ResultBackend>,
        bridge: ProcessBridge,
    ) -> Result<Self, WorkerError> {
        config.queue.ensure_substrate()?;

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EngineTaskHandler::command(
            config.queue.task_name.clone(),
            bridge.clone(),
        )))?;
        registry.register(Arc::new(EngineTaskHandler::upload(
            config.queue.upload_task_name.clone(),
            bridge,
        )))?;

        Self::with_registry(config, broker, backend, registry)
    }

    pub fn with_registry(
        config: &AppConfig,
        broker: Arc<dyn TaskBroker>,
        backend: Arc<dyn ResultBackend>,
        registry: HandlerRegistry,
    ) -> Result<Self, WorkerError> {
        config.queue.ensure_substrate()?;

        let (phase, _) = watch::channel(WorkerPhase::Starting);
        let worker = Self {
            broker,
            backend,
            registry: Arc::new(registry),
            slots: config.queue.workers.max(1),
            poll_interval: Duration::from_millis(config.queue.poll_interval_ms.max(1)),
            phase,
        };

        tracing::info!(
            broker = %worker.broker.name(),
            backend = %worker.backend.name(),
            slots = worker.slots,
            "registered tasks: {}",
            worker.registry.names().join(", ")
        );
        worker.transition(WorkerPhase::Ready)?;
        Ok(worker)
    }

    pub fn phase(&self) -> WorkerPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<WorkerPhase> {
        self.phase.subscribe()
    }

    fn transition(&self, to: WorkerPhase) -> Result<(), TransitionError> {
        let from = self.phase();
        PhaseTransition::validate(from, to)?;
        self.phase.send_replace(to);
        tracing::debug!("worker phase: {} -> {}", from, to);
        Ok(())
    }

    /// Dequeue and execute until `shutdown` fires, then wait for every
    /// in-flight invocation before returning.
    pub async fn run(&self, mut shutdown: ShutdownListener) -> Result<WorkerReport, WorkerError> {
        self.transition(WorkerPhase::Running)?;
        tracing::info!(slots = self.slots, "worker started");

        let slots = Arc::new(Semaphore::new(self.slots));
        let mut inflight: JoinSet<Outcome> = JoinSet::new();
        let mut report = WorkerReport::default();
        let cancel_safe = self.broker.cancel_safe_fetch();

        loop {
            while let Some(joined) = inflight.try_join_next() {
                record(&mut report, joined);
            }
            if shutdown.is_triggered() {
                break;
            }

            let permit = tokio::select! {
                _ = shutdown.triggered() => break,
                permit = slots.clone().acquire_owned() => {
                    permit.map_err(|_| WorkerError::PoolClosed)?
                }
            };
            if shutdown.is_triggered() {
                break;
            }

            let fetched = tokio::select! {
                biased;
                _ = shutdown.triggered(), if cancel_safe => break,
                fetched = self.broker.fetch(self.poll_interval) => fetched,
            };

            match fetched {
                Ok(Some(message)) if shutdown.is_triggered() => {
                    tracing::info!(
                        task_id = %message.id,
                        "shutdown in progress, returning task to queue"
                    );
                    if let Err(e) = self.broker.requeue(message).await {
                        tracing::error!("failed to return task to queue: {}", e);
                    }
                    break;
                }
                Ok(Some(message)) => {
                    report.dequeued += 1;
                    tracing::info!(
                        task_id = %message.id,
                        task = %message.task,
                        "received task"
                    );
                    let registry = self.registry.clone();
                    let backend = self.backend.clone();
                    inflight.spawn(async move {
                        let _permit = permit;
                        process(&registry, backend.as_ref(), message).await
                    });
                }
                Ok(None) => {}
                Err(QueueError::Malformed { task_id, reason }) => {
                    report.dequeued += 1;
                    tracing::warn!(task_id = %task_id, "received undecodable task: {}", reason);
                    let backend = self.backend.clone();
                    inflight.spawn(async move {
                        let _permit = permit;
                        let failed = Err(TaskError::Malformed(reason));
                        finish(backend.as_ref(), &task_id, "<undecodable>", failed).await
                    });
                }
                Err(e) => {
                    tracing::warn!("fetch from broker failed: {}", e);
                    drop(permit);
                    tokio::select! {
                        _ = shutdown.triggered() => {}
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }

        self.transition(WorkerPhase::Draining)?;
        tracing::info!(in_flight = inflight.len(), "shutting down, draining in-flight tasks");
        while let Some(joined) = inflight.join_next().await {
            record(&mut report, joined);
        }

        self.transition(WorkerPhase::Stopped)?;
        tracing::info!(
            dequeued = report.dequeued,
            succeeded = report.succeeded,
            failed = report.failed,
            "worker stopped"
        );
        Ok(report)
    }
}

fn record(report: &mut WorkerReport, joined: Result<Outcome, JoinError>) {
    match joined {
        Ok(Outcome::Succeeded { stored }) => {
            report.succeeded += 1;
            report.store_errors += usize::from(!stored);
        }
        Ok(Outcome::Failed { stored }) => {
            report.failed += 1;
            report.store_errors += usize::from(!stored);
        }
        Err(e) => {
            tracing::error!("task invocation aborted: {}", e);
            report.failed += 1;
        }
    }
}

async fn process(
    registry: &HandlerRegistry,
    backend: &dyn ResultBackend,
    message: TaskMessage,
) -> Outcome {
    let executed = match registry.get(&message.task) {
        None => Err(TaskError::UnknownTask(message.task.clone())),
        Some(handler) => match handler.decode(&message.kwargs) {
            Ok(descriptor) => handler.run(&message.id, descriptor).await,
            Err(e) => Err(e.into()),
        },
    };
    finish(backend, &message.id, &message.task, executed).await
}

/// Store the outcome of one invocation under its task id.
async fn finish(
    backend: &dyn ResultBackend,
    task_id: &str,
    task: &str,
    executed: Result<Value, TaskError>,
) -> Outcome {
    let (result, succeeded) = match executed {
        Ok(value) => (ResultMessage::success(task_id, value), true),
        Err(e) => {
            tracing::error!(task_id = %task_id, task = %task, "task failed: {}", e);
            (
                ResultMessage::failure(task_id, e.exc_type(), &e.to_string()),
                false,
            )
        }
    };

    let handle = TaskHandle::from(task_id);
    let stored = match backend.store(&handle, &result).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(task_id = %task_id, "failed to store result: {}", e);
            false
        }
    };

    if succeeded {
        Outcome::Succeeded { stored }
    } else {
        Outcome::Failed { stored }
    }
}

use crate::exchange::ExchangeClient;
use crate::orchestrator::{BatchError, BatchOrchestrator, BatchReport, StatusSink, StopHandle};
use crate::runtime::config::BatchJob;
use std::sync::Arc;
use tokio::signal;

/// Runs a batch in the foreground and turns Ctrl-C (SIGINT) into a stop request.
pub struct Runner {
    orchestrator: BatchOrchestrator,
    stop: StopHandle,
}

impl Runner {
    pub fn new(client: Arc<dyn ExchangeClient>) -> Self {
        Self::with_orchestrator(BatchOrchestrator::new(client))
    }

    pub fn with_orchestrator(orchestrator: BatchOrchestrator) -> Self {
        Self {
            orchestrator,
            stop: StopHandle::new(),
        }
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    /// Returns a clone of the stop handle so external callers can integrate
    /// with their own signal handlers or cancellation strategies.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs `job` to completion. A Ctrl-C stops the batch at its next
    /// checkpoint; a withdrawal already in flight is still awaited.
    pub async fn run_until_ctrl_c<S>(
        &mut self,
        job: BatchJob,
        sink: &mut S,
    ) -> Result<BatchReport, BatchError>
    where
        S: StatusSink + ?Sized,
    {
        let stop = self.stop.clone();
        let result = {
            let run = self.orchestrator.run(job, sink, &stop);
            tokio::pin!(run);

            tracing::info!("runner started; press Ctrl-C (SIGINT) to stop the batch");

            let finished = tokio::select! {
                result = &mut run => Some(result),
                signal = signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("Ctrl-C received; stopping after the current withdrawal");
                            stop.stop();
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to listen for Ctrl-C; running batch to the end");
                        }
                    }
                    None
                }
            };

            match finished {
                Some(result) => result,
                None => run.await,
            }
        };

        if stop.is_stopped() {
            self.reinitialize_stop_handle();
        }
        result
    }

    /// Hands out a fresh handle once a stop has been honoured, so the next run starts clean.
    fn reinitialize_stop_handle(&mut self) {
        self.stop = StopHandle::new();
    }
}

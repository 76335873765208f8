//! Dispatch service: admission queue, sender pool and result sink.

use std::sync::Arc;

use push_core::{AdmissionError, Request, RequestId};

use crate::channel::{self, Receiver, Sender};
use crate::{Admission, Dispatch, EngineConfig, Handler, WorkerPool};

/// A running dispatch service for one provider.
pub struct Service<D: Dispatch> {
    dispatch: Arc<D>,
    units: Sender<D::Unit>,
    sink: Sender<D::Output>,
    results: Receiver<D::Output>,
    pool: WorkerPool,
}

impl<D: Dispatch> Service<D> {
    /// Create the queues and start the sender pool. Must be called inside a
    /// tokio runtime.
    pub fn start(dispatch: D, config: &EngineConfig) -> Self {
        let dispatch = Arc::new(dispatch);
        let (units, queue) = channel::bounded(config.queue_capacity);
        let (sink, results) = channel::bounded(config.result_capacity);

        let worker = Arc::new(Worker {
            dispatch: Arc::clone(&dispatch),
            sink: sink.clone(),
        });
        let pool = WorkerPool::spawn(config.senders, queue, worker);

        tracing::info!(
            senders = pool.size(),
            queue_capacity = units.max_capacity(),
            result_capacity = sink.max_capacity(),
            "dispatch service started"
        );

        Self {
            dispatch,
            units,
            sink,
            results,
            pool,
        }
    }

    /// Admit a request.
    ///
    /// Returns once every work unit is queued. Waits while the admission
    /// queue (or the in-flight limit) is full. Rejected requests are logged
    /// and produce no result.
    pub async fn queue(&self, request: Request) -> Result<RequestId, AdmissionError> {
        let request_id = RequestId::new_v4();

        if let Err(e) = request.validate() {
            tracing::warn!(%request_id, error = %e, "request rejected");
            return Err(e);
        }

        let devices = request.devices.len();
        let admission = Admission {
            request_id,
            units: &self.units,
            sink: &self.sink,
            senders: self.pool.size(),
        };

        match self.dispatch.submit(request, admission).await {
            Ok(()) => {
                tracing::debug!(%request_id, devices, "request queued");
                Ok(request_id)
            }
            Err(e) => {
                tracing::warn!(%request_id, error = %e, "request rejected");
                Err(e)
            }
        }
    }

    /// Handle on the result sink. Callers must keep draining it, or senders
    /// and aggregators stall once it is full.
    pub fn listen(&self) -> Receiver<D::Output> {
        self.results.clone()
    }

    pub fn dispatch(&self) -> &D {
        &self.dispatch
    }

    pub fn senders(&self) -> usize {
        self.pool.size()
    }

    /// Free admission queue slots.
    pub fn queue_available(&self) -> usize {
        self.units.available()
    }

    /// Stop admitting work and wait for queued units to finish.
    ///
    /// Aggregators still running keep publishing to handles obtained from
    /// [`Service::listen`].
    pub async fn shutdown(self) {
        let Self { units, pool, .. } = self;
        drop(units);
        pool.join().await;
        tracing::info!("dispatch service stopped");
    }
}

struct Worker<D: Dispatch> {
    dispatch: Arc<D>,
    sink: Sender<D::Output>,
}

impl<D: Dispatch> Handler<D::Unit> for Worker<D> {
    async fn handle(&self, unit: D::Unit) {
        self.dispatch.process(unit, &self.sink).await;
    }
}

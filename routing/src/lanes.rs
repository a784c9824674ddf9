// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ordered event lanes for the dispatcher.
//!
//! A lane is one unbounded FIFO queue drained by exactly one named worker
//! thread. Events submitted to the same lane are handled strictly in
//! submission order; distinct lanes are unordered with respect to each
//! other. A failing handler costs only its own event.

use crate::RoutingError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::thread::{self, JoinHandle};
#[allow(unused)]
use tracing::{debug, error, info, warn};

enum LaneCtl<E> {
    Event(E),
    Finish,
}

/// Counters for one lane, updated by its worker and readable from anywhere.
#[derive(Debug, Default)]
pub struct LaneStats {
    submitted: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl LaneStats {
    /// Events accepted onto the lane's queue.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Events whose handler completed successfully.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Events dropped because their handler failed.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Submission side of a lane. Cheap to clone.
pub struct LaneSender<E> {
    tx: Sender<LaneCtl<E>>,
    stats: Arc<LaneStats>,
}

impl<E> Clone for LaneSender<E> {
    fn clone(&self) -> Self {
        LaneSender {
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<E> LaneSender<E> {
    /// Queue an event on the lane.
    ///
    /// # Errors
    ///
    /// Fails if the lane's worker is gone (the lane was finished).
    pub fn submit(&self, event: E) -> Result<(), RoutingError> {
        self.tx
            .send(LaneCtl::Event(event))
            .map_err(|_| RoutingError::Internal("lane worker is gone"))?;
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// One ordered lane: a queue plus its worker thread.
pub(crate) struct Lane<E> {
    name: &'static str,
    tx: Sender<LaneCtl<E>>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<LaneStats>,
}

impl<E: Send + 'static> Lane<E> {
    /// Spawn a lane worker named `name` running `handler` per event.
    ///
    /// The handler runs inside a per-event error boundary: a failure is
    /// logged and counted, the event is dropped, and the worker keeps
    /// draining. Nothing the handler returns can terminate the lane.
    pub(crate) fn start<H>(name: &'static str, mut handler: H) -> Result<Lane<E>, RoutingError>
    where
        H: FnMut(E) -> Result<(), RoutingError> + Send + 'static,
    {
        let (tx, rx) = channel::<LaneCtl<E>>();
        let stats = Arc::new(LaneStats::default());
        let worker_stats = Arc::clone(&stats);

        let worker = move || {
            debug!("{name}: lane worker started");
            while let Ok(msg) = rx.recv() {
                match msg {
                    LaneCtl::Event(event) => match handler(event) {
                        Ok(()) => {
                            worker_stats.processed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            worker_stats.failed.fetch_add(1, Ordering::Relaxed);
                            warn!("{name}: handler failed, event dropped: {e}");
                        }
                    },
                    LaneCtl::Finish => break,
                }
            }
            debug!("{name}: lane worker stopped");
        };

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(worker)
            .map_err(|_| RoutingError::Internal("failure spawning lane worker"))?;

        Ok(Lane {
            name,
            tx,
            handle: Some(handle),
            stats,
        })
    }

    pub(crate) fn sender(&self) -> LaneSender<E> {
        LaneSender {
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    pub(crate) fn stats(&self) -> Arc<LaneStats> {
        Arc::clone(&self.stats)
    }

    /// Drain every queued event, then stop and join the worker.
    ///
    /// # Errors
    ///
    /// Fails if the worker is already gone or cannot be joined.
    pub(crate) fn finish(&mut self) -> Result<(), RoutingError> {
        debug!("{}: requesting lane worker to stop..", self.name);
        self.tx
            .send(LaneCtl::Finish)
            .map_err(|_| RoutingError::Internal("lane worker is gone"))?;
        let handle = self
            .handle
            .take()
            .ok_or(RoutingError::Internal("lane already finished"))?;
        handle
            .join()
            .map_err(|_| RoutingError::Internal("failure joining lane worker"))
    }
}

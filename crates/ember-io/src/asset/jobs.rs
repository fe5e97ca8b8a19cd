// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The worker threads running asset loads, reloads and saves.

use crate::asset::{AssetDatabaseConfig, AssetError};
use crossbeam_channel::{Receiver, Sender};
use ember_core::AssetId;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// First load of an asset's data.
    Load,
    /// Replacement of already loaded data.
    Reload,
    /// Serialization of an asset's data.
    Save,
}

/// Identifies an in-flight job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobTicket(u64);

#[derive(Debug, Clone, Copy)]
struct JobInfo {
    kind: JobKind,
    asset: AssetId,
}

/// Book-keeping of the jobs that were submitted and have not finished.
#[derive(Debug, Default)]
pub(crate) struct JobTracker {
    next_ticket: AtomicU64,
    active: Mutex<HashMap<JobTicket, JobInfo>>,
}

impl JobTracker {
    fn begin(&self, kind: JobKind, asset: AssetId) -> JobTicket {
        let ticket = JobTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ticket, JobInfo { kind, asset });
        ticket
    }

    fn finish(&self, ticket: JobTicket) {
        let finished = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&ticket);
        if let Some(info) = finished {
            log::trace!("AssetDatabase: {:?} job for {} finished", info.kind, info.asset);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct Job {
    ticket: JobTicket,
    work: Box<dyn FnOnce() + Send>,
}

/// A fixed set of threads pulling jobs from a shared channel.
///
/// Dropping the pool closes the channel; the workers finish the jobs already
/// queued and exit, and the drop waits for them.
pub(crate) struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
    tracker: Arc<JobTracker>,
}

impl WorkerPool {
    pub(crate) fn start(config: &AssetDatabaseConfig) -> Result<Self, AssetError> {
        config.validate()?;

        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let tracker = Arc::new(JobTracker::default());
        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(config.max_worker_threads as usize),
            tracker,
        };

        for index in 0..config.max_worker_threads {
            let receiver: Receiver<Job> = receiver.clone();
            let tracker = Arc::clone(&pool.tracker);
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name_prefix))
                .spawn(move || {
                    log::trace!("AssetDatabase: worker {index} started");
                    for job in receiver.iter() {
                        if panic::catch_unwind(AssertUnwindSafe(job.work)).is_err() {
                            log::error!("AssetDatabase: job {:?} panicked", job.ticket);
                        }
                        tracker.finish(job.ticket);
                    }
                    log::trace!("AssetDatabase: worker {index} stopped");
                })
                // Dropping `pool` here joins the workers spawned so far.
                .map_err(AssetError::WorkerSpawn)?;
            pool.workers.push(handle);
        }

        log::info!(
            "AssetDatabase: started {} worker thread(s)",
            pool.workers.len()
        );
        Ok(pool)
    }

    /// Queues `work` and returns its ticket.
    pub(crate) fn submit(
        &self,
        kind: JobKind,
        asset: AssetId,
        work: impl FnOnce() + Send + 'static,
    ) -> JobTicket {
        let ticket = self.tracker.begin(kind, asset);
        let job = Job {
            ticket,
            work: Box::new(work),
        };
        let sent = match &self.sender {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        };
        if !sent {
            log::error!("AssetDatabase: worker pool is shut down, dropped {kind:?} job for {asset}");
            self.tracker.finish(ticket);
        }
        ticket
    }

    pub(crate) fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("AssetDatabase: a worker thread panicked");
            }
        }
        log::info!("AssetDatabase: worker threads stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_pool_runs_every_job_before_shutdown() {
        let config = AssetDatabaseConfig {
            max_worker_threads: 3,
            ..AssetDatabaseConfig::default()
        };
        let mut pool = WorkerPool::start(&config).unwrap();
        assert_eq!(pool.worker_count(), 3);

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = counter.clone();
            pool.submit(JobKind::Load, AssetId::random(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert_eq!(pool.tracker().len(), 0);
    }

    #[test]
    fn test_zero_workers_is_refused() {
        let config = AssetDatabaseConfig {
            max_worker_threads: 0,
            ..AssetDatabaseConfig::default()
        };
        assert!(matches!(
            WorkerPool::start(&config),
            Err(AssetError::Config(_))
        ));
    }

    #[test]
    fn test_tracker_forgets_finished_tickets() {
        let tracker = JobTracker::default();
        let id = AssetId::random();
        let load = tracker.begin(JobKind::Load, id);
        let reload = tracker.begin(JobKind::Reload, id);
        assert_ne!(load, reload);
        assert_eq!(tracker.len(), 2);

        tracker.finish(load);
        assert_eq!(tracker.len(), 1);
    }
}

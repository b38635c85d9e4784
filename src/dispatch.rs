//! Hand-off of new members to the hierarchy builder
//!
//! Members are queued on an unbounded channel and built one at a time by a single worker task.
//! Queueing never waits, so member creation returns as soon as the record is persisted. Builds
//! run in creation order, which places referrers before the members they referred.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{config::ShutdownPolicy, domain::Member, ports::hierarchy::HierarchyPort};

/// Outcome of the hierarchy builds handled by a dispatcher
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Builds that completed successfully
    pub delivered: usize,
    /// Builds that returned an error
    pub failed: usize,
    /// Queued members discarded on shutdown
    pub dropped: usize,
}

enum Job {
    Build(Member),
    /// Marks the end of the work accepted before shutdown
    Shutdown,
}

/// Handle to the hierarchy dispatch queue
///
/// Cloning the handle shares the same queue and worker.
#[derive(Clone)]
pub struct HierarchyDispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    sender: mpsc::UnboundedSender<Job>,
    /// Set once shutdown starts, new members are refused from then on
    closed: AtomicBool,
    /// Tells the worker to skip builds it has not started yet
    discard: Arc<AtomicBool>,
    policy: ShutdownPolicy,
    worker: Mutex<Option<JoinHandle<DispatchStats>>>,
}

impl HierarchyDispatcher {
    /// Start the worker task on the current Tokio runtime
    pub fn spawn<H>(hierarchy: Arc<H>, policy: ShutdownPolicy) -> Self
    where
        H: HierarchyPort + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let discard = Arc::new(AtomicBool::new(false));
        let worker = tokio::spawn(run(hierarchy, receiver, discard.clone()));

        Self {
            inner: Arc::new(Inner {
                sender,
                closed: AtomicBool::new(false),
                discard,
                policy,
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    /// Queue a member for hierarchy construction without waiting on it
    ///
    /// Returns `false` if the dispatcher is shut down and the member was discarded.
    pub fn dispatch(&self, member: Member) -> bool {
        if self.inner.closed.load(Ordering::Acquire) {
            warn!(member_id = %member.id, "hierarchy dispatcher is shutting down, discarding member");
            return false;
        }

        match self.inner.sender.send(Job::Build(member)) {
            Ok(()) => true,
            Err(mpsc::error::SendError(job)) => {
                if let Job::Build(member) = job {
                    warn!(member_id = %member.id, "hierarchy worker is gone, discarding member");
                }
                false
            }
        }
    }

    /// Stop the worker according to the shutdown policy
    ///
    /// Returns the stats of the worker. Calling this a second time returns default stats.
    pub async fn shutdown(&self) -> DispatchStats {
        let worker = match self.inner.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(worker) = worker else {
            return DispatchStats::default();
        };

        self.inner.closed.store(true, Ordering::Release);
        if self.inner.policy == ShutdownPolicy::Drop {
            self.inner.discard.store(true, Ordering::Release);
        }
        if self.inner.sender.send(Job::Shutdown).is_err() {
            debug!("hierarchy worker already stopped");
        }

        match worker.await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "hierarchy worker did not finish cleanly");
                DispatchStats::default()
            }
        }
    }
}

async fn run<H>(
    hierarchy: Arc<H>,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    discard: Arc<AtomicBool>,
) -> DispatchStats
where
    H: HierarchyPort + Send + Sync + 'static,
{
    let mut stats = DispatchStats::default();

    while let Some(job) = receiver.recv().await {
        match job {
            Job::Build(member) if discard.load(Ordering::Acquire) => {
                debug!(member_id = %member.id, "dropping queued hierarchy build");
                stats.dropped += 1;
            }
            Job::Build(member) => {
                let member_id = member.id;
                match hierarchy.on_member_created(member).await {
                    Ok(()) => {
                        debug!(%member_id, "member placed in hierarchy");
                        stats.delivered += 1;
                    }
                    Err(err) => {
                        warn!(%member_id, error = %err, "failed to build hierarchy for member");
                        stats.failed += 1;
                    }
                }
            }
            Job::Shutdown => break,
        }
    }

    receiver.close();
    // Anything sent after the shutdown marker never gets built
    while let Ok(job) = receiver.try_recv() {
        if let Job::Build(member) = job {
            debug!(member_id = %member.id, "dropping hierarchy build queued after shutdown");
            stats.dropped += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::hierarchy::memory::MemoryGenealogy,
        ports::hierarchy::{Error, MockHierarchyPort},
    };
    use chrono::Utc;
    use speculoos::prelude::*;
    use uuid::Uuid;

    fn member(reference: Option<Uuid>) -> Member {
        Member {
            id: Uuid::new_v4(),
            card_no: None,
            phone: None,
            level: None,
            name: None,
            reference,
            create_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_drain_builds_everything_queued() {
        let genealogy = Arc::new(MemoryGenealogy::default());
        let dispatcher = HierarchyDispatcher::spawn(genealogy.clone(), ShutdownPolicy::Drain);
        let root = member(None);
        let child = member(Some(root.id));

        assert_that!(dispatcher.dispatch(root.clone())).is_true();
        assert_that!(dispatcher.dispatch(child.clone())).is_true();
        let stats = dispatcher.shutdown().await;

        assert_that!(stats).is_equal_to(DispatchStats {
            delivered: 2,
            failed: 0,
            dropped: 0,
        });
        assert_that!(genealogy.parent_of(child.id))
            .is_ok()
            .is_equal_to(Some(root.id));
    }

    #[tokio::test]
    async fn test_drain_builds_before_refusing_new_members() {
        // GIVEN a draining dispatcher with one member queued
        let genealogy = Arc::new(MemoryGenealogy::default());
        let dispatcher = HierarchyDispatcher::spawn(genealogy.clone(), ShutdownPolicy::Drain);
        let queued = member(None);
        dispatcher.dispatch(queued.clone());

        // WHEN shutting down, then dispatching again
        let stats = dispatcher.shutdown().await;
        let late = dispatcher.dispatch(member(None));

        // THEN the queued member was built and the late one refused
        assert_that!(stats.delivered).is_equal_to(1);
        assert_that!(stats.dropped).is_equal_to(0);
        assert_that!(genealogy.contains(queued.id)).is_ok().is_true();
        assert_that!(late).is_false();
    }

    #[tokio::test]
    async fn test_drop_discards_pending() {
        let genealogy = Arc::new(MemoryGenealogy::default());
        let dispatcher = HierarchyDispatcher::spawn(genealogy.clone(), ShutdownPolicy::Drop);

        // The current-thread runtime doesn't run the worker before the first await point
        for _ in 0..3 {
            dispatcher.dispatch(member(None));
        }
        let stats = dispatcher.shutdown().await;

        assert_that!(stats).is_equal_to(DispatchStats {
            delivered: 0,
            failed: 0,
            dropped: 3,
        });
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown() {
        let dispatcher =
            HierarchyDispatcher::spawn(Arc::new(MemoryGenealogy::default()), ShutdownPolicy::Drain);
        dispatcher.shutdown().await;

        let res = dispatcher.dispatch(member(None));

        assert_that!(res).is_false();
        assert_that!(dispatcher.shutdown().await).is_equal_to(DispatchStats::default());
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_surfaced() {
        let mut hierarchy = MockHierarchyPort::new();
        hierarchy
            .expect_on_member_created()
            .times(2)
            .returning(|member| {
                Err(Error::UnknownReferrer {
                    member: member.id,
                    referrer: Uuid::new_v4(),
                })
            });
        let dispatcher = HierarchyDispatcher::spawn(Arc::new(hierarchy), ShutdownPolicy::Drain);

        assert_that!(dispatcher.dispatch(member(None))).is_true();
        assert_that!(dispatcher.dispatch(member(None))).is_true();
        let stats = dispatcher.shutdown().await;

        assert_that!(stats).is_equal_to(DispatchStats {
            delivered: 0,
            failed: 2,
            dropped: 0,
        });
    }
}

//! Pushes completed malas to the remote counter.
//!
//! Each completion gets at most one remote increment. A per-practice
//! [`SyncGuard`] moves `Idle -> Syncing -> CoolingDown -> Idle`; triggers for
//! the unit that is syncing or cooling down are suppressed. Failures are
//! reported but never retried and never roll back local progress.

use crate::models::{NoticeLevel, SyncDispatch};
use crate::notices::NoticeBoard;
use crate::remote::{Ack, RemoteError};
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};
use tracing::{info, warn};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// Remote side of a mala sync.
pub trait UnitRecorder: Send + Sync + 'static {
    fn record_unit(&self, practice_id: &str) -> impl Future<Output = Result<Ack, RemoteError>> + Send;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("mala {unit} is already being synced")]
    InFlight { unit: u64 },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncGuard {
    #[default]
    Idle,
    Syncing { unit: u64 },
    CoolingDown { unit: u64, until: Instant },
}

impl SyncGuard {
    /// Tries to start a sync for `unit`; `false` means the trigger is a duplicate.
    pub fn begin(&mut self, unit: u64, now: Instant) -> bool {
        self.expire(now);
        match *self {
            Self::Syncing { unit: current } | Self::CoolingDown { unit: current, .. }
                if current == unit =>
            {
                false
            }
            _ => {
                *self = Self::Syncing { unit };
                true
            }
        }
    }

    /// Marks the call for `unit` as resolved. Stale resolutions are ignored.
    pub fn resolve(&mut self, unit: u64, now: Instant, cooldown: Duration) {
        if *self == (Self::Syncing { unit }) {
            *self = Self::CoolingDown {
                unit,
                until: now + cooldown,
            };
        }
    }

    pub fn expire(&mut self, now: Instant) {
        if let Self::CoolingDown { until, .. } = *self {
            if now >= until {
                *self = Self::Idle;
            }
        }
    }
}

pub struct SyncClient<R> {
    recorder: Arc<R>,
    guards: Arc<Mutex<HashMap<String, SyncGuard>>>,
    notices: NoticeBoard,
    cooldown: Duration,
}

impl<R> Clone for SyncClient<R> {
    fn clone(&self) -> Self {
        Self {
            recorder: Arc::clone(&self.recorder),
            guards: Arc::clone(&self.guards),
            notices: self.notices.clone(),
            cooldown: self.cooldown,
        }
    }
}

impl<R: UnitRecorder> SyncClient<R> {
    pub fn new(recorder: Arc<R>, notices: NoticeBoard, cooldown: Duration) -> Self {
        Self {
            recorder,
            guards: Arc::new(Mutex::new(HashMap::new())),
            notices,
            cooldown,
        }
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub async fn guard(&self, practice_id: &str) -> SyncGuard {
        let mut guards = self.guards.lock().await;
        let guard = guards.entry(practice_id.to_string()).or_default();
        guard.expire(Instant::now());
        *guard
    }

    /// Records mala `unit` of `practice_id` remotely and waits for the outcome.
    pub async fn sync_unit(&self, practice_id: &str, unit: u64) -> Result<Ack, SyncError> {
        if !self.begin(practice_id, unit).await {
            return Err(SyncError::InFlight { unit });
        }
        Ok(self.complete(practice_id, unit).await?)
    }

    /// Like [`Self::sync_unit`] but runs the remote call in the background.
    pub async fn dispatch(&self, practice_id: &str, unit: u64) -> SyncDispatch {
        if !self.begin(practice_id, unit).await {
            return SyncDispatch::Suppressed;
        }

        let client = self.clone();
        let practice_id = practice_id.to_string();
        tokio::spawn(async move {
            let _ = client.complete(&practice_id, unit).await;
        });
        SyncDispatch::Dispatched
    }

    async fn begin(&self, practice_id: &str, unit: u64) -> bool {
        let mut guards = self.guards.lock().await;
        let started = guards
            .entry(practice_id.to_string())
            .or_default()
            .begin(unit, Instant::now());
        if !started {
            info!(practice_id, unit, "suppressing duplicate mala sync");
        }
        started
    }

    async fn complete(&self, practice_id: &str, unit: u64) -> Result<Ack, RemoteError> {
        let result = self.recorder.record_unit(practice_id).await;

        if let Some(guard) = self.guards.lock().await.get_mut(practice_id) {
            guard.resolve(unit, Instant::now(), self.cooldown);
        }

        match &result {
            Ok(_) => {
                info!(practice_id, unit, "mala synced");
                self.notices
                    .post(
                        NoticeLevel::Success,
                        practice_id,
                        Some(unit),
                        format!("Mala {unit} added"),
                    )
                    .await;
            }
            Err(err) => {
                warn!(practice_id, unit, "mala sync failed: {err}");
                self.notices
                    .post(
                        NoticeLevel::Error,
                        practice_id,
                        Some(unit),
                        format!("Could not save mala {unit}: {err}"),
                    )
                    .await;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeRecorder {
        calls: AtomicUsize,
        fail: AtomicBool,
        gate: Option<Arc<Notify>>,
    }

    impl UnitRecorder for FakeRecorder {
        async fn record_unit(&self, _practice_id: &str) -> Result<Ack, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(RemoteError::Rejected {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(Ack)
        }
    }

    fn client(recorder: FakeRecorder) -> (SyncClient<FakeRecorder>, Arc<FakeRecorder>) {
        let recorder = Arc::new(recorder);
        let client = SyncClient::new(Arc::clone(&recorder), NoticeBoard::new(), DEFAULT_COOLDOWN);
        (client, recorder)
    }

    #[test]
    fn guard_walks_idle_syncing_cooling_idle() {
        let start = Instant::now();
        let mut guard = SyncGuard::default();

        assert!(guard.begin(4, start));
        assert_eq!(guard, SyncGuard::Syncing { unit: 4 });
        assert!(!guard.begin(4, start));

        guard.resolve(4, start, DEFAULT_COOLDOWN);
        assert_eq!(
            guard,
            SyncGuard::CoolingDown {
                unit: 4,
                until: start + DEFAULT_COOLDOWN
            }
        );
        assert!(!guard.begin(4, start + Duration::from_millis(499)));

        guard.expire(start + DEFAULT_COOLDOWN);
        assert_eq!(guard, SyncGuard::Idle);
    }

    #[test]
    fn guard_lets_a_new_unit_through() {
        let now = Instant::now();
        let mut guard = SyncGuard::default();
        assert!(guard.begin(4, now));
        guard.resolve(4, now, DEFAULT_COOLDOWN);
        assert!(guard.begin(5, now));
        assert_eq!(guard, SyncGuard::Syncing { unit: 5 });

        guard.resolve(4, now, DEFAULT_COOLDOWN);
        assert_eq!(guard, SyncGuard::Syncing { unit: 5 });
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_trigger_during_flight_is_suppressed() {
        let gate = Arc::new(Notify::new());
        let (client, recorder) = client(FakeRecorder {
            gate: Some(Arc::clone(&gate)),
            ..FakeRecorder::default()
        });

        assert_eq!(client.dispatch("ram", 4).await, SyncDispatch::Dispatched);
        assert_eq!(client.dispatch("ram", 4).await, SyncDispatch::Suppressed);
        assert!(matches!(
            client.sync_unit("ram", 4).await,
            Err(SyncError::InFlight { unit: 4 })
        ));

        tokio::task::yield_now().await;
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(client.guard("ram").await, SyncGuard::CoolingDown { unit: 4, .. }));

        assert_eq!(client.dispatch("ram", 4).await, SyncDispatch::Suppressed);
        tokio::time::sleep(DEFAULT_COOLDOWN).await;
        assert_eq!(client.guard("ram").await, SyncGuard::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_and_not_retried() {
        let (client, recorder) = client(FakeRecorder::default());
        recorder.fail.store(true, Ordering::SeqCst);

        let result = client.sync_unit("ram", 4).await;
        assert!(matches!(result, Err(SyncError::Remote(RemoteError::Rejected { status: 503, .. }))));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);

        let notices = client.notices().drain().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].practice_id, "ram");
        assert_eq!(notices[0].unit, Some(4));

        recorder.fail.store(false, Ordering::SeqCst);
        assert_eq!(client.sync_unit("ram", 5).await.unwrap(), Ack);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.notices().drain().await[0].level, NoticeLevel::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn practices_have_independent_guards() {
        let (client, recorder) = client(FakeRecorder::default());
        client.sync_unit("ram", 1).await.unwrap();
        client.sync_unit("sita", 1).await.unwrap();
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 2);
    }
}

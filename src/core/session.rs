use crate::core::constants::MIN_WATCH_PERIOD;
use crate::core::errors::SubsplitError;
use crate::core::models::notification::DueNotification;
use crate::core::services::SubsplitService;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::notifications::NotificationDispatcher;
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::Datelike;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Anything that can tell which reminders are due for a user on a day.
#[async_trait]
pub trait DueTodaySource: Send + Sync {
    async fn due_today(&self, user_id: &str, day: u32) -> Result<Vec<DueNotification>, SubsplitError>;
}

#[async_trait]
impl<L: LoggingService, S: Storage> DueTodaySource for SubsplitService<L, S> {
    async fn due_today(&self, user_id: &str, day: u32) -> Result<Vec<DueNotification>, SubsplitError> {
        self.list_due_today(user_id, day).await
    }
}

/// Current day of month. Injected so tests can pin it.
pub type DayOfMonth = Arc<dyn Fn() -> u32 + Send + Sync>;

pub fn local_day_of_month() -> DayOfMonth {
    Arc::new(|| chrono::Local::now().day())
}

/// Periodic due-bill check for one logged-in user. Checks once right away,
/// then once per period, until stopped or dropped.
pub struct DueBillWatcher {
    user_id: String,
    handle: Option<JoinHandle<()>>,
}

impl DueBillWatcher {
    pub fn start(
        source: Arc<dyn DueTodaySource>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        user_id: String,
        period: Duration,
        today: DayOfMonth,
    ) -> Self {
        // `interval` panics on a zero period.
        let period = if period < MIN_WATCH_PERIOD {
            warn!(
                "Watch period {:?} for {} is too short, using {:?}",
                period, user_id, MIN_WATCH_PERIOD
            );
            MIN_WATCH_PERIOD
        } else {
            period
        };
        debug!("Starting due-bill watcher for {} every {:?}", user_id, period);
        let task_user = user_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                check_once(source.as_ref(), dispatcher.as_ref(), &task_user, today()).await;
            }
        });
        DueBillWatcher {
            user_id,
            handle: Some(handle),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels the task and waits until it is gone.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            debug!("Stopped due-bill watcher for {}", self.user_id);
        }
    }
}

impl Drop for DueBillWatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn check_once(source: &dyn DueTodaySource, dispatcher: &dyn NotificationDispatcher, user_id: &str, day: u32) {
    let due = match source.due_today(user_id, day).await {
        Ok(due) => due,
        Err(e) => {
            warn!("Due-bill check for {} failed: {}", user_id, e);
            return;
        }
    };
    for notification in &due {
        if let Err(e) = dispatcher.dispatch(user_id, notification).await {
            warn!("Dispatching {} to {} failed: {}", notification.tag, user_id, e);
        }
    }
}

/// Owns one watcher per logged-in user. Login starts (or restarts) it,
/// logout stops it; dropping the registry stops all of them.
pub struct SessionRegistry {
    source: Arc<dyn DueTodaySource>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    period: Duration,
    today: DayOfMonth,
    watchers: Mutex<HashMap<String, DueBillWatcher>>,
}

impl SessionRegistry {
    pub fn new(
        source: Arc<dyn DueTodaySource>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        period: Duration,
        today: DayOfMonth,
    ) -> Self {
        SessionRegistry {
            source,
            dispatcher,
            period,
            today,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    pub async fn start_session(&self, user_id: &str) {
        let watcher = DueBillWatcher::start(
            self.source.clone(),
            self.dispatcher.clone(),
            user_id.to_string(),
            self.period,
            self.today.clone(),
        );
        let previous = self.watchers.lock().await.insert(user_id.to_string(), watcher);
        if let Some(previous) = previous {
            info!("Replacing existing session watcher for {}", user_id);
            previous.stop().await;
        }
    }

    /// Returns whether a session was active.
    pub async fn end_session(&self, user_id: &str) -> bool {
        let removed = self.watchers.lock().await.remove(user_id);
        match removed {
            Some(watcher) => {
                watcher.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn is_active(&self, user_id: &str) -> bool {
        self.watchers
            .lock()
            .await
            .get(user_id)
            .is_some_and(DueBillWatcher::is_running)
    }

    pub async fn active_count(&self) -> usize {
        self.watchers.lock().await.len()
    }

    pub async fn shutdown(&self) {
        let watchers: Vec<DueBillWatcher> = self.watchers.lock().await.drain().map(|(_, w)| w).collect();
        for watcher in watchers {
            watcher.stop().await;
        }
    }
}

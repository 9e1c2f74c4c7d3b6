//! Session context: the shared response cache, the settings it was filled under, and the
//! ring of recent results.
//!
//! One `Session` is created by the caller and passed (as `Arc<Session>`) to every task of
//! that session; nothing here is global.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cache::ResponseCache;
use crate::dispatch::TaskReport;
use crate::llm::Content;
use crate::settings::{Settings, SettingsFingerprint};

/// Slots in the result history.
pub const RESULT_HISTORY_SIZE: usize = 10;

/// One finished task as shown in the result history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub request_content: Vec<Content>,
    pub response_content: String,
    pub outcome: &'static str,
    pub created_at: DateTime<Utc>,
}

/// Fixed ring of results; the index wraps after [`RESULT_HISTORY_SIZE`] tasks.
#[derive(Debug, Clone, Default)]
pub struct ResultHistory {
    slots: [Option<ResultRecord>; RESULT_HISTORY_SIZE],
    index: Option<usize>,
}

impl ResultHistory {
    /// Stores `record` at the next index and returns that index.
    pub fn push(&mut self, record: ResultRecord) -> usize {
        let next = self.index.map_or(0, |i| (i + 1) % RESULT_HISTORY_SIZE);
        self.slots[next] = Some(record);
        self.index = Some(next);
        next
    }

    pub fn get(&self, index: usize) -> Option<&ResultRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn latest(&self) -> Option<&ResultRecord> {
        self.index.and_then(|i| self.get(i))
    }

    /// Index of the latest record; `None` before the first task.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Filled slots as `(index, record)`, by slot index.
    pub fn entries(&self) -> Vec<(usize, &ResultRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (i, r)))
            .collect()
    }
}

pub struct Session {
    cache: Arc<ResponseCache>,
    fingerprint: Mutex<Option<SettingsFingerprint>>,
    history: Mutex<ResultHistory>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(ResponseCache::new()))
    }

    pub fn with_cache(cache: Arc<ResponseCache>) -> Self {
        Self {
            cache,
            fingerprint: Mutex::new(None),
            history: Mutex::new(ResultHistory::default()),
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Records `settings` as the ones the cache is filled under, unless a previous call
    /// already did. A later [`apply_settings`](Self::apply_settings) compares against them.
    pub fn seed_settings(&self, settings: &Settings) {
        lock(&self.fingerprint).get_or_insert_with(|| settings.fingerprint());
    }

    /// Records the settings in effect; clears the cache when they differ from the previous
    /// ones. Returns whether the cache was cleared.
    pub async fn apply_settings(&self, settings: &Settings) -> bool {
        let next = settings.fingerprint();
        let changed = {
            let mut current = lock(&self.fingerprint);
            let changed = current.as_ref().is_some_and(|prev| *prev != next);
            *current = Some(next);
            changed
        };
        if changed {
            info!("settings changed; clearing response cache");
            self.cache.clear().await;
        }
        changed
    }

    /// Adds a finished task to the history and returns its slot index.
    pub fn record(&self, report: &TaskReport) -> usize {
        let record = ResultRecord {
            request_content: report.request_content.clone(),
            response_content: report.content(),
            outcome: report.outcome.kind(),
            created_at: Utc::now(),
        };
        lock(&self.history).push(record)
    }

    pub fn history(&self, index: usize) -> Option<ResultRecord> {
        lock(&self.history).get(index).cloned()
    }

    pub fn latest(&self) -> Option<ResultRecord> {
        lock(&self.history).latest().cloned()
    }

    /// Copy of the whole ring.
    pub fn history_snapshot(&self) -> ResultHistory {
        lock(&self.history).clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

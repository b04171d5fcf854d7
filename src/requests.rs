//! One in-flight request per key: a newer request aborts the older one.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::task::AbortHandle;
use tracing::debug;

use crate::error::{Error, Result};

/// Identifies the view slot a catalog response is destined for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub endpoint: &'static str,
    pub scope: &'static str,
    pub id: Option<u64>,
    pub page: Option<u32>,
}

impl RequestKey {
    pub fn new(
        endpoint: &'static str,
        scope: &'static str,
        id: Option<u64>,
        page: Option<u32>,
    ) -> Self {
        Self {
            endpoint,
            scope,
            id,
            page,
        }
    }
}

pub struct RequestSlots<K> {
    inflight: Mutex<HashMap<K, (u64, AbortHandle)>>,
    next_ticket: AtomicU64,
}

impl<K> Default for RequestSlots<K> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }
}

impl<K> RequestSlots<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, (u64, AbortHandle)>>> {
        self.inflight
            .lock()
            .map_err(|e| Error::Internal(e.to_string()))
    }

    /// Runs `fut` as a task under `key`, aborting whatever ran there before.
    ///
    /// Resolves to `Error::Superseded` if a later call with the same key
    /// started before this one finished.
    pub async fn run<T, F>(&self, key: K, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        // spawn under the lock so a task is never left running untracked
        let (handle, previous) = {
            let mut inflight = self.lock()?;
            let handle = tokio::spawn(fut);
            let previous = inflight.insert(key.clone(), (ticket, handle.abort_handle()));
            (handle, previous)
        };
        if let Some((_, older)) = previous {
            debug!(?key, "superseding in-flight request");
            older.abort();
        }

        let outcome = handle.await;

        {
            let mut inflight = self.lock()?;
            if inflight.get(&key).is_some_and(|(t, _)| *t == ticket) {
                inflight.remove(&key);
            }
        }

        match outcome {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Superseded),
            Err(e) => Err(Error::Internal(e.to_string())),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Aborts everything, e.g. when the owning view goes away.
    pub fn cancel_all(&self) {
        if let Ok(mut inflight) = self.lock() {
            for (_, (_, handle)) in inflight.drain() {
                handle.abort();
            }
        }
    }
}

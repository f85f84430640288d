//! Per-thread transcript storage and mutual exclusion

use super::Message;
use crate::db::DbError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transcript database unavailable: {0}")]
    Database(#[from] DbError),
}

/// Storage for thread transcripts
///
/// `append` must land all of `messages` or none of them.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Full transcript for a thread; an unseen thread has an empty transcript
    async fn get(&self, thread_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Extend a thread's transcript, preserving order
    async fn append(&self, thread_id: &str, messages: &[Message]) -> Result<(), StoreError>;

    async fn has_history(&self, thread_id: &str) -> Result<bool, StoreError> {
        Ok(!self.get(thread_id).await?.is_empty())
    }
}

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    async fn get(&self, thread_id: &str) -> Result<Vec<Message>, StoreError> {
        (**self).get(thread_id).await
    }

    async fn append(&self, thread_id: &str, messages: &[Message]) -> Result<(), StoreError> {
        (**self).append(thread_id, messages).await
    }

    async fn has_history(&self, thread_id: &str) -> Result<bool, StoreError> {
        (**self).has_history(thread_id).await
    }
}

/// Process-local transcript store
///
/// Transcripts live as long as the process; there is no eviction.
#[derive(Default)]
pub struct InMemoryTranscriptStore {
    threads: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn get(&self, thread_id: &str) -> Result<Vec<Message>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn append(&self, thread_id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads
            .entry(thread_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn has_history(&self, thread_id: &str) -> Result<bool, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).is_some_and(|t| !t.is_empty()))
    }
}

type LockTable = std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// One async mutex per thread id
///
/// A turn holds its thread's guard from the first transcript read until its
/// append set is committed, so a second request on the same thread queues
/// behind it. Different threads never contend. An entry lives only while a
/// guard holds it or a request waits on it.
#[derive(Default)]
pub struct ThreadLocks {
    locks: Arc<LockTable>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `thread_id`
    pub async fn acquire(&self, thread_id: &str) -> ThreadGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(thread_id.to_string()).or_default())
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        ThreadGuard {
            guard: Some(guard),
            lock,
            thread_id: thread_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Exclusive access to one thread; releases the lock on drop and removes the
/// table entry when nobody else is waiting for it
pub struct ThreadGuard {
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<Mutex<()>>,
    thread_id: String,
    locks: Arc<LockTable>,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table and this guard still reference the mutex
        let idle = locks
            .get(&self.thread_id)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(&self.thread_id);
        }
    }
}

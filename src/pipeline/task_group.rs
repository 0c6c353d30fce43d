use std::collections::HashMap;
use std::future::Future;
use tokio::task::{self, JoinError, JoinSet};

/// A keyed group of independent tasks that is always joined as a whole.
///
/// Every spawned unit is tagged with a key; [`join_all`](Self::join_all) waits for all of
/// them and returns one outcome per key, including tasks that panicked. Nothing is
/// cancelled when a sibling fails.
pub struct TaskGroup<K, T> {
    set: JoinSet<T>,
    keys: HashMap<task::Id, K>,
}

impl<K, T: Send + 'static> TaskGroup<K, T> {
    pub fn new() -> Self {
        Self {
            set: JoinSet::new(),
            keys: HashMap::new(),
        }
    }

    /// Spawn an async unit on the runtime.
    pub fn spawn<F>(&mut self, key: K, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let handle = self.set.spawn(task);
        self.keys.insert(handle.id(), key);
    }

    /// Spawn a blocking unit (file I/O) on the blocking pool.
    pub fn spawn_blocking<F>(&mut self, key: K, task: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let handle = self.set.spawn_blocking(task);
        self.keys.insert(handle.id(), key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Wait for every task. Outcomes come back in completion order.
    pub async fn join_all(mut self) -> Vec<(K, Result<T, JoinError>)> {
        let mut outcomes = Vec::with_capacity(self.keys.len());

        while let Some(joined) = self.set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, value)) => (id, Ok(value)),
                Err(err) => (err.id(), Err(err)),
            };

            if let Some(key) = self.keys.remove(&id) {
                outcomes.push((key, result));
            }
        }

        outcomes
    }
}

impl<K, T: Send + 'static> Default for TaskGroup<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

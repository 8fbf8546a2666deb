//! Exactly-once async values with explicit invalidation

use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::OnceCell;

/// A lazily computed value shared by concurrent callers.
///
/// The first caller runs the initializer; concurrent callers wait on the same
/// computation. A failed initialization leaves the memo empty so the next
/// caller retries. [`Memo::invalidate`] discards the stored value.
#[derive(Debug)]
pub struct Memo<T> {
    cell: RwLock<Arc<OnceCell<T>>>,
}

impl<T: Clone> Memo<T> {
    /// Create an empty memo
    pub fn new() -> Self {
        Self {
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    fn current(&self) -> Arc<OnceCell<T>> {
        match self.cell.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Return the stored value, computing it first if needed
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.current();
        cell.get_or_try_init(init).await.cloned()
    }

    /// Return the stored value without computing it
    pub fn get(&self) -> Option<T> {
        self.current().get().cloned()
    }

    /// Drop the stored value; the next read recomputes it
    pub fn invalidate(&self) {
        let fresh = Arc::new(OnceCell::new());
        match self.cell.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }
}

impl<T: Clone> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_computes_once() {
        let memo: Memo<u32> = Memo::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = memo
                .get_or_try_init(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_computation() {
        let memo: Memo<u32> = Memo::new();
        let calls = AtomicUsize::new(0);
        let init = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, ()>(7)
        };

        let (a, b) = tokio::join!(memo.get_or_try_init(init), memo.get_or_try_init(init));
        assert_eq!((a.unwrap(), b.unwrap()), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let memo: Memo<u32> = Memo::new();
        let failed = memo.get_or_try_init(|| async { Err::<u32, _>("boom") }).await;
        assert!(failed.is_err());
        assert!(memo.get().is_none());

        let ok = memo.get_or_try_init(|| async { Ok::<_, &str>(1) }).await;
        assert_eq!(ok.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_recomputes() {
        let memo: Memo<u32> = Memo::new();
        memo.get_or_try_init(|| async { Ok::<_, ()>(1) }).await.unwrap();
        memo.invalidate();
        assert!(memo.get().is_none());
        let value = memo.get_or_try_init(|| async { Ok::<_, ()>(2) }).await.unwrap();
        assert_eq!(value, 2);
    }
}

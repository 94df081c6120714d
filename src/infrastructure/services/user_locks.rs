use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-user serialization point for structural mutations (create,
/// rename, move, delete, restore). Two concurrent mutations on the same
/// user's tree would race the physical mirror; operations on different
/// users never contend.
#[derive(Default)]
pub struct UserLockRegistry {
    locks: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UserLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the mutation lock for one user, creating it on first use
    pub async fn acquire(&self, user_id: &Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("user lock registry poisoned");
            locks.entry(*user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let registry = Arc::new(UserLockRegistry::new());
        let user = Uuid::new_v4();
        let concurrent = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let concurrent = concurrent.clone();
            handles.push(tokio::spawn(async move {
                let _guard = registry.acquire(&user).await;
                let inside = concurrent.fetch_add(1, Ordering::SeqCst);
                assert_eq!(inside, 0, "another task held the same user lock");
                tokio::task::yield_now().await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_different_users_do_not_contend() {
        let registry = UserLockRegistry::new();
        let guard_a = registry.acquire(&Uuid::new_v4()).await;
        // A second user's lock must be immediately available
        let guard_b = registry.acquire(&Uuid::new_v4()).await;
        drop(guard_a);
        drop(guard_b);
    }
}

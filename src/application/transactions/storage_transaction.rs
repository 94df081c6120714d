use std::future::Future;
use std::pin::Pin;

use crate::common::errors::DomainError;

/// Boxed async step
type StepFuture = Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send>>;

/// A dual-write unit of work across the database and the filesystem.
///
/// No cross-system transaction exists between Postgres and the disk, so
/// each step registers a compensation that undoes its effect. Steps run
/// in order; on the first failure the compensations of the completed
/// steps run in reverse order, leaving DB and disk agreeing again.
pub struct StorageTransaction {
    steps: Vec<StepFuture>,
    compensations: Vec<StepFuture>,
    /// Transaction name for logging
    name: &'static str,
}

impl StorageTransaction {
    pub fn new(name: &'static str) -> Self {
        Self {
            steps: Vec::new(),
            compensations: Vec::new(),
            name,
        }
    }

    /// Registers a step with the compensation that reverses it
    pub fn add_step<F, C>(&mut self, step: F, compensation: C)
    where
        F: Future<Output = Result<(), DomainError>> + Send + 'static,
        C: Future<Output = Result<(), DomainError>> + Send + 'static,
    {
        self.steps.push(Box::pin(step));
        self.compensations.push(Box::pin(compensation));
    }

    /// Registers a step whose effect needs no reversal
    pub fn add_irreversible_step<F>(&mut self, step: F)
    where
        F: Future<Output = Result<(), DomainError>> + Send + 'static,
    {
        self.steps.push(Box::pin(step));
        self.compensations.push(Box::pin(async { Ok(()) }));
    }

    /// Runs every step in order. On failure, replays the compensations
    /// of the completed steps in reverse order and reports the original
    /// error; compensation failures are logged, never masked.
    pub async fn commit(self) -> Result<(), DomainError> {
        tracing::debug!("Starting transaction: {}", self.name);

        let name = self.name;
        let mut compensations = self.compensations;
        let mut completed = 0usize;

        for (i, step) in self.steps.into_iter().enumerate() {
            match step.await {
                Ok(()) => {
                    completed = i + 1;
                    tracing::trace!("Step {} completed in transaction {}", i, name);
                }
                Err(e) => {
                    tracing::error!("Step {} failed in transaction {}: {}", i, name, e);
                    Self::compensate(name, compensations.drain(..completed).collect()).await;
                    // Callers match on the kind, so the wrapper keeps the
                    // failing step's kind instead of flattening to Internal
                    return Err(DomainError::new(
                        e.kind,
                        "Transaction",
                        format!("Transaction '{}' failed: {}", name, e),
                    )
                    .with_source(e));
                }
            }
        }

        tracing::debug!("Transaction completed: {}", name);
        Ok(())
    }

    async fn compensate(name: &'static str, completed: Vec<StepFuture>) {
        tracing::warn!("Rolling back transaction: {}", name);

        for (i, compensation) in completed.into_iter().enumerate().rev() {
            if let Err(e) = compensation.await {
                // The system is now inconsistent for this entity; surface
                // loudly so an operator can reconcile.
                tracing::error!(
                    "Compensation {} failed in transaction {}: {}",
                    i,
                    name,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_all_steps_run_on_success() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tx = StorageTransaction::new("test_success");

        for _ in 0..3 {
            let c = counter.clone();
            tx.add_step(
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                async { Ok(()) },
            );
        }

        assert!(tx.commit().await.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_compensates_completed_steps_only() {
        let compensated = Arc::new(AtomicUsize::new(0));
        let mut tx = StorageTransaction::new("test_rollback");

        let c1 = compensated.clone();
        tx.add_step(async { Ok(()) }, async move {
            c1.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let c2 = compensated.clone();
        tx.add_step(
            async {
                Err(DomainError::internal_error("Test", "step blew up"))
            },
            async move {
                // Never runs: the failing step is not compensated
                c2.fetch_add(100, Ordering::SeqCst);
                Ok(())
            },
        );

        let result = tx.commit().await;
        assert!(result.is_err());
        assert_eq!(compensated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_the_step_error_kind() {
        let mut tx = StorageTransaction::new("test_kind");

        tx.add_irreversible_step(async {
            Err(DomainError::already_exists("Item", "name taken"))
        });

        let err = tx.commit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert!(err.source.is_some());
    }

    #[tokio::test]
    async fn test_failure_stops_later_steps() {
        let ran = Arc::new(AtomicUsize::new(0));
        let mut tx = StorageTransaction::new("test_abort");

        tx.add_irreversible_step(async {
            Err(DomainError::internal_error("Test", "first step fails"))
        });

        let r = ran.clone();
        tx.add_irreversible_step(async move {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(tx.commit().await.is_err());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}

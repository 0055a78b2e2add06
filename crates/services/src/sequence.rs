//! # Write sequences
//!
//! Content storage, the ledger and the index store fail independently and
//! share no transaction. A `WriteSequence` walks the three in a fixed order:
//!
//! ```text
//! Pending  --stage()-->  Pending  --commit()-->  Committed  --follow_up()/retire()-->  finish()
//!   |                                  |
//!   +-- failure: run compensations <---+
//! ```
//!
//! Steps staged while `Pending` register a compensation that undoes them.
//! The ledger call is the commit point: once it succeeds nothing is rolled
//! back. Index writes and deletion of superseded content exist only on
//! `Committed`, so they cannot run before the ledger has acknowledged the
//! new document.

use std::future::Future;
use std::marker::PhantomData;

use domains::{ContentStore, DomainError, Result};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Named step of a write sequence, used for logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTag {
    ReadIndex,
    UploadContent,
    VerifyPointer,
    LedgerCommit,
    IndexWrite,
    RetireSuperseded,
}

/// Undo action registered by a pending step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteContent(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub step: StepTag,
    pub reason: String,
}

/// What happened while a sequence ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub completed: Vec<StepTag>,
    pub compensated: Vec<StepTag>,
    pub degraded: Vec<Degradation>,
}

impl SequenceReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Typestate marker: the commit point has not been reached.
#[derive(Debug)]
pub struct Pending;

/// Typestate marker: the ledger acknowledged the write.
#[derive(Debug)]
pub struct Committed;

pub struct WriteSequence<'a, S> {
    label: &'static str,
    content: &'a dyn ContentStore,
    compensations: Vec<(StepTag, Compensation)>,
    report: SequenceReport,
    _state: PhantomData<S>,
}

impl<'a> WriteSequence<'a, Pending> {
    pub fn begin(label: &'static str, content: &'a dyn ContentStore) -> Self {
        debug!(sequence = label, "write sequence started");
        Self {
            label,
            content,
            compensations: Vec::new(),
            report: SequenceReport::default(),
            _state: PhantomData,
        }
    }

    /// Runs a step that needs no undo (reads, precondition checks).
    /// Failure still rolls back whatever was staged before it.
    pub async fn check<T, E, F>(&mut self, tag: StepTag, step: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<DomainError>,
    {
        match step.await {
            Ok(value) => {
                self.report.completed.push(tag);
                Ok(value)
            }
            Err(e) => Err(self.fail(tag, e.into()).await),
        }
    }

    /// Runs a reversible step and registers its compensation.
    pub async fn stage<T, E, F, C>(&mut self, tag: StepTag, step: F, compensation: C) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<DomainError>,
        C: FnOnce(&T) -> Compensation,
    {
        match step.await {
            Ok(value) => {
                self.compensations.push((tag, compensation(&value)));
                self.report.completed.push(tag);
                Ok(value)
            }
            Err(e) => Err(self.fail(tag, e.into()).await),
        }
    }

    /// Runs the commit step. Success drops every registered compensation;
    /// failure runs them.
    pub async fn commit<T, E, F>(
        mut self,
        tag: StepTag,
        step: F,
    ) -> Result<(T, WriteSequence<'a, Committed>)>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<DomainError>,
    {
        match step.await {
            Ok(value) => {
                debug!(sequence = self.label, step = ?tag, "commit point reached");
                self.report.completed.push(tag);
                let committed = WriteSequence {
                    label: self.label,
                    content: self.content,
                    compensations: Vec::new(),
                    report: self.report,
                    _state: PhantomData,
                };
                Ok((value, committed))
            }
            Err(e) => Err(self.fail(tag, e.into()).await),
        }
    }

    /// Gives up without an error, undoing staged steps.
    pub async fn abandon(mut self) -> SequenceReport {
        self.compensate().await;
        self.report
    }

    async fn fail(&mut self, tag: StepTag, err: DomainError) -> DomainError {
        error!(sequence = self.label, step = ?tag, error = %err, "write sequence step failed");
        self.compensate().await;
        err
    }

    async fn compensate(&mut self) {
        while let Some((tag, compensation)) = self.compensations.pop() {
            match compensation {
                Compensation::DeleteContent(cid) => {
                    let outcome = self.content.delete_by_cid(&cid).await;
                    if !outcome.success {
                        warn!(
                            sequence = self.label,
                            step = ?tag,
                            cid = %cid,
                            error = outcome.error.as_deref().unwrap_or("unknown"),
                            "compensation failed, orphan document left behind"
                        );
                    }
                }
            }
            self.report.compensated.push(tag);
        }
    }
}

impl<'a> WriteSequence<'a, Committed> {
    /// Runs a post-commit step. Failure is logged and recorded as degraded;
    /// it never undoes the commit.
    pub async fn follow_up<T, E, F>(&mut self, tag: StepTag, step: F) -> Option<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<DomainError>,
    {
        match step.await {
            Ok(value) => {
                self.report.completed.push(tag);
                Some(value)
            }
            Err(e) => {
                let err: DomainError = e.into();
                warn!(sequence = self.label, step = ?tag, error = %err, "post-commit step failed, continuing degraded");
                self.degrade(tag, err.to_string());
                None
            }
        }
    }

    /// Best-effort delete of a document nothing references any more.
    pub async fn retire(&mut self, tag: StepTag, cid: &str) {
        let outcome = self.content.delete_by_cid(cid).await;
        if outcome.success {
            self.report.completed.push(tag);
        } else {
            warn!(
                sequence = self.label,
                step = ?tag,
                cid = %cid,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "could not delete superseded document"
            );
        }
    }

    pub fn degrade(&mut self, step: StepTag, reason: impl Into<String>) {
        self.report.degraded.push(Degradation {
            step,
            reason: reason.into(),
        });
    }

    pub fn finish(self) -> SequenceReport {
        debug!(sequence = self.label, degraded = self.report.is_degraded(), "write sequence finished");
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{ContentError, DeleteOutcome, IndexError, LedgerError, LedgerErrorKind, MockContentStore};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn failure_before_commit_runs_compensations_in_reverse() {
        let mut content = MockContentStore::new();
        let mut order = mockall::Sequence::new();
        content
            .expect_delete_by_cid()
            .with(eq("cid-b"))
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| DeleteOutcome::ok());
        content
            .expect_delete_by_cid()
            .with(eq("cid-a"))
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| DeleteOutcome::ok());

        let mut seq = WriteSequence::begin("test", &content);
        seq.stage(StepTag::UploadContent, async { Ok::<_, ContentError>("cid-a") }, |c| {
            Compensation::DeleteContent(c.to_string())
        })
        .await
        .unwrap();
        seq.stage(StepTag::UploadContent, async { Ok::<_, ContentError>("cid-b") }, |c| {
            Compensation::DeleteContent(c.to_string())
        })
        .await
        .unwrap();

        let err = seq
            .commit(StepTag::LedgerCommit, async {
                Err::<(), _>(LedgerError::new(LedgerErrorKind::Network, "timeout"))
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::Ledger(_)));
    }

    #[tokio::test]
    async fn commit_clears_compensations() {
        // No delete expectation: any call would panic.
        let content = MockContentStore::new();
        let mut seq = WriteSequence::begin("test", &content);
        seq.stage(StepTag::UploadContent, async { Ok::<_, ContentError>("cid") }, |c| {
            Compensation::DeleteContent(c.to_string())
        })
        .await
        .unwrap();
        let (sig, mut committed) = seq
            .commit(StepTag::LedgerCommit, async { Ok::<_, LedgerError>("sig") })
            .await
            .unwrap();
        assert_eq!(sig, "sig");

        let missing = committed
            .follow_up(StepTag::IndexWrite, async {
                Err::<(), _>(IndexError::Unavailable("down".into()))
            })
            .await;
        assert!(missing.is_none());

        let report = committed.finish();
        assert!(report.is_degraded());
        assert_eq!(report.degraded[0].step, StepTag::IndexWrite);
        assert!(report.compensated.is_empty());
    }

    #[tokio::test]
    async fn abandon_undoes_staged_upload() {
        let mut content = MockContentStore::new();
        content
            .expect_delete_by_cid()
            .with(eq("cid"))
            .times(1)
            .returning(|_| DeleteOutcome::failed("gateway down"));

        let mut seq = WriteSequence::begin("test", &content);
        seq.stage(StepTag::UploadContent, async { Ok::<_, ContentError>("cid") }, |c| {
            Compensation::DeleteContent(c.to_string())
        })
        .await
        .unwrap();
        let report = seq.abandon().await;
        assert_eq!(report.compensated, vec![StepTag::UploadContent]);
    }
}

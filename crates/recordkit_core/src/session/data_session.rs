//! Session lifecycle state machine.

use super::operation::TransactionOperation;
use super::{DataError, DataResult};
use crate::config::SessionConfig;
use crate::gateway::{GatewaySession, PersistenceGateway};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Identifier attached to every session log event.
pub type SessionId = Uuid;

/// Lifecycle state of a [`DataSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but `init` has not run.
    Uninitialized,
    /// Gateway session open, no transaction.
    Ready,
    /// A unit of work is open.
    InTransaction,
    /// Terminal; every operation fails.
    Closed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::InTransaction => "in_transaction",
            Self::Closed => "closed",
        })
    }
}

/// Transactional wrapper around one gateway session.
///
/// State machine: `Uninitialized -> Ready <-> InTransaction`, and
/// `Ready | InTransaction -> Closed`. Not meant for concurrent use; give each
/// logical task its own session built from the shared gateway.
pub struct DataSession<G: PersistenceGateway> {
    id: SessionId,
    gateway: Arc<G>,
    handle: Option<G::Session>,
    state: SessionState,
}

impl<G: PersistenceGateway> DataSession<G> {
    /// Creates an uninitialized session bound to `gateway`.
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            id: Uuid::new_v4(),
            gateway,
            handle: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Creates and initializes a session in one step.
    pub fn open(gateway: Arc<G>, config: &SessionConfig) -> DataResult<Self> {
        let mut session = Self::new(gateway);
        session.init(config)?;
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the gateway session: `Uninitialized -> Ready`.
    ///
    /// Re-initialization is rejected with `InvalidState`; close this session
    /// and create a new one to change configuration.
    pub fn init(&mut self, config: &SessionConfig) -> DataResult<()> {
        self.require(SessionState::Uninitialized, "initialize")?;
        let started_at = Instant::now();
        match self.gateway.open_session(config) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = SessionState::Ready;
                info!(
                    "event=session_init module=session status=ok session_id={} config_keys={} \
                     duration_ms={}",
                    self.id,
                    config.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=session_init module=session status=error session_id={} error={}",
                    self.id, err
                );
                Err(err.into())
            }
        }
    }

    /// Starts a unit of work: `Ready -> InTransaction`.
    pub fn begin_transaction(&mut self) -> DataResult<()> {
        self.require(SessionState::Ready, "begin a transaction")?;
        let session_id = self.id;
        let handle = self.handle_mut("begin a transaction")?;
        if let Err(err) = handle.begin() {
            error!(
                "event=tx_begin module=session status=error session_id={} error={}",
                session_id, err
            );
            return Err(err.into());
        }
        self.state = SessionState::InTransaction;
        debug!(
            "event=tx_begin module=session status=ok session_id={}",
            session_id
        );
        Ok(())
    }

    /// Persists the unit of work: `InTransaction -> Ready`.
    ///
    /// The session leaves `InTransaction` even when the gateway rejects the
    /// commit; the rejected work is then rolled back on a best-effort basis.
    pub fn commit(&mut self) -> DataResult<()> {
        self.require(SessionState::InTransaction, "commit")?;
        self.state = SessionState::Ready;
        let session_id = self.id;
        let handle = self.handle_mut("commit")?;
        match handle.commit() {
            Ok(()) => {
                debug!(
                    "event=tx_commit module=session status=ok session_id={}",
                    session_id
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=tx_commit module=session status=error session_id={} error={}",
                    session_id, err
                );
                if let Err(rollback_err) = handle.rollback() {
                    debug!(
                        "event=tx_rollback module=session status=skipped session_id={} \
                         reason=commit_failed error={}",
                        session_id, rollback_err
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Discards the unit of work: `InTransaction -> Ready`.
    ///
    /// Gateway failures are logged, never raised; the session is `Ready`
    /// afterwards either way.
    pub fn rollback(&mut self) -> DataResult<()> {
        self.require(SessionState::InTransaction, "roll back")?;
        self.state = SessionState::Ready;
        let session_id = self.id;
        let handle = self.handle_mut("roll back")?;
        match handle.rollback() {
            Ok(()) => debug!(
                "event=tx_rollback module=session status=ok session_id={}",
                session_id
            ),
            Err(err) => warn!(
                "event=tx_rollback module=session status=error session_id={} error={}",
                session_id, err
            ),
        }
        Ok(())
    }

    /// Ends the session, rolling back an open unit of work first.
    pub fn close(&mut self) -> DataResult<()> {
        if !matches!(
            self.state,
            SessionState::Ready | SessionState::InTransaction
        ) {
            return Err(self.invalid_state("close"));
        }
        let had_transaction = self.state == SessionState::InTransaction;
        if had_transaction {
            self.rollback()?;
        }
        self.state = SessionState::Closed;

        if let Some(mut handle) = self.handle.take() {
            if let Err(err) = handle.close() {
                error!(
                    "event=session_close module=session status=error session_id={} error={}",
                    self.id, err
                );
                return Err(err.into());
            }
        }
        info!(
            "event=session_close module=session status=ok session_id={} rolled_back={}",
            self.id, had_transaction
        );
        Ok(())
    }

    /// Gateway handle for callers that need engine-specific operations.
    pub fn current_session(&mut self) -> DataResult<&mut G::Session> {
        if !matches!(
            self.state,
            SessionState::Ready | SessionState::InTransaction
        ) {
            return Err(self.invalid_state("access the gateway session"));
        }
        self.handle_mut("access the gateway session")
    }

    /// Runs `operation` in its own transaction.
    ///
    /// Commits and returns the result on success. On failure the transaction
    /// is rolled back and the operation's error is returned unchanged.
    pub fn run_in_transaction<R, F>(&mut self, operation: F) -> DataResult<R>
    where
        F: FnOnce(&mut G::Session) -> DataResult<R>,
    {
        self.run_operation(operation)
    }

    /// [`DataSession::run_in_transaction`] for named operation types.
    pub fn run_operation<R, Op>(&mut self, operation: Op) -> DataResult<R>
    where
        Op: TransactionOperation<G::Session, R>,
    {
        self.begin_transaction()?;
        let outcome = self
            .handle_mut("run an operation")
            .and_then(|handle| operation.execute(handle));
        match outcome {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.rollback_after_failure(&err);
                Err(err)
            }
        }
    }

    /// Runs `operation` inside the caller's open unit of work, or in a new
    /// transaction when none is open.
    ///
    /// Joined units of work are not committed here, but a failure still
    /// rolls them back before the error propagates.
    pub fn in_unit_of_work<R, F>(&mut self, operation: F) -> DataResult<R>
    where
        F: FnOnce(&mut G::Session) -> DataResult<R>,
    {
        if self.state != SessionState::InTransaction {
            return self.run_in_transaction(operation);
        }
        let outcome = self
            .handle_mut("run an operation")
            .and_then(|handle| operation(handle));
        if let Err(err) = &outcome {
            self.rollback_after_failure(err);
        }
        outcome
    }

    fn rollback_after_failure(&mut self, cause: &DataError) {
        if self.state != SessionState::InTransaction {
            return;
        }
        debug!(
            "event=tx_abort module=session status=rollback session_id={} cause={}",
            self.id, cause
        );
        if let Err(err) = self.rollback() {
            warn!(
                "event=tx_abort module=session status=error session_id={} error={}",
                self.id, err
            );
        }
    }

    fn require(&self, expected: SessionState, operation: &'static str) -> DataResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> DataError {
        DataError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn handle_mut(&mut self, operation: &'static str) -> DataResult<&mut G::Session> {
        let state = self.state;
        self.handle
            .as_mut()
            .ok_or(DataError::InvalidState { operation, state })
    }
}

impl<G: PersistenceGateway> Drop for DataSession<G> {
    fn drop(&mut self) {
        if !matches!(
            self.state,
            SessionState::Ready | SessionState::InTransaction
        ) {
            return;
        }
        warn!(
            "event=session_drop module=session status=closing session_id={} state={}",
            self.id, self.state
        );
        if let Err(err) = self.close() {
            warn!(
                "event=session_drop module=session status=error session_id={} error={}",
                self.id, err
            );
        }
    }
}

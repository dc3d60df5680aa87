//! Unit-of-work callbacks.

use super::DataResult;

/// Work executed inside a transaction against a gateway session `S`.
///
/// Every data manipulation of the unit of work happens in `execute`. Plain
/// closures implement this trait, so named operation types are only needed
/// when the work carries its own state or is reused.
pub trait TransactionOperation<S, R> {
    fn execute(self, session: &mut S) -> DataResult<R>;
}

impl<S, R, F> TransactionOperation<S, R> for F
where
    F: FnOnce(&mut S) -> DataResult<R>,
{
    fn execute(self, session: &mut S) -> DataResult<R> {
        self(session)
    }
}

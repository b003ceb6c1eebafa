//! Deferred settlement ledger.
//!
//! While a session is open every pool operation only records what the locker
//! owes or is owed per currency. The session may close only once every
//! running delta is back to zero.

use crate::FastMap;
use crate::error::SessionError;
use crate::pool::Currency;
use alloy_primitives::Address;

#[derive(Clone, Debug, Default)]
pub struct SessionLock {
    locker: Option<Address>,
    deltas: FastMap<Currency, i128>,
    nonzero_delta_count: usize,
}

impl SessionLock {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.locker.is_some()
    }

    #[inline]
    pub fn locker(&self) -> Option<Address> {
        self.locker
    }

    pub fn begin(&mut self, locker: Address) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::SessionAlreadyActive);
        }
        self.locker = Some(locker);
        Ok(())
    }

    /// Closes the session; fails with the number of unsettled currencies
    /// while any running delta is non-zero.
    pub fn end(&mut self) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::SessionNotActive);
        }
        if self.nonzero_delta_count != 0 {
            return Err(SessionError::CurrencyNotSettled(self.nonzero_delta_count));
        }
        self.locker = None;
        self.deltas.clear();
        Ok(())
    }

    /// Adds `delta` to the running balance of `currency` and returns the new
    /// balance.
    pub fn account(&mut self, currency: Currency, delta: i128) -> Result<i128, SessionError> {
        if !self.is_active() {
            return Err(SessionError::SessionNotActive);
        }

        let previous = self.currency_delta(currency);
        if delta == 0 {
            return Ok(previous);
        }
        let next = previous
            .checked_add(delta)
            .ok_or(SessionError::DeltaOverflow(currency))?;

        if next == 0 {
            self.nonzero_delta_count -= 1;
            self.deltas.remove(&currency);
        } else {
            if previous == 0 {
                self.nonzero_delta_count += 1;
            }
            self.deltas.insert(currency, next);
        }
        Ok(next)
    }

    #[inline]
    pub fn currency_delta(&self, currency: Currency) -> i128 {
        self.deltas.get(&currency).copied().unwrap_or(0)
    }

    #[inline]
    pub fn nonzero_delta_count(&self) -> usize {
        self.nonzero_delta_count
    }
}

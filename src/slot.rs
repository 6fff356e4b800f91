//! Single-command admission control.
//!
//! Every session-mutating command (login, unlock, sync, lock, logout,
//! search, fetch) runs under a [`CommandSlot`] permit. Admission is
//! fail-fast: a second command is rejected with
//! [`VaultdeckError::Busy`](crate::VaultdeckError::Busy) rather than queued,
//! so the caller sees "busy, try again" instead of hidden reordering.

use crate::{Result, VaultdeckError};
use tokio::sync::{Semaphore, TryAcquireError};

/// Guards all session-mutating commands: at most one permit exists, and
/// release is tied to guard drop so the slot can never be left stuck, even
/// if the owning command errors or unwinds.
#[derive(Debug)]
pub struct CommandSlot {
    permit: Semaphore,
}

/// RAII permit for one command. Dropping it releases the slot.
#[derive(Debug)]
pub struct CommandPermit<'a> {
    _inner: tokio::sync::SemaphorePermit<'a>,
}

impl CommandSlot {
    /// Creates an idle slot.
    pub fn new() -> Self {
        Self {
            permit: Semaphore::new(1),
        }
    }

    /// Admits a command if the slot is idle.
    ///
    /// # Errors
    ///
    /// Returns [`VaultdeckError::Busy`](crate::VaultdeckError::Busy) if
    /// another command is in flight.
    pub fn try_acquire(&self) -> Result<CommandPermit<'_>> {
        match self.permit.try_acquire() {
            Ok(permit) => Ok(CommandPermit { _inner: permit }),
            Err(TryAcquireError::NoPermits) => Err(VaultdeckError::Busy),
            Err(TryAcquireError::Closed) => Err(VaultdeckError::Busy),
        }
    }

    /// Returns true while a command holds the slot.
    pub fn is_busy(&self) -> bool {
        self.permit.available_permits() == 0
    }
}

impl Default for CommandSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let slot = CommandSlot::new();
        let held = slot.try_acquire().unwrap();
        assert!(slot.is_busy());

        assert!(matches!(slot.try_acquire(), Err(VaultdeckError::Busy)));
        drop(held);
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_release_on_drop() {
        let slot = CommandSlot::new();
        {
            let _permit = slot.try_acquire().unwrap();
        }
        assert!(slot.try_acquire().is_ok());
    }

    #[test]
    fn test_release_on_unwind() {
        let slot = CommandSlot::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = slot.try_acquire().unwrap();
            panic!("command blew up");
        }));
        assert!(result.is_err());
        assert!(!slot.is_busy());
    }
}

//! One-at-a-time guard for exports and background removal.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// Long-running studio operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Export,
    BackgroundRemoval,
}

impl Operation {
    fn code(self) -> u8 {
        match self {
            Self::Export => 1,
            Self::BackgroundRemoval => 2,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Export),
            2 => Some(Self::BackgroundRemoval),
            _ => None,
        }
    }

    /// Status line shown while the operation runs.
    pub fn status_message(self) -> &'static str {
        match self {
            Self::Export => "Creating video...",
            Self::BackgroundRemoval => "Removing Background (AI)...",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Export => "export",
            Self::BackgroundRemoval => "background removal",
        })
    }
}

const IDLE: u8 = 0;

/// Tracks which operation, if any, is in flight.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    state: Arc<AtomicU8>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag for `operation`, or fail with `Busy` naming the
    /// operation already running.
    pub fn try_acquire(&self, operation: Operation) -> PhotoglowResult<BusyToken> {
        match self
            .state
            .compare_exchange(IDLE, operation.code(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(BusyToken {
                state: Arc::clone(&self.state),
            }),
            Err(running) => {
                let running = Operation::from_code(running)
                    .map(|op| op.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::debug!(requested = %operation, %running, "Rejected while busy");
                Err(PhotoglowError::busy(running))
            }
        }
    }

    pub fn current(&self) -> Option<Operation> {
        Operation::from_code(self.state.load(Ordering::Acquire))
    }

    pub fn is_busy(&self) -> bool {
        self.current().is_some()
    }
}

/// Releases the flag when dropped.
#[derive(Debug)]
pub struct BusyToken {
    state: Arc<AtomicU8>,
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        self.state.store(IDLE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let flag = BusyFlag::new();
        let token = flag.try_acquire(Operation::Export).unwrap();
        assert_eq!(flag.current(), Some(Operation::Export));

        let err = flag.try_acquire(Operation::BackgroundRemoval).unwrap_err();
        assert!(matches!(err, PhotoglowError::Busy { ref operation } if operation == "export"));

        drop(token);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire(Operation::BackgroundRemoval).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let flag = BusyFlag::new();
        let other = flag.clone();
        let _token = flag.try_acquire(Operation::BackgroundRemoval).unwrap();
        assert_eq!(other.current(), Some(Operation::BackgroundRemoval));
    }
}

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::AppError;

/// Allows one long-running operation (order placement, export, account deletion) at a
/// time among everything holding a clone of the gate. A second caller is rejected, not
/// queued.
#[derive(Debug, Clone, Default)]
pub struct OperationGate {
    busy: Arc<AtomicBool>,
}

impl OperationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Result<GateGuard, AppError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::OperationInFlight)?;
        Ok(GateGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped, whether the operation succeeded or failed.
#[derive(Debug)]
pub struct GateGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_caller_is_rejected_until_release() {
        let gate = OperationGate::new();
        let guard = gate.try_begin().unwrap();
        assert!(gate.is_busy());
        assert!(matches!(gate.try_begin(), Err(AppError::OperationInFlight)));

        drop(guard);
        assert!(!gate.is_busy());
        assert!(gate.try_begin().is_ok());
    }

    #[test]
    fn clones_share_state() {
        let gate = OperationGate::new();
        let other = gate.clone();
        let _guard = gate.try_begin().unwrap();
        assert!(other.try_begin().is_err());
    }
}

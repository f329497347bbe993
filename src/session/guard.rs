//! Single-flight guards for network operations.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, SearchError};

/// Network operations limited to one request at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Generation,
    Execution,
}

impl OperationKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generation => "Query generation",
            Self::Execution => "Query execution",
        }
    }
}

/// Per-kind in-flight flags.
#[derive(Debug, Default)]
pub struct InFlight {
    generation: AtomicBool,
    execution: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, kind: OperationKind) -> &AtomicBool {
        match kind {
            OperationKind::Generation => &self.generation,
            OperationKind::Execution => &self.execution,
        }
    }

    /// Marks `kind` as in flight, or fails with `Busy` if it already is.
    ///
    /// The flag is cleared when the returned guard is dropped.
    pub fn begin(&self, kind: OperationKind) -> Result<FlightGuard<'_>> {
        let flag = self.flag(kind);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SearchError::busy(kind.label()))?;
        Ok(FlightGuard { flag })
    }

    pub fn is_active(&self, kind: OperationKind) -> bool {
        self.flag(kind).load(Ordering::Acquire)
    }
}

/// Clears its in-flight flag on drop.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
